// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types raised by the feed bus.
//!
//! Publishing and subscribing never fail: an unknown topic simply has no
//! subscribers. Only the request/response side has failure modes.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by [`FeedBus`](crate::feed::FeedBus) request/response operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// No provider answered `name` before the deadline. Recoverable: the caller
    /// proceeds without the resource or retries.
    #[error("request for '{name}' timed out after {waited:?}")]
    RequestTimeout {
        /// The requested name.
        name: String,
        /// How long the caller actually waited.
        waited: Duration,
    },

    /// A live provider registration for `name` was displaced by a newer one.
    /// The newer registration is in effect; this is informational.
    #[error("provider for '{name}' was replaced by a newer registration")]
    ProviderConflict {
        /// The contested provider name.
        name: String,
    },
}

impl FeedError {
    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            FeedError::RequestTimeout { .. } => "request_timeout",
            FeedError::ProviderConflict { .. } => "provider_conflict",
        }
    }

    /// Returns `true` if the caller may simply retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FeedError::RequestTimeout { .. })
    }
}

/// Extracts a readable message from a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
