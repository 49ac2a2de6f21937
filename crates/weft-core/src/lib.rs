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

//! # Weft Core
//!
//! Contracts and communication primitives shared by every Weft worker:
//! the [`Task`] lifecycle, the [`FeedBus`](feed::FeedBus) (publish/subscribe
//! plus bounded request/response), the double-buffered
//! [`SnapshotExchange`](snapshot::SnapshotExchange), and the process-wide
//! [`AppContext`] that carries them.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod feed;
pub mod math;
pub mod payload;
pub mod registry;
pub mod settings;
pub mod snapshot;
pub mod task;

pub use context::AppContext;
pub use error::FeedError;
pub use payload::{Envelope, Payload};
pub use task::{FrameTime, RunFlag, Task, TaskId};
