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

//! Queued delivery: the receiving end of a [`FeedBus::subscribe_queue`] subscription.
//!
//! [`FeedBus::subscribe_queue`]: crate::feed::FeedBus::subscribe_queue

use crate::payload::Envelope;

/// Receives envelopes published on one topic, to be drained on the owner's thread.
///
/// The bus-side callback only enqueues; all handling happens wherever the
/// owner calls [`drain`](Self::drain). Dropping the receiver makes the
/// subscription inert, and the bus prunes it on the next publish.
#[derive(Debug)]
pub struct FeedReceiver {
    topic: String,
    receiver: flume::Receiver<Envelope>,
}

impl FeedReceiver {
    pub(crate) fn new(topic: &str, receiver: flume::Receiver<Envelope>) -> Self {
        Self {
            topic: topic.to_string(),
            receiver,
        }
    }

    /// The topic this receiver listens to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Takes every envelope queued so far, in publish order.
    pub fn drain(&self) -> Vec<Envelope> {
        self.receiver.try_iter().collect()
    }

    /// Number of envelopes waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
