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

//! The feed bus: topic-based publish/subscribe plus named request/response.
//!
//! Workers never talk to each other directly. They publish typed
//! [`Payload`](crate::payload::Payload)s on string topics (see [`topic`]) and
//! subscribe to the topics they care about. For resources that another worker
//! produces during its own startup (a window handle, for instance), a worker
//! can [`request`](FeedBus::request) a named value and block for a bounded time
//! until some [`DataProvider`] answers.

mod bus;
mod provider;
mod queue;
pub mod topic;

pub use self::bus::{Delivery, FeedBus, FeedConfig, SubscriptionId};
pub use self::provider::DataProvider;
pub use self::queue::FeedReceiver;
