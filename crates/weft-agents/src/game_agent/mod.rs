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

//! The game-logic task.
//!
//! Hosts the [`LifecycleMachine`](weft_control::lifecycle::LifecycleMachine):
//! it drains its queued subscriptions on its own thread, feeds the machine and
//! publishes the resulting effects. It also answers the "start game" button by
//! requesting a grid of objects from the other workers.

mod agent;
mod grid;

pub use agent::*;
pub use grid::GridConfig;
