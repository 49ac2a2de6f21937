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

//! # Weft Agents
//!
//! The reference [`Task`](weft_core::Task)s that make up a Weft application.
//! Each one runs on its own worker and talks to the others only through the
//! [`FeedBus`](weft_core::feed::FeedBus):
//!
//! - [`GameTask`]: hosts the lifecycle machine and turns user intent into
//!   world requests.
//! - [`SimulationTask`]: owns the world and publishes one snapshot per cycle.
//! - [`RenderTask`]: adopts the latest snapshot once per frame and offers the
//!   `window` provider.
//! - [`InputTask`]: republishes device input from an [`InputSource`].

#![warn(missing_docs)]

pub mod game_agent;
pub mod input_agent;
pub mod render_agent;
pub mod simulation_agent;

pub use game_agent::{GameConfig, GameTask};
pub use input_agent::{InputConfig, InputSource, InputTask, RawInput, ScriptedInput};
pub use render_agent::{RenderConfig, RenderTask};
pub use simulation_agent::{SimulationConfig, SimulationTask};
