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

//! # Weft Control
//!
//! Runs [`Task`](weft_core::Task)s on worker threads and sequences the
//! application lifecycle.
//!
//! - [`Scheduler`]: owns the tasks, one thread each or all on one thread.
//! - [`LifecycleMachine`](lifecycle::LifecycleMachine): loading, menu, game and
//!   shutdown sequencing, expressed as effects for its host to publish.
//! - [`clock`]: per-task frame timing and fixed-rate stepping.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod scheduler;

pub use config::{SchedulerConfig, ThreadingMode};
pub use error::{Phase, SchedulerError, TaskFault};
pub use scheduler::{CompletionReport, Scheduler, ShutdownSignal, TaskOutcome, TaskReport};
