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

//! Errors raised by the scheduler and the faults it reports per task.

use std::fmt;
use thiserror::Error;

/// Errors returned by [`Scheduler`](crate::Scheduler) operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SchedulerError {
    /// The scheduler is already running; tasks can no longer be registered
    /// and `run` cannot be called again.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// `wait_for_completion` was called before `run`.
    #[error("scheduler has not been started")]
    NotStarted,

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread for task '{task}'")]
    Spawn {
        /// Name of the task the thread was meant for.
        task: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },
}

/// The lifecycle phase in which a task faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// `on_start`.
    Start,
    /// `on_step`.
    Step,
    /// `on_stop`.
    Stop,
    /// The worker thread itself died outside any task phase.
    Worker,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Start => "on_start",
            Phase::Step => "on_step",
            Phase::Stop => "on_stop",
            Phase::Worker => "worker",
        })
    }
}

/// A failure inside one task phase: a returned error or a caught panic.
///
/// Fatal for the task that raised it. The other tasks keep running until they
/// observe the shutdown it triggers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task '{task}' faulted in {phase}: {message}")]
pub struct TaskFault {
    /// Name of the faulting task.
    pub task: String,
    /// Phase the fault occurred in.
    pub phase: Phase,
    /// Rendered error chain or panic message.
    pub message: String,
}
