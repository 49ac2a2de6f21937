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

//! The contract every scheduled worker implements.

use crate::feed::topic::APP_EVENT;
use crate::feed::{FeedBus, SubscriptionId};
use crate::payload::AppEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Opaque identity of a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Allocates a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Timing of the current step, computed once by the scheduler and handed to
/// the task read-only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Time since the previous step of the same task (zero on the first step).
    pub delta: Duration,
    /// Time since the task's first step.
    pub elapsed: Duration,
    /// Zero-based index of this step.
    pub step: u64,
}

impl FrameTime {
    /// `delta` in seconds.
    #[inline]
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// A unit of recurring work with a three-phase lifecycle.
///
/// The scheduler calls [`on_start`](Task::on_start) once, then
/// [`on_step`](Task::on_step) until it returns `Ok(false)` or the process-wide
/// shutdown flag is set, then [`on_stop`](Task::on_stop) once. All three calls
/// happen on the same thread.
///
/// Returning an error (or panicking) from any phase is a task fault: fatal for
/// this task, but the other tasks keep running until they observe shutdown.
pub trait Task: Send {
    /// Human-readable name, used for the worker thread and in logs.
    fn name(&self) -> &str;

    /// Subscribes to topics and offers providers. Subscriptions made here are
    /// in place before this task steps for the first time.
    fn on_start(&mut self) -> anyhow::Result<()>;

    /// Performs one step of work. Return `Ok(false)` to stop.
    ///
    /// May sleep briefly to cap its rate, but must not block indefinitely
    /// except through a bounded [`FeedBus::request`].
    fn on_step(&mut self, frame: &FrameTime) -> anyhow::Result<bool>;

    /// Releases subscriptions and resources.
    fn on_stop(&mut self) -> anyhow::Result<()>;
}

/// A task's running flag.
///
/// Single writer in practice: the task itself, or its shutdown handler. Readers
/// may observe a stale `true` for one more step.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// Creates a flag in the running state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the owner should keep stepping.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Asks the owner to stop after its current step.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Subscribes this flag to `app_event` so that [`AppEvent::Shutdown`]
    /// clears it. The subscription is weak: it goes inert once every clone of
    /// the flag is dropped.
    pub fn stop_on_shutdown(&self, bus: &FeedBus, owner: &str) -> SubscriptionId {
        let owner = owner.to_string();
        bus.subscribe_weak(APP_EVENT, &self.0, move |flag, envelope| {
            if envelope.payload.as_app() == Some(AppEvent::Shutdown) {
                log::debug!("{owner} received shutdown event.");
                flag.store(false, Ordering::Release);
            }
        })
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}
