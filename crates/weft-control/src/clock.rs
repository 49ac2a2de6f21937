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

//! Frame timing: per-task delta measurement and fixed-rate stepping.

use std::time::{Duration, Instant};
use weft_core::FrameTime;

/// Measures the time between consecutive steps of one task.
///
/// Owned by the scheduler; one per task. The resulting [`FrameTime`] is
/// computed once per step and handed to the task read-only.
#[derive(Debug, Default)]
pub struct FrameClock {
    first: Option<Instant>,
    last: Option<Instant>,
    step: u64,
}

impl FrameClock {
    /// Creates a clock that has not ticked yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new step now.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Starts a new step at `now`. The first step has a zero delta.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let first = *self.first.get_or_insert(now);
        let delta = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last = Some(now);

        let frame = FrameTime {
            delta,
            elapsed: now.saturating_duration_since(first),
            step: self.step,
        };
        self.step += 1;
        frame
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.step
    }
}

/// What a fixed-rate producer should do with the time that has accumulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepPlan {
    /// Less than one step is due; sleep for about half a step.
    Idle {
        /// Suggested sleep.
        sleep: Duration,
    },
    /// Run `count` steps of `step` each.
    Substeps {
        /// Number of fixed steps to run.
        count: u32,
        /// Length of each step.
        step: Duration,
    },
    /// Too far behind: run one step covering everything and start over.
    CatchUp {
        /// The oversized step length.
        step: Duration,
    },
}

/// Fixed-timestep accumulator with a cap on catch-up substeps.
///
/// Produces between one and `max_substeps - 1` fixed steps per call while the
/// producer keeps up. When more than `max_substeps` steps would be due (the
/// first frame after loading, typically) it asks for a single oversized step
/// and resets, so the producer never falls eternally behind.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    max_substeps: u32,
    accumulated: Duration,
}

impl FixedStep {
    /// Creates an accumulator running at `rate_hz` with at most `max_substeps`
    /// catch-up steps.
    pub fn new(rate_hz: f64, max_substeps: u32) -> Self {
        Self {
            step: Duration::from_nanos((1_000_000_000.0 / rate_hz.max(1e-3)) as u64),
            max_substeps: max_substeps.max(1),
            accumulated: Duration::ZERO,
        }
    }

    /// Length of one fixed step.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Time accumulated but not yet simulated.
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Adds `delta` and decides what to run.
    pub fn advance(&mut self, delta: Duration) -> StepPlan {
        self.accumulated += delta;

        if self.accumulated < self.step {
            return StepPlan::Idle {
                sleep: self.step / 2,
            };
        }

        if self.accumulated < self.step * self.max_substeps {
            let mut count = 0;
            while self.accumulated >= self.step {
                self.accumulated -= self.step;
                count += 1;
            }
            return StepPlan::Substeps {
                count,
                step: self.step,
            };
        }

        let step = std::mem::take(&mut self.accumulated);
        StepPlan::CatchUp { step }
    }
}
