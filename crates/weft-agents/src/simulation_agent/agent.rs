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

//! Defines the SimulationTask, the world producer.

use super::world::World;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use weft_control::clock::{FixedStep, StepPlan};
use weft_core::feed::topic::{
    CREATE_OBJECT, CREATE_TERRAIN, INPUT_KEYBOARD, WORLD_DYNAMIC, WORLD_REMOVED,
};
use weft_core::feed::FeedReceiver;
use weft_core::math::Vec3;
use weft_core::payload::{ButtonAction, KeyCode, Payload};
use weft_core::{AppContext, FrameTime, RunFlag, Task};

/// Configuration of the [`SimulationTask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Desired fixed-step rate.
    pub rate_hz: f64,
    /// Catch-up limit before a single oversized step is taken instead.
    pub max_substeps: u32,
    /// Pause after stepping, before the snapshot is published.
    pub cycle_pause_ms: u64,
    /// Initial pull of new dynamic bodies towards the origin.
    pub pull: f32,
    /// Velocity decay per second.
    pub damping: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rate_hz: 150.0,
            max_substeps: 10,
            cycle_pause_ms: 10,
            pull: 0.1,
            damping: 0.5,
        }
    }
}

/// Where `Left` and `Right` put the first body.
const NUDGE_LEFT: Vec3 = Vec3::new(-50.0, -10.0, -20.0);
const NUDGE_RIGHT: Vec3 = Vec3::new(50.0, -10.0, -20.0);

#[derive(Debug, Default)]
struct CycleStats {
    work: Duration,
    overhead: Duration,
    cycles: u64,
    steps: u64,
}

struct Inbox {
    objects: FeedReceiver,
    terrain: FeedReceiver,
    removed: FeedReceiver,
    keyboard: FeedReceiver,
}

/// The simulation task.
///
/// Requests from other workers arrive on queued subscriptions and are applied
/// at the start of each cycle, so the world is only ever touched from this
/// task's thread.
pub struct SimulationTask {
    context: Arc<AppContext>,
    config: SimulationConfig,
    running: RunFlag,
    world: World,
    fixed: FixedStep,
    inbox: Option<Inbox>,
    sequence: u64,
    stats: CycleStats,
}

impl SimulationTask {
    /// Creates the task with an empty world.
    pub fn new(context: Arc<AppContext>, config: SimulationConfig) -> Self {
        Self {
            world: World::new(config.pull, config.damping),
            fixed: FixedStep::new(config.rate_hz, config.max_substeps),
            context,
            config,
            running: RunFlag::new(),
            inbox: None,
            sequence: 0,
            stats: CycleStats::default(),
        }
    }

    /// Number of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.world.len()
    }

    /// Sequence of the last published snapshot.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn apply_requests(&mut self) {
        let Some(inbox) = &self.inbox else {
            return;
        };

        for envelope in inbox.objects.drain() {
            if let Payload::CreateObject(object) = &envelope.payload {
                self.world.add(object, true);
            }
        }
        for envelope in inbox.terrain.drain() {
            if let Payload::CreateTerrain(terrain) = &envelope.payload {
                self.world.add(terrain, false);
            }
        }
        for envelope in inbox.removed.drain() {
            if let Payload::RemoveObject(handle) = envelope.payload {
                if !self.world.remove(handle) {
                    log::debug!("SimulationTask: removal of unknown object {}", handle);
                }
            }
        }
        for envelope in inbox.keyboard.drain() {
            let Some(key) = envelope.payload.as_keyboard() else {
                continue;
            };
            if key.action != ButtonAction::Pressed {
                continue;
            }
            let target = match key.key {
                KeyCode::Left => NUDGE_LEFT,
                KeyCode::Right => NUDGE_RIGHT,
                _ => continue,
            };
            if let Some(handle) = self.world.place_first(target) {
                log::debug!("SimulationTask: moved {} to {:?}", handle, target);
            }
        }
    }

    fn advance(&mut self, delta: Duration) {
        match self.fixed.advance(delta) {
            StepPlan::Idle { sleep } => thread::sleep(sleep),
            StepPlan::Substeps { count, step } => {
                for _ in 0..count {
                    self.world.step(step.as_secs_f32());
                }
                self.stats.steps += u64::from(count);
            }
            StepPlan::CatchUp { step } => {
                log::trace!("SimulationTask: catching up {:?} in one step", step);
                self.world.step(step.as_secs_f32());
                self.stats.steps += 1;
            }
        }
    }

    fn publish_snapshot(&mut self) {
        self.sequence += 1;
        let snapshot = Arc::new(self.world.snapshot(self.sequence));
        self.context
            .bus
            .publish(WORLD_DYNAMIC, Payload::WorldSnapshot(snapshot));
    }
}

impl Task for SimulationTask {
    fn name(&self) -> &str {
        "simulation"
    }

    fn on_start(&mut self) -> anyhow::Result<()> {
        let bus = &self.context.bus;
        self.running.stop_on_shutdown(bus, "SimulationTask");
        self.inbox = Some(Inbox {
            objects: bus.subscribe_queue(CREATE_OBJECT),
            terrain: bus.subscribe_queue(CREATE_TERRAIN),
            removed: bus.subscribe_queue(WORLD_REMOVED),
            keyboard: bus.subscribe_queue(INPUT_KEYBOARD),
        });
        log::info!(
            "SimulationTask: stepping at {:.0} Hz ({:?} per step)",
            self.config.rate_hz,
            self.fixed.step()
        );
        Ok(())
    }

    fn on_step(&mut self, frame: &FrameTime) -> anyhow::Result<bool> {
        let work_started = Instant::now();
        self.apply_requests();
        self.advance(frame.delta);
        thread::sleep(Duration::from_millis(self.config.cycle_pause_ms));
        self.stats.work += work_started.elapsed();

        let publish_started = Instant::now();
        self.publish_snapshot();
        self.stats.overhead += publish_started.elapsed();
        self.stats.cycles += 1;

        Ok(self.running.is_running())
    }

    fn on_stop(&mut self) -> anyhow::Result<()> {
        // Dropping the receivers makes their subscriptions inert.
        self.inbox = None;

        let stats = &self.stats;
        let total = (stats.work + stats.overhead).as_secs_f64();
        let share = |part: Duration| {
            if total > 0.0 {
                part.as_secs_f64() / total * 100.0
            } else {
                0.0
            }
        };
        log::info!(
            "SimulationTask: work {:.3}s ({:.1}%), overhead {:.3}s ({:.1}%), total {:.3}s",
            stats.work.as_secs_f64(),
            share(stats.work),
            stats.overhead.as_secs_f64(),
            share(stats.overhead),
            total
        );
        log::info!(
            "SimulationTask: {} cycles, {} fixed steps, {:.1} cycles/s, {} bodies",
            stats.cycles,
            stats.steps,
            if total > 0.0 {
                stats.cycles as f64 / total
            } else {
                0.0
            },
            self.world.len()
        );
        Ok(())
    }
}
