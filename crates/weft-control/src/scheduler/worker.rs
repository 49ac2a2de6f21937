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

//! The loops that drive tasks on worker threads.

use super::{ShutdownSignal, TaskOutcome, TaskReport};
use crate::clock::FrameClock;
use crate::error::{Phase, TaskFault};
use crossbeam_channel::Sender;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use weft_core::error::panic_message;
use weft_core::feed::topic::APP_EVENT;
use weft_core::payload::{AppEvent, Payload};
use weft_core::{AppContext, Task, TaskId};

/// What every worker needs besides its tasks.
#[derive(Clone)]
pub(crate) struct WorkerShared {
    pub(crate) context: Arc<AppContext>,
    pub(crate) shutdown: ShutdownSignal,
    pub(crate) reports: Sender<TaskReport>,
}

impl WorkerShared {
    /// Makes a fault fatal for the whole run: logs it, asks the lifecycle
    /// host to quit and arms the shutdown flag.
    fn escalate(&self, fault: &TaskFault) {
        log::error!("Scheduler: {}", fault);
        self.context
            .bus
            .publish(APP_EVENT, Payload::App(AppEvent::QuitRequested));
        self.shutdown.arm();
    }
}

/// One task plus the per-task state the scheduler owns for it.
pub(crate) struct TaskRunner {
    index: usize,
    id: TaskId,
    name: String,
    task: Box<dyn Task>,
    clock: FrameClock,
    fault: Option<TaskFault>,
}

impl TaskRunner {
    pub(crate) fn new(index: usize, id: TaskId, task: Box<dyn Task>) -> Self {
        Self {
            index,
            id,
            name: task.name().to_string(),
            task,
            clock: FrameClock::new(),
            fault: None,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Runs one phase, turning both `Err` and panics into a [`TaskFault`].
    fn guarded<R>(
        &mut self,
        phase: Phase,
        f: impl FnOnce(&mut dyn Task) -> anyhow::Result<R>,
    ) -> Result<R, TaskFault> {
        let task = self.task.as_mut();
        let message = match panic::catch_unwind(AssertUnwindSafe(|| f(task))) {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => format!("{err:#}"),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        Err(TaskFault {
            task: self.name.clone(),
            phase,
            message,
        })
    }

    fn start(&mut self) -> Result<(), TaskFault> {
        log::debug!("Scheduler: starting '{}'", self.name);
        self.guarded(Phase::Start, |task| task.on_start())
    }

    fn step(&mut self) -> Result<bool, TaskFault> {
        let frame = self.clock.tick();
        self.guarded(Phase::Step, |task| task.on_step(&frame))
    }

    fn record(&mut self, fault: TaskFault, shared: &WorkerShared) {
        shared.escalate(&fault);
        self.fault.get_or_insert(fault);
    }

    /// Calls `on_stop` (even after a fault) and reports the outcome.
    fn finish(mut self, shared: &WorkerShared) {
        log::debug!("Scheduler: stopping '{}'", self.name);
        if let Err(fault) = self.guarded(Phase::Stop, |task| task.on_stop()) {
            self.record(fault, shared);
        }

        let steps = self.clock.steps();
        let outcome = match self.fault {
            Some(fault) => TaskOutcome::Faulted(fault),
            None => TaskOutcome::Completed,
        };
        log::info!(
            "Scheduler: '{}' finished after {} steps ({})",
            self.name,
            steps,
            outcome
        );
        let report = TaskReport {
            index: self.index,
            id: self.id,
            name: self.name,
            outcome,
            steps,
        };
        if shared.reports.send(report).is_err() {
            log::warn!("Scheduler: report channel closed before a worker finished");
        }
    }
}

/// Threaded mode: one task on its own thread.
pub(crate) fn run_threaded(mut runner: TaskRunner, shared: WorkerShared) {
    match runner.start() {
        Ok(()) => loop {
            if shared.shutdown.is_armed() {
                log::debug!("Scheduler: '{}' observed shutdown", runner.name);
                break;
            }
            match runner.step() {
                Ok(true) => {}
                Ok(false) => break,
                Err(fault) => {
                    runner.record(fault, &shared);
                    break;
                }
            }
        },
        Err(fault) => runner.record(fault, &shared),
    }
    runner.finish(&shared);
}

/// Sequential mode: every task on this thread, stepped round-robin in
/// registration order. Shutdown is checked between full rounds.
pub(crate) fn run_sequential(runners: Vec<TaskRunner>, shared: WorkerShared) {
    let mut rotation = Vec::with_capacity(runners.len());
    for mut runner in runners {
        match runner.start() {
            Ok(()) => rotation.push(runner),
            Err(fault) => {
                runner.record(fault, &shared);
                runner.finish(&shared);
            }
        }
    }

    while !rotation.is_empty() && !shared.shutdown.is_armed() {
        let mut i = 0;
        while i < rotation.len() {
            match rotation[i].step() {
                Ok(true) => i += 1,
                Ok(false) => rotation.remove(i).finish(&shared),
                Err(fault) => {
                    let mut runner = rotation.remove(i);
                    runner.record(fault, &shared);
                    runner.finish(&shared);
                }
            }
        }
    }

    if !rotation.is_empty() {
        log::debug!(
            "Scheduler: sequential worker stopping {} remaining tasks",
            rotation.len()
        );
    }
    for runner in rotation {
        runner.finish(&shared);
    }
}
