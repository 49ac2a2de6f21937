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

//! Task scheduling: one worker thread per task, or all tasks on one thread.
//!
//! The [`Scheduler`] owns every registered [`Task`] from `register_task` until
//! `wait_for_completion` returns. It never interrupts a step: tasks stop when
//! they return `false` from `on_step` or when the process-wide
//! [`ShutdownSignal`] is armed, which happens on [`AppEvent::Shutdown`], on
//! [`Scheduler::request_shutdown`], or on any task fault.

mod registry;
mod worker;

use crate::config::{SchedulerConfig, ThreadingMode};
use crate::error::{Phase, SchedulerError, TaskFault};
use crossbeam_channel::Receiver;
use registry::TaskRegistry;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use weft_core::error::panic_message;
use weft_core::feed::topic::APP_EVENT;
use weft_core::feed::SubscriptionId;
use weft_core::payload::AppEvent;
use weft_core::{AppContext, Task, TaskId};
use worker::{TaskRunner, WorkerShared};

/// The process-wide shutdown flag.
///
/// Once armed it stays armed. Workers check it before every step.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    /// Creates an unarmed signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the signal.
    pub fn arm(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the signal has been armed.
    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// All phases returned `Ok`.
    Completed,
    /// A phase failed. Only the first fault is kept.
    Faulted(TaskFault),
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Completed => f.write_str("completed"),
            TaskOutcome::Faulted(fault) => write!(f, "faulted in {}", fault.phase),
        }
    }
}

/// Final state of one task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// Registration slot.
    pub index: usize,
    /// Identity returned by `register_task`.
    pub id: TaskId,
    /// Task name.
    pub name: String,
    /// How the task ended.
    pub outcome: TaskOutcome,
    /// Number of `on_step` calls.
    pub steps: u64,
}

/// Per-task outcomes of a completed run, in registration order.
#[derive(Debug, Clone, Default)]
pub struct CompletionReport {
    /// One report per registered task.
    pub tasks: Vec<TaskReport>,
}

impl CompletionReport {
    /// Returns `true` if no task faulted.
    pub fn is_clean(&self) -> bool {
        self.faults().next().is_none()
    }

    /// Iterates over the faults, in registration order.
    pub fn faults(&self) -> impl Iterator<Item = &TaskFault> {
        self.tasks.iter().filter_map(|t| match &t.outcome {
            TaskOutcome::Faulted(fault) => Some(fault),
            TaskOutcome::Completed => None,
        })
    }

    /// The report of the task called `name`.
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

enum RunState {
    Idle,
    Running {
        handles: Vec<JoinHandle<()>>,
        reports: Receiver<TaskReport>,
        expected: Vec<(usize, TaskId, String)>,
    },
    Collected,
}

/// Owns the tasks and their worker threads.
pub struct Scheduler {
    config: SchedulerConfig,
    context: Arc<AppContext>,
    registry: TaskRegistry,
    shutdown: ShutdownSignal,
    shutdown_subscription: SubscriptionId,
    state: RunState,
}

impl Scheduler {
    /// Creates a scheduler bound to `context`.
    ///
    /// The scheduler subscribes to `app_event` so that a broadcast
    /// [`AppEvent::Shutdown`] arms its shutdown signal.
    pub fn new(config: SchedulerConfig, context: Arc<AppContext>) -> Self {
        let shutdown = ShutdownSignal::new();
        let shutdown_subscription =
            context
                .bus
                .subscribe_weak(APP_EVENT, &shutdown.0, |flag, envelope| {
                    if envelope.payload.as_app() == Some(AppEvent::Shutdown) {
                        log::debug!("Scheduler: shutdown broadcast observed");
                        flag.store(true, Ordering::Release);
                    }
                });
        log::info!("Scheduler: created ({:?} mode)", config.mode);

        Self {
            config,
            context,
            registry: TaskRegistry::new(),
            shutdown,
            shutdown_subscription,
            state: RunState::Idle,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of tasks registered and not yet started.
    pub fn task_count(&self) -> usize {
        self.registry.len()
    }

    /// Registers a task. Only possible before [`run`](Self::run).
    pub fn register_task(&mut self, task: Box<dyn Task>) -> Result<TaskId, SchedulerError> {
        if !matches!(self.state, RunState::Idle) {
            return Err(SchedulerError::AlreadyRunning);
        }
        Ok(self.registry.register(task))
    }

    /// Starts every registered task and returns immediately.
    pub fn run(&mut self) -> Result<(), SchedulerError> {
        if !matches!(self.state, RunState::Idle) {
            return Err(SchedulerError::AlreadyRunning);
        }
        if self.registry.is_empty() {
            log::warn!("Scheduler: run called with no registered tasks");
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let shared = WorkerShared {
            context: Arc::clone(&self.context),
            shutdown: self.shutdown.clone(),
            reports: tx,
        };
        let runners: Vec<TaskRunner> = self
            .registry
            .drain()
            .enumerate()
            .map(|(index, (id, task))| TaskRunner::new(index, id, task))
            .collect();
        let expected = runners
            .iter()
            .map(|r| (r.index(), r.id(), r.name().to_string()))
            .collect();

        let mut handles = Vec::new();
        let spawned = match self.config.mode {
            ThreadingMode::Threaded => runners.into_iter().try_for_each(|runner| {
                let name = self.config.thread_name(runner.name());
                let task = runner.name().to_string();
                let shared = shared.clone();
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn(move || worker::run_threaded(runner, shared))
                    .map_err(|source| SchedulerError::Spawn { task, source })?;
                log::info!("Scheduler: started worker '{}'", name);
                handles.push(handle);
                Ok(())
            }),
            ThreadingMode::Sequential => {
                let name = self.config.thread_name("sequential");
                let count = runners.len();
                let shared = shared.clone();
                thread::Builder::new()
                    .name(name.clone())
                    .spawn(move || worker::run_sequential(runners, shared))
                    .map(|handle| {
                        log::info!(
                            "Scheduler: started sequential worker '{}' for {} tasks",
                            name,
                            count
                        );
                        handles.push(handle);
                    })
                    .map_err(|source| SchedulerError::Spawn {
                        task: "sequential".to_string(),
                        source,
                    })
            }
        };
        drop(shared);

        self.state = RunState::Running {
            handles,
            reports: rx,
            expected,
        };

        if let Err(err) = spawned {
            log::error!("Scheduler: {}; shutting down started workers", err);
            self.shutdown.arm();
            let _ = self.collect();
            return Err(err);
        }
        Ok(())
    }

    /// Blocks until every worker has returned from `on_stop`.
    pub fn wait_for_completion(&mut self) -> Result<CompletionReport, SchedulerError> {
        self.collect()
    }

    /// Arms the shutdown signal from outside any task.
    pub fn request_shutdown(&self) {
        log::info!("Scheduler: shutdown requested");
        self.shutdown.arm();
    }

    /// A handle on the shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    fn collect(&mut self) -> Result<CompletionReport, SchedulerError> {
        let (handles, reports, expected) =
            match std::mem::replace(&mut self.state, RunState::Collected) {
                RunState::Running {
                    handles,
                    reports,
                    expected,
                } => (handles, reports, expected),
                other => {
                    self.state = other;
                    return Err(SchedulerError::NotStarted);
                }
            };

        let mut worker_panic = None;
        for handle in handles {
            let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            if let Err(payload) = handle.join() {
                let message = panic_message(payload.as_ref());
                log::error!("Scheduler: worker '{}' died: {}", name, message);
                worker_panic.get_or_insert(message);
            }
        }

        let mut tasks: Vec<TaskReport> = reports.try_iter().collect();
        for (index, id, name) in expected {
            if tasks.iter().all(|t| t.index != index) {
                tasks.push(TaskReport {
                    index,
                    id,
                    outcome: TaskOutcome::Faulted(TaskFault {
                        task: name.clone(),
                        phase: Phase::Worker,
                        message: worker_panic
                            .clone()
                            .unwrap_or_else(|| "worker exited without reporting".to_string()),
                    }),
                    name,
                    steps: 0,
                });
            }
        }
        tasks.sort_by_key(|t| t.index);

        let report = CompletionReport { tasks };
        if report.is_clean() {
            log::info!("Scheduler: all {} tasks completed", report.tasks.len());
        } else {
            log::warn!(
                "Scheduler: {} of {} tasks faulted",
                report.faults().count(),
                report.tasks.len()
            );
        }
        Ok(report)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if matches!(self.state, RunState::Running { .. }) {
            log::warn!("Scheduler: dropped while running; stopping workers");
            self.shutdown.arm();
            let _ = self.collect();
        }
        self.context.bus.unsubscribe(self.shutdown_subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use weft_core::payload::Payload;
    use weft_core::FrameTime;

    /// Records its phases into a shared log and stops after `limit` steps.
    struct Scripted {
        name: String,
        limit: Option<u64>,
        fail_step: Option<u64>,
        panic_on_start: bool,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn new(name: &str, journal: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                limit: None,
                fail_step: None,
                panic_on_start: false,
                journal: Arc::clone(journal),
            }
        }

        fn note(&self, what: &str) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, what));
        }
    }

    impl Task for Scripted {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_start(&mut self) -> anyhow::Result<()> {
            self.note("start");
            if self.panic_on_start {
                panic!("boom");
            }
            Ok(())
        }

        fn on_step(&mut self, frame: &FrameTime) -> anyhow::Result<bool> {
            if frame.step == 0 {
                self.note("step0");
            }
            if self.fail_step == Some(frame.step) {
                anyhow::bail!("step {} failed", frame.step);
            }
            thread::sleep(Duration::from_millis(1));
            Ok(self.limit.map_or(true, |limit| frame.step + 1 < limit))
        }

        fn on_stop(&mut self) -> anyhow::Result<()> {
            self.note("stop");
            Ok(())
        }
    }

    fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn registration_after_run_is_refused() {
        let log = journal();
        let mut scheduler = Scheduler::new(SchedulerConfig::default(), AppContext::new());
        let mut task = Scripted::new("a", &log);
        task.limit = Some(1);
        scheduler.register_task(Box::new(task)).unwrap();
        scheduler.run().unwrap();

        let late = Scripted::new("late", &log);
        assert!(matches!(
            scheduler.register_task(Box::new(late)),
            Err(SchedulerError::AlreadyRunning)
        ));
        assert!(matches!(scheduler.run(), Err(SchedulerError::AlreadyRunning)));

        let report = scheduler.wait_for_completion().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.task("a").unwrap().steps, 1);
    }

    #[test]
    fn waiting_before_run_is_an_error() {
        let mut scheduler = Scheduler::new(SchedulerConfig::default(), AppContext::new());
        assert!(matches!(
            scheduler.wait_for_completion(),
            Err(SchedulerError::NotStarted)
        ));
    }

    #[test]
    fn sequential_mode_starts_in_order_and_retires_finished_tasks() {
        let log = journal();
        let mut scheduler = Scheduler::new(SchedulerConfig::sequential(), AppContext::new());
        let mut a = Scripted::new("a", &log);
        a.limit = Some(2);
        let mut b = Scripted::new("b", &log);
        b.limit = Some(5);
        scheduler.register_task(Box::new(a)).unwrap();
        scheduler.register_task(Box::new(b)).unwrap();
        scheduler.run().unwrap();

        let report = scheduler.wait_for_completion().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.tasks[0].name, "a");
        assert_eq!(report.tasks[0].steps, 2);
        assert_eq!(report.tasks[1].steps, 5);

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log,
            ["a:start", "b:start", "a:step0", "b:step0", "a:stop", "b:stop"]
        );
    }

    #[test]
    fn step_error_is_a_fault_that_shuts_everything_down() {
        let log = journal();
        let context = AppContext::new();
        let quit = context.bus.subscribe_queue(APP_EVENT);
        let mut scheduler = Scheduler::new(SchedulerConfig::default(), Arc::clone(&context));

        let mut faulty = Scripted::new("faulty", &log);
        faulty.fail_step = Some(3);
        scheduler.register_task(Box::new(faulty)).unwrap();
        scheduler
            .register_task(Box::new(Scripted::new("steady", &log)))
            .unwrap();
        scheduler.run().unwrap();

        let report = scheduler.wait_for_completion().unwrap();
        let faults: Vec<_> = report.faults().collect();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].task, "faulty");
        assert_eq!(faults[0].phase, Phase::Step);
        assert_eq!(faults[0].message, "step 3 failed");
        assert_eq!(report.task("steady").unwrap().outcome, TaskOutcome::Completed);

        // on_stop still ran for the faulty task.
        assert!(log.lock().unwrap().contains(&"faulty:stop".to_string()));
        assert!(quit
            .drain()
            .iter()
            .any(|e| e.payload == Payload::App(AppEvent::QuitRequested)));
    }

    #[test]
    fn start_panic_is_caught_and_stop_is_attempted() {
        let log = journal();
        let mut scheduler = Scheduler::new(SchedulerConfig::sequential(), AppContext::new());
        let mut bad = Scripted::new("bad", &log);
        bad.panic_on_start = true;
        scheduler.register_task(Box::new(bad)).unwrap();
        scheduler
            .register_task(Box::new(Scripted::new("good", &log)))
            .unwrap();
        scheduler.run().unwrap();

        let report = scheduler.wait_for_completion().unwrap();
        let fault = report.faults().next().unwrap();
        assert_eq!(fault.phase, Phase::Start);
        assert_eq!(fault.message, "panicked: boom");
        assert!(log.lock().unwrap().contains(&"bad:stop".to_string()));
        assert!(log.lock().unwrap().contains(&"good:stop".to_string()));
    }

    #[test]
    fn external_shutdown_request_stops_endless_tasks() {
        let log = journal();
        let mut scheduler = Scheduler::new(SchedulerConfig::default(), AppContext::new());
        scheduler
            .register_task(Box::new(Scripted::new("endless", &log)))
            .unwrap();
        scheduler.run().unwrap();
        thread::sleep(Duration::from_millis(10));
        scheduler.request_shutdown();

        let report = scheduler.wait_for_completion().unwrap();
        assert!(report.is_clean());
        assert!(scheduler.shutdown_signal().is_armed());
    }

    #[test]
    fn shutdown_broadcast_arms_the_signal() {
        let context = AppContext::new();
        let scheduler = Scheduler::new(SchedulerConfig::default(), Arc::clone(&context));
        context
            .bus
            .publish(APP_EVENT, Payload::App(AppEvent::ShuttingDown));
        assert!(!scheduler.shutdown_signal().is_armed());
        context.bus.publish(APP_EVENT, Payload::App(AppEvent::Shutdown));
        assert!(scheduler.shutdown_signal().is_armed());

        drop(scheduler);
        assert_eq!(context.bus.subscriber_count(APP_EVENT), 0);
    }
}
