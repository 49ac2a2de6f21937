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

//! The four reference tasks under the scheduler, driven by a scripted user.

use std::sync::Arc;
use weft_agents::game_agent::GridConfig;
use weft_agents::{
    GameConfig, GameTask, InputConfig, InputTask, RawInput, RenderConfig, RenderTask,
    ScriptedInput, SimulationConfig, SimulationTask,
};
use weft_control::{Scheduler, SchedulerConfig};
use weft_core::feed::topic::{APP_EVENT, CREATE_OBJECT, CREATE_TERRAIN, WORLD_DYNAMIC};
use weft_core::payload::{AppEvent, GuiEvent, KeyCode};
use weft_core::AppContext;

fn run_session(config: SchedulerConfig) {
    let context = AppContext::new();
    let app_events = context.bus.subscribe_queue(APP_EVENT);
    let objects = context.bus.subscribe_queue(CREATE_OBJECT);
    let terrain = context.bus.subscribe_queue(CREATE_TERRAIN);
    let snapshots = context.bus.subscribe_queue(WORLD_DYNAMIC);

    let game = GameTask::new(
        Arc::clone(&context),
        GameConfig {
            step_interval_ms: 1,
            grid: GridConfig {
                count: 2,
                seed: Some(3),
                ..GridConfig::default()
            },
            ..GameConfig::default()
        },
    );
    let render = RenderTask::new(
        Arc::clone(&context),
        RenderConfig {
            frame_interval_ms: 2,
            ..RenderConfig::default()
        },
    );
    let simulation = SimulationTask::new(
        Arc::clone(&context),
        SimulationConfig {
            cycle_pause_ms: 1,
            ..SimulationConfig::default()
        },
    );
    let script = ScriptedInput::new()
        .idle(50)
        .then(RawInput::Gui(GuiEvent::DoButton))
        .idle(10)
        .tap(KeyCode::Left)
        .idle(10)
        .tap(KeyCode::Escape);
    let input = InputTask::new(
        Arc::clone(&context),
        InputConfig {
            poll_interval_ms: 2,
            ..InputConfig::default()
        },
        Box::new(script),
    );

    let mut scheduler = Scheduler::new(config, Arc::clone(&context));
    scheduler.register_task(Box::new(game)).unwrap();
    scheduler.register_task(Box::new(render)).unwrap();
    scheduler.register_task(Box::new(simulation)).unwrap();
    scheduler.register_task(Box::new(input)).unwrap();
    scheduler.run().unwrap();
    let report = scheduler.wait_for_completion().unwrap();

    assert!(report.is_clean(), "faults: {:?}", report.faults().collect::<Vec<_>>());
    assert_eq!(report.tasks.len(), 4);

    let lifecycle: Vec<AppEvent> = app_events
        .drain()
        .into_iter()
        .filter_map(|e| e.payload.as_app())
        .collect();
    assert_eq!(
        lifecycle,
        [
            AppEvent::Starting,
            AppEvent::Started,
            AppEvent::ShuttingDown,
            AppEvent::Shutdown
        ]
    );
    assert_eq!(objects.len(), 8);
    assert_eq!(terrain.len(), 1);
    assert!(!snapshots.is_empty());
    assert_eq!(context.objects.len(), 9);
}

#[test]
fn threaded_session_runs_to_a_clean_shutdown() {
    run_session(SchedulerConfig::default());
}

#[test]
fn sequential_session_runs_to_a_clean_shutdown() {
    run_session(SchedulerConfig::sequential());
}
