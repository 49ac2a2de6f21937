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

//! Defines the GameTask, host of the application lifecycle.

use super::grid::GridConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use weft_control::lifecycle::{
    ActiveState, Effect, LifecycleEvent, LifecycleMachine, LifecycleState,
};
use weft_core::feed::topic::{
    APP_EVENT, CREATE_OBJECT, CREATE_TERRAIN, GUI_EVENT, INPUT_KEYBOARD, THREAD_EVENT,
};
use weft_core::feed::FeedReceiver;
use weft_core::math::{Quaternion, Vec3};
use weft_core::payload::{GuiEvent, ObjectToCreate, Payload, SceneNode};
use weft_core::{AppContext, Envelope, FrameTime, RunFlag, Task};

/// Configuration of the [`GameTask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Pause at the end of every step.
    pub step_interval_ms: u64,
    /// Object grid spawned by the start button.
    pub grid: GridConfig,
    /// Resource specification of the terrain created on entering the game.
    pub terrain_specification: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: 10,
            grid: GridConfig::default(),
            terrain_specification: "simple.terrain".to_string(),
        }
    }
}

/// The game-logic task.
///
/// Its subscriptions are queued and created at construction, so lifecycle
/// events published by workers that start before it are not lost.
pub struct GameTask {
    context: Arc<AppContext>,
    config: GameConfig,
    machine: LifecycleMachine,
    running: RunFlag,
    rng: StdRng,
    thread_events: FeedReceiver,
    app_events: FeedReceiver,
    keyboard: FeedReceiver,
    gui: FeedReceiver,
    objects_spawned: usize,
}

impl GameTask {
    /// Creates the task and subscribes its queues.
    pub fn new(context: Arc<AppContext>, config: GameConfig) -> Self {
        let bus = &context.bus;
        let thread_events = bus.subscribe_queue(THREAD_EVENT);
        let app_events = bus.subscribe_queue(APP_EVENT);
        let keyboard = bus.subscribe_queue(INPUT_KEYBOARD);
        let gui = bus.subscribe_queue(GUI_EVENT);
        let rng = match config.grid.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            context,
            config,
            machine: LifecycleMachine::new(),
            running: RunFlag::new(),
            rng,
            thread_events,
            app_events,
            keyboard,
            gui,
            objects_spawned: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.machine.state()
    }

    /// Objects requested so far.
    pub fn objects_spawned(&self) -> usize {
        self.objects_spawned
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Broadcast(event) => {
                    log::debug!("GameTask: broadcasting {:?}", event);
                    self.context.bus.publish(APP_EVENT, Payload::App(event));
                }
                Effect::SpawnTerrain => self.spawn_terrain(),
            }
        }
    }

    fn spawn_terrain(&mut self) {
        let spec = &self.config.terrain_specification;
        let terrain = ObjectToCreate {
            node: SceneNode {
                handle: self.context.objects.add_object(spec),
                position: Vec3::ZERO,
                orientation: Quaternion::IDENTITY,
            },
            scale: Vec3::ONE,
            specification: spec.clone(),
        };
        log::info!("GameTask: requesting terrain {}", terrain.node.handle);
        self.context
            .bus
            .publish(CREATE_TERRAIN, Payload::CreateTerrain(terrain));
    }

    fn start_main_game(&mut self) {
        if self.machine.state() != LifecycleState::Active(ActiveState::MainMenu) {
            log::debug!(
                "GameTask: start button ignored in {:?}",
                self.machine.state()
            );
            return;
        }

        let objects = &self.context.objects;
        let name = &self.config.grid.object_name;
        let grid = self
            .config
            .grid
            .build(&mut self.rng, || objects.add_object(name));
        log::info!("GameTask: spawning {} objects", grid.len());
        for object in grid {
            self.context
                .bus
                .publish(CREATE_OBJECT, Payload::CreateObject(object));
            self.objects_spawned += 1;
        }

        let effects = self.machine.handle(LifecycleEvent::MainGameStarted);
        self.apply(effects);
    }

    fn dispatch(&mut self, envelope: Envelope) {
        if envelope.payload == Payload::Gui(GuiEvent::DoButton) {
            self.start_main_game();
            return;
        }
        if let Some(event) = LifecycleEvent::from_payload(&envelope.payload) {
            let effects = self.machine.handle(event);
            self.apply(effects);
        }
    }

    /// Drains every queue, in a fixed topic order.
    fn pump(&mut self) {
        let pending: Vec<Envelope> = [
            &self.thread_events,
            &self.app_events,
            &self.keyboard,
            &self.gui,
        ]
        .into_iter()
        .flat_map(|queue| queue.drain())
        .collect();

        for envelope in pending {
            self.dispatch(envelope);
        }
    }
}

impl Task for GameTask {
    fn name(&self) -> &str {
        "game"
    }

    fn on_start(&mut self) -> anyhow::Result<()> {
        self.running.stop_on_shutdown(&self.context.bus, "GameTask");
        let effects = self.machine.initiate();
        self.apply(effects);
        Ok(())
    }

    fn on_step(&mut self, _frame: &FrameTime) -> anyhow::Result<bool> {
        self.pump();
        if self.machine.is_terminated() {
            return Ok(false);
        }
        thread::sleep(Duration::from_millis(self.config.step_interval_ms));
        Ok(self.running.is_running())
    }

    fn on_stop(&mut self) -> anyhow::Result<()> {
        // A fault elsewhere arms the shutdown flag right after queuing its quit
        // request, so this task can be stopped before it ever steps again.
        for envelope in self.app_events.drain() {
            self.dispatch(envelope);
        }
        if !self.machine.is_terminated() {
            log::info!(
                "GameTask: stopped in {:?}, completing the quit",
                self.machine.state()
            );
            let effects = self.machine.handle(LifecycleEvent::AppQuit);
            self.apply(effects);
        }

        log::info!(
            "GameTask: stopped in {:?} after spawning {} objects",
            self.machine.state(),
            self.objects_spawned
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::payload::{AppEvent, KeyCode, KeyboardEvent, ThreadEvent};

    fn small_config() -> GameConfig {
        GameConfig {
            step_interval_ms: 0,
            grid: GridConfig {
                count: 2,
                seed: Some(1),
                ..GridConfig::default()
            },
            ..GameConfig::default()
        }
    }

    fn app_events(queue: &FeedReceiver) -> Vec<AppEvent> {
        queue
            .drain()
            .into_iter()
            .filter_map(|e| e.payload.as_app())
            .collect()
    }

    #[test]
    fn test_full_session() {
        let context = AppContext::new();
        let observed = context.bus.subscribe_queue(APP_EVENT);
        let objects = context.bus.subscribe_queue(CREATE_OBJECT);
        let terrain = context.bus.subscribe_queue(CREATE_TERRAIN);
        let mut game = GameTask::new(Arc::clone(&context), small_config());
        let bus = &context.bus;
        let frame = FrameTime::default();

        // A worker announces itself before the game thread starts.
        bus.publish(THREAD_EVENT, Payload::Thread(ThreadEvent::Starting));

        game.on_start().unwrap();
        assert_eq!(app_events(&observed), [AppEvent::Starting]);

        bus.publish(THREAD_EVENT, Payload::Thread(ThreadEvent::Ready));
        assert!(game.on_step(&frame).unwrap());
        assert_eq!(game.state(), LifecycleState::Active(ActiveState::MainMenu));
        assert_eq!(app_events(&observed), [AppEvent::Started]);

        bus.publish(GUI_EVENT, Payload::Gui(GuiEvent::DoButton));
        assert!(game.on_step(&frame).unwrap());
        assert_eq!(game.state(), LifecycleState::Active(ActiveState::MainGame));
        assert_eq!(objects.len(), 8);
        assert_eq!(game.objects_spawned(), 8);
        assert_eq!(terrain.len(), 1);
        // 8 grid objects plus the terrain.
        assert_eq!(context.objects.len(), 9);

        bus.publish(
            INPUT_KEYBOARD,
            Payload::Keyboard(KeyboardEvent::pressed(KeyCode::Q)),
        );
        assert!(!game.on_step(&frame).unwrap());
        assert_eq!(game.state(), LifecycleState::Inactive);
        assert_eq!(
            app_events(&observed),
            [AppEvent::ShuttingDown, AppEvent::Shutdown]
        );
        game.on_stop().unwrap();
    }

    #[test]
    fn test_start_button_outside_menu_is_ignored() {
        let context = AppContext::new();
        let objects = context.bus.subscribe_queue(CREATE_OBJECT);
        let mut game = GameTask::new(Arc::clone(&context), small_config());
        game.on_start().unwrap();

        context
            .bus
            .publish(GUI_EVENT, Payload::Gui(GuiEvent::DoButton));
        game.on_step(&FrameTime::default()).unwrap();
        assert!(objects.is_empty());
        assert_eq!(game.state(), LifecycleState::Active(ActiveState::Loading));
    }

    #[test]
    fn test_stop_completes_a_pending_quit() {
        let context = AppContext::new();
        let observed = context.bus.subscribe_queue(APP_EVENT);
        let mut game = GameTask::new(Arc::clone(&context), small_config());
        game.on_start().unwrap();

        // Queued but never stepped: the scheduler stopped the task first.
        context
            .bus
            .publish(APP_EVENT, Payload::App(AppEvent::QuitRequested));
        game.on_stop().unwrap();

        assert_eq!(game.state(), LifecycleState::Inactive);
        assert_eq!(
            app_events(&observed),
            [
                AppEvent::Starting,
                AppEvent::QuitRequested,
                AppEvent::ShuttingDown,
                AppEvent::Shutdown
            ]
        );
    }

    #[test]
    fn test_stop_after_observed_shutdown_broadcasts_nothing() {
        let context = AppContext::new();
        let mut game = GameTask::new(Arc::clone(&context), small_config());
        game.on_start().unwrap();
        context.bus.publish(APP_EVENT, Payload::App(AppEvent::Shutdown));

        let observed = context.bus.subscribe_queue(APP_EVENT);
        game.on_stop().unwrap();
        assert_eq!(game.state(), LifecycleState::Inactive);
        assert!(observed.is_empty());
    }

    #[test]
    fn test_config_fills_missing_fields_from_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "grid": { "count": 3, "seed": 9 } }"#).unwrap();
        assert_eq!(config.step_interval_ms, 10);
        assert_eq!(config.terrain_specification, "simple.terrain");
        assert_eq!(config.grid.count, 3);
        assert_eq!(config.grid.seed, Some(9));
        assert_eq!(config.grid.spacing, 20.0);
        assert_eq!(config.grid.object_name, "ogrehead");
    }

    #[test]
    fn test_quit_request_from_a_faulted_worker_shuts_down() {
        let context = AppContext::new();
        let mut game = GameTask::new(Arc::clone(&context), small_config());
        game.on_start().unwrap();

        context
            .bus
            .publish(APP_EVENT, Payload::App(AppEvent::QuitRequested));
        assert!(!game.on_step(&FrameTime::default()).unwrap());
        assert!(!game.running.is_running());
    }
}
