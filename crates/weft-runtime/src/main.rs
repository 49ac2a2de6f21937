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

//! The Weft demo runtime.
//!
//! Builds the shared context, registers the four reference tasks and runs a
//! scripted session until the lifecycle machine shuts everything down.

mod config;

use anyhow::Result;
use config::{RuntimeConfig, SEQUENTIAL_ENV};
use std::sync::Arc;
use weft_agents::{
    GameTask, InputTask, RawInput, RenderTask, ScriptedInput, SimulationTask,
};
use weft_control::Scheduler;
use weft_core::payload::{GuiEvent, KeyCode};
use weft_core::settings::SettingsStore;
use weft_core::AppContext;

fn demo_script(config: &config::DemoConfig) -> ScriptedInput {
    ScriptedInput::new()
        .idle(config.menu_polls)
        .then(RawInput::Gui(GuiEvent::DoButton))
        .idle(config.game_polls)
        .tap(KeyCode::Left)
        .idle(config.game_polls)
        .tap(KeyCode::Right)
        .idle(config.game_polls)
        .tap(KeyCode::Escape)
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    let path = RuntimeConfig::locate(std::env::args().skip(1));
    let mut config = RuntimeConfig::load(path.as_deref())?;
    config.apply_env(std::env::var(SEQUENTIAL_ENV).ok().as_deref());

    let filter = config.log_filter.clone().unwrap_or_else(|| "info".to_string());
    Builder::from_env(Env::default().default_filter_or(filter)).init();
    if let Some(path) = &path {
        log::info!("Loaded configuration from {}", path.display());
    }

    let settings = SettingsStore::from_entries(config.settings.clone());
    let context = AppContext::with_config(config.feed.clone(), settings);

    let mut scheduler = Scheduler::new(config.scheduler.clone(), Arc::clone(&context));
    scheduler.register_task(Box::new(GameTask::new(
        Arc::clone(&context),
        config.game.clone(),
    )))?;
    scheduler.register_task(Box::new(RenderTask::new(
        Arc::clone(&context),
        config.render.clone(),
    )))?;
    scheduler.register_task(Box::new(SimulationTask::new(
        Arc::clone(&context),
        config.simulation.clone(),
    )))?;
    scheduler.register_task(Box::new(InputTask::new(
        Arc::clone(&context),
        config.input.clone(),
        Box::new(demo_script(&config.demo)),
    )))?;

    scheduler.run()?;
    let report = scheduler.wait_for_completion()?;
    for task in &report.tasks {
        log::info!("{} ({}): {} after {} steps", task.name, task.id, task.outcome, task.steps);
    }

    let result = match report.faults().next() {
        Some(fault) => Err(fault.clone().into()),
        None => Ok(()),
    };
    result
}
