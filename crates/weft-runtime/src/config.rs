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

//! Runtime configuration, loaded from an optional JSON file.

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use weft_agents::{GameConfig, InputConfig, RenderConfig, SimulationConfig};
use weft_control::{SchedulerConfig, ThreadingMode};
use weft_core::feed::FeedConfig;
use weft_core::payload::SettingValue;

/// Environment variable naming the config file when no argument is given.
pub const CONFIG_ENV: &str = "WEFT_CONFIG";
/// Environment variable forcing the sequential threading mode when set to `1`.
pub const SEQUENTIAL_ENV: &str = "WEFT_SEQUENTIAL";

/// Everything the runtime can be told. Every section falls back to its
/// defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Feed bus settings.
    pub feed: FeedConfig,
    /// Game task settings.
    pub game: GameConfig,
    /// Simulation task settings.
    pub simulation: SimulationConfig,
    /// Render task settings.
    pub render: RenderConfig,
    /// Input task settings.
    pub input: InputConfig,
    /// Scripted user session replayed by the demo input source.
    pub demo: DemoConfig,
    /// Initial contents of the settings store.
    pub settings: BTreeMap<String, SettingValue>,
}

/// Timing of the scripted demo session, in input polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Polls before the start button is pressed.
    pub menu_polls: usize,
    /// Polls between each key tap once the game runs.
    pub game_polls: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            menu_polls: 100,
            game_polls: 150,
        }
    }
}

impl RuntimeConfig {
    /// Reads `path`, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            log::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// The config path: first CLI argument, then [`CONFIG_ENV`].
    pub fn locate(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
        args.next()
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    /// Applies [`SEQUENTIAL_ENV`].
    pub fn apply_env(&mut self, sequential: Option<&str>) {
        if sequential == Some("1") {
            self.scheduler.mode = ThreadingMode::Sequential;
        }
    }
}
