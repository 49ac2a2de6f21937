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

//! Defines the InputTask, which republishes device input on the bus.

use super::source::{InputSource, RawInput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use weft_core::feed::topic::{GUI_EVENT, INPUT_KEYBOARD, INPUT_MOUSE, WINDOW_HANDLE};
use weft_core::payload::Payload;
use weft_core::{AppContext, FrameTime, RunFlag, Task};

/// Configuration of the [`InputTask`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// How long `on_start` waits for the window handle.
    pub window_timeout_ms: u64,
    /// Pause between polls.
    pub poll_interval_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            window_timeout_ms: 2000,
            poll_interval_ms: 10,
        }
    }
}

/// The input task.
pub struct InputTask {
    context: Arc<AppContext>,
    config: InputConfig,
    running: RunFlag,
    source: Box<dyn InputSource>,
    published: u64,
}

impl InputTask {
    /// Creates the task around `source`.
    pub fn new(
        context: Arc<AppContext>,
        config: InputConfig,
        source: Box<dyn InputSource>,
    ) -> Self {
        Self {
            context,
            config,
            running: RunFlag::new(),
            source,
            published: 0,
        }
    }

    /// Input events republished so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    fn republish(&mut self, input: RawInput) {
        let (topic, payload) = match input {
            RawInput::Keyboard(event) => (INPUT_KEYBOARD, Payload::Keyboard(event)),
            RawInput::Mouse(event) => (INPUT_MOUSE, Payload::Mouse(event)),
            RawInput::Gui(event) => (GUI_EVENT, Payload::Gui(event)),
        };
        self.context.bus.publish(topic, payload);
        self.published += 1;
    }
}

impl Task for InputTask {
    fn name(&self) -> &str {
        "input"
    }

    fn on_start(&mut self) -> anyhow::Result<()> {
        self.running.stop_on_shutdown(&self.context.bus, "InputTask");

        let timeout = Duration::from_millis(self.config.window_timeout_ms);
        let window = match self.context.bus.request(WINDOW_HANDLE, timeout) {
            Ok(payload) => payload.as_window(),
            Err(err) if err.is_retryable() => {
                log::warn!(
                    "InputTask: {} [{}]; polling without a window",
                    err,
                    err.as_label()
                );
                None
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(handle) = window {
            log::info!("InputTask: attached to window {}", handle.0);
        }
        self.source.attach(window)
    }

    fn on_step(&mut self, _frame: &FrameTime) -> anyhow::Result<bool> {
        for input in self.source.poll() {
            self.republish(input);
        }
        thread::sleep(Duration::from_millis(self.config.poll_interval_ms));
        Ok(self.running.is_running())
    }

    fn on_stop(&mut self) -> anyhow::Result<()> {
        log::info!("InputTask: republished {} events", self.published);
        Ok(())
    }
}
