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

//! Input sources: where raw device input comes from.

use std::collections::VecDeque;
use weft_core::payload::{GuiEvent, KeyboardEvent, MouseEvent, WindowHandle};

/// One unit of raw input, already translated to bus types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    /// A key went down or up.
    Keyboard(KeyboardEvent),
    /// The mouse moved or a button changed.
    Mouse(MouseEvent),
    /// A user-interface action.
    Gui(GuiEvent),
}

/// A device-polling backend.
///
/// Implementations wrap whatever library talks to the platform. The input task
/// attaches the source to the window it obtained (if any) during `on_start`
/// and then polls it once per step.
pub trait InputSource: Send {
    /// Binds the source to a window. `None` when no window was offered in time.
    fn attach(&mut self, window: Option<WindowHandle>) -> anyhow::Result<()> {
        let _ = window;
        Ok(())
    }

    /// Returns everything that happened since the previous call.
    fn poll(&mut self) -> Vec<RawInput>;
}

/// A source that replays a fixed script, one batch per poll.
///
/// Used by the demo runtime and by tests in place of a real device backend.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    batches: VecDeque<Vec<RawInput>>,
    window: Option<WindowHandle>,
}

impl ScriptedInput {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `polls` empty batches.
    pub fn idle(mut self, polls: usize) -> Self {
        self.batches.extend(std::iter::repeat_with(Vec::new).take(polls));
        self
    }

    /// Appends a batch delivering `input` on a single poll.
    pub fn then(mut self, input: RawInput) -> Self {
        self.batches.push_back(vec![input]);
        self
    }

    /// Appends a press and a release of `key` on consecutive polls.
    pub fn tap(self, key: weft_core::payload::KeyCode) -> Self {
        self.then(RawInput::Keyboard(KeyboardEvent::pressed(key)))
            .then(RawInput::Keyboard(KeyboardEvent::released(key)))
    }

    /// Batches not yet delivered.
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }

    /// The window the source was attached to.
    pub fn window(&self) -> Option<WindowHandle> {
        self.window
    }
}

impl InputSource for ScriptedInput {
    fn attach(&mut self, window: Option<WindowHandle>) -> anyhow::Result<()> {
        self.window = window;
        Ok(())
    }

    fn poll(&mut self) -> Vec<RawInput> {
        self.batches.pop_front().unwrap_or_default()
    }
}
