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

//! Data providers offered by the render task.

use weft_core::feed::topic::WINDOW_HANDLE;
use weft_core::feed::DataProvider;
use weft_core::payload::{Payload, WindowHandle};

/// Answers `window.handle`.
pub(crate) struct WindowProvider {
    handle: WindowHandle,
}

impl WindowProvider {
    pub(crate) fn new(handle: WindowHandle) -> Self {
        Self { handle }
    }
}

impl DataProvider for WindowProvider {
    fn get_data(&self, name: &str) -> Option<Payload> {
        (name == WINDOW_HANDLE).then_some(Payload::Window(self.handle))
    }
}

#[cfg(debug_assertions)]
pub(crate) use inspect::SceneInspector;

#[cfg(debug_assertions)]
mod inspect {
    use std::sync::Mutex;
    use weft_core::feed::topic::SCENE_INSPECT;
    use weft_core::feed::DataProvider;
    use weft_core::payload::{Payload, SceneSummary};

    /// Answers `scene.inspect` with the summary of the last presented frame.
    #[derive(Default)]
    pub(crate) struct SceneInspector {
        summary: Mutex<SceneSummary>,
    }

    impl SceneInspector {
        pub(crate) fn update(&self, summary: SceneSummary) {
            *self.summary.lock().unwrap_or_else(|e| e.into_inner()) = summary;
        }
    }

    impl DataProvider for SceneInspector {
        fn get_data(&self, name: &str) -> Option<Payload> {
            if name != SCENE_INSPECT {
                return None;
            }
            let summary = *self.summary.lock().unwrap_or_else(|e| e.into_inner());
            Some(Payload::Inspection(summary))
        }
    }
}
