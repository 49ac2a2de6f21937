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

//! Well-known topic and provider names.

/// Lifecycle signals ([`AppEvent`](crate::payload::AppEvent)).
pub const APP_EVENT: &str = "app_event";
/// Worker loading signals ([`ThreadEvent`](crate::payload::ThreadEvent)).
pub const THREAD_EVENT: &str = "thread_event";
/// Raw keyboard events.
pub const INPUT_KEYBOARD: &str = "input_keyboard";
/// Raw mouse events.
pub const INPUT_MOUSE: &str = "input_mouse";
/// Object-creation requests.
pub const CREATE_OBJECT: &str = "create_object";
/// Terrain-creation requests.
pub const CREATE_TERRAIN: &str = "create_terrain";
/// Object-removal requests.
pub const WORLD_REMOVED: &str = "world_removed";
/// World snapshots produced by the simulation.
pub const WORLD_DYNAMIC: &str = "world_dynamic";
/// User-interface actions.
pub const GUI_EVENT: &str = "gui_event";

/// Provider namespace answering `window.*` requests.
pub const WINDOW_PROVIDER: &str = "window";
/// Opaque platform window identifier.
pub const WINDOW_HANDLE: &str = "window.handle";
/// Debug-only scene inspection.
pub const SCENE_INSPECT: &str = "scene.inspect";
/// Provider namespace answering `settings.*` requests.
pub const SETTINGS_PROVIDER: &str = "settings";
