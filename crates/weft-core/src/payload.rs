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

//! The fixed set of payload kinds that travel through the feed bus.
//!
//! Every [`Envelope`] carries exactly one [`Payload`]. Payloads are plain values:
//! subscribers only ever see them through a shared reference, and the one large
//! payload (a world snapshot) is shared as an immutable `Arc`.

use crate::math::{Quaternion, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Integer identity of a simulated object, allocated by the
/// [`ObjectRegistry`](crate::registry::ObjectRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State change of a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonAction {
    /// The button went down.
    Pressed,
    /// The button went up.
    Released,
    /// No button change (pure motion).
    Same,
}

/// Keys the engine reacts to. Everything else is forwarded as a raw scan code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// The `Q` key.
    Q,
    /// Escape.
    Escape,
    /// Space bar.
    Space,
    /// Return or keypad enter.
    Enter,
    /// A key with no dedicated variant.
    Other(u32),
}

/// A keyboard event as published on `input_keyboard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    /// The key involved.
    pub key: KeyCode,
    /// Whether it was pressed or released.
    pub action: ButtonAction,
}

impl KeyboardEvent {
    /// A key-down event.
    pub fn pressed(key: KeyCode) -> Self {
        Self {
            key,
            action: ButtonAction::Pressed,
        }
    }

    /// A key-up event.
    pub fn released(key: KeyCode) -> Self {
        Self {
            key,
            action: ButtonAction::Released,
        }
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
}

/// A mouse event as published on `input_mouse`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    /// The button involved, if any.
    pub button: Option<MouseButton>,
    /// What happened to the button.
    pub action: ButtonAction,
    /// Absolute cursor X.
    pub x: i32,
    /// Absolute cursor Y.
    pub y: i32,
    /// Relative motion on X since the previous event.
    pub dx: i32,
    /// Relative motion on Y since the previous event.
    pub dy: i32,
}

/// Application lifecycle signals, published on `app_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppEvent {
    /// The application entered its loading phase.
    Starting,
    /// Loading finished.
    Started,
    /// Someone asked the application to quit. The lifecycle host turns this
    /// into a state transition.
    QuitRequested,
    /// The lifecycle machine accepted a quit and is about to shut down.
    ShuttingDown,
    /// Final broadcast: every task must stop.
    Shutdown,
}

/// Worker loading signals, published on `thread_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadEvent {
    /// A worker began an asynchronous loading sequence.
    Starting,
    /// A worker finished loading and is ready.
    Ready,
}

/// Actions raised by the user interface, published on `gui_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuiEvent {
    /// Start the game.
    DoButton,
    /// Quit the application.
    ExitButton,
    /// Open the settings dialog.
    SettingsButton,
    /// Close the settings dialog.
    SettingsClosed,
}

/// One entry of a world snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneNode {
    /// Which object this transform belongs to.
    pub handle: ObjectHandle,
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation.
    pub orientation: Quaternion,
}

/// A request to create an object (or a terrain patch) in every interested worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectToCreate {
    /// Initial transform; `node.handle` is already allocated.
    pub node: SceneNode,
    /// Scale applied by whoever builds the visual or physical body.
    pub scale: Vec3,
    /// Opaque resource specification, e.g. a mesh name.
    pub specification: String,
}

/// A complete, consistent copy of the simulated world at one production cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldGraph {
    /// Production cycle that built this snapshot. Strictly increasing per producer.
    pub sequence: u64,
    /// Transforms in producer order.
    pub nodes: Vec<SceneNode>,
}

impl WorldGraph {
    /// Creates an empty snapshot for the given production cycle.
    pub fn new(sequence: u64) -> Self {
        Self {
            sequence,
            nodes: Vec::new(),
        }
    }

    /// Number of nodes in the snapshot.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the snapshot holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up the node for `handle`.
    pub fn node(&self, handle: ObjectHandle) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.handle == handle)
    }
}

/// Value of a named setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// A flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// Free text.
    Text(String),
}

/// A generic named setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSetting {
    /// Fully qualified setting name.
    pub name: String,
    /// Current value.
    pub value: SettingValue,
}

/// Opaque platform window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

/// Read-only summary returned by the debug scene-inspection provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneSummary {
    /// Sequence of the snapshot currently on screen.
    pub sequence: u64,
    /// Number of nodes in it.
    pub nodes: usize,
    /// Frames presented so far.
    pub frames: u64,
}

/// Tagged union over every payload kind the system moves around.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Key press or release.
    Keyboard(KeyboardEvent),
    /// Mouse button or motion.
    Mouse(MouseEvent),
    /// Application lifecycle signal.
    App(AppEvent),
    /// Worker loading signal.
    Thread(ThreadEvent),
    /// User interface action.
    Gui(GuiEvent),
    /// Request to create an object.
    CreateObject(ObjectToCreate),
    /// Request to create a terrain patch.
    CreateTerrain(ObjectToCreate),
    /// Request to remove an object.
    RemoveObject(ObjectHandle),
    /// Complete world state at one production cycle.
    WorldSnapshot(Arc<WorldGraph>),
    /// Answer to a `settings.*` request.
    Setting(NamedSetting),
    /// Answer to a `window.*` request.
    Window(WindowHandle),
    /// Answer to a `scene.inspect` request.
    Inspection(SceneSummary),
}

impl Payload {
    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Keyboard(_) => "keyboard",
            Payload::Mouse(_) => "mouse",
            Payload::App(_) => "app",
            Payload::Thread(_) => "thread",
            Payload::Gui(_) => "gui",
            Payload::CreateObject(_) => "create_object",
            Payload::CreateTerrain(_) => "create_terrain",
            Payload::RemoveObject(_) => "remove_object",
            Payload::WorldSnapshot(_) => "world_snapshot",
            Payload::Setting(_) => "setting",
            Payload::Window(_) => "window",
            Payload::Inspection(_) => "inspection",
        }
    }

    /// Returns the lifecycle signal, if this is one.
    pub fn as_app(&self) -> Option<AppEvent> {
        match self {
            Payload::App(ev) => Some(*ev),
            _ => None,
        }
    }

    /// Returns the worker signal, if this is one.
    pub fn as_thread(&self) -> Option<ThreadEvent> {
        match self {
            Payload::Thread(ev) => Some(*ev),
            _ => None,
        }
    }

    /// Returns the keyboard event, if this is one.
    pub fn as_keyboard(&self) -> Option<KeyboardEvent> {
        match self {
            Payload::Keyboard(ev) => Some(*ev),
            _ => None,
        }
    }

    /// Returns the GUI action, if this is one.
    pub fn as_gui(&self) -> Option<GuiEvent> {
        match self {
            Payload::Gui(ev) => Some(*ev),
            _ => None,
        }
    }

    /// Returns the window handle, if this is one.
    pub fn as_window(&self) -> Option<WindowHandle> {
        match self {
            Payload::Window(handle) => Some(*handle),
            _ => None,
        }
    }
}

/// A topic-tagged payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The topic this envelope was published on.
    pub topic: Arc<str>,
    /// The payload.
    pub payload: Payload,
}

impl Envelope {
    /// Wraps a payload for the given topic.
    pub fn new(topic: impl Into<Arc<str>>, payload: Payload) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}
