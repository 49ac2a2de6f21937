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

//! The application lifecycle: a two-level state machine driven by feed events.
//!
//! `Active` contains the four interactive states; `Inactive` is a terminal
//! sibling. The machine never publishes anything itself: every transition
//! returns an ordered list of [`Effect`]s that its host carries out.

use weft_core::payload::{AppEvent, ButtonAction, GuiEvent, KeyCode, Payload, ThreadEvent};

/// Leaf states nested under `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveState {
    /// Workers are starting up.
    Loading,
    /// The main menu is shown.
    MainMenu,
    /// A game is in progress.
    MainGame,
    /// The settings dialog is open.
    Settings,
}

/// Top-level lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Running, in one of the nested states.
    Active(ActiveState),
    /// Shut down. Terminal.
    Inactive,
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Active(ActiveState::Loading)
    }
}

/// Inputs to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The user asked to quit.
    AppQuit,
    /// A shutdown broadcast was seen that this machine did not emit.
    ShutdownObserved,
    /// Every worker that announced itself is ready. Normally synthesized from
    /// the worker counter.
    FinishedLoading,
    /// The game world has been requested.
    MainGameStarted,
    /// The settings dialog was opened.
    SettingsDialogLaunched,
    /// The settings dialog was closed.
    SettingsClosed,
    /// A worker started loading.
    WorkerStarting,
    /// A worker finished loading.
    WorkerReady,
}

impl LifecycleEvent {
    /// Maps a bus payload to the event it drives, if any.
    ///
    /// `GuiEvent::DoButton` is deliberately absent: the host spawns the world
    /// first and then feeds [`LifecycleEvent::MainGameStarted`].
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::App(AppEvent::QuitRequested) => Some(Self::AppQuit),
            Payload::App(AppEvent::Shutdown) => Some(Self::ShutdownObserved),
            Payload::Thread(ThreadEvent::Starting) => Some(Self::WorkerStarting),
            Payload::Thread(ThreadEvent::Ready) => Some(Self::WorkerReady),
            Payload::Gui(GuiEvent::ExitButton) => Some(Self::AppQuit),
            Payload::Gui(GuiEvent::SettingsButton) => Some(Self::SettingsDialogLaunched),
            Payload::Gui(GuiEvent::SettingsClosed) => Some(Self::SettingsClosed),
            Payload::Keyboard(key) if key.action == ButtonAction::Pressed => match key.key {
                KeyCode::Q | KeyCode::Escape => Some(Self::AppQuit),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A side effect requested by a transition, in the order it must happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Publish the event on `app_event`.
    Broadcast(AppEvent),
    /// Ask for the terrain to be created.
    SpawnTerrain,
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Leaf(ActiveState),
    AnyActive,
}

struct Transition {
    source: Source,
    event: LifecycleEvent,
    target: LifecycleState,
    /// Runs before exit and entry actions.
    actions: &'static [Effect],
    /// Skips exit and entry actions.
    quiet: bool,
}

const fn rule(
    source: Source,
    event: LifecycleEvent,
    target: LifecycleState,
    actions: &'static [Effect],
) -> Transition {
    Transition {
        source,
        event,
        target,
        actions,
        quiet: false,
    }
}

use ActiveState::*;
use LifecycleEvent as Ev;

const TRANSITIONS: &[Transition] = &[
    rule(
        Source::AnyActive,
        Ev::AppQuit,
        LifecycleState::Inactive,
        &[Effect::Broadcast(AppEvent::ShuttingDown)],
    ),
    Transition {
        quiet: true,
        ..rule(
            Source::AnyActive,
            Ev::ShutdownObserved,
            LifecycleState::Inactive,
            &[],
        )
    },
    rule(
        Source::Leaf(Loading),
        Ev::FinishedLoading,
        LifecycleState::Active(MainMenu),
        &[],
    ),
    rule(
        Source::Leaf(MainMenu),
        Ev::MainGameStarted,
        LifecycleState::Active(MainGame),
        &[],
    ),
    rule(
        Source::Leaf(MainMenu),
        Ev::SettingsDialogLaunched,
        LifecycleState::Active(Settings),
        &[],
    ),
    rule(
        Source::Leaf(Settings),
        Ev::SettingsClosed,
        LifecycleState::Active(MainMenu),
        &[],
    ),
];

fn lookup(leaf: ActiveState, event: LifecycleEvent) -> Option<&'static Transition> {
    let leaf_match = TRANSITIONS
        .iter()
        .find(|t| t.event == event && matches!(t.source, Source::Leaf(s) if s == leaf));
    leaf_match.or_else(|| {
        TRANSITIONS
            .iter()
            .find(|t| t.event == event && matches!(t.source, Source::AnyActive))
    })
}

fn exit_effects(leaf: ActiveState, target: LifecycleState, out: &mut Vec<Effect>) {
    if leaf == Loading && matches!(target, LifecycleState::Active(_)) {
        out.push(Effect::Broadcast(AppEvent::Started));
    }
    if target == LifecycleState::Inactive {
        out.push(Effect::Broadcast(AppEvent::Shutdown));
    }
}

fn entry_effects(target: LifecycleState, out: &mut Vec<Effect>) {
    match target {
        LifecycleState::Active(Loading) => out.push(Effect::Broadcast(AppEvent::Starting)),
        LifecycleState::Active(MainGame) => out.push(Effect::SpawnTerrain),
        _ => {}
    }
}

/// The lifecycle state machine.
///
/// Mutated only by its host, from a single thread.
#[derive(Debug, Default)]
pub struct LifecycleMachine {
    state: LifecycleState,
    initiated: bool,
    loading_workers: u32,
}

impl LifecycleMachine {
    /// Creates a machine in `Active/Loading` that has not been initiated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the initial state and returns its entry effects. Only the first
    /// call has any effect.
    pub fn initiate(&mut self) -> Vec<Effect> {
        if self.initiated {
            return Vec::new();
        }
        self.initiated = true;
        let mut effects = Vec::new();
        entry_effects(self.state, &mut effects);
        log::info!("Lifecycle: initiated in {:?}", self.state);
        effects
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the machine reached `Inactive`.
    pub fn is_terminated(&self) -> bool {
        self.state == LifecycleState::Inactive
    }

    /// Workers that announced `Starting` and are not `Ready` yet.
    pub fn loading_workers(&self) -> u32 {
        self.loading_workers
    }

    /// Feeds one event and returns the effects of the resulting transition,
    /// which is empty when the event does not apply in the current state.
    pub fn handle(&mut self, event: LifecycleEvent) -> Vec<Effect> {
        let LifecycleState::Active(leaf) = self.state else {
            log::trace!("Lifecycle: {:?} ignored, machine is inactive", event);
            return Vec::new();
        };

        match event {
            Ev::WorkerStarting => {
                self.loading_workers += 1;
                log::debug!("Lifecycle: {} workers loading", self.loading_workers);
                return Vec::new();
            }
            Ev::WorkerReady => {
                if self.loading_workers == 0 {
                    log::warn!("Lifecycle: worker ready without a matching start");
                    return Vec::new();
                }
                self.loading_workers -= 1;
                log::debug!("Lifecycle: {} workers loading", self.loading_workers);
                if self.loading_workers > 0 {
                    return Vec::new();
                }
                return self.handle(Ev::FinishedLoading);
            }
            _ => {}
        }

        let Some(transition) = lookup(leaf, event) else {
            log::debug!("Lifecycle: {:?} has no transition from {:?}", event, leaf);
            return Vec::new();
        };

        let mut effects = transition.actions.to_vec();
        if !transition.quiet {
            exit_effects(leaf, transition.target, &mut effects);
            entry_effects(transition.target, &mut effects);
        }
        log::info!(
            "Lifecycle: {:?} → {:?} on {:?}",
            self.state,
            transition.target,
            event
        );
        self.state = transition.target;
        effects
    }
}
