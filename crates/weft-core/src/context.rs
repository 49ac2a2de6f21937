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

//! The process-wide context handed to every task at construction.

use crate::feed::topic::SETTINGS_PROVIDER;
use crate::feed::{FeedBus, FeedConfig};
use crate::registry::ObjectRegistry;
use crate::settings::SettingsStore;
use std::sync::Arc;

/// Everything the workers share: the feed bus, the object registry and the
/// settings store.
///
/// There is exactly one per process. It is created by the runtime and passed
/// explicitly (as `Arc<AppContext>`) into every task constructor.
pub struct AppContext {
    /// The feed bus.
    pub bus: FeedBus,
    /// Object handle allocation.
    pub objects: ObjectRegistry,
    /// Named settings. Also offered on the bus under `settings.*`.
    pub settings: Arc<SettingsStore>,
}

impl AppContext {
    /// Creates a context with the default bus configuration and no settings.
    pub fn new() -> Arc<Self> {
        Self::with_config(FeedConfig::default(), SettingsStore::new())
    }

    /// Creates a context and offers `settings` on the bus.
    pub fn with_config(feed: FeedConfig, settings: SettingsStore) -> Arc<Self> {
        let context = Arc::new(Self {
            bus: FeedBus::with_config(feed),
            objects: ObjectRegistry::new(),
            settings: Arc::new(settings),
        });
        context.bus.offer(SETTINGS_PROVIDER, &context.settings);
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Payload, SettingValue};
    use std::time::Duration;

    #[test]
    fn settings_are_reachable_over_the_bus() {
        let context = AppContext::new();
        context.settings.set("render.fps_cap", SettingValue::Int(60));

        let answer = context
            .bus
            .request("settings.render.fps_cap", Duration::ZERO)
            .unwrap();
        match answer {
            Payload::Setting(setting) => {
                assert_eq!(setting.name, "render.fps_cap");
                assert_eq!(setting.value, SettingValue::Int(60));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
