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

//! Process-wide named settings.

use crate::feed::DataProvider;
use crate::feed::topic::SETTINGS_PROVIDER;
use crate::payload::{NamedSetting, Payload, SettingValue};
use std::collections::HashMap;
use std::sync::RwLock;

/// A map of named settings, also reachable over the bus.
///
/// Offered as the `settings` provider namespace, so a worker can
/// `request("settings.fullscreen", ..)` without holding a reference to the
/// store. Unknown names are answered with `None`.
#[derive(Debug, Default)]
pub struct SettingsStore {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl SettingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated from `(name, value)` pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, SettingValue)>,
    {
        Self {
            values: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Reads a setting.
    pub fn get(&self, name: &str) -> Option<SettingValue> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Writes a setting, returning the previous value.
    pub fn set(&self, name: &str, value: SettingValue) -> Option<SettingValue> {
        log::debug!("SettingsStore: '{}' = {:?}", name, value);
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), value)
    }

    /// Number of settings.
    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DataProvider for SettingsStore {
    fn get_data(&self, name: &str) -> Option<Payload> {
        let key = name
            .strip_prefix(SETTINGS_PROVIDER)
            .and_then(|rest| rest.strip_prefix('.'))?;
        self.get(key).map(|value| {
            Payload::Setting(NamedSetting {
                name: key.to_string(),
                value,
            })
        })
    }
}
