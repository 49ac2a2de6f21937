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

//! Allocation of object handles.

use crate::payload::ObjectHandle;
use std::collections::HashMap;
use std::sync::Mutex;

/// Hands out [`ObjectHandle`]s and remembers what each one was created as.
///
/// Shared by every worker through the [`AppContext`](crate::AppContext); the
/// game logic allocates handles, the simulation and render workers look names
/// up when they build their own representations.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next: u32,
    names: HashMap<ObjectHandle, String>,
}

impl ObjectRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new handle for an object called `name`.
    ///
    /// Handles wrap around after `u32::MAX` and skip any that are still live.
    pub fn add_object(&self, name: &str) -> ObjectHandle {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let handle = loop {
            let candidate = ObjectHandle(inner.next);
            inner.next = match inner.next.checked_add(1) {
                Some(next) => next,
                None => {
                    log::warn!("ObjectRegistry: handle space exhausted, wrapping around");
                    0
                }
            };
            if !inner.names.contains_key(&candidate) {
                break candidate;
            }
        };
        inner.names.insert(handle, name.to_string());
        handle
    }

    /// Forgets `handle`. Returns its name if it was known.
    pub fn remove_object(&self, handle: ObjectHandle) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .names
            .remove(&handle)
    }

    /// The name `handle` was created with.
    pub fn name_of(&self, handle: ObjectHandle) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .names
            .get(&handle)
            .cloned()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).names.len()
    }

    /// Returns `true` if no objects are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
