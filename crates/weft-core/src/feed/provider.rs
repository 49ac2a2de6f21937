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

//! Named data providers for the request/response side of the bus.

use crate::error::FeedError;
use crate::payload::Payload;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Something that can synchronously answer `request(name)` calls.
///
/// `get_data` runs on the *requesting* thread, so implementations must
/// synchronize their own state. Returning `None` means "not available yet":
/// the requester keeps polling until its deadline.
pub trait DataProvider: Send + Sync {
    /// Answers a request for `name` (the full requested name, not the
    /// namespace the provider was offered under).
    fn get_data(&self, name: &str) -> Option<Payload>;
}

/// Name → provider table. Holds weak references only: the bus never keeps a
/// provider alive.
#[derive(Default)]
pub(crate) struct ProviderRegistry {
    entries: HashMap<String, Weak<dyn DataProvider>>,
}

impl ProviderRegistry {
    /// Installs `provider` under `name`, returning a conflict if a different
    /// live provider was displaced.
    pub fn insert(&mut self, name: &str, provider: Weak<dyn DataProvider>) -> Option<FeedError> {
        let previous = self.entries.insert(name.to_string(), provider.clone());
        match previous.and_then(|p| p.upgrade()) {
            Some(live) if !Weak::ptr_eq(&Arc::downgrade(&live), &provider) => {
                Some(FeedError::ProviderConflict {
                    name: name.to_string(),
                })
            }
            _ => None,
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Resolves `name` by exact match first, then by successively shorter
    /// dotted prefixes (`a.b.c` → `a.b` → `a`). Dead registrations are skipped.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn DataProvider>> {
        let mut candidate = name;
        loop {
            if let Some(provider) = self.entries.get(candidate).and_then(Weak::upgrade) {
                return Some(provider);
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => return None,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|p| p.strong_count() > 0)
            .count()
    }
}
