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

//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// How the scheduler maps tasks onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadingMode {
    /// One named OS thread per task.
    #[default]
    Threaded,
    /// Every task on a single worker thread, stepped round-robin.
    ///
    /// Degraded mode for platforms or debugging sessions where one thread per
    /// task is unwanted.
    Sequential,
}

/// Configuration for the [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Threading mode.
    pub mode: ThreadingMode,
    /// Prefix of worker thread names (`<prefix>-<task>`).
    pub thread_name_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mode: ThreadingMode::Threaded,
            thread_name_prefix: "weft".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// A configuration using the sequential mode.
    pub fn sequential() -> Self {
        Self {
            mode: ThreadingMode::Sequential,
            ..Self::default()
        }
    }

    pub(crate) fn thread_name(&self, task: &str) -> String {
        format!("{}-{}", self.thread_name_prefix, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: SchedulerConfig = serde_json::from_str(r#"{ "mode": "sequential" }"#).unwrap();
        assert_eq!(config.mode, ThreadingMode::Sequential);
        assert_eq!(config.thread_name_prefix, "weft");
        assert_eq!(config.thread_name("render"), "weft-render");
    }
}
