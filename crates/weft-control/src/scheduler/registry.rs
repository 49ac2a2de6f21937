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

//! Registration-ordered storage of the tasks a scheduler will run.

use weft_core::{Task, TaskId};

struct TaskEntry {
    id: TaskId,
    task: Box<dyn Task>,
}

/// Tasks registered before `run`, kept in registration order.
///
/// Registration order is the `on_start` order in sequential mode and the
/// spawn order in threaded mode.
#[derive(Default)]
pub(crate) struct TaskRegistry {
    entries: Vec<TaskEntry>,
}

impl TaskRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a task and allocates its identity.
    pub(crate) fn register(&mut self, task: Box<dyn Task>) -> TaskId {
        let id = TaskId::new();
        log::info!(
            "TaskRegistry: Registered '{}' (id={}, slot={})",
            task.name(),
            id,
            self.entries.len()
        );
        self.entries.push(TaskEntry { id, task });
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in registration order.
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.task.name())
    }

    /// Empties the registry, yielding `(id, task)` in registration order.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (TaskId, Box<dyn Task>)> + '_ {
        self.entries.drain(..).map(|e| (e.id, e.task))
    }
}
