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

//! Acts as the consumer side of the snapshot exchange.
//!
//! The render task adopts the newest world snapshot once per frame and keeps
//! its own scene representation in sync with it. It also serves the `window`
//! provider namespace and, in debug builds, `scene.inspect`.

mod agent;
mod providers;

pub use agent::*;
