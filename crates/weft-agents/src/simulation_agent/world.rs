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

//! The simulated world: a flat list of kinematic bodies.

use weft_core::math::Vec3;
use weft_core::payload::{ObjectHandle, ObjectToCreate, SceneNode, WorldGraph};

#[derive(Debug, Clone)]
struct Body {
    node: SceneNode,
    velocity: Vec3,
    dynamic: bool,
}

/// Bodies in creation order. Static bodies (terrain) never move.
#[derive(Debug, Default)]
pub struct World {
    bodies: Vec<Body>,
    pull: f32,
    damping: f32,
}

impl World {
    /// Creates an empty world.
    ///
    /// Dynamic bodies start with a velocity of `-position * pull`, which then
    /// decays by `damping` per second.
    pub fn new(pull: f32, damping: f32) -> Self {
        Self {
            bodies: Vec::new(),
            pull,
            damping: damping.max(0.0),
        }
    }

    /// Adds a body. A handle that already exists is replaced.
    pub fn add(&mut self, object: &ObjectToCreate, dynamic: bool) {
        let body = Body {
            node: object.node,
            velocity: if dynamic {
                object.node.position * -self.pull
            } else {
                Vec3::ZERO
            },
            dynamic,
        };
        match self
            .bodies
            .iter_mut()
            .find(|b| b.node.handle == object.node.handle)
        {
            Some(existing) => *existing = body,
            None => self.bodies.push(body),
        }
    }

    /// Removes a body. Returns `false` if it did not exist.
    pub fn remove(&mut self, handle: ObjectHandle) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.node.handle != handle);
        before != self.bodies.len()
    }

    /// Moves the first body to `position` and stops it.
    pub fn place_first(&mut self, position: Vec3) -> Option<ObjectHandle> {
        let body = self.bodies.first_mut()?;
        body.node.position = position;
        body.velocity = Vec3::ZERO;
        Some(body.node.handle)
    }

    /// Advances every dynamic body by `dt`.
    pub fn step(&mut self, dt: f32) {
        let decay = (1.0 - self.damping * dt).max(0.0);
        for body in self.bodies.iter_mut().filter(|b| b.dynamic) {
            body.node.position += body.velocity * dt;
            body.velocity = body.velocity * decay;
        }
    }

    /// Copies every transform into a fresh snapshot.
    pub fn snapshot(&self, sequence: u64) -> WorldGraph {
        WorldGraph {
            sequence,
            nodes: self.bodies.iter().map(|b| b.node).collect(),
        }
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns `true` if the world has no bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
