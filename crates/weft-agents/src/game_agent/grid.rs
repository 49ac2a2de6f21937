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

//! Placement of the initial object grid.

use rand::Rng;
use serde::{Deserialize, Serialize};
use weft_core::math::{Quaternion, Vec3};
use weft_core::payload::{ObjectHandle, ObjectToCreate, SceneNode};

/// Shape of the object grid spawned when a game starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Objects per axis.
    pub count: u32,
    /// Distance between neighbours.
    pub spacing: f32,
    /// Maximum random offset per axis, in both directions.
    pub jitter: f32,
    /// Uniform scale of every object.
    pub scale: f32,
    /// Registry name of each object.
    pub object_name: String,
    /// Resource specification of each object.
    pub specification: String,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            count: 5,
            spacing: 20.0,
            jitter: 2.0,
            scale: 0.2,
            object_name: "ogrehead".to_string(),
            specification: "ogrehead.mesh".to_string(),
            seed: None,
        }
    }
}

impl GridConfig {
    /// Number of objects in the grid.
    pub fn len(&self) -> usize {
        (self.count as usize).pow(3)
    }

    /// Returns `true` if the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Builds the creation requests, allocating one handle per object.
    ///
    /// The grid is centred on `spacing / 2 * count` and walks towards the
    /// negative axes.
    pub fn build<R, F>(&self, rng: &mut R, mut allocate: F) -> Vec<ObjectToCreate>
    where
        R: Rng,
        F: FnMut() -> ObjectHandle,
    {
        let origin = self.spacing / 2.0 * self.count as f32;
        let offset = |rng: &mut R| {
            if self.jitter > 0.0 {
                rng.gen_range(-self.jitter..self.jitter)
            } else {
                0.0
            }
        };

        let mut objects = Vec::with_capacity(self.len());
        for i in 0..self.count {
            for j in 0..self.count {
                for k in 0..self.count {
                    let position = Vec3::new(
                        origin - i as f32 * self.spacing + offset(rng),
                        origin - k as f32 * self.spacing + offset(rng),
                        origin - j as f32 * self.spacing + offset(rng),
                    );
                    objects.push(ObjectToCreate {
                        node: SceneNode {
                            handle: allocate(),
                            position,
                            orientation: Quaternion::IDENTITY,
                        },
                        scale: Vec3::new(self.scale, self.scale, self.scale),
                        specification: self.specification.clone(),
                    });
                }
            }
        }
        objects
    }
}
