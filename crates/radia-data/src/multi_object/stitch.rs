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

//! Vertex stitching used while merging objects.

use ahash::AHashMap;
use glam::{IVec3, Vec3};

/// How coincident vertices of different (or the same) objects are merged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StitchMode {
    /// Every input vertex stays a separate merged vertex.
    Disabled,
    /// Vertices at bit-identical positions are merged.
    Exact,
    /// Vertices closer than the tolerance are merged.
    Tolerance(f32),
}

impl StitchMode {
    /// Interprets a stitch distance: negative (or NaN) disables stitching,
    /// zero merges exact duplicates, positive merges within that distance.
    pub fn from_distance(distance: f32) -> Self {
        if distance > 0.0 && distance.is_finite() {
            StitchMode::Tolerance(distance)
        } else if distance == 0.0 {
            StitchMode::Exact
        } else {
            StitchMode::Disabled
        }
    }
}

/// Assigns merged vertex numbers, reusing the first earlier vertex that
/// satisfies the stitch mode.
pub(crate) struct VertexWelder {
    mode: StitchMode,
    exact: AHashMap<[u32; 3], u32>,
    grid: AHashMap<IVec3, Vec<u32>>,
    positions: Vec<Vec3>,
}

impl VertexWelder {
    pub(crate) fn new(mode: StitchMode) -> Self {
        Self {
            mode,
            exact: AHashMap::new(),
            grid: AHashMap::new(),
            positions: Vec::new(),
        }
    }

    /// Returns the merged index for `position` and whether it is new.
    pub(crate) fn weld(&mut self, position: Vec3) -> (u32, bool) {
        let next = self.positions.len() as u32;
        let found = match self.mode {
            StitchMode::Disabled => None,
            StitchMode::Exact => {
                // `+ 0.0` folds -0.0 into 0.0 so both hash alike.
                let p = position + Vec3::ZERO;
                let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
                match self.exact.get(&key) {
                    Some(&index) => Some(index),
                    None => {
                        self.exact.insert(key, next);
                        None
                    }
                }
            }
            StitchMode::Tolerance(tolerance) => {
                let cell = Self::cell(position, tolerance);
                let found = self.nearest_within(position, cell, tolerance);
                if found.is_none() {
                    self.grid.entry(cell).or_default().push(next);
                }
                found
            }
        };
        match found {
            Some(index) => (index, false),
            None => {
                self.positions.push(position);
                (next, true)
            }
        }
    }

    fn cell(position: Vec3, tolerance: f32) -> IVec3 {
        (position / tolerance).floor().as_ivec3()
    }

    /// Lowest merged index within `tolerance`, so the earliest vertex wins.
    fn nearest_within(&self, position: Vec3, cell: IVec3, tolerance: f32) -> Option<u32> {
        let mut best: Option<u32> = None;
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let Some(bucket) = self.grid.get(&(cell + IVec3::new(dx, dy, dz))) else {
                        continue;
                    };
                    for &candidate in bucket {
                        let close = self.positions[candidate as usize].distance(position) <= tolerance;
                        if close && best.map_or(true, |b| candidate < b) {
                            best = Some(candidate);
                        }
                    }
                }
            }
        }
        best
    }
}
