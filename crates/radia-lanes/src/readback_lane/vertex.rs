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

use super::ReadbackError;
use radia_core::{Irradiance, Kernel, Measure};
use radia_data::{RegisteredObject, RemapTable};

/// Fills per-vertex buffers from kernel corner measurements.
#[derive(Debug, Clone, Copy)]
pub struct VertexReadbackLane {
    measure: Measure,
}

impl VertexReadbackLane {
    /// Creates a lane sampling `measure`.
    pub fn new(measure: Measure) -> Self {
        Self { measure }
    }

    /// The quantity being read.
    pub fn measure(&self) -> Measure {
        self.measure
    }

    /// Writes every pre-import vertex of every object into the vertex buffer
    /// of `channel`, creating or resizing it as needed. Vertices no triangle
    /// references are written as [`Irradiance::ZERO`].
    ///
    /// Returns the number of entries written.
    pub fn read(
        &self,
        kernel: &dyn Kernel,
        remap: &[RemapTable],
        objects: &mut [RegisteredObject],
        channel: usize,
    ) -> Result<usize, ReadbackError> {
        if remap.len() != objects.len() {
            return Err(ReadbackError::TableMismatch {
                tables: remap.len(),
                objects: objects.len(),
            });
        }
        let mut written = 0;
        for (table, object) in remap.iter().zip(objects.iter_mut()) {
            let buffer = object
                .illumination_mut()
                .channel_mut(channel)
                .ensure_vertex_buffer(table.len());
            for (vertex, corner) in table.iter().enumerate() {
                let value = match corner {
                    Some(c) => kernel.triangle_measure(c.triangle, c.corner, self.measure)?,
                    None => Irradiance::ZERO,
                };
                buffer.set(vertex, value)?;
            }
            written += table.len();
        }
        Ok(written)
    }
}
