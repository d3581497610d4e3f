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

//! Readback Lane
//!
//! Copies the kernel's current measurements into the per-object buffers a
//! renderer consumes. Vertex buffers are indexed by each object's pre-import
//! vertex numbering through its [`RemapTable`]; ambient maps are filled by
//! rasterizing each triangle's corner samples through its UV mapping.

mod ambient;
mod vertex;

pub use ambient::AmbientMapLane;
pub use vertex::VertexReadbackLane;

use radia_core::{GeometryError, Kernel, KernelError, Measure};
use radia_data::{MultiObject, RegisteredObject, RemapTable, StorageError};
use thiserror::Error;

/// Which buffers a readback should refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadbackRequest {
    bits: u32,
}

impl ReadbackRequest {
    /// Read nothing.
    pub const NONE: Self = Self { bits: 0 };
    /// Per-vertex buffers.
    pub const VERTEX_BUFFERS: Self = Self { bits: 1 << 0 };
    /// Ambient maps of objects that have one.
    pub const AMBIENT_MAPS: Self = Self { bits: 1 << 1 };
    /// Everything.
    pub const ALL: Self = Self {
        bits: Self::VERTEX_BUFFERS.bits | Self::AMBIENT_MAPS.bits,
    };

    /// Creates a request from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two requests.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every buffer in `other` is requested.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks whether nothing is requested.
    pub const fn is_empty(&self) -> bool {
        self.bits & Self::ALL.bits == 0
    }
}

impl Default for ReadbackRequest {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for ReadbackRequest {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Failures while reading results back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadbackError {
    /// The kernel refused a measurement.
    #[error(transparent)]
    Kernel(#[from] KernelError),
    /// An object or the merged mesh returned inconsistent geometry.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// A buffer index was out of range.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Remap tables and objects disagree in number.
    #[error("{tables} remap tables for {objects} objects")]
    TableMismatch {
        /// Number of remap tables.
        tables: usize,
        /// Number of registered objects.
        objects: usize,
    },
}

/// What one readback wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadbackReport {
    /// Vertex buffer entries written.
    pub vertices: usize,
    /// Ambient map texels rasterized.
    pub texels: usize,
    /// Ambient map texels filled by dilation.
    pub dilated: usize,
}

/// Runs the vertex and ambient-map lanes for one result channel.
#[derive(Debug, Clone, Copy)]
pub struct ResultReader {
    vertex: VertexReadbackLane,
    ambient: AmbientMapLane,
}

impl ResultReader {
    /// Creates a reader sampling `measure` and dilating ambient maps
    /// `dilation_passes` times.
    pub fn new(measure: Measure, dilation_passes: u32) -> Self {
        Self {
            vertex: VertexReadbackLane::new(measure),
            ambient: AmbientMapLane::new(measure, dilation_passes),
        }
    }

    /// The quantity being read.
    pub fn measure(&self) -> Measure {
        self.vertex.measure()
    }

    /// Reads the requested buffers of `channel` for every object.
    ///
    /// `remap` must hold one table per object, in registration order, built
    /// from `multi`.
    pub fn read(
        &self,
        kernel: &dyn Kernel,
        multi: &MultiObject,
        remap: &[RemapTable],
        objects: &mut [RegisteredObject],
        channel: usize,
        request: ReadbackRequest,
    ) -> Result<ReadbackReport, ReadbackError> {
        if remap.len() != objects.len() {
            return Err(ReadbackError::TableMismatch {
                tables: remap.len(),
                objects: objects.len(),
            });
        }
        let mut report = ReadbackReport::default();
        if request.contains(ReadbackRequest::VERTEX_BUFFERS) {
            report.vertices = self.vertex.read(kernel, remap, objects, channel)?;
        }
        if request.contains(ReadbackRequest::AMBIENT_MAPS) {
            let (texels, dilated) = self.ambient.read(kernel, multi, objects, channel)?;
            report.texels = texels;
            report.dilated = dilated;
        }
        log::debug!(
            "Readback: channel {} -> {} vertices, {} texels (+{} dilated)",
            channel,
            report.vertices,
            report.texels,
            report.dilated
        );
        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::CornerIdKernel;
    use super::*;
    use radia_core::{Irradiance, SceneObject, Vec2, Vec3};
    use radia_data::StaticMesh;

    fn square(with_mapping: bool) -> StaticMesh {
        let mesh = StaticMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        if !with_mapping {
            return mesh;
        }
        mesh.with_mapping(vec![
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
        ])
        .unwrap()
    }

    fn setup(objects: Vec<StaticMesh>) -> (MultiObject, Vec<RemapTable>, Vec<RegisteredObject>) {
        let views: Vec<&dyn SceneObject> = objects.iter().map(|o| o as &dyn SceneObject).collect();
        let multi = MultiObject::build(&views, -1.0).unwrap();
        let remap = RemapTable::build_all(&multi).unwrap();
        let registered = objects
            .into_iter()
            .map(|o| RegisteredObject::new(Box::new(o)))
            .collect();
        (multi, remap, registered)
    }

    #[test]
    fn request_flags_combine() {
        let both = ReadbackRequest::VERTEX_BUFFERS | ReadbackRequest::AMBIENT_MAPS;
        assert_eq!(both, ReadbackRequest::ALL);
        assert!(both.contains(ReadbackRequest::AMBIENT_MAPS));
        assert!(!ReadbackRequest::VERTEX_BUFFERS.contains(ReadbackRequest::AMBIENT_MAPS));
        assert!(ReadbackRequest::NONE.is_empty());
        assert!(ReadbackRequest::from_bits(1 << 5).is_empty());
        assert_eq!(ReadbackRequest::default(), ReadbackRequest::ALL);
    }

    #[test]
    fn reader_respects_request_and_channel() {
        let (multi, remap, mut objects) = setup(vec![square(true)]);
        objects[0]
            .illumination_mut()
            .channel_mut(2)
            .ensure_ambient_map(4, 4);
        let kernel = CornerIdKernel { triangles: 2 };
        let reader = ResultReader::new(Measure::IndirectIrradiance, 1);

        let report = reader
            .read(&kernel, &multi, &remap, &mut objects, 2, ReadbackRequest::VERTEX_BUFFERS)
            .unwrap();
        assert_eq!(report.vertices, 4);
        assert_eq!(report.texels, 0);
        let buffer = objects[0].illumination().vertex_buffer(2).unwrap();
        assert_eq!(buffer.get(3), Some(Irradiance::splat(12.0)));
        assert!(objects[0].illumination().vertex_buffer(0).is_none());

        let report = reader
            .read(&kernel, &multi, &remap, &mut objects, 2, ReadbackRequest::AMBIENT_MAPS)
            .unwrap();
        assert_eq!(report.vertices, 0);
        assert_eq!(report.texels, 16);
    }

    #[test]
    fn mismatched_tables_are_rejected() {
        let (multi, _, mut objects) = setup(vec![square(false)]);
        let kernel = CornerIdKernel { triangles: 2 };
        let err = ResultReader::new(Measure::IndirectIrradiance, 0)
            .read(&kernel, &multi, &[], &mut objects, 0, ReadbackRequest::ALL)
            .unwrap_err();
        assert_eq!(err, ReadbackError::TableMismatch { tables: 0, objects: 1 });
    }
}
