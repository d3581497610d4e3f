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

//! The merged view over all registered objects.
//!
//! A [`MultiObject`] concatenates the vertices and triangles of every object
//! in registration order, optionally stitching coincident vertices, and
//! records for each merged element where it came from. It is rebuilt from
//! scratch whenever geometry changes and is immutable in between, apart from
//! material refreshes.

mod stitch;

pub use stitch::StitchMode;

use crate::error::AggregateError;
use radia_core::{
    GeometryError, MaterialSource, MeshSource, Provenance, ProvenanceCodec, SceneObject,
    SurfaceMaterial,
};
use glam::Vec3;
use std::ops::Range;
use stitch::VertexWelder;

/// The merged mesh + material view.
#[derive(Debug, Clone)]
pub struct MultiObject {
    codec: ProvenanceCodec,
    stitch: StitchMode,
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    materials: Vec<SurfaceMaterial>,
    /// Encoded (object, local post-import vertex) of each merged vertex's first occurrence.
    vertex_origin: Vec<u32>,
    /// Encoded (object, local triangle) of each merged triangle.
    triangle_origin: Vec<u32>,
    /// Encoded (object, pre-import vertex) of each merged triangle corner.
    corner_origin: Vec<[u32; 3]>,
    object_triangles: Vec<Range<u32>>,
    pre_import_counts: Vec<u32>,
}

impl MultiObject {
    /// Merges `objects` in order.
    ///
    /// `stitch_distance` follows [`StitchMode::from_distance`].
    pub fn build(objects: &[&dyn SceneObject], stitch_distance: f32) -> Result<Self, AggregateError> {
        let codec = ProvenanceCodec::for_objects(objects.len())?;
        let stitch = StitchMode::from_distance(stitch_distance);

        let mut total_vertices = 0u64;
        let mut total_triangles = 0u64;
        for (object_id, object) in objects.iter().enumerate() {
            let elements = u64::from(
                object
                    .vertex_count()
                    .max(object.triangle_count())
                    .max(object.pre_import_vertex_count()),
            );
            if elements > codec.max_index() {
                return Err(AggregateError::Capacity {
                    object: object_id,
                    elements,
                    limit: codec.max_index(),
                });
            }
            total_vertices += u64::from(object.vertex_count());
            total_triangles += u64::from(object.triangle_count());
        }
        if total_triangles > u64::from(u32::MAX) {
            return Err(AggregateError::TooLarge("triangle"));
        }
        if total_vertices > u64::from(u32::MAX) {
            return Err(AggregateError::TooLarge("vertex"));
        }

        let mut multi = Self {
            codec,
            stitch,
            positions: Vec::with_capacity(total_vertices as usize),
            triangles: Vec::with_capacity(total_triangles as usize),
            materials: Vec::with_capacity(total_triangles as usize),
            vertex_origin: Vec::with_capacity(total_vertices as usize),
            triangle_origin: Vec::with_capacity(total_triangles as usize),
            corner_origin: Vec::with_capacity(total_triangles as usize),
            object_triangles: Vec::with_capacity(objects.len()),
            pre_import_counts: Vec::with_capacity(objects.len()),
        };
        let mut welder = VertexWelder::new(stitch);

        for (object_id, object) in objects.iter().enumerate() {
            multi
                .append(object_id, *object, &mut welder)
                .map_err(|source| match source {
                    AppendError::Geometry(source) => AggregateError::Geometry {
                        object: object_id,
                        source,
                    },
                    AppendError::Provenance(err) => AggregateError::Provenance(err),
                })?;
        }

        log::info!(
            "MultiObject: merged {} objects into {} vertices / {} triangles ({:?})",
            objects.len(),
            multi.positions.len(),
            multi.triangles.len(),
            stitch
        );
        Ok(multi)
    }

    fn append(
        &mut self,
        object_id: usize,
        object: &dyn SceneObject,
        welder: &mut VertexWelder,
    ) -> Result<(), AppendError> {
        let object_index = object_id as u32;
        let vertex_count = object.vertex_count();

        let mut local_to_merged = Vec::with_capacity(vertex_count as usize);
        for local in 0..vertex_count {
            let position = object.vertex(local)?;
            let (merged, is_new) = welder.weld(position);
            if is_new {
                self.positions.push(position);
                self.vertex_origin
                    .push(self.codec.encode(Provenance::new(object_index, local))?);
            }
            local_to_merged.push(merged);
        }

        let first = self.triangles.len() as u32;
        for local_triangle in 0..object.triangle_count() {
            let corners = object.triangle(local_triangle)?;
            let mut merged = [0u32; 3];
            let mut origin = [0u32; 3];
            for (slot, &local_vertex) in corners.iter().enumerate() {
                merged[slot] = *local_to_merged.get(local_vertex as usize).ok_or(
                    GeometryError::VertexOutOfRange {
                        index: local_vertex,
                        count: vertex_count,
                    },
                )?;
                let pre_import = object.pre_import_vertex(local_vertex, local_triangle)?;
                origin[slot] = self
                    .codec
                    .encode(Provenance::new(object_index, pre_import))?;
            }
            self.triangles.push(merged);
            self.corner_origin.push(origin);
            self.materials.push(object.triangle_material(local_triangle)?);
            self.triangle_origin
                .push(self.codec.encode(Provenance::new(object_index, local_triangle))?);
        }
        self.object_triangles.push(first..self.triangles.len() as u32);
        self.pre_import_counts.push(object.pre_import_vertex_count());
        Ok(())
    }

    /// Re-reads every triangle's material from the objects it was built from.
    ///
    /// `objects` must be the same list, in the same order, as passed to
    /// [`build`](Self::build).
    pub fn reload_materials(&mut self, objects: &[&dyn SceneObject]) -> Result<(), AggregateError> {
        for (merged, &packed) in self.triangle_origin.iter().enumerate() {
            let origin = self.codec.decode(packed);
            let object = origin.object as usize;
            let Some(source) = objects.get(object) else {
                return Err(AggregateError::Geometry {
                    object,
                    source: GeometryError::TriangleOutOfRange {
                        index: origin.index,
                        count: 0,
                    },
                });
            };
            self.materials[merged] = source
                .triangle_material(origin.index)
                .map_err(|source| AggregateError::Geometry { object, source })?;
        }
        log::debug!(
            "MultiObject: refreshed {} triangle materials",
            self.materials.len()
        );
        Ok(())
    }

    /// The codec decoding this mesh's provenance indices.
    pub fn codec(&self) -> ProvenanceCodec {
        self.codec
    }

    /// The stitch mode the mesh was built with.
    pub fn stitch_mode(&self) -> StitchMode {
        self.stitch
    }

    /// Number of objects merged.
    pub fn object_count(&self) -> usize {
        self.object_triangles.len()
    }

    /// Pre-import vertex count of an object, as seen at build time.
    pub fn pre_import_vertex_count_of(&self, object: usize) -> Option<u32> {
        self.pre_import_counts.get(object).copied()
    }

    /// Merged triangle range owned by an object.
    pub fn object_triangles(&self, object: usize) -> Option<Range<u32>> {
        self.object_triangles.get(object).cloned()
    }

    /// Owning object and local index of a merged vertex (first occurrence when
    /// stitched).
    pub fn vertex_provenance(&self, vertex: u32) -> Result<Provenance, GeometryError> {
        self.vertex_origin
            .get(vertex as usize)
            .map(|&packed| self.codec.decode(packed))
            .ok_or(GeometryError::VertexOutOfRange {
                index: vertex,
                count: self.vertex_count(),
            })
    }

    /// Owning object and local index of a merged triangle.
    pub fn triangle_provenance(&self, triangle: u32) -> Result<Provenance, GeometryError> {
        self.triangle_origin
            .get(triangle as usize)
            .map(|&packed| self.codec.decode(packed))
            .ok_or(self.triangle_out_of_range(triangle))
    }

    /// Owning object and pre-import vertex behind one corner of a merged
    /// triangle.
    pub fn corner_provenance(&self, triangle: u32, corner: u8) -> Result<Provenance, GeometryError> {
        let corners = self
            .corner_origin
            .get(triangle as usize)
            .ok_or(self.triangle_out_of_range(triangle))?;
        let packed = corners
            .get(corner as usize)
            .ok_or(GeometryError::NotACorner {
                vertex: u32::from(corner),
                triangle,
            })?;
        Ok(self.codec.decode(*packed))
    }

    fn triangle_out_of_range(&self, triangle: u32) -> GeometryError {
        GeometryError::TriangleOutOfRange {
            index: triangle,
            count: self.triangle_count(),
        }
    }
}

enum AppendError {
    Geometry(GeometryError),
    Provenance(radia_core::ProvenanceError),
}

impl From<GeometryError> for AppendError {
    fn from(err: GeometryError) -> Self {
        AppendError::Geometry(err)
    }
}

impl From<radia_core::ProvenanceError> for AppendError {
    fn from(err: radia_core::ProvenanceError) -> Self {
        AppendError::Provenance(err)
    }
}

impl MeshSource for MultiObject {
    fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    fn triangle_count(&self) -> u32 {
        self.triangles.len() as u32
    }

    fn vertex(&self, index: u32) -> Result<Vec3, GeometryError> {
        self.positions
            .get(index as usize)
            .copied()
            .ok_or(GeometryError::VertexOutOfRange {
                index,
                count: self.vertex_count(),
            })
    }

    fn triangle(&self, index: u32) -> Result<[u32; 3], GeometryError> {
        self.triangles
            .get(index as usize)
            .copied()
            .ok_or(self.triangle_out_of_range(index))
    }

    /// Returns the *encoded* provenance of the pre-import vertex; decode it
    /// with [`MultiObject::codec`].
    fn pre_import_vertex(&self, post_vertex: u32, post_triangle: u32) -> Result<u32, GeometryError> {
        let corners = self.triangle(post_triangle)?;
        let corner = corners
            .iter()
            .position(|&v| v == post_vertex)
            .ok_or(GeometryError::NotACorner {
                vertex: post_vertex,
                triangle: post_triangle,
            })?;
        Ok(self.corner_origin[post_triangle as usize][corner])
    }
}

impl MaterialSource for MultiObject {
    fn triangle_material(&self, triangle: u32) -> Result<SurfaceMaterial, GeometryError> {
        self.materials
            .get(triangle as usize)
            .copied()
            .ok_or(self.triangle_out_of_range(triangle))
    }
}
