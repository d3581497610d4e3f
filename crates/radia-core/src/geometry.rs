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

//! Contracts consumed from the geometry / collider layer.
//!
//! Meshes distinguish two vertex numberings. *Post-import* indices address the
//! vertices the collider actually kept (after welding, splitting, ...).
//! *Pre-import* indices are the numbering the owning application used, and
//! the one illumination buffers are laid out in.

use crate::color::Irradiance;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An out-of-range or inconsistent mesh access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// A vertex index beyond the vertex count.
    #[error("vertex index {index} out of range (vertex count {count})")]
    VertexOutOfRange {
        /// The offending index.
        index: u32,
        /// The number of vertices.
        count: u32,
    },
    /// A triangle index beyond the triangle count.
    #[error("triangle index {index} out of range (triangle count {count})")]
    TriangleOutOfRange {
        /// The offending index.
        index: u32,
        /// The number of triangles.
        count: u32,
    },
    /// The vertex is not one of the triangle's corners.
    #[error("vertex {vertex} is not a corner of triangle {triangle}")]
    NotACorner {
        /// The post-import vertex.
        vertex: u32,
        /// The post-import triangle.
        triangle: u32,
    },
    /// A per-element attribute array does not match the element count.
    #[error("{attribute} has {got} entries, expected {expected}")]
    AttributeLength {
        /// Name of the attribute.
        attribute: &'static str,
        /// Entries supplied.
        got: usize,
        /// Entries required.
        expected: usize,
    },
}

/// Surface properties the kernel needs to compute form factors and transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    /// Fraction of incoming light diffusely reflected, per channel.
    pub diffuse_reflectance: Irradiance,
    /// Fraction of incoming light specularly reflected.
    pub specular_reflectance: f32,
    /// Self-emitted exitance.
    pub diffuse_emittance: Irradiance,
    /// Whether both faces interact with light.
    pub two_sided: bool,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            diffuse_reflectance: Irradiance::splat(0.5),
            specular_reflectance: 0.0,
            diffuse_emittance: Irradiance::ZERO,
            two_sided: false,
        }
    }
}

/// Read access to an indexed triangle mesh.
pub trait MeshSource {
    /// Number of post-import vertices.
    fn vertex_count(&self) -> u32;

    /// Number of post-import triangles.
    fn triangle_count(&self) -> u32;

    /// Position of a post-import vertex.
    fn vertex(&self, index: u32) -> Result<Vec3, GeometryError>;

    /// Post-import vertex indices of a triangle's three corners.
    fn triangle(&self, index: u32) -> Result<[u32; 3], GeometryError>;

    /// Number of vertices in the pre-import numbering.
    fn pre_import_vertex_count(&self) -> u32 {
        self.vertex_count()
    }

    /// Maps a post-import vertex, seen as a corner of `post_triangle`, back to
    /// its pre-import index.
    ///
    /// The default implementation assumes both numberings are identical and
    /// only checks that the vertex really is a corner of the triangle.
    fn pre_import_vertex(&self, post_vertex: u32, post_triangle: u32) -> Result<u32, GeometryError> {
        let corners = self.triangle(post_triangle)?;
        if corners.contains(&post_vertex) {
            Ok(post_vertex)
        } else {
            Err(GeometryError::NotACorner {
                vertex: post_vertex,
                triangle: post_triangle,
            })
        }
    }
}

/// Per-triangle material access.
pub trait MaterialSource {
    /// Material of a post-import triangle.
    fn triangle_material(&self, triangle: u32) -> Result<SurfaceMaterial, GeometryError>;

    /// Re-reads material properties from wherever the provider keeps them.
    ///
    /// Called by the scheduler after `report_material_change()`.
    fn refresh_materials(&mut self) {}
}

/// A mesh with materials, as handed to the kernel.
pub trait SceneMesh: MeshSource + MaterialSource {}

impl<T: MeshSource + MaterialSource + ?Sized> SceneMesh for T {}

/// An application object registered with the scheduler.
pub trait SceneObject: MeshSource + MaterialSource + Send {
    /// Texture-space coordinates (`[0, 1]²`) of a triangle's corners in the
    /// object's ambient map, or `None` when the triangle is not unwrapped.
    fn triangle_mapping(&self, _triangle: u32) -> Result<Option<[Vec2; 3]>, GeometryError> {
        Ok(None)
    }
}
