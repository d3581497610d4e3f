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

//! A plain in-memory [`SceneObject`].

use radia_core::{GeometryError, MaterialSource, MeshSource, SceneObject, SurfaceMaterial};
use glam::{Vec2, Vec3};

/// An indexed triangle mesh held in memory.
///
/// Material edits made through [`set_material`](Self::set_material) are
/// staged and only become visible after
/// [`refresh_materials`](MaterialSource::refresh_materials), which the
/// scheduler calls when a material change is reported.
#[derive(Debug, Clone)]
pub struct StaticMesh {
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    mapping: Option<Vec<[Vec2; 3]>>,
    materials: Vec<SurfaceMaterial>,
    staged_materials: Vec<SurfaceMaterial>,
    pre_import: Option<PreImport>,
}

#[derive(Debug, Clone)]
struct PreImport {
    post_to_pre: Vec<u32>,
    count: u32,
}

impl StaticMesh {
    /// Creates a mesh with the default material on every triangle.
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Result<Self, GeometryError> {
        let count = len_u32(positions.len(), "positions")?;
        len_u32(triangles.len(), "triangles")?;
        if let Some(&index) = triangles.iter().flatten().find(|&&v| v >= count) {
            return Err(GeometryError::VertexOutOfRange { index, count });
        }
        let materials = vec![SurfaceMaterial::default(); triangles.len()];
        Ok(Self {
            positions,
            triangles,
            mapping: None,
            staged_materials: materials.clone(),
            materials,
            pre_import: None,
        })
    }

    /// Applies one material to every triangle.
    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.materials.fill(material);
        self.staged_materials.fill(material);
        self
    }

    /// Sets per-triangle ambient-map coordinates.
    pub fn with_mapping(mut self, mapping: Vec<[Vec2; 3]>) -> Result<Self, GeometryError> {
        check_len("mapping", mapping.len(), self.triangles.len())?;
        self.mapping = Some(mapping);
        Ok(self)
    }

    /// Declares that the post-import vertices came from a larger (or
    /// differently ordered) pre-import numbering.
    pub fn with_pre_import(
        mut self,
        post_to_pre: Vec<u32>,
        pre_import_count: u32,
    ) -> Result<Self, GeometryError> {
        check_len("post_to_pre", post_to_pre.len(), self.positions.len())?;
        if let Some(&index) = post_to_pre.iter().find(|&&v| v >= pre_import_count) {
            return Err(GeometryError::VertexOutOfRange {
                index,
                count: pre_import_count,
            });
        }
        self.pre_import = Some(PreImport {
            post_to_pre,
            count: pre_import_count,
        });
        Ok(self)
    }

    /// Stages a new material for one triangle.
    pub fn set_material(
        &mut self,
        triangle: u32,
        material: SurfaceMaterial,
    ) -> Result<(), GeometryError> {
        let count = self.triangle_count();
        let slot = self
            .staged_materials
            .get_mut(triangle as usize)
            .ok_or(GeometryError::TriangleOutOfRange {
                index: triangle,
                count,
            })?;
        *slot = material;
        Ok(())
    }
}

impl MeshSource for StaticMesh {
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
            .ok_or(GeometryError::TriangleOutOfRange {
                index,
                count: self.triangle_count(),
            })
    }

    fn pre_import_vertex_count(&self) -> u32 {
        self.pre_import
            .as_ref()
            .map_or(self.vertex_count(), |p| p.count)
    }

    fn pre_import_vertex(&self, post_vertex: u32, post_triangle: u32) -> Result<u32, GeometryError> {
        if !self.triangle(post_triangle)?.contains(&post_vertex) {
            return Err(GeometryError::NotACorner {
                vertex: post_vertex,
                triangle: post_triangle,
            });
        }
        match &self.pre_import {
            Some(p) => Ok(p.post_to_pre[post_vertex as usize]),
            None => Ok(post_vertex),
        }
    }
}

impl MaterialSource for StaticMesh {
    fn triangle_material(&self, triangle: u32) -> Result<SurfaceMaterial, GeometryError> {
        self.materials
            .get(triangle as usize)
            .copied()
            .ok_or(GeometryError::TriangleOutOfRange {
                index: triangle,
                count: self.triangle_count(),
            })
    }

    fn refresh_materials(&mut self) {
        self.materials.clone_from(&self.staged_materials);
    }
}

impl SceneObject for StaticMesh {
    fn triangle_mapping(&self, triangle: u32) -> Result<Option<[Vec2; 3]>, GeometryError> {
        let count = self.triangle_count();
        if triangle >= count {
            return Err(GeometryError::TriangleOutOfRange {
                index: triangle,
                count,
            });
        }
        Ok(self
            .mapping
            .as_ref()
            .map(|mapping| mapping[triangle as usize]))
    }
}

fn len_u32(len: usize, attribute: &'static str) -> Result<u32, GeometryError> {
    u32::try_from(len).map_err(|_| GeometryError::AttributeLength {
        attribute,
        got: len,
        expected: u32::MAX as usize,
    })
}

fn check_len(attribute: &'static str, got: usize, expected: usize) -> Result<(), GeometryError> {
    if got == expected {
        Ok(())
    } else {
        Err(GeometryError::AttributeLength {
            attribute,
            got,
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radia_core::Irradiance;

    fn quad() -> StaticMesh {
        StaticMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_triangles_referencing_missing_vertices() {
        let err = StaticMesh::new(vec![Vec3::ZERO], vec![[0, 0, 1]]).unwrap_err();
        assert_eq!(err, GeometryError::VertexOutOfRange { index: 1, count: 1 });
    }

    #[test]
    fn staged_materials_apply_on_refresh() {
        let mut mesh = quad();
        let red = SurfaceMaterial {
            diffuse_reflectance: Irradiance::new(0.9, 0.1, 0.1),
            ..SurfaceMaterial::default()
        };
        mesh.set_material(1, red).unwrap();
        assert_eq!(mesh.triangle_material(1), Ok(SurfaceMaterial::default()));
        mesh.refresh_materials();
        assert_eq!(mesh.triangle_material(1), Ok(red));
    }

    #[test]
    fn pre_import_mapping_is_followed() {
        let mesh = quad().with_pre_import(vec![5, 1, 2, 0], 6).unwrap();
        assert_eq!(mesh.pre_import_vertex_count(), 6);
        assert_eq!(mesh.pre_import_vertex(0, 1), Ok(5));
        assert_eq!(mesh.pre_import_vertex(3, 1), Ok(0));
        assert!(mesh.pre_import_vertex(1, 1).is_err());
    }

    #[test]
    fn mapping_length_must_match_triangles() {
        assert!(quad().with_mapping(vec![[Vec2::ZERO; 3]]).is_err());
        let mapped = quad().with_mapping(vec![[Vec2::ZERO; 3]; 2]).unwrap();
        assert_eq!(mapped.triangle_mapping(1), Ok(Some([Vec2::ZERO; 3])));
        assert!(quad().triangle_mapping(0).unwrap().is_none());
    }
}
