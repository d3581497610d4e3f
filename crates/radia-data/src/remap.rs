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

//! Per-object tables from pre-import vertices to merged triangle corners.
//!
//! Illumination is reported per triangle corner by the kernel, while the
//! renderer indexes vertex buffers by the object's original (pre-import)
//! vertex numbering. A [`RemapTable`] bridges the two: entry `v` names one
//! merged corner that was produced from pre-import vertex `v`, or `None` when
//! no surviving triangle references it.

use crate::error::RemapError;
use crate::multi_object::MultiObject;
use radia_core::{GeometryError, MeshSource};

/// One corner of a merged triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CornerRef {
    /// Merged triangle index.
    pub triangle: u32,
    /// Corner within the triangle, `0..3`.
    pub corner: u8,
}

/// Pre-import vertex to merged corner table for one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    entries: Vec<Option<CornerRef>>,
}

impl RemapTable {
    /// Builds one table per merged object, in object order.
    ///
    /// Merged triangles are visited in ascending order, so each entry points
    /// at the first corner that references its vertex.
    pub fn build_all(multi: &MultiObject) -> Result<Vec<Self>, RemapError> {
        let object_count = multi.object_count();
        let mut tables = (0..object_count)
            .map(|object| {
                let len = multi.pre_import_vertex_count_of(object).unwrap_or(0);
                Self {
                    entries: vec![None; len as usize],
                }
            })
            .collect::<Vec<_>>();

        for triangle in 0..multi.triangle_count() {
            for corner in 0..3u8 {
                let origin = multi.corner_provenance(triangle, corner)?;
                let table = tables.get_mut(origin.object as usize).ok_or(
                    RemapError::UnknownObject {
                        object: origin.object,
                        count: object_count,
                    },
                )?;
                let len = table.entries.len() as u32;
                let slot = table.entries.get_mut(origin.index as usize).ok_or(
                    GeometryError::VertexOutOfRange {
                        index: origin.index,
                        count: len,
                    },
                )?;
                slot.get_or_insert(CornerRef { triangle, corner });
            }
        }

        log::debug!(
            "RemapTable: built {} tables, {} of {} vertices referenced",
            tables.len(),
            tables.iter().map(Self::referenced_count).sum::<usize>(),
            tables.iter().map(Self::len).sum::<usize>()
        );
        Ok(tables)
    }

    /// Number of pre-import vertices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the object has no pre-import vertices.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The corner for pre-import vertex `vertex`, if it is referenced.
    pub fn get(&self, vertex: usize) -> Option<CornerRef> {
        self.entries.get(vertex).copied().flatten()
    }

    /// Iterates entries in pre-import vertex order.
    pub fn iter(&self) -> impl Iterator<Item = Option<CornerRef>> + '_ {
        self.entries.iter().copied()
    }

    /// Number of vertices that map to some corner.
    pub fn referenced_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StaticMesh;
    use glam::Vec3;

    fn quad_with_orphan() -> StaticMesh {
        // Vertex 4 is not used by any triangle.
        StaticMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(9.0, 9.0, 9.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn first_corner_wins_and_orphans_stay_empty() {
        let mesh = quad_with_orphan();
        let multi = MultiObject::build(&[&mesh], -1.0).unwrap();
        let tables = RemapTable::build_all(&multi).unwrap();

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.len(), 5);
        assert_eq!(table.get(0), Some(CornerRef { triangle: 0, corner: 0 }));
        assert_eq!(table.get(2), Some(CornerRef { triangle: 0, corner: 2 }));
        assert_eq!(table.get(3), Some(CornerRef { triangle: 1, corner: 2 }));
        assert_eq!(table.get(4), None);
        assert_eq!(table.referenced_count(), 4);
    }

    #[test]
    fn tables_use_pre_import_numbering() {
        let plain = quad_with_orphan();
        // Post-import vertices 0..3 came from pre-import 3,2,1,0 of a
        // six-vertex source; the orphan came from 5 and pre-import 4 was dropped.
        let imported = quad_with_orphan()
            .with_pre_import(vec![3, 2, 1, 0, 5], 6)
            .unwrap();
        let multi = MultiObject::build(&[&plain, &imported], -1.0).unwrap();
        let tables = RemapTable::build_all(&multi).unwrap();

        let table = &tables[1];
        assert_eq!(table.len(), 6);
        assert_eq!(table.get(3), Some(CornerRef { triangle: 2, corner: 0 }));
        assert_eq!(table.get(0), Some(CornerRef { triangle: 3, corner: 2 }));
        assert_eq!(table.get(4), None);
        assert_eq!(table.get(5), None);
    }

    #[test]
    fn stitched_objects_keep_separate_tables() {
        let a = quad_with_orphan();
        let b = quad_with_orphan();
        let multi = MultiObject::build(&[&a, &b], 0.0).unwrap();
        let tables = RemapTable::build_all(&multi).unwrap();

        // Every merged corner is shared, yet object 1 still maps its own vertices.
        assert_eq!(multi.vertex_count(), 5);
        assert_eq!(tables[1].get(1), Some(CornerRef { triangle: 2, corner: 1 }));
    }
}
