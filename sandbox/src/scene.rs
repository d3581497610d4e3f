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

//! The demo room: an open box with coloured side walls.

use radia_core::{GeometryError, Irradiance, SurfaceMaterial, Vec2, Vec3};
use radia_data::StaticMesh;

/// Builds an `n` x `n` grid of quads spanning `origin + s * u + t * v` for
/// `s, t` in `[0, 1]`, with matching ambient-map coordinates.
pub fn quad_grid(
    origin: Vec3,
    u: Vec3,
    v: Vec3,
    n: u32,
    material: SurfaceMaterial,
) -> Result<StaticMesh, GeometryError> {
    let n = n.max(1);
    let side = n + 1;
    let mut positions = Vec::with_capacity((side * side) as usize);
    let mut uvs = Vec::with_capacity((side * side) as usize);
    for j in 0..side {
        for i in 0..side {
            let s = i as f32 / n as f32;
            let t = j as f32 / n as f32;
            positions.push(origin + u * s + v * t);
            uvs.push(Vec2::new(s, t));
        }
    }

    let mut triangles = Vec::with_capacity((2 * n * n) as usize);
    let mut mapping = Vec::with_capacity((2 * n * n) as usize);
    for j in 0..n {
        for i in 0..n {
            let a = j * side + i;
            let b = a + 1;
            let c = a + side + 1;
            let d = a + side;
            for tri in [[a, b, c], [a, c, d]] {
                mapping.push(tri.map(|index| uvs[index as usize]));
                triangles.push(tri);
            }
        }
    }
    StaticMesh::new(positions, triangles)?
        .with_material(material)
        .with_mapping(mapping)
}

fn diffuse(r: f32, g: f32, b: f32) -> SurfaceMaterial {
    SurfaceMaterial {
        diffuse_reflectance: Irradiance::new(r, g, b),
        ..SurfaceMaterial::default()
    }
}

/// Floor, back wall, left (red) and right (green) walls of a unit room.
///
/// The floor comes first so that it is object 0.
pub fn open_box(subdivisions: u32) -> Result<Vec<StaticMesh>, GeometryError> {
    Ok(vec![
        quad_grid(Vec3::ZERO, Vec3::Z, Vec3::X, subdivisions, diffuse(0.7, 0.7, 0.7))?,
        quad_grid(Vec3::ZERO, Vec3::X, Vec3::Y, subdivisions, diffuse(0.7, 0.7, 0.7))?,
        quad_grid(Vec3::ZERO, Vec3::Y, Vec3::Z, subdivisions, diffuse(0.7, 0.1, 0.1))?,
        quad_grid(Vec3::X, Vec3::Z, Vec3::Y, subdivisions, diffuse(0.1, 0.7, 0.1))?,
    ])
}
