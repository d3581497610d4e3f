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
use crate::raster_lane::{dilate, rasterize_triangle, RasterVertex};
use radia_core::{Kernel, Measure};
use radia_data::{MultiObject, RegisteredObject};

/// Fills ambient maps by rasterizing kernel corner samples through each
/// object's UV mapping.
///
/// Only objects whose result channel already holds an ambient map are
/// touched; the map's size is chosen by whoever created it.
#[derive(Debug, Clone, Copy)]
pub struct AmbientMapLane {
    measure: Measure,
    dilation_passes: u32,
}

impl AmbientMapLane {
    /// Creates a lane sampling `measure`, followed by `dilation_passes` seam
    /// dilation passes per map.
    pub fn new(measure: Measure, dilation_passes: u32) -> Self {
        Self {
            measure,
            dilation_passes,
        }
    }

    /// Rasterizes every mapped triangle into its owner's ambient map.
    ///
    /// Returns `(texels rasterized, texels filled by dilation)`.
    pub fn read(
        &self,
        kernel: &dyn Kernel,
        multi: &MultiObject,
        objects: &mut [RegisteredObject],
        channel: usize,
    ) -> Result<(usize, usize), ReadbackError> {
        let mut rasterized = 0;
        let mut dilated = 0;
        for (object_id, registered) in objects.iter_mut().enumerate() {
            let Some(triangles) = multi.object_triangles(object_id) else {
                continue;
            };
            let (object, illumination) = registered.parts_mut();
            let Some(map) = illumination
                .existing_channel_mut(channel)
                .and_then(|c| c.ambient_map_mut())
            else {
                continue;
            };
            let width = map.width() as usize;
            let height = map.height() as usize;
            map.clear_coverage();
            let (texels, coverage) = map.planes_mut();

            for triangle in triangles {
                let owner = multi.triangle_provenance(triangle)?;
                let Some(uv) = object.triangle_mapping(owner.index)? else {
                    continue;
                };
                let mut samples = [[0.0f32; 3]; 3];
                for (corner, sample) in samples.iter_mut().enumerate() {
                    *sample = kernel
                        .triangle_measure(triangle, corner as u8, self.measure)?
                        .to_array();
                }
                let texel_space = uv.map(|p| {
                    (
                        (p.x * width as f32).clamp(0.0, width as f32),
                        (p.y * height as f32).clamp(0.0, height as f32),
                    )
                });
                for component in 0..3 {
                    let corners = [0, 1, 2].map(|c| {
                        RasterVertex::new(texel_space[c].0, texel_space[c].1, samples[c][component])
                    });
                    let plotted = rasterize_triangle(&corners, width, height, |x, y, value| {
                        let index = y * width + x;
                        texels[index].set_component(component, value);
                        coverage[index] = true;
                    });
                    if component == 0 {
                        rasterized += plotted;
                    }
                }
            }

            for _ in 0..self.dilation_passes {
                let filled = dilate(texels, coverage, width, height);
                dilated += filled;
                if filled == 0 {
                    break;
                }
            }
        }
        Ok((rasterized, dilated))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::CornerIdKernel;
    use super::*;
    use radia_core::{Irradiance, SceneObject, Vec2, Vec3};
    use radia_data::StaticMesh;

    fn mapped_triangle(uv: [Vec2; 3]) -> StaticMesh {
        StaticMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]])
            .unwrap()
            .with_mapping(vec![uv])
            .unwrap()
    }

    fn run(
        mesh: StaticMesh,
        size: u32,
        passes: u32,
    ) -> (usize, usize, RegisteredObject) {
        let views: [&dyn SceneObject; 1] = [&mesh];
        let multi = MultiObject::build(&views, -1.0).unwrap();
        let mut objects = vec![RegisteredObject::new(Box::new(mesh.clone()))];
        objects[0]
            .illumination_mut()
            .channel_mut(0)
            .ensure_ambient_map(size, size);
        let kernel = CornerIdKernel { triangles: 1 };
        let (texels, dilated) = AmbientMapLane::new(Measure::IndirectIrradiance, passes)
            .read(&kernel, &multi, &mut objects, 0)
            .unwrap();
        (texels, dilated, objects.remove(0))
    }

    #[test]
    fn mapped_triangle_fills_covered_texels() {
        // Corner samples are 0, 1 and 2; texel (0, 0) sits nearest corner 0.
        let (texels, dilated, object) = run(
            mapped_triangle([Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)]),
            4,
            0,
        );
        assert_eq!(texels, 6);
        assert_eq!(dilated, 0);
        let map = object.illumination().ambient_map(0).unwrap();
        assert_eq!(map.covered_count(), 6);
        assert!(map.is_covered(0, 0).unwrap());
        assert!(!map.is_covered(3, 3).unwrap());
        let corner = map.texel(0, 0).unwrap();
        assert!(corner.r < 1.0 && corner.r == corner.g && corner.g == corner.b);
    }

    #[test]
    fn dilation_closes_the_seam() {
        let (_, dilated, object) = run(
            mapped_triangle([Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)]),
            4,
            1,
        );
        let map = object.illumination().ambient_map(0).unwrap();
        assert_eq!(dilated, 7);
        assert_eq!(map.covered_count(), 13);
        assert!(!map.is_covered(3, 2).unwrap());
        assert_eq!(map.texel(3, 0).unwrap(), map.texel(2, 0).unwrap());
    }

    #[test]
    fn objects_without_maps_or_mapping_are_skipped() {
        let mesh = StaticMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]).unwrap();
        let (texels, _, object) = run(mesh, 4, 1);
        assert_eq!(texels, 0);
        let map = object.illumination().ambient_map(0).unwrap();
        assert_eq!(map.covered_count(), 0);
        assert_eq!(map.texel(0, 0).unwrap(), Irradiance::ZERO);
    }

    #[test]
    fn out_of_range_uvs_are_clamped() {
        let (texels, _, object) = run(
            mapped_triangle([Vec2::new(-1.0, -1.0), Vec2::new(3.0, -1.0), Vec2::new(-1.0, 3.0)]),
            4,
            0,
        );
        assert_eq!(texels, 6);
        assert_eq!(object.illumination().ambient_map(0).unwrap().covered_count(), texels);
    }
}
