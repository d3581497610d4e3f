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

//! A small progressive-refinement radiosity kernel.
//!
//! Patches are the scene triangles. Each shot picks the patch with the most
//! unshot power and distributes it to every other patch with a disc-to-point
//! form factor estimate. Visibility is ignored.

use radia_core::{
    DirectIllumination, GeometryError, Improvement, Irradiance, Kernel, KernelError,
    MaterialSource, Measure, MeshSource, ResetMode, SceneMesh, SurfaceMaterial, Vec3,
};
use std::f32::consts::PI;
use std::time::Instant;

/// Unshot power below which the solution counts as converged.
const CONVERGED_POWER: f32 = 1e-4;

#[derive(Debug, Clone, Copy)]
struct Patch {
    centroid: Vec3,
    normal: Vec3,
    area: f32,
    material: SurfaceMaterial,
}

/// Southwell-style shooting solver.
#[derive(Debug, Default)]
pub struct ShootingKernel {
    patches: Vec<Patch>,
    corners: Vec<[u32; 3]>,
    vertex_patches: Vec<Vec<u32>>,
    direct: Vec<Irradiance>,
    indirect: Vec<Irradiance>,
    unshot: Vec<Irradiance>,
    shots: u64,
}

impl ShootingKernel {
    /// Creates an empty kernel.
    pub fn new() -> Self {
        Self::default()
    }

    fn restart(&mut self) {
        self.indirect = vec![Irradiance::ZERO; self.patches.len()];
        self.unshot = self
            .patches
            .iter()
            .zip(&self.direct)
            .map(|(patch, &direct)| {
                patch.material.diffuse_emittance + direct.modulate(patch.material.diffuse_reflectance)
            })
            .collect();
    }

    fn brightest_unshot(&self) -> Option<(usize, f32)> {
        self.unshot
            .iter()
            .zip(&self.patches)
            .map(|(unshot, patch)| unshot.luminance() * patch.area)
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn shoot(&mut self, source: usize) {
        let shooter = self.patches[source];
        let power = std::mem::replace(&mut self.unshot[source], Irradiance::ZERO);
        for (target, patch) in self.patches.iter().enumerate() {
            if target == source {
                continue;
            }
            let to_target = patch.centroid - shooter.centroid;
            let distance_sq = to_target.length_squared();
            if distance_sq <= f32::EPSILON {
                continue;
            }
            let dir = to_target / distance_sq.sqrt();
            let cos_out = facing(shooter.normal.dot(dir), shooter.material.two_sided);
            let cos_in = facing(-patch.normal.dot(dir), patch.material.two_sided);
            if cos_out <= 0.0 || cos_in <= 0.0 {
                continue;
            }
            // Irradiance at the target from the shooter's exitance.
            let factor = cos_out * cos_in * shooter.area / (PI * distance_sq + shooter.area);
            let gathered = power * factor;
            self.indirect[target] += gathered;
            self.unshot[target] += gathered.modulate(patch.material.diffuse_reflectance);
        }
        self.shots += 1;
    }

    fn patch_value(&self, patch: usize, measure: Measure) -> Irradiance {
        let direct = self.direct[patch];
        let indirect = self.indirect[patch];
        match measure {
            Measure::IndirectIrradiance => indirect,
            Measure::DirectIrradiance => direct,
            Measure::TotalIrradiance => direct + indirect,
            Measure::ExitingRadiance => {
                let material = self.patches[patch].material;
                (material.diffuse_emittance
                    + (direct + indirect).modulate(material.diffuse_reflectance))
                    * (1.0 / PI)
            }
        }
    }
}

fn facing(cos: f32, two_sided: bool) -> f32 {
    if two_sided {
        cos.abs()
    } else {
        cos
    }
}

impl Kernel for ShootingKernel {
    fn load_scene(&mut self, scene: &dyn SceneMesh) -> Result<(), KernelError> {
        let triangle_count = scene.triangle_count();
        let mut patches = Vec::with_capacity(triangle_count as usize);
        let mut corners = Vec::with_capacity(triangle_count as usize);
        let mut vertex_patches = vec![Vec::new(); scene.vertex_count() as usize];
        for triangle in 0..triangle_count {
            let indices = scene.triangle(triangle)?;
            let [a, b, c] = indices.map(|v| scene.vertex(v));
            let (a, b, c) = (a?, b?, c?);
            let cross = (b - a).cross(c - a);
            patches.push(Patch {
                centroid: (a + b + c) / 3.0,
                normal: cross.normalize_or_zero(),
                area: 0.5 * cross.length(),
                material: scene.triangle_material(triangle)?,
            });
            for v in indices {
                vertex_patches[v as usize].push(triangle);
            }
            corners.push(indices);
        }
        self.patches = patches;
        self.corners = corners;
        self.vertex_patches = vertex_patches;
        self.direct = vec![Irradiance::ZERO; self.patches.len()];
        self.restart();
        log::info!("ShootingKernel: loaded {} patches", self.patches.len());
        Ok(())
    }

    fn update_materials(&mut self, scene: &dyn SceneMesh) -> Result<(), KernelError> {
        for (triangle, patch) in self.patches.iter_mut().enumerate() {
            patch.material = scene.triangle_material(triangle as u32)?;
        }
        Ok(())
    }

    fn set_direct_illumination(&mut self, direct: &DirectIllumination) -> Result<(), KernelError> {
        if direct.len() != self.patches.len() {
            return Err(KernelError::DirectIlluminationMismatch {
                got: direct.len(),
                expected: self.patches.len(),
            });
        }
        self.direct = direct.as_slice().to_vec();
        Ok(())
    }

    fn reset(&mut self, mode: ResetMode) {
        log::debug!("ShootingKernel: reset {:?} after {} shots", mode, self.shots);
        self.shots = 0;
        self.restart();
    }

    fn improve(&mut self, deadline: Instant) -> Improvement {
        let mut shot_any = false;
        loop {
            match self.brightest_unshot() {
                Some((source, power)) if power > CONVERGED_POWER => {
                    self.shoot(source);
                    shot_any = true;
                }
                Some(_) => return Improvement::Finished,
                None => return Improvement::NotImproved,
            }
            if Instant::now() >= deadline {
                break;
            }
        }
        if shot_any {
            Improvement::Improved
        } else {
            Improvement::NotImproved
        }
    }

    fn triangle_measure(
        &self,
        triangle: u32,
        corner: u8,
        measure: Measure,
    ) -> Result<Irradiance, KernelError> {
        let corners = self
            .corners
            .get(triangle as usize)
            .ok_or(GeometryError::TriangleOutOfRange {
                index: triangle,
                count: self.corners.len() as u32,
            })?;
        let vertex = *corners
            .get(corner as usize)
            .ok_or(KernelError::CornerOutOfRange(corner))?;
        // Smooth across the patches sharing this vertex.
        let sharing = &self.vertex_patches[vertex as usize];
        let mut sum = Irradiance::ZERO;
        for &patch in sharing {
            sum += self.patch_value(patch as usize, measure);
        }
        Ok(sum * (1.0 / sharing.len().max(1) as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radia_data::StaticMesh;

    fn facing_quads() -> StaticMesh {
        // A floor and a ceiling one unit above, facing each other.
        StaticMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 1.0),
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        )
        .unwrap()
    }

    #[test]
    fn light_bounces_between_facing_patches() {
        let mut kernel = ShootingKernel::new();
        kernel.load_scene(&facing_quads()).unwrap();
        kernel
            .set_direct_illumination(&DirectIllumination::new(vec![
                Irradiance::splat(10.0),
                Irradiance::ZERO,
            ]))
            .unwrap();
        kernel.reset(ResetMode::Factors);

        let deadline = Instant::now() + std::time::Duration::from_millis(50);
        assert_ne!(kernel.improve(deadline), Improvement::NotImproved);
        let ceiling = kernel
            .triangle_measure(1, 0, Measure::IndirectIrradiance)
            .unwrap();
        assert!(ceiling.r > 0.0);
        assert_eq!(
            kernel.triangle_measure(0, 0, Measure::DirectIrradiance).unwrap(),
            Irradiance::splat(10.0)
        );
    }

    #[test]
    fn dark_scene_converges_immediately() {
        let mut kernel = ShootingKernel::new();
        kernel.load_scene(&facing_quads()).unwrap();
        assert_eq!(kernel.improve(Instant::now()), Improvement::Finished);
    }

    #[test]
    fn bad_indices_are_errors() {
        let mut kernel = ShootingKernel::new();
        kernel.load_scene(&facing_quads()).unwrap();
        assert!(kernel.triangle_measure(9, 0, Measure::TotalIrradiance).is_err());
        assert_eq!(
            kernel.triangle_measure(0, 3, Measure::TotalIrradiance),
            Err(KernelError::CornerOutOfRange(3))
        );
    }
}
