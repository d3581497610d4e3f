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

//! Direct illumination from unshadowed point lights.

use radia_core::{
    DetectionError, DirectIllumination, DirectIlluminationDetector, GeometryError, Irradiance,
    MaterialSource, MeshSource, SceneMesh, Vec3,
};
use std::sync::{Arc, Mutex};

/// An isotropic point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World position.
    pub position: Vec3,
    /// Radiant intensity per channel.
    pub intensity: Irradiance,
}

/// Lights shared between the application and the detector.
pub type SharedLights = Arc<Mutex<Vec<PointLight>>>;

/// Evaluates point lights at triangle centroids, without shadows.
#[derive(Debug, Clone, Default)]
pub struct PointLightDetector {
    lights: SharedLights,
}

impl PointLightDetector {
    /// Creates a detector for `lights`.
    pub fn new(lights: Vec<PointLight>) -> Self {
        Self {
            lights: Arc::new(Mutex::new(lights)),
        }
    }

    /// A handle for moving lights after the detector was handed to the
    /// scheduler. Report a light change after editing.
    pub fn lights(&self) -> SharedLights {
        self.lights.clone()
    }
}

impl DirectIlluminationDetector for PointLightDetector {
    fn detect(&mut self, scene: &dyn SceneMesh) -> Result<DirectIllumination, DetectionError> {
        let lights = self
            .lights
            .lock()
            .map_err(|_| DetectionError::NotReady("light list is poisoned".to_owned()))?;
        if let Some(light) = lights
            .iter()
            .find(|l| !l.position.is_finite() || !l.intensity.is_finite())
        {
            return Err(DetectionError::Failed(format!(
                "light at {} is not finite",
                light.position
            )));
        }

        let mut per_triangle = Vec::with_capacity(scene.triangle_count() as usize);
        for triangle in 0..scene.triangle_count() {
            let geometry_error = |e: GeometryError| DetectionError::Failed(e.to_string());
            let [a, b, c] = scene.triangle(triangle).map_err(geometry_error)?;
            let a = scene.vertex(a).map_err(geometry_error)?;
            let b = scene.vertex(b).map_err(geometry_error)?;
            let c = scene.vertex(c).map_err(geometry_error)?;
            let two_sided = scene
                .triangle_material(triangle)
                .map_err(geometry_error)?
                .two_sided;
            let centroid = (a + b + c) / 3.0;
            let normal = (b - a).cross(c - a).normalize_or_zero();

            let mut irradiance = Irradiance::ZERO;
            for light in lights.iter() {
                let to_light = light.position - centroid;
                let distance_sq = to_light.length_squared().max(1e-6);
                let mut cos = normal.dot(to_light) / distance_sq.sqrt();
                if two_sided {
                    cos = cos.abs();
                }
                if cos > 0.0 {
                    irradiance += light.intensity * (cos / distance_sq);
                }
            }
            per_triangle.push(irradiance);
        }
        Ok(DirectIllumination::new(per_triangle))
    }
}
