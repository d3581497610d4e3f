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

// Radia Sandbox
// Drives the adaptive scheduler against a toy kernel, simulating a renderer
// that samples the results every frame.

mod point_light;
mod scene;
mod shooting_kernel;

use anyhow::{Context, Result};
use point_light::{PointLight, PointLightDetector};
use radia_control::{RealtimeRadiosity, ReadbackRequest, SchedulerConfig};
use radia_core::{Improvement, Irradiance, Vec3};
use radia_data::RegisteredObject;
use serde::Deserialize;
use shooting_kernel::ShootingKernel;
use std::time::{Duration, Instant};

/// Demo settings, loaded from the RON file given as first argument.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SandboxConfig {
    frames: u32,
    frame_ms: u64,
    subdivisions: u32,
    stitch_distance: f32,
    ambient_map_size: u32,
    light_position: [f32; 3],
    light_intensity: [f32; 3],
    scheduler: SchedulerConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            frame_ms: 8,
            subdivisions: 6,
            stitch_distance: 0.0,
            ambient_map_size: 64,
            light_position: [0.5, 0.9, 0.5],
            light_intensity: [1.0, 1.0, 1.0],
            scheduler: SchedulerConfig::default(),
        }
    }
}

fn load_config() -> Result<SandboxConfig> {
    let Some(path) = std::env::args().nth(1) else {
        log::info!("Sandbox: no config given, using defaults");
        return Ok(SandboxConfig::default());
    };
    let source =
        std::fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
    let config: SandboxConfig =
        ron::from_str(&source).with_context(|| format!("parsing config {path}"))?;
    config
        .scheduler
        .validate()
        .with_context(|| format!("validating scheduler section of {path}"))?;
    log::info!("Sandbox: loaded {}", path);
    Ok(config)
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = load_config()?;

    let detector = PointLightDetector::new(vec![PointLight {
        position: Vec3::from_array(config.light_position),
        intensity: Irradiance::from_array(config.light_intensity),
    }]);
    let lights = detector.lights();
    let mut solver = RealtimeRadiosity::new(
        Box::new(ShootingKernel::new()),
        Box::new(detector),
        config.scheduler.clone(),
    )?;

    let objects = scene::open_box(config.subdivisions)?
        .into_iter()
        .map(|mesh| RegisteredObject::new(Box::new(mesh)));
    solver.set_objects(objects, config.stitch_distance);
    solver
        .illumination_mut(0)?
        .channel_mut(0)
        .ensure_ambient_map(config.ambient_map_size, config.ambient_map_size);

    let started = Instant::now();
    let mut last_verdict = Improvement::NotImproved;
    for frame in 0..config.frames {
        match frame {
            f if f == config.frames / 3 => {
                log::info!("Sandbox: moving the light");
                if let Ok(mut lights) = lights.lock() {
                    for light in lights.iter_mut() {
                        light.position.x = 0.2;
                    }
                }
                solver.report_light_change(true);
            }
            f if f == config.frames / 2 => solver.report_critical_interaction_start(),
            f if f == config.frames / 2 + 5 => solver.report_critical_interaction_end(),
            _ => {}
        }

        let verdict = solver.calculate(ReadbackRequest::ALL)?;
        if verdict != last_verdict {
            log::info!("Sandbox: frame {} -> {:?}", frame, verdict);
            last_verdict = verdict;
        }

        // The renderer samples the buffers, then spends the rest of its frame.
        solver.report_illumination_use();
        std::thread::sleep(Duration::from_millis(config.frame_ms));
    }

    let stats = solver.stats();
    log::info!(
        "Sandbox: {} frames in {:.2?}, {} calculations, {} improve calls, {} readbacks, step {:.2?}",
        config.frames,
        started.elapsed(),
        stats.calls,
        stats.improve_calls,
        stats.readbacks,
        solver.improve_step()
    );

    let floor = solver.illumination(0)?;
    if let Some(map) = floor.ambient_map(0) {
        let covered = map.covered_count();
        let mean = map
            .texels()
            .iter()
            .fold(Irradiance::ZERO, |acc, &t| acc + t)
            * (1.0 / covered.max(1) as f32);
        log::info!(
            "Sandbox: floor ambient map {}x{}, {} texels covered, mean indirect {:?}",
            map.width(),
            map.height(),
            covered,
            mean
        );
    }
    if let Some(buffer) = floor.vertex_buffer(0) {
        let brightest = buffer
            .as_slice()
            .iter()
            .map(|v| v.luminance())
            .fold(0.0f32, f32::max);
        log::info!(
            "Sandbox: floor vertex buffer has {} entries, brightest {:.4}",
            buffer.len(),
            brightest
        );
    }
    Ok(())
}
