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

//! Integration tests for what reaches the illumination buffers and for the
//! adaptive improve step.

mod common;

use common::{quad_at, Harness};
use radia_control::{ReadbackRequest, SchedulerConfig};
use radia_core::{Irradiance, MeshSource, Vec2, Vec3};
use radia_data::{RegisteredObject, StaticMesh};
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Vertex buffers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unreferenced_vertices_read_as_zero() {
    let mut h = Harness::instant(SchedulerConfig::default());
    let mesh = StaticMesh::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::splat(4.0)],
        vec![[0, 1, 2]],
    )
    .unwrap();
    h.solver
        .set_objects([RegisteredObject::new(Box::new(mesh))], -1.0);
    h.solver.calculate(ReadbackRequest::ALL).unwrap();

    let buffer = h.solver.illumination(0).unwrap().vertex_buffer(0).unwrap();
    assert_eq!(buffer.len(), 4);
    assert_eq!(buffer.get(0), Some(Irradiance::splat(1.0)));
    assert_eq!(buffer.get(3), Some(Irradiance::ZERO));
}

#[test]
fn test_buffers_follow_pre_import_numbering() {
    let mut h = Harness::instant(SchedulerConfig::default());
    // Five source vertices, of which the importer kept 4, 0 and 2.
    let mesh = StaticMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]])
        .unwrap()
        .with_pre_import(vec![4, 0, 2], 5)
        .unwrap();
    h.solver
        .set_objects([RegisteredObject::new(Box::new(mesh))], -1.0);
    h.solver.calculate(ReadbackRequest::ALL).unwrap();

    let buffer = h.solver.illumination(0).unwrap().vertex_buffer(0).unwrap();
    assert_eq!(buffer.len(), 5);
    assert_eq!(buffer.get(1), Some(Irradiance::ZERO));
    assert_eq!(buffer.get(3), Some(Irradiance::ZERO));
    assert_eq!(buffer.get(4), Some(Irradiance::splat(1.0)));
}

#[test]
fn test_stitched_objects_keep_their_own_buffers() {
    let mut h = Harness::instant(SchedulerConfig::default());
    h.solver.set_objects(
        [
            RegisteredObject::new(Box::new(quad_at(0.0))),
            RegisteredObject::new(Box::new(quad_at(1.0))),
        ],
        0.0,
    );
    h.solver.calculate(ReadbackRequest::ALL).unwrap();

    let multi = h.solver.multi_object().unwrap();
    assert_eq!(multi.vertex_count(), 6);
    assert_eq!(multi.triangle_count(), 4);
    for object in 0..2 {
        let buffer = h
            .solver
            .illumination(object)
            .unwrap()
            .vertex_buffer(0)
            .unwrap();
        assert_eq!(buffer.as_slice(), &[Irradiance::splat(1.0); 4]);
    }
}

#[test]
fn test_result_channel_selects_the_target_buffer() {
    let mut h = Harness::instant(SchedulerConfig::default());
    h.solver
        .set_objects([RegisteredObject::new(Box::new(quad_at(0.0)))], -1.0);
    h.solver.calculate(ReadbackRequest::ALL).unwrap();

    h.solver.set_result_channel(3);
    h.advance_ms(2000);
    h.solver.calculate(ReadbackRequest::VERTEX_BUFFERS).unwrap();

    let illumination = h.solver.illumination(0).unwrap();
    assert_eq!(
        illumination.vertex_buffer(0).unwrap().get(0),
        Some(Irradiance::splat(1.0))
    );
    assert_eq!(
        illumination.vertex_buffer(3).unwrap().get(0),
        Some(Irradiance::splat(2.0))
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Ambient maps
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_ambient_map_is_rasterized_and_dilated() {
    let mut h = Harness::instant(SchedulerConfig::default());
    let mesh = quad_at(0.0)
        .with_mapping(vec![
            [Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.5)],
            [Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.5), Vec2::new(0.0, 0.5)],
        ])
        .unwrap();
    h.solver
        .set_objects([RegisteredObject::new(Box::new(mesh))], -1.0);
    h.solver
        .illumination_mut(0)
        .unwrap()
        .channel_mut(0)
        .ensure_ambient_map(8, 8);

    h.solver.calculate(ReadbackRequest::AMBIENT_MAPS).unwrap();

    let illumination = h.solver.illumination(0).unwrap();
    assert!(illumination.vertex_buffer(0).is_none());
    let map = illumination.ambient_map(0).unwrap();
    // A 4x4 chart plus one dilated ring around its free sides.
    assert_eq!(map.covered_count(), 16 + 9);
    assert_eq!(map.texel(1, 1).unwrap(), Irradiance::splat(1.0));
    assert_eq!(map.texel(4, 4).unwrap(), Irradiance::splat(1.0));
    assert!(!map.is_covered(6, 6).unwrap());
}

// ─────────────────────────────────────────────────────────────────────────────
// Improve step
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_improve_step_stays_within_bounds() {
    let config = SchedulerConfig::default();
    let min = Duration::from_secs_f32(config.min_improve_step);
    let max = Duration::from_secs_f32(config.max_improve_step);
    let mut h = Harness::new(config);
    h.solver
        .set_objects([RegisteredObject::new(Box::new(quad_at(0.0)))], -1.0);

    // Deterministic pseudo-random frame times and usage.
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };
    for _ in 0..500 {
        h.solver.calculate(ReadbackRequest::ALL).unwrap();
        let step = h.solver.improve_step();
        assert!(step >= min && step <= max, "step {step:?} out of bounds");

        let roll = next();
        if roll % 3 != 0 {
            h.solver.report_illumination_use();
        }
        h.advance_ms(roll % 400);
    }
}

#[test]
fn test_step_shrinks_toward_a_fast_frame_rate() {
    let config = SchedulerConfig::default();
    let mut h = Harness::new(config.clone());
    h.solver
        .set_objects([RegisteredObject::new(Box::new(quad_at(0.0)))], -1.0);

    // The renderer samples the buffers and needs 10 ms of its own per frame.
    for _ in 0..60 {
        h.solver.calculate(ReadbackRequest::ALL).unwrap();
        h.solver.report_illumination_use();
        h.advance_ms(10);
    }
    let step = h.solver.improve_step();
    assert!(step < Duration::from_secs_f32(config.no_interaction_step));
    assert!(step < Duration::from_millis(30), "step {step:?} did not adapt");
}

#[test]
fn test_unused_results_fall_back_to_the_batch_step() {
    let config = SchedulerConfig::default();
    let mut h = Harness::new(config.clone());
    h.solver
        .set_objects([RegisteredObject::new(Box::new(quad_at(0.0)))], -1.0);

    for _ in 0..10 {
        h.solver.calculate(ReadbackRequest::ALL).unwrap();
        h.solver.report_illumination_use();
        h.advance_ms(10);
    }
    // The renderer stops looking.
    h.solver.calculate(ReadbackRequest::ALL).unwrap();
    h.advance_ms(10);
    h.solver.calculate(ReadbackRequest::ALL).unwrap();
    assert_eq!(
        h.solver.improve_step(),
        Duration::from_secs_f32(config.no_interaction_step)
    );
}
