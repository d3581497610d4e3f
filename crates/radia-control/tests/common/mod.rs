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

//! Scripted kernel, detector and scene helpers shared by the scheduler
//! integration tests.

#![allow(dead_code)]

use radia_control::{RealtimeRadiosity, SchedulerConfig};
use radia_core::{
    DetectionError, DirectIllumination, DirectIlluminationDetector, Improvement, Irradiance,
    Kernel, KernelError, ManualClock, Measure, MeshSource, ResetMode, SceneMesh, Vec3,
};
use radia_data::{RegisteredObject, StaticMesh};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Something the scheduler asked the kernel to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelEvent {
    LoadScene { triangles: u32 },
    DirectIllumination,
    Reset(ResetMode),
    Improve,
}

/// Handles the test keeps after moving the kernel into the scheduler.
#[derive(Clone)]
pub struct KernelProbe {
    events: Arc<Mutex<Vec<KernelEvent>>>,
    verdicts: Arc<Mutex<VecDeque<Improvement>>>,
}

impl KernelProbe {
    pub fn events(&self) -> Vec<KernelEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn count(&self, event: KernelEvent) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }

    /// Queues verdicts returned by the next `improve` calls; `Improved`
    /// once the queue is empty.
    pub fn queue(&self, verdicts: impl IntoIterator<Item = Improvement>) {
        self.verdicts.lock().unwrap().extend(verdicts);
    }
}

/// A kernel that records calls, reports the number of finished improve
/// calls as every measurement, and "works" until its deadline by advancing
/// the shared clock.
pub struct ScriptedKernel {
    clock: Arc<ManualClock>,
    probe: KernelProbe,
    triangles: u32,
    improvements: u32,
    busy_until_deadline: bool,
}

impl ScriptedKernel {
    pub fn new(clock: Arc<ManualClock>) -> (Self, KernelProbe) {
        let probe = KernelProbe {
            events: Arc::new(Mutex::new(Vec::new())),
            verdicts: Arc::new(Mutex::new(VecDeque::new())),
        };
        let kernel = Self {
            clock,
            probe: probe.clone(),
            triangles: 0,
            improvements: 0,
            busy_until_deadline: true,
        };
        (kernel, probe)
    }

    /// Returns from `improve` immediately instead of using the whole slice.
    pub fn instant(mut self) -> Self {
        self.busy_until_deadline = false;
        self
    }

    fn record(&self, event: KernelEvent) {
        self.probe.events.lock().unwrap().push(event);
    }
}

impl Kernel for ScriptedKernel {
    fn load_scene(&mut self, scene: &dyn SceneMesh) -> Result<(), KernelError> {
        self.triangles = scene.triangle_count();
        self.record(KernelEvent::LoadScene {
            triangles: self.triangles,
        });
        Ok(())
    }

    fn set_direct_illumination(&mut self, direct: &DirectIllumination) -> Result<(), KernelError> {
        if direct.len() != self.triangles as usize {
            return Err(KernelError::DirectIlluminationMismatch {
                got: direct.len(),
                expected: self.triangles as usize,
            });
        }
        self.record(KernelEvent::DirectIllumination);
        Ok(())
    }

    fn reset(&mut self, mode: ResetMode) {
        self.record(KernelEvent::Reset(mode));
    }

    fn improve(&mut self, deadline: Instant) -> Improvement {
        self.record(KernelEvent::Improve);
        if self.busy_until_deadline {
            self.clock
                .set_elapsed(deadline.saturating_duration_since(self.clock.origin()));
        }
        self.improvements += 1;
        self.probe
            .verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Improvement::Improved)
    }

    fn triangle_measure(
        &self,
        triangle: u32,
        corner: u8,
        _measure: Measure,
    ) -> Result<Irradiance, KernelError> {
        if triangle >= self.triangles {
            return Err(KernelError::NoScene);
        }
        if corner > 2 {
            return Err(KernelError::CornerOutOfRange(corner));
        }
        Ok(Irradiance::splat(self.improvements as f32))
    }
}

/// A detector lighting every triangle uniformly, which can be told to fail.
pub struct ScriptedDetector {
    fail: Arc<AtomicBool>,
}

impl ScriptedDetector {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let fail = Arc::new(AtomicBool::new(false));
        (Self { fail: fail.clone() }, fail)
    }
}

impl DirectIlluminationDetector for ScriptedDetector {
    fn detect(&mut self, scene: &dyn SceneMesh) -> Result<DirectIllumination, DetectionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DetectionError::Failed("light probe unavailable".to_owned()));
        }
        Ok(DirectIllumination::new(vec![
            Irradiance::splat(1.0);
            scene.triangle_count() as usize
        ]))
    }
}

/// Everything a scenario needs.
pub struct Harness {
    pub solver: RealtimeRadiosity,
    pub clock: Arc<ManualClock>,
    pub kernel: KernelProbe,
    pub detector_fails: Arc<AtomicBool>,
}

impl Harness {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::build(config, false)
    }

    /// Same, but the kernel returns from `improve` without consuming time.
    pub fn instant(config: SchedulerConfig) -> Self {
        Self::build(config, true)
    }

    fn build(config: SchedulerConfig, instant: bool) -> Self {
        let clock = Arc::new(ManualClock::new());
        let (kernel, probe) = ScriptedKernel::new(clock.clone());
        let kernel = if instant { kernel.instant() } else { kernel };
        let (detector, detector_fails) = ScriptedDetector::new();
        let solver = RealtimeRadiosity::new(Box::new(kernel), Box::new(detector), config)
            .unwrap()
            .with_clock(clock.clone());
        Self {
            solver,
            clock,
            kernel: probe,
            detector_fails,
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
    }
}

/// One triangle, three vertices.
pub fn single_triangle() -> RegisteredObject {
    RegisteredObject::new(Box::new(
        StaticMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]).unwrap(),
    ))
}

/// A unit quad in the XY plane offset along X.
pub fn quad_at(x: f32) -> StaticMesh {
    StaticMesh::new(
        vec![
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x + 1.0, 0.0, 0.0),
            Vec3::new(x + 1.0, 1.0, 0.0),
            Vec3::new(x, 1.0, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .unwrap()
}
