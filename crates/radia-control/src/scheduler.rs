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

//! The adaptive real-time scheduler.

use crate::config::SchedulerConfig;
use crate::dirty::{DirtyState, LightChange};
use crate::error::{ConfigError, SolverError};
use crate::timing::{next_improve_step, TimingState};
use radia_core::{
    Clock, DirectIlluminationDetector, Improvement, Kernel, MaterialSource, MeshSource,
    ResetMode, SceneObject, SystemClock,
};
use radia_data::{MultiObject, ObjectIllumination, RegisteredObject, RemapTable};
use radia_lanes::{ReadbackRequest, ResultReader};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where the kernel stands with the current merged scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    /// No scene has been loaded yet.
    Idle,
    /// The kernel accepts `improve` calls.
    Running,
    /// The kernel converged; results stay readable. Any factor or energy
    /// reset puts it back to `Running`.
    Finished,
    /// The kernel failed internally; nothing runs until the next geometry
    /// rebuild.
    Failed,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Calls to `calculate` that ran past the interaction pause.
    pub calls: u64,
    /// Calls that reached `Kernel::improve`.
    pub improve_calls: u64,
    /// Merged scene rebuilds.
    pub geometry_rebuilds: u64,
    /// Successful direct illumination detections.
    pub light_detections: u64,
    /// Failed direct illumination detections.
    pub detection_failures: u64,
    /// Form-factor resets.
    pub factor_resets: u64,
    /// Energy-only resets.
    pub energy_resets: u64,
    /// Result readbacks.
    pub readbacks: u64,
}

/// The merged scene and the tables that are only valid alongside it.
struct SceneState {
    multi: MultiObject,
    remap: Vec<RemapTable>,
}

/// Drives a progressive radiosity kernel in small, deadline-bounded steps.
///
/// Call [`calculate`](Self::calculate) once per frame (or in a loop for batch
/// work). Each call applies pending changes in order, lets the kernel improve
/// its solution for an adaptively chosen time slice, and copies results into
/// the objects' illumination buffers when the readback throttle allows.
pub struct RealtimeRadiosity {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    kernel: Box<dyn Kernel>,
    detector: Box<dyn DirectIlluminationDetector>,
    objects: Vec<RegisteredObject>,
    stitch_distance: f32,
    result_channel: usize,
    dirty: DirtyState,
    timing: TimingState,
    scene: Option<SceneState>,
    kernel_state: KernelState,
    reader: ResultReader,
    stats: SchedulerStats,
}

impl RealtimeRadiosity {
    /// Creates a scheduler with no objects, timed by the system clock.
    pub fn new(
        kernel: Box<dyn Kernel>,
        detector: Box<dyn DirectIlluminationDetector>,
        config: SchedulerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            clock: Arc::new(SystemClock),
            kernel,
            detector,
            objects: Vec::new(),
            stitch_distance: -1.0,
            result_channel: 0,
            dirty: DirtyState::new(),
            timing: TimingState::new(&config),
            scene: None,
            kernel_state: KernelState::Idle,
            reader: ResultReader::new(config.measure, config.dilation_passes),
            stats: SchedulerStats::default(),
            config,
        })
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the registered objects and returns the previous ones.
    ///
    /// The order of `objects` defines their ids. Coincident vertices of
    /// different objects are stitched according to `stitch_distance` (see
    /// [`StitchMode::from_distance`](radia_data::StitchMode::from_distance)).
    /// The merged scene is rebuilt on the next calculation.
    pub fn set_objects(
        &mut self,
        objects: impl IntoIterator<Item = RegisteredObject>,
        stitch_distance: f32,
    ) -> Vec<RegisteredObject> {
        let previous = std::mem::replace(&mut self.objects, objects.into_iter().collect());
        self.stitch_distance = stitch_distance;
        log::info!(
            "Scheduler: {} objects registered (stitch distance {})",
            self.objects.len(),
            stitch_distance
        );
        self.report_geometry_change();
        previous
    }

    /// Selects the illumination channel readbacks write to.
    pub fn set_result_channel(&mut self, channel: usize) {
        if channel != self.result_channel {
            self.result_channel = channel;
            self.dirty.mark_results_stale();
        }
    }

    /// Current result channel.
    pub fn result_channel(&self) -> usize {
        self.result_channel
    }

    /// Some object's materials changed. Staged edits are applied on the next
    /// calculation.
    pub fn report_material_change(&mut self) {
        self.dirty.report_material_change();
    }

    /// Some object's geometry changed. The merged scene is discarded at once.
    pub fn report_geometry_change(&mut self) {
        self.dirty.report_geometry_change();
        self.scene = None;
    }

    /// Lighting changed. `strong` changes need direct illumination to be
    /// detected again and restart frequent readbacks.
    pub fn report_light_change(&mut self, strong: bool) {
        self.dirty.report_light_change(strong);
    }

    /// A latency-critical interaction (camera drag, object manipulation)
    /// started. Calculation pauses until it ends.
    pub fn report_critical_interaction_start(&mut self) {
        self.timing.interaction_in_progress = true;
    }

    /// The critical interaction ended. Calculation resumes after the
    /// configured pause.
    pub fn report_critical_interaction_end(&mut self) {
        self.timing.interaction_in_progress = false;
        self.timing.last_critical_interaction = Some(self.clock.now());
    }

    /// The renderer sampled the illumination buffers.
    pub fn report_illumination_use(&mut self) {
        self.timing.last_illumination_use = Some(self.clock.now());
    }

    /// Runs one scheduling step.
    ///
    /// Returns `Improved` when the kernel improved or fresh results were read
    /// back, `NotImproved` when paused or nothing happened, `Finished` once
    /// the kernel converged and `InternalError` when it failed.
    pub fn calculate(&mut self, request: ReadbackRequest) -> Result<Improvement, SolverError> {
        let now = self.clock.now();
        if self
            .timing
            .is_paused(now, self.config.pause_after_interaction())
        {
            log::trace!("Scheduler: paused by critical interaction");
            return Ok(Improvement::NotImproved);
        }
        self.stats.calls += 1;

        let used = self.timing.observe_user_step(now);
        let step = next_improve_step(
            &self.config,
            self.timing.improve_step,
            self.timing.calc_step.value(),
            self.timing.user_step.value(),
            used,
        );
        self.timing.improve_step = step;
        log::debug!(
            "Scheduler: improve step {:.1} ms (results used: {})",
            step * 1000.0,
            used
        );

        let result = self.calculate_core(now, Duration::from_secs_f32(step), request);

        let end = self.clock.now();
        self.timing.finish_calculation(now, end);
        log::trace!(
            "Scheduler: calculation took {:.2} ms",
            end.saturating_duration_since(now).as_secs_f64() * 1000.0
        );
        result
    }

    fn calculate_core(
        &mut self,
        now: Instant,
        step: Duration,
        request: ReadbackRequest,
    ) -> Result<Improvement, SolverError> {
        if self.objects.is_empty() {
            return Ok(Improvement::NotImproved);
        }

        if self.dirty.take_materials() {
            for registered in &mut self.objects {
                registered.object_mut().refresh_materials();
            }
            if let Some(scene) = self.scene.as_mut() {
                let views = object_views(&self.objects);
                scene.multi.reload_materials(&views)?;
                self.kernel.update_materials(&scene.multi)?;
            }
            self.dirty.mark_factors();
            log::debug!("Scheduler: materials refreshed");
        }

        if self.dirty.geometry() || self.scene.is_none() {
            self.rebuild_scene()?;
        }
        let Some(scene) = self.scene.as_ref() else {
            return Ok(Improvement::NotImproved);
        };

        let severity = self.dirty.lights();
        if severity.is_dirty() {
            match self.detector.detect(&scene.multi) {
                Ok(direct) => {
                    self.kernel.set_direct_illumination(&direct)?;
                    self.dirty.finish_light_detection();
                    if severity == LightChange::Big {
                        self.timing.throttle.reset_period();
                    }
                    self.stats.light_detections += 1;
                    log::debug!(
                        "Scheduler: direct illumination detected ({:?} change)",
                        severity
                    );
                }
                Err(err) => {
                    self.stats.detection_failures += 1;
                    log::warn!(
                        "Scheduler: direct illumination detection failed, retrying next call: {}",
                        err
                    );
                    return Ok(Improvement::NotImproved);
                }
            }
        }

        let mut reset = false;
        if self.dirty.take_factors() {
            self.kernel.reset(ResetMode::Factors);
            self.stats.factor_resets += 1;
            reset = true;
            log::debug!("Scheduler: form factors reset");
        }
        let energies = self.dirty.take_energies();
        if energies.is_dirty() {
            let full = energies == LightChange::Big;
            self.kernel.reset(ResetMode::Energies { full });
            self.stats.energy_resets += 1;
            reset = true;
            log::debug!("Scheduler: energies reset (full: {})", full);
        }
        // A converged kernel has work again after any reset; a failed one
        // waits for a rebuild.
        if reset && self.kernel_state == KernelState::Finished {
            self.kernel_state = KernelState::Running;
            log::debug!("Scheduler: kernel resumed after reset");
        }

        let mut verdict = Improvement::NotImproved;
        match self.kernel_state {
            KernelState::Running => {
                verdict = self.kernel.improve(now + step);
                self.stats.improve_calls += 1;
                match verdict {
                    Improvement::Improved => self.dirty.mark_results_stale(),
                    Improvement::NotImproved => {}
                    Improvement::Finished => {
                        self.dirty.mark_results_stale();
                        self.kernel_state = KernelState::Finished;
                        log::info!("Scheduler: kernel finished");
                    }
                    Improvement::InternalError => {
                        self.kernel_state = KernelState::Failed;
                        log::error!(
                            "Scheduler: kernel reported an internal error; halted until the next geometry change"
                        );
                        return Ok(Improvement::InternalError);
                    }
                }
            }
            KernelState::Finished => verdict = Improvement::Finished,
            KernelState::Failed => return Ok(Improvement::InternalError),
            KernelState::Idle => {}
        }

        if !request.is_empty() && self.dirty.results_stale() && self.timing.throttle.is_due(now) {
            self.reader.read(
                &*self.kernel,
                &scene.multi,
                &scene.remap,
                &mut self.objects,
                self.result_channel,
                request,
            )?;
            self.timing.throttle.mark(now);
            self.dirty.clear_results_stale();
            self.stats.readbacks += 1;
            verdict = Improvement::Improved;
        }
        Ok(verdict)
    }

    fn rebuild_scene(&mut self) -> Result<(), SolverError> {
        self.scene = None;
        let views = object_views(&self.objects);
        let multi = MultiObject::build(&views, self.stitch_distance)?;
        let remap = RemapTable::build_all(&multi)?;
        self.kernel.load_scene(&multi)?;
        log::info!(
            "Scheduler: scene rebuilt ({} objects, {} triangles)",
            self.objects.len(),
            multi.triangle_count()
        );
        self.scene = Some(SceneState { multi, remap });
        self.dirty.finish_geometry_rebuild();
        self.kernel_state = KernelState::Running;
        self.stats.geometry_rebuilds += 1;
        Ok(())
    }

    /// Number of registered objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// A registered object's geometry and materials.
    pub fn object(&self, index: usize) -> Result<&dyn SceneObject, SolverError> {
        self.registered(index).map(RegisteredObject::object)
    }

    /// Mutable access to a registered object. Report what you change.
    pub fn object_mut(&mut self, index: usize) -> Result<&mut dyn SceneObject, SolverError> {
        self.registered_mut(index).map(RegisteredObject::object_mut)
    }

    /// A registered object's illumination buffers.
    pub fn illumination(&self, index: usize) -> Result<&ObjectIllumination, SolverError> {
        self.registered(index).map(RegisteredObject::illumination)
    }

    /// Mutable access to an object's illumination, e.g. to attach an ambient
    /// map to the result channel.
    pub fn illumination_mut(
        &mut self,
        index: usize,
    ) -> Result<&mut ObjectIllumination, SolverError> {
        self.registered_mut(index)
            .map(RegisteredObject::illumination_mut)
    }

    fn registered(&self, index: usize) -> Result<&RegisteredObject, SolverError> {
        let count = self.objects.len();
        self.objects
            .get(index)
            .ok_or(SolverError::ObjectOutOfRange { index, count })
    }

    fn registered_mut(&mut self, index: usize) -> Result<&mut RegisteredObject, SolverError> {
        let count = self.objects.len();
        self.objects
            .get_mut(index)
            .ok_or(SolverError::ObjectOutOfRange { index, count })
    }

    /// The merged scene, absent until built and whenever geometry is dirty.
    pub fn multi_object(&self) -> Option<&MultiObject> {
        self.scene.as_ref().map(|scene| &scene.multi)
    }

    /// The remap table of one object in the current merged scene.
    pub fn remap_table(&self, index: usize) -> Option<&RemapTable> {
        self.scene.as_ref().and_then(|scene| scene.remap.get(index))
    }

    /// Pending changes.
    pub fn dirty_state(&self) -> &DirtyState {
        &self.dirty
    }

    /// Where the kernel stands.
    pub fn kernel_state(&self) -> KernelState {
        self.kernel_state
    }

    /// The time slice granted to the kernel by the latest calculation.
    pub fn improve_step(&self) -> Duration {
        self.timing.improve_step()
    }

    /// Minimum time between two readbacks at the moment.
    pub fn reading_results_period(&self) -> Duration {
        self.timing.throttle.period()
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

fn object_views(objects: &[RegisteredObject]) -> Vec<&dyn SceneObject> {
    objects.iter().map(RegisteredObject::object).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use radia_core::{
        DetectionError, DirectIllumination, Irradiance, KernelError, Measure, SceneMesh,
    };

    struct IdleKernel;

    impl Kernel for IdleKernel {
        fn load_scene(&mut self, _: &dyn SceneMesh) -> Result<(), KernelError> {
            Ok(())
        }
        fn set_direct_illumination(&mut self, _: &DirectIllumination) -> Result<(), KernelError> {
            Ok(())
        }
        fn reset(&mut self, _: ResetMode) {}
        fn improve(&mut self, _: Instant) -> Improvement {
            Improvement::NotImproved
        }
        fn triangle_measure(&self, _: u32, _: u8, _: Measure) -> Result<Irradiance, KernelError> {
            Ok(Irradiance::ZERO)
        }
    }

    struct DarkDetector;

    impl DirectIlluminationDetector for DarkDetector {
        fn detect(&mut self, scene: &dyn SceneMesh) -> Result<DirectIllumination, DetectionError> {
            Ok(DirectIllumination::new(vec![
                Irradiance::ZERO;
                scene.triangle_count() as usize
            ]))
        }
    }

    fn scheduler() -> RealtimeRadiosity {
        RealtimeRadiosity::new(
            Box::new(IdleKernel),
            Box::new(DarkDetector),
            SchedulerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SchedulerConfig {
            max_improve_step: 0.001,
            ..SchedulerConfig::default()
        };
        assert!(RealtimeRadiosity::new(Box::new(IdleKernel), Box::new(DarkDetector), config).is_err());
    }

    #[test]
    fn empty_scheduler_does_nothing() {
        let mut solver = scheduler();
        assert_eq!(solver.calculate(ReadbackRequest::ALL), Ok(Improvement::NotImproved));
        assert_eq!(solver.kernel_state(), KernelState::Idle);
        assert!(solver.multi_object().is_none());
    }

    #[test]
    fn out_of_range_objects_are_errors() {
        let mut solver = scheduler();
        assert_eq!(
            solver.illumination(3).err(),
            Some(SolverError::ObjectOutOfRange { index: 3, count: 0 })
        );
        assert!(solver.object_mut(0).is_err());
    }

    #[test]
    fn result_channel_change_marks_results_stale() {
        let mut solver = scheduler();
        solver.set_result_channel(0);
        assert!(!solver.dirty_state().results_stale());
        solver.set_result_channel(4);
        assert!(solver.dirty_state().results_stale());
        assert_eq!(solver.result_channel(), 4);
    }
}
