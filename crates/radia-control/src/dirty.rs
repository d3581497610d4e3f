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

//! Pending-change bookkeeping between two calculations.
//!
//! Callers report changes as they happen; the scheduler consumes them in a
//! fixed order (materials, geometry, lights, factors, energies) at the start
//! of the next calculation.

/// How much the lighting changed.
///
/// Ordered so that merging two reports keeps the stronger one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LightChange {
    /// Nothing to do.
    #[default]
    None,
    /// Light intensities changed; only energies need resetting.
    Small,
    /// Lights moved or appeared; direct illumination must be redetected.
    Big,
}

impl LightChange {
    /// `Big` for a strong change, `Small` otherwise.
    pub fn from_strong(strong: bool) -> Self {
        if strong {
            LightChange::Big
        } else {
            LightChange::Small
        }
    }

    /// The stronger of two changes.
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Whether anything changed.
    pub fn is_dirty(self) -> bool {
        self != LightChange::None
    }
}

/// Dirty flags of one scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyState {
    materials: bool,
    geometry: bool,
    lights: LightChange,
    factors: bool,
    energies: LightChange,
    results_stale: bool,
}

impl Default for DirtyState {
    /// Nothing has been built yet, so geometry and lights start dirty.
    fn default() -> Self {
        Self {
            materials: false,
            geometry: true,
            lights: LightChange::Big,
            factors: false,
            energies: LightChange::None,
            results_stale: false,
        }
    }
}

impl DirtyState {
    /// Creates the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Some surface material changed.
    pub fn report_material_change(&mut self) {
        self.materials = true;
    }

    /// Geometry changed; implies a big light change.
    pub fn report_geometry_change(&mut self) {
        self.geometry = true;
        self.lights = LightChange::Big;
    }

    /// Lighting changed. A small report never weakens a pending big one.
    pub fn report_light_change(&mut self, strong: bool) {
        self.lights = self.lights.merge(LightChange::from_strong(strong));
    }

    /// Consumes the material flag.
    pub fn take_materials(&mut self) -> bool {
        std::mem::take(&mut self.materials)
    }

    /// Whether the merged scene must be rebuilt.
    pub fn geometry(&self) -> bool {
        self.geometry
    }

    /// Records a successful rebuild: lights must be redetected and form
    /// factors recomputed.
    pub fn finish_geometry_rebuild(&mut self) {
        self.geometry = false;
        self.lights = LightChange::Big;
        self.factors = true;
    }

    /// Pending light change.
    pub fn lights(&self) -> LightChange {
        self.lights
    }

    /// Records a successful detection, turning the pending light change into
    /// an energy reset of the same severity. Returns that severity.
    pub fn finish_light_detection(&mut self) -> LightChange {
        let severity = std::mem::take(&mut self.lights);
        self.energies = self.energies.merge(severity);
        severity
    }

    /// Requests a form-factor reset.
    pub fn mark_factors(&mut self) {
        self.factors = true;
    }

    /// Whether a form-factor reset is pending.
    pub fn factors(&self) -> bool {
        self.factors
    }

    /// Consumes a pending form-factor reset, which also covers energies.
    pub fn take_factors(&mut self) -> bool {
        if !self.factors {
            return false;
        }
        self.factors = false;
        self.energies = LightChange::None;
        self.results_stale = true;
        true
    }

    /// Pending energy reset.
    pub fn energies(&self) -> LightChange {
        self.energies
    }

    /// Consumes a pending energy reset.
    pub fn take_energies(&mut self) -> LightChange {
        let energies = std::mem::take(&mut self.energies);
        if energies.is_dirty() {
            self.results_stale = true;
        }
        energies
    }

    /// The kernel's results moved past what the buffers hold.
    pub fn mark_results_stale(&mut self) {
        self.results_stale = true;
    }

    /// Whether the buffers lag behind the kernel.
    pub fn results_stale(&self) -> bool {
        self.results_stale
    }

    /// The buffers caught up with the kernel.
    pub fn clear_results_stale(&mut self) {
        self.results_stale = false;
    }

    /// Whether nothing but possibly a readback is pending.
    pub fn is_clean(&self) -> bool {
        !self.materials
            && !self.geometry
            && !self.lights.is_dirty()
            && !self.factors
            && !self.energies.is_dirty()
    }
}
