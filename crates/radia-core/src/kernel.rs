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

//! The opaque radiosity solver and the direct-illumination detector.
//!
//! Nothing in this workspace knows how energy transport is computed. The
//! scheduler only loads a scene, resets the solution, grants bounded bursts of
//! work and reads per-corner results back.

use crate::color::Irradiance;
use crate::geometry::{GeometryError, SceneMesh};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// Outcome of one bounded burst of kernel work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Improvement {
    /// The solution got better.
    Improved,
    /// Nothing changed, e.g. the deadline was too short to finish a step.
    NotImproved,
    /// The solution converged; further calls are pointless.
    Finished,
    /// The kernel hit an internal error; further calls are meaningless until
    /// a new scene is loaded.
    InternalError,
}

impl Improvement {
    /// Returns `true` for verdicts after which `improve()` must not be called
    /// again on the same scene.
    pub fn is_terminal(self) -> bool {
        matches!(self, Improvement::Finished | Improvement::InternalError)
    }
}

/// What to throw away when resetting the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetMode {
    /// Discard form factors and energies (materials or geometry changed).
    Factors,
    /// Keep form factors, discard energies. `full` also discards
    /// propagation state derived from the previous direct illumination.
    Energies {
        /// Big light change: restart propagation from scratch.
        full: bool,
    },
}

/// Which quantity to read back per triangle corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Measure {
    /// Indirect irradiance only, for ambient maps layered over direct lighting.
    #[default]
    IndirectIrradiance,
    /// Direct plus indirect irradiance.
    TotalIrradiance,
    /// Direct irradiance only.
    DirectIrradiance,
    /// Radiance leaving the surface.
    ExitingRadiance,
}

/// Errors reported by a kernel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// A query arrived before any scene was loaded.
    #[error("no scene loaded")]
    NoScene,
    /// The kernel could not accept the scene.
    #[error("kernel rejected scene: {0}")]
    SceneRejected(String),
    /// A corner index outside `0..3`.
    #[error("corner {0} out of range")]
    CornerOutOfRange(u8),
    /// Direct illumination does not cover the loaded scene.
    #[error("direct illumination covers {got} triangles, scene has {expected}")]
    DirectIlluminationMismatch {
        /// Triangles covered by the detector output.
        got: usize,
        /// Triangles in the loaded scene.
        expected: usize,
    },
    /// An index passed to the kernel is out of range.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Per-triangle direct irradiance, indexed by merged triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectIllumination {
    per_triangle: Vec<Irradiance>,
}

impl DirectIllumination {
    /// Wraps per-triangle direct irradiance.
    pub fn new(per_triangle: Vec<Irradiance>) -> Self {
        Self { per_triangle }
    }

    /// Number of triangles covered.
    pub fn len(&self) -> usize {
        self.per_triangle.len()
    }

    /// Returns `true` if no triangle is covered.
    pub fn is_empty(&self) -> bool {
        self.per_triangle.is_empty()
    }

    /// The per-triangle values.
    pub fn as_slice(&self) -> &[Irradiance] {
        &self.per_triangle
    }
}

/// The solver driven by the scheduler.
pub trait Kernel: Send {
    /// Replaces the scene. Any previous solution is discarded.
    fn load_scene(&mut self, scene: &dyn SceneMesh) -> Result<(), KernelError>;

    /// Installs freshly detected direct illumination as the primary source.
    fn set_direct_illumination(&mut self, direct: &DirectIllumination)
        -> Result<(), KernelError>;

    /// Re-reads per-triangle materials of the loaded scene after they were
    /// refreshed in place. A [`ResetMode::Factors`] reset always follows.
    fn update_materials(&mut self, _scene: &dyn SceneMesh) -> Result<(), KernelError> {
        Ok(())
    }

    /// Resets the solution.
    fn reset(&mut self, mode: ResetMode);

    /// Works on the solution until `deadline`, then reports progress.
    fn improve(&mut self, deadline: Instant) -> Improvement;

    /// Reads the current estimate at one corner of a scene triangle.
    fn triangle_measure(
        &self,
        triangle: u32,
        corner: u8,
        measure: Measure,
    ) -> Result<Irradiance, KernelError>;
}

/// Errors from direct-illumination detection. Both are recoverable: the
/// scheduler retries on the next call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    /// The detector's inputs are not ready yet (e.g. shadow maps pending).
    #[error("direct illumination not ready: {0}")]
    NotReady(String),
    /// Detection ran but failed.
    #[error("direct illumination detection failed: {0}")]
    Failed(String),
}

/// Computes direct illumination of every scene triangle.
pub trait DirectIlluminationDetector: Send {
    /// Detects per-triangle direct irradiance for `scene`.
    fn detect(&mut self, scene: &dyn SceneMesh) -> Result<DirectIllumination, DetectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_verdicts() {
        assert!(Improvement::Finished.is_terminal());
        assert!(Improvement::InternalError.is_terminal());
        assert!(!Improvement::Improved.is_terminal());
        assert!(!Improvement::NotImproved.is_terminal());
    }

    #[test]
    fn default_measure_is_indirect() {
        assert_eq!(Measure::default(), Measure::IndirectIrradiance);
    }

    #[test]
    fn kernel_error_wraps_geometry_error() {
        let err: KernelError = GeometryError::TriangleOutOfRange { index: 4, count: 1 }.into();
        assert_eq!(
            format!("{err}"),
            "triangle index 4 out of range (triangle count 1)"
        );
    }
}
