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

//! # Radia Core
//!
//! Foundational crate containing the contracts the illumination scheduler is
//! built against: the opaque solver ([`Kernel`]), the geometry and material
//! providers, provenance indices for merged meshes, and an injectable clock.

#![warn(missing_docs)]

pub mod clock;
pub mod color;
pub mod geometry;
pub mod kernel;
pub mod provenance;

pub use clock::{Clock, ManualClock, SystemClock};
pub use color::Irradiance;
pub use geometry::{
    GeometryError, MaterialSource, MeshSource, SceneMesh, SceneObject, SurfaceMaterial,
};
pub use kernel::{
    DetectionError, DirectIllumination, DirectIlluminationDetector, Improvement, Kernel,
    KernelError, Measure, ResetMode,
};
pub use provenance::{Provenance, ProvenanceCodec, ProvenanceError};

pub use glam::{Vec2, Vec3};
