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

//! # Radia Data
//!
//! Data layouts owned by the scheduler: the merged multi-object view, the
//! per-object vertex remap tables and the illumination buffers handed to the
//! renderer.

#![warn(missing_docs)]

pub mod error;
pub mod illumination;
pub mod mesh;
pub mod multi_object;
pub mod object;
pub mod remap;

pub use error::{AggregateError, RemapError, StorageError};
pub use illumination::{AmbientMap, IlluminationChannel, ObjectIllumination, VertexBuffer};
pub use mesh::StaticMesh;
pub use multi_object::{MultiObject, StitchMode};
pub use object::RegisteredObject;
pub use remap::{CornerRef, RemapTable};
