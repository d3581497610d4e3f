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

//! Error types for the data layouts.

use radia_core::{GeometryError, ProvenanceError};
use thiserror::Error;

/// Failures while merging objects into a [`MultiObject`](crate::MultiObject).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    /// The object count does not fit the provenance codec.
    #[error(transparent)]
    Provenance(#[from] ProvenanceError),
    /// An object returned inconsistent geometry.
    #[error("object {object}: {source}")]
    Geometry {
        /// Registration index of the object.
        object: usize,
        /// The underlying error.
        source: GeometryError,
    },
    /// An object has more elements than its provenance index can address.
    #[error("object {object} has {elements} elements, exceeding the per-object limit of {limit}")]
    Capacity {
        /// Registration index of the object.
        object: usize,
        /// Largest of its vertex, pre-import vertex and triangle counts.
        elements: u64,
        /// Exclusive per-object limit.
        limit: u64,
    },
    /// The merged mesh has more elements than a `u32` index can address.
    #[error("merged mesh exceeds the u32 {0} limit")]
    TooLarge(&'static str),
}

/// Failures while building [`RemapTable`](crate::RemapTable)s.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemapError {
    /// A provenance index names an object that is not registered.
    #[error("provenance names object {object} but only {count} objects are registered")]
    UnknownObject {
        /// The decoded object id.
        object: u32,
        /// Number of registered objects.
        count: usize,
    },
    /// The merged mesh rejected an index.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Out-of-range access to an illumination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A vertex beyond the vertex buffer.
    #[error("vertex {index} out of range (buffer length {len})")]
    VertexOutOfRange {
        /// The offending index.
        index: usize,
        /// The buffer length.
        len: usize,
    },
    /// A texel outside the ambient map.
    #[error("texel ({x}, {y}) outside {width}x{height} ambient map")]
    TexelOutOfRange {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// Map width.
        width: u32,
        /// Map height.
        height: u32,
    },
}
