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

//! Error types of the scheduler.

use radia_core::KernelError;
use radia_data::{AggregateError, RemapError};
use radia_lanes::ReadbackError;
use thiserror::Error;

/// A rejected [`SchedulerConfig`](crate::SchedulerConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The RON source did not parse.
    #[error("failed to parse scheduler config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The config could not be written as RON.
    #[error("failed to serialize scheduler config: {0}")]
    Serialize(#[from] ron::Error),
    /// A value is out of range or inconsistent with another.
    #[error("invalid scheduler config: {0}")]
    Invalid(String),
}

/// Failures surfaced by [`RealtimeRadiosity`](crate::RealtimeRadiosity).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// Merging the registered objects failed.
    #[error("failed to build the merged scene: {0}")]
    Aggregate(#[from] AggregateError),
    /// Building the vertex remap tables failed.
    #[error("failed to build vertex remap tables: {0}")]
    Remap(#[from] RemapError),
    /// The kernel rejected the scene or its direct illumination.
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
    /// Reading results back failed.
    #[error("readback failed: {0}")]
    Readback(#[from] ReadbackError),
    /// No registered object has this index.
    #[error("object {index} out of range ({count} objects registered)")]
    ObjectOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of registered objects.
        count: usize,
    },
}
