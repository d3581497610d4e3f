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

//! # Radia Control
//!
//! The adaptive scheduler sitting between an interactive application and a
//! progressive radiosity kernel. It decides how long the kernel may run each
//! frame, which caches must be rebuilt before it does, and when results are
//! worth copying out.

#![warn(missing_docs)]

pub mod config;
pub mod dirty;
pub mod error;
pub mod scheduler;
pub mod timing;

pub use config::{SchedulerConfig, MAX_DURATION_SECS};
pub use dirty::{DirtyState, LightChange};
pub use error::{ConfigError, SolverError};
pub use scheduler::{KernelState, RealtimeRadiosity, SchedulerStats};
pub use timing::{next_improve_step, Ema, ReadbackThrottle, TimingState};

pub use radia_lanes::ReadbackRequest;
