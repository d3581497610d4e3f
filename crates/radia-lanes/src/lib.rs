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

//! # Radia Lanes
//!
//! Performance-sensitive passes run by the scheduler once the kernel has
//! produced something worth showing: triangle rasterization into ambient
//! maps, seam dilation, and the reader that copies kernel measurements into
//! per-object vertex buffers and ambient maps.

#![warn(missing_docs)]

pub mod raster_lane;
pub mod readback_lane;

pub use raster_lane::{dilate, rasterize_triangle, RasterVertex};
pub use readback_lane::{
    AmbientMapLane, ReadbackError, ReadbackReport, ReadbackRequest, ResultReader,
    VertexReadbackLane,
};
