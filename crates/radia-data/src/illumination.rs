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

//! Renderer-facing illumination buffers.
//!
//! Each registered object owns an [`ObjectIllumination`]: a set of channels
//! keyed by an arbitrary index. A channel lazily grows a per-vertex buffer
//! and/or an ambient map. Buffers are reused across updates and only
//! reallocated when their requested size changes.

use crate::error::StorageError;
use radia_core::Irradiance;
use std::collections::BTreeMap;

/// Per-vertex irradiance in the owning object's pre-import numbering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    values: Vec<Irradiance>,
}

impl VertexBuffer {
    /// Creates a zero-filled buffer.
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![Irradiance::ZERO; len],
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for an empty buffer.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of one vertex.
    pub fn get(&self, index: usize) -> Option<Irradiance> {
        self.values.get(index).copied()
    }

    /// Overwrites one vertex.
    pub fn set(&mut self, index: usize, value: Irradiance) -> Result<(), StorageError> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(StorageError::VertexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    /// All values.
    pub fn as_slice(&self) -> &[Irradiance] {
        &self.values
    }

    /// Raw bytes, ready for a GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }

    /// Resizes to `len`, zero-filling. Returns `true` if the size changed.
    fn resize(&mut self, len: usize) -> bool {
        if self.values.len() == len {
            return false;
        }
        self.values = vec![Irradiance::ZERO; len];
        true
    }
}

/// A 2D texture of baked irradiance.
///
/// Alongside the texels the map keeps a coverage mask recording which texels
/// were written by the current bake, which the dilation pass reads.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientMap {
    width: u32,
    height: u32,
    texels: Vec<Irradiance>,
    coverage: Vec<bool>,
}

impl AmbientMap {
    /// Creates a black map.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            texels: vec![Irradiance::ZERO; len],
            coverage: vec![false; len],
        }
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reads one texel.
    pub fn texel(&self, x: u32, y: u32) -> Result<Irradiance, StorageError> {
        self.index(x, y).map(|i| self.texels[i])
    }

    /// Returns whether the current bake wrote (or dilated into) a texel.
    pub fn is_covered(&self, x: u32, y: u32) -> Result<bool, StorageError> {
        self.index(x, y).map(|i| self.coverage[i])
    }

    /// All texels, row-major.
    pub fn texels(&self) -> &[Irradiance] {
        &self.texels
    }

    /// Raw texel bytes (RGB32F), ready for a texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Number of covered texels.
    pub fn covered_count(&self) -> usize {
        self.coverage.iter().filter(|&&c| c).count()
    }

    /// Marks every texel as unwritten, keeping the texel values.
    pub fn clear_coverage(&mut self) {
        self.coverage.fill(false);
    }

    /// Splits the map into its texel and coverage planes for a bake pass.
    pub fn planes_mut(&mut self) -> (&mut [Irradiance], &mut [bool]) {
        (&mut self.texels, &mut self.coverage)
    }

    fn index(&self, x: u32, y: u32) -> Result<usize, StorageError> {
        if x >= self.width || y >= self.height {
            return Err(StorageError::TexelOutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }
}

/// One result channel of an object.
#[derive(Debug, Clone, Default)]
pub struct IlluminationChannel {
    vertex_buffer: Option<VertexBuffer>,
    ambient_map: Option<AmbientMap>,
}

impl IlluminationChannel {
    /// The vertex buffer, if one was created.
    pub fn vertex_buffer(&self) -> Option<&VertexBuffer> {
        self.vertex_buffer.as_ref()
    }

    /// Returns the vertex buffer, creating or resizing it to `len` vertices.
    pub fn ensure_vertex_buffer(&mut self, len: usize) -> &mut VertexBuffer {
        let buffer = self.vertex_buffer.get_or_insert_with(VertexBuffer::default);
        if buffer.resize(len) {
            log::debug!("IlluminationChannel: vertex buffer sized to {len}");
        }
        buffer
    }

    /// The ambient map, if one was requested.
    pub fn ambient_map(&self) -> Option<&AmbientMap> {
        self.ambient_map.as_ref()
    }

    /// Mutable access to the ambient map, if one was requested.
    pub fn ambient_map_mut(&mut self) -> Option<&mut AmbientMap> {
        self.ambient_map.as_mut()
    }

    /// Returns the ambient map, creating it or recreating it when the
    /// requested size differs from the current one.
    pub fn ensure_ambient_map(&mut self, width: u32, height: u32) -> &mut AmbientMap {
        let stale = self
            .ambient_map
            .as_ref()
            .map_or(true, |m| m.width() != width || m.height() != height);
        if stale {
            log::debug!("IlluminationChannel: ambient map sized to {width}x{height}");
            self.ambient_map = Some(AmbientMap::new(width, height));
        }
        self.ambient_map.get_or_insert_with(|| AmbientMap::new(width, height))
    }

    /// Drops the ambient map; the pixel path then skips this channel.
    pub fn remove_ambient_map(&mut self) -> Option<AmbientMap> {
        self.ambient_map.take()
    }
}

/// All illumination channels of one object.
#[derive(Debug, Clone, Default)]
pub struct ObjectIllumination {
    channels: BTreeMap<usize, IlluminationChannel>,
}

impl ObjectIllumination {
    /// Creates storage with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel, if it was ever used.
    pub fn channel(&self, index: usize) -> Option<&IlluminationChannel> {
        self.channels.get(&index)
    }

    /// A channel, created empty on first use.
    pub fn channel_mut(&mut self, index: usize) -> &mut IlluminationChannel {
        self.channels.entry(index).or_default()
    }

    /// A channel, only if it already exists.
    pub fn existing_channel_mut(&mut self, index: usize) -> Option<&mut IlluminationChannel> {
        self.channels.get_mut(&index)
    }

    /// Shortcut for the vertex buffer of a channel.
    pub fn vertex_buffer(&self, channel: usize) -> Option<&VertexBuffer> {
        self.channel(channel).and_then(IlluminationChannel::vertex_buffer)
    }

    /// Shortcut for the ambient map of a channel.
    pub fn ambient_map(&self, channel: usize) -> Option<&AmbientMap> {
        self.channel(channel).and_then(IlluminationChannel::ambient_map)
    }

    /// Indices of every channel in use.
    pub fn channel_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.channels.keys().copied()
    }
}
