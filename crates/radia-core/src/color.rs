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

//! Linear RGB irradiance samples.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul};

/// A linear RGB irradiance (or radiance) value.
///
/// The layout is `#[repr(C)]` and `Pod`, so vertex buffers of irradiance can be
/// handed to a renderer as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Irradiance {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
}

impl Irradiance {
    /// No light at all.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new value from its components.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Creates a grey value with all components equal to `v`.
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Returns the components as `[r, g, b]`.
    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Builds a value from `[r, g, b]`.
    pub const fn from_array(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }

    /// Overwrites one component; `0` is red, `1` green, anything else blue.
    pub fn set_component(&mut self, component: usize, value: f32) {
        match component {
            0 => self.r = value,
            1 => self.g = value,
            _ => self.b = value,
        }
    }

    /// Component-wise product, e.g. reflectance times incoming light.
    pub fn modulate(self, other: Self) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }

    /// Rec. 709 luminance.
    pub fn luminance(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    /// Returns `true` when every component is finite.
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

impl Add for Irradiance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Irradiance {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f32> for Irradiance {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn set_component_targets_the_right_channel() {
        let mut c = Irradiance::ZERO;
        c.set_component(0, 1.0);
        c.set_component(1, 2.0);
        c.set_component(2, 3.0);
        assert_eq!(c.to_array(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn luminance_of_white_is_one() {
        assert_relative_eq!(Irradiance::splat(1.0).luminance(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn irradiance_is_twelve_bytes() {
        let data = [Irradiance::splat(1.0); 2];
        let bytes: &[u8] = bytemuck::cast_slice(&data);
        assert_eq!(bytes.len(), 24);
    }

    #[test]
    fn arithmetic() {
        let a = Irradiance::new(1.0, 2.0, 3.0);
        let b = Irradiance::new(0.5, 0.5, 0.5);
        assert_eq!(a + b, Irradiance::new(1.5, 2.5, 3.5));
        assert_eq!(a * 2.0, Irradiance::new(2.0, 4.0, 6.0));
        assert_eq!(a.modulate(b), Irradiance::new(0.5, 1.0, 1.5));
        assert!(!Irradiance::new(f32::NAN, 0.0, 0.0).is_finite());
    }
}
