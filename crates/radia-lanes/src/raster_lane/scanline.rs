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

//! Fixed-point scanline rasterization of one interpolated scalar.

/// A triangle corner in texel space carrying the value to interpolate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterVertex {
    /// Texel-space column.
    pub x: f32,
    /// Texel-space row.
    pub y: f32,
    /// Scalar interpolated across the triangle.
    pub value: f32,
}

impl RasterVertex {
    /// Creates a vertex.
    pub const fn new(x: f32, y: f32, value: f32) -> Self {
        Self { x, y, value }
    }
}

const FIXED_SHIFT: u32 = 16;
const FIXED_ONE: i64 = 1 << FIXED_SHIFT;
const FIXED_HALF: i64 = FIXED_ONE / 2;

/// Twice the signed area below which a triangle is treated as degenerate.
const MIN_DOUBLE_AREA: f64 = 1e-9;

/// Fraction bits of the interpolated value, which is stored relative to the
/// triangle's own value range so its magnitude never limits precision.
const VALUE_SHIFT: u32 = 32;
const VALUE_ONE: f64 = (1u64 << VALUE_SHIFT) as f64;

fn to_fixed(v: f64) -> i64 {
    (v * FIXED_ONE as f64).round() as i64
}

/// `ceil(v - 0.5)` of a 16.16 value, as an integer.
fn fixed_first_center(v: i64) -> i64 {
    (v - FIXED_HALF + FIXED_ONE - 1) >> FIXED_SHIFT
}

/// An edge walked one scanline at a time.
struct Edge {
    x: i64,
    step: i64,
}

impl Edge {
    /// Positions the edge at the centre of scanline `row`.
    fn at_row(from: RasterVertex, to: RasterVertex, row: i64) -> Self {
        let dy = f64::from(to.y) - f64::from(from.y);
        let slope = if dy > 0.0 {
            (f64::from(to.x) - f64::from(from.x)) / dy
        } else {
            0.0
        };
        let y = row as f64 + 0.5;
        Self {
            x: to_fixed(f64::from(from.x) + (y - f64::from(from.y)) * slope),
            step: to_fixed(slope),
        }
    }

    fn advance(&mut self) {
        self.x += self.step;
    }
}

/// Value plane over the corner values mapped to `[0, 1]`:
/// `t(x, y) = origin + dx * (x - x0) + dy * (y - y0)`, with
/// `value = min + t * range`.
struct Plane {
    x0: f64,
    y0: f64,
    origin: f64,
    dx: f64,
    dy: f64,
    min: f64,
    range: f64,
}

impl Plane {
    fn new(v: &[RasterVertex; 3], double_area: f64) -> Self {
        let values = v.map(|c| f64::from(c.value));
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        let t = |value: f64| if range > 0.0 { (value - min) / range } else { 0.0 };

        let (x0, y0, z0) = (f64::from(v[0].x), f64::from(v[0].y), t(values[0]));
        let (dx1, dy1, dz1) = (
            f64::from(v[1].x) - x0,
            f64::from(v[1].y) - y0,
            t(values[1]) - z0,
        );
        let (dx2, dy2, dz2) = (
            f64::from(v[2].x) - x0,
            f64::from(v[2].y) - y0,
            t(values[2]) - z0,
        );
        let inv = 1.0 / double_area;
        Self {
            x0,
            y0,
            origin: z0,
            dx: (dz1 * dy2 - dz2 * dy1) * inv,
            dy: (dz2 * dx1 - dz1 * dx2) * inv,
            min,
            range,
        }
    }

    /// Fixed-point `t` at a point.
    fn fixed_at(&self, x: f64, y: f64) -> i64 {
        let t = self.origin + self.dx * (x - self.x0) + self.dy * (y - self.y0);
        (t * VALUE_ONE).round() as i64
    }

    /// Fixed-point change of `t` per pixel along a row.
    fn fixed_step(&self) -> i64 {
        (self.dx * VALUE_ONE).round() as i64
    }

    /// Maps a fixed-point `t` back to a value. Pixel centres lie inside the
    /// triangle, so `t` is clamped to the corner range to drop rounding drift.
    fn value(&self, fixed: i64) -> f32 {
        let t = (fixed as f64 / VALUE_ONE).clamp(0.0, 1.0);
        (self.min + t * self.range) as f32
    }
}

/// Rasterizes a triangle into a `width` x `height` grid, calling
/// `plot(x, y, value)` once per covered pixel centre.
///
/// A pixel is covered when its centre `(x + 0.5, y + 0.5)` lies inside the
/// triangle, with spans half-open on the right and bottom so that triangles
/// sharing an edge never both cover a pixel. Pixels outside the grid are
/// skipped. Returns the number of pixels plotted; degenerate or non-finite
/// triangles plot nothing.
pub fn rasterize_triangle(
    vertices: &[RasterVertex; 3],
    width: usize,
    height: usize,
    mut plot: impl FnMut(usize, usize, f32),
) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    if vertices
        .iter()
        .any(|v| !(v.x.is_finite() && v.y.is_finite() && v.value.is_finite()))
    {
        return 0;
    }

    let mut v = *vertices;
    v.sort_by(|a, b| a.y.total_cmp(&b.y));

    let double_area = (f64::from(v[1].x) - f64::from(v[0].x)) * (f64::from(v[2].y) - f64::from(v[0].y))
        - (f64::from(v[2].x) - f64::from(v[0].x)) * (f64::from(v[1].y) - f64::from(v[0].y));
    if double_area.abs() < MIN_DOUBLE_AREA {
        return 0;
    }
    // With rows growing downwards a positive area puts the middle vertex to
    // the right of the long edge.
    let long_is_left = double_area > 0.0;
    let plane = Plane::new(&v, double_area);
    let value_step = plane.fixed_step();

    let first_row = |y: f32| (f64::from(y) - 0.5).ceil() as i64;
    let top = first_row(v[0].y).max(0);
    let middle = first_row(v[1].y).clamp(0, height as i64);
    let bottom = first_row(v[2].y).min(height as i64);

    let mut written = 0;
    let segments = [
        (top, middle.min(bottom), v[0], v[1]),
        (middle.max(top), bottom, v[1], v[2]),
    ];
    for (start, end, from, to) in segments {
        if start >= end {
            continue;
        }
        let mut long = Edge::at_row(v[0], v[2], start);
        let mut short = Edge::at_row(from, to, start);
        for row in start..end {
            let (left, right) = if long_is_left {
                (long.x, short.x)
            } else {
                (short.x, long.x)
            };
            let x_start = fixed_first_center(left).max(0);
            let x_end = fixed_first_center(right).min(width as i64);
            if x_start < x_end {
                let mut value = plane.fixed_at(x_start as f64 + 0.5, row as f64 + 0.5);
                for x in x_start..x_end {
                    plot(x as usize, row as usize, plane.value(value));
                    value = value.saturating_add(value_step);
                }
                written += (x_end - x_start) as usize;
            }
            long.advance();
            short.advance();
        }
    }
    written
}
