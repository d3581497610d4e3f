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

//! Seam dilation for ambient maps.

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Grows covered regions by one texel.
///
/// Every uncovered texel with a covered 8-neighbour takes that neighbour's
/// value (edge neighbours are preferred over diagonal ones) and becomes
/// covered. Coverage is snapshotted first, so a pass never chains through
/// texels it filled itself. Returns the number of texels filled.
pub fn dilate<T: Copy>(texels: &mut [T], coverage: &mut [bool], width: usize, height: usize) -> usize {
    let len = width * height;
    if len == 0 || texels.len() < len || coverage.len() < len {
        return 0;
    }
    let covered = coverage[..len].to_vec();
    let mut filled = 0;
    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            if covered[index] {
                continue;
            }
            let source = NEIGHBOURS.iter().find_map(|&(dx, dy)| {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    return None;
                }
                let neighbour = ny as usize * width + nx as usize;
                covered[neighbour].then_some(neighbour)
            });
            if let Some(source) = source {
                texels[index] = texels[source];
                coverage[index] = true;
                filled += 1;
            }
        }
    }
    filled
}
