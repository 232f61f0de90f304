//! Flood fill of point-light intensities through the meshing window.
//!
//! Light sources store only their intensity (0..15) in a chunk's light map;
//! the propagated field is recomputed from scratch on every mesh build and
//! never persisted. Intensity decrements by one per cell and stops at opaque
//! voxels, except that the source cell itself is lit even when its own voxel
//! is opaque (`force`).
//!
//! The fill runs on an explicit queue rather than recursion: depth can reach
//! the full intensity range and workers run on pool threads.

use super::{xyz, XZ_HI, XZ_LO, Y_SIZE};
use std::collections::VecDeque;

/// Flood `w` outward from `(x, y, z)` into `light`, bounded to the padded
/// window. `opaque` is the mesher's occupancy mask over the same window.
pub fn light_fill(opaque: &[bool], light: &mut [u8], x: i32, y: i32, z: i32, w: u8, force: bool) {
    let mut queue = VecDeque::new();
    queue.push_back((x, y, z, w, force));
    while let Some((x, y, z, w, force)) = queue.pop_front() {
        let reach = i32::from(w);
        if x + reach < XZ_LO || z + reach < XZ_LO {
            continue;
        }
        if x - reach > XZ_HI || z - reach > XZ_HI {
            continue;
        }
        if y < 0 || y >= Y_SIZE {
            continue;
        }
        let index = xyz(x, y, z);
        if light[index] >= w {
            continue;
        }
        if !force && opaque[index] {
            continue;
        }
        light[index] = w;
        if w > 1 {
            let w = w - 1;
            queue.push_back((x - 1, y, z, w, false));
            queue.push_back((x + 1, y, z, w, false));
            queue.push_back((x, y - 1, z, w, false));
            queue.push_back((x, y + 1, z, w, false));
            queue.push_back((x, y, z - 1, w, false));
            queue.push_back((x, y, z + 1, w, false));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::XZ_SIZE;

    fn scratch() -> (Vec<bool>, Vec<u8>) {
        let cells = (XZ_SIZE * XZ_SIZE * Y_SIZE) as usize;
        (vec![false; cells], vec![0; cells])
    }

    #[test]
    fn intensity_decays_with_manhattan_distance() {
        let (opaque, mut light) = scratch();
        let (sx, sy, sz) = (XZ_LO + 16, 40, XZ_LO + 16);
        light_fill(&opaque, &mut light, sx, sy, sz, 15, true);

        for (dx, dy, dz) in [(0, 0, 0), (3, 0, 0), (0, 5, 0), (2, 2, 2), (7, 0, 7)] {
            let d = dx + dy + dz;
            let expected = (15 - d).max(0) as u8;
            assert_eq!(light[xyz(sx + dx, sy + dy, sz + dz)], expected, "offset {dx},{dy},{dz}");
        }
        assert_eq!(light[xyz(sx + 8, sy + 7, sz)], 0);
    }

    #[test]
    fn opaque_cells_block_propagation() {
        let (mut opaque, mut light) = scratch();
        let (sx, sy, sz) = (XZ_LO + 10, 50, XZ_LO + 10);
        // Wall one cell to the +x side of the source.
        for dy in -15..=15 {
            for dz in -15..=15 {
                opaque[xyz(sx + 1, sy + dy, sz + dz)] = true;
            }
        }
        light_fill(&opaque, &mut light, sx, sy, sz, 15, true);
        assert_eq!(light[xyz(sx + 1, sy, sz)], 0);
        // Light bends around the wall: distance through open cells only.
        assert_eq!(light[xyz(sx - 1, sy, sz)], 14);
    }

    #[test]
    fn source_inside_opaque_block_is_lit() {
        let (mut opaque, mut light) = scratch();
        let (sx, sy, sz) = (XZ_LO + 4, 30, XZ_LO + 4);
        opaque[xyz(sx, sy, sz)] = true;
        light_fill(&opaque, &mut light, sx, sy, sz, 15, true);
        assert_eq!(light[xyz(sx, sy, sz)], 15);
        assert_eq!(light[xyz(sx + 1, sy, sz)], 14);
    }

    #[test]
    fn brighter_fill_overwrites_dimmer_one() {
        let (opaque, mut light) = scratch();
        let (sx, sy, sz) = (XZ_LO + 8, 60, XZ_LO + 8);
        light_fill(&opaque, &mut light, sx, sy, sz, 6, true);
        light_fill(&opaque, &mut light, sx + 2, sy, sz, 15, true);
        assert_eq!(light[xyz(sx, sy, sz)], 13);
    }
}
