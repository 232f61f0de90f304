//! Mesh construction for one chunk.
//!
//! `build_mesh` consumes a `WorkItem` — deep copies of the 3×3 chunk
//! neighborhood — and produces the flat vertex buffer plus the `faces`,
//! `miny`, `maxy` metadata. It runs on worker threads and touches nothing
//! but the item, so identical inputs always produce byte-identical output.
//!
//! The pipeline over the padded scratch window:
//! 1. rasterize all nine block maps into an occupancy mask (and the highest
//!    opaque cell per column, used for cheap downward-sky shading),
//! 2. flood light-source intensities through the mask,
//! 3. count exposed faces of the center chunk's own blocks,
//! 4. emit vertices with per-corner ambient occlusion and light.

use super::geometry::{make_cube, make_plant, FACE_FLOATS};
use super::light::light_fill;
use super::{xyz, xz, WorkItem, CHUNK_HEIGHT, CHUNK_SIZE, XZ_SIZE, Y_SIZE};
use crate::block::{is_plant, is_transparent};
use crate::terrain::TerrainNoise;

// Corner occlusion contributors per face: for each of the four corners of
// each face, the indices (into the flattened 3×3×3 neighborhood) of the
// corner-diagonal cell and the two side cells meeting at that vertex.
const LOOKUP3: [[[usize; 3]; 4]; 6] = [
    [[0, 1, 3], [2, 1, 5], [6, 3, 7], [8, 5, 7]],
    [[18, 19, 21], [20, 19, 23], [24, 21, 25], [26, 23, 25]],
    [[6, 7, 15], [8, 7, 17], [24, 15, 25], [26, 17, 25]],
    [[0, 1, 9], [2, 1, 11], [18, 9, 19], [20, 11, 19]],
    [[0, 3, 9], [6, 3, 15], [18, 9, 21], [24, 15, 21]],
    [[2, 5, 11], [8, 5, 17], [20, 11, 23], [26, 17, 23]],
];

// The four cells averaged for the shade/light sample at each corner.
const LOOKUP4: [[[usize; 4]; 4]; 6] = [
    [[0, 1, 3, 4], [1, 2, 4, 5], [3, 4, 6, 7], [4, 5, 7, 8]],
    [[18, 19, 21, 22], [19, 20, 22, 23], [21, 22, 24, 25], [22, 23, 25, 26]],
    [[6, 7, 15, 16], [7, 8, 16, 17], [15, 16, 24, 25], [16, 17, 25, 26]],
    [[0, 1, 9, 10], [1, 2, 10, 11], [9, 10, 18, 19], [10, 11, 19, 20]],
    [[0, 3, 9, 12], [3, 6, 12, 15], [9, 12, 18, 21], [12, 15, 21, 24]],
    [[2, 5, 11, 14], [5, 8, 14, 17], [11, 14, 20, 23], [14, 17, 23, 26]],
];

const CURVE: [f32; 4] = [0.0, 0.25, 0.5, 0.75];

/// Per-face, per-corner ambient occlusion and light from a 3×3×3 sample of
/// the scratch window around one block.
pub(crate) fn occlusion(
    neighbors: &[bool; 27],
    lights: &[u8; 27],
    shades: &[f32; 27],
    ao: &mut [[f32; 4]; 6],
    light: &mut [[f32; 4]; 6],
) {
    let is_light = lights[13] == 15;
    for i in 0..6 {
        for j in 0..4 {
            let corner = u8::from(neighbors[LOOKUP3[i][j][0]]);
            let side1 = u8::from(neighbors[LOOKUP3[i][j][1]]);
            let side2 = u8::from(neighbors[LOOKUP3[i][j][2]]);
            // Both sides blocked: the corner cell can't brighten the vertex.
            let value = if side1 != 0 && side2 != 0 {
                3
            } else {
                usize::from(corner + side1 + side2)
            };
            let mut shade_sum = 0.0;
            let mut light_sum = 0.0;
            for &k in &LOOKUP4[i][j] {
                shade_sum += shades[k];
                light_sum += f32::from(lights[k]);
            }
            if is_light {
                light_sum = 15.0 * 4.0 * 10.0;
            }
            ao[i][j] = (CURVE[value] + shade_sum / 4.0).min(1.0);
            light[i][j] = light_sum / 15.0 / 4.0;
        }
    }
}

/// Build the vertex buffer and mesh metadata for `item`'s center chunk.
pub fn build_mesh(item: &mut WorkItem, noise: &TerrainNoise) {
    let cells = (XZ_SIZE * XZ_SIZE * Y_SIZE) as usize;
    let mut opaque = vec![false; cells];
    let mut light = vec![0u8; cells];
    let mut highest = vec![0i32; (XZ_SIZE * XZ_SIZE) as usize];

    let ox = item.p * CHUNK_SIZE - CHUNK_SIZE - 1;
    let oy = -1;
    let oz = item.q * CHUNK_SIZE - CHUNK_SIZE - 1;

    let has_light = item
        .light_maps
        .iter()
        .flatten()
        .any(|m| m.as_ref().is_some_and(|m| !m.is_empty()));

    // Occupancy mask over the whole neighborhood, shadow copies included.
    for map in item.block_maps.iter().flatten().flatten() {
        for (ex, ey, ez, ew) in map.iter() {
            let x = ex - ox;
            let y = ey - oy;
            let z = ez - oz;
            if x < 0 || y < 0 || z < 0 || x >= XZ_SIZE || y >= Y_SIZE || z >= XZ_SIZE {
                continue;
            }
            if !is_transparent(ew) {
                opaque[xyz(x, y, z)] = true;
                let column = xz(x, z);
                highest[column] = highest[column].max(y);
            }
        }
    }

    if has_light {
        for map in item.light_maps.iter().flatten().flatten() {
            for (ex, ey, ez, ew) in map.iter() {
                light_fill(&opaque, &mut light, ex - ox, ey - oy, ez - oz, ew as u8, true);
            }
        }
    }

    let exposed = |x: i32, y: i32, z: i32, ey: i32| -> ([bool; 6], usize) {
        let faces = [
            !opaque[xyz(x - 1, y, z)],
            !opaque[xyz(x + 1, y, z)],
            !opaque[xyz(x, y + 1, z)],
            !opaque[xyz(x, y - 1, z)] && ey > 0,
            !opaque[xyz(x, y, z - 1)],
            !opaque[xyz(x, y, z + 1)],
        ];
        (faces, faces.iter().filter(|&&f| f).count())
    };

    // First pass: face count and vertical bounds, sizing the buffer exactly.
    let mut miny = CHUNK_HEIGHT;
    let mut maxy = 0;
    let mut faces = 0usize;
    let center = item.center_blocks();
    for (ex, ey, ez, ew) in center.iter() {
        if ew <= 0 {
            continue;
        }
        let (_, mut total) = exposed(ex - ox, ey - oy, ez - oz, ey);
        if total == 0 {
            continue;
        }
        if is_plant(ew) {
            total = 4;
        }
        miny = miny.min(ey);
        maxy = maxy.max(ey);
        faces += total;
    }

    let mut data = Vec::with_capacity(faces * FACE_FLOATS);
    for (ex, ey, ez, ew) in center.iter() {
        if ew <= 0 {
            continue;
        }
        let x = ex - ox;
        let y = ey - oy;
        let z = ez - oz;
        let (face_mask, total) = exposed(x, y, z, ey);
        if total == 0 {
            continue;
        }

        let mut neighbors = [false; 27];
        let mut lights = [0u8; 27];
        let mut shades = [0.0f32; 27];
        let mut index = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    neighbors[index] = opaque[xyz(x + dx, y + dy, z + dz)];
                    lights[index] = light[xyz(x + dx, y + dy, z + dz)];
                    if y + dy <= highest[xz(x + dx, z + dz)] {
                        for step in 0..8 {
                            let yy = y + dy + step;
                            if yy >= Y_SIZE {
                                break;
                            }
                            if opaque[xyz(x + dx, yy, z + dz)] {
                                shades[index] = 1.0 - step as f32 * 0.125;
                                break;
                            }
                        }
                    }
                    index += 1;
                }
            }
        }

        let mut ao = [[0.0f32; 4]; 6];
        let mut vertex_light = [[0.0f32; 4]; 6];
        occlusion(&neighbors, &lights, &shades, &mut ao, &mut vertex_light);

        if is_plant(ew) {
            let mut min_ao = 1.0f32;
            let mut max_light = 0.0f32;
            for i in 0..6 {
                for j in 0..4 {
                    min_ao = min_ao.min(ao[i][j]);
                    max_light = max_light.max(vertex_light[i][j]);
                }
            }
            let rotation = noise.simplex2(ex as f64, ez as f64, 4, 0.5, 2.0) as f32 * 360.0;
            make_plant(&mut data, min_ao, max_light, ex as f32, ey as f32, ez as f32, 0.5, ew, rotation);
        } else {
            make_cube(&mut data, &ao, &vertex_light, face_mask, ex as f32, ey as f32, ez as f32, 0.5, ew);
        }
    }
    debug_assert_eq!(data.len(), faces * FACE_FLOATS);

    item.miny = miny;
    item.maxy = maxy;
    item.faces = faces;
    item.data = data;
}
