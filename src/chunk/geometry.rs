//! Vertex emission for cubes and plants.
//!
//! Emitters append 10-component vertices (position, normal, uv, ao, light)
//! to a flat `f32` buffer, six vertices per face. The buffer layout is the
//! contract between the background mesher and the main-thread upload step:
//! a block contributing `n` faces appends exactly `n * 60` floats.
//!
//! Texture coordinates address a 16×16 tile atlas. Cube faces inset their
//! UVs by half a texel to avoid bleeding between tiles; plants sample the
//! full tile.

use crate::block::{tiles_for, BlockId};
use bevy::math::{Mat3, Vec3};

/// Floats per vertex in the emitted buffer.
pub const VERTEX_COMPONENTS: usize = 10;
/// Floats per emitted face (two triangles).
pub const FACE_FLOATS: usize = 6 * VERTEX_COMPONENTS;

const TILE: f32 = 1.0 / 16.0;
const TEXEL_INSET: f32 = 1.0 / 2048.0;

// Face order everywhere in the mesher: -x, +x, +y, -y, -z, +z.
const CUBE_POSITIONS: [[[f32; 3]; 4]; 6] = [
    [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0]],
    [[1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]],
    [[-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]],
    [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0]],
    [[-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0]],
    [[-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0]],
];

const CUBE_NORMALS: [[f32; 3]; 6] = [
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
];

const CUBE_UVS: [[[f32; 2]; 4]; 6] = [
    [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
    [[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
    [[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]],
    [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
    [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
    [[1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [0.0, 1.0]],
];

const CUBE_INDICES: [[usize; 6]; 6] = [
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
];

// Alternate triangulation used when the AO gradient runs across the other
// diagonal; keeps interpolation artifacts off the face.
const CUBE_INDICES_FLIPPED: [[usize; 6]; 6] = [
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
];

const PLANT_POSITIONS: [[[f32; 3]; 4]; 4] = [
    [[0.0, -1.0, -1.0], [0.0, -1.0, 1.0], [0.0, 1.0, -1.0], [0.0, 1.0, 1.0]],
    [[0.0, -1.0, -1.0], [0.0, -1.0, 1.0], [0.0, 1.0, -1.0], [0.0, 1.0, 1.0]],
    [[-1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]],
    [[-1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]],
];

const PLANT_NORMALS: [[f32; 3]; 4] = [
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
];

const PLANT_UVS: [[[f32; 2]; 4]; 4] = [
    [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
    [[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
    [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]],
    [[1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [0.0, 1.0]],
];

const PLANT_INDICES: [[usize; 6]; 4] = [
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
];

/// Append the exposed faces of a cube at `(x, y, z)` with half-extent `n`.
/// `faces[i]` selects which of the six faces to emit; `ao`/`light` carry the
/// per-face, per-corner shading computed by the occlusion kernel.
#[allow(clippy::too_many_arguments)]
pub fn make_cube(
    out: &mut Vec<f32>,
    ao: &[[f32; 4]; 6],
    light: &[[f32; 4]; 6],
    faces: [bool; 6],
    x: f32,
    y: f32,
    z: f32,
    n: f32,
    w: BlockId,
) {
    let tiles = tiles_for(w);
    let lo = TEXEL_INSET;
    let hi = TILE - TEXEL_INSET;
    for i in 0..6 {
        if !faces[i] {
            continue;
        }
        let du = f32::from(tiles[i] % 16) * TILE;
        let dv = f32::from(tiles[i] / 16) * TILE;
        let flip = ao[i][0] + ao[i][3] > ao[i][1] + ao[i][2];
        let order = if flip { &CUBE_INDICES_FLIPPED[i] } else { &CUBE_INDICES[i] };
        for &j in order {
            let p = CUBE_POSITIONS[i][j];
            let uv = CUBE_UVS[i][j];
            out.extend_from_slice(&[
                x + n * p[0],
                y + n * p[1],
                z + n * p[2],
                CUBE_NORMALS[i][0],
                CUBE_NORMALS[i][1],
                CUBE_NORMALS[i][2],
                du + if uv[0] > 0.5 { hi } else { lo },
                dv + if uv[1] > 0.5 { hi } else { lo },
                ao[i][j],
                light[i][j],
            ]);
        }
    }
}

/// Append the four crossed quads of a plant at `(x, y, z)`, rotated by
/// `rotation` degrees about the vertical axis.
#[allow(clippy::too_many_arguments)]
pub fn make_plant(
    out: &mut Vec<f32>,
    ao: f32,
    light: f32,
    x: f32,
    y: f32,
    z: f32,
    n: f32,
    w: BlockId,
    rotation: f32,
) {
    let tile = tiles_for(w)[0];
    let du = f32::from(tile % 16) * TILE;
    let dv = f32::from(tile / 16) * TILE;
    let rot = Mat3::from_rotation_y(rotation.to_radians());
    for i in 0..4 {
        for &j in &PLANT_INDICES[i] {
            let p = rot * (Vec3::from_array(PLANT_POSITIONS[i][j]) * n);
            let normal = rot * Vec3::from_array(PLANT_NORMALS[i]);
            let uv = PLANT_UVS[i][j];
            out.extend_from_slice(&[
                x + p.x,
                y + p.y,
                z + p.z,
                normal.x,
                normal.y,
                normal.z,
                du + uv[0] * TILE,
                dv + uv[1] * TILE,
                ao,
                light,
            ]);
        }
    }
}
