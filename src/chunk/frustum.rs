//! Chunk visibility culling.
//!
//! Both the render path and the worker scheduler ask the same question:
//! does a chunk column intersect the player's view? The test is a view
//! cone against the chunk's AABB (including the one-block shadow pad),
//! with a bounding-sphere early-out. The scheduler passes the full column
//! height for chunks that have never been meshed; rendering uses the
//! `miny`/`maxy` bounds from the last mesh build.

use bevy::prelude::*;

use super::{ChunkEntity, CHUNK_SIZE};
use crate::chunk::streaming::{RenderStats, ViewConfig};
use crate::player::{sight_vector, Player};
use crate::world::World;

const CULL_FOV_DEG: f32 = 100.0;

/// Chunk AABB in world space. Blocks are centered on integer coordinates
/// and the map pad extends one cell beyond the chunk on each side.
#[must_use]
pub fn chunk_aabb(p: i32, q: i32, miny: i32, maxy: i32) -> (Vec3, Vec3) {
    let x = (p * CHUNK_SIZE) as f32 - 1.5;
    let z = (q * CHUNK_SIZE) as f32 - 1.5;
    let d = CHUNK_SIZE as f32 + 2.0;
    (
        Vec3::new(x, miny as f32 - 0.5, z),
        Vec3::new(x + d, maxy as f32 + 0.5, z + d),
    )
}

/// Whether an AABB intersects the view cone from `camera_pos` along
/// `forward` with the given full field of view.
#[must_use]
pub fn aabb_in_view_cone(
    camera_pos: Vec3,
    forward: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
    fov_deg: f32,
    max_distance: f32,
) -> bool {
    let center = (aabb_min + aabb_max) * 0.5;
    let half = (aabb_max - aabb_min) * 0.5;
    let radius = half.length();
    let to_center = center - camera_pos;
    let center_dist = to_center.length();
    if center_dist > max_distance + radius {
        return false;
    }
    // Inside the box: always visible.
    if camera_pos.cmpge(aabb_min).all() && camera_pos.cmple(aabb_max).all() {
        return true;
    }

    let forward = forward.normalize();
    let cos_half = (fov_deg.to_radians() * 0.5).cos();
    if center_dist > 0.0 && forward.dot(to_center / center_dist) >= cos_half {
        return true;
    }

    for i in 0..8 {
        let corner = Vec3::new(
            if i & 1 == 0 { aabb_min.x } else { aabb_max.x },
            if i & 2 == 0 { aabb_min.y } else { aabb_max.y },
            if i & 4 == 0 { aabb_min.z } else { aabb_max.z },
        );
        let to_corner = corner - camera_pos;
        let d = to_corner.length();
        if d <= 1e-6 || d > max_distance + radius {
            continue;
        }
        if forward.dot(to_corner / d) >= cos_half {
            return true;
        }
    }
    false
}

/// Whether the column `(p, q)` with vertical extent `[miny, maxy]` is worth
/// drawing or meshing for a viewer at `camera_pos` looking along `forward`.
#[must_use]
pub fn chunk_visible(
    camera_pos: Vec3,
    forward: Vec3,
    p: i32,
    q: i32,
    miny: i32,
    maxy: i32,
    max_distance: f32,
) -> bool {
    let (aabb_min, aabb_max) = chunk_aabb(p, q, miny, maxy);
    aabb_in_view_cone(camera_pos, forward, aabb_min, aabb_max, CULL_FOV_DEG, max_distance)
}

/// Hide chunk entities outside the render radius or the view cone, and
/// total up the faces submitted for drawing this frame.
#[allow(clippy::needless_pass_by_value)]
pub fn cull_chunk_entities(
    player: Query<(&Transform, &Player)>,
    world: Res<World>,
    view: Res<ViewConfig>,
    mut stats: ResMut<RenderStats>,
    mut chunks: Query<(&ChunkEntity, &mut Visibility)>,
) {
    let Ok((transform, state)) = player.get_single() else { return };
    let camera_pos = transform.translation;
    let forward = sight_vector(state.yaw, state.pitch);
    let p = crate::chunk::chunked(camera_pos.x);
    let q = crate::chunk::chunked(camera_pos.z);
    let max_distance = (view.render_radius * CHUNK_SIZE) as f32 * 1.5;

    let mut faces = 0;
    for (entity, mut visibility) in &mut chunks {
        let Some(chunk) = world.find_chunk(entity.p, entity.q) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        let in_range = chunk.distance(p, q) <= view.render_radius;
        let in_view = in_range
            && chunk_visible(camera_pos, forward, entity.p, entity.q, chunk.miny, chunk.maxy, max_distance);
        *visibility = if in_view { Visibility::Visible } else { Visibility::Hidden };
        if in_view {
            faces += chunk.faces;
        }
    }
    stats.faces = faces;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ahead_is_visible() {
        let cam = Vec3::new(0.0, 14.0, 0.0);
        let fwd = Vec3::Z;
        assert!(chunk_visible(cam, fwd, 0, 1, 0, 32, 200.0));
    }

    #[test]
    fn chunk_behind_is_not_visible() {
        let cam = Vec3::new(16.0, 14.0, 16.0);
        let fwd = Vec3::Z;
        assert!(!chunk_visible(cam, fwd, 0, -2, 0, 32, 200.0));
    }

    #[test]
    fn far_chunk_is_not_visible() {
        let cam = Vec3::new(0.0, 14.0, 0.0);
        let fwd = Vec3::Z;
        assert!(!chunk_visible(cam, fwd, 0, 40, 0, 32, 200.0));
    }

    #[test]
    fn containing_chunk_is_always_visible() {
        let cam = Vec3::new(16.0, 14.0, 16.0);
        // Looking straight up, the chunk under the player still renders.
        assert!(chunk_visible(cam, Vec3::Y, 0, 0, 0, 32, 200.0));
    }
}
