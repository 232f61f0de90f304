//! Gravity and collision resolution.
//!
//! Movement is integrated in sub-steps sized to the current speed, so even
//! terminal-velocity falls advance a fraction of a block per sub-step. Each
//! sub-step sweeps the player's box against the unit boxes of the 27 cells
//! around the target position: the per-axis entry times of the earliest
//! collision pick the blocking axis (the largest entry wins), the motion
//! component on that axis is cancelled, and the remainder of the step slides
//! on. A vertical response resets accumulated gravity, which is also what
//! keeps walking off a ledge and landing symmetrical.

use bevy::math::{IVec3, Vec3};

use crate::block::is_obstacle;
use crate::player::{FLY_SPEED, WALK_SPEED};
use crate::world::World;

pub const GRAVITY: f32 = 25.0;
pub const TERMINAL_VELOCITY: f32 = 250.0;
pub const JUMP_VELOCITY: f32 = 8.0;

/// Player box half-extents; the position is the box center.
pub const PLAYER_HALF: Vec3 = Vec3::new(0.25, 0.5, 0.25);

const BLOCK_HALF: Vec3 = Vec3::new(0.5, 0.5, 0.5);
const MIN_SUBSTEPS: i32 = 8;

/// Sweep a moving box (at `center`, extents `half`, displacement `d`)
/// against a static box. Returns the normalized entry time and the blocking
/// axis, or `None` when the motion never brings the boxes into contact.
fn sweep_aabb(center: Vec3, half: Vec3, d: Vec3, other: Vec3, other_half: Vec3) -> Option<(f32, usize)> {
    let mut entry = [f32::NEG_INFINITY; 3];
    let mut exit = [f32::INFINITY; 3];
    for axis in 0..3 {
        let near = center[axis] - half[axis];
        let far = center[axis] + half[axis];
        let other_near = other[axis] - other_half[axis];
        let other_far = other[axis] + other_half[axis];
        if d[axis] > 0.0 {
            entry[axis] = (other_near - far) / d[axis];
            exit[axis] = (other_far - near) / d[axis];
        } else if d[axis] < 0.0 {
            entry[axis] = (other_far - near) / d[axis];
            exit[axis] = (other_near - far) / d[axis];
        } else if far <= other_near || near >= other_far {
            return None;
        }
    }
    let entry_time = entry[0].max(entry[1]).max(entry[2]);
    let exit_time = exit[0].min(exit[1]).min(exit[2]);
    if entry_time > exit_time || !(0.0..1.0).contains(&entry_time) {
        return None;
    }
    let axis = (0..3).max_by(|&a, &b| entry[a].total_cmp(&entry[b])).unwrap_or(1);
    Some((entry_time, axis))
}

struct SweepResponse {
    hit_y: bool,
    fell_onto_ground: bool,
}

/// Advance `position` by `d`, cancelling blocked axes. At most three axes
/// can block, so the resolution loop is bounded.
fn sweep_move(world: &World, position: &mut Vec3, mut d: Vec3) -> SweepResponse {
    let mut response = SweepResponse { hit_y: false, fell_onto_ground: false };
    for _ in 0..3 {
        if d == Vec3::ZERO {
            break;
        }
        let target = *position + d;
        let cell = IVec3::new(
            target.x.round() as i32,
            target.y.round() as i32,
            target.z.round() as i32,
        );
        let mut earliest: Option<(f32, usize)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let b = IVec3::new(cell.x + dx, cell.y + dy, cell.z + dz);
                    if !is_obstacle(world.get_block(b.x, b.y, b.z)) {
                        continue;
                    }
                    if let Some(hit) = sweep_aabb(*position, PLAYER_HALF, d, b.as_vec3(), BLOCK_HALF) {
                        if earliest.is_none_or(|(t, _)| hit.0 < t) {
                            earliest = Some(hit);
                        }
                    }
                }
            }
        }
        let Some((t, axis)) = earliest else {
            *position += d;
            break;
        };
        *position += d * t;
        if axis == 1 {
            response.hit_y = true;
            if d.y < 0.0 {
                response.fell_onto_ground = true;
            }
        }
        let mut rest = d * (1.0 - t);
        rest[axis] = 0.0;
        d = rest;
    }
    response
}

/// Integrate one frame of movement. `motion` is the unit input direction,
/// `velocity_y` the accumulated gravity term (persisted across frames).
/// Returns whether the player ended the frame standing on ground.
pub fn movement_step(
    world: &World,
    position: &mut Vec3,
    motion: Vec3,
    jumping: bool,
    flying: bool,
    velocity_y: &mut f32,
    dt: f32,
) -> bool {
    let mut motion = motion;
    if jumping {
        if flying {
            motion.y = 1.0;
        } else if *velocity_y == 0.0 {
            *velocity_y = JUMP_VELOCITY;
        }
    }

    let speed = if flying { FLY_SPEED } else { WALK_SPEED };
    let magnitude = Vec3::new(
        motion.x * speed,
        motion.y * speed + velocity_y.abs() * 2.0,
        motion.z * speed,
    )
    .length();
    let steps = ((magnitude * dt * 8.0).round() as i32).max(MIN_SUBSTEPS);
    let ut = dt / steps as f32;
    let v = motion * ut * speed;

    let mut grounded = false;
    for _ in 0..steps {
        if flying {
            *velocity_y = 0.0;
        } else {
            *velocity_y = (*velocity_y - ut * GRAVITY).max(-TERMINAL_VELOCITY);
        }
        let d = Vec3::new(v.x, v.y + *velocity_y * ut, v.z);
        let response = sweep_move(world, position, d);
        if response.hit_y {
            grounded = response.fell_onto_ground;
            *velocity_y = 0.0;
        }
    }

    // Fell out of the world: put the player back on the surface.
    if position.y < 0.0 {
        position.y = world.highest_block(position.x, position.z) as f32 + 2.0;
        *velocity_y = 0.0;
    }
    grounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::material;
    use crate::chunk::Chunk;

    /// World with a flat stone floor at y = 10 across chunk (0, 0).
    fn flat_world() -> World {
        let mut world = World::new(1);
        let mut chunk = Chunk::new(0, 0);
        for x in 0..32 {
            for z in 0..32 {
                chunk.blocks.set(x, 10, z, material::STONE);
            }
        }
        world.chunks.insert(chunk);
        world
    }

    fn overlaps_any_obstacle(world: &World, position: Vec3) -> bool {
        let cell = IVec3::new(
            position.x.round() as i32,
            position.y.round() as i32,
            position.z.round() as i32,
        );
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let b = IVec3::new(cell.x + dx, cell.y + dy, cell.z + dz);
                    if !is_obstacle(world.get_block(b.x, b.y, b.z)) {
                        continue;
                    }
                    let gap = (position - b.as_vec3()).abs() - (PLAYER_HALF + BLOCK_HALF);
                    if gap.x < -1e-4 && gap.y < -1e-4 && gap.z < -1e-4 {
                        return true;
                    }
                }
            }
        }
        false
    }

    #[test]
    fn falling_lands_on_the_floor() {
        let world = flat_world();
        let mut position = Vec3::new(8.0, 13.0, 8.0);
        let mut vy = -50.0;
        let grounded = movement_step(&world, &mut position, Vec3::ZERO, false, false, &mut vy, 1.0 / 60.0);
        // One frame at -50 falls ~0.83 of the 2-block gap; never tunnels.
        assert!(position.y >= 11.0 - 1e-3);
        assert!(!overlaps_any_obstacle(&world, position));

        let mut grounded = grounded;
        for _ in 0..30 {
            grounded = movement_step(&world, &mut position, Vec3::ZERO, false, false, &mut vy, 1.0 / 60.0);
        }
        assert!(grounded);
        assert!((position.y - 11.0).abs() < 1e-3, "resting at {}", position.y);
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn terminal_velocity_never_tunnels() {
        let world = flat_world();
        let mut position = Vec3::new(8.0, 200.0, 8.0);
        let mut vy = -TERMINAL_VELOCITY;
        for _ in 0..240 {
            movement_step(&world, &mut position, Vec3::ZERO, false, false, &mut vy, 1.0 / 60.0);
            assert!(!overlaps_any_obstacle(&world, position));
        }
        assert!((position.y - 11.0).abs() < 1e-3);
    }

    #[test]
    fn walls_block_and_allow_sliding() {
        let mut world = flat_world();
        for y in 11..14 {
            for z in 0..32 {
                world.set_block(12, y, z, material::BRICK);
            }
        }
        let mut position = Vec3::new(10.0, 11.0, 8.0);
        let mut vy = 0.0;
        // Push diagonally into the wall for a second.
        let motion = Vec3::new(1.0, 0.0, 0.4).normalize();
        for _ in 0..60 {
            movement_step(&world, &mut position, motion, false, false, &mut vy, 1.0 / 60.0);
            assert!(!overlaps_any_obstacle(&world, position));
        }
        assert!(position.x <= 11.25 + 1e-3, "wall stops x at {}", position.x);
        assert!(position.z > 8.5, "still slides along z, at {}", position.z);
    }

    #[test]
    fn jump_leaves_the_ground_and_comes_back() {
        let world = flat_world();
        let mut position = Vec3::new(8.0, 11.0, 8.0);
        let mut vy = 0.0;
        movement_step(&world, &mut position, Vec3::ZERO, true, false, &mut vy, 1.0 / 60.0);
        assert!(position.y > 11.0);
        let mut grounded = false;
        for _ in 0..120 {
            grounded = movement_step(&world, &mut position, Vec3::ZERO, false, false, &mut vy, 1.0 / 60.0);
        }
        assert!(grounded);
        assert!((position.y - 11.0).abs() < 1e-3);
    }

    #[test]
    fn flying_ignores_gravity() {
        let world = flat_world();
        let mut position = Vec3::new(8.0, 20.0, 8.0);
        let mut vy = 0.0;
        for _ in 0..60 {
            movement_step(&world, &mut position, Vec3::ZERO, false, true, &mut vy, 1.0 / 60.0);
        }
        assert!((position.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn falling_out_of_the_world_respawns_on_the_surface() {
        let world = flat_world();
        let mut position = Vec3::new(8.0, -1.0, 8.0);
        let mut vy = -10.0;
        movement_step(&world, &mut position, Vec3::ZERO, false, false, &mut vy, 1.0 / 60.0);
        assert_eq!(position.y, 12.0);
        assert_eq!(vy, 0.0);
    }
}
