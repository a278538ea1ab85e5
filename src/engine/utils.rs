use crate::constants::{WALK_MAX_Y, WALK_MIN_Y};
use crate::rng::Rng;
use crate::types::{EnemyType, Facing, Rect, Vec2};

pub(super) fn walk_band_min() -> Vec2 {
    Vec2::new(0.0, WALK_MIN_Y)
}

pub(super) fn walk_band_max(world_width: i32) -> Vec2 {
    Vec2::new(world_width.max(0) as f32, WALK_MAX_Y)
}

pub(super) fn clamp_to_walk_band(pos: Vec2, world_width: i32) -> Vec2 {
    let max = walk_band_max(world_width);
    Vec2::new(pos.x.clamp(0.0, max.x), pos.y.clamp(WALK_MIN_Y, WALK_MAX_Y))
}

/// Attack region extending `reach` in front of `origin` along `facing`,
/// vertically centered on it.
pub(super) fn attack_rect(origin: Vec2, facing: Facing, reach: f32, height: f32) -> Rect {
    let x = match facing {
        Facing::Right => origin.x,
        Facing::Left => origin.x - reach,
    };
    Rect {
        x,
        y: origin.y - height / 2.0,
        w: reach,
        h: height,
    }
}

pub(super) fn hurtbox_rect(center: Vec2, size: (f32, f32)) -> Rect {
    Rect::centered(center, size.0, size.1)
}

/// Moves `current` toward `target` by at most `travel`, stopping `hold`
/// units short of it.
pub(super) fn move_toward(current: Vec2, target: Vec2, travel: f32, hold: f32) -> Vec2 {
    let distance = current.distance(target);
    if distance <= hold || distance <= f32::EPSILON {
        return current;
    }
    let step = travel.min(distance - hold);
    Vec2::new(
        current.x + (target.x - current.x) / distance * step,
        current.y + (target.y - current.y) / distance * step,
    )
}

pub(super) fn pick_enemy_type(fast_chance: f32, rng: &mut Rng) -> EnemyType {
    if rng.bool(fast_chance) {
        EnemyType::Fast
    } else {
        EnemyType::Standard
    }
}
