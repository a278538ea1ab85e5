use crate::types::Vec2;

/// Cubic ease-out: fast start, settles at 1.0.
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Timed displacement of a victim away from the source of a hit.
///
/// This is an interpolation task, not a physics body: the victim's position
/// is sampled from `from` to `to` while the knockback runs. The encounter
/// schedules a `KnockbackEnd` timer at [`Knockback::ends_at`]; until it fires
/// the owner ignores movement input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Knockback {
    pub from: Vec2,
    pub to: Vec2,
    pub started_at: u64,
    pub duration_ms: u64,
}

impl Knockback {
    pub fn compute(source: Vec2, victim: Vec2, distance: f32, now_ms: u64, duration_ms: u64) -> Self {
        let angle = (victim.y - source.y).atan2(victim.x - source.x);
        Self {
            from: victim,
            to: Vec2::new(
                victim.x + angle.cos() * distance,
                victim.y + angle.sin() * distance,
            ),
            started_at: now_ms,
            duration_ms: duration_ms.max(1),
        }
    }

    pub fn clamped(mut self, min: Vec2, max: Vec2) -> Self {
        self.to.x = self.to.x.clamp(min.x, max.x);
        self.to.y = self.to.y.clamp(min.y, max.y);
        self
    }

    pub fn ends_at(&self) -> u64 {
        self.started_at.saturating_add(self.duration_ms)
    }

    pub fn progress(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.started_at);
        (elapsed as f32 / self.duration_ms as f32).clamp(0.0, 1.0)
    }

    pub fn position_at(&self, now_ms: u64) -> Vec2 {
        let k = ease_out(self.progress(now_ms));
        Vec2::new(
            self.from.x + (self.to.x - self.from.x) * k,
            self.from.y + (self.to.y - self.from.y) * k,
        )
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        now_ms >= self.ends_at()
    }
}
