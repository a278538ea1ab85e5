use crate::config::Tuning;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontierRules {
    pub trigger_margin: i32,
    pub step: i32,
}

impl FrontierRules {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            trigger_margin: tuning.extension_trigger_margin,
            step: tuning.world_extension_step,
        }
    }

    /// New world width when the player has crossed into the trigger margin
    /// of the frontier, `None` otherwise. Never grows a locked world and
    /// never grows past `max_width`.
    pub fn maybe_extend(
        &self,
        player_x: f32,
        world_width: i32,
        max_width: i32,
        world_locked: bool,
    ) -> Option<i32> {
        if world_locked || world_width >= max_width {
            return None;
        }
        if player_x <= (world_width - self.trigger_margin) as f32 {
            return None;
        }
        Some(world_width.saturating_add(self.step.max(1)).min(max_width))
    }
}
