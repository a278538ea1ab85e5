#[cfg(test)]
use std::collections::VecDeque;

use crate::engine::Encounter;
use crate::types::AttackKind;

/// One tick of player intent. Movement flags are levels; `punch`, `kick`
/// and `pause` are edges and should be true for a single tick per press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub punch: bool,
    pub kick: bool,
    pub pause: bool,
}

impl InputIntent {
    /// Unit-less movement axes in `-1.0..=1.0`; opposite keys cancel out.
    pub fn axes(&self) -> (f32, f32) {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.down as i8 - self.up as i8) as f32;
        (x, y)
    }

    pub fn is_moving(&self) -> bool {
        self.axes() != (0.0, 0.0)
    }

    /// Kick wins when both attack edges land on the same tick.
    pub fn attack(&self) -> Option<AttackKind> {
        if self.kick {
            Some(AttackKind::Kick)
        } else if self.punch {
            Some(AttackKind::Punch)
        } else {
            None
        }
    }
}

/// Source of per-tick intent for a [`crate::session::GameSession`].
///
/// Keyboard and touch adapters ignore the encounter; scripted players may
/// read it to decide what to press.
pub trait InputAdapter {
    fn poll(&mut self, encounter: &Encounter) -> InputIntent;
}

/// Turns a held button into a one-tick press.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeTrigger {
    held: bool,
}

impl EdgeTrigger {
    pub fn update(&mut self, down: bool) -> bool {
        let pressed = down && !self.held;
        self.held = down;
        pressed
    }
}

/// Raw device levels as a capture layer reports them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawInputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub punch: bool,
    pub kick: bool,
    pub pause: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IntentTranslator {
    punch: EdgeTrigger,
    kick: EdgeTrigger,
    pause: EdgeTrigger,
}

impl IntentTranslator {
    pub fn translate(&mut self, raw: RawInputState) -> InputIntent {
        InputIntent {
            up: raw.up,
            down: raw.down,
            left: raw.left,
            right: raw.right,
            punch: self.punch.update(raw.punch),
            kick: self.kick.update(raw.kick),
            pause: self.pause.update(raw.pause),
        }
    }
}

/// Replays a fixed list of intents, then idles.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputIntent>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputIntent>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl InputAdapter for ScriptedInput {
    fn poll(&mut self, _encounter: &Encounter) -> InputIntent {
        self.frames.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_directions_cancel() {
        let intent = InputIntent {
            left: true,
            right: true,
            up: true,
            ..InputIntent::default()
        };
        assert_eq!(intent.axes(), (0.0, -1.0));
        assert!(intent.is_moving());
    }

    #[test]
    fn held_attack_button_fires_once() {
        let mut translator = IntentTranslator::default();
        let held = RawInputState {
            punch: true,
            right: true,
            ..RawInputState::default()
        };
        assert!(translator.translate(held).punch);
        let second = translator.translate(held);
        assert!(!second.punch);
        assert!(second.right);
        translator.translate(RawInputState::default());
        assert!(translator.translate(held).punch);
    }

    #[test]
    fn kick_takes_priority_over_punch() {
        let intent = InputIntent {
            punch: true,
            kick: true,
            ..InputIntent::default()
        };
        assert_eq!(intent.attack(), Some(AttackKind::Kick));
        assert_eq!(InputIntent::default().attack(), None);
    }
}
