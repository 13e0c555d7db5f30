//! Keyboard mapping to per-frame courier input
//!
//! Screen up is world -z, so `W` moves the courier toward negative z.

use glam::Vec2;

use crate::sim::courier::{LocomotionMode, PlayerInput};
use crate::sim::progression::SkillKind;
use crate::sim::tick::FrameSnapshot;

/// What a key press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Move,
    SelectLocomotion(LocomotionMode),
    SpendSkill(SkillKind),
    ToggleAutopilot,
    CycleQuality,
    Ignored,
}

/// Held direction keys plus the selected locomotion
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    pub locomotion: LocomotionMode,
    /// Steer toward the objective automatically
    pub autopilot: bool,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    fn direction_mut(&mut self, key: &str) -> Option<&mut bool> {
        match key {
            "w" | "W" | "ArrowUp" => Some(&mut self.up),
            "s" | "S" | "ArrowDown" => Some(&mut self.down),
            "a" | "A" | "ArrowLeft" => Some(&mut self.left),
            "d" | "D" | "ArrowRight" => Some(&mut self.right),
            _ => None,
        }
    }

    pub fn key_down(&mut self, key: &str) -> KeyAction {
        if let Some(held) = self.direction_mut(key) {
            *held = true;
            return KeyAction::Move;
        }
        match key {
            "1" | "2" | "3" | "4" => {
                let index = key.parse::<i32>().map(|n| n - 1).unwrap_or(0);
                self.locomotion = LocomotionMode::from_index(index);
                KeyAction::SelectLocomotion(self.locomotion)
            }
            "z" | "Z" => KeyAction::SpendSkill(SkillKind::Speed),
            "x" | "X" => KeyAction::SpendSkill(SkillKind::Stamina),
            "c" | "C" => KeyAction::SpendSkill(SkillKind::Capacity),
            "v" | "V" => KeyAction::SpendSkill(SkillKind::Gps),
            "b" | "B" => KeyAction::SpendSkill(SkillKind::Reputation),
            "i" | "I" => {
                self.autopilot = !self.autopilot;
                KeyAction::ToggleAutopilot
            }
            "q" | "Q" => KeyAction::CycleQuality,
            _ => KeyAction::Ignored,
        }
    }

    pub fn key_up(&mut self, key: &str) {
        if let Some(held) = self.direction_mut(key) {
            *held = false;
        }
    }

    /// Drop held directions (focus lost, keyup never arrives)
    pub fn release_all(&mut self) {
        self.up = false;
        self.down = false;
        self.left = false;
        self.right = false;
    }

    /// Normalized movement for the held keys
    pub fn to_input(&self) -> PlayerInput {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        let movement = Vec2::new(axis(self.left, self.right), axis(self.up, self.down));
        PlayerInput {
            movement: movement.normalize_or_zero(),
            locomotion: self.locomotion,
        }
    }
}

/// Head straight for the current objective, or stand still without one
pub fn autopilot_input(snapshot: &FrameSnapshot, locomotion: LocomotionMode) -> PlayerInput {
    let movement = snapshot
        .objective
        .map(|objective| {
            let [cx, _, cz] = snapshot.courier.position;
            let [ox, _, oz] = objective.position;
            (Vec2::new(ox, oz) - Vec2::new(cx, cz)).normalize_or_zero()
        })
        .unwrap_or(Vec2::ZERO);
    PlayerInput {
        movement,
        locomotion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::delivery::{DeliveryKind, ObjectiveStage};
    use crate::sim::tick::ObjectiveSnapshot;

    #[test]
    fn test_up_is_negative_z() {
        let mut keys = KeyState::new();
        assert_eq!(keys.key_down("w"), KeyAction::Move);
        assert_eq!(keys.to_input().movement, Vec2::new(0.0, -1.0));
        keys.key_up("w");
        assert_eq!(keys.to_input().movement, Vec2::ZERO);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let mut keys = KeyState::new();
        keys.key_down("ArrowRight");
        keys.key_down("ArrowDown");
        let movement = keys.to_input().movement;
        assert!((movement.length() - 1.0).abs() < 1e-6);
        assert!(movement.x > 0.0 && movement.y > 0.0);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut keys = KeyState::new();
        keys.key_down("a");
        keys.key_down("d");
        assert_eq!(keys.to_input().movement, Vec2::ZERO);
    }

    #[test]
    fn test_digits_select_locomotion() {
        let mut keys = KeyState::new();
        assert_eq!(
            keys.key_down("4"),
            KeyAction::SelectLocomotion(LocomotionMode::Motorcycle)
        );
        assert_eq!(keys.to_input().locomotion, LocomotionMode::Motorcycle);
        assert_eq!(keys.key_down("k"), KeyAction::Ignored);
        assert_eq!(keys.key_down("Q"), KeyAction::CycleQuality);
        assert_eq!(keys.to_input().locomotion, LocomotionMode::Motorcycle);
    }

    #[test]
    fn test_skill_keys() {
        let mut keys = KeyState::new();
        assert_eq!(keys.key_down("v"), KeyAction::SpendSkill(SkillKind::Gps));
        assert_eq!(keys.key_down("Z"), KeyAction::SpendSkill(SkillKind::Speed));
        assert_eq!(keys.to_input().movement, Vec2::ZERO);
    }

    #[test]
    fn test_release_all_stops_movement() {
        let mut keys = KeyState::new();
        keys.key_down("w");
        keys.key_down("d");
        keys.release_all();
        assert_eq!(keys.to_input().movement, Vec2::ZERO);
    }

    #[test]
    fn test_autopilot_heads_for_objective() {
        let mut snapshot = FrameSnapshot::default();
        assert_eq!(
            autopilot_input(&snapshot, LocomotionMode::Walk).movement,
            Vec2::ZERO
        );

        snapshot.courier.position = [10.0, 0.9, 10.0];
        snapshot.objective = Some(ObjectiveSnapshot {
            id: 1,
            position: [10.0, 0.0, -20.0],
            kind: DeliveryKind::Pickup,
            stage: ObjectiveStage::PickupPending,
            reward_estimate: 5.0,
        });
        let input = autopilot_input(&snapshot, LocomotionMode::Bicycle);
        assert!((input.movement - Vec2::new(0.0, -1.0)).length() < 1e-6);
        assert_eq!(input.locomotion, LocomotionMode::Bicycle);
    }
}
