//! The player-controlled courier
//!
//! Input arrives once per frame as a normalized movement vector plus a
//! locomotion selection. The courier is clamped to the world (it never wraps).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::progression::{SkillKind, SkillLevels};
use crate::normalize_angle;

/// Energy pool at skill tier zero
pub const BASE_ENERGY: f32 = 100.0;
/// Extra energy per Capacity tier
pub const ENERGY_PER_CAPACITY_TIER: f32 = 15.0;
/// Energy regained per second while standing still
pub const ENERGY_REGEN_PER_SEC: f32 = 8.0;
/// Speed multiplier while out of energy
pub const EXHAUSTED_SPEED_FACTOR: f32 = 0.5;
/// Speed bonus per Speed tier
pub const SPEED_BONUS_PER_TIER: f32 = 0.08;
/// Energy drain reduction per Stamina tier
pub const STAMINA_SAVING_PER_TIER: f32 = 0.1;

/// How the courier gets around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocomotionMode {
    #[default]
    Walk,
    Bicycle,
    Scooter,
    Motorcycle,
}

/// Movement constants for a locomotion mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionProfile {
    /// Units per second
    pub speed: f32,
    /// Radians per second
    pub turn_speed: f32,
    /// Energy per second of movement
    pub energy_cost: f32,
}

impl LocomotionMode {
    pub const ALL: [LocomotionMode; 4] = [
        LocomotionMode::Walk,
        LocomotionMode::Bicycle,
        LocomotionMode::Scooter,
        LocomotionMode::Motorcycle,
    ];

    pub fn profile(self) -> LocomotionProfile {
        match self {
            LocomotionMode::Walk => LocomotionProfile {
                speed: 5.0,
                turn_speed: 6.0,
                energy_cost: 0.0,
            },
            LocomotionMode::Bicycle => LocomotionProfile {
                speed: 9.0,
                turn_speed: 4.5,
                energy_cost: 1.5,
            },
            LocomotionMode::Scooter => LocomotionProfile {
                speed: 12.0,
                turn_speed: 3.5,
                energy_cost: 1.0,
            },
            LocomotionMode::Motorcycle => LocomotionProfile {
                speed: 18.0,
                turn_speed: 3.0,
                energy_cost: 2.0,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocomotionMode::Walk => "walk",
            LocomotionMode::Bicycle => "bicycle",
            LocomotionMode::Scooter => "scooter",
            LocomotionMode::Motorcycle => "motorcycle",
        }
    }

    /// Parse a host-supplied selector, falling back to walking
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "walk" | "foot" => LocomotionMode::Walk,
            "bicycle" | "bike" => LocomotionMode::Bicycle,
            "scooter" => LocomotionMode::Scooter,
            "motorcycle" | "moto" => LocomotionMode::Motorcycle,
            other => {
                log::warn!("Unknown locomotion mode {:?}, walking", other);
                LocomotionMode::Walk
            }
        }
    }

    /// Selector by index (0 = walk), falling back to walking
    pub fn from_index(index: i32) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_else(|| {
                log::warn!("Locomotion index {} out of range, walking", index);
                LocomotionMode::Walk
            })
    }
}

/// Per-frame player commands
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Desired direction on the ground plane; length is clamped to 1
    pub movement: Vec2,
    pub locomotion: LocomotionMode,
}

/// Courier state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    pub position: Vec2,
    /// Facing angle (radians, 0 = +x)
    pub heading: f32,
    pub carrying: bool,
    pub locomotion: LocomotionMode,
    pub energy: f32,
}

impl Default for Courier {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            heading: 0.0,
            carrying: false,
            locomotion: LocomotionMode::Walk,
            energy: BASE_ENERGY,
        }
    }
}

impl Courier {
    pub fn max_energy(skills: &SkillLevels) -> f32 {
        BASE_ENERGY + skills.tier(SkillKind::Capacity) as f32 * ENERGY_PER_CAPACITY_TIER
    }

    /// Effective top speed for the current mode, skills and energy
    pub fn speed(&self, skills: &SkillLevels) -> f32 {
        let profile = self.locomotion.profile();
        let skill = 1.0 + skills.tier(SkillKind::Speed) as f32 * SPEED_BONUS_PER_TIER;
        let exhausted = profile.energy_cost > 0.0 && self.energy <= 0.0;
        let fatigue = if exhausted { EXHAUSTED_SPEED_FACTOR } else { 1.0 };
        profile.speed * skill * fatigue
    }

    /// Turn heading toward `target` limited by the mode's turn speed
    fn turn_toward(&mut self, target: f32, dt: f32, max_speed: f32) {
        let mut delta = normalize_angle(target) - normalize_angle(self.heading);
        // Handle wraparound
        if delta > std::f32::consts::PI {
            delta -= std::f32::consts::TAU;
        } else if delta < -std::f32::consts::PI {
            delta += std::f32::consts::TAU;
        }
        let max_delta = max_speed * dt;
        self.heading = normalize_angle(self.heading + delta.clamp(-max_delta, max_delta));
    }

    /// Integrate one frame of input, returning distance travelled
    pub fn apply_input(
        &mut self,
        input: &PlayerInput,
        dt: f32,
        skills: &SkillLevels,
        half_extent: f32,
    ) -> f32 {
        self.locomotion = input.locomotion;
        let max_energy = Self::max_energy(skills);
        let movement = if input.movement.is_finite() {
            input.movement.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };

        if movement.length_squared() <= f32::EPSILON || dt <= 0.0 {
            self.energy = (self.energy + ENERGY_REGEN_PER_SEC * dt).min(max_energy);
            return 0.0;
        }

        let profile = self.locomotion.profile();
        self.turn_toward(movement.y.atan2(movement.x), dt, profile.turn_speed);

        let before = self.position;
        let step = movement * self.speed(skills) * dt;
        let bound = Vec2::splat(half_extent);
        self.position = (self.position + step).clamp(-bound, bound);

        let saving = (skills.tier(SkillKind::Stamina) as f32 * STAMINA_SAVING_PER_TIER).min(0.9);
        let drain = profile.energy_cost * (1.0 - saving) * movement.length() * dt;
        self.energy = (self.energy - drain).clamp(0.0, max_energy);

        self.position.distance(before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_falls_back_to_walk() {
        assert_eq!(LocomotionMode::parse("Bike"), LocomotionMode::Bicycle);
        assert_eq!(LocomotionMode::parse(" motorcycle "), LocomotionMode::Motorcycle);
        assert_eq!(LocomotionMode::parse("hoverboard"), LocomotionMode::Walk);
        assert_eq!(LocomotionMode::parse(""), LocomotionMode::Walk);
    }

    #[test]
    fn test_from_index_falls_back_to_walk() {
        assert_eq!(LocomotionMode::from_index(2), LocomotionMode::Scooter);
        assert_eq!(LocomotionMode::from_index(-1), LocomotionMode::Walk);
        assert_eq!(LocomotionMode::from_index(17), LocomotionMode::Walk);
    }

    #[test]
    fn test_walk_moves_at_profile_speed() {
        let mut courier = Courier::default();
        let input = PlayerInput {
            movement: Vec2::X,
            locomotion: LocomotionMode::Walk,
        };
        let moved = courier.apply_input(&input, 0.1, &SkillLevels::default(), 100.0);
        assert!((moved - 0.5).abs() < 1e-5);
        assert!((courier.position.x - 0.5).abs() < 1e-5);
        assert_eq!(courier.energy, BASE_ENERGY);
    }

    #[test]
    fn test_movement_is_clamped_to_unit_length() {
        let mut courier = Courier::default();
        let input = PlayerInput {
            movement: Vec2::new(30.0, 40.0),
            locomotion: LocomotionMode::Walk,
        };
        let moved = courier.apply_input(&input, 1.0, &SkillLevels::default(), 100.0);
        assert!((moved - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_courier_clamps_to_world() {
        let mut courier = Courier {
            position: Vec2::new(99.0, 0.0),
            ..Default::default()
        };
        let input = PlayerInput {
            movement: Vec2::X,
            locomotion: LocomotionMode::Motorcycle,
        };
        courier.apply_input(&input, 1.0, &SkillLevels::default(), 100.0);
        assert_eq!(courier.position.x, 100.0);
    }

    #[test]
    fn test_energy_drains_and_exhaustion_slows() {
        let mut courier = Courier {
            energy: 1.0,
            ..Default::default()
        };
        let skills = SkillLevels::default();
        let input = PlayerInput {
            movement: Vec2::Y,
            locomotion: LocomotionMode::Motorcycle,
        };
        courier.apply_input(&input, 1.0, &skills, 100.0);
        assert_eq!(courier.energy, 0.0);
        assert_eq!(courier.speed(&skills), 18.0 * EXHAUSTED_SPEED_FACTOR);

        // Idle regenerates
        courier.apply_input(&PlayerInput::default(), 1.0, &skills, 100.0);
        assert_eq!(courier.energy, ENERGY_REGEN_PER_SEC);
    }

    #[test]
    fn test_skills_change_speed_and_capacity() {
        let mut skills = SkillLevels::default();
        skills.set_tier(SkillKind::Speed, 2);
        skills.set_tier(SkillKind::Capacity, 1);
        let courier = Courier::default();
        assert!((courier.speed(&skills) - 5.0 * 1.16).abs() < 1e-5);
        assert_eq!(Courier::max_energy(&skills), BASE_ENERGY + ENERGY_PER_CAPACITY_TIER);
    }

    #[test]
    fn test_heading_turn_is_rate_limited() {
        let mut courier = Courier::default();
        let input = PlayerInput {
            movement: Vec2::Y,
            locomotion: LocomotionMode::Motorcycle,
        };
        courier.apply_input(&input, 0.1, &SkillLevels::default(), 100.0);
        // Motorcycle turns 3 rad/s
        assert!((courier.heading - 0.3).abs() < 1e-5);
    }
}
