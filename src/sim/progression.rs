//! Courier progression: experience, levels and skills
//!
//! Experience only arrives through completed deliveries. A single large grant
//! can cross several thresholds; every crossing produces its own [`LevelUp`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest tier any skill can reach
pub const MAX_SKILL_TIER: u8 = 5;

/// Level curve constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionCurve {
    /// Experience needed to leave level 1
    pub base_experience: f32,
    /// Threshold growth per level
    pub multiplier: f32,
    /// Skill points granted on each level-up
    pub skill_points_per_level: u32,
    /// Experience earned per unit of delivery reward
    pub experience_per_reward: f32,
    pub max_level: u32,
}

impl Default for ProgressionCurve {
    fn default() -> Self {
        Self {
            base_experience: 100.0,
            multiplier: 1.5,
            skill_points_per_level: 1,
            experience_per_reward: 10.0,
            max_level: 99,
        }
    }
}

impl ProgressionCurve {
    /// Experience required to advance from `level` to `level + 1`
    pub fn experience_to_next_level(&self, level: u32) -> f32 {
        let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
        self.base_experience * self.multiplier.powi(exponent)
    }
}

/// Upgradeable courier skills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillKind {
    Speed,
    Stamina,
    Capacity,
    Gps,
    Reputation,
}

impl SkillKind {
    pub const ALL: [SkillKind; 5] = [
        SkillKind::Speed,
        SkillKind::Stamina,
        SkillKind::Capacity,
        SkillKind::Gps,
        SkillKind::Reputation,
    ];

    fn slot(self) -> usize {
        match self {
            SkillKind::Speed => 0,
            SkillKind::Stamina => 1,
            SkillKind::Capacity => 2,
            SkillKind::Gps => 3,
            SkillKind::Reputation => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillKind::Speed => "speed",
            SkillKind::Stamina => "stamina",
            SkillKind::Capacity => "capacity",
            SkillKind::Gps => "gps",
            SkillKind::Reputation => "reputation",
        }
    }
}

/// Unlocked tier per skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillLevels {
    tiers: [u8; 5],
}

impl SkillLevels {
    pub fn tier(&self, skill: SkillKind) -> u8 {
        self.tiers[skill.slot()]
    }

    /// Set a tier directly (clamped to the cap)
    pub fn set_tier(&mut self, skill: SkillKind, tier: u8) {
        self.tiers[skill.slot()] = tier.min(MAX_SKILL_TIER);
    }
}

/// Why a skill point could not be spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkillError {
    #[error("no skill points available")]
    NoSkillPoints,
    #[error("skill {} is already at the maximum tier", .skill.as_str())]
    SkillMaxed { skill: SkillKind },
}

/// One threshold crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    /// Level reached
    pub level: u32,
    /// Skill points granted by this crossing
    pub skill_points: u32,
}

/// Persistable progression record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionState {
    pub level: u32,
    /// Experience accumulated toward the next level
    pub experience: f32,
    /// Unspent skill points
    pub skill_points: u32,
    pub skills: SkillLevels,
    pub total_earnings: f64,
    pub deliveries: u32,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0.0,
            skill_points: 0,
            skills: SkillLevels::default(),
            total_earnings: 0.0,
            deliveries: 0,
        }
    }
}

/// Owns the progression state; mutated only by delivery completions and skill spending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionTracker {
    state: ProgressionState,
    curve: ProgressionCurve,
}

impl ProgressionTracker {
    pub fn new(curve: ProgressionCurve) -> Self {
        Self::restore(ProgressionState::default(), curve)
    }

    /// Resume from a persisted record
    pub fn restore(mut state: ProgressionState, curve: ProgressionCurve) -> Self {
        state.level = state.level.clamp(1, curve.max_level.max(1));
        if !state.experience.is_finite() || state.experience < 0.0 {
            state.experience = 0.0;
        }
        for skill in SkillKind::ALL {
            let tier = state.skills.tier(skill);
            state.skills.set_tier(skill, tier);
        }
        Self { state, curve }
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn curve(&self) -> &ProgressionCurve {
        &self.curve
    }

    pub fn experience_to_next_level(&self) -> f32 {
        self.curve.experience_to_next_level(self.state.level)
    }

    /// Add experience, emitting one event per threshold crossed
    pub fn grant_experience(&mut self, amount: f32) -> Vec<LevelUp> {
        let mut events = Vec::new();
        if !amount.is_finite() || amount <= 0.0 {
            return events;
        }

        self.state.experience += amount;
        loop {
            if self.state.level >= self.curve.max_level {
                break;
            }
            let threshold = self.curve.experience_to_next_level(self.state.level);
            if self.state.experience < threshold {
                break;
            }
            self.state.experience -= threshold;
            self.state.level += 1;
            self.state.skill_points += self.curve.skill_points_per_level;
            log::info!("Courier reached level {}", self.state.level);
            events.push(LevelUp {
                level: self.state.level,
                skill_points: self.curve.skill_points_per_level,
            });
        }
        events
    }

    /// Book a completed delivery and convert its reward to experience
    pub fn record_delivery(&mut self, reward: f32) -> Vec<LevelUp> {
        self.state.deliveries += 1;
        if reward.is_finite() && reward > 0.0 {
            self.state.total_earnings += reward as f64;
        }
        self.grant_experience(reward * self.curve.experience_per_reward)
    }

    /// Spend one point on `skill`, returning the new tier
    pub fn spend_skill_point(&mut self, skill: SkillKind) -> Result<u8, SkillError> {
        let tier = self.state.skills.tier(skill);
        if tier >= MAX_SKILL_TIER {
            return Err(SkillError::SkillMaxed { skill });
        }
        if self.state.skill_points == 0 {
            return Err(SkillError::NoSkillPoints);
        }
        self.state.skill_points -= 1;
        self.state.skills.set_tier(skill, tier + 1);
        Ok(tier + 1)
    }

    pub fn skills(&self) -> &SkillLevels {
        &self.state.skills
    }
}
