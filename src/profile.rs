//! Courier profile
//!
//! Persisted to LocalStorage by the host. Progression is copied from the
//! simulation after deliveries; personal bests are tracked from events.

use serde::{Deserialize, Serialize};

use crate::persistence;
use crate::sim::events::GameEvent;
use crate::sim::progression::ProgressionState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CourierProfile {
    pub progression: ProgressionState,
    /// Longest delivery chain
    pub best_chain: u32,
    /// Fastest pickup-to-dropoff time (seconds)
    pub fastest_delivery: Option<f32>,
    /// Largest single payment
    pub best_reward: f32,
}

impl CourierProfile {
    /// LocalStorage key (used only in wasm32)
    const STORAGE_KEY: &'static str = "city_courier_profile";

    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an event into the personal bests; true when the profile changed
    pub fn record(&mut self, event: &GameEvent) -> bool {
        let GameEvent::Delivery {
            reward,
            elapsed_seconds,
            chain,
        } = *event
        else {
            return false;
        };

        let mut changed = false;
        if chain > self.best_chain {
            self.best_chain = chain;
            changed = true;
        }
        if reward.is_finite() && reward > self.best_reward {
            self.best_reward = reward;
            changed = true;
        }
        if elapsed_seconds.is_finite()
            && elapsed_seconds > 0.0
            && self.fastest_delivery.is_none_or(|best| elapsed_seconds < best)
        {
            self.fastest_delivery = Some(elapsed_seconds);
            changed = true;
        }
        changed
    }

    /// Copy the simulation's progression; true when it differs
    pub fn sync_progression(&mut self, progression: &ProgressionState) -> bool {
        if self.progression == *progression {
            return false;
        }
        self.progression = progression.clone();
        true
    }

    pub fn load() -> Self {
        match persistence::load::<CourierProfile>(Self::STORAGE_KEY) {
            Some(profile) => {
                log::info!(
                    "Loaded courier profile (level {}, {} deliveries)",
                    profile.progression.level,
                    profile.progression.deliveries
                );
                profile
            }
            None => {
                log::info!("No courier profile found, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self) {
        if let Err(err) = persistence::save(Self::STORAGE_KEY, self) {
            log::warn!("Courier profile not saved: {}", err);
        }
    }

    pub fn clear() {
        persistence::remove(Self::STORAGE_KEY);
        log::info!("Courier profile cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn delivery(reward: f32, elapsed_seconds: f32, chain: u32) -> GameEvent {
        GameEvent::Delivery {
            reward,
            elapsed_seconds,
            chain,
        }
    }

    #[test]
    fn test_records_personal_bests() {
        let mut profile = CourierProfile::new();
        assert!(profile.record(&delivery(6.0, 40.0, 1)));
        assert!(profile.record(&delivery(5.0, 25.0, 2)));
        assert!(!profile.record(&delivery(4.0, 30.0, 1)));

        assert_eq!(profile.best_chain, 2);
        assert_eq!(profile.best_reward, 6.0);
        assert_eq!(profile.fastest_delivery, Some(25.0));
    }

    #[test]
    fn test_ignores_other_events() {
        let mut profile = CourierProfile::new();
        assert!(!profile.record(&GameEvent::Pickup {
            position: Vec2::ZERO
        }));
        assert_eq!(profile, CourierProfile::default());
    }

    #[test]
    fn test_sync_progression() {
        let mut profile = CourierProfile::new();
        let state = ProgressionState {
            level: 3,
            ..Default::default()
        };
        assert!(profile.sync_progression(&state));
        assert!(!profile.sync_progression(&state));
        assert_eq!(profile.progression.level, 3);
    }

    #[test]
    fn test_profile_round_trips_through_json() {
        let mut profile = CourierProfile::new();
        profile.record(&delivery(9.5, 12.0, 3));
        let json = persistence::encode(&profile).unwrap();
        let back: CourierProfile = persistence::decode("profile", &json).unwrap();
        assert_eq!(back, profile);
    }
}
