//! Delivery objectives
//!
//! One objective is active at a time. The director cycles
//! pickup → dropoff → pickup and prices each completed drop.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::clock::LightingBucket;
use super::random::RandomSource;
use crate::config::DeliveryConfig;

/// Objectives never spawn closer than this to the world edge
const EDGE_MARGIN: f32 = 5.0;
/// Placement attempts before settling for the farthest candidate
const PLACEMENT_TRIES: usize = 16;

/// Where the director is in the pickup/dropoff cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveStage {
    None,
    PickupPending,
    DeliveryPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryKind {
    Pickup,
    Dropoff,
}

/// The active objective marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPoint {
    pub id: u32,
    pub position: Vec2,
    pub kind: DeliveryKind,
    /// Payment shown to the player before completion
    pub reward_estimate: f32,
    /// Simulation time the objective was issued
    pub issued_at: f64,
}

/// Reward constants (all bonuses are additive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    pub base_payment: f32,
    pub per_meter_rate: f32,
    pub chain_bonus: f32,
    /// Seconds between deliveries that still count as a chain
    pub chain_window: f32,
    pub night_bonus: f32,
    pub reputation_bonus_per_tier: f32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            base_payment: 5.0,
            per_meter_rate: 0.05,
            chain_bonus: 2.0,
            chain_window: 90.0,
            night_bonus: 3.0,
            reputation_bonus_per_tier: 0.5,
        }
    }
}

/// Itemised payment for one delivery
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RewardBreakdown {
    pub base: f32,
    pub distance: f32,
    pub chain: f32,
    pub night: f32,
    pub reputation: f32,
}

impl RewardBreakdown {
    pub fn total(&self) -> f32 {
        self.base + self.distance + self.chain + self.night + self.reputation
    }
}

/// Result of a successful proximity check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeliveryOutcome {
    PickedUp {
        position: Vec2,
    },
    Delivered {
        reward: f32,
        elapsed_seconds: f32,
        /// Distance travelled while carrying
        distance: f32,
        /// Consecutive deliveries inside the chain window
        chain: u32,
    },
}

/// Issues objectives and detects their completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDirector {
    stage: ObjectiveStage,
    active: Option<DeliveryPoint>,
    next_id: u32,
    config: DeliveryConfig,
    half_extent: f32,
    carrying: bool,
    /// When the current job's pickup was issued
    job_started_at: f64,
    /// Distance travelled since the package was collected
    odometer: f32,
    last_delivery_at: Option<f64>,
    chain: u32,
    fired_this_frame: bool,
}

impl DeliveryDirector {
    pub fn new(config: DeliveryConfig, half_extent: f32) -> Self {
        Self {
            stage: ObjectiveStage::None,
            active: None,
            next_id: 1,
            config,
            half_extent,
            carrying: false,
            job_started_at: 0.0,
            odometer: 0.0,
            last_delivery_at: None,
            chain: 0,
            fired_this_frame: false,
        }
    }

    pub fn stage(&self) -> ObjectiveStage {
        self.stage
    }

    pub fn active(&self) -> Option<&DeliveryPoint> {
        self.active.as_ref()
    }

    pub fn carrying(&self) -> bool {
        self.carrying
    }

    pub fn chain(&self) -> u32 {
        self.chain
    }

    pub fn odometer(&self) -> f32 {
        self.odometer
    }

    /// Re-arm the once-per-frame completion guard
    pub fn begin_frame(&mut self) {
        self.fired_this_frame = false;
    }

    /// Issue the first pickup of the session
    pub fn start(&mut self, player: Vec2, now: f64, rng: &mut dyn RandomSource) {
        if self.stage == ObjectiveStage::None {
            self.issue_pickup(player, now, rng);
        }
    }

    /// Place a pickup at a fixed position (scripted objectives)
    pub fn issue_pickup_at(&mut self, position: Vec2, now: f64) {
        let bound = self.half_extent;
        let position = position.clamp(Vec2::splat(-bound), Vec2::splat(bound));
        self.activate(position, DeliveryKind::Pickup, now);
        self.job_started_at = now;
        self.carrying = false;
        self.stage = ObjectiveStage::PickupPending;
    }

    /// Accumulate courier travel; only counts while carrying
    pub fn record_travel(&mut self, distance: f32) {
        if self.carrying && distance.is_finite() && distance > 0.0 {
            self.odometer += distance;
        }
    }

    /// Complete the active objective if the player is inside its radius
    pub fn check_proximity(
        &mut self,
        player: Vec2,
        now: f64,
        lighting: LightingBucket,
        reputation_tier: u8,
        rng: &mut dyn RandomSource,
    ) -> Option<DeliveryOutcome> {
        let Some(point) = self.active.as_ref() else {
            log::debug!("No active objective, issuing a pickup");
            self.issue_pickup(player, now, rng);
            return None;
        };
        if self.fired_this_frame {
            return None;
        }

        let radius = self.config.completion_radius;
        if point.position.distance_squared(player) >= radius * radius {
            return None;
        }
        let position = point.position;

        match self.stage {
            ObjectiveStage::PickupPending => {
                self.fired_this_frame = true;
                self.carrying = true;
                self.odometer = 0.0;
                self.stage = ObjectiveStage::DeliveryPending;
                let dropoff = self.place(position, rng);
                let estimate = self.config.rewards.base_payment
                    + position.distance(dropoff) * self.config.rewards.per_meter_rate;
                self.activate(dropoff, DeliveryKind::Dropoff, now);
                if let Some(active) = self.active.as_mut() {
                    active.reward_estimate = estimate;
                }
                log::debug!("Package picked up at {:?}, dropoff at {:?}", position, dropoff);
                Some(DeliveryOutcome::PickedUp { position })
            }
            ObjectiveStage::DeliveryPending => {
                self.fired_this_frame = true;
                let chained = self
                    .last_delivery_at
                    .is_some_and(|t| now - t <= self.config.rewards.chain_window as f64);
                self.chain = if chained { self.chain + 1 } else { 1 };

                let breakdown = self.price(chained, lighting, reputation_tier);
                let reward = breakdown.total();
                let elapsed_seconds = (now - self.job_started_at).max(0.0) as f32;
                let distance = self.odometer;

                self.carrying = false;
                self.odometer = 0.0;
                self.last_delivery_at = Some(now);
                log::debug!(
                    "Delivered for {:.2} after {:.1}s ({:.1} m, chain {})",
                    reward,
                    elapsed_seconds,
                    distance,
                    self.chain
                );
                self.issue_pickup(player, now, rng);
                Some(DeliveryOutcome::Delivered {
                    reward,
                    elapsed_seconds,
                    distance,
                    chain: self.chain,
                })
            }
            ObjectiveStage::None => {
                // Active point without a stage: restart the cycle
                self.issue_pickup(player, now, rng);
                None
            }
        }
    }

    /// Itemised reward for the delivery currently in progress
    pub fn price(&self, chained: bool, lighting: LightingBucket, reputation_tier: u8) -> RewardBreakdown {
        let table = &self.config.rewards;
        RewardBreakdown {
            base: table.base_payment,
            distance: self.odometer * table.per_meter_rate,
            chain: if chained { table.chain_bonus } else { 0.0 },
            night: if lighting == LightingBucket::Night {
                table.night_bonus
            } else {
                0.0
            },
            reputation: reputation_tier as f32 * table.reputation_bonus_per_tier,
        }
    }

    fn issue_pickup(&mut self, avoid: Vec2, now: f64, rng: &mut dyn RandomSource) {
        let position = self.place(avoid, rng);
        self.issue_pickup_at(position, now);
        log::debug!("Pickup issued at {:?}", position);
    }

    fn activate(&mut self, position: Vec2, kind: DeliveryKind, now: f64) {
        let id = self.next_id;
        self.next_id += 1;
        self.active = Some(DeliveryPoint {
            id,
            position,
            kind,
            reward_estimate: self.config.rewards.base_payment,
            issued_at: now,
        });
    }

    /// Random in-bounds position at least `min_objective_distance` from `avoid`
    fn place(&self, avoid: Vec2, rng: &mut dyn RandomSource) -> Vec2 {
        let extent = (self.half_extent - EDGE_MARGIN).max(0.0);
        let min_dist_sq = self.config.min_objective_distance * self.config.min_objective_distance;
        let mut best = Vec2::ZERO;
        let mut best_dist_sq = f32::NEG_INFINITY;

        for _ in 0..PLACEMENT_TRIES {
            let candidate = Vec2::new(rng.range(-extent, extent), rng.range(-extent, extent));
            let dist_sq = candidate.distance_squared(avoid);
            if dist_sq >= min_dist_sq {
                return candidate;
            }
            if dist_sq > best_dist_sq {
                best = candidate;
                best_dist_sq = dist_sq;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::{RngState, ScriptedRandom};

    fn director() -> DeliveryDirector {
        DeliveryDirector::new(DeliveryConfig::default(), 100.0)
    }

    #[test]
    fn test_start_issues_pickup_away_from_player() {
        let mut director = director();
        let mut rng = RngState::new(3).to_rng();
        assert_eq!(director.stage(), ObjectiveStage::None);
        director.start(Vec2::ZERO, 0.0, &mut rng);
        assert_eq!(director.stage(), ObjectiveStage::PickupPending);
        let point = director.active().unwrap();
        assert_eq!(point.kind, DeliveryKind::Pickup);
        assert!(point.position.length() >= 25.0);
        assert!(point.position.x.abs() <= 95.0 && point.position.y.abs() <= 95.0);
    }

    #[test]
    fn test_stage_alternation() {
        let mut director = director();
        let mut rng = RngState::new(11).to_rng();
        director.start(Vec2::ZERO, 0.0, &mut rng);

        let mut now = 0.0;
        let mut expected = ObjectiveStage::PickupPending;
        for _ in 0..10 {
            assert_eq!(director.stage(), expected);
            director.begin_frame();
            now += 10.0;
            let target = director.active().unwrap().position;
            let outcome = director.check_proximity(target, now, LightingBucket::Day, 0, &mut rng);
            assert!(outcome.is_some());
            expected = match expected {
                ObjectiveStage::PickupPending => ObjectiveStage::DeliveryPending,
                _ => ObjectiveStage::PickupPending,
            };
            assert_eq!(director.stage(), expected);
            assert_eq!(director.carrying(), expected == ObjectiveStage::DeliveryPending);
        }
    }

    #[test]
    fn test_no_double_fire_within_frame() {
        let mut director = director();
        // Pickup at (3, 0); the dropoff lands on (1, 0) right next to the player
        let mut rng = ScriptedRandom::new(vec![0.5 + 1.0 / 190.0, 0.5]);
        director.issue_pickup_at(Vec2::new(3.0, 0.0), 0.0);
        director.config.min_objective_distance = 0.0;

        director.begin_frame();
        let player = Vec2::new(2.0, 0.0);
        let first = director.check_proximity(player, 1.0, LightingBucket::Day, 0, &mut rng);
        assert!(matches!(first, Some(DeliveryOutcome::PickedUp { .. })));
        assert_eq!(director.stage(), ObjectiveStage::DeliveryPending);

        let second = director.check_proximity(player, 1.0, LightingBucket::Day, 0, &mut rng);
        assert!(second.is_none());

        director.begin_frame();
        let third = director.check_proximity(player, 1.1, LightingBucket::Day, 0, &mut rng);
        assert!(matches!(third, Some(DeliveryOutcome::Delivered { .. })));
    }

    #[test]
    fn test_missing_objective_self_heals() {
        let mut director = director();
        let mut rng = RngState::new(5).to_rng();
        let outcome = director.check_proximity(Vec2::ZERO, 0.0, LightingBucket::Day, 0, &mut rng);
        assert!(outcome.is_none());
        assert_eq!(director.stage(), ObjectiveStage::PickupPending);
        assert!(director.active().is_some());
    }

    #[test]
    fn test_outside_radius_is_noop() {
        let mut director = director();
        let mut rng = RngState::new(5).to_rng();
        director.issue_pickup_at(Vec2::new(10.0, 0.0), 0.0);
        director.begin_frame();
        // Exactly on the radius does not count
        let outcome = director.check_proximity(Vec2::new(7.0, 0.0), 0.0, LightingBucket::Day, 0, &mut rng);
        assert!(outcome.is_none());
        assert_eq!(director.stage(), ObjectiveStage::PickupPending);
    }

    #[test]
    fn test_reward_is_additive() {
        let mut director = director();
        let mut rng = RngState::new(8).to_rng();
        director.issue_pickup_at(Vec2::new(10.0, 10.0), 0.0);

        director.begin_frame();
        director.check_proximity(Vec2::new(10.0, 10.0), 5.0, LightingBucket::Day, 0, &mut rng);
        director.record_travel(100.0);
        let dropoff = director.active().unwrap().position;

        director.begin_frame();
        let outcome = director.check_proximity(dropoff, 30.0, LightingBucket::Night, 2, &mut rng);
        let Some(DeliveryOutcome::Delivered {
            reward,
            elapsed_seconds,
            distance,
            chain,
        }) = outcome
        else {
            panic!("expected delivery, got {:?}", outcome);
        };
        // base 5 + 100 m * 0.05 + night 3 + reputation 2 * 0.5
        assert!((reward - 14.0).abs() < 1e-4);
        assert!((elapsed_seconds - 30.0).abs() < 1e-4);
        assert_eq!(distance, 100.0);
        assert_eq!(chain, 1);
    }

    #[test]
    fn test_chain_bonus_within_window() {
        let mut director = director();
        let mut rng = RngState::new(21).to_rng();
        director.start(Vec2::ZERO, 0.0, &mut rng);

        let mut rewards = Vec::new();
        let mut now = 0.0;
        for step in 0..6 {
            director.begin_frame();
            now += if step == 4 || step == 5 { 200.0 } else { 10.0 };
            let target = director.active().unwrap().position;
            if let Some(DeliveryOutcome::Delivered { reward, chain, .. }) =
                director.check_proximity(target, now, LightingBucket::Day, 0, &mut rng)
            {
                rewards.push((reward, chain));
            }
        }
        // Deliveries land on steps 1, 3 and 5; the last one is outside the window
        assert_eq!(rewards.len(), 3);
        assert_eq!(rewards[0], (5.0, 1));
        assert_eq!(rewards[1], (7.0, 2));
        assert_eq!(rewards[2], (5.0, 1));
    }

    #[test]
    fn test_travel_only_counts_while_carrying() {
        let mut director = director();
        director.record_travel(50.0);
        assert_eq!(director.odometer(), 0.0);
    }
}
