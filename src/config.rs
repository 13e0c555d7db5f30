//! Data-driven simulation tuning
//!
//! Every gameplay constant lives in [`SimConfig`] so balance can be shipped as
//! JSON without a rebuild. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_FRAME_DELTA, MAX_PEDESTRIANS, MAX_VEHICLES};
use crate::sim::delivery::RewardTable;
use crate::sim::progression::ProgressionCurve;
use crate::sim::traffic_light::PhaseDurations;

/// Errors raised while loading or validating a [`SimConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// World layout: a square city centred on the origin with a road grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Half the side length of the world square
    pub half_extent: f32,
    /// Distance between parallel roads
    pub road_spacing: f32,
    /// Lane centre offset from the road centreline
    pub lane_offset: f32,
    /// Sidewalk centre offset from the road centreline
    pub sidewalk_offset: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            half_extent: 100.0,
            road_spacing: 40.0,
            lane_offset: 2.0,
            sidewalk_offset: 6.0,
        }
    }
}

impl WorldConfig {
    /// Full side length of the world
    pub fn width(&self) -> f32 {
        self.half_extent * 2.0
    }

    /// Road centreline coordinates (shared by both axes)
    pub fn road_lines(&self) -> Vec<f32> {
        let mut lines = Vec::new();
        let count = (self.half_extent / self.road_spacing).floor() as i32;
        for i in -count..=count {
            let c = i as f32 * self.road_spacing;
            // Roads exactly on the edge would sit on the wrap seam
            if c.abs() < self.half_extent {
                lines.push(c);
            }
        }
        lines
    }
}

/// Acceleration model shared by vehicles and pedestrians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kinematics {
    /// Distance to the player inside which actors brake
    pub braking_radius: f32,
    /// Speed lost per second while braking
    pub deceleration: f32,
    /// Speed gained per second while cruising
    pub acceleration: f32,
}

impl Kinematics {
    pub const VEHICLE: Self = Self {
        braking_radius: 10.0,
        deceleration: 12.0,
        acceleration: 4.0,
    };

    pub const PEDESTRIAN: Self = Self {
        braking_radius: 3.0,
        deceleration: 6.0,
        acceleration: 2.0,
    };
}

impl Default for Kinematics {
    fn default() -> Self {
        Self::VEHICLE
    }
}

/// Traffic population and speeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub vehicle_count: usize,
    pub pedestrian_count: usize,
    pub vehicle_speed_min: f32,
    pub vehicle_speed_max: f32,
    pub pedestrian_speed_min: f32,
    pub pedestrian_speed_max: f32,
    pub vehicle_kinematics: Kinematics,
    pub pedestrian_kinematics: Kinematics,
    /// Speed at or below which a braking vehicle counts as stopped
    pub stop_threshold: f32,
    /// Vehicles slow for non-green signals within this distance of the stop line
    pub signal_stop_distance: f32,
    /// Half width of an intersection box
    pub intersection_half_width: f32,
    /// Number of distinct vehicle colours
    pub palette_size: u32,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            vehicle_count: MAX_VEHICLES,
            pedestrian_count: MAX_PEDESTRIANS,
            vehicle_speed_min: 6.0,
            vehicle_speed_max: 12.0,
            pedestrian_speed_min: 1.0,
            pedestrian_speed_max: 2.0,
            vehicle_kinematics: Kinematics::VEHICLE,
            pedestrian_kinematics: Kinematics::PEDESTRIAN,
            stop_threshold: 1.0,
            signal_stop_distance: 8.0,
            intersection_half_width: 5.0,
            palette_size: 6,
        }
    }
}

/// Objective placement and completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Linear distance inside which a pickup/dropoff completes
    pub completion_radius: f32,
    /// Objectives spawn at least this far from the courier
    pub min_objective_distance: f32,
    pub rewards: RewardTable,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            completion_radius: 3.0,
            min_objective_distance: 25.0,
            rewards: RewardTable::default(),
        }
    }
}

/// Day/night clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Hour of day at session start
    pub start_hour: f32,
    /// In-game hours per real second (0.02 = one day every 20 minutes)
    pub hours_per_second: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_hour: 8.0,
            hours_per_second: 0.02,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub traffic: TrafficConfig,
    pub signals: PhaseDurations,
    pub delivery: DeliveryConfig,
    pub progression: ProgressionCurve,
    pub clock: ClockConfig,
    /// Frame deltas are clamped to this many seconds
    pub max_frame_delta: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            traffic: TrafficConfig::default(),
            signals: PhaseDurations::default(),
            delivery: DeliveryConfig::default(),
            progression: ProgressionCurve::default(),
            clock: ClockConfig::default(),
            max_frame_delta: MAX_FRAME_DELTA,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the simulation cannot run sensibly
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive number",
                })
            }
        }

        fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be a non-negative number",
                })
            }
        }

        positive("world.half_extent", self.world.half_extent)?;
        positive("world.road_spacing", self.world.road_spacing)?;
        positive("signals.green", self.signals.green)?;
        positive("signals.yellow", self.signals.yellow)?;
        positive("signals.red", self.signals.red)?;
        positive("delivery.completion_radius", self.delivery.completion_radius)?;
        positive("progression.base_experience", self.progression.base_experience)?;
        positive("max_frame_delta", self.max_frame_delta)?;
        positive(
            "traffic.vehicle_kinematics.acceleration",
            self.traffic.vehicle_kinematics.acceleration,
        )?;
        positive(
            "traffic.vehicle_kinematics.deceleration",
            self.traffic.vehicle_kinematics.deceleration,
        )?;
        positive(
            "traffic.pedestrian_kinematics.acceleration",
            self.traffic.pedestrian_kinematics.acceleration,
        )?;
        positive(
            "traffic.pedestrian_kinematics.deceleration",
            self.traffic.pedestrian_kinematics.deceleration,
        )?;
        non_negative(
            "traffic.vehicle_kinematics.braking_radius",
            self.traffic.vehicle_kinematics.braking_radius,
        )?;
        non_negative(
            "traffic.pedestrian_kinematics.braking_radius",
            self.traffic.pedestrian_kinematics.braking_radius,
        )?;
        non_negative("traffic.stop_threshold", self.traffic.stop_threshold)?;
        non_negative("traffic.signal_stop_distance", self.traffic.signal_stop_distance)?;
        non_negative(
            "traffic.intersection_half_width",
            self.traffic.intersection_half_width,
        )?;

        if self.progression.multiplier < 1.0 || !self.progression.multiplier.is_finite() {
            return Err(ConfigError::Invalid {
                field: "progression.multiplier",
                reason: "must be at least 1.0",
            });
        }
        if self.traffic.vehicle_speed_min > self.traffic.vehicle_speed_max
            || self.traffic.vehicle_speed_min < 0.0
        {
            return Err(ConfigError::Invalid {
                field: "traffic.vehicle_speed_min",
                reason: "must be in 0..=vehicle_speed_max",
            });
        }
        if self.traffic.pedestrian_speed_min > self.traffic.pedestrian_speed_max
            || self.traffic.pedestrian_speed_min < 0.0
        {
            return Err(ConfigError::Invalid {
                field: "traffic.pedestrian_speed_min",
                reason: "must be in 0..=pedestrian_speed_max",
            });
        }
        if self.traffic.vehicle_count > MAX_VEHICLES {
            return Err(ConfigError::Invalid {
                field: "traffic.vehicle_count",
                reason: "exceeds the vehicle budget",
            });
        }
        if self.traffic.pedestrian_count > MAX_PEDESTRIANS {
            return Err(ConfigError::Invalid {
                field: "traffic.pedestrian_count",
                reason: "exceeds the pedestrian budget",
            });
        }
        if self.delivery.min_objective_distance >= self.world.width() {
            return Err(ConfigError::Invalid {
                field: "delivery.min_objective_distance",
                reason: "must be smaller than the world",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_frame_delta, MAX_FRAME_DELTA);
        assert_eq!(config.signals.green, 10.0);
        assert_eq!(config.signals.yellow, 2.0);
        assert_eq!(config.signals.red, 8.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{ "signals": { "green": 12.0 } }"#).unwrap();
        assert_eq!(config.signals.green, 12.0);
        assert_eq!(config.signals.red, 8.0);
        assert_eq!(config.world, WorldConfig::default());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = SimConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = SimConfig::from_json(r#"{ "signals": { "yellow": 0.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "signals.yellow",
                ..
            }
        ));

        let mut config = SimConfig::default();
        config.traffic.vehicle_count = MAX_VEHICLES + 1;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.progression.multiplier = 0.5;
        assert!(config.validate().is_err());

        let err = SimConfig::from_json(
            r#"{ "traffic": { "vehicle_kinematics": { "deceleration": -40.0 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "traffic.vehicle_kinematics.deceleration",
                ..
            }
        ));

        let err = SimConfig::from_json(
            r#"{ "traffic": { "pedestrian_kinematics": { "acceleration": -5.0 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "traffic.pedestrian_kinematics.acceleration",
                ..
            }
        ));

        let mut config = SimConfig::default();
        config.traffic.vehicle_kinematics.acceleration = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.traffic.pedestrian_kinematics.deceleration = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.traffic.vehicle_kinematics.braking_radius = -1.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.traffic.pedestrian_kinematics.braking_radius = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.traffic.stop_threshold = -0.5;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.traffic.signal_stop_distance = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.traffic.intersection_half_width = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_road_lines_stay_inside_world() {
        let world = WorldConfig::default();
        let lines = world.road_lines();
        assert_eq!(lines, vec![-80.0, -40.0, 0.0, 40.0, 80.0]);
    }
}
