//! City Courier - real-time city delivery simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, traffic, deliveries, progression)
//! - `renderer`: Instanced WebGPU presentation of simulation snapshots
//! - `platform`: Browser/native input mapping
//! - `persistence`: LocalStorage helpers for the host
//! - `config`: Data-driven simulation tuning

pub mod audio;
pub mod config;
pub mod persistence;
pub mod platform;
pub mod profile;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use config::{ConfigError, SimConfig};
pub use profile::CourierProfile;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the simulation integrates (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.1;
    /// Nominal frame delta used when the host has no previous timestamp
    pub const NOMINAL_FRAME_DELTA: f32 = 1.0 / 60.0;

    /// Hard population caps (mobile budget)
    pub const MAX_VEHICLES: usize = 12;
    pub const MAX_PEDESTRIANS: usize = 8;

    /// Ground-plane elevations for presentation
    pub const VEHICLE_ELEVATION: f32 = 0.5;
    pub const PEDESTRIAN_ELEVATION: f32 = 0.9;
    pub const COURIER_ELEVATION: f32 = 0.9;
    pub const SIGNAL_ELEVATION: f32 = 3.0;

    /// Hour of day bounds
    pub const HOURS_PER_DAY: f32 = 24.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Sanitize a time delta: negative, NaN and infinite values become zero
#[inline]
pub fn sanitize_delta(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

/// Wrap a coordinate into [-half_extent, half_extent] by teleporting across the world
///
/// Overshoot past one edge is carried over to the opposite edge.
#[inline]
pub fn wrap_coordinate(value: f32, half_extent: f32) -> f32 {
    let width = half_extent * 2.0;
    if value > half_extent {
        value - width * ((value - half_extent) / width).ceil()
    } else if value < -half_extent {
        value + width * ((-half_extent - value) / width).ceil()
    } else {
        value
    }
}

/// Lift a ground-plane point to a 3D position at the given elevation
#[inline]
pub fn ground_to_world(pos: Vec2, elevation: f32) -> [f32; 3] {
    [pos.x, elevation, pos.y]
}
