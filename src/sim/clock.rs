//! Day/night clock
//!
//! The hour advances with simulated time only, never with the wall clock, so
//! replays and tests see the same lighting as the original session.

use serde::{Deserialize, Serialize};

use crate::config::ClockConfig;
use crate::consts::HOURS_PER_DAY;
use crate::sanitize_delta;

/// Coarse time-of-day classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightingBucket {
    Dawn,
    Day,
    Dusk,
    Night,
}

impl LightingBucket {
    /// Classify an hour in [0, 24)
    pub fn from_hour(hour: f32) -> Self {
        if (5.0..8.0).contains(&hour) {
            LightingBucket::Dawn
        } else if (8.0..17.0).contains(&hour) {
            LightingBucket::Day
        } else if (17.0..20.0).contains(&hour) {
            LightingBucket::Dusk
        } else {
            LightingBucket::Night
        }
    }
}

/// Simulation clock tracking hour of day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    hour: f32,
    hours_per_second: f32,
}

impl Clock {
    pub fn new(start_hour: f32, hours_per_second: f32) -> Self {
        let start = if start_hour.is_finite() { start_hour } else { 0.0 };
        Self {
            hour: start.rem_euclid(HOURS_PER_DAY),
            hours_per_second: sanitize_delta(hours_per_second),
        }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        Self::new(config.start_hour, config.hours_per_second)
    }

    /// Advance by `dt` seconds and return the new hour
    pub fn advance(&mut self, dt: f32) -> f32 {
        let dt = sanitize_delta(dt);
        self.hour = (self.hour + dt * self.hours_per_second).rem_euclid(HOURS_PER_DAY);
        // rem_euclid can round up to exactly 24.0 for tiny negative inputs
        if self.hour >= HOURS_PER_DAY {
            self.hour = 0.0;
        }
        self.hour
    }

    #[inline]
    pub fn hour(&self) -> f32 {
        self.hour
    }

    pub fn is_daytime(&self) -> bool {
        (6.0..=18.0).contains(&self.hour)
    }

    pub fn lighting(&self) -> LightingBucket {
        LightingBucket::from_hour(self.hour)
    }

    /// Ambient colour tint for the presentation layer
    pub fn ambient_tint(&self) -> [f32; 3] {
        compute_tint(self.hour)
    }
}

/// Smooth hermite interpolation.
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn compute_tint(hour: f32) -> [f32; 3] {
    const NIGHT: [f32; 3] = [0.35, 0.4, 0.65];
    const DAWN: [f32; 3] = [1.0, 0.82, 0.7];
    const DAY: [f32; 3] = [1.0, 1.0, 1.0];
    const DUSK: [f32; 3] = [1.0, 0.75, 0.6];

    if hour < 5.0 {
        NIGHT
    } else if hour < 6.5 {
        lerp3(NIGHT, DAWN, smoothstep(5.0, 6.5, hour))
    } else if hour < 8.0 {
        lerp3(DAWN, DAY, smoothstep(6.5, 8.0, hour))
    } else if hour < 17.0 {
        DAY
    } else if hour < 18.5 {
        lerp3(DAY, DUSK, smoothstep(17.0, 18.5, hour))
    } else if hour < 20.0 {
        lerp3(DUSK, NIGHT, smoothstep(18.5, 20.0, hour))
    } else {
        NIGHT
    }
}
