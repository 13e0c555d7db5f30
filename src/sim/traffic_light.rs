//! Traffic signals
//!
//! Each light is an independent closed-loop timer cycling
//! green → yellow → red → green. Nothing outside [`TrafficLightController::tick`]
//! can move a light to another phase.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sanitize_delta;

/// Signal phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalPhase {
    Green,
    Yellow,
    Red,
}

impl SignalPhase {
    /// Next phase in the cycle
    pub fn next(self) -> Self {
        match self {
            SignalPhase::Green => SignalPhase::Yellow,
            SignalPhase::Yellow => SignalPhase::Red,
            SignalPhase::Red => SignalPhase::Green,
        }
    }
}

/// Which pair of approaches a light controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAxis {
    NorthSouth,
    EastWest,
}

/// Phase durations in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseDurations {
    pub green: f32,
    pub yellow: f32,
    pub red: f32,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            green: 10.0,
            yellow: 2.0,
            red: 8.0,
        }
    }
}

impl PhaseDurations {
    pub fn of(&self, phase: SignalPhase) -> f32 {
        match phase {
            SignalPhase::Green => self.green,
            SignalPhase::Yellow => self.yellow,
            SignalPhase::Red => self.red,
        }
    }
}

/// A single signal head
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficLight {
    pub id: u32,
    pub position: Vec2,
    pub axis: SignalAxis,
    pub phase: SignalPhase,
    /// Seconds left in the current phase
    pub remaining: f32,
}

impl TrafficLight {
    pub fn new(
        id: u32,
        position: Vec2,
        axis: SignalAxis,
        phase: SignalPhase,
        durations: &PhaseDurations,
    ) -> Self {
        Self {
            id,
            position,
            axis,
            phase,
            remaining: durations.of(phase),
        }
    }

    /// Advance the timer; at most one transition per call
    fn advance(&mut self, dt: f32, durations: &PhaseDurations) -> bool {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.phase = self.phase.next();
            self.remaining = durations.of(self.phase);
            true
        } else {
            false
        }
    }
}

/// Owns every signal in the city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficLightController {
    lights: Vec<TrafficLight>,
    durations: PhaseDurations,
}

impl TrafficLightController {
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            lights: Vec::new(),
            durations,
        }
    }

    /// Two heads per intersection: north-south starts green, east-west red
    pub fn for_intersections(intersections: &[Vec2], durations: PhaseDurations) -> Self {
        let mut controller = Self::new(durations);
        for &pos in intersections {
            controller.add_light(pos, SignalAxis::NorthSouth, SignalPhase::Green);
            controller.add_light(pos, SignalAxis::EastWest, SignalPhase::Red);
        }
        controller
    }

    /// Add a light, returning its ID
    pub fn add_light(&mut self, position: Vec2, axis: SignalAxis, phase: SignalPhase) -> u32 {
        let id = self.lights.len() as u32 + 1;
        self.lights
            .push(TrafficLight::new(id, position, axis, phase, &self.durations));
        id
    }

    /// Advance every light by `dt` seconds, returning how many changed phase
    pub fn tick(&mut self, dt: f32) -> usize {
        let dt = sanitize_delta(dt);
        if dt == 0.0 {
            return 0;
        }
        let durations = self.durations;
        let mut changed = 0;
        for light in &mut self.lights {
            if light.advance(dt, &durations) {
                changed += 1;
            }
        }
        changed
    }

    pub fn lights(&self) -> &[TrafficLight] {
        &self.lights
    }

    pub fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    /// Phase of the light governing `axis` at the intersection within `radius` of `position`
    pub fn phase_for(&self, position: Vec2, axis: SignalAxis, radius: f32) -> Option<SignalPhase> {
        let radius_sq = radius * radius;
        self.lights
            .iter()
            .filter(|l| l.axis == axis && l.position.distance_squared(position) <= radius_sq)
            .min_by(|a, b| {
                a.position
                    .distance_squared(position)
                    .partial_cmp(&b.position.distance_squared(position))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|l| l.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn single_light() -> TrafficLightController {
        let mut controller = TrafficLightController::new(PhaseDurations::default());
        controller.add_light(Vec2::ZERO, SignalAxis::NorthSouth, SignalPhase::Green);
        controller
    }

    #[test]
    fn test_full_cycle_timing() {
        let mut controller = single_light();
        let dt = 0.5;
        let mut seen = vec![(SignalPhase::Green, 0.0f32)];

        // 20s cycle, simulate two full cycles
        for _ in 0..80 {
            controller.tick(dt);
            let phase = controller.lights()[0].phase;
            let last = seen.last_mut().unwrap();
            if last.0 == phase {
                last.1 += dt;
            } else {
                seen.push((phase, dt));
            }
        }

        let phases: Vec<SignalPhase> = seen.iter().map(|(p, _)| *p).collect();
        assert_eq!(
            &phases[..6],
            &[
                SignalPhase::Green,
                SignalPhase::Yellow,
                SignalPhase::Red,
                SignalPhase::Green,
                SignalPhase::Yellow,
                SignalPhase::Red
            ]
        );
        // Interior spans match the configured durations
        assert!((seen[1].1 - 2.0).abs() < 1e-3);
        assert!((seen[2].1 - 8.0).abs() < 1e-3);
        assert!((seen[3].1 - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_negative_delta_does_not_touch_timers() {
        let mut controller = single_light();
        controller.tick(3.0);
        let before = controller.lights()[0].remaining;
        assert_eq!(controller.tick(-1.0), 0);
        assert_eq!(controller.tick(f32::NAN), 0);
        assert_eq!(controller.lights()[0].remaining, before);
        assert_eq!(controller.lights()[0].phase, SignalPhase::Green);
    }

    #[test]
    fn test_huge_delta_advances_one_phase() {
        let mut controller = single_light();
        assert_eq!(controller.tick(1000.0), 1);
        assert_eq!(controller.lights()[0].phase, SignalPhase::Yellow);
        assert_eq!(controller.lights()[0].remaining, 2.0);
    }

    #[test]
    fn test_intersection_lights_are_independent() {
        let controller = TrafficLightController::for_intersections(
            &[Vec2::ZERO, Vec2::new(40.0, 0.0)],
            PhaseDurations::default(),
        );
        assert_eq!(controller.lights().len(), 4);
        assert_eq!(
            controller.phase_for(Vec2::new(1.0, 0.0), SignalAxis::NorthSouth, 5.0),
            Some(SignalPhase::Green)
        );
        assert_eq!(
            controller.phase_for(Vec2::new(1.0, 0.0), SignalAxis::EastWest, 5.0),
            Some(SignalPhase::Red)
        );
        assert_eq!(
            controller.phase_for(Vec2::new(20.0, 20.0), SignalAxis::EastWest, 5.0),
            None
        );
    }

    proptest! {
        #[test]
        fn prop_remaining_within_phase_duration(
            deltas in proptest::collection::vec(-0.5f32..0.5, 1..400),
        ) {
            let mut controller = single_light();
            let mut previous = controller.lights()[0].phase;
            for dt in deltas {
                controller.tick(dt);
                let light = &controller.lights()[0];
                let duration = controller.durations().of(light.phase);
                prop_assert!(light.remaining >= 0.0);
                prop_assert!(light.remaining <= duration);
                // Strict cyclic order
                prop_assert!(light.phase == previous || light.phase == previous.next());
                previous = light.phase;
            }
        }
    }
}
