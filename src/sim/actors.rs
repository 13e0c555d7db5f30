//! Vehicles and pedestrians
//!
//! Actors move in straight lines along a fixed axis and wrap around the world
//! edges. Each actor's next state depends only on its own state, the player
//! position and the (read-only) signals, so update order never matters.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::random::RandomSource;
use super::traffic_light::{SignalAxis, SignalPhase, TrafficLightController};
use crate::config::{Kinematics, TrafficConfig, WorldConfig};
use crate::{sanitize_delta, wrap_coordinate};

/// Axis an actor travels along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveAxis {
    /// Along x (east-west traffic)
    Horizontal,
    /// Along z (north-south traffic)
    Vertical,
}

impl MoveAxis {
    pub fn unit(self) -> Vec2 {
        match self {
            MoveAxis::Horizontal => Vec2::X,
            MoveAxis::Vertical => Vec2::Y,
        }
    }

    /// Which signal head governs traffic on this axis
    pub fn signal_axis(self) -> SignalAxis {
        match self {
            MoveAxis::Horizontal => SignalAxis::EastWest,
            MoveAxis::Vertical => SignalAxis::NorthSouth,
        }
    }
}

/// Shared straight-line motion state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub position: Vec2,
    pub axis: MoveAxis,
    /// +1.0 or -1.0 along the axis
    pub direction: f32,
    pub speed: f32,
    pub max_speed: f32,
}

impl Motion {
    /// Heading in radians on the ground plane (0 = +x)
    pub fn heading(&self) -> f32 {
        let dir = self.axis.unit() * self.direction;
        dir.y.atan2(dir.x)
    }

    fn brake(&mut self, kinematics: &Kinematics, dt: f32) {
        let speed = self.speed - kinematics.deceleration.abs() * dt;
        self.speed = speed.clamp(0.0, self.max_speed);
    }

    fn accelerate(&mut self, kinematics: &Kinematics, dt: f32) {
        let speed = self.speed + kinematics.acceleration.abs() * dt;
        self.speed = speed.clamp(0.0, self.max_speed);
    }

    /// Displace along the axis and wrap at the world edge
    fn integrate(&mut self, dt: f32, half_extent: f32) {
        let step = self.axis.unit() * (self.direction * self.speed * dt);
        self.position += step;
        match self.axis {
            MoveAxis::Horizontal => {
                self.position.x = wrap_coordinate(self.position.x, half_extent);
            }
            MoveAxis::Vertical => {
                self.position.y = wrap_coordinate(self.position.y, half_extent);
            }
        }
    }

    fn near(&self, point: Vec2, radius: f32) -> bool {
        self.position.distance_squared(point) < radius * radius
    }
}

/// A car driving along a lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    pub motion: Motion,
    pub color_index: u32,
}

/// A pedestrian walking along a sidewalk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pedestrian {
    pub id: u32,
    pub motion: Motion,
    pub stopped: bool,
}

/// Signals raised by actors during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActorSignal {
    /// A vehicle braked to a stop because the player is close
    VehicleStoppedNearPlayer { vehicle_id: u32, position: Vec2 },
}

/// Parameters an actor tick needs besides its own state
#[derive(Debug, Clone, Copy)]
struct StepContext<'a> {
    dt: f32,
    player: Vec2,
    half_extent: f32,
    kinematics: &'a Kinematics,
}

/// Owns the vehicle and pedestrian populations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficActors {
    pub vehicles: Vec<Vehicle>,
    pub pedestrians: Vec<Pedestrian>,
    config: TrafficConfig,
    half_extent: f32,
}

impl TrafficActors {
    /// Empty population (actors are added explicitly)
    pub fn new(config: TrafficConfig, world: &WorldConfig) -> Self {
        Self {
            vehicles: Vec::new(),
            pedestrians: Vec::new(),
            config,
            half_extent: world.half_extent,
        }
    }

    /// Spawn randomized traffic on the road grid
    pub fn spawn(config: TrafficConfig, world: &WorldConfig, rng: &mut dyn RandomSource) -> Self {
        let mut actors = Self::new(config, world);
        let roads = world.road_lines();
        if roads.is_empty() {
            log::warn!("World has no roads, spawning no traffic");
            return actors;
        }

        for i in 0..actors.config.vehicle_count {
            let axis = if rng.coin() {
                MoveAxis::Horizontal
            } else {
                MoveAxis::Vertical
            };
            let direction = if rng.coin() { 1.0 } else { -1.0 };
            let road = roads[rng.index(roads.len())];
            // Drive on the right of the centreline
            let lane = road - direction * world.lane_offset;
            let along = rng.range(-world.half_extent, world.half_extent);
            let max_speed = rng.range(
                actors.config.vehicle_speed_min,
                actors.config.vehicle_speed_max,
            );
            let color_index = rng.index(actors.config.palette_size.max(1) as usize) as u32;
            actors.vehicles.push(Vehicle {
                id: i as u32 + 1,
                motion: Motion {
                    position: place_on_axis(axis, along, lane),
                    axis,
                    direction,
                    speed: max_speed,
                    max_speed,
                },
                color_index,
            });
        }

        for i in 0..actors.config.pedestrian_count {
            let axis = if rng.coin() {
                MoveAxis::Horizontal
            } else {
                MoveAxis::Vertical
            };
            let direction = if rng.coin() { 1.0 } else { -1.0 };
            let road = roads[rng.index(roads.len())];
            let side = if rng.coin() { 1.0 } else { -1.0 };
            let along = rng.range(-world.half_extent, world.half_extent);
            let max_speed = rng.range(
                actors.config.pedestrian_speed_min,
                actors.config.pedestrian_speed_max,
            );
            actors.pedestrians.push(Pedestrian {
                id: i as u32 + 1,
                motion: Motion {
                    position: place_on_axis(axis, along, road + side * world.sidewalk_offset),
                    axis,
                    direction,
                    speed: max_speed,
                    max_speed,
                },
                stopped: false,
            });
        }

        log::debug!(
            "Spawned {} vehicles, {} pedestrians",
            actors.vehicles.len(),
            actors.pedestrians.len()
        );
        actors
    }

    /// Advance every actor by `dt` seconds
    pub fn tick(
        &mut self,
        dt: f32,
        player: Vec2,
        lights: &TrafficLightController,
    ) -> Vec<ActorSignal> {
        let mut signals = Vec::new();
        let dt = sanitize_delta(dt);
        if dt == 0.0 {
            return signals;
        }

        let vehicle_ctx = StepContext {
            dt,
            player,
            half_extent: self.half_extent,
            kinematics: &self.config.vehicle_kinematics,
        };
        for vehicle in &mut self.vehicles {
            let was_moving = vehicle.motion.speed > self.config.stop_threshold;
            let near_player = vehicle
                .motion
                .near(player, vehicle_ctx.kinematics.braking_radius);

            if near_player {
                vehicle.motion.brake(vehicle_ctx.kinematics, dt);
                if was_moving && vehicle.motion.speed <= self.config.stop_threshold {
                    signals.push(ActorSignal::VehicleStoppedNearPlayer {
                        vehicle_id: vehicle.id,
                        position: vehicle.motion.position,
                    });
                }
            } else if must_stop_for_signal(&vehicle.motion, lights, &self.config) {
                vehicle.motion.brake(vehicle_ctx.kinematics, dt);
            } else {
                vehicle.motion.accelerate(vehicle_ctx.kinematics, dt);
            }
            vehicle.motion.integrate(dt, vehicle_ctx.half_extent);
        }

        let pedestrian_ctx = StepContext {
            kinematics: &self.config.pedestrian_kinematics,
            ..vehicle_ctx
        };
        for pedestrian in &mut self.pedestrians {
            step_pedestrian(pedestrian, &pedestrian_ctx);
        }

        signals
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }
}

fn step_pedestrian(pedestrian: &mut Pedestrian, ctx: &StepContext<'_>) {
    if pedestrian.motion.near(ctx.player, ctx.kinematics.braking_radius) {
        pedestrian.motion.brake(ctx.kinematics, ctx.dt);
    } else {
        pedestrian.motion.accelerate(ctx.kinematics, ctx.dt);
    }
    pedestrian.stopped = pedestrian.motion.speed <= 0.0;
    pedestrian.motion.integrate(ctx.dt, ctx.half_extent);
}

/// Position on a lane: `along` runs with the axis, `lane` across it
fn place_on_axis(axis: MoveAxis, along: f32, lane: f32) -> Vec2 {
    match axis {
        MoveAxis::Horizontal => Vec2::new(along, lane),
        MoveAxis::Vertical => Vec2::new(lane, along),
    }
}

/// True when a red or yellow head governs the approach window just past the stop line
///
/// The window spans `signal_stop_distance` beyond the stop line; a vehicle already
/// inside the intersection box never finds a light and clears it instead of stalling.
fn must_stop_for_signal(
    motion: &Motion,
    lights: &TrafficLightController,
    config: &TrafficConfig,
) -> bool {
    let half_window = config.signal_stop_distance * 0.5;
    let forward = motion.axis.unit() * motion.direction;
    let probe = motion.position + forward * (config.intersection_half_width + half_window);

    matches!(
        lights.phase_for(probe, motion.axis.signal_axis(), half_window),
        Some(SignalPhase::Yellow | SignalPhase::Red)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::RngState;
    use crate::sim::traffic_light::PhaseDurations;
    use proptest::prelude::*;

    fn no_lights() -> TrafficLightController {
        TrafficLightController::new(PhaseDurations::default())
    }

    fn single_vehicle(position: Vec2, axis: MoveAxis, speed: f32) -> TrafficActors {
        let world = WorldConfig::default();
        let mut actors = TrafficActors::new(TrafficConfig::default(), &world);
        actors.vehicles.push(Vehicle {
            id: 1,
            motion: Motion {
                position,
                axis,
                direction: 1.0,
                speed,
                max_speed: speed,
            },
            color_index: 0,
        });
        actors
    }

    #[test]
    fn test_spawn_respects_population_and_bounds() {
        let world = WorldConfig::default();
        let mut rng = RngState::new(1234).to_rng();
        let actors = TrafficActors::spawn(TrafficConfig::default(), &world, &mut rng);
        assert_eq!(actors.vehicles.len(), 12);
        assert_eq!(actors.pedestrians.len(), 8);
        for v in &actors.vehicles {
            assert!(v.motion.position.x.abs() <= world.half_extent);
            assert!(v.motion.position.y.abs() <= world.half_extent);
            assert!(v.color_index < 6);
            assert!(v.motion.max_speed >= 6.0 && v.motion.max_speed <= 12.0);
        }
    }

    #[test]
    fn test_spawn_is_deterministic_for_seed() {
        let world = WorldConfig::default();
        let config = TrafficConfig::default();
        let a = TrafficActors::spawn(config.clone(), &world, &mut RngState::new(5).to_rng());
        let b = TrafficActors::spawn(config, &world, &mut RngState::new(5).to_rng());
        for (va, vb) in a.vehicles.iter().zip(&b.vehicles) {
            assert_eq!(va.motion, vb.motion);
            assert_eq!(va.color_index, vb.color_index);
        }
    }

    #[test]
    fn test_vehicle_brakes_near_player_and_signals_once() {
        let mut actors = single_vehicle(Vec2::new(0.0, 2.0), MoveAxis::Horizontal, 10.0);
        let lights = no_lights();
        let player = Vec2::new(5.0, 2.0);

        let mut stops = 0;
        for _ in 0..30 {
            let signals = actors.tick(0.1, player, &lights);
            stops += signals
                .iter()
                .filter(|s| {
                    matches!(s, ActorSignal::VehicleStoppedNearPlayer { vehicle_id: 1, .. })
                })
                .count();
        }
        assert_eq!(stops, 1);
        assert_eq!(actors.vehicles[0].motion.speed, 0.0);
    }

    #[test]
    fn test_speed_stays_bounded_with_inverted_rates() {
        let world = WorldConfig::default();
        let mut config = TrafficConfig::default();
        config.vehicle_kinematics.deceleration = -40.0;
        config.pedestrian_kinematics.acceleration = -5.0;
        let mut actors =
            TrafficActors::spawn(config, &world, &mut RngState::new(77).to_rng());
        let lights = no_lights();

        let player = actors.vehicles[0].motion.position;
        for _ in 0..5 {
            actors.tick(0.1, player, &lights);
            for v in &actors.vehicles {
                assert!(v.motion.speed >= 0.0 && v.motion.speed <= v.motion.max_speed);
            }
            for p in &actors.pedestrians {
                assert!(p.motion.speed >= 0.0 && p.motion.speed <= p.motion.max_speed);
            }
        }
    }

    #[test]
    fn test_vehicle_recovers_speed_away_from_player() {
        let mut actors = single_vehicle(Vec2::new(0.0, 2.0), MoveAxis::Horizontal, 10.0);
        actors.vehicles[0].motion.speed = 0.0;
        let lights = no_lights();
        let far = Vec2::new(-90.0, -90.0);
        for _ in 0..100 {
            actors.tick(0.1, far, &lights);
        }
        assert_eq!(actors.vehicles[0].motion.speed, 10.0);
    }

    #[test]
    fn test_vehicle_stops_for_red_signal() {
        let mut lights = no_lights();
        lights.add_light(Vec2::new(40.0, 0.0), SignalAxis::EastWest, SignalPhase::Red);
        let mut actors = single_vehicle(Vec2::new(20.0, -2.0), MoveAxis::Horizontal, 8.0);
        let far = Vec2::new(-90.0, 90.0);

        for _ in 0..40 {
            actors.tick(0.1, far, &lights);
        }
        let v = &actors.vehicles[0].motion;
        assert!(v.position.x < 40.0 - 5.0, "vehicle ran the light at x={}", v.position.x);
        assert_eq!(v.speed, 0.0);
    }

    #[test]
    fn test_vehicle_inside_intersection_clears_red() {
        let mut lights = no_lights();
        lights.add_light(Vec2::new(40.0, 0.0), SignalAxis::EastWest, SignalPhase::Red);
        let mut actors = single_vehicle(Vec2::new(37.0, -2.0), MoveAxis::Horizontal, 8.0);
        actors.tick(0.1, Vec2::new(-90.0, 90.0), &lights);
        assert_eq!(actors.vehicles[0].motion.speed, 8.0);
        assert!(actors.vehicles[0].motion.position.x > 37.0);
    }

    #[test]
    fn test_green_and_cross_axis_lights_do_not_stop() {
        let mut lights = no_lights();
        lights.add_light(Vec2::new(40.0, 0.0), SignalAxis::EastWest, SignalPhase::Green);
        lights.add_light(Vec2::new(40.0, 0.5), SignalAxis::NorthSouth, SignalPhase::Red);
        let mut actors = single_vehicle(Vec2::new(30.0, -2.0), MoveAxis::Horizontal, 8.0);
        actors.tick(0.1, Vec2::new(-90.0, 90.0), &lights);
        assert_eq!(actors.vehicles[0].motion.speed, 8.0);
    }

    #[test]
    fn test_negative_delta_moves_nothing() {
        let world = WorldConfig::default();
        let mut actors =
            TrafficActors::spawn(TrafficConfig::default(), &world, &mut RngState::new(9).to_rng());
        let before: Vec<Vec2> = actors.vehicles.iter().map(|v| v.motion.position).collect();
        let signals = actors.tick(-1.0, Vec2::ZERO, &no_lights());
        assert!(signals.is_empty());
        let after: Vec<Vec2> = actors.vehicles.iter().map(|v| v.motion.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_pedestrian_stopped_flag() {
        let world = WorldConfig::default();
        let mut actors = TrafficActors::new(TrafficConfig::default(), &world);
        actors.pedestrians.push(Pedestrian {
            id: 1,
            motion: Motion {
                position: Vec2::new(0.0, 6.0),
                axis: MoveAxis::Horizontal,
                direction: -1.0,
                speed: 1.5,
                max_speed: 1.5,
            },
            stopped: false,
        });
        let lights = no_lights();
        for _ in 0..10 {
            actors.tick(0.1, Vec2::new(0.0, 7.0), &lights);
        }
        assert!(actors.pedestrians[0].stopped);
        for _ in 0..50 {
            actors.tick(0.1, Vec2::new(80.0, -80.0), &lights);
        }
        assert!(!actors.pedestrians[0].stopped);
    }

    #[test]
    fn test_heading_matches_direction() {
        let motion = Motion {
            position: Vec2::ZERO,
            axis: MoveAxis::Horizontal,
            direction: -1.0,
            speed: 0.0,
            max_speed: 1.0,
        };
        assert!((motion.heading().abs() - std::f32::consts::PI).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_speed_stays_bounded(
            seed in any::<u64>(),
            player_x in -100.0f32..100.0,
            player_y in -100.0f32..100.0,
            deltas in proptest::collection::vec(-0.2f32..0.2, 1..120),
        ) {
            let world = WorldConfig::default();
            let mut actors = TrafficActors::spawn(
                TrafficConfig::default(),
                &world,
                &mut RngState::new(seed).to_rng(),
            );
            let mut controller = TrafficLightController::for_intersections(
                &[Vec2::ZERO, Vec2::new(40.0, 40.0)],
                PhaseDurations::default(),
            );
            let player = Vec2::new(player_x, player_y);
            for dt in deltas {
                controller.tick(dt);
                actors.tick(dt, player, &controller);
                for v in &actors.vehicles {
                    prop_assert!(v.motion.speed >= 0.0);
                    prop_assert!(v.motion.speed <= v.motion.max_speed);
                    prop_assert!(v.motion.position.x.abs() <= world.half_extent);
                    prop_assert!(v.motion.position.y.abs() <= world.half_extent);
                }
                for p in &actors.pedestrians {
                    prop_assert!(p.motion.speed >= 0.0);
                    prop_assert!(p.motion.speed <= p.motion.max_speed);
                }
            }
        }

        #[test]
        fn prop_wrap_round_trip(
            start in -99.0f32..99.0,
            speed in 4.0f32..12.0,
            vertical in any::<bool>(),
        ) {
            let axis = if vertical { MoveAxis::Vertical } else { MoveAxis::Horizontal };
            let start_pos = match axis {
                MoveAxis::Horizontal => Vec2::new(start, 42.0),
                MoveAxis::Vertical => Vec2::new(42.0, start),
            };
            let mut actors = single_vehicle(start_pos, axis, speed);
            let lights = no_lights();
            // Player far from the lane so speed stays constant
            let player = match axis {
                MoveAxis::Horizontal => Vec2::new(0.0, -80.0),
                MoveAxis::Vertical => Vec2::new(-80.0, 0.0),
            };

            let world_width = WorldConfig::default().width();
            let total = world_width / speed;
            let steps = 200;
            let dt = total / steps as f32;
            for _ in 0..steps {
                actors.tick(dt, player, &lights);
            }
            let end = actors.vehicles[0].motion.position;
            prop_assert!(end.distance(start_pos) < 0.05, "start {:?} end {:?}", start_pos, end);
        }
    }
}
