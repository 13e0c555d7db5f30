//! Simulation state
//!
//! Everything the loop mutates lives here, so a session can be inspected or
//! serialized as one value.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actors::TrafficActors;
use super::clock::Clock;
use super::courier::Courier;
use super::delivery::DeliveryDirector;
use super::progression::ProgressionTracker;
use super::random::RandomSource;
use super::traffic_light::TrafficLightController;
use crate::config::{SimConfig, WorldConfig};

/// Complete world state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Frames simulated so far
    pub tick: u64,
    /// Simulated seconds since session start
    pub elapsed: f64,
    pub clock: Clock,
    pub lights: TrafficLightController,
    pub actors: TrafficActors,
    pub director: DeliveryDirector,
    pub progression: ProgressionTracker,
    pub courier: Courier,
}

impl SimState {
    /// Build the city and spawn traffic. The first objective is issued by the loop.
    pub fn new(config: &SimConfig, rng: &mut dyn RandomSource) -> Self {
        let lights =
            TrafficLightController::for_intersections(&intersections(&config.world), config.signals);
        let actors = TrafficActors::spawn(config.traffic.clone(), &config.world, rng);
        Self {
            tick: 0,
            elapsed: 0.0,
            clock: Clock::from_config(&config.clock),
            lights,
            actors,
            director: DeliveryDirector::new(config.delivery.clone(), config.world.half_extent),
            progression: ProgressionTracker::new(config.progression),
            courier: Courier::default(),
        }
    }
}

/// Every crossing of the road grid
pub fn intersections(world: &WorldConfig) -> Vec<Vec2> {
    let roads = world.road_lines();
    let mut points = Vec::with_capacity(roads.len() * roads.len());
    for &x in &roads {
        for &z in &roads {
            points.push(Vec2::new(x, z));
        }
    }
    points
}
