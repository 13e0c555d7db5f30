//! Per-frame simulation tick
//!
//! [`SimulationLoop`] is the composition root. Each call to
//! [`SimulationLoop::tick`] advances the subsystems in a fixed order and
//! rewrites one reusable [`FrameSnapshot`] for the renderer and UI.

use glam::Vec2;
use serde::Serialize;

use super::actors::ActorSignal;
use super::clock::LightingBucket;
use super::courier::{Courier, LocomotionMode, PlayerInput};
use super::delivery::{DeliveryKind, DeliveryOutcome, ObjectiveStage};
use super::events::{EventBus, GameEvent, SubscriptionId};
use super::progression::{ProgressionState, ProgressionTracker, SkillError, SkillKind};
use super::random::RandomSource;
use super::state::SimState;
use super::traffic_light::{SignalAxis, SignalPhase};
use crate::config::SimConfig;
use crate::consts::*;
use crate::{ground_to_world, sanitize_delta};

/// A vehicle or pedestrian as the renderer sees it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActorSnapshot {
    pub id: u32,
    /// World position (x, elevation, z)
    pub position: [f32; 3],
    /// Yaw on the ground plane (radians)
    pub rotation: f32,
    pub color_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightSnapshot {
    pub id: u32,
    pub position: [f32; 3],
    pub axis: SignalAxis,
    pub phase: SignalPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CourierSnapshot {
    pub position: [f32; 3],
    pub heading: f32,
    pub carrying: bool,
    pub locomotion: LocomotionMode,
    pub energy: f32,
    pub max_energy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectiveSnapshot {
    pub id: u32,
    pub position: [f32; 3],
    pub kind: DeliveryKind,
    pub stage: ObjectiveStage,
    pub reward_estimate: f32,
}

/// Waypoint hint unlocked by the GPS skill
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsHint {
    /// Bearing from the courier to the objective (radians, 0 = +x)
    pub bearing: f32,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProgressionSummary {
    pub level: u32,
    pub experience: f32,
    pub experience_to_next: f32,
    pub skill_points: u32,
    pub total_earnings: f64,
    pub deliveries: u32,
    pub chain: u32,
}

/// Read-only view of one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub elapsed: f64,
    pub hour: f32,
    pub lighting: LightingBucket,
    pub is_daytime: bool,
    pub ambient_tint: [f32; 3],
    pub vehicles: Vec<ActorSnapshot>,
    pub pedestrians: Vec<ActorSnapshot>,
    pub lights: Vec<LightSnapshot>,
    pub courier: CourierSnapshot,
    pub objective: Option<ObjectiveSnapshot>,
    pub gps: Option<GpsHint>,
    pub progression: ProgressionSummary,
    /// Events emitted during this frame
    pub events: Vec<GameEvent>,
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
            hour: 0.0,
            lighting: LightingBucket::Night,
            is_daytime: false,
            ambient_tint: [1.0; 3],
            vehicles: Vec::with_capacity(MAX_VEHICLES),
            pedestrians: Vec::with_capacity(MAX_PEDESTRIANS),
            lights: Vec::new(),
            courier: CourierSnapshot {
                position: [0.0, COURIER_ELEVATION, 0.0],
                heading: 0.0,
                carrying: false,
                locomotion: LocomotionMode::Walk,
                energy: 0.0,
                max_energy: 0.0,
            },
            objective: None,
            gps: None,
            progression: ProgressionSummary::default(),
            events: Vec::new(),
        }
    }
}

/// Owns the world and advances it once per rendered frame
pub struct SimulationLoop {
    config: SimConfig,
    state: SimState,
    rng: Box<dyn RandomSource>,
    input: PlayerInput,
    bus: EventBus,
    snapshot: FrameSnapshot,
}

impl std::fmt::Debug for SimulationLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationLoop")
            .field("tick", &self.state.tick)
            .field("bus", &self.bus)
            .finish()
    }
}

impl SimulationLoop {
    /// Build a session. Invalid configs fall back to the defaults.
    pub fn new(config: SimConfig, rng: impl RandomSource + 'static) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("{}, using default simulation config", err);
                SimConfig::default()
            }
        };
        let mut rng: Box<dyn RandomSource> = Box::new(rng);
        let mut state = SimState::new(&config, rng.as_mut());
        state.director.start(state.courier.position, 0.0, rng.as_mut());
        log::info!(
            "Simulation started: {} vehicles, {} pedestrians, {} signals",
            state.actors.vehicles.len(),
            state.actors.pedestrians.len(),
            state.lights.lights().len()
        );

        let mut sim = Self {
            config,
            state,
            rng,
            input: PlayerInput::default(),
            bus: EventBus::new(),
            snapshot: FrameSnapshot::default(),
        };
        sim.rebuild_snapshot();
        sim
    }

    /// Resume progression handed back by the persistence collaborator
    pub fn with_progression(mut self, progression: ProgressionState) -> Self {
        self.state.progression = ProgressionTracker::restore(progression, self.config.progression);
        self.state.courier.energy = Courier::max_energy(self.state.progression.skills());
        self.rebuild_snapshot();
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn snapshot(&self) -> &FrameSnapshot {
        &self.snapshot
    }

    /// Input for the next tick
    pub fn set_player_input(&mut self, input: PlayerInput) {
        self.input = input;
    }

    /// Teleport the courier (host-driven placement); travel is not counted
    pub fn set_player_position(&mut self, position: Vec2) {
        if !position.is_finite() {
            log::warn!("Ignoring non-finite player position {:?}", position);
            return;
        }
        let bound = Vec2::splat(self.config.world.half_extent);
        self.state.courier.position = position.clamp(-bound, bound);
    }

    /// Replace the current objective with a pickup at `position`
    pub fn issue_pickup_at(&mut self, position: Vec2) {
        self.state.director.issue_pickup_at(position, self.state.elapsed);
        self.state.courier.carrying = false;
        self.rebuild_snapshot();
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn spend_skill_point(&mut self, skill: SkillKind) -> Result<u8, SkillError> {
        let tier = self.state.progression.spend_skill_point(skill)?;
        log::info!("Skill {} upgraded to tier {}", skill.as_str(), tier);
        self.rebuild_snapshot();
        Ok(tier)
    }

    /// Clamp a host frame delta: NaN/negative → 0, stalls → `max_frame_delta`
    pub fn clamp_delta(&self, dt: f32) -> f32 {
        sanitize_delta(dt).min(self.config.max_frame_delta)
    }

    /// Advance one frame
    pub fn tick(&mut self, dt: f32) -> &FrameSnapshot {
        let dt = self.clamp_delta(dt);
        let mut events = std::mem::take(&mut self.snapshot.events);
        events.clear();

        let state = &mut self.state;
        state.tick += 1;
        state.elapsed += dt as f64;

        state.clock.advance(dt);
        state.lights.tick(dt);

        let skills = *state.progression.skills();
        let travelled =
            state
                .courier
                .apply_input(&self.input, dt, &skills, self.config.world.half_extent);
        let player = state.courier.position;

        for signal in state.actors.tick(dt, player, &state.lights) {
            match signal {
                ActorSignal::VehicleStoppedNearPlayer {
                    vehicle_id,
                    position,
                } => events.push(GameEvent::VehicleStoppedNearPlayer {
                    vehicle_id,
                    position,
                }),
            }
        }

        state.director.record_travel(travelled);
        state.director.begin_frame();
        let outcome = state.director.check_proximity(
            player,
            state.elapsed,
            state.clock.lighting(),
            skills.tier(SkillKind::Reputation),
            self.rng.as_mut(),
        );
        match outcome {
            Some(DeliveryOutcome::PickedUp { position }) => {
                events.push(GameEvent::Pickup { position });
            }
            Some(DeliveryOutcome::Delivered {
                reward,
                elapsed_seconds,
                chain,
                ..
            }) => {
                events.push(GameEvent::Delivery {
                    reward,
                    elapsed_seconds,
                    chain,
                });
                for level_up in state.progression.record_delivery(reward) {
                    events.push(GameEvent::LevelUp {
                        level: level_up.level,
                        skill_points: level_up.skill_points,
                    });
                }
            }
            None => {}
        }
        state.courier.carrying = state.director.carrying();

        self.bus.publish(&events);
        self.snapshot.events = events;
        self.rebuild_snapshot();
        &self.snapshot
    }

    /// Rewrite the snapshot in place, reusing its buffers
    fn rebuild_snapshot(&mut self) {
        let state = &self.state;
        let snap = &mut self.snapshot;

        snap.tick = state.tick;
        snap.elapsed = state.elapsed;
        snap.hour = state.clock.hour();
        snap.lighting = state.clock.lighting();
        snap.is_daytime = state.clock.is_daytime();
        snap.ambient_tint = state.clock.ambient_tint();

        snap.vehicles.clear();
        snap.vehicles
            .extend(state.actors.vehicles.iter().map(|v| ActorSnapshot {
                id: v.id,
                position: ground_to_world(v.motion.position, VEHICLE_ELEVATION),
                rotation: v.motion.heading(),
                color_index: v.color_index,
            }));

        snap.pedestrians.clear();
        snap.pedestrians
            .extend(state.actors.pedestrians.iter().map(|p| ActorSnapshot {
                id: p.id,
                position: ground_to_world(p.motion.position, PEDESTRIAN_ELEVATION),
                rotation: p.motion.heading(),
                color_index: 0,
            }));

        snap.lights.clear();
        snap.lights
            .extend(state.lights.lights().iter().map(|l| LightSnapshot {
                id: l.id,
                position: ground_to_world(l.position, SIGNAL_ELEVATION),
                axis: l.axis,
                phase: l.phase,
            }));

        let skills = state.progression.skills();
        let courier = &state.courier;
        snap.courier = CourierSnapshot {
            position: ground_to_world(courier.position, COURIER_ELEVATION),
            heading: courier.heading,
            carrying: courier.carrying,
            locomotion: courier.locomotion,
            energy: courier.energy,
            max_energy: Courier::max_energy(skills),
        };

        snap.objective = state.director.active().map(|point| ObjectiveSnapshot {
            id: point.id,
            position: ground_to_world(point.position, 0.0),
            kind: point.kind,
            stage: state.director.stage(),
            reward_estimate: point.reward_estimate,
        });

        snap.gps = match state.director.active() {
            Some(point) if skills.tier(SkillKind::Gps) > 0 => {
                let offset = point.position - courier.position;
                Some(GpsHint {
                    bearing: offset.y.atan2(offset.x),
                    distance: offset.length(),
                })
            }
            _ => None,
        };

        let progression = state.progression.state();
        snap.progression = ProgressionSummary {
            level: progression.level,
            experience: progression.experience,
            experience_to_next: state.progression.experience_to_next_level(),
            skill_points: progression.skill_points,
            total_earnings: progression.total_earnings,
            deliveries: progression.deliveries,
            chain: state.director.chain(),
        };
    }
}
