//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering and
//! platform dependencies:
//! - Time only advances through `SimulationLoop::tick`
//! - Randomness only through an injected `RandomSource`
//! - Stable iteration order (by entity ID)

pub mod actors;
pub mod clock;
pub mod courier;
pub mod delivery;
pub mod events;
pub mod progression;
pub mod random;
pub mod state;
pub mod tick;
pub mod traffic_light;

pub use actors::{ActorSignal, MoveAxis, Pedestrian, TrafficActors, Vehicle};
pub use clock::{Clock, LightingBucket};
pub use courier::{Courier, LocomotionMode, PlayerInput};
pub use delivery::{DeliveryDirector, DeliveryKind, DeliveryOutcome, ObjectiveStage, RewardTable};
pub use events::{EventBus, GameEvent, SubscriptionId};
pub use progression::{
    LevelUp, ProgressionCurve, ProgressionState, ProgressionTracker, SkillError, SkillKind,
    MAX_SKILL_TIER,
};
pub use random::{RandomSource, RngState};
pub use state::SimState;
pub use tick::{FrameSnapshot, SimulationLoop};
pub use traffic_light::{PhaseDurations, SignalAxis, SignalPhase, TrafficLightController};
