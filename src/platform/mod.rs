//! Platform abstraction layer
//!
//! Maps browser input to simulation commands. Storage lives in
//! [`crate::persistence`].

pub mod input;

pub use input::{KeyAction, KeyState, autopilot_input};
