//! Audio cues for simulation events
//!
//! [`cue_for`] maps a [`GameEvent`] to a sound and a gain; it is pure so the
//! host logic is testable natively. Playback uses the Web Audio API with
//! procedurally generated tones (no sound files).

use glam::Vec2;

use crate::sim::events::GameEvent;

/// Horns further than this from the courier are inaudible
pub const HEARING_RANGE: f32 = 30.0;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Package collected
    Pickup,
    /// Package delivered
    Delivery,
    /// Delivery that extended a chain
    ChainDelivery,
    LevelUp,
    /// A car braked for the courier
    Horn,
}

/// A sound to play and how loud, relative to the effects volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundCue {
    pub effect: SoundEffect,
    pub gain: f32,
}

/// Linear distance falloff, 1.0 at the listener and 0.0 at [`HEARING_RANGE`]
pub fn spatial_gain(source: Vec2, listener: Vec2) -> f32 {
    let distance = source.distance(listener);
    if !distance.is_finite() {
        return 0.0;
    }
    (1.0 - distance / HEARING_RANGE).clamp(0.0, 1.0)
}

/// Cue for an event heard at `listener`, if audible
pub fn cue_for(event: &GameEvent, listener: Vec2) -> Option<SoundCue> {
    let cue = match *event {
        GameEvent::Pickup { .. } => SoundCue {
            effect: SoundEffect::Pickup,
            gain: 1.0,
        },
        GameEvent::Delivery { chain, .. } => SoundCue {
            effect: if chain > 1 {
                SoundEffect::ChainDelivery
            } else {
                SoundEffect::Delivery
            },
            gain: 1.0,
        },
        GameEvent::LevelUp { .. } => SoundCue {
            effect: SoundEffect::LevelUp,
            gain: 1.0,
        },
        GameEvent::VehicleStoppedNearPlayer { position, .. } => SoundCue {
            effect: SoundEffect::Horn,
            gain: spatial_gain(position, listener),
        },
    };
    (cue.gain > 0.0).then_some(cue)
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{SoundCue, SoundEffect};

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_sfx_volume(&mut self, vol: f32) {
            self.sfx_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * self.sfx_volume
            }
        }

        pub fn play(&self, cue: SoundCue) {
            let vol = self.effective_volume() * cue.gain;
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Browsers suspend the context until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue.effect {
                SoundEffect::Pickup => self.play_arpeggio(ctx, vol, &[600.0, 800.0, 1000.0], 0.08),
                SoundEffect::Delivery => self.play_arpeggio(ctx, vol, &[500.0, 750.0], 0.1),
                SoundEffect::ChainDelivery => {
                    self.play_arpeggio(ctx, vol, &[500.0, 630.0, 750.0, 1000.0], 0.07)
                }
                SoundEffect::LevelUp => {
                    self.play_arpeggio(ctx, vol, &[400.0, 500.0, 600.0, 800.0], 0.1)
                }
                SoundEffect::Horn => self.play_horn(ctx, vol),
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Rising notes, one every `step` seconds
        fn play_arpeggio(&self, ctx: &AudioContext, vol: f32, notes: &[f32], step: f64) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * step;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.25).ok();
                }
            }
        }

        /// Two-tone car horn
        fn play_horn(&self, ctx: &AudioContext, vol: f32) {
            for freq in [349.0, 440.0] {
                let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Square) else {
                    continue;
                };
                let t = ctx.current_time();
                gain.gain().set_value_at_time(vol * 0.12, t).ok();
                gain.gain().set_value_at_time(vol * 0.12, t + 0.25).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.35)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }
}
