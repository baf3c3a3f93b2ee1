//! Glide controller
//!
//! The stateful half of the engine. Each sample it turns the incoming pitch
//! and gate into a pressed chord, decides whether this is an attack or a
//! rollover, and produces the interpolated pitch of every voice.

use log::debug;

use super::chord::{build_chord, Chord};
use super::easing::ease;
use super::gate::GateTrigger;
use super::params::{Input, Params};
use super::scale::{voltage_to_semitone, ScaleDegree};
use super::voice_leading::jumble_chord;
use crate::MAX_VOICES;

/// Pitch movement (in volts) that counts as a rollover: half a semitone
pub const ROLLOVER_THRESHOLD: f32 = 0.5 / 12.0;

/// A glide that is interrupted by another rollover restarts at this fraction
/// of the configured glide time
const REGLIDE_DIVISOR: f32 = 2.0;

/// Endpoints and progress of the current glide
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlideState {
    /// Chord the glide starts from; the sounding chord while idle
    pub from: Chord,
    /// Chord the glide ends on
    pub to: Chord,
    /// Samples since the glide started
    pub elapsed: u32,
    /// Glide length in samples, 0 while idle
    pub target: u32,
}

impl Default for GlideState {
    fn default() -> Self {
        Self::idle(Chord::EMPTY)
    }
}

impl GlideState {
    /// Hold `chord` with no glide
    pub fn idle(chord: Chord) -> Self {
        Self {
            from: chord,
            to: chord,
            elapsed: 0,
            target: 0,
        }
    }

    pub fn is_gliding(&self) -> bool {
        self.target > 0
    }

    /// Linear progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.target == 0 {
            0.0
        } else {
            self.elapsed as f32 / self.target as f32
        }
    }

    /// Pitches at the current progress under the given easing sharpness
    pub fn position(&self, sharpness: f32) -> Chord {
        if !self.is_gliding() {
            return self.from;
        }
        Chord::blend(&self.from, &self.to, ease(self.progress(), sharpness))
    }
}

/// One sample of engine output
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pitch: Chord,
    gates: [f32; MAX_VOICES],
    /// Rollover indicator brightness in `[0, 1]`, 0 while idle
    pub light: f32,
}

impl Frame {
    fn new(pitch: Chord, gate: f32, light: f32) -> Self {
        let mut gates = [0.0; MAX_VOICES];
        gates[..pitch.len()].fill(gate);
        Self { pitch, gates, light }
    }

    /// Pitch voltage per voice
    pub fn pitch_out(&self) -> &[f32] {
        self.pitch.as_slice()
    }

    /// Gate voltage per voice
    pub fn gate_out(&self) -> &[f32] {
        &self.gates[..self.pitch.len()]
    }

    pub fn chord(&self) -> &Chord {
        &self.pitch
    }

    pub fn voices(&self) -> usize {
        self.pitch.len()
    }
}

/// What the current sample's input amounts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Event {
    Attack,
    Rollover,
    Hold,
}

/// Mono pitch/gate to polyphonic chord engine
#[derive(Clone, Debug, Default)]
pub struct ChordRollover {
    glide: GlideState,
    trigger: GateTrigger,
    /// Root of the last in-key press
    latched: Option<ScaleDegree>,
    /// Gate output is muted after an out-of-key press
    suppressed: bool,
    last_pitch: Option<f32>,
}

impl ChordRollover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all state, as at startup
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn glide(&self) -> &GlideState {
        &self.glide
    }

    pub fn latched_degree(&self) -> Option<ScaleDegree> {
        self.latched
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Run one sample
    pub fn process(&mut self, params: &Params, input: &Input) -> Frame {
        assert!(
            input.sample_seconds > 0.0,
            "sample length must be positive (got {})",
            input.sample_seconds
        );

        let scale = params.scale();
        let (degree, in_key) = scale.semitone_to_degree(voltage_to_semitone(input.pitch));
        // Out-of-key presses keep the last in-key root; before any in-key
        // press they fall back to the degree just below
        let root = if in_key {
            degree
        } else {
            self.latched.unwrap_or(degree)
        };
        let pressed = build_chord(root, &scale, params.voices);

        let gate_edge = self.trigger.process(input.gate);
        // Also true on the very first sample, when nothing is sounding yet
        let size_changed = params.voices.get() != self.glide.from.len();
        let pitch_moved = self
            .last_pitch
            .map_or(false, |last| (input.pitch - last).abs() > ROLLOVER_THRESHOLD);
        self.last_pitch = Some(input.pitch);

        let event = if gate_edge || size_changed {
            Event::Attack
        } else if pitch_moved {
            Event::Rollover
        } else {
            Event::Hold
        };

        let pitch = match event {
            Event::Attack => {
                self.press(root, in_key);
                self.attack(pressed)
            }
            Event::Rollover => {
                self.press(root, in_key);
                if in_key {
                    self.rollover(pressed, params, input.sample_seconds)
                } else {
                    self.advance(params.sharpness)
                }
            }
            Event::Hold => self.advance(params.sharpness),
        };

        let gate = if self.suppressed { 0.0 } else { input.gate };
        let light = if self.glide.is_gliding() {
            1.0 - self.glide.progress()
        } else {
            0.0
        };

        Frame::new(pitch, gate, light)
    }

    fn press(&mut self, root: ScaleDegree, in_key: bool) {
        if in_key {
            if self.suppressed {
                debug!("in-key press at degree {}, gate restored", root);
            }
            self.latched = Some(root);
            self.suppressed = false;
        } else {
            if !self.suppressed {
                debug!("out-of-key press, holding degree {} with gate muted", root);
            }
            self.suppressed = true;
        }
    }

    fn attack(&mut self, pressed: Chord) -> Chord {
        if self.glide.is_gliding() {
            debug!(
                "attack aborts glide at {}/{} samples",
                self.glide.elapsed, self.glide.target
            );
        }
        debug!("attack {:?}", pressed);
        self.glide = GlideState::idle(pressed);
        pressed
    }

    fn rollover(&mut self, pressed: Chord, params: &Params, sample_seconds: f32) -> Chord {
        let (from, target) = if self.glide.is_gliding() {
            (
                self.glide.position(params.sharpness),
                params.glide_samples(sample_seconds, REGLIDE_DIVISOR),
            )
        } else {
            (self.glide.from, params.glide_samples(sample_seconds, 1.0))
        };

        let to = jumble_chord(&pressed, &from, params.style);
        debug!(
            "rollover {:?} -> {:?} over {} samples{}",
            from,
            to,
            target,
            if self.glide.is_gliding() { " (re-glide)" } else { "" }
        );

        if target == 0 {
            self.glide = GlideState::idle(to.sorted());
            return to;
        }

        self.glide = GlideState {
            from,
            to,
            elapsed: 0,
            target,
        };
        from
    }

    fn advance(&mut self, sharpness: f32) -> Chord {
        if !self.glide.is_gliding() {
            return self.glide.from;
        }

        self.glide.elapsed += 1;
        let pitch = self.glide.position(sharpness);
        if self.glide.elapsed >= self.glide.target {
            debug!("glide complete {:?}", self.glide.to);
            self.glide = GlideState::idle(self.glide.to.sorted());
        }
        pitch
    }
}
