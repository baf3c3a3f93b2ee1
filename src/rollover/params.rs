//! Per-sample configuration and input

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::chord::VoiceCount;
use super::scale::{Key, Mode, Scale};
use super::voice_leading::LeadingStyle;

/// Control-rate settings, read by the engine at the start of every sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Tonic pitch class
    pub key: Key,

    /// Diatonic mode
    pub mode: Mode,

    /// Number of chord voices
    pub voices: VoiceCount,

    /// Rollover glide time in seconds
    #[serde(rename = "glide")]
    pub glide_seconds: f32,

    /// Easing curve sharpness, 1.0 for linear
    pub sharpness: f32,

    /// Voice-leading objective
    pub style: LeadingStyle,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            key: Key::default(),
            mode: Mode::Ionian,
            voices: VoiceCount::default(),
            glide_seconds: 0.25,
            sharpness: 3.0,
            style: LeadingStyle::Jumble,
        }
    }
}

impl Params {
    /// Check the values the type system cannot
    pub fn validate(&self) -> Result<()> {
        if !self.glide_seconds.is_finite() || self.glide_seconds < 0.0 {
            bail!("glide time must be a finite number of seconds >= 0 (got {})", self.glide_seconds);
        }
        if !self.sharpness.is_finite() || self.sharpness <= 0.0 {
            bail!("easing sharpness must be finite and > 0 (got {})", self.sharpness);
        }
        Ok(())
    }

    pub fn scale(&self) -> Scale {
        Scale::new(self.key, self.mode)
    }

    /// Glide length in samples, optionally shortened by `divisor`
    pub fn glide_samples(&self, sample_seconds: f32, divisor: f32) -> u32 {
        (self.glide_seconds.max(0.0) / divisor / sample_seconds).round() as u32
    }
}

/// One sample of host input
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Input {
    /// 1 V/octave pitch, 0 V at C4
    pub pitch: f32,

    /// Gate voltage, high at 1 V and above
    pub gate: f32,

    /// Length of one sample in seconds
    pub sample_seconds: f32,
}

impl Input {
    pub fn new(pitch: f32, gate: f32, sample_rate: f32) -> Self {
        Self {
            pitch,
            gate,
            sample_seconds: 1.0 / sample_rate,
        }
    }
}
