//! Scripted performances for the offline host
//!
//! A performance is a TOML file: engine settings plus a timeline of pitch,
//! gate and parameter changes.
//!
//! ```toml
//! sample_rate = 48000
//! duration = 2.0
//!
//! [params]
//! key = "D"
//! mode = "dorian"
//! voices = 4
//! glide = 0.3
//!
//! [[events]]
//! at = 0.0
//! pitch = "D4"
//! gate = true
//!
//! [[events]]
//! at = 0.5
//! pitch = "F4"
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::rollover::scale::{parse_note, semitone_to_voltage, Key, Mode};
use crate::rollover::{LeadingStyle, Params, VoiceCount};
use crate::DEFAULT_SAMPLE_RATE;

/// Render length after the last event when no duration is given (seconds)
const DEFAULT_TAIL_SECONDS: f32 = 1.0;

/// Pitch voltage, written either as volts or as a note name (C4 = 0 V)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "PitchRepr")]
pub struct Pitch(pub f32);

#[derive(Deserialize)]
#[serde(untagged)]
enum PitchRepr {
    Volts(f32),
    Note(String),
}

impl TryFrom<PitchRepr> for Pitch {
    type Error = anyhow::Error;

    fn try_from(repr: PitchRepr) -> Result<Self> {
        match repr {
            PitchRepr::Volts(volts) if volts.is_finite() => Ok(Pitch(volts)),
            PitchRepr::Volts(volts) => bail!("pitch must be finite (got {})", volts),
            PitchRepr::Note(name) => Ok(Pitch(semitone_to_voltage(parse_note(&name)?))),
        }
    }
}

/// A change applied at one moment of the performance
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Event {
    /// Time in seconds from the start
    pub at: f32,
    pub pitch: Option<Pitch>,
    pub gate: Option<bool>,
    pub key: Option<Key>,
    pub mode: Option<Mode>,
    pub voices: Option<VoiceCount>,
    pub glide: Option<f32>,
    pub sharpness: Option<f32>,
    pub style: Option<LeadingStyle>,
}

impl Event {
    /// First sample at which the event takes effect
    pub fn sample_index(&self, sample_rate: u32) -> usize {
        (self.at * sample_rate as f32).round() as usize
    }

    /// Apply the parameter changes this event carries
    pub fn apply(&self, params: &mut Params) {
        if let Some(key) = self.key {
            params.key = key;
        }
        if let Some(mode) = self.mode {
            params.mode = mode;
        }
        if let Some(voices) = self.voices {
            params.voices = voices;
        }
        if let Some(glide) = self.glide {
            params.glide_seconds = glide;
        }
        if let Some(sharpness) = self.sharpness {
            params.sharpness = sharpness;
        }
        if let Some(style) = self.style {
            params.style = style;
        }
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

/// Settings and timeline of one offline render
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Performance {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Render length in seconds; defaults to one second past the last event
    #[serde(default)]
    pub duration: Option<f32>,

    #[serde(default)]
    pub params: Params,

    #[serde(default)]
    pub events: Vec<Event>,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            duration: None,
            params: Params::default(),
            events: Vec::new(),
        }
    }
}

impl Performance {
    /// Parse and validate a performance from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let performance: Performance = toml::from_str(text).context("invalid performance")?;
        performance.validate()?;
        Ok(performance)
    }

    /// Read, parse and validate a performance file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read performance '{}'", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in performance '{}'", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            bail!("sample rate must be positive");
        }
        self.params.validate().context("in [params]")?;

        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration < 0.0 {
                bail!("duration must be a finite number of seconds >= 0 (got {})", duration);
            }
        }

        let mut previous = 0.0f32;
        let mut params = self.params;
        for (i, event) in self.events.iter().enumerate() {
            if !event.at.is_finite() || event.at < previous {
                bail!(
                    "event {} at {}s is out of order (previous event at {}s)",
                    i,
                    event.at,
                    previous
                );
            }
            previous = event.at;

            event.apply(&mut params);
            params
                .validate()
                .with_context(|| format!("in event {} at {}s", i, event.at))?;
        }

        Ok(())
    }

    /// Render length in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.duration.unwrap_or_else(|| {
            self.events.last().map_or(0.0, |event| event.at) + DEFAULT_TAIL_SECONDS
        })
    }

    /// Render length in samples
    pub fn total_samples(&self) -> usize {
        (self.duration_seconds() * self.sample_rate as f32).round() as usize
    }
}
