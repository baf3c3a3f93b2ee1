//! Chord construction
//!
//! Chords are stacks of diatonic thirds above a root degree. A [`Chord`] is a
//! fixed-capacity list of pitch voltages so it can be copied around the
//! per-sample path without touching the heap.

use std::fmt;
use std::ops::Index;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::scale::{semitone_to_voltage, Scale, ScaleDegree};
use crate::MAX_VOICES;

/// Degree offsets above the root, one per voice. Each spans an odd number of
/// scale steps so successive voices sit roughly a third apart, spilling into
/// higher octaves for larger chords.
const THIRD_STACK: [i32; 8] = [0, 2, 4, 7, 9, 11, 14, 16];

/// Number of sounding voices, 1..=7
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VoiceCount(u8);

impl VoiceCount {
    pub fn new(voices: usize) -> Result<Self> {
        if voices == 0 || voices > MAX_VOICES {
            bail!("voice count must be in 1..={} (got {})", MAX_VOICES, voices);
        }
        Ok(Self(voices as u8))
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for VoiceCount {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for VoiceCount {
    type Error = anyhow::Error;

    fn try_from(voices: u8) -> Result<Self> {
        Self::new(voices as usize)
    }
}

impl From<VoiceCount> for u8 {
    fn from(voices: VoiceCount) -> u8 {
        voices.0
    }
}

/// Pitch voltages indexed by output voice
#[derive(Clone, Copy)]
pub struct Chord {
    pitches: [f32; MAX_VOICES],
    len: usize,
}

impl Chord {
    /// A chord with no voices
    pub const EMPTY: Chord = Chord {
        pitches: [0.0; MAX_VOICES],
        len: 0,
    };

    pub fn from_slice(pitches: &[f32]) -> Self {
        assert!(
            pitches.len() <= MAX_VOICES,
            "chord of {} voices exceeds {}",
            pitches.len(),
            MAX_VOICES
        );
        let mut chord = Self::EMPTY;
        chord.pitches[..pitches.len()].copy_from_slice(pitches);
        chord.len = pitches.len();
        chord
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.pitches[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.pitches[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.as_slice().iter()
    }

    /// Sort voices into ascending pitch order
    pub fn sort(&mut self) {
        self.as_mut_slice().sort_by(f32::total_cmp);
    }

    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    /// Per-voice blend: `amount` of `to` plus `1 - amount` of `from`
    pub fn blend(from: &Chord, to: &Chord, amount: f32) -> Chord {
        assert_eq!(from.len, to.len, "cannot blend chords of different sizes");
        let mut out = *from;
        for (o, (&a, &b)) in out
            .as_mut_slice()
            .iter_mut()
            .zip(from.iter().zip(to.iter()))
        {
            *o = amount * b + (1.0 - amount) * a;
        }
        out
    }

    /// Whether both chords hold the same pitches, ignoring voice order
    pub fn same_notes(&self, other: &Chord) -> bool {
        self.len == other.len && self.sorted().as_slice() == other.sorted().as_slice()
    }
}

impl PartialEq for Chord {
    fn eq(&self, other: &Chord) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Index<usize> for Chord {
    type Output = f32;

    fn index(&self, voice: usize) -> &f32 {
        &self.as_slice()[voice]
    }
}

impl fmt::Debug for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Stack `voices` thirds above `root` and render them as pitch voltages
pub fn build_chord(root: ScaleDegree, scale: &Scale, voices: VoiceCount) -> Chord {
    let mut chord = Chord::EMPTY;
    chord.len = voices.get();
    for (pitch, &offset) in chord.as_mut_slice().iter_mut().zip(THIRD_STACK.iter()) {
        let semitone = scale.degree_to_semitone(root.offset(offset));
        *pitch = semitone_to_voltage(semitone);
    }
    chord
}
