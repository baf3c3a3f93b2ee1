//! Voice-leading optimizer
//!
//! When the chord changes during a rollover, every output voice has to pick
//! one of the new pitches. The optimizer tries every assignment of the target
//! pitches to voices and keeps the one with the best [`Score`].
//!
//! The search is exhaustive. With at most seven voices that is 5040
//! candidates, and it only runs when a rollover starts, not per sample.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use log::trace;
use serde::{Deserialize, Serialize};

use super::chord::Chord;
use crate::MAX_VOICES;

/// Voices moving less than this (1/60 V, a fifth of a semitone) count as static
pub const SAME_NOTE_THRESHOLD: f32 = 1.0 / 60.0;

/// What the optimizer aims for when reassigning voices
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadingStyle {
    /// Voices move by as different amounts as possible
    #[default]
    Jumble,
    /// Voices move together by similar amounts
    Smooth,
}

impl LeadingStyle {
    fn sign(self) -> f32 {
        match self {
            LeadingStyle::Jumble => 1.0,
            LeadingStyle::Smooth => -1.0,
        }
    }
}

impl FromStr for LeadingStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jumble" => Ok(LeadingStyle::Jumble),
            "smooth" => Ok(LeadingStyle::Smooth),
            other => bail!("unknown leading style '{}'", other),
        }
    }
}

impl fmt::Display for LeadingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadingStyle::Jumble => f.write_str("jumble"),
            LeadingStyle::Smooth => f.write_str("smooth"),
        }
    }
}

/// Quality of one voice assignment. Fields compare in declaration order, and
/// the greater score wins.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Score {
    /// 1.0 when no voice stays on its note, else 0.0
    pub all_moving: f32,
    /// Sample standard deviation of the per-voice motion, negated for smooth
    pub spread: f32,
    /// Smallest absolute per-voice motion, negated for smooth
    pub least_motion: f32,
}

/// Score the assignment of `candidate` pitches to the voices currently at `current`
pub fn score(candidate: &[f32], current: &[f32], style: LeadingStyle) -> Score {
    assert_eq!(
        candidate.len(),
        current.len(),
        "voice leading between chords of different sizes"
    );
    assert!(!candidate.is_empty(), "voice leading of an empty chord");

    let n = candidate.len();
    let mut deltas = [0.0f32; MAX_VOICES];
    for (delta, (&to, &from)) in deltas.iter_mut().zip(candidate.iter().zip(current)) {
        *delta = to - from;
    }
    let deltas = &deltas[..n];

    let all_moving = if deltas.iter().all(|d| d.abs() >= SAME_NOTE_THRESHOLD) {
        1.0
    } else {
        0.0
    };

    let spread = if n > 1 {
        let mean = deltas.iter().sum::<f32>() / n as f32;
        let variance = deltas.iter().map(|d| (d - mean) * (d - mean)).sum::<f32>() / (n - 1) as f32;
        variance.sqrt()
    } else {
        0.0
    };

    let least_motion = deltas.iter().map(|d| d.abs()).fold(f32::INFINITY, f32::min);

    Score {
        all_moving,
        spread: style.sign() * spread,
        least_motion: style.sign() * least_motion,
    }
}

/// Rearrange `values` into the next permutation in lexicographic order.
///
/// Returns `false` and wraps around to the first (ascending) permutation once
/// the last one has been passed. Equal values yield each distinct ordering once.
pub fn next_permutation(values: &mut [f32]) -> bool {
    if values.len() < 2 {
        return false;
    }

    let mut pivot = values.len() - 1;
    while pivot > 0 && values[pivot - 1] >= values[pivot] {
        pivot -= 1;
    }
    if pivot == 0 {
        values.reverse();
        return false;
    }

    let mut successor = values.len() - 1;
    while values[successor] <= values[pivot - 1] {
        successor -= 1;
    }
    values.swap(pivot - 1, successor);
    values[pivot..].reverse();
    true
}

/// Assign the pitches of `target` to voices so that moving from `current`
/// scores best under `style`.
///
/// Candidates are visited in lexicographic order starting from the sorted
/// target, and only a strictly better score replaces the best so far, so the
/// earliest candidate wins a tie.
pub fn jumble_chord(target: &Chord, current: &Chord, style: LeadingStyle) -> Chord {
    assert_eq!(
        target.len(),
        current.len(),
        "voice leading between chords of different sizes"
    );
    assert!(!target.is_empty(), "voice leading of an empty chord");

    let mut candidate = target.sorted();
    let mut best = candidate;
    let mut best_score = score(candidate.as_slice(), current.as_slice(), style);
    let mut visited = 1;

    while next_permutation(candidate.as_mut_slice()) {
        visited += 1;
        let candidate_score = score(candidate.as_slice(), current.as_slice(), style);
        if candidate_score > best_score {
            best = candidate;
            best_score = candidate_score;
        }
    }

    trace!(
        "voice leading {:?} -> {:?} ({}): best {:?} of {} candidates, {:?}",
        current,
        target,
        style,
        best,
        visited,
        best_score
    );

    best
}
