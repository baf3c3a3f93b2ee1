//! Chord Rollover: a diatonic chord engine for a single pitch/gate voice.
//!
//! A monophonic 1 V/octave pitch and a gate come in once per sample; a
//! polyphonic chord built on the pressed scale degree comes out. Changing the
//! pitch without a new gate ("rolling over" to another key) glides every voice
//! to the new chord, with the voices reassigned so that they move in a
//! jumbled or a smooth way.
//!
//! The [`rollover`] module is the real-time engine. [`performance`],
//! [`render`] and [`wav`] form an offline host that plays scripted
//! performances through it.

#![warn(missing_debug_implementations)]

pub mod performance;
pub mod render;
pub mod rollover;
pub mod wav;

/// Most voices a chord can have
pub const MAX_VOICES: usize = 7;

/// Sample rate used by the offline renderer unless told otherwise (in Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

pub use performance::Performance;
pub use rollover::{ChordRollover, Frame, Input, Params};
