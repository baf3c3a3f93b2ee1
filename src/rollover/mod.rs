//! Chord rollover engine
//!
//! Leaves first: [`scale`] maps pitches to diatonic degrees, [`chord`] stacks
//! degrees into chords, [`voice_leading`] decides which voice takes which new
//! pitch, and [`glide`] runs the per-sample state machine that ties them
//! together.

pub mod chord;
pub mod easing;
pub mod gate;
pub mod glide;
pub mod params;
pub mod scale;
pub mod voice_leading;

pub use chord::{build_chord, Chord, VoiceCount};
pub use glide::{ChordRollover, Frame, GlideState};
pub use params::{Input, Params};
pub use scale::{Key, Mode, Scale, ScaleDegree};
pub use voice_leading::{jumble_chord, LeadingStyle};
