#![allow(dead_code)]

use chord_rollover::rollover::scale::semitone_to_voltage;
use chord_rollover::rollover::{ChordRollover, Frame, Input, Params, VoiceCount};

pub const SAMPLE_RATE: f32 = 1000.0;
pub const GATE_ON: f32 = 10.0;

pub fn params(voices: usize, glide_seconds: f32) -> Params {
    Params {
        voices: VoiceCount::new(voices).unwrap(),
        glide_seconds,
        ..Params::default()
    }
}

/// Drives an engine with semitone pitches at [`SAMPLE_RATE`]
pub struct Host {
    pub engine: ChordRollover,
    pub params: Params,
}

impl Host {
    pub fn new(params: Params) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            engine: ChordRollover::new(),
            params,
        }
    }

    pub fn step(&mut self, semitone: i32, gate: f32) -> Frame {
        self.step_volts(semitone_to_voltage(semitone), gate)
    }

    pub fn step_volts(&mut self, pitch: f32, gate: f32) -> Frame {
        self.engine
            .process(&self.params, &Input::new(pitch, gate, SAMPLE_RATE))
    }

    /// Release then press, returning the attack frame
    pub fn press(&mut self, semitone: i32) -> Frame {
        self.step(semitone, 0.0);
        self.step(semitone, GATE_ON)
    }
}

pub fn assert_close(a: &[f32], b: &[f32], tolerance: f32) {
    assert_eq!(a.len(), b.len(), "{:?} vs {:?}", a, b);
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() <= tolerance, "{:?} vs {:?}", a, b);
    }
}
