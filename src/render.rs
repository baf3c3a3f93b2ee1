//! Offline host
//!
//! Plays a [`Performance`] through the engine one sample at a time, the way a
//! real-time host would, and turns the resulting frames into audio.

use std::f32::consts::TAU;

use log::{debug, info};

use crate::performance::Performance;
use crate::rollover::{ChordRollover, Frame, Input};
use crate::MAX_VOICES;

/// Gate input voltage while a key is held
pub const GATE_VOLTAGE: f32 = 10.0;

/// Frequency at 0 V (C4, in Hz)
pub const ZERO_VOLT_HZ: f32 = 261.6256;

/// Gate smoothing time constant for the sine voices (seconds)
const GATE_SMOOTHING_SECONDS: f32 = 0.005;

/// Run the engine over the whole performance, one frame per sample.
///
/// A `gate = true` event arriving while the gate is already held drops the
/// gate for that one sample so the engine sees a fresh press. Any pitch the
/// event carries is held back until the gate rises again, so the dropped
/// sample cannot read as a rollover.
pub fn render_frames(performance: &Performance) -> Vec<Frame> {
    let sample_rate = performance.sample_rate;
    let total = performance.total_samples();
    info!(
        "rendering {} samples at {} Hz ({} events)",
        total,
        sample_rate,
        performance.events.len()
    );

    let mut engine = ChordRollover::new();
    let mut params = performance.params;
    let mut pitch = 0.0;
    let mut sent_pitch = 0.0;
    let mut gate = false;
    let mut events = performance.events.iter().peekable();
    let mut frames = Vec::with_capacity(total);

    for n in 0..total {
        let mut retrigger = false;
        while let Some(event) = events.next_if(|event| event.sample_index(sample_rate) <= n) {
            debug!("sample {}: {:?}", n, event);
            event.apply(&mut params);
            if let Some(p) = event.pitch {
                pitch = p.0;
            }
            if let Some(g) = event.gate {
                retrigger |= g && gate;
                gate = g;
            }
        }

        let gate_voltage = if gate && !retrigger { GATE_VOLTAGE } else { 0.0 };
        if !retrigger {
            sent_pitch = pitch;
        }
        let input = Input::new(sent_pitch, gate_voltage, sample_rate as f32);
        frames.push(engine.process(&params, &input));
    }

    info!("rendered {} frames", frames.len());
    frames
}

/// Sine oscillator bank that sounds engine frames
#[derive(Clone, Debug)]
pub struct Voicer {
    sample_rate: f32,
    phases: [f32; MAX_VOICES],
    levels: [f32; MAX_VOICES],
    smoothing: f32,
}

impl Voicer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phases: [0.0; MAX_VOICES],
            levels: [0.0; MAX_VOICES],
            smoothing: 1.0 - (-1.0 / (GATE_SMOOTHING_SECONDS * sample_rate)).exp(),
        }
    }

    /// Produce one mono sample for a frame
    pub fn process(&mut self, frame: &Frame) -> f32 {
        let voices = frame.voices();
        if voices == 0 {
            return 0.0;
        }

        let mut mix = 0.0;
        for (v, (&pitch, &gate)) in frame.pitch_out().iter().zip(frame.gate_out()).enumerate() {
            let target = (gate / GATE_VOLTAGE).clamp(0.0, 1.0);
            self.levels[v] += (target - self.levels[v]) * self.smoothing;

            let freq = ZERO_VOLT_HZ * pitch.exp2();
            self.phases[v] = (self.phases[v] + freq / self.sample_rate).fract();
            mix += (TAU * self.phases[v]).sin() * self.levels[v];
        }

        // Voices dropped from the chord come back in from silence
        for level in &mut self.levels[voices..] {
            *level = 0.0;
        }

        mix / voices as f32
    }
}

/// Sound a whole run of frames as mono audio
pub fn voice_frames(frames: &[Frame], sample_rate: u32) -> Vec<f32> {
    let mut voicer = Voicer::new(sample_rate as f32);
    frames.iter().map(|frame| voicer.process(frame)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::{Event, Pitch};

    fn event(at: f32, pitch: Option<f32>, gate: Option<bool>) -> Event {
        Event {
            at,
            pitch: pitch.map(Pitch),
            gate,
            ..Event::default()
        }
    }

    #[test]
    fn test_one_frame_per_sample() {
        let performance = Performance {
            sample_rate: 100,
            duration: Some(1.0),
            events: vec![event(0.0, Some(0.0), Some(true))],
            ..Performance::default()
        };
        let frames = render_frames(&performance);
        assert_eq!(frames.len(), 100);
        assert!(frames.iter().all(|f| f.gate_out().iter().all(|&g| g == GATE_VOLTAGE)));
    }

    #[test]
    fn test_retrigger_drops_gate_for_one_sample() {
        let performance = Performance {
            sample_rate: 100,
            duration: Some(1.0),
            events: vec![
                event(0.0, Some(0.0), Some(true)),
                event(0.5, Some(4.0 / 12.0), Some(true)),
            ],
            ..Performance::default()
        };
        let frames = render_frames(&performance);
        let c_major = [0.0, 4.0 / 12.0, 7.0 / 12.0];
        let e_minor = [4.0 / 12.0, 7.0 / 12.0, 11.0 / 12.0];

        // The dropped sample still holds the old chord
        assert_eq!(frames[49].pitch_out(), &c_major);
        assert_eq!(frames[50].gate_out()[0], 0.0);
        assert_eq!(frames[50].pitch_out(), &c_major);

        // The new pitch arrives with the gate, as an attack
        assert_eq!(frames[51].gate_out()[0], GATE_VOLTAGE);
        assert_eq!(frames[51].pitch_out(), &e_minor);
        assert!(frames.iter().all(|f| f.light == 0.0));
    }

    #[test]
    fn test_retrigger_on_same_pitch() {
        let performance = Performance {
            sample_rate: 100,
            duration: Some(1.0),
            events: vec![
                event(0.0, Some(0.0), Some(true)),
                event(0.5, None, Some(true)),
            ],
            ..Performance::default()
        };
        let frames = render_frames(&performance);
        assert_eq!(frames[50].gate_out()[0], 0.0);
        assert_eq!(frames[51].gate_out()[0], GATE_VOLTAGE);
        assert!(frames.iter().all(|f| f.pitch_out() == frames[0].pitch_out()));
    }

    #[test]
    fn test_silent_without_gate() {
        let performance = Performance {
            sample_rate: 1000,
            duration: Some(0.1),
            ..Performance::default()
        };
        let audio = voice_frames(&render_frames(&performance), 1000);
        assert_eq!(audio.len(), 100);
        assert!(audio.iter().all(|s| *s == 0.0));
    }
}
