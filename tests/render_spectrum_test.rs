//! Renders performances to audio and checks the chord tones with an FFT

use anyhow::Result;
use num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

use chord_rollover::render::{render_frames, voice_frames, ZERO_VOLT_HZ};
use chord_rollover::Performance;

const SAMPLE_RATE: u32 = 48000;
const FFT_SIZE: usize = 32768;

/// Magnitude spectrum of the last FFT_SIZE samples, Hann windowed
fn spectrum(audio: &[f32]) -> Vec<f32> {
    assert!(audio.len() >= FFT_SIZE);
    let tail = &audio[audio.len() - FFT_SIZE..];

    let mut buffer: Vec<Complex<f32>> = tail
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let window = 0.5 - 0.5 * (2.0 * PI * i as f32 / FFT_SIZE as f32).cos();
            Complex::new(s * window, 0.0)
        })
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    planner.plan_fft_forward(FFT_SIZE).process(&mut buffer);

    buffer[..FFT_SIZE / 2].iter().map(|c| c.norm()).collect()
}

/// Strongest magnitude within a few hertz of `freq`
fn energy_near(spectrum: &[f32], freq: f32) -> f32 {
    let bin_hz = SAMPLE_RATE as f32 / FFT_SIZE as f32;
    let lo = ((freq - 4.0) / bin_hz).floor() as usize;
    let hi = ((freq + 4.0) / bin_hz).ceil() as usize;
    spectrum[lo..=hi].iter().copied().fold(0.0, f32::max)
}

fn note_hz(semitone: i32) -> f32 {
    ZERO_VOLT_HZ * (semitone as f32 / 12.0).exp2()
}

fn render(toml: &str) -> Result<Vec<f32>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let performance = Performance::from_toml_str(toml)?;
    let frames = render_frames(&performance);
    Ok(voice_frames(&frames, performance.sample_rate))
}

#[test]
fn test_held_triad_spectrum() -> Result<()> {
    let audio = render(
        r#"
        sample_rate = 48000
        duration = 1.0

        [params]
        voices = 3

        [[events]]
        at = 0.0
        pitch = "C4"
        gate = true
        "#,
    )?;
    let spectrum = spectrum(&audio);

    let chord_tones = [note_hz(0), note_hz(4), note_hz(7)];
    let weakest = chord_tones
        .iter()
        .map(|&f| energy_near(&spectrum, f))
        .fold(f32::INFINITY, f32::min);

    for absent in [note_hz(2), note_hz(5), note_hz(9)] {
        let energy = energy_near(&spectrum, absent);
        assert!(
            energy < weakest * 0.05,
            "unexpected energy {} at {} Hz (chord tones >= {})",
            energy,
            absent,
            weakest
        );
    }

    Ok(())
}

#[test]
fn test_rollover_lands_on_new_chord() -> Result<()> {
    let audio = render(
        r#"
        sample_rate = 48000
        duration = 1.2

        [params]
        voices = 3
        glide = 0.1
        style = "jumble"

        [[events]]
        at = 0.0
        pitch = "C4"
        gate = true

        [[events]]
        at = 0.2
        pitch = "F4"
        "#,
    )?;
    assert_eq!(audio.len(), (1.2 * SAMPLE_RATE as f32).round() as usize);
    let spectrum = spectrum(&audio);

    // F A C above F4
    let chord_tones = [note_hz(5), note_hz(9), note_hz(12)];
    let weakest = chord_tones
        .iter()
        .map(|&f| energy_near(&spectrum, f))
        .fold(f32::INFINITY, f32::min);

    // The old chord's E and G are gone
    for absent in [note_hz(4), note_hz(7)] {
        let energy = energy_near(&spectrum, absent);
        assert!(energy < weakest * 0.05, "{} Hz still sounding", absent);
    }

    Ok(())
}

#[test]
fn test_out_of_key_press_is_silent() -> Result<()> {
    let audio = render(
        r#"
        sample_rate = 48000
        duration = 0.5

        [[events]]
        at = 0.0
        pitch = "C#4"
        gate = true
        "#,
    )?;
    assert!(audio.iter().all(|s| *s == 0.0));
    Ok(())
}
