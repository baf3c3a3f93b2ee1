//! WAV and CSV output for rendered performances

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use hound::{WavSpec, WavWriter};
use log::info;

use crate::rollover::Frame;

/// Peak level rendered audio is normalized down to
const HEADROOM_PEAK: f32 = 0.8;

/// Encode mono audio as a 32-bit float WAV file in memory.
///
/// Audio louder than [`HEADROOM_PEAK`] is scaled down to it.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    let normalize_factor = if peak > HEADROOM_PEAK { HEADROOM_PEAK / peak } else { 1.0 };

    let wav_spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut wav = vec![];
    let mut cursor = std::io::Cursor::new(&mut wav);
    let mut wav_writer = WavWriter::new(&mut cursor, wav_spec).context("failed to start WAV")?;

    for sample in samples {
        wav_writer
            .write_sample(sample * normalize_factor)
            .context("failed to write WAV sample")?;
    }

    wav_writer.finalize().context("failed to finalize WAV")?;

    Ok(wav)
}

/// Write mono audio to a WAV file
pub fn write_wav(path: impl AsRef<Path>, samples: &[f32], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let wav = encode_wav(samples, sample_rate)?;
    std::fs::write(path, wav)
        .with_context(|| format!("failed to write WAV file '{}'", path.display()))?;
    info!("wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

/// Write frames as CSV: `sample,light,gate,pitch0,..`
///
/// The pitch columns cover the widest chord in the run; voices absent from a
/// frame are left empty.
pub fn write_trace(out: &mut impl Write, frames: &[Frame]) -> Result<()> {
    let width = frames.iter().map(Frame::voices).max().unwrap_or(0);

    write!(out, "sample,light,gate")?;
    for v in 0..width {
        write!(out, ",pitch{}", v)?;
    }
    writeln!(out)?;

    for (n, frame) in frames.iter().enumerate() {
        let gate = frame.gate_out().first().copied().unwrap_or(0.0);
        write!(out, "{},{},{}", n, frame.light, gate)?;
        for v in 0..width {
            match frame.pitch_out().get(v) {
                Some(pitch) => write!(out, ",{}", pitch)?,
                None => write!(out, ",")?,
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

/// Write the CSV trace of a run to a file
pub fn write_trace_file(path: impl AsRef<Path>, frames: &[Frame]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create trace file '{}'", path.display()))?;
    let mut out = BufWriter::new(file);
    write_trace(&mut out, frames)
        .and_then(|()| out.flush().map_err(Into::into))
        .with_context(|| format!("failed to write trace file '{}'", path.display()))?;
    info!("wrote {} frames to {}", frames.len(), path.display());
    Ok(())
}
