use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use chord_rollover::render::{render_frames, voice_frames};
use chord_rollover::rollover::scale::{note_name, voltage_to_semitone};
use chord_rollover::rollover::{
    build_chord, jumble_chord, Chord, Key, LeadingStyle, Mode, Params, Scale, ScaleDegree,
    VoiceCount,
};
use chord_rollover::{wav, Performance, MAX_VOICES};

/// Turn a mono pitch/gate line into gliding diatonic chords
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a performance file to WAV
    Render {
        /// Path to the performance TOML file
        performance: PathBuf,

        /// Output WAV path
        #[arg(short, long, default_value = "rollover.wav")]
        out: PathBuf,

        /// Also write a per-sample CSV trace of the engine outputs
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Override the performance sample rate (Hz)
        #[arg(long)]
        sample_rate: Option<u32>,

        #[command(flatten)]
        overrides: ParamOverrides,
    },
    /// List the notes of a key and mode
    Scale {
        #[command(flatten)]
        scale: ScaleArgs,
    },
    /// Show the chord built on a scale degree
    Chord {
        /// Root scale degree (0 = tonic, may be negative)
        #[arg(allow_negative_numbers = true)]
        degree: i32,

        #[command(flatten)]
        scale: ScaleArgs,

        /// Number of voices
        #[arg(long, default_value_t = 3)]
        voices: usize,
    },
    /// Show how the voices of one chord would move to another
    Lead {
        /// Sounding pitch voltages, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        from: Vec<f32>,

        /// Target pitch voltages, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        to: Vec<f32>,

        /// Move voices together instead of jumbling them
        #[arg(long)]
        smooth: bool,
    },
}

#[derive(Args, Debug)]
struct ScaleArgs {
    /// Key, by name or pitch class (C, F#, Bb, 0-11)
    #[arg(long, default_value = "C")]
    key: Key,

    /// Mode, by name or index (ionian, dorian, ..., 0-6)
    #[arg(long, default_value = "ionian")]
    mode: Mode,
}

/// Command-line values that replace the performance's [params]
#[derive(Args, Debug)]
struct ParamOverrides {
    #[arg(long)]
    key: Option<Key>,

    #[arg(long)]
    mode: Option<Mode>,

    #[arg(long)]
    voices: Option<usize>,

    /// Glide time in seconds
    #[arg(long)]
    glide: Option<f32>,

    /// Easing sharpness, 1 for linear
    #[arg(long)]
    sharpness: Option<f32>,

    /// Move voices together instead of jumbling them
    #[arg(long)]
    smooth: bool,
}

impl ParamOverrides {
    fn apply(&self, params: &mut Params) -> Result<()> {
        if let Some(key) = self.key {
            params.key = key;
        }
        if let Some(mode) = self.mode {
            params.mode = mode;
        }
        if let Some(voices) = self.voices {
            params.voices = VoiceCount::new(voices)?;
        }
        if let Some(glide) = self.glide {
            params.glide_seconds = glide;
        }
        if let Some(sharpness) = self.sharpness {
            params.sharpness = sharpness;
        }
        if self.smooth {
            params.style = LeadingStyle::Smooth;
        }
        params.validate()
    }
}

fn describe(chord: &Chord) -> String {
    chord
        .iter()
        .map(|&v| format!("{} ({:.4} V)", note_name(voltage_to_semitone(v)), v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            performance,
            out,
            csv,
            sample_rate,
            overrides,
        } => {
            let mut perf = Performance::load(&performance)?;
            overrides
                .apply(&mut perf.params)
                .context("invalid parameter override")?;
            if let Some(sample_rate) = sample_rate {
                if sample_rate == 0 {
                    bail!("sample rate must be positive");
                }
                perf.sample_rate = sample_rate;
            }

            info!(
                "{} {} with {} voices, {}s glide, {} leading",
                perf.params.key,
                perf.params.mode,
                perf.params.voices.get(),
                perf.params.glide_seconds,
                perf.params.style
            );

            let frames = render_frames(&perf);
            let audio = voice_frames(&frames, perf.sample_rate);
            wav::write_wav(&out, &audio, perf.sample_rate)?;
            if let Some(csv) = csv {
                wav::write_trace_file(&csv, &frames)?;
            }
        }
        Commands::Scale { scale } => {
            let s = Scale::new(scale.key, scale.mode);
            for step in 0..7 {
                let semitone = s.degree_to_semitone(ScaleDegree::new(step));
                println!("{}: {}", step, note_name(semitone));
            }
        }
        Commands::Chord {
            degree,
            scale,
            voices,
        } => {
            let voices = VoiceCount::new(voices)?;
            let chord = build_chord(
                ScaleDegree::new(degree),
                &Scale::new(scale.key, scale.mode),
                voices,
            );
            println!("{}", describe(&chord));
        }
        Commands::Lead { from, to, smooth } => {
            if from.is_empty() || from.len() != to.len() {
                bail!(
                    "--from and --to need the same, non-zero number of pitches (got {} and {})",
                    from.len(),
                    to.len()
                );
            }
            if from.len() > MAX_VOICES {
                bail!("at most {} voices (got {})", MAX_VOICES, from.len());
            }

            let style = if smooth {
                LeadingStyle::Smooth
            } else {
                LeadingStyle::Jumble
            };
            let led = jumble_chord(&Chord::from_slice(&to), &Chord::from_slice(&from), style);
            for (voice, (a, b)) in from.iter().zip(led.iter()).enumerate() {
                println!("voice {}: {:.4} V -> {:.4} V ({:+.4})", voice, a, b, b - a);
            }
        }
    }

    Ok(())
}
