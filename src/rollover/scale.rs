//! Diatonic scale model
//!
//! Maps between absolute semitones and signed, octave-extending scale degrees
//! for the seven diatonic modes in any of the twelve keys. Pitch voltages follow
//! the 1 V/octave convention with 0 V at C4.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// Semitones in one octave
pub const SEMITONES_PER_OCTAVE: i32 = 12;

/// Scale degrees in one octave
pub const DEGREES_PER_OCTAVE: i32 = 7;

/// Whole, whole, half, whole, whole, whole, half (Ionian)
const BASE_PATTERN: [u8; 7] = [2, 2, 1, 2, 2, 2, 1];

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave number of the note sitting at 0 V
const ZERO_VOLT_OCTAVE: i32 = 4;

/// Pitch inputs are clamped to this many octaves either side of 0 V
pub const PITCH_RANGE_OCTAVES: i32 = 10;

/// Parse a pitch class name such as `C`, `f#` or `Bb` into 0..=11.
fn parse_pitch_class(name: &str) -> Option<i32> {
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let natural: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut pc = natural;
    for accidental in chars {
        match accidental {
            '#' | 's' => pc += 1,
            'b' => pc -= 1,
            _ => return None,
        }
    }

    Some(pc.rem_euclid(SEMITONES_PER_OCTAVE))
}

/// Tonic pitch class, 0 (C) through 11 (B)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "KeyRepr", into = "u8")]
pub struct Key(u8);

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyRepr {
    Index(u8),
    Name(String),
}

impl TryFrom<KeyRepr> for Key {
    type Error = anyhow::Error;

    fn try_from(repr: KeyRepr) -> Result<Self> {
        match repr {
            KeyRepr::Index(index) => Key::new(index),
            KeyRepr::Name(name) => name.parse(),
        }
    }
}

impl From<Key> for u8 {
    fn from(key: Key) -> u8 {
        key.0
    }
}

impl Key {
    /// Create a key from its pitch class
    pub fn new(pitch_class: u8) -> Result<Self> {
        if pitch_class >= SEMITONES_PER_OCTAVE as u8 {
            bail!("key must be in 0..=11 (got {})", pitch_class);
        }
        Ok(Self(pitch_class))
    }

    /// Pitch class of the tonic
    pub fn pitch_class(self) -> i32 {
        self.0 as i32
    }
}

impl FromStr for Key {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return Key::new(index);
        }
        let pc = parse_pitch_class(s).ok_or_else(|| anyhow!("unknown key '{}'", s))?;
        Ok(Self(pc as u8))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PITCH_CLASS_NAMES[self.0 as usize])
    }
}

/// The seven diatonic modes, in rotation order of the base step pattern
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "u8")]
#[repr(u8)]
pub enum Mode {
    #[default]
    Ionian = 0,
    Dorian = 1,
    Phrygian = 2,
    Lydian = 3,
    Mixolydian = 4,
    Aeolian = 5,
    Locrian = 6,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Index(u8),
    Name(String),
}

impl TryFrom<ModeRepr> for Mode {
    type Error = anyhow::Error;

    fn try_from(repr: ModeRepr) -> Result<Self> {
        match repr {
            ModeRepr::Index(index) => Mode::from_index(index),
            ModeRepr::Name(name) => name.parse(),
        }
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> u8 {
        mode as u8
    }
}

impl Mode {
    /// All modes, Ionian first
    pub const ALL: [Mode; 7] = [
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
    ];

    /// Mode for a rotation index 0..=6
    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| anyhow!("mode must be in 0..=6 (got {})", index))
    }

    /// Rotation index into the base step pattern
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
        }
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return Mode::from_index(index);
        }
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "major" => return Ok(Mode::Ionian),
            "minor" => return Ok(Mode::Aeolian),
            _ => {}
        }
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.name() == lower)
            .ok_or_else(|| anyhow!("unknown mode '{}'", s))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Step sizes (in semitones) between consecutive degrees of a mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModePattern([u8; 7]);

impl ModePattern {
    pub fn steps(&self) -> [u8; 7] {
        self.0
    }

    /// Semitone offset of each degree above the tonic within one octave
    pub fn offsets(&self) -> [i32; 7] {
        let mut offsets = [0; 7];
        for i in 1..offsets.len() {
            offsets[i] = offsets[i - 1] + self.0[i - 1] as i32;
        }
        offsets
    }
}

/// Rotate the base pattern so that it starts on `mode`
pub fn step_pattern(mode: Mode) -> ModePattern {
    let mut steps = BASE_PATTERN;
    steps.rotate_left(mode.index());
    ModePattern(steps)
}

/// Signed scale degree; 0 is the tonic, 7 the tonic an octave up, -1 the
/// degree just below the tonic.
///
/// Behaves as a mixed-radix number: seven steps per octave, with the octave
/// carried separately so negative degrees round toward negative infinity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScaleDegree(i32);

impl ScaleDegree {
    pub fn new(degree: i32) -> Self {
        Self(degree)
    }

    pub fn from_parts(octave: i32, step: usize) -> Self {
        assert!(step < DEGREES_PER_OCTAVE as usize, "step {} out of range", step);
        Self(octave * DEGREES_PER_OCTAVE + step as i32)
    }

    pub fn value(self) -> i32 {
        self.0
    }

    /// Octave relative to the tonic's octave
    pub fn octave(self) -> i32 {
        self.0.div_euclid(DEGREES_PER_OCTAVE)
    }

    /// Position within the octave, 0..=6
    pub fn step(self) -> usize {
        self.0.rem_euclid(DEGREES_PER_OCTAVE) as usize
    }

    /// The degree `steps` scale steps away
    pub fn offset(self, steps: i32) -> Self {
        Self(self.0 + steps)
    }
}

impl fmt::Display for ScaleDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key and mode, ready for degree/semitone conversion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scale {
    key: Key,
    pattern: ModePattern,
    offsets: [i32; 7],
}

impl Scale {
    pub fn new(key: Key, mode: Mode) -> Self {
        Self::with_pattern(key, step_pattern(mode))
    }

    pub fn with_pattern(key: Key, pattern: ModePattern) -> Self {
        Self {
            key,
            pattern,
            offsets: pattern.offsets(),
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn pattern(&self) -> ModePattern {
        self.pattern
    }

    /// Absolute semitone of a scale degree
    pub fn degree_to_semitone(&self, degree: ScaleDegree) -> i32 {
        self.key.pitch_class()
            + degree.octave() * SEMITONES_PER_OCTAVE
            + self.offsets[degree.step()]
    }

    /// Scale degree of an absolute semitone.
    ///
    /// Returns the degree and whether the semitone lies in key. An out-of-key
    /// semitone resolves to the nearest in-key degree *below* it, never above.
    pub fn semitone_to_degree(&self, semitone: i32) -> (ScaleDegree, bool) {
        if let Some(degree) = self.exact_degree(semitone) {
            return (degree, true);
        }

        // Diatonic steps are at most two semitones, so this ends after one step down
        let mut below = semitone - 1;
        loop {
            if let Some(degree) = self.exact_degree(below) {
                return (degree, false);
            }
            below -= 1;
        }
    }

    /// Whether a semitone lies in key
    pub fn contains(&self, semitone: i32) -> bool {
        self.exact_degree(semitone).is_some()
    }

    fn exact_degree(&self, semitone: i32) -> Option<ScaleDegree> {
        let relative = semitone - self.key.pitch_class();
        let octave = relative.div_euclid(SEMITONES_PER_OCTAVE);
        let pitch_class = relative.rem_euclid(SEMITONES_PER_OCTAVE);
        self.offsets
            .iter()
            .position(|&offset| offset == pitch_class)
            .map(|step| ScaleDegree::from_parts(octave, step))
    }
}

/// Nearest semitone to a 1 V/octave pitch voltage.
///
/// The result is clamped to [`PITCH_RANGE_OCTAVES`] either side of 0 V so the
/// degree and chord arithmetic built on it cannot overflow. NaN reads as 0 V.
pub fn voltage_to_semitone(voltage: f32) -> i32 {
    let range = (PITCH_RANGE_OCTAVES * SEMITONES_PER_OCTAVE) as f32;
    let semitone = (voltage * SEMITONES_PER_OCTAVE as f32).round();
    if semitone.is_nan() {
        return 0;
    }
    semitone.clamp(-range, range) as i32
}

/// Pitch voltage of a semitone
pub fn semitone_to_voltage(semitone: i32) -> f32 {
    semitone as f32 / SEMITONES_PER_OCTAVE as f32
}

/// Note name of a semitone, with C4 at 0
pub fn note_name(semitone: i32) -> String {
    let pc = semitone.rem_euclid(SEMITONES_PER_OCTAVE) as usize;
    let octave = semitone.div_euclid(SEMITONES_PER_OCTAVE) + ZERO_VOLT_OCTAVE;
    format!("{}{}", PITCH_CLASS_NAMES[pc], octave)
}

/// Parse a note name such as `E4`, `F#3` or `Bb-1` into a semitone, with C4 at 0
pub fn parse_note(name: &str) -> Result<i32> {
    let name = name.trim();
    let split = name
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .ok_or_else(|| anyhow!("note '{}' has no octave", name))?;
    let (class, octave) = name.split_at(split);

    let pc = parse_pitch_class(class).ok_or_else(|| anyhow!("unknown note '{}'", name))?;
    let octave: i32 = octave
        .parse()
        .map_err(|e| anyhow!("bad octave in note '{}': {}", name, e))?;

    // Flats below C and sharps above B cross into the neighbouring octave
    let natural = parse_pitch_class(&class[..1]).unwrap_or(pc);
    let accidental = class.chars().skip(1).fold(0, |acc, c| match c {
        'b' => acc - 1,
        _ => acc + 1,
    });

    Ok((octave - ZERO_VOLT_OCTAVE) * SEMITONES_PER_OCTAVE + natural + accidental)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_major() -> Scale {
        Scale::new(Key::new(0).unwrap(), Mode::Ionian)
    }

    #[test]
    fn test_step_patterns() {
        assert_eq!(step_pattern(Mode::Ionian).steps(), [2, 2, 1, 2, 2, 2, 1]);
        assert_eq!(step_pattern(Mode::Dorian).steps(), [2, 1, 2, 2, 2, 1, 2]);
        assert_eq!(step_pattern(Mode::Aeolian).steps(), [2, 1, 2, 2, 1, 2, 2]);
        assert_eq!(step_pattern(Mode::Locrian).steps(), [1, 2, 2, 1, 2, 2, 2]);

        for mode in Mode::ALL {
            let steps = step_pattern(mode).steps();
            assert_eq!(steps.iter().map(|&s| s as i32).sum::<i32>(), 12);
        }
    }

    #[test]
    fn test_offsets() {
        assert_eq!(step_pattern(Mode::Ionian).offsets(), [0, 2, 4, 5, 7, 9, 11]);
        assert_eq!(step_pattern(Mode::Phrygian).offsets(), [0, 1, 3, 5, 7, 8, 10]);
    }

    #[test]
    fn test_degree_parts() {
        let d = ScaleDegree::new(-1);
        assert_eq!(d.octave(), -1);
        assert_eq!(d.step(), 6);

        let d = ScaleDegree::new(15);
        assert_eq!(d.octave(), 2);
        assert_eq!(d.step(), 1);
        assert_eq!(ScaleDegree::from_parts(2, 1), d);
    }

    #[test]
    fn test_degree_to_semitone() {
        let scale = c_major();
        assert_eq!(scale.degree_to_semitone(ScaleDegree::new(0)), 0);
        assert_eq!(scale.degree_to_semitone(ScaleDegree::new(2)), 4);
        assert_eq!(scale.degree_to_semitone(ScaleDegree::new(7)), 12);
        assert_eq!(scale.degree_to_semitone(ScaleDegree::new(-1)), -1);
        assert_eq!(scale.degree_to_semitone(ScaleDegree::new(-7)), -12);
        assert_eq!(scale.degree_to_semitone(ScaleDegree::new(-8)), -13);

        let d_dorian = Scale::new(Key::new(2).unwrap(), Mode::Dorian);
        assert_eq!(d_dorian.degree_to_semitone(ScaleDegree::new(0)), 2);
        assert_eq!(d_dorian.degree_to_semitone(ScaleDegree::new(2)), 5);
    }

    #[test]
    fn test_out_of_key_resolves_downward() {
        let scale = c_major();

        // C# sits between C and D; it must resolve to C
        let (degree, in_key) = scale.semitone_to_degree(1);
        assert!(!in_key);
        assert_eq!(degree, ScaleDegree::new(0));

        // A# below C resolves to A an octave down
        let (degree, in_key) = scale.semitone_to_degree(-2);
        assert!(!in_key);
        assert_eq!(degree, ScaleDegree::new(-2));
    }

    #[test]
    fn test_voltage_conversion() {
        assert_eq!(voltage_to_semitone(0.0), 0);
        assert_eq!(voltage_to_semitone(1.0), 12);
        assert_eq!(voltage_to_semitone(-1.0), -12);
        assert_eq!(voltage_to_semitone(1.0 / 12.0), 1);
        assert_eq!(semitone_to_voltage(-24), -2.0);
    }

    #[test]
    fn test_voltage_is_clamped_to_pitch_range() {
        let top = PITCH_RANGE_OCTAVES * SEMITONES_PER_OCTAVE;
        assert_eq!(voltage_to_semitone(10.0), top);
        assert_eq!(voltage_to_semitone(1.0e9), top);
        assert_eq!(voltage_to_semitone(f32::INFINITY), top);
        assert_eq!(voltage_to_semitone(-1.0e9), -top);
        assert_eq!(voltage_to_semitone(f32::NEG_INFINITY), -top);
        assert_eq!(voltage_to_semitone(f32::NAN), 0);

        // The extremes still map onto degrees and back
        let scale = Scale::new(Key::new(11).unwrap(), Mode::Locrian);
        for semitone in [top, -top] {
            let (degree, _) = scale.semitone_to_degree(semitone);
            assert!(scale.degree_to_semitone(degree) <= semitone);
        }
    }

    #[test]
    fn test_note_names() {
        assert_eq!(parse_note("C4").unwrap(), 0);
        assert_eq!(parse_note("E4").unwrap(), 4);
        assert_eq!(parse_note("f#3").unwrap(), -6);
        assert_eq!(parse_note("Cb4").unwrap(), -1);
        assert_eq!(parse_note("B-1").unwrap(), -49);
        assert!(parse_note("H2").is_err());
        assert!(parse_note("C").is_err());

        assert_eq!(note_name(0), "C4");
        assert_eq!(note_name(-1), "B3");
        assert_eq!(note_name(13), "C#5");
    }

    #[test]
    fn test_pitch_class_names() {
        assert_eq!(parse_pitch_class("C"), Some(0));
        assert_eq!(parse_pitch_class("b"), Some(11));
        assert_eq!(parse_pitch_class("Cb"), Some(11));
        assert_eq!(parse_pitch_class("B#"), Some(0));
        assert_eq!(parse_pitch_class("Fs"), Some(6));
        assert_eq!(parse_pitch_class("Ebb"), Some(2));
        assert_eq!(parse_pitch_class("X"), None);
        assert_eq!(parse_pitch_class(""), None);
    }

    #[test]
    fn test_key_and_mode_parsing() {
        assert_eq!("D".parse::<Key>().unwrap(), Key::new(2).unwrap());
        assert_eq!("Bb".parse::<Key>().unwrap(), Key::new(10).unwrap());
        assert_eq!("7".parse::<Key>().unwrap(), Key::new(7).unwrap());
        assert!(Key::new(12).is_err());

        assert_eq!("Dorian".parse::<Mode>().unwrap(), Mode::Dorian);
        assert_eq!("minor".parse::<Mode>().unwrap(), Mode::Aeolian);
        assert_eq!("6".parse::<Mode>().unwrap(), Mode::Locrian);
        assert!(Mode::from_index(7).is_err());
    }
}
