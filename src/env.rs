//! # Environment
//!
//! Read-mostly settings shared by the tokenizers and the merge engine.
//!
//! The environment starts from defaults or a YAML configuration file and is
//! afterwards changed only by pragma lines (`# tempo 96`) and by the octave
//! commands of the melody grammar (`o5`, `<`, `>`).
//!
//! ## Configuration file
//! ```yaml
//! tempo: 96
//! octave: 3
//! highest_key: 96
//! ```
//! `tick_unit` and `tempo` are mutually exclusive; without either, tempo 120
//! is assumed.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::MoraError;

/// Converts a tempo in BPM to the number of ticks in one beat.
///
/// `None` for a tempo of zero or one so fast that a beat rounds to no ticks.
pub fn tempo_to_tick_unit(tempo: u32) -> Option<u32> {
    if tempo == 0 {
        return None;
    }
    let tempo = u64::from(tempo);
    // round(440 * 60 / tempo), half away from zero
    let tick_unit = (440 * 60 * 2 + tempo) / (2 * tempo);
    u32::try_from(tick_unit).ok().filter(|t| *t > 0)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EnvironmentConfig {
    tick_unit: Option<u32>,
    tempo: Option<u32>,
    octave: Option<i32>,
    lowest_key: Option<i32>,
    highest_key: Option<i32>,
    maximal_suffix: Option<u32>,
    transpose: Option<i32>,
}

/// Settings in effect while a score is read.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    /// Ticks in one beat; every plain note and rest lasts one tick unit.
    pub tick_unit: u32,
    /// Default octave of pitched notes.
    pub octave: i32,
    pub lowest_key: i32,
    pub highest_key: i32,
    /// Upper bound on the ticks reserved for a coda consonant.
    pub maximal_suffix: u32,
    /// Semitones added to every resolved key.
    pub transpose: i32,
    /// Number of the line being read (1-based, 0 before the first line).
    pub line: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            tick_unit: 220,
            octave: 4,
            lowest_key: 0,   // C0
            highest_key: 127, // G10
            maximal_suffix: 110,
            transpose: 0,
            line: 0,
        }
    }
}

impl Environment {
    /// Parse a YAML configuration document on top of the defaults.
    pub fn from_yaml(source: &str) -> Result<Self, MoraError> {
        let config: EnvironmentConfig = if source.trim().is_empty() {
            EnvironmentConfig::default()
        } else {
            serde_yaml::from_str(source).map_err(|e| MoraError::Config(e.to_string()))?
        };
        Self::from_config(config)
    }

    /// Read a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MoraError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| MoraError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
        Self::from_yaml(&source)
    }

    fn from_config(config: EnvironmentConfig) -> Result<Self, MoraError> {
        let mut env = Environment::default();
        match (config.tick_unit, config.tempo) {
            (Some(_), Some(_)) => {
                return Err(MoraError::Config(
                    "tick_unit and tempo cannot both be set".to_string(),
                ))
            }
            (Some(0), None) => {
                return Err(MoraError::Config("tick_unit must be positive".to_string()))
            }
            (Some(tick_unit), None) => env.tick_unit = tick_unit,
            (None, Some(tempo)) => {
                env.tick_unit = tempo_to_tick_unit(tempo).ok_or_else(|| {
                    MoraError::Config(format!("tempo {} gives no ticks per beat", tempo))
                })?
            }
            (None, None) => {}
        }
        if let Some(octave) = config.octave {
            env.octave = octave;
        }
        if let Some(lowest_key) = config.lowest_key {
            env.lowest_key = lowest_key;
        }
        if let Some(highest_key) = config.highest_key {
            env.highest_key = highest_key;
        }
        if let Some(maximal_suffix) = config.maximal_suffix {
            env.maximal_suffix = maximal_suffix;
        }
        if let Some(transpose) = config.transpose {
            env.transpose = transpose;
        }
        if env.lowest_key > env.highest_key {
            return Err(MoraError::Config(format!(
                "lowest_key ({}) is above highest_key ({})",
                env.lowest_key, env.highest_key
            )));
        }
        Ok(env)
    }

    /// Clamp a key into the configured range.
    pub fn clamp_key(&self, key: i64) -> i32 {
        // the range bounds are i32, so the clamped key fits
        key.clamp(i64::from(self.lowest_key), i64::from(self.highest_key)) as i32
    }
}
