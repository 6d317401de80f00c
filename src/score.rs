//! # Score Reader
//!
//! Reads a score line by line and drives the merge engine.
//!
//! ## Line Kinds
//! ```text
//! (blank)              ignored
//! ! any text           comment
//! # <name> <integer>   pragma: tick_unit, tempo, octave, transpose, maximal_suffix
//! ka ta na             lyric line, when no lyric line is pending
//! c  d  e-             melody line, merged at once with the pending lyric line
//! ```
//!
//! ## Example
//! ```rust
//! use morae::{Environment, Score};
//!
//! let mut score = Score::new(Environment::default());
//! score.feed_line("# tempo 60").unwrap();
//! score.feed_line("ka").unwrap();
//! score.feed_line("c").unwrap();
//! let morae = score.finish().unwrap();
//! assert_eq!(morae[0].tick, 440);
//! ```

use std::collections::VecDeque;

use crate::env::{tempo_to_tick_unit, Environment};
use crate::error::MoraError;
use crate::lexer::tokenize_melody;
use crate::mora::{Mora, MoraEngine};
use crate::syllable::{tokenize_lyrics, Syllable};

/// A score being read.
#[derive(Debug)]
pub struct Score {
    env: Environment,
    lyrics: Option<VecDeque<Syllable>>,
    engine: MoraEngine,
}

impl Score {
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            lyrics: None,
            engine: MoraEngine::new(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Read the next line of the score.
    pub fn feed_line(&mut self, line: &str) -> Result<(), MoraError> {
        self.env.line += 1;
        let trimmed = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if trimmed.trim().is_empty() || trimmed.starts_with('!') {
            return Ok(());
        }
        if trimmed.starts_with('#') {
            return self.apply_pragma(trimmed);
        }
        match self.lyrics.take() {
            None => {
                self.lyrics = Some(tokenize_lyrics(trimmed, self.env.line)?);
            }
            Some(mut lyrics) => {
                let mut melody = tokenize_melody(trimmed, self.env.line, &mut self.env)?;
                self.engine.merge(&mut lyrics, &mut melody, &self.env)?;
            }
        }
        Ok(())
    }

    fn apply_pragma(&mut self, line: &str) -> Result<(), MoraError> {
        let pragma_error = |message: &str| MoraError::Pragma {
            line: self.env.line,
            text: line.to_string(),
            message: message.to_string(),
        };
        let items: Vec<&str> = line.split_whitespace().collect();
        let [marker, name, value] = items.as_slice() else {
            return Err(pragma_error("expected '# <name> <integer>'"));
        };
        if *marker != "#" {
            return Err(pragma_error("expected '# <name> <integer>'"));
        }
        let value: i64 = value
            .parse()
            .map_err(|_| pragma_error("value is not an integer"))?;
        let positive = |value: i64| {
            u32::try_from(value)
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| pragma_error("value must be a positive integer"))
        };
        let signed =
            |value: i64| i32::try_from(value).map_err(|_| pragma_error("value is out of range"));
        match *name {
            "tick_unit" => self.env.tick_unit = positive(value)?,
            "tempo" => {
                self.env.tick_unit = tempo_to_tick_unit(positive(value)?)
                    .ok_or_else(|| pragma_error("tempo is too fast for one tick per beat"))?
            }
            "octave" => self.env.octave = signed(value)?,
            "transpose" => self.env.transpose = signed(value)?,
            "maximal_suffix" => {
                self.env.maximal_suffix = u32::try_from(value)
                    .map_err(|_| pragma_error("value must not be negative"))?
            }
            _ => return Err(pragma_error("unknown pragma")),
        }
        log::debug!("L{}: {} = {}", self.env.line, name, value);
        Ok(())
    }

    /// End of input: finalize and return the morae.
    pub fn finish(self) -> Result<Vec<Mora>, MoraError> {
        if let Some(syllable) = self.lyrics.as_ref().and_then(|lyrics| lyrics.front()) {
            return Err(MoraError::structure(
                syllable.line,
                syllable.position,
                syllable.to_string(),
                "no note for syllable",
            ));
        }
        self.engine.finish(&self.env)
    }
}
