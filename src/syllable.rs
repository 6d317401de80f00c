//! # Syllables
//!
//! A lyric token decomposes into four fields, always in this order:
//! ```text
//! onset  breath  vowel  coda
//! k      -       a      -        "ka"
//! s      40      a      n        "s40an"
//! t_s    -       u      -        "t_su"
//! ```
//! Every field may be empty. Onset, vowel and coda may be split into
//! `_`-separated segments. The breath digits select a breath sample level.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MoraError;

static REGEX_SYLLABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<consonant>[bdfghjklmnprstvwyz]*(?:_[bdfghjklmnprstvwyz]*)*)",
        r"(?P<breath>[0-9]*)",
        r"(?P<vowel>[aeiou]*(?:_[aeiou]*)*)",
        r"(?P<suffix>[bdfghjklmnprstvwyz]*(?:_[bdfghjklmnprstvwyz]*)*)$",
    ))
    .unwrap()
});

/// Representative breath levels, ascending.
const BREATH_LEVELS: [u32; 7] = [0, 34, 46, 51, 57, 60, 80];

/// One lyric syllable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllable {
    pub consonant: String,
    pub breath: String,
    pub vowel: String,
    pub suffix: String,
    /// 1-based source line.
    pub line: usize,
    /// 1-based source column.
    pub position: usize,
}

impl Syllable {
    /// Decompose one lyric token starting at `column` of line `line`.
    pub fn parse(text: &str, line: usize, column: usize) -> Result<Self, MoraError> {
        let caps = REGEX_SYLLABLE.captures(text).ok_or_else(|| MoraError::Syntax {
            line,
            column,
            text: text.to_string(),
        })?;
        let field = |name: &str| caps.name(name).map_or("", |m| m.as_str()).to_string();
        Ok(Self {
            consonant: field("consonant"),
            breath: field("breath"),
            vowel: field("vowel"),
            suffix: field("suffix"),
            line,
            position: column,
        })
    }
}

impl std::fmt::Display for Syllable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}{}", self.consonant, self.breath, self.vowel, self.suffix)
    }
}

/// Split a lyric line on whitespace and decompose every token.
pub fn tokenize_lyrics(line: &str, line_number: usize) -> Result<VecDeque<Syllable>, MoraError> {
    let mut lyrics = VecDeque::new();
    let mut column = 1;
    let mut token_start: Option<(usize, usize)> = None;
    for (offset, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some((start, start_column)) = token_start.take() {
                lyrics.push_back(Syllable::parse(&line[start..offset], line_number, start_column)?);
            }
        } else if token_start.is_none() {
            token_start = Some((offset, column));
        }
        column += 1;
    }
    if let Some((start, start_column)) = token_start {
        lyrics.push_back(Syllable::parse(&line[start..], line_number, start_column)?);
    }
    Ok(lyrics)
}

/// Breath tag for the synthesizer, e.g. `breath46`; empty for no breath.
///
/// The digits snap to the nearest representative level. Ties at a midpoint go
/// to the upper level.
pub fn breath_text(breath: &str) -> String {
    if breath.is_empty() {
        return String::new();
    }
    // Digit strings too long for u64 are certainly above the top level.
    let value = breath.parse::<u64>().unwrap_or(u64::MAX);
    let level = BREATH_LEVELS
        .windows(2)
        .find(|pair| value < u64::from((pair[0] + pair[1]) / 2))
        .map_or(BREATH_LEVELS[BREATH_LEVELS.len() - 1], |pair| pair[0]);
    format!("breath{}", level)
}
