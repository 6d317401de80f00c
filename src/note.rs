//! # Notes
//!
//! Melody tokens and the unifier that folds ties and consecutive rests.
//!
//! ## Pitch spelling
//! The melody notation spells pitches the German way:
//! ```text
//! c  d  e  f  g  a  h     naturals
//! b                       B-flat
//! cis dis eis fis gis ais his   sharps
//! ces des es  fes ges as        flats
//! ```
//! A key is `octave * 12 + semitone + transpose`, so key 0 is C0 and key 127
//! is G10.

use std::fmt;

use crate::env::Environment;
use crate::error::MoraError;

/// Letter name of a pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    /// German `h`, the B natural.
    H,
}

impl NoteName {
    pub fn semitone(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::H => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    fn offset(self) -> i32 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// Letter plus accidental.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pitch {
    pub name: NoteName,
    pub accidental: Accidental,
}

impl Pitch {
    pub fn new(name: NoteName, accidental: Accidental) -> Self {
        Self { name, accidental }
    }

    /// Semitone above C of the same octave; may be -1 (`ces`) or 12 (`his`).
    pub fn semitone(self) -> i32 {
        self.name.semitone() + self.accidental.offset()
    }
}

/// What a melody token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Pitched { pitch: Pitch, octave: i32 },
    /// `-`: extend the preceding pitch.
    Repeat,
    /// Rest.
    Tacet,
}

/// One melody token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub kind: NoteKind,
    /// Length in ticks.
    pub length: u32,
    /// 1-based source column.
    pub position: usize,
}

impl Note {
    pub fn pitched(pitch: Pitch, octave: i32, length: u32, position: usize) -> Self {
        Self {
            kind: NoteKind::Pitched { pitch, octave },
            length,
            position,
        }
    }

    pub fn repeat(length: u32, position: usize) -> Self {
        Self {
            kind: NoteKind::Repeat,
            length,
            position,
        }
    }

    pub fn tacet(length: u32, position: usize) -> Self {
        Self {
            kind: NoteKind::Tacet,
            length,
            position,
        }
    }

    pub fn is_tacet(&self) -> bool {
        self.kind == NoteKind::Tacet
    }

    /// Absolute key, clamped into the environment's key range.
    ///
    /// Repeats and rests have no pitch of their own and yield `None`.
    pub fn key(&self, env: &Environment) -> Option<i32> {
        match self.kind {
            NoteKind::Pitched { pitch, octave } => {
                let raw = i64::from(octave) * 12
                    + i64::from(pitch.semitone())
                    + i64::from(env.transpose);
                let key = env.clamp_key(raw);
                if i64::from(key) != raw {
                    log::debug!("key {} at column {} clamped to {}", raw, self.position, key);
                }
                Some(key)
            }
            NoteKind::Repeat | NoteKind::Tacet => None,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoteKind::Pitched { pitch, octave } => write!(
                f,
                "<{}:{}@{}>",
                self.position,
                self.length,
                key_name(i64::from(octave) * 12 + i64::from(pitch.semitone()))
            ),
            NoteKind::Repeat => write!(f, "<{}:{}@->", self.position, self.length),
            NoteKind::Tacet => write!(f, "<{}:{}@.>", self.position, self.length),
        }
    }
}

const KEY_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave-qualified name of an absolute key, e.g. `C4` for 48.
pub fn key_name(key: i64) -> String {
    let octave = key.div_euclid(12);
    let semitone = key.rem_euclid(12) as usize;
    format!("{}{}", KEY_NAMES[semitone], octave)
}

/// Merge ties into their preceding note and consecutive rests into one rest.
///
/// `line` is only used to locate errors.
pub fn unify(notes: &[Note], line: usize) -> Result<Vec<Note>, MoraError> {
    let mut unified: Vec<Note> = Vec::with_capacity(notes.len());
    for note in notes {
        match (note.kind, unified.last_mut()) {
            (NoteKind::Repeat, Some(prev)) if !prev.is_tacet() => {
                prev.length = extend(prev.length, note, line)?;
            }
            (NoteKind::Repeat, _) => {
                return Err(MoraError::structure(
                    line,
                    note.position,
                    "-",
                    "repeat has no preceding note in its syllable",
                ));
            }
            (NoteKind::Tacet, Some(prev)) if prev.is_tacet() => {
                prev.length = extend(prev.length, note, line)?;
            }
            _ => unified.push(note.clone()),
        }
    }
    Ok(unified)
}

fn extend(length: u32, note: &Note, line: usize) -> Result<u32, MoraError> {
    length.checked_add(note.length).ok_or_else(|| {
        MoraError::structure(line, note.position, note.to_string(), "tick count overflows")
    })
}
