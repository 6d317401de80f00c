//! Mora merge engine
//!
//! Synchronizes the lyric queue with the melody queue by source column and
//! turns every syllable, together with the notes sung on it, into morae.

use std::collections::VecDeque;

use crate::env::Environment;
use crate::error::MoraError;
use crate::note::{unify, Note};
use crate::syllable::Syllable;
use super::types::{Mora, Postponement};

/// Upper bound of the onset consonant allocation.
pub const MAX_CONSONANT_TICK: u32 = 30;
/// Shortest last note that still leaves room for a coda consonant.
pub const MIN_SUFFIX_TICK: u32 = 15;

/// Pops the next syllable if it starts at or before `position`.
fn next_syllable(lyrics: &mut VecDeque<Syllable>, position: usize) -> Option<Syllable> {
    if lyrics.front()?.position <= position {
        lyrics.pop_front()
    } else {
        None
    }
}

/// Merge state for one score.
///
/// Holds at most one current syllable with the notes fed to it so far, the
/// morae emitted so far, and at most one [`Postponement`].
#[derive(Debug, Default)]
pub struct MoraEngine {
    morae: Vec<Mora>,
    current_syllable: Option<Syllable>,
    current_notes: Vec<Note>,
    postponed: Option<Postponement>,
}

impl MoraEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Morae emitted so far, before the refrain pass.
    pub fn morae(&self) -> &[Mora] {
        &self.morae
    }

    /// Merge one lyric line with its melody line.
    ///
    /// Every syllable starting at or before a note's column becomes current
    /// before that note is fed. Notes ahead of the first syllable continue the
    /// current syllable of the previous line.
    pub fn merge(
        &mut self,
        lyrics: &mut VecDeque<Syllable>,
        melody: &mut VecDeque<Note>,
        env: &Environment,
    ) -> Result<(), MoraError> {
        while let Some(note) = melody.pop_front() {
            while let Some(syllable) = next_syllable(lyrics, note.position) {
                self.feed_syllable(syllable, env)?;
            }
            self.feed_note(note, env)?;
        }
        if let Some(syllable) = lyrics.front() {
            return Err(MoraError::structure(
                syllable.line,
                syllable.position,
                syllable.to_string(),
                "no note for syllable",
            ));
        }
        Ok(())
    }

    /// Make `syllable` current, finalizing the previous one.
    pub fn feed_syllable(
        &mut self,
        syllable: Syllable,
        env: &Environment,
    ) -> Result<(), MoraError> {
        self.proceed_syllable(env)?;
        self.current_syllable = Some(syllable);
        Ok(())
    }

    /// Add a note to the current syllable.
    ///
    /// Rests may only close a syllable: a sounding note after a rest is
    /// rejected here rather than at finalize time.
    pub fn feed_note(&mut self, note: Note, env: &Environment) -> Result<(), MoraError> {
        if self.current_syllable.is_none() {
            return Err(MoraError::structure(
                env.line,
                note.position,
                note.to_string(),
                "note has no syllable to be sung on",
            ));
        }
        if let Some(last) = self.current_notes.last() {
            if last.is_tacet() && !note.is_tacet() {
                return Err(MoraError::structure(
                    env.line,
                    last.position,
                    format!("{}{}", last, note),
                    "tacet should be placed at the end of a syllable",
                ));
            }
        }
        self.current_notes.push(note);
        Ok(())
    }

    /// Finalize the score and return every mora, refrained.
    pub fn finish(mut self, env: &Environment) -> Result<Vec<Mora>, MoraError> {
        self.proceed_syllable(env)?;
        match self.postponed.take() {
            Some(Postponement::Consonant { text, ticks }) => {
                self.flush_consonant(text, ticks.min(MAX_CONSONANT_TICK + 1), env)?;
            }
            Some(Postponement::Silence { ticks }) => {
                log::debug!("dropping {} trailing ticks of silence", ticks);
            }
            None => {}
        }
        Ok(refrain(self.morae))
    }

    /// Turn the current syllable and its notes into morae.
    fn proceed_syllable(&mut self, env: &Environment) -> Result<(), MoraError> {
        let Some(syllable) = self.current_syllable.take() else {
            return Ok(());
        };
        let notes = std::mem::take(&mut self.current_notes);
        let mut unified = unify(&notes, env.line)?;
        let extend = |ticks: u32, by: u32| {
            ticks.checked_add(by).ok_or_else(|| {
                MoraError::structure(
                    syllable.line,
                    syllable.position,
                    syllable.to_string(),
                    "tick count overflows",
                )
            })
        };

        let mut suffix_tacet = 0;
        while unified.last().is_some_and(Note::is_tacet) {
            let length = unified.pop().map_or(0, |n| n.length);
            suffix_tacet = extend(suffix_tacet, length)?;
        }

        let Some(last_note) = unified.last() else {
            let message = if notes.is_empty() {
                "no note for syllable"
            } else {
                "syllable has only rests"
            };
            return Err(MoraError::structure(
                syllable.line,
                syllable.position,
                syllable.to_string(),
                message,
            ));
        };
        let realize_suffix = !syllable.suffix.is_empty() && last_note.length >= MIN_SUFFIX_TICK;

        log::debug!(
            "syllable {} notes [{}] suffix-tacet {} postponed {:?}",
            syllable,
            unified.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" "),
            suffix_tacet,
            self.postponed
        );

        let mut key = self.morae.last().map(|m| m.key);
        let count = unified.len();
        for (idx, note) in unified.iter().enumerate() {
            let first = idx == 0;
            let last = idx + 1 == count;
            let resolved = note.key(env).or(key).ok_or_else(|| {
                MoraError::structure(
                    env.line,
                    note.position,
                    note.to_string(),
                    "note has no pitch to resolve",
                )
            })?;
            key = Some(resolved);

            let mut mora = Mora {
                vowel: syllable.vowel.clone(),
                key: resolved,
                tick: note.length,
                ..Mora::default()
            };
            let mut suffix_length = 0;
            if last && realize_suffix {
                suffix_length = env.maximal_suffix.min(mora.tick / 2);
                mora.tick -= suffix_length;
            }
            if first {
                mora.consonant1 = syllable.consonant.clone();
                mora.consonant2 = syllable.breath.clone();
                mora.off_tick = MAX_CONSONANT_TICK.min(mora.tick / 2);
                match self.postponed.take() {
                    None => {}
                    Some(Postponement::Silence { ticks }) => {
                        mora.tick = extend(mora.tick, ticks)?;
                        mora.on_tick += ticks;
                    }
                    Some(Postponement::Consonant { text, ticks }) if text == syllable.consonant => {
                        mora.tick = extend(mora.tick, ticks)?;
                        mora.off_tick += ticks;
                    }
                    Some(Postponement::Consonant { text, ticks }) => {
                        self.flush_consonant(text, ticks, env)?;
                    }
                }
            }
            self.morae.push(mora);
            if suffix_length > 0 {
                self.postpone(Postponement::Consonant {
                    text: syllable.suffix.clone(),
                    ticks: suffix_length,
                });
            }
        }

        if suffix_tacet > 0 {
            match self.postponed.take() {
                Some(Postponement::Consonant { text, ticks }) => {
                    self.flush_consonant(text, ticks, env)?;
                }
                Some(Postponement::Silence { ticks }) => {
                    suffix_tacet = extend(suffix_tacet, ticks)?
                }
                None => {}
            }
            self.postpone(Postponement::Silence { ticks: suffix_tacet });
        }
        Ok(())
    }

    fn postpone(&mut self, postponement: Postponement) {
        log::debug!("postponing {} ticks: {:?}", postponement.ticks(), postponement);
        self.postponed = Some(postponement);
    }

    /// Emit a carried consonant as a mora of its own on the previous key.
    fn flush_consonant(
        &mut self,
        text: String,
        ticks: u32,
        env: &Environment,
    ) -> Result<(), MoraError> {
        let Some(key) = self.morae.last().map(|m| m.key) else {
            return Err(MoraError::structure(
                env.line,
                1,
                text,
                "consonant has no preceding note",
            ));
        };
        let mora = Mora {
            consonant1: text,
            key,
            tick: ticks,
            off_tick: ticks.saturating_sub(1),
            ..Mora::default()
        };
        log::debug!("single consonant mora: {:?}", mora);
        self.morae.push(mora);
        Ok(())
    }
}

/// Replace the earlier mora of every key-changing pair with its refrained copy.
///
/// Pairs are judged on the unrewritten sequence, so one rewrite never causes
/// another.
pub fn refrain(morae: Vec<Mora>) -> Vec<Mora> {
    let mut refrained = Vec::with_capacity(morae.len());
    let mut iter = morae.into_iter().peekable();
    while let Some(mora) = iter.next() {
        let changes_key = iter.peek().is_some_and(|next| next.key != mora.key);
        if changes_key {
            let copy = mora.refrained();
            log::debug!("refrained {} -> {} ticks", mora.pitch_name(), copy.tick);
            refrained.push(copy);
        } else {
            refrained.push(mora);
        }
    }
    refrained
}
