//! # Melody Lexer
//!
//! Turns one melody line into a queue of [`Note`] tokens.
//!
//! ## Grammar
//! Whitespace between tokens is skipped. At each position the first matching
//! rule wins, and pitch spellings match their longest form:
//! ```text
//! c cis ces d dis des e eis es f fis fes
//! g gis ges a ais as h his b b<digits>    pitched note, one tick unit
//! o<digits>                                set the octave
//! <  >                                     octave up / down
//! -                                        repeat (tie) the preceding pitch
//! ( ... )<digits>                          subdivision group
//! any other character                      rest, one tick unit
//! ```
//! The rest catch-all is deliberate: `c . d` and `c r d` both place a rest
//! between the notes.
//!
//! ## Subdivision groups
//! `(c d e)2` squeezes three notes into two tick units. Each member but the
//! last receives `remaining / members_left` rounded half-to-even; the last
//! member takes what is left so the group adds up exactly.

use std::collections::VecDeque;
use std::iter::Peekable;
use std::str::Chars;

use crate::env::Environment;
use crate::error::MoraError;
use crate::note::{Accidental, Note, NoteName, Pitch};

/// Lexer for one melody line
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, line: usize) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            line,
            column: 1,
            position: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        self.column += 1;
        Some(c)
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn consume(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn take_digits(&mut self) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.advance();
        }
        &self.input[start..self.position]
    }

    fn syntax_error(&self, column: usize, start: usize) -> MoraError {
        MoraError::Syntax {
            line: self.line,
            column,
            text: self.input[start..].trim_end().to_string(),
        }
    }

    fn structure_error(&self, column: usize, start: usize, message: &str) -> MoraError {
        MoraError::structure(self.line, column, self.input[start..].trim_end(), message)
    }

    /// Reads a pitch spelling starting at the current letter.
    ///
    /// Returns the pitch and, for `b`, an inline octave if digits follow.
    fn pitch(&mut self, letter: char) -> Option<(Pitch, Option<&'a str>)> {
        let name = match letter {
            'c' => NoteName::C,
            'd' => NoteName::D,
            'e' => NoteName::E,
            'f' => NoteName::F,
            'g' => NoteName::G,
            'a' => NoteName::A,
            'h' => NoteName::H,
            'b' => {
                self.advance();
                let digits = self.take_digits();
                let octave = (!digits.is_empty()).then_some(digits);
                return Some((Pitch::new(NoteName::H, Accidental::Flat), octave));
            }
            _ => return None,
        };
        self.advance();
        let rest = self.remaining();
        let accidental = if rest.starts_with("is") {
            self.consume(2);
            Accidental::Sharp
        } else if matches!(name, NoteName::E | NoteName::A) && rest.starts_with('s') {
            self.consume(1);
            Accidental::Flat
        } else if matches!(name, NoteName::C | NoteName::D | NoteName::F | NoteName::G)
            && rest.starts_with("es")
        {
            self.consume(2);
            Accidental::Flat
        } else {
            Accidental::Natural
        };
        Some((Pitch::new(name, accidental), None))
    }

    /// Tokenize the line, applying octave commands to `env` as they occur.
    pub fn tokenize(&mut self, env: &mut Environment) -> Result<VecDeque<Note>, MoraError> {
        let mut melody = VecDeque::new();
        // Open subdivision group and the column of its '('.
        let mut group: Option<(Vec<Note>, usize)> = None;

        while let Some(&c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            let column = self.column;
            let start = self.position;

            let note = match c {
                'c' | 'd' | 'e' | 'f' | 'g' | 'a' | 'h' | 'b' => {
                    let Some((pitch, inline_octave)) = self.pitch(c) else {
                        return Err(self.syntax_error(column, start));
                    };
                    let octave = match inline_octave {
                        Some(digits) => digits
                            .parse::<i32>()
                            .map_err(|_| self.syntax_error(column, start))?,
                        None => env.octave,
                    };
                    Some(Note::pitched(pitch, octave, env.tick_unit, column))
                }
                'o' if self.remaining()[1..].starts_with(|d: char| d.is_ascii_digit()) => {
                    self.advance();
                    env.octave = self
                        .take_digits()
                        .parse::<i32>()
                        .map_err(|_| self.syntax_error(column, start))?;
                    None
                }
                '<' | '>' => {
                    self.advance();
                    let shifted = if c == '<' {
                        env.octave.checked_add(1)
                    } else {
                        env.octave.checked_sub(1)
                    };
                    env.octave = shifted
                        .ok_or_else(|| self.structure_error(column, start, "octave out of range"))?;
                    None
                }
                '-' => {
                    self.advance();
                    Some(Note::repeat(env.tick_unit, column))
                }
                '(' => {
                    if group.is_some() {
                        return Err(self.structure_error(
                            column,
                            start,
                            "nested parentheses are not supported",
                        ));
                    }
                    self.advance();
                    group = Some((Vec::new(), column));
                    None
                }
                ')' => {
                    self.advance();
                    let digits = self.take_digits();
                    let Some((members, _)) = group.take() else {
                        return Err(self.structure_error(
                            column,
                            start,
                            "unbalanced right parenthesis",
                        ));
                    };
                    if members.is_empty() {
                        return Err(self.structure_error(column, start, "empty parentheses"));
                    }
                    let numerator = if digits.is_empty() {
                        1
                    } else {
                        match digits.parse::<u32>() {
                            Ok(0) => 1,
                            Ok(n) => n,
                            Err(_) => return Err(self.syntax_error(column, start)),
                        }
                    };
                    let budget = numerator
                        .checked_mul(env.tick_unit)
                        .ok_or_else(|| self.syntax_error(column, start))?;
                    melody.extend(distribute(members, budget));
                    None
                }
                _ => {
                    self.advance();
                    Some(Note::tacet(env.tick_unit, column))
                }
            };

            if let Some(note) = note {
                match group.as_mut() {
                    Some((members, _)) => members.push(note),
                    None => melody.push_back(note),
                }
            }
        }

        if let Some((_, column)) = group {
            let start = self
                .input
                .char_indices()
                .nth(column - 1)
                .map(|(i, _)| i)
                .unwrap_or(0);
            return Err(self.structure_error(column, start, "unclosed parenthesis"));
        }

        Ok(melody)
    }
}

/// Tokenize one melody line with the given environment.
pub fn tokenize_melody(
    line: &str,
    line_number: usize,
    env: &mut Environment,
) -> Result<VecDeque<Note>, MoraError> {
    Lexer::new(line, line_number).tokenize(env)
}

/// Share `budget` ticks among the group members in order.
fn distribute(mut members: Vec<Note>, budget: u32) -> Vec<Note> {
    let mut remaining = budget;
    let mut left = members.len() as u32;
    for note in &mut members {
        let share = if left == 1 {
            remaining
        } else {
            round_half_even(remaining, left)
        };
        note.length = share;
        remaining -= share;
        left -= 1;
    }
    members
}

/// `numerator / denominator` rounded to the nearest integer, ties to even.
fn round_half_even(numerator: u32, denominator: u32) -> u32 {
    let quotient = numerator / denominator;
    let twice_remainder = 2 * u64::from(numerator % denominator);
    let denominator = u64::from(denominator);
    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteKind;

    fn lex(line: &str) -> Vec<Note> {
        let mut env = Environment::default();
        tokenize_melody(line, 1, &mut env).unwrap().into_iter().collect()
    }

    fn kinds(notes: &[Note]) -> Vec<NoteKind> {
        notes.iter().map(|n| n.kind).collect()
    }

    fn pitched(name: NoteName, accidental: Accidental, octave: i32) -> NoteKind {
        NoteKind::Pitched {
            pitch: Pitch::new(name, accidental),
            octave,
        }
    }

    #[test]
    fn test_simple_notes() {
        let notes = lex("c d e");
        assert_eq!(
            kinds(&notes),
            vec![
                pitched(NoteName::C, Accidental::Natural, 4),
                pitched(NoteName::D, Accidental::Natural, 4),
                pitched(NoteName::E, Accidental::Natural, 4),
            ]
        );
        let positions: Vec<_> = notes.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 3, 5]);
        assert!(notes.iter().all(|n| n.length == 220));
    }

    #[test]
    fn test_accidentals_longest_match() {
        let notes = lex("cis des es as his fes");
        assert_eq!(
            kinds(&notes),
            vec![
                pitched(NoteName::C, Accidental::Sharp, 4),
                pitched(NoteName::D, Accidental::Flat, 4),
                pitched(NoteName::E, Accidental::Flat, 4),
                pitched(NoteName::A, Accidental::Flat, 4),
                pitched(NoteName::H, Accidental::Sharp, 4),
                pitched(NoteName::F, Accidental::Flat, 4),
            ]
        );
    }

    #[test]
    fn test_b_is_b_flat_with_inline_octave() {
        let notes = lex("b b3 h");
        assert_eq!(
            kinds(&notes),
            vec![
                pitched(NoteName::H, Accidental::Flat, 4),
                pitched(NoteName::H, Accidental::Flat, 3),
                pitched(NoteName::H, Accidental::Natural, 4),
            ]
        );
    }

    #[test]
    fn test_octave_commands() {
        let mut env = Environment::default();
        let notes: Vec<_> = tokenize_melody("o2 c < c > > c", 1, &mut env)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            kinds(&notes),
            vec![
                pitched(NoteName::C, Accidental::Natural, 2),
                pitched(NoteName::C, Accidental::Natural, 3),
                pitched(NoteName::C, Accidental::Natural, 1),
            ]
        );
        // Octave changes persist for later lines.
        assert_eq!(env.octave, 1);
    }

    #[test]
    fn test_multi_digit_octave() {
        let mut env = Environment::default();
        tokenize_melody("o10", 1, &mut env).unwrap();
        assert_eq!(env.octave, 10);
    }

    #[test]
    fn test_repeat_and_tacet() {
        let notes = lex("c- . r");
        assert_eq!(
            kinds(&notes),
            vec![
                pitched(NoteName::C, Accidental::Natural, 4),
                NoteKind::Repeat,
                NoteKind::Tacet,
                NoteKind::Tacet,
            ]
        );
        let positions: Vec<_> = notes.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 2, 4, 6]);
    }

    #[test]
    fn test_bare_o_is_rest() {
        assert_eq!(
            kinds(&lex("o c")),
            vec![NoteKind::Tacet, pitched(NoteName::C, Accidental::Natural, 4)]
        );
    }

    #[test]
    fn test_group_default_numerator() {
        let notes = lex("(c d)");
        let lengths: Vec<_> = notes.iter().map(|n| n.length).collect();
        assert_eq!(lengths, vec![110, 110]);
    }

    #[test]
    fn test_group_three_way_split_rounds_half_to_even() {
        // 220 / 3 = 73.33 -> 73; 147 / 2 = 73.5 -> 74; last takes 73
        let lengths: Vec<_> = lex("(c d e)").iter().map(|n| n.length).collect();
        assert_eq!(lengths, vec![73, 74, 73]);
        // 440 / 3 = 146.67 -> 147; 293 / 2 = 146.5 -> 146; last takes 147
        let lengths: Vec<_> = lex("(c d e)2").iter().map(|n| n.length).collect();
        assert_eq!(lengths, vec![147, 146, 147]);
    }

    #[test]
    fn test_group_sums_exactly() {
        for size in 1..=13 {
            for numerator in 1..=5u32 {
                let line = format!("({}){}", "c ".repeat(size), numerator);
                let total: u32 = lex(&line).iter().map(|n| n.length).sum();
                assert_eq!(total, numerator * 220, "group of {} over {}", size, numerator);
            }
        }
    }

    #[test]
    fn test_group_zero_numerator_is_one() {
        let lengths: Vec<_> = lex("(c d)0").iter().map(|n| n.length).collect();
        assert_eq!(lengths, vec![110, 110]);
    }

    #[test]
    fn test_group_keeps_order_with_surrounding_notes() {
        let notes = lex("c (d -) e");
        assert_eq!(
            kinds(&notes),
            vec![
                pitched(NoteName::C, Accidental::Natural, 4),
                pitched(NoteName::D, Accidental::Natural, 4),
                NoteKind::Repeat,
                pitched(NoteName::E, Accidental::Natural, 4),
            ]
        );
        let lengths: Vec<_> = notes.iter().map(|n| n.length).collect();
        assert_eq!(lengths, vec![220, 110, 110, 220]);
    }

    #[test]
    fn test_nested_group_rejected() {
        let mut env = Environment::default();
        let err = tokenize_melody("(c (d))", 4, &mut env).unwrap_err();
        match err {
            MoraError::Structure { line, column, message, .. } => {
                assert_eq!(line, 4);
                assert_eq!(column, 4);
                assert!(message.contains("nested"));
            }
            _ => panic!("Expected Structure error"),
        }
    }

    #[test]
    fn test_empty_group_rejected() {
        let mut env = Environment::default();
        let err = tokenize_melody("c ()", 1, &mut env).unwrap_err();
        match err {
            MoraError::Structure { column, message, .. } => {
                assert_eq!(column, 4);
                assert!(message.contains("empty"));
            }
            _ => panic!("Expected Structure error"),
        }
    }

    #[test]
    fn test_unbalanced_close_rejected() {
        let mut env = Environment::default();
        let err = tokenize_melody("c d)", 1, &mut env).unwrap_err();
        match err {
            MoraError::Structure { column, text, message, .. } => {
                assert_eq!(column, 4);
                assert_eq!(text, ")");
                assert!(message.contains("unbalanced"));
            }
            _ => panic!("Expected Structure error"),
        }
    }

    #[test]
    fn test_unclosed_group_rejected() {
        let mut env = Environment::default();
        let err = tokenize_melody("c (d e", 1, &mut env).unwrap_err();
        match err {
            MoraError::Structure { column, message, .. } => {
                assert_eq!(column, 3);
                assert!(message.contains("unclosed"));
            }
            _ => panic!("Expected Structure error"),
        }
    }

    #[test]
    fn test_leading_whitespace_skipped() {
        let notes = lex("   c");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].position, 4);
    }

    #[test]
    fn test_tick_unit_follows_environment() {
        let mut env = Environment {
            tick_unit: 100,
            ..Environment::default()
        };
        let notes = tokenize_melody("c (d e)3", 1, &mut env).unwrap();
        let lengths: Vec<_> = notes.iter().map(|n| n.length).collect();
        assert_eq!(lengths, vec![100, 150, 150]);
    }

    #[test]
    fn test_octave_shift_out_of_range_rejected() {
        let mut env = Environment {
            octave: i32::MAX,
            ..Environment::default()
        };
        let err = tokenize_melody("c < c", 2, &mut env).unwrap_err();
        match err {
            MoraError::Structure { line, column, message, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
                assert_eq!(message, "octave out of range");
            }
            _ => panic!("Expected Structure error"),
        }

        let mut env = Environment {
            octave: i32::MIN,
            ..Environment::default()
        };
        let err = tokenize_melody(">", 1, &mut env).unwrap_err();
        assert!(matches!(err, MoraError::Structure { column: 1, .. }));
    }

    #[test]
    fn test_huge_octave_number_lexes() {
        let notes = lex("o999999999 c b999999999");
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].kind, pitched(NoteName::C, Accidental::Natural, 999_999_999));
        assert_eq!(notes[1].kind, pitched(NoteName::H, Accidental::Flat, 999_999_999));
    }
}
