//! Mora type definitions
//!
//! This module defines the emitted playback unit and the carry-over record the
//! merge engine hands from one syllable to the next.

use serde::Serialize;

use crate::note::key_name;
use crate::syllable::breath_text;

/// Ticks of pitch bend covered by one refrain bend value.
pub const REFRAIN_TICK: u32 = 44;

/// One timed phonetic unit for the synthesizer.
///
/// # Fields
/// - `consonant1`: onset consonant text (empty for a vowel onset)
/// - `consonant2`: raw breath digits of the syllable, rendered through
///   [`breath_text`] when written out
/// - `key`: absolute key, already clamped to the configured range
/// - `tick`: total duration
/// - `on_tick`: leading allocation (silence carried in from a rest)
/// - `off_tick`: trailing allocation of the consonant
/// - `pitchbend`: flat bend values, empty unless the mora was refrained
///
/// The vowel sounds for `tick - on_tick - off_tick` ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mora {
    pub attenuation: i32,
    pub consonant1: String,
    pub consonant2: String,
    pub vowel: String,
    pub key: i32,
    pub tick: u32,
    pub on_tick: u32,
    pub off_tick: u32,
    pub tenseness: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pitchbend: Vec<i32>,
}

impl Mora {
    pub fn vowel_tick(&self) -> i64 {
        i64::from(self.tick) - i64::from(self.on_tick) - i64::from(self.off_tick)
    }

    pub fn breath_text(&self) -> String {
        breath_text(&self.consonant2)
    }

    /// Octave-qualified key name, followed by the bend values when refrained:
    /// `C4` or `C4[0;0;0]`.
    pub fn pitch_name(&self) -> String {
        let name = key_name(i64::from(self.key));
        if self.pitchbend.is_empty() {
            return name;
        }
        let bends: Vec<String> = self.pitchbend.iter().map(|b| b.to_string()).collect();
        format!("{}[{}]", name, bends.join(";"))
    }

    /// Copy shortened by one tick with a flat pitch bend, forcing the
    /// synthesizer to re-articulate instead of gliding into the next key.
    pub fn refrained(&self) -> Mora {
        let bend_count = self.tick.div_ceil(REFRAIN_TICK) as usize;
        Mora {
            tick: self.tick.saturating_sub(1),
            pitchbend: vec![0; bend_count],
            ..self.clone()
        }
    }
}

/// Time left over at the end of one syllable, to be spent by the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postponement {
    /// Trailing rest of the previous syllable.
    Silence { ticks: u32 },
    /// Coda consonant of the previous syllable.
    Consonant { text: String, ticks: u32 },
}

impl Postponement {
    pub fn ticks(&self) -> u32 {
        match self {
            Postponement::Silence { ticks } | Postponement::Consonant { ticks, .. } => *ticks,
        }
    }
}
