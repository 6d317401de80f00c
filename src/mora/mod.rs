//! # Mora Module
//!
//! Merge a lyric stream and a melody stream into timed morae for a singing
//! synthesizer.
//!
//! ## Sub-modules
//! - `engine` - The merge engine and the refrain pass
//! - `types` - Mora and Postponement definitions
//!
//! ## Key Types
//! - [`Mora`] - One emitted unit: onset consonant, vowel, key and tick budget
//! - [`MoraEngine`] - Per-score merge state
//! - [`Postponement`] - Consonant or silence carried into the next syllable
//!
//! ## Example
//! ```rust
//! use morae::compile;
//!
//! let morae = compile("ka\nc-\n").unwrap();
//!
//! assert_eq!(morae.len(), 1);
//! assert_eq!(morae[0].consonant1, "k");
//! assert_eq!(morae[0].tick, 440);
//! ```
//!
//! ## Time Budget of a Syllable
//!
//! The first note of a syllable carries the onset consonant, which is given
//! `min(30, tick / 2)` ticks (`off_tick`). When the syllable has a coda and
//! its last note is long enough, `min(maximal_suffix, tick / 2)` ticks are cut
//! from that note and carried forward as a consonant postponement. Trailing
//! rests are carried forward as a silence postponement.
//!
//! The next syllable's first note absorbs what was carried:
//! - silence lengthens the note and its `on_tick`
//! - the same consonant as its onset lengthens the note and its `off_tick`
//! - any other consonant is emitted first as a mora of its own
//!
//! ## Refrain
//!
//! After the last syllable, every mora followed by a mora on a different key
//! loses one tick and gets a flat pitch bend, so the synthesizer articulates
//! the new key instead of gliding into it.

mod engine;
mod types;


pub use engine::{refrain, MoraEngine, MAX_CONSONANT_TICK, MIN_SUFFIX_TICK};
pub use types::{Mora, Postponement, REFRAIN_TICK};
