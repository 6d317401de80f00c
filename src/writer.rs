//! # Record Writer
//!
//! Renders morae for the synthesizer, one comma-separated record per line:
//! ```text
//! attenuation,consonant1,breath,vowel,pitch,tick,on_tick,off_tick,tenseness
//! 0,k,,a,C4,440,0,30,0
//! 0,s,breath46,a,D4[0;0;0;0;0],219,0,30,0
//! ```

use crate::mora::Mora;

/// One record, without the line terminator.
pub fn to_record(mora: &Mora) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{}",
        mora.attenuation,
        mora.consonant1,
        mora.breath_text(),
        mora.vowel,
        mora.pitch_name(),
        mora.tick,
        mora.on_tick,
        mora.off_tick,
        mora.tenseness,
    )
}

/// All records, each terminated by a newline.
pub fn to_records(morae: &[Mora]) -> String {
    let mut out = String::new();
    for mora in morae {
        out.push_str(&to_record(mora));
        out.push('\n');
    }
    out
}

/// YAML dump of the morae with raw keys and bend values, for inspection.
pub fn to_yaml(morae: &[Mora]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(morae)
}
