//! Integration tests for the morae compiler
//!
//! Tests the full pipeline from score text to synthesizer records.

use std::io::Write;

use morae::{compile, compile_to_records, compile_with, Environment, MoraError};

#[test]
fn test_compile_small_song() {
    let source = r#"! twinkle, first phrase
# tempo 120
ki ra ki ra
c  c  g  g
hi ka ru
a  a  g-
"#;
    let records = compile_to_records(source).unwrap();
    let lines: Vec<&str> = records.lines().collect();
    assert_eq!(
        lines,
        vec![
            "0,k,,i,C4,220,0,30,0",
            "0,r,,a,C4[0;0;0;0;0],219,0,30,0",
            "0,k,,i,G4,220,0,30,0",
            "0,r,,a,G4[0;0;0;0;0],219,0,30,0",
            "0,h,,i,A4,220,0,30,0",
            "0,k,,a,A4[0;0;0;0;0],219,0,30,0",
            "0,r,,u,G4,440,0,30,0",
        ]
    );
}

#[test]
fn test_compile_with_subdivision_and_coda() {
    // The group squeezes three notes into one beat: 73, 74 and 73 ticks.
    // Each changes key into the next, so each loses a tick on refrain.
    let source = "ka     san\n(c d e) f\n";
    let morae = compile(source).unwrap();
    let ticks: Vec<u32> = morae.iter().map(|m| m.tick).collect();
    // san carries its coda to the end of the score.
    assert_eq!(ticks, vec![72, 73, 72, 110, 31]);
    assert_eq!(morae[3].consonant1, "s");
    assert_eq!(morae[4].consonant1, "n");
}

#[test]
fn test_tempo_and_octave_pragmas() {
    let source = "# tempo 60\n# octave 5\nla\na\n";
    let morae = compile(source).unwrap();
    assert_eq!(morae[0].tick, 440);
    assert_eq!(morae[0].pitch_name(), "A5");
}

#[test]
fn test_transpose_pragma() {
    let morae = compile("# transpose 2\nla\nc\n").unwrap();
    assert_eq!(morae[0].pitch_name(), "D4");
}

#[test]
fn test_lyric_without_melody_is_error() {
    let err = compile("ka\n").unwrap_err();
    assert_eq!(err.to_string(), "L1:1: 'ka' no note for syllable");
}

#[test]
fn test_unmatched_lyric_reports_its_own_line() {
    let err = compile("ka\n\n! x\n").unwrap_err();
    assert_eq!(err.to_string(), "L1:1: 'ka' no note for syllable");
}

#[test]
fn test_extreme_numbers_are_errors_not_panics() {
    assert!(matches!(
        compile("# tempo 4294967295\n"),
        Err(MoraError::Pragma { .. })
    ));
    assert!(compile("# tick_unit 4000000000\nka\nc-\n").is_err());
    assert!(compile("# octave 2147483647\nka\n< c\n").is_err());
    assert_eq!(compile("ka\no999999999 c\n").unwrap()[0].key, 127);
}

#[test]
fn test_syntax_error_message() {
    let err = compile("kaq\nc\n").unwrap_err();
    assert_eq!(
        err,
        MoraError::Syntax {
            line: 1,
            column: 1,
            text: "kaq".to_string()
        }
    );
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "tempo: 60").unwrap();
    writeln!(file, "octave: 3").unwrap();
    let env = Environment::load(file.path()).unwrap();
    let morae = compile_with("ka\nc\n", env).unwrap();
    assert_eq!(morae[0].tick, 440);
    assert_eq!(morae[0].pitch_name(), "C3");
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Environment::load(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(MoraError::Config(_))));
}
