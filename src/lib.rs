pub mod env;
pub mod error;
pub mod lexer;
pub mod mora;
pub mod note;
pub mod score;
pub mod syllable;
pub mod writer;

pub use env::Environment;
pub use error::*;
pub use mora::{Mora, MoraEngine, Postponement};
pub use score::Score;
pub use writer::{to_records, to_yaml};

/// Compile a score to morae with the default environment.
/// This is the main entry point for the library.
pub fn compile(source: &str) -> Result<Vec<Mora>, MoraError> {
    compile_with(source, Environment::default())
}

/// Compile a score starting from the given environment.
pub fn compile_with(source: &str, env: Environment) -> Result<Vec<Mora>, MoraError> {
    let mut score = Score::new(env);
    for line in source.lines() {
        score.feed_line(line)?;
    }
    score.finish()
}

/// Compile a score straight to synthesizer records.
pub fn compile_to_records(source: &str) -> Result<String, MoraError> {
    Ok(to_records(&compile(source)?))
}
