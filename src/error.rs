//! # Error Types
//!
//! This module defines the single error type of the morae compiler.
//!
//! Every error is fatal for the run: the compiler never continues past a bad
//! line. Errors carry the source line and, when one exists, the 1-based column
//! and the offending text so the user can find the problem in the score.
//!
//! ## Error Kinds
//! - `Syntax` - a lyric or melody token the tokenizers cannot recognize
//! - `Structure` - well-formed tokens in an impossible arrangement
//!   (nested or empty groups, rests before notes, syllables without notes)
//! - `Pragma` - a malformed `# <name> <integer>` line
//! - `Config` - an invalid configuration file or value
//!
//! ## Usage
//! ```rust
//! use morae::{compile, MoraError};
//!
//! match compile("ka\nc-\n") {
//!     Ok(morae) => println!("{} morae", morae.len()),
//!     Err(MoraError::Syntax { line, column, text }) => {
//!         eprintln!("cannot read '{}' at {}:{}", text, line, column);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MoraError {
    /// Unrecognizable input in a lyric or melody line.
    ///
    /// # Example
    /// ```
    /// # use morae::MoraError;
    /// let err = MoraError::Syntax {
    ///     line: 3,
    ///     column: 5,
    ///     text: "ka!".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "L3:5: 'ka!' unrecognizable");
    /// ```
    #[error("L{line}:{column}: '{text}' unrecognizable")]
    Syntax {
        line: usize,
        column: usize,
        text: String,
    },

    /// Structural error: the tokens are valid but cannot be arranged.
    ///
    /// # Example
    /// ```
    /// # use morae::MoraError;
    /// let err = MoraError::Structure {
    ///     line: 2,
    ///     column: 4,
    ///     text: "((".to_string(),
    ///     message: "nested parentheses are not supported".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "L2:4: '((' nested parentheses are not supported"
    /// );
    /// ```
    #[error("L{line}:{column}: '{text}' {message}")]
    Structure {
        line: usize,
        column: usize,
        text: String,
        message: String,
    },

    /// Malformed or unknown pragma line.
    #[error("L{line}: invalid pragma '{text}': {message}")]
    Pragma {
        line: usize,
        text: String,
        message: String,
    },

    /// Invalid configuration file or value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MoraError {
    pub(crate) fn structure(
        line: usize,
        column: usize,
        text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MoraError::Structure {
            line,
            column,
            text: text.into(),
            message: message.into(),
        }
    }
}
