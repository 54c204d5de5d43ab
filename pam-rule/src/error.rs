//! Error types for rule decoding.

use thiserror::Error;

/// Errors that can occur while turning a stack configuration line into a [`Rule`].
///
/// [`Rule`]: crate::Rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Module type token is not one of `auth`, `account`, `password`, `session`
    /// (optionally prefixed with `-`)
    #[error("Invalid module type \"{token}\"")]
    InvalidModuleType {
        /// The offending token, verbatim
        token: String,
    },

    /// Control flag is neither a keyword nor a bracketed action list (strict mode only)
    #[error("Unrecognized control flag \"{token}\"")]
    UnrecognizedControl {
        /// The offending token, verbatim
        token: String,
    },

    /// Bracketed control flag could not be tokenized (strict mode only)
    #[error("Malformed control flag \"{token}\": {reason}")]
    MalformedControl {
        /// The offending token, verbatim
        token: String,
        /// What was wrong with it
        reason: String,
    },

    /// Line does not split into type, control and module fields
    #[error("Malformed rule line: {reason}")]
    MalformedLine {
        /// What was wrong with it
        reason: String,
    },

    /// Any of the above, tagged with the 1-based line it came from
    #[error("line {line}: {source}")]
    Line {
        /// 1-based line number
        line: usize,
        /// Underlying failure
        #[source]
        source: Box<RuleError>,
    },
}

impl RuleError {
    pub(crate) fn malformed_control(token: &str, reason: impl Into<String>) -> Self {
        Self::MalformedControl {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn at_line(self, line: usize) -> Self {
        Self::Line {
            line,
            source: Box::new(self),
        }
    }
}
