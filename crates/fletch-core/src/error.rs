//! Fatal error type for this crate.
//!
//! Non-fatal conditions (unused rule, undefined rule, possible left
//! recursion) are *not* modeled here — they go through
//! [`crate::diagnostics::Diagnostics`] instead, since emission continues
//! past them. `FletchError` is reserved for the handful of conditions
//! that actually stop compilation: a malformed AST reachable during
//! emission or analysis, and internal invariant violations.

use std::fmt::{self, Display};

#[derive(Debug, PartialEq)]
pub enum FletchError {
    /// The expression walker reached a `Rule` node. Rules are only ever
    /// entered through `Name`; reaching one directly is an internal
    /// invariant violation, not a user grammar error.
    RuleNodeInExpressionWalker,
    /// An AST node discriminator the emitter or analyzer doesn't
    /// recognize. Can't happen with the `Node` enum defined in this
    /// crate; kept as a home for future node kinds added without
    /// updating emission.
    UnknownNodeKind(&'static str),
    /// Propagated I/O failure while writing to the output stream.
    Io(String),
}

pub type FletchResult<T> = Result<T, FletchError>;

impl From<std::io::Error> for FletchError {
    fn from(err: std::io::Error) -> Self {
        FletchError::Io(err.to_string())
    }
}

impl From<fmt::Error> for FletchError {
    fn from(_err: fmt::Error) -> Self {
        FletchError::Io("formatting error while writing output".to_string())
    }
}

impl Display for FletchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FletchError::RuleNodeInExpressionWalker => {
                write!(f, "internal error: a Rule node was reached through the expression walker")
            }
            FletchError::UnknownNodeKind(kind) => write!(f, "internal error: unknown AST node kind '{kind}'"),
            FletchError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for FletchError {}
