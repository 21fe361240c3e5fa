use thiserror::Error;

/// Maximum nesting depth of a JSON document. A scalar is at depth 1,
/// so `[1]` has depth 2. Enforced by the parser and by every
/// operation that can extend depth.
pub const MAX_DEPTH: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("syntax error in json text at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("json document exceeds the maximum nesting depth of 100")]
    DepthExceeded { offset: usize },
}

impl DomError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        DomError::Syntax {
            offset,
            message: message.into(),
        }
    }
}
