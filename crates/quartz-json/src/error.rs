use quartz_json_binary::BinaryError;
use quartz_json_dom::DomError;
use quartz_json_path::PathParseError;
use thiserror::Error;

/// Errors surfaced by the facade. Coercion misfits and packet
/// overflow are warnings on the [`Session`](crate::Session), not
/// errors; partial-update declines are not visible at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Binary(#[from] BinaryError),
    #[error(transparent)]
    Path(#[from] PathParseError),
    #[error("json document exceeds the maximum nesting depth of 100")]
    DepthExceeded,
}

impl JsonError {
    /// True for any of the depth-guard failures, whichever layer
    /// raised it.
    pub fn is_depth_exceeded(&self) -> bool {
        matches!(
            self,
            JsonError::DepthExceeded
                | JsonError::Dom(DomError::DepthExceeded { .. })
                | JsonError::Binary(BinaryError::TooDeep)
        )
    }
}
