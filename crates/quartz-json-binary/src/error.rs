use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BinaryError {
    #[error("truncated json binary document")]
    Truncated,
    #[error("invalid json binary type byte {0:#04x}")]
    InvalidTypeByte(u8),
    #[error("corrupt json binary document: {0}")]
    Corrupt(&'static str),
    #[error("object key is too long for the key entry")]
    KeyTooLong,
    #[error("json document exceeds the maximum nesting depth of 100")]
    TooDeep,
}
