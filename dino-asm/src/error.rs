//! Assembler error taxonomy.
//!
//! Every variant is fatal: a failed run delivers no byte stream. The host
//! is only expected to surface the message to its operator.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AsmError {
    #[error("unknown mnemonic: {0}")]
    UnknownMnemonic(String),

    #[error("invalid register: {0}")]
    InvalidRegister(String),

    #[error("invalid integer operand: {0}")]
    InvalidImmediate(String),

    #[error("value {0} does not fit in 16 bits")]
    ValueOutOfRange(i64),

    #[error("missing operand for {0}")]
    MissingOperand(&'static str),

    #[error("undefined label: {0}")]
    UndefinedLabel(String),

    #[error("duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("label {0} resolves to offset {1}, beyond the 16-bit address space")]
    LabelOutOfRange(String, usize),
}
