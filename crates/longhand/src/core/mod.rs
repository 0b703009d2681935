//! Arithmetic core: exact numbers, the expression grammar, evaluation and history.
//!
//! Every failure a calculation can hit is a [`CalcError`]. The session turns
//! these into on-screen messages through the configured catalog, so the
//! `Display` text here is diagnostic only.

pub mod bignum;
pub mod evaluator;
pub mod history;
pub mod parser;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for calculator operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Calculation error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    /// A number literal could not be parsed, or is not allowed here
    #[error("invalid number format: {0}")]
    InvalidNumberFormat(String),
    /// Divisor is zero
    #[error("division by zero")]
    DivisionByZero,
    /// Dividend is zero (rejected before any trace work)
    #[error("dividend is zero")]
    ZeroDividend,
    /// Square root argument contains an operator
    #[error("square root expects a single number")]
    InvalidSqrtInput,
    /// Square root of a negative number
    #[error("square root of a negative number")]
    NegativeSqrt,
    /// Exact mode only: the root is not an integer
    #[error("square root is not exact")]
    NonExactSqrt,
    /// Malformed expression grammar
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Unexpected failure while replaying a history entry
    #[error("could not re-execute operation: {0}")]
    GenericReExecutionError(String),
}

impl CalcError {
    /// Create an invalid number format error
    #[must_use]
    pub fn invalid_number(message: impl Into<String>) -> Self {
        Self::InvalidNumberFormat(message.into())
    }

    /// Create an invalid operation error
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Returns the fieldless kind used to look up the display message
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidNumberFormat(_) => ErrorKind::InvalidNumberFormat,
            Self::DivisionByZero => ErrorKind::DivisionByZero,
            Self::ZeroDividend => ErrorKind::ZeroDividend,
            Self::InvalidSqrtInput => ErrorKind::InvalidSqrtInput,
            Self::NegativeSqrt => ErrorKind::NegativeSqrt,
            Self::NonExactSqrt => ErrorKind::NonExactSqrt,
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::GenericReExecutionError(_) => ErrorKind::GenericReExecutionError,
        }
    }
}

/// Error category, one per catalog message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`CalcError::InvalidNumberFormat`]
    InvalidNumberFormat,
    /// See [`CalcError::DivisionByZero`]
    DivisionByZero,
    /// See [`CalcError::ZeroDividend`]
    ZeroDividend,
    /// See [`CalcError::InvalidSqrtInput`]
    InvalidSqrtInput,
    /// See [`CalcError::NegativeSqrt`]
    NegativeSqrt,
    /// See [`CalcError::NonExactSqrt`]
    NonExactSqrt,
    /// See [`CalcError::InvalidOperation`]
    InvalidOperation,
    /// See [`CalcError::GenericReExecutionError`]
    GenericReExecutionError,
}

impl ErrorKind {
    /// All kinds, in catalog order
    pub const ALL: [Self; 8] = [
        Self::InvalidNumberFormat,
        Self::DivisionByZero,
        Self::ZeroDividend,
        Self::InvalidSqrtInput,
        Self::NegativeSqrt,
        Self::NonExactSqrt,
        Self::InvalidOperation,
        Self::GenericReExecutionError,
    ];
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(CalcError::DivisionByZero.to_string(), "division by zero");
        assert_eq!(
            CalcError::invalid_number("12a").to_string(),
            "invalid number format: 12a"
        );
        assert_eq!(
            CalcError::invalid_operation("missing operator").to_string(),
            "invalid operation: missing operator"
        );
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(CalcError::ZeroDividend.kind(), ErrorKind::ZeroDividend);
        assert_eq!(CalcError::NonExactSqrt.kind(), ErrorKind::NonExactSqrt);
        assert_eq!(
            CalcError::GenericReExecutionError(String::new()).kind(),
            ErrorKind::GenericReExecutionError
        );
    }

    #[test]
    fn test_all_kinds_unique() {
        let mut kinds = ErrorKind::ALL.to_vec();
        kinds.dedup();
        assert_eq!(kinds.len(), 8);
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ErrorKind::NegativeSqrt).unwrap();
        assert_eq!(json, "\"NegativeSqrt\"");
        let back: ErrorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorKind::NegativeSqrt);
    }
}
