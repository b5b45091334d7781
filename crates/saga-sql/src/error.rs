//! Error types for statement hardening.

use thiserror::Error;

/// Reasons a statement or identifier is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// SQL parsing failed.
    #[error("failed to parse SQL: {0}")]
    ParseError(String),

    #[error("empty statement")]
    Empty,

    #[error("expected exactly one statement, found {count}")]
    MultipleStatements { count: usize },

    /// DDL, privilege and session statements are never executed.
    #[error("statement not allowed: {statement}")]
    StatementNotAllowed { statement: String },

    /// A mutation was submitted where only reads are accepted.
    #[error("write statement not allowed in a read operation")]
    WriteNotAllowed,

    /// Table access is not allowed.
    #[error("access to table {table} is not allowed")]
    TableNotAllowed { table: String },

    /// A function outside the permitted set was called.
    #[error("call to function {function} is not allowed")]
    FunctionNotAllowed { function: String },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}
