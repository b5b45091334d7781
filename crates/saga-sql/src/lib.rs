//! # saga-sql
//!
//! Hardening for statement text the store executes verbatim.
//!
//! Most tool operations reach the store through structured row verbs and never
//! build statement text. The few that do (free-form table reads, column
//! introspection, raw statement execution) go through this crate:
//!
//! - [`quote_str`] quotes a string as a SQL literal.
//! - [`TableAllowList`] decides which table names a caller may mention.
//! - [`StatementGuard`] parses a statement with `sqlparser` and rejects
//!   anything that is not a single query or row mutation over allow-listed
//!   tables.
//!
//! Caller-supplied identifiers are never escaped and spliced; they are either
//! on the allow-list or the operation is refused.

pub mod allow_list;
pub mod error;
pub mod escape;
pub mod guard;

pub use allow_list::{TableAllowList, is_identifier};
pub use error::GuardError;
pub use escape::quote_str;
pub use guard::{AccessMode, CheckedStatement, StatementGuard, StatementKind};
