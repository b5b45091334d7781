//! Statement guard.
//!
//! Parses caller-supplied statement text and decides whether it may reach the
//! store. A statement passes when it is exactly one query or row mutation and
//! every relation it mentions, including those in subqueries and CTE bodies,
//! is on the allow-list. Function calls are limited to a fixed set of pure
//! scalar and aggregate functions.

use crate::{GuardError, TableAllowList};
use sqlparser::ast::{Expr, Statement, visit_expressions, visit_relations, visit_statements};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::ops::ControlFlow;

/// What the calling operation is permitted to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

/// A statement that passed the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedStatement {
    /// Canonical rendering of the parsed statement; this is what gets executed.
    pub sql: String,
    pub kind: StatementKind,
    /// Relations referenced, in visit order, normalized.
    pub tables: Vec<String>,
}

/// Functions a statement may call. Anything else (server-side procedures,
/// file readers, `set_config`) is refused.
const ALLOWED_FUNCTIONS: &[&str] = &[
    "abs", "avg", "coalesce", "concat", "count", "greatest", "least", "length", "lower",
    "max", "min", "now", "nullif", "round", "sum", "trim", "upper",
];

/// Validates statement text against an allow-list.
#[derive(Debug)]
pub struct StatementGuard {
    dialect: PostgreSqlDialect,
    allow_list: TableAllowList,
}

impl StatementGuard {
    pub fn new(allow_list: TableAllowList) -> Self {
        Self {
            dialect: PostgreSqlDialect {},
            allow_list,
        }
    }

    pub fn allow_list(&self) -> &TableAllowList {
        &self.allow_list
    }

    /// Check `sql` and return the statement to execute.
    pub fn check(&self, sql: &str, mode: AccessMode) -> Result<CheckedStatement, GuardError> {
        let statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| GuardError::ParseError(e.to_string()))?;

        let statement = match statements.as_slice() {
            [] => return Err(GuardError::Empty),
            [single] => single,
            many => {
                return Err(GuardError::MultipleStatements { count: many.len() });
            }
        };

        let kind = classify(statement, mode)?;
        check_functions(statement)?;
        let tables = self.check_relations(statement)?;

        let checked = CheckedStatement {
            sql: statement.to_string(),
            kind,
            tables,
        };
        tracing::debug!(kind = ?checked.kind, tables = ?checked.tables, "statement passed guard");
        Ok(checked)
    }

    fn check_relations(&self, statement: &Statement) -> Result<Vec<String>, GuardError> {
        let mut tables = Vec::new();
        let flow = visit_relations(statement, |relation| {
            let name = relation.to_string().replace('"', "");
            match self.allow_list.check(&name) {
                Ok(normalized) => {
                    if !tables.contains(&normalized) {
                        tables.push(normalized);
                    }
                    ControlFlow::Continue(())
                }
                Err(_) => ControlFlow::Break(GuardError::TableNotAllowed { table: name }),
            }
        });
        match flow {
            ControlFlow::Break(err) => Err(err),
            ControlFlow::Continue(()) => Ok(tables),
        }
    }
}

/// Classify the top-level statement and every statement nested in it
/// (data-modifying CTEs are nested statements).
fn classify(statement: &Statement, mode: AccessMode) -> Result<StatementKind, GuardError> {
    let mut kind = StatementKind::Read;
    let flow = visit_statements(statement, |nested| {
        match nested {
            Statement::Query(_) => {}
            Statement::Insert { .. } | Statement::Update { .. } | Statement::Delete(_) => {
                if mode == AccessMode::ReadOnly {
                    return ControlFlow::Break(GuardError::WriteNotAllowed);
                }
                kind = StatementKind::Write;
            }
            other => {
                return ControlFlow::Break(GuardError::StatementNotAllowed {
                    statement: statement_keyword(other),
                });
            }
        }
        ControlFlow::Continue(())
    });
    match flow {
        ControlFlow::Break(err) => Err(err),
        ControlFlow::Continue(()) => Ok(kind),
    }
}

fn check_functions(statement: &Statement) -> Result<(), GuardError> {
    let flow = visit_expressions(statement, |expr| {
        if let Expr::Function(func) = expr {
            let name = func
                .name
                .to_string()
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .replace('"', "")
                .to_lowercase();
            if !ALLOWED_FUNCTIONS.contains(&name.as_str()) {
                return ControlFlow::Break(GuardError::FunctionNotAllowed { function: name });
            }
        }
        ControlFlow::Continue(())
    });
    match flow {
        ControlFlow::Break(err) => Err(err),
        ControlFlow::Continue(()) => Ok(()),
    }
}

/// Leading keywords of a statement, for error messages.
fn statement_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}
