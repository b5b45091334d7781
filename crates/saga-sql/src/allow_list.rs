//! Table name allow-list.

use crate::GuardError;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Whether `name` is a plain, unquoted SQL identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// The set of tables callers may name.
///
/// Names are matched case-insensitively, the way Postgres folds unquoted
/// identifiers. A `public.` schema prefix is accepted; any other qualifier is
/// not.
#[derive(Debug, Clone, Default)]
pub struct TableAllowList {
    tables: BTreeSet<String>,
}

impl TableAllowList {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tables: tables
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        normalize(name)
            .map(|n| self.tables.contains(&n))
            .unwrap_or(false)
    }

    /// Check a caller-supplied table name, returning its normalized form.
    pub fn check(&self, name: &str) -> Result<String, GuardError> {
        let normalized =
            normalize(name).ok_or_else(|| GuardError::InvalidIdentifier(name.to_string()))?;
        if self.tables.contains(&normalized) {
            Ok(normalized)
        } else {
            Err(GuardError::TableNotAllowed {
                table: name.to_string(),
            })
        }
    }

    /// Allowed tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }
}

fn normalize(name: &str) -> Option<String> {
    let name = name.trim();
    let bare = match name.split_once('.') {
        Some((schema, table)) if schema.eq_ignore_ascii_case("public") => table,
        Some(_) => return None,
        None => name,
    };
    is_identifier(bare).then(|| bare.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> TableAllowList {
        TableAllowList::new(["npcs", "npc_personas", "events"])
    }

    #[test]
    fn test_identifier_shape() {
        assert!(is_identifier("npcs"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("npcs; drop table npcs"));
        assert!(!is_identifier("\"npcs\""));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_check_normalizes() {
        let list = allow_list();
        assert_eq!(list.check("NPCS").unwrap(), "npcs");
        assert_eq!(list.check("public.events").unwrap(), "events");
    }

    #[test]
    fn test_check_rejects() {
        let list = allow_list();
        assert_eq!(
            list.check("players").unwrap_err(),
            GuardError::TableNotAllowed {
                table: "players".to_string()
            }
        );
        assert!(matches!(
            list.check("pg_catalog.pg_user"),
            Err(GuardError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            list.check("npcs--"),
            Err(GuardError::InvalidIdentifier(_))
        ));
    }
}
