//! Literal escaping.

/// Quote a string as a SQL literal, doubling embedded single quotes.
pub fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
