//! Read-only guard for the ad-hoc SQL tool.
//!
//! Both checks are lexical: they look at the text of the statement, not a
//! parse of it. A denylisted keyword hidden inside a string literal or a
//! `--` comment is not reliably classified, and the `limit ` probe can be
//! satisfied by a literal containing that substring. Stronger guarantees
//! need a real SQL tokenizer; until then the guard rejects anything whose
//! surface shape could mutate state.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::McpError;

/// Statement-altering keywords, scanned in this order; the first match wins.
const DANGEROUS_KEYWORDS: [&str; 18] = [
    "insert",
    "update",
    "delete",
    "drop",
    "create",
    "alter",
    "truncate",
    "grant",
    "revoke",
    "execute",
    "exec",
    "call",
    "set",
    "declare",
    "begin",
    "commit",
    "rollback",
    "savepoint",
];

// A keyword only counts when flanked by whitespace, a semicolon or an open
// parenthesis, so identifiers like `update_at` pass.
static KEYWORD_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    DANGEROUS_KEYWORDS
        .iter()
        .map(|kw| {
            let re = Regex::new(&format!(r"[\s;(]{kw}[\s;(]")).expect("keyword pattern");
            (*kw, re)
        })
        .collect()
});

/// Reject any statement that is not a bare SELECT.
///
/// The original text is untouched; lowercasing and trimming are applied to
/// a comparison copy only.
pub fn validate_read_only_query(sql: &str) -> Result<(), McpError> {
    if sql.is_empty() {
        return Err(McpError::validation("SQL query must be a non-empty string"));
    }

    let trimmed = sql.trim().to_lowercase();

    if trimmed.is_empty() {
        return Err(McpError::validation("SQL query cannot be empty"));
    }

    if !trimmed.starts_with("select") {
        return Err(McpError::security("Only SELECT queries are allowed")
            .with_detail("query", query_prefix(sql)));
    }

    let padded = format!(" {trimmed} ");
    for (keyword, pattern) in KEYWORD_PATTERNS.iter() {
        if pattern.is_match(&padded) {
            return Err(McpError::security(format!(
                "Dangerous SQL keyword detected: {}",
                keyword.to_uppercase()
            ))
            .with_detail("keyword", *keyword)
            .with_detail("query", query_prefix(sql)));
        }
    }

    Ok(())
}

/// Append a row cap unless the caller already supplied a LIMIT clause.
/// A caller-provided limit is respected verbatim, whatever its value.
pub fn ensure_limit(sql: &str, max_rows: f64) -> String {
    let trimmed = sql.trim();

    if trimmed.to_lowercase().contains("limit ") {
        return trimmed.to_string();
    }

    let capped = (max_rows.floor() as i64).max(1);
    format!("{trimmed} LIMIT {capped}")
}

// First 100 characters of the original query, kept for audit details.
fn query_prefix(sql: &str) -> String {
    sql.chars().take(100).collect()
}
