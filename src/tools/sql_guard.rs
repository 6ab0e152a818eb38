//! Read-only guard for caller-supplied SQL.
//!
//! A lexical classifier, not a parser: it strips leading comments, blanks string
//! literals and scans what is left for verbs that could modify data or run
//! procedural code. A harmless statement that mentions `update` inside a
//! double-quoted identifier or a trailing comment is rejected too.
//!
//! Checks run in a fixed order and the first failure wins.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Bind name used for the row cap in [`wrap_with_row_limit`].
pub const ROW_LIMIT_BIND: &str = "mcp_max_rows";

static FORBIDDEN_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(insert|update|delete|merge|drop|alter|truncate|create|grant|revoke|begin|declare|commit|rollback|execute|exec|call)\b",
    )
    .expect("forbidden keyword pattern is valid")
});

static FOR_UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+update\b").expect("for update pattern is valid")
});

/// Why a statement was not accepted as read-only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardRejection {
    #[error("SQL is empty.")]
    Empty,

    #[error("Multiple statements are not allowed.")]
    MultipleStatements,

    #[error("SQL is empty after trimming comments.")]
    EmptyAfterComments,

    #[error("SQL must start with SELECT or WITH.")]
    NotSelect,

    #[error("Unterminated string literal.")]
    UnterminatedLiteral,

    #[error("Detected potentially non-read-only keyword: {0}.")]
    ForbiddenKeyword(String),

    #[error("SELECT ... FOR UPDATE is not allowed.")]
    ForUpdate,
}

/// Accept only a single SELECT (or WITH ... SELECT) statement.
pub fn validate_read_only(sql: &str) -> Result<(), GuardRejection> {
    if sql.trim().is_empty() {
        return Err(GuardRejection::Empty);
    }

    // Checked on the raw text, so a ';' inside a literal or comment still counts.
    if sql.contains(';') {
        return Err(GuardRejection::MultipleStatements);
    }

    let body = strip_leading_comments(sql);
    if body.is_empty() {
        return Err(GuardRejection::EmptyAfterComments);
    }

    let first = first_token(body);
    if !first.eq_ignore_ascii_case("select") && !first.eq_ignore_ascii_case("with") {
        return Err(GuardRejection::NotSelect);
    }

    let sanitized = blank_string_literals(body).ok_or(GuardRejection::UnterminatedLiteral)?;

    if let Some(found) = FORBIDDEN_KEYWORD.find(&sanitized) {
        return Err(GuardRejection::ForbiddenKeyword(
            found.as_str().to_ascii_uppercase(),
        ));
    }

    // FOR UPDATE stays an explicit step of the check order.
    if FOR_UPDATE.is_match(&sanitized) {
        return Err(GuardRejection::ForUpdate);
    }

    Ok(())
}

/// Remove any run of leading `--` line comments and `/* */` block comments.
///
/// An unclosed comment swallows the rest of the input. Comments after the first
/// token are left alone.
pub fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.find('\n').map_or("", |end| &after[end + 1..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |end| &after[end + 2..]);
        } else {
            return rest;
        }
        rest = rest.trim_start();
    }
}

/// Copy of `sql` with the contents of every single-quoted literal replaced by spaces.
///
/// A doubled quote inside a literal is an escaped quote and stays part of the
/// literal. Returns `None` when a literal is never closed. The result has the same
/// length in bytes as long as the blanked text is ASCII.
pub fn blank_string_literals(sql: &str) -> Option<String> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_literal = false;

    while let Some(c) = chars.next() {
        if !in_literal {
            if c == '\'' {
                in_literal = true;
            }
            out.push(c);
            continue;
        }

        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push_str("  ");
            } else {
                in_literal = false;
                out.push(c);
            }
        } else {
            out.push(' ');
        }
    }

    (!in_literal).then_some(out)
}

/// Wrap an accepted statement so Oracle stops after `:mcp_max_rows` rows.
///
/// The line breaks keep a trailing `--` comment from commenting out the closing
/// parenthesis.
pub fn wrap_with_row_limit(sql: &str) -> String {
    format!("select * from (\n{sql}\n) where rownum <= :{ROW_LIMIT_BIND}")
}

/// Clamp a requested count into `1..=max`.
pub fn clamp_row_count(requested: i64, max: u32) -> u32 {
    let max = max.max(1);
    if requested <= 0 {
        1
    } else {
        u32::try_from(requested).map_or(max, |value| value.min(max))
    }
}

fn first_token(sql: &str) -> &str {
    let end = sql
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '#')))
        .unwrap_or(sql.len());
    &sql[..end]
}
