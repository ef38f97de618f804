//! SQL text helpers: quoting, statement classification and the
//! INSERT/UPDATE builders behind the column-map writes.
//!
//! Values are never inlined by this crate; the builders emit `?`
//! placeholders and the caller binds the values in column order.

/// Lexical shape of a statement, judged from its leading keyword only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Other,
}

impl StatementKind {
    /// `Insert` when the text, after leading whitespace, starts with the
    /// `INSERT` keyword in any case.
    ///
    /// This does not understand comments, CTEs or multi-statement text;
    /// `WITH ... INSERT` classifies as `Other`.
    pub fn classify(sql: &str) -> Self {
        let head = sql.trim_start().as_bytes();
        if head.len() >= 6 && head[..6].eq_ignore_ascii_case(b"insert") {
            StatementKind::Insert
        } else {
            StatementKind::Other
        }
    }
}

/// Wraps `value` in single quotes, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Wraps `name` in double quotes, doubling embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn insert_statement<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
    let columns: Vec<String> = columns.into_iter().map(quote_identifier).collect();
    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table));
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        columns.join(", "),
        placeholders
    )
}

pub(crate) fn update_statement<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    where_clause: Option<&str>,
) -> String {
    let assignments: Vec<String> = columns
        .into_iter()
        .map(|column| format!("{} = ?", quote_identifier(column)))
        .collect();
    let mut sql = format!(
        "UPDATE {} SET {}",
        quote_identifier(table),
        assignments.join(", ")
    );
    if let Some(filter) = where_clause.map(str::trim).filter(|w| !w.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
    sql
}
