use anyhow::{bail, Result};

use crate::query::query_common::*;
use crate::query::query_parse_where::{parse_where_clause, WhereClause};
use crate::query::Statement;

pub fn parse_delete(s: &str) -> Result<Statement> {
    // DELETE FROM <t> WHERE <dnf>
    let rest = s[6..].trim();
    let up = rest.to_uppercase();
    if !up.starts_with("FROM ") {
        bail!("DELETE syntax error: expected FROM");
    }
    let after_from = rest[5..].trim();
    let (table_tok, used) = read_word(after_from, 0);
    let table = strip_outer_quotes(&table_tok).to_string();
    if table.is_empty() {
        bail!("DELETE syntax error: missing table name");
    }
    let tail = after_from[used..].trim();
    let tail_up = tail.to_uppercase();
    if !tail_up.starts_with("WHERE ") {
        bail!("DELETE syntax error: a WHERE clause is required");
    }
    match parse_where_clause(tail[6..].trim())? {
        WhereClause::Dnf(constraint) => Ok(Statement::Delete { table, constraint }),
        WhereClause::Between { .. } => bail!("DELETE syntax error: BETWEEN is not supported here"),
    }
}
