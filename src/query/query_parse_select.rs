use anyhow::{bail, Result};

use crate::predicate::Constraint;
use crate::query::query_common::*;
use crate::query::query_parse_where::{parse_where_clause, WhereClause};
use crate::query::Statement;

pub fn parse_select(s: &str) -> Result<Statement> {
    // SELECT *|c1,...,cn FROM <t> [WHERE ...]
    let rest = s[6..].trim();
    let from_pos = find_keyword_outside_quotes(rest, " FROM ")
        .ok_or_else(|| anyhow::anyhow!("Invalid SELECT: expected FROM"))?;
    let cols_text = rest[..from_pos].trim();
    if cols_text.is_empty() {
        bail!("Invalid SELECT: missing column list");
    }
    let columns: Vec<String> = if cols_text == "*" {
        vec!["*".to_string()]
    } else {
        let cols: Vec<String> = split_csv_ignoring_quotes(cols_text)
            .into_iter()
            .map(|c| strip_outer_quotes(&c).to_string())
            .collect();
        if cols.iter().any(|c| c.is_empty()) {
            bail!("Invalid SELECT: empty column name in list");
        }
        if cols.iter().any(|c| c == "*") && cols.len() > 1 {
            bail!("Invalid SELECT: * cannot be combined with named columns");
        }
        cols
    };

    let after_from = rest[from_pos + " FROM ".len()..].trim();
    let (table_tok, used) = read_word(after_from, 0);
    let table = strip_outer_quotes(&table_tok).to_string();
    if table.is_empty() {
        bail!("Invalid SELECT: missing table name");
    }

    let tail = after_from[used..].trim();
    if tail.is_empty() {
        return Ok(Statement::Select { table, columns, constraint: Constraint::none() });
    }
    let tail_up = tail.to_uppercase();
    if !tail_up.starts_with("WHERE ") {
        bail!("Invalid SELECT: unexpected trailing input '{}'", tail);
    }
    match parse_where_clause(tail[6..].trim())? {
        WhereClause::Dnf(constraint) => Ok(Statement::Select { table, columns, constraint }),
        WhereClause::Between { column, low, high } => Ok(Statement::SelectBetween {
            table,
            columns,
            key_column: column,
            low,
            high,
        }),
    }
}
