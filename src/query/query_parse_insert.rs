use anyhow::{anyhow, bail, Result};

use crate::query::query_common::*;
use crate::query::Statement;

pub fn parse_insert(s: &str) -> Result<Statement> {
    // INSERT INTO <t> VALUES (v1, v2, ...)
    // INSERT INTO <t> FROM FILE '<path>'
    let rest = s[6..].trim();
    let up = rest.to_uppercase();
    if !up.starts_with("INTO ") {
        bail!("INSERT syntax error: expected INTO");
    }
    let after_into = rest[5..].trim();
    let (table_tok, used) = read_word(after_into, 0);
    let remaining = after_into[used..].trim();
    let table = strip_outer_quotes(&table_tok).to_string();
    if table.is_empty() {
        bail!("INSERT syntax error: missing table name");
    }

    let rem_up = remaining.to_uppercase();
    if rem_up.starts_with("FROM FILE ") {
        let quoted_path = remaining["FROM FILE ".len()..].trim().to_string();
        if quoted_path.is_empty() {
            bail!("INSERT FROM FILE syntax error: missing path");
        }
        // The path is handed through still quoted; the insert callback strips
        // exactly one byte at each end.
        return Ok(Statement::InsertFromFile { table, quoted_path });
    }

    if !rem_up.starts_with("VALUES") {
        bail!("INSERT syntax error: expected VALUES or FROM FILE");
    }
    let after_values = remaining["VALUES".len()..].trim();
    let (inner, used) = extract_paren_block(after_values)
        .ok_or_else(|| anyhow!("INSERT syntax error: expected (value, ...)"))?;
    if !after_values[used..].trim().is_empty() {
        bail!("INSERT syntax error: unexpected trailing input");
    }
    let mut values: Vec<String> = Vec::new();
    for tok in split_csv_ignoring_quotes(inner) {
        if tok.is_empty() {
            bail!("INSERT syntax error: empty value");
        }
        values.push(literal_text(&tok)?);
    }
    if values.is_empty() {
        bail!("INSERT syntax error: no values provided");
    }
    // The value list is emitted innermost-first (reverse of textual order),
    // matching the list construction order of the statement grammar. The
    // insert callback reverses it again to restore schema order.
    values.reverse();
    Ok(Statement::Insert { table, values })
}
