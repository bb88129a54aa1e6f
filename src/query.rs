//! Statement model and SQL text parser. `parse` maps one statement to a
//! typed `Statement`; splitting a script into statements and stripping
//! comments live in `query_common`.

use anyhow::{bail, Result};

pub mod query_common;
pub mod query_parse_create;
pub mod query_parse_delete;
pub mod query_parse_insert;
pub mod query_parse_select;
pub mod query_parse_where;

// Re-export helpers and parse entry points so callers can keep using
// `crate::query::*` paths.
pub use query_common::*;
pub use query_parse_create::*;
pub use query_parse_delete::*;
pub use query_parse_insert::*;
pub use query_parse_select::*;
pub use query_parse_where::*;

use crate::engine::{ColumnSpec, IndexKind};
use crate::predicate::Constraint;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    // CREATE TABLE <t> (<col> <type> [PRIMARY KEY], ...)
    CreateTable { table: String, columns: Vec<ColumnSpec> },
    // CREATE INDEX ON <t> (<col>) [USING BPTREE|HASH|SEQUENTIAL]
    CreateIndex { table: String, column: String, kind: IndexKind },
    // SELECT *|c1,...,cn FROM <t> [WHERE <dnf>]
    Select { table: String, columns: Vec<String>, constraint: Constraint },
    // SELECT ... FROM <t> WHERE <col> BETWEEN <v1> AND <v2>
    SelectBetween { table: String, columns: Vec<String>, key_column: String, low: String, high: String },
    // INSERT INTO <t> VALUES (...); the value list is emitted in reverse of
    // its textual order and the insert path reverses it again.
    Insert { table: String, values: Vec<String> },
    // INSERT INTO <t> FROM FILE '<path>'; the path is handed on still quoted.
    InsertFromFile { table: String, quoted_path: String },
    // DELETE FROM <t> WHERE <dnf>
    Delete { table: String, constraint: Constraint },
    // DROP TABLE <t>
    DropTable { table: String },
}

pub fn parse(input: &str) -> Result<Statement> {
    let s = input.trim();
    let up = s.to_uppercase();
    if up.starts_with("CREATE TABLE ") {
        return parse_create_table(s);
    }
    if up.starts_with("CREATE INDEX ") {
        return parse_create_index(s);
    }
    if up.starts_with("SELECT ") {
        return parse_select(s);
    }
    if up.starts_with("INSERT ") {
        return parse_insert(s);
    }
    if up.starts_with("DELETE ") {
        return parse_delete(s);
    }
    if up.starts_with("DROP TABLE ") {
        return parse_drop_table(s);
    }
    bail!("Unsupported SQL statement: {}", s)
}

pub fn parse_drop_table(s: &str) -> Result<Statement> {
    // DROP TABLE <t>
    let name = s[10..].trim();
    if name.is_empty() {
        bail!("Invalid DROP TABLE: missing table name");
    }
    let (table, rest) = read_word(name, 0);
    if !name[rest..].trim().is_empty() {
        bail!("Invalid DROP TABLE: unexpected trailing input '{}'", name[rest..].trim());
    }
    Ok(Statement::DropTable { table: strip_outer_quotes(&table).to_string() })
}
