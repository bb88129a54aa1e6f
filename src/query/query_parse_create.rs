use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::{ColumnSpec, ColumnType, IndexKind};
use crate::query::query_common::*;
use crate::query::Statement;

static VARCHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^VARCHAR\s*\(\s*(\d+)\s*\)$").unwrap());

fn parse_column_type(text: &str) -> Result<ColumnType> {
    let up = text.trim().to_uppercase();
    match up.as_str() {
        "INT" | "INTEGER" => return Ok(ColumnType::Int),
        "FLOAT" | "DOUBLE" | "REAL" => return Ok(ColumnType::Float),
        "BOOL" | "BOOLEAN" => return Ok(ColumnType::Bool),
        _ => {}
    }
    if let Some(caps) = VARCHAR_RE.captures(&up) {
        let n: u32 = caps[1].parse().map_err(|_| anyhow!("Invalid VARCHAR width: {}", text))?;
        if n == 0 { bail!("Invalid VARCHAR width: 0"); }
        return Ok(ColumnType::Varchar(n));
    }
    bail!("Unknown column type: {}", text)
}

fn parse_column_def(def: &str) -> Result<ColumnSpec> {
    let def = def.trim();
    let (name, rest) = read_word(def, 0);
    if name.is_empty() {
        bail!("Invalid column definition: '{}'", def);
    }
    let name = strip_outer_quotes(&name).to_string();
    let mut type_text = def[rest..].trim().to_string();
    let up = type_text.to_uppercase();
    let mut primary_key = false;
    if let Some(stripped) = up.strip_suffix("PRIMARY KEY") {
        primary_key = true;
        type_text.truncate(stripped.trim_end().len());
    } else if let Some(stripped) = up.strip_suffix(" PK") {
        primary_key = true;
        type_text.truncate(stripped.trim_end().len());
    }
    let ty = parse_column_type(type_text.trim())?;
    Ok(ColumnSpec { name, ty, primary_key })
}

pub fn parse_create_table(s: &str) -> Result<Statement> {
    // CREATE TABLE <t> (<col> <type> [PRIMARY KEY], ...)
    let rest = s[12..].trim();
    let open = rest
        .find('(')
        .ok_or_else(|| anyhow!("Invalid CREATE TABLE: expected column list"))?;
    let table = strip_outer_quotes(rest[..open].trim()).to_string();
    if table.is_empty() {
        bail!("Invalid CREATE TABLE: missing table name");
    }
    let (inner, used) = extract_paren_block(&rest[open..])
        .ok_or_else(|| anyhow!("Invalid CREATE TABLE: unbalanced column list"))?;
    if !rest[open + used..].trim().is_empty() {
        bail!("Invalid CREATE TABLE: unexpected trailing input");
    }
    let mut columns: Vec<ColumnSpec> = Vec::new();
    for def in split_csv_ignoring_quotes(inner) {
        if def.is_empty() { continue; }
        columns.push(parse_column_def(&def)?);
    }
    if columns.is_empty() {
        bail!("Invalid CREATE TABLE: no columns");
    }
    Ok(Statement::CreateTable { table, columns })
}

pub fn parse_create_index(s: &str) -> Result<Statement> {
    // CREATE INDEX ON <t> (<col>) [USING BPTREE|HASH|SEQUENTIAL]
    let rest = s[12..].trim();
    let up = rest.to_uppercase();
    if !up.starts_with("ON ") {
        bail!("Invalid CREATE INDEX: expected ON <table>");
    }
    let after_on = rest[3..].trim();
    let open = after_on
        .find('(')
        .ok_or_else(|| anyhow!("Invalid CREATE INDEX: expected (<column>)"))?;
    let table = strip_outer_quotes(after_on[..open].trim()).to_string();
    if table.is_empty() {
        bail!("Invalid CREATE INDEX: missing table name");
    }
    let (inner, used) = extract_paren_block(&after_on[open..])
        .ok_or_else(|| anyhow!("Invalid CREATE INDEX: unbalanced column list"))?;
    let column = strip_outer_quotes(inner.trim()).to_string();
    if column.is_empty() || column.contains(',') {
        bail!("Invalid CREATE INDEX: exactly one column required");
    }
    let tail = after_on[open + used..].trim();
    let kind = if tail.is_empty() {
        IndexKind::BPlusTree
    } else {
        let tail_up = tail.to_uppercase();
        let kind_word = tail_up
            .strip_prefix("USING ")
            .ok_or_else(|| anyhow!("Invalid CREATE INDEX: unexpected trailing input '{}'", tail))?;
        match kind_word.trim() {
            "BPTREE" | "BTREE" | "BPLUSTREE" => IndexKind::BPlusTree,
            "HASH" => IndexKind::Hash,
            "SEQ" | "SEQUENTIAL" => IndexKind::Sequential,
            other => bail!("Unknown index kind: {}", other),
        }
    };
    Ok(Statement::CreateIndex { table, column, kind })
}
