//!
//! tabularium storage module
//! -------------------------
//! In-memory implementation of the `Engine` contract: one heap of rows per
//! table plus per-column ordered indexes. Field values are stored as text
//! and parsed against the declared column type whenever they are compared,
//! indexed or validated.
//!
//! Key responsibilities:
//! - Schema management with a single primary-key column per table.
//! - Row ingestion with per-column type validation and duplicate-key checks.
//! - Point and inclusive range scans driven by `BTreeMap` indexes, with a
//!   sequential fallback when a column is not indexed.
//! - CSV bulk ingestion for `INSERT FROM FILE`.
//! - Timing telemetry: every read operation stamps a unique `op#seq table`
//!   key with its elapsed milliseconds.
//!
//! The index kind (`BPTREE`/`HASH`/`SEQUENTIAL`) is recorded but advisory:
//! all in-memory indexes are ordered maps and serve both point and range
//! lookups.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound::{Included, Unbounded};
use std::time::Instant;

use tracing::debug;

use crate::engine::{Attribute, ColumnSpec, ColumnType, Engine, IndexKind, Record};
use crate::error::{DbError, DbResult};
use crate::predicate::{CompOp, Comparator, Residual};
use crate::response::QueryResponse;

/// A field value parsed against its column type. Keys of one index always
/// share a column type; the cross-type ordering below only exists to keep
/// the ordering total.
#[derive(Debug, Clone)]
enum TypedValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl TypedValue {
    fn parse(ty: ColumnType, text: &str) -> DbResult<TypedValue> {
        let t = text.trim();
        match ty {
            ColumnType::Int => t
                .parse::<i64>()
                .map(TypedValue::Int)
                .map_err(|_| DbError::engine(format!("invalid INT literal: '{}'", text))),
            ColumnType::Float => t
                .parse::<f64>()
                .map(TypedValue::Float)
                .map_err(|_| DbError::engine(format!("invalid FLOAT literal: '{}'", text))),
            ColumnType::Varchar(width) => {
                if t.chars().count() > width as usize {
                    return Err(DbError::engine(format!(
                        "value exceeds VARCHAR({}): '{}'",
                        width, text
                    )));
                }
                Ok(TypedValue::Str(t.to_string()))
            }
            ColumnType::Bool => match t.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(TypedValue::Bool(true)),
                "false" | "f" | "0" => Ok(TypedValue::Bool(false)),
                _ => Err(DbError::engine(format!("invalid BOOL literal: '{}'", text))),
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            TypedValue::Int(_) => 0,
            TypedValue::Float(_) => 1,
            TypedValue::Str(_) => 2,
            TypedValue::Bool(_) => 3,
        }
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for TypedValue {}

impl PartialOrd for TypedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for TypedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TypedValue::Int(a), TypedValue::Int(b)) => a.cmp(b),
            (TypedValue::Float(a), TypedValue::Float(b)) => a.total_cmp(b),
            (TypedValue::Str(a), TypedValue::Str(b)) => a.cmp(b),
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

struct IndexData {
    kind: IndexKind,
    map: BTreeMap<TypedValue, Vec<usize>>,
}

struct TableData {
    columns: Vec<ColumnSpec>,
    primary_key: String,
    rows: Vec<Vec<String>>,
    indexes: BTreeMap<String, IndexData>,
}

impl TableData {
    fn col_pos(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == column)
    }

    fn column(&self, table: &str, name: &str) -> DbResult<(usize, ColumnType)> {
        let pos = self.col_pos(name).ok_or_else(|| {
            DbError::column_not_found(format!("Column not found: {}.{}", table, name))
        })?;
        Ok((pos, self.columns[pos].ty))
    }

    fn attribute_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn projection(&self, table: &str, columns: &[String]) -> DbResult<Vec<usize>> {
        columns.iter().map(|c| self.column(table, c).map(|(pos, _)| pos)).collect()
    }

    fn project(&self, row: &[String], positions: &[usize]) -> Record {
        Record::new(positions.iter().map(|&p| row[p].clone()).collect())
    }

    /// Validate and append one row (values in schema order), keeping every
    /// index in step.
    fn insert_row(&mut self, table: &str, values: Vec<String>) -> DbResult<()> {
        if values.len() != self.columns.len() {
            return Err(DbError::engine(format!(
                "{}: expected {} values, got {}",
                table,
                self.columns.len(),
                values.len()
            )));
        }
        let mut typed: Vec<TypedValue> = Vec::with_capacity(values.len());
        for (col, value) in self.columns.iter().zip(values.iter()) {
            typed.push(TypedValue::parse(col.ty, value)?);
        }

        // Primary-key uniqueness, via the pk index when one exists.
        if let Some(pk_pos) = self.col_pos(&self.primary_key) {
            let pk_value = &typed[pk_pos];
            let duplicate = match self.indexes.get(&self.primary_key) {
                Some(idx) => idx.map.contains_key(pk_value),
                None => {
                    let ty = self.columns[pk_pos].ty;
                    self.rows.iter().any(|row| {
                        TypedValue::parse(ty, &row[pk_pos])
                            .map(|v| v == *pk_value)
                            .unwrap_or(false)
                    })
                }
            };
            if duplicate {
                return Err(DbError::engine(format!(
                    "{}: duplicate primary key '{}'",
                    table, values[pk_pos]
                )));
            }
        }

        let row_id = self.rows.len();
        for (name, index) in self.indexes.iter_mut() {
            if let Some(pos) = self.columns.iter().position(|c| &c.name == name) {
                index.map.entry(typed[pos].clone()).or_default().push(row_id);
            }
        }
        self.rows.push(values);
        Ok(())
    }

    /// Recompute every index map from the heap; used after deletions shift
    /// row ids.
    fn rebuild_indexes(&mut self) -> DbResult<()> {
        let columns = self.columns.clone();
        let rows = self.rows.clone();
        for (name, index) in self.indexes.iter_mut() {
            index.map.clear();
            let pos = match columns.iter().position(|c| &c.name == name) {
                Some(p) => p,
                None => continue,
            };
            let ty = columns[pos].ty;
            for (row_id, row) in rows.iter().enumerate() {
                let key = TypedValue::parse(ty, &row[pos])?;
                index.map.entry(key).or_default().push(row_id);
            }
        }
        Ok(())
    }
}

/// In-memory storage engine. Tables are kept in name order, which makes
/// `get_table_names` deterministic.
pub struct MemoryEngine {
    tables: BTreeMap<String, TableData>,
    seq: u64,
}

impl Default for MemoryEngine {
    fn default() -> Self { MemoryEngine::new() }
}

impl MemoryEngine {
    pub fn new() -> Self {
        MemoryEngine { tables: BTreeMap::new(), seq: 0 }
    }

    fn table(&self, name: &str) -> DbResult<&TableData> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::table_not_found(format!("Table not found: {}", name)))
    }

    fn table_mut(&mut self, name: &str) -> DbResult<&mut TableData> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::table_not_found(format!("Table not found: {}", name)))
    }

    fn stamp(&mut self, resp: &mut QueryResponse, op: &str, table: &str, started: Instant) {
        self.seq += 1;
        let key = format!("{}#{} {}", op, self.seq, table);
        resp.query_times.insert(key, started.elapsed().as_secs_f64() * 1e3);
    }

    fn collect(
        data: &TableData,
        positions: &[usize],
        row_ids: impl Iterator<Item = usize>,
        residual: &Residual,
    ) -> Vec<Record> {
        let mut out = Vec::new();
        for id in row_ids {
            let row = &data.rows[id];
            if residual.accepts(&Record::new(row.clone())) {
                out.push(data.project(row, positions));
            }
        }
        out
    }
}

/// Quote-aware split of one CSV line; outer quotes are removed and fields
/// trimmed.
fn csv_fields(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_s = false;
    let mut in_d = false;
    for ch in line.chars() {
        match ch {
            '\'' if !in_d => { in_s = !in_s; cur.push(ch); }
            '"' if !in_s => { in_d = !in_d; cur.push(ch); }
            ',' if !in_s && !in_d => { out.push(cur.trim().to_string()); cur.clear(); }
            _ => cur.push(ch),
        }
    }
    out.push(cur.trim().to_string());
    out.into_iter()
        .map(|f| {
            if f.len() >= 2 {
                let b = f.as_bytes();
                let first = b[0] as char;
                let last = b[f.len() - 1] as char;
                if (first == '\'' && last == '\'') || (first == '"' && last == '"') {
                    return f[1..f.len() - 1].to_string();
                }
            }
            f
        })
        .collect()
}

impl Engine for MemoryEngine {
    fn is_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    fn get_table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn get_table_attributes(&self, table: &str) -> DbResult<Vec<String>> {
        Ok(self.table(table)?.attribute_names())
    }

    fn sort_attributes(&self, table: &str, columns: &[String]) -> DbResult<Vec<String>> {
        let data = self.table(table)?;
        Ok(data
            .columns
            .iter()
            .map(|c| c.name.clone())
            .filter(|name| columns.iter().any(|c| c == name))
            .collect())
    }

    fn get_index_names(&self, table: &str) -> DbResult<Vec<String>> {
        Ok(self.table(table)?.indexes.keys().cloned().collect())
    }

    fn get_comparator(&self, table: &str, op: CompOp, column: &str, value: &str) -> DbResult<Comparator> {
        let data = self.table(table)?;
        let (pos, ty) = data.column(table, column)?;
        let target = TypedValue::parse(ty, value)?;
        Ok(Box::new(move |rec: &Record| {
            let field = match rec.fields.get(pos) {
                Some(f) => f,
                None => return false,
            };
            match TypedValue::parse(ty, field) {
                Ok(v) => {
                    let ord = v.cmp(&target);
                    match op {
                        CompOp::Eq => ord == Ordering::Equal,
                        CompOp::Lt => ord == Ordering::Less,
                        CompOp::Le => ord != Ordering::Greater,
                        CompOp::Gt => ord == Ordering::Greater,
                        CompOp::Ge => ord != Ordering::Less,
                    }
                }
                Err(_) => false,
            }
        }))
    }

    fn create_table(&mut self, table: &str, primary_key: &str, columns: &[ColumnSpec]) -> DbResult<()> {
        debug!(target: "tabularium::storage", "create_table: table='{}' pk='{}' cols={}", table, primary_key, columns.len());
        if self.tables.contains_key(table) {
            return Err(DbError::engine(format!("Table already exists: {}", table)));
        }
        if columns.is_empty() {
            return Err(DbError::engine(format!("{}: a table needs at least one column", table)));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for col in columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DbError::engine(format!("{}: duplicate column '{}'", table, col.name)));
            }
        }
        if !columns.iter().any(|c| c.name == primary_key) {
            return Err(DbError::engine(format!(
                "{}: primary key '{}' is not a column",
                table, primary_key
            )));
        }
        self.tables.insert(
            table.to_string(),
            TableData {
                columns: columns.to_vec(),
                primary_key: primary_key.to_string(),
                rows: Vec::new(),
                indexes: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn create_index(&mut self, table: &str, column: &str, kind: IndexKind) -> DbResult<()> {
        debug!(target: "tabularium::storage", "create_index: table='{}' column='{}' kind={:?}", table, column, kind);
        let data = self.table_mut(table)?;
        let (pos, ty) = data.column(table, column)?;
        if data.indexes.contains_key(column) {
            return Err(DbError::engine(format!("Index already exists: {}.{}", table, column)));
        }
        let mut map: BTreeMap<TypedValue, Vec<usize>> = BTreeMap::new();
        for (row_id, row) in data.rows.iter().enumerate() {
            let key = TypedValue::parse(ty, &row[pos])?;
            map.entry(key).or_default().push(row_id);
        }
        data.indexes.insert(column.to_string(), IndexData { kind, map });
        Ok(())
    }

    fn load(&mut self, table: &str, columns: &[String], residual: Residual) -> DbResult<QueryResponse> {
        let started = Instant::now();
        let records = {
            let data = self.table(table)?;
            let positions = data.projection(table, columns)?;
            Self::collect(data, &positions, 0..data.rows.len(), &residual)
        };
        debug!(target: "tabularium::storage", "load: table='{}' rows={}", table, records.len());
        let mut resp = QueryResponse { records, query_times: HashMap::new() };
        self.stamp(&mut resp, "load", table, started);
        Ok(resp)
    }

    fn search(&mut self, table: &str, key: &Attribute, residual: Residual, columns: &[String]) -> DbResult<QueryResponse> {
        let started = Instant::now();
        let records = {
            let data = self.table(table)?;
            let positions = data.projection(table, columns)?;
            let (pos, ty) = data.column(table, &key.name)?;
            let target = TypedValue::parse(ty, &key.value)?;
            let row_ids: Vec<usize> = match data.indexes.get(&key.name) {
                Some(index) => index.map.get(&target).cloned().unwrap_or_default(),
                None => {
                    debug!(target: "tabularium::storage", "search: no index on {}.{}, sequential fallback", table, key.name);
                    data.rows
                        .iter()
                        .enumerate()
                        .filter(|(_, row)| {
                            TypedValue::parse(ty, &row[pos]).map(|v| v == target).unwrap_or(false)
                        })
                        .map(|(id, _)| id)
                        .collect()
                }
            };
            Self::collect(data, &positions, row_ids.into_iter(), &residual)
        };
        let mut resp = QueryResponse { records, query_times: HashMap::new() };
        self.stamp(&mut resp, "search", table, started);
        Ok(resp)
    }

    fn range_search(&mut self, table: &str, lo: &Attribute, hi: &Attribute, residual: Residual, columns: &[String]) -> DbResult<QueryResponse> {
        let started = Instant::now();
        if lo.name != hi.name {
            return Err(DbError::engine(format!(
                "range_search: endpoints name different columns: {} vs {}",
                lo.name, hi.name
            )));
        }
        let records = {
            let data = self.table(table)?;
            let positions = data.projection(table, columns)?;
            let (pos, ty) = data.column(table, &lo.name)?;
            let lo_key = if lo.is_key_min() { None } else { Some(TypedValue::parse(ty, &lo.value)?) };
            let hi_key = if hi.is_key_max() { None } else { Some(TypedValue::parse(ty, &hi.value)?) };
            let row_ids: Vec<usize> = match data.indexes.get(&lo.name) {
                Some(index) => {
                    let lo_bound = lo_key.clone().map(Included).unwrap_or(Unbounded);
                    let hi_bound = hi_key.clone().map(Included).unwrap_or(Unbounded);
                    index
                        .map
                        .range((lo_bound, hi_bound))
                        .flat_map(|(_, ids)| ids.iter().copied())
                        .collect()
                }
                None => {
                    debug!(target: "tabularium::storage", "range_search: no index on {}.{}, sequential fallback", table, lo.name);
                    data.rows
                        .iter()
                        .enumerate()
                        .filter(|(_, row)| match TypedValue::parse(ty, &row[pos]) {
                            Ok(v) => {
                                lo_key.as_ref().map(|k| v.cmp(k) != Ordering::Less).unwrap_or(true)
                                    && hi_key.as_ref().map(|k| v.cmp(k) != Ordering::Greater).unwrap_or(true)
                            }
                            Err(_) => false,
                        })
                        .map(|(id, _)| id)
                        .collect()
                }
            };
            Self::collect(data, &positions, row_ids.into_iter(), &residual)
        };
        let mut resp = QueryResponse { records, query_times: HashMap::new() };
        self.stamp(&mut resp, "range_search", table, started);
        Ok(resp)
    }

    fn add(&mut self, table: &str, values: &[String]) -> DbResult<()> {
        let data = self.table_mut(table)?;
        data.insert_row(table, values.to_vec())
    }

    fn csv_insert(&mut self, table: &str, path: &str) -> DbResult<()> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DbError::engine(format!("csv_insert: cannot read {}: {}", path, e)))?;
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| DbError::engine(format!("csv_insert: {} is empty", path)))?;
        let names = csv_fields(header);
        let data = self.table_mut(table)?;
        if names.len() != data.columns.len() {
            return Err(DbError::engine(format!(
                "csv_insert: header has {} fields, table {} has {} columns",
                names.len(),
                table,
                data.columns.len()
            )));
        }
        // Header names may appear in any order; rows are remapped to schema order.
        let mapping: Vec<usize> = data
            .columns
            .iter()
            .map(|c| {
                names.iter().position(|n| n == &c.name).ok_or_else(|| {
                    DbError::engine(format!("csv_insert: header is missing column '{}'", c.name))
                })
            })
            .collect::<DbResult<_>>()?;
        let mut inserted = 0usize;
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields = csv_fields(line);
            if fields.len() != names.len() {
                return Err(DbError::engine(format!(
                    "csv_insert: row has {} fields, expected {}: '{}'",
                    fields.len(),
                    names.len(),
                    line
                )));
            }
            let ordered: Vec<String> = mapping.iter().map(|&i| fields[i].clone()).collect();
            data.insert_row(table, ordered)?;
            inserted += 1;
        }
        debug!(target: "tabularium::storage", "csv_insert: table='{}' path='{}' rows={}", table, path, inserted);
        Ok(())
    }

    fn remove(&mut self, table: &str, key: &Attribute) -> DbResult<()> {
        let data = self.table_mut(table)?;
        let (pos, ty) = data.column(table, &key.name)?;
        let target = TypedValue::parse(ty, &key.value)?;
        let before = data.rows.len();
        data.rows.retain(|row| {
            TypedValue::parse(ty, &row[pos]).map(|v| v != target).unwrap_or(true)
        });
        let removed = before - data.rows.len();
        if removed > 0 {
            data.rebuild_indexes()?;
        }
        debug!(target: "tabularium::storage", "remove: table='{}' {}={} removed={}", table, key.name, key.value, removed);
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> DbResult<()> {
        debug!(target: "tabularium::storage", "drop_table: table='{}'", table);
        self.tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| DbError::table_not_found(format!("Table not found: {}", table)))
    }
}
