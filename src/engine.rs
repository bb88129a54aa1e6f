//! Engine adapter interface: the narrow contract the query executor requires
//! from a storage engine, together with the record/attribute/schema types
//! that cross it. `storage::MemoryEngine` is the in-tree implementation;
//! tests substitute recording mocks.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::error::DbResult;
use crate::predicate::{CompOp, Comparator, Residual};
use crate::response::QueryResponse;

/// Sentinel attribute values denoting open range endpoints for `range_search`.
pub const KEY_MIN: &str = "KEY_MIN";
pub const KEY_MAX: &str = "KEY_MAX";

/// A named value, as used for index keys and deletion keys. The value is
/// text; the engine parses it against the column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Attribute { name: name.into(), value: value.into() }
    }

    /// Open lower bound for the named column.
    pub fn key_min<N: Into<String>>(name: N) -> Self {
        Attribute { name: name.into(), value: KEY_MIN.to_string() }
    }

    /// Open upper bound for the named column.
    pub fn key_max<N: Into<String>>(name: N) -> Self {
        Attribute { name: name.into(), value: KEY_MAX.to_string() }
    }

    pub fn is_key_min(&self) -> bool { self.value == KEY_MIN }
    pub fn is_key_max(&self) -> bool { self.value == KEY_MAX }
}

/// An ordered tuple of field values as returned by the engine. Equality is
/// field-wise; `hash64` is stable across processes and consistent with
/// equality, and backs record de-duplication in the result merger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self { Record { fields } }

    pub fn hash64(&self) -> u64 {
        // Length-prefix each field so ["ab","c"] and ["a","bc"] differ.
        let mut h = Xxh3::new();
        for f in &self.fields {
            h.update(&(f.len() as u64).to_le_bytes());
            h.update(f.as_bytes());
        }
        h.digest()
    }
}

/// Logical column types supported by the grammar and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Float,
    Varchar(u32),
    Bool,
}

impl ColumnType {
    pub fn type_str(&self) -> String {
        match self {
            ColumnType::Int => "INT".to_string(),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Varchar(n) => format!("VARCHAR({})", n),
            ColumnType::Bool => "BOOL".to_string(),
        }
    }
}

/// One column of a CREATE TABLE statement, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
    pub primary_key: bool,
}

impl ColumnSpec {
    pub fn new<N: Into<String>>(name: N, ty: ColumnType, primary_key: bool) -> Self {
        ColumnSpec { name: name.into(), ty, primary_key }
    }
}

/// Index flavors the engine can be asked to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    BPlusTree,
    Hash,
    Sequential,
}

/// The operations the executor requires from a storage engine. Engines are
/// the authority on type legality, key uniqueness and their own I/O; the
/// executor performs only name-level validation before calling in.
///
/// `range_search` endpoints are inclusive; `KEY_MIN`/`KEY_MAX` values unbound
/// an endpoint. Timing keys in returned `QueryResponse`s are engine-defined
/// and expected to be unique per call.
pub trait Engine {
    fn is_table(&self, table: &str) -> bool;

    fn get_table_names(&self) -> Vec<String>;

    /// Column names of `table` in schema order.
    fn get_table_attributes(&self, table: &str) -> DbResult<Vec<String>>;

    /// Reorder `columns` (a subset of the table's attributes) into schema order.
    fn sort_attributes(&self, table: &str, columns: &[String]) -> DbResult<Vec<String>>;

    /// Names of the indexed columns of `table`.
    fn get_index_names(&self, table: &str) -> DbResult<Vec<String>>;

    /// A row predicate for `column op value`, capturing the value by value.
    fn get_comparator(&self, table: &str, op: CompOp, column: &str, value: &str) -> DbResult<Comparator>;

    fn create_table(&mut self, table: &str, primary_key: &str, columns: &[ColumnSpec]) -> DbResult<()>;

    fn create_index(&mut self, table: &str, column: &str, kind: IndexKind) -> DbResult<()>;

    /// Full scan of `table`, filtered by `residual`, projected to `columns`.
    fn load(&mut self, table: &str, columns: &[String], residual: Residual) -> DbResult<QueryResponse>;

    /// Point lookup on `key`, filtered by `residual`, projected to `columns`.
    fn search(&mut self, table: &str, key: &Attribute, residual: Residual, columns: &[String]) -> DbResult<QueryResponse>;

    /// Inclusive range scan from `lo` to `hi` on their shared column.
    fn range_search(&mut self, table: &str, lo: &Attribute, hi: &Attribute, residual: Residual, columns: &[String]) -> DbResult<QueryResponse>;

    /// Insert one row; `values` are in schema order.
    fn add(&mut self, table: &str, values: &[String]) -> DbResult<()>;

    /// Bulk-load rows from a CSV file at `path`.
    fn csv_insert(&mut self, table: &str, path: &str) -> DbResult<()>;

    /// Delete the rows matching `key`.
    fn remove(&mut self, table: &str, key: &Attribute) -> DbResult<()>;

    fn drop_table(&mut self, table: &str) -> DbResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_hash_consistent_with_equality() {
        let a = Record::new(vec!["1".into(), "alice".into()]);
        let b = Record::new(vec!["1".into(), "alice".into()]);
        let c = Record::new(vec!["2".into(), "alice".into()]);
        assert_eq!(a, b);
        assert_eq!(a.hash64(), b.hash64());
        assert_ne!(a, c);
        assert_ne!(a.hash64(), c.hash64());
    }

    #[test]
    fn record_hash_respects_field_boundaries() {
        let a = Record::new(vec!["ab".into(), "c".into()]);
        let b = Record::new(vec!["a".into(), "bc".into()]);
        assert_ne!(a.hash64(), b.hash64());
    }

    #[test]
    fn key_sentinels() {
        let lo = Attribute::key_min("id");
        let hi = Attribute::key_max("id");
        assert!(lo.is_key_min());
        assert!(hi.is_key_max());
        assert!(!Attribute::new("id", "5").is_key_min());
    }

    #[test]
    fn column_type_display() {
        assert_eq!(ColumnType::Varchar(32).type_str(), "VARCHAR(32)");
        assert_eq!(ColumnType::Int.type_str(), "INT");
    }
}
