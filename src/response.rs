//! Result containers: the per-operation `QueryResponse` produced by the
//! engine and the statement-level `ParserResponse` handed back to callers,
//! plus the order-preserving merge used to union partial results across
//! disjuncts.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::engine::Record;
use crate::error::DbError;

/// Result of a single engine operation: the matching records plus the
/// engine's per-stage timings in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub records: Vec<Record>,
    pub query_times: HashMap<String, f64>,
}

/// The externally visible result of a statement. `code` is HTTP-like:
/// 200 means success, anything else is the mapped error code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserResponse {
    pub records: Vec<Record>,
    /// Requested columns, always in schema order.
    pub column_names: Vec<String>,
    /// All tables known to the engine at the time of the query.
    pub table_names: Vec<String>,
    pub query_times: HashMap<String, f64>,
    pub error: String,
    pub code: u16,
}

impl Default for ParserResponse {
    fn default() -> Self {
        ParserResponse {
            records: Vec::new(),
            column_names: Vec::new(),
            table_names: Vec::new(),
            query_times: HashMap::new(),
            error: String::new(),
            code: 200,
        }
    }
}

impl ParserResponse {
    pub fn failed(&self) -> bool { self.code != 200 }

    /// Wipe the collections between statements. The code is intentionally
    /// left alone; only `set_error`/`set_ok` touch it.
    pub fn clear(&mut self) {
        self.records.clear();
        self.column_names.clear();
        self.table_names.clear();
        self.query_times.clear();
        self.error.clear();
    }

    pub fn set_ok(&mut self) {
        self.error.clear();
        self.code = 200;
    }

    pub fn set_error(&mut self, err: &DbError) {
        self.error = err.to_string();
        self.code = err.response_code();
    }

    /// Fold one engine response into this statement result: union the
    /// records, merge the timings.
    pub fn absorb(&mut self, partial: QueryResponse) {
        merge_records(&mut self.records, partial.records);
        merge_times(&mut self.query_times, partial.query_times);
    }
}

/// Append to `into` every record of `from` not already present, preserving
/// both relative orders. Presence is record-value equality via the stable
/// record hash.
pub fn merge_records(into: &mut Vec<Record>, from: Vec<Record>) {
    let mut seen: HashSet<u64> = into.iter().map(|r| r.hash64()).collect();
    for rec in from {
        if seen.insert(rec.hash64()) {
            into.push(rec);
        }
    }
}

/// Merge `from` into `into`. On a key collision `from` wins; engines are
/// expected to emit unique keys per call, so callers must not rely on the
/// collision behavior.
pub fn merge_times(into: &mut HashMap<String, f64>, from: HashMap<String, f64>) {
    into.extend(from);
}
