//! Session façade: the externally visible object that owns a storage engine,
//! accepts SQL text, drives the parser, and returns a populated
//! `ParserResponse`. Statement callbacks live here as public methods; the
//! script loop routes every parsed statement through `exec::dispatch`.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::engine::{ColumnSpec, Engine, IndexKind};
use crate::error::{DbError, DbResult};
use crate::exec::{self, exec_create, exec_delete, exec_insert, exec_select};
use crate::predicate::Constraint;
use crate::query::{self, query_common};
use crate::response::ParserResponse;
use crate::storage::MemoryEngine;

/// A session owns exactly one engine; the engine lives as long as the
/// session. The response buffer holds the result of the last statement run.
pub struct Session {
    engine: Box<dyn Engine>,
    response: ParserResponse,
}

impl Session {
    pub fn new(engine: Box<dyn Engine>) -> Self {
        Session { engine, response: ParserResponse::default() }
    }

    /// Convenience constructor over the in-memory engine.
    pub fn in_memory() -> Self {
        Session::new(Box::new(MemoryEngine::new()))
    }

    pub fn engine(&self) -> &dyn Engine { self.engine.as_ref() }

    pub fn engine_mut(&mut self) -> &mut dyn Engine { self.engine.as_mut() }

    pub fn response(&self) -> &ParserResponse { &self.response }

    /// Wipe the response buffer between statements.
    pub fn clear(&mut self) { self.response.clear(); }

    /// Run a script. Statements execute in source order and each sees the
    /// side effects of the previous one; the response holds the result of
    /// the last statement. The first error stops the run with `code`/`error`
    /// set; side effects of earlier statements are retained.
    pub fn parse_str(&mut self, input: &str) -> &ParserResponse {
        let stripped = query_common::strip_sql_comments(input);
        for stmt_text in query_common::split_statements(&stripped) {
            self.response.clear();
            let stmt = match query::parse(&stmt_text) {
                Ok(stmt) => stmt,
                Err(e) => {
                    let err = DbError::parse(e.to_string());
                    debug!(target: "tabularium::session", "parse failed: {}", err);
                    self.response.set_error(&err);
                    return &self.response;
                }
            };
            if let Err(err) = exec::dispatch(self.engine.as_mut(), &mut self.response, stmt) {
                debug!(target: "tabularium::session", "statement failed: {}", err);
                self.response.set_error(&err);
                return &self.response;
            }
        }
        &self.response
    }

    /// Run SQL from a reader. A reader that cannot produce input leaves the
    /// current (possibly empty) response untouched.
    pub fn parse_reader<R: Read>(&mut self, mut reader: R) -> &ParserResponse {
        let mut buf = String::new();
        if reader.read_to_string(&mut buf).is_err() {
            return &self.response;
        }
        self.parse_str(&buf)
    }

    /// Run SQL from a file. A file that cannot be opened is reported as an
    /// `Io` error instead of terminating the process; see
    /// `parse_path_or_exit` for the legacy behavior.
    pub fn parse_path<P: AsRef<Path>>(&mut self, path: P) -> DbResult<&ParserResponse> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DbError::io(format!("cannot open {}: {}", path.display(), e)))?;
        Ok(self.parse_str(&text))
    }

    /// Source-compatible variant of `parse_path`: terminates the process
    /// with a non-zero status when the file cannot be opened.
    pub fn parse_path_or_exit<P: AsRef<Path>>(&mut self, path: P) -> &ParserResponse {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => self.parse_str(&text),
            Err(e) => {
                eprintln!("cannot open {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    /// Human-readable dump of table names and timing keys of the last
    /// response. Diagnostic only.
    pub fn display_response(&self) {
        println!("tables: {}", self.response.table_names.join(", "));
        let mut keys: Vec<&str> = self.response.query_times.keys().map(|k| k.as_str()).collect();
        keys.sort();
        println!("timings: {}", keys.join(", "));
        if self.response.failed() {
            println!("error [{}]: {}", self.response.code, self.response.error);
        }
    }

    // ---- statement callbacks ----------------------------------------------
    // The parser-facing surface: each callback validates names and either
    // mutates the engine or populates the response buffer.

    pub fn check_table_name(&self, table: &str) -> DbResult<()> {
        exec::check_table_name(self.engine.as_ref(), table)
    }

    pub fn create_table(&mut self, table: &str, columns: &[ColumnSpec]) -> DbResult<()> {
        exec_create::create_table(self.engine.as_mut(), table, columns)
    }

    pub fn create_index(&mut self, table: &str, column: &str, kind: IndexKind) -> DbResult<()> {
        exec_create::create_index(self.engine.as_mut(), table, column, kind)
    }

    pub fn select(&mut self, table: &str, columns: &[String], constraint: &Constraint) -> DbResult<()> {
        exec_select::select(self.engine.as_mut(), &mut self.response, table, columns, constraint)
    }

    pub fn select_between(
        &mut self,
        table: &str,
        columns: &[String],
        key_column: &str,
        low: &str,
        high: &str,
    ) -> DbResult<()> {
        exec_select::select_between(
            self.engine.as_mut(),
            &mut self.response,
            table,
            columns,
            key_column,
            low,
            high,
        )
    }

    /// Insert callback; `values` arrive in reverse of textual order.
    pub fn insert(&mut self, table: &str, values: &[String]) -> DbResult<()> {
        exec_insert::insert(self.engine.as_mut(), table, values)
    }

    pub fn insert_from_file(&mut self, table: &str, quoted_path: &str) -> DbResult<()> {
        exec_insert::insert_from_file(self.engine.as_mut(), table, quoted_path)
    }

    /// Single-key delete; see `exec_delete::remove`.
    pub fn remove(&mut self, table: &str, constraint: &Constraint) -> DbResult<()> {
        exec_delete::remove(self.engine.as_mut(), table, constraint)
    }

    pub fn drop_table(&mut self, table: &str) -> DbResult<()> {
        exec_create::drop_table(self.engine.as_mut(), table)
    }
}
