// Submodules implementing parts of exec
// NOTE: This module is intentionally kept thin. Add new logic in exec_*.rs files.
pub mod exec_create;
pub mod exec_delete;
pub mod exec_insert;
pub mod exec_select;

use tracing::debug;

use crate::engine::Engine;
use crate::error::{DbError, DbResult};
use crate::query::Statement;
use crate::response::ParserResponse;

/// Execute one parsed statement against `engine`, populating `response`.
/// On success the response also carries all table names known to the engine
/// at the time of the query.
pub fn dispatch(engine: &mut dyn Engine, response: &mut ParserResponse, stmt: Statement) -> DbResult<()> {
    debug!(target: "tabularium::exec", "dispatch: {:?}", stmt);
    match stmt {
        Statement::CreateTable { table, columns } => {
            exec_create::create_table(engine, &table, &columns)?
        }
        Statement::CreateIndex { table, column, kind } => {
            exec_create::create_index(engine, &table, &column, kind)?
        }
        Statement::Select { table, columns, constraint } => {
            exec_select::select(engine, response, &table, &columns, &constraint)?
        }
        Statement::SelectBetween { table, columns, key_column, low, high } => {
            exec_select::select_between(engine, response, &table, &columns, &key_column, &low, &high)?
        }
        Statement::Insert { table, values } => exec_insert::insert(engine, &table, &values)?,
        Statement::InsertFromFile { table, quoted_path } => {
            exec_insert::insert_from_file(engine, &table, &quoted_path)?
        }
        Statement::Delete { table, constraint } => exec_delete::remove(engine, &table, &constraint)?,
        Statement::DropTable { table } => exec_create::drop_table(engine, &table)?,
    }
    response.table_names = engine.get_table_names();
    response.set_ok();
    Ok(())
}

/// Validate that `table` is known to the engine.
pub fn check_table_name(engine: &dyn Engine, table: &str) -> DbResult<()> {
    if !engine.is_table(table) {
        return Err(DbError::table_not_found(format!("Table not found: {}", table)));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
