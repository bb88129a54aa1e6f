use crate::engine::{ColumnSpec, Engine, IndexKind};
use crate::error::{DbError, DbResult};
use crate::exec::check_table_name;

/// Create a table. Exactly one column must be marked PRIMARY KEY; the engine
/// is the authority on name collisions and type legality.
pub fn create_table(engine: &mut dyn Engine, table: &str, columns: &[ColumnSpec]) -> DbResult<()> {
    let mut primary: Option<&ColumnSpec> = None;
    for col in columns.iter().filter(|c| c.primary_key) {
        if primary.is_some() {
            return Err(DbError::parse(format!(
                "CREATE TABLE {}: more than one PRIMARY KEY column",
                table
            )));
        }
        primary = Some(col);
    }
    let primary = primary.ok_or_else(|| {
        DbError::parse(format!("CREATE TABLE {}: a PRIMARY KEY column is required", table))
    })?;
    engine.create_table(table, &primary.name, columns)
}

pub fn create_index(engine: &mut dyn Engine, table: &str, column: &str, kind: IndexKind) -> DbResult<()> {
    check_table_name(&*engine, table)?;
    let attributes = engine.get_table_attributes(table)?;
    if !attributes.iter().any(|a| a == column) {
        return Err(DbError::column_not_found(format!(
            "Column not found: {}.{}",
            table, column
        )));
    }
    engine.create_index(table, column, kind)
}

pub fn drop_table(engine: &mut dyn Engine, table: &str) -> DbResult<()> {
    check_table_name(&*engine, table)?;
    engine.drop_table(table)
}
