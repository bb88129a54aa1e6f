use crate::engine::Engine;
use crate::error::{DbError, DbResult};
use crate::exec::check_table_name;

/// Insert one row. `values` arrive in reverse of their textual order (the
/// statement grammar emits them innermost-first); reversing here restores
/// schema order before the engine sees the row.
pub fn insert(engine: &mut dyn Engine, table: &str, values: &[String]) -> DbResult<()> {
    check_table_name(&*engine, table)?;
    let mut ordered = values.to_vec();
    ordered.reverse();
    engine.add(table, &ordered)
}

/// Bulk insert from a CSV file. The path arrives still quoted; exactly one
/// byte is stripped at each end.
pub fn insert_from_file(engine: &mut dyn Engine, table: &str, quoted_path: &str) -> DbResult<()> {
    check_table_name(&*engine, table)?;
    if quoted_path.len() < 2 {
        return Err(DbError::parse(format!("Invalid file path: {}", quoted_path)));
    }
    let path = &quoted_path[1..quoted_path.len() - 1];
    engine.csv_insert(table, path)
}
