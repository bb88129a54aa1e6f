use tracing::debug;

use crate::engine::{Attribute, Engine};
use crate::error::{DbError, DbResult};
use crate::exec::check_table_name;
use crate::predicate::Constraint;

/// Single-key delete: only the first condition of the first disjunct names
/// the deletion key; any further conditions are ignored.
pub fn remove(engine: &mut dyn Engine, table: &str, constraint: &Constraint) -> DbResult<()> {
    check_table_name(&*engine, table)?;
    let key = constraint
        .disjuncts
        .first()
        .and_then(|conjunct| conjunct.first())
        .ok_or_else(|| DbError::parse("DELETE requires at least one condition".to_string()))?;
    if constraint.disjuncts.len() > 1 || constraint.disjuncts[0].len() > 1 {
        debug!(
            target: "tabularium::exec",
            "remove: table='{}' extra conditions ignored, deleting by {}={}",
            table, key.column, key.value
        );
    }
    engine.remove(table, &Attribute::new(&key.column, &key.value))
}
