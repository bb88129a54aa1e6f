//! Predicate compiler: turns one AND-group of a DNF constraint into an
//! optional index-driving condition plus the residual row predicate applied
//! by the engine during the scan.

use tracing::debug;

use crate::engine::Engine;
use crate::error::DbResult;
use crate::predicate::{Comparator, Condition, Residual};

/// Execution plan for a single conjunct.
#[derive(Debug)]
pub struct CompiledConjunct {
    /// The condition chosen to drive an index scan, if any. Selection rule:
    /// first condition in source order whose column is indexed.
    pub index_key: Option<Condition>,
    /// Conjunction of the comparators for every condition not satisfied by
    /// the index lookup itself.
    pub residual: Residual,
}

/// Compile `conditions` against the indexes of `table`.
///
/// Invariant: a strict driver (`<`, `>`) keeps its own comparator in the
/// residual, because index range scans are endpoint-inclusive and the driver
/// op only reaches the engine through the endpoint choice.
pub fn compile_conjunct(
    engine: &dyn Engine,
    table: &str,
    conditions: &[Condition],
) -> DbResult<CompiledConjunct> {
    let indexed = engine.get_index_names(table)?;
    let mut index_key: Option<Condition> = None;
    let mut comparators: Vec<Comparator> = Vec::new();

    for cond in conditions {
        if index_key.is_none() && indexed.iter().any(|c| c == &cond.column) {
            index_key = Some(cond.clone());
            if cond.op.is_strict() {
                comparators.push(engine.get_comparator(table, cond.op, &cond.column, &cond.value)?);
            }
            continue;
        }
        comparators.push(engine.get_comparator(table, cond.op, &cond.column, &cond.value)?);
    }

    debug!(
        target: "tabularium::planner",
        "compile_conjunct: table='{}' conditions={} driver={:?}",
        table,
        conditions.len(),
        index_key.as_ref().map(|c| format!("{} {} {}", c.column, c.op.symbol(), c.value)),
    );

    Ok(CompiledConjunct { index_key, residual: Residual::conjunction(comparators) })
}
