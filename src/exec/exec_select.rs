use tracing::debug;

use crate::engine::{Attribute, Engine};
use crate::error::{DbError, DbResult};
use crate::exec::check_table_name;
use crate::planner::compile_conjunct;
use crate::predicate::{CompOp, Constraint, Residual};
use crate::response::{merge_times, ParserResponse};

/// Resolve the requested projection to schema order. `["*"]` selects every
/// attribute; otherwise each requested column must exist.
fn resolve_columns(engine: &dyn Engine, table: &str, requested: &[String]) -> DbResult<Vec<String>> {
    let attributes = engine.get_table_attributes(table)?;
    if requested.len() == 1 && requested[0] == "*" {
        return Ok(attributes);
    }
    for col in requested {
        if !attributes.iter().any(|a| a == col) {
            return Err(DbError::column_not_found(format!(
                "Column not found: {}.{}",
                table, col
            )));
        }
    }
    engine.sort_attributes(table, requested)
}

pub fn select(
    engine: &mut dyn Engine,
    response: &mut ParserResponse,
    table: &str,
    requested: &[String],
    constraint: &Constraint,
) -> DbResult<()> {
    check_table_name(&*engine, table)?;
    let sorted = resolve_columns(&*engine, table, requested)?;

    if constraint.is_empty() {
        // Full scan with no predicate; the engine's records are taken as-is,
        // duplicates included.
        let partial = engine.load(table, &sorted, Residual::True)?;
        response.records = partial.records;
        merge_times(&mut response.query_times, partial.query_times);
        response.column_names = sorted;
        return Ok(());
    }

    for conjunct in &constraint.disjuncts {
        let plan = compile_conjunct(&*engine, table, conjunct)?;
        match plan.index_key {
            None => {
                // No indexable column in this branch: fall back to a filtered
                // full scan, which subsumes every other branch. Earlier
                // partial results are discarded; their timings are kept.
                debug!(
                    target: "tabularium::exec",
                    "select: table='{}' unindexed branch, full scan replaces prior partials",
                    table
                );
                let partial = engine.load(table, &sorted, plan.residual)?;
                response.records = partial.records;
                merge_times(&mut response.query_times, partial.query_times);
                break;
            }
            Some(driver) => {
                let partial = match driver.op {
                    CompOp::Eq => engine.search(
                        table,
                        &Attribute::new(&driver.column, &driver.value),
                        plan.residual,
                        &sorted,
                    )?,
                    CompOp::Lt | CompOp::Le => engine.range_search(
                        table,
                        &Attribute::key_min(&driver.column),
                        &Attribute::new(&driver.column, &driver.value),
                        plan.residual,
                        &sorted,
                    )?,
                    CompOp::Gt | CompOp::Ge => engine.range_search(
                        table,
                        &Attribute::new(&driver.column, &driver.value),
                        &Attribute::key_max(&driver.column),
                        plan.residual,
                        &sorted,
                    )?,
                };
                response.absorb(partial);
            }
        }
    }

    response.column_names = sorted;
    Ok(())
}

pub fn select_between(
    engine: &mut dyn Engine,
    response: &mut ParserResponse,
    table: &str,
    requested: &[String],
    key_column: &str,
    low: &str,
    high: &str,
) -> DbResult<()> {
    check_table_name(&*engine, table)?;
    let sorted = resolve_columns(&*engine, table, requested)?;
    let attributes = engine.get_table_attributes(table)?;
    if !attributes.iter().any(|a| a == key_column) {
        return Err(DbError::column_not_found(format!(
            "Column not found: {}.{}",
            table, key_column
        )));
    }
    let partial = engine.range_search(
        table,
        &Attribute::new(key_column, low),
        &Attribute::new(key_column, high),
        Residual::True,
        &sorted,
    )?;
    response.records = partial.records;
    merge_times(&mut response.query_times, partial.query_times);
    response.column_names = sorted;
    Ok(())
}
