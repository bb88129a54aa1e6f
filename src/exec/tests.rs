use std::cmp::Ordering;
use std::collections::HashMap;

use crate::engine::{Attribute, ColumnSpec, Engine, IndexKind, Record};
use crate::error::{DbError, DbResult};
use crate::exec::{self, exec_delete, exec_insert, exec_select};
use crate::planner::compile_conjunct;
use crate::predicate::{CompOp, Comparator, Condition, Constraint, Residual};
use crate::response::{ParserResponse, QueryResponse};

/// Recording engine: canned schema and rows, a call log for plan-shape
/// assertions, and just enough typed comparison to exercise residuals.
#[derive(Default)]
struct MockEngine {
    tables: Vec<String>,
    attrs: HashMap<String, Vec<String>>,
    indexed: HashMap<String, Vec<String>>,
    rows: HashMap<String, Vec<Vec<String>>>,
    calls: Vec<String>,
    seq: u32,
    last_add: Option<Vec<String>>,
    last_csv: Option<String>,
    last_removed: Option<(String, String)>,
}

fn cmp_typed(a: &str, b: &str) -> Ordering {
    if let (Ok(x), Ok(y)) = (a.parse::<i64>(), b.parse::<i64>()) {
        return x.cmp(&y);
    }
    if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
        return x.total_cmp(&y);
    }
    a.cmp(b)
}

impl MockEngine {
    fn new() -> Self { MockEngine::default() }

    fn with_table(mut self, name: &str, attrs: &[&str]) -> Self {
        self.tables.push(name.to_string());
        self.attrs.insert(name.to_string(), attrs.iter().map(|s| s.to_string()).collect());
        self.rows.insert(name.to_string(), Vec::new());
        self
    }

    fn with_index(mut self, table: &str, column: &str) -> Self {
        self.indexed.entry(table.to_string()).or_default().push(column.to_string());
        self
    }

    fn with_row(mut self, table: &str, fields: &[&str]) -> Self {
        self.rows
            .get_mut(table)
            .expect("table seeded")
            .push(fields.iter().map(|s| s.to_string()).collect());
        self
    }

    fn col_pos(&self, table: &str, column: &str) -> DbResult<usize> {
        self.attrs
            .get(table)
            .ok_or_else(|| DbError::table_not_found(format!("Table not found: {}", table)))?
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DbError::column_not_found(format!("Column not found: {}.{}", table, column)))
    }

    fn project(&self, table: &str, row: &[String], columns: &[String]) -> Record {
        let attrs = &self.attrs[table];
        let fields = columns
            .iter()
            .map(|c| row[attrs.iter().position(|a| a == c).unwrap()].clone())
            .collect();
        Record::new(fields)
    }

    fn stamp(&mut self, resp: &mut QueryResponse, op: &str, table: &str) {
        self.seq += 1;
        resp.query_times.insert(format!("{}#{} {}", op, self.seq, table), 0.1);
    }

    fn scan<F: Fn(&[String]) -> bool>(
        &mut self,
        table: &str,
        columns: &[String],
        residual: &Residual,
        keep: F,
    ) -> Vec<Record> {
        let rows = self.rows.get(table).cloned().unwrap_or_default();
        let mut out = Vec::new();
        for row in &rows {
            if !keep(row) {
                continue;
            }
            if !residual.accepts(&Record::new(row.clone())) {
                continue;
            }
            out.push(self.project(table, row, columns));
        }
        out
    }
}

impl Engine for MockEngine {
    fn is_table(&self, table: &str) -> bool { self.tables.iter().any(|t| t == table) }

    fn get_table_names(&self) -> Vec<String> { self.tables.clone() }

    fn get_table_attributes(&self, table: &str) -> DbResult<Vec<String>> {
        self.attrs
            .get(table)
            .cloned()
            .ok_or_else(|| DbError::table_not_found(format!("Table not found: {}", table)))
    }

    fn sort_attributes(&self, table: &str, columns: &[String]) -> DbResult<Vec<String>> {
        let attrs = self.get_table_attributes(table)?;
        Ok(attrs.into_iter().filter(|a| columns.iter().any(|c| c == a)).collect())
    }

    fn get_index_names(&self, table: &str) -> DbResult<Vec<String>> {
        Ok(self.indexed.get(table).cloned().unwrap_or_default())
    }

    fn get_comparator(&self, table: &str, op: CompOp, column: &str, value: &str) -> DbResult<Comparator> {
        let pos = self.col_pos(table, column)?;
        let value = value.to_string();
        Ok(Box::new(move |rec: &Record| {
            let ord = cmp_typed(&rec.fields[pos], &value);
            match op {
                CompOp::Eq => ord == Ordering::Equal,
                CompOp::Lt => ord == Ordering::Less,
                CompOp::Le => ord != Ordering::Greater,
                CompOp::Gt => ord == Ordering::Greater,
                CompOp::Ge => ord != Ordering::Less,
            }
        }))
    }

    fn create_table(&mut self, table: &str, primary_key: &str, columns: &[ColumnSpec]) -> DbResult<()> {
        self.calls.push(format!("create_table {} pk={} cols={}", table, primary_key, columns.len()));
        self.tables.push(table.to_string());
        self.attrs.insert(table.to_string(), columns.iter().map(|c| c.name.clone()).collect());
        self.rows.insert(table.to_string(), Vec::new());
        Ok(())
    }

    fn create_index(&mut self, table: &str, column: &str, kind: IndexKind) -> DbResult<()> {
        self.calls.push(format!("create_index {} {} {:?}", table, column, kind));
        self.indexed.entry(table.to_string()).or_default().push(column.to_string());
        Ok(())
    }

    fn load(&mut self, table: &str, columns: &[String], residual: Residual) -> DbResult<QueryResponse> {
        self.calls.push(format!("load {} [{}] residual={}", table, columns.join(","), !residual.is_true()));
        let records = self.scan(table, columns, &residual, |_| true);
        let mut resp = QueryResponse { records, query_times: HashMap::new() };
        self.stamp(&mut resp, "load", table);
        Ok(resp)
    }

    fn search(&mut self, table: &str, key: &Attribute, residual: Residual, columns: &[String]) -> DbResult<QueryResponse> {
        self.calls.push(format!("search {} {}={} [{}]", table, key.name, key.value, columns.join(",")));
        let pos = self.col_pos(table, &key.name)?;
        let value = key.value.clone();
        let records = self.scan(table, columns, &residual, |row| cmp_typed(&row[pos], &value) == Ordering::Equal);
        let mut resp = QueryResponse { records, query_times: HashMap::new() };
        self.stamp(&mut resp, "search", table);
        Ok(resp)
    }

    fn range_search(&mut self, table: &str, lo: &Attribute, hi: &Attribute, residual: Residual, columns: &[String]) -> DbResult<QueryResponse> {
        self.calls.push(format!("range_search {} {}:{}..{}", table, lo.name, lo.value, hi.value));
        let pos = self.col_pos(table, &lo.name)?;
        let lo_v = lo.clone();
        let hi_v = hi.clone();
        let records = self.scan(table, columns, &residual, |row| {
            (lo_v.is_key_min() || cmp_typed(&row[pos], &lo_v.value) != Ordering::Less)
                && (hi_v.is_key_max() || cmp_typed(&row[pos], &hi_v.value) != Ordering::Greater)
        });
        let mut resp = QueryResponse { records, query_times: HashMap::new() };
        self.stamp(&mut resp, "range_search", table);
        Ok(resp)
    }

    fn add(&mut self, table: &str, values: &[String]) -> DbResult<()> {
        self.calls.push(format!("add {} ({})", table, values.join(",")));
        self.last_add = Some(values.to_vec());
        self.rows.get_mut(table).unwrap().push(values.to_vec());
        Ok(())
    }

    fn csv_insert(&mut self, table: &str, path: &str) -> DbResult<()> {
        self.calls.push(format!("csv_insert {} {}", table, path));
        self.last_csv = Some(path.to_string());
        Ok(())
    }

    fn remove(&mut self, table: &str, key: &Attribute) -> DbResult<()> {
        self.calls.push(format!("remove {} {}={}", table, key.name, key.value));
        self.last_removed = Some((key.name.clone(), key.value.clone()));
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> DbResult<()> {
        self.calls.push(format!("drop_table {}", table));
        self.tables.retain(|t| t != table);
        self.attrs.remove(table);
        self.rows.remove(table);
        Ok(())
    }
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn rec(fields: &[&str]) -> Record {
    Record::new(fields.iter().map(|s| s.to_string()).collect())
}

fn cond(column: &str, op: CompOp, value: &str) -> Condition {
    Condition::new(column, op, value)
}

#[test]
fn select_columns_always_in_schema_order() {
    let mut eng = MockEngine::new()
        .with_table("t", &["id", "name", "age"])
        .with_row("t", &["1", "a", "30"]);
    let mut resp = ParserResponse::default();
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["age", "id"]), &Constraint::none()).unwrap();
    assert_eq!(resp.column_names, cols(&["id", "age"]));
    assert_eq!(resp.records, vec![rec(&["1", "30"])]);
}

#[test]
fn select_empty_where_is_full_load() {
    let mut eng = MockEngine::new()
        .with_table("t", &["id", "name"])
        .with_row("t", &["1", "a"])
        .with_row("t", &["2", "b"]);
    let mut resp = ParserResponse::default();
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["*"]), &Constraint::none()).unwrap();
    assert_eq!(eng.calls, vec!["load t [id,name] residual=false"]);
    assert_eq!(resp.records, vec![rec(&["1", "a"]), rec(&["2", "b"])]);
    assert_eq!(resp.column_names, cols(&["id", "name"]));
}

#[test]
fn select_dnf_unions_point_searches() {
    let mut eng = MockEngine::new()
        .with_table("t", &["id", "name"])
        .with_index("t", "id")
        .with_row("t", &["5", "a"])
        .with_row("t", &["7", "b"]);
    let mut resp = ParserResponse::default();
    let constraint = Constraint {
        disjuncts: vec![
            vec![cond("id", CompOp::Eq, "5")],
            vec![cond("id", CompOp::Eq, "7")],
        ],
    };
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["name"]), &constraint).unwrap();
    assert_eq!(
        eng.calls,
        vec!["search t id=5 [name]", "search t id=7 [name]"]
    );
    assert_eq!(resp.records, vec![rec(&["a"]), rec(&["b"])]);
    assert_eq!(resp.column_names, cols(&["name"]));
    // One timing entry per engine call
    assert_eq!(resp.query_times.len(), 2);
}

#[test]
fn select_dnf_dedups_overlapping_branches() {
    let mut eng = MockEngine::new()
        .with_table("t", &["id", "name"])
        .with_index("t", "id")
        .with_row("t", &["5", "a"]);
    let mut resp = ParserResponse::default();
    let constraint = Constraint {
        disjuncts: vec![
            vec![cond("id", CompOp::Eq, "5")],
            vec![cond("id", CompOp::Eq, "5")],
        ],
    };
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["name"]), &constraint).unwrap();
    assert_eq!(resp.records, vec![rec(&["a"])]);
}

#[test]
fn select_unindexed_branch_replaces_other_disjuncts() {
    // An OR branch with no indexable column falls back to a filtered full
    // scan that subsumes every other branch: the remaining disjuncts are
    // intentionally not executed and their partials are discarded.
    let mut eng = MockEngine::new()
        .with_table("t", &["a", "b"])
        .with_row("t", &["1", "x"])
        .with_row("t", &["2", "2"]);
    let mut resp = ParserResponse::default();
    let constraint = Constraint {
        disjuncts: vec![
            vec![cond("a", CompOp::Eq, "1")],
            vec![cond("b", CompOp::Eq, "2")],
        ],
    };
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["*"]), &constraint).unwrap();
    assert_eq!(eng.calls, vec!["load t [a,b] residual=true"]);
    assert_eq!(resp.records, vec![rec(&["1", "x"])]);
}

#[test]
fn select_indexed_then_unindexed_discards_indexed_partial() {
    let mut eng = MockEngine::new()
        .with_table("t", &["a", "b"])
        .with_index("t", "a")
        .with_row("t", &["1", "x"])
        .with_row("t", &["2", "y"]);
    let mut resp = ParserResponse::default();
    let constraint = Constraint {
        disjuncts: vec![
            vec![cond("a", CompOp::Eq, "1")],
            vec![cond("b", CompOp::Eq, "y")],
        ],
    };
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["*"]), &constraint).unwrap();
    assert_eq!(
        eng.calls,
        vec!["search t a=1 [a,b]", "load t [a,b] residual=true"]
    );
    // The full scan's result stands alone; the search partial is gone.
    assert_eq!(resp.records, vec![rec(&["2", "y"])]);
    // Timings from both calls survive.
    assert_eq!(resp.query_times.len(), 2);
}

#[test]
fn driver_is_first_indexed_condition_in_source_order() {
    let mut eng = MockEngine::new()
        .with_table("t", &["id", "age"])
        .with_index("t", "id")
        .with_index("t", "age");
    let conditions = vec![cond("age", CompOp::Ge, "30"), cond("id", CompOp::Eq, "5")];
    let plan = compile_conjunct(&eng, "t", &conditions).unwrap();
    assert_eq!(plan.index_key.as_ref().unwrap().column, "age");
    // The other indexed condition lands in the residual.
    assert!(plan.residual.accepts(&rec(&["5", "99"])));
    assert!(!plan.residual.accepts(&rec(&["6", "99"])));

    let mut resp = ParserResponse::default();
    eng.rows.get_mut("t").unwrap().push(vec!["5".into(), "31".into()]);
    eng.rows.get_mut("t").unwrap().push(vec!["6".into(), "40".into()]);
    let constraint = Constraint { disjuncts: vec![conditions] };
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["*"]), &constraint).unwrap();
    assert_eq!(eng.calls, vec!["range_search t age:30..KEY_MAX"]);
    assert_eq!(resp.records, vec![rec(&["5", "31"])]);
}

#[test]
fn range_driver_uses_key_sentinels() {
    let mut eng = MockEngine::new()
        .with_table("t", &["id", "age"])
        .with_index("t", "id")
        .with_row("t", &["10", "25"])
        .with_row("t", &["11", "35"])
        .with_row("t", &["9", "20"]);
    let mut resp = ParserResponse::default();
    let constraint = Constraint {
        disjuncts: vec![vec![cond("id", CompOp::Ge, "10"), cond("age", CompOp::Lt, "30")]],
    };
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["*"]), &constraint).unwrap();
    assert_eq!(eng.calls, vec!["range_search t id:10..KEY_MAX"]);
    assert_eq!(resp.records, vec![rec(&["10", "25"])]);
}

#[test]
fn strict_driver_filters_inclusive_range_boundary() {
    let mut eng = MockEngine::new()
        .with_table("t", &["id"])
        .with_index("t", "id")
        .with_row("t", &["3"])
        .with_row("t", &["5"]);
    let mut resp = ParserResponse::default();
    let constraint = Constraint { disjuncts: vec![vec![cond("id", CompOp::Lt, "5")]] };
    exec_select::select(&mut eng, &mut resp, "t", &cols(&["*"]), &constraint).unwrap();
    assert_eq!(eng.calls, vec!["range_search t id:KEY_MIN..5"]);
    // The scan itself is endpoint-inclusive; the driver's own comparator
    // removes the boundary row.
    assert_eq!(resp.records, vec![rec(&["3"])]);
}

#[test]
fn between_is_one_range_search_with_true_predicate() {
    let mut eng = MockEngine::new()
        .with_table("t", &["id", "name"])
        .with_row("t", &["2", "a"])
        .with_row("t", &["3", "b"])
        .with_row("t", &["9", "c"])
        .with_row("t", &["10", "d"]);
    let mut resp = ParserResponse::default();
    exec_select::select_between(&mut eng, &mut resp, "t", &cols(&["*"]), "id", "3", "9").unwrap();
    assert_eq!(eng.calls, vec!["range_search t id:3..9"]);
    assert_eq!(resp.records, vec![rec(&["3", "b"]), rec(&["9", "c"])]);
}

#[test]
fn insert_restores_schema_order() {
    let mut eng = MockEngine::new().with_table("t", &["id", "name", "score"]);
    // The callback receives the value list in reverse of textual order.
    exec_insert::insert(&mut eng, "t", &cols(&["2.5", "a", "1"])).unwrap();
    assert_eq!(eng.last_add.as_deref(), Some(&cols(&["1", "a", "2.5"])[..]));
}

#[test]
fn insert_from_file_strips_one_quote_byte_each_end() {
    let mut eng = MockEngine::new().with_table("t", &["id"]);
    exec_insert::insert_from_file(&mut eng, "t", "'/tmp/rows.csv'").unwrap();
    assert_eq!(eng.last_csv.as_deref(), Some("/tmp/rows.csv"));
}

#[test]
fn delete_uses_only_first_condition_of_first_disjunct() {
    let mut eng = MockEngine::new().with_table("t", &["id", "age"]);
    let constraint = Constraint {
        disjuncts: vec![
            vec![cond("id", CompOp::Eq, "3"), cond("age", CompOp::Gt, "10")],
            vec![cond("id", CompOp::Eq, "4")],
        ],
    };
    exec_delete::remove(&mut eng, "t", &constraint).unwrap();
    assert_eq!(eng.last_removed, Some(("id".to_string(), "3".to_string())));
    assert_eq!(eng.calls, vec!["remove t id=3"]);
}

#[test]
fn select_missing_table_leaves_engine_untouched() {
    let mut eng = MockEngine::new().with_table("t", &["id"]);
    let mut resp = ParserResponse::default();
    let err = exec_select::select(&mut eng, &mut resp, "nonesuch", &cols(&["x"]), &Constraint::none())
        .unwrap_err();
    assert_eq!(err.response_code(), 404);
    assert!(err.to_string().contains("Table"));
    assert!(eng.calls.is_empty());
}

#[test]
fn select_missing_column_is_column_not_found() {
    let mut eng = MockEngine::new().with_table("t", &["id"]);
    let mut resp = ParserResponse::default();
    let err = exec_select::select(&mut eng, &mut resp, "t", &cols(&["nope"]), &Constraint::none())
        .unwrap_err();
    assert_eq!(err.code_str(), "column_not_found");
    assert!(eng.calls.is_empty());
}

#[test]
fn dispatch_populates_table_names_on_success() {
    let mut eng = MockEngine::new()
        .with_table("a", &["id"])
        .with_table("b", &["id"]);
    let mut resp = ParserResponse::default();
    exec::dispatch(
        &mut eng,
        &mut resp,
        crate::query::Statement::Select {
            table: "a".into(),
            columns: cols(&["*"]),
            constraint: Constraint::none(),
        },
    )
    .unwrap();
    assert_eq!(resp.table_names, cols(&["a", "b"]));
    assert_eq!(resp.code, 200);
}
