use crate::response::ParserResponse;

// Render a statement response as an ASCII table.
// Returns true if a table was printed (i.e., there were rows), false otherwise.
pub fn print_response(resp: &ParserResponse) -> bool {
    if resp.failed() {
        println!("error [{}]: {}", resp.code, resp.error);
        return false;
    }
    if resp.records.is_empty() {
        println!("ok ({} tables)", resp.table_names.len());
        return false;
    }

    let cols: Vec<String> = if resp.column_names.is_empty() {
        (0..resp.records[0].fields.len()).map(|i| format!("c{}", i)).collect()
    } else {
        resp.column_names.clone()
    };

    // Compute widths, capped to keep output readable
    let max_col_width: usize = 80;
    let mut widths: Vec<usize> = cols.iter().map(|s| s.len().min(max_col_width)).collect();
    for r in &resp.records {
        for (i, cell) in r.fields.iter().enumerate().take(cols.len()) {
            let w = cell.chars().count();
            if w > widths[i] { widths[i] = w.min(max_col_width); }
        }
    }

    let sep = build_separator(&widths);
    println!("{}", sep);
    println!("{}", build_row(&cols, &widths));
    println!("{}", sep);
    for r in &resp.records {
        println!("{}", build_row(&r.fields, &widths));
    }
    println!("{}", sep);

    let elapsed: f64 = resp.query_times.values().sum();
    println!(
        "rows: {}, cols: {}, elapsed_ms: {:.3}",
        resp.records.len(),
        cols.len(),
        elapsed
    );
    true
}

/// Serialize a response as pretty JSON; used by the `--json` output mode.
pub fn response_json(resp: &ParserResponse) -> String {
    serde_json::to_string_pretty(resp).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        for _ in 0..w + 2 { s.push('-'); }
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(|c| c.as_str()).unwrap_or("");
        let shown: String = cell.chars().take(*w).collect();
        s.push(' ');
        s.push_str(&shown);
        for _ in shown.chars().count()..*w { s.push(' '); }
        s.push_str(" |");
    }
    s
}
