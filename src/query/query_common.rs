use anyhow::Result;

/// Strip SQL comments from the input while preserving content inside string
/// literals. Line comments (`--`) run to end of line; block comments
/// (`/* ... */`) may nest. Newlines inside comments are preserved to keep
/// line numbers stable.
pub fn strip_sql_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0usize;
    let mut in_squote = false;
    let mut in_dquote = false;
    let mut block_depth: i32 = 0;
    let mut line_comment = false;

    while i < bytes.len() {
        let ch = bytes[i] as char;

        if line_comment {
            if ch == '\n' {
                out.push('\n');
                line_comment = false;
            } else if ch == '\r' {
                out.push('\r');
            }
            i += 1;
            continue;
        }

        if block_depth > 0 {
            if ch == '\n' || ch == '\r' {
                out.push(ch);
                i += 1;
                continue;
            }
            if ch == '/' && i + 1 < bytes.len() && bytes[i + 1] as char == '*' {
                block_depth += 1;
                i += 2;
                continue;
            }
            if ch == '*' && i + 1 < bytes.len() && bytes[i + 1] as char == '/' {
                block_depth -= 1;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }

        if !in_dquote && ch == '\'' {
            in_squote = !in_squote;
            out.push(ch);
            i += 1;
            continue;
        }
        if !in_squote && ch == '"' {
            in_dquote = !in_dquote;
            out.push(ch);
            i += 1;
            continue;
        }

        if !in_squote && !in_dquote {
            if ch == '-' && i + 1 < bytes.len() && bytes[i + 1] as char == '-' {
                line_comment = true;
                i += 2;
                continue;
            }
            if ch == '/' && i + 1 < bytes.len() && bytes[i + 1] as char == '*' {
                block_depth = 1;
                i += 2;
                continue;
            }
        }

        out.push(ch);
        i += 1;
    }

    out
}

/// Split a script into `;`-separated statements, respecting quotes. Empty
/// fragments are dropped.
pub fn split_statements(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_s = false;
    let mut in_d = false;
    for ch in input.chars() {
        match ch {
            '\'' if !in_d => { in_s = !in_s; cur.push(ch); }
            '"' if !in_s => { in_d = !in_d; cur.push(ch); }
            ';' if !in_s && !in_d => {
                let t = cur.trim();
                if !t.is_empty() { out.push(t.to_string()); }
                cur.clear();
            }
            _ => cur.push(ch),
        }
    }
    let t = cur.trim();
    if !t.is_empty() { out.push(t.to_string()); }
    out
}

// Module-level helper: skip ASCII whitespace from index and return the next position
#[inline]
pub fn skip_ws(s: &str, mut idx: usize) -> usize {
    let b = s.as_bytes();
    while idx < b.len() && b[idx].is_ascii_whitespace() { idx += 1; }
    idx
}

// Module-level helper: read a non-whitespace token starting at `start`.
#[inline]
pub fn read_word(s: &str, start: usize) -> (String, usize) {
    let b = s.as_bytes();
    let mut j = start;
    while j < b.len() && !b[j].is_ascii_whitespace() { j += 1; }
    (s[start..j].to_string(), j)
}

/// Find a keyword (case-insensitive, whole match as written) outside string
/// literals; returns the byte offset of its first character.
pub fn find_keyword_outside_quotes(s: &str, keyword: &str) -> Option<usize> {
    let up: Vec<u8> = s.bytes().map(|b| b.to_ascii_uppercase()).collect();
    let needle = keyword.to_uppercase();
    let needle = needle.as_bytes();
    let mut in_s = false;
    let mut in_d = false;
    let bytes = s.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        if ch == '\'' && !in_d { in_s = !in_s; }
        if ch == '"' && !in_s { in_d = !in_d; }
        if !in_s && !in_d && up[i..].starts_with(needle) {
            return Some(i);
        }
        i += 1;
    }
    None
}

pub fn extract_paren_block(s: &str) -> Option<(&str, usize)> {
    let t = s;
    if t.is_empty() || t.as_bytes()[0] != b'(' { return None; }
    let mut depth = 0i32; let mut i0 = 0usize; let mut started = false;
    for (idx, ch) in t.char_indices() {
        if ch == '(' { depth += 1; if !started { started = true; i0 = idx + ch.len_utf8(); } }
        else if ch == ')' { depth -= 1; if depth == 0 { let inner = &t[i0..idx]; return Some((inner, idx + 1)); } }
    }
    None
}

pub fn split_csv_ignoring_quotes(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_s = false; let mut in_d = false;
    for ch in s.chars() {
        match ch {
            '\'' if !in_d => { in_s = !in_s; cur.push(ch); }
            '"' if !in_s => { in_d = !in_d; cur.push(ch); }
            ',' if !in_s && !in_d => { out.push(cur.trim().to_string()); cur.clear(); }
            _ => cur.push(ch),
        }
    }
    if !cur.is_empty() || s.ends_with(',') { out.push(cur.trim().to_string()); }
    out
}

/// Strip one layer of matching single or double quotes, if present.
pub fn strip_outer_quotes(s: &str) -> &str {
    if s.len() >= 2 {
        let first = s.as_bytes()[0] as char;
        let last = s.as_bytes()[s.len() - 1] as char;
        if (first == '\'' && last == '\'') || (first == '"' && last == '"') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Parse a literal value token: string literals lose their quotes, anything
/// else passes through as written. The engine parses values per column type.
pub fn literal_text(tok: &str) -> Result<String> {
    let t = tok.trim();
    if t.is_empty() {
        anyhow::bail!("empty literal");
    }
    Ok(strip_outer_quotes(t).to_string())
}
