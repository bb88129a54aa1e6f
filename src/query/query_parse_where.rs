use anyhow::{bail, Result};

use crate::predicate::{CompOp, Condition, Constraint};

/// Parsed form of a WHERE clause. BETWEEN is only recognized as the sole
/// predicate and routes to the dedicated range statement.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Dnf(Constraint),
    Between { column: String, low: String, high: String },
}

#[derive(Clone, Debug, PartialEq)]
enum TKind {
    Ident(String),
    Str(String),
    Lit(String),
    Op(CompOp),
    And,
    Or,
    Between,
}

#[derive(Clone, Debug)]
struct Tok {
    kind: TKind,
    pos: usize,
}

fn is_ident_start(c: char) -> bool { c.is_ascii_alphabetic() || c == '_' || c == '"' }
fn is_ident_part(c: char) -> bool { c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '"' }

fn lex(input: &str) -> Result<Vec<Tok>> {
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let mut toks: Vec<Tok> = Vec::new();
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() { i += 1; continue; }
        // strings: single-quoted with '' escape
        if c == '\'' {
            let start = i; i += 1; let mut s = String::new();
            let mut closed = false;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch == '\'' {
                    if i + 1 < bytes.len() && bytes[i + 1] as char == '\'' { s.push('\''); i += 2; continue; }
                    i += 1; closed = true; break;
                } else { s.push(ch); i += 1; }
            }
            if !closed { bail!("Syntax error at position {}: unterminated string literal", start); }
            toks.push(Tok { kind: TKind::Str(s), pos: start });
            continue;
        }
        // numbers (digits with optional sign, dot, exponent chars)
        if c.is_ascii_digit() || (c == '-' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit()) {
            let start = i; i += 1;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' || ch == '+' || ch == '-' { i += 1; } else { break; }
            }
            toks.push(Tok { kind: TKind::Lit(input[start..i].to_string()), pos: start });
            continue;
        }
        // identifiers/keywords
        if is_ident_start(c) {
            let start = i; i += 1;
            while i < bytes.len() { if is_ident_part(bytes[i] as char) { i += 1; } else { break; } }
            let raw = input[start..i].to_string();
            let kind = match raw.to_uppercase().as_str() {
                "AND" => TKind::And,
                "OR" => TKind::Or,
                "BETWEEN" => TKind::Between,
                "TRUE" | "FALSE" => TKind::Lit(raw.to_lowercase()),
                _ => TKind::Ident(raw.trim_matches('"').to_string()),
            };
            toks.push(Tok { kind, pos: start });
            continue;
        }
        match c {
            '<' => {
                if i + 1 < bytes.len() {
                    let n = bytes[i + 1] as char;
                    if n == '=' { toks.push(Tok { kind: TKind::Op(CompOp::Le), pos: i }); i += 2; continue; }
                    if n == '>' { bail!("Syntax error at position {}: <> is not supported", i); }
                }
                toks.push(Tok { kind: TKind::Op(CompOp::Lt), pos: i }); i += 1;
            }
            '>' => {
                if i + 1 < bytes.len() && bytes[i + 1] as char == '=' {
                    toks.push(Tok { kind: TKind::Op(CompOp::Ge), pos: i }); i += 2;
                } else {
                    toks.push(Tok { kind: TKind::Op(CompOp::Gt), pos: i }); i += 1;
                }
            }
            '=' => { toks.push(Tok { kind: TKind::Op(CompOp::Eq), pos: i }); i += 1; }
            '!' => bail!("Syntax error at position {}: != is not supported", i),
            _ => bail!("Syntax error at position {}: unexpected character '{}'", i, c),
        }
    }
    Ok(toks)
}

fn value_text(tok: &Tok) -> Result<String> {
    match &tok.kind {
        TKind::Str(s) => Ok(s.clone()),
        TKind::Lit(s) => Ok(s.clone()),
        TKind::Ident(s) => Ok(s.clone()),
        other => bail!("Syntax error at position {}: expected a value, found {:?}", tok.pos, other),
    }
}

fn parse_condition(chunk: &[Tok]) -> Result<Condition> {
    if chunk.len() != 3 {
        let pos = chunk.first().map(|t| t.pos).unwrap_or(0);
        bail!("Syntax error at position {}: expected <column> <op> <value>", pos);
    }
    let column = match &chunk[0].kind {
        TKind::Ident(name) => name.clone(),
        other => bail!("Syntax error at position {}: expected a column name, found {:?}", chunk[0].pos, other),
    };
    let op = match &chunk[1].kind {
        TKind::Op(op) => *op,
        other => bail!("Syntax error at position {}: expected a comparison operator, found {:?}", chunk[1].pos, other),
    };
    let value = value_text(&chunk[2])?;
    Ok(Condition { column, op, value })
}

/// Parse the text after WHERE into DNF (AND-groups joined by OR) or a single
/// `col BETWEEN v1 AND v2` range.
pub fn parse_where_clause(s: &str) -> Result<WhereClause> {
    let toks = lex(s)?;
    if toks.is_empty() {
        bail!("Empty WHERE clause");
    }

    if toks.iter().any(|t| t.kind == TKind::Between) {
        // Only the exact shape <column> BETWEEN <v1> AND <v2> is accepted.
        if toks.len() != 5
            || !matches!(toks[0].kind, TKind::Ident(_))
            || toks[1].kind != TKind::Between
            || toks[3].kind != TKind::And
        {
            bail!("Invalid BETWEEN: expected <column> BETWEEN <low> AND <high> as the only predicate");
        }
        let column = match &toks[0].kind { TKind::Ident(n) => n.clone(), _ => unreachable!() };
        let low = value_text(&toks[2])?;
        let high = value_text(&toks[4])?;
        return Ok(WhereClause::Between { column, low, high });
    }

    let mut constraint = Constraint::none();
    for group in toks.split(|t| t.kind == TKind::Or) {
        if group.is_empty() {
            bail!("Empty OR branch in WHERE clause");
        }
        let mut conjunct: Vec<Condition> = Vec::new();
        for chunk in group.split(|t| t.kind == TKind::And) {
            conjunct.push(parse_condition(chunk)?);
        }
        constraint.disjuncts.push(conjunct);
    }
    Ok(WhereClause::Dnf(constraint))
}
