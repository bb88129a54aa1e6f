//! Predicate model: comparison operators, single-column conditions and the
//! disjunctive-normal-form constraint produced by the WHERE parser, plus the
//! residual row predicate assembled by the planner.

use serde::{Deserialize, Serialize};

use crate::engine::Record;

/// Comparison operators accepted by the grammar. `!=` is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompOp { Eq, Lt, Le, Gt, Ge }

impl CompOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::Lt => "<",
            CompOp::Le => "<=",
            CompOp::Gt => ">",
            CompOp::Ge => ">=",
        }
    }

    /// True for `<` and `>`: the operators whose index range endpoint must be
    /// re-checked row-by-row because range scans are endpoint-inclusive.
    pub fn is_strict(&self) -> bool {
        matches!(self, CompOp::Lt | CompOp::Gt)
    }
}

/// A single `column op literal` comparison. The literal is kept as text; the
/// engine parses it against the column type when it builds comparators or
/// index keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub op: CompOp,
    pub value: String,
}

impl Condition {
    pub fn new<C: Into<String>, V: Into<String>>(column: C, op: CompOp, value: V) -> Self {
        Condition { column: column.into(), op, value: value.into() }
    }
}

/// A WHERE clause in disjunctive normal form: an OR of AND-groups.
/// An empty outer list means "no WHERE clause" (full scan); the parser never
/// produces an empty inner list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraint {
    pub disjuncts: Vec<Vec<Condition>>,
}

impl Constraint {
    pub fn none() -> Self { Constraint { disjuncts: Vec::new() } }

    pub fn single(cond: Condition) -> Self {
        Constraint { disjuncts: vec![vec![cond]] }
    }

    pub fn is_empty(&self) -> bool { self.disjuncts.is_empty() }
}

/// A row predicate supplied by the engine. Captures the condition value by
/// value so it outlives the condition list it was compiled from.
pub type Comparator = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// Residual predicate applied row-by-row after (or instead of) an index
/// lookup: constant true, a single comparator, or a conjunction.
pub enum Residual {
    True,
    Single(Comparator),
    All(Vec<Comparator>),
}

impl Residual {
    /// Collapse a comparator list into the smallest residual form.
    pub fn conjunction(mut comparators: Vec<Comparator>) -> Self {
        match comparators.len() {
            0 => Residual::True,
            1 => Residual::Single(comparators.remove(0)),
            _ => Residual::All(comparators),
        }
    }

    pub fn accepts(&self, record: &Record) -> bool {
        match self {
            Residual::True => true,
            Residual::Single(f) => f(record),
            Residual::All(fs) => fs.iter().all(|f| f(record)),
        }
    }

    pub fn is_true(&self) -> bool { matches!(self, Residual::True) }
}

impl std::fmt::Debug for Residual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Residual::True => write!(f, "Residual::True"),
            Residual::Single(_) => write!(f, "Residual::Single(..)"),
            Residual::All(v) => write!(f, "Residual::All({} comparators)", v.len()),
        }
    }
}
