// src/filter.rs

//! Implements the filter compiler and evaluator: a free-form user string
//! becomes a list of typed [`FilterClause`]s, evaluated per record with
//! logical AND.
//!
//! Grammar: clauses separated by `;`, each clause `field op literal`,
//! operators `==` `!=` `>` `>=` `<` `<=` and `~` (substring containment,
//! text fields only):
//!
//! ```text
//! user==vanderwb;Resource_List.ncpus>36;queue~gpu
//! ```
//!
//! The literal is coerced at compile time to the field's declared
//! [`FieldKind`], so bad field names and mistyped literals fail fast,
//! before any record is streamed. Evaluation dispatches over a closed
//! operator set against tagged values; there is deliberately no
//! expression-language escape hatch and no user code is ever evaluated.
//!
//! [`FilterClause`]: self::FilterClause
//! [`FieldKind`]: crate::data::record::FieldKind

use crate::data::record::{field_kind, unquote, FieldKind, FieldValue, Record};
use crate::error::{QhError, QhResult};

use std::cmp::Ordering;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FilterOp, FilterClause
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The closed operator set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// substring containment, text fields only
    Contains,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Contains => "~",
        }
    }
}

/// One compiled (field, operator, literal) comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub literal: FieldValue,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// compile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compile a filter string into a clause list.
///
/// Fails with [`UnknownField`] for a field name not in the coercion
/// table, [`InvalidLiteral`] for a literal that cannot be coerced to the
/// field's kind, and [`InvalidFilter`] for a clause with no recognized
/// operator shape. An empty string compiles to an empty list, which
/// matches every record.
///
/// [`UnknownField`]: crate::error::QhError::UnknownField
/// [`InvalidLiteral`]: crate::error::QhError::InvalidLiteral
/// [`InvalidFilter`]: crate::error::QhError::InvalidFilter
pub fn compile(filter: &str) -> QhResult<Vec<FilterClause>> {
    let mut clauses: Vec<FilterClause> = Vec::new();
    for part in filter.split(';') {
        let part: &str = part.trim();
        if part.is_empty() {
            continue;
        }
        clauses.push(compile_clause(part)?);
    }

    Ok(clauses)
}

fn compile_clause(clause: &str) -> QhResult<FilterClause> {
    let idx: usize = match clause.find(['=', '!', '<', '>', '~']) {
        Some(idx) => idx,
        None => {
            return Err(QhError::InvalidFilter(format!(
                "no operator in clause {:?} (expected one of == != > >= < <= ~)",
                clause,
            )))
        }
    };
    let rest: &str = &clause[idx..];
    let (op, oplen): (FilterOp, usize) = if rest.starts_with("==") {
        (FilterOp::Eq, 2)
    } else if rest.starts_with("!=") {
        (FilterOp::Ne, 2)
    } else if rest.starts_with(">=") {
        (FilterOp::Ge, 2)
    } else if rest.starts_with("<=") {
        (FilterOp::Le, 2)
    } else if rest.starts_with('>') {
        (FilterOp::Gt, 1)
    } else if rest.starts_with('<') {
        (FilterOp::Lt, 1)
    } else if rest.starts_with('~') {
        (FilterOp::Contains, 1)
    } else {
        return Err(QhError::InvalidFilter(format!(
            "unrecognized operator in clause {:?}",
            clause,
        )));
    };
    let field: &str = clause[..idx].trim();
    let literal_raw: &str = unquote(clause[idx + oplen..].trim());
    if field.is_empty() {
        return Err(QhError::InvalidFilter(format!("no field name in clause {:?}", clause)));
    }
    let kind: FieldKind = match field_kind(field) {
        Some(kind) => kind,
        None => return Err(QhError::UnknownField(String::from(field))),
    };
    if op == FilterOp::Contains && kind != FieldKind::Text {
        return Err(QhError::InvalidFilter(format!(
            "operator '~' requires a text field, {:?} is {}",
            field, kind,
        )));
    }
    let literal: FieldValue = match FieldValue::coerce(kind, literal_raw) {
        Some(literal) => literal,
        None => {
            return Err(QhError::InvalidLiteral {
                field: String::from(field),
                literal: String::from(literal_raw),
                kind,
            })
        }
    };

    Ok(FilterClause {
        field: String::from(field),
        op,
        literal,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// evaluate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Apply every clause with logical AND.
///
/// A clause whose field is absent on this record evaluates to `false`
/// (not an error), so heterogeneous record types share one filter list
/// safely.
pub fn evaluate(
    record: &Record,
    clauses: &[FilterClause],
) -> bool {
    clauses
        .iter()
        .all(|clause| evaluate_clause(record, clause))
}

fn evaluate_clause(
    record: &Record,
    clause: &FilterClause,
) -> bool {
    let value: FieldValue = match record.value(&clause.field) {
        Some(value) => value,
        None => return false,
    };
    match clause.op {
        FilterOp::Contains => match (&value, &clause.literal) {
            (FieldValue::Text(hay), FieldValue::Text(needle)) => hay.contains(needle.as_str()),
            _ => false,
        },
        _ => match value.partial_cmp_value(&clause.literal) {
            Some(ordering) => ordering_matches(clause.op, ordering),
            // mixed variants, e.g. a coercion-failed raw value; no match
            None => false,
        },
    }
}

fn ordering_matches(
    op: FilterOp,
    ordering: Ordering,
) -> bool {
    match op {
        FilterOp::Eq => ordering == Ordering::Equal,
        FilterOp::Ne => ordering != Ordering::Equal,
        FilterOp::Gt => ordering == Ordering::Greater,
        FilterOp::Ge => ordering != Ordering::Less,
        FilterOp::Lt => ordering == Ordering::Less,
        FilterOp::Le => ordering != Ordering::Greater,
        FilterOp::Contains => false,
    }
}
