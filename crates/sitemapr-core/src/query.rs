//! Raw `where` predicates.
//!
//! A registration may carry a free-form `where` string. The in-memory
//! repository understands a small subset of SQL:
//!
//! ```text
//! "Rating" >= 3 AND Category != 'internal' AND Featured = true
//! ```
//!
//! Conditions are joined by `AND` (case-insensitive). Values are single-quoted
//! strings, numbers, or `true` / `false`. Field names may be double-quoted.

use std::cmp::Ordering;

use crate::{
    error::{CoreError, Result},
    record::{FieldValue, Record},
};

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    // Longest operators first so `<=` is not read as `<`.
    const TOKENS: [(&'static str, Comparison); 7] = [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("!=", Comparison::Ne),
        ("<>", Comparison::Ne),
        ("=", Comparison::Eq),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ];

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// One `field <op> value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Comparison,
    pub value: FieldValue,
}

/// A parsed `where` clause: all conditions must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

impl WhereClause {
    /// Parse a `where` string.
    pub fn parse(input: &str) -> Result<Self> {
        let mut rest = input.trim();
        if rest.is_empty() {
            return Err(CoreError::query("empty where clause"));
        }

        let mut conditions = Vec::new();
        loop {
            let (condition, tail) = parse_condition(rest)?;
            conditions.push(condition);

            let tail = tail.trim_start();
            if tail.is_empty() {
                break;
            }
            rest = strip_and(tail)
                .ok_or_else(|| CoreError::query(format!("expected AND before `{tail}`")))?;
        }

        Ok(Self { conditions })
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether the record satisfies every condition. A missing field never
    /// satisfies a condition.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| {
            record
                .value(&c.field)
                .and_then(|value| value.loose_cmp(&c.value))
                .is_some_and(|ordering| c.op.holds(ordering))
        })
    }
}

fn strip_and(input: &str) -> Option<&str> {
    let keyword = input.get(..3)?;
    let after = &input[3..];
    if keyword.eq_ignore_ascii_case("AND") && after.starts_with(char::is_whitespace) {
        Some(after.trim_start())
    } else {
        None
    }
}

fn parse_condition(input: &str) -> Result<(Condition, &str)> {
    let (field, rest) = parse_field(input)?;
    let rest = rest.trim_start();

    let (op, rest) = Comparison::TOKENS
        .iter()
        .find_map(|(token, op)| rest.strip_prefix(token).map(|tail| (*op, tail)))
        .ok_or_else(|| CoreError::query(format!("expected comparison after `{field}`")))?;

    let (value, rest) = parse_value(rest.trim_start())?;

    Ok((Condition { field, op, value }, rest))
}

fn parse_field(input: &str) -> Result<(String, &str)> {
    if let Some(quoted) = input.strip_prefix('"') {
        let end = quoted
            .find('"')
            .ok_or_else(|| CoreError::query("unterminated quoted field name"))?;
        return Ok((quoted[..end].to_string(), &quoted[end + 1..]));
    }

    let end = input
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(input.len());
    if end == 0 {
        return Err(CoreError::query(format!("expected field name at `{input}`")));
    }
    Ok((input[..end].to_string(), &input[end..]))
}

fn parse_value(input: &str) -> Result<(FieldValue, &str)> {
    if let Some(quoted) = input.strip_prefix('\'') {
        let end = quoted
            .find('\'')
            .ok_or_else(|| CoreError::query("unterminated string literal"))?;
        return Ok((FieldValue::Text(quoted[..end].to_string()), &quoted[end + 1..]));
    }

    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    let literal = &input[..end];
    let value = if literal.eq_ignore_ascii_case("true") {
        FieldValue::Bool(true)
    } else if literal.eq_ignore_ascii_case("false") {
        FieldValue::Bool(false)
    } else if let Ok(i) = literal.parse::<i64>() {
        FieldValue::Int(i)
    } else if let Ok(f) = literal.parse::<f64>() {
        FieldValue::Float(f)
    } else if literal.is_empty() {
        return Err(CoreError::query("missing value"));
    } else {
        return Err(CoreError::query(format!(
            "unquoted value `{literal}`; wrap strings in single quotes"
        )));
    };

    Ok((value, &input[end..]))
}
