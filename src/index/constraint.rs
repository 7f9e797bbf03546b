//! Predicate shape consumed by every indexer (spec §4.F). A `Constraint` is
//! normalized once, at the indexer boundary, rather than threaded through
//! every dispatch arm: mixed int/double comparisons are rounded monotonically
//! so the returned bitmap over-approximates the exact answer, and the SQL
//! executor applies exact filtering on the materialized cells afterward.

use crate::{err_at, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexConstraintOperator {
    Equal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Match,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    Integer,
    Double,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub op: IndexConstraintOperator,
    pub operand: Operand,
}

impl Constraint {
    pub fn new(op: IndexConstraintOperator, operand: Operand) -> Constraint {
        Constraint { op, operand }
    }

    pub fn operand_type(&self) -> OperandType {
        match &self.operand {
            Operand::Integer(_) => OperandType::Integer,
            Operand::Double(_) => OperandType::Double,
            Operand::String(_) => OperandType::String,
        }
    }

    pub fn as_string(&self) -> Result<&str> {
        match &self.operand {
            Operand::String(s) => Ok(s.as_str()),
            _ => err_at!(InvalidArgument, msg: "constraint operand is not a string"),
        }
    }
}

/// Result of narrowing a possibly-double constraint to the integer domain.
/// `Empty` covers the case the spec calls out explicitly: an `=` constraint
/// against a fractional double can never match an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedInt {
    Cmp { op: IndexConstraintOperator, value: i64 },
    Empty,
}

/// Narrow `constraint` to an integer-domain comparison (spec §4.E.2, §4.F).
/// An integer operand passes through unchanged; a double operand is rounded
/// monotonically: `floor` for the `<`-family so the bound stays inclusive of
/// every integer the exact predicate would have matched, `ceil` for the
/// `>`-family for the same reason on the other side, and fractional `=`
/// collapses to [NormalizedInt::Empty].
pub fn normalize_int_constraint(c: &Constraint) -> NormalizedInt {
    match &c.operand {
        Operand::Integer(v) => NormalizedInt::Cmp { op: c.op, value: *v },
        Operand::Double(d) => {
            let is_integral = d.fract() == 0.0;
            match c.op {
                IndexConstraintOperator::Equal => {
                    if is_integral {
                        NormalizedInt::Cmp { op: c.op, value: *d as i64 }
                    } else {
                        NormalizedInt::Empty
                    }
                }
                IndexConstraintOperator::LessThan if is_integral => {
                    NormalizedInt::Cmp { op: c.op, value: *d as i64 }
                }
                IndexConstraintOperator::LessThan | IndexConstraintOperator::LessThanEqual => {
                    NormalizedInt::Cmp {
                        op: IndexConstraintOperator::LessThanEqual,
                        value: d.floor() as i64,
                    }
                }
                IndexConstraintOperator::GreaterThan if is_integral => {
                    NormalizedInt::Cmp { op: c.op, value: *d as i64 }
                }
                IndexConstraintOperator::GreaterThan
                | IndexConstraintOperator::GreaterThanEqual => NormalizedInt::Cmp {
                    op: IndexConstraintOperator::GreaterThanEqual,
                    value: d.ceil() as i64,
                },
                IndexConstraintOperator::Match => NormalizedInt::Empty,
            }
        }
        Operand::String(_) => NormalizedInt::Empty,
    }
}

/// Convert an inclusive/exclusive bound pair into a half-open `[lo, hi)`
/// range over `i64`, widening to `i128` so the `±1` adjustment never
/// overflows at `i64::MIN`/`i64::MAX` (spec §4.E.2, §8 boundary behavior).
pub fn widen_range(lo_op: IndexConstraintOperator, lo: i64, hi_op: IndexConstraintOperator, hi: i64) -> (i128, i128) {
    let lo128 = match lo_op {
        IndexConstraintOperator::GreaterThan => lo as i128 + 1,
        _ => lo as i128,
    };
    let hi128 = match hi_op {
        IndexConstraintOperator::LessThanEqual => hi as i128 + 1,
        _ => hi as i128,
    };
    (lo128, hi128)
}

#[cfg(test)]
#[path = "constraint_test.rs"]
mod constraint_test;
