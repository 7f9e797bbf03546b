//! Positional vector index (spec §4.E.2): dense array where slot `i` holds
//! row `i`'s extracted value. `filter`/`filter_range` linear-scan; in
//! exchange the index supports covering reads (`try_get_*`) so the query
//! dispatcher can materialize a projected cell without touching the blob
//! store.

use crate::{
    bitmap::Bitmap,
    err_at,
    index::constraint::{
        normalize_int_constraint, widen_range, Constraint, IndexConstraintOperator as Op,
        NormalizedInt, Operand,
    },
    index::stats::{IndexKind, IndexStat},
    Result,
};

pub struct VectorIntIndex {
    name: String,
    column_path: String,
    values: Vec<Option<i64>>,
}

impl VectorIntIndex {
    pub fn new(name: impl Into<String>, column_path: impl Into<String>) -> Self {
        VectorIntIndex { name: name.into(), column_path: column_path.into(), values: Vec::new() }
    }

    pub fn column_path(&self) -> &str {
        &self.column_path
    }

    pub fn insert(&mut self, row_id: u64, value: Option<i64>) -> Result<()> {
        if row_id as usize != self.values.len() {
            return err_at!(InvalidArgument, msg: "vector index insert out of order: row_id {} != len {}", row_id, self.values.len());
        }
        self.values.push(value);
        Ok(())
    }

    fn matches(op: Op, slot: i64, bound: i64) -> bool {
        match op {
            Op::Equal => slot == bound,
            Op::LessThan => slot < bound,
            Op::LessThanEqual => slot <= bound,
            Op::GreaterThan => slot > bound,
            Op::GreaterThanEqual => slot >= bound,
            Op::Match => false,
        }
    }

    pub fn filter(&self, c: &Constraint) -> Result<Bitmap> {
        if matches!(c.op, Op::Match) {
            return err_at!(InvalidOperator, msg: "MATCH has no full-text index in this core");
        }
        let norm = normalize_int_constraint(c);
        let mut bm = Bitmap::new();
        match norm {
            NormalizedInt::Empty => {}
            NormalizedInt::Cmp { op, value } => {
                for (row_id, slot) in self.values.iter().enumerate() {
                    if let Some(v) = slot {
                        if Self::matches(op, *v, value) {
                            bm.add(row_id as u64);
                        }
                    }
                }
            }
        }
        Ok(bm)
    }

    pub fn filter_range(&self, lo: &Constraint, hi: &Constraint) -> Result<Bitmap> {
        let lo_norm = normalize_int_constraint(lo);
        let hi_norm = normalize_int_constraint(hi);
        let (lo_op, lo_v, hi_op, hi_v) = match (lo_norm, hi_norm) {
            (NormalizedInt::Empty, _) | (_, NormalizedInt::Empty) => return Ok(Bitmap::new()),
            (NormalizedInt::Cmp { op: lo_op, value: lo_v }, NormalizedInt::Cmp { op: hi_op, value: hi_v }) => {
                (lo_op, lo_v, hi_op, hi_v)
            }
        };
        // Widen to a half-open [lo128, hi128) range so the inclusive/exclusive
        // normalization never overflows at i64::MIN/MAX (spec §8).
        let (lo128, hi128) = widen_range(lo_op, lo_v, hi_op, hi_v);
        let mut bm = Bitmap::new();
        for (row_id, slot) in self.values.iter().enumerate() {
            if let Some(v) = slot {
                let v128 = *v as i128;
                if v128 >= lo128 && v128 < hi128 {
                    bm.add(row_id as u64);
                }
            }
        }
        Ok(bm)
    }

    pub fn try_get_int(&self, row_id: u64) -> Option<i64> {
        self.values.get(row_id as usize).copied().flatten()
    }

    pub fn try_get_int_batch(&self, ids: &[u64], out_values: &mut Vec<Option<i64>>) {
        out_values.clear();
        out_values.extend(ids.iter().map(|id| self.try_get_int(*id)));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> IndexStat {
        IndexStat {
            name: self.name.clone(),
            kind: IndexKind::Vector,
            count: self.values.iter().filter(|v| v.is_some()).count() as u64,
            distinct_keys: 0,
        }
    }
}

pub struct VectorStringIndex {
    name: String,
    column_path: String,
    values: Vec<Option<String>>,
}

impl VectorStringIndex {
    pub fn new(name: impl Into<String>, column_path: impl Into<String>) -> Self {
        VectorStringIndex { name: name.into(), column_path: column_path.into(), values: Vec::new() }
    }

    pub fn column_path(&self) -> &str {
        &self.column_path
    }

    pub fn insert(&mut self, row_id: u64, value: Option<String>) -> Result<()> {
        if row_id as usize != self.values.len() {
            return err_at!(InvalidArgument, msg: "vector index insert out of order: row_id {} != len {}", row_id, self.values.len());
        }
        self.values.push(value);
        Ok(())
    }

    fn matches(op: Op, slot: &str, bound: &str) -> bool {
        match op {
            Op::Equal => slot == bound,
            Op::LessThan => slot < bound,
            Op::LessThanEqual => slot <= bound,
            Op::GreaterThan => slot > bound,
            Op::GreaterThanEqual => slot >= bound,
            Op::Match => false,
        }
    }

    pub fn filter(&self, c: &Constraint) -> Result<Bitmap> {
        if matches!(c.op, Op::Match) {
            return err_at!(InvalidOperator, msg: "MATCH has no full-text index in this core");
        }
        let bound = c.as_string()?;
        let mut bm = Bitmap::new();
        for (row_id, slot) in self.values.iter().enumerate() {
            if let Some(v) = slot {
                if Self::matches(c.op, v, bound) {
                    bm.add(row_id as u64);
                }
            }
        }
        Ok(bm)
    }

    pub fn filter_range(&self, lo: &Constraint, hi: &Constraint) -> Result<Bitmap> {
        let lo_bound = lo.as_string()?.to_string();
        let hi_bound = hi.as_string()?.to_string();
        let lo_inclusive = matches!(lo.op, Op::GreaterThanEqual);
        let hi_inclusive = matches!(hi.op, Op::LessThanEqual);
        let mut bm = Bitmap::new();
        for (row_id, slot) in self.values.iter().enumerate() {
            if let Some(v) = slot {
                let above = if lo_inclusive { v.as_str() >= lo_bound.as_str() } else { v.as_str() > lo_bound.as_str() };
                let below = if hi_inclusive { v.as_str() <= hi_bound.as_str() } else { v.as_str() < hi_bound.as_str() };
                if above && below {
                    bm.add(row_id as u64);
                }
            }
        }
        Ok(bm)
    }

    pub fn try_get_string(&self, row_id: u64) -> Option<String> {
        self.values.get(row_id as usize).cloned().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> IndexStat {
        IndexStat {
            name: self.name.clone(),
            kind: IndexKind::Vector,
            count: self.values.iter().filter(|v| v.is_some()).count() as u64,
            distinct_keys: 0,
        }
    }
}

#[cfg(test)]
#[path = "vector_test.rs"]
mod vector_test;
