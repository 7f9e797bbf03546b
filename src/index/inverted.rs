//! Inverted compressed-bitmap index (spec §4.E.1): an ordered `value ->
//! Bitmap` map. A row with a null/absent field is simply never inserted, so
//! it is omitted from every entry — no distinguished null key is stored, and
//! range scans and equality therefore skip nulls for free.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::{
    bitmap::Bitmap,
    err_at,
    index::constraint::{
        normalize_int_constraint, Constraint, IndexConstraintOperator as Op, NormalizedInt,
        Operand,
    },
    index::stats::{IndexKind, IndexStat},
    Result,
};

/// Shared ordered-map traversal core for both the string and integer
/// inverted indexes.
struct OrderedMap<K: Ord + Clone> {
    entries: BTreeMap<K, Bitmap>,
}

impl<K: Ord + Clone> OrderedMap<K> {
    fn new() -> Self {
        OrderedMap { entries: BTreeMap::new() }
    }

    fn insert(&mut self, row_id: u64, key: K) {
        self.entries.entry(key).or_insert_with(Bitmap::new).add(row_id);
    }

    fn eq(&self, key: &K) -> Bitmap {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Keys `< bound` (or `<= bound` when `inclusive`), in ascending order.
    fn lt(&self, bound: &K, inclusive: bool) -> Bitmap {
        let bitmaps: Vec<Bitmap> = self
            .entries
            .range(..)
            .take_while(|(k, _)| if inclusive { *k <= bound } else { *k < bound })
            .map(|(_, b)| b.clone())
            .collect();
        Bitmap::reduce_or(&bitmaps)
    }

    /// Keys `> bound` (or `>= bound` when `inclusive`), in ascending order.
    fn gt(&self, bound: &K, inclusive: bool) -> Bitmap {
        let start = if inclusive {
            Bound::Included(bound.clone())
        } else {
            Bound::Excluded(bound.clone())
        };
        let bitmaps: Vec<Bitmap> = self
            .entries
            .range((start, Bound::Unbounded))
            .map(|(_, b)| b.clone())
            .collect();
        Bitmap::reduce_or(&bitmaps)
    }

    fn range(&self, lo: &K, lo_inclusive: bool, hi: &K, hi_inclusive: bool) -> Bitmap {
        let start = if lo_inclusive {
            Bound::Included(lo.clone())
        } else {
            Bound::Excluded(lo.clone())
        };
        let bitmaps: Vec<Bitmap> = self
            .entries
            .range((start, Bound::Unbounded))
            .take_while(|(k, _)| if hi_inclusive { *k <= hi } else { *k < hi })
            .map(|(_, b)| b.clone())
            .collect();
        Bitmap::reduce_or(&bitmaps)
    }

    fn distinct_keys(&self) -> u64 {
        self.entries.len() as u64
    }
}

pub struct InvertedStringIndex {
    name: String,
    column_path: String,
    map: OrderedMap<String>,
    count: u64,
}

impl InvertedStringIndex {
    pub fn new(name: impl Into<String>, column_path: impl Into<String>) -> Self {
        InvertedStringIndex {
            name: name.into(),
            column_path: column_path.into(),
            map: OrderedMap::new(),
            count: 0,
        }
    }

    pub fn column_path(&self) -> &str {
        &self.column_path
    }

    pub fn insert(&mut self, row_id: u64, value: Option<&str>) {
        if let Some(v) = value {
            self.map.insert(row_id, v.to_string());
            self.count += 1;
        }
    }

    pub fn filter(&self, c: &Constraint) -> Result<Bitmap> {
        let bound = c.as_string()?.to_string();
        match c.op {
            Op::Equal => Ok(self.map.eq(&bound)),
            Op::LessThan => Ok(self.map.lt(&bound, false)),
            Op::LessThanEqual => Ok(self.map.lt(&bound, true)),
            Op::GreaterThan => Ok(self.map.gt(&bound, false)),
            Op::GreaterThanEqual => Ok(self.map.gt(&bound, true)),
            Op::Match => err_at!(InvalidOperator, msg: "MATCH has no full-text index in this core"),
        }
    }

    pub fn filter_range(&self, lo: &Constraint, hi: &Constraint) -> Result<Bitmap> {
        let lo_bound = lo.as_string()?.to_string();
        let hi_bound = hi.as_string()?.to_string();
        let lo_inclusive = matches!(lo.op, Op::GreaterThanEqual);
        let hi_inclusive = matches!(hi.op, Op::LessThanEqual);
        Ok(self.map.range(&lo_bound, lo_inclusive, &hi_bound, hi_inclusive))
    }

    pub fn try_get_string(&self, row_id: u64) -> Option<String> {
        self.map
            .entries
            .iter()
            .find(|(_, bm)| bm.contains(row_id))
            .map(|(k, _)| k.clone())
    }

    pub fn stats(&self) -> IndexStat {
        IndexStat {
            name: self.name.clone(),
            kind: IndexKind::InvertedCompressedBitmap,
            count: self.count,
            distinct_keys: self.map.distinct_keys(),
        }
    }
}

pub struct InvertedIntIndex {
    name: String,
    column_path: String,
    map: OrderedMap<i64>,
    count: u64,
}

impl InvertedIntIndex {
    pub fn new(name: impl Into<String>, column_path: impl Into<String>) -> Self {
        InvertedIntIndex {
            name: name.into(),
            column_path: column_path.into(),
            map: OrderedMap::new(),
            count: 0,
        }
    }

    pub fn column_path(&self) -> &str {
        &self.column_path
    }

    pub fn insert(&mut self, row_id: u64, value: Option<i64>) {
        if let Some(v) = value {
            self.map.insert(row_id, v);
            self.count += 1;
        }
    }

    pub fn filter(&self, c: &Constraint) -> Result<Bitmap> {
        match normalize_int_constraint(c) {
            NormalizedInt::Empty => Ok(Bitmap::new()),
            NormalizedInt::Cmp { op, value } => match op {
                Op::Equal => Ok(self.map.eq(&value)),
                Op::LessThan => Ok(self.map.lt(&value, false)),
                Op::LessThanEqual => Ok(self.map.lt(&value, true)),
                Op::GreaterThan => Ok(self.map.gt(&value, false)),
                Op::GreaterThanEqual => Ok(self.map.gt(&value, true)),
                Op::Match => {
                    err_at!(InvalidOperator, msg: "MATCH has no full-text index in this core")
                }
            },
        }
    }

    pub fn filter_range(&self, lo: &Constraint, hi: &Constraint) -> Result<Bitmap> {
        let lo_norm = normalize_int_constraint(lo);
        let hi_norm = normalize_int_constraint(hi);
        match (lo_norm, hi_norm) {
            (NormalizedInt::Empty, _) | (_, NormalizedInt::Empty) => Ok(Bitmap::new()),
            (NormalizedInt::Cmp { op: lo_op, value: lo_v }, NormalizedInt::Cmp { op: hi_op, value: hi_v }) => {
                let lo_inclusive = matches!(lo_op, Op::GreaterThanEqual);
                let hi_inclusive = matches!(hi_op, Op::LessThanEqual);
                Ok(self.map.range(&lo_v, lo_inclusive, &hi_v, hi_inclusive))
            }
        }
    }

    pub fn try_get_int(&self, row_id: u64) -> Option<i64> {
        self.map
            .entries
            .iter()
            .find(|(_, bm)| bm.contains(row_id))
            .map(|(k, _)| *k)
    }

    pub fn stats(&self) -> IndexStat {
        IndexStat {
            name: self.name.clone(),
            kind: IndexKind::InvertedCompressedBitmap,
            count: self.count,
            distinct_keys: self.map.distinct_keys(),
        }
    }
}

#[cfg(test)]
#[path = "inverted_test.rs"]
mod inverted_test;
