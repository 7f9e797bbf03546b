//! Per-column typed indexes (spec §4.E). Rather than dynamic dispatch over a
//! trait object, [Indexer] is a tagged union over the four concrete shapes
//! this core needs; each arm shares the same method signatures over
//! [Constraint], so the match in every method below monomorphizes to a
//! direct call (spec §9, "virtual dispatch across heterogeneous indexers").

pub mod constraint;
pub mod inverted;
pub mod stats;
pub mod vector;

pub use constraint::{Constraint, IndexConstraintOperator, Operand, OperandType};
pub use stats::{IndexKind, IndexStat};

use inverted::{InvertedIntIndex, InvertedStringIndex};
use vector::{VectorIntIndex, VectorStringIndex};

use cbordata::Cborize;

use crate::{
    bitmap::Bitmap,
    err_at,
    schema::{Document, FieldType},
    Result,
};

const INDEX_DEF_VER: u32 = 0x0001_0001;

/// A declared index: `(name, kind, column_path, ascending)` per spec §3.
/// Persisted in the catalog as `CollectionIndex.binary_index_info`.
#[derive(Debug, Clone, Cborize)]
pub struct IndexDef {
    pub name: String,
    pub kind: IndexKind,
    pub column_path: String,
    pub ascending: bool,
}

impl IndexDef {
    const ID: u32 = INDEX_DEF_VER;
}

/// A live, in-memory index instance bound to a declared [IndexDef] and a
/// resolved schema [FieldType].
pub enum Indexer {
    InvertedString(InvertedStringIndex),
    InvertedInt(InvertedIntIndex),
    VectorString(VectorStringIndex),
    VectorInt(VectorIntIndex),
}

impl Indexer {
    pub fn new(def: &IndexDef, field_type: FieldType) -> Result<Indexer> {
        match (def.kind, field_type) {
            (IndexKind::InvertedCompressedBitmap, FieldType::String) => {
                Ok(Indexer::InvertedString(InvertedStringIndex::new(def.name.clone(), def.column_path.clone())))
            }
            (IndexKind::InvertedCompressedBitmap, FieldType::Integer) => {
                Ok(Indexer::InvertedInt(InvertedIntIndex::new(def.name.clone(), def.column_path.clone())))
            }
            (IndexKind::Vector, FieldType::String) => {
                Ok(Indexer::VectorString(VectorStringIndex::new(def.name.clone(), def.column_path.clone())))
            }
            (IndexKind::Vector, FieldType::Integer) => {
                Ok(Indexer::VectorInt(VectorIntIndex::new(def.name.clone(), def.column_path.clone())))
            }
            (_, field_type) => err_at!(
                InvalidArgument,
                msg: "index {} on column {} has no indexer for field type {:?}",
                def.name, def.column_path, field_type
            ),
        }
    }

    pub fn column_path(&self) -> &str {
        match self {
            Indexer::InvertedString(i) => i.column_path(),
            Indexer::InvertedInt(i) => i.column_path(),
            Indexer::VectorString(i) => i.column_path(),
            Indexer::VectorInt(i) => i.column_path(),
        }
    }

    /// Extract this indexer's column from `doc` and record `row_id`. `row_id`
    /// must equal the count of rows already seen by this indexer (spec
    /// §4.G, enforced by the vector variants; inverted variants tolerate any
    /// monotonic sequence since they key by value, not position).
    pub fn insert(&mut self, row_id: u64, doc: &dyn Document) -> Result<()> {
        match self {
            Indexer::InvertedString(i) => {
                let v = doc.get_string(i.column_path())?;
                i.insert(row_id, v.as_deref());
                Ok(())
            }
            Indexer::InvertedInt(i) => {
                let v = doc.get_int(i.column_path())?;
                i.insert(row_id, v);
                Ok(())
            }
            Indexer::VectorString(i) => {
                let v = doc.get_string(i.column_path())?;
                i.insert(row_id, v)
            }
            Indexer::VectorInt(i) => {
                let v = doc.get_int(i.column_path())?;
                i.insert(row_id, v)
            }
        }
    }

    pub fn filter(&self, c: &Constraint) -> Result<Bitmap> {
        match self {
            Indexer::InvertedString(i) => i.filter(c),
            Indexer::InvertedInt(i) => i.filter(c),
            Indexer::VectorString(i) => i.filter(c),
            Indexer::VectorInt(i) => i.filter(c),
        }
    }

    pub fn filter_range(&self, lo: &Constraint, hi: &Constraint) -> Result<Bitmap> {
        match self {
            Indexer::InvertedString(i) => i.filter_range(lo, hi),
            Indexer::InvertedInt(i) => i.filter_range(lo, hi),
            Indexer::VectorString(i) => i.filter_range(lo, hi),
            Indexer::VectorInt(i) => i.filter_range(lo, hi),
        }
    }

    pub fn try_get_int(&self, row_id: u64) -> Option<i64> {
        match self {
            Indexer::InvertedInt(i) => i.try_get_int(row_id),
            Indexer::VectorInt(i) => i.try_get_int(row_id),
            _ => None,
        }
    }

    pub fn try_get_int_batch(&self, ids: &[u64], out_values: &mut Vec<Option<i64>>) {
        match self {
            Indexer::VectorInt(i) => i.try_get_int_batch(ids, out_values),
            other => {
                out_values.clear();
                out_values.extend(ids.iter().map(|id| other.try_get_int(*id)));
            }
        }
    }

    pub fn try_get_string(&self, row_id: u64) -> Option<String> {
        match self {
            Indexer::InvertedString(i) => i.try_get_string(row_id),
            Indexer::VectorString(i) => i.try_get_string(row_id),
            _ => None,
        }
    }

    pub fn stats(&self) -> IndexStat {
        match self {
            Indexer::InvertedString(i) => i.stats(),
            Indexer::InvertedInt(i) => i.stats(),
            Indexer::VectorString(i) => i.stats(),
            Indexer::VectorInt(i) => i.stats(),
        }
    }

    /// True for the vector variants, which support covering reads without a
    /// blob fetch (spec §4.I "prefers the column's own vector index").
    pub fn is_covering(&self) -> bool {
        matches!(self, Indexer::VectorString(_) | Indexer::VectorInt(_))
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
