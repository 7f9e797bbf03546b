//! Per-index introspection, returned by every indexer's `stats()`.

use cbordata::Cborize;

const INDEX_KIND_VER: u32 = 0x0001_0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Cborize)]
pub enum IndexKind {
    InvertedCompressedBitmap,
    Vector,
}

impl IndexKind {
    const ID: u32 = INDEX_KIND_VER;
}

#[derive(Debug, Clone)]
pub struct IndexStat {
    pub name: String,
    pub kind: IndexKind,
    /// Number of rows carrying a non-null value for the indexed column.
    pub count: u64,
    /// Number of distinct keys, for inverted indexes; 0 for vector indexes
    /// (every row occupies its own slot, distinct keys are not tracked).
    pub distinct_keys: u64,
}
