use croaring::Treemap;

use std::sync::Arc;

/// A compressed, ordered set of row IDs.
///
/// Cheaply clonable: the underlying treemap is reference-counted, matching
/// the "shared, immutable after construction" ownership described in spec
/// §3/§9 — bitmaps published by an indexer's `filter`/`filter_range` are
/// handed out by `Arc` clone, never copied.
#[derive(Clone, Debug)]
pub struct Bitmap(Arc<Treemap>);

impl Default for Bitmap {
    fn default() -> Bitmap {
        Bitmap(Arc::new(Treemap::create()))
    }
}

impl Bitmap {
    pub fn new() -> Bitmap {
        Bitmap::default()
    }

    pub fn singleton(row_id: u64) -> Bitmap {
        let mut bm = Treemap::create();
        bm.add(row_id);
        Bitmap(Arc::new(bm))
    }

    /// Add `row_id` to this bitmap. Callers (indexers) guarantee `row_id` is
    /// greater than or equal to any value previously added to this same
    /// bitmap, since row IDs are assigned in monotonically increasing order.
    pub fn add(&mut self, row_id: u64) {
        Arc::make_mut(&mut self.0).add(row_id);
    }

    pub fn or(&self, other: &Bitmap) -> Bitmap {
        Bitmap(Arc::new(self.0.or(&other.0)))
    }

    pub fn and(&self, other: &Bitmap) -> Bitmap {
        Bitmap(Arc::new(self.0.and(&other.0)))
    }

    pub fn cardinality(&self) -> u64 {
        self.0.cardinality()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, row_id: u64) -> bool {
        self.0.contains(row_id)
    }

    /// Ascending iteration over set row IDs.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<u64> {
        self.iter().collect()
    }

    /// Fold a list of bitmaps with OR. An empty list is the neutral element
    /// (empty bitmap), matching OR's set-theoretic identity.
    pub fn reduce_or(bitmaps: &[Bitmap]) -> Bitmap {
        bitmaps
            .iter()
            .fold(Bitmap::default(), |acc, bm| acc.or(bm))
    }

    /// Fold a list of bitmaps with AND. An empty list returns the *empty*
    /// bitmap, not a universal set — this is the query-semantics choice from
    /// spec §4.A: "no bitmap means no rows match".
    pub fn reduce_and(bitmaps: &[Bitmap]) -> Bitmap {
        match bitmaps.split_first() {
            None => Bitmap::default(),
            Some((first, rest)) => rest.iter().fold(first.clone(), |acc, bm| acc.and(bm)),
        }
    }
}
