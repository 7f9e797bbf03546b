//! Compressed, run-length-encoded row-ID sets.
//!
//! [Bitmap] is the set-theoretic value described in spec §4.A: an ordered
//! set of non-negative row IDs supporting `add`, boolean `AND`/`OR`, and
//! ascending iteration. The encoding is a 64-bit compressed roaring bitmap
//! (`croaring::Treemap`, the same `croaring` crate the teacher uses for its
//! bloom-filter bitmaps in `bitmaps/croaring.rs`, here reused for its
//! 64-bit tree variant instead of the 32-bit one).

mod roaring;

pub use roaring::Bitmap;

#[cfg(test)]
#[path = "roaring_test.rs"]
mod roaring_test;
