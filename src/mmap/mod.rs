//! Bounded LRU cache of memory-map handles (spec §4.B).
//!
//! Grounded on the teacher's `clru` package (`Config`/`Stats` naming), but
//! deliberately simplified: the teacher's `clru::Lru` is a lock-free
//! concurrent cache with a background eviction thread (see DESIGN.md for why
//! that shape doesn't fit here) — this cache is a small `Mutex`-guarded
//! table, matching spec §4.B's explicit, externally-triggered
//! `perform_eviction()` contract rather than a continuously-running evictor.

mod cache;

pub use cache::{Cache, Stats};
