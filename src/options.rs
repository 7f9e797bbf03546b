//! Database-wide configuration (spec §6 "Configuration options"), in the
//! `new()` + chainable `set_*` builder shape used throughout this crate's
//! ancestor (see `robt::config::Config`).

use std::sync::Arc;

use crate::schema::SchemaFactory;

/// Per-segment size cap triggering rotation. Default 512 MiB.
pub const DEFAULT_MAX_DATA_FILE_SIZE: u64 = 512 * 1024 * 1024;
/// RSS trigger for `unmap_lru`. Default 4 GiB. Advisory only: nothing in
/// this crate samples RSS itself, a caller's own monitoring loop calls
/// `Database::unmap_lru` when this threshold is crossed.
pub const DEFAULT_MEMORY_CLEANUP_THRESHOLD: u64 = 4 * 1024 * 1024 * 1024;
/// LRU capacity for reader mappings. Default 3, matching [crate::mmap::Cache].
pub const DEFAULT_MMAP_READER_CACHE_SIZE: usize = 3;

/// Database-wide settings (spec §6). `schema_factory` is this crate's
/// resolution of the open question raised by treating the schema format as
/// an external collaborator: `Database::open` takes no extra parameter
/// beyond `(path, options)`, so the callback that turns a collection's
/// `(schema_type, schema_blob)` into a live `Arc<dyn Schema>` is threaded
/// through `Options` instead. See DESIGN.md.
#[derive(Clone)]
pub struct Options {
    pub create_db_if_missing: bool,
    pub max_data_file_size: u64,
    pub memory_cleanup_threshold: u64,
    pub synchronous: bool,
    pub compress: bool,
    pub mmap_reader_cache_size: usize,
    pub(crate) schema_factory: Arc<dyn SchemaFactory>,
}

impl Options {
    /// Create a new configuration value with every default from spec §6,
    /// resolving schemas through `schema_factory`. Use the `set_*` methods
    /// to override individual fields.
    pub fn new(schema_factory: Arc<dyn SchemaFactory>) -> Options {
        Options {
            create_db_if_missing: true,
            max_data_file_size: DEFAULT_MAX_DATA_FILE_SIZE,
            memory_cleanup_threshold: DEFAULT_MEMORY_CLEANUP_THRESHOLD,
            synchronous: true,
            compress: true,
            mmap_reader_cache_size: DEFAULT_MMAP_READER_CACHE_SIZE,
            schema_factory,
        }
    }

    pub fn set_create_db_if_missing(&mut self, create_db_if_missing: bool) -> &mut Self {
        self.create_db_if_missing = create_db_if_missing;
        self
    }

    pub fn set_max_data_file_size(&mut self, max_data_file_size: u64) -> &mut Self {
        self.max_data_file_size = max_data_file_size;
        self
    }

    pub fn set_memory_cleanup_threshold(&mut self, memory_cleanup_threshold: u64) -> &mut Self {
        self.memory_cleanup_threshold = memory_cleanup_threshold;
        self
    }

    pub fn set_synchronous(&mut self, synchronous: bool) -> &mut Self {
        self.synchronous = synchronous;
        self
    }

    pub fn set_compress(&mut self, compress: bool) -> &mut Self {
        self.compress = compress;
        self
    }

    pub fn set_mmap_reader_cache_size(&mut self, mmap_reader_cache_size: usize) -> &mut Self {
        self.mmap_reader_cache_size = mmap_reader_cache_size;
        self
    }
}

#[cfg(test)]
#[path = "options_test.rs"]
mod options_test;
