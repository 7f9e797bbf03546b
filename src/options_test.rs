use std::sync::Arc;

use super::*;
use crate::{
    schema::{Document, FieldType, Schema},
    Result,
};

struct NullFactory;

impl SchemaFactory for NullFactory {
    fn resolve(&self, _schema_type: i32, _schema_blob: &[u8]) -> Result<Arc<dyn Schema>> {
        struct Empty;
        impl Schema for Empty {
            fn field_type(&self, _path: &str) -> Result<FieldType> {
                unimplemented!()
            }
            fn column_paths(&self) -> &[String] {
                &[]
            }
            fn decode(&self, _bytes: &[u8]) -> Result<Box<dyn Document>> {
                unimplemented!()
            }
        }
        Ok(Arc::new(Empty))
    }
}

#[test]
fn test_defaults_match_spec_table() {
    let opts = Options::new(Arc::new(NullFactory));
    assert!(opts.create_db_if_missing);
    assert_eq!(opts.max_data_file_size, DEFAULT_MAX_DATA_FILE_SIZE);
    assert_eq!(opts.memory_cleanup_threshold, DEFAULT_MEMORY_CLEANUP_THRESHOLD);
    assert!(opts.synchronous);
    assert!(opts.compress);
    assert_eq!(opts.mmap_reader_cache_size, DEFAULT_MMAP_READER_CACHE_SIZE);
}

#[test]
fn test_builder_overrides() {
    let mut opts = Options::new(Arc::new(NullFactory));
    opts.set_create_db_if_missing(false)
        .set_max_data_file_size(1024)
        .set_memory_cleanup_threshold(2048)
        .set_synchronous(false)
        .set_compress(false)
        .set_mmap_reader_cache_size(7);

    assert!(!opts.create_db_if_missing);
    assert_eq!(opts.max_data_file_size, 1024);
    assert_eq!(opts.memory_cleanup_threshold, 2048);
    assert!(!opts.synchronous);
    assert!(!opts.compress);
    assert_eq!(opts.mmap_reader_cache_size, 7);
}
