//! Catalog row shapes (spec §4.H): the in-memory image of what
//! `Catalog::load_all` reconstructs from the three relational tables.

use crate::index::IndexDef;

#[derive(Debug, Clone)]
pub struct SegmentInfo {
    pub file_key: u32,
    pub file_name: String,
    pub data_length: u64,
}

#[derive(Debug, Clone)]
pub struct CollectionMetadata {
    pub name: String,
    pub schema_type: i32,
    pub schema: Vec<u8>,
    pub indexes: Vec<IndexDef>,
    pub segments: Vec<SegmentInfo>,
}
