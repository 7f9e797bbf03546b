//! The narrow boundary this crate consumes from the (external) schema and
//! document-encoding layer. Schema text parsing, the binary document
//! encoding, and the dotted-path resolver are out of scope here; this module
//! only fixes the trait shapes the rest of the crate is built against.

use std::sync::Arc;

use crate::Result;

/// Resolves a collection's durable `(schema_type, schema_blob)` pair (spec
/// §4.H `Collection` row) into a live schema instance. The schema
/// description format itself is out of scope for this crate (spec §1); a
/// caller supplies one implementation through `Options::new` and this crate
/// calls it both at `create_collection` and when rebuilding collections
/// from the catalog at `Database::open`.
pub trait SchemaFactory: Send + Sync {
    fn resolve(&self, schema_type: i32, schema_blob: &[u8]) -> Result<Arc<dyn Schema>>;
}

/// The value family a column can hold. `Integer`/`Double`/`String` line up
/// with `Constraint::operand_type` (see [crate::index::constraint]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Double,
    String,
    Blob,
}

/// A resolved schema: maps a dot-separated field path to its [FieldType].
/// Implementations live outside this core; `schema.field_type(path)` and
/// `schema.decode(bytes)` are the only queries this crate issues against it.
pub trait Schema: Send + Sync {
    fn field_type(&self, path: &str) -> Result<FieldType>;

    /// Every column path this schema exposes, in declaration order. Used by
    /// the query dispatcher to build the virtual table's column list (spec
    /// §4.I).
    fn column_paths(&self) -> &[String];

    /// Decode a blob written by [Document::encode] back into a live
    /// document. Called on every insert-path index update and at replay;
    /// never by the blob store itself, which treats the bytes as opaque.
    fn decode(&self, bytes: &[u8]) -> Result<Box<dyn Document>>;
}

/// A single decoded document. The core never inspects document bytes
/// directly; it asks for typed fields by dotted path and serializes/iterates
/// through this trait only.
pub trait Document {
    fn get_int(&self, path: &str) -> Result<Option<i64>>;
    fn get_double(&self, path: &str) -> Result<Option<f64>>;
    fn get_string(&self, path: &str) -> Result<Option<String>>;
    fn get_blob(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Opaque on-disk encoding of the whole document, as handed to the blob
    /// manager. Opaque to every layer above the blob store.
    fn encode(&self) -> Result<Vec<u8>>;
}
