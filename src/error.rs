//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [Result], and every error
//! value is constructed through the [err_at] macro so that it carries the
//! `file:line` of the call site, per the "errors carry source location"
//! requirement.

use std::{ffi, fmt, result};

pub type Result<T> = result::Result<T, Error>;

/// Taxonomy of failures surfaced by this crate.
#[derive(Debug)]
pub enum Error {
    /// Empty names, nullptr-equivalent buffers with nonzero length,
    /// capacity < length, bad field paths, invalid schema text.
    InvalidArgument(String),
    /// Filter/range dispatch received an unsupported `Constraint` operator
    /// (currently only `MATCH`, which has no full-text index in this core).
    InvalidOperator(String),
    /// Unique-key violation for `Collection` in the catalog.
    CollectionAlreadyExists(String),
    /// Unique-key violation for `CollectionIndex` in the catalog.
    IndexAlreadyExists(String),
    /// `Database::open` with `create_db_if_missing = false` and no catalog
    /// file present.
    MissingDatabaseFile(String),
    /// Schema field index requested past `root_field_count`.
    IndexOutOfBound(String),
    /// Schema text rejected by the (external) schema parser.
    SchemaParseError(String),
    /// Any failure surfaced by the embedded relational engine.
    SQLError(String),
    /// Varint overflow, decompression failure, version mismatch, or
    /// `data_length` past end of file during iteration.
    CorruptedBlob(String),
    /// mmap/open/allocate failures, and other raw I/O errors.
    IOError(String),
    /// A collection referenced by name does not exist.
    UnknownCollection(String),
    /// An index referenced by name does not exist on its collection.
    UnknownIndex(String),
    /// A value could not be narrowed/converted (e.g. `usize` <-> `u64`).
    FailConvert(String),
    /// Indexer `insert` failed after its blob was already durable; only a
    /// restart + replay can recover index consistency at this point.
    IndexerPoisoned(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(s) => write!(f, "invalid argument: {}", s),
            Error::InvalidOperator(s) => write!(f, "invalid operator: {}", s),
            Error::CollectionAlreadyExists(s) => write!(f, "collection already exists: {}", s),
            Error::IndexAlreadyExists(s) => write!(f, "index already exists: {}", s),
            Error::MissingDatabaseFile(s) => write!(f, "missing database file: {}", s),
            Error::IndexOutOfBound(s) => write!(f, "index out of bound: {}", s),
            Error::SchemaParseError(s) => write!(f, "schema parse error: {}", s),
            Error::SQLError(s) => write!(f, "sql error: {}", s),
            Error::CorruptedBlob(s) => write!(f, "corrupted blob: {}", s),
            Error::IOError(s) => write!(f, "io error: {}", s),
            Error::UnknownCollection(s) => write!(f, "unknown collection: {}", s),
            Error::UnknownIndex(s) => write!(f, "unknown index: {}", s),
            Error::FailConvert(s) => write!(f, "failed conversion: {}", s),
            Error::IndexerPoisoned(s) => write!(f, "indexer poisoned: {}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IOError(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Error {
        Error::SQLError(err.to_string())
    }
}

impl From<ffi::OsString> for Error {
    fn from(err: ffi::OsString) -> Error {
        Error::InvalidArgument(format!("{:?}", err))
    }
}

/// Build an [Error] variant tagged with the call-site location.
///
/// Three call shapes, matching the teacher's convention:
/// - `err_at!(Variant, fallible_expr)` — convert `Result<T, E: Display>` into
///   `Result<T, Error>`, wrapping the `Display` text.
/// - `err_at!(Variant, fallible_expr, "fmt", args...)` — same, with an extra
///   contextual message appended.
/// - `err_at!(Variant, msg: "fmt", args...)` — construct an error directly
///   from a formatted message, no expression to convert.
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(format!("{} {}", prefix, format!($($arg),+))))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(format!("{} {}", prefix, err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let ctx = format!($($arg),+);
                Err($crate::Error::$v(format!("{} {}: {}", prefix, ctx, err)))
            }
        }
    }};
}
