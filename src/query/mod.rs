//! Query dispatcher (spec §4.I): registers one virtual table per collection
//! with the embedded SQL engine, whose callbacks push predicate filtering
//! down into the collection's indexers and materialize projected cells
//! either from a covering index or from the original blob.

mod resultset;
mod vtab;

pub use resultset::{CellValue, ColumnType, ResultSet};
pub(crate) use vtab::{create_virtual_table, register_module, CollectionRegistry};
