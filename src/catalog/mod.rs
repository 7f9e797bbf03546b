//! Durable catalog of collections, schemas, indexes, and data-file segments
//! (spec §4.H). Backed by the same embedded relational engine the query
//! dispatcher uses to answer SQL (`rusqlite`), opened with WAL + full
//! synchronous durability and a bounded busy-handler retry.

pub mod model;

use std::{path::Path, sync::Mutex, time::Duration};

use rusqlite::{params, Connection};

pub use model::{CollectionMetadata, SegmentInfo};

use crate::{
    err_at,
    index::{IndexDef, IndexKind},
    util::{from_cbor_bytes, into_cbor_bytes},
    Result,
};

/// Busy-handler retry budget before a catalog mutation surfaces `SQLError`
/// (spec §4.H, §5 "bounded retry budget").
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn index_kind_code(kind: IndexKind) -> i64 {
    match kind {
        IndexKind::InvertedCompressedBitmap => 0,
        IndexKind::Vector => 1,
    }
}

pub struct Catalog {
    conn: Mutex<Connection>,
}

impl Catalog {
    pub fn open(path: &Path, create_if_missing: bool) -> Result<Catalog> {
        if !create_if_missing && !path.exists() {
            return err_at!(MissingDatabaseFile, msg: "catalog file {:?} not found", path);
        }
        let conn = err_at!(SQLError, Connection::open(path))?;
        err_at!(SQLError, conn.busy_timeout(BUSY_TIMEOUT))?;
        err_at!(SQLError, conn.pragma_update(None, "journal_mode", "WAL"))?;
        err_at!(SQLError, conn.pragma_update(None, "synchronous", "FULL"))?;

        let catalog = Catalog { conn: Mutex::new(conn) };
        catalog.create_tables()?;
        Ok(catalog)
    }

    fn create_tables(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        err_at!(
            SQLError,
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS collection (
                    name TEXT PRIMARY KEY,
                    schema_type INTEGER NOT NULL,
                    schema BLOB NOT NULL
                );
                CREATE TABLE IF NOT EXISTS collection_index (
                    collection TEXT NOT NULL REFERENCES collection(name),
                    index_name TEXT NOT NULL,
                    index_type INTEGER NOT NULL,
                    binary_index_info BLOB NOT NULL,
                    PRIMARY KEY (collection, index_name)
                );
                CREATE TABLE IF NOT EXISTS collection_data_file (
                    collection TEXT NOT NULL REFERENCES collection(name),
                    file_key INTEGER NOT NULL,
                    file_name TEXT NOT NULL,
                    data_length INTEGER NOT NULL,
                    PRIMARY KEY (collection, file_key)
                );"
            )
        )
    }

    /// Insert a new `Collection` row plus its declared indexes inside one
    /// transaction (spec §4.H). A primary-key violation on `collection`
    /// surfaces as [crate::Error::CollectionAlreadyExists]; any failure
    /// while inserting indexes rolls the whole transaction back.
    pub fn add_collection(
        &self,
        name: &str,
        schema_type: i32,
        schema: &[u8],
        indexes: &[IndexDef],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = err_at!(SQLError, conn.transaction())?;

        match tx.execute(
            "INSERT INTO collection(name, schema_type, schema) VALUES (?1, ?2, ?3)",
            params![name, schema_type, schema],
        ) {
            Ok(_) => (),
            Err(err) if is_constraint_violation(&err) => {
                return err_at!(CollectionAlreadyExists, msg: "{}", name);
            }
            Err(err) => return err_at!(SQLError, Err(err)),
        }

        for index in indexes {
            let payload = into_cbor_bytes(index.clone())?;
            match tx.execute(
                "INSERT INTO collection_index(collection, index_name, index_type, binary_index_info)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, index.name, index_kind_code(index.kind), payload],
            ) {
                Ok(_) => (),
                Err(err) if is_constraint_violation(&err) => {
                    return err_at!(IndexAlreadyExists, msg: "{}.{}", name, index.name);
                }
                Err(err) => return err_at!(SQLError, Err(err)),
            }
        }

        err_at!(SQLError, tx.commit())
    }

    /// Register the first segment of a just-rotated-in data file (spec
    /// §4.C `get_next`).
    pub fn add_segment(&self, collection: &str, file_key: u32, file_name: &str, data_length: u64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        err_at!(
            SQLError,
            conn.execute(
                "INSERT INTO collection_data_file(collection, file_key, file_name, data_length)
                 VALUES (?1, ?2, ?3, ?4)",
                params![collection, file_key, file_name, data_length as i64],
            )
        )?;
        Ok(())
    }

    /// Record durable progress on a segment (spec §4.C `update_length`,
    /// called after every successful durable write).
    pub fn update_segment_length(&self, collection: &str, file_key: u32, data_length: u64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        err_at!(
            SQLError,
            conn.execute(
                "UPDATE collection_data_file SET data_length = ?1 WHERE collection = ?2 AND file_key = ?3",
                params![data_length as i64, collection, file_key],
            )
        )?;
        Ok(())
    }

    pub fn list_segments(&self, collection: &str) -> Result<Vec<SegmentInfo>> {
        let conn = self.conn.lock().unwrap();
        list_segments_conn(&conn, collection)
    }

    /// Reads `Collection` joined with `CollectionIndex` then
    /// `CollectionDataFile`, ordered by collection name and then file_key
    /// (spec §4.H `load_all`), returning a fully populated in-memory catalog
    /// image the collection layer replays from at open.
    pub fn load_all(&self) -> Result<Vec<CollectionMetadata>> {
        let conn = self.conn.lock().unwrap();

        let collections: Vec<(String, i32, Vec<u8>)> = {
            let mut stmt = err_at!(
                SQLError,
                conn.prepare("SELECT name, schema_type, schema FROM collection ORDER BY name")
            )?;
            let rows = err_at!(
                SQLError,
                stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as i32, row.get::<_, Vec<u8>>(2)?))
                })
            )?;
            let mut out = Vec::new();
            for row in rows {
                out.push(err_at!(SQLError, row)?);
            }
            out
        };

        let mut out = Vec::with_capacity(collections.len());
        for (name, schema_type, schema) in collections {
            let indexes = list_indexes_conn(&conn, &name)?;
            let segments = list_segments_conn(&conn, &name)?;
            out.push(CollectionMetadata { name, schema_type, schema, indexes, segments });
        }
        Ok(out)
    }
}

fn list_segments_conn(conn: &Connection, collection: &str) -> Result<Vec<SegmentInfo>> {
    let mut stmt = err_at!(
        SQLError,
        conn.prepare(
            "SELECT file_key, file_name, data_length FROM collection_data_file
             WHERE collection = ?1 ORDER BY file_key"
        )
    )?;
    let rows = err_at!(
        SQLError,
        stmt.query_map(params![collection], |row| {
            Ok(SegmentInfo {
                file_key: row.get::<_, i64>(0)? as u32,
                file_name: row.get(1)?,
                data_length: row.get::<_, i64>(2)? as u64,
            })
        })
    )?;
    let mut out = Vec::new();
    for row in rows {
        out.push(err_at!(SQLError, row)?);
    }
    Ok(out)
}

fn list_indexes_conn(conn: &Connection, collection: &str) -> Result<Vec<IndexDef>> {
    let mut stmt = err_at!(
        SQLError,
        conn.prepare(
            "SELECT binary_index_info FROM collection_index
             WHERE collection = ?1 ORDER BY index_name"
        )
    )?;
    let rows = err_at!(SQLError, stmt.query_map(params![collection], |row| row.get::<_, Vec<u8>>(0)))?;
    let mut out = Vec::new();
    for row in rows {
        let payload: Vec<u8> = err_at!(SQLError, row)?;
        let (index, _) = from_cbor_bytes::<IndexDef>(&payload)?;
        out.push(index);
    }
    Ok(out)
}
