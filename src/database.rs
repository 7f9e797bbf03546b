//! Top-level facade (spec §6 "Public API surface"): opens a database
//! directory, creates collections, accepts inserts, and answers SQL.
//!
//! Wires together every other module: the catalog is the durable source of
//! truth for collections/indexes/segments; each collection owns its own
//! blob manager and indexer set; the query dispatcher's virtual-table
//! module is registered once against a dedicated in-memory SQL connection
//! and one virtual table is created per collection.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, RwLock},
};

use fs2::FileExt;
use log::info;
use rusqlite::Connection;

use crate::{
    blob::{BlobManager, FileNameManager},
    catalog::Catalog,
    collection::Collection,
    err_at,
    index::IndexDef,
    options::Options,
    query::{self, CollectionRegistry, ResultSet},
    Result,
};

/// Guards the directory against a second writer process opening it
/// concurrently (spec §5 "one writer per collection" is a single-process
/// guarantee; this lock keeps it true across processes too, even though
/// the core itself treats multi-process writers as out of scope). Released
/// automatically when the `Database` (and this file handle) is dropped.
struct DirLock(fs::File);

impl DirLock {
    fn acquire(dir: &Path, db_name: &str) -> Result<DirLock> {
        let path = dir.join(format!("{}.lock", db_name));
        let file = err_at!(IOError, fs::OpenOptions::new().read(true).write(true).create(true).open(&path))?;
        err_at!(IOError, file.try_lock_exclusive(), "another process already has {:?} open", path)?;
        Ok(DirLock(file))
    }
}

pub struct Database {
    dir: PathBuf,
    db_name: String,
    catalog: Arc<Catalog>,
    options: Options,
    registry: Arc<CollectionRegistry>,
    conn: Mutex<Connection>,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    _lock: DirLock,
}

fn db_name_of(path: &Path) -> Result<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => err_at!(InvalidArgument, msg: "database path {:?} has no usable directory name", path),
    }
}

impl Database {
    /// Open (or create) the database directory at `path` (spec §6
    /// `Database::open`). Every collection recorded in the catalog is
    /// reconstructed and replayed before this call returns, so the database
    /// is immediately queryable.
    pub fn open(path: &Path, options: Options) -> Result<Database> {
        if !path.exists() {
            if !options.create_db_if_missing {
                return err_at!(MissingDatabaseFile, msg: "database directory {:?} not found", path);
            }
            err_at!(IOError, fs::create_dir_all(path))?;
        }
        let db_name = db_name_of(path)?;
        let lock = DirLock::acquire(path, &db_name)?;
        let catalog_path = path.join(format!("{}.dat", db_name));
        let catalog = Arc::new(Catalog::open(&catalog_path, options.create_db_if_missing)?);

        let conn = err_at!(SQLError, Connection::open_in_memory())?;
        let registry = Arc::new(CollectionRegistry::new());
        err_at!(SQLError, query::register_module(&conn, Arc::clone(&registry)))?;

        let database = Database {
            dir: path.to_path_buf(),
            db_name,
            catalog,
            options,
            registry,
            conn: Mutex::new(conn),
            collections: RwLock::new(HashMap::new()),
            _lock: lock,
        };

        for metadata in database.catalog.load_all()? {
            let collection = database.rebuild_collection(
                &metadata.name,
                metadata.schema_type,
                &metadata.schema,
                &metadata.indexes,
            )?;
            collection.replay(&metadata)?;
            database.register_collection(collection)?;
        }

        info!("stratumdb: opened {:?} with {} collection(s)", path, database.collections.read().unwrap().len());
        Ok(database)
    }

    fn rebuild_collection(
        &self,
        name: &str,
        schema_type: i32,
        schema_blob: &[u8],
        indexes: &[IndexDef],
    ) -> Result<Collection> {
        let schema = self.options.schema_factory.resolve(schema_type, schema_blob)?;
        let filenames =
            FileNameManager::new(self.dir.clone(), self.db_name.clone(), name.to_string(), Arc::clone(&self.catalog));
        let blobs = BlobManager::open(
            filenames,
            self.options.max_data_file_size,
            self.options.synchronous,
            self.options.mmap_reader_cache_size,
        )?;
        Collection::new(name.to_string(), schema, schema_type, schema_blob.to_vec(), indexes.to_vec(), blobs)
    }

    fn register_collection(&self, collection: Collection) -> Result<()> {
        let collection = Arc::new(collection);
        self.registry.insert(Arc::clone(&collection));
        self.collections.write().unwrap().insert(collection.name().to_string(), Arc::clone(&collection));
        let conn = self.conn.lock().unwrap();
        err_at!(SQLError, query::create_virtual_table(&conn, collection.name()))
    }

    /// Declare a new collection (spec §4.G, §4.H `add_collection`). Indexes
    /// are fixed at creation time; this core does not support adding an
    /// index to a collection that already has documents.
    pub fn create_collection(
        &self,
        name: &str,
        schema_type: i32,
        schema_blob: &[u8],
        indexes: &[IndexDef],
    ) -> Result<()> {
        self.catalog.add_collection(name, schema_type, schema_blob, indexes)?;
        let collection = self.rebuild_collection(name, schema_type, schema_blob, indexes)?;
        self.register_collection(collection)
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        match self.collections.read().unwrap().get(name) {
            Some(collection) => Ok(Arc::clone(collection)),
            None => err_at!(UnknownCollection, msg: "{}", name),
        }
    }

    /// Append one document to `collection` (spec §4.G `insert`).
    pub fn insert(&self, collection: &str, document: &[u8]) -> Result<u64> {
        self.collection(collection)?.insert(document, self.options.compress)
    }

    /// Append a batch of documents to `collection` (spec §4.G "Bulk
    /// insert"), using the collection's batched `multi_insert` path.
    pub fn multi_insert(&self, collection: &str, documents: &[&[u8]]) -> Result<Vec<u64>> {
        self.collection(collection)?.multi_insert(documents, self.options.compress)
    }

    /// Run a read-only SQL statement against the registered virtual tables
    /// and return its fully materialized [ResultSet] (spec §4.I "Result
    /// set").
    pub fn execute(&self, sql: &str) -> Result<ResultSet> {
        let conn = self.conn.lock().unwrap();
        let stmt = err_at!(SQLError, conn.prepare(sql))?;
        ResultSet::from_statement(stmt, &[])
    }

    /// Memory-pressure hook (spec §5 "An external hook (`unmap_lru`)"):
    /// evict every collection's idle reader mappings.
    pub fn unmap_lru(&self) {
        for collection in self.registry.all() {
            collection.unmap_lru();
        }
    }
}

#[cfg(test)]
#[path = "database_test.rs"]
mod database_test;
