//! Document collection (spec §4.G): the per-collection write path. Owns the
//! blob manager, the live indexer set, and the dense `row_id -> BlobMetadata`
//! map the query dispatcher uses to fetch an original document when no
//! vector index covers a projected column.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::{
    blob::{BlobManager, BlobMetadata},
    catalog::CollectionMetadata,
    err_at,
    index::{Constraint, IndexDef, Indexer},
    schema::{Document, Schema},
    Result,
};

struct WriteState {
    next_row_id: u64,
    indexers: Vec<Indexer>,
    row_metas: Vec<BlobMetadata>,
}

pub struct Collection {
    name: String,
    schema: Arc<dyn Schema>,
    schema_type: i32,
    schema_blob: Vec<u8>,
    index_defs: Vec<IndexDef>,
    blobs: BlobManager,
    state: Mutex<WriteState>,
    /// Serializes the whole append path: a writer holds this across both
    /// `blobs.put`/`multi_put` and the following `apply_indexers` call, so
    /// the order blobs land in the log and the order row IDs/indexer state
    /// advance are always the same order (spec §4.G "one write mutex guards
    /// the blob manager's active-writer state and all indexers' state").
    /// Without it, `BlobManager`'s own internal mutex and `state`'s mutex
    /// would serialize independently, letting two concurrent inserts land
    /// their blobs in one order but their row IDs in the other — `replay`
    /// would then reassign different row IDs than were handed out live.
    write_lock: Mutex<()>,
}

impl Collection {
    pub fn new(
        name: String,
        schema: Arc<dyn Schema>,
        schema_type: i32,
        schema_blob: Vec<u8>,
        index_defs: Vec<IndexDef>,
        blobs: BlobManager,
    ) -> Result<Collection> {
        let indexers = index_defs
            .iter()
            .map(|def| Indexer::new(def, schema.field_type(&def.column_path)?))
            .collect::<Result<Vec<_>>>()?;
        let state = WriteState { next_row_id: 0, indexers, row_metas: Vec::new() };
        Ok(Collection {
            name,
            schema,
            schema_type,
            schema_blob,
            index_defs,
            blobs,
            state: Mutex::new(state),
            write_lock: Mutex::new(()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<dyn Schema> {
        &self.schema
    }

    pub fn schema_type(&self) -> i32 {
        self.schema_type
    }

    pub fn schema_blob(&self) -> &[u8] {
        &self.schema_blob
    }

    pub fn index_defs(&self) -> &[IndexDef] {
        &self.index_defs
    }

    pub fn len(&self) -> u64 {
        self.state.lock().unwrap().next_row_id
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one document and update every declared indexer under the
    /// collection's single write mutex (spec §4.G `insert`). The blob write
    /// and the row-id/indexer update happen inside the same critical
    /// section, so the two are never reordered relative to a concurrent
    /// insert on the same collection.
    pub fn insert(&self, raw: &[u8], compress: bool) -> Result<u64> {
        let doc = self.schema.decode(raw)?;
        let _guard = self.write_lock.lock().unwrap();
        let meta = self.blobs.put(raw, compress)?;
        let row_id = self.apply_indexers(meta, doc.as_ref())?;
        debug!("collection {}: inserted row {} ({} bytes)", self.name, row_id, raw.len());
        Ok(row_id)
    }

    /// Append a batch of documents under one lock, using the blob manager's
    /// batched `multi_put` for I/O efficiency (spec §4.G "Bulk insert").
    pub fn multi_insert(&self, raws: &[&[u8]], compress: bool) -> Result<Vec<u64>> {
        let docs = raws.iter().map(|raw| self.schema.decode(raw)).collect::<Result<Vec<_>>>()?;
        let _guard = self.write_lock.lock().unwrap();
        let metas = self.blobs.multi_put(raws, compress)?;
        let mut row_ids = Vec::with_capacity(metas.len());
        for (meta, doc) in metas.into_iter().zip(docs.iter()) {
            row_ids.push(self.apply_indexers(meta, doc.as_ref())?);
        }
        debug!("collection {}: bulk-inserted {} rows", self.name, row_ids.len());
        Ok(row_ids)
    }

    /// Assign the next row ID, feed `doc` through every indexer in
    /// declaration order, and record `meta` in the dense row map. Always
    /// called while the caller still holds `write_lock`, so the `row_id` it
    /// hands out lines up with the position `meta` occupies in the blob log.
    /// `state`'s own lock only exists so readers (`filter`/`try_get_*`) can
    /// take a shared snapshot without going through `write_lock`; a failure
    /// here leaves the blob durable but the row unindexed — recoverable only
    /// by a restart's replay (spec §4.G step 5, §7 propagation policy).
    fn apply_indexers(&self, meta: BlobMetadata, doc: &dyn Document) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let row_id = state.next_row_id;
        for indexer in state.indexers.iter_mut() {
            if let Err(err) = indexer.insert(row_id, doc) {
                warn!(
                    "collection {}: indexer insert failed at row {} ({}); index state is now inconsistent, restart required",
                    self.name, row_id, err
                );
                return err_at!(IndexerPoisoned, msg: "{}", err);
            }
        }
        state.row_metas.push(meta);
        state.next_row_id += 1;
        Ok(row_id)
    }

    /// Reconstruct in-memory index state by replaying every segment in
    /// `file_key` order through the same `apply_indexers` path used at
    /// original insert time (spec §4.G "startup/replay").
    pub fn replay(&self, metadata: &CollectionMetadata) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut n = 0u64;
        for segment in &metadata.segments {
            for (raw, meta) in self.blobs.iterate_segment(segment.file_key)? {
                let doc = self.schema.decode(&raw)?;
                self.apply_indexers(meta, doc.as_ref())?;
                n += 1;
            }
        }
        debug!("collection {}: replayed {} rows from {} segments", self.name, n, metadata.segments.len());
        Ok(())
    }

    pub fn blob_meta(&self, row_id: u64) -> Option<BlobMetadata> {
        self.state.lock().unwrap().row_metas.get(row_id as usize).copied()
    }

    pub fn get_blob(&self, row_id: u64) -> Result<Option<Vec<u8>>> {
        match self.blob_meta(row_id) {
            Some(meta) => Ok(Some(self.blobs.get(&meta)?)),
            None => Ok(None),
        }
    }

    fn indexer_for(&self, column_path: &str) -> Option<usize> {
        self.index_defs.iter().position(|def| def.column_path == column_path)
    }

    pub fn has_indexer(&self, column_path: &str) -> bool {
        self.indexer_for(column_path).is_some()
    }

    pub fn is_covering(&self, column_path: &str) -> bool {
        match self.indexer_for(column_path) {
            Some(i) => self.state.lock().unwrap().indexers[i].is_covering(),
            None => false,
        }
    }

    pub fn filter(&self, column_path: &str, c: &Constraint) -> Option<Result<crate::bitmap::Bitmap>> {
        let i = self.indexer_for(column_path)?;
        Some(self.state.lock().unwrap().indexers[i].filter(c))
    }

    pub fn filter_range(
        &self,
        column_path: &str,
        lo: &Constraint,
        hi: &Constraint,
    ) -> Option<Result<crate::bitmap::Bitmap>> {
        let i = self.indexer_for(column_path)?;
        Some(self.state.lock().unwrap().indexers[i].filter_range(lo, hi))
    }

    pub fn try_get_int(&self, column_path: &str, row_id: u64) -> Option<i64> {
        let i = self.indexer_for(column_path)?;
        self.state.lock().unwrap().indexers[i].try_get_int(row_id)
    }

    pub fn try_get_string(&self, column_path: &str, row_id: u64) -> Option<String> {
        let i = self.indexer_for(column_path)?;
        self.state.lock().unwrap().indexers[i].try_get_string(row_id)
    }

    pub fn unmap_lru(&self) {
        self.blobs.unmap_lru();
    }
}

#[cfg(test)]
#[path = "collection_test.rs"]
mod collection_test;
