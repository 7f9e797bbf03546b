//! Filename manager (spec §4.C): the per-collection sequence of segment
//! files, backed by the `CollectionDataFile` catalog table.

use std::{path::PathBuf, sync::Arc};

use crate::{catalog::Catalog, err_at, Result};

/// One segment: an append-only blob file. `data_length` is the number of
/// live bytes written so far, kept in sync with the catalog after every
/// durable write.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub file_key: u32,
    pub name: String,
    pub path: PathBuf,
    pub data_length: u64,
}

fn segment_name(db_name: &str, collection: &str, file_key: u32) -> String {
    format!("{}_{}.{}", db_name, collection, file_key)
}

pub struct FileNameManager {
    dir: PathBuf,
    db_name: String,
    collection: String,
    catalog: Arc<Catalog>,
}

impl FileNameManager {
    pub fn new(dir: PathBuf, db_name: String, collection: String, catalog: Arc<Catalog>) -> FileNameManager {
        FileNameManager { dir, db_name, collection, catalog }
    }

    fn to_file_info(&self, segment: &crate::catalog::SegmentInfo) -> FileInfo {
        FileInfo {
            file_key: segment.file_key,
            name: segment.file_name.clone(),
            path: self.dir.join(&segment.file_name),
            data_length: segment.data_length,
        }
    }

    /// Return the highest-`file_key` segment, creating the very first one
    /// (`file_key = 0`) when `create_if_missing` and none exists yet. Fails
    /// with `MissingDatabaseFile` when none exists and `create_if_missing`
    /// is false (spec §4.C).
    pub fn get_current(&self, create_if_missing: bool) -> Result<FileInfo> {
        let segments = self.catalog.list_segments(&self.collection)?;
        match segments.last() {
            Some(segment) => Ok(self.to_file_info(segment)),
            None if create_if_missing => {
                let name = segment_name(&self.db_name, &self.collection, 0);
                self.catalog.add_segment(&self.collection, 0, &name, 0)?;
                Ok(FileInfo { file_key: 0, name: name.clone(), path: self.dir.join(&name), data_length: 0 })
            }
            None => err_at!(MissingDatabaseFile, msg: "no segment for collection {}", self.collection),
        }
    }

    /// Allocate the next segment after `current`, recording it in the
    /// catalog (spec §4.C `get_next`).
    pub fn get_next(&self, current: &FileInfo) -> Result<FileInfo> {
        let file_key = current.file_key + 1;
        let name = segment_name(&self.db_name, &self.collection, file_key);
        self.catalog.add_segment(&self.collection, file_key, &name, 0)?;
        Ok(FileInfo { file_key, name: name.clone(), path: self.dir.join(&name), data_length: 0 })
    }

    /// Persist `data_length` for `file_key` after a successful durable write
    /// (spec §4.C `update_length`).
    pub fn update_length(&self, file_key: u32, new_length: u64) -> Result<()> {
        self.catalog.update_segment_length(&self.collection, file_key, new_length)
    }

    /// Resolve a sealed segment's on-disk path and recorded length by
    /// `file_key`, for the blob manager's reader/iterate paths.
    pub fn info_for(&self, file_key: u32) -> Result<FileInfo> {
        let segments = self.catalog.list_segments(&self.collection)?;
        match segments.iter().find(|s| s.file_key == file_key) {
            Some(segment) => Ok(self.to_file_info(segment)),
            None => err_at!(CorruptedBlob, msg: "no segment with file_key {} for collection {}", file_key, self.collection),
        }
    }
}

#[cfg(test)]
#[path = "files_test.rs"]
mod files_test;
