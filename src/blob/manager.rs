//! Blob manager (spec §4.D): owns the active writer segment, appends framed
//! blobs under a single write mutex, and serves reads through the LRU mmap
//! cache. Sealed segments are immutable and shared freely; the active
//! segment's mapping is refreshed after every durable write so `get()` on a
//! just-written blob always sees it, and kept non-evictable until rotation.

use std::{
    fs,
    io::{Seek, SeekFrom, Write},
    sync::Arc,
};

use memmap2::Mmap;

use crate::{
    blob::{
        files::{FileInfo, FileNameManager},
        frame::{self, BlobHeader, FRAME_VERSION},
        BlobMetadata,
    },
    err_at,
    mmap::Cache,
    util, Result,
};

struct WriteState {
    file: fs::File,
    info: FileInfo,
    write_offset: u64,
}

pub struct BlobManager {
    write: std::sync::Mutex<WriteState>,
    cache: Cache<Mmap>,
    filenames: FileNameManager,
    max_segment_bytes: u64,
    synchronous: bool,
}

impl BlobManager {
    pub fn open(
        filenames: FileNameManager,
        max_segment_bytes: u64,
        synchronous: bool,
        mmap_cache_capacity: usize,
    ) -> Result<BlobManager> {
        let info = filenames.get_current(true)?;
        let reuse = info.path.exists();
        let file = util::open_file_w(&info.path, reuse)?;
        let write_offset = info.data_length;
        let state = WriteState { file, info, write_offset };

        let manager = BlobManager {
            write: std::sync::Mutex::new(state),
            cache: Cache::new(mmap_cache_capacity),
            filenames,
            max_segment_bytes,
            synchronous,
        };
        {
            let state = manager.write.lock().unwrap();
            manager.refresh_active_mapping(&state)?;
        }
        Ok(manager)
    }

    fn fits(off: u64, blob_len: usize, compress: bool, max_segment_bytes: u64) -> bool {
        let blob_len = blob_len as u64;
        let comp_bound = frame::max_compressed_size(blob_len as usize) as u64;
        let header_size = BlobHeader::header_size(blob_len, if compress { Some(comp_bound) } else { None }) as u64;
        let need = header_size + if compress { comp_bound } else { blob_len };
        off + need <= max_segment_bytes
    }

    /// Encode and write one frame at `off` in the active segment. Mutates
    /// `state.write_offset`/`state.info.data_length` only once the write has
    /// fully succeeded, so a failed `seek`/`write_all` leaves `state`
    /// untouched — the rollback spec §4.D calls for falls out of that
    /// ordering rather than needing an explicit restore.
    fn write_frame(&self, state: &mut WriteState, off: u64, blob: &[u8], compress: bool) -> Result<BlobMetadata> {
        let mut out = Vec::new();
        if compress {
            let compressed = frame::compress(blob);
            let header = BlobHeader {
                version: FRAME_VERSION,
                compressed: true,
                blob_size: blob.len() as u64,
                comp_size: compressed.len() as u64,
            };
            header.encode(&mut out);
            out.extend_from_slice(&compressed);
        } else {
            let header =
                BlobHeader { version: FRAME_VERSION, compressed: false, blob_size: blob.len() as u64, comp_size: 0 };
            header.encode(&mut out);
            out.extend_from_slice(blob);
        }

        err_at!(IOError, state.file.seek(SeekFrom::Start(off)))?;
        err_at!(IOError, state.file.write_all(&out))?;

        state.write_offset = off + out.len() as u64;
        state.info.data_length = state.write_offset;
        Ok(BlobMetadata { file_key: state.info.file_key, offset: off })
    }

    fn rotate_locked(&self, state: &mut WriteState) -> Result<()> {
        self.cache.set_evictable(state.info.file_key, true);
        let next = self.filenames.get_next(&state.info)?;
        let file = util::open_file_w(&next.path, false)?;
        *state = WriteState { file, info: next, write_offset: 0 };
        self.refresh_active_mapping(state)?;
        Ok(())
    }

    /// Re-map the active segment so its cache entry reflects every byte
    /// written so far. Non-evictable: the writer's own mapping must never
    /// be dropped by `perform_eviction` before rotation (spec §4.B).
    fn refresh_active_mapping(&self, state: &WriteState) -> Result<()> {
        let file = util::open_file_r(&state.info.path)?;
        let mmap = err_at!(IOError, unsafe { Mmap::map(&file) })?;
        self.cache.add(state.info.file_key, Arc::new(mmap), false);
        Ok(())
    }

    fn mapping_for(&self, file_key: u32) -> Result<Arc<Mmap>> {
        if let Some(mmap) = self.cache.find(file_key) {
            return Ok(mmap);
        }
        let info = self.filenames.info_for(file_key)?;
        let file = util::open_file_r(&info.path)?;
        let mmap = err_at!(IOError, unsafe { Mmap::map(&file) })?;
        let mmap = Arc::new(mmap);
        self.cache.add(file_key, Arc::clone(&mmap), true);
        Ok(mmap)
    }

    /// Append `blob` to the active segment, rotating into a fresh segment
    /// first if it would not fit (spec §4.D `Put`). A blob whose framed size
    /// exceeds `max_segment_bytes` would never fit even alone in a freshly
    /// rotated segment, so rotating in a loop until it fits would never
    /// terminate; that case is rejected up front instead.
    pub fn put(&self, blob: &[u8], compress: bool) -> Result<BlobMetadata> {
        if !Self::fits(0, blob.len(), compress, self.max_segment_bytes) {
            return err_at!(
                InvalidArgument,
                msg: "blob of {} bytes cannot fit within max_segment_bytes {}",
                blob.len(), self.max_segment_bytes
            );
        }
        let mut state = self.write.lock().unwrap();
        loop {
            if Self::fits(state.write_offset, blob.len(), compress, self.max_segment_bytes) {
                break;
            }
            self.rotate_locked(&mut state)?;
        }
        let off = state.write_offset;
        let meta = self.write_frame(&mut state, off, blob, compress)?;

        self.filenames.update_length(state.info.file_key, state.write_offset)?;
        if self.synchronous {
            err_at!(IOError, state.file.sync_data())?;
        }
        self.refresh_active_mapping(&state)?;
        Ok(meta)
    }

    /// Append every blob in `blobs`, batching the durability commit (spec
    /// §4.D `MultiPut`). If rotation is needed mid-batch, everything written
    /// so far to the segment being rotated out of is committed first, then
    /// the new segment starts its own `base_off` at 0. A failure partway
    /// through a segment's portion of the batch rolls `write_offset` back to
    /// that segment's `base_off`, so either the whole of it is durable or
    /// none of it is. Each blob is checked against `max_segment_bytes` before
    /// its rotation loop starts, same as `put`, so one oversized blob in the
    /// batch cannot rotate forever.
    pub fn multi_put(&self, blobs: &[&[u8]], compress: bool) -> Result<Vec<BlobMetadata>> {
        let mut state = self.write.lock().unwrap();
        let mut metas = Vec::with_capacity(blobs.len());
        let mut base_off = state.write_offset;

        let outcome: Result<()> = (|| {
            for blob in blobs {
                if !Self::fits(0, blob.len(), compress, self.max_segment_bytes) {
                    return err_at!(
                        InvalidArgument,
                        msg: "blob of {} bytes cannot fit within max_segment_bytes {}",
                        blob.len(), self.max_segment_bytes
                    );
                }
                while !Self::fits(state.write_offset, blob.len(), compress, self.max_segment_bytes) {
                    self.filenames.update_length(state.info.file_key, state.write_offset)?;
                    if self.synchronous {
                        err_at!(IOError, state.file.sync_data())?;
                    }
                    self.rotate_locked(&mut state)?;
                    base_off = 0;
                }
                let off = state.write_offset;
                match self.write_frame(&mut state, off, blob, compress) {
                    Ok(meta) => metas.push(meta),
                    Err(err) => {
                        state.write_offset = base_off;
                        state.info.data_length = base_off;
                        return Err(err);
                    }
                }
            }
            Ok(())
        })();
        outcome?;

        self.filenames.update_length(state.info.file_key, state.write_offset)?;
        if self.synchronous {
            err_at!(IOError, state.file.sync_data())?;
        }
        self.refresh_active_mapping(&state)?;
        Ok(metas)
    }

    /// Read the blob identified by `meta` (spec §4.D `Get`).
    pub fn get(&self, meta: &BlobMetadata) -> Result<Vec<u8>> {
        let mmap = self.mapping_for(meta.file_key)?;
        decode_frame_at(&mmap, meta.offset as usize)
    }

    /// Walk every frame in `file_key` up to its recorded `data_length`,
    /// opening a private mapping rather than going through the LRU cache
    /// (spec §4.D `Iterate`). Used at startup to replay indexes.
    pub fn iterate_segment(&self, file_key: u32) -> Result<Vec<(Vec<u8>, BlobMetadata)>> {
        let info = self.filenames.info_for(file_key)?;
        let file = util::open_file_r(&info.path)?;
        let mmap = err_at!(IOError, unsafe { Mmap::map(&file) })?;

        let mut out = Vec::new();
        let mut offset: u64 = 0;
        while offset < info.data_length {
            let (header, consumed) = BlobHeader::decode(&mmap[offset as usize..])?;
            let frame_len = consumed as u64 + if header.compressed { header.comp_size } else { header.blob_size };
            let blob = decode_frame_at(&mmap, offset as usize)?;
            out.push((blob, BlobMetadata { file_key, offset }));
            offset += frame_len;
        }
        Ok(out)
    }

    /// Evict idle reader mappings (spec §4.D `Unmap LRU`, §5 memory pressure
    /// hook). Never touches the active writer's mapping.
    pub fn unmap_lru(&self) {
        self.cache.perform_eviction();
    }

    pub fn active_file_key(&self) -> u32 {
        self.write.lock().unwrap().info.file_key
    }
}

fn decode_frame_at(data: &[u8], offset: usize) -> Result<Vec<u8>> {
    if offset >= data.len() {
        return err_at!(CorruptedBlob, msg: "offset {} past end of segment (len {})", offset, data.len());
    }
    let (header, consumed) = BlobHeader::decode(&data[offset..])?;
    let payload_start = offset + consumed;
    if header.compressed {
        let payload_end = payload_start + header.comp_size as usize;
        if payload_end > data.len() {
            return err_at!(CorruptedBlob, msg: "compressed payload runs past end of segment");
        }
        frame::decompress(&data[payload_start..payload_end], header.blob_size)
    } else {
        let payload_end = payload_start + header.blob_size as usize;
        if payload_end > data.len() {
            return err_at!(CorruptedBlob, msg: "payload runs past end of segment");
        }
        Ok(data[payload_start..payload_end].to_vec())
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
