//! The on-disk blob frame (spec §3, bit-exact layout in spec §6):
//!
//! ```text
//! byte 0        : verAndFlags  (bits 7..4 = version, bit 0 = compressed)
//! bytes 1..     : varint blobSize                (uncompressed length)
//! [if compressed] varint compSize                (stored length)
//! payload       : compSize bytes (compressed) OR blobSize bytes (raw)
//! ```

use crate::{
    blob::varint::{decode_varint, encode_varint, varint_size},
    err_at, Error, Result,
};

pub const FRAME_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy)]
pub struct BlobHeader {
    pub version: u8,
    pub compressed: bool,
    pub blob_size: u64,
    pub comp_size: u64,
}

impl BlobHeader {
    /// Number of header bytes that would be written for a blob of
    /// `blob_size`, optionally compressed down to `comp_size`.
    pub fn header_size(blob_size: u64, comp_size: Option<u64>) -> usize {
        1 + varint_size(blob_size) + comp_size.map(varint_size).unwrap_or(0)
    }

    /// Serialize the header (verAndFlags + varint(s)) into `out`.
    pub fn encode(&self, out: &mut Vec<u8>) -> usize {
        let ver_and_flags = (self.version << 4) | (self.compressed as u8);
        out.push(ver_and_flags);
        let mut n = 1;
        n += encode_varint(self.blob_size, out);
        if self.compressed {
            n += encode_varint(self.comp_size, out);
        }
        n
    }

    /// Parse a header from the start of `buf`, returning `(header,
    /// bytes_consumed)`.
    pub fn decode(buf: &[u8]) -> Result<(BlobHeader, usize)> {
        if buf.is_empty() {
            return err_at!(CorruptedBlob, msg: "empty frame, missing verAndFlags byte");
        }
        let ver_and_flags = buf[0];
        let version = ver_and_flags >> 4;
        let compressed = (ver_and_flags & 1) == 1;
        if version != FRAME_VERSION {
            return err_at!(CorruptedBlob, msg: "unsupported blob frame version {}", version);
        }

        let mut pos = 1;
        let (blob_size, n) = decode_varint(&buf[pos..])?;
        pos += n;

        let comp_size = if compressed {
            let (comp_size, n) = decode_varint(&buf[pos..])?;
            pos += n;
            comp_size
        } else {
            0
        };

        Ok((
            BlobHeader { version, compressed, blob_size, comp_size },
            pos,
        ))
    }
}

/// LZ4 block-format compression, per spec §6. Returns `None` when
/// compression is not requested; on request, returns the compressed bytes
/// (the frame stores the actual `comp_size`, never the worst-case bound).
pub fn compress(data: &[u8]) -> Vec<u8> {
    lz4_flex::block::compress(data)
}

pub fn max_compressed_size(len: usize) -> usize {
    lz4_flex::block::get_maximum_output_size(len)
}

pub fn decompress(data: &[u8], uncompressed_size: u64) -> Result<Vec<u8>> {
    let size: usize = crate::util::try_convert(uncompressed_size, "blob_size")?;
    err_at!(CorruptedBlob, lz4_flex::block::decompress(data, size))
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;
