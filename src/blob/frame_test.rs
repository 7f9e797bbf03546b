use super::*;

#[test]
fn test_uncompressed_header_roundtrip() {
    let header = BlobHeader { version: FRAME_VERSION, compressed: false, blob_size: 42, comp_size: 0 };
    let mut buf = Vec::new();
    let n = header.encode(&mut buf);
    assert_eq!(n, BlobHeader::header_size(42, None));
    let (decoded, consumed) = BlobHeader::decode(&buf).unwrap();
    assert_eq!(consumed, n);
    assert_eq!(decoded.blob_size, 42);
    assert!(!decoded.compressed);
}

#[test]
fn test_compressed_header_roundtrip() {
    let header = BlobHeader { version: FRAME_VERSION, compressed: true, blob_size: 1000, comp_size: 17 };
    let mut buf = Vec::new();
    let n = header.encode(&mut buf);
    assert_eq!(n, BlobHeader::header_size(1000, Some(17)));
    let (decoded, consumed) = BlobHeader::decode(&buf).unwrap();
    assert_eq!(consumed, n);
    assert_eq!(decoded.blob_size, 1000);
    assert_eq!(decoded.comp_size, 17);
    assert!(decoded.compressed);
}

#[test]
fn test_version_mismatch_is_corrupted() {
    let buf = [0x20_u8, 0x01]; // version 2, uncompressed
    assert!(BlobHeader::decode(&buf).is_err());
}

#[test]
fn test_compress_decompress_roundtrip() {
    let data = vec![0x41_u8; 1000];
    let compressed = compress(&data);
    assert!(compressed.len() < data.len());
    let decompressed = decompress(&compressed, data.len() as u64).unwrap();
    assert_eq!(decompressed, data);
}
