//! Small file-system helpers shared by the blob and catalog subsystems.

use std::{convert::TryInto, fs, path::Path};

use cbordata::{Cbor, FromCbor, IntoCbor};

use crate::{err_at, Error, Result};

/// Serialize `val` to its CBOR encoding (used for catalog BLOB payloads:
/// index definitions, schema fragments).
pub(crate) fn into_cbor_bytes<T>(val: T) -> Result<Vec<u8>>
where
    T: IntoCbor,
{
    let mut data: Vec<u8> = vec![];
    let n = err_at!(FailConvert, err_at!(FailConvert, val.into_cbor())?.encode(&mut data))?;
    if n != data.len() {
        err_at!(FailConvert, msg: "cbor encoding length mismatch {} {}", n, data.len())
    } else {
        Ok(data)
    }
}

/// Deserialize a value of type `T` from its CBOR encoding, returning the
/// value and the number of bytes consumed.
pub(crate) fn from_cbor_bytes<T>(mut data: &[u8]) -> Result<(T, usize)>
where
    T: FromCbor,
{
    let (val, n) = err_at!(FailConvert, Cbor::decode(&mut data))?;
    Ok((err_at!(FailConvert, T::from_cbor(val))?, n))
}

/// Open `path` for append-only writes, creating the parent directory and
/// the file itself if `reuse` is false (truncating any stale file).
pub(crate) fn open_file_w(path: &Path, reuse: bool) -> Result<fs::File> {
    let mut opts = fs::OpenOptions::new();
    Ok(match reuse {
        false => {
            if let Some(parent) = path.parent() {
                err_at!(IOError, fs::create_dir_all(parent))?;
            }
            err_at!(IOError, opts.read(true).write(true).create(true).open(path))?
        }
        true => err_at!(IOError, opts.read(true).write(true).open(path))?,
    })
}

/// Open `path` read-only.
pub(crate) fn open_file_r(path: &Path) -> Result<fs::File> {
    let mut opts = fs::OpenOptions::new();
    err_at!(IOError, opts.read(true).open(path))
}

pub(crate) fn try_convert<T, U>(from: T, msg: &str) -> Result<U>
where
    T: Copy + std::fmt::Display + TryInto<U>,
{
    match from.try_into() {
        Ok(to) => Ok(to),
        Err(_) => err_at!(FailConvert, msg: "{} for {}", msg, from),
    }
}
