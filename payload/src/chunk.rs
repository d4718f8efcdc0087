//! Length-prefixed chunk framing.
//!
//! A chunk is an `i64` little-endian byte count followed by exactly that many
//! raw bytes. Keys and values in a trailer are both stored as chunks.

use std::io::{Read, Write};

use crate::error::{PayloadError, Result};

/// Size of the length prefix in front of every chunk.
pub const LEN_SIZE: u64 = 8;

// Largest buffer reserved before any chunk bytes have actually arrived.
const PREALLOC_LIMIT: u64 = 64 * 1024;

/// Write `data` as a single chunk.
pub fn write_chunk<W: Write>(writer: &mut W, data: &[u8]) -> Result<()> {
    let len = data.len() as i64;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(data)?;
    Ok(())
}

/// Read one chunk from a reader with no known bound.
///
/// A negative length is [`PayloadError::Malformed`]. Without a bound there is
/// no way to call a non-negative length implausible up front, so an oversized
/// one is read incrementally and reported as [`PayloadError::Truncated`] once
/// the reader runs dry, never as a large allocation. Use
/// [`read_chunk_within`] when the size of the enclosing region is known; it
/// rejects oversized lengths as malformed before reading any data.
pub fn read_chunk<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_len(reader)?;
    read_body(reader, len)
}

/// Read one chunk that must fit inside the `remaining` bytes of its enclosing
/// region, charging the consumed bytes against it.
///
/// A length larger than what is left of the region is
/// [`PayloadError::Malformed`]; fewer than 8 bytes left for the length itself
/// is [`PayloadError::Truncated`].
pub fn read_chunk_within<R: Read>(reader: &mut R, remaining: &mut u64) -> Result<Vec<u8>> {
    if *remaining < LEN_SIZE {
        return Err(PayloadError::Truncated {
            field: "chunk length",
        });
    }
    let len = read_len(reader)?;
    *remaining -= LEN_SIZE;

    if len > *remaining {
        return Err(PayloadError::malformed(format!(
            "chunk of {len} bytes exceeds the {} bytes left in the trailer",
            *remaining
        )));
    }
    let data = read_body(reader, len)?;
    *remaining -= len;
    Ok(data)
}

pub(crate) fn read_i64<R: Read>(reader: &mut R, field: &'static str) -> Result<i64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|e| PayloadError::from_read(e, field))?;
    Ok(i64::from_le_bytes(buf))
}

fn read_len<R: Read>(reader: &mut R) -> Result<u64> {
    let len = read_i64(reader, "chunk length")?;
    u64::try_from(len)
        .map_err(|_| PayloadError::malformed(format!("negative chunk length {len}")))
}

fn read_body<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(len.min(PREALLOC_LIMIT) as usize);
    reader.by_ref().take(len).read_to_end(&mut data)?;
    if (data.len() as u64) < len {
        return Err(PayloadError::Truncated {
            field: "chunk data",
        });
    }
    Ok(data)
}
