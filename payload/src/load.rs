use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::chunk::{LEN_SIZE, read_chunk_within, read_i64};
use crate::error::{PayloadError, Result};
use crate::footer::{FOOTER_SIZE, Footer, MAGIC};
use crate::payload::{COUNT_SIZE, Payload};

const MAGIC_LEN: u64 = MAGIC.len() as u64;

/// Load the payload appended to the end of `reader`.
///
/// Whatever precedes the trailer is never read. Returns
/// [`PayloadError::MagicMismatch`] when the stream does not end in a trailer;
/// every declared length is checked against the stream before it is used.
pub fn load<R: Read + Seek>(mut reader: R) -> Result<Payload> {
    let stream_len = reader.seek(SeekFrom::End(0))?;
    let footer = read_footer(&mut reader, stream_len)?;

    let trailer_length = footer.trailer_length();
    let body_len = u64::try_from(trailer_length)
        .ok()
        .filter(|&len| len >= COUNT_SIZE)
        .ok_or_else(|| PayloadError::malformed(format!("invalid trailer length {trailer_length}")))?;
    let start = (stream_len - FOOTER_SIZE).checked_sub(body_len).ok_or_else(|| {
        PayloadError::malformed(format!(
            "trailer of {body_len} bytes does not fit in a {stream_len} byte stream"
        ))
    })?;
    reader.seek(SeekFrom::Start(start))?;

    let mut remaining = body_len - COUNT_SIZE;
    let count = read_i64(&mut reader, "key count")?;
    let count = u64::try_from(count)
        .ok()
        .filter(|&n| n <= remaining / (2 * LEN_SIZE))
        .ok_or_else(|| {
            PayloadError::malformed(format!(
                "key count {count} cannot fit in a {body_len} byte trailer"
            ))
        })?;

    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key = read_chunk_within(&mut reader, &mut remaining)?;
        let value = read_chunk_within(&mut reader, &mut remaining)?;
        trace!(key = %String::from_utf8_lossy(&key), len = value.len(), "read payload entry");

        match entries.entry(key) {
            Entry::Occupied(entry) => {
                return Err(PayloadError::malformed(format!(
                    "duplicate key {:?}",
                    String::from_utf8_lossy(entry.key())
                )));
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }

    if remaining != 0 {
        return Err(PayloadError::malformed(format!(
            "{remaining} unused bytes after the last entry"
        )));
    }

    debug!(entries = count, body_len, "loaded payload trailer");
    Ok(Payload::from(entries))
}

/// Treat a missing trailer as an empty payload. Every other error, including a
/// corrupt trailer, is passed through.
///
/// ```
/// use std::io::Cursor;
///
/// let loaded = payload::ignore_missing(payload::load(Cursor::new(b"no trailer here")));
/// assert!(loaded.unwrap().is_empty());
/// ```
pub fn ignore_missing(result: Result<Payload>) -> Result<Payload> {
    match result {
        Err(err) if err.is_missing_magic() => Ok(Payload::new()),
        other => other,
    }
}

fn read_footer<R: Read + Seek>(reader: &mut R, stream_len: u64) -> Result<Footer> {
    if stream_len < MAGIC_LEN {
        return Err(PayloadError::MagicMismatch);
    }

    if stream_len < FOOTER_SIZE {
        let mut magic = [0u8; MAGIC.len()];
        reader.seek(SeekFrom::Start(stream_len - MAGIC_LEN))?;
        reader.read_exact(&mut magic).map_err(magic_read_error)?;
        return Err(if &magic == MAGIC {
            PayloadError::Truncated {
                field: "trailer length",
            }
        } else {
            PayloadError::MagicMismatch
        });
    }

    let mut footer: Footer = bytemuck::Zeroable::zeroed();
    reader.seek(SeekFrom::Start(stream_len - FOOTER_SIZE))?;
    reader
        .read_exact(bytemuck::bytes_of_mut(&mut footer))
        .map_err(magic_read_error)?;

    if !footer.has_magic() {
        return Err(PayloadError::MagicMismatch);
    }
    Ok(footer)
}

// Failing to read the magic at all means there is no trailer to speak of.
fn magic_read_error(err: io::Error) -> PayloadError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        PayloadError::MagicMismatch
    } else {
        PayloadError::Io(err)
    }
}
