use std::io::Write;

use tracing::debug;

use crate::chunk::write_chunk;
use crate::error::{PayloadError, Result};
use crate::footer::{FOOTER_SIZE, Footer};
use crate::payload::Payload;

/// Write `payload` as a trailer: key count, each key/value chunk pair in key
/// order, the body length and finally the magic.
///
/// Returns the number of bytes written. A failed write aborts immediately and
/// may leave a partial trailer behind in `writer`.
pub fn dump<W: Write>(payload: &Payload, mut writer: W) -> Result<u64> {
    let body_len = payload.body_len();
    let trailer_length = i64::try_from(body_len)
        .map_err(|_| PayloadError::malformed(format!("trailer of {body_len} bytes is too large")))?;
    let count = payload.len() as i64;

    writer.write_all(&count.to_le_bytes())?;
    for (key, value) in payload.iter() {
        write_chunk(&mut writer, key)?;
        write_chunk(&mut writer, value)?;
    }
    writer.write_all(bytemuck::bytes_of(&Footer::new(trailer_length)))?;
    writer.flush()?;

    debug!(entries = count, body_len, "wrote payload trailer");
    Ok(body_len + FOOTER_SIZE)
}
