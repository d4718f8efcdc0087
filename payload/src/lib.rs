//! Named byte blobs appended to the end of any file.
//!
//! A [`Payload`] is dumped as a trailer that can follow arbitrary host bytes,
//! typically an executable, and is found again by reading backwards from the
//! end of the file:
//!
//! ```text
//! [host bytes][key count][key, value chunks...][body length]["PAYLOADS"]
//! ```
//!
//! All integers are `i64` little-endian. A chunk is a length followed by that
//! many raw bytes. Keys are written in byte order, so equal payloads always
//! produce identical trailers.
//!
//! ```
//! use std::io::Cursor;
//! use payload::{Payload, load};
//!
//! let mut payload = Payload::new();
//! payload.insert("a.txt", vec![1u8, 2, 3]);
//!
//! let mut file = b"host executable bytes".to_vec();
//! payload.dump(&mut file)?;
//!
//! assert_eq!(load(Cursor::new(&file))?, payload);
//! # Ok::<(), payload::PayloadError>(())
//! ```

pub mod chunk;
pub mod error;
mod dump;
mod file;
mod footer;
mod load;
mod payload;

pub use dump::dump;
pub use error::{PayloadError, Result};
#[cfg(feature = "mmap")]
pub use file::load_mapped;
pub use file::{append_to_file, load_file, load_self};
pub use footer::MAGIC;
pub use load::{ignore_missing, load};
pub use payload::Payload;
