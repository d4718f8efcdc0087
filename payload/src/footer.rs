use bytemuck_derive::{Pod, Zeroable};

/// The magic string that ends every trailer.
pub const MAGIC: &[u8; 8] = b"PAYLOADS";

/// The fixed 16 bytes at the very end of a trailer: the body length followed
/// by the magic.
///
/// Fields are byte arrays so the struct has no padding or alignment and reads
/// identically on every host.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct Footer {
    trailer_length: [u8; 8],
    magic: [u8; 8],
}

pub(crate) const FOOTER_SIZE: u64 = std::mem::size_of::<Footer>() as u64;

impl Footer {
    pub(crate) fn new(trailer_length: i64) -> Self {
        Footer {
            trailer_length: trailer_length.to_le_bytes(),
            magic: *MAGIC,
        }
    }

    pub(crate) fn trailer_length(&self) -> i64 {
        i64::from_le_bytes(self.trailer_length)
    }

    pub(crate) fn has_magic(&self) -> bool {
        &self.magic == MAGIC
    }
}
