use std::collections::BTreeMap;
use std::collections::btree_map;
use std::io::Write;

use crate::chunk::LEN_SIZE;
use crate::dump::dump;
use crate::error::Result;
use crate::footer::FOOTER_SIZE;

/// Size of the key count field at the start of a trailer body.
pub(crate) const COUNT_SIZE: u64 = 8;

/// A set of named byte blobs that can be appended to a file.
///
/// Keys are raw bytes, conventionally a relative path, and need not be UTF-8.
/// Keys are unique; inserting an existing key replaces its value. Entries are
/// kept ordered by key bytes, which is also the order they are serialized in,
/// so equal payloads always produce identical trailers.
///
/// ```
/// use payload::Payload;
///
/// let mut payload = Payload::new();
/// payload.insert("b/c.bin", Vec::<u8>::new());
/// payload.insert("a.txt", vec![1u8, 2, 3]);
///
/// let keys: Vec<&[u8]> = payload.keys().collect();
/// assert_eq!(keys, [&b"a.txt"[..], &b"b/c.bin"[..]]);
/// assert_eq!(payload.get("a.txt"), Some(&[1, 2, 3][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Payload {
            entries: BTreeMap::new(),
        }
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Vec<u8>>
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<&[u8]> {
        self.entries.get(key.as_ref()).map(Vec::as_slice)
    }

    pub fn remove<K: AsRef<[u8]>>(&mut self, key: K) -> Option<Vec<u8>> {
        self.entries.remove(key.as_ref())
    }

    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.entries.contains_key(key.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_slice(), value.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.entries.keys().map(Vec::as_slice)
    }

    pub fn into_inner(self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.entries
    }

    /// Length of the trailer body: the key count plus every key and value chunk.
    /// This is the value stored in the trailer's length field.
    pub fn body_len(&self) -> u64 {
        self.entries.iter().fold(COUNT_SIZE, |total, (key, value)| {
            total + LEN_SIZE + key.len() as u64 + LEN_SIZE + value.len() as u64
        })
    }

    /// Total number of bytes [`Payload::dump`] writes.
    pub fn encoded_len(&self) -> u64 {
        self.body_len() + FOOTER_SIZE
    }

    /// Writes this payload as a trailer. See [`dump`](crate::dump).
    pub fn dump<W: Write>(&self, writer: W) -> Result<u64> {
        dump(self, writer)
    }

    /// Serializes this payload into a freshly allocated trailer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len() as usize);
        dump(self, &mut out)?;
        Ok(out)
    }
}

impl From<BTreeMap<Vec<u8>, Vec<u8>>> for Payload {
    fn from(entries: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Payload { entries }
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<Vec<u8>>,
    V: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Payload::new();
        payload.extend(iter);
        payload
    }
}

impl<K, V> Extend<(K, V)> for Payload
where
    K: Into<Vec<u8>>,
    V: Into<Vec<u8>>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for Payload {
    type Item = (Vec<u8>, Vec<u8>);
    type IntoIter = btree_map::IntoIter<Vec<u8>, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = (&'a Vec<u8>, &'a Vec<u8>);
    type IntoIter = btree_map::Iter<'a, Vec<u8>, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
