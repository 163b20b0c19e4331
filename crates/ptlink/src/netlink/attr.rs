//! Netlink attribute (nlattr) encoding and decoding.
//!
//! Attributes are TLV records: a 4-byte header (`nla_len`, `nla_type`) in
//! host byte order, the value, then zero padding up to [`NLA_ALIGNTO`].
//!
//! ```text
//! ┌──────────┬──────────┬─────────────────────┬─────────┐
//! │ nla_len  │ nla_type │ value               │ padding │
//! │ u16      │ u16      │ nla_len - 4 bytes   │ 0..3    │
//! └──────────┴──────────┴─────────────────────┴─────────┘
//! ```
//!
//! Decoding never trusts a length field: every advance is checked against
//! the remaining buffer and a broken stream yields
//! [`Error::MalformedAttributes`].

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Largest value that fits behind a 16-bit attribute length.
pub const NLA_MAX_PAYLOAD: usize = u16::MAX as usize - NLA_HDRLEN;

/// Netlink attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    ///
    /// # Panics
    ///
    /// Panics if `data_len` exceeds [`NLA_MAX_PAYLOAD`].
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        assert!(
            data_len <= NLA_MAX_PAYLOAD,
            "attribute {} value of {} bytes exceeds {}",
            attr_type,
            data_len,
            NLA_MAX_PAYLOAD
        );
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Get the payload length (total length minus header).
    pub fn payload_len(&self) -> usize {
        (self.nla_len as usize).saturating_sub(NLA_HDRLEN)
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse from bytes. The input need not be aligned.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Iterator over netlink attributes in a buffer.
///
/// Yields `(type, payload)` pairs. The first structural error is yielded
/// once as `Err` and ends the iteration.
pub struct AttrIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Check if there are no more attributes.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn fail(&mut self, reason: String) -> Option<Result<(u16, &'a [u8])>> {
        self.offset = self.data.len();
        Some(Err(Error::MalformedAttributes(reason)))
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = Result<(u16, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.offset..).unwrap_or(&[]);
        if rest.is_empty() {
            return None;
        }

        if rest.len() < NLA_HDRLEN {
            // Trailing alignment slack is tolerated, anything else is junk.
            if rest.iter().all(|&b| b == 0) {
                self.offset = self.data.len();
                return None;
            }
            let reason = format!(
                "{} trailing bytes at offset {} are not an attribute header",
                rest.len(),
                self.offset
            );
            return self.fail(reason);
        }

        let attr = match NlAttr::from_bytes(rest) {
            Ok(a) => a,
            Err(e) => return self.fail(e.to_string()),
        };

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN {
            let reason = format!("attribute length {} below header size at offset {}", len, self.offset);
            return self.fail(reason);
        }
        if len > rest.len() {
            let reason = format!(
                "attribute type {} claims {} bytes at offset {}, only {} remain",
                attr.kind(),
                len,
                self.offset,
                rest.len()
            );
            return self.fail(reason);
        }

        let payload = &rest[NLA_HDRLEN..len];
        // The final attribute may omit its padding.
        self.offset += nla_align(len).min(rest.len());

        Some(Ok((attr.kind(), payload)))
    }
}

/// Decoded attribute set, indexed by type.
///
/// Slots `0..=max` hold the first occurrence of each type. Types above
/// `max` are kept in a residual bucket so attributes added by newer kernels
/// remain visible for diagnostics.
#[derive(Debug, Clone)]
pub struct AttrTable<'a> {
    slots: Vec<Option<&'a [u8]>>,
    residual: Vec<(u16, &'a [u8])>,
}

impl<'a> AttrTable<'a> {
    /// Decode an attribute stream.
    pub fn parse(data: &'a [u8], max: u16) -> Result<Self> {
        let mut table = Self {
            slots: vec![None; max as usize + 1],
            residual: Vec::new(),
        };

        for attr in AttrIter::new(data) {
            let (kind, payload) = attr?;
            match table.slots.get_mut(kind as usize) {
                Some(slot) if slot.is_none() => *slot = Some(payload),
                Some(_) => {
                    tracing::warn!(attr = kind, "duplicate attribute ignored");
                }
                None => table.residual.push((kind, payload)),
            }
        }

        Ok(table)
    }

    /// Highest type id with its own slot.
    pub fn max(&self) -> u16 {
        self.slots.len().saturating_sub(1) as u16
    }

    /// Get the payload for a type, if present.
    pub fn get(&self, kind: u16) -> Option<&'a [u8]> {
        self.slots.get(kind as usize).copied().flatten()
    }

    /// Check whether a type is present.
    pub fn contains(&self, kind: u16) -> bool {
        self.get(kind).is_some()
    }

    /// Attributes whose type exceeded the declared maximum.
    pub fn residual(&self) -> &[(u16, &'a [u8])] {
        &self.residual
    }

    /// Number of attributes decoded, residual included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count() + self.residual.len()
    }

    /// Check if no attributes were decoded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an optional native-endian u32.
    pub fn u32(&self, kind: u16) -> Result<Option<u32>> {
        self.get(kind).map(get::u32_ne).transpose()
    }

    /// Read an optional native-endian i32.
    pub fn i32(&self, kind: u16) -> Result<Option<i32>> {
        self.get(kind).map(get::i32_ne).transpose()
    }
}

/// Ordered, owned attribute set used to build requests.
///
/// Setting a type that is already present replaces its value, so a set
/// never carries duplicate type ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrSet {
    attrs: Vec<(u16, Vec<u8>)>,
}

impl AttrSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute to raw bytes.
    ///
    /// Values longer than [`NLA_MAX_PAYLOAD`] cannot be encoded and are
    /// rejected with [`Error::InvalidRequest`].
    pub fn set(&mut self, kind: u16, value: impl Into<Vec<u8>>) -> Result<&mut Self> {
        let value = value.into();
        if value.len() > NLA_MAX_PAYLOAD {
            return Err(Error::InvalidRequest(format!(
                "attribute {} value of {} bytes exceeds {}",
                kind,
                value.len(),
                NLA_MAX_PAYLOAD
            )));
        }
        Ok(self.insert(kind, value))
    }

    /// Set a u32 attribute (native endian).
    pub fn set_u32(&mut self, kind: u16, value: u32) -> &mut Self {
        self.insert(kind, value.to_ne_bytes().to_vec())
    }

    /// Set an i32 attribute (native endian).
    pub fn set_i32(&mut self, kind: u16, value: i32) -> &mut Self {
        self.insert(kind, value.to_ne_bytes().to_vec())
    }

    fn insert(&mut self, kind: u16, value: Vec<u8>) -> &mut Self {
        match self.attrs.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((kind, value)),
        }
        self
    }

    /// Get the value of an attribute.
    pub fn get(&self, kind: u16) -> Option<&[u8]> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.as_slice())
    }

    /// Check whether a type is present.
    pub fn contains(&self, kind: u16) -> bool {
        self.get(kind).is_some()
    }

    /// Type ids in insertion order.
    pub fn kinds(&self) -> impl Iterator<Item = u16> + '_ {
        self.attrs.iter().map(|(k, _)| *k)
    }

    /// Iterate `(type, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &[u8])> {
        self.attrs.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Encode into a TLV stream.
    pub fn encode(&self) -> Vec<u8> {
        encode(self.iter())
    }
}

/// Encode `(type, value)` pairs into a TLV attribute stream.
pub fn encode<'v>(attrs: impl IntoIterator<Item = (u16, &'v [u8])>) -> Vec<u8> {
    let mut buf = Vec::new();
    for (kind, value) in attrs {
        write_attr(&mut buf, kind, value);
    }
    buf
}

/// Append a single attribute, padded, to `buf`.
///
/// Panics if `value` is longer than [`NLA_MAX_PAYLOAD`].
pub(crate) fn write_attr(buf: &mut Vec<u8>, kind: u16, value: &[u8]) {
    let attr = NlAttr::new(kind, value.len());
    buf.extend_from_slice(attr.as_bytes());
    buf.extend_from_slice(value);
    let aligned = nla_align(buf.len());
    buf.resize(aligned, 0);
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    fn short(kind: &str, need: usize, got: usize) -> Error {
        Error::MalformedAttributes(format!(
            "truncated {} attribute: need {} bytes, got {}",
            kind, need, got
        ))
    }

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        data.first().copied().ok_or_else(|| short("u8", 1, 0))
    }

    /// Extract a u16 value (native endian).
    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        if data.len() < 2 {
            return Err(short("u16", 2, data.len()));
        }
        Ok(u16::from_ne_bytes([data[0], data[1]]))
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        if data.len() < 4 {
            return Err(short("u32", 4, data.len()));
        }
        Ok(u32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract an i32 value (native endian).
    pub fn i32_ne(data: &[u8]) -> Result<i32> {
        if data.len() < 4 {
            return Err(short("i32", 4, data.len()));
        }
        Ok(i32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract a u16 value (big endian / network order).
    pub fn u16_be(data: &[u8]) -> Result<u16> {
        if data.len() < 2 {
            return Err(short("u16", 2, data.len()));
        }
        Ok(u16::from_be_bytes([data[0], data[1]]))
    }

    /// Extract a u32 value (big endian / network order).
    pub fn u32_be(data: &[u8]) -> Result<u32> {
        if data.len() < 4 {
            return Err(short("u32", 4, data.len()));
        }
        Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::MalformedAttributes(format!("invalid UTF-8: {}", e)))
    }
}
