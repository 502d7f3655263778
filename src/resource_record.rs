use std::hash::{Hash, Hasher};
use std::io::Cursor;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::instrument;

use super::{Name, Networkable};
use crate::{ensure_remaining, DnsError, Result};

/// type, class, ttl and data length
const FIXED_LEN: usize = 2 + 2 + 4 + 2;

/// A resource record with its data kept as opaque bytes.
///
/// Decoded data is copied out of the message, so a record never borrows the
/// buffer it was read from. Equality and hashing ignore where the data was found.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub name: Name,
    pub type_: u16,
    pub class: u16,
    pub ttl: u32,
    data: Bytes,
    data_offset: Option<usize>,
}

impl ResourceRecord {
    pub fn new(
        name: Name,
        type_: impl Into<u16>,
        class: impl Into<u16>,
        ttl: u32,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        let data = data.into();
        if data.len() > u16::MAX as usize {
            return Err(DnsError::RecordDataTooLong(data.len()));
        }

        Ok(Self {
            name,
            type_: type_.into(),
            class: class.into(),
            ttl,
            data,
            data_offset: None,
        })
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn rd_length(&self) -> u16 {
        self.data.len() as u16
    }

    /// Offset of the data within the message this record was decoded from.
    ///
    /// Names inside record data (NS, CNAME, ...) may use compression pointers,
    /// so they have to be decoded against the whole message with [`Name::decode_at`].
    pub fn data_offset(&self) -> Option<usize> {
        self.data_offset
    }
}

impl PartialEq for ResourceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.type_ == other.type_
            && self.class == other.class
            && self.ttl == other.ttl
            && self.data == other.data
    }
}

impl Eq for ResourceRecord {}

impl Hash for ResourceRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.type_.hash(state);
        self.class.hash(state);
        self.ttl.hash(state);
        self.data.hash(state);
    }
}

impl Networkable for ResourceRecord {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Bytes {
        let name = self.name.to_bytes();
        let mut ret = BytesMut::with_capacity(name.len() + FIXED_LEN + self.data.len());

        ret.extend_from_slice(&name);
        ret.put_u16(self.type_);
        ret.put_u16(self.class);
        ret.put_u32(self.ttl);
        ret.put_u16(self.rd_length());
        ret.extend_from_slice(&self.data);

        ret.into()
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self> {
        let name = Name::from_bytes(bytes)?;

        ensure_remaining(bytes, FIXED_LEN)?;
        let type_ = bytes.get_u16();
        let class = bytes.get_u16();
        let ttl = bytes.get_u32();
        let rd_length = bytes.get_u16() as usize;

        ensure_remaining(bytes, rd_length)?;
        let data_offset = bytes.position() as usize;
        let data = bytes.copy_to_bytes(rd_length);

        Ok(Self {
            name,
            type_,
            class,
            ttl,
            data,
            data_offset: Some(data_offset),
        })
    }
}
