use std::io::Cursor;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::instrument;

use super::{Name, Networkable};
use crate::{ensure_remaining, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub name: Name,
    pub type_: u16,
    pub class: u16,
}

impl Question {
    pub fn new(name: &str, type_: impl Into<u16>, class: impl Into<u16>) -> Result<Self> {
        Ok(Self {
            name: Name::new(name)?,
            type_: type_.into(),
            class: class.into(),
        })
    }
}

impl Networkable for Question {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Bytes {
        let mut ret = BytesMut::new();

        ret.extend_from_slice(&self.name.to_bytes());
        ret.put_u16(self.type_);
        ret.put_u16(self.class);

        ret.into()
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self> {
        let name = Name::from_bytes(bytes)?;

        ensure_remaining(bytes, 4)?;
        let type_ = bytes.get_u16();
        let class = bytes.get_u16();

        Ok(Self { name, type_, class })
    }
}
