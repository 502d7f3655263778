//! Encoding and decoding of RFC 1035 DNS messages as carried over UDP.
//!
//! Every wire type implements [`Networkable`]. Decoding always happens through a
//! cursor spanning the whole message, so cursor positions are message offsets and
//! compression pointers can be followed from any section.

use std::io::Cursor;

use bytes::{Buf, Bytes};

mod error;
pub use error::{DnsError, Result};

mod header;
pub use header::{Flags, Header, HEADER_LEN};

mod name;
pub use name::{Name, DOMAIN_PATTERN, MAX_POINTER_JUMPS};

mod message;
pub use message::Message;

mod question;
pub use question::Question;

mod resource_record;
pub use resource_record::ResourceRecord;

mod record_type;
pub use record_type::{RecordClass, RecordType};

pub mod client;

pub trait Networkable: Sized {
    fn to_bytes(&self) -> Bytes;

    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self>;
}

/// Fails with [`DnsError::TruncatedMessage`] unless `needed` more bytes can be read.
pub(crate) fn ensure_remaining(bytes: &Cursor<&[u8]>, needed: usize) -> Result<()> {
    let remaining = bytes.remaining();
    if remaining < needed {
        return Err(DnsError::TruncatedMessage {
            offset: bytes.position() as usize,
            needed,
            remaining,
        });
    }

    Ok(())
}
