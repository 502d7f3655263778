use std::fmt::Display;
use std::io::Cursor;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{instrument, warn};

use super::Networkable;
use crate::{ensure_remaining, DnsError, Result};

pub const DOMAIN_PATTERN: &str = r"^([a-zA-Z0-9-]+\.)*[a-zA-Z0-9-]+$";

/// Compression pointers followed while decoding a single name.
pub const MAX_POINTER_JUMPS: usize = 64;

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 253;
const MAX_WIRE_LEN: usize = 255;

const POINTER: u8 = 0b1100_0000;

static DOMAIN: Lazy<Regex> = Lazy::new(|| Regex::new(DOMAIN_PATTERN).unwrap());

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Name {
    /// This is the domain name
    /// E.g. www.google.com
    name: String,
}

impl Name {
    pub fn new(name: &str) -> Result<Self> {
        if name.len() > MAX_NAME_LEN
            || !DOMAIN.is_match(name)
            || name.split('.').any(|label| label.len() > MAX_LABEL_LEN)
        {
            return Err(DnsError::InvalidDomainName(name.to_owned()));
        }

        Ok(Self {
            name: name.to_owned(),
        })
    }

    /// The root name, as found in OPT records and root zone queries
    pub fn root() -> Self {
        Self {
            name: String::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Decodes the name starting at `offset` of a complete message.
    /// Returns the name along with the number of bytes it occupies at `offset`;
    /// a compression pointer counts as 2 bytes no matter where it leads.
    pub fn decode_at(message: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut cursor = Cursor::new(message);
        cursor.set_position(offset as u64);

        let name = Self::from_bytes(&mut cursor)?;
        let consumed = cursor.position() as usize - offset;

        Ok((name, consumed))
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl Networkable for Name {
    /// Always uncompressed
    fn to_bytes(&self) -> Bytes {
        let mut ret = BytesMut::with_capacity(self.name.len() + 2);

        if !self.is_root() {
            for section in self.name.split('.') {
                ret.put_u8(section.len() as u8);
                ret.extend_from_slice(section.as_bytes());
            }
        }

        ret.put_u8(0);

        ret.into()
    }

    #[instrument(level = "trace", skip_all, fields(offset = bytes.position()))]
    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut parts: Vec<String> = Vec::new();
        let mut wire_len = 1;
        let mut jumps = 0;
        // Where the cursor is left once the name is done, set by the first pointer
        let mut resume_at = None;

        loop {
            let start = bytes.position() as usize;
            ensure_remaining(bytes, 1)?;
            let len = bytes.get_u8();

            match len & POINTER {
                0 if len == 0 => break,
                0 => {
                    // Uncompressed
                    let len = len as usize;
                    ensure_remaining(bytes, len)?;

                    wire_len += len + 1;
                    if wire_len > MAX_WIRE_LEN {
                        return Err(malformed(start, "name exceeds 255 bytes"));
                    }

                    let chars = bytes.copy_to_bytes(len);
                    let s = std::str::from_utf8(&chars)
                        .map_err(|_| malformed(start, "label is not valid utf-8"))?;
                    if s.contains('.') {
                        return Err(malformed(start, "label contains a dot"));
                    }

                    parts.push(s.to_owned());
                }
                POINTER => {
                    // Compressed
                    ensure_remaining(bytes, 1)?;
                    let pointer =
                        (usize::from(len & !POINTER) << 8) | usize::from(bytes.get_u8());

                    if pointer >= start {
                        return Err(malformed(start, "pointer does not point backwards"));
                    }

                    jumps += 1;
                    if jumps > MAX_POINTER_JUMPS {
                        return Err(malformed(start, "too many compression pointers"));
                    }

                    resume_at.get_or_insert(bytes.position());
                    bytes.set_position(pointer as u64);
                }
                _ => return Err(malformed(start, "reserved label type")),
            }
        }

        if let Some(position) = resume_at {
            bytes.set_position(position);
        }

        Ok(Self {
            name: parts.iter().join("."),
        })
    }
}

fn malformed(offset: usize, reason: &'static str) -> DnsError {
    warn!(offset, reason, "rejecting name");
    DnsError::MalformedName { offset, reason }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::{DnsError, Name, Networkable};

    fn decode_at(message: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
        Name::decode_at(message, offset).map(|(name, consumed)| (name.to_string(), consumed))
    }

    #[test]
    fn validates_grammar() {
        assert!(Name::new("dns.google.com").is_ok());
        assert!(Name::new("localhost").is_ok());
        assert!(Name::new("-leading").is_ok());
        assert!(Name::new("xn--bcher-kva.example").is_ok());

        for bad in [
            "bad..name",
            ".leading",
            "trailing.",
            "",
            "under_score.com",
            "spa ce.com",
        ] {
            assert!(
                matches!(Name::new(bad), Err(DnsError::InvalidDomainName(ref n)) if n == bad),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn validates_lengths() {
        let label = "a".repeat(63);
        assert!(Name::new(&label).is_ok());
        assert!(Name::new(&format!("{label}a")).is_err());

        let long = [label.as_str(); 4].join(".");
        assert_eq!(long.len(), 255);
        assert!(Name::new(&long).is_err());
        assert!(Name::new(&long[2..]).is_ok());
    }

    #[test]
    fn encodes_labels() {
        let name = Name::new("dns.google.com").unwrap();
        assert_eq!(&name.to_bytes()[..], b"\x03dns\x06google\x03com\x00");
        assert_eq!(&Name::root().to_bytes()[..], b"\x00");
    }

    #[test]
    fn round_trips_uncompressed() {
        for name in ["dns.google.com", "a", "a-b.c-d.e-f.g"] {
            let bytes = Name::new(name).unwrap().to_bytes();
            assert_eq!(decode_at(&bytes, 0).unwrap(), (name.to_owned(), bytes.len()));
        }
    }

    #[test]
    fn decodes_root() {
        let (name, consumed) = Name::decode_at(&[0], 0).unwrap();
        assert!(name.is_root());
        assert_eq!(consumed, 1);
    }

    #[test]
    fn follows_pointer() {
        // google.com at 0, then a bare pointer to it at 12
        let mut message = b"\x06google\x03com\x00".to_vec();
        message.extend_from_slice(&[0xc0, 0x00]);

        let target = decode_at(&message, 0).unwrap();
        let pointer = decode_at(&message, 12).unwrap();

        assert_eq!(target, ("google.com".to_owned(), 12));
        assert_eq!(pointer, ("google.com".to_owned(), 2));
    }

    #[test]
    fn joins_labels_with_pointer_tail() {
        let mut message = b"\x06google\x03com\x00".to_vec();
        message.extend_from_slice(b"\x03dns\xc0\x00");
        message.extend_from_slice(b"\x03www\xc0\x0c");

        assert_eq!(decode_at(&message, 12).unwrap(), ("dns.google.com".to_owned(), 6));
        assert_eq!(decode_at(&message, 18).unwrap(), ("www.dns.google.com".to_owned(), 6));
    }

    #[test]
    fn leaves_cursor_after_first_pointer() {
        let mut message = b"\x03com\x00".to_vec();
        message.extend_from_slice(b"\x06google\xc0\x00");
        message.extend_from_slice(b"\xc0\x05\xff");

        let mut cursor = Cursor::new(&message[..]);
        cursor.set_position(14);
        let name = Name::from_bytes(&mut cursor).unwrap();

        assert_eq!(name.as_str(), "google.com");
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn rejects_self_pointer() {
        let message = [0xc0, 0x00];
        assert!(matches!(
            decode_at(&message, 0),
            Err(DnsError::MalformedName { offset: 0, .. })
        ));
    }

    #[test]
    fn rejects_forward_pointer() {
        let message = [0xc0, 0x04, 0x00, 0x00, 0x01, b'a', 0x00];
        assert!(matches!(
            decode_at(&message, 0),
            Err(DnsError::MalformedName { .. })
        ));
    }

    #[test]
    fn rejects_pointer_loop() {
        // A one byte label at 0 followed by a pointer back to 0
        let message = [0x01, b'a', 0xc0, 0x00];
        assert!(matches!(
            decode_at(&message, 0),
            Err(DnsError::MalformedName { .. })
        ));
    }

    #[test]
    fn rejects_reserved_label_types() {
        assert!(matches!(
            decode_at(&[0x40, 0x00], 0),
            Err(DnsError::MalformedName { .. })
        ));
        assert!(matches!(
            decode_at(&[0x80, 0x00], 0),
            Err(DnsError::MalformedName { .. })
        ));
    }

    #[test]
    fn rejects_dotted_label() {
        assert!(matches!(
            decode_at(b"\x03a.b\x00", 0),
            Err(DnsError::MalformedName { .. })
        ));
    }

    fn label(byte: u8) -> Vec<u8> {
        let mut label = vec![63];
        label.extend_from_slice(&[byte; 63]);
        label
    }

    #[test]
    fn rejects_overlong_name() {
        let mut message: Vec<u8> = (b'a'..=b'e').flat_map(label).collect();
        message.push(0);
        assert_eq!(message.len(), 5 * 64 + 1);

        assert!(matches!(
            decode_at(&message, 0),
            Err(DnsError::MalformedName { offset: 192, reason: "name exceeds 255 bytes" })
        ));
    }

    #[test]
    fn rejects_name_overlong_after_pointer() {
        // a.b at 0 is 129 bytes on the wire, fine on its own
        let mut message = [label(b'a'), label(b'b')].concat();
        message.push(0);
        assert_eq!(decode_at(&message, 0).unwrap().1, 129);

        // c.d then a pointer back to a.b: 257 bytes once the pointer is followed
        message.extend_from_slice(&[label(b'c'), label(b'd')].concat());
        message.extend_from_slice(&[0xc0, 0x00]);

        assert!(matches!(
            decode_at(&message, 129),
            Err(DnsError::MalformedName { offset: 64, reason: "name exceeds 255 bytes" })
        ));
    }

    #[test]
    fn accepts_name_of_255_bytes() {
        // Three full labels plus one of 61 bytes
        let mut message: Vec<u8> = (b'a'..=b'c').flat_map(label).collect();
        message.push(61);
        message.extend_from_slice(&[b'd'; 61]);
        message.push(0);
        assert_eq!(message.len(), 255);

        let (name, consumed) = decode_at(&message, 0).unwrap();
        assert_eq!(consumed, 255);
        assert_eq!(name.len(), 253);
    }

    #[test]
    fn reports_truncation() {
        assert!(matches!(
            decode_at(b"\x03dn", 0),
            Err(DnsError::TruncatedMessage { offset: 1, needed: 3, remaining: 2 })
        ));
        assert!(matches!(
            decode_at(b"\x03dns", 0),
            Err(DnsError::TruncatedMessage { offset: 4, .. })
        ));
        assert!(matches!(
            decode_at(&[0xc0], 0),
            Err(DnsError::TruncatedMessage { .. })
        ));
    }
}
