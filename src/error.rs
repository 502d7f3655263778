use thiserror::Error;

use crate::name::DOMAIN_PATTERN;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("invalid domain name {0:?}, it must match the expression {}", DOMAIN_PATTERN)]
    InvalidDomainName(String),

    #[error("invalid header length, header must be at least 12 bytes (got {0})")]
    InvalidHeaderLength(usize),

    #[error("invalid message length, message must be at least 12 bytes (got {0})")]
    InvalidMessageLength(usize),

    #[error("malformed name at offset {offset}: {reason}")]
    MalformedName { offset: usize, reason: &'static str },

    #[error("truncated message at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedMessage {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("record data is {0} bytes, at most 65535 fit in a resource record")]
    RecordDataTooLong(usize),

    #[error("unknown record type {0:?}")]
    UnknownRecordType(String),

    #[error("unknown record class {0:?}")]
    UnknownRecordClass(String),

    #[error("too many entries in the {section} section: {count}, at most 65535 fit in a header")]
    TooManyRecords { section: &'static str, count: usize },

    #[error("incomplete message sent: expected to send {expected} bytes but only sent {sent}")]
    IncompleteSend { expected: usize, sent: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DnsError>;
