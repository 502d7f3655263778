use std::fmt::Display;
use std::str::FromStr;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::DnsError;

#[derive(FromPrimitive, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RecordType {
    A = 1,
    Ns = 2,
    Md = 3,
    Mf = 4,
    Cname = 5,
    Soa = 6,
    Mb = 7,
    Mg = 8,
    Mr = 9,
    Null = 10,
    Wks = 11,
    Ptr = 12,
    Hinfo = 13,
    Minfo = 14,
    Mx = 15,
    Txt = 16,
    Aaaa = 28,
    Opt = 41,
    Any = 255,
}

impl RecordType {
    /// None for types without a mnemonic here
    pub fn from_int(value: u16) -> Option<Self> {
        Self::from_u16(value)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Ns => "NS",
            Self::Md => "MD",
            Self::Mf => "MF",
            Self::Cname => "CNAME",
            Self::Soa => "SOA",
            Self::Mb => "MB",
            Self::Mg => "MG",
            Self::Mr => "MR",
            Self::Null => "NULL",
            Self::Wks => "WKS",
            Self::Ptr => "PTR",
            Self::Hinfo => "HINFO",
            Self::Minfo => "MINFO",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Aaaa => "AAAA",
            Self::Opt => "OPT",
            Self::Any => "ANY",
        }
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        value as u16
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for RecordType {
    type Err = DnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        (1..=255)
            .filter_map(Self::from_u16)
            .find(|t| t.mnemonic() == upper)
            .ok_or_else(|| DnsError::UnknownRecordType(s.to_owned()))
    }
}

#[derive(FromPrimitive, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RecordClass {
    In = 1,
    Cs = 2,
    Ch = 3,
    Hs = 4,
    Any = 255,
}

impl RecordClass {
    pub fn from_int(value: u16) -> Option<Self> {
        Self::from_u16(value)
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        value as u16
    }
}

impl FromStr for RecordClass {
    type Err = DnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "CS" => Ok(Self::Cs),
            "CH" => Ok(Self::Ch),
            "HS" => Ok(Self::Hs),
            "ANY" | "*" => Ok(Self::Any),
            _ => Err(DnsError::UnknownRecordClass(s.to_owned())),
        }
    }
}
