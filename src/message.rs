use std::io::Cursor;

use bytes::{Buf, Bytes, BytesMut};
use rand::Rng;
use tracing::{debug, instrument, trace, warn};

use super::{Flags, Header, Networkable, Question, ResourceRecord, HEADER_LEN};
use crate::{DnsError, Result};

/// A complete message.
///
/// Unlike the section types this is not [`Networkable`]: encoding fails when a
/// section holds more entries than its 16-bit header count can describe.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    /// A single question query with a random id
    pub fn query(
        name: &str,
        type_: impl Into<u16>,
        class: impl Into<u16>,
        recursion_desired: bool,
    ) -> Result<Self> {
        Self::query_with_rng(name, type_, class, recursion_desired, &mut rand::thread_rng())
    }

    pub fn query_with_rng<R: Rng>(
        name: &str,
        type_: impl Into<u16>,
        class: impl Into<u16>,
        recursion_desired: bool,
        rng: &mut R,
    ) -> Result<Self> {
        let question = Question::new(name, type_, class)?;

        let header = Header::new(rng.gen(), Flags::query(recursion_desired));
        let mut query = Message::new(header);
        query.add_question(question)?;

        Ok(query)
    }

    pub fn add_question(&mut self, question: Question) -> Result<()> {
        self.header.num_questions = count("question", self.questions.len() + 1)?;
        self.questions.push(question);
        Ok(())
    }

    pub fn add_answer(&mut self, answer: ResourceRecord) -> Result<()> {
        self.header.num_answers = count("answer", self.answers.len() + 1)?;
        self.answers.push(answer);
        Ok(())
    }

    pub fn add_authority(&mut self, authority: ResourceRecord) -> Result<()> {
        self.header.num_authorities = count("authority", self.authorities.len() + 1)?;
        self.authorities.push(authority);
        Ok(())
    }

    pub fn add_additional(&mut self, additional: ResourceRecord) -> Result<()> {
        self.header.num_additionals = count("additional", self.additionals.len() + 1)?;
        self.additionals.push(additional);
        Ok(())
    }

    /// The header as it goes on the wire, with counts taken from the sections
    pub fn counted_header(&self) -> Result<Header> {
        Ok(Header {
            num_questions: count("question", self.questions.len())?,
            num_answers: count("answer", self.answers.len())?,
            num_authorities: count("authority", self.authorities.len())?,
            num_additionals: count("additional", self.additionals.len())?,
            ..self.header
        })
    }

    pub fn sync_counts(&mut self) -> Result<()> {
        self.header = self.counted_header()?;
        Ok(())
    }

    /// Encodes the message after bringing the header counts in line with the sections.
    pub fn encode(&mut self) -> Result<Bytes> {
        self.sync_counts()?;
        self.to_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(&mut Cursor::new(bytes))
    }

    #[instrument(level = "debug", skip_all)]
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut response = BytesMut::new();
        response.extend_from_slice(&self.counted_header()?.to_bytes());

        for question in self.questions.iter() {
            response.extend_from_slice(&question.to_bytes())
        }

        for record in self
            .answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additionals.iter())
        {
            response.extend_from_slice(&record.to_bytes())
        }

        Ok(response.into())
    }

    #[instrument(level = "debug", skip_all)]
    pub fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self> {
        if bytes.remaining() < HEADER_LEN {
            return Err(DnsError::InvalidMessageLength(bytes.remaining()));
        }

        let header = Header::from_bytes(bytes)?;
        debug!(
            id = header.id,
            questions = header.num_questions,
            answers = header.num_answers,
            authorities = header.num_authorities,
            additionals = header.num_additionals,
            "decoded header"
        );

        let questions = (0..header.num_questions)
            .map(|_| Question::from_bytes(bytes))
            .collect::<Result<Vec<_>>>()?;

        let answers = decode_records(bytes, header.num_answers)?;
        let authorities = decode_records(bytes, header.num_authorities)?;
        let additionals = decode_records(bytes, header.num_additionals)?;

        if bytes.has_remaining() {
            trace!(trailing = bytes.remaining(), "ignoring bytes after last section");
        }

        Ok(Self {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }
}

fn count(section: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| {
        warn!(section, len, "section does not fit in a header count");
        DnsError::TooManyRecords {
            section,
            count: len,
        }
    })
}

fn decode_records(bytes: &mut Cursor<&[u8]>, count: u16) -> Result<Vec<ResourceRecord>> {
    (0..count)
        .map(|_| ResourceRecord::from_bytes(bytes))
        .collect()
}
