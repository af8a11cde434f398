use core::iter::FusedIterator;
use core::str::FromStr;

use crate::checksum::{checksum, sum};
use crate::codec::decode_pairs;
use crate::record::{Payload, RecordType, MAX_RECORD_BYTES};
use crate::{DecodeError, Record};

/// `:` followed by `LL AAAA TT`.
const HEADER_LENGTH: usize = 9;

type ParseResult = Result<Record, DecodeError>;

/// Decodes one line, without its line terminator, into a [`Record`].
///
/// The checksum is verified before any field is handed out. The record type is
/// not judged here; unknown types come back as [`RecordType::Unknown`].
pub fn decode_line<T: AsRef<[u8]>>(line: T) -> ParseResult {
    let line = line.as_ref();

    if line.first() != Some(&b':') {
        return Err(DecodeError::InvalidStartCharacter);
    }

    // Every decoded byte of the record goes through this one buffer so the
    // checksum can be taken over a single slice.
    let mut bytes = [0u8; MAX_RECORD_BYTES];

    decode_pairs(&line[1..], &mut bytes[..4], 1).map_err(|err| match err {
        DecodeError::TruncatedLine { .. } => DecodeError::TruncatedLine {
            expected: HEADER_LENGTH + 2,
            actual: line.len(),
        },
        err => err,
    })?;

    let length = bytes[0] as usize;
    let address_offset = u16::from_be_bytes([bytes[1], bytes[2]]);
    let record_type = RecordType::from(bytes[3]);

    // Payload pairs plus the checksum pair.
    let expected = HEADER_LENGTH + 2 * length + 2;
    if line.len() < expected {
        return Err(DecodeError::TruncatedLine {
            expected,
            actual: line.len(),
        });
    }

    let record_length = 4 + length;
    decode_pairs(
        &line[HEADER_LENGTH..],
        &mut bytes[4..record_length + 1],
        HEADER_LENGTH,
    )?;

    if let Some(position) = line[expected..]
        .iter()
        .position(|c| !c.is_ascii_whitespace())
    {
        return Err(DecodeError::TrailingCharacters {
            position: expected + position,
        });
    }

    let expected_checksum = bytes[record_length];
    let record = &bytes[..record_length];

    if sum(record).wrapping_add(expected_checksum) != 0 {
        return Err(DecodeError::ChecksumMismatch {
            expected: expected_checksum,
            computed: checksum(record),
        });
    }

    let mut payload = Payload::new();
    payload.extend(bytes[4..record_length].iter().copied());

    Ok(Record {
        record_type,
        address_offset,
        payload,
    })
}

impl Record {
    pub fn parse<T: AsRef<[u8]>>(line: T) -> ParseResult {
        decode_line(line)
    }
}

impl FromStr for Record {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_line(s)
    }
}

/// Decodes every non-empty line of a string in order.
///
/// Errors do not end iteration; each line stands on its own here. Address
/// tracking across lines is the job of [`dispatch`](crate::dispatch).
pub struct Parser<'a> {
    inner: core::str::Lines<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Parser { inner: s.lines() }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        for line in &mut self.inner {
            if !line.trim().is_empty() {
                return Some(line);
            }
        }

        None
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = ParseResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().map(decode_line)
    }
}

impl<'a> FusedIterator for Parser<'a> {}
