//! Address resolution across records.
//!
//! Data records only carry a 16-bit offset. The extended address records that
//! precede them set a base which is added to every following offset, until the
//! next extended address record replaces it.

use crate::record::{Payload, RecordType};
use crate::{DispatchError, Record, TruncatedStream};

/// State carried from one record to the next for a whole input stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecoderState {
    base_address: u32,
    eof_seen: bool,
}

impl DecoderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    pub fn eof_seen(&self) -> bool {
        self.eof_seen
    }

    /// Checks the stream was closed by an end-of-file record. Call once the
    /// input is exhausted.
    pub fn finish(&self) -> Result<(), TruncatedStream> {
        if self.eof_seen {
            Ok(())
        } else {
            Err(TruncatedStream)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    /// Program `payload` starting at the absolute `address`.
    WriteAt { address: u32, payload: Payload },
    /// The base address is now the contained value.
    AddressUpdated(u32),
    Finish,
}

/// Applies one record to `state` and says what the loader should do with it.
///
/// Records must be fed in input order. A rejected record leaves `state`
/// untouched.
pub fn dispatch(state: &mut DecoderState, record: Record) -> Result<DispatchAction, DispatchError> {
    match record.record_type {
        RecordType::Data => {
            // The largest base plus the largest offset is exactly u32::MAX.
            let address = state.base_address + u32::from(record.address_offset);

            Ok(DispatchAction::WriteAt {
                address,
                payload: record.payload,
            })
        }
        RecordType::EndOfFile => {
            state.eof_seen = true;

            Ok(DispatchAction::Finish)
        }
        RecordType::ExtendedSegmentAddress => {
            let segment = address_word(&record)?;
            state.base_address = u32::from(segment) << 4;

            Ok(DispatchAction::AddressUpdated(state.base_address))
        }
        RecordType::ExtendedLinearAddress => {
            let upper = address_word(&record)?;
            state.base_address = u32::from(upper) << 16;

            Ok(DispatchAction::AddressUpdated(state.base_address))
        }
        RecordType::Unknown(code) => Err(DispatchError::UnknownRecordType(code)),
    }
}

fn address_word(record: &Record) -> Result<u16, DispatchError> {
    match record.payload[..] {
        [high, low] => Ok(u16::from_be_bytes([high, low])),
        _ => Err(DispatchError::MalformedPayload {
            record_type: record.record_type,
            expected: 2,
            actual: record.payload.len(),
        }),
    }
}
