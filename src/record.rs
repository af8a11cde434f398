use arrayvec::ArrayVec;

use crate::checksum::checksum;
use crate::types;
use crate::EncodeError;

/// Largest payload a record can declare, `LL = 0xFF`.
pub const MAX_PAYLOAD: usize = 0xFF;

/// Decoded size of a record: length, two address bytes, type, payload, checksum.
pub const MAX_RECORD_BYTES: usize = 1 + 2 + 1 + MAX_PAYLOAD + 1;

/// Longest well formed line: the colon plus two digits per decoded byte.
pub const MAX_LINE_LENGTH: usize = 1 + 2 * MAX_RECORD_BYTES;

pub type Payload = ArrayVec<u8, MAX_PAYLOAD>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Data,
    EndOfFile,
    ExtendedSegmentAddress,
    ExtendedLinearAddress,
    Unknown(u8),
}

impl RecordType {
    pub fn code(self) -> u8 {
        match self {
            Self::Data => types::DATA,
            Self::EndOfFile => types::END_OF_FILE,
            Self::ExtendedSegmentAddress => types::EXTENDED_SEGMENT_ADDRESS,
            Self::ExtendedLinearAddress => types::EXTENDED_LINEAR_ADDRESS,
            Self::Unknown(code) => code,
        }
    }
}

impl From<u8> for RecordType {
    fn from(code: u8) -> Self {
        match code {
            types::DATA => Self::Data,
            types::END_OF_FILE => Self::EndOfFile,
            types::EXTENDED_SEGMENT_ADDRESS => Self::ExtendedSegmentAddress,
            types::EXTENDED_LINEAR_ADDRESS => Self::ExtendedLinearAddress,
            code => Self::Unknown(code),
        }
    }
}

/// One line of an Intel HEX file.
///
/// The byte count is not stored separately; it is always the payload length,
/// and the payload can never outgrow what `LL` is able to express.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub record_type: RecordType,
    pub address_offset: u16,
    pub payload: Payload,
}

impl Record {
    pub fn new(
        record_type: RecordType,
        address_offset: u16,
        payload: &[u8],
    ) -> Result<Self, EncodeError> {
        let payload =
            Payload::try_from(payload).map_err(|_| EncodeError::PayloadTooLong(payload.len()))?;

        Ok(Record {
            record_type,
            address_offset,
            payload,
        })
    }

    pub fn data(address_offset: u16, bytes: &[u8]) -> Result<Self, EncodeError> {
        Self::new(RecordType::Data, address_offset, bytes)
    }

    pub fn end_of_file() -> Self {
        Record {
            record_type: RecordType::EndOfFile,
            address_offset: 0,
            payload: Payload::new(),
        }
    }

    pub fn extended_segment_address(segment: u16) -> Self {
        Self::with_word(RecordType::ExtendedSegmentAddress, segment)
    }

    pub fn extended_linear_address(upper: u16) -> Self {
        Self::with_word(RecordType::ExtendedLinearAddress, upper)
    }

    fn with_word(record_type: RecordType, word: u16) -> Self {
        let mut payload = Payload::new();
        payload.extend(word.to_be_bytes());

        Record {
            record_type,
            address_offset: 0,
            payload,
        }
    }

    pub fn byte_count(&self) -> u8 {
        self.payload.len() as u8
    }

    /// The header bytes covered by the checksum: `LL`, `AAAA`, `TT`.
    pub fn header(&self) -> [u8; 4] {
        let [high, low] = self.address_offset.to_be_bytes();

        [self.byte_count(), high, low, self.record_type.code()]
    }

    /// Checksum this record would carry on the wire.
    pub fn checksum(&self) -> u8 {
        let header = checksum(&self.header());
        let payload = checksum(&self.payload);

        // checksum(a ++ b) == checksum(a) + checksum(b) (mod 256)
        header.wrapping_add(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes() {
        assert_eq!(RecordType::from(0x00), RecordType::Data);
        assert_eq!(RecordType::from(0x01), RecordType::EndOfFile);
        assert_eq!(RecordType::from(0x02), RecordType::ExtendedSegmentAddress);
        assert_eq!(RecordType::from(0x04), RecordType::ExtendedLinearAddress);
        assert_eq!(RecordType::from(0x03), RecordType::Unknown(0x03));
        assert_eq!(RecordType::from(0x05), RecordType::Unknown(0x05));
        assert_eq!(RecordType::Unknown(0x42).code(), 0x42);
        assert_eq!(RecordType::ExtendedLinearAddress.code(), 0x04);
    }

    #[test]
    fn end_of_file_record() {
        let eof = Record::end_of_file();

        assert_eq!(eof.byte_count(), 0);
        assert_eq!(eof.header(), [0x00, 0x00, 0x00, 0x01]);
        assert_eq!(eof.checksum(), 0xFF);
    }

    #[test]
    fn address_records_are_big_endian() {
        let ela = Record::extended_linear_address(0xABCD);

        assert_eq!(&ela.payload[..], &[0xAB, 0xCD]);
        assert_eq!(ela.checksum(), 0x82);

        let esa = Record::extended_segment_address(0x12FE);

        assert_eq!(&esa.payload[..], &[0x12, 0xFE]);
        assert_eq!(esa.checksum(), 0xEC);
    }

    #[test]
    fn data_record_limits() {
        let full = [0xA5; MAX_PAYLOAD];
        let record = Record::data(0x1000, &full).unwrap();

        assert_eq!(record.byte_count(), 0xFF);
        assert_eq!(
            Record::data(0x1000, &[0; MAX_PAYLOAD + 1]),
            Err(EncodeError::PayloadTooLong(MAX_PAYLOAD + 1))
        );
    }

    #[test]
    fn protocol_maximums() {
        assert_eq!(MAX_RECORD_BYTES, 260);
        assert_eq!(MAX_LINE_LENGTH, 521);
    }
}
