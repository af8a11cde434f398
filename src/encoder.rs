//! Turns a flat binary image into a stream of records.

use core::iter::FusedIterator;

use crate::record::{Payload, RecordType};
use crate::{EncodeError, Record};

#[cfg(feature = "alloc")]
use alloc::string::{String, ToString};

pub const DEFAULT_RECORD_SIZE: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Address of the first byte of the image.
    pub base_address: u32,
    /// Most data bytes per record.
    pub record_size: u8,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            base_address: 0,
            record_size: DEFAULT_RECORD_SIZE,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.record_size == 0 {
            return Err(EncodeError::InvalidRecordSize);
        }

        Ok(())
    }
}

/// Yields an extended linear address record whenever the upper 16 address
/// bits change, data records that never cross a 64 KiB boundary, and a final
/// end-of-file record.
pub struct Encoder<'a> {
    data: &'a [u8],
    address: u32,
    record_size: usize,
    upper: Option<u16>,
    done: bool,
}

impl<'a> Encoder<'a> {
    pub fn new(data: &'a [u8], config: EncoderConfig) -> Result<Self, EncodeError> {
        config.validate()?;

        if let Some(last) = data.len().checked_sub(1) {
            u32::try_from(last)
                .ok()
                .and_then(|last| config.base_address.checked_add(last))
                .ok_or(EncodeError::AddressOverflow)?;
        }

        Ok(Encoder {
            data,
            address: config.base_address,
            record_size: usize::from(config.record_size),
            upper: None,
            done: false,
        })
    }
}

impl<'a> Iterator for Encoder<'a> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.data.is_empty() {
            self.done = true;
            return Some(Record::end_of_file());
        }

        let upper = (self.address >> 16) as u16;
        if self.upper != Some(upper) {
            self.upper = Some(upper);
            return Some(Record::extended_linear_address(upper));
        }

        let offset = self.address as u16;
        let room = 0x1_0000 - usize::from(offset);
        let length = self.record_size.min(room).min(self.data.len());

        let (chunk, rest) = self.data.split_at(length);
        self.data = rest;
        // Only wraps past the very last byte of the address space, after
        // which nothing is left to encode.
        self.address = self.address.wrapping_add(length as u32);

        Some(Record {
            record_type: RecordType::Data,
            address_offset: offset,
            payload: chunk.iter().copied().collect::<Payload>(),
        })
    }
}

impl<'a> FusedIterator for Encoder<'a> {}

/// Encodes `data` as the text of a complete Intel HEX file, one record per
/// line, each line ending in `\n`.
#[cfg(feature = "alloc")]
pub fn encode_binary(data: &[u8], config: EncoderConfig) -> Result<String, EncodeError> {
    let mut text = String::new();

    for record in Encoder::new(data, config)? {
        text.push_str(&record.to_string());
        text.push('\n');
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_address: u32, record_size: u8) -> EncoderConfig {
        EncoderConfig {
            base_address,
            record_size,
        }
    }

    #[test]
    fn small_image() {
        let mut encoder = Encoder::new(&[0x02, 0x00, 0x23], EncoderConfig::default()).unwrap();

        assert_eq!(encoder.next(), Some(Record::extended_linear_address(0)));
        assert_eq!(
            encoder.next(),
            Some(Record::data(0x0000, &[0x02, 0x00, 0x23]).unwrap())
        );
        assert_eq!(encoder.next(), Some(Record::end_of_file()));
        assert_eq!(encoder.next(), None);
        assert_eq!(encoder.next(), None);
    }

    #[test]
    fn empty_image() {
        let mut encoder = Encoder::new(&[], EncoderConfig::default()).unwrap();

        assert_eq!(encoder.next(), Some(Record::end_of_file()));
        assert_eq!(encoder.next(), None);
    }

    #[test]
    fn splits_into_record_size_chunks() {
        let data = [0x11; 40];
        let mut encoder = Encoder::new(&data, config(0x0100, 16)).unwrap();

        assert_eq!(encoder.next(), Some(Record::extended_linear_address(0)));
        assert_eq!(encoder.next(), Some(Record::data(0x0100, &[0x11; 16]).unwrap()));
        assert_eq!(encoder.next(), Some(Record::data(0x0110, &[0x11; 16]).unwrap()));
        assert_eq!(encoder.next(), Some(Record::data(0x0120, &[0x11; 8]).unwrap()));
        assert_eq!(encoder.next(), Some(Record::end_of_file()));
    }

    #[test]
    fn never_straddles_a_64k_boundary() {
        let data = [0x22; 16];
        let mut encoder = Encoder::new(&data, config(0x0800_FFF8, 16)).unwrap();

        assert_eq!(encoder.next(), Some(Record::extended_linear_address(0x0800)));
        assert_eq!(encoder.next(), Some(Record::data(0xFFF8, &[0x22; 8]).unwrap()));
        assert_eq!(encoder.next(), Some(Record::extended_linear_address(0x0801)));
        assert_eq!(encoder.next(), Some(Record::data(0x0000, &[0x22; 8]).unwrap()));
        assert_eq!(encoder.next(), Some(Record::end_of_file()));
    }

    #[test]
    fn ends_on_last_address() {
        let records: usize = Encoder::new(&[0xAA, 0xBB], config(u32::MAX - 1, 32))
            .unwrap()
            .count();

        assert_eq!(records, 3);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            Encoder::new(&[0x00], config(0, 0)),
            Err(EncodeError::InvalidRecordSize)
        ));
        assert!(matches!(
            Encoder::new(&[0x00, 0x01], config(u32::MAX, 32)),
            Err(EncodeError::AddressOverflow)
        ));
    }

    #[test]
    #[cfg(feature = "alloc")]
    fn encode_text() {
        assert_eq!(
            encode_binary(&[0x02, 0x00, 0x23], EncoderConfig::default()).unwrap(),
            ":020000040000FA\n:03000000020023D8\n:00000001FF\n"
        );
    }

    #[test]
    #[cfg(feature = "alloc")]
    fn load_what_was_encoded() {
        use crate::{Loader, MemoryImage};

        let data: alloc::vec::Vec<u8> = (0..=255u8).cycle().take(0x300).collect();
        let text = encode_binary(&data, config(0x0001_FF80, 0xFF)).unwrap();

        let mut loader = Loader::new(MemoryImage::new());
        for line in text.lines() {
            assert!(matches!(
                loader.feed_line(line),
                Ok(crate::Event::Write { .. })
                    | Ok(crate::Event::AddressUpdated(_))
                    | Ok(crate::Event::EndOfFile)
            ));
        }
        assert_eq!(loader.finish(), None);

        let image = loader.into_writer();
        assert_eq!(image.min_address(), Some(0x0001_FF80));
        assert_eq!(image.read_range(0x0001_FF80, data.len()), Some(data));
    }
}
