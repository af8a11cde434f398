use core::fmt;

use crate::codec::encode_pairs;
use crate::record::{MAX_LINE_LENGTH, MAX_RECORD_BYTES};
use crate::{EncodeError, Record};

#[cfg(feature = "alloc")]
use alloc::string::{String, ToString};

impl Record {
    /// Writes the canonical uppercase line for this record into `buffer`,
    /// without a line terminator, and returns how many bytes were written.
    pub fn serialize<T>(&self, buffer: &mut T) -> Result<usize, EncodeError>
    where
        T: AsMut<[u8]> + ?Sized,
    {
        let buffer = buffer.as_mut();
        let data_length = 4 + self.payload.len() + 1;
        let line_length = 1 + 2 * data_length;

        if buffer.len() < line_length {
            return Err(EncodeError::BufferTooSmall {
                required: line_length,
                available: buffer.len(),
            });
        }

        let mut bytes = [0; MAX_RECORD_BYTES];
        bytes[..4].copy_from_slice(&self.header());
        bytes[4..data_length - 1].copy_from_slice(&self.payload);
        bytes[data_length - 1] = self.checksum();

        buffer[0] = b':';

        encode_pairs(&bytes[..data_length], &mut buffer[1..line_length]).map_err(|_| {
            EncodeError::BufferTooSmall {
                required: line_length,
                available: buffer.len(),
            }
        })?;

        Ok(line_length)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = [0; MAX_LINE_LENGTH];
        let length = self.serialize(&mut buffer).map_err(|_| fmt::Error)?;

        // Only ':' and hex digits were written.
        let line = core::str::from_utf8(&buffer[..length]).map_err(|_| fmt::Error)?;

        f.write_str(line)
    }
}

/// The canonical line for `record`, uppercase and without a terminator.
#[cfg(feature = "alloc")]
pub fn encode_line(record: &Record) -> String {
    record.to_string()
}
