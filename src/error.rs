use thiserror::Error;

use crate::record::RecordType;

/// Why a single line could not be turned into a [`Record`](crate::Record).
///
/// Positions are zero-based character offsets into the line, counting the
/// leading `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
	#[error("line does not start with ':'")]
	InvalidStartCharacter,
	#[error("invalid hex digit {character:?} at position {position}")]
	InvalidHexDigit { position: usize, character: char },
	#[error("line is {actual} characters long, record needs {expected}")]
	TruncatedLine { expected: usize, actual: usize },
	#[error("checksum mismatch: line says {expected:#04x}, computed {computed:#04x}")]
	ChecksumMismatch { expected: u8, computed: u8 },
	#[error("unexpected characters after the checksum at position {position}")]
	TrailingCharacters { position: usize },
	#[error("line of {length} characters is longer than any record")]
	LineTooLong { length: usize },
}

/// A well formed record the resolver refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
	#[error("unknown record type {0:#04x}")]
	UnknownRecordType(u8),
	#[error("{record_type:?} record carries {actual} bytes, expected {expected}")]
	MalformedPayload {
		record_type: RecordType,
		expected: usize,
		actual: usize,
	},
}

/// The input ran out before an end-of-file record was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("input ended without an end-of-file record")]
pub struct TruncatedStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
	#[error("buffer holds {available} bytes, record needs {required}")]
	BufferTooSmall { required: usize, available: usize },
	#[error("payload of {0} bytes does not fit in one record")]
	PayloadTooLong(usize),
	#[error("record size must be between 1 and 255 bytes")]
	InvalidRecordSize,
	#[error("data runs past the end of the 32-bit address space")]
	AddressOverflow,
}

/// A recoverable problem, reported while the stream keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WarningKind {
	#[error(transparent)]
	Decode(#[from] DecodeError),
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
	#[error(transparent)]
	TruncatedStream(#[from] TruncatedStream),
}

/// A [`WarningKind`] tagged with the 1-based line it came from. For
/// [`WarningKind::TruncatedStream`] the line is the last one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct Warning {
	pub line: usize,
	pub kind: WarningKind,
}
