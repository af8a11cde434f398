#![no_std]

//! Intel HEX decoding for flash loaders.
//!
//! A line such as `:10001300AC12AD13AE10AF1112002F8E0E8F0F2244` is decoded and
//! checksummed into a [`Record`] by [`decode_line`]. Records are then fed, in
//! file order, to [`dispatch`], which keeps the running base address set by
//! extended address records in a [`DecoderState`] and turns every data record
//! into an absolute address and payload. [`Loader`] ties the two together over
//! a whole file and hands the result to a [`FlashWriter`].
//!
//! ```
//! use ihex_flash::{Loader, MemoryImage};
//!
//! let mut loader = Loader::new(MemoryImage::new());
//! for line in [":020000020023D9", ":0100000055AA", ":00000001FF"] {
//!     loader.feed_line(line).unwrap();
//! }
//! assert_eq!(loader.finish(), None);
//! assert_eq!(loader.writer().read_byte(0x0230), Some(0x55));
//! ```
//!
//! ## Cargo Features
//!
//! - `alloc`: [`MemoryImage`] and string encoding helpers.
//! - `std`: [`Loader::load`] over any [`BufRead`](std::io::BufRead) (default).
//! - `cli`: the `ihex-flash` binary (default).

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod checksum;
pub mod codec;
mod encoder;
mod error;
#[cfg(feature = "alloc")]
mod image;
mod loader;
mod parser;
mod record;
mod resolver;
mod serializer;
pub mod types;

pub use checksum::checksum;
pub use codec::hex_pair_to_byte;
pub use encoder::{Encoder, EncoderConfig, DEFAULT_RECORD_SIZE};
#[cfg(feature = "alloc")]
pub use encoder::encode_binary;
pub use error::{DecodeError, DispatchError, EncodeError, TruncatedStream, Warning, WarningKind};
#[cfg(feature = "alloc")]
pub use image::{ImageError, MemoryImage, MAX_BINARY_SPAN};
#[cfg(feature = "std")]
pub use loader::LoadError;
pub use loader::{Event, FlashWriter, Loader, Summary, WriteFailed};
pub use parser::{decode_line, Parser};
pub use record::{Payload, Record, RecordType, MAX_LINE_LENGTH, MAX_PAYLOAD, MAX_RECORD_BYTES};
pub use resolver::{dispatch, DecoderState, DispatchAction};
#[cfg(feature = "alloc")]
pub use serializer::encode_line;
