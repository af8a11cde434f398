//! Record type codes as they appear in the `TT` field of a line.

pub const DATA: u8 = 0x00;
pub const END_OF_FILE: u8 = 0x01;
pub const EXTENDED_SEGMENT_ADDRESS: u8 = 0x02;
pub const EXTENDED_LINEAR_ADDRESS: u8 = 0x04;
