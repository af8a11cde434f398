//! A sparse in-memory target for [`Loader`](crate::Loader), for when there is
//! no real flash to program, or the image is wanted as a flat binary.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use thiserror::Error;

use crate::FlashWriter;

/// Largest flat binary [`MemoryImage::to_binary`] will build, 256 MiB.
pub const MAX_BINARY_SPAN: usize = 256 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("address {address:#010x} already holds {existing:#04x}, refusing to write {new:#04x}")]
    Conflict { address: u32, existing: u8, new: u8 },
    #[error("{length} bytes at {address:#010x} run past the end of the address space")]
    AddressOverflow { address: u32, length: usize },
    #[error("{start:#010x}..={end:#010x} is too sparse for a flat binary")]
    SpanTooLarge { start: u32, end: u32 },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: BTreeMap<u32, u8>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn read_byte(&self, address: u32) -> Option<u8> {
        self.bytes.get(&address).copied()
    }

    /// `length` bytes from `address`, or `None` if any of them was never
    /// written.
    pub fn read_range(&self, address: u32, length: usize) -> Option<Vec<u8>> {
        let data: Vec<u8> = (0..length)
            .map(|i| {
                let address = address.checked_add(u32::try_from(i).ok()?)?;
                self.read_byte(address)
            })
            .collect::<Option<_>>()?;

        Some(data)
    }

    pub fn min_address(&self) -> Option<u32> {
        self.bytes.keys().next().copied()
    }

    pub fn max_address(&self) -> Option<u32> {
        self.bytes.keys().next_back().copied()
    }

    /// Every written byte in address order.
    pub fn bytes(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.bytes.iter().map(|(&address, &byte)| (address, byte))
    }

    /// Runs of consecutive addresses, each with its start address.
    pub fn blocks(&self) -> Vec<(u32, Vec<u8>)> {
        let mut blocks: Vec<(u32, Vec<u8>)> = Vec::new();
        let mut next = None;

        for (address, byte) in self.bytes() {
            if next != Some(address) {
                blocks.push((address, Vec::new()));
            }
            if let Some((_, data)) = blocks.last_mut() {
                data.push(byte);
            }

            next = address.checked_add(1);
        }

        blocks
    }

    /// The image from [`min_address`](Self::min_address) to
    /// [`max_address`](Self::max_address), with gaps set to `fill`. Fails
    /// when that would be more than [`MAX_BINARY_SPAN`] bytes.
    pub fn to_binary(&self, fill: u8) -> Result<Vec<u8>, ImageError> {
        let (start, end) = match (self.min_address(), self.max_address()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Ok(Vec::new()),
        };

        let span = usize::try_from(end - start)
            .ok()
            .and_then(|span| span.checked_add(1))
            .filter(|&span| span <= MAX_BINARY_SPAN)
            .ok_or(ImageError::SpanTooLarge { start, end })?;

        let mut binary = alloc::vec![fill; span];

        for (address, byte) in self.bytes() {
            binary[(address - start) as usize] = byte;
        }

        Ok(binary)
    }
}

impl FlashWriter for MemoryImage {
    type Error = ImageError;

    /// Rewriting a byte with the value it already holds is allowed, so
    /// overlapping records only fail when they disagree.
    fn write(&mut self, address: u32, payload: &[u8]) -> Result<(), Self::Error> {
        let overflow = ImageError::AddressOverflow {
            address,
            length: payload.len(),
        };

        if let Some(last) = payload.len().checked_sub(1) {
            let last = u32::try_from(last).map_err(|_| overflow)?;
            address.checked_add(last).ok_or(overflow)?;
        }

        let bytes = payload
            .iter()
            .enumerate()
            .map(|(offset, &byte)| (address + offset as u32, byte));

        for (address, new) in bytes.clone() {
            if let Some(&existing) = self.bytes.get(&address) {
                if existing != new {
                    return Err(ImageError::Conflict {
                        address,
                        existing,
                        new,
                    });
                }
            }
        }

        self.bytes.extend(bytes);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn write_and_read_back() {
        let mut image = MemoryImage::new();

        image.write(0x0230, &[0x01, 0x02, 0x03]).unwrap();

        assert_eq!(image.len(), 3);
        assert_eq!(image.read_byte(0x0231), Some(0x02));
        assert_eq!(image.read_byte(0x0233), None);
        assert_eq!(image.read_range(0x0230, 3), Some(vec![0x01, 0x02, 0x03]));
        assert_eq!(image.read_range(0x0230, 4), None);
        assert_eq!(image.min_address(), Some(0x0230));
        assert_eq!(image.max_address(), Some(0x0232));
    }

    #[test]
    fn empty_image() {
        let image = MemoryImage::new();

        assert!(image.is_empty());
        assert_eq!(image.min_address(), None);
        assert!(image.blocks().is_empty());
        assert_eq!(image.to_binary(0xFF), Ok(vec![]));
    }

    #[test]
    fn blocks_split_on_gaps() {
        let mut image = MemoryImage::new();

        image.write(0x10, &[0xAA, 0xBB]).unwrap();
        image.write(0x12, &[0xCC]).unwrap();
        image.write(0x20, &[0xDD]).unwrap();

        assert_eq!(
            image.blocks(),
            vec![(0x10, vec![0xAA, 0xBB, 0xCC]), (0x20, vec![0xDD])]
        );
    }

    #[test]
    fn flat_binary_fills_gaps() {
        let mut image = MemoryImage::new();

        image.write(0x100, &[0x01]).unwrap();
        image.write(0x103, &[0x04]).unwrap();

        assert_eq!(image.to_binary(0xFF), Ok(vec![0x01, 0xFF, 0xFF, 0x04]));
    }

    #[test]
    fn sparse_image_is_too_large_for_a_flat_binary() {
        let mut image = MemoryImage::new();

        image.write(0x0000_0000, &[0x01]).unwrap();
        image.write(u32::MAX, &[0x02]).unwrap();

        assert_eq!(
            image.to_binary(0xFF),
            Err(ImageError::SpanTooLarge {
                start: 0x0000_0000,
                end: u32::MAX
            })
        );
        assert_eq!(image.blocks().len(), 2);
    }

    #[test]
    fn identical_overlap_is_accepted() {
        let mut image = MemoryImage::new();

        image.write(0x00, &[0x01, 0x02]).unwrap();
        image.write(0x01, &[0x02, 0x03]).unwrap();

        assert_eq!(image.read_range(0x00, 3), Some(vec![0x01, 0x02, 0x03]));
    }

    #[test]
    fn conflicting_overlap_is_rejected() {
        let mut image = MemoryImage::new();

        image.write(0x00, &[0x01, 0x02]).unwrap();

        assert_eq!(
            image.write(0x01, &[0x09, 0x03]),
            Err(ImageError::Conflict {
                address: 0x01,
                existing: 0x02,
                new: 0x09
            })
        );
        assert_eq!(image.read_byte(0x02), None);
    }

    #[test]
    fn top_of_address_space() {
        let mut image = MemoryImage::new();

        image.write(u32::MAX, &[0x5A]).unwrap();
        assert_eq!(image.read_byte(u32::MAX), Some(0x5A));

        assert_eq!(
            image.write(u32::MAX, &[0x5A, 0x5B]),
            Err(ImageError::AddressOverflow {
                address: u32::MAX,
                length: 2
            })
        );
    }
}
