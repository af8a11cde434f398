/// Two's complement of the byte sum, the value that brings a record's total to zero.
pub fn checksum(bytes: &[u8]) -> u8 {
	0u8.wrapping_sub(sum(bytes))
}

pub(crate) fn sum(bytes: &[u8]) -> u8 {
	bytes.iter().fold(0u8, |acc, &byte| acc.wrapping_add(byte))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_record_sums_to_zero() {
		assert_eq!(checksum(&[]), 0);
	}

	#[test]
	fn end_of_file_checksum() {
		assert_eq!(checksum(&[0x00, 0x00, 0x00, 0x01]), 0xFF);
	}

	#[test]
	fn checksum_cancels_sum() {
		let samples: [&[u8]; 4] = [
			&[0xFF],
			&[0x80, 0x80],
			&[0x10, 0x00, 0x13, 0x00, 0xAC, 0x12, 0xAD, 0x13],
			&[0x02, 0x00, 0x00, 0x04, 0xAB, 0xCD],
		];

		for bytes in samples.iter() {
			assert_eq!(sum(bytes).wrapping_add(checksum(bytes)), 0);
		}
	}

	#[test]
	fn checksum_cancels_every_byte_and_pair() {
		for first in 0..=0xFFu8 {
			assert_eq!(first.wrapping_add(checksum(&[first])), 0);

			for second in 0..=0xFFu8 {
				let bytes = [first, second];
				assert_eq!(sum(&bytes).wrapping_add(checksum(&bytes)), 0);
			}
		}
	}

	#[test]
	fn wraps_on_overflow() {
		let bytes = [0xFF; 0x100];

		assert_eq!(sum(&bytes), 0x00);
		assert_eq!(checksum(&[0xFF, 0x02]), 0xFF);
	}
}
