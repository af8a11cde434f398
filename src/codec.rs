//! ASCII hex digit pairs to bytes and back, on top of the `hex` crate.

use hex::FromHexError;

use crate::DecodeError;

/// Decodes one pair of hex digits, high nibble first.
pub fn hex_pair_to_byte(pair: [u8; 2]) -> Result<u8, DecodeError> {
    let mut byte = [0; 1];

    decode_pairs(&pair, &mut byte, 0)?;

    Ok(byte[0])
}

/// Decodes `2 * dst.len()` digits from the front of `src` into `dst`.
///
/// `position` is the offset of `src` within the line, so a bad digit is
/// reported where it actually sits. The caller checks that `src` is long
/// enough; a short `src` is reported as a truncated line.
pub fn decode_pairs(src: &[u8], dst: &mut [u8], position: usize) -> Result<(), DecodeError> {
    let digits = dst.len() * 2;

    let src = match src.get(..digits) {
        Some(src) => src,
        None => {
            return Err(DecodeError::TruncatedLine {
                expected: position + digits,
                actual: position + src.len(),
            })
        }
    };

    hex::decode_to_slice(src, dst).map_err(|err| match err {
        FromHexError::InvalidHexCharacter { c, index } => DecodeError::InvalidHexDigit {
            position: position + index,
            character: c,
        },
        FromHexError::OddLength | FromHexError::InvalidStringLength => {
            DecodeError::TruncatedLine {
                expected: position + digits,
                actual: position + src.len(),
            }
        }
    })
}

/// Writes `src` as uppercase hex digits into `dst`, which must hold exactly
/// `2 * src.len()` bytes.
pub(crate) fn encode_pairs(src: &[u8], dst: &mut [u8]) -> Result<(), hex::FromHexError> {
    hex::encode_to_slice(src, dst)?;
    dst.make_ascii_uppercase();

    Ok(())
}
