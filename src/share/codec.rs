//! Fixed-size share tokens for grids.
//!
//! A token is 32 bytes (256 bits) holding one bit per cell, visited
//! row-major (row 0 first, column 0 first within a row) and packed
//! least-significant-bit first within each byte, written as unpadded
//! base64url. Encoding depends on cell contents only, so the same pattern
//! always yields the same token.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::error::CodecError;
use crate::sequencer::Grid;

pub const TOKEN_BYTES: usize = 32;
pub const TOKEN_BITS: usize = TOKEN_BYTES * 8;
pub const CANONICAL_ROWS: usize = 16;
pub const CANONICAL_COLS: usize = 16;

/// Tolerant decoder for hand-edited tokens: padding optional, stray
/// trailing bits in the last character ignored.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Pack a grid into the fixed token buffer
pub fn encode_bytes(grid: &Grid) -> Result<[u8; TOKEN_BYTES], CodecError> {
    let cells = grid.cells();
    if cells.len() > TOKEN_BITS {
        return Err(CodecError::GridTooLarge {
            cells: cells.len(),
            capacity: TOKEN_BITS,
        });
    }
    let mut bytes = [0u8; TOKEN_BYTES];
    for (bit, &on) in cells.iter().enumerate() {
        if on {
            bytes[bit / 8] |= 1 << (bit % 8);
        }
    }
    Ok(bytes)
}

/// Unpack a buffer into a grid. Missing bytes read as off, extra bytes are ignored.
pub fn decode_bytes(bytes: &[u8], rows: usize, cols: usize) -> Grid {
    let mut grid = Grid::new(rows, cols);
    let capacity = (rows * cols).min(TOKEN_BITS);
    for bit in 0..capacity {
        let on = bytes
            .get(bit / 8)
            .map(|byte| byte & (1 << (bit % 8)) != 0)
            .unwrap_or(false);
        if on {
            // In range by construction
            let _ = grid.set(bit / cols, bit % cols, true);
        }
    }
    grid
}

/// Encode a grid as a 43-character base64url token
pub fn encode(grid: &Grid) -> Result<String, CodecError> {
    Ok(URL_SAFE_NO_PAD.encode(encode_bytes(grid)?))
}

/// Normalize a token to padded base64url text.
///
/// Accepts either base64 alphabet, existing padding and surrounding
/// whitespace. A final lone character carries fewer than 8 bits and is
/// dropped, which is what truncation mid-byte looks like.
fn normalize(token: &str) -> String {
    let mut text: String = token
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    if text.len() % 4 == 1 {
        text.pop();
    }
    while text.len() % 4 != 0 {
        text.push('=');
    }
    text
}

/// Decode a token into a grid of the given shape
pub fn try_decode(token: &str, rows: usize, cols: usize) -> Result<Grid, CodecError> {
    let bytes = LENIENT
        .decode(normalize(token))
        .map_err(|e| CodecError::InvalidToken(e.to_string()))?;
    Ok(decode_bytes(&bytes, rows, cols))
}

/// Decode a token into a grid of the given shape. Never fails: a
/// malformed token gives an all-off grid.
pub fn decode_for(token: &str, rows: usize, cols: usize) -> Grid {
    try_decode(token, rows, cols).unwrap_or_else(|e| {
        log::warn!("{}, starting from an empty grid", e);
        Grid::new(rows, cols)
    })
}

/// Decode a token into the canonical 16x16 grid
pub fn decode(token: &str) -> Grid {
    decode_for(token, CANONICAL_ROWS, CANONICAL_COLS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Grid {
        let mut grid = Grid::new(16, 16);
        for i in 0..16 {
            grid.set(i, i, true).unwrap();
            grid.set(i, (i * 7 + 3) % 16, true).unwrap();
        }
        grid.set(0, 15, true).unwrap();
        grid.set(15, 0, true).unwrap();
        grid
    }

    #[test]
    fn test_all_off_token() {
        let token = encode(&Grid::new(16, 16)).unwrap();
        assert_eq!(token.len(), 43);
        assert!(token.chars().all(|c| c == 'A'));

        let grid = decode(&token);
        assert_eq!(grid.dimensions(), (16, 16));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_grid_round_trip() {
        let grid = pattern();
        let token = encode(&grid).unwrap();
        assert_eq!(decode(&token), grid);
        assert!(!token.contains('='));
        assert!(!token.contains('+') && !token.contains('/'));
    }

    #[test]
    fn test_bit_order_is_row_major_lsb_first() {
        let mut grid = Grid::new(16, 16);
        grid.set(0, 0, true).unwrap();
        grid.set(0, 9, true).unwrap();
        grid.set(1, 0, true).unwrap();
        let bytes = encode_bytes(&grid).unwrap();
        assert_eq!(bytes[0], 0b0000_0001);
        assert_eq!(bytes[1], 0b0000_0010);
        assert_eq!(bytes[2], 0b0000_0001);
        assert!(bytes[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_buffer_round_trip_is_stable() {
        let bytes: Vec<u8> = (0..TOKEN_BYTES as u8).map(|i| i.wrapping_mul(37) ^ 0x5a).collect();
        let token = URL_SAFE_NO_PAD.encode(&bytes);
        assert_eq!(encode(&decode(&token)).unwrap(), token);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(encode(&pattern()).unwrap(), encode(&pattern()).unwrap());
    }

    #[test]
    fn test_truncated_token_fills_with_off() {
        let grid = pattern();
        let token = encode(&grid).unwrap();
        // Keep the first 8 bytes (rows 0-3)
        let truncated = &token[..11];
        let decoded = decode(truncated);
        for row in 0..16 {
            for col in 0..16 {
                let expected = if row < 4 { grid.get(row, col) } else { false };
                assert_eq!(decoded.get(row, col), expected, "cell ({}, {})", row, col);
            }
        }
    }

    #[test]
    fn test_excess_bytes_ignored() {
        let mut bytes = encode_bytes(&pattern()).unwrap().to_vec();
        bytes.extend_from_slice(&[0xff; 8]);
        let token = URL_SAFE_NO_PAD.encode(&bytes);
        assert_eq!(decode(&token), pattern());
    }

    #[test]
    fn test_padding_and_standard_alphabet_accepted() {
        let grid = pattern();
        let token = encode(&grid).unwrap();
        let padded = format!("  {}=  ", token);
        assert_eq!(try_decode(&padded, 16, 16).unwrap(), grid);

        let standard = token.replace('-', "+").replace('_', "/");
        assert_eq!(try_decode(&standard, 16, 16).unwrap(), grid);
    }

    #[test]
    fn test_malformed_token_degrades_to_empty() {
        assert!(try_decode("not a token!", 16, 16).is_err());
        let grid = decode("not a token!");
        assert!(grid.is_empty());
        assert_eq!(grid.dimensions(), (16, 16));
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_small_grids_use_the_same_layout() {
        let mut grid = Grid::new(2, 8);
        grid.set(1, 3, true).unwrap();
        let token = encode(&grid).unwrap();
        assert_eq!(decode_for(&token, 2, 8), grid);
        assert_eq!(encode_bytes(&grid).unwrap()[1], 0b0000_1000);
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let err = encode(&Grid::new(17, 16)).unwrap_err();
        assert_eq!(
            err,
            CodecError::GridTooLarge {
                cells: 272,
                capacity: 256
            }
        );
    }
}
