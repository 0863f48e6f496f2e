//! Square and move conversions for algebraic coordinates.
//!
//! Converts between human-readable coordinates (e.g., `b6`) and internal
//! dark-square indices reused by display, logging, and test tooling. Row 0
//! of the internal indexing is rank 8; files run `a..=h` left to right.

use crate::game_state::board_geometry::{col_of, row_of, square_at, BOARD_SIZE};
use crate::game_state::types::Square;

/// Convert algebraic notation (for example: "b6") to a dark-square index.
#[inline]
pub fn algebraic_to_square(square: &str) -> Result<Square, String> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(format!("Invalid algebraic square: {square}"));
    }

    let file = bytes[0];
    let rank = bytes[1];

    if !(b'a'..=b'h').contains(&file) {
        return Err(format!("Invalid algebraic file: {}", file as char));
    }
    if !(b'1'..=b'8').contains(&rank) {
        return Err(format!("Invalid algebraic rank: {}", rank as char));
    }

    let col = (file - b'a') as i8;
    let row = (BOARD_SIZE - 1 - (rank - b'1')) as i8;
    square_at(row, col).ok_or_else(|| format!("Square is not playable: {square}"))
}

/// Convert a dark-square index (`0..=31`) to algebraic notation.
#[inline]
pub fn square_to_algebraic(square: Square) -> Result<String, String> {
    if square > 31 {
        return Err(format!("Square index out of bounds: {square}"));
    }

    let file_char = char::from(b'a' + col_of(square));
    let rank_char = char::from(b'1' + (BOARD_SIZE - 1 - row_of(square)));
    Ok(format!("{file_char}{rank_char}"))
}

#[cfg(test)]
mod tests {
    use super::{algebraic_to_square, square_to_algebraic};

    #[test]
    fn round_trip_square_conversions() {
        // Square 0 is (row 0, col 1) = b8; square 31 is (row 7, col 6) = g1.
        assert_eq!(square_to_algebraic(0).expect("0 should convert"), "b8");
        assert_eq!(square_to_algebraic(31).expect("31 should convert"), "g1");
        assert_eq!(algebraic_to_square("b8").expect("b8 should parse"), 0);
        assert_eq!(algebraic_to_square("g1").expect("g1 should parse"), 31);

        for sq in 0u8..32 {
            let alg = square_to_algebraic(sq).expect("in range");
            assert_eq!(algebraic_to_square(&alg).expect("round trip"), sq);
        }
    }

    #[test]
    fn rejects_light_squares_and_garbage() {
        assert!(algebraic_to_square("a8").is_err());
        assert!(algebraic_to_square("h1").is_err());
        assert!(algebraic_to_square("i3").is_err());
        assert!(algebraic_to_square("b9").is_err());
        assert!(algebraic_to_square("b").is_err());
    }
}
