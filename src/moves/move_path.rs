//! Move representation: an ordered landing path plus the captured squares.
//!
//! A path of length 2 with no captures is a simple move; anything longer, or
//! any non-empty capture list, is a (possibly multi-jump) capture sequence.
//! A `Move` is only meaningful relative to the position it was generated
//! from; it is not portable across positions.

use crate::game_state::types::Square;
use crate::utils::algebraic::square_to_algebraic;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    /// Visited squares in order: origin, intermediate landings, destination.
    pub path: Vec<Square>,
    /// Captured-piece squares in jump order.
    pub captured: Vec<Square>,
}

impl Move {
    pub fn simple(from: Square, to: Square) -> Self {
        Self {
            path: vec![from, to],
            captured: Vec::new(),
        }
    }

    pub fn capture(path: Vec<Square>, captured: Vec<Square>) -> Self {
        debug_assert!(path.len() >= 2);
        debug_assert_eq!(path.len() - 1, captured.len());
        Self { path, captured }
    }

    #[inline]
    pub fn origin(&self) -> Square {
        self.path[0]
    }

    #[inline]
    pub fn destination(&self) -> Square {
        *self.path.last().expect("move path is never empty")
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }

    #[inline]
    pub fn capture_count(&self) -> usize {
        self.captured.len()
    }

    /// `(origin, destination)` pair used by the killer and history tables.
    #[inline]
    pub fn key(&self) -> (Square, Square) {
        (self.origin(), self.destination())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_capture() { "x" } else { "-" };
        let mut first = true;
        for &sq in &self.path {
            if !first {
                f.write_str(sep)?;
            }
            first = false;
            match square_to_algebraic(sq) {
                Ok(alg) => f.write_str(&alg)?,
                Err(_) => write!(f, "?{sq}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Move;

    #[test]
    fn simple_and_capture_classification() {
        let simple = Move::simple(20, 16);
        assert!(!simple.is_capture());
        assert_eq!(simple.key(), (20, 16));

        let capture = Move::capture(vec![20, 13], vec![16]);
        assert!(capture.is_capture());
        assert_eq!(capture.capture_count(), 1);
        assert_eq!(capture.origin(), 20);
        assert_eq!(capture.destination(), 13);
    }

    #[test]
    fn display_uses_jump_separator_for_captures() {
        // Square 20 = (5, 0) = a3; square 13 = (3, 2) = c5.
        assert_eq!(Move::simple(20, 16).to_string(), "a3-b4");
        assert_eq!(Move::capture(vec![20, 13], vec![16]).to_string(), "a3xc5");
    }
}
