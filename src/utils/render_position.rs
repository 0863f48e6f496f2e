//! Terminal-oriented board renderer.
//!
//! Creates a human-readable board view from the internal bitboards for
//! debugging, tests, and diagnostics in text environments. Men render as
//! lowercase, kings as uppercase; light squares as spaces, empty dark
//! squares as dots.

use crate::game_state::board_geometry::square_at;
use crate::game_state::position::Position;
use crate::game_state::types::{Color, PieceKind};

pub fn render_position(position: &Position) -> String {
    let mut out = String::new();

    out.push_str("  a b c d e f g h\n");

    for row in 0..8i8 {
        let rank = 8 - row;
        out.push_str(&format!("{rank} "));

        for col in 0..8i8 {
            match square_at(row, col) {
                None => out.push(' '),
                Some(sq) => out.push(match position.piece_at(sq) {
                    None => '.',
                    Some((Color::White, PieceKind::Man)) => 'w',
                    Some((Color::White, PieceKind::King)) => 'W',
                    Some((Color::Black, PieceKind::Man)) => 'b',
                    Some((Color::Black, PieceKind::King)) => 'B',
                }),
            }
            if col < 7 {
                out.push(' ');
            }
        }

        out.push_str(&format!(" {rank}\n"));
    }

    out.push_str("  a b c d e f g h");
    out
}

#[cfg(test)]
mod tests {
    use super::render_position;
    use crate::game_state::position::Position;

    #[test]
    fn startpos_renders_both_camps() {
        let rendered = render_position(&Position::new_game());
        assert_eq!(rendered.matches('w').count(), 12);
        assert_eq!(rendered.matches('b').count(), 12);
        assert!(rendered.starts_with("  a b c d e f g h"));
        // Rank 8 line carries black men on the dark squares.
        let rank8 = rendered.lines().nth(1).expect("rank 8 line");
        assert!(rank8.contains('b'));
        assert!(!rank8.contains('w'));
    }
}
