//! Zobrist hashing support for fast position identity.
//!
//! The keys are generated from a fixed seed so hashes are deterministic
//! across runs, which is useful for testing and debugging. Besides the usual
//! per-(color, kind, square) occupancy keys and the side-to-move toggle,
//! each square carries a "just promoted" key so positions that differ only
//! in the promotion-deferral marker hash differently.

use std::sync::OnceLock;

use crate::game_state::position::Position;
use crate::game_state::types::{Color, PieceKind, Square, SQUARE_COUNT};

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; SQUARE_COUNT]; 2]; 2],
    side_to_move: u64,
    just_promoted: [u64; SQUARE_COUNT],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;

    let mut piece_square = [[[0u64; SQUARE_COUNT]; 2]; 2];
    for color in &mut piece_square {
        for kind in color {
            for sq in kind {
                *sq = next_random_u64(&mut seed);
            }
        }
    }

    let side_to_move = next_random_u64(&mut seed);

    let mut just_promoted = [0u64; SQUARE_COUNT];
    for key in &mut just_promoted {
        *key = next_random_u64(&mut seed);
    }

    ZobristTables {
        piece_square,
        side_to_move,
        just_promoted,
    }
}

#[inline]
fn next_random_u64(state: &mut u64) -> u64 {
    // splitmix64
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Return the Zobrist key for a `(color, kind, square)` occupancy term.
#[inline]
pub fn piece_square_key(color: Color, kind: PieceKind, square: Square) -> u64 {
    tables().piece_square[color.index()][kind.index()][square as usize]
}

/// Return the side-to-move toggle key (xor in when Black is to move).
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// Return the key marking `square` as holding a just-promoted king.
#[inline]
pub fn just_promoted_key(square: Square) -> u64 {
    tables().just_promoted[square as usize]
}

/// Compute the full position Zobrist key from scratch.
pub fn compute_zobrist_key(position: &Position) -> u64 {
    let mut key = 0u64;

    for color in [Color::White, Color::Black] {
        for kind in [PieceKind::Man, PieceKind::King] {
            let mut bb = position.pieces(color, kind);
            while bb != 0 {
                let sq = bb.trailing_zeros() as Square;
                key ^= piece_square_key(color, kind, sq);
                bb &= bb - 1;
            }
        }
    }

    if position.side_to_move == Color::Black {
        key ^= side_to_move_key();
    }

    let mut promoted = position.just_promoted;
    while promoted != 0 {
        let sq = promoted.trailing_zeros() as Square;
        key ^= just_promoted_key(sq);
        promoted &= promoted - 1;
    }

    key
}

/// Recompute and store the incremental hash field on the provided position.
#[inline]
pub fn refresh_position_hash(position: &mut Position) {
    position.zobrist_key = compute_zobrist_key(position);
}
