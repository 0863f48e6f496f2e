//! Pluggable board evaluation interfaces and baseline implementations.
//!
//! Search remains modular by delegating static position scoring to this
//! trait, allowing alternate heuristics to be swapped without altering search
//! code. Scores are integer centi-man units: a man is 100, a king 300.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::game_state::board_geometry::{col_of, neighbor, row_of, square_at, BOARD_SIZE};
use crate::game_state::position::Position;
use crate::game_state::types::{Color, PieceKind, Square};
use crate::move_generation::apply::apply_move;
use crate::move_generation::generator::capture_moves;

pub trait BoardScorer: Send + Sync {
    /// Score from the perspective of the side to move.
    fn score(&self, position: &Position) -> i32;
}

/// Plain material count, used as a deterministic baseline and in search
/// soundness tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl MaterialScorer {
    #[inline]
    pub const fn piece_value(kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Man => 100,
            PieceKind::King => 300,
        }
    }

    #[inline]
    fn material_for(position: &Position, color: Color) -> i32 {
        (position.pieces(color, PieceKind::Man).count_ones() as i32)
            * Self::piece_value(PieceKind::Man)
            + (position.pieces(color, PieceKind::King).count_ones() as i32)
                * Self::piece_value(PieceKind::King)
    }
}

impl BoardScorer for MaterialScorer {
    fn score(&self, position: &Position) -> i32 {
        let us = position.side_to_move;
        Self::material_for(position, us) - Self::material_for(position, us.opposite())
    }
}

/// Explicit, immutable tuning object handed to the scorer at construction.
#[derive(Debug, Clone, Copy)]
pub struct EvalWeights {
    pub man_value: i32,
    pub king_value: i32,
    pub advance_per_row: i32,
    pub lagging_man_penalty: i32,
    pub center_man: i32,
    pub center_king: i32,
    pub back_rank_safety: i32,
    pub near_promotion: i32,
    pub edge_king_penalty: i32,
    pub king_mobility: i32,
    pub man_mobility: i32,
    pub vulnerable_penalty: i32,
    pub protected_bonus: i32,
    pub connected_pair: i32,
    pub blockade_bonus: i32,
    pub bridge_bonus: i32,
    pub lance_bonus: i32,
    pub wall_bonus: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            man_value: 100,
            king_value: 300,
            advance_per_row: 1,
            lagging_man_penalty: -2,
            center_man: 2,
            center_king: 4,
            back_rank_safety: 1,
            near_promotion: 4,
            edge_king_penalty: -1,
            king_mobility: 2,
            man_mobility: 1,
            vulnerable_penalty: -2,
            protected_bonus: 4,
            connected_pair: 2,
            blockade_bonus: 2,
            bridge_bonus: 3,
            lance_bonus: 2,
            wall_bonus: 4,
        }
    }
}

// Piece-square tables indexed [relative row][col], where relative row 0 is
// the side's promotion row. Both tables favor the center.
#[rustfmt::skip]
const MAN_PSQT: [[i32; 8]; 8] = [
    [0, 0, 0,  0,  0, 0, 0, 0],
    [0, 4, 4,  4,  4, 4, 4, 0],
    [0, 4, 7,  7,  7, 7, 4, 0],
    [0, 4, 7, 11, 11, 7, 4, 0],
    [0, 4, 7, 11, 11, 7, 4, 0],
    [0, 4, 7,  7,  7, 7, 4, 0],
    [0, 4, 4,  4,  4, 4, 4, 0],
    [0, 0, 0,  0,  0, 0, 0, 0],
];

#[rustfmt::skip]
const KING_PSQT: [[i32; 8]; 8] = [
    [ 0, 11, 11, 11, 11, 11, 11,  0],
    [11, 21, 21, 21, 21, 21, 21, 11],
    [11, 21, 32, 32, 32, 32, 21, 11],
    [11, 21, 32, 42, 42, 32, 21, 11],
    [11, 21, 32, 42, 42, 32, 21, 11],
    [11, 21, 32, 32, 32, 32, 21, 11],
    [11, 21, 21, 21, 21, 21, 21, 11],
    [ 0, 11, 11, 11, 11, 11, 11,  0],
];

// Expanded central dark squares, matching the classical "strong center".
const CENTER_MASK: u32 = (1 << 8)
    | (1 << 9)
    | (1 << 10)
    | (1 << 13)
    | (1 << 14)
    | (1 << 17)
    | (1 << 18)
    | (1 << 21)
    | (1 << 22)
    | (1 << 23);

/// One-ply tactical summary for one defending side, cached per position.
#[derive(Debug, Clone, Copy, Default)]
struct ThreatInfo {
    /// Squares of the defender capturable by an immediate legal capture.
    vulnerable: u32,
    /// Vulnerable squares whose every capture is answered by a recapture of
    /// the capturing piece.
    protected: u32,
    /// Material value of the attacker's best immediate capture sequence.
    best_capture_value: i32,
}

#[derive(Debug, Default)]
struct ThreatCache {
    map: Mutex<HashMap<(u64, u8), ThreatInfo>>,
}

impl ThreatCache {
    const CAPACITY: usize = 1 << 16;

    fn get(&self, key: (u64, u8)) -> Option<ThreatInfo> {
        self.map.lock().expect("threat cache poisoned").get(&key).copied()
    }

    fn insert(&self, key: (u64, u8), info: ThreatInfo) {
        let mut map = self.map.lock().expect("threat cache poisoned");
        if map.len() >= Self::CAPACITY {
            map.clear();
        }
        map.insert(key, info);
    }
}

/// Full heuristic scorer: material, piece-square tables, mobility, safety,
/// formations, and an immediate-tactics penalty. Never mutates the position
/// it scores; tactical lookups run on scratch clones and are cached by
/// position hash.
#[derive(Debug, Default)]
pub struct PositionalScorer {
    weights: EvalWeights,
    threats: ThreatCache,
}

impl PositionalScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: EvalWeights) -> Self {
        Self {
            weights,
            threats: ThreatCache::default(),
        }
    }

    #[inline]
    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// Deterministic, symmetric side-parameterized score:
    /// `score_for(p, a) == -score_for(p, b)`.
    pub fn score_for(&self, position: &Position, color: Color) -> i32 {
        let own_threat = self.threat_info(position, color);
        let opp_threat = self.threat_info(position, color.opposite());
        self.side_total(position, color, &own_threat)
            - self.side_total(position, color.opposite(), &opp_threat)
    }

    fn piece_value(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Man => self.weights.man_value,
            PieceKind::King => self.weights.king_value,
        }
    }

    fn side_total(&self, position: &Position, color: Color, threat: &ThreatInfo) -> i32 {
        let w = &self.weights;
        let occ = position.occupancy_all();
        let own = position.occupancy_of(color);
        let mut total = 0i32;

        let mut men = position.pieces(color, PieceKind::Man);
        while men != 0 {
            let sq = men.trailing_zeros() as Square;
            men &= men - 1;
            let (row, col) = (row_of(sq), col_of(sq));
            let rel_row = relative_row(color, row) as usize;

            total += w.man_value;
            total += MAN_PSQT[rel_row][col as usize];
            total += (7 - rel_row as i32) * w.advance_per_row;
            if CENTER_MASK & (1 << sq) != 0 {
                total += w.center_man;
            }
            if rel_row == 7 {
                total += w.back_rank_safety;
            }
            if rel_row == 6 {
                total += w.lagging_man_penalty;
            }

            let vulnerable = threat.vulnerable & (1 << sq) != 0;
            if rel_row == 1 && !vulnerable {
                total += w.near_promotion;
            }
            if vulnerable {
                total += w.vulnerable_penalty;
                if threat.protected & (1 << sq) != 0 {
                    total += w.protected_bonus;
                }
            }

            for dir in forward_dirs(color) {
                if let Some(dest) = neighbor(sq, dir) {
                    if occ & (1 << dest) == 0 {
                        total += w.man_mobility;
                    }
                }
            }

            if has_connected_neighbor(own, sq) {
                total += w.connected_pair;
            }
            let blocking = blocks_enemy_advance(position, color, sq);
            if blocking {
                total += w.blockade_bonus;
                if in_wall(own, sq) {
                    total += w.wall_bonus;
                }
            }
            if in_bridge(own, color, sq) {
                total += w.bridge_bonus;
            }
            if in_lance(position, own, color, sq) {
                total += w.lance_bonus;
            }
        }

        let mut kings = position.pieces(color, PieceKind::King);
        while kings != 0 {
            let sq = kings.trailing_zeros() as Square;
            kings &= kings - 1;
            let (row, col) = (row_of(sq), col_of(sq));
            let rel_row = relative_row(color, row) as usize;

            total += w.king_value;
            total += KING_PSQT[rel_row][col as usize];
            if CENTER_MASK & (1 << sq) != 0 {
                total += w.center_king;
            }
            if row == 0 || row == 7 || col == 0 || col == 7 {
                total += w.edge_king_penalty;
            }

            let mut mobility = 0i32;
            for dir in 0..4 {
                if let Some(dest) = neighbor(sq, dir) {
                    if occ & (1 << dest) == 0 {
                        mobility += 1;
                    }
                }
            }
            total += mobility * w.king_mobility;

            let vulnerable = threat.vulnerable & (1 << sq) != 0;
            if vulnerable {
                total += w.vulnerable_penalty;
                if threat.protected & (1 << sq) != 0 {
                    total += w.protected_bonus;
                }
            }
            if has_connected_neighbor(own, sq) {
                total += w.connected_pair;
            }
        }

        // Immediate-tactics penalty: the best capture the opponent could
        // execute right away against this side.
        total -= threat.best_capture_value;

        total
    }

    /// Cached one-ply capture analysis against `defender`.
    fn threat_info(&self, position: &Position, defender: Color) -> ThreatInfo {
        let key = (position.zobrist_key, defender.index() as u8);
        if let Some(hit) = self.threats.get(key) {
            return hit;
        }
        let info = self.compute_threat_info(position, defender);
        self.threats.insert(key, info);
        info
    }

    fn compute_threat_info(&self, position: &Position, defender: Color) -> ThreatInfo {
        let attacker = defender.opposite();
        let captures = capture_moves(position, attacker);
        if captures.is_empty() {
            return ThreatInfo::default();
        }

        // Scratch board with the attacker to move, so the capture replay is
        // legal regardless of whose turn the scored position is.
        let mut scratch = position.clone();
        if scratch.side_to_move != attacker {
            scratch.switch_side();
        }

        let mut info = ThreatInfo::default();
        // Squares taken by some capture but answered in every line.
        let mut answered_everywhere = u32::MAX;

        for capture in &captures {
            let mut value = 0i32;
            let mut taken = 0u32;
            for &sq in &capture.captured {
                taken |= 1 << sq;
                if let Some((_, kind)) = position.piece_at(sq) {
                    value += self.piece_value(kind);
                }
            }
            info.vulnerable |= taken;
            info.best_capture_value = info.best_capture_value.max(value);

            let answered = apply_move(&scratch, capture)
                .map(|after| {
                    let lander = capture.destination();
                    capture_moves(&after, defender)
                        .iter()
                        .any(|reply| reply.captured.contains(&lander))
                })
                .unwrap_or(false);
            if !answered {
                answered_everywhere &= !taken;
            }
        }

        info.protected = info.vulnerable & answered_everywhere;
        info
    }
}

impl BoardScorer for PositionalScorer {
    fn score(&self, position: &Position) -> i32 {
        self.score_for(position, position.side_to_move)
    }
}

#[inline]
fn relative_row(color: Color, row: u8) -> u8 {
    match color {
        Color::White => row,
        Color::Black => BOARD_SIZE - 1 - row,
    }
}

#[inline]
fn forward_dirs(color: Color) -> [usize; 2] {
    match color {
        Color::White => [0, 1],
        Color::Black => [2, 3],
    }
}

#[inline]
fn has_connected_neighbor(own: u32, sq: Square) -> bool {
    (0..4).any(|dir| neighbor(sq, dir).is_some_and(|n| own & (1 << n) != 0))
}

/// True when an enemy man one diagonal step "upstream" would advance onto
/// this square.
fn blocks_enemy_advance(position: &Position, color: Color, sq: Square) -> bool {
    let enemy_men = position.pieces(color.opposite(), PieceKind::Man);
    let enemy_forward = color.opposite().forward();
    let (row, col) = (row_of(sq) as i8, col_of(sq) as i8);
    for dc in [-1, 1] {
        if let Some(from) = square_at(row - enemy_forward, col + dc) {
            if enemy_men & (1 << from) != 0 {
                return true;
            }
        }
    }
    false
}

/// Three or more friendly pieces on the same row at two-column intervals.
fn in_wall(own: u32, sq: Square) -> bool {
    let (row, col) = (row_of(sq) as i8, col_of(sq) as i8);
    let mut count = 1;
    for step in [-2i8, 2] {
        let mut c = col + step;
        while let Some(next) = square_at(row, c) {
            if own & (1 << next) == 0 {
                break;
            }
            count += 1;
            c += step;
        }
    }
    count >= 3
}

/// Classical bridge: a same-row partner two files away with a supporter on
/// the diagonal behind the gap.
fn in_bridge(own: u32, color: Color, sq: Square) -> bool {
    let (row, col) = (row_of(sq) as i8, col_of(sq) as i8);
    let behind = -color.forward();
    for dc in [-2i8, 2] {
        let partner = square_at(row, col + dc);
        let supporter = square_at(row + behind, col + dc / 2);
        if let (Some(p), Some(s)) = (partner, supporter) {
            if own & (1 << p) != 0 && own & (1 << s) != 0 {
                return true;
            }
        }
    }
    false
}

/// Classical lance: a friendly piece one step ahead on a diagonal with the
/// square straight ahead of the pair still open.
fn in_lance(position: &Position, own: u32, color: Color, sq: Square) -> bool {
    let (row, col) = (row_of(sq) as i8, col_of(sq) as i8);
    let f = color.forward();
    for dc in [-1i8, 1] {
        let tip = square_at(row + f, col + dc);
        let ahead = square_at(row + 2 * f, col);
        if let (Some(t), Some(a)) = (tip, ahead) {
            if own & (1 << t) != 0 && position.is_empty_square(a) {
                return true;
            }
        }
    }
    false
}
