//! Match control: turn state machine, combo continuation, and terminal
//! detection on top of the rules core.
//!
//! A session accepts moves only from its current legal set. A capture whose
//! landing square still has capture continuations keeps the same side to
//! move in a forced combo; a promotion ends the turn immediately regardless
//! of remaining combo potential. A side with no legal moves loses, and the
//! 40-move no-progress counter draws the game.

use std::error::Error;
use std::fmt;

use crate::game_state::position::Position;
use crate::game_state::types::{Color, Square, DRAW_MOVE_THRESHOLD};
use crate::move_generation::apply::{make_combo_step_in_place, make_move_in_place};
use crate::move_generation::generator::{capture_sequences_from, legal_moves};
use crate::moves::move_path::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    WonBy(Color),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// The side to move picks from its full legal set.
    Normal,
    /// Mid-combo: the same side must keep capturing from this square.
    ForcedCombo { from: Square },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The supplied move is not in the current legal set. Recoverable: the
    /// caller should re-query `legal_moves` and pick again.
    InvalidMove(Move),
    /// The game already ended.
    GameOver,
    /// Board-level failure while applying a validated move. Indicates a
    /// logic defect, not a caller mistake.
    Internal(String),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::InvalidMove(mv) => write!(f, "move {mv} is not legal here"),
            MatchError::GameOver => write!(f, "the game is already over"),
            MatchError::Internal(msg) => write!(f, "internal match error: {msg}"),
        }
    }
}

impl Error for MatchError {}

#[derive(Debug, Clone)]
pub struct MatchSession {
    position: Position,
    phase: TurnPhase,
    legal: Vec<Move>,
    status: GameStatus,
    total_moves: u32,
}

impl Default for MatchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchSession {
    pub fn new() -> Self {
        Self::from_position(Position::new_game())
    }

    pub fn from_position(position: Position) -> Self {
        let mut session = Self {
            position,
            phase: TurnPhase::Normal,
            legal: Vec::new(),
            status: GameStatus::Ongoing,
            total_moves: 0,
        };
        session.refresh_legal_set();
        session
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    #[inline]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[inline]
    pub fn total_moves(&self) -> u32 {
        self.total_moves
    }

    /// Legal moves for the side to move: the full set in `Normal` phase, the
    /// mandatory continuations mid-combo.
    #[inline]
    pub fn legal_moves(&self) -> &[Move] {
        &self.legal
    }

    /// Apply one move from the current legal set.
    pub fn play(&mut self, mv: &Move) -> Result<GameStatus, MatchError> {
        if self.status != GameStatus::Ongoing {
            return Err(MatchError::GameOver);
        }
        if !self.legal.contains(mv) {
            return Err(MatchError::InvalidMove(mv.clone()));
        }

        let mover = self.position.side_to_move;
        let was_man = self
            .position
            .piece_at(mv.origin())
            .map(|(_, kind)| kind == crate::game_state::types::PieceKind::Man)
            .unwrap_or(false);
        let promotes =
            was_man && Position::is_promotion_square(mover, mv.destination());

        // A capture that neither promotes nor exhausts the combo keeps the
        // turn; everything else hands it over.
        if mv.is_capture() && !promotes {
            make_combo_step_in_place(&mut self.position, mv)
                .map_err(MatchError::Internal)?;
            let continuations =
                capture_sequences_from(&self.position, mover, mv.destination());
            if !continuations.is_empty() {
                self.phase = TurnPhase::ForcedCombo {
                    from: mv.destination(),
                };
                self.legal = continuations;
                self.total_moves += 1;
                return Ok(self.status);
            }
            // Combo exhausted: hand the turn over now.
            self.position.switch_side();
            self.expire_promotion_markers();
        } else {
            make_move_in_place(&mut self.position, mv).map_err(MatchError::Internal)?;
        }

        self.total_moves += 1;
        self.phase = TurnPhase::Normal;
        self.refresh_legal_set();
        Ok(self.status)
    }

    fn expire_promotion_markers(&mut self) {
        let expiring =
            self.position.just_promoted & self.position.occupancy_of(self.position.side_to_move);
        if expiring != 0 {
            let mask = self.position.just_promoted & !expiring;
            self.position.set_just_promoted_mask(mask);
        }
    }

    fn refresh_legal_set(&mut self) {
        if self.status != GameStatus::Ongoing {
            self.legal.clear();
            return;
        }
        if self.position.no_progress >= DRAW_MOVE_THRESHOLD {
            self.status = GameStatus::Draw;
            self.legal.clear();
            return;
        }
        let side = self.position.side_to_move;
        self.legal = legal_moves(&self.position, side);
        if self.legal.is_empty() {
            // No pieces or no playable move: the side to move loses.
            self.status = GameStatus::WonBy(side.opposite());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GameStatus, MatchError, MatchSession, TurnPhase};
    use crate::game_state::position::Position;
    use crate::game_state::types::{Color, PieceKind};
    use crate::moves::move_path::Move;
    use crate::utils::algebraic::algebraic_to_square;

    fn session_with(pieces: &[(&str, Color, PieceKind)], to_move: Color) -> MatchSession {
        let mut position = Position::new_empty();
        for &(alg, color, kind) in pieces {
            let sq = algebraic_to_square(alg).expect("test square");
            position.put_piece(sq, color, kind).expect("empty board square");
        }
        if position.side_to_move != to_move {
            position.side_to_move = to_move;
        }
        crate::search::zobrist::refresh_position_hash(&mut position);
        MatchSession::from_position(position)
    }

    #[test]
    fn fresh_game_starts_in_normal_phase() {
        let session = MatchSession::new();
        assert_eq!(session.status(), GameStatus::Ongoing);
        assert_eq!(session.phase(), TurnPhase::Normal);
        assert_eq!(session.legal_moves().len(), 7);
        assert_eq!(session.side_to_move(), Color::White);
    }

    #[test]
    fn off_list_move_is_rejected_and_state_unchanged() {
        let mut session = MatchSession::new();
        let hash = session.position().zobrist_key;
        let bogus = Move::simple(20, 12);
        let err = session.play(&bogus).expect_err("bogus move must fail");
        assert!(matches!(err, MatchError::InvalidMove(_)));
        assert_eq!(session.position().zobrist_key, hash);
        assert_eq!(session.legal_moves().len(), 7);
    }

    #[test]
    fn full_capture_sequence_hands_the_turn_over() {
        let mut session = session_with(
            &[
                ("a3", Color::White, PieceKind::Man),
                ("b4", Color::Black, PieceKind::Man),
                ("d6", Color::Black, PieceKind::Man),
                ("h8", Color::Black, PieceKind::King),
            ],
            Color::White,
        );
        let mv = session.legal_moves()[0].clone();
        assert_eq!(mv.capture_count(), 2);
        session.play(&mv).expect("forced capture plays");
        assert_eq!(session.phase(), TurnPhase::Normal);
        assert_eq!(session.side_to_move(), Color::Black);
    }

    #[test]
    fn reopened_ray_forces_a_combo_continuation() {
        // The white king takes d4 landing on c3. During the sequence the
        // NE ray back out is dead, but removing the victim opens it: g7
        // becomes capturable from c3, so the turn stays with White.
        let mut session = session_with(
            &[
                ("f6", Color::White, PieceKind::King),
                ("d4", Color::Black, PieceKind::Man),
                ("g7", Color::Black, PieceKind::Man),
                ("h2", Color::Black, PieceKind::King),
            ],
            Color::White,
        );
        let c3 = algebraic_to_square("c3").expect("c3");
        let first = session
            .legal_moves()
            .iter()
            .find(|m| m.destination() == c3)
            .expect("f6xc3 is among the maximal captures")
            .clone();
        session.play(&first).expect("capture plays");

        assert_eq!(session.phase(), TurnPhase::ForcedCombo { from: c3 });
        assert_eq!(session.side_to_move(), Color::White);
        let continuation = session.legal_moves()[0].clone();
        assert!(continuation.is_capture());
        assert_eq!(continuation.origin(), c3);

        session.play(&continuation).expect("continuation plays");
        assert_eq!(session.phase(), TurnPhase::Normal);
        assert_eq!(session.side_to_move(), Color::Black);
        assert_eq!(session.status(), GameStatus::Ongoing);
    }

    #[test]
    fn promotion_ends_the_turn_despite_combo_potential() {
        // White man jumps onto the back rank; a further victim is in reach
        // from there, but the promotion ends the turn at once.
        let mut session = session_with(
            &[
                ("b6", Color::White, PieceKind::Man),
                ("c7", Color::Black, PieceKind::Man),
                ("e7", Color::Black, PieceKind::Man),
                ("h2", Color::Black, PieceKind::King),
            ],
            Color::White,
        );
        let mv = session.legal_moves()[0].clone();
        assert!(mv.is_capture());
        session.play(&mv).expect("promoting capture plays");
        assert_eq!(session.side_to_move(), Color::Black);
        assert_eq!(session.phase(), TurnPhase::Normal);
        let promoted = session.position().piece_at(mv.destination());
        assert_eq!(promoted, Some((Color::White, PieceKind::King)));
    }

    #[test]
    fn side_without_moves_loses() {
        let session = session_with(
            &[
                ("a7", Color::White, PieceKind::Man),
                ("b8", Color::Black, PieceKind::King),
            ],
            Color::White,
        );
        assert_eq!(session.status(), GameStatus::WonBy(Color::Black));
        assert!(session.legal_moves().is_empty());
    }

    #[test]
    fn capturing_everything_wins() {
        let mut session = session_with(
            &[
                ("b4", Color::White, PieceKind::Man),
                ("c5", Color::Black, PieceKind::Man),
            ],
            Color::White,
        );
        let mv = session.legal_moves()[0].clone();
        session.play(&mv).expect("capture plays");
        assert_eq!(session.status(), GameStatus::WonBy(Color::White));
    }

    #[test]
    fn forty_quiet_king_moves_draw_the_game() {
        // Each king oscillates between two squares on diagonals the other
        // king never shares, so no capture ever interrupts the count.
        let mut session = session_with(
            &[
                ("a1", Color::White, PieceKind::King),
                ("h4", Color::Black, PieceKind::King),
            ],
            Color::White,
        );
        let white_pair = (
            algebraic_to_square("a1").expect("a1"),
            algebraic_to_square("b2").expect("b2"),
        );
        let black_pair = (
            algebraic_to_square("h4").expect("h4"),
            algebraic_to_square("g5").expect("g5"),
        );

        let mut shuffles = 0u32;
        while session.status() == GameStatus::Ongoing {
            let (a, b) = if session.side_to_move() == Color::White {
                white_pair
            } else {
                black_pair
            };
            let origin = if session.position().piece_at(a).is_some() { a } else { b };
            let dest = if origin == a { b } else { a };
            let mv = session
                .legal_moves()
                .iter()
                .find(|m| m.origin() == origin && m.destination() == dest)
                .expect("oscillation step stays legal")
                .clone();
            session.play(&mv).expect("quiet king move plays");
            shuffles += 1;
            assert!(shuffles <= 100, "draw rule must fire");
        }

        assert_eq!(session.status(), GameStatus::Draw);
        assert_eq!(session.position().no_progress, 40);
        assert_eq!(shuffles, 40);
    }
}
