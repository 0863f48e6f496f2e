//! Move application: reversible in-place make/unmake plus a clone-based
//! `apply_move` convenience.
//!
//! `make_move_in_place` pushes an `UndoRecord` so the move can be rolled back
//! in O(move size) without re-deriving state. Promotion sets the
//! just-promoted marker and the marker of the side coming to move expires as
//! soon as its opponent has replied.

use crate::game_state::position::Position;
use crate::game_state::types::PieceKind;
use crate::game_state::undo_state::UndoRecord;
use crate::moves::move_path::Move;

/// Make `mv` for the side to move, switching the turn afterwards.
pub fn make_move_in_place(position: &mut Position, mv: &Move) -> Result<(), String> {
    make_move_in_place_with(position, mv, true)
}

/// Make `mv` without handing the turn over; used for combo continuation,
/// where the same side keeps capturing from the landing square.
pub fn make_combo_step_in_place(position: &mut Position, mv: &Move) -> Result<(), String> {
    make_move_in_place_with(position, mv, false)
}

fn make_move_in_place_with(
    position: &mut Position,
    mv: &Move,
    switch_side: bool,
) -> Result<(), String> {
    if mv.path.len() < 2 {
        return Err(format!("degenerate move path: {mv}"));
    }

    let origin = mv.origin();
    let dest = mv.destination();
    let mover = position.side_to_move;

    let Some((origin_color, moved_kind)) = position.piece_at(origin) else {
        return Err(format!("no piece on origin of {mv}"));
    };
    if origin_color != mover {
        return Err(format!("moving an opposing piece with {mv}"));
    }

    // Every captured square must lie on one leg of the jump path; a
    // violation means the move was built for a different position.
    debug_assert!(
        mv.captured.iter().all(|&victim| {
            mv.path.windows(2).any(|leg| {
                crate::game_state::board_geometry::squares_between(leg[0], leg[1])
                    .contains(&victim)
            })
        }),
        "capture list does not match jump path in {mv}"
    );

    let prev_just_promoted = position.just_promoted;
    let prev_no_progress = position.no_progress;
    let prev_zobrist_key = position.zobrist_key;

    let mut captured = Vec::with_capacity(mv.captured.len());
    for &sq in &mv.captured {
        let (color, kind) = position.take_piece(sq)?;
        if color == mover {
            return Err(format!("capturing own piece with {mv}"));
        }
        captured.push((sq, color, kind));
    }

    position.move_piece(origin, dest)?;

    let mut promoted = false;
    if moved_kind == PieceKind::Man && Position::is_promotion_square(mover, dest) {
        position.take_piece(dest)?;
        position.put_piece(dest, mover, PieceKind::King)?;
        position.toggle_just_promoted(dest);
        promoted = true;
    }

    if mv.is_capture() || moved_kind == PieceKind::Man {
        position.no_progress = 0;
    } else {
        position.no_progress = position.no_progress.saturating_add(1);
    }
    position.ply = position.ply.saturating_add(1);

    if switch_side {
        position.switch_side();
        // The new mover's promotion-deferral markers expire: its opponent
        // has now replied.
        let expiring = position.just_promoted & position.occupancy_of(position.side_to_move);
        if expiring != 0 {
            position.set_just_promoted_mask(position.just_promoted & !expiring);
        }
    }

    position.undo_stack.push(UndoRecord {
        mv: mv.clone(),
        moved_kind,
        captured,
        promoted,
        switched_side: switch_side,
        prev_just_promoted,
        prev_no_progress,
        prev_zobrist_key,
    });

    debug_assert_eq!(
        position.zobrist_key,
        crate::search::zobrist::compute_zobrist_key(position),
        "incremental hash drifted while applying {mv}"
    );

    Ok(())
}

/// Roll back the most recent move made on this position.
pub fn unmake_move_in_place(position: &mut Position) -> Result<(), String> {
    let undo = position
        .undo_stack
        .pop()
        .ok_or_else(|| "unmake with an empty undo stack".to_owned())?;

    if undo.switched_side {
        position.side_to_move = position.side_to_move.opposite();
    }
    let mover = position.side_to_move;

    let dest = undo.mv.destination();
    let origin = undo.mv.origin();

    position.take_piece(dest)?;
    position.put_piece(origin, mover, undo.moved_kind)?;
    for &(sq, color, kind) in &undo.captured {
        position.put_piece(sq, color, kind)?;
    }

    // Counters and masks are restored wholesale; the hash snapshot already
    // reflects them.
    position.just_promoted = undo.prev_just_promoted;
    position.no_progress = undo.prev_no_progress;
    position.ply = position.ply.saturating_sub(1);
    position.zobrist_key = undo.prev_zobrist_key;

    Ok(())
}

/// Clone-based application returning the successor position. The returned
/// position carries the `UndoRecord` on its own undo stack.
pub fn apply_move(position: &Position, mv: &Move) -> Result<Position, String> {
    let mut next = position.clone();
    make_move_in_place(&mut next, mv)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::{apply_move, make_move_in_place, unmake_move_in_place};
    use crate::game_state::position::Position;
    use crate::game_state::types::{Color, PieceKind};
    use crate::move_generation::generator::legal_moves;
    use crate::moves::move_path::Move;
    use crate::search::zobrist::compute_zobrist_key;
    use crate::utils::algebraic::algebraic_to_square;

    fn snapshot(position: &Position) -> (u32, u32, u32, u32, u32, u64, u16) {
        (
            position.pieces(Color::White, PieceKind::Man),
            position.pieces(Color::White, PieceKind::King),
            position.pieces(Color::Black, PieceKind::Man),
            position.pieces(Color::Black, PieceKind::King),
            position.just_promoted,
            position.zobrist_key,
            position.no_progress,
        )
    }

    #[test]
    fn every_legal_move_round_trips_through_unmake() {
        let mut position = Position::new_game();
        let before = snapshot(&position);

        for mv in legal_moves(&position, position.side_to_move) {
            make_move_in_place(&mut position, &mv).expect("legal move applies");
            assert_eq!(position.zobrist_key, compute_zobrist_key(&position));
            unmake_move_in_place(&mut position).expect("undo succeeds");
            assert_eq!(snapshot(&position), before, "state must restore for {mv}");
        }
    }

    #[test]
    fn capture_round_trip_restores_victims() {
        let mut position = Position::new_empty();
        for (alg, color, kind) in [
            ("a3", Color::White, PieceKind::Man),
            ("b4", Color::Black, PieceKind::Man),
            ("d6", Color::Black, PieceKind::Man),
        ] {
            position
                .put_piece(algebraic_to_square(alg).expect("square"), color, kind)
                .expect("empty");
        }
        crate::search::zobrist::refresh_position_hash(&mut position);
        let before = snapshot(&position);

        let moves = legal_moves(&position, Color::White);
        assert_eq!(moves.len(), 1);
        make_move_in_place(&mut position, &moves[0]).expect("double capture applies");
        assert_eq!(position.pieces(Color::Black, PieceKind::Man), 0);
        assert_eq!(position.side_to_move, Color::Black);
        assert_eq!(position.no_progress, 0);

        unmake_move_in_place(&mut position).expect("undo");
        assert_eq!(snapshot(&position), before);
        assert_eq!(position.side_to_move, Color::White);
    }

    #[test]
    fn promotion_sets_and_then_expires_the_marker() {
        let mut position = Position::new_empty();
        for (alg, color, kind) in [
            ("c7", Color::White, PieceKind::Man),
            ("h4", Color::Black, PieceKind::King),
        ] {
            position
                .put_piece(algebraic_to_square(alg).expect("square"), color, kind)
                .expect("empty");
        }
        crate::search::zobrist::refresh_position_hash(&mut position);

        // White steps onto the back rank: promoted and frozen.
        let moves = legal_moves(&position, Color::White);
        let promo = moves
            .iter()
            .find(|m| Position::is_promotion_square(Color::White, m.destination()))
            .expect("promoting step exists")
            .clone();
        make_move_in_place(&mut position, &promo).expect("promotion applies");

        let promoted_sq = promo.destination();
        assert_eq!(
            position.piece_at(promoted_sq),
            Some((Color::White, PieceKind::King))
        );
        assert_ne!(position.just_promoted & (1 << promoted_sq), 0);
        // The fresh king may not originate a move for White's next turn.
        assert!(legal_moves(&position, Color::White).is_empty());

        // Black replies; the marker expires as White comes back to move.
        let black_reply = legal_moves(&position, Color::Black)
            .first()
            .expect("black king can move")
            .clone();
        make_move_in_place(&mut position, &black_reply).expect("reply applies");
        assert_eq!(position.just_promoted, 0);
        assert!(!legal_moves(&position, Color::White).is_empty());
    }

    #[test]
    fn no_progress_counter_tracks_king_shuffles_only() {
        let mut position = Position::new_empty();
        for (alg, color) in [("a1", Color::White), ("h8", Color::Black)] {
            position
                .put_piece(
                    algebraic_to_square(alg).expect("square"),
                    color,
                    PieceKind::King,
                )
                .expect("empty");
        }
        crate::search::zobrist::refresh_position_hash(&mut position);

        let mv = legal_moves(&position, Color::White)[0].clone();
        make_move_in_place(&mut position, &mv).expect("king slide");
        assert_eq!(position.no_progress, 1);
    }

    #[test]
    fn apply_move_rejects_wrong_side_and_empty_origin() {
        let position = Position::new_game();
        let black_move = Move::simple(8, 12);
        assert!(apply_move(&position, &black_move).is_err());

        let ghost = Move::simple(16, 12);
        assert!(apply_move(&position, &ghost).is_err());
    }
}
