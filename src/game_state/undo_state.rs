use crate::game_state::types::{Color, PieceKind};
use crate::moves::move_path::Move;

/// Single undo record for `make_move_in_place` / `unmake_move_in_place`.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub mv: Move,
    pub moved_kind: PieceKind,
    pub captured: Vec<(u8, Color, PieceKind)>,
    pub promoted: bool,
    pub switched_side: bool,

    pub prev_just_promoted: u32,
    pub prev_no_progress: u16,
    pub prev_zobrist_key: u64,
}
