//! Iterative deepening search with negamax alpha-beta pruning.
//!
//! Implements depth-progressive search that repeatedly refines best-move
//! output under a wall-clock budget. Heuristics:
//! - Aspiration windows sized from the previous depth's root-score spread,
//!   with a full-window re-search on failure.
//! - Principal Variation Search (PVS) zero-window probing for non-PV moves.
//! - Killer and history move ordering; TT-move-first ordering.
//! - Capture ordering by MVV/LVA with SEE refinement of the leading captures.
//! - Null-move pruning with forced-capture and low-material safeguards.
//! - Futility pruning of quiet moves near the leaves.
//! - Multi-cut pruning at non-PV nodes.
//! - Late Move Reductions (LMR) with re-search on fail-high.
//! - Quiescence search over the mandatory capture lines with SEE-based
//!   delta pruning.
//!
//! A deadline, node cap, or stop flag aborts the current depth; the abort
//! travels up the recursion as `Ok(None)` and the driver falls back to the
//! last fully completed depth's move.

use crate::game_state::board_geometry::{neighbor, opposite_direction};
use crate::game_state::position::Position;
use crate::game_state::types::{PieceKind, DRAW_MOVE_THRESHOLD};
use crate::move_generation::apply::{make_move_in_place, unmake_move_in_place};
use crate::move_generation::generator::{
    capture_moves, has_any_capture, has_any_move, legal_moves, MoveGenResult, MoveGenerationError,
};
use crate::moves::move_path::Move;
use crate::search::board_scoring::{BoardScorer, MaterialScorer};
use crate::search::transposition_table::{Bound, TTEntry, TTStats, TranspositionTable};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const WIN_SCORE: i32 = 30_000;
const WIN_TT_THRESHOLD: i32 = WIN_SCORE - 1000;
const MAX_PLY: usize = 64;
const QUIESCENCE_DELTA_MARGIN: i32 = 120;
const SEE_BAD_CAPTURE_THRESHOLD: i32 = -120;
const NODES_PER_DEADLINE_CHECK: u64 = 64;
const SEE_REFINE_COUNT: usize = 4;
const MULTI_CUT_MOVES: usize = 6;
const MULTI_CUT_REQUIRED: usize = 3;
const MULTI_CUT_REDUCTION: u8 = 2;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_depth: u8,
    pub movetime_ms: Option<u64>,
    pub max_nodes: Option<u64>,
    pub stop_flag: Option<Arc<AtomicBool>>,
    pub quiescence_depth: u8,
    pub enable_null_move: bool,
    pub enable_lmr: bool,
    pub enable_multi_cut: bool,
    pub enable_aspiration: bool,
    pub enable_futility: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            movetime_ms: None,
            max_nodes: None,
            stop_flag: None,
            quiescence_depth: 8,
            enable_null_move: true,
            enable_lmr: true,
            enable_multi_cut: true,
            enable_aspiration: true,
            enable_futility: true,
        }
    }
}

impl SearchConfig {
    /// Plain alpha-beta: every speculative heuristic switched off. Used by
    /// soundness tests and as a debugging aid.
    pub fn plain(max_depth: u8) -> Self {
        Self {
            max_depth,
            quiescence_depth: 0,
            enable_null_move: false,
            enable_lmr: false,
            enable_multi_cut: false,
            enable_aspiration: false,
            enable_futility: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub best_score: i32,
    pub reached_depth: u8,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub nps: u64,
    pub tt_stats: TTStats,
}

struct SearchContext {
    deadline: Option<Instant>,
    node_cap: Option<u64>,
    stop_flag: Option<Arc<AtomicBool>>,
    quiescence_depth: u8,
    enable_null_move: bool,
    enable_lmr: bool,
    enable_multi_cut: bool,
    enable_futility: bool,
    nodes: u64,
    heuristics: SearchHeuristics,
}

impl SearchContext {
    #[inline]
    fn should_abort(&self) -> bool {
        if let Some(cap) = self.node_cap {
            if self.nodes >= cap {
                return true;
            }
        }
        if self.nodes % NODES_PER_DEADLINE_CHECK == 0 {
            if let Some(limit) = self.deadline {
                if Instant::now() >= limit {
                    return true;
                }
            }
            if let Some(flag) = &self.stop_flag {
                if flag.load(Ordering::Relaxed) {
                    return true;
                }
            }
        }
        false
    }
}

pub fn iterative_deepening_search<S: BoardScorer>(
    position: &Position,
    scorer: &S,
    config: SearchConfig,
) -> MoveGenResult<SearchResult> {
    let mut local_tt = TranspositionTable::new_with_mb(16);
    iterative_deepening_search_with_tt(position, scorer, config, &mut local_tt)
}

pub fn iterative_deepening_search_with_tt<S: BoardScorer>(
    position: &Position,
    scorer: &S,
    config: SearchConfig,
    tt: &mut TranspositionTable,
) -> MoveGenResult<SearchResult> {
    let started_at = Instant::now();
    let deadline = config
        .movetime_ms
        .map(|ms| started_at + Duration::from_millis(ms.max(1)));

    if config.max_depth == 0 {
        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        return Ok(SearchResult {
            best_move: None,
            best_score: scorer.score(position),
            reached_depth: 0,
            nodes: 1,
            elapsed_ms,
            nps: 0,
            tt_stats: tt.stats(),
        });
    }

    let mut ctx = SearchContext {
        deadline,
        node_cap: config.max_nodes.filter(|n| *n > 0),
        stop_flag: config.stop_flag.clone(),
        quiescence_depth: config.quiescence_depth,
        enable_null_move: config.enable_null_move,
        enable_lmr: config.enable_lmr,
        enable_multi_cut: config.enable_multi_cut,
        enable_futility: config.enable_futility,
        nodes: 0,
        heuristics: SearchHeuristics::new(),
    };

    let mut root = position.clone();
    let mut result = SearchResult::default();
    let mut prev_score = 0i32;
    let mut prev_spread: Option<i32> = None;

    for depth in 1..=config.max_depth {
        if ctx.should_abort() {
            break;
        }
        tt.new_generation();
        ctx.heuristics.reset_iteration();

        let outcome = if config.enable_aspiration && depth > 1 {
            let delta = aspiration_delta(prev_spread);
            let alpha = prev_score.saturating_sub(delta).max(-WIN_SCORE);
            let beta = prev_score.saturating_add(delta).min(WIN_SCORE);
            match negamax_root(&mut root, scorer, depth, alpha, beta, tt, &mut ctx)? {
                None => None,
                Some(root_result) => {
                    if root_result.score <= alpha || root_result.score >= beta {
                        // Aspiration failed: re-search this depth full width.
                        negamax_root(&mut root, scorer, depth, -WIN_SCORE, WIN_SCORE, tt, &mut ctx)?
                    } else {
                        Some(root_result)
                    }
                }
            }
        } else {
            negamax_root(&mut root, scorer, depth, -WIN_SCORE, WIN_SCORE, tt, &mut ctx)?
        };

        let Some(root_result) = outcome else {
            break;
        };

        result.best_move = root_result.best_move;
        result.best_score = root_result.score;
        result.reached_depth = depth;
        prev_score = root_result.score;
        prev_spread = score_spread(&root_result.move_scores);
    }

    result.nodes = ctx.nodes;
    result.elapsed_ms = started_at.elapsed().as_millis() as u64;
    result.nps = if result.elapsed_ms == 0 {
        0
    } else {
        result.nodes.saturating_mul(1000) / result.elapsed_ms
    };
    result.tt_stats = tt.stats();

    Ok(result)
}

#[inline]
fn aspiration_delta(prev_spread: Option<i32>) -> i32 {
    match prev_spread {
        Some(spread) => (spread / 4).clamp(25, 300),
        None => 50,
    }
}

#[inline]
fn score_spread(scores: &[i32]) -> Option<i32> {
    let max = scores.iter().max()?;
    let min = scores.iter().min()?;
    Some(max - min)
}

struct RootResult {
    best_move: Option<Move>,
    score: i32,
    move_scores: Vec<i32>,
}

fn negamax_root<S: BoardScorer>(
    position: &mut Position,
    scorer: &S,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    tt: &mut TranspositionTable,
    ctx: &mut SearchContext,
) -> MoveGenResult<Option<RootResult>> {
    let mut moves = legal_moves(position, position.side_to_move);
    if moves.is_empty() {
        ctx.nodes += 1;
        return Ok(Some(RootResult {
            best_move: None,
            score: -WIN_SCORE,
            move_scores: Vec::new(),
        }));
    }

    let tt_move = tt
        .probe(position.zobrist_key)
        .and_then(|entry| entry.best_move.clone());
    order_moves(position, &mut moves, tt_move.as_ref(), 0, &ctx.heuristics);

    let mut best_move = None;
    let mut best_score = -WIN_SCORE;
    let mut move_scores = Vec::with_capacity(moves.len());

    for (move_index, mv) in moves.iter().enumerate() {
        if ctx.should_abort() {
            return Ok(None);
        }

        make_move_in_place(position, mv).map_err(|x| {
            MoveGenerationError::InvalidState(format!("make_move_in_place failed: {x}"))
        })?;

        let score_opt = if move_index == 0 {
            negamax(position, scorer, depth - 1, -beta, -alpha, 1, true, tt, ctx)?
        } else {
            // Zero-window probe, confirmed with a full window when it
            // threatens to improve the principal variation.
            let probe = negamax(position, scorer, depth - 1, -alpha - 1, -alpha, 1, true, tt, ctx)?;
            match probe {
                None => None,
                Some(probe_score) => {
                    let probe_score = -probe_score;
                    if probe_score > alpha && probe_score < beta {
                        negamax(position, scorer, depth - 1, -beta, -alpha, 1, true, tt, ctx)?
                    } else {
                        Some(-probe_score)
                    }
                }
            }
        };

        unmake_move_in_place(position).map_err(|x| {
            MoveGenerationError::InvalidState(format!("unmake_move_in_place failed: {x}"))
        })?;

        let Some(score) = score_opt else {
            return Ok(None);
        };
        let score = -score;
        move_scores.push(score);

        if score > best_score {
            best_score = score;
            best_move = Some(mv.clone());
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break;
        }
    }

    Ok(Some(RootResult {
        best_move,
        score: best_score,
        move_scores,
    }))
}

#[allow(clippy::too_many_arguments)]
fn negamax<S: BoardScorer>(
    position: &mut Position,
    scorer: &S,
    depth: u8,
    mut alpha: i32,
    mut beta: i32,
    ply: u8,
    allow_null: bool,
    tt: &mut TranspositionTable,
    ctx: &mut SearchContext,
) -> MoveGenResult<Option<i32>> {
    if ctx.should_abort() {
        return Ok(None);
    }

    if position.no_progress >= DRAW_MOVE_THRESHOLD {
        return Ok(Some(0));
    }

    let alpha_orig = alpha;
    let mut tt_move = None;

    if let Some(entry) = tt.probe(position.zobrist_key) {
        tt_move = entry.best_move.clone();
        if entry.depth >= depth {
            let tt_score = tt_score_from_storage(entry.score, ply);
            match entry.bound {
                Bound::Exact => return Ok(Some(tt_score)),
                Bound::Lower => alpha = alpha.max(tt_score),
                Bound::Upper => beta = beta.min(tt_score),
            }
            if alpha >= beta {
                return Ok(Some(tt_score));
            }
        }
    }

    ctx.nodes += 1;

    if depth == 0 {
        return quiescence(position, scorer, alpha, beta, ply, 0, ctx);
    }

    let side = position.side_to_move;
    let in_forced_capture = has_any_capture(position, side);
    let is_pv = beta > alpha + 1;

    // Passing is never legal, and a side with no move at all has lost, so
    // the null probe is only meaningful in mobile, capture-free positions.
    if allow_null
        && ctx.enable_null_move
        && depth >= 3
        && !in_forced_capture
        && beta < WIN_TT_THRESHOLD
        && !is_low_material(position)
        && has_any_move(position, side)
    {
        let reduction = if depth >= 6 { 3 } else { 2 };
        position.switch_side();
        let score_opt = negamax(
            position,
            scorer,
            depth.saturating_sub(1 + reduction),
            -beta,
            -beta + 1,
            ply.saturating_add(1),
            false,
            tt,
            ctx,
        )?;
        position.switch_side();

        let Some(score) = score_opt else {
            return Ok(None);
        };
        let score = -score;
        if score >= beta {
            return Ok(Some(score));
        }
    }

    let mut moves = legal_moves(position, side);
    if moves.is_empty() {
        return Ok(Some(-(WIN_SCORE - i32::from(ply))));
    }

    let ply_idx = usize::from(ply).min(MAX_PLY - 1);
    order_moves(position, &mut moves, tt_move.as_ref(), ply_idx, &ctx.heuristics);

    if ctx.enable_multi_cut
        && !is_pv
        && depth >= 4
        && !in_forced_capture
        && moves.len() >= MULTI_CUT_MOVES
    {
        let mut fail_highs = 0usize;
        for mv in moves.iter().take(MULTI_CUT_MOVES) {
            make_move_in_place(position, mv).map_err(|x| {
                MoveGenerationError::InvalidState(format!("make_move_in_place failed: {x}"))
            })?;
            let score_opt = negamax(
                position,
                scorer,
                depth.saturating_sub(1 + MULTI_CUT_REDUCTION),
                -beta,
                -beta + 1,
                ply.saturating_add(1),
                allow_null,
                tt,
                ctx,
            )?;
            unmake_move_in_place(position).map_err(|x| {
                MoveGenerationError::InvalidState(format!("unmake_move_in_place failed: {x}"))
            })?;

            let Some(score) = score_opt else {
                return Ok(None);
            };
            if -score >= beta {
                fail_highs += 1;
                if fail_highs >= MULTI_CUT_REQUIRED {
                    // Enough reduced probes independently beat beta: assume
                    // the full search would too.
                    return Ok(Some(beta));
                }
            }
        }
    }

    let futility_eval = if ctx.enable_futility && depth <= 2 && !in_forced_capture && !is_pv {
        Some(scorer.score(position))
    } else {
        None
    };

    let killers = ctx.heuristics.killers_at(ply_idx);
    let mut best = -WIN_SCORE;
    let mut best_move: Option<Move> = None;

    for (move_index, mv) in moves.iter().enumerate() {
        if ctx.should_abort() {
            return Ok(None);
        }

        let is_quiet = !mv.is_capture();
        let is_killer =
            killers[0].as_ref() == Some(mv) || killers[1].as_ref() == Some(mv);

        if let Some(static_eval) = futility_eval {
            if move_index > 0
                && is_quiet
                && !is_promoting_step(position, mv)
                && static_eval + futility_margin(depth) <= alpha
            {
                continue;
            }
        }

        make_move_in_place(position, mv).map_err(|x| {
            MoveGenerationError::InvalidState(format!("make_move_in_place failed: {x}"))
        })?;

        let child = depth - 1;
        let lmr = if ctx.enable_lmr && !is_killer {
            lmr_reduction(depth, move_index, is_quiet)
        } else {
            0
        };

        let score_opt = if move_index == 0 {
            // PV move: full-window search.
            negamax(
                position,
                scorer,
                child,
                -beta,
                -alpha,
                ply.saturating_add(1),
                allow_null,
                tt,
                ctx,
            )?
        } else {
            // Non-PV move: reduced zero-window probe first.
            let probe = negamax(
                position,
                scorer,
                child.saturating_sub(lmr),
                -alpha - 1,
                -alpha,
                ply.saturating_add(1),
                allow_null,
                tt,
                ctx,
            )?;
            match probe {
                None => None,
                Some(probe_score) => {
                    let probe_score = -probe_score;
                    if probe_score > alpha {
                        // Beats alpha at reduced depth/window: confirm with
                        // the full search.
                        negamax(
                            position,
                            scorer,
                            child,
                            -beta,
                            -alpha,
                            ply.saturating_add(1),
                            allow_null,
                            tt,
                            ctx,
                        )?
                    } else {
                        Some(-probe_score)
                    }
                }
            }
        };

        unmake_move_in_place(position).map_err(|x| {
            MoveGenerationError::InvalidState(format!("unmake_move_in_place failed: {x}"))
        })?;

        let Some(score) = score_opt else {
            return Ok(None);
        };
        let score = -score;

        if score > best {
            best = score;
            best_move = Some(mv.clone());
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            if is_quiet {
                ctx.heuristics.record_killer(ply_idx, mv);
                ctx.heuristics.record_history(mv, depth);
            }
            break;
        }
    }

    let bound = if best <= alpha_orig {
        Bound::Upper
    } else if best >= beta {
        Bound::Lower
    } else {
        Bound::Exact
    };

    tt.store(TTEntry {
        key: position.zobrist_key,
        depth,
        score: tt_score_for_storage(best, ply),
        bound,
        best_move,
    });

    Ok(Some(best))
}

#[allow(clippy::too_many_arguments)]
fn quiescence<S: BoardScorer>(
    position: &mut Position,
    scorer: &S,
    mut alpha: i32,
    beta: i32,
    ply: u8,
    qply: u8,
    ctx: &mut SearchContext,
) -> MoveGenResult<Option<i32>> {
    if ctx.should_abort() {
        return Ok(None);
    }

    if position.no_progress >= DRAW_MOVE_THRESHOLD {
        return Ok(Some(0));
    }

    ctx.nodes += 1;

    let side = position.side_to_move;
    let mut captures = capture_moves(position, side);

    if captures.is_empty() {
        if !has_any_move(position, side) {
            return Ok(Some(-(WIN_SCORE - i32::from(ply))));
        }
        return Ok(Some(scorer.score(position)));
    }

    // Captures are mandatory, so standing pat is not a legal option; the
    // static score only drives delta pruning and the depth cap.
    let stand_pat = scorer.score(position);
    if qply >= ctx.quiescence_depth {
        return Ok(Some(stand_pat));
    }

    order_captures(position, &mut captures);

    let mut best = -WIN_SCORE;
    for (move_index, mv) in captures.iter().enumerate() {
        // The best-ordered capture is always searched so a forced-capture
        // node never falls through with no line examined.
        if move_index > 0 {
            let gain = capture_gain(position, mv);
            if stand_pat + gain + QUIESCENCE_DELTA_MARGIN < alpha {
                continue;
            }
            if static_exchange_eval(position, mv) < SEE_BAD_CAPTURE_THRESHOLD {
                continue;
            }
        }

        make_move_in_place(position, mv).map_err(|x| {
            MoveGenerationError::InvalidState(format!("make_move_in_place failed: {x}"))
        })?;
        let score_opt = quiescence(
            position,
            scorer,
            -beta,
            -alpha,
            ply.saturating_add(1),
            qply.saturating_add(1),
            ctx,
        )?;
        unmake_move_in_place(position).map_err(|x| {
            MoveGenerationError::InvalidState(format!("unmake_move_in_place failed: {x}"))
        })?;

        let Some(score) = score_opt else {
            return Ok(None);
        };
        let score = -score;

        if score > best {
            best = score;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break;
        }
    }

    Ok(Some(best))
}

#[inline]
fn futility_margin(depth: u8) -> i32 {
    150 * i32::from(depth)
}

#[inline]
fn lmr_reduction(depth: u8, move_index: usize, is_quiet: bool) -> u8 {
    if !is_quiet || depth < 3 || move_index < 3 {
        0
    } else if depth >= 7 && move_index >= 9 {
        3
    } else if depth >= 5 && move_index >= 6 {
        2
    } else {
        1
    }
}

#[inline]
fn is_low_material(position: &Position) -> bool {
    position.piece_count() <= 8
}

#[inline]
fn is_promoting_step(position: &Position, mv: &Move) -> bool {
    position
        .piece_at(mv.origin())
        .is_some_and(|(color, kind)| {
            kind == PieceKind::Man && Position::is_promotion_square(color, mv.destination())
        })
}

#[inline]
fn tt_score_for_storage(score: i32, ply: u8) -> i32 {
    if score >= WIN_TT_THRESHOLD {
        score.saturating_add(i32::from(ply))
    } else if score <= -WIN_TT_THRESHOLD {
        score.saturating_sub(i32::from(ply))
    } else {
        score
    }
}

#[inline]
fn tt_score_from_storage(score: i32, ply: u8) -> i32 {
    if score >= WIN_TT_THRESHOLD {
        score.saturating_sub(i32::from(ply))
    } else if score <= -WIN_TT_THRESHOLD {
        score.saturating_add(i32::from(ply))
    } else {
        score
    }
}

// --- Move ordering -------------------------------------------------------

fn order_moves(
    position: &Position,
    moves: &mut [Move],
    tt_move: Option<&Move>,
    ply_idx: usize,
    heuristics: &SearchHeuristics,
) {
    let killers = heuristics.killers_at(ply_idx);
    moves.sort_by_cached_key(|mv| -move_order_score(position, mv, tt_move, &killers, heuristics));
    refine_leading_captures(position, moves);
}

fn order_captures(position: &Position, moves: &mut [Move]) {
    moves.sort_by_cached_key(|mv| -(capture_gain(position, mv) * 16 - aggressor_value(position, mv)));
    refine_leading_captures(position, moves);
}

fn move_order_score(
    position: &Position,
    mv: &Move,
    tt_move: Option<&Move>,
    killers: &[Option<Move>; 2],
    heuristics: &SearchHeuristics,
) -> i32 {
    if tt_move == Some(mv) {
        return 1_000_000;
    }
    if mv.is_capture() {
        return 100_000 + capture_gain(position, mv) * 16 - aggressor_value(position, mv);
    }
    let mut score = 0i32;
    if is_promoting_step(position, mv) {
        score += 90_000;
    }
    if killers[0].as_ref() == Some(mv) {
        score += 80_000;
    } else if killers[1].as_ref() == Some(mv) {
        score += 70_000;
    }
    score + heuristics.history_score(mv) / 2
}

/// Re-rank the first few captures among themselves by full static exchange.
fn refine_leading_captures(position: &Position, moves: &mut [Move]) {
    let leading = moves
        .iter()
        .take(SEE_REFINE_COUNT)
        .take_while(|mv| mv.is_capture())
        .count();
    if leading > 1 {
        moves[..leading].sort_by_cached_key(|mv| -static_exchange_eval(position, mv));
    }
}

#[inline]
fn capture_gain(position: &Position, mv: &Move) -> i32 {
    let mut gain = 0i32;
    for &sq in &mv.captured {
        if let Some((_, kind)) = position.piece_at(sq) {
            gain += MaterialScorer::piece_value(kind);
        }
    }
    if is_promoting_step(position, mv) {
        gain += MaterialScorer::piece_value(PieceKind::King)
            - MaterialScorer::piece_value(PieceKind::Man);
    }
    gain
}

#[inline]
fn aggressor_value(position: &Position, mv: &Move) -> i32 {
    position
        .piece_at(mv.origin())
        .map(|(_, kind)| MaterialScorer::piece_value(kind))
        .unwrap_or(0)
}

/// Static exchange estimate: captured material plus promotion gain, minus
/// the moving piece when the landing square is geometrically recapturable on
/// the post-move occupancy.
pub fn static_exchange_eval(position: &Position, mv: &Move) -> i32 {
    let mut gain = capture_gain(position, mv);
    let Some((mover_color, mover_kind)) = position.piece_at(mv.origin()) else {
        return gain;
    };

    let own_value = if is_promoting_step(position, mv) {
        MaterialScorer::piece_value(PieceKind::King)
    } else {
        MaterialScorer::piece_value(mover_kind)
    };

    // Post-move occupancy masks.
    let mut victims = 0u32;
    for &sq in &mv.captured {
        victims |= 1 << sq;
    }
    let dest = mv.destination();
    let own_occ =
        (position.occupancy_of(mover_color) & !(1 << mv.origin())) | (1 << dest);
    let opp_color = mover_color.opposite();
    let opp_men = position.pieces(opp_color, PieceKind::Man) & !victims;
    let opp_kings = position.pieces(opp_color, PieceKind::King) & !victims;
    let occ = own_occ | opp_men | opp_kings;

    for dir in 0..4 {
        let Some(landing) = neighbor(dest, opposite_direction(dir)) else {
            continue;
        };
        if occ & (1 << landing) != 0 {
            continue;
        }
        // First piece on the attacking ray: an adjacent enemy man or an
        // enemy king anywhere down the open diagonal recaptures.
        let mut distance = 1u8;
        let mut cursor = neighbor(dest, dir);
        let mut attacked = false;
        while let Some(sq) = cursor {
            let bit = 1u32 << sq;
            if occ & bit != 0 {
                attacked = (opp_kings & bit != 0) || (distance == 1 && opp_men & bit != 0);
                break;
            }
            cursor = neighbor(sq, dir);
            distance += 1;
        }
        if attacked {
            return gain - own_value;
        }
    }

    gain
}

// --- Per-invocation heuristic state --------------------------------------

struct SearchHeuristics {
    killers: Vec<[Option<Move>; 2]>,
    history: [[i32; 32]; 32],
}

impl SearchHeuristics {
    fn new() -> Self {
        Self {
            killers: vec![[None, None]; MAX_PLY],
            history: [[0; 32]; 32],
        }
    }

    fn reset_iteration(&mut self) {
        for slot in &mut self.killers {
            *slot = [None, None];
        }
    }

    fn killers_at(&self, ply_idx: usize) -> [Option<Move>; 2] {
        self.killers[ply_idx].clone()
    }

    fn record_killer(&mut self, ply_idx: usize, mv: &Move) {
        if self.killers[ply_idx][0].as_ref() == Some(mv) {
            return;
        }
        self.killers[ply_idx][1] = self.killers[ply_idx][0].take();
        self.killers[ply_idx][0] = Some(mv.clone());
    }

    fn record_history(&mut self, mv: &Move, depth: u8) {
        let (from, to) = mv.key();
        let bonus = i32::from(depth) * i32::from(depth);
        let entry = &mut self.history[from as usize][to as usize];
        *entry = (*entry + bonus).min(50_000);
    }

    fn history_score(&self, mv: &Move) -> i32 {
        let (from, to) = mv.key();
        self.history[from as usize][to as usize]
    }
}

/// Walk the transposition table's best moves to reconstruct the principal
/// variation, validating each against the legal set.
pub fn principal_variation_from_tt(
    position: &Position,
    tt: &mut TranspositionTable,
    max_len: u8,
) -> Vec<Move> {
    let mut pv = Vec::new();
    let mut state = position.clone();

    for _ in 0..max_len {
        let Some(best) = tt
            .probe(state.zobrist_key)
            .and_then(|entry| entry.best_move.clone())
        else {
            break;
        };
        if !legal_moves(&state, state.side_to_move).contains(&best) {
            break;
        }
        if make_move_in_place(&mut state, &best).is_err() {
            break;
        }
        pv.push(best);
    }

    pv
}
