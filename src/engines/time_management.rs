//! Reusable time-management strategies for engine move budgeting.
//!
//! Callers pass raw clock data (per-side remaining time and increments) and
//! the engine decides the final per-move allocation based on strategy.

use crate::engines::engine_trait::GoParams;
use crate::game_state::position::Position;
use crate::game_state::types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeManagementStrategy {
    /// Fixed rule: spend 1/20th of the remaining clock.
    Fraction20,
    /// Adaptive rule using clock, increment, and game phase.
    Adaptive,
}

pub fn resolve_go_params(
    position: &Position,
    params: &GoParams,
    strategy: TimeManagementStrategy,
) -> GoParams {
    if params.movetime_ms.is_some() {
        return params.clone();
    }

    let mut resolved = params.clone();
    let (remaining_opt, inc_opt) = match position.side_to_move {
        Color::White => (params.white_time_ms, params.white_inc_ms),
        Color::Black => (params.black_time_ms, params.black_inc_ms),
    };

    if let Some(remaining) = remaining_opt {
        resolved.movetime_ms = Some(match strategy {
            TimeManagementStrategy::Fraction20 => (remaining / 20).max(1),
            TimeManagementStrategy::Adaptive => {
                adaptive_budget_ms(position, remaining, inc_opt, params.moves_to_go)
            }
        });
    }

    resolved
}

fn adaptive_budget_ms(
    position: &Position,
    remaining_ms: u64,
    inc_ms: Option<u64>,
    moves_to_go: Option<u16>,
) -> u64 {
    let ply = u64::from(position.ply);
    let expected_moves_left = if let Some(mtg) = moves_to_go {
        u64::from(mtg.max(1))
    } else if ply < 20 {
        40
    } else if ply < 60 {
        26
    } else {
        16
    };

    let reserve = (remaining_ms / 25)
        .max(100)
        .min(remaining_ms.saturating_sub(1).max(1));
    let usable = remaining_ms.saturating_sub(reserve);
    let base = usable / expected_moves_left.max(1);
    let inc_bonus = inc_ms.unwrap_or(0).saturating_mul(3) / 4;
    let panic = if remaining_ms < 2_000 {
        remaining_ms / 12
    } else {
        0
    };
    let target = base.saturating_add(inc_bonus).saturating_add(panic);

    let min_budget = if remaining_ms < 1_000 { 5 } else { 15 };
    let max_budget = (remaining_ms / 4).max(1);
    target.clamp(min_budget, max_budget).max(1)
}
