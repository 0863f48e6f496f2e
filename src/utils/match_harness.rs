//! Minimal head-to-head engine match harness for local testing.
//!
//! Runs two `Engine` implementations against each other through the match
//! controller, with an optional seeded random opening prefix so repeated
//! games diverge deterministically. Records carry the date they were played
//! for series bookkeeping.

use chrono::Local;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::engines::engine_trait::{Engine, GoParams};
use crate::game::match_session::{GameStatus, MatchSession};
use crate::game_state::types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    WhiteWin,
    BlackWin,
    Draw,
    /// Aborted because an engine failed to produce a legal move or the ply
    /// cap was reached.
    Unfinished,
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub max_plies: u32,
    pub opening_plies: u8,
    pub opening_seed: u64,
    pub go_params: GoParams,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_plies: 300,
            opening_plies: 4,
            opening_seed: 0,
            go_params: GoParams {
                depth: Some(4),
                ..GoParams::default()
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub outcome: MatchOutcome,
    pub date: String,
    pub moves_played: Vec<String>,
    pub opening_plies: u8,
    pub total_plies: u32,
}

/// Play one game, `white` vs `black`.
pub fn run_match<'a>(
    white: &'a mut dyn Engine,
    black: &'a mut dyn Engine,
    config: &MatchConfig,
) -> Result<MatchRecord, String> {
    let mut session = MatchSession::new();
    let mut rng = StdRng::seed_from_u64(config.opening_seed);
    let mut moves_played = Vec::new();
    let mut plies = 0u32;

    // Random opening prefix for variety between seeded games.
    for _ in 0..config.opening_plies {
        if session.status() != GameStatus::Ongoing {
            break;
        }
        let legal = session.legal_moves();
        let mv = legal[rng.random_range(0..legal.len())].clone();
        moves_played.push(mv.to_string());
        session.play(&mv).map_err(|e| e.to_string())?;
        plies += 1;
    }

    while session.status() == GameStatus::Ongoing && plies < config.max_plies {
        let engine = match session.side_to_move() {
            Color::White => &mut *white,
            Color::Black => &mut *black,
        };
        let out = engine.choose_move(session.position(), &config.go_params)?;
        let Some(mv) = out.best_move else {
            break;
        };
        moves_played.push(mv.to_string());
        session.play(&mv).map_err(|e| e.to_string())?;
        plies += 1;
    }

    let outcome = match session.status() {
        GameStatus::WonBy(Color::White) => MatchOutcome::WhiteWin,
        GameStatus::WonBy(Color::Black) => MatchOutcome::BlackWin,
        GameStatus::Draw => MatchOutcome::Draw,
        GameStatus::Ongoing => MatchOutcome::Unfinished,
    };

    Ok(MatchRecord {
        outcome,
        date: Local::now().format("%Y.%m.%d").to_string(),
        moves_played,
        opening_plies: config.opening_plies,
        total_plies: plies,
    })
}
