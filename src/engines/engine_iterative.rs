//! Iterative-deepening engine.
//!
//! Wraps the core negamax alpha-beta search with a persistent transposition
//! table, time-budget resolution, and option handling. Diagnostics are
//! reported as `info string` lines on the output payload.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::engines::engine_trait::{Engine, EngineOutput, GoParams};
use crate::engines::time_management::{resolve_go_params, TimeManagementStrategy};
use crate::game_state::position::Position;
use crate::move_generation::generator::legal_moves;
use crate::search::board_scoring::PositionalScorer;
use crate::search::iterative_deepening::{
    iterative_deepening_search_with_tt, principal_variation_from_tt, SearchConfig,
};
use crate::search::transposition_table::TranspositionTable;

pub struct IterativeEngine {
    default_depth: u8,
    scorer: PositionalScorer,
    tt: TranspositionTable,
    hash_mb: usize,
    time_strategy: TimeManagementStrategy,
    stop_signal: Option<Arc<AtomicBool>>,
    enable_null_move: bool,
    enable_lmr: bool,
    enable_multi_cut: bool,
    enable_aspiration: bool,
    enable_futility: bool,
}

impl IterativeEngine {
    pub fn new(default_depth: u8) -> Self {
        let hash_mb = 64usize;
        Self {
            default_depth,
            scorer: PositionalScorer::new(),
            tt: TranspositionTable::new_with_mb(hash_mb),
            hash_mb,
            time_strategy: TimeManagementStrategy::Adaptive,
            stop_signal: None,
            enable_null_move: true,
            enable_lmr: true,
            enable_multi_cut: true,
            enable_aspiration: true,
            enable_futility: true,
        }
    }

    fn search_config(&self, params: &GoParams) -> SearchConfig {
        SearchConfig {
            max_depth: params.depth.unwrap_or(self.default_depth),
            movetime_ms: params.movetime_ms,
            max_nodes: params.max_nodes,
            stop_flag: self.stop_signal.clone(),
            enable_null_move: self.enable_null_move,
            enable_lmr: self.enable_lmr,
            enable_multi_cut: self.enable_multi_cut,
            enable_aspiration: self.enable_aspiration,
            enable_futility: self.enable_futility,
            ..SearchConfig::default()
        }
    }

    fn parse_toggle(value: &str) -> Result<bool, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(format!("invalid boolean value '{other}'")),
        }
    }
}

impl Engine for IterativeEngine {
    fn new_game(&mut self) {
        self.tt.clear();
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), String> {
        if name.eq_ignore_ascii_case("Hash") {
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid Hash value '{value}'"))?;
            self.hash_mb = parsed.max(1);
            self.tt = TranspositionTable::new_with_mb(self.hash_mb);
            return Ok(());
        }
        if name.eq_ignore_ascii_case("TimeStrategy") {
            self.time_strategy = match value.trim().to_ascii_lowercase().as_str() {
                "adaptive" => TimeManagementStrategy::Adaptive,
                "fraction20" | "legacy" | "simple" => TimeManagementStrategy::Fraction20,
                _ => return Err(format!("invalid TimeStrategy value '{value}'")),
            };
            return Ok(());
        }
        if name.eq_ignore_ascii_case("NullMove") {
            self.enable_null_move = Self::parse_toggle(value)?;
            return Ok(());
        }
        if name.eq_ignore_ascii_case("LateMoveReduction") {
            self.enable_lmr = Self::parse_toggle(value)?;
            return Ok(());
        }
        if name.eq_ignore_ascii_case("MultiCut") {
            self.enable_multi_cut = Self::parse_toggle(value)?;
            return Ok(());
        }
        if name.eq_ignore_ascii_case("Aspiration") {
            self.enable_aspiration = Self::parse_toggle(value)?;
            return Ok(());
        }
        if name.eq_ignore_ascii_case("Futility") {
            self.enable_futility = Self::parse_toggle(value)?;
            return Ok(());
        }
        Ok(())
    }

    fn set_stop_signal(&mut self, stop_signal: Option<Arc<AtomicBool>>) {
        self.stop_signal = stop_signal;
    }

    fn choose_move(
        &mut self,
        position: &Position,
        params: &GoParams,
    ) -> Result<EngineOutput, String> {
        let legal = legal_moves(position, position.side_to_move);
        if legal.is_empty() {
            return Ok(EngineOutput {
                best_move: None,
                info_lines: vec!["info string no legal moves".to_owned()],
            });
        }
        if legal.len() == 1 {
            return Ok(EngineOutput {
                best_move: Some(legal[0].clone()),
                info_lines: vec![format!("info string forced move {}", legal[0])],
            });
        }

        let resolved = resolve_go_params(position, params, self.time_strategy);
        let config = self.search_config(&resolved);

        let result = iterative_deepening_search_with_tt(position, &self.scorer, config, &mut self.tt)
            .map_err(|e| e.to_string())?;

        let mut info_lines = Vec::new();
        info_lines.push(format!(
            "info depth {} score cp {} nodes {} time {} nps {}",
            result.reached_depth, result.best_score, result.nodes, result.elapsed_ms, result.nps
        ));
        let pv = principal_variation_from_tt(position, &mut self.tt, result.reached_depth);
        if !pv.is_empty() {
            let rendered: Vec<String> = pv.iter().map(|m| m.to_string()).collect();
            info_lines.push(format!("info pv {}", rendered.join(" ")));
        }
        let stats = result.tt_stats;
        info_lines.push(format!(
            "info string tt probes {} hits {} stores {}",
            stats.probes, stats.hits, stats.stores
        ));

        // A timed-out first depth still yields a usable move.
        let best_move = result
            .best_move
            .or_else(|| Some(legal[0].clone()));

        Ok(EngineOutput {
            best_move,
            info_lines,
        })
    }
}
