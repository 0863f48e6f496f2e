//! Uniformly random legal-move chooser.
//!
//! Useful as an opponent baseline in the match harness and as a sanity check
//! that stronger engines actually out-play noise.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::engines::engine_trait::{Engine, EngineOutput, GoParams};
use crate::game_state::position::Position;
use crate::move_generation::generator::legal_moves;

pub struct RandomEngine {
    rng: StdRng,
}

impl RandomEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Engine for RandomEngine {
    fn choose_move(
        &mut self,
        position: &Position,
        _params: &GoParams,
    ) -> Result<EngineOutput, String> {
        let moves = legal_moves(position, position.side_to_move);
        if moves.is_empty() {
            return Ok(EngineOutput::default());
        }
        let pick = self.rng.random_range(0..moves.len());
        Ok(EngineOutput {
            best_move: Some(moves[pick].clone()),
            info_lines: vec![format!("info string random pick {}/{}", pick + 1, moves.len())],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RandomEngine;
    use crate::engines::engine_trait::{Engine, GoParams};
    use crate::game_state::position::Position;
    use crate::move_generation::generator::legal_moves;

    #[test]
    fn seeded_engine_is_deterministic_and_legal() {
        let position = Position::new_game();
        let legal = legal_moves(&position, position.side_to_move);

        let mut a = RandomEngine::new(7);
        let mut b = RandomEngine::new(7);
        let pick_a = a
            .choose_move(&position, &GoParams::default())
            .expect("choose")
            .best_move
            .expect("startpos has moves");
        let pick_b = b
            .choose_move(&position, &GoParams::default())
            .expect("choose")
            .best_move
            .expect("startpos has moves");

        assert_eq!(pick_a, pick_b);
        assert!(legal.contains(&pick_a));
    }
}
