//! Recursive capture-sequence search for men and flying kings.
//!
//! Victims stay on the board for the remainder of a sequence: they keep
//! blocking rays and may not be jumped twice. The recursion threads two
//! value-copied bitmasks (`visited` landings including the origin, and
//! `captured` victims) so sibling branches can never alias each other's
//! state. Emitted sequences are raw; the generator applies the
//! maximal-capture filter.

use crate::game_state::board_geometry::{neighbor, opposite_direction};
use crate::game_state::position::Position;
use crate::game_state::types::{Color, PieceKind, Square};
use crate::moves::move_path::Move;

pub struct CaptureFinder {
    our_occ: u32,
    opp_occ: u32,
    color: Color,
}

impl CaptureFinder {
    pub fn new(position: &Position, color: Color) -> Self {
        Self {
            our_occ: position.occupancy_of(color),
            opp_occ: position.occupancy_of(color.opposite()),
            color,
        }
    }

    /// Collect every capture sequence starting on `from` into `out`.
    pub fn sequences_for_piece(&self, from: Square, kind: PieceKind, out: &mut Vec<Move>) {
        let mut path = vec![from];
        let mut caps = Vec::new();
        match kind {
            PieceKind::Man => self.man_captures(from, 1 << from, 0, &mut path, &mut caps, out),
            PieceKind::King => {
                self.king_captures(from, None, 1 << from, 0, &mut path, &mut caps, out)
            }
        }
    }

    #[inline]
    fn occupancy(&self) -> u32 {
        self.our_occ | self.opp_occ
    }

    fn man_captures(
        &self,
        from: Square,
        visited: u32,
        captured: u32,
        path: &mut Vec<Square>,
        caps: &mut Vec<Square>,
        out: &mut Vec<Move>,
    ) {
        let occ = self.occupancy();
        let mut found_jump = false;

        // Men capture in all four diagonal directions.
        for dir in 0..4 {
            let Some(mid) = neighbor(from, dir) else {
                continue;
            };
            let Some(dest) = neighbor(mid, dir) else {
                continue;
            };
            let mid_bit = 1u32 << mid;
            let dest_bit = 1u32 << dest;
            if self.opp_occ & mid_bit == 0 || captured & mid_bit != 0 {
                continue;
            }
            if occ & dest_bit != 0 || visited & dest_bit != 0 {
                continue;
            }

            found_jump = true;
            path.push(dest);
            caps.push(mid);
            if Position::is_promotion_square(self.color, dest) {
                // Reaching the back rank ends the sequence: the man promotes
                // and the turn is over.
                out.push(Move::capture(path.clone(), caps.clone()));
            } else {
                self.man_captures(dest, visited | dest_bit, captured | mid_bit, path, caps, out);
            }
            path.pop();
            caps.pop();
        }

        if !found_jump && !caps.is_empty() {
            out.push(Move::capture(path.clone(), caps.clone()));
        }
    }

    fn king_captures(
        &self,
        from: Square,
        forbidden_dir: Option<usize>,
        visited: u32,
        captured: u32,
        path: &mut Vec<Square>,
        caps: &mut Vec<Square>,
        out: &mut Vec<Move>,
    ) {
        let occ = self.occupancy();
        let mut found_jump = false;

        for dir in 0..4 {
            // A continuation may not immediately reverse the completed jump.
            if forbidden_dir == Some(dir) {
                continue;
            }

            // First piece along the ray; only an uncaptured enemy is jumpable.
            let mut scan = neighbor(from, dir);
            let mut victim = None;
            while let Some(sq) = scan {
                let bit = 1u32 << sq;
                if occ & bit != 0 {
                    if self.opp_occ & bit != 0 && captured & bit == 0 {
                        victim = Some(sq);
                    }
                    break;
                }
                scan = neighbor(sq, dir);
            }
            let Some(mid) = victim else {
                continue;
            };

            // Any empty, unvisited square beyond the victim is a landing.
            let mid_bit = 1u32 << mid;
            let mut landing = neighbor(mid, dir);
            while let Some(dest) = landing {
                let dest_bit = 1u32 << dest;
                if occ & dest_bit != 0 || visited & dest_bit != 0 {
                    break;
                }
                found_jump = true;
                path.push(dest);
                caps.push(mid);
                self.king_captures(
                    dest,
                    Some(opposite_direction(dir)),
                    visited | dest_bit,
                    captured | mid_bit,
                    path,
                    caps,
                    out,
                );
                path.pop();
                caps.pop();
                landing = neighbor(dest, dir);
            }
        }

        if !found_jump && !caps.is_empty() {
            out.push(Move::capture(path.clone(), caps.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CaptureFinder;
    use crate::game_state::position::Position;
    use crate::game_state::types::{Color, PieceKind};
    use crate::utils::algebraic::algebraic_to_square;

    fn empty_with(pieces: &[(&str, Color, PieceKind)]) -> Position {
        let mut position = Position::new_empty();
        for &(alg, color, kind) in pieces {
            let sq = algebraic_to_square(alg).expect("test square");
            position.put_piece(sq, color, kind).expect("empty board square");
        }
        crate::search::zobrist::refresh_position_hash(&mut position);
        position
    }

    #[test]
    fn man_jumps_single_adjacent_enemy() {
        let position = empty_with(&[
            ("a3", Color::White, PieceKind::Man),
            ("b4", Color::Black, PieceKind::Man),
        ]);
        let finder = CaptureFinder::new(&position, Color::White);
        let mut out = Vec::new();
        finder.sequences_for_piece(
            algebraic_to_square("a3").expect("a3"),
            PieceKind::Man,
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to_string(), "a3xc5");
        assert_eq!(out[0].captured, vec![algebraic_to_square("b4").expect("b4")]);
    }

    #[test]
    fn man_chains_through_two_victims() {
        let position = empty_with(&[
            ("a3", Color::White, PieceKind::Man),
            ("b4", Color::Black, PieceKind::Man),
            ("d6", Color::Black, PieceKind::Man),
        ]);
        let finder = CaptureFinder::new(&position, Color::White);
        let mut out = Vec::new();
        finder.sequences_for_piece(
            algebraic_to_square("a3").expect("a3"),
            PieceKind::Man,
            &mut out,
        );
        // Only the full double jump survives as a dead end.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].capture_count(), 2);
        assert_eq!(out[0].to_string(), "a3xc5xe7");
    }

    #[test]
    fn man_capture_stops_on_promotion_row() {
        // White man on b6 jumps c7 and lands on the back rank; a second
        // victim behind the back rank cannot extend the sequence.
        let position = empty_with(&[
            ("b6", Color::White, PieceKind::Man),
            ("c7", Color::Black, PieceKind::Man),
            ("e7", Color::Black, PieceKind::Man),
        ]);
        let finder = CaptureFinder::new(&position, Color::White);
        let mut out = Vec::new();
        finder.sequences_for_piece(
            algebraic_to_square("b6").expect("b6"),
            PieceKind::Man,
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].capture_count(), 1);
        assert_eq!(out[0].to_string(), "b6xd8");
    }

    #[test]
    fn king_flies_to_any_landing_beyond_victim() {
        let position = empty_with(&[
            ("a1", Color::White, PieceKind::King),
            ("d4", Color::Black, PieceKind::Man),
        ]);
        let finder = CaptureFinder::new(&position, Color::White);
        let mut out = Vec::new();
        finder.sequences_for_piece(
            algebraic_to_square("a1").expect("a1"),
            PieceKind::King,
            &mut out,
        );
        // Landings e5, f6, g7, h8 along the open diagonal.
        let rendered: Vec<String> = out.iter().map(|m| m.to_string()).collect();
        assert_eq!(out.len(), 4);
        assert!(rendered.contains(&"a1xe5".to_owned()));
        assert!(rendered.contains(&"a1xh8".to_owned()));
    }

    #[test]
    fn king_ray_is_blocked_by_own_piece() {
        let position = empty_with(&[
            ("a1", Color::White, PieceKind::King),
            ("c3", Color::White, PieceKind::Man),
            ("d4", Color::Black, PieceKind::Man),
        ]);
        let finder = CaptureFinder::new(&position, Color::White);
        let mut out = Vec::new();
        finder.sequences_for_piece(
            algebraic_to_square("a1").expect("a1"),
            PieceKind::King,
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn adjacent_enemy_pair_cannot_be_jumped() {
        // f6 is the first piece on the ray but e5 right behind it leaves no
        // landing square, so no capture exists at all.
        let position = empty_with(&[
            ("h8", Color::White, PieceKind::King),
            ("f6", Color::Black, PieceKind::Man),
            ("e5", Color::Black, PieceKind::Man),
        ]);
        let finder = CaptureFinder::new(&position, Color::White);
        let mut out = Vec::new();
        finder.sequences_for_piece(
            algebraic_to_square("h8").expect("h8"),
            PieceKind::King,
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn king_turns_after_landing_and_keeps_jumping() {
        // b8 takes c7, is forced to land on d6 (e5 occupies the ray), then
        // turns onto the SE ray and takes e5 as well.
        let position = empty_with(&[
            ("b8", Color::White, PieceKind::King),
            ("c7", Color::Black, PieceKind::Man),
            ("e5", Color::Black, PieceKind::Man),
        ]);
        let finder = CaptureFinder::new(&position, Color::White);
        let mut out = Vec::new();
        finder.sequences_for_piece(
            algebraic_to_square("b8").expect("b8"),
            PieceKind::King,
            &mut out,
        );
        let best = out.iter().max_by_key(|m| m.capture_count()).expect("captures");
        assert_eq!(best.capture_count(), 2);
        assert_eq!(best.path[0], algebraic_to_square("b8").expect("b8"));
        assert_eq!(best.path[1], algebraic_to_square("d6").expect("d6"));
    }
}
