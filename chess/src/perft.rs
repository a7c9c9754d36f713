//! Perft, the move generator's standard correctness check

use crate::movegen::{self, MoveCounter};
use crate::moves::Move;
use crate::position::Position;

/// Counts the leaf nodes of the legal move tree of depth `depth`
///
/// The last ply is counted without applying the moves.
pub fn perft(pos: &mut Position, depth: usize) -> u64 {
    match depth {
        0 => 1,
        1 => {
            let mut counter = MoveCounter::default();
            movegen::gen_all_into(pos, &mut counter);
            counter.0 as u64
        }
        _ => {
            let mut nodes = 0;
            for mv in movegen::gen_all(pos) {
                pos.do_move(mv);
                nodes += perft(pos, depth - 1);
                pos.undo_move();
            }
            nodes
        }
    }
}

/// Splits [`perft()`] by the root move, in move generation order
pub fn perft_divide(pos: &mut Position, depth: usize) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    movegen::gen_all(pos)
        .into_iter()
        .map(|mv| {
            pos.do_move(mv);
            let nodes = perft(pos, depth - 1);
            pos.undo_move();
            (mv, nodes)
        })
        .collect()
}
