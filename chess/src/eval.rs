//! Static evaluation
//!
//! Scores are centipawns from the point of view of the side to move. [`DefaultEvaluator`] blends a
//! midgame and an endgame score according to the non-pawn material left on the board.

use crate::attack;
use crate::bitboard::Bitboard;
use crate::bitboard_consts::{self, CENTER};
use crate::position::{Board, Position};
use crate::types::{Color, File, Piece};

use kestrel_base::rays::Direction;

pub type Score = i32;

/// Score of a side that delivers checkmate at the root
pub const WHITE_WIN: Score = 10_000;
/// Score of a side that is checkmated at the root
pub const BLACK_WIN: Score = -WHITE_WIN;
pub const DRAW: Score = 0;

/// Static evaluations never leave `-EVAL_LIMIT..=EVAL_LIMIT`, so they cannot be confused with
/// mate scores
pub const EVAL_LIMIT: Score = 8_000;

pub trait Evaluator {
    /// Deterministic score of `pos` for the side to move
    fn evaluate(&self, pos: &Position) -> Score;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, pos: &Position) -> Score {
        (**self).evaluate(pos)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Stage {
    Midgame = 0,
    Endgame = 1,
}

const PIECE_VALUES: [[Score; Piece::COUNT]; 2] = [
    [100, 320, 320, 500, 1000, 0],
    [150, 320, 320, 550, 1050, 0],
];

/// Non-pawn material (both sides, midgame values) at which the game is considered an endgame
const ENDGAME_MATERIAL: Score = 3400;
/// Non-pawn material at which the game is considered a midgame
const MIDGAME_MATERIAL: Score = 6880;

/// Phase of a position with most of the pieces still on the board
pub const PHASE_MIDGAME: Score = 128;

const CENTRAL_PAWN_BONUS: Score = 10;
const PASSED_PAWN_STEP_BONUS: Score = 2;
const DOUBLED_PAWN_PENALTY: Score = 15;

// King placement masks, given for White. Black uses the same masks mirrored vertically.
const KING_SHELTER: Bitboard = Bitboard::from_raw(0x0000_0000_0000_0046);
const KING_EXPOSED: Bitboard = Bitboard::from_raw(0x003c_ffff_ffff_3c00);
const KING_EDGE: Bitboard = Bitboard::from_raw(0xe7c3_8100_0081_c3e7);
const KING_NEAR_CENTER: Bitboard = Bitboard::from_raw(0x003c_6642_4266_3c00);
const KING_CENTER: Bitboard = Bitboard::from_raw(0x0000_183c_3c18_0000);

#[inline]
pub const fn piece_value(p: Piece) -> Score {
    PIECE_VALUES[Stage::Midgame as usize][p.index()]
}

#[inline]
const fn sign(c: Color) -> Score {
    match c {
        Color::White => 1,
        Color::Black => -1,
    }
}

fn flip(b: Bitboard) -> Bitboard {
    Bitboard::from_raw(b.as_raw().swap_bytes())
}

fn king_mask(c: Color, mask: Bitboard) -> Bitboard {
    match c {
        Color::White => mask,
        Color::Black => flip(mask),
    }
}

fn material(board: &Board, stage: Stage) -> Score {
    let mut res = 0;
    for c in [Color::White, Color::Black] {
        for p in Piece::iter() {
            let count = board.piece2(c, p).popcount() as Score;
            res += sign(c) * count * PIECE_VALUES[stage as usize][p.index()];
        }
    }
    res
}

fn mobility(board: &Board, stage: Stage) -> Score {
    let occupied = board.color(Color::White) | board.color(Color::Black);
    let mut res = 0;
    for c in [Color::White, Color::Black] {
        let mut squares = 0;
        for src in board.piece2(c, Piece::Bishop) {
            squares += attack::bishop(src, occupied).popcount();
        }
        for src in board.piece2(c, Piece::Knight) {
            squares += attack::knight(src).popcount();
        }
        if stage == Stage::Endgame {
            for src in board.piece2(c, Piece::Rook) {
                squares += attack::rook(src, occupied).popcount();
            }
            for src in board.piece2(c, Piece::Queen) {
                squares += attack::queen(src, occupied).popcount() % 4;
            }
        }
        res += sign(c) * squares as Score;
    }
    res
}

fn central_pawns(board: &Board) -> Score {
    let white = (board.piece2(Color::White, Piece::Pawn) & CENTER).popcount() as Score;
    let black = (board.piece2(Color::Black, Piece::Pawn) & CENTER).popcount() as Score;
    (white - black) * CENTRAL_PAWN_BONUS
}

fn passed_pawns(board: &Board) -> Score {
    let mut res = 0;
    for c in [Color::White, Color::Black] {
        let (ahead, behind) = match c {
            Color::White => (Direction::North, Direction::South),
            Color::Black => (Direction::South, Direction::North),
        };
        let enemy_pawns = board.piece2(c.inv(), Piece::Pawn);
        for pawn in board.piece2(c, Piece::Pawn) {
            if (attack::ray(ahead, pawn) & enemy_pawns).is_nonempty() {
                continue;
            }
            let steps = attack::ray(behind, pawn).popcount() as Score;
            res += sign(c) * steps * PASSED_PAWN_STEP_BONUS;
        }
    }
    res
}

fn doubled_pawns(board: &Board) -> Score {
    let mut res = 0;
    for c in [Color::White, Color::Black] {
        let pawns = board.piece2(c, Piece::Pawn);
        for file in File::iter() {
            let count = (pawns & bitboard_consts::file(file)).popcount() as Score;
            if count > 1 {
                res -= sign(c) * (count - 1) * DOUBLED_PAWN_PENALTY;
            }
        }
    }
    res
}

fn king_placement(board: &Board, stage: Stage) -> Score {
    let mut res = 0;
    for c in [Color::White, Color::Black] {
        let king = board.piece2(c, Piece::King);
        let hits = |mask: Bitboard| (king & king_mask(c, mask)).popcount() as Score;
        let score = match stage {
            Stage::Midgame => 20 * hits(KING_SHELTER) - 40 * hits(KING_EXPOSED),
            Stage::Endgame => {
                -40 * hits(KING_EDGE) + 10 * hits(KING_NEAR_CENTER) + 40 * hits(KING_CENTER)
            }
        };
        res += sign(c) * score;
    }
    res
}

/// Game phase, from `0` (endgame) to [`PHASE_MIDGAME`]
pub fn phase(board: &Board) -> Score {
    let mut npm = 0;
    for c in [Color::White, Color::Black] {
        for p in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
            npm += board.piece2(c, p).popcount() as Score * piece_value(p);
        }
    }
    let npm = npm.clamp(ENDGAME_MATERIAL, MIDGAME_MATERIAL);
    (npm - ENDGAME_MATERIAL) * PHASE_MIDGAME / (MIDGAME_MATERIAL - ENDGAME_MATERIAL)
}

fn stage_score(board: &Board, stage: Stage) -> Score {
    let pawns = match stage {
        Stage::Midgame => central_pawns(board),
        Stage::Endgame => passed_pawns(board),
    };
    material(board, stage)
        + mobility(board, stage)
        + pawns
        + doubled_pawns(board)
        + king_placement(board, stage)
}

fn side_relative(pos: &Position, white_score: Score) -> Score {
    let score = white_score.clamp(-EVAL_LIMIT, EVAL_LIMIT);
    score * sign(pos.side())
}

/// Tapered evaluation with material, mobility, pawn structure and king placement terms
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DefaultEvaluator;

impl Evaluator for DefaultEvaluator {
    fn evaluate(&self, pos: &Position) -> Score {
        if pos.rule50() >= 100 {
            return DRAW;
        }
        let board = pos.board();
        let phase = phase(board);
        let mid = stage_score(board, Stage::Midgame);
        let end = stage_score(board, Stage::Endgame);
        side_relative(
            pos,
            (mid * phase + end * (PHASE_MIDGAME - phase)) / PHASE_MIDGAME,
        )
    }
}

/// Counts midgame material only
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, pos: &Position) -> Score {
        if pos.rule50() >= 100 {
            return DRAW;
        }
        side_relative(pos, material(pos.board(), Stage::Midgame))
    }
}
