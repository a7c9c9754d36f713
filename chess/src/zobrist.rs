//! Zobrist keys
//!
//! The keys are generated by the build script from a fixed seed, so hashes are stable between
//! builds.

use crate::position::Board;
use crate::types::{CastlingRights, Cell, Color, Coord, File, Piece};

include!(concat!(env!("OUT_DIR"), "/zobrist.rs"));

#[inline]
pub fn pieces(cell: Cell, coord: Coord) -> u64 {
    PIECES[cell.index()][coord.index()]
}

#[inline]
pub fn enpassant(file: File) -> u64 {
    ENPASSANT[file.index()]
}

#[inline]
pub fn castling(rights: CastlingRights) -> u64 {
    CASTLING[rights.index()]
}

/// Hash of the board contents alone
pub fn board(board: &Board) -> u64 {
    let mut hash = 0;
    for c in [Color::White, Color::Black] {
        for p in Piece::iter() {
            let cell = Cell::from_parts(c, p);
            for coord in board.piece2(c, p) {
                hash ^= pieces(cell, coord);
            }
        }
    }
    hash
}

/// Full position hash: board, side to move, castling rights and en passant file
pub fn position(
    b: &Board,
    side: Color,
    rights: CastlingRights,
    enpassant_file: Option<File>,
) -> u64 {
    let mut hash = board(b) ^ castling(rights);
    if side == Color::Black {
        hash ^= MOVE_SIDE;
    }
    if let Some(file) = enpassant_file {
        hash ^= enpassant(file);
    }
    hash
}
