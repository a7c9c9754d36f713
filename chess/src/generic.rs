//! Compile-time colors, to let the move generator monomorphize per side

use crate::bitboard::Bitboard;
use crate::{bitboard_consts, geometry, types};

pub trait Color {
    const COLOR: types::Color;
    /// Shift from the first rank to the castling rank
    const CASTLING_OFFSET: usize;
    const PAWN_FORWARD: isize = geometry::pawn_forward_delta(Self::COLOR);
    /// Pawns standing here promote on their next move
    const PROMOTE_SRC: Bitboard = bitboard_consts::rank(geometry::promote_src_rank(Self::COLOR));
    const DOUBLE_PUSH_SRC: Bitboard =
        bitboard_consts::rank(geometry::double_move_src_rank(Self::COLOR));
    type Inv: Color;
}

pub struct White;
pub struct Black;

impl Color for White {
    const COLOR: types::Color = types::Color::White;
    const CASTLING_OFFSET: usize = 0;
    type Inv = Black;
}

impl Color for Black {
    const COLOR: types::Color = types::Color::Black;
    const CASTLING_OFFSET: usize = 56;
    type Inv = White;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coord, File, Rank};

    #[test]
    fn test_pawn_masks() {
        let e2 = Coord::from_parts(File::E, Rank::R2);
        let e7 = Coord::from_parts(File::E, Rank::R7);
        assert!(White::DOUBLE_PUSH_SRC.has(e2));
        assert!(White::PROMOTE_SRC.has(e7));
        assert!(Black::DOUBLE_PUSH_SRC.has(e7));
        assert!(Black::PROMOTE_SRC.has(e2));
        assert_eq!(
            e2.add(White::PAWN_FORWARD),
            Coord::from_parts(File::E, Rank::R3)
        );
        assert_eq!(
            e7.add(Black::PAWN_FORWARD),
            Coord::from_parts(File::E, Rank::R6)
        );
    }
}
