//! Attack tables and sliding attacks
//!
//! Near attacks (king, knight, pawn) are plain lookups. Sliding attacks walk each ray of the
//! slider up to the nearest blocker, which is found with a single bit scan.

use crate::bitboard::Bitboard;
use crate::types::{Color, Coord, Piece};

use kestrel_base::rays::Direction;

#[inline]
const fn bb(val: u64) -> Bitboard {
    Bitboard::from_raw(val)
}

include!(concat!(env!("OUT_DIR"), "/near_attacks.rs"));
include!(concat!(env!("OUT_DIR"), "/rays.rs"));

/// Blocker placed at the far end of positive rays, so the scan always hits something
const POSITIVE_SENTINEL: Bitboard = bb(1 << 63);
/// Blocker placed at the far end of negative rays
const NEGATIVE_SENTINEL: Bitboard = bb(1);

#[inline]
pub fn king(coord: Coord) -> Bitboard {
    unsafe { *KING_ATTACKS.get_unchecked(coord.index()) }
}

#[inline]
pub fn knight(coord: Coord) -> Bitboard {
    unsafe { *KNIGHT_ATTACKS.get_unchecked(coord.index()) }
}

/// Squares attacked by a pawn of color `color` standing on `coord`
#[inline]
pub fn pawn(color: Color, coord: Coord) -> Bitboard {
    match color {
        Color::White => unsafe { *WHITE_PAWN_ATTACKS.get_unchecked(coord.index()) },
        Color::Black => unsafe { *BLACK_PAWN_ATTACKS.get_unchecked(coord.index()) },
    }
}

/// Ray from `coord` in direction `d`, origin excluded
#[inline]
pub fn ray(d: Direction, coord: Coord) -> Bitboard {
    unsafe { *RAYS.get_unchecked(d.index()).get_unchecked(coord.index()) }
}

/// Squares strictly between `a` and `b`, empty if they don't share a line
#[inline]
pub fn between(a: Coord, b: Coord) -> Bitboard {
    unsafe { *BETWEEN.get_unchecked(a.index()).get_unchecked(b.index()) }
}

/// Rank and file through `coord`, origin included
#[inline]
pub fn rank_file(coord: Coord) -> Bitboard {
    unsafe { *RANK_FILE.get_unchecked(coord.index()) }
}

/// Both diagonals through `coord`, origin included
#[inline]
pub fn diagonals(coord: Coord) -> Bitboard {
    unsafe { *DIAGONALS.get_unchecked(coord.index()) }
}

/// Attacks along a single ray, up to and including the nearest blocker
#[inline]
fn slide(d: Direction, coord: Coord, occupied: Bitboard) -> Bitboard {
    let full = ray(d, coord);
    let blocker = if d.is_positive() {
        ((full & occupied) | POSITIVE_SENTINEL).first()
    } else {
        ((full & occupied) | NEGATIVE_SENTINEL).last()
    };
    full & !ray(d, blocker)
}

/// Kind of a sliding piece
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Slider {
    Rook,
    Bishop,
    Queen,
}

impl Slider {
    pub const fn from_piece(p: Piece) -> Option<Slider> {
        match p {
            Piece::Rook => Some(Slider::Rook),
            Piece::Bishop => Some(Slider::Bishop),
            Piece::Queen => Some(Slider::Queen),
            _ => None,
        }
    }

    pub const fn piece(self) -> Piece {
        match self {
            Slider::Rook => Piece::Rook,
            Slider::Bishop => Piece::Bishop,
            Slider::Queen => Piece::Queen,
        }
    }

    /// Directions along which the slider moves
    pub const fn directions(self) -> &'static [Direction] {
        const QUEEN: [Direction; 8] = Direction::ALL;
        match self {
            Slider::Rook => &Direction::LINE,
            Slider::Bishop => &Direction::DIAG,
            Slider::Queen => &QUEEN,
        }
    }

    /// Squares attacked from `coord` given the occupancy `occupied`
    ///
    /// The first piece on each ray is included, regardless of its color.
    #[inline]
    pub fn attacks(self, coord: Coord, occupied: Bitboard) -> Bitboard {
        let mut res = Bitboard::EMPTY;
        for &d in self.directions() {
            res |= slide(d, coord, occupied);
        }
        res
    }
}

#[inline]
pub fn rook(coord: Coord, occupied: Bitboard) -> Bitboard {
    Slider::Rook.attacks(coord, occupied)
}

#[inline]
pub fn bishop(coord: Coord, occupied: Bitboard) -> Bitboard {
    Slider::Bishop.attacks(coord, occupied)
}

#[inline]
pub fn queen(coord: Coord, occupied: Bitboard) -> Bitboard {
    rook(coord, occupied) | bishop(coord, occupied)
}
