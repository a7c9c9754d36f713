use crate::types::Coord;
use derive_more::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};
use std::fmt;
use std::iter::IntoIterator;

const DEBRUIJN_MAGIC: u64 = 0x03f7_9d71_b4cb_0a89;

const DEBRUIJN_INDEX: [u8; 64] = [
    0, 47, 1, 56, 48, 27, 2, 60, 57, 49, 41, 37, 28, 16, 3, 61, 54, 58, 35, 52, 50, 42, 21, 44, 38,
    32, 29, 23, 17, 11, 4, 62, 46, 55, 26, 59, 40, 36, 15, 53, 34, 51, 20, 43, 31, 22, 10, 45, 25,
    39, 14, 33, 19, 30, 9, 24, 13, 18, 8, 12, 7, 6, 5, 63,
];

/// Index of the least significant set bit
///
/// # Panics
///
/// Panics if `bb` is zero.
#[inline]
pub const fn bit_scan_forward(bb: u64) -> usize {
    assert!(bb != 0, "bit scan of an empty bitboard");
    DEBRUIJN_INDEX[((bb ^ bb.wrapping_sub(1)).wrapping_mul(DEBRUIJN_MAGIC) >> 58) as usize] as usize
}

/// Index of the most significant set bit
///
/// # Panics
///
/// Panics if `bb` is zero.
#[inline]
pub const fn bit_scan_reverse(bb: u64) -> usize {
    assert!(bb != 0, "bit scan of an empty bitboard");
    let mut bb = bb;
    bb |= bb >> 1;
    bb |= bb >> 2;
    bb |= bb >> 4;
    bb |= bb >> 8;
    bb |= bb >> 16;
    bb |= bb >> 32;
    DEBRUIJN_INDEX[(bb.wrapping_mul(DEBRUIJN_MAGIC) >> 58) as usize] as usize
}

/// Number of set bits, one iteration per bit
#[inline]
pub const fn population_count(mut bb: u64) -> u32 {
    let mut count = 0;
    while bb != 0 {
        count += 1;
        bb &= bb - 1;
    }
    count
}

#[inline]
pub const fn remove_lsb(bb: u64) -> u64 {
    bb & bb.wrapping_sub(1)
}

/// Set of squares
#[derive(
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    BitAnd,
    BitAndAssign,
    BitOr,
    BitOrAssign,
    BitXor,
    BitXorAssign,
    Not,
)]
pub struct Bitboard(u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);
    pub const FULL: Bitboard = Bitboard(!0);

    pub const fn from_raw(val: u64) -> Bitboard {
        Bitboard(val)
    }

    pub const fn from_coord(coord: Coord) -> Bitboard {
        Bitboard(1_u64 << coord.index())
    }

    pub const fn with(self, coord: Coord) -> Bitboard {
        Bitboard(self.0 | (1_u64 << coord.index()))
    }

    pub const fn without(self, coord: Coord) -> Bitboard {
        Bitboard(self.0 & !(1_u64 << coord.index()))
    }

    pub const fn shl(self, by: usize) -> Bitboard {
        Bitboard(self.0 << by)
    }

    pub fn set(&mut self, coord: Coord) {
        *self = self.with(coord);
    }

    pub fn unset(&mut self, coord: Coord) {
        *self = self.without(coord);
    }

    pub const fn has(&self, coord: Coord) -> bool {
        ((self.0 >> coord.index()) & 1) != 0
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    pub const fn popcount(&self) -> u32 {
        population_count(self.0)
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Lowest square of a nonempty bitboard
    #[inline]
    pub const fn first(&self) -> Coord {
        Coord::from_index(bit_scan_forward(self.0))
    }

    /// Highest square of a nonempty bitboard
    #[inline]
    pub const fn last(&self) -> Coord {
        Coord::from_index(bit_scan_reverse(self.0))
    }}

impl From<Bitboard> for u64 {
    fn from(b: Bitboard) -> u64 {
        b.0
    }
}

impl From<u64> for Bitboard {
    fn from(u: u64) -> Bitboard {
        Bitboard(u)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Bitboard({})", self)
    }
}

/// Ranks from 8 down to 1, files from A to H within a rank
impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for rank in (0..8).rev() {
            let row = (self.0 >> (rank * 8)) as u8;
            write!(f, "{:08b}", row.reverse_bits())?;
            if rank != 0 {
                write!(f, "/")?;
            }
        }
        Ok(())
    }
}

pub struct Iter(u64);

impl Iterator for Iter {
    type Item = Coord;

    #[inline]
    fn next(&mut self) -> Option<Coord> {
        if self.0 == 0 {
            return None;
        }
        let bit = bit_scan_forward(self.0);
        self.0 = remove_lsb(self.0);
        unsafe { Some(Coord::from_index_unchecked(bit)) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = population_count(self.0) as usize;
        (len, Some(len))
    }
}

impl IntoIterator for Bitboard {
    type Item = Coord;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        Iter(self.0)
    }
}
