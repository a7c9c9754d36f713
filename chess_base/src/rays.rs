//! Closed-form ray formulas
//!
//! All the functions here are `const` and branch-free, so they are cheap enough to be evaluated
//! by the build script of `kestrel`, which turns them into lookup tables. Rays never include
//! the origin square, while full lines ([`diagonal`], [`anti_diagonal`], [`rank_file`]) do.

use crate::bitboard::Bitboard;
use crate::types::Coord;

const MAIN_DIAGONAL: u64 = 0x8040_2010_0804_0201;
const MAIN_ANTI_DIAGONAL: u64 = 0x0102_0408_1020_4080;

/// Ray direction
///
/// Directions whose squares have increasing indices (`North`, `East`, `NorthEast`, `NorthWest`)
/// are called positive; the nearest blocker along them is the lowest set bit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    NorthEast = 2,
    NorthWest = 3,
    South = 4,
    West = 5,
    SouthWest = 6,
    SouthEast = 7,
}

impl Direction {
    pub const COUNT: usize = 8;

    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::South,
        Direction::West,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    pub const LINE: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const DIAG: [Direction; 4] = [
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const fn is_positive(&self) -> bool {
        (*self as u8) < 4
    }
}

pub const fn north(c: Coord) -> Bitboard {
    Bitboard::from_raw(0x0101_0101_0101_0100 << c.index())
}

pub const fn south(c: Coord) -> Bitboard {
    Bitboard::from_raw(0x0080_8080_8080_8080 >> (c.index() ^ 63))
}

pub const fn east(c: Coord) -> Bitboard {
    let sq = c.index();
    Bitboard::from_raw(((1_u64 << (sq | 7)) - (1_u64 << sq)).wrapping_mul(2))
}

pub const fn west(c: Coord) -> Bitboard {
    let sq = c.index();
    Bitboard::from_raw((1_u64 << sq) - (1_u64 << (sq & 56)))
}

const fn shifted_line(main: u64, d: i32) -> u64 {
    let nort = (-d & (d >> 31)) as u32;
    let sout = (d & (-d >> 31)) as u32;
    (main >> sout) << nort
}

/// Full a1-h8 style diagonal through `c`, origin included
pub const fn diagonal(c: Coord) -> Bitboard {
    let sq = c.index() as i32;
    let d = 8 * (sq & 7) - (sq & 56);
    Bitboard::from_raw(shifted_line(MAIN_DIAGONAL, d))
}

/// Full h1-a8 style anti-diagonal through `c`, origin included
pub const fn anti_diagonal(c: Coord) -> Bitboard {
    let sq = c.index() as i32;
    let d = 56 - 8 * (sq & 7) - (sq & 56);
    Bitboard::from_raw(shifted_line(MAIN_ANTI_DIAGONAL, d))
}

const fn above(c: Coord) -> u64 {
    (!1_u64) << c.index()
}

const fn below(c: Coord) -> u64 {
    (1_u64 << c.index()) - 1
}

pub const fn north_east(c: Coord) -> Bitboard {
    Bitboard::from_raw(diagonal(c).as_raw() & above(c))
}

pub const fn south_west(c: Coord) -> Bitboard {
    Bitboard::from_raw(diagonal(c).as_raw() & below(c))
}

pub const fn north_west(c: Coord) -> Bitboard {
    Bitboard::from_raw(anti_diagonal(c).as_raw() & above(c))
}

pub const fn south_east(c: Coord) -> Bitboard {
    Bitboard::from_raw(anti_diagonal(c).as_raw() & below(c))
}

pub const fn ray(d: Direction, c: Coord) -> Bitboard {
    match d {
        Direction::North => north(c),
        Direction::East => east(c),
        Direction::NorthEast => north_east(c),
        Direction::NorthWest => north_west(c),
        Direction::South => south(c),
        Direction::West => west(c),
        Direction::SouthWest => south_west(c),
        Direction::SouthEast => south_east(c),
    }
}

/// Rank and file through `c`, origin included
pub const fn rank_file(c: Coord) -> Bitboard {
    Bitboard::from_raw(
        north(c).as_raw()
            | south(c).as_raw()
            | east(c).as_raw()
            | west(c).as_raw()
            | (1_u64 << c.index()),
    )
}

/// Both diagonals through `c`, origin included
pub const fn diagonals(c: Coord) -> Bitboard {
    Bitboard::from_raw(diagonal(c).as_raw() | anti_diagonal(c).as_raw())
}

/// Squares strictly between `a` and `b`, or an empty set if they are not aligned
pub const fn between(a: Coord, b: Coord) -> Bitboard {
    let mut i = 0;
    while i < Direction::COUNT {
        let d = Direction::ALL[i];
        let from_a = ray(d, a);
        if from_a.has(b) {
            return Bitboard::from_raw(
                from_a.as_raw() & !ray(d, b).as_raw() & !(1_u64 << b.index()),
            );
        }
        i += 1;
    }
    Bitboard::EMPTY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    fn sq(file: File, rank: Rank) -> Coord {
        Coord::from_parts(file, rank)
    }

    #[test]
    fn test_axis_rays() {
        assert_eq!(west(sq(File::C, Rank::R3)).as_raw(), 0x30000);
        assert_eq!(west(sq(File::A, Rank::R1)).as_raw(), 0);
        assert_eq!(west(sq(File::H, Rank::R8)).as_raw(), 0x7f00_0000_0000_0000);

        assert_eq!(east(sq(File::A, Rank::R8)).as_raw(), 0xfe00_0000_0000_0000);
        assert_eq!(east(sq(File::D, Rank::R4)).as_raw(), 0xf000_0000);
        assert_eq!(east(sq(File::H, Rank::R1)).as_raw(), 0);

        assert_eq!(north(sq(File::C, Rank::R8)).as_raw(), 0);
        assert_eq!(north(sq(File::F, Rank::R2)).as_raw(), 0x2020_2020_2020_0000);
        assert_eq!(north(sq(File::A, Rank::R1)).as_raw(), 0x0101_0101_0101_0100);

        assert_eq!(south(sq(File::A, Rank::R1)).as_raw(), 0);
        assert_eq!(south(sq(File::B, Rank::R3)).as_raw(), 0x202);
        assert_eq!(south(sq(File::H, Rank::R8)).as_raw(), 0x0080_8080_8080_8080);
    }

    #[test]
    fn test_diagonal_lines() {
        assert_eq!(
            diagonal(sq(File::B, Rank::R1)).as_raw(),
            0x0080_4020_1008_0402
        );
        assert_eq!(
            diagonal(sq(File::A, Rank::R8)).as_raw(),
            0x0100_0000_0000_0000
        );
        assert_eq!(diagonal(sq(File::H, Rank::R1)).as_raw(), 0x80);

        assert_eq!(
            anti_diagonal(sq(File::H, Rank::R8)).as_raw(),
            0x8000_0000_0000_0000
        );
        assert_eq!(anti_diagonal(sq(File::A, Rank::R1)).as_raw(), 0x1);
        assert_eq!(
            anti_diagonal(sq(File::A, Rank::R8)).as_raw(),
            0x0102_0408_1020_4080
        );
    }

    #[test]
    fn test_diagonal_rays() {
        assert_eq!(south_west(sq(File::A, Rank::R1)).as_raw(), 0);
        assert_eq!(south_west(sq(File::H, Rank::R4)).as_raw(), 0x40_2010);
        assert_eq!(
            north_east(sq(File::A, Rank::R1)).as_raw(),
            0x8040_2010_0804_0200
        );
        assert_eq!(north_east(sq(File::H, Rank::R8)).as_raw(), 0);
        assert_eq!(
            north_west(sq(File::H, Rank::R1)).as_raw(),
            0x0102_0408_1020_4000
        );
        assert_eq!(north_west(sq(File::A, Rank::R8)).as_raw(), 0);
        assert_eq!(
            south_east(sq(File::A, Rank::R8)).as_raw(),
            0x0002_0408_1020_4080
        );
        assert_eq!(south_east(sq(File::H, Rank::R1)).as_raw(), 0);
    }

    #[test]
    fn test_rays_match_stepping() {
        let steps: [(Direction, isize, isize); 8] = [
            (Direction::North, 0, 1),
            (Direction::East, 1, 0),
            (Direction::NorthEast, 1, 1),
            (Direction::NorthWest, -1, 1),
            (Direction::South, 0, -1),
            (Direction::West, -1, 0),
            (Direction::SouthWest, -1, -1),
            (Direction::SouthEast, 1, -1),
        ];
        for c in Coord::iter() {
            for (d, df, dr) in steps {
                let mut expected = Bitboard::EMPTY;
                let mut cur = c;
                while let Some(next) = cur.shift(df, dr) {
                    expected.set(next);
                    cur = next;
                }
                assert_eq!(ray(d, c), expected, "direction {:?} from {}", d, c);
                if !expected.is_empty() {
                    let nearest = if d.is_positive() {
                        expected.first()
                    } else {
                        expected.last()
                    };
                    assert_eq!(c.shift(df, dr), Some(nearest));
                }
            }
        }
    }

    #[test]
    fn test_between() {
        let a1 = sq(File::A, Rank::R1);
        let h1 = sq(File::H, Rank::R1);
        let h8 = sq(File::H, Rank::R8);
        let b3 = sq(File::B, Rank::R3);
        assert_eq!(between(a1, h1).as_raw(), 0x7e);
        assert_eq!(between(h1, a1).as_raw(), 0x7e);
        assert_eq!(between(a1, h8).as_raw(), 0x0040_2010_0804_0200);
        assert_eq!(between(a1, b3), Bitboard::EMPTY);
        assert_eq!(between(a1, sq(File::B, Rank::R2)), Bitboard::EMPTY);
        assert_eq!(between(a1, a1), Bitboard::EMPTY);

        let e4 = sq(File::E, Rank::R4);
        let b7 = sq(File::B, Rank::R7);
        let expected = Bitboard::EMPTY
            .with(sq(File::D, Rank::R5))
            .with(sq(File::C, Rank::R6));
        assert_eq!(between(e4, b7), expected);
        assert_eq!(between(b7, e4), expected);
    }

    #[test]
    fn test_lines() {
        let d4 = sq(File::D, Rank::R4);
        assert_eq!(rank_file(d4).popcount(), 15);
        assert!(rank_file(d4).has(d4));
        assert_eq!(diagonals(d4).popcount(), 14);
        assert!(diagonals(d4).has(d4));
    }
}
