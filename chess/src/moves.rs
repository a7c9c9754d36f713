//! Moves and their UCI notation

use crate::movegen;
use crate::position::Position;
use crate::types::{Color, Coord, CoordParseError, Piece};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Move kind
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveKind {
    /// Any move or capture except the special ones below, including pawn double pushes
    Common = 0,
    /// En passant capture
    EnPassant = 1,
    /// Pawn promotion, either capture or not
    Promotion = 2,
    /// Castling, encoded as the king's move
    Castling = 3,
}

/// Chess move
///
/// Moves are created by the move generator and are only meaningful in the position they were
/// generated for. Applying a move to some other position is a logic error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    src: Coord,
    dst: Coord,
    piece: Piece,
    promote: Option<Piece>,
    color: Color,
    kind: MoveKind,
}

impl Move {
    /// Creates a non-promoting move
    #[inline]
    pub const fn new(kind: MoveKind, src: Coord, dst: Coord, piece: Piece, color: Color) -> Move {
        Move {
            src,
            dst,
            piece,
            promote: None,
            color,
            kind,
        }
    }

    /// Creates a pawn promotion to `promote`
    #[inline]
    pub const fn promotion(src: Coord, dst: Coord, promote: Piece, color: Color) -> Move {
        Move {
            src,
            dst,
            piece: Piece::Pawn,
            promote: Some(promote),
            color,
            kind: MoveKind::Promotion,
        }
    }

    #[inline]
    pub const fn src(&self) -> Coord {
        self.src
    }

    #[inline]
    pub const fn dst(&self) -> Coord {
        self.dst
    }

    /// Type of the moving piece
    #[inline]
    pub const fn piece(&self) -> Piece {
        self.piece
    }

    /// Piece the pawn turns into, for promotions only
    #[inline]
    pub const fn promote(&self) -> Option<Piece> {
        self.promote
    }

    #[inline]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    /// Returns `true` if this is a pawn advancing by two ranks
    #[inline]
    pub const fn is_double_push(&self) -> bool {
        matches!(self.piece, Piece::Pawn) && self.src.index().abs_diff(self.dst.index()) == 16
    }

    /// Square of the pawn removed by an en passant capture
    #[inline]
    pub(crate) const fn enpassant_victim(&self) -> Coord {
        Coord::from_parts(self.dst.file(), self.src.rank())
    }

    /// Parses `s` in UCI notation and finds the matching legal move in `pos`
    pub fn from_uci(s: &str, pos: &Position) -> Result<Move, UciParseError> {
        let uci = UciMove::from_str(s)?;
        movegen::gen_all(pos)
            .iter()
            .copied()
            .find(|mv| mv.src == uci.src && mv.dst == uci.dst && mv.promote == uci.promote)
            .ok_or(UciParseError::NotLegal)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        UciMove {
            src: self.src,
            dst: self.dst,
            promote: self.promote,
        }
        .fmt(f)
    }
}

/// Error parsing a move in UCI notation
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum UciParseError {
    /// Bad string length
    #[error("bad string length")]
    BadLength,
    /// Bad source square
    #[error("bad source: {0}")]
    BadSrc(CoordParseError),
    /// Bad destination square
    #[error("bad destination: {0}")]
    BadDst(CoordParseError),
    /// Bad promote character
    #[error("bad promote char {0:?}")]
    BadPromote(char),
    /// Move is well-formed, but there is no such legal move in the position
    #[error("no such legal move")]
    NotLegal,
}

/// Move in UCI notation, not tied to any position
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
struct UciMove {
    src: Coord,
    dst: Coord,
    promote: Option<Piece>,
}

impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.src, self.dst)?;
        if let Some(p) = self.promote {
            write!(f, "{}", p.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for UciMove {
    type Err = UciParseError;

    fn from_str(s: &str) -> Result<UciMove, Self::Err> {
        if !s.is_ascii() || !matches!(s.len(), 4 | 5) {
            return Err(UciParseError::BadLength);
        }
        let src = Coord::from_str(&s[0..2]).map_err(UciParseError::BadSrc)?;
        let dst = Coord::from_str(&s[2..4]).map_err(UciParseError::BadDst)?;
        let promote = if s.len() == 5 {
            Some(match s.as_bytes()[4] {
                b'n' => Piece::Knight,
                b'b' => Piece::Bishop,
                b'r' => Piece::Rook,
                b'q' => Piece::Queen,
                b => return Err(UciParseError::BadPromote(b as char)),
            })
        } else {
            None
        };
        Ok(UciMove { src, dst, promote })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    #[test]
    fn test_simple() {
        let pos = Position::initial();
        let mv = Move::from_uci("e2e4", &pos).unwrap();
        assert_eq!(mv.src(), Coord::from_parts(File::E, Rank::R2));
        assert_eq!(mv.dst(), Coord::from_parts(File::E, Rank::R4));
        assert_eq!(mv.piece(), Piece::Pawn);
        assert_eq!(mv.kind(), MoveKind::Common);
        assert_eq!(mv.color(), Color::White);
        assert!(mv.is_double_push());
        assert_eq!(mv.to_string(), "e2e4");

        let mv = Move::from_uci("g1f3", &pos).unwrap();
        assert_eq!(mv.piece(), Piece::Knight);
        assert!(!mv.is_double_push());
    }

    #[test]
    fn test_errors() {
        let pos = Position::initial();
        assert_eq!(Move::from_uci("e2e5", &pos), Err(UciParseError::NotLegal));
        assert_eq!(Move::from_uci("e2", &pos), Err(UciParseError::BadLength));
        assert_eq!(
            Move::from_uci("e2e4qq", &pos),
            Err(UciParseError::BadLength)
        );
        assert!(matches!(
            Move::from_uci("z2e4", &pos),
            Err(UciParseError::BadSrc(_))
        ));
        assert!(matches!(
            Move::from_uci("e2e9", &pos),
            Err(UciParseError::BadDst(_))
        ));
        assert_eq!(
            Move::from_uci("e2e4k", &pos),
            Err(UciParseError::BadPromote('k'))
        );
    }

    #[test]
    fn test_special() {
        let pos = Position::from_fen("r3k2r/1P6/8/3pP3/8/8/8/R3K2R w KQkq d6 0 1").unwrap();

        let mv = Move::from_uci("e1g1", &pos).unwrap();
        assert_eq!(mv.kind(), MoveKind::Castling);
        assert_eq!(mv.piece(), Piece::King);
        let mv = Move::from_uci("e1c1", &pos).unwrap();
        assert_eq!(mv.kind(), MoveKind::Castling);

        let mv = Move::from_uci("e5d6", &pos).unwrap();
        assert_eq!(mv.kind(), MoveKind::EnPassant);
        assert_eq!(mv.enpassant_victim(), Coord::from_parts(File::D, Rank::R5));

        let mv = Move::from_uci("b7a8q", &pos).unwrap();
        assert_eq!(mv.kind(), MoveKind::Promotion);
        assert_eq!(mv.promote(), Some(Piece::Queen));
        assert_eq!(mv.to_string(), "b7a8q");
        let mv = Move::from_uci("b7b8n", &pos).unwrap();
        assert_eq!(mv.promote(), Some(Piece::Knight));
        assert_eq!(Move::from_uci("b7b8", &pos), Err(UciParseError::NotLegal));
    }
}
