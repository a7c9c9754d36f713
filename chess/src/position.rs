//! Position and related things

use crate::bitboard::Bitboard;
use crate::moves::{Move, MoveKind};
use crate::types::{self, CastlingRights, CastlingSide, Cell, Color, Coord, File, Piece, Rank};
use crate::{attack, bitboard_consts, geometry, zobrist};

use std::fmt::{self, Display};
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

/// Position validation error
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// Invalid enpassant target (i.e. it is located on an invalid rank)
    #[error("invalid enpassant position {0}")]
    InvalidEnpassant(Coord),
    /// Too many pieces of given color
    ///
    /// No more than 16 pieces of each color is allowed.
    #[error("too many pieces of color {0:?}")]
    TooManyPieces(Color),
    /// One of the sides doesn't have a king
    #[error("no king of color {0:?}")]
    NoKing(Color),
    /// One of the sides has more than one king
    #[error("more than one king of color {0:?}")]
    TooManyKings(Color),
    /// There is a pawn on the 1st or on the 8th rank
    #[error("invalid pawn position {0}")]
    InvalidPawn(Coord),
    /// Opponent's king is under attack
    #[error("opponent's king is attacked")]
    OpponentKingAttacked,
}

/// Error parsing the first part of FEN (i.e. the positions of pieces on the board)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CellsParseError {
    /// Rank is too large
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank is too small
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
}

/// Error parsing [`RawPosition`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RawFenParseError {
    /// FEN contains non-ASCII characters
    #[error("non-ASCII data in FEN")]
    NonAscii,
    /// FEN doesn't have board part
    #[error("board not specified")]
    NoBoard,
    /// Error parsing board from FEN
    #[error("bad board: {0}")]
    Board(#[from] CellsParseError),
    /// FEN doesn't have move side part
    #[error("no move side")]
    NoMoveSide,
    /// Error parsing move side from FEN
    #[error("bad move side: {0}")]
    MoveSide(#[from] types::ColorParseError),
    /// FEN doesn't have castling rights part
    #[error("no castling rights")]
    NoCastling,
    /// Error parsing castling rights from FEN
    #[error("bad castling rights: {0}")]
    Castling(#[from] types::CastlingRightsParseError),
    /// FEN doesn't have enpassant part
    #[error("no enpassant")]
    NoEnpassant,
    /// Error parsing enpassant from FEN
    #[error("bad enpassant: {0}")]
    Enpassant(#[from] types::CoordParseError),
    /// Enpassant rank is invalid
    #[error("invalid enpassant rank {0}")]
    InvalidEnpassantRank(Rank),
    /// Error parsing the halfmove clock
    #[error("bad halfmove clock: {0}")]
    Rule50(ParseIntError),
    /// Error parsing move number
    #[error("bad move number: {0}")]
    MoveNumber(ParseIntError),
    /// FEN contains extra data
    #[error("extra data in FEN")]
    ExtraData,
}

/// Error parsing [`Position`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum FenParseError {
    /// FEN cannot be parsed
    #[error("cannot parse fen: {0}")]
    Fen(#[from] RawFenParseError),
    /// FEN was parsed, but the position is invalid
    #[error("invalid position: {0}")]
    Valid(#[from] ValidateError),
}

/// Unvalidated position, as written in FEN
///
/// Use it to build or edit positions programmatically, then convert it to [`Position`] via
/// [`Position::try_from()`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RawPosition {
    /// Contents of the board, indexed by [`Coord::index()`]
    pub cells: [Cell; 64],
    /// Side to move
    pub side: Color,
    /// Castling rights
    pub castling: CastlingRights,
    /// Square passed over by the last double pawn push, if any
    pub ep_target: Option<Coord>,
    /// Number of half-moves without pawn moves or captures
    pub rule50: u16,
    /// Move number, incremented after each move by Black
    pub move_number: u16,
}

impl RawPosition {
    #[inline]
    pub const fn empty() -> RawPosition {
        RawPosition {
            cells: [Cell::EMPTY; 64],
            side: Color::White,
            castling: CastlingRights::EMPTY,
            ep_target: None,
            rule50: 0,
            move_number: 1,
        }
    }

    /// Returns the initial position
    pub fn initial() -> RawPosition {
        let mut res = RawPosition {
            castling: CastlingRights::FULL,
            ..RawPosition::empty()
        };
        for file in File::iter() {
            res.put2(file, Rank::R2, Cell::from_parts(Color::White, Piece::Pawn));
            res.put2(file, Rank::R7, Cell::from_parts(Color::Black, Piece::Pawn));
        }
        for (color, rank) in [(Color::White, Rank::R1), (Color::Black, Rank::R8)] {
            res.put2(File::A, rank, Cell::from_parts(color, Piece::Rook));
            res.put2(File::B, rank, Cell::from_parts(color, Piece::Knight));
            res.put2(File::C, rank, Cell::from_parts(color, Piece::Bishop));
            res.put2(File::D, rank, Cell::from_parts(color, Piece::Queen));
            res.put2(File::E, rank, Cell::from_parts(color, Piece::King));
            res.put2(File::F, rank, Cell::from_parts(color, Piece::Bishop));
            res.put2(File::G, rank, Cell::from_parts(color, Piece::Knight));
            res.put2(File::H, rank, Cell::from_parts(color, Piece::Rook));
        }
        res
    }

    #[inline]
    pub fn from_fen(fen: &str) -> Result<RawPosition, RawFenParseError> {
        RawPosition::from_str(fen)
    }

    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        self.cells[c.index()]
    }

    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Cell {
        self.get(Coord::from_parts(file, rank))
    }

    #[inline]
    pub fn put(&mut self, c: Coord, cell: Cell) {
        self.cells[c.index()] = cell;
    }

    #[inline]
    pub fn put2(&mut self, file: File, rank: Rank, cell: Cell) {
        self.put(Coord::from_parts(file, rank), cell);
    }

    /// Wraps the position to allow pretty-printing with the given style
    #[inline]
    pub fn pretty(&self, style: PrettyStyle) -> Pretty<'_> {
        Pretty { raw: self, style }
    }

    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl Default for RawPosition {
    #[inline]
    fn default() -> RawPosition {
        RawPosition::empty()
    }
}

/// Twelve piece bitboards, one per color and piece kind
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    pieces: [[Bitboard; Piece::COUNT]; 2],
}

impl Board {
    pub const EMPTY: Board = Board {
        pieces: [[Bitboard::EMPTY; Piece::COUNT]; 2],
    };

    #[inline]
    pub fn piece2(&self, c: Color, p: Piece) -> Bitboard {
        self.pieces[c.index()][p.index()]
    }

    /// Returns the bitboard over all the pieces with color `c`
    #[inline]
    pub fn color(&self, c: Color) -> Bitboard {
        let mut res = Bitboard::EMPTY;
        for bb in &self.pieces[c.index()] {
            res |= *bb;
        }
        res
    }

    /// Bishops and queens of color `c`
    #[inline]
    pub fn piece_diag(&self, c: Color) -> Bitboard {
        self.piece2(c, Piece::Bishop) | self.piece2(c, Piece::Queen)
    }

    /// Rooks and queens of color `c`
    #[inline]
    pub fn piece_line(&self, c: Color) -> Bitboard {
        self.piece2(c, Piece::Rook) | self.piece2(c, Piece::Queen)
    }

    /// Kind of the piece of color `c` standing on `coord`, if any
    #[inline]
    pub fn piece_at(&self, c: Color, coord: Coord) -> Option<Piece> {
        Piece::iter().find(|p| self.piece2(c, *p).has(coord))
    }

    pub fn get(&self, coord: Coord) -> Cell {
        for c in [Color::White, Color::Black] {
            if let Some(p) = self.piece_at(c, coord) {
                return Cell::from_parts(c, p);
            }
        }
        Cell::EMPTY
    }

    /// Position of the king of color `c`
    ///
    /// # Panics
    ///
    /// Panics if there is no such king, which cannot happen on a validated position.
    #[inline]
    pub fn king_pos(&self, c: Color) -> Coord {
        self.piece2(c, Piece::King).first()
    }

    /// All the pieces of color `by` that attack `coord`, sliding through `occupied`
    #[inline]
    pub fn attackers(&self, coord: Coord, by: Color, occupied: Bitboard) -> Bitboard {
        (attack::pawn(by.inv(), coord) & self.piece2(by, Piece::Pawn))
            | (attack::knight(coord) & self.piece2(by, Piece::Knight))
            | (attack::king(coord) & self.piece2(by, Piece::King))
            | (attack::rook(coord, occupied) & self.piece_line(by))
            | (attack::bishop(coord, occupied) & self.piece_diag(by))
    }

    #[inline]
    pub(crate) fn put(&mut self, c: Color, p: Piece, coord: Coord) {
        self.pieces[c.index()][p.index()].set(coord);
    }

    #[inline]
    pub(crate) fn remove(&mut self, c: Color, p: Piece, coord: Coord) {
        self.pieces[c.index()][p.index()].unset(coord);
    }

    #[inline]
    pub(crate) fn relocate(&mut self, c: Color, p: Piece, src: Coord, dst: Coord) {
        self.pieces[c.index()][p.index()] ^= Bitboard::from_coord(src) | Bitboard::from_coord(dst);
    }
}

/// Number of attackers on the king of the side to move
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CheckType {
    NoCheck,
    Single,
    Double,
}

/// Incremental part of the position, one snapshot per ply
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct State {
    previous_move: Option<Move>,
    captured: Option<Piece>,
    castling: CastlingRights,
    rule50: u16,
    move_number: u16,
    side: Color,
    allies: Bitboard,
    enemies: Bitboard,
    occupied: Bitboard,
}

const fn castling_voids() -> [CastlingRights; 64] {
    const WHITE_OO: usize = 1;
    const WHITE_OOO: usize = 2;
    const BLACK_OO: usize = 4;
    const BLACK_OOO: usize = 8;

    let mut res = [CastlingRights::EMPTY; 64];
    res[0] = CastlingRights::from_index(WHITE_OOO);
    res[4] = CastlingRights::from_index(WHITE_OO | WHITE_OOO);
    res[7] = CastlingRights::from_index(WHITE_OO);
    res[56] = CastlingRights::from_index(BLACK_OOO);
    res[60] = CastlingRights::from_index(BLACK_OO | BLACK_OOO);
    res[63] = CastlingRights::from_index(BLACK_OO);
    res
}

/// Rights lost when a piece leaves or arrives at the given square
const CASTLING_VOIDS: [CastlingRights; 64] = castling_voids();

/// Source and destination of the rook for a castling with king destination `dst`
fn castling_rook(dst: Coord) -> (Coord, Coord) {
    let rank = dst.rank();
    match dst.file() {
        File::G => (Coord::from_parts(File::H, rank), Coord::from_parts(File::F, rank)),
        _ => (Coord::from_parts(File::A, rank), Coord::from_parts(File::D, rank)),
    }
}

/// Chess position with the history of the moves made on it
///
/// The position is always valid. Moves are applied with [`Position::do_move()`] and reverted with
/// [`Position::undo_move()`] in strict LIFO order. Every applied move pushes a [`State`] snapshot,
/// so undoing a move restores all the cached fields exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    states: Vec<State>,
}

impl Position {
    pub fn initial() -> Position {
        Position::from_raw(RawPosition::initial())
            .expect("initial position is valid")
    }

    pub fn from_fen(fen: &str) -> Result<Position, FenParseError> {
        Position::from_str(fen)
    }

    pub fn from_raw(raw: RawPosition) -> Result<Position, ValidateError> {
        Position::try_from(raw)
    }

    #[inline]
    fn state(&self) -> &State {
        // Never empty, the root state is pushed on creation
        &self.states[self.states.len() - 1]
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        self.board.get(c)
    }

    /// Side to move
    #[inline]
    pub fn side(&self) -> Color {
        self.state().side
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.state().castling
    }

    #[inline]
    pub fn rule50(&self) -> u16 {
        self.state().rule50
    }

    #[inline]
    pub fn move_number(&self) -> u16 {
        self.state().move_number
    }

    /// Last move made, or the synthetic double push which allows en passant at the root
    ///
    /// Returns `None` at the root without en passant and after a null move.
    #[inline]
    pub fn previous_move(&self) -> Option<Move> {
        self.state().previous_move
    }

    /// Piece captured by the last move
    #[inline]
    pub fn captured(&self) -> Option<Piece> {
        self.state().captured
    }

    /// Pieces of the side to move
    #[inline]
    pub fn allies(&self) -> Bitboard {
        self.state().allies
    }

    /// Pieces of the opponent
    #[inline]
    pub fn enemies(&self) -> Bitboard {
        self.state().enemies
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.state().occupied
    }

    /// Number of moves (including null moves) made since the position was created
    #[inline]
    pub fn ply(&self) -> usize {
        self.states.len() - 1
    }

    /// Square on which an en passant capture would land
    #[inline]
    pub fn ep_target(&self) -> Option<Coord> {
        let mv = self.previous_move()?;
        if !mv.is_double_push() {
            return None;
        }
        Some(Coord::from_index((mv.src().index() + mv.dst().index()) / 2))
    }

    #[inline]
    pub fn king_pos(&self, c: Color) -> Coord {
        self.board.king_pos(c)
    }

    /// Returns `true` if `coord` is attacked by any piece of color `by`
    #[inline]
    pub fn is_attacked(&self, coord: Coord, by: Color) -> bool {
        self.board
            .attackers(coord, by, self.occupied())
            .is_nonempty()
    }

    /// Pieces giving check to the side to move
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        let side = self.side();
        self.board
            .attackers(self.king_pos(side), side.inv(), self.occupied())
    }

    #[inline]
    pub fn check_type(&self) -> CheckType {
        match self.checkers().popcount() {
            0 => CheckType::NoCheck,
            1 => CheckType::Single,
            _ => CheckType::Double,
        }
    }

    #[inline]
    pub fn is_check(&self) -> bool {
        self.checkers().is_nonempty()
    }

    /// Enemy sliders lined up with the king of the side to move, ignoring blockers
    fn snipers(&self) -> Bitboard {
        let side = self.side();
        let king = self.king_pos(side);
        (attack::rank_file(king) & self.board.piece_line(side.inv()))
            | (attack::diagonals(king) & self.board.piece_diag(side.inv()))
    }

    /// Pieces of the side to move which are pinned to their king
    pub fn pinned(&self) -> Bitboard {
        let king = self.king_pos(self.side());
        let mut pinned = Bitboard::EMPTY;
        for sniper in self.snipers() {
            let blockers = attack::between(king, sniper) & self.occupied();
            if blockers.popcount() == 1 && (blockers & self.allies()).is_nonempty() {
                pinned |= blockers;
            }
        }
        pinned
    }

    /// Squares a pinned piece on `coord` may move to: the pin line up to and including the pinner
    ///
    /// Returns the full board if the piece is not pinned.
    pub fn pin_ray(&self, coord: Coord) -> Bitboard {
        let king = self.king_pos(self.side());
        for sniper in self.snipers() {
            let line = attack::between(king, sniper);
            if line.has(coord) && (line & self.occupied()).popcount() == 1 {
                return line.with(sniper);
            }
        }
        Bitboard::FULL
    }

    /// Returns `true` if `mv` takes an enemy piece
    #[inline]
    pub fn is_capture(&self, mv: Move) -> bool {
        mv.kind() == MoveKind::EnPassant || self.enemies().has(mv.dst())
    }

    fn push_state(
        &mut self,
        previous_move: Option<Move>,
        captured: Option<Piece>,
        castling: CastlingRights,
        rule50: u16,
    ) {
        let prev = *self.state();
        let side = prev.side.inv();
        let allies = self.board.color(side);
        let enemies = self.board.color(prev.side);
        self.states.push(State {
            previous_move,
            captured,
            castling,
            rule50,
            move_number: prev.move_number + (prev.side == Color::Black) as u16,
            side,
            allies,
            enemies,
            occupied: allies | enemies,
        });
    }

    /// Applies `mv`, which must be a legal move produced by the move generator for this position
    pub fn do_move(&mut self, mv: Move) {
        let prev = *self.state();
        let us = prev.side;
        let them = us.inv();
        debug_assert_eq!(mv.color(), us);

        let captured = match mv.kind() {
            MoveKind::EnPassant => Some(Piece::Pawn),
            MoveKind::Castling => None,
            _ => self.board.piece_at(them, mv.dst()),
        };
        let rule50 = if captured.is_some() || mv.piece() == Piece::Pawn {
            0
        } else {
            prev.rule50 + 1
        };

        match mv.kind() {
            MoveKind::Common | MoveKind::Promotion => {
                if let Some(p) = captured {
                    self.board.remove(them, p, mv.dst());
                }
                self.board.remove(us, mv.piece(), mv.src());
                self.board.put(us, mv.target_piece(), mv.dst());
            }
            MoveKind::EnPassant => {
                self.board.remove(them, Piece::Pawn, mv.enpassant_victim());
                self.board.relocate(us, Piece::Pawn, mv.src(), mv.dst());
            }
            MoveKind::Castling => {
                let (rook_src, rook_dst) = castling_rook(mv.dst());
                self.board.relocate(us, Piece::King, mv.src(), mv.dst());
                self.board.relocate(us, Piece::Rook, rook_src, rook_dst);
            }
        }

        let castling = prev
            .castling
            .without(CASTLING_VOIDS[mv.src().index()])
            .without(CASTLING_VOIDS[mv.dst().index()]);
        self.push_state(Some(mv), captured, castling, rule50);
    }

    /// Reverts the last move made with [`Position::do_move()`]
    ///
    /// # Panics
    ///
    /// Panics if there is no such move, or if the last thing done was a null move.
    pub fn undo_move(&mut self) {
        assert!(self.states.len() > 1, "no move to undo");
        let state = self.states.pop().expect("state stack is not empty");
        let mv = state
            .previous_move
            .expect("undo_move() cannot revert a null move");
        let us = mv.color();
        let them = us.inv();

        match mv.kind() {
            MoveKind::Common | MoveKind::Promotion => {
                self.board.remove(us, mv.target_piece(), mv.dst());
                self.board.put(us, mv.piece(), mv.src());
                if let Some(p) = state.captured {
                    self.board.put(them, p, mv.dst());
                }
            }
            MoveKind::EnPassant => {
                self.board.relocate(us, Piece::Pawn, mv.dst(), mv.src());
                self.board.put(them, Piece::Pawn, mv.enpassant_victim());
            }
            MoveKind::Castling => {
                let (rook_src, rook_dst) = castling_rook(mv.dst());
                self.board.relocate(us, Piece::King, mv.dst(), mv.src());
                self.board.relocate(us, Piece::Rook, rook_dst, rook_src);
            }
        }
    }

    /// Passes the turn without moving
    ///
    /// Must not be called when the side to move is in check.
    pub fn do_null_move(&mut self) {
        let prev = *self.state();
        self.push_state(None, None, prev.castling, prev.rule50 + 1);
    }

    /// Reverts the last null move
    ///
    /// # Panics
    ///
    /// Panics if the last thing done was not a null move.
    pub fn undo_null_move(&mut self) {
        assert!(self.states.len() > 1, "no move to undo");
        assert!(
            self.previous_move().is_none(),
            "undo_null_move() cannot revert a real move"
        );
        self.states.pop();
    }

    /// Returns the Zobrist hash of the position, computed from scratch
    ///
    /// The hash doesn't include the move counters, so equal positions reached by different move
    /// orders have equal hashes.
    pub fn zobrist_hash(&self) -> u64 {
        zobrist::position(
            &self.board,
            self.side(),
            self.castling(),
            self.ep_target().map(|c| c.file()),
        )
    }

    /// Converts the position back into an unvalidated one
    pub fn raw(&self) -> RawPosition {
        let mut cells = [Cell::EMPTY; 64];
        for c in [Color::White, Color::Black] {
            for p in Piece::iter() {
                for coord in self.board.piece2(c, p) {
                    cells[coord.index()] = Cell::from_parts(c, p);
                }
            }
        }
        RawPosition {
            cells,
            side: self.side(),
            castling: self.castling(),
            ep_target: self.ep_target(),
            rule50: self.rule50(),
            move_number: self.move_number(),
        }
    }

    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }

    /// Returns a wrapper which prints the board with the given style
    ///
    /// Unlike [`RawPosition::pretty()`], the wrapper owns a copy of the position data.
    pub fn pretty(&self, style: PrettyStyle) -> OwnedPretty {
        OwnedPretty {
            raw: self.raw(),
            style,
        }
    }
}

impl Move {
    /// Piece standing on the destination square after the move
    #[inline]
    pub(crate) fn target_piece(&self) -> Piece {
        match self.promote() {
            Some(p) => p,
            None => self.piece(),
        }
    }
}

impl TryFrom<RawPosition> for Position {
    type Error = ValidateError;

    fn try_from(mut raw: RawPosition) -> Result<Position, ValidateError> {
        let side = raw.side;

        // Turn enpassant into the double push which made it possible
        let mut previous_move = None;
        if let Some(target) = raw.ep_target {
            if target.rank() != geometry::enpassant_dst_rank(side) {
                return Err(ValidateError::InvalidEnpassant(target));
            }
            let delta = geometry::pawn_forward_delta(side);
            let pawn = target.add(-delta);
            let src = target.add(delta);
            if raw.get(pawn) == Cell::from_parts(side.inv(), Piece::Pawn)
                && raw.get(target).is_free()
                && raw.get(src).is_free()
            {
                previous_move = Some(Move::new(
                    MoveKind::Common,
                    src,
                    pawn,
                    Piece::Pawn,
                    side.inv(),
                ));
            } else {
                raw.ep_target = None;
            }
        }

        // Reset bad castling flags
        for color in [Color::White, Color::Black] {
            let rank = geometry::castling_rank(color);
            if raw.get2(File::E, rank) != Cell::from_parts(color, Piece::King) {
                raw.castling.unset_color(color);
            }
            if raw.get2(File::A, rank) != Cell::from_parts(color, Piece::Rook) {
                raw.castling.unset(color, CastlingSide::Queen);
            }
            if raw.get2(File::H, rank) != Cell::from_parts(color, Piece::Rook) {
                raw.castling.unset(color, CastlingSide::King);
            }
        }

        let mut board = Board::EMPTY;
        for (idx, cell) in raw.cells.iter().enumerate() {
            if let (Some(c), Some(p)) = (cell.color(), cell.piece()) {
                board.put(c, p, Coord::from_index(idx));
            }
        }

        for color in [Color::White, Color::Black] {
            if board.color(color).popcount() > 16 {
                return Err(ValidateError::TooManyPieces(color));
            }
            match board.piece2(color, Piece::King).popcount() {
                0 => return Err(ValidateError::NoKing(color)),
                1 => {}
                _ => return Err(ValidateError::TooManyKings(color)),
            }
        }

        let pawns =
            board.piece2(Color::White, Piece::Pawn) | board.piece2(Color::Black, Piece::Pawn);
        let bad_pawns = pawns & bitboard_consts::BACK_RANKS;
        if bad_pawns.is_nonempty() {
            return Err(ValidateError::InvalidPawn(bad_pawns.first()));
        }

        let allies = board.color(side);
        let enemies = board.color(side.inv());
        let occupied = allies | enemies;
        if board
            .attackers(board.king_pos(side.inv()), side, occupied)
            .is_nonempty()
        {
            return Err(ValidateError::OpponentKingAttacked);
        }

        Ok(Position {
            board,
            states: vec![State {
                previous_move,
                captured: None,
                castling: raw.castling,
                rule50: raw.rule50,
                move_number: raw.move_number,
                side,
                allies,
                enemies,
                occupied,
            }],
        })
    }
}

impl TryFrom<&RawPosition> for Position {
    type Error = ValidateError;

    fn try_from(raw: &RawPosition) -> Result<Position, ValidateError> {
        (*raw).try_into()
    }
}

fn parse_cells(s: &str) -> Result<[Cell; 64], CellsParseError> {
    type Error = CellsParseError;

    // FEN lists the ranks from 8 down to 1
    let rank_at = |row: usize| Rank::from_index(7 - row);

    let mut file = 0_usize;
    let mut row = 0_usize;
    let mut cells = [Cell::EMPTY; 64];
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                let add = (b - b'0') as usize;
                if file + add > 8 {
                    return Err(Error::RankOverflow(rank_at(row)));
                }
                file += add;
            }
            b'/' => {
                if file < 8 {
                    return Err(Error::RankUnderflow(rank_at(row)));
                }
                row += 1;
                file = 0;
                if row >= 8 {
                    return Err(Error::Overflow);
                }
            }
            _ => {
                if file >= 8 {
                    return Err(Error::RankOverflow(rank_at(row)));
                }
                let coord = Coord::from_parts(File::from_index(file), rank_at(row));
                cells[coord.index()] =
                    Cell::from_char(b as char).ok_or(Error::UnexpectedChar(b as char))?;
                file += 1;
            }
        };
    }

    if file < 8 {
        return Err(Error::RankUnderflow(rank_at(row)));
    }
    if row < 7 {
        return Err(Error::Underflow);
    }

    Ok(cells)
}

fn parse_ep_target(s: &str, side: Color) -> Result<Option<Coord>, RawFenParseError> {
    if s == "-" {
        return Ok(None);
    }
    let target = Coord::from_str(s)?;
    if target.rank() != geometry::enpassant_dst_rank(side) {
        return Err(RawFenParseError::InvalidEnpassantRank(target.rank()));
    }
    Ok(Some(target))
}

impl FromStr for RawPosition {
    type Err = RawFenParseError;

    fn from_str(s: &str) -> Result<RawPosition, Self::Err> {
        type Error = RawFenParseError;

        if !s.is_ascii() {
            return Err(Error::NonAscii);
        }
        let mut iter = s.split_ascii_whitespace().fuse();

        let cells = parse_cells(iter.next().ok_or(Error::NoBoard)?)?;
        let side = Color::from_str(iter.next().ok_or(Error::NoMoveSide)?)?;
        let castling = CastlingRights::from_str(iter.next().ok_or(Error::NoCastling)?)?;
        let ep_target = parse_ep_target(iter.next().ok_or(Error::NoEnpassant)?, side)?;
        let rule50 = match iter.next() {
            Some(s) => u16::from_str(s).map_err(Error::Rule50)?,
            None => 0,
        };
        let move_number = match iter.next() {
            Some(s) => u16::from_str(s).map_err(Error::MoveNumber)?,
            None => 1,
        };

        if iter.next().is_some() {
            return Err(Error::ExtraData);
        }

        Ok(RawPosition {
            cells,
            side,
            castling,
            ep_target,
            rule50,
            move_number,
        })
    }
}

impl FromStr for Position {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Position, Self::Err> {
        Ok(RawPosition::from_str(s)?.try_into()?)
    }
}

fn format_cells(cells: &[Cell; 64], f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    for rank in Rank::iter().rev() {
        if rank != Rank::R8 {
            write!(f, "/")?;
        }
        let mut empty = 0;
        for file in File::iter() {
            let cell = cells[Coord::from_parts(file, rank).index()];
            if cell.is_free() {
                empty += 1;
                continue;
            }
            if empty != 0 {
                write!(f, "{}", (b'0' + empty) as char)?;
                empty = 0;
            }
            write!(f, "{}", cell)?;
        }
        if empty != 0 {
            write!(f, "{}", (b'0' + empty) as char)?;
        }
    }
    Ok(())
}

impl Display for RawPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_cells(&self.cells, f)?;
        write!(f, " {} {}", self.side, self.castling)?;
        match self.ep_target {
            Some(p) => write!(f, " {}", p)?,
            None => write!(f, " -")?,
        };
        write!(f, " {} {}", self.rule50, self.move_number)?;
        Ok(())
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.raw().fmt(f)
    }
}

/// Style for [`RawPosition::pretty()`] and [`Position::pretty()`]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrettyStyle {
    /// Print pieces and frames as ASCII characters
    Ascii,
    /// Print pieces and frames as Unicode characters
    Utf8,
}

/// Wrapper to pretty-print a [`RawPosition`]
pub struct Pretty<'a> {
    raw: &'a RawPosition,
    style: PrettyStyle,
}

/// Wrapper to pretty-print a [`Position`]
pub struct OwnedPretty {
    raw: RawPosition,
    style: PrettyStyle,
}

trait StyleTable {
    const HORZ_FRAME: char;
    const VERT_FRAME: char;
    const ANGLE_FRAME: char;
    const WHITE_INDICATOR: char;
    const BLACK_INDICATOR: char;

    fn cell(c: Cell) -> char;

    fn indicator(c: Color) -> char {
        match c {
            Color::White => Self::WHITE_INDICATOR,
            Color::Black => Self::BLACK_INDICATOR,
        }
    }

    fn fmt(r: &RawPosition, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for rank in Rank::iter().rev() {
            write!(f, "{}{}", rank, Self::VERT_FRAME)?;
            for file in File::iter() {
                write!(f, "{}", Self::cell(r.get2(file, rank)))?;
            }
            writeln!(f)?;
        }
        write!(f, "{}{}", Self::HORZ_FRAME, Self::ANGLE_FRAME)?;
        for _ in File::iter() {
            write!(f, "{}", Self::HORZ_FRAME)?;
        }
        writeln!(f)?;
        write!(f, "{}{}", Self::indicator(r.side), Self::VERT_FRAME)?;
        for file in File::iter() {
            write!(f, "{}", file)?;
        }
        writeln!(f)?;
        Ok(())
    }
}

struct AsciiStyleTable;
struct Utf8StyleTable;

impl StyleTable for AsciiStyleTable {
    const HORZ_FRAME: char = '-';
    const VERT_FRAME: char = '|';
    const ANGLE_FRAME: char = '+';
    const WHITE_INDICATOR: char = 'W';
    const BLACK_INDICATOR: char = 'B';

    fn cell(c: Cell) -> char {
        c.as_char()
    }
}

impl StyleTable for Utf8StyleTable {
    const HORZ_FRAME: char = '─';
    const VERT_FRAME: char = '│';
    const ANGLE_FRAME: char = '┼';
    const WHITE_INDICATOR: char = '○';
    const BLACK_INDICATOR: char = '●';

    fn cell(c: Cell) -> char {
        c.as_utf8_char()
    }
}

fn fmt_pretty(raw: &RawPosition, style: PrettyStyle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match style {
        PrettyStyle::Ascii => AsciiStyleTable::fmt(raw, f),
        PrettyStyle::Utf8 => Utf8StyleTable::fmt(raw, f),
    }
}

impl<'a> Display for Pretty<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        fmt_pretty(self.raw, self.style, f)
    }
}

impl Display for OwnedPretty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        fmt_pretty(&self.raw, self.style, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const INI_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn play(pos: &mut Position, ucis: &[&str]) {
        for s in ucis {
            let mv = Move::from_uci(s, pos).unwrap();
            pos.do_move(mv);
        }
    }

    #[test]
    fn test_initial() {
        assert_eq!(RawPosition::initial().to_string(), INI_FEN);
        assert_eq!(Position::initial().to_string(), INI_FEN);
        assert_eq!(RawPosition::from_str(INI_FEN), Ok(RawPosition::initial()));
        assert_eq!(Position::from_str(INI_FEN), Ok(Position::initial()));

        let pos = Position::initial();
        assert_eq!(pos.allies().as_raw(), 0xffff);
        assert_eq!(pos.enemies().as_raw(), 0xffff_0000_0000_0000);
        assert_eq!(pos.occupied(), pos.allies() | pos.enemies());
        assert_eq!(pos.ply(), 0);
    }

    #[test]
    fn test_midgame() {
        const FEN: &str = "1rq1r1k1/1p3ppp/pB3n2/3ppP2/Pbb1P3/1PN2B2/2P2QPP/R1R4K w - - 1 21";

        let pos = Position::from_fen(FEN).unwrap();
        assert_eq!(pos.as_fen(), FEN);
        assert_eq!(
            pos.get(Coord::from_parts(File::B, Rank::R4)),
            Cell::from_parts(Color::Black, Piece::Bishop)
        );
        assert_eq!(
            pos.get(Coord::from_parts(File::F, Rank::R2)),
            Cell::from_parts(Color::White, Piece::Queen)
        );
        assert_eq!(
            pos.king_pos(Color::White),
            Coord::from_parts(File::H, Rank::R1)
        );
        assert_eq!(
            pos.king_pos(Color::Black),
            Coord::from_parts(File::G, Rank::R8)
        );
        assert_eq!(pos.side(), Color::White);
        assert_eq!(pos.castling(), CastlingRights::EMPTY);
        assert_eq!(pos.ep_target(), None);
        assert_eq!(pos.rule50(), 1);
        assert_eq!(pos.move_number(), 21);
    }

    #[test]
    fn test_fixes() {
        const FEN: &str = "r1bq1b1r/ppppkppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK1R1 w KQkq c6 6 5";

        let raw = RawPosition::from_fen(FEN).unwrap();
        assert_eq!(raw.castling, CastlingRights::FULL);
        assert_eq!(raw.ep_target, Some(Coord::from_parts(File::C, Rank::R6)));
        assert_eq!(raw.as_fen(), FEN);

        let pos: Position = raw.try_into().unwrap();
        assert_eq!(
            pos.castling(),
            CastlingRights::EMPTY.with(Color::White, CastlingSide::Queen)
        );
        assert_eq!(pos.ep_target(), None);
        assert_eq!(pos.previous_move(), None);
        assert_eq!(
            pos.as_fen(),
            "r1bq1b1r/ppppkppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK1R1 w Q - 6 5"
        );
    }

    #[test]
    fn test_enpassant_root() {
        const FEN: &str = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let pos = Position::from_fen(FEN).unwrap();
        let prev = pos.previous_move().unwrap();
        assert_eq!(prev.src(), Coord::from_parts(File::F, Rank::R7));
        assert_eq!(prev.dst(), Coord::from_parts(File::F, Rank::R5));
        assert_eq!(prev.color(), Color::Black);
        assert_eq!(pos.ep_target(), Some(Coord::from_parts(File::F, Rank::R6)));
        assert_eq!(pos.as_fen(), FEN);

        assert_eq!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - e6 0 1").unwrap().ep_target(),
            None
        );
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(
            RawPosition::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(RawFenParseError::NoMoveSide)
        );
        assert_eq!(
            RawPosition::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"),
            Err(RawFenParseError::NoCastling)
        );
        assert_eq!(
            RawPosition::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq"),
            Err(RawFenParseError::NoEnpassant)
        );

        let raw = RawPosition::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -")
            .unwrap();
        assert_eq!(raw.rule50, 0);
        assert_eq!(raw.move_number, 1);

        let raw = RawPosition::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 10")
            .unwrap();
        assert_eq!(raw.rule50, 10);
        assert_eq!(raw.move_number, 1);
    }

    #[test]
    fn test_bad_fen() {
        assert_eq!(
            RawPosition::from_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"),
            Err(RawFenParseError::Board(CellsParseError::UnexpectedChar('9')))
        );
        assert_eq!(
            RawPosition::from_fen("rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"),
            Err(RawFenParseError::Board(CellsParseError::Underflow))
        );
        assert_eq!(
            RawPosition::from_fen("rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"),
            Err(RawFenParseError::Board(CellsParseError::RankOverflow(Rank::R7)))
        );
        assert_eq!(
            RawPosition::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - e3 0 1"),
            Err(RawFenParseError::InvalidEnpassantRank(Rank::R3))
        );
        assert_eq!(
            RawPosition::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1 x"),
            Err(RawFenParseError::ExtraData)
        );
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::NoKing(Color::Black)))
        );
        assert_eq!(
            Position::from_fen("4k3/8/8/8/8/8/8/3KK3 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::TooManyKings(Color::White)))
        );
        assert_eq!(
            Position::from_fen("4k2P/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::InvalidPawn(
                Coord::from_parts(File::H, Rank::R8)
            )))
        );
        assert_eq!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 1").map(|p| p.side()),
            Ok(Color::White)
        );
        assert_eq!(
            Position::from_fen("4k3/8/8/8/8/8/8/4R2K w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::OpponentKingAttacked))
        );

        let mut raw = RawPosition::initial();
        raw.ep_target = Some(Coord::from_parts(File::E, Rank::R3));
        assert_eq!(
            Position::try_from(raw),
            Err(ValidateError::InvalidEnpassant(Coord::from_parts(File::E, Rank::R3)))
        );
    }

    #[test]
    fn test_do_undo_special() {
        const FEN: &str = "r3k2r/1P6/8/3pP3/8/8/8/R3K2R w KQkq d6 0 1";
        let start = Position::from_fen(FEN).unwrap();

        let mut pos = start.clone();
        play(&mut pos, &["e1g1"]);
        assert_eq!(pos.as_fen(), "r3k2r/1P6/8/3pP3/8/8/8/R4RK1 b kq - 1 1");
        pos.undo_move();
        assert_eq!(pos, start);

        play(&mut pos, &["e1c1"]);
        assert_eq!(pos.as_fen(), "r3k2r/1P6/8/3pP3/8/8/8/2KR3R b kq - 1 1");
        pos.undo_move();
        assert_eq!(pos, start);

        play(&mut pos, &["e5d6"]);
        assert_eq!(pos.captured(), Some(Piece::Pawn));
        assert_eq!(pos.as_fen(), "r3k2r/1P6/3P4/8/8/8/8/R3K2R b KQkq - 0 1");
        pos.undo_move();
        assert_eq!(pos, start);

        play(&mut pos, &["b7a8q"]);
        assert_eq!(pos.captured(), Some(Piece::Rook));
        assert_eq!(pos.as_fen(), "Q3k2r/8/8/3pP3/8/8/8/R3K2R b KQk - 0 1");
        pos.undo_move();
        assert_eq!(pos, start);

        play(&mut pos, &["a1a8"]);
        assert_eq!(
            pos.castling(),
            CastlingRights::EMPTY
                .with(Color::White, CastlingSide::King)
                .with(Color::Black, CastlingSide::King)
        );
        pos.undo_move();
        assert_eq!(pos, start);
    }

    #[test]
    fn test_counters() {
        let mut pos = Position::initial();
        play(&mut pos, &["g1f3", "g8f6", "b1c3"]);
        assert_eq!(pos.rule50(), 3);
        assert_eq!(pos.move_number(), 2);
        assert_eq!(pos.side(), Color::Black);
        play(&mut pos, &["e7e5"]);
        assert_eq!(pos.rule50(), 0);
        assert_eq!(pos.move_number(), 3);
        assert_eq!(pos.ep_target(), Some(Coord::from_parts(File::E, Rank::R6)));
        assert_eq!(pos.ply(), 4);
    }

    #[test]
    fn test_random_walk() {
        let fens = [
            INI_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        ];
        let mut rng = StdRng::seed_from_u64(0x6b65_7374);
        for fen in fens {
            for _ in 0..20 {
                let start = Position::from_fen(fen).unwrap();
                let mut pos = start.clone();
                let mut snapshots = Vec::new();
                for _ in 0..60 {
                    let moves = movegen::gen_all(&pos);
                    if moves.is_empty() {
                        break;
                    }
                    let mv = moves[rng.gen_range(0..moves.len())];
                    snapshots.push(pos.clone());
                    pos.do_move(mv);
                    assert_eq!(pos.occupied(), pos.allies() | pos.enemies());
                    assert!((pos.allies() & pos.enemies()).is_empty());
                    assert_eq!(pos.allies(), pos.board().color(pos.side()));
                    assert_eq!(
                        Position::from_fen(&pos.as_fen()).unwrap().as_fen(),
                        pos.as_fen()
                    );
                }
                while let Some(snapshot) = snapshots.pop() {
                    pos.undo_move();
                    assert_eq!(pos, snapshot);
                }
                assert_eq!(pos, start);
            }
        }
    }

    #[test]
    fn test_null_move() {
        let start =
            Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2")
                .unwrap();
        let mut pos = start.clone();
        pos.do_null_move();
        assert_eq!(pos.side(), Color::Black);
        assert_eq!(pos.ep_target(), None);
        assert_eq!(pos.rule50(), 1);
        assert_eq!(pos.allies(), start.enemies());
        assert_ne!(pos.zobrist_hash(), start.zobrist_hash());
        pos.undo_null_move();
        assert_eq!(pos, start);
    }

    #[test]
    fn test_zobrist() {
        let mut a = Position::initial();
        let mut b = Position::initial();
        play(&mut a, &["g1f3", "g8f6", "b1c3", "b8c6"]);
        play(&mut b, &["b1c3", "b8c6", "g1f3", "g8f6"]);
        assert_eq!(a.zobrist_hash(), b.zobrist_hash());
        assert_ne!(a.zobrist_hash(), Position::initial().zobrist_hash());

        let mut c = Position::initial();
        play(&mut c, &["e2e4"]);
        let d = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
            .unwrap();
        assert_eq!(c.zobrist_hash(), d.zobrist_hash());
        let e = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
            .unwrap();
        assert_ne!(c.zobrist_hash(), e.zobrist_hash());
    }

    #[test]
    fn test_checks_and_pins() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.check_type(), CheckType::NoCheck);

        let pos = Position::from_fen("4k3/8/8/8/8/3n4/8/R3K3 w - - 0 1").unwrap();
        assert_eq!(pos.check_type(), CheckType::Single);
        assert_eq!(
            pos.checkers(),
            Bitboard::from_coord(Coord::from_parts(File::D, Rank::R3))
        );

        // Knight on d2 covers f1 and f3, but not e1
        let pos = Position::from_fen("4k3/8/8/8/8/8/3n4/R3K3 w - - 0 1").unwrap();
        assert_eq!(pos.check_type(), CheckType::NoCheck);

        let pos = Position::from_fen("4k3/8/8/8/8/5n2/8/r3K3 w - - 0 1").unwrap();
        assert_eq!(pos.check_type(), CheckType::Double);
        assert_eq!(pos.checkers().popcount(), 2);

        let pos = Position::from_fen("4k3/8/8/8/1b6/8/3N4/4K1Nq w - - 0 1").unwrap();
        let d2 = Coord::from_parts(File::D, Rank::R2);
        let g1 = Coord::from_parts(File::G, Rank::R1);
        assert_eq!(pos.pinned(), Bitboard::EMPTY.with(d2).with(g1));
        assert_eq!(
            pos.pin_ray(d2),
            Bitboard::EMPTY
                .with(Coord::from_parts(File::C, Rank::R3))
                .with(Coord::from_parts(File::B, Rank::R4))
                .with(d2)
        );
        assert_eq!(
            pos.pin_ray(Coord::from_parts(File::E, Rank::R1)),
            Bitboard::FULL
        );
    }

    #[test]
    fn test_pretty() {
        let res = r#"
8|rnbqkbnr
7|pppppppp
6|........
5|........
4|........
3|........
2|PPPPPPPP
1|RNBQKBNR
-+--------
W|abcdefgh
"#;
        assert_eq!(
            Position::initial().pretty(PrettyStyle::Ascii).to_string().trim(),
            res.trim()
        );

        let res = r#"
8│♜♞♝♛♚♝♞♜
7│♟♟♟♟♟♟♟♟
6│........
5│........
4│........
3│........
2│♙♙♙♙♙♙♙♙
1│♖♘♗♕♔♗♘♖
─┼────────
○│abcdefgh
"#;
        assert_eq!(
            RawPosition::initial().pretty(PrettyStyle::Utf8).to_string().trim(),
            res.trim()
        );
    }
}
