//! Legal move generation
//!
//! Moves are generated strictly legal in one pass. Non-king moves are restricted by the check ray
//! (the squares that block or capture a single checker) and by the pin ray of pinned pieces. King
//! moves avoid every square the opponent attacks, computed as if the king were already gone from
//! its square. En passant is verified by playing it on a scratch board.

use crate::attack::{self, Slider};
use crate::bitboard::Bitboard;
use crate::moves::{Move, MoveKind};
use crate::position::Position;
use crate::types::{CastlingRights, CastlingSide, Color, Coord, File, Piece};
use crate::{generic, geometry};

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::slice;

use arrayvec::ArrayVec;

/// Fixed-capacity buffer for the moves of one position
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct MoveList(ArrayVec<Move, 256>);

impl Deref for MoveList {
    type Target = ArrayVec<Move, 256>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MoveList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = arrayvec::IntoIter<Move, 256>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList(ArrayVec::new())
    }
}

pub trait MovePush {
    fn push(&mut self, m: Move);
}

impl MovePush for MoveList {
    fn push(&mut self, m: Move) {
        self.0.push(m);
    }
}

impl MovePush for Vec<Move> {
    fn push(&mut self, m: Move) {
        Vec::push(self, m);
    }
}

/// Counts the moves instead of storing them
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
pub struct MoveCounter(pub usize);

impl MovePush for MoveCounter {
    fn push(&mut self, _m: Move) {
        self.0 += 1;
    }
}

const PROMOTE_PIECES: [Piece; 4] = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

/// Squares the king of the side to move can step on without being attacked
pub fn king_safe_moves_mask(pos: &Position) -> Bitboard {
    let board = pos.board();
    let them = pos.side().inv();
    let king = pos.king_pos(pos.side());
    let occupied = pos.occupied().without(king);

    let mut danger = attack::king(board.king_pos(them));
    for src in board.piece_line(them) {
        danger |= attack::rook(src, occupied);
    }
    for src in board.piece_diag(them) {
        danger |= attack::bishop(src, occupied);
    }
    for src in board.piece2(them, Piece::Knight) {
        danger |= attack::knight(src);
    }
    for src in board.piece2(them, Piece::Pawn) {
        danger |= attack::pawn(them, src);
    }

    attack::king(king) & !pos.allies() & !danger
}

fn do_possible_castlings<C: generic::Color>(pos: &Position) -> CastlingRights {
    let rights = pos.castling();
    let them = C::COLOR.inv();
    let occupied = pos.occupied();
    let at = |file: File| Coord::from_parts(file, geometry::castling_rank(C::COLOR));

    let mut res = CastlingRights::EMPTY;
    if rights.has(C::COLOR, CastlingSide::King)
        && (occupied & Bitboard::from_raw(0x60).shl(C::CASTLING_OFFSET)).is_empty()
        && !pos.is_attacked(at(File::F), them)
        && !pos.is_attacked(at(File::G), them)
    {
        res.set(C::COLOR, CastlingSide::King);
    }
    if rights.has(C::COLOR, CastlingSide::Queen)
        && (occupied & Bitboard::from_raw(0x0e).shl(C::CASTLING_OFFSET)).is_empty()
        && !pos.is_attacked(at(File::D), them)
        && !pos.is_attacked(at(File::C), them)
    {
        res.set(C::COLOR, CastlingSide::Queen);
    }
    res
}

/// Castlings available to the side to move, assuming it is not in check
pub fn possible_castlings(pos: &Position) -> CastlingRights {
    match pos.side() {
        Color::White => do_possible_castlings::<generic::White>(pos),
        Color::Black => do_possible_castlings::<generic::Black>(pos),
    }
}

struct MoveGenImpl<'a, P, C> {
    pos: &'a Position,
    dst: &'a mut P,
    king: Coord,
    checkers: Bitboard,
    check_ray: Bitboard,
    pinned: Bitboard,
    _c: PhantomData<C>,
}

impl<'a, P: MovePush, C: generic::Color> MoveGenImpl<'a, P, C> {
    fn new(pos: &'a Position, dst: &'a mut P, _c: C) -> Self {
        let king = pos.king_pos(C::COLOR);
        let checkers = pos.checkers();
        let check_ray = match checkers.popcount() {
            0 => Bitboard::FULL,
            1 => attack::between(king, checkers.first()) | checkers,
            _ => Bitboard::EMPTY,
        };
        MoveGenImpl {
            pos,
            dst,
            king,
            checkers,
            check_ray,
            pinned: pos.pinned(),
            _c: PhantomData,
        }
    }

    /// Legal destinations of a non-king piece on `src` among `dests`
    #[inline]
    fn legal_dests(&self, src: Coord, dests: Bitboard, allowed: Bitboard) -> Bitboard {
        let res = dests & allowed & self.check_ray;
        if self.pinned.has(src) {
            return res & self.pos.pin_ray(src);
        }
        res
    }

    #[inline]
    fn add_move(&mut self, kind: MoveKind, piece: Piece, src: Coord, dst: Coord) {
        self.dst.push(Move::new(kind, src, dst, piece, C::COLOR));
    }

    fn gen_pawns<const CAPTURES_ONLY: bool>(&mut self) {
        let occupied = self.pos.occupied();
        let enemies = self.pos.enemies();
        let delta = C::PAWN_FORWARD;

        for src in self.pos.board().piece2(C::COLOR, Piece::Pawn) {
            let mut dests = attack::pawn(C::COLOR, src) & enemies;
            if !CAPTURES_ONLY {
                let single = src.add(delta);
                if !occupied.has(single) {
                    dests.set(single);
                    if C::DOUBLE_PUSH_SRC.has(src) && !occupied.has(single.add(delta)) {
                        dests.set(single.add(delta));
                    }
                }
            }
            for dst in self.legal_dests(src, dests, Bitboard::FULL) {
                if C::PROMOTE_SRC.has(src) {
                    for p in PROMOTE_PIECES {
                        self.dst.push(Move::promotion(src, dst, p, C::COLOR));
                    }
                } else {
                    self.add_move(MoveKind::Common, Piece::Pawn, src, dst);
                }
            }
        }
    }

    fn gen_enpassant(&mut self) {
        let target = match self.pos.ep_target() {
            Some(target) => target,
            None => return,
        };
        let victim = Coord::from_parts(target.file(), geometry::enpassant_src_rank(C::COLOR));
        let them = <C::Inv as generic::Color>::COLOR;
        let pawns = self.pos.board().piece2(C::COLOR, Piece::Pawn);

        for src in attack::pawn(them, target) & pawns {
            let mut board = *self.pos.board();
            board.remove(them, Piece::Pawn, victim);
            board.relocate(C::COLOR, Piece::Pawn, src, target);
            let occupied = self.pos.occupied().without(src).without(victim);
            if board.attackers(self.king, them, occupied.with(target)).is_empty() {
                self.add_move(MoveKind::EnPassant, Piece::Pawn, src, target);
            }
        }
    }

    fn gen_knights(&mut self, allowed: Bitboard) {
        // A pinned knight can never stay on its pin line
        let knights = self.pos.board().piece2(C::COLOR, Piece::Knight) & !self.pinned;
        for src in knights {
            for dst in self.legal_dests(src, attack::knight(src), allowed) {
                self.add_move(MoveKind::Common, Piece::Knight, src, dst);
            }
        }
    }

    fn gen_sliders(&mut self, allowed: Bitboard) {
        let occupied = self.pos.occupied();
        for slider in [Slider::Bishop, Slider::Rook, Slider::Queen] {
            let piece = slider.piece();
            for src in self.pos.board().piece2(C::COLOR, piece) {
                for dst in self.legal_dests(src, slider.attacks(src, occupied), allowed) {
                    self.add_move(MoveKind::Common, piece, src, dst);
                }
            }
        }
    }

    fn gen_king(&mut self, allowed: Bitboard) {
        let src = self.king;
        for dst in king_safe_moves_mask(self.pos) & allowed {
            self.add_move(MoveKind::Common, Piece::King, src, dst);
        }
    }

    fn gen_castling(&mut self) {
        if self.checkers.is_nonempty() {
            return;
        }
        let castlings = do_possible_castlings::<C>(self.pos);
        let rank = geometry::castling_rank(C::COLOR);
        let src = Coord::from_parts(File::E, rank);
        if castlings.has(C::COLOR, CastlingSide::King) {
            self.add_move(
                MoveKind::Castling,
                Piece::King,
                src,
                Coord::from_parts(File::G, rank),
            );
        }
        if castlings.has(C::COLOR, CastlingSide::Queen) {
            self.add_move(
                MoveKind::Castling,
                Piece::King,
                src,
                Coord::from_parts(File::C, rank),
            );
        }
    }

    fn gen<const CAPTURES_ONLY: bool>(&mut self) {
        let allowed = match CAPTURES_ONLY {
            true => self.pos.enemies(),
            false => !self.pos.allies(),
        };
        if self.checkers.popcount() < 2 {
            self.gen_pawns::<CAPTURES_ONLY>();
            self.gen_enpassant();
            self.gen_knights(allowed);
            self.gen_sliders(allowed);
        }
        self.gen_king(allowed);
        if !CAPTURES_ONLY {
            self.gen_castling();
        }
    }
}

fn do_gen<P: MovePush, const CAPTURES_ONLY: bool>(pos: &Position, dst: &mut P) {
    match pos.side() {
        Color::White => MoveGenImpl::new(pos, dst, generic::White).gen::<CAPTURES_ONLY>(),
        Color::Black => MoveGenImpl::new(pos, dst, generic::Black).gen::<CAPTURES_ONLY>(),
    }
}

/// Pushes all the legal moves into `dst`
///
/// The order is fixed: pawns (including en passant), knights, bishops, rooks, queens, king,
/// castling. Within each piece kind, sources and destinations go in ascending square order.
pub fn gen_all_into<P: MovePush>(pos: &Position, dst: &mut P) {
    do_gen::<P, false>(pos, dst);
}

/// Pushes the legal captures, including en passant and capturing promotions, into `dst`
pub fn gen_captures_into<P: MovePush>(pos: &Position, dst: &mut P) {
    do_gen::<P, true>(pos, dst);
}

/// Returns all the legal moves
pub fn gen_all(pos: &Position) -> MoveList {
    let mut res = MoveList::new();
    gen_all_into(pos, &mut res);
    res
}

/// Returns the legal captures only
pub fn gen_captures(pos: &Position) -> MoveList {
    let mut res = MoveList::new();
    gen_captures_into(pos, &mut res);
    res
}

pub fn has_legal_moves(pos: &Position) -> bool {
    let mut counter = MoveCounter::default();
    gen_all_into(pos, &mut counter);
    counter.0 != 0
}
