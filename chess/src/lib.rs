//! # Kestrel
//!
//! Bitboard chess engine core. The crate contains:
//!
//! - a [`Position`] with FEN support and cheap [`do_move`](Position::do_move) /
//!   [`undo_move`](Position::undo_move)
//! - a strictly legal move generator (see [`movegen`])
//! - a tapered static evaluator (see [`eval`])
//! - an iterative-deepening alpha-beta [`Searcher`] with cooperative cancellation
//!
//! # Example
//!
//! ```
//! use kestrel::{movegen, Position, Searcher, SearchConfig, DefaultEvaluator, Never};
//!
//! let mut pos = Position::from_fen("k7/8/KQ6/8/8/8/8/8 w - - 0 1").unwrap();
//! assert!(!movegen::gen_all(&pos).is_empty());
//!
//! let searcher = Searcher::new(SearchConfig::with_max_depth(3), DefaultEvaluator);
//! let res = searcher.find_best(&mut pos, &mut Never);
//! let best = res.best_move.unwrap();
//! pos.do_move(best);
//! assert!(pos.is_check());
//! assert!(!movegen::has_legal_moves(&pos));
//! ```

pub mod attack;
pub mod eval;
mod generic;
pub mod movegen;
pub mod moves;
pub mod perft;
pub mod position;
pub mod search;
pub mod zobrist;

pub use kestrel_base::{bitboard, bitboard_consts, geometry, types};

pub use bitboard::Bitboard;
pub use eval::{DefaultEvaluator, Evaluator, MaterialEvaluator, Score};
pub use movegen::MoveList;
pub use moves::{Move, MoveKind, UciParseError};
pub use position::{Board, CheckType, FenParseError, Position, RawPosition, ValidateError};
pub use search::{
    find_best, Aborted, Cancel, Deadline, Never, SearchConfig, SearchResult, Searcher, StopFlag,
};
pub use types::{CastlingRights, CastlingSide, Cell, Color, Coord, File, Piece, Rank};
