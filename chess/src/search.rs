//! Iterative-deepening alpha-beta search
//!
//! The search is a fail-soft negamax with quiescence, check extension, null-move pruning and late
//! move reductions. Moves are ordered by principal variation, MVV-LVA, killer moves and the
//! history heuristic. All the per-search tables live in a [`SearchContext`] created afresh for
//! each call to [`Searcher::find_best()`].
//!
//! Cancellation is cooperative: the search polls a [`Cancel`] every
//! [`SearchConfig::poll_interval`] nodes and unwinds with [`Aborted`] once it says so. The
//! deepest fully completed iteration is always kept, and the first iteration is never cancelled.

use crate::eval::{DefaultEvaluator, Evaluator, Score, BLACK_WIN, DRAW, WHITE_WIN};
use crate::movegen::{self, MoveList};
use crate::moves::{Move, MoveKind};
use crate::position::Position;
use crate::types::Piece;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arrayvec::ArrayVec;
use log::{debug, trace};

/// Maximum search depth in plies, including extensions and quiescence
pub const MAX_PLY: usize = 128;

/// Score of being checkmated right now; mates found deeper in the tree are biased by ply
pub const MATE: Score = WHITE_WIN;

const PV_SCORE: i32 = 20_000;
const CAPTURE_SCORE: i32 = 10_000;
const KILLER_SCORES: [i32; 2] = [9_000, 8_000];

/// Search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Deepest iteration to run, capped at `MAX_PLY - 1`
    pub max_depth: usize,
    /// Null-move searches run at `depth - null_move_reduction`
    pub null_move_reduction: i32,
    /// Null-move pruning is only tried at this depth or deeper
    pub null_move_min_depth: i32,
    /// Number of moves searched at full depth before late move reductions kick in
    pub lmr_full_depth_moves: usize,
    /// Late move reductions are only applied at this depth or deeper
    pub lmr_reduction_limit: i32,
    /// Extra plies removed from a reduced move
    pub lmr_reduction: i32,
    /// Number of nodes between two polls of the cancellation token
    pub poll_interval: u64,
    /// Search one ply deeper when the side to move is in check
    pub check_extension: bool,
}

impl SearchConfig {
    pub fn with_max_depth(max_depth: usize) -> SearchConfig {
        SearchConfig {
            max_depth,
            ..SearchConfig::default()
        }
    }
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            max_depth: 64,
            null_move_reduction: 3,
            null_move_min_depth: 3,
            lmr_full_depth_moves: 4,
            lmr_reduction_limit: 3,
            lmr_reduction: 1,
            poll_interval: 2048,
            check_extension: true,
        }
    }
}

/// Cancellation token polled by the search
pub trait Cancel {
    fn should_stop(&mut self) -> bool;
}

/// Never cancels
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Never;

impl Cancel for Never {
    #[inline]
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// Shared stop flag, which can be raised from another thread
#[derive(Debug, Default, Clone)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> StopFlag {
        StopFlag::default()
    }

    /// Returns another handle to the same flag
    pub fn handle(&self) -> StopFlag {
        self.clone()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Cancel for StopFlag {
    #[inline]
    fn should_stop(&mut self) -> bool {
        self.is_stopped()
    }
}

/// Cancels once the given instant has passed
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Deadline(pub Instant);

impl Cancel for Deadline {
    #[inline]
    fn should_stop(&mut self) -> bool {
        Instant::now() >= self.0
    }
}

impl<F: FnMut() -> bool> Cancel for F {
    #[inline]
    fn should_stop(&mut self) -> bool {
        self()
    }
}

/// Marker returned when the search was cancelled in the middle of an iteration
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Aborted;

/// Outcome of [`Searcher::find_best()`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move of the deepest completed iteration, `None` if there are no legal moves
    pub best_move: Option<Move>,
    /// Score of `best_move` from the point of view of the side to move
    pub score: Score,
    /// Deepest completed iteration
    pub depth: usize,
    /// Number of nodes visited, including the ones of the cancelled iteration
    pub nodes: u64,
    /// Principal variation of the deepest completed iteration
    pub pv: Vec<Move>,
    /// `true` if the search was cancelled before reaching `max_depth`
    pub aborted: bool,
}

/// Tables shared by all the nodes of one search
pub struct SearchContext {
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: [[[Score; 64]; Piece::COUNT]; 2],
    pv_table: [[Option<Move>; MAX_PLY]; MAX_PLY],
    pv_length: [usize; MAX_PLY],
    ply: usize,
    nodes: u64,
    follow_pv: bool,
    score_pv: bool,
}

impl SearchContext {
    pub fn boxed() -> Box<SearchContext> {
        Box::new(SearchContext {
            killers: [[None; 2]; MAX_PLY],
            history: [[[0; 64]; Piece::COUNT]; 2],
            pv_table: [[None; MAX_PLY]; MAX_PLY],
            pv_length: [0; MAX_PLY],
            ply: 0,
            nodes: 0,
            follow_pv: false,
            score_pv: false,
        })
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Principal variation found by the last completed iteration
    pub fn pv(&self) -> Vec<Move> {
        self.pv_table[0][..self.pv_length[0]]
            .iter()
            .map_while(|mv| *mv)
            .collect()
    }

    fn killer_slot(&self, mv: Move) -> Option<usize> {
        self.killers[self.ply].iter().position(|k| *k == Some(mv))
    }

    fn store_killer(&mut self, mv: Move) {
        let killers = &mut self.killers[self.ply];
        if killers[0] != Some(mv) {
            killers[1] = killers[0];
            killers[0] = Some(mv);
        }
    }

    fn history_mut(&mut self, mv: Move) -> &mut Score {
        &mut self.history[mv.color().index()][mv.piece().index()][mv.dst().index()]
    }

    fn update_pv(&mut self, mv: Move) {
        let ply = self.ply;
        self.pv_table[ply][ply] = Some(mv);
        let child_len = self.pv_length[ply + 1];
        for next in ply + 1..child_len {
            self.pv_table[ply][next] = self.pv_table[ply + 1][next];
        }
        self.pv_length[ply] = child_len.max(ply + 1);
    }
}

#[inline]
fn mvv_lva(victim: Piece, attacker: Piece) -> i32 {
    (victim.index() as i32 + 1) * 100 + 5 - attacker.index() as i32
}

fn victim(pos: &Position, mv: Move) -> Piece {
    if mv.kind() == MoveKind::EnPassant {
        return Piece::Pawn;
    }
    pos.get(mv.dst()).piece().unwrap_or(Piece::Pawn)
}

/// Reusable engine: a configuration and an evaluator
#[derive(Debug, Clone, Default)]
pub struct Searcher<E> {
    config: SearchConfig,
    evaluator: E,
}

impl<E: Evaluator> Searcher<E> {
    pub fn new(config: SearchConfig, evaluator: E) -> Searcher<E> {
        Searcher { config, evaluator }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Runs iterative deepening from depth 1 up to `max_depth`
    ///
    /// The position is left exactly as it was passed, even if the search is cancelled.
    pub fn find_best<C: Cancel>(&self, pos: &mut Position, cancel: &mut C) -> SearchResult {
        let mut search = Search {
            config: &self.config,
            evaluator: &self.evaluator,
            pos,
            cancel,
            ctx: SearchContext::boxed(),
            can_stop: false,
        };
        search.run()
    }
}

/// Runs a search to the fixed depth `max_depth` with the default evaluator
pub fn find_best(pos: &mut Position, max_depth: usize) -> (Option<Move>, Score) {
    let searcher = Searcher::new(SearchConfig::with_max_depth(max_depth), DefaultEvaluator);
    let res = searcher.find_best(pos, &mut Never);
    (res.best_move, res.score)
}

struct Search<'a, E, C> {
    config: &'a SearchConfig,
    evaluator: &'a E,
    pos: &'a mut Position,
    cancel: &'a mut C,
    ctx: Box<SearchContext>,
    can_stop: bool,
}

impl<'a, E: Evaluator, C: Cancel> Search<'a, E, C> {
    fn run(&mut self) -> SearchResult {
        let mut res = SearchResult {
            best_move: None,
            score: DRAW,
            depth: 0,
            nodes: 0,
            pv: Vec::new(),
            aborted: false,
        };
        if !movegen::has_legal_moves(self.pos) {
            if self.pos.is_check() {
                res.score = -MATE;
            }
            return res;
        }

        let max_depth = self.config.max_depth.min(MAX_PLY - 1);
        for depth in 1..=max_depth {
            self.can_stop = depth > 1;
            if self.can_stop && self.cancel.should_stop() {
                res.aborted = true;
                break;
            }
            self.ctx.follow_pv = true;
            self.ctx.score_pv = false;
            match self.negamax(depth as i32, BLACK_WIN, WHITE_WIN) {
                Ok(score) => {
                    res.score = score;
                    res.depth = depth;
                    res.pv = self.ctx.pv();
                    res.best_move = res.pv.first().copied();
                    let pv: Vec<String> = res.pv.iter().map(|m| m.to_string()).collect();
                    debug!(
                        "depth {} score {} nodes {} pv {}",
                        depth,
                        score,
                        self.ctx.nodes,
                        pv.join(" ")
                    );
                }
                Err(Aborted) => {
                    res.aborted = true;
                    break;
                }
            }
        }
        if res.aborted {
            debug!("search aborted, deepest completed depth is {}", res.depth);
        }
        res.nodes = self.ctx.nodes;
        res
    }

    #[inline]
    fn tick(&mut self) -> Result<(), Aborted> {
        self.ctx.nodes += 1;
        if self.can_stop
            && self.ctx.nodes % self.config.poll_interval.max(1) == 0
            && self.cancel.should_stop()
        {
            return Err(Aborted);
        }
        Ok(())
    }

    #[inline]
    fn mate_score(&self) -> Score {
        -MATE + self.ctx.ply as Score
    }

    fn order_score(&mut self, mv: Move) -> i32 {
        if self.ctx.score_pv && self.ctx.pv_table[0][self.ctx.ply] == Some(mv) {
            self.ctx.score_pv = false;
            return PV_SCORE;
        }
        if self.pos.is_capture(mv) {
            return CAPTURE_SCORE + mvv_lva(victim(self.pos, mv), mv.piece());
        }
        if let Some(slot) = self.ctx.killer_slot(mv) {
            return KILLER_SCORES[slot];
        }
        *self.ctx.history_mut(mv)
    }

    fn order_moves(&mut self, moves: &mut MoveList) {
        if self.ctx.follow_pv {
            self.ctx.follow_pv = false;
            let pv_move = self.ctx.pv_table[0][self.ctx.ply];
            if pv_move.is_some() && moves.iter().any(|mv| Some(*mv) == pv_move) {
                self.ctx.follow_pv = true;
                self.ctx.score_pv = true;
            }
        }
        let mut scored: ArrayVec<(i32, Move), 256> = moves.iter().map(|mv| (0, *mv)).collect();
        for item in &mut scored {
            item.0 = self.order_score(item.1);
        }
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        for (dst, (_, mv)) in moves.iter_mut().zip(scored) {
            *dst = mv;
        }
    }

    fn negamax(&mut self, mut depth: i32, mut alpha: Score, beta: Score) -> Result<Score, Aborted> {
        let ply = self.ctx.ply;
        self.ctx.pv_length[ply] = ply;

        let in_check = self.pos.is_check();
        if in_check && self.config.check_extension {
            depth += 1;
        }
        if depth <= 0 {
            return self.quiescence(alpha, beta);
        }
        if ply >= MAX_PLY - 1 {
            return Ok(self.evaluator.evaluate(self.pos));
        }
        self.tick()?;

        if ply > 0 && depth >= self.config.null_move_min_depth && !in_check {
            self.pos.do_null_move();
            self.ctx.ply += 1;
            let res = self.negamax(depth - self.config.null_move_reduction, -beta, -beta + 1);
            self.ctx.ply -= 1;
            self.pos.undo_null_move();
            let score = -res?;
            if score >= beta {
                trace!("null move cutoff at ply {}, depth {}", ply, depth);
                return Ok(beta);
            }
        }

        let mut moves = movegen::gen_all(self.pos);
        if moves.is_empty() {
            return Ok(if in_check { self.mate_score() } else { DRAW });
        }
        self.order_moves(&mut moves);

        let mut best = -MATE - 1;
        for (searched, &mv) in moves.iter().enumerate() {
            let quiet = !self.pos.is_capture(mv) && mv.promote().is_none();
            self.pos.do_move(mv);
            self.ctx.ply += 1;
            let res = self.search_child(searched, depth, alpha, beta, in_check, quiet);
            self.ctx.ply -= 1;
            self.pos.undo_move();
            let score = res?;

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
                if quiet {
                    *self.ctx.history_mut(mv) += depth;
                }
                self.ctx.update_pv(mv);
            }
            if score >= beta {
                if quiet {
                    self.ctx.store_killer(mv);
                }
                break;
            }
        }
        Ok(best)
    }

    /// Searches the position after the `searched`-th move, which has already been applied
    fn search_child(
        &mut self,
        searched: usize,
        depth: i32,
        alpha: Score,
        beta: Score,
        in_check: bool,
        quiet: bool,
    ) -> Result<Score, Aborted> {
        if searched == 0 {
            return Ok(-self.negamax(depth - 1, -beta, -alpha)?);
        }
        let reduce = searched >= self.config.lmr_full_depth_moves
            && depth >= self.config.lmr_reduction_limit
            && quiet
            && !in_check
            && !self.pos.is_check();
        if reduce {
            let reduced_depth = depth - 1 - self.config.lmr_reduction;
            let score = -self.negamax(reduced_depth, -alpha - 1, -alpha)?;
            if score <= alpha {
                return Ok(score);
            }
            trace!("late move re-search at ply {}, depth {}", self.ctx.ply, depth);
        }
        Ok(-self.negamax(depth - 1, -beta, -alpha)?)
    }

    fn quiescence(&mut self, mut alpha: Score, beta: Score) -> Result<Score, Aborted> {
        let ply = self.ctx.ply;
        self.ctx.pv_length[ply] = ply;
        self.tick()?;

        if ply >= MAX_PLY - 1 {
            return Ok(self.evaluator.evaluate(self.pos));
        }
        // Full legality here: a check with no captures available is not necessarily mate
        if self.pos.is_check() && !movegen::has_legal_moves(self.pos) {
            return Ok(self.mate_score());
        }

        let stand_pat = self.evaluator.evaluate(self.pos);
        if stand_pat >= beta {
            return Ok(stand_pat);
        }
        alpha = alpha.max(stand_pat);
        let mut best = stand_pat;

        let mut captures = movegen::gen_captures(self.pos);
        let pos = &*self.pos;
        captures.sort_by_key(|mv| -mvv_lva(victim(pos, *mv), mv.piece()));

        for &mv in captures.iter() {
            self.pos.do_move(mv);
            self.ctx.ply += 1;
            let res = self.quiescence(-beta, -alpha);
            self.ctx.ply -= 1;
            self.pos.undo_move();
            let score = -res?;

            if score >= beta {
                return Ok(score);
            }
            best = best.max(score);
            alpha = alpha.max(score);
        }
        Ok(best)
    }
}
