//! # Base types for kestrel
//!
//! This is an auxiliary crate for `kestrel`, which contains the square and piece types, the
//! [`Bitboard`](bitboard::Bitboard) primitives and the closed-form ray formulas. It is split from
//! the main crate, so everything declared here can be used in the build script for `kestrel`.
//!
//! Normally you don't want to use this crate directly. Use `kestrel` instead.

pub mod bitboard;
pub mod bitboard_consts;
pub mod geometry;
pub mod rays;
pub mod types;
