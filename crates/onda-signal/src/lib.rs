//! Onda Signal - compositional signal expressions for software synthesis
//!
//! This crate provides the expression engine at the heart of onda: a small
//! algebra of time-domain functions that is cheap enough to walk once per
//! output sample inside a real-time audio callback.
//!
//! # Core Abstractions
//!
//! ## Expression Arena
//!
//! - [`SignalArena`] - owns every expression node; hands out stable
//!   [`ExprId`] handles
//! - [`Operand`] - what a combinator binds: the time variable, a constant,
//!   or another node's handle
//! - [`BinaryOp`] - the six combinators: add, sub, mul, div, compose,
//!   convolve
//!
//! Combinators never own their children; they store handles into the arena,
//! so sub-expressions can be shared by multiple parents and the whole tree
//! is torn down as one unit with the arena.
//!
//! ## Periodic Caches
//!
//! [`SignalArena::attach_cache`] freezes one period of a node into a lookup
//! table, bounding per-sample cost. Convolution nodes are
//! O([`FILTER_ORDER`]) per sample and need this to meet the callback
//! deadline.
//!
//! ## Devices
//!
//! - [`Oscillator`] - amplitude/frequency/phase-shift modulated waveform
//! - [`Filter`] - windowed-sinc impulse response for convolution
//!
//! # Example
//!
//! ```rust
//! use onda_signal::{Operand, SignalArena, wave};
//!
//! let mut arena = SignalArena::new();
//! let saw = arena.primitive(wave::sawtooth);
//! let scaled = arena.mul(Operand::Const(0.5), saw);
//! let sample = arena.eval(scaled, 0.25);
//! assert!(sample.abs() <= 0.5);
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded targets. Disable the
//! default `std` feature:
//!
//! ```toml
//! [dependencies]
//! onda-signal = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: evaluation never allocates
//! - **Pure evaluation**: `eval(node, t)` has no hidden mutable state
//!   beyond the optional cache lookup
//! - **Handles, not references**: no lifetime entanglement between devices
//!   and the expressions they build

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod expr;
pub mod filter;
pub mod oscillator;
pub mod wave;

pub use expr::{
    BinaryOp, CACHE_CAPACITY, ExprId, FILTER_ORDER, Operand, SignalArena, SignalError, WaveFn,
};
pub use filter::Filter;
pub use oscillator::Oscillator;
