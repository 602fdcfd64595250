//! Arena-backed signal expression trees.
//!
//! A [`SignalArena`] owns a flat vector of expression nodes and hands out
//! [`ExprId`] handles. Handles are assigned sequentially and never reused,
//! and a combinator may only reference nodes that already exist, so the
//! structure is acyclic by construction while still allowing one child to
//! be shared by several parents.
//!
//! Evaluation is purely functional: `eval(id, t)` walks the tree and
//! returns the sample value at time `t`. The only exception is the
//! per-node periodic cache, which replaces a node's definition with a
//! precomputed one-period lookup table (see
//! [`attach_cache`](SignalArena::attach_cache)).
//!
//! Identity-elimination dispatch happens at construction time only:
//! composing with the time variable simplifies structurally, and the
//! arithmetic combinators record identity operands as [`Operand::Time`] so
//! `add(Time, Time)` still evaluates to `2t`. Evaluation never re-derives
//! what kind of operand it is looking at.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use libm::{ceilf, floorf, fmodf};

/// Number of taps a `Convolve` node sums per sample.
pub const FILTER_ORDER: usize = 32;

/// Maximum number of entries in a periodic cache.
pub const CACHE_CAPACITY: usize = 1024;

/// Default sample rate assumed until the driver reports the actual one.
const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// A pure, allocation-free waveform primitive.
pub type WaveFn = fn(f32) -> f32;

/// Unique handle for a node in a [`SignalArena`].
///
/// Handles are assigned sequentially and remain stable for the lifetime of
/// the arena. They are meaningless in any other arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExprId(pub(crate) u32);

impl ExprId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for ExprId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// What a combinator binds on one side: the time variable itself, an
/// inline constant, or a handle to another node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    /// The identity function of time.
    Time,
    /// A constant function.
    Const(f32),
    /// Another expression in the same arena.
    Expr(ExprId),
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Self::Const(value)
    }
}

impl From<ExprId> for Operand {
    fn from(id: ExprId) -> Self {
        Self::Expr(id)
    }
}

/// The six binary combinators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `lhs(t) + rhs(t)`
    Add,
    /// `lhs(t) - rhs(t)`
    Sub,
    /// `lhs(t) * rhs(t)`
    Mul,
    /// `lhs(t) / rhs(t)`
    Div,
    /// `lhs(rhs(t))`
    Compose,
    /// `Σ lhs(iΔ) · rhs(t − iΔ)` over [`FILTER_ORDER`] taps
    Convolve,
}

/// Errors reported by the expression engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SignalError {
    /// The requested cache would need more entries than
    /// [`CACHE_CAPACITY`]. Shorten the period or coarsen the interval.
    CacheOverflow {
        /// Requested period in seconds.
        period: f32,
        /// Requested sample interval in seconds.
        interval: f32,
        /// Fixed cache capacity in entries.
        capacity: usize,
    },
    /// The handle does not name a node in this arena.
    NodeNotFound(ExprId),
}

#[cfg(feature = "std")]
impl std::fmt::Display for SignalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CacheOverflow {
                period,
                interval,
                capacity,
            } => write!(
                f,
                "period {period}s at interval {interval}s exceeds cache capacity of {capacity} entries"
            ),
            Self::NodeNotFound(id) => write!(f, "node {id} not found in this arena"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SignalError {}

/// One period of a node's output, frozen into a lookup table.
#[derive(Clone, Debug)]
struct PeriodicCache {
    samples: Vec<f32>,
    period: f32,
    interval: f32,
}

impl PeriodicCache {
    fn lookup(&self, t: f32) -> f32 {
        let mut wrapped = fmodf(t, self.period);
        if wrapped < 0.0 {
            wrapped += self.period;
        }
        let index = floorf(wrapped / self.interval) as usize;
        self.samples[index.min(self.samples.len() - 1)]
    }
}

/// A node's logical definition.
#[derive(Clone, Copy, Debug)]
enum NodeKind {
    Const(f32),
    Time,
    Primitive(WaveFn),
    Binary {
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    cache: Option<PeriodicCache>,
}

/// Arena owning every node of a signal expression forest.
///
/// All construction goes through the arena; all evaluation reads from it.
/// The arena also carries the sample interval used by convolution taps and
/// cache population, which the driver sets once the hardware sample rate
/// is known.
#[derive(Clone, Debug)]
pub struct SignalArena {
    nodes: Vec<Node>,
    sample_interval: f32,
}

impl Default for SignalArena {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalArena {
    /// Create an empty arena at the default 44.1 kHz sample rate.
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    /// Create an empty arena for the given sample rate.
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            nodes: Vec::new(),
            sample_interval: 1.0 / sample_rate,
        }
    }

    /// Seconds between consecutive samples.
    #[inline]
    pub fn sample_interval(&self) -> f32 {
        self.sample_interval
    }

    /// Set the sample rate used for convolution taps and cache population.
    ///
    /// Caches attached before the change keep their old contents; callers
    /// that change the rate must rebuild and re-attach them.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_interval = 1.0 / sample_rate;
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, kind: NodeKind) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, cache: None });
        id
    }

    /// A constant function.
    pub fn constant(&mut self, value: f32) -> ExprId {
        self.push(NodeKind::Const(value))
    }

    /// The identity function of time.
    pub fn time(&mut self) -> ExprId {
        self.push(NodeKind::Time)
    }

    /// A primitive waveform leaf (see [`crate::wave`]).
    pub fn primitive(&mut self, f: WaveFn) -> ExprId {
        self.push(NodeKind::Primitive(f))
    }

    /// Turn an operand into a standalone node.
    fn materialize(&mut self, operand: Operand) -> ExprId {
        match operand {
            Operand::Time => self.time(),
            Operand::Const(v) => self.constant(v),
            Operand::Expr(id) => id,
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: Operand, rhs: Operand) -> ExprId {
        self.push(NodeKind::Binary { op, lhs, rhs })
    }

    /// `lhs(t) + rhs(t)`
    pub fn add(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> ExprId {
        self.binary(BinaryOp::Add, lhs.into(), rhs.into())
    }

    /// `lhs(t) - rhs(t)`
    pub fn sub(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> ExprId {
        self.binary(BinaryOp::Sub, lhs.into(), rhs.into())
    }

    /// `lhs(t) * rhs(t)`
    pub fn mul(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> ExprId {
        self.binary(BinaryOp::Mul, lhs.into(), rhs.into())
    }

    /// `lhs(t) / rhs(t)`
    pub fn div(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> ExprId {
        self.binary(BinaryOp::Div, lhs.into(), rhs.into())
    }

    /// Function composition, `lhs(rhs(t))`.
    ///
    /// Composing with the time variable simplifies at construction:
    /// `compose(Time, x)` is `x`, `compose(x, Time)` is `x`, and
    /// `compose(Time, Time)` is the identity. This is the only place that
    /// inspects operand kinds.
    pub fn compose(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> ExprId {
        match (lhs.into(), rhs.into()) {
            (Operand::Time, Operand::Time) => self.time(),
            (Operand::Time, rhs) => self.materialize(rhs),
            (lhs, Operand::Time) => self.materialize(lhs),
            (lhs, rhs) => self.binary(BinaryOp::Compose, lhs, rhs),
        }
    }

    /// Discrete convolution over [`FILTER_ORDER`] taps spaced by the
    /// arena's sample interval.
    pub fn convolve(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> ExprId {
        self.binary(BinaryOp::Convolve, lhs.into(), rhs.into())
    }

    /// Evaluate an expression at time `t` seconds.
    ///
    /// Pure except for cache lookups. Panics if `id` was minted by a
    /// different arena.
    pub fn eval(&self, id: ExprId, t: f32) -> f32 {
        let node = &self.nodes[id.0 as usize];
        if let Some(cache) = &node.cache {
            return cache.lookup(t);
        }
        self.eval_kind(node.kind, t)
    }

    fn eval_kind(&self, kind: NodeKind, t: f32) -> f32 {
        match kind {
            NodeKind::Const(v) => v,
            NodeKind::Time => t,
            NodeKind::Primitive(f) => f(t),
            NodeKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::Add => self.eval_operand(lhs, t) + self.eval_operand(rhs, t),
                BinaryOp::Sub => self.eval_operand(lhs, t) - self.eval_operand(rhs, t),
                BinaryOp::Mul => self.eval_operand(lhs, t) * self.eval_operand(rhs, t),
                BinaryOp::Div => self.eval_operand(lhs, t) / self.eval_operand(rhs, t),
                BinaryOp::Compose => {
                    let inner = self.eval_operand(rhs, t);
                    self.eval_operand(lhs, inner)
                }
                BinaryOp::Convolve => self.eval_convolution(lhs, rhs, t),
            },
        }
    }

    #[inline]
    fn eval_operand(&self, operand: Operand, t: f32) -> f32 {
        match operand {
            Operand::Time => t,
            Operand::Const(v) => v,
            Operand::Expr(id) => self.eval(id, t),
        }
    }

    fn eval_convolution(&self, lhs: Operand, rhs: Operand, t: f32) -> f32 {
        let mut acc = 0.0;
        for i in 0..FILTER_ORDER {
            let tap = i as f32 * self.sample_interval;
            acc += self.eval_operand(lhs, tap) * self.eval_operand(rhs, t - tap);
        }
        acc
    }

    fn node_mut(&mut self, id: ExprId) -> Result<&mut Node, SignalError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(SignalError::NodeNotFound(id))
    }

    /// Freeze one period of a node into a lookup table.
    ///
    /// The table is populated once, here, by evaluating the node's
    /// definition across `[0, period)` at `interval` steps (honoring any
    /// caches on child nodes). Afterwards `eval` performs
    /// `table[floor((t mod period) / interval)]` instead of walking the
    /// definition.
    ///
    /// Fails with [`SignalError::CacheOverflow`] when the table would need
    /// more than [`CACHE_CAPACITY`] entries, or when period/interval are
    /// not positive. Contents go stale if the definition later changes;
    /// the arena does not invalidate automatically.
    pub fn attach_cache(
        &mut self,
        id: ExprId,
        period: f32,
        interval: f32,
    ) -> Result<(), SignalError> {
        self.node_mut(id)?;
        if !(period > 0.0) || !(interval > 0.0) {
            return Err(SignalError::CacheOverflow {
                period,
                interval,
                capacity: CACHE_CAPACITY,
            });
        }
        let entries = ceilf(period / interval) as usize;
        if entries == 0 || entries > CACHE_CAPACITY {
            return Err(SignalError::CacheOverflow {
                period,
                interval,
                capacity: CACHE_CAPACITY,
            });
        }

        // Evaluate the raw definition, not the node's own (possibly stale)
        // cache; caches on children still apply.
        let kind = self.nodes[id.0 as usize].kind;
        let mut samples = Vec::with_capacity(entries);
        for i in 0..entries {
            samples.push(self.eval_kind(kind, i as f32 * interval));
        }

        self.nodes[id.0 as usize].cache = Some(PeriodicCache {
            samples,
            period,
            interval,
        });
        Ok(())
    }

    /// Remove a node's cache, restoring evaluation of its definition.
    pub fn detach_cache(&mut self, id: ExprId) -> Result<(), SignalError> {
        self.node_mut(id)?.cache = None;
        Ok(())
    }

    /// Whether a node currently evaluates through a cache.
    pub fn is_cached(&self, id: ExprId) -> bool {
        self.nodes
            .get(id.0 as usize)
            .is_some_and(|n| n.cache.is_some())
    }
}
