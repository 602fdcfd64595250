//! Primitive waveform functions.
//!
//! Pure `fn(f32) -> f32` leaves for
//! [`primitive`](crate::SignalArena::primitive). All take an argument in
//! radians and
//! return a value in [-1.0, 1.0], so an oscillator drives them with
//! `t · frequency · 2π`. The exception is [`sinc`], whose argument is in
//! normalized units (zeros at every nonzero integer).

use core::f32::consts::{PI, TAU};

use libm::{fmodf, sinf};

/// Sine wave.
#[inline]
pub fn sine(x: f32) -> f32 {
    sinf(x)
}

/// Cosine wave.
#[inline]
pub fn cosine(x: f32) -> f32 {
    libm::cosf(x)
}

/// Normalized sinc, `sin(πx) / (πx)` with `sinc(0) = 1`.
///
/// The building block of the windowed-sinc lowpass impulse response.
#[inline]
pub fn sinc(x: f32) -> f32 {
    if x == 0.0 { 1.0 } else { sinf(PI * x) / (PI * x) }
}

/// Rising sawtooth, 2π-periodic, from -1 to 1.
///
/// Defined for negative arguments as well: the phase is wrapped into
/// [0, 2π) before shaping, so the wave is continuous across t = 0.
#[inline]
pub fn sawtooth(x: f32) -> f32 {
    phase(x) / PI - 1.0
}

/// Square wave, 2π-periodic: 1.0 for the first half period, -1.0 for the
/// second.
#[inline]
pub fn square(x: f32) -> f32 {
    if phase(x) < PI { 1.0 } else { -1.0 }
}

/// Wrap an argument into [0, 2π).
#[inline]
fn phase(x: f32) -> f32 {
    let p = fmodf(x, TAU);
    if p < 0.0 { p + TAU } else { p }
}
