//! Modulatable oscillator device.

use crate::expr::{ExprId, Operand, SignalArena, SignalError};
use crate::wave;

use core::f32::consts::TAU;

/// An oscillator built from expression nodes.
///
/// The output expression is
/// `amplitude · waveform(t · frequency · 2π) + phase_shift`, where every
/// parameter is itself an [`Operand`] — a constant for a fixed tone, or
/// another expression's handle for modulation (an LFO on the amplitude,
/// a sweep on the frequency, and so on).
///
/// Combinators bind their operands when the tree is built, so replacing a
/// parameter rebuilds the output expression and yields a fresh handle;
/// anything holding the old handle keeps seeing the old tree.
///
/// # Example
///
/// ```rust
/// use onda_signal::{Oscillator, SignalArena, wave};
///
/// let mut arena = SignalArena::new();
/// let mut osc = Oscillator::new(&mut arena);
/// osc.set_frequency(&mut arena, 500.0);
/// osc.set_amplitude(&mut arena, 0.05);
/// osc.set_waveform(&mut arena, wave::sawtooth);
///
/// let sample = arena.eval(osc.output(), 0.001);
/// assert!(sample.abs() <= 0.05 + 1e-6);
/// ```
#[derive(Debug)]
pub struct Oscillator {
    amplitude: Operand,
    frequency: Operand,
    phase_shift: Operand,
    waveform: Operand,
    output: ExprId,
}

impl Oscillator {
    /// Default parameters: 220 Hz sine at half amplitude, no shift.
    pub fn new(arena: &mut SignalArena) -> Self {
        let waveform = Operand::Expr(arena.primitive(wave::sine));
        let amplitude = Operand::Const(0.5);
        let frequency = Operand::Const(220.0);
        let phase_shift = Operand::Const(0.0);
        let output = Self::build(arena, amplitude, frequency, phase_shift, waveform);
        Self {
            amplitude,
            frequency,
            phase_shift,
            waveform,
            output,
        }
    }

    fn build(
        arena: &mut SignalArena,
        amplitude: Operand,
        frequency: Operand,
        phase_shift: Operand,
        waveform: Operand,
    ) -> ExprId {
        let omega = arena.mul(frequency, Operand::Const(TAU));
        let angle = arena.mul(Operand::Time, omega);
        let shaped = arena.compose(waveform, angle);
        let scaled = arena.mul(amplitude, shaped);
        arena.add(scaled, phase_shift)
    }

    fn rebuild(&mut self, arena: &mut SignalArena) {
        self.output = Self::build(
            arena,
            self.amplitude,
            self.frequency,
            self.phase_shift,
            self.waveform,
        );
    }

    /// Handle of the modulated output expression.
    ///
    /// Changes whenever a parameter is replaced; re-read it after any
    /// setter call.
    #[inline]
    pub fn output(&self) -> ExprId {
        self.output
    }

    /// Replace the amplitude operand and rebuild the output.
    pub fn set_amplitude(&mut self, arena: &mut SignalArena, amplitude: impl Into<Operand>) {
        self.amplitude = amplitude.into();
        self.rebuild(arena);
    }

    /// Replace the frequency operand (Hz) and rebuild the output.
    pub fn set_frequency(&mut self, arena: &mut SignalArena, frequency: impl Into<Operand>) {
        self.frequency = frequency.into();
        self.rebuild(arena);
    }

    /// Replace the phase-shift operand and rebuild the output.
    pub fn set_phase_shift(&mut self, arena: &mut SignalArena, phase_shift: impl Into<Operand>) {
        self.phase_shift = phase_shift.into();
        self.rebuild(arena);
    }

    /// Replace the waveform primitive and rebuild the output.
    pub fn set_waveform(&mut self, arena: &mut SignalArena, waveform: crate::WaveFn) {
        self.waveform = Operand::Expr(arena.primitive(waveform));
        self.rebuild(arena);
    }

    /// Cache one waveform period of the output expression.
    ///
    /// Only meaningful when the output is actually periodic with
    /// `period` (a constant-frequency oscillator with `period = 1/f`).
    pub fn cache(&self, arena: &mut SignalArena, period: f32) -> Result<(), SignalError> {
        arena.attach_cache(self.output, period, arena.sample_interval())
    }
}
