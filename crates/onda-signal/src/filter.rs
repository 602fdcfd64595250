//! Windowed-sinc lowpass filter device.

use crate::expr::{ExprId, FILTER_ORDER, Operand, SignalArena, SignalError};
use crate::wave;

use core::f32::consts::TAU;

/// A lowpass filter exposed as an impulse-response expression.
///
/// The response is `blackman(t) · sinc(2·cutoff·(t − L/2))` with
/// `L = (N−1)·Δ`, `N` = [`FILTER_ORDER`] and Δ the arena's sample
/// interval — a sinc centered on the middle of the tap window, tapered by
/// a Blackman window so the truncation to `N` taps doesn't ring.
///
/// The filter itself does no convolution; callers combine the response
/// with a source via [`SignalArena::convolve`]:
///
/// ```rust
/// use onda_signal::{Filter, Oscillator, SignalArena};
///
/// let mut arena = SignalArena::new();
/// let osc = Oscillator::new(&mut arena);
/// let mut filter = Filter::new(&mut arena);
/// filter.set_cutoff(&mut arena, 2000.0);
/// filter.cache(&mut arena).unwrap();
///
/// let out = arena.convolve(filter.impulse_response(), osc.output());
/// let _sample = arena.eval(out, 0.0);
/// ```
///
/// Convolution costs [`FILTER_ORDER`] impulse-response evaluations per
/// output sample, so [`cache`](Filter::cache) the response before using it
/// in a real-time path.
#[derive(Debug)]
pub struct Filter {
    cutoff: Operand,
    impulse_response: ExprId,
}

impl Filter {
    /// Default cutoff: 5 kHz.
    pub fn new(arena: &mut SignalArena) -> Self {
        let cutoff = Operand::Const(5000.0);
        let impulse_response = Self::build(arena, cutoff);
        Self {
            cutoff,
            impulse_response,
        }
    }

    fn build(arena: &mut SignalArena, cutoff: Operand) -> ExprId {
        let delta = arena.sample_interval();
        let span = (FILTER_ORDER - 1) as f32 * delta;

        // Blackman window over [0, span]:
        // 0.42 - 0.5·cos(2πt/span) + 0.08·cos(4πt/span)
        let cos_one = arena.primitive(wave::cosine);
        let angle_one = arena.mul(Operand::Time, Operand::Const(TAU / span));
        let lobe_one = arena.compose(cos_one, angle_one);
        let cos_two = arena.primitive(wave::cosine);
        let angle_two = arena.mul(Operand::Time, Operand::Const(2.0 * TAU / span));
        let lobe_two = arena.compose(cos_two, angle_two);
        let term_one = arena.mul(Operand::Const(0.5), lobe_one);
        let term_two = arena.mul(Operand::Const(0.08), lobe_two);
        let tapered = arena.sub(Operand::Const(0.42), term_one);
        let window = arena.add(tapered, term_two);

        // Sinc centered on the middle of the tap window.
        let sinc = arena.primitive(wave::sinc);
        let centered = arena.sub(Operand::Time, Operand::Const(span / 2.0));
        let bandwidth = arena.mul(Operand::Const(2.0), cutoff);
        let stretched = arena.mul(bandwidth, centered);
        let shifted = arena.compose(sinc, stretched);

        arena.mul(window, shifted)
    }

    fn rebuild(&mut self, arena: &mut SignalArena) {
        self.impulse_response = Self::build(arena, self.cutoff);
    }

    /// Handle of the impulse-response expression.
    ///
    /// Changes whenever the cutoff is replaced; re-read it after
    /// [`set_cutoff`](Filter::set_cutoff).
    #[inline]
    pub fn impulse_response(&self) -> ExprId {
        self.impulse_response
    }

    /// Replace the cutoff operand (Hz) and rebuild the impulse response.
    ///
    /// Any cache on the previous response stays with the old handle; call
    /// [`cache`](Filter::cache) again after changing the cutoff.
    pub fn set_cutoff(&mut self, arena: &mut SignalArena, cutoff: impl Into<Operand>) {
        self.cutoff = cutoff.into();
        self.rebuild(arena);
    }

    /// Cache the impulse response over its full tap window.
    ///
    /// The support is `N·Δ` seconds — well inside cache capacity for any
    /// realistic sample rate.
    pub fn cache(&self, arena: &mut SignalArena) -> Result<(), SignalError> {
        let delta = arena.sample_interval();
        arena.attach_cache(self.impulse_response, FILTER_ORDER as f32 * delta, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_peaks_at_center() {
        let mut arena = SignalArena::with_sample_rate(44_100.0);
        let filter = Filter::new(&mut arena);

        let delta = arena.sample_interval();
        let center = (FILTER_ORDER - 1) as f32 * delta / 2.0;
        let peak = arena.eval(filter.impulse_response(), center);

        // sinc(0) = 1 at the center; the Blackman window is 1 there too.
        assert!(peak > 0.9, "center tap should dominate, got {peak}");

        // Taps away from the center are smaller in magnitude.
        let edge = arena.eval(filter.impulse_response(), 0.0);
        assert!(edge.abs() < peak);
    }

    #[test]
    fn test_window_vanishes_at_edges() {
        let mut arena = SignalArena::with_sample_rate(44_100.0);
        let filter = Filter::new(&mut arena);

        let delta = arena.sample_interval();
        let span = (FILTER_ORDER - 1) as f32 * delta;

        // Blackman endpoints: 0.42 - 0.5 + 0.08 = 0.
        for t in [0.0, span] {
            let v = arena.eval(filter.impulse_response(), t);
            assert!(v.abs() < 1e-3, "response at window edge t={t} was {v}");
        }
    }

    #[test]
    fn test_set_cutoff_rebuilds() {
        let mut arena = SignalArena::with_sample_rate(44_100.0);
        let mut filter = Filter::new(&mut arena);
        let before = filter.impulse_response();

        filter.set_cutoff(&mut arena, 2000.0);
        assert_ne!(filter.impulse_response(), before);
    }

    #[test]
    fn test_cache_fits_capacity() {
        let mut arena = SignalArena::with_sample_rate(192_000.0);
        let filter = Filter::new(&mut arena);
        filter.cache(&mut arena).unwrap();
        assert!(arena.is_cached(filter.impulse_response()));
    }

    #[test]
    fn test_lowpass_passes_dc_attenuates_high() {
        let mut arena = SignalArena::with_sample_rate(44_100.0);
        let mut filter = Filter::new(&mut arena);
        filter.set_cutoff(&mut arena, 1000.0);
        filter.cache(&mut arena).unwrap();

        let delta = arena.sample_interval();

        // DC gain: sum of taps, approximated by convolving with a unit
        // constant.
        let dc = arena.constant(1.0);
        let conv = arena.convolve(filter.impulse_response(), dc);
        let t = FILTER_ORDER as f32 * delta;
        let dc_gain = arena.eval(conv, t);

        // A tone far above cutoff should come through much weaker than DC.
        let mut osc = crate::Oscillator::new(&mut arena);
        osc.set_frequency(&mut arena, 15_000.0);
        osc.set_amplitude(&mut arena, 1.0);
        let filtered = arena.convolve(filter.impulse_response(), osc.output());

        let mut peak: f32 = 0.0;
        for i in 0..64 {
            let sample = arena.eval(filtered, t + i as f32 * delta);
            peak = peak.max(sample.abs());
        }
        assert!(
            peak < dc_gain.abs() * 0.5,
            "15 kHz peak {peak} vs DC gain {dc_gain}"
        );
    }
}
