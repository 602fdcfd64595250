//! Pluggable audio backend abstraction.
//!
//! The [`AudioBackend`] trait decouples the driver lifecycle from any
//! specific platform audio API. The default implementation wraps
//! [cpal](https://crates.io/crates/cpal) ([`crate::cpal_backend::CpalBackend`]);
//! tests substitute a deterministic mock.
//!
//! A backend does two things: **negotiate** a hardware configuration
//! (resolving the requested device, rate, and channel count into the
//! concrete [`StreamParams`] including the slot [`SampleFormat`] the
//! device actually speaks), and **build** an output stream that invokes a
//! period callback on the platform's real-time audio thread.
//!
//! Callbacks are boxed closures rather than generic parameters, keeping
//! the trait object-safe so backends can be selected at runtime through
//! `Box<dyn AudioBackend>`. Stream handles are returned as
//! [`StreamHandle`], a type-erased wrapper that stops playback on drop.

use crate::driver::DriverConfig;
use crate::format::SampleFormat;
use crate::Result;

/// The negotiated configuration of a running stream.
///
/// Produced by [`AudioBackend::negotiate`]; every field reflects what the
/// hardware will actually deliver, which may differ from what the
/// [`DriverConfig`] asked for.
#[derive(Debug, Clone)]
pub struct StreamParams {
    /// Number of interleaved channels per frame.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred period length in frames.
    pub buffer_frames: u32,
    /// The slot format of the device buffers.
    pub format: SampleFormat,
    /// Resolved device name, when the backend can report one.
    pub device_name: Option<String>,
}

/// Per-period render callback.
///
/// Invoked on the real-time audio thread with the raw period memory and
/// the frame count (`bytes.len() == frames * channels * format.bytes()`).
/// Implementations must not allocate, block, or perform I/O; the driver's
/// render path takes its operation lock in try-acquire mode for exactly
/// this reason.
pub type PeriodCallback = Box<dyn FnMut(&mut [u8], usize) + Send>;

/// Error callback signature.
///
/// Called with a human-readable message when the backend encounters a
/// streaming error.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback. The inner value is `Box<dyn Send>`, keeping backend types
/// out of application code.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, kept alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Pluggable audio backend trait.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g. "cpal", "mock").
    fn name(&self) -> &str;

    /// Resolve a driver configuration against the actual hardware.
    ///
    /// Returns the parameters the device will stream with, including its
    /// native sample format. Fails when no device matches the request or
    /// the device's format falls outside the codec's matrix.
    fn negotiate(&self, config: &DriverConfig) -> Result<StreamParams>;

    /// Build and start an output stream.
    ///
    /// `callback` runs on the audio thread once per period with the raw
    /// device memory in the negotiated format. The returned handle keeps
    /// the stream alive; dropping it stops playback.
    fn build_output_stream(
        &self,
        params: &StreamParams,
        callback: PeriodCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;
}
