//! Audio output layer for the onda synthesizer.
//!
//! This crate provides:
//!
//! - **Sample formats**: [`SampleFormat`] describing one hardware sample
//!   slot (byte width, integer/float encoding, byte order)
//! - **Sample codec**: [`codec::encode`] / [`codec::decode`] between raw
//!   slots and normalized f32 amplitudes in [-1, 1]
//! - **Buffer views**: [`SampleBufferMut`] / [`SampleBufferRef`] over
//!   planar or interleaved hardware memory
//! - **Backend abstraction**: the [`AudioBackend`] trait and its cpal
//!   implementation [`CpalBackend`]
//! - **Driver lifecycle**: [`AudioDriver`] — the per-period render
//!   callback and the stop/reset control loop around it
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use onda_io::{AudioDriver, CpalBackend, DriverConfig, StopRequest};
//! use onda_signal::{Oscillator, wave};
//!
//! let mut driver = AudioDriver::new(Box::new(CpalBackend::new()), DriverConfig::default());
//! driver.initialize()?;
//!
//! driver.edit(|arena, output| {
//!     let mut osc = Oscillator::new(arena);
//!     osc.set_frequency(arena, 440.0);
//!     osc.set_waveform(arena, wave::sawtooth);
//!     *output = Some(osc.output());
//! });
//!
//! let state = driver.state();
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     state.request_stop(StopRequest::FullStop);
//! });
//! driver.run()?; // blocks until the full stop
//! ```

pub mod backend;
pub mod buffer;
pub mod codec;
pub mod cpal_backend;
pub mod driver;
pub mod format;

pub use backend::{AudioBackend, ErrorCallback, PeriodCallback, StreamHandle, StreamParams};
pub use buffer::{SampleBufferMut, SampleBufferRef, Samples};
pub use cpal_backend::CpalBackend;
pub use driver::{AudioDriver, DriverConfig, DriverState, StopRequest};
pub use format::{Endianness, SampleEncoding, SampleFormat, SampleWidth};

/// Error types for the audio output layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A driver/backend call returned a non-success status. Fatal to the
    /// current initialization attempt.
    #[error("audio driver error: {0}")]
    Driver(String),

    /// The sample format is not one the codec implements.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// No audio device available on the system.
    #[error("no audio device available")]
    NoDevice,

    /// A component was used before its required setup step.
    #[error("{0} used before initialization")]
    Uninitialized(&'static str),

    /// A buffer view access outside the element range.
    #[error("sample index {index} out of range (buffer holds {len})")]
    OutOfRange {
        /// Requested element index.
        index: usize,
        /// Number of elements in the view.
        len: usize,
    },
}

/// Convenience result type for audio output operations.
pub type Result<T> = std::result::Result<T, Error>;
