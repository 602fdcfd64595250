//! Driver callback lifecycle: the concurrency core of the synthesizer.
//!
//! Two execution contexts touch the same state. The hardware invokes the
//! per-period render callback on a deadline-bound thread; it must never
//! block. A single control thread runs [`AudioDriver::run`], blocking in
//! [`DriverState::wait_for_stop`] until somebody requests a stop, then
//! tearing down or rebuilding the stream.
//!
//! The split is enforced by one reader/writer operation lock over the
//! render state:
//!
//! - the callback takes it in **non-blocking shared** mode and, on
//!   contention, skips the period entirely without touching the buffer
//!   (a dropped period, never a corrupted one);
//! - the control path takes it in **blocking exclusive** mode before any
//!   teardown or re-initialization, so it never races a callback that is
//!   mid-write into hardware memory.
//!
//! A separate stop channel (a stored stop kind plus a condition variable)
//! decouples "something requested a stop" from "the operation lock is
//! free": [`DriverState::request_stop`] is callable from any context,
//! including from inside the render callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock, TryLockError};

use onda_signal::{ExprId, SignalArena};

use crate::backend::{AudioBackend, StreamHandle, StreamParams};
use crate::buffer::SampleBufferMut;
use crate::format::SampleFormat;
use crate::{Error, Result};

/// What a stop request asks the control loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    /// Stop the stream and exit the control loop.
    FullStop,
    /// Stop, renegotiate with the device, and resume.
    Reset,
    /// Like [`Reset`](Self::Reset), but also adopt the renegotiated
    /// sample rate into the signal arena.
    SampleRateReset,
}

/// Requested driver configuration, resolved against hardware by
/// [`AudioBackend::negotiate`].
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Number of output channels.
    pub channels: u16,
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred period length in frames.
    pub buffer_frames: u32,
    /// Optional device name filter (system default if `None`).
    pub device_name: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            buffer_frames: 256,
            device_name: None,
        }
    }
}

/// Everything the render callback reads, guarded by the operation lock.
struct RenderState {
    arena: SignalArena,
    output: Option<ExprId>,
    channels: usize,
    sample_rate: f32,
    format: SampleFormat,
}

/// State shared between the render callback and the control thread.
///
/// Handed out as `Arc<DriverState>` by [`AudioDriver::state`] so any
/// thread can request a stop while the control loop owns the driver.
pub struct DriverState {
    render: RwLock<RenderState>,
    stop: Mutex<Option<StopRequest>>,
    stop_signal: Condvar,
    sample_pos: AtomicU64,
    periods_rendered: AtomicU64,
    periods_skipped: AtomicU64,
}

impl DriverState {
    fn new(config: &DriverConfig) -> Self {
        Self {
            render: RwLock::new(RenderState {
                arena: SignalArena::with_sample_rate(config.sample_rate as f32),
                output: None,
                channels: usize::from(config.channels),
                sample_rate: config.sample_rate as f32,
                format: SampleFormat::INT16_NATIVE,
            }),
            stop: Mutex::new(None),
            stop_signal: Condvar::new(),
            sample_pos: AtomicU64::new(0),
            periods_rendered: AtomicU64::new(0),
            periods_skipped: AtomicU64::new(0),
        }
    }

    /// Record a stop request and wake the control loop.
    ///
    /// Callable from any context, including the render callback; holds the
    /// stop mutex only long enough to store the kind. A later request
    /// overwrites an unconsumed earlier one.
    pub fn request_stop(&self, kind: StopRequest) {
        let mut pending = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = Some(kind);
        self.stop_signal.notify_all();
    }

    /// Block until a stop request arrives, then consume and return it.
    pub fn wait_for_stop(&self) -> StopRequest {
        let mut pending = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(kind) = pending.take() {
                return kind;
            }
            pending = self
                .stop_signal
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Render one hardware period into `bytes`.
    ///
    /// Takes the operation lock in non-blocking shared mode. On
    /// contention the period is skipped and the buffer left untouched;
    /// the hardware memory may be mid-teardown. With no active output
    /// expression the period renders as silence.
    pub fn render_period(&self, bytes: &mut [u8], frames: usize) {
        let render = match self.render.try_read() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                self.periods_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let offset = self.sample_pos.load(Ordering::Relaxed);
        let rate = render.sample_rate;
        for channel in 0..render.channels {
            let view = SampleBufferMut::interleaved(bytes, render.format, render.channels, channel);
            let Ok(mut view) = view else {
                self.periods_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            };
            let filled = view.fill_with(|i| {
                let value = match render.output {
                    Some(id) => render.arena.eval(id, (offset + i as u64) as f32 / rate),
                    None => 0.0,
                };
                value.clamp(-1.0, 1.0)
            });
            if filled.is_err() {
                self.periods_skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        self.sample_pos.fetch_add(frames as u64, Ordering::Relaxed);
        self.periods_rendered.fetch_add(1, Ordering::Relaxed);
    }

    /// Stream position in samples since the last (re-)initialization.
    pub fn sample_position(&self) -> u64 {
        self.sample_pos.load(Ordering::Relaxed)
    }

    /// Periods rendered since construction.
    pub fn periods_rendered(&self) -> u64 {
        self.periods_rendered.load(Ordering::Relaxed)
    }

    /// Periods dropped because the operation lock was held exclusively.
    pub fn periods_skipped(&self) -> u64 {
        self.periods_skipped.load(Ordering::Relaxed)
    }

    fn write_render(&self) -> std::sync::RwLockWriteGuard<'_, RenderState> {
        self.render.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The audio driver: owns the backend, the shared state, and the stream.
///
/// Typical lifecycle: [`new`](Self::new), [`initialize`](Self::initialize),
/// build an expression tree through [`edit`](Self::edit), then hand the
/// thread to [`run`](Self::run) until a [`StopRequest::FullStop`] arrives.
pub struct AudioDriver {
    backend: Box<dyn AudioBackend>,
    config: DriverConfig,
    state: Arc<DriverState>,
    params: Option<StreamParams>,
    stream: Option<StreamHandle>,
}

impl AudioDriver {
    /// Create a driver over a backend. No hardware is touched yet.
    pub fn new(backend: Box<dyn AudioBackend>, config: DriverConfig) -> Self {
        let state = Arc::new(DriverState::new(&config));
        Self {
            backend,
            config,
            state,
            params: None,
            stream: None,
        }
    }

    /// Shared handle to the driver state, for stop requests and metrics
    /// from other threads.
    pub fn state(&self) -> Arc<DriverState> {
        Arc::clone(&self.state)
    }

    /// The parameters negotiated at the last (re-)initialization.
    pub fn params(&self) -> Option<&StreamParams> {
        self.params.as_ref()
    }

    /// Negotiate with the hardware and bind the result into the render
    /// state. Must succeed before [`run`](Self::run).
    pub fn initialize(&mut self) -> Result<()> {
        let params = self.backend.negotiate(&self.config)?;
        self.adopt(&params, true);
        tracing::info!(
            backend = self.backend.name(),
            channels = params.channels,
            sample_rate = params.sample_rate,
            format = %params.format,
            "driver initialized"
        );
        self.params = Some(params);
        Ok(())
    }

    /// Mutate the signal arena and active output expression under the
    /// exclusive operation lock. Concurrent periods render as skips while
    /// the closure runs.
    pub fn edit<R>(&self, f: impl FnOnce(&mut SignalArena, &mut Option<ExprId>) -> R) -> R {
        let mut render = self.state.write_render();
        let RenderState { arena, output, .. } = &mut *render;
        f(arena, output)
    }

    /// Replace the active output expression.
    pub fn set_output(&self, output: Option<ExprId>) {
        self.edit(|_, slot| *slot = output);
    }

    /// Write negotiated parameters into the render state.
    fn adopt(&mut self, params: &StreamParams, adopt_rate: bool) {
        let mut render = self.state.write_render();
        render.channels = usize::from(params.channels);
        render.format = params.format;
        if adopt_rate {
            render.sample_rate = params.sample_rate as f32;
            render.arena.set_sample_rate(params.sample_rate as f32);
        }
        drop(render);
        self.state.sample_pos.store(0, Ordering::Relaxed);
    }

    /// Build and start the output stream for the negotiated parameters.
    fn start_stream(&mut self) -> Result<()> {
        let params = self
            .params
            .as_ref()
            .ok_or(Error::Uninitialized("audio driver"))?;
        let state = Arc::clone(&self.state);
        let callback = Box::new(move |bytes: &mut [u8], frames: usize| {
            state.render_period(bytes, frames);
        });
        let error_state = Arc::clone(&self.state);
        let on_error = Box::new(move |message: &str| {
            tracing::error!(message, "stream error, requesting full stop");
            error_state.request_stop(StopRequest::FullStop);
        });
        self.stream = Some(self.backend.build_output_stream(params, callback, on_error)?);
        Ok(())
    }

    /// Run the control loop until a [`StopRequest::FullStop`].
    ///
    /// Starts the stream, then blocks awaiting stop requests. On
    /// [`StopRequest::Reset`] or [`StopRequest::SampleRateReset`] the
    /// stream is torn down under the exclusive operation lock,
    /// renegotiated, and restarted. Returns [`Error::Uninitialized`] if
    /// called before [`initialize`](Self::initialize).
    pub fn run(&mut self) -> Result<()> {
        if self.params.is_none() {
            return Err(Error::Uninitialized("audio driver"));
        }
        if self.stream.is_none() {
            self.start_stream()?;
        }

        loop {
            let request = self.state.wait_for_stop();
            tracing::info!(?request, "stop requested");

            // Exclusive lock: callbacks skip while the stream is torn
            // down and rebuilt.
            let state = Arc::clone(&self.state);
            let guard = state.write_render();
            drop(self.stream.take());

            match request {
                StopRequest::FullStop => {
                    drop(guard);
                    tracing::info!("driver stopped");
                    return Ok(());
                }
                StopRequest::Reset | StopRequest::SampleRateReset => {
                    drop(guard);
                    let params = self.backend.negotiate(&self.config)?;
                    self.adopt(&params, request == StopRequest::SampleRateReset);
                    self.params = Some(params);
                    self.start_stream()?;
                    tracing::info!("driver restarted");
                }
            }
        }
    }
}
