//! Driver lifecycle integration tests over a deterministic mock backend.
#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use onda_io::{
    AudioBackend, AudioDriver, DriverConfig, Error, PeriodCallback, Result, SampleBufferRef,
    SampleFormat, StopRequest, StreamHandle, StreamParams,
};
use onda_signal::{Oscillator, wave};

/// Backend that hands the period callback to the test instead of to
/// hardware, and counts stream builds.
struct MockBackend {
    builds: Arc<AtomicUsize>,
    callback_slot: Arc<Mutex<Option<PeriodCallback>>>,
}

impl MockBackend {
    fn new() -> (Self, Arc<AtomicUsize>, Arc<Mutex<Option<PeriodCallback>>>) {
        let builds = Arc::new(AtomicUsize::new(0));
        let callback_slot = Arc::new(Mutex::new(None));
        let backend = Self {
            builds: Arc::clone(&builds),
            callback_slot: Arc::clone(&callback_slot),
        };
        (backend, builds, callback_slot)
    }
}

impl AudioBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn negotiate(&self, config: &DriverConfig) -> Result<StreamParams> {
        Ok(StreamParams {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_frames: config.buffer_frames,
            format: SampleFormat::INT16_NATIVE,
            device_name: Some("mock".to_string()),
        })
    }

    fn build_output_stream(
        &self,
        _params: &StreamParams,
        callback: PeriodCallback,
        _error_callback: onda_io::ErrorCallback,
    ) -> Result<StreamHandle> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        *self.callback_slot.lock().unwrap() = Some(callback);
        Ok(StreamHandle::new(()))
    }
}

fn mono_config(sample_rate: u32) -> DriverConfig {
    DriverConfig {
        channels: 1,
        sample_rate,
        buffer_frames: 128,
        ..DriverConfig::default()
    }
}

#[test]
fn test_run_before_initialize_fails() {
    let (backend, _, _) = MockBackend::new();
    let mut driver = AudioDriver::new(Box::new(backend), DriverConfig::default());
    assert!(matches!(driver.run(), Err(Error::Uninitialized(_))));
}

#[test]
fn test_sawtooth_reaches_hardware_buffer() {
    const SAMPLE_RATE: u32 = 44100;
    const FREQUENCY: f32 = 500.0;
    const AMPLITUDE: f32 = 0.05;

    let (backend, _, _) = MockBackend::new();
    let mut driver = AudioDriver::new(Box::new(backend), mono_config(SAMPLE_RATE));
    driver.initialize().unwrap();

    driver.edit(|arena, output| {
        let mut osc = Oscillator::new(arena);
        osc.set_frequency(arena, FREQUENCY);
        osc.set_amplitude(arena, AMPLITUDE);
        osc.set_waveform(arena, wave::sawtooth);
        *output = Some(osc.output());
    });

    // Render four hardware periods through the real render path.
    let state = driver.state();
    let format = driver.params().unwrap().format;
    let mut samples = Vec::new();
    for _ in 0..4 {
        let mut bytes = [0u8; 256];
        state.render_period(&mut bytes, 128);
        let view = SampleBufferRef::planar(&bytes, format);
        samples.extend(view.samples().map(|s| s.unwrap()));
    }
    assert_eq!(samples.len(), 512);
    assert_eq!(state.periods_rendered(), 4);
    assert_eq!(state.sample_position(), 512);

    // Amplitude bound, with one quantization step of slack.
    for &s in &samples {
        assert!(s.abs() <= AMPLITUDE + 1e-3, "sample {s} out of range");
    }

    // The sawtooth wraps once per 44100/500 = 88.2 samples; wraps show
    // up as large negative jumps.
    let wraps: Vec<usize> = samples
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1] - w[0] < -AMPLITUDE)
        .map(|(i, _)| i)
        .collect();
    assert!(
        (4..=6).contains(&wraps.len()),
        "expected ~5 wraps in 512 samples, found {}",
        wraps.len()
    );
    for pair in wraps.windows(2) {
        let spacing = pair[1] - pair[0];
        assert!(
            (87..=90).contains(&spacing),
            "wrap spacing {spacing}, expected ~88"
        );
    }
}

#[test]
fn test_callback_renders_through_backend_plumbing() {
    let (backend, _, callback_slot) = MockBackend::new();
    let mut driver = AudioDriver::new(Box::new(backend), mono_config(48000));
    driver.initialize().unwrap();

    driver.edit(|arena, output| {
        let mut osc = Oscillator::new(arena);
        osc.set_amplitude(arena, 0.5);
        *output = Some(osc.output());
    });

    // run() blocks, so drive it from a worker and stop it from here.
    let state = driver.state();
    let worker = std::thread::spawn(move || {
        let result = driver.run();
        (driver, result)
    });

    // The stream is built asynchronously; wait for the callback to land.
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if callback_slot.lock().unwrap().is_some() {
            break;
        }
        assert!(Instant::now() < deadline, "stream never built");
        std::thread::sleep(Duration::from_millis(5));
    }

    {
        let mut slot = callback_slot.lock().unwrap();
        let callback = slot.as_mut().unwrap();
        let mut bytes = [0u8; 64];
        callback(&mut bytes, 32);
        assert!(
            bytes.iter().any(|&b| b != 0),
            "period callback produced pure silence"
        );
    }
    assert_eq!(state.periods_rendered(), 1);

    state.request_stop(StopRequest::FullStop);
    let (_, result) = worker.join().unwrap();
    result.unwrap();
}

#[test]
fn test_reset_rebuilds_stream_and_rewinds_position() {
    let (backend, builds, _) = MockBackend::new();
    let mut driver = AudioDriver::new(Box::new(backend), mono_config(48000));
    driver.initialize().unwrap();

    let state = driver.state();
    let mut bytes = [0u8; 256];
    state.render_period(&mut bytes, 128);
    assert_eq!(state.sample_position(), 128);

    let worker = std::thread::spawn(move || {
        let result = driver.run();
        (driver, result)
    });

    // First build comes from run() starting the stream.
    let deadline = Instant::now() + Duration::from_secs(2);
    while builds.load(Ordering::SeqCst) < 1 {
        assert!(Instant::now() < deadline, "initial stream never built");
        std::thread::sleep(Duration::from_millis(5));
    }

    state.request_stop(StopRequest::Reset);
    while builds.load(Ordering::SeqCst) < 2 {
        assert!(Instant::now() < deadline, "reset never rebuilt the stream");
        std::thread::sleep(Duration::from_millis(5));
    }

    state.request_stop(StopRequest::FullStop);
    let (driver, result) = worker.join().unwrap();
    result.unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 2);
    // Reset rewound the stream position.
    assert_eq!(driver.state().sample_position(), 0);
}

#[test]
fn test_full_stop_exits_promptly() {
    let (backend, builds, _) = MockBackend::new();
    let mut driver = AudioDriver::new(Box::new(backend), mono_config(48000));
    driver.initialize().unwrap();

    let state = driver.state();
    let worker = std::thread::spawn(move || driver.run());

    let deadline = Instant::now() + Duration::from_secs(2);
    while builds.load(Ordering::SeqCst) < 1 {
        assert!(Instant::now() < deadline, "stream never built");
        std::thread::sleep(Duration::from_millis(5));
    }

    state.request_stop(StopRequest::FullStop);
    worker.join().unwrap().unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}
