//! Play a low-pass-filtered 500 Hz sawtooth on the default output device.
//!
//! Run with: cargo run -p onda-io --example saw_tone
#![allow(missing_docs)]

use std::time::Duration;

use onda_io::{AudioDriver, CpalBackend, DriverConfig, StopRequest};
use onda_signal::{Filter, Oscillator, wave};

const PLAY_FOR: Duration = Duration::from_secs(4);

fn main() -> onda_io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut driver = AudioDriver::new(Box::new(CpalBackend::new()), DriverConfig::default());
    driver.initialize()?;

    driver.edit(|arena, output| {
        let mut osc = Oscillator::new(arena);
        osc.set_frequency(arena, 500.0);
        osc.set_amplitude(arena, 0.05);
        osc.set_waveform(arena, wave::sawtooth);

        let mut filter = Filter::new(arena);
        filter.set_cutoff(arena, 2000.0);
        if let Err(err) = filter.cache(arena) {
            tracing::warn!(%err, "filter cache rejected, evaluating uncached");
        }

        *output = Some(arena.convolve(filter.impulse_response(), osc.output()));
    });

    let state = driver.state();
    std::thread::spawn(move || {
        std::thread::sleep(PLAY_FOR);
        state.request_stop(StopRequest::FullStop);
    });

    println!("Playing a filtered sawtooth for {PLAY_FOR:?}...");
    driver.run()?;

    let state = driver.state();
    println!(
        "Done: {} periods rendered, {} skipped.",
        state.periods_rendered(),
        state.periods_skipped()
    );
    Ok(())
}
