//! cpal-based audio backend implementation.
//!
//! [`CpalBackend`] is the default [`AudioBackend`], wrapping
//! [cpal](https://crates.io/crates/cpal) for cross-platform output: ALSA
//! (Linux), CoreAudio (macOS/iOS), WASAPI (Windows), Oboe (Android).
//!
//! Streams are built through cpal's raw-byte path so the driver's codec
//! handles the slot format itself instead of asking cpal to convert.
//! cpal buffers are always host-endian, so negotiation yields
//! native-endian formats only.

use crate::backend::{AudioBackend, ErrorCallback, PeriodCallback, StreamHandle, StreamParams};
use crate::driver::DriverConfig;
use crate::format::SampleFormat;
use crate::{Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

pub(crate) fn device_name(
    device: &cpal::Device,
) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// cpal-based audio backend.
///
/// Holds a cpal [`Host`] instance, the connection to the platform's audio
/// system.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        tracing::info!(
            host = cpal::default_host().id().name(),
            "cpal backend initialized"
        );
        Self {
            host: cpal::default_host(),
        }
    }

    /// Find an output device by case-insensitive substring, or the default.
    fn find_output_device(&self, name: Option<&str>) -> Result<cpal::Device> {
        match name {
            Some(search) => {
                let search_lower = search.to_lowercase();
                let devices = self
                    .host
                    .output_devices()
                    .map_err(|e| Error::Driver(e.to_string()))?;

                for device in devices {
                    if let Ok(dev_name) = device_name(&device)
                        && dev_name.to_lowercase().contains(search_lower.as_str())
                    {
                        return Ok(device);
                    }
                }
                Err(Error::Driver(format!(
                    "no output device matching '{search}'"
                )))
            }
            None => self.host.default_output_device().ok_or(Error::NoDevice),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn negotiate(&self, config: &DriverConfig) -> Result<StreamParams> {
        let device = self.find_output_device(config.device_name.as_deref())?;
        let default = device
            .default_output_config()
            .map_err(|e| Error::Driver(e.to_string()))?;
        let format = SampleFormat::from_cpal(default.sample_format())?;

        let params = StreamParams {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_frames: config.buffer_frames,
            format,
            device_name: device_name(&device).ok(),
        };
        tracing::info!(
            device = params.device_name.as_deref().unwrap_or("<unnamed>"),
            format = %params.format,
            sample_rate = params.sample_rate,
            "negotiated output parameters"
        );
        Ok(params)
    }

    fn build_output_stream(
        &self,
        params: &StreamParams,
        mut callback: PeriodCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_output_device(params.device_name.as_deref())?;

        let stream_config = cpal::StreamConfig {
            channels: params.channels,
            sample_rate: params.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(params.buffer_frames),
        };
        let channels = usize::from(params.channels);

        let stream = device
            .build_output_stream_raw(
                &stream_config,
                params.format.to_cpal()?,
                move |data: &mut cpal::Data, _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels.max(1);
                    callback(data.bytes_mut(), frames);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Driver(e.to_string()))?;

        stream.play().map_err(|e| Error::Driver(e.to_string()))?;
        tracing::info!(
            channels = params.channels,
            sample_rate = params.sample_rate,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpal_backend_name() {
        let backend = CpalBackend::new();
        assert_eq!(backend.name(), "cpal");
    }
}
