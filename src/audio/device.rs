//! Output device lookup for live playback

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};

use crate::error::OutputError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// Stream settings asked of the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames per callback
    pub buffer_size: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 512,
        }
    }
}

fn device_error(e: impl std::fmt::Display) -> OutputError {
    OutputError::Device(e.to_string())
}

/// Every output device of the default host, marking the default one
pub fn list_output_devices() -> Result<Vec<AudioDeviceInfo>, OutputError> {
    let host = cpal::default_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let devices = host.output_devices().map_err(device_error)?;
    Ok(devices
        .filter_map(|device| device.name().ok())
        .map(|name| AudioDeviceInfo {
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
        })
        .collect())
}

/// Output device called `name`, or the default device
pub fn get_output_device(name: Option<&str>) -> Result<cpal::Device, OutputError> {
    let host = cpal::default_host();
    let Some(wanted) = name else {
        return host.default_output_device().ok_or(OutputError::NoDefaultDevice);
    };

    host.output_devices()
        .map_err(device_error)?
        .find(|device| device.name().map(|n| n == wanted).unwrap_or(false))
        .ok_or_else(|| OutputError::DeviceNotFound(wanted.to_string()))
}

/// Stream config at the preferred rate if any supported range covers it,
/// otherwise the device default (at most stereo)
pub fn get_supported_config(
    device: &cpal::Device,
    preferred: &AudioConfig,
) -> Result<cpal::StreamConfig, OutputError> {
    let supports_preferred = device
        .supported_output_configs()
        .map_err(device_error)?
        .any(|range| {
            (range.min_sample_rate().0..=range.max_sample_rate().0).contains(&preferred.sample_rate)
                && range.channels() >= preferred.channels
        });
    if supports_preferred {
        return Ok(cpal::StreamConfig {
            channels: preferred.channels,
            sample_rate: cpal::SampleRate(preferred.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(preferred.buffer_size),
        });
    }

    let fallback = device.default_output_config().map_err(device_error)?;
    log::warn!(
        "Output device does not support {}Hz, using {}Hz",
        preferred.sample_rate,
        fallback.sample_rate().0
    );
    Ok(cpal::StreamConfig {
        channels: fallback.channels().min(2),
        sample_rate: fallback.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_cd_stereo() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, 2);
    }

    #[test]
    fn test_device_error_message() {
        let err = device_error("backend gone");
        assert_eq!(err.to_string(), "failed to query output device: backend gone");
    }
}
