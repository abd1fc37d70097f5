//! Live audio output using cpal
//!
//! Rendered PCM is pushed into a lock-free ring buffer; the cpal output
//! callback pops stereo frames from it and plays silence on underrun.

use cpal::traits::{DeviceTrait, StreamTrait};
use ringbuf::{traits::*, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::device::{get_output_device, get_supported_config, AudioConfig};
use super::pcm::{read_samples, BitDepth};
use crate::error::OutputError;

/// Shared state between the output callback and the render side
struct OutputSharedState {
    /// Frames played as silence because the buffer ran dry
    underruns: AtomicU64,
}

/// Open output stream fed from a ring buffer
pub struct LiveOutput {
    _stream: cpal::Stream,
    producer: ringbuf::HeapProd<f32>,
    shared: Arc<OutputSharedState>,
    scratch: Vec<f32>,
    device_name: String,
    sample_rate: u32,
}

impl LiveOutput {
    /// Open `device_name` (or the default device) and start playing.
    ///
    /// The device may not support `sample_rate`; check [`Self::sample_rate`]
    /// for the rate actually in use.
    pub fn open(
        device_name: Option<&str>,
        sample_rate: u32,
        buffer_ms: u32,
    ) -> Result<Self, OutputError> {
        let device = get_output_device(device_name)?;
        let device_name_str = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Opening output device: {}", device_name_str);

        let preferred = AudioConfig {
            sample_rate,
            ..AudioConfig::default()
        };
        let stream_config = get_supported_config(&device, &preferred)?;
        let actual_sample_rate = stream_config.sample_rate.0;
        let channels = stream_config.channels as usize;

        log::info!(
            "Output stream config: {} Hz, {} channels",
            actual_sample_rate,
            channels
        );

        // Interleaved stereo, so two slots per frame
        let capacity_frames = (actual_sample_rate as usize * buffer_ms as usize / 1000).max(1024);
        let rb = HeapRb::<f32>::new(capacity_frames * 2);
        let (producer, mut consumer) = rb.split();

        let shared = Arc::new(OutputSharedState {
            underruns: AtomicU64::new(0),
        });
        let shared_clone = Arc::clone(&shared);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut missing = 0u64;
                    for frame in data.chunks_mut(channels) {
                        let (left, right) = match (consumer.try_pop(), consumer.try_pop()) {
                            (Some(left), Some(right)) => (left, right),
                            _ => {
                                missing += 1;
                                (0.0, 0.0)
                            }
                        };
                        if channels == 1 {
                            frame[0] = (left + right) * 0.5;
                        } else {
                            frame[0] = left;
                            frame[1] = right;
                            for extra in frame.iter_mut().skip(2) {
                                *extra = 0.0;
                            }
                        }
                    }
                    if missing > 0 {
                        shared_clone.underruns.fetch_add(missing, Ordering::Relaxed);
                    }
                },
                move |err| {
                    log::error!("Output stream error: {}", err);
                },
                None, // No timeout
            )
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        log::info!("Output stream started");

        Ok(Self {
            _stream: stream,
            producer,
            shared,
            scratch: Vec::with_capacity(4096),
            device_name: device_name_str,
            sample_rate: actual_sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Frames that can be pushed without dropping any
    pub fn vacant_frames(&self) -> usize {
        self.producer.vacant_len() / 2
    }

    /// Frames waiting to be played
    pub fn queued_frames(&self) -> usize {
        self.producer.occupied_len() / 2
    }

    pub fn underruns(&self) -> u64 {
        self.shared.underruns.load(Ordering::Relaxed)
    }

    /// Queue interleaved stereo integer PCM. Returns the number of frames
    /// accepted; frames beyond the free space are dropped.
    pub fn push_pcm(&mut self, bytes: &[u8], depth: BitDepth) -> usize {
        self.scratch.clear();
        read_samples(bytes, depth, &mut self.scratch);

        let frames = (self.scratch.len() / 2).min(self.vacant_frames());
        let pushed = self.producer.push_slice(&self.scratch[..frames * 2]);
        pushed / 2
    }
}

impl Drop for LiveOutput {
    fn drop(&mut self) {
        log::info!(
            "Output stream stopped: {} ({} underrun frames)",
            self.device_name,
            self.underruns()
        );
    }
}
