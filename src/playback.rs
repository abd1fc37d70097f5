//! Host-facing playback boundary
//!
//! A [`MidiPlugin`] owns one instrument. At most one [`PlaybackSession`]
//! exists against it at a time: `open` hands out the session and fails with
//! [`SessionError::Busy`] while another one is alive. Dropping or closing the
//! session stops the instrument and frees the slot.
//!
//! Every render is split into a fixed number of sub-blocks. Messages that
//! come due are delivered to the instrument before each sub-block is
//! rendered, which bounds MIDI-to-audio latency to one sub-block.

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::audio::midi::{LoadOption, PlaybackCursor, Sequence, Step};
use crate::audio::pcm::{self, BitDepth};
use crate::audio::plugin::Instrument;
use crate::error::{HostError, LoadError, SessionError};

/// File patterns the player accepts
pub const SUPPORTED_TYPES: &str = "*.mid;*.midi";

/// Sessions always produce stereo
pub const CHANNELS: u16 = 2;

/// Descriptor shown to the host for an instrument module file
pub fn plugin_description(module_name: &str) -> String {
    format!("CLAP[{}] MIDI plugin v1.00", module_name)
}

/// Output settings shared by every session of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub sample_rate: u32,
    pub sample_bits: u16,
    /// Length of audio the host asks for per render call
    pub block_time_ms: u32,
    /// Sub-blocks per render call
    pub divide_num: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            sample_bits: 16,
            block_time_ms: 50,
            divide_num: 5,
        }
    }
}

/// What `parse` reports about a file without starting synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub duration_ms: u32,
    pub seekable: bool,
    pub title: String,
    pub copyright: String,
    /// Format, reset type, time base and track count
    pub extra_info: String,
}

impl Metadata {
    pub fn from_sequence(sequence: &Sequence) -> Self {
        Self {
            duration_ms: sequence.duration(),
            seekable: true,
            title: sequence.title(),
            copyright: sequence.copyright(),
            extra_info: format!(
                "SMF{}, {}, TimeBase:{}, Tracks:{}",
                sequence.format().number(),
                sequence.reset_type(),
                sequence.time_base(),
                sequence.track_count()
            ),
        }
    }
}

/// PCM layout a session renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub sample_rate: u32,
    pub bits: u16,
    pub channels: u16,
    /// Bytes per render call at the configured block time
    pub unit_length: usize,
}

impl OutputFormat {
    pub fn new(settings: &PlaybackSettings) -> Self {
        let bytes_per_second = settings.sample_rate as u64
            * (settings.sample_bits / 8) as u64
            * CHANNELS as u64;
        Self {
            sample_rate: settings.sample_rate,
            bits: settings.sample_bits,
            channels: CHANNELS,
            unit_length: (bytes_per_second * settings.block_time_ms as u64 / 1000) as usize,
        }
    }

    pub fn frame_bytes(&self) -> usize {
        (self.bits / 8) as usize * self.channels as usize
    }
}

/// Read and parse a file for display. Bank select messages are kept.
pub fn parse(path: &Path) -> Result<Metadata, LoadError> {
    let sequence = Sequence::load_file(path, &LoadOption::inspect())?;
    Ok(Metadata::from_sequence(&sequence))
}

/// Clears the playing flag when the owning session goes away
struct PlayingToken {
    flag: Arc<AtomicBool>,
}

impl PlayingToken {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for PlayingToken {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// An instrument exposed as a MIDI file player
pub struct MidiPlugin<I: Instrument> {
    instrument: Arc<Mutex<I>>,
    is_playing: Arc<AtomicBool>,
    settings: PlaybackSettings,
    description: String,
}

impl<I: Instrument> MidiPlugin<I> {
    pub fn new(instrument: I, description: String, settings: PlaybackSettings) -> Self {
        Self {
            instrument: Arc::new(Mutex::new(instrument)),
            is_playing: Arc::new(AtomicBool::new(false)),
            settings,
            description,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::Acquire)
    }

    /// Direct access to the instrument. Blocks while a session call is running.
    pub fn instrument(&self) -> MutexGuard<'_, I> {
        self.instrument.lock()
    }

    pub fn parse(&self, path: &Path) -> Result<Metadata, LoadError> {
        parse(path)
    }

    /// Load `path` for playback and start the instrument
    pub fn open(&self, path: &Path) -> Result<PlaybackSession<I>, SessionError> {
        if self.is_playing() {
            return Err(SessionError::Busy);
        }
        let sequence = Sequence::load_file(path, &LoadOption::playback())?;
        log::info!("Opened {} ({} messages)", path.display(), sequence.len());
        self.open_sequence(sequence)
    }

    /// Start a session over an already loaded sequence
    pub fn open_sequence(&self, sequence: Sequence) -> Result<PlaybackSession<I>, SessionError> {
        let token = PlayingToken::acquire(&self.is_playing).ok_or(SessionError::Busy)?;

        {
            let mut instrument = self.instrument.lock();
            let started = instrument
                .start(self.settings.sample_rate)
                .and_then(|_| instrument.reset_instrument(sequence.reset_message()));
            if let Err(e) = started {
                instrument.stop();
                return Err(e.into());
            }
        }

        log::info!(
            "Playback session started: {} ms, {} reset",
            sequence.duration(),
            sequence.reset_type()
        );

        Ok(PlaybackSession {
            instrument: Arc::clone(&self.instrument),
            cursor: PlaybackCursor::for_sequence(&sequence),
            sequence,
            settings: self.settings,
            base_time_ms: 0,
            frames_since_base: 0,
            batch: Vec::with_capacity(256),
            scratch: Vec::new(),
            closed: false,
            _token: token,
        })
    }

    pub fn show_editor(&self) -> Result<(), HostError> {
        self.instrument.lock().show_editor()
    }
}

/// One playing file. Render, seek and close are called serially by the host.
pub struct PlaybackSession<I: Instrument> {
    instrument: Arc<Mutex<I>>,
    sequence: Sequence,
    cursor: PlaybackCursor,
    settings: PlaybackSettings,
    /// Time of the last seek
    base_time_ms: u32,
    /// Frames rendered since the last seek
    frames_since_base: u64,
    batch: Vec<u32>,
    scratch: Vec<f32>,
    closed: bool,
    _token: PlayingToken,
}

impl<I: Instrument> PlaybackSession<I> {
    pub fn format(&self) -> OutputFormat {
        OutputFormat::new(&self.settings)
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::from_sequence(&self.sequence)
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Playback position in milliseconds
    pub fn position(&self) -> u32 {
        let elapsed = self.frames_since_base * 1000 / self.settings.sample_rate.max(1) as u64;
        self.base_time_ms.saturating_add(elapsed.min(u32::MAX as u64) as u32)
    }

    /// Fill `out` with PCM and return the number of bytes written.
    ///
    /// Less than `out.len()` is written only once the sequence has finished.
    /// Bytes past the last whole frame are zeroed and counted. An unsupported
    /// bit depth writes nothing.
    pub fn render(&mut self, out: &mut [u8]) -> Result<usize, HostError> {
        let Some(depth) = BitDepth::from_bits(self.settings.sample_bits) else {
            return Ok(0);
        };
        let frame_bytes = depth.bytes_per_sample() * CHANNELS as usize;
        let total_frames = out.len() / frame_bytes;
        let divide = self.settings.divide_num.max(1) as usize;
        let sub_frames = total_frames / divide;

        let mut instrument = self.instrument.lock();
        let mut written = 0;
        let mut finished = false;
        for i in 0..divide {
            // The last sub-block absorbs the remainder
            let frames = if i + 1 == divide {
                total_frames - sub_frames * (divide - 1)
            } else {
                sub_frames
            };
            if frames == 0 {
                continue;
            }

            self.batch.clear();
            let now = self.position();
            if self.cursor.advance_to(&self.sequence, now, &mut self.batch) == Step::Finished {
                log::debug!("Playback finished at {} ms", now);
                finished = true;
                break;
            }

            self.scratch.clear();
            self.scratch.resize(frames * CHANNELS as usize, 0.0);
            if let Err(e) = instrument.render_block(&self.batch, &mut self.scratch) {
                log::error!("Render failed at {} ms: {}", now, e);
                return Err(e);
            }

            let end = written + frames * frame_bytes;
            written += pcm::write_samples(&self.scratch, depth, &mut out[written..end]);
            self.frames_since_base += frames as u64;
        }

        if !finished {
            out[written..].fill(0);
            written = out.len();
        }
        Ok(written)
    }

    /// Jump to `time_ms` and return it.
    ///
    /// The instrument is reset first. Everything due up to the new position
    /// is then queued so controllers and programs are current.
    pub fn seek(&mut self, time_ms: u32) -> Result<u32, HostError> {
        let mut instrument = self.instrument.lock();
        instrument.reset_instrument(self.sequence.reset_message())?;

        let position = self.position();
        let rewound = self.cursor.seek_from(position, time_ms);
        self.base_time_ms = time_ms;
        self.frames_since_base = 0;

        self.batch.clear();
        self.cursor.advance(&self.sequence, &mut self.batch);
        instrument.render_block(&self.batch, &mut [])?;

        log::info!(
            "Seek to {} ms ({}, {} messages queued)",
            time_ms,
            if rewound { "rewound" } else { "forward" },
            self.batch.len()
        );
        Ok(time_ms)
    }

    /// Stop the instrument and end the session
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.instrument.lock().stop();
        log::info!("Playback session closed");
    }
}

impl<I: Instrument> Drop for PlaybackSession<I> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
