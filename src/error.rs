//! Error types for loading, hosting and playback

use thiserror::Error;

/// Failure to turn a byte stream into a playable sequence.
///
/// A load either succeeds completely or yields one of these; no partial
/// sequence is ever exposed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read MIDI file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is {size} bytes, at least {minimum} required")]
    TooSmall { size: usize, minimum: usize },

    #[error("expected chunk tag {expected:?}, found {found:?}")]
    BadChunkTag { expected: String, found: String },

    #[error("header chunk declares {0} bytes, at least 6 required")]
    HeaderTooShort(u32),

    #[error("unsupported SMF format {0}")]
    UnsupportedFormat(u16),

    #[error("time base must be at least 1 tick per quarter note")]
    ZeroTimeBase,

    #[error("invalid timecode division {0:#06x}")]
    BadTimecode(u16),

    #[error("end-of-track event at byte {0} is not encoded as FF 2F 00")]
    MalformedEndOfTrack(usize),

    #[error("sequence contains no MIDI messages")]
    Empty,
}

/// Failure to load or drive the native instrument module.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to load instrument library: {0}")]
    Library(#[from] libloading::Error),

    #[error("instrument exports no {0} symbol")]
    MissingSymbol(&'static str),

    #[error("instrument handshake failed: {0}")]
    Handshake(String),

    #[error("instrument is not started")]
    NotStarted,

    #[error("instrument process call failed")]
    ProcessFailed,

    #[error("instrument has no editor")]
    NoEditor,
}

/// Failure of a host-facing playback operation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a playback session is already open on this instrument")]
    Busy,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Failure to open or drive the live audio output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no output device named {0:?}")]
    DeviceNotFound(String),

    #[error("no default output device")]
    NoDefaultDevice,

    #[error("failed to query output device: {0}")]
    Device(String),

    #[error("failed to run output stream: {0}")]
    Stream(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}
