//! Standard MIDI File playback through a hosted CLAP instrument
//!
//! [`playback::MidiPlugin`] is the host-facing entry point: parse a file for
//! its metadata, or open a session that renders integer PCM block by block.

pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod playback;

pub use config::PlayerConfig;
pub use error::{ConfigError, HostError, LoadError, OutputError, SessionError};
pub use playback::{
    parse, plugin_description, Metadata, MidiPlugin, OutputFormat, PlaybackSession,
    PlaybackSettings, SUPPORTED_TYPES,
};
