//! Audio side of the player
//!
//! - MIDI file parsing and scheduling
//! - CLAP instrument hosting
//! - Integer PCM conversion and WAV output
//! - Live output through cpal

pub mod device;
pub mod midi;
pub mod output;
pub mod pcm;
pub mod plugin;
pub mod wav;
