//! Instrument hosting
//!
//! Playback talks to a synthesizer through the [`Instrument`] trait. The
//! CLAP adapter in [`clap_host`] is the native implementation; the FFI
//! surface it needs lives in [`clap_sys`].

pub mod clap_host;
pub mod clap_sys;

use crate::error::HostError;

pub use clap_host::{ClapInstrument, BLOCK_FRAMES, RESET_SETTLE};

/// A synthesizer that turns channel messages into stereo audio
pub trait Instrument {
    /// Display name of the instrument
    fn name(&self) -> &str;

    /// Perform the startup handshake at `sample_rate`
    fn start(&mut self, sample_rate: u32) -> Result<(), HostError>;

    /// Stop processing. Safe to call when not started.
    fn stop(&mut self);

    /// Send a module reset message and wait for it to settle. Any audio
    /// still in the instrument's buffers is discarded.
    fn reset_instrument(&mut self, sysex: &[u8]) -> Result<(), HostError>;

    /// Deliver packed channel `messages`, then render into `output`
    /// (interleaved stereo, one frame per two samples). With an empty
    /// `output` the messages are only queued for the next render.
    fn render_block(&mut self, messages: &[u32], output: &mut [f32]) -> Result<(), HostError>;

    /// Open the instrument's own editor window
    fn show_editor(&mut self) -> Result<(), HostError> {
        Err(HostError::NoEditor)
    }
}
