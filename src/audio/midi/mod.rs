//! Standard MIDI File ingestion and scheduling
//!
//! Provides the SMF parser, tempo-based time conversion, reset-type
//! detection and the playback cursor that feeds an instrument.

pub mod cursor;
mod events;
mod file;
mod player;
mod reset;
mod tempo;

#[cfg(test)]
pub(crate) mod test_util;

pub use events::{
    is_bank_select, message_len, pack, unpack, MidiEvent, MidiMessage, END_OF_TRACK,
};
pub use file::{LoadOption, Sequence, SmfFormat, METATEXT_MAXLEN, MIN_FILE_SIZE};
pub use player::{PlaybackCursor, Step};
pub use reset::{match_reset, ResetDetector, ResetType};
pub use tempo::{mul_div, TempoMap, Timing, DEFAULT_BPM};
