//! Sound-module reset sequences and reset-type detection
//!
//! A sequence written for a GS or XG module usually opens with that module's
//! reset system-exclusive message. Recognizing it lets playback send the same
//! reset to the instrument at start and after every seek.

use std::fmt;

const DATA_GM1: &[u8] = &[0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7];
const DATA_GM2: &[u8] = &[0xF0, 0x7E, 0x7F, 0x09, 0x03, 0xF7];

const DATA_XG: &[u8] = &[0xF0, 0x43, 0x10, 0x4C, 0x00, 0x00, 0x7E, 0x00, 0xF7];
const DATA_MU0: &[u8] = &[0xF0, 0x43, 0x10, 0x49, 0x00, 0x00, 0x12, 0x00, 0xF7];
const DATA_MU1: &[u8] = &[0xF0, 0x43, 0x10, 0x49, 0x00, 0x00, 0x12, 0x01, 0xF7];

const DATA_GS: &[u8] = &[0xF0, 0x41, 0x10, 0x42, 0x12, 0x40, 0x00, 0x7F, 0x00, 0x41, 0xF7];
const DATA_88S: &[u8] = &[0xF0, 0x41, 0x10, 0x42, 0x12, 0x00, 0x00, 0x7F, 0x00, 0x01, 0xF7];
const DATA_88D: &[u8] = &[0xF0, 0x41, 0x10, 0x42, 0x12, 0x00, 0x00, 0x7F, 0x01, 0x00, 0xF7];

/// Known reset messages, checked in order. MU-series and SC-88 variants map
/// onto their family.
const RESET_TABLE: [(&[u8], ResetType); 8] = [
    (DATA_GM1, ResetType::Gm1),
    (DATA_GM2, ResetType::Gm2),
    (DATA_XG, ResetType::Xg),
    (DATA_MU0, ResetType::Xg),
    (DATA_MU1, ResetType::Xg),
    (DATA_GS, ResetType::Gs),
    (DATA_88S, ResetType::Gs),
    (DATA_88D, ResetType::Gs),
];

/// Target sound-module family of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResetType {
    #[default]
    Gm1,
    Gm2,
    Xg,
    Gs,
}

impl ResetType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gm1 => "GM1",
            Self::Gm2 => "GM2",
            Self::Xg => "XG",
            Self::Gs => "GS",
        }
    }

    /// Complete reset message including the leading `F0` and trailing `F7`
    pub fn sysex(&self) -> &'static [u8] {
        match self {
            Self::Gm1 => DATA_GM1,
            Self::Gm2 => DATA_GM2,
            Self::Xg => DATA_XG,
            Self::Gs => DATA_GS,
        }
    }
}

impl fmt::Display for ResetType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a system-exclusive payload.
///
/// `payload` is the event body after the `F0`/`F7` status and its length
/// prefix, so it normally ends with `F7`. Only an exact match of both length
/// and bytes counts.
pub fn match_reset(payload: &[u8]) -> Option<ResetType> {
    RESET_TABLE
        .iter()
        .find(|(data, _)| &data[1..] == payload)
        .map(|(_, reset_type)| *reset_type)
}

/// Tracks the first recognized reset message of one load
#[derive(Debug, Default)]
pub struct ResetDetector {
    detected: Option<ResetType>,
}

impl ResetDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect one system-exclusive payload. Once a reset type is found,
    /// later payloads cannot change it.
    pub fn observe(&mut self, payload: &[u8]) {
        if self.detected.is_some() {
            return;
        }
        if let Some(reset_type) = match_reset(payload) {
            log::debug!("Detected {} reset message", reset_type);
            self.detected = Some(reset_type);
        }
    }

    pub fn detected(&self) -> Option<ResetType> {
        self.detected
    }

    /// Detected type, or GM1 if nothing matched
    pub fn reset_type(&self) -> ResetType {
        self.detected.unwrap_or_default()
    }
}
