//! MIDI message types shared by the parser, scheduler and instrument host
//!
//! Channel messages travel through the pipeline packed into a single `u32`
//! (status in the low byte, then data 1, then data 2), which is the layout
//! the instrument host unpacks into plugin events.

/// Packed channel message value marking the end of a track
pub const END_OF_TRACK: u32 = u32::MAX;

/// A channel message scheduled at an absolute time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiMessage {
    /// Absolute time in milliseconds
    pub time: u32,
    /// Packed status and data bytes, or [`END_OF_TRACK`]
    pub data: u32,
}

impl MidiMessage {
    #[inline]
    pub fn new(time: u32, data: u32) -> Self {
        Self { time, data }
    }

    /// End-of-track marker at `time`
    #[inline]
    pub fn end_of_track(time: u32) -> Self {
        Self {
            time,
            data: END_OF_TRACK,
        }
    }

    #[inline]
    pub fn is_end_of_track(&self) -> bool {
        self.data == END_OF_TRACK
    }
}

/// Pack a status byte and up to two data bytes
#[inline]
pub fn pack(status: u8, data1: u8, data2: u8) -> u32 {
    status as u32 | (data1 as u32) << 8 | (data2 as u32) << 16
}

/// Unpack into `[status, data1, data2]`
#[inline]
pub fn unpack(data: u32) -> [u8; 3] {
    [data as u8, (data >> 8) as u8, (data >> 16) as u8]
}

/// Number of meaningful bytes in a packed channel message
#[inline]
pub fn message_len(data: u32) -> usize {
    match data & 0xF0 {
        0xC0 | 0xD0 => 2,
        _ => 3,
    }
}

/// Control change on controller 0x00 or 0x20 (bank select MSB/LSB)
#[inline]
pub fn is_bank_select(data: u32) -> bool {
    let controller = (data >> 8) & 0xFF;
    data & 0xF0 == 0xB0 && (controller == 0x00 || controller == 0x20)
}

/// Decoded view of a packed channel message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOff {
        note: u8,
        velocity: u8,
        channel: u8,
    },
    /// Note on; a velocity of zero is a note off by convention
    NoteOn {
        note: u8,
        velocity: u8,
        channel: u8,
    },
    PolyPressure {
        note: u8,
        pressure: u8,
        channel: u8,
    },
    ControlChange {
        controller: u8,
        value: u8,
        channel: u8,
    },
    ProgramChange {
        program: u8,
        channel: u8,
    },
    ChannelPressure {
        pressure: u8,
        channel: u8,
    },
    /// 14-bit pitch bend value (0-16383, center at 8192)
    PitchBend {
        value: u16,
        channel: u8,
    },
}

impl MidiEvent {
    /// Decode a packed channel message. Returns `None` for the end-of-track
    /// marker and for anything that is not a channel voice/mode message.
    pub fn from_packed(data: u32) -> Option<Self> {
        if data == END_OF_TRACK {
            return None;
        }
        let [status, d1, d2] = unpack(data);
        let channel = status & 0x0F;
        let event = match status & 0xF0 {
            0x80 => Self::NoteOff {
                note: d1,
                velocity: d2,
                channel,
            },
            0x90 => Self::NoteOn {
                note: d1,
                velocity: d2,
                channel,
            },
            0xA0 => Self::PolyPressure {
                note: d1,
                pressure: d2,
                channel,
            },
            0xB0 => Self::ControlChange {
                controller: d1,
                value: d2,
                channel,
            },
            0xC0 => Self::ProgramChange {
                program: d1,
                channel,
            },
            0xD0 => Self::ChannelPressure {
                pressure: d1,
                channel,
            },
            0xE0 => Self::PitchBend {
                value: (d1 as u16 & 0x7F) | (d2 as u16 & 0x7F) << 7,
                channel,
            },
            _ => return None,
        };
        Some(event)
    }

    /// True for note on with non-zero velocity
    #[inline]
    pub fn is_note_start(&self) -> bool {
        matches!(self, Self::NoteOn { velocity, .. } if *velocity > 0)
    }

    /// True for note off, or note on with zero velocity
    #[inline]
    pub fn is_note_end(&self) -> bool {
        matches!(self, Self::NoteOff { .. } | Self::NoteOn { velocity: 0, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        let data = pack(0x91, 0x40, 0x7F);
        assert_eq!(data, 0x007F_4091);
        assert_eq!(unpack(data), [0x91, 0x40, 0x7F]);
    }

    #[test]
    fn test_message_len() {
        assert_eq!(message_len(pack(0xC0, 5, 0)), 2);
        assert_eq!(message_len(pack(0xD3, 5, 0)), 2);
        assert_eq!(message_len(pack(0x90, 60, 100)), 3);
        assert_eq!(message_len(pack(0xE0, 0, 0x40)), 3);
    }

    #[test]
    fn test_bank_select_detection() {
        assert!(is_bank_select(pack(0xB0, 0x00, 0x01)));
        assert!(is_bank_select(pack(0xBF, 0x20, 0x00)));
        assert!(!is_bank_select(pack(0xB0, 0x07, 0x64)));
        // Note on key 0 is not a control change
        assert!(!is_bank_select(pack(0x90, 0x00, 0x40)));
    }

    #[test]
    fn test_decode_events() {
        match MidiEvent::from_packed(pack(0x92, 60, 100)) {
            Some(MidiEvent::NoteOn { note, velocity, channel }) => {
                assert_eq!(note, 60);
                assert_eq!(velocity, 100);
                assert_eq!(channel, 2);
            }
            other => panic!("Expected NoteOn, got {:?}", other),
        }

        assert_eq!(
            MidiEvent::from_packed(pack(0xE0, 0x00, 0x40)),
            Some(MidiEvent::PitchBend { value: 8192, channel: 0 })
        );
        assert_eq!(MidiEvent::from_packed(END_OF_TRACK), None);
        assert_eq!(MidiEvent::from_packed(pack(0xF8, 0, 0)), None);
    }

    #[test]
    fn test_zero_velocity_note_on_ends_note() {
        let event = MidiEvent::from_packed(pack(0x90, 60, 0)).unwrap();
        assert!(event.is_note_end());
        assert!(!event.is_note_start());
    }

    #[test]
    fn test_end_of_track_marker() {
        let msg = MidiMessage::end_of_track(1234);
        assert!(msg.is_end_of_track());
        assert!(!MidiMessage::new(0, pack(0x90, 60, 100)).is_end_of_track());
    }
}
