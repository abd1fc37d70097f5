//! Standard MIDI File loading
//!
//! Parses format 0 and format 1 files into one time-ordered list of packed
//! channel messages with absolute millisecond timestamps. Along the way it
//! collects the tempo map, the first title and copyright text, the target
//! sound-module reset type and the playing time of the longest track.

use std::path::Path;

use super::cursor::ByteCursor;
use super::events::{is_bank_select, pack, MidiMessage};
use super::reset::{ResetDetector, ResetType};
use super::tempo::{TempoMap, Timing};
use crate::error::LoadError;

/// Files read from disk must be at least this large
pub const MIN_FILE_SIZE: usize = 256;

/// Title and copyright text is cut to this many bytes
pub const METATEXT_MAXLEN: usize = 255;

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";

const META_TEXT: u8 = 0x01;
const META_COPYRIGHT: u8 = 0x02;
const META_TRACK_NAME: u8 = 0x03;
const META_END_OF_TRACK: u8 = 0x2F;
const META_TEMPO: u8 = 0x51;

/// Options for one load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOption {
    /// Drop bank select MSB/LSB control changes from the message list
    pub ignore_bank_select: bool,
    /// Look for a GM/GS/XG reset message in system-exclusive events
    pub detect_reset_type: bool,
}

impl LoadOption {
    /// Options used when only inspecting a file
    pub fn inspect() -> Self {
        Self {
            ignore_bank_select: false,
            detect_reset_type: true,
        }
    }

    /// Options used when loading a file for playback
    pub fn playback() -> Self {
        Self {
            ignore_bank_select: true,
            detect_reset_type: true,
        }
    }
}

/// SMF container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmfFormat {
    /// Format 0, one multi-channel track
    SingleTrack,
    /// Format 1, simultaneous tracks
    Parallel,
}

impl SmfFormat {
    pub fn from_u16(raw: u16) -> Result<Self, LoadError> {
        match raw {
            0 => Ok(Self::SingleTrack),
            1 => Ok(Self::Parallel),
            other => Err(LoadError::UnsupportedFormat(other)),
        }
    }

    pub fn number(&self) -> u16 {
        match self {
            Self::SingleTrack => 0,
            Self::Parallel => 1,
        }
    }
}

/// A fully parsed sequence, read-only once loaded
#[derive(Debug, Clone)]
pub struct Sequence {
    messages: Vec<MidiMessage>,
    format: SmfFormat,
    track_count: u16,
    tempo_map: TempoMap,
    duration: u32,
    reset_type: ResetType,
    title: Vec<u8>,
    copyright: Vec<u8>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            format: SmfFormat::SingleTrack,
            track_count: 0,
            tempo_map: TempoMap::new(Timing::Metrical(1)),
            duration: 0,
            reset_type: ResetType::default(),
            title: Vec::new(),
            copyright: Vec::new(),
        }
    }
}

impl Sequence {
    /// Read and parse a file from disk.
    ///
    /// Files shorter than [`MIN_FILE_SIZE`] are rejected before parsing.
    pub fn load_file(path: &Path, option: &LoadOption) -> Result<Self, LoadError> {
        let data = std::fs::read(path)?;
        if data.len() < MIN_FILE_SIZE {
            return Err(LoadError::TooSmall {
                size: data.len(),
                minimum: MIN_FILE_SIZE,
            });
        }
        let sequence = Self::parse(&data, option)?;
        log::info!(
            "Loaded {}: {} messages, {} ms, reset {}",
            path.display(),
            sequence.messages.len(),
            sequence.duration,
            sequence.reset_type
        );
        Ok(sequence)
    }

    /// Parse an in-memory SMF image
    pub fn parse(data: &[u8], option: &LoadOption) -> Result<Self, LoadError> {
        let mut cursor = ByteCursor::new(data);
        let header = parse_header(&mut cursor)?;

        let mut parser = TrackParser::new(*option, header.timing);
        for index in 0..header.track_count {
            if cursor.is_empty() {
                log::warn!(
                    "File ends after {} of {} declared tracks",
                    index,
                    header.track_count
                );
                break;
            }
            parser.parse_track(&mut cursor, index)?;
        }
        parser.finish(header)
    }

    /// Replace this sequence with the result of parsing `data`.
    ///
    /// On failure the sequence is left empty rather than holding stale data.
    pub fn load(&mut self, data: &[u8], option: &LoadOption) -> Result<(), LoadError> {
        match Self::parse(data, option) {
            Ok(sequence) => {
                *self = sequence;
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// All messages in ascending time order, end-of-track markers included
    pub fn messages(&self) -> &[MidiMessage] {
        &self.messages
    }

    pub fn message(&self, index: usize) -> Option<&MidiMessage> {
        self.messages.get(index)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn format(&self) -> SmfFormat {
        self.format
    }

    /// Track count declared in the header
    pub fn track_count(&self) -> u16 {
        self.track_count
    }

    pub fn timing(&self) -> Timing {
        self.tempo_map.timing()
    }

    pub fn time_base(&self) -> u32 {
        self.tempo_map.timing().time_base()
    }

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo_map
    }

    /// Playing time in milliseconds, the latest end of any track
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn reset_type(&self) -> ResetType {
        self.reset_type
    }

    /// System-exclusive message that resets an instrument for this sequence
    pub fn reset_message(&self) -> &'static [u8] {
        self.reset_type.sysex()
    }

    /// First title text found, decoded lossily
    pub fn title(&self) -> String {
        String::from_utf8_lossy(&self.title).into_owned()
    }

    pub fn title_bytes(&self) -> &[u8] {
        &self.title
    }

    /// First copyright text found, decoded lossily
    pub fn copyright(&self) -> String {
        String::from_utf8_lossy(&self.copyright).into_owned()
    }

    pub fn copyright_bytes(&self) -> &[u8] {
        &self.copyright
    }
}

struct Header {
    format: SmfFormat,
    track_count: u16,
    timing: Timing,
}

fn tag_mismatch(expected: &[u8; 4], found: &[u8]) -> LoadError {
    LoadError::BadChunkTag {
        expected: String::from_utf8_lossy(expected).into_owned(),
        found: String::from_utf8_lossy(found).into_owned(),
    }
}

fn parse_header(cursor: &mut ByteCursor) -> Result<Header, LoadError> {
    let tag = cursor.read_tag().ok_or(LoadError::Empty)?;
    if &tag != HEADER_TAG {
        return Err(tag_mismatch(HEADER_TAG, &tag));
    }
    let length = cursor.read_u32_be().ok_or(LoadError::HeaderTooShort(0))?;
    if length < 6 {
        return Err(LoadError::HeaderTooShort(length));
    }

    let (mut body, clamped) = cursor.take(length as usize);
    if clamped && body.remaining() < 6 {
        return Err(LoadError::HeaderTooShort(body.remaining() as u32));
    }
    let short = || LoadError::HeaderTooShort(length);
    let format = SmfFormat::from_u16(body.read_u16_be().ok_or_else(short)?)?;
    let track_count = body.read_u16_be().ok_or_else(short)?;
    let timing = Timing::from_division(body.read_u16_be().ok_or_else(short)?)?;

    log::debug!(
        "SMF header: format {}, {} tracks, {:?}",
        format.number(),
        track_count,
        timing
    );
    Ok(Header {
        format,
        track_count,
        timing,
    })
}

/// How a single event left the track
enum TrackFlow {
    Continue,
    EndOfTrack,
    Truncated,
}

/// Accumulates state across all tracks of one load
struct TrackParser {
    option: LoadOption,
    messages: Vec<MidiMessage>,
    tempo_map: TempoMap,
    reset: ResetDetector,
    duration: u32,
    title: Vec<u8>,
    copyright: Vec<u8>,
}

impl TrackParser {
    fn new(option: LoadOption, timing: Timing) -> Self {
        Self {
            option,
            messages: Vec::new(),
            tempo_map: TempoMap::new(timing),
            reset: ResetDetector::new(),
            duration: 0,
            title: Vec::new(),
            copyright: Vec::new(),
        }
    }

    fn parse_track(&mut self, cursor: &mut ByteCursor, index: u16) -> Result<(), LoadError> {
        let Some(tag) = cursor.read_tag() else {
            let rest = cursor.remaining();
            let found = cursor.read_bytes(rest).unwrap_or_default();
            return Err(tag_mismatch(TRACK_TAG, found));
        };
        if &tag != TRACK_TAG {
            return Err(tag_mismatch(TRACK_TAG, &tag));
        }
        let declared = cursor.read_u32_be().unwrap_or(0) as usize;
        let (mut track, clamped) = cursor.take(declared);
        if clamped {
            log::warn!(
                "Track {} declares {} bytes but only {} remain",
                index,
                declared,
                track.remaining()
            );
        }

        let mut tick = 0u32;
        let mut running = 0u32;
        loop {
            if track.is_empty() {
                log::warn!("Track {} has no end-of-track event", index);
                self.end_track(tick);
                return Ok(());
            }
            match self.parse_event(&mut track, &mut tick, &mut running)? {
                TrackFlow::Continue => {}
                TrackFlow::EndOfTrack => {
                    self.end_track(tick);
                    return Ok(());
                }
                TrackFlow::Truncated => {
                    log::warn!("Track {} is truncated at tick {}", index, tick);
                    self.end_track(tick);
                    return Ok(());
                }
            }
        }
    }

    fn parse_event(
        &mut self,
        track: &mut ByteCursor,
        tick: &mut u32,
        running: &mut u32,
    ) -> Result<TrackFlow, LoadError> {
        let Some(delta) = track.read_vlq() else {
            return Ok(TrackFlow::Truncated);
        };
        *tick = tick.saturating_add(delta);
        let Some(first) = track.peek_u8() else {
            return Ok(TrackFlow::Truncated);
        };

        match first {
            0xF0 | 0xF7 => {
                track.read_u8();
                let Some(length) = track.read_vlq() else {
                    return Ok(TrackFlow::Truncated);
                };
                let Some(payload) = track.read_bytes(length as usize) else {
                    return Ok(TrackFlow::Truncated);
                };
                if self.option.detect_reset_type {
                    self.reset.observe(payload);
                }
                Ok(TrackFlow::Continue)
            }
            0xFF => {
                let position = track.position();
                track.read_u8();
                let Some(kind) = track.read_u8() else {
                    return Ok(TrackFlow::Truncated);
                };
                if kind == META_END_OF_TRACK {
                    return match track.read_u8() {
                        Some(0) => Ok(TrackFlow::EndOfTrack),
                        _ => Err(LoadError::MalformedEndOfTrack(position)),
                    };
                }
                let Some(length) = track.read_vlq() else {
                    return Ok(TrackFlow::Truncated);
                };
                let Some(data) = track.read_bytes(length as usize) else {
                    return Ok(TrackFlow::Truncated);
                };
                self.handle_meta(kind, data, *tick);
                Ok(TrackFlow::Continue)
            }
            _ => Ok(self.parse_channel_message(track, *tick, running)),
        }
    }

    fn parse_channel_message(
        &mut self,
        track: &mut ByteCursor,
        tick: u32,
        running: &mut u32,
    ) -> TrackFlow {
        let Some(first) = track.peek_u8() else {
            return TrackFlow::Truncated;
        };
        let status = if first & 0x80 != 0 {
            track.read_u8();
            first
        } else {
            *running as u8
        };
        if status & 0x80 == 0 {
            // Data byte with no running status to reuse
            track.read_u8();
            log::debug!("Skipping stray data byte {:#04x} at tick {}", first, tick);
            return TrackFlow::Continue;
        }

        let message = match status & 0xF0 {
            0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => {
                let (Some(d1), Some(d2)) = (track.read_u8(), track.read_u8()) else {
                    return TrackFlow::Truncated;
                };
                pack(status, d1, d2)
            }
            0xC0 | 0xD0 => {
                let Some(d1) = track.read_u8() else {
                    return TrackFlow::Truncated;
                };
                pack(status, d1, 0)
            }
            _ => {
                // System common or real-time status inside a file; the byte is consumed and dropped
                log::debug!("Skipping status byte {:#04x} at tick {}", status, tick);
                return TrackFlow::Continue;
            }
        };

        *running = message;
        if self.option.ignore_bank_select && is_bank_select(message) {
            return TrackFlow::Continue;
        }
        let time = self.tempo_map.time_at(tick);
        self.messages.push(MidiMessage::new(time, message));
        TrackFlow::Continue
    }

    fn handle_meta(&mut self, kind: u8, data: &[u8], tick: u32) {
        match kind {
            META_TEXT | META_TRACK_NAME => capture_text(&mut self.title, data),
            META_COPYRIGHT => capture_text(&mut self.copyright, data),
            META_TEMPO => {
                let Some(micros) = ByteCursor::new(data).read_u24_be() else {
                    log::warn!("Ignoring short tempo event at tick {}", tick);
                    return;
                };
                if let Some(bpm) = self.tempo_map.insert_micros_per_quarter(tick, micros) {
                    log::debug!("Tempo {} BPM at tick {}", bpm, tick);
                }
            }
            _ => {}
        }
    }

    fn end_track(&mut self, tick: u32) {
        let time = self.tempo_map.time_at(tick);
        self.messages.push(MidiMessage::end_of_track(time));
        self.duration = self.duration.max(time);
    }

    fn finish(mut self, header: Header) -> Result<Sequence, LoadError> {
        if self.messages.is_empty() {
            return Err(LoadError::Empty);
        }
        // Stable, so same-time messages keep file order
        self.messages.sort_by_key(|m| m.time);

        Ok(Sequence {
            messages: self.messages,
            format: header.format,
            track_count: header.track_count,
            tempo_map: self.tempo_map,
            duration: self.duration,
            reset_type: self.reset.reset_type(),
            title: self.title,
            copyright: self.copyright,
        })
    }
}

/// Store the first non-empty text into `target`, cut to [`METATEXT_MAXLEN`]
/// bytes with trailing whitespace removed
fn capture_text(target: &mut Vec<u8>, data: &[u8]) {
    if !target.is_empty() {
        return;
    }
    let len = data.len().min(METATEXT_MAXLEN);
    target.extend_from_slice(&data[..len]);
    trim_trailing(target);
}

/// Remove trailing ASCII whitespace, NUL padding and Shift_JIS full-width spaces
fn trim_trailing(text: &mut Vec<u8>) {
    loop {
        match text.as_slice() {
            [.., 0x81, 0x40] => text.truncate(text.len() - 2),
            [.., b' ' | b'\t' | b'\r' | b'\n' | 0x00] => {
                text.pop();
            }
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::midi::events::END_OF_TRACK;
    use crate::audio::midi::test_util::{at, padded, smf, tempo_event, track, write_parallel};
    use midly::num::{u24, u4, u7};
    use midly::{MetaMessage, MidiMessage as MidlyMessage, TrackEventKind};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn note_on(delta: u32, channel: u8, key: u8) -> midly::TrackEvent<'static> {
        at(
            delta,
            TrackEventKind::Midi {
                channel: u4::new(channel),
                message: MidlyMessage::NoteOn {
                    key: u7::new(key),
                    vel: u7::new(100),
                },
            },
        )
    }

    fn note_off(delta: u32, channel: u8, key: u8) -> midly::TrackEvent<'static> {
        at(
            delta,
            TrackEventKind::Midi {
                channel: u4::new(channel),
                message: MidlyMessage::NoteOff {
                    key: u7::new(key),
                    vel: u7::new(0),
                },
            },
        )
    }

    fn end(delta: u32) -> midly::TrackEvent<'static> {
        at(delta, TrackEventKind::Meta(MetaMessage::EndOfTrack))
    }

    fn single_track(events: &[u8]) -> Vec<u8> {
        smf(0, 480, &[track(events)])
    }

    #[test]
    fn test_quarter_note_at_default_tempo() {
        let mut events = vec![0x00];
        events.extend(tempo_event(500_000));
        events.extend([0x83, 0x60, 0x90, 60, 100]); // delta 480
        events.extend([0x83, 0x60, 0x80, 60, 0]); // delta 480
        events.extend([0x00, 0xFF, 0x2F, 0x00]);

        let sequence = Sequence::parse(&single_track(&events), &LoadOption::inspect()).unwrap();
        let messages = sequence.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], MidiMessage::new(500, pack(0x90, 60, 100)));
        assert_eq!(messages[1], MidiMessage::new(1000, pack(0x80, 60, 0)));
        assert!(messages[2].is_end_of_track());
        assert_eq!(sequence.duration(), 1000);
        assert_eq!(sequence.time_base(), 480);
        assert_eq!(sequence.format(), SmfFormat::SingleTrack);
    }

    #[test]
    fn test_short_tempo_event_is_ignored() {
        let mut events = vec![0x00, 0xFF, 0x51, 0x02, 0x03, 0xD0];
        events.extend([0x00]);
        events.extend(tempo_event(250_000));
        events.extend([0x83, 0x60, 0x90, 60, 100]); // delta 480
        events.extend([0x00, 0xFF, 0x2F, 0x00]);

        let sequence = Sequence::parse(&single_track(&events), &LoadOption::inspect()).unwrap();
        // Only the well-formed 240 BPM tempo applies
        assert_eq!(sequence.messages()[0], MidiMessage::new(250, pack(0x90, 60, 100)));
    }

    #[test]
    fn test_running_status() {
        let events = [
            0x00, 0x90, 60, 100, // explicit status
            0x00, 62, 100, // running status
            0x00, 0xC1, 5, // program change, one data byte
            0x00, 7, // running status on a two-byte message
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let sequence = Sequence::parse(&single_track(&events), &LoadOption::inspect()).unwrap();
        let data: Vec<u32> = sequence.messages().iter().map(|m| m.data).collect();
        assert_eq!(
            data,
            vec![
                pack(0x90, 60, 100),
                pack(0x90, 62, 100),
                pack(0xC1, 5, 0),
                pack(0xC1, 7, 0),
                END_OF_TRACK
            ]
        );
    }

    #[test]
    fn test_running_status_repeats_note_on() {
        let events = [0x00, 0x90, 0x40, 0x40, 0x00, 0x41, 0x41, 0x00, 0xFF, 0x2F, 0x00];
        let sequence = Sequence::parse(&single_track(&events), &LoadOption::inspect()).unwrap();
        assert_eq!(sequence.messages()[1].data, pack(0x90, 0x41, 0x41));
    }

    #[test]
    fn test_bank_select_filtering() {
        let events = [
            0x00, 0xB0, 0x00, 0x01, // bank MSB
            0x00, 0x20, 0x00, // bank LSB via running status
            0x00, 0x07, 0x64, // volume via running status
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let data = single_track(&events);

        let inspected = Sequence::parse(&data, &LoadOption::inspect()).unwrap();
        assert_eq!(inspected.len(), 4);

        let playback = Sequence::parse(&data, &LoadOption::playback()).unwrap();
        let kept: Vec<u32> = playback.messages().iter().map(|m| m.data).collect();
        // Running status still follows the dropped bank select
        assert_eq!(kept, vec![pack(0xB0, 0x07, 0x64), END_OF_TRACK]);
    }

    #[test]
    fn test_gs_reset_detection() {
        let mut events = vec![0x00, 0xF0, 0x0A];
        events.extend([0x41, 0x10, 0x42, 0x12, 0x40, 0x00, 0x7F, 0x00, 0x41, 0xF7]);
        events.extend([0x00, 0xFF, 0x2F, 0x00]);
        let data = single_track(&events);

        let sequence = Sequence::parse(&data, &LoadOption::inspect()).unwrap();
        assert_eq!(sequence.reset_type(), ResetType::Gs);
        assert_eq!(sequence.reset_message(), ResetType::Gs.sysex());

        let undetected = Sequence::parse(
            &data,
            &LoadOption {
                ignore_bank_select: false,
                detect_reset_type: false,
            },
        )
        .unwrap();
        assert_eq!(undetected.reset_type(), ResetType::Gm1);
    }

    #[test]
    fn test_sysex_with_long_length_is_skipped() {
        let mut events = vec![0x00, 0xF7, 0x81, 0x00]; // 128 byte escape
        events.extend(std::iter::repeat(0x90).take(128));
        events.extend([0x00, 0x90, 60, 100, 0x00, 0xFF, 0x2F, 0x00]);
        let sequence = Sequence::parse(&single_track(&events), &LoadOption::inspect()).unwrap();
        assert_eq!(sequence.messages()[0].data, pack(0x90, 60, 100));
        assert_eq!(sequence.len(), 2);
    }

    #[test]
    fn test_tracks_merge_in_time_order() {
        let data = write_parallel(
            480,
            vec![
                vec![
                    at(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(500_000)))),
                    end(1920),
                ],
                vec![note_on(0, 0, 60), note_off(480, 0, 60), end(0)],
                vec![note_on(240, 1, 64), note_off(480, 1, 64), end(0)],
            ],
        );
        let sequence = Sequence::parse(&data, &LoadOption::playback()).unwrap();
        assert_eq!(sequence.format(), SmfFormat::Parallel);
        assert_eq!(sequence.track_count(), 3);

        let times: Vec<u32> = sequence.messages().iter().map(|m| m.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(sequence.duration(), 2000);
        assert!(sequence.messages().last().unwrap().is_end_of_track());

        let notes: Vec<(u32, u32)> = sequence
            .messages()
            .iter()
            .filter(|m| !m.is_end_of_track())
            .map(|m| (m.time, m.data))
            .collect();
        assert_eq!(
            notes,
            vec![
                (0, pack(0x90, 60, 100)),
                (250, pack(0x91, 64, 100)),
                (500, pack(0x80, 60, 0)),
                (750, pack(0x81, 64, 0)),
            ]
        );
    }

    #[test]
    fn test_same_time_keeps_file_order() {
        let data = write_parallel(
            96,
            vec![
                vec![note_on(10, 0, 60), end(0)],
                vec![note_on(10, 1, 61), end(0)],
            ],
        );
        let sequence = Sequence::parse(&data, &LoadOption::inspect()).unwrap();
        let data: Vec<u32> = sequence.messages().iter().map(|m| m.data).collect();
        assert_eq!(data[0], pack(0x90, 60, 100));
        assert_eq!(data[1], END_OF_TRACK);
        assert_eq!(data[2], pack(0x91, 61, 100));
    }

    #[test]
    fn test_title_and_copyright() {
        let mut events = vec![0x00, 0xFF, 0x03, 0x09];
        events.extend(b"Song  \x81\x40 ");
        events.extend([0x00, 0xFF, 0x01, 0x05]);
        events.extend(b"Other");
        events.extend([0x00, 0xFF, 0x02, 0x04]);
        events.extend(b"(c) ");
        events.extend([0x00, 0xFF, 0x2F, 0x00]);

        let sequence = Sequence::parse(&single_track(&events), &LoadOption::inspect()).unwrap();
        assert_eq!(sequence.title(), "Song");
        assert_eq!(sequence.copyright(), "(c)");
    }

    #[test]
    fn test_long_title_is_cut() {
        let mut events = vec![0x00, 0xFF, 0x03, 0x82, 0x2C]; // 300 bytes
        events.extend(std::iter::repeat(b'a').take(300));
        events.extend([0x00, 0xFF, 0x2F, 0x00]);
        let sequence = Sequence::parse(&single_track(&events), &LoadOption::inspect()).unwrap();
        assert_eq!(sequence.title_bytes().len(), METATEXT_MAXLEN);
    }

    #[test]
    fn test_header_errors() {
        let good = single_track(&[0x00, 0xFF, 0x2F, 0x00]);

        let mut bad_tag = good.clone();
        bad_tag[0] = b'X';
        assert!(matches!(
            Sequence::parse(&bad_tag, &LoadOption::inspect()),
            Err(LoadError::BadChunkTag { .. })
        ));

        let mut short = good.clone();
        short[7] = 5;
        assert!(matches!(
            Sequence::parse(&short, &LoadOption::inspect()),
            Err(LoadError::HeaderTooShort(5))
        ));

        let format2 = smf(2, 480, &[track(&[0x00, 0xFF, 0x2F, 0x00])]);
        assert!(matches!(
            Sequence::parse(&format2, &LoadOption::inspect()),
            Err(LoadError::UnsupportedFormat(2))
        ));

        let zero_division = smf(0, 0, &[track(&[0x00, 0xFF, 0x2F, 0x00])]);
        assert!(matches!(
            Sequence::parse(&zero_division, &LoadOption::inspect()),
            Err(LoadError::ZeroTimeBase)
        ));

        assert!(matches!(
            Sequence::parse(&[], &LoadOption::inspect()),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn test_no_tracks_is_empty() {
        let data = smf(1, 480, &[]);
        assert!(matches!(
            Sequence::parse(&data, &LoadOption::inspect()),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn test_bad_track_tag() {
        let mut chunk = track(&[0x00, 0xFF, 0x2F, 0x00]);
        chunk[..4].copy_from_slice(b"XFIH");
        let data = smf(0, 480, &[chunk]);
        match Sequence::parse(&data, &LoadOption::inspect()) {
            Err(LoadError::BadChunkTag { expected, found }) => {
                assert_eq!(expected, "MTrk");
                assert_eq!(found, "XFIH");
            }
            other => panic!("Expected BadChunkTag, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_end_of_track() {
        let data = single_track(&[0x00, 0x90, 60, 100, 0x00, 0xFF, 0x2F, 0x01, 0x00]);
        assert!(matches!(
            Sequence::parse(&data, &LoadOption::inspect()),
            Err(LoadError::MalformedEndOfTrack(_))
        ));
    }

    #[test]
    fn test_truncated_track_is_closed() {
        let mut data = single_track(&[0x00, 0x90, 60, 100, 0x60, 0x80, 60]);
        // Declare more bytes than the file holds
        let len_offset = 14 + 4;
        data[len_offset..len_offset + 4].copy_from_slice(&100u32.to_be_bytes());

        let sequence = Sequence::parse(&data, &LoadOption::inspect()).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.messages()[0].data, pack(0x90, 60, 100));
        // Closed at the tick of the partial event
        assert_eq!(sequence.messages()[1], MidiMessage::end_of_track(100));
    }

    #[test]
    fn test_fewer_tracks_than_declared() {
        let mut data = smf(1, 480, &[track(&[0x00, 0xFF, 0x2F, 0x00])]);
        data[11] = 4;
        let sequence = Sequence::parse(&data, &LoadOption::inspect()).unwrap();
        assert_eq!(sequence.track_count(), 4);
        assert_eq!(sequence.len(), 1);
    }

    #[test]
    fn test_failed_reload_clears() {
        let mut sequence = Sequence::default();
        sequence
            .load(&single_track(&[0x00, 0x90, 60, 100, 0x00, 0xFF, 0x2F, 0x00]), &LoadOption::inspect())
            .unwrap();
        assert_eq!(sequence.len(), 2);

        assert!(sequence.load(b"RIFF", &LoadOption::inspect()).is_err());
        assert!(sequence.is_empty());
        assert_eq!(sequence.duration(), 0);
    }

    #[test]
    fn test_load_file_minimum_size() {
        let dir = std::env::temp_dir();
        let small = dir.join(format!("smfsynth-small-{}.mid", std::process::id()));
        let data = single_track(&[0x00, 0x90, 60, 100, 0x00, 0xFF, 0x2F, 0x00]);
        std::fs::write(&small, &data).unwrap();
        let result = Sequence::load_file(&small, &LoadOption::playback());
        assert!(matches!(result, Err(LoadError::TooSmall { minimum: MIN_FILE_SIZE, .. })));

        std::fs::write(&small, padded(data)).unwrap();
        let sequence = Sequence::load_file(&small, &LoadOption::playback()).unwrap();
        assert_eq!(sequence.len(), 2);
        let _ = std::fs::remove_file(&small);
    }

    #[test]
    fn test_garbage_never_panics() {
        let mut rng = StdRng::seed_from_u64(7);
        let base = single_track(&[
            0x00, 0xF0, 0x05, 0x7E, 0x7F, 0x09, 0x01, 0xF7, 0x00, 0x90, 60, 100, 0x00, 0xFF, 0x2F,
            0x00,
        ]);
        for _ in 0..2000 {
            let mut data = base.clone();
            for _ in 0..rng.gen_range(1..8) {
                let i = rng.gen_range(0..data.len());
                data[i] = rng.gen();
            }
            data.truncate(rng.gen_range(0..=data.len()));
            if let Ok(sequence) = Sequence::parse(&data, &LoadOption::playback()) {
                let times: Vec<u32> = sequence.messages().iter().map(|m| m.time).collect();
                assert!(times.windows(2).all(|w| w[0] <= w[1]));
            }
        }
        for _ in 0..200 {
            let len = rng.gen_range(0..512);
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let _ = Sequence::parse(&data, &LoadOption::inspect());
        }
    }
}
