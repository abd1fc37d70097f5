//! SMF fixtures for tests

use midly::num::{u15, u28};
use midly::{Format, Header, Smf, Timing, TrackEvent};

/// Wrap raw event bytes in an `MTrk` chunk
pub fn track(events: &[u8]) -> Vec<u8> {
    let mut chunk = b"MTrk".to_vec();
    chunk.extend_from_slice(&(events.len() as u32).to_be_bytes());
    chunk.extend_from_slice(events);
    chunk
}

/// Assemble a complete file from a header and pre-built track chunks
pub fn smf(format: u16, division: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut data = b"MThd".to_vec();
    data.extend_from_slice(&6u32.to_be_bytes());
    data.extend_from_slice(&format.to_be_bytes());
    data.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    data.extend_from_slice(&division.to_be_bytes());
    for chunk in tracks {
        data.extend_from_slice(chunk);
    }
    data
}

/// Tempo meta event bytes (without delta time)
pub fn tempo_event(micros_per_quarter: u32) -> Vec<u8> {
    let b = micros_per_quarter.to_be_bytes();
    vec![0xFF, 0x51, 0x03, b[1], b[2], b[3]]
}

/// Format 1 file written by midly, for well-formed multi-track input
pub fn write_parallel(ticks_per_quarter: u16, tracks: Vec<Vec<TrackEvent<'_>>>) -> Vec<u8> {
    let smf = Smf {
        header: Header::new(Format::Parallel, Timing::Metrical(u15::new(ticks_per_quarter))),
        tracks,
    };
    let mut data = Vec::new();
    smf.write_std(&mut data).expect("writing to a Vec cannot fail");
    data
}

/// Shorthand for a midly track event
pub fn at(delta: u32, kind: midly::TrackEventKind<'_>) -> TrackEvent<'_> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

/// Pad a file past the minimum size accepted from disk
pub fn padded(mut data: Vec<u8>) -> Vec<u8> {
    if data.len() < 256 {
        data.resize(256, 0);
    }
    data
}
