//! Tempo map and tick-to-millisecond conversion
//!
//! Tempo is kept in whole beats per minute keyed by tick. Conversion sums
//! each tempo segment separately with a 64-bit multiply-then-divide that
//! truncates toward zero, so timestamps are reproducible bit for bit.

use std::collections::BTreeMap;

use crate::error::LoadError;

/// Tempo assumed before the first tempo event (MIDI default)
pub const DEFAULT_BPM: u32 = 120;

/// Time division from the SMF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Ticks per quarter note
    Metrical(u16),
    /// SMPTE frames per second (24, 25, 29 for 29.97 drop-frame, 30) and ticks per frame
    Timecode { fps: u8, ticks_per_frame: u8 },
}

impl Timing {
    /// Decode the raw 16-bit division field
    pub fn from_division(raw: u16) -> Result<Self, LoadError> {
        if raw & 0x8000 == 0 {
            if raw == 0 {
                return Err(LoadError::ZeroTimeBase);
            }
            return Ok(Self::Metrical(raw));
        }

        let fps = ((raw >> 8) as u8 as i8).wrapping_neg() as u8;
        let ticks_per_frame = raw as u8;
        if !matches!(fps, 24 | 25 | 29 | 30) || ticks_per_frame == 0 {
            return Err(LoadError::BadTimecode(raw));
        }
        Ok(Self::Timecode { fps, ticks_per_frame })
    }

    /// Ticks per quarter note, or ticks per frame for timecode files
    pub fn time_base(&self) -> u32 {
        match *self {
            Self::Metrical(tpq) => tpq as u32,
            Self::Timecode { ticks_per_frame, .. } => ticks_per_frame as u32,
        }
    }
}

/// `a * b / c` with a 64-bit intermediate, truncating toward zero
#[inline]
pub fn mul_div(a: u64, b: u64, c: u64) -> u64 {
    if c == 0 {
        return 0;
    }
    a.saturating_mul(b) / c
}

/// Ordered tick -> BPM mapping, always holding an entry at tick 0
#[derive(Debug, Clone)]
pub struct TempoMap {
    timing: Timing,
    tempos: BTreeMap<u32, u32>,
}

impl TempoMap {
    pub fn new(timing: Timing) -> Self {
        let mut tempos = BTreeMap::new();
        tempos.insert(0, DEFAULT_BPM);
        Self { timing, tempos }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Set the tempo from `tick` onward. A later insert at the same tick wins.
    pub fn insert(&mut self, tick: u32, bpm: u32) {
        if bpm == 0 {
            log::warn!("Ignoring zero tempo at tick {}", tick);
            return;
        }
        self.tempos.insert(tick, bpm);
    }

    /// Set the tempo from a tempo meta event's microseconds per quarter note.
    ///
    /// Returns the BPM that was stored, or `None` if the value was unusable.
    pub fn insert_micros_per_quarter(&mut self, tick: u32, micros: u32) -> Option<u32> {
        if micros == 0 {
            log::warn!("Ignoring tempo event with zero length quarter note at tick {}", tick);
            return None;
        }
        let bpm = (60_000_000 / micros as u64) as u32;
        if bpm == 0 {
            return None;
        }
        self.insert(tick, bpm);
        Some(bpm)
    }

    /// Tempo in effect at `tick`
    pub fn bpm_at(&self, tick: u32) -> u32 {
        self.tempos
            .range(..=tick)
            .next_back()
            .map(|(_, bpm)| *bpm)
            .unwrap_or(DEFAULT_BPM)
    }

    pub fn len(&self) -> usize {
        self.tempos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tempos.is_empty()
    }

    /// Tempo changes in ascending tick order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.tempos.iter().map(|(tick, bpm)| (*tick, *bpm))
    }

    /// Absolute time in milliseconds of `tick`
    pub fn time_at(&self, tick: u32) -> u32 {
        let ms = match self.timing {
            Timing::Metrical(tpq) => self.metrical_time_at(tick, tpq as u64),
            Timing::Timecode { fps, ticks_per_frame } => {
                let tpf = ticks_per_frame as u64;
                if fps == 29 {
                    // 29.97 frames per second
                    mul_div(tick as u64, 100_000, 2997 * tpf)
                } else {
                    mul_div(tick as u64, 1000, fps as u64 * tpf)
                }
            }
        };
        ms.min(u32::MAX as u64) as u32
    }

    fn metrical_time_at(&self, tick: u32, time_base: u64) -> u64 {
        let mut play_time = 0u64;
        let mut segment_start = 0u32;
        let mut tempo = DEFAULT_BPM;

        for (&start, &bpm) in self.tempos.range(..=tick) {
            let ticks = start - segment_start;
            if ticks > 0 {
                play_time += mul_div(ticks as u64, 60_000, tempo as u64 * time_base);
            }
            segment_start = start;
            tempo = bpm;
        }

        play_time + mul_div((tick - segment_start) as u64, 60_000, tempo as u64 * time_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_default_tempo_entry() {
        let map = TempoMap::new(Timing::Metrical(480));
        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().next(), Some((0, 120)));
        assert_eq!(map.bpm_at(100_000), 120);
    }

    #[test]
    fn test_tempo_calculation() {
        let mut map = TempoMap::new(Timing::Metrical(480));
        // 500000 microseconds per beat = 120 BPM
        assert_eq!(map.insert_micros_per_quarter(0, 500_000), Some(120));
        // 600000 microseconds per beat = 100 BPM
        assert_eq!(map.insert_micros_per_quarter(960, 600_000), Some(100));
        // Truncates toward zero
        assert_eq!(map.insert_micros_per_quarter(1920, 461_539), Some(129));
        assert_eq!(map.insert_micros_per_quarter(2000, 0), None);
    }

    #[test]
    fn test_quarter_notes_at_120_bpm() {
        let mut map = TempoMap::new(Timing::Metrical(480));
        map.insert_micros_per_quarter(0, 500_000);
        assert_eq!(map.time_at(0), 0);
        assert_eq!(map.time_at(480), 500);
        assert_eq!(map.time_at(960), 1000);
    }

    #[test]
    fn test_piecewise_segments() {
        let mut map = TempoMap::new(Timing::Metrical(96));
        map.insert(192, 60);
        // Two beats at 120 BPM, then one beat at 60 BPM
        assert_eq!(map.time_at(192), 1000);
        assert_eq!(map.time_at(288), 2000);
        // Half a beat into the 60 BPM segment
        assert_eq!(map.time_at(240), 1500);
        assert_eq!(map.bpm_at(191), 120);
        assert_eq!(map.bpm_at(192), 60);
    }

    #[test]
    fn test_each_segment_truncates() {
        let mut map = TempoMap::new(Timing::Metrical(7));
        map.insert(1, 90);
        // 1 tick at 120 BPM: 60000 / 840 = 71.43 -> 71
        // 1 tick at 90 BPM: 60000 / 630 = 95.24 -> 95
        assert_eq!(map.time_at(1), 71);
        assert_eq!(map.time_at(2), 71 + 95);
    }

    #[test]
    fn test_time_is_monotonic() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..50 {
            let mut map = TempoMap::new(Timing::Metrical(rng.gen_range(1..=960)));
            for _ in 0..rng.gen_range(0..20) {
                map.insert(rng.gen_range(0..100_000), rng.gen_range(1..=400));
            }
            let mut ticks: Vec<u32> = (0..200).map(|_| rng.gen_range(0..200_000)).collect();
            ticks.sort_unstable();
            for pair in ticks.windows(2) {
                assert!(
                    map.time_at(pair[0]) <= map.time_at(pair[1]),
                    "time_at({}) > time_at({})",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn test_timecode_division() {
        // -25 fps, 40 ticks per frame = 1000 ticks per second
        let timing = Timing::from_division(0xE728).unwrap();
        assert_eq!(timing, Timing::Timecode { fps: 25, ticks_per_frame: 40 });
        let mut map = TempoMap::new(timing);
        // Tempo events do not affect timecode files
        map.insert(0, 60);
        assert_eq!(map.time_at(1000), 1000);
        assert_eq!(map.time_at(2500), 2500);
    }

    #[test]
    fn test_bad_divisions() {
        assert!(matches!(Timing::from_division(0), Err(LoadError::ZeroTimeBase)));
        // -23 fps is not a SMPTE rate
        assert!(matches!(Timing::from_division(0xE928), Err(LoadError::BadTimecode(_))));
        assert!(matches!(Timing::from_division(0xE700), Err(LoadError::BadTimecode(_))));
    }
}
