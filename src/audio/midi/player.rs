//! Playback cursor over a loaded sequence
//!
//! The cursor walks the sorted message list in time order. Each advance
//! collects every message that has come due, so the caller can hand them to
//! the instrument before rendering the next slice of audio.

use super::events::is_bank_select;
use super::file::Sequence;

/// Result of one advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep rendering; the batch may be empty while a tail of silence plays out
    Playing,
    /// All messages were sent and the sequence duration has elapsed
    Finished,
}

/// Position of one playback session within a sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    message_index: usize,
    current_time_ms: u32,
    end_time_ms: u32,
}

impl PlaybackCursor {
    pub fn new(end_time_ms: u32) -> Self {
        Self {
            message_index: 0,
            current_time_ms: 0,
            end_time_ms,
        }
    }

    /// Cursor at the start of `sequence`, ending at its duration
    pub fn for_sequence(sequence: &Sequence) -> Self {
        Self::new(sequence.duration())
    }

    /// Index of the next message not yet sent
    pub fn message_index(&self) -> usize {
        self.message_index
    }

    pub fn current_time(&self) -> u32 {
        self.current_time_ms
    }

    pub fn end_time(&self) -> u32 {
        self.end_time_ms
    }

    pub fn is_exhausted(&self, sequence: &Sequence) -> bool {
        self.message_index >= sequence.len()
    }

    /// Collect messages due at the current time into `batch`.
    ///
    /// End-of-track markers and bank select changes are consumed without
    /// being emitted. Once every message is consumed the cursor keeps
    /// reporting [`Step::Playing`] until the current time reaches the end
    /// time.
    pub fn advance(&mut self, sequence: &Sequence, batch: &mut Vec<u32>) -> Step {
        let messages = sequence.messages();
        if self.message_index >= messages.len() {
            return if self.current_time_ms < self.end_time_ms {
                Step::Playing
            } else {
                Step::Finished
            };
        }

        while let Some(message) = messages.get(self.message_index) {
            if message.time > self.current_time_ms {
                break;
            }
            self.message_index += 1;
            if message.is_end_of_track() || is_bank_select(message.data) {
                continue;
            }
            batch.push(message.data);
        }
        Step::Playing
    }

    /// Move to `target_ms` and collect what is due there
    pub fn advance_to(&mut self, sequence: &Sequence, target_ms: u32, batch: &mut Vec<u32>) -> Step {
        self.current_time_ms = target_ms;
        self.advance(sequence, batch)
    }

    /// Move time forward without collecting messages
    pub fn step(&mut self, elapsed_ms: u32) {
        self.current_time_ms = self.current_time_ms.saturating_add(elapsed_ms);
    }

    /// Jump to `time_ms`. Returns true if the cursor had to rewind to the
    /// first message, which happens whenever the target is earlier than the
    /// current time.
    pub fn seek(&mut self, time_ms: u32) -> bool {
        self.seek_from(self.current_time_ms, time_ms)
    }

    /// Like [`Self::seek`] for a caller whose playback position has moved
    /// past the last advance, as it does while a block renders. Rewinds when
    /// the target is earlier than either time.
    pub fn seek_from(&mut self, position_ms: u32, time_ms: u32) -> bool {
        let rewound = time_ms < position_ms.max(self.current_time_ms);
        if rewound {
            self.message_index = 0;
        }
        self.current_time_ms = time_ms;
        rewound
    }
}
