//! WAV encoding for stereo integer PCM.
//!
//! The data chunk is streamed: write a header with a placeholder size, append
//! sample bytes as they are rendered, then patch both sizes in `finish`.

use std::io::{Seek, SeekFrom, Write};

use super::pcm::BitDepth;

/// Incremental RIFF/WAVE writer
pub struct WavWriter<W: Write + Seek> {
    inner: W,
    data_size: u32,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn new(
        mut inner: W,
        sample_rate: u32,
        channels: u16,
        depth: BitDepth,
    ) -> std::io::Result<Self> {
        let bits_per_sample = depth.bits();
        let block_align = channels * (bits_per_sample / 8);
        write_riff_header(&mut inner, 0)?;
        write_fmt_chunk(&mut inner, channels, sample_rate, block_align, bits_per_sample)?;
        inner.write_all(b"data")?;
        inner.write_all(&0u32.to_le_bytes())?;
        Ok(Self {
            inner,
            data_size: 0,
        })
    }

    /// Append already-encoded little-endian sample bytes
    pub fn write_pcm(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(bytes)?;
        self.data_size = self.data_size.saturating_add(bytes.len() as u32);
        Ok(())
    }

    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// Patch chunk sizes and return the inner writer
    pub fn finish(mut self) -> std::io::Result<W> {
        // RIFF chunks are padded to an even size
        if self.data_size % 2 == 1 {
            self.inner.write_all(&[0])?;
        }
        self.inner.seek(SeekFrom::Start(4))?;
        self.inner.write_all(&(36 + self.data_size).to_le_bytes())?;
        self.inner.seek(SeekFrom::Start(40))?;
        self.inner.write_all(&self.data_size.to_le_bytes())?;
        self.inner.seek(SeekFrom::End(0))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(
    w: &mut impl Write,
    num_channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())
}
