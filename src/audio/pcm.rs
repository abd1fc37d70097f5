//! Float to integer PCM conversion
//!
//! Instrument output is scaled by a fixed headroom factor per bit depth
//! rather than to full scale, so loud passages have room before they clip.
//! Anything beyond the integer range is clamped before truncation.

/// Integer sample formats a session can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Pcm16,
    Pcm24,
    Pcm32,
}

impl BitDepth {
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            16 => Some(Self::Pcm16),
            24 => Some(Self::Pcm24),
            32 => Some(Self::Pcm32),
            _ => None,
        }
    }

    pub fn bits(&self) -> u16 {
        match self {
            Self::Pcm16 => 16,
            Self::Pcm24 => 24,
            Self::Pcm32 => 32,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits() as usize / 8
    }

    /// Multiplier applied to a float sample of nominal range -1.0..1.0.
    /// The 32-bit factor is 1_503_192_678 (70% of full scale) rounded to
    /// single precision.
    pub fn headroom_scale(&self) -> f32 {
        match self {
            Self::Pcm16 => 20_000.0,
            Self::Pcm24 => 6_000_000.0,
            Self::Pcm32 => 1_503_192_704.0,
        }
    }

    /// Inclusive integer range samples are clamped to
    pub fn limits(&self) -> (i32, i32) {
        match self {
            Self::Pcm16 => (i16::MIN as i32, i16::MAX as i32),
            Self::Pcm24 => (-8_388_608, 8_388_607),
            Self::Pcm32 => (-2_147_418_112, 2_147_418_112),
        }
    }

    /// Scale, clamp and truncate one sample
    #[inline]
    pub fn quantize(&self, sample: f32) -> i32 {
        let (min, max) = self.limits();
        let scaled = sample * self.headroom_scale();
        // NaN survives clamp and then casts to 0
        scaled.clamp(min as f32, max as f32) as i32
    }
}

/// Convert interleaved float samples into little-endian integer PCM.
///
/// Writes as many whole samples as fit in `out` and returns the number of
/// bytes written.
pub fn write_samples(samples: &[f32], depth: BitDepth, out: &mut [u8]) -> usize {
    let width = depth.bytes_per_sample();
    let mut written = 0;
    for (sample, dest) in samples.iter().zip(out.chunks_exact_mut(width)) {
        let value = depth.quantize(*sample);
        dest.copy_from_slice(&value.to_le_bytes()[..width]);
        written += width;
    }
    written
}

/// Read interleaved little-endian integer PCM back into floats at full
/// scale, appending to `out`. A trailing partial sample is ignored.
pub fn read_samples(bytes: &[u8], depth: BitDepth, out: &mut Vec<f32>) {
    let width = depth.bytes_per_sample();
    let shift = 32 - depth.bits() as u32;
    let full_scale = (1u64 << (depth.bits() - 1)) as f32;
    for chunk in bytes.chunks_exact(width) {
        let mut raw = [0u8; 4];
        raw[4 - width..].copy_from_slice(chunk);
        // Left-aligned, so the arithmetic shift sign-extends
        let value = i32::from_le_bytes(raw) >> shift;
        out.push(value as f32 / full_scale);
    }
}

/// Like [`write_samples`] with a raw bit count. Unsupported depths produce
/// nothing.
pub fn convert(samples: &[f32], bits: u16, out: &mut [u8]) -> usize {
    match BitDepth::from_bits(bits) {
        Some(depth) => write_samples(samples, depth, out),
        None => 0,
    }
}
