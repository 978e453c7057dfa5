//! WAV packaging for raw PCM returned by speech models.
//!
//! Speech endpoints answer with `audio/L16;codec=pcm;rate=24000` style
//! payloads: headerless little-endian samples. Players want a RIFF container,
//! so the samples are rewritten through `hound`.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("Unsupported audio format: {0}")]
    Unsupported(String),

    #[error("PCM payload of {len} bytes is not a whole number of {bits}-bit samples")]
    Truncated { len: usize, bits: u16 },

    #[error("WAV encoding failed: {0}")]
    Encode(#[from] hound::Error),
}

/// Sample layout parsed from an audio MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub bits_per_sample: u16,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            bits_per_sample: 16,
            sample_rate: 24_000,
            channels: 1,
        }
    }
}

impl PcmFormat {
    /// Parse `audio/L<bits>;...;rate=<hz>`, keeping defaults for anything
    /// missing or unparsable
    pub fn from_mime(mime_type: &str) -> Self {
        let mut format = Self::default();

        for param in mime_type.split(';').map(str::trim) {
            let lower = param.to_ascii_lowercase();
            if let Some(rate) = lower.strip_prefix("rate=") {
                if let Ok(rate) = rate.parse() {
                    format.sample_rate = rate;
                }
            } else if let Some(bits) = lower.strip_prefix("audio/l") {
                if let Ok(bits) = bits.parse() {
                    format.bits_per_sample = bits;
                }
            }
        }

        format
    }
}

fn is_raw_pcm(mime_type: &str) -> bool {
    let base = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    base.starts_with("audio/l") || base == "audio/pcm"
}

fn is_wav(mime_type: &str, data: &[u8]) -> bool {
    let base = mime_type.split(';').next().unwrap_or_default().trim();
    data.starts_with(b"RIFF")
        || base.eq_ignore_ascii_case("audio/wav")
        || base.eq_ignore_ascii_case("audio/x-wav")
        || base.eq_ignore_ascii_case("audio/wave")
}

/// Return WAV bytes for a speech payload: WAV passes through, raw PCM is
/// wrapped, anything else is rejected.
pub fn ensure_wav(data: Vec<u8>, mime_type: &str) -> Result<Vec<u8>, WavError> {
    if is_wav(mime_type, &data) {
        return Ok(data);
    }
    if !is_raw_pcm(mime_type) {
        return Err(WavError::Unsupported(mime_type.to_string()));
    }
    pcm_to_wav(&data, PcmFormat::from_mime(mime_type))
}

/// Wrap little-endian PCM samples in a RIFF/WAVE container
pub fn pcm_to_wav(pcm: &[u8], format: PcmFormat) -> Result<Vec<u8>, WavError> {
    let bytes_per_sample = match format.bits_per_sample {
        16 => 2,
        24 => 3,
        32 => 4,
        other => return Err(WavError::Unsupported(format!("{}-bit PCM", other))),
    };
    if pcm.len() % bytes_per_sample != 0 {
        return Err(WavError::Truncated {
            len: pcm.len(),
            bits: format.bits_per_sample,
        });
    }

    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut buffer, spec)?;
        for chunk in pcm.chunks_exact(bytes_per_sample) {
            match bytes_per_sample {
                2 => writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?,
                3 => {
                    // Sign-extend 24-bit little-endian into i32
                    let value = i32::from_le_bytes([0, chunk[0], chunk[1], chunk[2]]) >> 8;
                    writer.write_sample(value)?
                }
                _ => writer.write_sample(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))?,
            }
        }
        writer.finalize()?;
    }

    Ok(buffer.into_inner())
}
