//! RIFF/WAVE parsing for the audio converter.
//!
//! Only the parts needed to locate the sample data and decide whether it can
//! be embedded are read:
//!
//! 1. `RIFF` magic, total size, `WAVE` form type
//! 2. a walk over the chunks (4-byte id, little-endian `u32` size, data
//!    padded to an even length)
//! 3. the `fmt ` chunk, which must precede `data`
//! 4. the `data` chunk, borrowed from the input
//!
//! Unknown chunks (`LIST`, `fact`, `cue `, ...) are skipped.

use crate::error::{Error, Result};
use tracing::{debug, trace};

/// RIFF container magic
pub const RIFF_MAGIC: &[u8; 4] = b"RIFF";
/// WAVE form type
pub const WAVE_MAGIC: &[u8; 4] = b"WAVE";
const FMT_CHUNK: &[u8; 4] = b"fmt ";
const DATA_CHUNK: &[u8; 4] = b"data";

/// Uncompressed integer PCM
pub const FORMAT_PCM: u16 = 0x0001;
/// `WAVE_FORMAT_EXTENSIBLE`; the real format is in the sub-format GUID
pub const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Minimum `fmt ` chunk size (PCMWAVEFORMAT)
const FMT_MIN_SIZE: usize = 16;
/// `fmt ` chunk size carrying the extensible sub-format
const FMT_EXTENSIBLE_SIZE: usize = 40;

/// Fields of the `fmt ` chunk plus the location of the sample data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// Effective format tag (resolved through the sub-format for extensible files)
    pub format_tag: u16,
    /// Number of interleaved channels
    pub channels: u16,
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Average bytes per second
    pub byte_rate: u32,
    /// Bytes per sample frame
    pub block_align: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Offset of the sample data in the file
    pub data_offset: usize,
    /// Length of the sample data in bytes
    pub data_len: usize,
}

impl WavHeader {
    /// Number of sample frames in the data chunk
    pub fn frames(&self) -> usize {
        if self.block_align == 0 {
            0
        } else {
            self.data_len / self.block_align as usize
        }
    }

    /// Playback duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            0
        } else {
            self.frames() as u64 * 1000 / self.sample_rate as u64
        }
    }

    /// Short description such as `8000 Hz, 8-bit mono PCM`
    pub fn describe(&self) -> String {
        let layout = match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            n => format!("{n}-channel"),
        };
        let format = if self.format_tag == FORMAT_PCM {
            "PCM".to_string()
        } else {
            format!("format 0x{:04X}", self.format_tag)
        };
        format!(
            "{} Hz, {}-bit {} {}",
            self.sample_rate, self.bits_per_sample, layout, format
        )
    }

    /// Checks that the samples can be embedded as-is: uncompressed PCM,
    /// one channel, 8 or 16 bits
    pub fn ensure_embeddable(&self) -> Result<()> {
        if self.format_tag != FORMAT_PCM {
            return Err(Error::unsupported(format!(
                "compressed audio (format tag 0x{:04X}); only uncompressed PCM can be embedded",
                self.format_tag
            )));
        }
        if self.channels != 1 {
            return Err(Error::unsupported(format!(
                "{} channels; only mono audio can be embedded, downmix first",
                self.channels
            )));
        }
        if !matches!(self.bits_per_sample, 8 | 16) {
            return Err(Error::unsupported(format!(
                "{} bits per sample; only 8- and 16-bit PCM can be embedded",
                self.bits_per_sample
            )));
        }
        Ok(())
    }
}

/// A parsed WAV file borrowing its sample data from the input
#[derive(Debug, Clone, Copy)]
pub struct WavFile<'a> {
    /// Format and layout information
    pub header: WavHeader,
    /// Raw sample bytes of the `data` chunk
    pub samples: &'a [u8],
}

impl<'a> WavFile<'a> {
    /// Parses a complete RIFF/WAVE image
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(Error::invalid_wav(0, "file shorter than the RIFF header"));
        }
        if &data[0..4] != RIFF_MAGIC {
            return Err(Error::invalid_wav(0, "missing RIFF magic"));
        }
        if &data[8..12] != WAVE_MAGIC {
            return Err(Error::invalid_wav(8, "RIFF form type is not WAVE"));
        }

        let mut format: Option<Format> = None;
        let mut position = 12;

        while position < data.len() {
            let (id, size) = read_chunk_header(data, position)?;
            let body_start = position + 8;
            let body_end = body_start
                .checked_add(size)
                .filter(|&end| end <= data.len())
                .ok_or_else(|| {
                    Error::invalid_wav(
                        position,
                        format!(
                            "chunk '{}' declares {} bytes but only {} remain",
                            String::from_utf8_lossy(&id),
                            size,
                            data.len() - body_start
                        ),
                    )
                })?;

            trace!(
                "Chunk '{}' at {} ({} bytes)",
                String::from_utf8_lossy(&id),
                position,
                size
            );

            match &id {
                FMT_CHUNK => {
                    format = Some(Format::parse(&data[body_start..body_end], body_start)?);
                }
                DATA_CHUNK => {
                    let Some(format) = format else {
                        return Err(Error::invalid_wav(position, "data chunk before fmt chunk"));
                    };
                    let header = format.with_data(body_start, size);
                    debug!(
                        "WAV: {}, {} bytes of samples ({} ms)",
                        header.describe(),
                        size,
                        header.duration_ms()
                    );
                    return Ok(Self {
                        header,
                        samples: &data[body_start..body_end],
                    });
                }
                _ => {}
            }

            // Chunk bodies are word aligned
            position = body_end + (size & 1);
        }

        if format.is_none() {
            Err(Error::invalid_wav(position, "no fmt chunk found"))
        } else {
            Err(Error::invalid_wav(position, "no data chunk found"))
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Format {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl Format {
    fn parse(body: &[u8], offset: usize) -> Result<Self> {
        if body.len() < FMT_MIN_SIZE {
            return Err(Error::invalid_wav(
                offset,
                format!("fmt chunk is {} bytes, need at least {}", body.len(), FMT_MIN_SIZE),
            ));
        }

        let mut format_tag = read_u16(body, 0);
        if format_tag == FORMAT_EXTENSIBLE && body.len() >= FMT_EXTENSIBLE_SIZE {
            // The sub-format GUID starts at 24; its first two bytes are the tag
            format_tag = read_u16(body, 24);
        }

        Ok(Self {
            format_tag,
            channels: read_u16(body, 2),
            sample_rate: read_u32(body, 4),
            byte_rate: read_u32(body, 8),
            block_align: read_u16(body, 12),
            bits_per_sample: read_u16(body, 14),
        })
    }

    fn with_data(self, data_offset: usize, data_len: usize) -> WavHeader {
        WavHeader {
            format_tag: self.format_tag,
            channels: self.channels,
            sample_rate: self.sample_rate,
            byte_rate: self.byte_rate,
            block_align: self.block_align,
            bits_per_sample: self.bits_per_sample,
            data_offset,
            data_len,
        }
    }
}

fn read_chunk_header(data: &[u8], position: usize) -> Result<([u8; 4], usize)> {
    if data.len() - position < 8 {
        return Err(Error::invalid_wav(position, "truncated chunk header"));
    }
    let mut id = [0u8; 4];
    id.copy_from_slice(&data[position..position + 4]);
    let size = read_u32(data, position + 4) as usize;
    Ok((id, size))
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal WAV image; `extra` chunks go between fmt and data
    fn build_wav(
        format_tag: u16,
        channels: u16,
        bits: u16,
        extra: &[(&[u8; 4], &[u8])],
        samples: &[u8],
    ) -> Vec<u8> {
        let sample_rate = 8000u32;
        let block_align = channels * bits / 8;
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&format_tag.to_le_bytes());
        fmt.extend_from_slice(&channels.to_le_bytes());
        fmt.extend_from_slice(&sample_rate.to_le_bytes());
        fmt.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&bits.to_le_bytes());

        let mut chunks = Vec::new();
        let mut push_chunk = |id: &[u8; 4], body: &[u8]| {
            chunks.extend_from_slice(id);
            chunks.extend_from_slice(&(body.len() as u32).to_le_bytes());
            chunks.extend_from_slice(body);
            if body.len() % 2 == 1 {
                chunks.push(0);
            }
        };
        push_chunk(FMT_CHUNK, &fmt);
        for (id, body) in extra {
            push_chunk(id, body);
        }
        push_chunk(DATA_CHUNK, samples);

        let mut out = Vec::new();
        out.extend_from_slice(RIFF_MAGIC);
        out.extend_from_slice(&((chunks.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(WAVE_MAGIC);
        out.extend_from_slice(&chunks);
        out
    }

    #[test]
    fn test_parse_mono_8bit() {
        let image = build_wav(FORMAT_PCM, 1, 8, &[], &[0x80, 0x81, 0x7F, 0x80]);
        let wav = WavFile::parse(&image).unwrap();

        assert_eq!(wav.samples, &[0x80, 0x81, 0x7F, 0x80]);
        assert_eq!(wav.header.sample_rate, 8000);
        assert_eq!(wav.header.frames(), 4);
        assert_eq!(wav.header.data_offset, 44);
        assert_eq!(wav.header.describe(), "8000 Hz, 8-bit mono PCM");
        assert!(wav.header.ensure_embeddable().is_ok());
    }

    #[test]
    fn test_skips_odd_sized_unknown_chunk() {
        let image = build_wav(FORMAT_PCM, 1, 16, &[(b"LIST", b"abc")], &[1, 0, 2, 0]);
        let wav = WavFile::parse(&image).unwrap();
        assert_eq!(wav.samples, &[1, 0, 2, 0]);
        assert_eq!(wav.header.frames(), 2);
    }

    #[test]
    fn test_rejects_compressed() {
        // IMA ADPCM
        let image = build_wav(0x0011, 1, 4, &[], &[0; 8]);
        let wav = WavFile::parse(&image).unwrap();
        let err = wav.header.ensure_embeddable().unwrap_err();
        assert!(matches!(err, Error::UnsupportedInput { .. }));
        assert!(err.to_string().contains("compressed"));
    }

    #[test]
    fn test_rejects_stereo() {
        let image = build_wav(FORMAT_PCM, 2, 16, &[], &[0; 8]);
        let err = WavFile::parse(&image)
            .unwrap()
            .header
            .ensure_embeddable()
            .unwrap_err();
        assert!(err.to_string().contains("2 channels"));
    }

    #[test]
    fn test_not_riff() {
        let err = WavFile::parse(b"OggS\0\0\0\0WAVEfmt ").unwrap_err();
        assert!(matches!(err, Error::InvalidWav { offset: 0, .. }));
    }

    #[test]
    fn test_truncated_data_chunk() {
        let mut image = build_wav(FORMAT_PCM, 1, 8, &[], &[1, 2, 3, 4]);
        image.truncate(image.len() - 2);
        assert!(matches!(
            WavFile::parse(&image),
            Err(Error::InvalidWav { .. })
        ));
    }

    #[test]
    fn test_missing_data_chunk() {
        let image = build_wav(FORMAT_PCM, 1, 8, &[], &[]);
        // Cut the (empty) data chunk header off entirely
        let image = &image[..image.len() - 8];
        let err = WavFile::parse(image).unwrap_err();
        assert!(err.to_string().contains("no data chunk"));
    }
}
