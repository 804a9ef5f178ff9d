// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Mono 16-bit PCM WAV container for synthesized voices.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::{Result, SAMPLE_RATE};

/// Size of the RIFF/WAVE header preceding the sample data.
pub const HEADER_LEN: usize = 44;

/// Mono 16-bit PCM at the native rate.
const WAV_SPEC: WavSpec = WavSpec {
    channels: 1,
    sample_rate: SAMPLE_RATE,
    bits_per_sample: 16,
    sample_format: SampleFormat::Int,
};

/// A complete WAV file held in memory. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    bytes: Vec<u8>,
}

impl AudioBuffer {
    /// Encodes the samples behind a standard 44-byte header.
    pub(crate) fn from_samples(samples: &[i16]) -> Result<AudioBuffer> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_LEN + samples.len() * 2));
        let mut writer = WavWriter::new(&mut cursor, WAV_SPEC)?;
        let mut sample_writer = writer.get_i16_writer(samples.len() as u32);
        for sample in samples {
            sample_writer.write_sample(*sample);
        }
        sample_writer.flush()?;
        writer.finalize()?;

        Ok(AudioBuffer {
            bytes: cursor.into_inner(),
        })
    }

    /// The whole file, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total size of the file in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Number of 16-bit samples after the header.
    pub fn sample_count(&self) -> usize {
        (self.bytes.len() - HEADER_LEN) / 2
    }

    /// Playback length at the native rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.sample_count() as f64 / f64::from(SAMPLE_RATE))
    }

    /// Decodes the sample data.
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.bytes[HEADER_LEN..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Writes the file to disk.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("samples", &self.sample_count())
            .field("duration", &self.duration())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn test_header_layout() {
        let samples: [i16; 5] = [0, 1, -1, i16::MAX, i16::MIN];
        let buffer = AudioBuffer::from_samples(&samples).unwrap();
        let bytes = buffer.as_bytes();

        assert_eq!(bytes.len(), 44 + 10);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(bytes, 4), 36 + 10);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(bytes, 16), 16);
        assert_eq!(u16_at(bytes, 20), 1);
        assert_eq!(u16_at(bytes, 22), 1);
        assert_eq!(u32_at(bytes, 24), 44100);
        assert_eq!(u32_at(bytes, 28), 88200);
        assert_eq!(u16_at(bytes, 32), 2);
        assert_eq!(u16_at(bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(bytes, 40), 10);

        assert_eq!(buffer.samples().collect::<Vec<_>>(), samples.to_vec());
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AudioBuffer::from_samples(&[]).unwrap();
        assert_eq!(buffer.byte_len(), HEADER_LEN);
        assert_eq!(buffer.sample_count(), 0);
        assert_eq!(buffer.duration(), Duration::ZERO);
        assert_eq!(u32_at(buffer.as_bytes(), 4), 36);
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::from_samples(&vec![0; 22050]).unwrap();
        assert_eq!(buffer.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_write_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.wav");
        let buffer = AudioBuffer::from_samples(&[100, -100, 200]).unwrap();
        buffer.write_to(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, vec![100, -100, 200]);
    }
}
