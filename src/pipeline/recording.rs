//! Recording accumulated on the main thread
//!
//! Concatenates relayed blocks and exports them as 16-bit mono WAV.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Recording errors
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// Mono samples captured at a known sample rate
#[derive(Debug, Clone)]
pub struct Recording {
    sample_rate: u32,
    samples: Vec<f32>,
    blocks: usize,
}

impl Recording {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
            blocks: 0,
        }
    }

    /// Append one relayed block
    pub fn push_block(&mut self, block: &[f32]) {
        self.samples.extend_from_slice(block);
        self.blocks += 1;
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of blocks appended
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the recorded audio
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Highest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Encode as 16-bit PCM mono WAV
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, RecordingError> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write a 16-bit PCM mono WAV file
    pub fn write_wav(&self, path: impl AsRef<Path>) -> Result<(), RecordingError> {
        let file = std::fs::File::create(path.as_ref()).map_err(hound::Error::IoError)?;
        self.write_to(std::io::BufWriter::new(file))?;
        tracing::info!(
            "Recording written: {} ({:.1}s)",
            path.as_ref().display(),
            self.duration().as_secs_f32()
        );
        Ok(())
    }

    fn write_to<W>(&self, writer: W) -> Result<(), RecordingError>
    where
        W: std::io::Write + std::io::Seek,
    {
        if self.sample_rate == 0 {
            return Err(RecordingError::InvalidSampleRate(self.sample_rate));
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::new(writer, spec)?;
        for &sample in &self.samples {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize()?;
        Ok(())
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}
