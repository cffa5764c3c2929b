//! Typed audio presets that build engine commands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::supervisor::{EngineCommand, TranscodeError, TranscodeJob};

/// Target audio container and codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// Free Lossless Audio Codec (lossless)
    Flac,
    /// MPEG Audio Layer III
    Mp3,
    /// Advanced Audio Coding
    Aac,
    /// Ogg Vorbis
    OggVorbis,
    /// Opus (modern, efficient)
    Opus,
    /// WAVE (uncompressed)
    Wav,
}

impl AudioFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Mp3 => "mp3",
            Self::Aac => "m4a",
            Self::OggVorbis => "ogg",
            Self::Opus => "opus",
            Self::Wav => "wav",
        }
    }

    /// Returns the engine codec name for this format.
    pub fn codec(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Mp3 => "libmp3lame",
            Self::Aac => "aac",
            Self::OggVorbis => "libvorbis",
            Self::Opus => "libopus",
            Self::Wav => "pcm_s16le",
        }
    }

    /// Whether this format is lossless.
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Flac | Self::Wav)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = TranscodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flac" => Ok(Self::Flac),
            "mp3" => Ok(Self::Mp3),
            "aac" | "m4a" => Ok(Self::Aac),
            "ogg" | "vorbis" => Ok(Self::OggVorbis),
            "opus" => Ok(Self::Opus),
            "wav" => Ok(Self::Wav),
            other => Err(TranscodeError::invalid_command(format!(
                "unsupported audio format: {}",
                other
            ))),
        }
    }
}

/// Encoder settings for one audio transcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioPreset {
    /// Target audio format.
    pub format: AudioFormat,
    /// VBR quality (`-qscale:a`); takes precedence over bitrate.
    pub quality: Option<u8>,
    /// Target bitrate in kbps (lossy formats only).
    pub bitrate_kbps: Option<u32>,
    /// Target sample rate in Hz.
    pub sample_rate_hz: Option<u32>,
    /// Number of output channels.
    pub channels: Option<u8>,
}

impl Default for AudioPreset {
    /// VBR MP3 at quality 2.
    fn default() -> Self {
        Self {
            format: AudioFormat::Mp3,
            quality: Some(2),
            bitrate_kbps: None,
            sample_rate_hz: None,
            channels: None,
        }
    }
}

impl AudioPreset {
    /// A preset for `format` with no quality or bitrate settings.
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            quality: None,
            bitrate_kbps: None,
            sample_rate_hz: None,
            channels: None,
        }
    }

    /// Sets the VBR quality.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Sets the target bitrate.
    pub fn with_bitrate(mut self, kbps: u32) -> Self {
        self.bitrate_kbps = Some(kbps);
        self
    }

    /// Sets the sample rate.
    pub fn with_sample_rate(mut self, hz: u32) -> Self {
        self.sample_rate_hz = Some(hz);
        self
    }

    /// Sets the channel count.
    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Builds the caller argument list for `input_path` -> `output_path`.
    pub fn build_args(&self, input_path: &str, output_path: &str) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            input_path.to_string(),
            "-codec:a".to_string(),
            self.format.codec().to_string(),
        ];

        // Quality and bitrate only apply to lossy encoders
        if !self.format.is_lossless() {
            if let Some(quality) = self.quality {
                args.extend(["-qscale:a".to_string(), quality.to_string()]);
            } else if let Some(bitrate) = self.bitrate_kbps {
                args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
            }
        }

        if let Some(rate) = self.sample_rate_hz {
            args.extend(["-ar".to_string(), rate.to_string()]);
        }

        if let Some(channels) = self.channels {
            args.extend(["-ac".to_string(), channels.to_string()]);
        }

        args.push(output_path.to_string());
        args
    }

    /// Builds a complete job staging `input` at `input_path`.
    pub fn job(
        &self,
        input_path: &str,
        input: Vec<u8>,
        output_path: &str,
    ) -> Result<TranscodeJob, TranscodeError> {
        let command = EngineCommand::new(self.build_args(input_path, output_path))?;
        Ok(TranscodeJob::new(command, output_path).with_input(input_path, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset_is_vbr_mp3() {
        let args = AudioPreset::default().build_args("input.wav", "output.mp3");
        assert_eq!(
            args,
            vec![
                "-i",
                "input.wav",
                "-codec:a",
                "libmp3lame",
                "-qscale:a",
                "2",
                "output.mp3"
            ]
        );
    }

    #[test]
    fn test_bitrate_used_without_quality() {
        let args = AudioPreset::new(AudioFormat::OggVorbis)
            .with_bitrate(192)
            .with_sample_rate(48000)
            .with_channels(2)
            .build_args("in.flac", "out.ogg");

        assert!(args.contains(&"libvorbis".to_string()));
        assert!(args.contains(&"-b:a".to_string()));
        assert!(args.contains(&"192k".to_string()));
        assert!(args.contains(&"-ar".to_string()));
        assert!(args.contains(&"48000".to_string()));
        assert!(args.contains(&"-ac".to_string()));
        assert!(!args.contains(&"-qscale:a".to_string()));
    }

    #[test]
    fn test_lossless_ignores_quality_and_bitrate() {
        let args = AudioPreset::new(AudioFormat::Flac)
            .with_quality(2)
            .with_bitrate(320)
            .build_args("in.wav", "out.flac");

        assert!(args.contains(&"flac".to_string()));
        assert!(!args.contains(&"-qscale:a".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("MP3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("m4a".parse::<AudioFormat>().unwrap(), AudioFormat::Aac);
        assert!("midi".parse::<AudioFormat>().is_err());
        assert_eq!(AudioFormat::OggVorbis.to_string(), "ogg");
    }

    #[test]
    fn test_job_stages_input() {
        let job = AudioPreset::default()
            .job("input.wav", vec![0, 1], "output.mp3")
            .unwrap();
        assert_eq!(job.inputs.len(), 1);
        assert_eq!(job.inputs[0].path, "input.wav");
        assert_eq!(job.output_path, "output.mp3");
        assert_eq!(job.command.args().last().map(String::as_str), Some("output.mp3"));
    }
}
