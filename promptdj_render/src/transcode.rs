// Output formats and the FFmpeg MP3 encoder.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::process;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            other => Err(format!("unknown audio format '{other}' (expected wav or mp3)")),
        }
    }
}

/// Turns a WAV into another container.
pub trait Transcoder {
    fn format(&self) -> AudioFormat;
    fn transcode(&self, wav: &[u8]) -> Result<Vec<u8>, RenderError>;
}

/// MP3 through FFmpeg's LAME encoder.
#[derive(Clone, Debug)]
pub struct FfmpegMp3 {
    program: String,
    quality: u8,
    timeout: Duration,
}

impl FfmpegMp3 {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            program: config.ffmpeg.clone(),
            quality: config.mp3_quality.min(9),
            timeout: config.transcode_timeout(),
        }
    }

    pub fn args(wav: &Path, mp3: &Path, quality: u8) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            wav.into(),
            "-codec:a".into(),
            "libmp3lame".into(),
            "-q:a".into(),
            quality.to_string().into(),
            mp3.into(),
        ]
    }
}

impl Transcoder for FfmpegMp3 {
    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    fn transcode(&self, wav: &[u8]) -> Result<Vec<u8>, RenderError> {
        let dir = tempfile::Builder::new().prefix("promptdj-mp3").tempdir()?;
        let wav_path = dir.path().join("input.wav");
        let mp3_path = dir.path().join("output.mp3");
        std::fs::write(&wav_path, wav)?;

        let mut command = Command::new(&self.program);
        command.args(Self::args(&wav_path, &mp3_path, self.quality));
        process::run_checked(command, self.timeout)?;

        if !mp3_path.is_file() {
            return Err(RenderError::MissingOutput {
                program: self.program.clone(),
                path: mp3_path,
            });
        }
        let mp3 = std::fs::read(&mp3_path)?;
        tracing::info!(wav_bytes = wav.len(), mp3_bytes = mp3.len(), "encoded mp3");
        Ok(mp3)
    }
}
