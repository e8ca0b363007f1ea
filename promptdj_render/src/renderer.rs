// The `Renderer` seam and its FluidSynth implementation.
//
// FluidSynth runs as a subprocess in fast-render mode, reading a MIDI file and
// a SoundFont and writing a WAV. Everything it touches lives in a private
// temporary directory that is removed when the render returns, whatever the
// outcome.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::process;
use crate::wav::{self, WavInfo};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// What to render with.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    pub sample_rate: u32,
    /// SoundFont (`.sf2`) supplying the instrument timbres.
    pub bank: PathBuf,
}

impl RenderRequest {
    /// Request using the configured sample rate and default SoundFont.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            bank: config.sound_font.clone(),
        }
    }
}

/// A decoded, validated waveform.
#[derive(Clone, Debug)]
pub struct RenderedAudio {
    /// Complete WAV file contents.
    pub wav: Vec<u8>,
    pub info: WavInfo,
}

pub trait Renderer {
    fn render(&self, midi: &[u8], request: &RenderRequest) -> Result<RenderedAudio, RenderError>;
}

#[derive(Clone, Debug)]
pub struct FluidSynthRenderer {
    program: String,
    timeout: Duration,
}

impl FluidSynthRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            program: config.fluidsynth.clone(),
            timeout: config.render_timeout(),
        }
    }

    /// Command-line arguments for one render. `-F` has to precede the
    /// SoundFont or FluidSynth treats the output path as a MIDI file.
    pub fn args(midi: &Path, wav: &Path, bank: &Path, sample_rate: u32) -> Vec<OsString> {
        vec![
            "-ni".into(),
            "-F".into(),
            wav.into(),
            "-r".into(),
            sample_rate.to_string().into(),
            bank.into(),
            midi.into(),
        ]
    }
}

impl Renderer for FluidSynthRenderer {
    fn render(&self, midi: &[u8], request: &RenderRequest) -> Result<RenderedAudio, RenderError> {
        if !request.bank.is_file() {
            return Err(RenderError::MissingBank(request.bank.clone()));
        }
        // FluidSynth resolves relative paths against its own working directory.
        let bank = request.bank.canonicalize()?;

        let dir = tempfile::Builder::new().prefix("promptdj-render").tempdir()?;
        let midi_path = dir.path().join("input.mid");
        let wav_path = dir.path().join("output.wav");
        std::fs::write(&midi_path, midi)?;

        let mut command = Command::new(&self.program);
        command.args(Self::args(&midi_path, &wav_path, &bank, request.sample_rate));
        process::run_checked(command, self.timeout)?;

        if !wav_path.is_file() {
            return Err(RenderError::MissingOutput {
                program: self.program.clone(),
                path: wav_path,
            });
        }
        let wav = std::fs::read(&wav_path)?;
        let info = wav::inspect(&wav)?;
        tracing::info!(
            bank = %bank.display(),
            sample_rate = info.sample_rate,
            seconds = info.duration_secs(),
            bytes = wav.len(),
            "rendered"
        );
        Ok(RenderedAudio { wav, info })
    }
}
