// PromptDJ audio rendering
//
// Turns Standard MIDI File bytes into audio by driving external programs:
// FluidSynth synthesizes a WAV from a SoundFont, FFmpeg optionally re-encodes
// it as MP3. Failures here are always `RenderError`, never a generation error.
//
// Architecture:
// - renderer.rs: `Renderer` trait, `RenderRequest`, `FluidSynthRenderer`
// - transcode.rs: `AudioFormat`, `Transcoder` trait, `FfmpegMp3`
// - process.rs: subprocess execution with a deadline and captured stderr
// - wav.rs: WAV parsing/validation of rendered output (via `hound`)
// - config.rs: `RenderConfig` (program names, SoundFont, rate, timeouts)
// - error.rs: `RenderError`

pub mod config;
pub mod error;
mod process;
pub mod renderer;
pub mod transcode;
pub mod wav;

pub use config::RenderConfig;
pub use error::RenderError;
pub use renderer::{FluidSynthRenderer, RenderRequest, RenderedAudio, Renderer};
pub use transcode::{AudioFormat, FfmpegMp3, Transcoder};

/// Render `midi` and deliver it in `format`. WAV output skips the transcoder.
pub fn render_to(
    renderer: &dyn Renderer,
    transcoder: &dyn Transcoder,
    midi: &[u8],
    request: &RenderRequest,
    format: AudioFormat,
) -> Result<Vec<u8>, RenderError> {
    let audio = renderer.render(midi, request)?;
    if format == AudioFormat::Wav {
        return Ok(audio.wav);
    }
    debug_assert_eq!(transcoder.format(), format);
    transcoder.transcode(&audio.wav)
}
