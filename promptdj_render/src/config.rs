// Render configuration: external program names, the default timbre bank, and
// time limits. Loaded as the `render` section of the CLI's JSON config file;
// every field is optional there.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// FluidSynth executable, looked up on `PATH` unless absolute.
    pub fluidsynth: String,
    /// FFmpeg executable, used only for MP3 output.
    pub ffmpeg: String,
    /// SoundFont used when a request names none.
    pub sound_font: PathBuf,
    pub sample_rate: u32,
    pub render_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
    /// LAME VBR quality passed as `-q:a` (0 best, 9 smallest).
    pub mp3_quality: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fluidsynth: "fluidsynth".into(),
            ffmpeg: "ffmpeg".into(),
            sound_font: PathBuf::from("sf2/MuseScore_General.sf2"),
            sample_rate: 44_100,
            render_timeout_secs: 120,
            transcode_timeout_secs: 60,
            mp3_quality: 3,
        }
    }
}

impl RenderConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}
