// Render failures. Kept apart from the music crate's errors: everything here
// originates in an external program or the filesystem, never in generation.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("timbre bank not found: {}", .0.display())]
    MissingBank(PathBuf),

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("'{program}' exited cleanly but wrote nothing to {}", .path.display())]
    MissingOutput { program: String, path: PathBuf },

    #[error("'{program}' did not finish within {}s", .limit.as_secs())]
    Timeout { program: String, limit: Duration },

    #[error("rendered audio is not a readable WAV: {0}")]
    Waveform(#[from] hound::Error),

    #[error("render I/O error: {0}")]
    Io(#[from] std::io::Error),
}
