// Error taxonomy for the generative core.
//
// Three families, kept as separate types so callers can tell them apart:
// - `ParamError`: a request carried a value the generators refuse to run with
//   (zero bars, a tempo that cannot be expressed as a MIDI tempo, NaN density).
// - `ScoreError`: a score could not be decoded from, or encoded to, the
//   Standard MIDI File container.
// - `ConfigError`: an `EngineConfig` could not be loaded or holds tunables the
//   generators cannot use (empty duration set, negative weights).
//
// Unknown scale or drum-style identifiers are deliberately absent: they resolve
// to the default entry and only produce a `tracing::warn!`. Rendering failures
// live in `promptdj_render::RenderError`, never here.

use std::path::PathBuf;
use thiserror::Error;

/// Rejected request parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("tempo must be within {min}..={max} BPM, got {value}")]
    Tempo { value: u16, min: u16, max: u16 },

    #[error("bars must be within 1..={max}, got {value}")]
    Bars { value: u32, max: u32 },

    #[error("octave span must be within 1..={max}, got {value}")]
    OctaveSpan { value: u32, max: u32 },

    #[error("parameter '{name}' must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },
}

/// Failures crossing the Standard MIDI File boundary.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("input is not a valid MIDI file: {0}")]
    Decode(#[from] midly::Error),

    #[error("MIDI file contains no tracks")]
    NoTracks,

    #[error("failed to encode MIDI: {0}")]
    Encode(#[source] std::io::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures loading or validating engine tunables.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tunable '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
