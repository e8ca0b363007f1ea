// Data-driven engine tunables.
//
// Every statistical constant the generators use lives in `EngineConfig`,
// grouped per component. Defaults reproduce the stock behaviour; a JSON file
// may override any subset of fields (`#[serde(default)]` on every struct).
// Tunables are validated when the generators are built (see
// `MelodyGenerator::new` and friends), not here, so a config can be loaded,
// inspected, and reported on before anything rejects it.

use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All engine tunables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub melody: MelodyTuning,
    pub drums: DrumTuning,
    pub continuation: ContinuationTuning,
    pub humanizer: HumanizeTuning,
}

/// Parse a JSON config document. Missing fields take their defaults.
pub fn parse_json<T: DeserializeOwned>(json: &str) -> Result<T, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a JSON config file. The CLI loads its whole `--config`
/// document (engine and render sections) through this.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&data)
}

/// Melody walk constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyTuning {
    /// Octave the pitch range is centered on (`octave * 12 + root`).
    pub center_octave: i32,
    /// Candidate note lengths in ticks, drawn uniformly.
    pub durations: Vec<u32>,
    /// Scale-degree steps and their relative weights.
    pub steps: Vec<i32>,
    pub step_weights: Vec<f64>,
    /// Multipliers applied to a step when the variation draw fires.
    pub leap_factors: Vec<i32>,
    pub velocity_min: u8,
    pub velocity_max: u8,
    pub accent_probability: f64,
    pub accent_boost: u8,
    pub channel: u8,
}

impl Default for MelodyTuning {
    fn default() -> Self {
        Self {
            center_octave: 4,
            // 16th, 8th, quarter, dotted quarter, half at 480 ticks per beat.
            durations: vec![120, 240, 480, 720, 960],
            steps: vec![-3, -2, -1, 0, 1, 2, 3],
            step_weights: vec![0.05, 0.15, 0.25, 0.10, 0.25, 0.15, 0.05],
            leap_factors: vec![1, 2],
            velocity_min: 60,
            velocity_max: 100,
            accent_probability: 0.1,
            accent_boost: 20,
            channel: 0,
        }
    }
}

/// Drum sequencer constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrumTuning {
    /// Probability that an active template step actually sounds.
    pub hit_probability: f64,
    pub velocity_min: u8,
    pub velocity_max: u8,
    /// Probability that a sounding hit is replaced by a ghost note.
    pub ghost_probability: f64,
    pub ghost_velocity_min: u8,
    pub ghost_velocity_max: u8,
    /// Note length of every hit, in ticks.
    pub hit_ticks: u32,
    pub channel: u8,
}

impl Default for DrumTuning {
    fn default() -> Self {
        Self {
            hit_probability: 0.95,
            velocity_min: 80,
            velocity_max: 110,
            ghost_probability: 0.1,
            ghost_velocity_min: 40,
            ghost_velocity_max: 60,
            hit_ticks: 60,
            channel: 9,
        }
    }
}

/// Continuation pass constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuationTuning {
    /// Tracks with this many note messages or fewer are copied unchanged.
    pub min_note_messages: usize,
    /// Share of a track's note messages (by count) that forms the tail.
    pub tail_fraction: f64,
    pub pitch_offsets: Vec<i32>,
    pub pitch_offset_weights: Vec<f64>,
    /// Velocity moves by a uniform integer in `-jitter..=jitter`.
    pub velocity_jitter: u8,
}

impl Default for ContinuationTuning {
    fn default() -> Self {
        Self {
            min_note_messages: 20,
            tail_fraction: 0.25,
            pitch_offsets: vec![-2, -1, 0, 1, 2],
            // Holding the pitch is twice as likely as any move.
            pitch_offset_weights: vec![1.0, 1.0, 2.0, 1.0, 1.0],
            velocity_jitter: 10,
        }
    }
}

/// Humanizer constants: standard deviations per unit of request parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizeTuning {
    /// Ticks of timing sigma per unit of `humanize`.
    pub timing_scale: f64,
    /// Velocity steps of sigma per unit of `velocity_variation`.
    pub velocity_scale: f64,
}

impl Default for HumanizeTuning {
    fn default() -> Self {
        Self {
            timing_scale: 20.0,
            velocity_scale: 15.0,
        }
    }
}

/// Shared checks used by the generator constructors.
pub(crate) fn check_probability(field: &'static str, p: f64) -> Result<f64, ConfigError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(ConfigError::invalid(field, format!("{p} is not a probability")))
    }
}

pub(crate) fn check_velocity_range(
    field: &'static str,
    min: u8,
    max: u8,
) -> Result<(u8, u8), ConfigError> {
    if min == 0 || min > max || max > 127 {
        return Err(ConfigError::invalid(
            field,
            format!("{min}..={max} is not within 1..=127"),
        ));
    }
    Ok((min, max))
}

pub(crate) fn check_channel(field: &'static str, channel: u8) -> Result<u8, ConfigError> {
    if channel > 15 {
        return Err(ConfigError::invalid(field, format!("MIDI channel {channel} > 15")));
    }
    Ok(channel)
}
