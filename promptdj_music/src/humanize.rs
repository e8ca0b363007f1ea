// Humanizer: Gaussian micro-timing and dynamics jitter on existing notes.
//
// Every note-on with velocity > 0 gets two normal draws, timing first then
// velocity. The timing offset is added to the event's *delta* (not its absolute
// tick), so a note only drifts relative to the event before it and events
// never swap places. Offsets are truncated toward zero; the delta is clamped
// to what an SMF variable-length quantity can hold and the velocity to 1..=127.
// Every other event passes through untouched.

use crate::config::HumanizeTuning;
use crate::error::{ConfigError, ScoreError};
use crate::smf::{self, clamp_delta};
use midly::num::u7;
use midly::{MidiMessage, Smf, TrackEvent, TrackEventKind};
use promptdj_prng::SeqRng;
use serde::{Deserialize, Serialize};

/// Parameters of one humanize request. Both amounts are nominally in [0, 1];
/// any real value is accepted (magnitude is used, non-finite acts as 0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizeParams {
    pub humanize: f64,
    pub velocity_variation: f64,
    pub seed: Option<u64>,
}

impl Default for HumanizeParams {
    fn default() -> Self {
        Self {
            humanize: 0.3,
            velocity_variation: 0.2,
            seed: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Humanizer {
    timing_scale: f64,
    velocity_scale: f64,
}

impl Humanizer {
    pub fn new(tuning: &HumanizeTuning) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("humanizer.timing_scale", tuning.timing_scale),
            ("humanizer.velocity_scale", tuning.velocity_scale),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("{value} is not a finite, non-negative scale"),
                ));
            }
        }
        Ok(Self {
            timing_scale: tuning.timing_scale,
            velocity_scale: tuning.velocity_scale,
        })
    }

    /// Decode `input`, humanize every track, and encode the result.
    pub fn apply_bytes(
        &self,
        input: &[u8],
        params: &HumanizeParams,
    ) -> Result<Vec<u8>, ScoreError> {
        let smf = smf::decode(input)?;
        let mut rng = SeqRng::from_seed(params.seed);
        smf::encode_smf(&self.apply(&smf, params, &mut rng))
    }

    /// Humanize a parsed file. Tracks are processed in order from one stream.
    pub fn apply<'a>(&self, input: &Smf<'a>, params: &HumanizeParams, rng: &mut SeqRng) -> Smf<'a> {
        let timing_sigma = magnitude(params.humanize) * self.timing_scale;
        let velocity_sigma = magnitude(params.velocity_variation) * self.velocity_scale;

        let mut out = Smf::new(input.header);
        let mut events = 0usize;
        for track in &input.tracks {
            events += track.len();
            let track: Vec<TrackEvent<'a>> = track
                .iter()
                .map(|event| {
                    jitter(event, timing_sigma, velocity_sigma, rng).unwrap_or(*event)
                })
                .collect();
            out.tracks.push(track);
        }
        tracing::debug!(timing_sigma, velocity_sigma, events, "humanized");
        out
    }
}

fn magnitude(x: f64) -> f64 {
    if x.is_finite() { x.abs() } else { 0.0 }
}

/// Jittered copy of a sounding note-on, `None` for anything else.
fn jitter<'a>(
    event: &TrackEvent<'a>,
    timing_sigma: f64,
    velocity_sigma: f64,
    rng: &mut SeqRng,
) -> Option<TrackEvent<'a>> {
    let TrackEventKind::Midi {
        channel,
        message: MidiMessage::NoteOn { key, vel },
    } = event.kind
    else {
        return None;
    };
    if vel.as_int() == 0 {
        return None;
    }

    // `as` saturates, so even an infinite sigma yields a finite shift.
    let shift = rng.gauss(0.0, timing_sigma) as i64;
    let swell = rng.gauss(0.0, velocity_sigma) as i64;

    let delta = i64::from(event.delta.as_int())
        .saturating_add(shift)
        .clamp(0, i64::from(u32::MAX));
    let vel = i64::from(vel.as_int()).saturating_add(swell).clamp(1, 127);

    Some(TrackEvent {
        delta: clamp_delta(delta as u32),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::NoteOn {
                key,
                vel: u7::new(vel as u8),
            },
        },
    })
}
