// Melody generation: a weighted random walk over scale degrees.
//
// The walk keeps one cursor, `(tick, scale_index)`, and advances it until the
// requested number of bars is filled:
//
// 1. A density draw decides between a note and a 16th-note rest.
// 2. A duration is drawn uniformly from the tuning's duration set and clipped
//    so the note ends no later than the last bar line.
// 3. A scale-degree step is drawn from the weighted step table; with
//    probability `variation` it is multiplied by a leap factor.
// 4. The index moves by the step and saturates at both ends of the pitch list.
// 5. Velocity is uniform in the tuning's range, with an occasional accent.
//
// The cursor always moves forward, so the loop terminates. All draws come from
// the `SeqRng` passed in, in the fixed order above, so the same seed and
// parameters always yield the same notes.

use crate::config::{MelodyTuning, check_channel, check_probability, check_velocity_range};
use crate::error::{ConfigError, ParamError};
use crate::params::{check_bars, check_octave_span, check_tempo, unit_fraction};
use crate::sampler::WeightedTable;
use crate::scale::{self, resolve_pitches};
use crate::score::{NoteEvent, Score, ScoreTrack, TICKS_PER_SIXTEENTH};
use promptdj_prng::SeqRng;
use serde::{Deserialize, Serialize};

/// Track name given to generated melodies.
pub const MELODY_TRACK_NAME: &str = "AI Melody";

/// Parameters of one melody request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyParams {
    pub tempo_bpm: u16,
    pub bars: u32,
    /// `None` draws a fresh, non-reproducible stream.
    pub seed: Option<u64>,
    /// Scale identifier; unknown names fall back to C major.
    pub scale: String,
    /// Probability that a candidate slot holds a note rather than a rest.
    pub density: f64,
    /// Probability that a step is stretched into a leap.
    pub variation: f64,
    pub octave_range: u32,
}

impl Default for MelodyParams {
    fn default() -> Self {
        Self {
            tempo_bpm: 120,
            bars: 8,
            seed: None,
            scale: scale::DEFAULT_SCALE.into(),
            density: 0.55,
            variation: 0.35,
            octave_range: 2,
        }
    }
}

/// Melody generator with its tunables validated and tables built.
#[derive(Clone, Debug)]
pub struct MelodyGenerator {
    center_octave: i32,
    durations: Vec<u32>,
    steps: WeightedTable<i32>,
    leap_factors: Vec<i32>,
    velocity: (u8, u8),
    accent_probability: f64,
    accent_boost: u8,
    channel: u8,
}

impl MelodyGenerator {
    pub fn new(tuning: &MelodyTuning) -> Result<Self, ConfigError> {
        if tuning.durations.is_empty() || tuning.durations.contains(&0) {
            return Err(ConfigError::invalid(
                "melody.durations",
                "need at least one duration, all greater than zero",
            ));
        }
        if tuning.leap_factors.is_empty() {
            return Err(ConfigError::invalid("melody.leap_factors", "must not be empty"));
        }
        if !(0..=10).contains(&tuning.center_octave) {
            return Err(ConfigError::invalid(
                "melody.center_octave",
                format!("{} is outside 0..=10", tuning.center_octave),
            ));
        }
        let steps = WeightedTable::new(&tuning.steps, &tuning.step_weights)
            .map_err(|e| ConfigError::invalid("melody.steps", e.to_string()))?;

        Ok(Self {
            center_octave: tuning.center_octave,
            durations: tuning.durations.clone(),
            steps,
            leap_factors: tuning.leap_factors.clone(),
            velocity: check_velocity_range(
                "melody.velocity",
                tuning.velocity_min,
                tuning.velocity_max,
            )?,
            accent_probability: check_probability(
                "melody.accent_probability",
                tuning.accent_probability,
            )?,
            accent_boost: tuning.accent_boost,
            channel: check_channel("melody.channel", tuning.channel)?,
        })
    }

    /// Generate with a stream seeded from `params.seed`.
    pub fn generate(&self, params: &MelodyParams) -> Result<Score, ParamError> {
        let mut rng = SeqRng::from_seed(params.seed);
        self.generate_with(params, &mut rng)
    }

    /// Generate drawing from a caller-owned stream.
    pub fn generate_with(
        &self,
        params: &MelodyParams,
        rng: &mut SeqRng,
    ) -> Result<Score, ParamError> {
        let tempo = check_tempo(params.tempo_bpm)?;
        let bars = check_bars(params.bars)?;
        let span = check_octave_span(params.octave_range)?;
        let density = unit_fraction("density", params.density)?;
        let variation = unit_fraction("variation", params.variation)?;

        let scale = scale::lookup(&params.scale).unwrap_or_else(|| {
            tracing::warn!(scale = %params.scale, "unknown scale, using {}", scale::DEFAULT_SCALE);
            scale::default_scale()
        });
        let pitches = resolve_pitches(scale, self.center_octave, span);

        let mut score = Score::new(tempo);
        let total_ticks = score.bar_ticks(bars);
        let mut track = ScoreTrack::new(MELODY_TRACK_NAME);
        track.notes = self.walk(&pitches, total_ticks, density, variation, rng);

        tracing::debug!(
            scale = scale.name,
            bars,
            notes = track.notes.len(),
            "generated melody"
        );
        score.tracks.push(track);
        Ok(score)
    }

    fn walk(
        &self,
        pitches: &[u8],
        total_ticks: u32,
        density: f64,
        variation: f64,
        rng: &mut SeqRng,
    ) -> Vec<NoteEvent> {
        let mut notes = Vec::new();
        if pitches.is_empty() {
            tracing::warn!("scale resolves to no playable pitches");
            return notes;
        }
        let last_index = pitches.len() as i64 - 1;
        let mut tick = 0;
        let mut index = (pitches.len() / 2) as i64;

        while tick < total_ticks {
            if rng.next_f64() > density {
                tick += TICKS_PER_SIXTEENTH;
                continue;
            }

            let Some(&drawn) = rng.choose(&self.durations) else {
                break;
            };
            let duration = drawn.min(total_ticks - tick);

            let mut step = self.steps.sample(rng);
            if rng.random_bool(variation) {
                step *= rng.choose(&self.leap_factors).copied().unwrap_or(1);
            }
            index = (index + step as i64).clamp(0, last_index);

            let mut velocity = rng.range_u8_inclusive(self.velocity.0, self.velocity.1);
            if rng.random_bool(self.accent_probability) {
                velocity = velocity.saturating_add(self.accent_boost).min(127);
            }

            notes.push(NoteEvent {
                onset: tick,
                pitch: pitches[index as usize],
                velocity,
                duration,
                channel: self.channel,
            });
            tick += duration;
        }
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> MelodyGenerator {
        MelodyGenerator::new(&MelodyTuning::default()).unwrap()
    }

    fn seeded(seed: u64) -> MelodyParams {
        MelodyParams {
            seed: Some(seed),
            ..MelodyParams::default()
        }
    }

    #[test]
    fn same_seed_same_melody() {
        let g = generator();
        let a = g.generate(&seeded(42)).unwrap();
        let b = g.generate(&seeded(42)).unwrap();
        assert_eq!(a, b);
        assert!(!a.tracks[0].notes.is_empty());
    }

    #[test]
    fn different_seeds_differ() {
        let g = generator();
        let a = g.generate(&seeded(1)).unwrap();
        let b = g.generate(&seeded(2)).unwrap();
        assert_ne!(a.tracks[0].notes, b.tracks[0].notes);
    }

    #[test]
    fn notes_stay_inside_the_piece_and_the_scale() {
        let g = generator();
        for seed in 0..50 {
            let params = MelodyParams {
                seed: Some(seed),
                scale: "E_minor".into(),
                bars: 4,
                variation: 0.9,
                octave_range: 3,
                ..MelodyParams::default()
            };
            let score = g.generate(&params).unwrap();
            let total = score.bar_ticks(4);
            let e_minor = scale::lookup("E_minor").unwrap();
            for n in &score.tracks[0].notes {
                assert!(n.onset < total, "onset {} past {total}", n.onset);
                assert!(n.end() <= total, "note runs past the last bar");
                assert!(n.duration > 0);
                assert!(n.pitch <= 127);
                assert!(e_minor.contains(n.pitch));
                assert!((60..=120).contains(&n.velocity));
            }
        }
    }

    #[test]
    fn notes_never_overlap() {
        let score = generator().generate(&seeded(9)).unwrap();
        let notes = &score.tracks[0].notes;
        for pair in notes.windows(2) {
            assert!(pair[0].end() <= pair[1].onset);
        }
    }

    #[test]
    fn full_density_fills_every_tick() {
        let params = MelodyParams {
            seed: Some(42),
            bars: 1,
            density: 1.0,
            variation: 0.0,
            octave_range: 1,
            ..MelodyParams::default()
        };
        let score = generator().generate(&params).unwrap();
        let notes = &score.tracks[0].notes;
        assert_eq!(notes[0].onset, 0);
        for pair in notes.windows(2) {
            assert_eq!(pair[0].end(), pair[1].onset, "no rests at density 1");
        }
        assert_eq!(notes.last().map(NoteEvent::end), Some(1920));
        // Single octave of C major centered on octave 4.
        assert!(notes.iter().all(|n| (48..=59).contains(&n.pitch)));
    }

    #[test]
    fn zero_variation_keeps_steps_within_three_degrees() {
        let params = MelodyParams {
            seed: Some(5),
            bars: 16,
            density: 1.0,
            variation: 0.0,
            octave_range: 4,
            ..MelodyParams::default()
        };
        let score = generator().generate(&params).unwrap();
        let pitches = resolve_pitches(scale::default_scale(), 4, 4);
        let degrees: Vec<i64> = score.tracks[0]
            .notes
            .iter()
            .map(|n| pitches.iter().position(|&p| p == n.pitch).unwrap() as i64)
            .collect();
        for pair in degrees.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= 3);
        }
    }

    #[test]
    fn zero_density_is_silent() {
        let params = MelodyParams {
            seed: Some(3),
            density: 0.0,
            ..MelodyParams::default()
        };
        let score = generator().generate(&params).unwrap();
        assert!(score.tracks[0].notes.is_empty());
    }

    #[test]
    fn unknown_scale_falls_back_to_c_major() {
        let g = generator();
        let unknown = g
            .generate(&MelodyParams {
                scale: "Q_phrygian".into(),
                ..seeded(11)
            })
            .unwrap();
        let c_major = g.generate(&seeded(11)).unwrap();
        assert_eq!(unknown, c_major);
    }

    #[test]
    fn out_of_range_fractions_are_clamped() {
        let g = generator();
        let clamped = g
            .generate(&MelodyParams {
                density: 3.0,
                variation: -1.0,
                ..seeded(8)
            })
            .unwrap();
        let exact = g
            .generate(&MelodyParams {
                density: 1.0,
                variation: 0.0,
                ..seeded(8)
            })
            .unwrap();
        assert_eq!(clamped, exact);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let g = generator();
        let bad_bars = MelodyParams { bars: 0, ..seeded(1) };
        assert!(matches!(g.generate(&bad_bars), Err(ParamError::Bars { .. })));
        let bad_tempo = MelodyParams { tempo_bpm: 0, ..seeded(1) };
        assert!(matches!(g.generate(&bad_tempo), Err(ParamError::Tempo { .. })));
        let bad_span = MelodyParams { octave_range: 0, ..seeded(1) };
        assert!(matches!(g.generate(&bad_span), Err(ParamError::OctaveSpan { .. })));
        let nan = MelodyParams { density: f64::NAN, ..seeded(1) };
        assert!(matches!(g.generate(&nan), Err(ParamError::NotFinite { name: "density", .. })));
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        let empty = MelodyTuning {
            durations: vec![],
            ..MelodyTuning::default()
        };
        assert!(MelodyGenerator::new(&empty).is_err());
        let mismatched = MelodyTuning {
            step_weights: vec![1.0],
            ..MelodyTuning::default()
        };
        assert!(MelodyGenerator::new(&mismatched).is_err());
        let loud = MelodyTuning {
            velocity_max: 200,
            ..MelodyTuning::default()
        };
        assert!(MelodyGenerator::new(&loud).is_err());
    }

    #[test]
    fn unreachable_pitch_range_yields_silence() {
        let tuning = MelodyTuning {
            center_octave: 10,
            ..MelodyTuning::default()
        };
        let g = MelodyGenerator::new(&tuning).unwrap();
        let score = g
            .generate(&MelodyParams {
                scale: "B_minor".into(),
                octave_range: 1,
                ..seeded(4)
            })
            .unwrap();
        assert!(score.tracks[0].notes.is_empty());
    }
}
