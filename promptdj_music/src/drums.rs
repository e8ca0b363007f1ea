// Drum pattern sequencing from rhythmic templates.
//
// For every bar and each of its 16 steps the sequencer computes the step's
// tick (`(bar * 16 + step) * ticks_per_16th`), delays odd steps by the swing
// offset, and asks every lane of the template whether it fires on that step.
// A firing lane becomes a hit with probability `hit_probability`; a hit draws a
// normal velocity and, with probability `ghost_probability`, is replaced by a
// quiet ghost note. Every hit has the same short, fixed length.
//
// Hits are produced in (bar, step, lane) order, which is already sorted by
// onset because the swing offset never exceeds half a step. The serializer's
// stable tick sort then interleaves note-offs; simultaneous hits keep lane
// order and are not re-ranked by voice.

use crate::config::{DrumTuning, check_channel, check_probability, check_velocity_range};
use crate::drumkit::{self, DrumTemplate, STEPS_PER_BAR};
use crate::error::{ConfigError, ParamError};
use crate::params::{check_bars, check_tempo, unit_fraction};
use crate::score::{NoteEvent, Score, ScoreTrack, TICKS_PER_SIXTEENTH};
use promptdj_prng::SeqRng;
use serde::{Deserialize, Serialize};

/// Track name given to generated drum patterns.
pub const DRUM_TRACK_NAME: &str = "AI Drums";

/// Parameters of one drum request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrumParams {
    pub tempo_bpm: u16,
    pub bars: u32,
    pub seed: Option<u64>,
    /// Template name; unknown names fall back to `basic`.
    pub style: String,
    /// 0 = straight 16ths, 1 = odd 16ths delayed by half a 16th.
    pub swing: f64,
}

impl Default for DrumParams {
    fn default() -> Self {
        Self {
            tempo_bpm: 120,
            bars: 4,
            seed: None,
            style: drumkit::DEFAULT_STYLE.into(),
            swing: 0.0,
        }
    }
}

/// Delay applied to odd-indexed steps: `round(ticks_per_16th * swing / 2)`,
/// at least one tick whenever `swing > 0`.
pub fn swing_offset(ticks_per_16th: u32, swing: f64) -> u32 {
    if swing <= 0.0 {
        return 0;
    }
    let offset = (ticks_per_16th as f64 * swing * 0.5).round() as u32;
    offset.max(1)
}

/// Drum sequencer with validated tunables.
#[derive(Clone, Debug)]
pub struct DrumSequencer {
    hit_probability: f64,
    velocity: (u8, u8),
    ghost_probability: f64,
    ghost_velocity: (u8, u8),
    hit_ticks: u32,
    channel: u8,
}

impl DrumSequencer {
    pub fn new(tuning: &DrumTuning) -> Result<Self, ConfigError> {
        if tuning.hit_ticks == 0 {
            return Err(ConfigError::invalid("drums.hit_ticks", "must be greater than zero"));
        }
        Ok(Self {
            hit_probability: check_probability("drums.hit_probability", tuning.hit_probability)?,
            velocity: check_velocity_range(
                "drums.velocity",
                tuning.velocity_min,
                tuning.velocity_max,
            )?,
            ghost_probability: check_probability(
                "drums.ghost_probability",
                tuning.ghost_probability,
            )?,
            ghost_velocity: check_velocity_range(
                "drums.ghost_velocity",
                tuning.ghost_velocity_min,
                tuning.ghost_velocity_max,
            )?,
            hit_ticks: tuning.hit_ticks,
            channel: check_channel("drums.channel", tuning.channel)?,
        })
    }

    /// Generate with a stream seeded from `params.seed`.
    pub fn generate(&self, params: &DrumParams) -> Result<Score, ParamError> {
        let mut rng = SeqRng::from_seed(params.seed);
        self.generate_with(params, &mut rng)
    }

    /// Generate drawing from a caller-owned stream.
    pub fn generate_with(
        &self,
        params: &DrumParams,
        rng: &mut SeqRng,
    ) -> Result<Score, ParamError> {
        let tempo = check_tempo(params.tempo_bpm)?;
        let bars = check_bars(params.bars)?;
        let swing = unit_fraction("swing", params.swing)?;

        let template = drumkit::lookup_template(&params.style).unwrap_or_else(|| {
            tracing::warn!(
                style = %params.style,
                "unknown drum style, using {}",
                drumkit::DEFAULT_STYLE
            );
            drumkit::default_template()
        });

        let mut score = Score::new(tempo);
        let mut track = ScoreTrack::new(DRUM_TRACK_NAME);
        track.notes = self.sequence(template, bars, swing, rng);

        tracing::debug!(
            style = template.name,
            bars,
            swing,
            hits = track.notes.len(),
            "generated drums"
        );
        score.tracks.push(track);
        Ok(score)
    }

    fn sequence(
        &self,
        template: &DrumTemplate,
        bars: u32,
        swing: f64,
        rng: &mut SeqRng,
    ) -> Vec<NoteEvent> {
        let offset = swing_offset(TICKS_PER_SIXTEENTH, swing);
        let mut hits = Vec::new();

        for bar in 0..bars {
            for step in 0..STEPS_PER_BAR {
                let mut tick = (bar * STEPS_PER_BAR as u32 + step as u32) * TICKS_PER_SIXTEENTH;
                if step % 2 == 1 {
                    tick += offset;
                }

                for lane in template.lanes.iter().filter(|l| l.is_active(step)) {
                    if !rng.random_bool(self.hit_probability) {
                        continue;
                    }
                    let mut velocity = rng.range_u8_inclusive(self.velocity.0, self.velocity.1);
                    if rng.random_bool(self.ghost_probability) {
                        let (lo, hi) = self.ghost_velocity;
                        velocity = rng.range_u8_inclusive(lo, hi);
                    }
                    hits.push(NoteEvent {
                        onset: tick,
                        pitch: lane.voice.pitch(),
                        velocity,
                        duration: self.hit_ticks,
                        channel: self.channel,
                    });
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drumkit::DrumVoice;

    fn sequencer() -> DrumSequencer {
        DrumSequencer::new(&DrumTuning::default()).unwrap()
    }

    /// Every active step sounds and none is a ghost.
    fn mechanical() -> DrumSequencer {
        DrumSequencer::new(&DrumTuning {
            hit_probability: 1.0,
            ghost_probability: 0.0,
            ..DrumTuning::default()
        })
        .unwrap()
    }

    fn params(style: &str, bars: u32, swing: f64) -> DrumParams {
        DrumParams {
            bars,
            seed: Some(42),
            style: style.into(),
            swing,
            ..DrumParams::default()
        }
    }

    #[test]
    fn swing_offset_rounds_and_never_vanishes() {
        assert_eq!(swing_offset(120, 0.0), 0);
        assert_eq!(swing_offset(120, 1.0), 60);
        assert_eq!(swing_offset(120, 0.5), 30);
        assert_eq!(swing_offset(120, 0.001), 1);
    }

    #[test]
    fn same_seed_same_pattern() {
        let s = sequencer();
        let a = s.generate(&params("funk", 4, 0.3)).unwrap();
        let b = s.generate(&params("funk", 4, 0.3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn straight_hits_sit_on_the_sixteenth_grid() {
        let score = sequencer().generate(&params("trap", 2, 0.0)).unwrap();
        for hit in &score.tracks[0].notes {
            assert_eq!(hit.onset % TICKS_PER_SIXTEENTH, 0);
            assert_eq!(hit.duration, 60);
            assert_eq!(hit.channel, 9);
        }
    }

    #[test]
    fn swing_delays_only_odd_steps() {
        let s = mechanical();
        let straight = s.generate(&params("funk", 1, 0.0)).unwrap();
        let swung = s.generate(&params("funk", 1, 0.6)).unwrap();
        let straight = &straight.tracks[0].notes;
        let swung = &swung.tracks[0].notes;
        assert_eq!(straight.len(), swung.len());
        for (a, b) in straight.iter().zip(swung) {
            let step = a.onset / TICKS_PER_SIXTEENTH;
            if step % 2 == 1 {
                assert_eq!(b.onset, a.onset + 36);
            } else {
                assert_eq!(b.onset, a.onset);
            }
        }
    }

    #[test]
    fn mechanical_basic_matches_template_grid() {
        let score = mechanical().generate(&params("basic", 2, 0.0)).unwrap();
        let hits = &score.tracks[0].notes;
        let template = drumkit::lookup_template("basic").unwrap();

        let mut expected = Vec::new();
        for bar in 0..2u32 {
            for step in 0..STEPS_PER_BAR {
                for lane in template.lanes.iter().filter(|l| l.is_active(step)) {
                    expected.push(((bar * 16 + step as u32) * 120, lane.voice.pitch()));
                }
            }
        }
        let actual: Vec<(u32, u8)> = hits.iter().map(|h| (h.onset, h.pitch)).collect();
        assert_eq!(actual, expected);
        // 4 kicks + 2 snares + 8 hats per bar.
        assert_eq!(hits.len(), 28);
        assert!(hits.iter().all(|h| (80..=110).contains(&h.velocity)));
    }

    #[test]
    fn ghosts_are_quiet() {
        let s = DrumSequencer::new(&DrumTuning {
            hit_probability: 1.0,
            ghost_probability: 1.0,
            ..DrumTuning::default()
        })
        .unwrap();
        let score = s.generate(&params("dnb", 1, 0.0)).unwrap();
        assert!(score.tracks[0].notes.iter().all(|h| (40..=60).contains(&h.velocity)));
    }

    #[test]
    fn retention_drops_some_hits() {
        let s = sequencer();
        let full = mechanical().generate(&params("electronic", 32, 0.0)).unwrap();
        let thinned = s.generate(&params("electronic", 32, 0.0)).unwrap();
        let ratio = thinned.note_count() as f64 / full.note_count() as f64;
        assert!((0.9..1.0).contains(&ratio), "retention ratio {ratio}");
    }

    #[test]
    fn unknown_style_falls_back_to_basic() {
        let s = sequencer();
        let unknown = s.generate(&params("polka", 2, 0.0)).unwrap();
        let basic = s.generate(&params("basic", 2, 0.0)).unwrap();
        assert_eq!(unknown, basic);
        assert!(unknown.tracks[0]
            .notes
            .iter()
            .all(|h| DrumVoice::from_pitch(h.pitch).is_some()));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let s = sequencer();
        assert!(matches!(
            s.generate(&DrumParams { bars: 0, ..params("basic", 1, 0.0) }),
            Err(ParamError::Bars { .. })
        ));
        assert!(matches!(
            s.generate(&params("basic", 1, f64::NAN)),
            Err(ParamError::NotFinite { name: "swing", .. })
        ));
    }
}
