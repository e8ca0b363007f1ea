// Engine: every generator and pass built once from one `EngineConfig`.
//
// The engine holds no randomness and no mutable state. Each call seeds its own
// `SeqRng`, so concurrent calls never share a stream and the same seed always
// reproduces the same output.

use crate::config::EngineConfig;
use crate::continuation::Continuation;
use crate::drums::{DrumParams, DrumSequencer};
use crate::error::{ConfigError, ParamError, ScoreError};
use crate::humanize::{HumanizeParams, Humanizer};
use crate::melody::{MelodyGenerator, MelodyParams};
use crate::score::Score;
use promptdj_prng::SeqRng;

#[derive(Clone, Debug)]
pub struct Engine {
    melody: MelodyGenerator,
    drums: DrumSequencer,
    continuation: Continuation,
    humanizer: Humanizer,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            melody: MelodyGenerator::new(&config.melody)?,
            drums: DrumSequencer::new(&config.drums)?,
            continuation: Continuation::new(&config.continuation)?,
            humanizer: Humanizer::new(&config.humanizer)?,
        })
    }

    pub fn melody(&self, params: &MelodyParams) -> Result<Score, ParamError> {
        self.melody.generate(params)
    }

    pub fn drums(&self, params: &DrumParams) -> Result<Score, ParamError> {
        self.drums.generate(params)
    }

    /// Melody and drums as one two-track score sharing the melody's tempo.
    ///
    /// Both generators draw from a single stream seeded by `seed`; the
    /// per-request seeds inside `melody` and `drums` are ignored.
    pub fn arrange(
        &self,
        melody: &MelodyParams,
        drums: &DrumParams,
        seed: Option<u64>,
    ) -> Result<Score, ParamError> {
        let mut rng = SeqRng::from_seed(seed);
        let mut score = self.melody.generate_with(melody, &mut rng)?;
        let drums = DrumParams {
            tempo_bpm: melody.tempo_bpm,
            ..drums.clone()
        };
        let beat = self.drums.generate_with(&drums, &mut rng)?;
        score.tracks.extend(beat.tracks);
        Ok(score)
    }

    /// Append a varied copy of each track's tail to a MIDI file.
    pub fn continue_midi(&self, input: &[u8], seed: Option<u64>) -> Result<Vec<u8>, ScoreError> {
        self.continuation.apply_bytes(input, seed)
    }

    /// Jitter the timing and velocity of every note in a MIDI file.
    pub fn humanize_midi(
        &self,
        input: &[u8],
        params: &HumanizeParams,
    ) -> Result<Vec<u8>, ScoreError> {
        self.humanizer.apply_bytes(input, params)
    }
}
