// PromptDJ music engine
//
// Constrained-random symbolic music: monophonic melodies drawn as a weighted
// walk over a scale, drum patterns sequenced from 16-step templates, and two
// passes that rework existing Standard MIDI Files (continuation and
// humanization). Output is always a `Score` or SMF bytes; audio rendering lives
// in `promptdj_render`.
//
// Architecture:
// - scale.rs: Scale table (root + intervals) and the pitch resolver
// - drumkit.rs: GM percussion voices and the named 16-step drum templates
// - sampler.rs: Weighted discrete table with bisect-right lookup
// - params.rs: Request-boundary validation (tempo, bars, span, fractions)
// - config.rs: `EngineConfig` tunables, JSON loading, tunable checks
// - score.rs: Absolute-tick score model (`Score`, `ScoreTrack`, `NoteEvent`)
// - smf.rs: SMF encode/decode via `midly`, note-message classification
// - melody.rs: Melody generator (density, duration, step, leap, accent)
// - drums.rs: Drum sequencer (retention, ghost notes, swing)
// - continuation.rs: Tail-variation continuation of an existing file
// - humanize.rs: Gaussian timing/velocity jitter of an existing file
// - engine.rs: `Engine`, the one-stop facade over all of the above
// - error.rs: `ParamError`, `ScoreError`, `ConfigError`
//
// Every call seeds its own `promptdj_prng::SeqRng`; given a seed, all output is
// reproducible bit for bit.

pub mod config;
pub mod continuation;
pub mod drumkit;
pub mod drums;
pub mod engine;
pub mod error;
pub mod humanize;
pub mod melody;
pub mod params;
pub mod sampler;
pub mod scale;
pub mod score;
pub mod smf;

pub use config::EngineConfig;
pub use drums::DrumParams;
pub use engine::Engine;
pub use error::{ConfigError, ParamError, ScoreError};
pub use humanize::HumanizeParams;
pub use melody::MelodyParams;
pub use score::{NoteEvent, Score, ScoreTrack};
