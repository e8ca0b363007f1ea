// Subcommand arguments and handlers.
//
// Every handler builds an `Engine` from the loaded config, does one thing, and
// reports what it wrote on stdout. Option values left unset on the command line
// fall back to the library's parameter defaults, so the defaults live in one
// place.

use anyhow::{Context, Result};
use clap::Args;
use promptdj_music::config;
use promptdj_music::drumkit::{self, DrumVoice};
use promptdj_music::{
    DrumParams, Engine, EngineConfig, HumanizeParams, MelodyParams, Score, scale, smf,
};
use promptdj_render::{
    AudioFormat, FfmpegMp3, FluidSynthRenderer, RenderConfig, RenderRequest, render_to,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of the `--config` file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let loaded: Self = config::load_json(path)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(loaded)
    }
}

#[derive(Args, Debug)]
pub struct CommonOpts {
    /// Tempo in beats per minute
    #[arg(long)]
    tempo: Option<u16>,

    /// Length in 4/4 bars
    #[arg(long)]
    bars: Option<u32>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MelodyOpts {
    /// Scale identifier (see `promptdj list`)
    #[arg(long)]
    scale: Option<String>,

    /// Probability that a slot holds a note, 0..1
    #[arg(long)]
    density: Option<f64>,

    /// Probability of a leap, 0..1
    #[arg(long)]
    variation: Option<f64>,

    /// Number of octaves the melody may span
    #[arg(long)]
    octave_range: Option<u32>,
}

#[derive(Args, Debug)]
pub struct DrumOpts {
    /// Drum style (see `promptdj list`)
    #[arg(long)]
    style: Option<String>,

    /// Swing amount, 0..1
    #[arg(long)]
    swing: Option<f64>,
}

#[derive(Args, Debug)]
pub struct AudioOpts {
    /// Also render the MIDI file to audio
    #[arg(long)]
    render: bool,

    /// Audio format for rendering
    #[arg(long, default_value_t = AudioFormat::Wav)]
    format: AudioFormat,

    /// SoundFont to render with instead of the configured one
    #[arg(long)]
    bank: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MelodyArgs {
    #[command(flatten)]
    common: CommonOpts,
    #[command(flatten)]
    melody: MelodyOpts,
    #[arg(short, long, default_value = "melody.mid")]
    output: PathBuf,
    #[command(flatten)]
    audio: AudioOpts,
}

#[derive(Args, Debug)]
pub struct DrumArgs {
    #[command(flatten)]
    common: CommonOpts,
    #[command(flatten)]
    drums: DrumOpts,
    #[arg(short, long, default_value = "drums.mid")]
    output: PathBuf,
    #[command(flatten)]
    audio: AudioOpts,
}

#[derive(Args, Debug)]
pub struct BothArgs {
    #[command(flatten)]
    common: CommonOpts,
    #[command(flatten)]
    melody: MelodyOpts,
    #[command(flatten)]
    drums: DrumOpts,
    #[arg(short, long, default_value = "arrangement.mid")]
    output: PathBuf,
    #[command(flatten)]
    audio: AudioOpts,
}

#[derive(Args, Debug)]
pub struct ContinueArgs {
    /// MIDI file to extend
    input: PathBuf,

    #[arg(long)]
    seed: Option<u64>,

    /// Defaults to `<input>_continued.mid`
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    audio: AudioOpts,
}

#[derive(Args, Debug)]
pub struct HumanizeArgs {
    /// MIDI file to humanize
    input: PathBuf,

    /// Timing looseness, 0..1
    #[arg(long)]
    amount: Option<f64>,

    /// Dynamics looseness, 0..1
    #[arg(long)]
    velocity_variation: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Defaults to `<input>_humanized.mid`
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    audio: AudioOpts,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// MIDI file to render
    input: PathBuf,

    #[arg(long, default_value_t = AudioFormat::Wav)]
    format: AudioFormat,

    /// SoundFont to render with instead of the configured one
    #[arg(long)]
    bank: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Defaults to the input path with the format's extension
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl CommonOpts {
    fn melody(&self, opts: &MelodyOpts) -> MelodyParams {
        let d = MelodyParams::default();
        MelodyParams {
            tempo_bpm: self.tempo.unwrap_or(d.tempo_bpm),
            bars: self.bars.unwrap_or(d.bars),
            seed: self.seed,
            scale: opts.scale.clone().unwrap_or(d.scale),
            density: opts.density.unwrap_or(d.density),
            variation: opts.variation.unwrap_or(d.variation),
            octave_range: opts.octave_range.unwrap_or(d.octave_range),
        }
    }

    fn drums(&self, opts: &DrumOpts) -> DrumParams {
        let d = DrumParams::default();
        DrumParams {
            tempo_bpm: self.tempo.unwrap_or(d.tempo_bpm),
            bars: self.bars.unwrap_or(d.bars),
            seed: self.seed,
            style: opts.style.clone().unwrap_or(d.style),
            swing: opts.swing.unwrap_or(d.swing),
        }
    }
}

pub fn melody(config: &AppConfig, args: MelodyArgs) -> Result<()> {
    let engine = Engine::new(&config.engine)?;
    let score = engine.melody(&args.common.melody(&args.melody))?;
    write_generated(config, &score, &args.output, &args.audio)
}

pub fn drums(config: &AppConfig, args: DrumArgs) -> Result<()> {
    let engine = Engine::new(&config.engine)?;
    let score = engine.drums(&args.common.drums(&args.drums))?;
    write_generated(config, &score, &args.output, &args.audio)
}

pub fn both(config: &AppConfig, args: BothArgs) -> Result<()> {
    let engine = Engine::new(&config.engine)?;
    let melody = args.common.melody(&args.melody);
    let drums = args.common.drums(&args.drums);
    let score = engine.arrange(&melody, &drums, args.common.seed)?;
    write_generated(config, &score, &args.output, &args.audio)
}

pub fn continue_file(config: &AppConfig, args: ContinueArgs) -> Result<()> {
    let engine = Engine::new(&config.engine)?;
    let input = read_midi(&args.input)?;
    let output = args
        .output
        .unwrap_or_else(|| sibling(&args.input, "continued"));
    let bytes = engine
        .continue_midi(&input, args.seed)
        .with_context(|| format!("cannot continue {}", args.input.display()))?;
    write_transformed(config, &bytes, &output, &args.audio)
}

pub fn humanize(config: &AppConfig, args: HumanizeArgs) -> Result<()> {
    let engine = Engine::new(&config.engine)?;
    let input = read_midi(&args.input)?;
    let d = HumanizeParams::default();
    let params = HumanizeParams {
        humanize: args.amount.unwrap_or(d.humanize),
        velocity_variation: args.velocity_variation.unwrap_or(d.velocity_variation),
        seed: args.seed,
    };
    let output = args
        .output
        .unwrap_or_else(|| sibling(&args.input, "humanized"));
    let bytes = engine
        .humanize_midi(&input, &params)
        .with_context(|| format!("cannot humanize {}", args.input.display()))?;
    write_transformed(config, &bytes, &output, &args.audio)
}

pub fn render(config: &AppConfig, args: RenderArgs) -> Result<()> {
    let midi = read_midi(&args.input)?;
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension(args.format.extension()));
    let mut request = RenderRequest::from_config(&config.render);
    if let Some(bank) = args.bank {
        request.bank = bank;
    }
    if let Some(rate) = args.sample_rate {
        request.sample_rate = rate;
    }
    render_bytes(config, &midi, &request, args.format, &output)
}

pub fn list() {
    println!("Scales:");
    for name in scale::names() {
        println!("  {name}");
    }
    println!("Drum styles:");
    for name in drumkit::style_names() {
        let Some(template) = drumkit::lookup_template(name) else {
            continue;
        };
        let voices: Vec<&str> = template.lanes.iter().map(|l| l.voice.name()).collect();
        println!("  {name:<12} {}", voices.join(", "));
    }
    println!("Drum voices:");
    for voice in DrumVoice::ALL {
        println!("  {:<14} {}", voice.name(), voice.pitch());
    }
}

fn read_midi(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// `dir/song.mid` -> `dir/song_<suffix>.mid`
fn sibling(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    input.with_file_name(format!("{stem}_{suffix}.mid"))
}

fn write_generated(
    config: &AppConfig,
    score: &Score,
    output: &Path,
    audio: &AudioOpts,
) -> Result<()> {
    smf::write_score(score, output)?;
    println!(
        "wrote {} ({} tracks, {} notes, {:.1}s)",
        output.display(),
        score.tracks.len(),
        score.note_count(),
        score.duration_secs()
    );
    if audio.render {
        let midi = read_midi(output)?;
        render_beside(config, &midi, output, audio)?;
    }
    Ok(())
}

fn write_transformed(
    config: &AppConfig,
    bytes: &[u8],
    output: &Path,
    audio: &AudioOpts,
) -> Result<()> {
    fs::write(output, bytes).with_context(|| format!("failed to write {}", output.display()))?;
    let notes: usize = smf::decode(bytes)?
        .tracks
        .iter()
        .map(|t| smf::read_notes(t).len())
        .sum();
    println!("wrote {} ({notes} notes)", output.display());
    if audio.render {
        render_beside(config, bytes, output, audio)?;
    }
    Ok(())
}

/// Render next to `midi_path`, swapping in the audio extension.
fn render_beside(
    config: &AppConfig,
    midi: &[u8],
    midi_path: &Path,
    audio: &AudioOpts,
) -> Result<()> {
    let mut request = RenderRequest::from_config(&config.render);
    if let Some(bank) = &audio.bank {
        request.bank = bank.clone();
    }
    let output = midi_path.with_extension(audio.format.extension());
    render_bytes(config, midi, &request, audio.format, &output)
}

fn render_bytes(
    config: &AppConfig,
    midi: &[u8],
    request: &RenderRequest,
    format: AudioFormat,
    output: &Path,
) -> Result<()> {
    let renderer = FluidSynthRenderer::new(&config.render);
    let transcoder = FfmpegMp3::new(&config.render);
    let audio = render_to(&renderer, &transcoder, midi, request, format)?;
    fs::write(output, &audio).with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {} ({} bytes)", output.display(), audio.len());
    Ok(())
}
