// PromptDJ command-line entry point.
//
// Generates melodies, drum patterns, or both as Standard MIDI Files, extends
// or humanizes existing files, and optionally renders any of them to audio.
//
// Usage:
//   promptdj melody --scale A_minor --bars 8 --seed 42 -o lead.mid --render
//   promptdj drums --style funk --swing 0.3 -o beat.mid
//   promptdj both --tempo 100 --style house -o song.mid
//   promptdj continue song.mid --seed 7
//   promptdj humanize song.mid --amount 0.2 --velocity-variation 0.3
//   promptdj render song.mid --format mp3 --bank sf2/Piano.sf2
//   promptdj list
//
// `--config <file.json>` supplies `{ "engine": {...}, "render": {...} }`;
// any missing field keeps its default. Log verbosity follows `RUST_LOG`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "promptdj")]
#[command(about = "Constrained-random MIDI melody and drum generator")]
#[command(version)]
struct Cli {
    /// JSON file with `engine` and `render` sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a melody
    Melody(commands::MelodyArgs),

    /// Generate a drum pattern
    Drums(commands::DrumArgs),

    /// Generate a melody and a drum pattern as one two-track file
    Both(commands::BothArgs),

    /// Append a varied copy of each track's ending
    Continue(commands::ContinueArgs),

    /// Add timing and velocity jitter to every note
    Humanize(commands::HumanizeArgs),

    /// Render a MIDI file to WAV or MP3
    Render(commands::RenderArgs),

    /// List available scales and drum styles
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Melody(args) => commands::melody(&config, args),
        Commands::Drums(args) => commands::drums(&config, args),
        Commands::Both(args) => commands::both(&config, args),
        Commands::Continue(args) => commands::continue_file(&config, args),
        Commands::Humanize(args) => commands::humanize(&config, args),
        Commands::Render(args) => commands::render(&config, args),
        Commands::List => {
            commands::list();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generation_and_render_flags() {
        let cli = Cli::try_parse_from([
            "promptdj", "--config", "cfg.json", "drums", "--style", "trap", "--swing", "0.2",
            "--seed", "5", "--render", "--format", "mp3",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));
        assert!(matches!(cli.command, Commands::Drums(_)));

        assert!(Cli::try_parse_from(["promptdj", "render", "a.mid", "--format", "flac"]).is_err());
        assert!(Cli::try_parse_from(["promptdj", "continue"]).is_err());
    }
}
