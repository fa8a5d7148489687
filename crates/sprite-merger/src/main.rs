use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use sprite_merger::{HiDpiMatching, Options, SpriteError, SpriteMerger, load_sources, write_atlas};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Sprite(#[from] SpriteError),
    #[error("no usable sprite in the given directories")]
    NothingToWrite,
}

#[derive(Parser)]
#[command(name = "sprite-merger", version)]
#[command(about = "Stack map sprite atlases into one, deduplicating and filling in @2x variants")]
#[command(after_help = "Examples:\n  \
    sprite-merger -o out -n mixed sprites/a sprites/a_@2x sprites/b")]
struct Cli {
    /// Atlas directories holding sprite.png and sprite.json; a name ending in _@2x marks the @2x tier
    #[arg(value_name = "DIR", required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Output file stem; the @2x atlas gets an @2x suffix
    #[arg(short, long, default_value = "sprite")]
    name: String,

    /// How @2x atlases are paired with regular ones when the counts differ
    #[arg(long, value_enum, default_value_t = HiDpiMatching::ByName)]
    match_by: HiDpiMatching,

    /// Quiet output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let sources = load_sources(&cli.inputs);
    let merger = SpriteMerger::new(Options::new().hidpi_matching(cli.match_by));
    let merged = merger.merge(sources.regular, sources.high_dpi);

    let mut written = 0;
    for (atlas, stem) in [
        (&merged.regular, cli.name.clone()),
        (&merged.high_dpi, format!("{}@2x", cli.name)),
    ] {
        let Some(atlas) = atlas else { continue };
        write_atlas(atlas, &cli.output, &stem)?;
        written += 1;
        if !cli.quiet {
            println!(
                "{}: {}x{}, {} icons",
                cli.output.join(format!("{stem}.png")).display(),
                atlas.width(),
                atlas.height(),
                atlas.icons.len()
            );
        }
    }

    if written == 0 {
        return Err(CliError::NothingToWrite);
    }
    Ok(())
}
