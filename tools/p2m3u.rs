mod config;

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use common::Song;
use library::{Library, LoftyTags, Matcher};
use playlist::{key_list, read_playlist, write_missing, write_playlist, InputKind, OutputKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{db_path, finalize, load_config};

/// Converts a playlist of song metadata into a relative-pathed playlist.
#[derive(Parser, Debug)]
#[command(name = "p2m3u", version)]
struct Cli {
    /// Input playlist
    input: PathBuf,
    /// Output file
    output: PathBuf,
    /// Directories to search
    search_dirs: Vec<PathBuf>,
    /// Config file to use
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Custom index snapshot file
    #[arg(long)]
    db_file: Option<PathBuf>,
    /// File to list playlist entries that were not found
    #[arg(long)]
    output_missing: Option<PathBuf>,
    /// How to parse the input file (CSV, EXPORTIFY); defaults to its extension
    #[arg(short, long)]
    input_type: Option<String>,
    /// How to write the output file (M3U); defaults to its extension
    #[arg(short, long)]
    output_type: Option<String>,
    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_deref())?;
    let config = finalize(config, &cli.search_dirs)?;
    let input_kind = InputKind::resolve(cli.input_type.as_deref(), &cli.input)?;
    let output_kind = OutputKind::resolve(cli.output_type.as_deref(), &cli.output)?;

    let db_path = db_path(cli.db_file.as_deref(), &config);
    let (library, stats) = Library::load_or_scan(&config, Some(db_path), &LoftyTags)?;
    info!("Library holds {} songs ({} new)", library.index().len(), stats.added);

    info!("Reading input playlist...");
    let entries = read_playlist(&cli.input, input_kind)?;
    let keys = key_list(&entries, &config.format);
    if keys.is_empty() {
        return Err("input playlist has no entries".into());
    }

    info!("Matching playlist items...");
    let matcher = Matcher::new(config);
    let matches = matcher.match_keys(library.index(), &keys);
    let songs: Vec<Option<&Song>> = matches
        .iter()
        .map(|id| id.and_then(|id| library.index().song(id)))
        .collect();

    if let Some(path) = &cli.output_missing {
        write_missing(path, &keys, &songs)?;
    }

    info!("Writing output playlist...");
    write_playlist(&cli.output, output_kind, &songs)?;

    Ok(())
}
