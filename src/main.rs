use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_print::{ceprintln, cprintln};
use log::{info, warn, LevelFilter};
use serde::Serialize;
use thiserror::Error;
use trackimport::{
    config::{ConfigError, ImportConfig},
    extract::{self, AlbumListItem, ExtractOptions, Source},
    matcher,
    pattern::PatternError,
    reconcile::{self, ReconcileOptions, ReconcileReport},
    text_import,
    track_data::{TrackData, TrackDataVector},
};

#[derive(Parser)]
#[command(name = "trackimport", version)]
/// Imports track lists from text, gnudb records and shopping site pages.
struct Cli {
    /// YAML file with import formats and settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Show more log output, repeatable
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the configured import formats
    Formats,
    /// Import a text file with one of the import formats
    Text {
        /// Format name, the selected format if missing
        #[arg(short, long)]
        format: Option<String>,
        /// Tag import format applied to the result
        #[arg(long)]
        tags: Option<String>,
        #[command(flatten)]
        import: ImportArgs,
    },
    /// Read a saved gnudb response
    Gnudb(ImportArgs),
    /// Read a saved shopping site page
    Amazon(ImportArgs),
}

#[derive(Args)]
struct ImportArgs {
    file: PathBuf,
    /// Durations of the destination files in seconds, comma separated
    #[arg(short, long, value_delimiter = ',')]
    durations: Vec<u32>,
    /// Drop records beyond the last destination entry
    #[arg(long)]
    no_growth: bool,
    /// Reorder the result after importing
    #[arg(long, value_enum)]
    reorder: Option<Reorder>,
    /// Parse the file as a search result page
    #[arg(long)]
    search: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Reorder {
    Length,
    Track,
}

#[derive(Error, Debug)]
enum RunError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Pattern(#[from] PatternError),
    #[error("{path}: {error}")]
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("No import format named '{0}'")]
    UnknownFormat(String),
    #[error("No tag import format named '{0}'")]
    UnknownTagFormat(String),
}

#[derive(Serialize)]
struct ImportOutput {
    tracks: Vec<TrackData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_art_url: Option<String>,
    /// Positions whose file and import durations are too far apart.
    mismatched: Vec<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut clog = colog::default_builder();
    clog.filter(
        None,
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        },
    );
    clog.init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            ceprintln!("<red>{}</>", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RunError> {
    let config = match &cli.config {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::default(),
    };
    match cli.command {
        Command::Formats => {
            for (i, format) in config.formats.iter().enumerate() {
                if i == config.selected {
                    cprintln!("<green>* {}</>", format.name);
                } else {
                    println!("  {}", format.name);
                }
            }
            Ok(())
        }
        Command::Text {
            format,
            tags,
            import,
        } => {
            let index = match format {
                Some(name) => config
                    .position(&name)
                    .ok_or(RunError::UnknownFormat(name))?,
                None => config.selected,
            };
            let importer = config.compile(index)?;
            let text = read_text(&import.file)?;
            let mut tracks = TrackDataVector::from_file_durations(&import.durations);
            let mut skipped = 0;
            match importer.update_track_data(
                &text,
                &mut tracks,
                reconcile_options(&import),
                |_| skipped += 1,
            ) {
                Some(report) => info!(
                    "{} assigned, {} appended, {} skipped",
                    report.assigned, report.appended, skipped
                ),
                None => warn!("No tracks found in {}", import.file.display()),
            }
            if let Some(name) = tags {
                let tag_format = config
                    .find_tag_format(&name)
                    .ok_or(RunError::UnknownTagFormat(name))?;
                let extraction = tag_format.compile()?;
                text_import::import_from_tags(&tag_format.source, &extraction, &mut tracks);
            }
            finish(tracks, &config, &import)
        }
        Command::Gnudb(import) => run_source(Source::Gnudb, &config, &import),
        Command::Amazon(import) => run_source(Source::Amazon, &config, &import),
    }
}

fn run_source(source: Source, config: &ImportConfig, import: &ImportArgs) -> Result<(), RunError> {
    let extractor = source.extractor(ExtractOptions::default());
    let text = read_text(&import.file)?;
    if import.search {
        let items: Vec<AlbumListItem> = extractor.parse_search_results(&text);
        info!("{} albums from {}", items.len(), extractor.name());
        return print(&items, import.json);
    }
    let extraction = extractor.extract(&text);
    if extraction.is_empty() {
        warn!("Nothing found in {}", import.file.display());
    }
    let mut tracks = TrackDataVector::from_file_durations(&import.durations);
    let report: ReconcileReport =
        extract::import_extraction(&mut tracks, &extraction, reconcile_options(import));
    info!(
        "{}: {} assigned, {} appended, {} cleared, {} removed",
        extractor.name(),
        report.assigned,
        report.appended,
        report.cleared,
        report.removed
    );
    finish(tracks, config, import)
}

fn finish(
    mut tracks: TrackDataVector,
    config: &ImportConfig,
    import: &ImportArgs,
) -> Result<(), RunError> {
    let reordered = match import.reorder {
        Some(Reorder::Length) => matcher::match_with_length(
            &mut tracks,
            config.enable_time_difference_check,
            config.max_time_difference,
        ),
        Some(Reorder::Track) => matcher::match_with_track(&mut tracks),
        None => true,
    };
    if !reordered {
        warn!("Tracks could not be reordered");
    }
    let mismatched = match config.tolerance() {
        Some(tolerance) => reconcile::duration_mismatches(&tracks, tolerance)
            .into_iter()
            .enumerate()
            .filter_map(|(i, flagged)| flagged.then_some(i))
            .collect(),
        None => vec![],
    };
    let cover_art_url = tracks.cover_art_url.take();
    let output = ImportOutput {
        tracks: tracks.into_inner(),
        cover_art_url,
        mismatched,
    };
    print(&output, import.json)
}

fn reconcile_options(import: &ImportArgs) -> ReconcileOptions {
    ReconcileOptions {
        allow_growth: !import.no_growth,
    }
}

fn read_text(path: &Path) -> Result<String, RunError> {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|error| RunError::Read {
            path: path.to_owned(),
            error,
        })
}

fn print<T: Serialize>(value: &T, json: bool) -> Result<(), RunError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", serde_yaml::to_string(value)?);
    }
    Ok(())
}
