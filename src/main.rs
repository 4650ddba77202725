use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::info;

use pitlane::{
    config::AppConfig,
    replay::{ReplayAssembler, ReplayRequest},
    session::{RecordedSessionStore, SessionKind},
    track::TrackOutlineBuilder,
    PitlaneError,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble the full replay bundle for one recorded session
    Bundle {
        #[arg(short, long)]
        archive: PathBuf,

        #[arg(short, long)]
        year: u16,

        #[arg(short, long)]
        round: u8,

        #[arg(short, long, default_value = "R")]
        session: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Derive only the track outline for inspection
    Outline {
        #[arg(short, long)]
        archive: PathBuf,

        #[arg(short, long)]
        year: u16,

        #[arg(short, long)]
        round: u8,

        #[arg(short, long, default_value = "R")]
        session: String,
    },
    /// List the rounds recorded for a year
    Rounds {
        #[arg(short, long)]
        archive: PathBuf,

        #[arg(short, long)]
        year: u16,
    },
}

fn parse_kind(code: &str) -> Result<SessionKind, PitlaneError> {
    SessionKind::from_code(code).ok_or_else(|| PitlaneError::InvalidRequest {
        field: "session".to_string(),
        reason: format!("unknown session kind '{}', expected R, S, Q or SQ", code),
    })
}

fn outline_builder() -> TrackOutlineBuilder {
    match AppConfig::from_local_file() {
        Some(config) => TrackOutlineBuilder::with_config(config.outline),
        None => TrackOutlineBuilder::new(),
    }
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&PathBuf>) -> Result<(), PitlaneError> {
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| PitlaneError::BundleWrite { source: e })?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, value)
                .map_err(|e| PitlaneError::BundleSerialize { source: e })?;
            writer
                .flush()
                .map_err(|e| PitlaneError::BundleWrite { source: e })?;
            info!("Wrote replay output to {:?}", path);
        }
        None => {
            let rendered = serde_json::to_string(value)
                .map_err(|e| PitlaneError::BundleSerialize { source: e })?;
            println!("{}", rendered);
        }
    }
    Ok(())
}

fn bundle(
    archive: &PathBuf,
    year: u16,
    round: u8,
    session: &str,
    output: Option<&PathBuf>,
) -> Result<(), PitlaneError> {
    let store = RecordedSessionStore::new(archive.clone())?;
    let assembler = ReplayAssembler::with_outline(&store, outline_builder());
    let request = ReplayRequest::new(year, round, parse_kind(session)?)?;
    let bundle = assembler.assemble(&request)?;
    write_json(&bundle, output)
}

fn outline(archive: &PathBuf, year: u16, round: u8, session: &str) -> Result<(), PitlaneError> {
    let store = RecordedSessionStore::new(archive.clone())?;
    let assembler = ReplayAssembler::with_outline(&store, outline_builder());
    let request = ReplayRequest::new(year, round, parse_kind(session)?)?;
    let geometry = assembler.track_outline(&request)?;
    write_json(&geometry, None)
}

fn rounds(archive: &PathBuf, year: u16) -> Result<(), PitlaneError> {
    let store = RecordedSessionStore::new(archive.clone())?;
    for entry in store.list_rounds(year)? {
        println!(
            "{:>2}  {} ({}) {}",
            entry.round, entry.event_name, entry.country, entry.date
        );
    }
    Ok(())
}

fn main() {
    colog::init();

    let cli = Args::parse();
    match &cli.command {
        Commands::Bundle {
            archive,
            year,
            round,
            session,
            output,
        } => bundle(archive, *year, *round, session, output.as_ref())
            .expect("Error while assembling replay bundle"),
        Commands::Outline {
            archive,
            year,
            round,
            session,
        } => outline(archive, *year, *round, session).expect("Error while deriving track outline"),
        Commands::Rounds { archive, year } => {
            rounds(archive, *year).expect("Error while listing recorded rounds")
        }
    };
}
