// Archive-backed session source. A recorded archive is a directory of one
// JSON document per session (event, drivers, laps, telemetry), written by
// the session recorder; large frame streams can live next to the document
// as a JSON-lines sidecar to keep the documents reviewable.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PitlaneError;

use super::{
    DriverIdentity, Event, Lap, RaceTelemetry, Session, SessionKind, SessionSource,
};

/// On-disk shape of one recorded session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionDocument {
    pub event: Event,
    pub drivers: Vec<String>,
    #[serde(default)]
    pub driver_identities: HashMap<String, DriverIdentity>,
    #[serde(default)]
    pub circuit_rotation: f32,
    pub laps: Vec<Lap>,
    pub telemetry: RaceTelemetry,
}

/// Summary row for the schedule listing.
#[derive(Clone, Debug, Serialize)]
pub struct RoundSummary {
    pub round: u8,
    pub event_name: String,
    pub country: String,
    pub date: String,
}

pub struct RecordedSessionStore {
    archive_path: PathBuf,
}

impl RecordedSessionStore {
    /// Open an archive directory, creating it when missing so a recorder
    /// and a replayer can share a fresh path.
    pub fn new(archive_path: PathBuf) -> Result<Self, PitlaneError> {
        if !archive_path.exists() {
            fs::create_dir_all(&archive_path)
                .map_err(|e| PitlaneError::ArchiveIo { source: e })?;
        }
        Ok(Self { archive_path })
    }

    fn file_stem(year: u16, round: u8, kind: SessionKind) -> String {
        format!("{}_{:02}_{}", year, round, kind.code())
    }

    fn document_path(&self, year: u16, round: u8, kind: SessionKind) -> PathBuf {
        self.archive_path
            .join(format!("{}.json", Self::file_stem(year, round, kind)))
    }

    fn frames_path(&self, year: u16, round: u8, kind: SessionKind) -> PathBuf {
        self.archive_path
            .join(format!("{}.frames.jsonl", Self::file_stem(year, round, kind)))
    }

    /// Write a session document into the archive.
    pub fn save_document(
        &self,
        year: u16,
        round: u8,
        kind: SessionKind,
        document: &SessionDocument,
    ) -> Result<(), PitlaneError> {
        let path = self.document_path(year, round, kind);
        let file = fs::File::create(&path).map_err(|e| PitlaneError::ArchiveIo { source: e })?;
        serde_json::to_writer(file, document)
            .map_err(|e| PitlaneError::ArchiveFormat { source: e })?;
        info!("Recorded session document {:?}", path);
        Ok(())
    }

    fn load_document(
        &self,
        year: u16,
        round: u8,
        kind: SessionKind,
    ) -> Result<SessionDocument, PitlaneError> {
        let path = self.document_path(year, round, kind);
        if !path.exists() {
            return Err(PitlaneError::MissingSession { year, round, kind });
        }

        let content =
            fs::read_to_string(&path).map_err(|e| PitlaneError::ArchiveIo { source: e })?;
        let document: SessionDocument = serde_json::from_str(&content)
            .map_err(|e| PitlaneError::ArchiveFormat { source: e })?;
        debug!(
            "Loaded session document {:?}: {} drivers, {} laps",
            path,
            document.drivers.len(),
            document.laps.len()
        );
        Ok(document)
    }

    /// Frame streams too large for the session document are stored as one
    /// JSON value per line next to it; when present the sidecar replaces
    /// the document's `frames` field.
    fn load_frame_sidecar(&self, path: &Path) -> Result<Option<Value>, PitlaneError> {
        if !path.exists() {
            return Ok(None);
        }
        let frames = serde_jsonlines::json_lines(path)
            .map_err(|e| PitlaneError::ArchiveIo { source: e })?
            .collect::<Result<Vec<Value>, std::io::Error>>()
            .map_err(|e| PitlaneError::ArchiveIo { source: e })?;
        debug!("Loaded {} frames from sidecar {:?}", frames.len(), path);
        Ok(Some(Value::Array(frames)))
    }

    /// List the rounds recorded for a year, one entry per race weekend,
    /// ordered by round number.
    pub fn list_rounds(&self, year: u16) -> Result<Vec<RoundSummary>, PitlaneError> {
        let entries =
            fs::read_dir(&self.archive_path).map_err(|e| PitlaneError::ArchiveIo { source: e })?;

        let mut rounds: HashMap<u8, RoundSummary> = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| PitlaneError::ArchiveIo { source: e })?;
            let name = entry.file_name();
            let Some((entry_year, round, kind)) = Self::parse_file_stem(&name.to_string_lossy())
            else {
                continue;
            };
            if entry_year != year || rounds.contains_key(&round) {
                continue;
            }
            let document = self.load_document(year, round, kind)?;
            rounds.insert(
                round,
                RoundSummary {
                    round,
                    event_name: document.event.event_name,
                    country: document.event.country,
                    date: document
                        .event
                        .date
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                },
            );
        }

        Ok(rounds
            .into_values()
            .sorted_by_key(|summary| summary.round)
            .collect())
    }

    fn parse_file_stem(file_name: &str) -> Option<(u16, u8, SessionKind)> {
        let stem = file_name.strip_suffix(".json")?;
        let mut parts = stem.splitn(3, '_');
        let year = parts.next()?.parse().ok()?;
        let round = parts.next()?.parse().ok()?;
        let kind = SessionKind::from_code(parts.next()?)?;
        Some((year, round, kind))
    }
}

impl SessionSource for RecordedSessionStore {
    fn load_session(
        &self,
        year: u16,
        round: u8,
        kind: SessionKind,
    ) -> Result<Session, PitlaneError> {
        let document = self.load_document(year, round, kind)?;
        Ok(Session {
            year,
            round,
            event: document.event,
            drivers: document.drivers,
            driver_identities: document.driver_identities,
            circuit_rotation: document.circuit_rotation,
            laps: document.laps,
        })
    }

    fn race_telemetry(
        &self,
        session: &Session,
        kind: SessionKind,
    ) -> Result<RaceTelemetry, PitlaneError> {
        let mut telemetry = self
            .load_document(session.year, session.round, kind)?
            .telemetry;
        if let Some(frames) =
            self.load_frame_sidecar(&self.frames_path(session.year, session.round, kind))?
        {
            telemetry.frames = frames;
        }
        Ok(telemetry)
    }

    fn circuit_rotation(&self, session: &Session) -> f32 {
        session.circuit_rotation
    }

    fn driver_identity(
        &self,
        session: &Session,
        number: &str,
    ) -> Result<DriverIdentity, PitlaneError> {
        session
            .driver_identities
            .get(number)
            .cloned()
            .ok_or_else(|| PitlaneError::UnknownDriver {
                number: number.to_string(),
            })
    }
}
