// Session domain model and the telemetry-source seam consumed by the
// replay assembler. A `SessionSource` hands out loaded sessions, per-frame
// race telemetry and per-driver identity records; the assembler never
// talks to the underlying storage directly.

pub mod recorded;

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use recorded::RecordedSessionStore;

use crate::errors::PitlaneError;

/// The closed set of session kinds the timing feed distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Race,
    Sprint,
    Qualifying,
    SprintQualifying,
}

impl SessionKind {
    /// Short code used by the timing feed and in archive file names.
    pub fn code(&self) -> &'static str {
        match self {
            SessionKind::Race => "R",
            SessionKind::Sprint => "S",
            SessionKind::Qualifying => "Q",
            SessionKind::SprintQualifying => "SQ",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "R" => Some(SessionKind::Race),
            "S" => Some(SessionKind::Sprint),
            "Q" => Some(SessionKind::Qualifying),
            "SQ" => Some(SessionKind::SprintQualifying),
            _ => None,
        }
    }

    /// Only race-like sessions can be replayed; qualifying runs are split
    /// across segments and have no single running order to play back.
    pub fn is_replayable(&self) -> bool {
        matches!(self, SessionKind::Race | SessionKind::Sprint)
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionKind::Race => "Race",
            SessionKind::Sprint => "Sprint",
            SessionKind::Qualifying => "Qualifying",
            SessionKind::SprintQualifying => "Sprint Qualifying",
        };
        write!(f, "{}", name)
    }
}

/// One position sample along a lap, in temporal order.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct LapSample {
    /// Planar position in the timing feed's coordinate space
    pub x: f32,
    pub y: f32,
    /// Cumulative distance from the start line, meters
    #[serde(default)]
    pub distance: Option<f32>,
    /// Raw DRS status code, absent when the channel was not recorded
    #[serde(default)]
    pub drs: Option<u8>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Lap {
    #[serde(default)]
    pub lap_time_s: Option<f32>,
    pub samples: Vec<LapSample>,
}

impl Lap {
    /// Whether any sample of this lap carries a DRS status code.
    pub fn has_drs_channel(&self) -> bool {
        self.samples.iter().any(|sample| sample.drs.is_some())
    }

    /// Lap length from the distance channel, when recorded.
    pub fn lap_length_m(&self) -> Option<f32> {
        self.samples
            .iter()
            .filter_map(|sample| sample.distance)
            .reduce(f32::max)
    }
}

/// Descriptive fields of the race weekend an event belongs to.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Event {
    pub event_name: String,
    pub location: String,
    pub country: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// A loaded session: event descriptors, the drivers that took part (by car
/// number, as broadcast by the timing feed) and the recorded laps.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub year: u16,
    pub round: u8,
    pub event: Event,
    pub drivers: Vec<String>,
    pub driver_identities: HashMap<String, DriverIdentity>,
    pub circuit_rotation: f32,
    pub laps: Vec<Lap>,
}

impl Session {
    /// The fastest timed lap of the session, if any lap carries a time.
    pub fn fastest_lap(&self) -> Option<&Lap> {
        self.laps
            .iter()
            .filter(|lap| lap.lap_time_s.is_some())
            .min_by(|a, b| {
                a.lap_time_s
                    .partial_cmp(&b.lap_time_s)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

/// Per-frame replay telemetry produced upstream. `frames` and
/// `track_statuses` are opaque to the assembler and passed through to the
/// viewer untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RaceTelemetry {
    pub frames: Value,
    pub total_laps: u32,
    /// RGB triple per driver code; a feed may omit a color or carry a
    /// malformed one, both degrade to the neutral fallback downstream
    #[serde(default)]
    pub driver_colors: HashMap<String, Option<Vec<u8>>>,
    #[serde(default)]
    pub track_statuses: Option<Value>,
}

/// Identity record for one driver, as resolved from the timing feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverIdentity {
    pub number: String,
    pub abbreviation: String,
    pub first_name: String,
    pub last_name: String,
}

/// Trait defining the interface the replay assembler consumes. One source
/// serves many concurrent assembly invocations, so every operation takes
/// `&self` and returns owned data.
pub trait SessionSource {
    /// Load the session for a given year, round and kind
    fn load_session(
        &self,
        year: u16,
        round: u8,
        kind: SessionKind,
    ) -> Result<Session, PitlaneError>;

    /// Per-frame replay telemetry for a loaded session
    fn race_telemetry(
        &self,
        session: &Session,
        kind: SessionKind,
    ) -> Result<RaceTelemetry, PitlaneError>;

    /// Rotation of the circuit layout in the viewer, degrees
    fn circuit_rotation(&self, session: &Session) -> f32;

    /// Resolve identity metadata for one driver number; may fail per driver
    fn driver_identity(
        &self,
        session: &Session,
        number: &str,
    ) -> Result<DriverIdentity, PitlaneError>;
}
