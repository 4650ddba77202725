// Replay bundle assembly: reference-lap selection and the merge of derived
// track geometry with the externally produced telemetry payload.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::errors::PitlaneError;
use crate::replay::colors::rgb_to_hex;
use crate::replay::request::ReplayRequest;
use crate::session::{DriverIdentity, Lap, RaceTelemetry, Session, SessionKind, SessionSource};
use crate::track::{TrackGeometry, TrackOutlineBuilder};

/// Session-level descriptive fields shown in the viewer header.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub event_name: String,
    pub circuit_name: String,
    pub country: String,
    pub year: u16,
    pub round: u8,
    pub date: String,
    pub total_laps: u32,
    pub circuit_length_m: Option<f32>,
    pub circuit_rotation: f32,
}

/// The complete request-scoped replay payload. Built fresh per request and
/// handed to the caller; nothing here is cached or shared.
#[derive(Debug, Serialize)]
pub struct ReplayBundle {
    pub session_info: SessionSummary,
    pub track: TrackGeometry,
    pub frames: Value,
    pub driver_colors: BTreeMap<String, String>,
    pub track_statuses: Value,
    pub total_laps: u32,
    pub drivers: Vec<String>,
    pub driver_info: BTreeMap<String, DriverIdentity>,
}

/// Evaluate fallible candidate producers in order and return the first
/// value any of them yields. Producers after the first success are never
/// invoked.
pub(crate) fn first_success<'a, T>(
    candidates: Vec<Box<dyn FnOnce() -> Option<T> + 'a>>,
) -> Option<T> {
    candidates.into_iter().find_map(|candidate| candidate())
}

/// Assembles `ReplayBundle`s from a session source. Each `assemble` call is
/// an independent synchronous computation, so one assembler can serve any
/// number of concurrent requests.
pub struct ReplayAssembler<'s, S: SessionSource> {
    source: &'s S,
    outline: TrackOutlineBuilder,
}

impl<'s, S: SessionSource> ReplayAssembler<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            outline: TrackOutlineBuilder::new(),
        }
    }

    pub fn with_outline(source: &'s S, outline: TrackOutlineBuilder) -> Self {
        Self { source, outline }
    }

    /// Assemble the full replay payload for one session.
    pub fn assemble(&self, request: &ReplayRequest) -> Result<ReplayBundle, PitlaneError> {
        if !request.kind.is_replayable() {
            return Err(PitlaneError::UnsupportedSessionKind { kind: request.kind });
        }

        info!(
            "Assembling replay bundle for {} round {} ({})",
            request.year, request.round, request.kind
        );
        let session = self
            .source
            .load_session(request.year, request.round, request.kind)
            .map_err(|e| PitlaneError::SessionLoad {
                reason: e.to_string(),
            })?;
        let telemetry = self
            .source
            .race_telemetry(&session, request.kind)
            .map_err(|e| PitlaneError::Telemetry {
                reason: e.to_string(),
            })?;

        let reference = self.reference_lap(request, &session)?;
        debug!("Reference lap carries {} samples", reference.samples.len());
        let track = self.outline.build(&reference.samples)?;

        let session_info = self.session_summary(request, &session, &telemetry, &reference);

        let driver_colors: BTreeMap<String, String> = telemetry
            .driver_colors
            .iter()
            .map(|(code, rgb)| (code.clone(), rgb_to_hex(rgb.as_deref())))
            .collect();

        // per-driver enrichment is best effort: a driver the source cannot
        // resolve is omitted instead of failing the whole bundle
        let driver_info: BTreeMap<String, DriverIdentity> = session
            .drivers
            .iter()
            .filter_map(
                |number| match self.source.driver_identity(&session, number) {
                    Ok(identity) => Some((identity.abbreviation.clone(), identity)),
                    Err(e) => {
                        warn!("Skipping identity for driver {}: {}", number, e);
                        None
                    }
                },
            )
            .collect();

        Ok(ReplayBundle {
            session_info,
            track,
            frames: telemetry.frames,
            driver_colors,
            track_statuses: telemetry
                .track_statuses
                .unwrap_or_else(|| Value::Array(Vec::new())),
            total_laps: telemetry.total_laps,
            drivers: session.drivers,
            driver_info,
        })
    }

    /// Derive only the track geometry for one session, using the same
    /// reference-lap policy as the full bundle.
    pub fn track_outline(&self, request: &ReplayRequest) -> Result<TrackGeometry, PitlaneError> {
        if !request.kind.is_replayable() {
            return Err(PitlaneError::UnsupportedSessionKind { kind: request.kind });
        }
        let session = self
            .source
            .load_session(request.year, request.round, request.kind)
            .map_err(|e| PitlaneError::SessionLoad {
                reason: e.to_string(),
            })?;
        let reference = self.reference_lap(request, &session)?;
        self.outline.build(&reference.samples)
    }

    /// The lap whose positions become the track outline, tried in order:
    /// the qualifying fastest lap when it carries a DRS channel, then the
    /// target session's own fastest lap.
    fn reference_lap(
        &self,
        request: &ReplayRequest,
        session: &Session,
    ) -> Result<Lap, PitlaneError> {
        let candidates: Vec<Box<dyn FnOnce() -> Option<Lap> + '_>> = vec![
            Box::new(|| self.qualifying_reference(request)),
            Box::new(|| session.fastest_lap().cloned()),
        ];
        first_success(candidates).ok_or(PitlaneError::NoValidLap)
    }

    /// Qualifying laps are driven alone at full pace, so their DRS codes
    /// trace the activation zones cleanly. Any failure here falls through
    /// to the target session's fastest lap.
    fn qualifying_reference(&self, request: &ReplayRequest) -> Option<Lap> {
        let qualifying =
            match self
                .source
                .load_session(request.year, request.round, SessionKind::Qualifying)
            {
                Ok(session) => session,
                Err(e) => {
                    debug!("No qualifying reference for round {}: {}", request.round, e);
                    return None;
                }
            };
        let fastest = qualifying.fastest_lap()?;
        if !fastest.has_drs_channel() {
            debug!("Qualifying fastest lap has no DRS channel, falling back");
            return None;
        }
        Some(fastest.clone())
    }

    fn session_summary(
        &self,
        request: &ReplayRequest,
        session: &Session,
        telemetry: &RaceTelemetry,
        reference: &Lap,
    ) -> SessionSummary {
        SessionSummary {
            event_name: session.event.event_name.clone(),
            circuit_name: session.event.location.clone(),
            country: session.event.country.clone(),
            year: request.year,
            round: request.round,
            date: session
                .event
                .date
                .map(|date| date.format("%B %d, %Y").to_string())
                .unwrap_or_default(),
            total_laps: telemetry.total_laps,
            circuit_length_m: reference.lap_length_m(),
            circuit_rotation: self.source.circuit_rotation(session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Event, LapSample};
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::collections::HashMap;

    fn lap(sample_count: usize, lap_time_s: f32, drs: Option<u8>) -> Lap {
        Lap {
            lap_time_s: Some(lap_time_s),
            samples: (0..sample_count)
                .map(|i| LapSample {
                    x: i as f32 * 10.0,
                    y: (i as f32).sin() * 100.0,
                    distance: Some(i as f32 * 10.0),
                    drs,
                })
                .collect(),
        }
    }

    fn event() -> Event {
        Event {
            event_name: "Italian Grand Prix".to_string(),
            location: "Monza".to_string(),
            country: "Italy".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 9, 1),
        }
    }

    fn race_session(laps: Vec<Lap>) -> Session {
        Session {
            year: 2024,
            round: 16,
            event: event(),
            drivers: vec!["1".to_string(), "16".to_string(), "44".to_string()],
            driver_identities: HashMap::from([
                (
                    "1".to_string(),
                    DriverIdentity {
                        number: "1".to_string(),
                        abbreviation: "VER".to_string(),
                        first_name: "Max".to_string(),
                        last_name: "Verstappen".to_string(),
                    },
                ),
                (
                    "16".to_string(),
                    DriverIdentity {
                        number: "16".to_string(),
                        abbreviation: "LEC".to_string(),
                        first_name: "Charles".to_string(),
                        last_name: "Leclerc".to_string(),
                    },
                ),
                (
                    "44".to_string(),
                    DriverIdentity {
                        number: "44".to_string(),
                        abbreviation: "HAM".to_string(),
                        first_name: "Lewis".to_string(),
                        last_name: "Hamilton".to_string(),
                    },
                ),
            ]),
            circuit_rotation: 12.0,
            laps,
        }
    }

    fn telemetry() -> RaceTelemetry {
        RaceTelemetry {
            frames: serde_json::json!([{"t": 0.0}, {"t": 0.5}]),
            total_laps: 53,
            driver_colors: HashMap::from([
                ("VER".to_string(), Some(vec![255, 0, 0])),
                ("LEC".to_string(), None),
                ("HAM".to_string(), Some(vec![0, 128])),
            ]),
            track_statuses: None,
        }
    }

    /// In-memory source with a configurable qualifying session and a list
    /// of driver numbers whose identity lookup fails.
    struct StubSource {
        race: Session,
        qualifying: Option<Session>,
        telemetry: RaceTelemetry,
        failing_drivers: Vec<String>,
    }

    impl StubSource {
        fn new(race: Session, qualifying: Option<Session>) -> Self {
            Self {
                race,
                qualifying,
                telemetry: telemetry(),
                failing_drivers: Vec::new(),
            }
        }
    }

    impl SessionSource for StubSource {
        fn load_session(
            &self,
            year: u16,
            round: u8,
            kind: SessionKind,
        ) -> Result<Session, PitlaneError> {
            match kind {
                SessionKind::Qualifying => self.qualifying.clone().ok_or(
                    PitlaneError::MissingSession { year, round, kind },
                ),
                _ => Ok(self.race.clone()),
            }
        }

        fn race_telemetry(
            &self,
            _session: &Session,
            _kind: SessionKind,
        ) -> Result<RaceTelemetry, PitlaneError> {
            Ok(self.telemetry.clone())
        }

        fn circuit_rotation(&self, session: &Session) -> f32 {
            session.circuit_rotation
        }

        fn driver_identity(
            &self,
            session: &Session,
            number: &str,
        ) -> Result<DriverIdentity, PitlaneError> {
            if self.failing_drivers.iter().any(|n| n == number) {
                return Err(PitlaneError::UnknownDriver {
                    number: number.to_string(),
                });
            }
            session
                .driver_identities
                .get(number)
                .cloned()
                .ok_or_else(|| PitlaneError::UnknownDriver {
                    number: number.to_string(),
                })
        }
    }

    fn request() -> ReplayRequest {
        ReplayRequest::new(2024, 16, SessionKind::Race).unwrap()
    }

    #[test]
    fn test_qualifying_kinds_are_rejected_up_front() {
        let source = StubSource::new(race_session(vec![lap(10, 90.0, Some(0))]), None);
        let assembler = ReplayAssembler::new(&source);

        for kind in [SessionKind::Qualifying, SessionKind::SprintQualifying] {
            let request = ReplayRequest::new(2024, 16, kind).unwrap();
            assert!(matches!(
                assembler.assemble(&request),
                Err(PitlaneError::UnsupportedSessionKind { .. })
            ));
        }
    }

    #[test]
    fn test_qualifying_fastest_lap_wins_over_faster_race_lap() {
        // the race lap is faster, but the qualifying lap carries DRS data
        let qualifying = race_session(vec![lap(30, 95.0, Some(10))]);
        let source = StubSource::new(
            race_session(vec![lap(10, 80.0, Some(0))]),
            Some(qualifying),
        );
        let assembler = ReplayAssembler::new(&source);

        let bundle = assembler.assemble(&request()).unwrap();
        assert_eq!(bundle.track.center_x.len(), 30);
    }

    #[test]
    fn test_qualifying_lap_without_drs_channel_is_skipped() {
        let qualifying = race_session(vec![Lap {
            lap_time_s: Some(95.0),
            samples: vec![LapSample::default(); 30],
        }]);
        let source = StubSource::new(
            race_session(vec![lap(10, 80.0, Some(0))]),
            Some(qualifying),
        );
        let assembler = ReplayAssembler::new(&source);

        let bundle = assembler.assemble(&request()).unwrap();
        assert_eq!(bundle.track.center_x.len(), 10);
    }

    #[test]
    fn test_missing_qualifying_falls_back_to_race_fastest() {
        let source = StubSource::new(race_session(vec![lap(10, 80.0, Some(0))]), None);
        let assembler = ReplayAssembler::new(&source);

        let bundle = assembler.assemble(&request()).unwrap();
        assert_eq!(bundle.track.center_x.len(), 10);
    }

    #[test]
    fn test_no_laps_anywhere_fails_with_no_valid_lap() {
        let source = StubSource::new(race_session(vec![]), None);
        let assembler = ReplayAssembler::new(&source);

        assert!(matches!(
            assembler.assemble(&request()),
            Err(PitlaneError::NoValidLap)
        ));
    }

    #[test]
    fn test_failing_driver_lookup_degrades_to_omission() {
        let mut source = StubSource::new(race_session(vec![lap(10, 80.0, Some(0))]), None);
        source.failing_drivers.push("44".to_string());
        let assembler = ReplayAssembler::new(&source);

        let bundle = assembler.assemble(&request()).unwrap();
        assert_eq!(bundle.drivers.len(), 3);
        assert_eq!(bundle.driver_colors.len(), 3);
        assert_eq!(bundle.driver_info.len(), 2);
        assert!(bundle.driver_info.contains_key("VER"));
        assert!(bundle.driver_info.contains_key("LEC"));
        assert!(!bundle.driver_info.contains_key("HAM"));
    }

    #[test]
    fn test_driver_colors_convert_with_gray_fallback() {
        let source = StubSource::new(race_session(vec![lap(10, 80.0, Some(0))]), None);
        let assembler = ReplayAssembler::new(&source);

        let bundle = assembler.assemble(&request()).unwrap();
        assert_eq!(bundle.driver_colors["VER"], "#ff0000");
        // absent and malformed colors both degrade to neutral gray
        assert_eq!(bundle.driver_colors["LEC"], "#808080");
        assert_eq!(bundle.driver_colors["HAM"], "#808080");
    }

    #[test]
    fn test_pass_through_fields_are_untouched() {
        let source = StubSource::new(race_session(vec![lap(10, 80.0, Some(0))]), None);
        let assembler = ReplayAssembler::new(&source);

        let bundle = assembler.assemble(&request()).unwrap();
        assert_eq!(bundle.frames, serde_json::json!([{"t": 0.0}, {"t": 0.5}]));
        assert_eq!(bundle.total_laps, 53);
        // an absent status history becomes an empty list for the viewer
        assert_eq!(bundle.track_statuses, serde_json::json!([]));
    }

    #[test]
    fn test_session_summary_fields() {
        let source = StubSource::new(race_session(vec![lap(10, 80.0, Some(0))]), None);
        let assembler = ReplayAssembler::new(&source);

        let info = assembler.assemble(&request()).unwrap().session_info;
        assert_eq!(info.event_name, "Italian Grand Prix");
        assert_eq!(info.circuit_name, "Monza");
        assert_eq!(info.country, "Italy");
        assert_eq!(info.year, 2024);
        assert_eq!(info.round, 16);
        assert_eq!(info.date, "September 01, 2024");
        assert_eq!(info.total_laps, 53);
        assert_eq!(info.circuit_length_m, Some(90.0));
        assert_eq!(info.circuit_rotation, 12.0);
    }

    #[test]
    fn test_missing_event_date_becomes_empty_string() {
        let mut race = race_session(vec![lap(10, 80.0, Some(0))]);
        race.event.date = None;
        let source = StubSource::new(race, None);
        let assembler = ReplayAssembler::new(&source);

        let info = assembler.assemble(&request()).unwrap().session_info;
        assert_eq!(info.date, "");
    }

    #[test]
    fn test_track_outline_uses_the_same_reference_policy() {
        let qualifying = race_session(vec![lap(30, 95.0, Some(10))]);
        let source = StubSource::new(
            race_session(vec![lap(10, 80.0, Some(0))]),
            Some(qualifying),
        );
        let assembler = ReplayAssembler::new(&source);

        let geometry = assembler.track_outline(&request()).unwrap();
        assert_eq!(geometry.center_x.len(), 30);
    }

    #[test]
    fn test_first_success_returns_first_value() {
        let candidates: Vec<Box<dyn FnOnce() -> Option<u32>>> = vec![
            Box::new(|| None),
            Box::new(|| Some(7)),
            Box::new(|| Some(9)),
        ];
        assert_eq!(first_success(candidates), Some(7));
    }

    #[test]
    fn test_first_success_exhausts_to_none() {
        let candidates: Vec<Box<dyn FnOnce() -> Option<u32>>> =
            vec![Box::new(|| None), Box::new(|| None)];
        assert_eq!(first_success(candidates), None);
    }

    #[test]
    fn test_first_success_stops_after_a_hit() {
        let invoked = Cell::new(false);
        let candidates: Vec<Box<dyn FnOnce() -> Option<u32>>> = vec![
            Box::new(|| Some(1)),
            Box::new(|| {
                invoked.set(true);
                Some(2)
            }),
        ];
        assert_eq!(first_success(candidates), Some(1));
        assert!(!invoked.get());
    }
}
