// Replay request parameters and their bounds

use serde::{Deserialize, Serialize};

use crate::errors::PitlaneError;
use crate::session::SessionKind;

/// Earliest season with position data dense enough for replay.
pub const MIN_YEAR: u16 = 2018;
pub const MAX_YEAR: u16 = 2030;
pub const MAX_ROUND: u8 = 30;

/// Identifies one session to assemble a bundle for. Construct through
/// `new` so out-of-range parameters are rejected before any archive
/// access happens.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ReplayRequest {
    pub year: u16,
    pub round: u8,
    pub kind: SessionKind,
}

impl ReplayRequest {
    pub fn new(year: u16, round: u8, kind: SessionKind) -> Result<Self, PitlaneError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(PitlaneError::InvalidRequest {
                field: "year".to_string(),
                reason: format!("must be between {} and {}", MIN_YEAR, MAX_YEAR),
            });
        }
        if round == 0 || round > MAX_ROUND {
            return Err(PitlaneError::InvalidRequest {
                field: "round".to_string(),
                reason: format!("must be between 1 and {}", MAX_ROUND),
            });
        }
        Ok(Self { year, round, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request_accepted() {
        let request = ReplayRequest::new(2024, 16, SessionKind::Race).unwrap();
        assert_eq!(request.year, 2024);
        assert_eq!(request.round, 16);
        assert_eq!(request.kind, SessionKind::Race);
    }

    #[test]
    fn test_year_bounds_enforced() {
        assert!(ReplayRequest::new(MIN_YEAR, 1, SessionKind::Race).is_ok());
        assert!(ReplayRequest::new(MAX_YEAR, 1, SessionKind::Race).is_ok());
        for year in [2017, 2031] {
            match ReplayRequest::new(year, 1, SessionKind::Race) {
                Err(PitlaneError::InvalidRequest { field, .. }) => assert_eq!(field, "year"),
                other => panic!("Expected InvalidRequest, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_round_bounds_enforced() {
        assert!(ReplayRequest::new(2024, 1, SessionKind::Race).is_ok());
        assert!(ReplayRequest::new(2024, MAX_ROUND, SessionKind::Race).is_ok());
        for round in [0, MAX_ROUND + 1] {
            match ReplayRequest::new(2024, round, SessionKind::Race) {
                Err(PitlaneError::InvalidRequest { field, .. }) => assert_eq!(field, "round"),
                other => panic!("Expected InvalidRequest, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_qualifying_requests_construct_but_are_gated_later() {
        // the kind gate lives in the assembler, not in request validation
        assert!(ReplayRequest::new(2024, 1, SessionKind::Qualifying).is_ok());
    }
}
