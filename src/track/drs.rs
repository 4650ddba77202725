// DRS activation zone extraction. The timing feed reports a raw DRS status
// code per sample; a zone is a maximal contiguous run of samples whose code
// marks the flap as open.

use serde::{Deserialize, Serialize};

use crate::session::LapSample;

/// Status codes the timing feed has historically used for "flap open".
/// The full status vocabulary is undocumented, so the set is configuration
/// rather than a fixed rule; see `TrackOutlineConfig`.
pub const DEFAULT_DRS_ACTIVE_CODES: [u8; 3] = [10, 12, 14];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f32,
    pub y: f32,
}

/// One DRS activation zone, bounded by the centerline positions of its
/// first and last active sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrsZone {
    pub start: TrackPoint,
    pub end: TrackPoint,
}

/// Scanner state while walking the lap: outside any zone, or inside the
/// zone opened at sample `start`.
#[derive(Clone, Copy)]
enum ZoneScan {
    Idle,
    InZone { start: usize },
}

/// Collect the DRS zones of one lap, in sample order. Samples without a
/// DRS channel are uniformly inactive; a zone still open at the last
/// sample is closed there.
pub(crate) fn extract_drs_zones(samples: &[LapSample], active_codes: &[u8]) -> Vec<DrsZone> {
    let position = |index: usize| TrackPoint {
        x: samples[index].x,
        y: samples[index].y,
    };
    let is_active =
        |sample: &LapSample| sample.drs.is_some_and(|code| active_codes.contains(&code));

    let mut zones = Vec::new();
    let end_state = samples
        .iter()
        .enumerate()
        .fold(ZoneScan::Idle, |state, (index, sample)| {
            match (state, is_active(sample)) {
                (ZoneScan::Idle, true) => ZoneScan::InZone { start: index },
                (ZoneScan::Idle, false) => ZoneScan::Idle,
                (ZoneScan::InZone { start }, true) => ZoneScan::InZone { start },
                (ZoneScan::InZone { start }, false) => {
                    zones.push(DrsZone {
                        start: position(start),
                        end: position(index - 1),
                    });
                    ZoneScan::Idle
                }
            }
        });
    if let ZoneScan::InZone { start } = end_state {
        zones.push(DrsZone {
            start: position(start),
            end: position(samples.len() - 1),
        });
    }

    zones
}
