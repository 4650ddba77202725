// Track outline derivation. One reference lap's position samples become
// the renderable circuit: the samples are the centerline, the boundaries
// are normal offsets at half the track width, and the DRS codes mark the
// activation zones.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::PitlaneError;
use crate::session::LapSample;

use super::drs::{self, DrsZone, DEFAULT_DRS_ACTIVE_CODES};

/// Configuration for track outline derivation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackOutlineConfig {
    /// Rendered track width, in the same units as the position samples
    pub track_width: f32,
    /// DRS status codes treated as "flap open"
    pub drs_active_codes: Vec<u8>,
}

impl Default for TrackOutlineConfig {
    fn default() -> Self {
        Self {
            track_width: 200.0,
            drs_active_codes: DEFAULT_DRS_ACTIVE_CODES.to_vec(),
        }
    }
}

/// Renderable track description, in the shape the replay viewer consumes.
/// The three curves always have the same length and the bounds enclose
/// every point of all of them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackGeometry {
    pub center_x: Vec<f32>,
    pub center_y: Vec<f32>,
    pub inner_x: Vec<f32>,
    pub inner_y: Vec<f32>,
    pub outer_x: Vec<f32>,
    pub outer_y: Vec<f32>,
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    pub drs_zones: Vec<DrsZone>,
}

/// Derives a `TrackGeometry` from one lap's ordered position samples.
pub struct TrackOutlineBuilder {
    config: TrackOutlineConfig,
}

impl TrackOutlineBuilder {
    pub fn new() -> Self {
        Self {
            config: TrackOutlineConfig::default(),
        }
    }

    pub fn with_config(config: TrackOutlineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackOutlineConfig {
        &self.config
    }

    /// Build the outline for one lap. Pure function of its input: safe to
    /// call from any number of concurrent assembly invocations.
    pub fn build(&self, samples: &[LapSample]) -> Result<TrackGeometry, PitlaneError> {
        if samples.len() < 2 {
            return Err(PitlaneError::InsufficientData {
                count: samples.len(),
            });
        }

        let center_x: Vec<f32> = samples.iter().map(|sample| sample.x).collect();
        let center_y: Vec<f32> = samples.iter().map(|sample| sample.y).collect();
        let (tangent_x, tangent_y) = unit_tangents(&center_x, &center_y);

        let half_width = self.config.track_width / 2.0;
        let count = samples.len();
        let mut inner_x = Vec::with_capacity(count);
        let mut inner_y = Vec::with_capacity(count);
        let mut outer_x = Vec::with_capacity(count);
        let mut outer_y = Vec::with_capacity(count);
        for i in 0..count {
            // left-hand normal of the unit tangent
            let normal_x = -tangent_y[i];
            let normal_y = tangent_x[i];
            outer_x.push(center_x[i] + normal_x * half_width);
            outer_y.push(center_y[i] + normal_y * half_width);
            inner_x.push(center_x[i] - normal_x * half_width);
            inner_y.push(center_y[i] - normal_y * half_width);
        }

        let (x_min, x_max) = axis_bounds(&center_x, &inner_x, &outer_x);
        let (y_min, y_max) = axis_bounds(&center_y, &inner_y, &outer_y);

        let drs_zones = drs::extract_drs_zones(samples, &self.config.drs_active_codes);
        debug!(
            "Derived track outline from {} samples with {} DRS zones",
            count,
            drs_zones.len()
        );

        Ok(TrackGeometry {
            center_x,
            center_y,
            inner_x,
            inner_y,
            outer_x,
            outer_y,
            x_min,
            x_max,
            y_min,
            y_max,
            drs_zones,
        })
    }
}

impl Default for TrackOutlineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Central-difference derivative with respect to sample index: forward
/// difference at the first sample, backward at the last, central elsewhere.
/// Callers guarantee at least two values.
fn gradient(values: &[f32]) -> Vec<f32> {
    let last = values.len() - 1;
    (0..values.len())
        .map(|i| match i {
            0 => values[1] - values[0],
            i if i == last => values[last] - values[last - 1],
            i => (values[i + 1] - values[i - 1]) / 2.0,
        })
        .collect()
}

/// Per-sample unit tangent of the centerline. A zero-magnitude tangent
/// (duplicate points) has no direction; it divides by 1 instead and keeps
/// its zero components, so the sample gets no boundary offset.
fn unit_tangents(xs: &[f32], ys: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let dx = gradient(xs);
    let dy = gradient(ys);
    dx.into_iter()
        .zip(dy)
        .map(|(dx, dy)| {
            let magnitude = (dx * dx + dy * dy).sqrt();
            let magnitude = if magnitude == 0.0 { 1.0 } else { magnitude };
            (dx / magnitude, dy / magnitude)
        })
        .unzip()
}

fn axis_bounds(center: &[f32], inner: &[f32], outer: &[f32]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &value in center.iter().chain(inner).chain(outer) {
        min = min.min(value);
        max = max.max(value);
    }
    (min, max)
}
