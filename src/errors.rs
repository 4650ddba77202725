// Error types for pitlane

use crate::session::SessionKind;
use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PitlaneError {
    // Errors for track geometry derivation
    #[snafu(display("Not enough position samples to derive track geometry: got {count}, need 2"))]
    InsufficientData { count: usize },

    // Errors while selecting the reference lap and assembling the bundle
    #[snafu(display("No valid laps for track layout"))]
    NoValidLap,
    #[snafu(display("Failed to load session: {reason}"))]
    SessionLoad { reason: String },
    #[snafu(display("Failed to get telemetry: {reason}"))]
    Telemetry { reason: String },
    #[snafu(display("{kind} replay is not yet supported in the web viewer. Use Race or Sprint."))]
    UnsupportedSessionKind { kind: SessionKind },
    #[snafu(display("Unknown driver number: {number}"))]
    UnknownDriver { number: String },
    #[snafu(display("Invalid replay request: {field} - {reason}"))]
    InvalidRequest { field: String, reason: String },

    // Errors for the recorded session archive
    #[snafu(display("No recorded session for {year} round {round} ({kind})"))]
    MissingSession {
        year: u16,
        round: u8,
        kind: SessionKind,
    },
    #[snafu(display("Error reading session archive"))]
    ArchiveIo { source: io::Error },
    #[snafu(display("Error parsing session archive"))]
    ArchiveFormat { source: serde_json::Error },

    // Errors for the bundle writer
    #[snafu(display("Error writing replay bundle"))]
    BundleWrite { source: io::Error },
    #[snafu(display("Error serializing replay bundle"))]
    BundleSerialize { source: serde_json::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}
