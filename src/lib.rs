// Library interface for pitlane
// This allows integration tests to access internal modules

pub mod config;
pub mod errors;
pub mod replay;
pub mod session;
pub mod track;

// Re-export commonly used types
pub use errors::PitlaneError;
pub use replay::{ReplayAssembler, ReplayBundle, ReplayRequest};
pub use session::{RecordedSessionStore, Session, SessionKind, SessionSource};
pub use track::{TrackGeometry, TrackOutlineBuilder, TrackOutlineConfig};
