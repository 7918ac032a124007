// Round Analytics - Session Engine
// Incremental analytics over manually entered crash-game rounds:
// scoring, momentum, pink events, danger windows.

pub mod config;
pub mod detector;
pub mod engine;
pub mod momentum;
pub mod registry;
pub mod round_log;
pub mod scorer;
pub mod snapshot;
pub mod types;

pub use config::{Config, EngineSettings, OutOfRangePolicy};
pub use engine::{InvalidObservation, RoundEngine};
pub use registry::SessionRegistry;
pub use snapshot::SessionSnapshot;
pub use types::{EngineState, PinkEvent, QuickCategory, QuickEntry, SessionPhase};
