//! Live event-stream tracker core: ingest a duplicated, multi-channel feed
//! of combat and support events for a roster of tracked players, correlate
//! related events, and aggregate per-player session statistics.

pub mod bus;
pub mod class_time;
pub mod config;
pub mod core;
pub mod correlate;
pub mod dedup;
pub mod events;
pub mod experience;
pub mod loadouts;
pub mod lookup;
pub mod players;
pub mod protocol;
pub mod report;
pub mod routers;
pub mod stat_map;
pub mod stats;

pub use crate::config::CoreSettings;
pub use crate::core::{Core, SubscriptionSummary, TimeTracking, Transport};
pub use crate::events::{EventData, EventKind, GameEvent};
pub use crate::lookup::{CensusDirectory, Directory};
pub use crate::players::{PlayerStore, TrackedPlayer};
pub use crate::report::PersonalReport;
pub use crate::routers::TrackedRouter;
pub use crate::stat_map::StatMap;
