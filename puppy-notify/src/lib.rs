//! Find My Puppy hourly reminder engine
//!
//! Platform-agnostic selection logic for the app's hourly notifications: a
//! non-repeating rotation over the normal message pool, with one festive
//! message per festival day. Display, permissions and scheduling belong to
//! the host; this crate only decides what to say and remembers what it said.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod constants;
pub mod engine;
pub mod festival;
pub mod hash;
pub mod rotation;
#[cfg(feature = "async")]
pub mod schedule;
pub mod store;
pub mod worker;

// Re-export commonly used types
pub use catalog::{CatalogError, MessageCatalog};
pub use clock::{Clock, FixedClock, SystemClock, iso_date, parse_iso_date};
pub use config::{ConfigError, NotifierConfig};
pub use engine::{EngineSnapshot, MessageSource, PickedMessage, RotationEngine, TickError};
pub use festival::{FestivalSentLog, FestiveDecision, check_festival, festival_override};
pub use hash::{festive_index, fnv1a64};
pub use rotation::{RotationState, RotationStep, advance, shuffled_order};
#[cfg(feature = "async")]
pub use schedule::{HourlySchedule, ScheduleReport, run_schedule};
pub use store::{JsonFileStore, MemoryStore, PersistedStore, StoreError, StoreValue};
pub use worker::{
    HourlyWorker, LogSink, Notification, NotificationSink, RecordingSink, SinkError, WorkResult,
};
