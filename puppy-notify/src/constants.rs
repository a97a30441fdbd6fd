//! Centralized keys and defaults for the hourly reminder engine.
//!
//! Persisted key names are part of the on-device format: renaming any of
//! them orphans state written by earlier installs.

// Persisted store keys -------------------------------------------------------
pub const KEY_ORDER: &str = "order_csv";
pub const KEY_INDEX: &str = "order_index";
pub const KEY_LAST_MESSAGE: &str = "last_message_idx";
pub const KEY_NOTIFICATION_ID: &str = "notif_id";
/// Followed by the festival key; value is the ISO date of the last festive send.
pub const KEY_FESTIVE_SENT_PREFIX: &str = "festive_sent_";

// Host defaults --------------------------------------------------------------
pub const DEFAULT_STORE_NAMESPACE: &str = "findmypuppy_hourly_notifications";
pub const DEFAULT_UNIQUE_WORK_NAME: &str = "findmypuppy_hourly_notifications";
pub const DEFAULT_CHANNEL_ID: &str = "findmypuppy_hourly";
pub const DEFAULT_CHANNEL_NAME: &str = "Hourly Reminders";
pub const DEFAULT_CHANNEL_DESCRIPTION: &str = "Hourly reminders to play Find My Puppy";
pub const DEFAULT_TITLE: &str = "Find My Puppy";
pub const FIRST_NOTIFICATION_ID: i64 = 1000;

// Schedule tuning ------------------------------------------------------------
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;
/// Periodic work cannot run more often than this on the host platform.
pub const MIN_INTERVAL_MINUTES: u32 = 15;
pub const DEFAULT_RETRY_BACKOFF_SECS: u64 = 30;
pub const MIN_RETRY_BACKOFF_SECS: u64 = 10;
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 5 * 60 * 60;

/// Used only when the normal pool is empty and no festive text applies.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Your puppy is hiding again! Come find it!";

/// Build the persisted key that records the last festive send for `festival_key`.
#[must_use]
pub fn festive_sent_key(festival_key: &str) -> String {
    format!("{KEY_FESTIVE_SENT_PREFIX}{festival_key}")
}
