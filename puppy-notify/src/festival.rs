//! Festival-day override: one festive message per festival per date.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::MessageCatalog;
use crate::constants::festive_sent_key;
use crate::hash::festive_index;
use crate::store::{PersistedStore, StoreValue};

/// Last ISO date each festival's message went out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FestivalSentLog(pub BTreeMap<String, String>);

impl FestivalSentLog {
    /// Read the log entries for every dated festival in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns the store error if any entry cannot be read.
    pub fn load<S: PersistedStore + ?Sized>(
        store: &S,
        catalog: &MessageCatalog,
    ) -> Result<Self, S::Error> {
        let mut log = BTreeMap::new();
        for key in catalog.festival_dates.keys() {
            if let Some(date) = store.get_string(&festive_sent_key(key))? {
                log.insert(key.clone(), date);
            }
        }
        Ok(Self(log))
    }

    #[must_use]
    pub fn last_sent(&self, festival_key: &str) -> Option<&str> {
        self.0.get(festival_key).map(String::as_str)
    }
}

/// A festive message chosen for today, plus the log write that claims it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FestiveDecision {
    pub festival_key: String,
    pub iso_date: String,
    pub body: String,
    /// The festival had no messages configured, so the fallback was used.
    pub used_fallback: bool,
}

impl FestiveDecision {
    /// Store entry recording this send.
    #[must_use]
    pub fn log_entry(&self) -> (String, StoreValue) {
        (
            festive_sent_key(&self.festival_key),
            StoreValue::Str(self.iso_date.clone()),
        )
    }
}

/// Decide whether today overrides the rotation.
///
/// `last_sent` is the festival's logged date, looked up by the caller once
/// it knows which festival matches; see [`check_festival`].
#[must_use]
pub fn festival_override(
    catalog: &MessageCatalog,
    iso_date: &str,
    last_sent: impl FnOnce(&str) -> Option<String>,
) -> Option<FestiveDecision> {
    let festival_key = catalog.festival_on(iso_date)?;
    if last_sent(festival_key).as_deref() == Some(iso_date) {
        return None;
    }

    let (body, used_fallback) = match catalog.festive_messages(festival_key) {
        Some(messages) => {
            let slot = festive_index(festival_key, iso_date, messages.len()).unwrap_or(0);
            (messages[slot].clone(), false)
        }
        None => (catalog.fallback_message().to_string(), true),
    };

    Some(FestiveDecision {
        festival_key: festival_key.to_string(),
        iso_date: iso_date.to_string(),
        body,
        used_fallback,
    })
}

/// Festival check against a persisted log.
///
/// # Errors
///
/// Returns the store error if the log entry cannot be read.
pub fn check_festival<S: PersistedStore + ?Sized>(
    catalog: &MessageCatalog,
    store: &S,
    iso_date: &str,
) -> Result<Option<FestiveDecision>, S::Error> {
    let Some(festival_key) = catalog.festival_on(iso_date) else {
        return Ok(None);
    };
    let logged = store.get_string(&festive_sent_key(festival_key))?;
    Ok(festival_override(catalog, iso_date, |_| logged))
}
