//! Static message data: the hourly pool and the festival tables.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::DEFAULT_FALLBACK_MESSAGE;

/// Errors raised when catalog data is malformed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("festival `{key}` has invalid date `{date}` (expected YYYY-MM-DD)")]
    InvalidFestivalDate { key: String, date: String },
    #[error("festival `{key}` declares an empty message list")]
    EmptyFestivalMessages { key: String },
    #[error("catalog JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable message configuration injected into the engine.
///
/// Festival tables use ordered maps: when two festivals share a date the
/// lexicographically smallest key wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageCatalog {
    #[serde(default)]
    pub normal: Vec<String>,
    #[serde(default)]
    pub festival_dates: BTreeMap<String, String>,
    #[serde(default)]
    pub festival_messages: BTreeMap<String, Vec<String>>,
}

impl MessageCatalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            normal: Vec::new(),
            festival_dates: BTreeMap::new(),
            festival_messages: BTreeMap::new(),
        }
    }

    /// Build a catalog with only a normal pool.
    #[must_use]
    pub fn from_pool<I, T>(messages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            normal: messages.into_iter().map(Into::into).collect(),
            ..Self::empty()
        }
    }

    /// Register a festival date and its candidate messages.
    #[must_use]
    pub fn with_festival<I, T>(mut self, key: &str, iso_date: &str, messages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.festival_dates
            .insert(key.to_string(), iso_date.to_string());
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        if !messages.is_empty() {
            self.festival_messages.insert(key.to_string(), messages);
        }
        self
    }

    /// Load and validate a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the catalog fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog bundled with the app.
    ///
    /// # Panics
    ///
    /// Panics if the bundled asset is malformed, which the test suite rules out.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(include_str!("../assets/messages.json"))
            .unwrap_or_else(|err| panic!("bundled messages.json is invalid: {err}"))
    }

    /// Check festival dates parse and festival message lists are non-empty.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in key order.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (key, date) in &self.festival_dates {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(CatalogError::InvalidFestivalDate {
                    key: key.clone(),
                    date: date.clone(),
                });
            }
        }
        for (key, messages) in &self.festival_messages {
            if messages.is_empty() {
                return Err(CatalogError::EmptyFestivalMessages { key: key.clone() });
            }
        }
        Ok(())
    }

    /// Size of the normal pool (`N`).
    #[must_use]
    pub fn pool_len(&self) -> usize {
        self.normal.len()
    }

    #[must_use]
    pub fn normal_message(&self, index: usize) -> Option<&str> {
        self.normal.get(index).map(String::as_str)
    }

    /// First festival (in key order) scheduled on `iso_date`.
    #[must_use]
    pub fn festival_on(&self, iso_date: &str) -> Option<&str> {
        self.festival_dates
            .iter()
            .find(|(_, date)| date.as_str() == iso_date)
            .map(|(key, _)| key.as_str())
    }

    /// Candidate festive messages, `None` when the key has none configured.
    #[must_use]
    pub fn festive_messages(&self, festival_key: &str) -> Option<&[String]> {
        self.festival_messages
            .get(festival_key)
            .map(Vec::as_slice)
            .filter(|messages| !messages.is_empty())
    }

    /// Message used when configuration leaves nothing else to send.
    #[must_use]
    pub fn fallback_message(&self) -> &str {
        self.normal
            .first()
            .map_or(DEFAULT_FALLBACK_MESSAGE, String::as_str)
    }

    /// Festival keys that have messages but no date, and so can never fire.
    #[must_use]
    pub fn undated_festivals(&self) -> Vec<&str> {
        self.festival_messages
            .keys()
            .filter(|key| !self.festival_dates.contains_key(*key))
            .map(String::as_str)
            .collect()
    }
}
