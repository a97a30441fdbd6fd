use chrono::{Days, NaiveDate};
use puppy_notify::{
    MessageCatalog, PersistedStore, PickedMessage, RotationEngine, TickError, iso_date,
};
use serde::Serialize;
use std::sync::Arc;

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub start_date: NaiveDate,
    pub days: u32,
    pub ticks_per_day: u32,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(seed: u64, start_date: NaiveDate) -> Self {
        Self {
            seed,
            start_date,
            days: 30,
            ticks_per_day: 24,
        }
    }

    #[must_use]
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    #[must_use]
    pub fn with_ticks_per_day(mut self, ticks_per_day: u32) -> Self {
        self.ticks_per_day = ticks_per_day;
        self
    }

    /// Every calendar date the simulation covers.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).filter_map(|offset| {
            self.start_date
                .checked_add_days(Days::new(u64::from(offset)))
        })
    }
}

/// One simulated tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub date: String,
    pub tick: u32,
    pub picked: PickedMessage,
}

/// Everything a simulation emitted.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub pool_len: usize,
    pub records: Vec<TickRecord>,
}

impl SimulationSummary {
    /// Pool indices emitted by the rotation, with their reshuffle flags.
    #[must_use]
    pub fn rotation_sequence(&self) -> Vec<(usize, bool)> {
        self.records
            .iter()
            .filter_map(|record| match record.picked.source {
                puppy_notify::MessageSource::Rotation { index, reshuffled } => {
                    Some((index, reshuffled))
                }
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn festive_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.picked.is_festive())
            .count()
    }
}

/// Core deterministic simulation harness used by the tester.
pub struct SimulationSession<S>
where
    S: PersistedStore,
{
    engine: RotationEngine<S>,
    config: SimulationConfig,
}

impl<S> SimulationSession<S>
where
    S: PersistedStore,
{
    pub fn new(config: SimulationConfig, catalog: Arc<MessageCatalog>, store: S) -> Self {
        Self {
            engine: RotationEngine::with_seed(catalog, store, config.seed),
            config,
        }
    }

    /// Run every tick of every simulated day.
    ///
    /// # Errors
    ///
    /// Returns the first tick error; simulated stores only fail on I/O.
    pub fn run(&self) -> Result<SimulationSummary, TickError> {
        let mut records = Vec::new();
        for date in self.config.dates() {
            for tick in 0..self.config.ticks_per_day {
                let picked = self.engine.pick_next(date)?;
                log::debug!("{} #{tick}: {}", iso_date(date), picked.body);
                records.push(TickRecord {
                    date: iso_date(date),
                    tick,
                    picked,
                });
            }
        }
        Ok(SimulationSummary {
            seed: self.config.seed,
            pool_len: self.engine.catalog().pool_len(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puppy_notify::MemoryStore;

    #[test]
    fn runs_requested_ticks() {
        let start = NaiveDate::from_ymd_opt(2026, 11, 7).unwrap();
        let config = SimulationConfig::new(9, start)
            .with_days(3)
            .with_ticks_per_day(4);
        assert_eq!(config.dates().count(), 3);
        let session = SimulationSession::new(
            config,
            Arc::new(MessageCatalog::builtin()),
            MemoryStore::new(),
        );
        let summary = session.run().unwrap();
        assert_eq!(summary.records.len(), 12);
        assert_eq!(summary.festive_count(), 1);
        assert_eq!(summary.rotation_sequence().len(), 11);
        assert_eq!(summary.pool_len, 40);
    }
}
