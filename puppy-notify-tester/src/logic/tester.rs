use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use puppy_notify::{JsonFileStore, MemoryStore, MessageCatalog, PersistedStore};

use crate::logic::invariants::{cycles, evaluate};
use crate::logic::simulation::{SimulationConfig, SimulationSession, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub seed: u64,
    pub start_date: String,
    pub days: u32,
    pub ticks: usize,
    pub festive: usize,
    pub cycles: usize,
    pub passed: bool,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Runs one simulation per seed and checks the rotation invariants.
pub struct LogicTester {
    catalog: Arc<MessageCatalog>,
    store_dir: Option<PathBuf>,
    namespace: String,
    verbose: bool,
}

impl LogicTester {
    pub fn new(catalog: Arc<MessageCatalog>, namespace: impl Into<String>, verbose: bool) -> Self {
        Self {
            catalog,
            store_dir: None,
            namespace: namespace.into(),
            verbose,
        }
    }

    /// Persist each seed's state as `<dir>/<namespace>-<seed>.json`.
    #[must_use]
    pub fn with_store_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.store_dir = dir;
        self
    }

    pub fn run_seeds(&self, base: SimulationConfig, seeds: &[u64]) -> Vec<SimulationResult> {
        seeds
            .iter()
            .map(|&seed| {
                let config = SimulationConfig { seed, ..base };
                if self.verbose {
                    println!(
                        "🐶 Simulating seed {} ({} days from {})",
                        seed.to_string().bright_white(),
                        config.days,
                        config.start_date
                    );
                }
                self.run_single(&config)
            })
            .collect()
    }

    fn run_single(&self, config: &SimulationConfig) -> SimulationResult {
        let start_time = Instant::now();
        let outcome = match &self.store_dir {
            Some(dir) => {
                let namespace = format!("{}-{}", self.namespace, config.seed);
                let fresh = !dir.join(format!("{namespace}.json")).exists();
                JsonFileStore::open(dir, &namespace)
                    .map_err(|err| format!("failed to open store: {err}"))
                    .and_then(|store| self.simulate(config, store, fresh))
            }
            None => self.simulate(config, MemoryStore::new(), true),
        };

        let (summary, failures) = match outcome {
            Ok(pair) => pair,
            Err(failure) => (None, vec![failure]),
        };

        SimulationResult {
            seed: config.seed,
            start_date: config.start_date.to_string(),
            days: config.days,
            ticks: summary.as_ref().map_or(0, |s| s.records.len()),
            festive: summary.as_ref().map_or(0, SimulationSummary::festive_count),
            cycles: summary.as_ref().map_or(0, |s| cycles(s).len()),
            passed: failures.is_empty(),
            failures,
            duration: start_time.elapsed(),
        }
    }

    fn simulate<S: PersistedStore>(
        &self,
        config: &SimulationConfig,
        store: S,
        fresh_store: bool,
    ) -> Result<(Option<SimulationSummary>, Vec<String>), String> {
        let session = SimulationSession::new(*config, Arc::clone(&self.catalog), store);
        let summary = session
            .run()
            .map_err(|err| format!("tick failed: {err}"))?;
        let failures = evaluate(&summary, &self.catalog, config, fresh_store);
        Ok((Some(summary), failures))
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
