//! Checks run against a finished simulation.
use std::collections::{BTreeMap, HashSet};

use puppy_notify::{MessageCatalog, MessageSource, iso_date};

use super::simulation::{SimulationConfig, SimulationSummary};

/// Every failed check, as human-readable lines.
#[must_use]
pub fn evaluate(
    summary: &SimulationSummary,
    catalog: &MessageCatalog,
    config: &SimulationConfig,
    fresh_store: bool,
) -> Vec<String> {
    let mut failures = check_cycles(summary);
    failures.extend(check_boundaries(summary));
    failures.extend(check_festivals(summary, catalog, config, fresh_store));
    failures
}

/// Split the rotation into cycles at each reshuffle.
#[must_use]
pub fn cycles(summary: &SimulationSummary) -> Vec<Vec<usize>> {
    let mut out: Vec<Vec<usize>> = Vec::new();
    for (index, reshuffled) in summary.rotation_sequence() {
        if reshuffled || out.is_empty() {
            out.push(Vec::new());
        }
        if let Some(current) = out.last_mut() {
            current.push(index);
        }
    }
    out
}

/// Every completed cycle shows each pool index exactly once.
///
/// The last cycle may still be running, and a run that resumes persisted
/// state may open with the tail of an earlier cycle; only those two may be
/// shorter than the pool.
#[must_use]
pub fn check_cycles(summary: &SimulationSummary) -> Vec<String> {
    let resumed = summary
        .rotation_sequence()
        .first()
        .is_some_and(|(_, reshuffled)| !reshuffled);
    let cycles = cycles(summary);
    let last = cycles.len().saturating_sub(1);

    let mut failures = Vec::new();
    for (number, cycle) in cycles.iter().enumerate() {
        let partial_allowed = number == last || (number == 0 && resumed);
        if cycle.len() > summary.pool_len {
            failures.push(format!(
                "cycle {number} ran {} ticks for a pool of {}",
                cycle.len(),
                summary.pool_len
            ));
        } else if cycle.len() < summary.pool_len && !partial_allowed {
            failures.push(format!(
                "cycle {number} reshuffled after {} of {} messages",
                cycle.len(),
                summary.pool_len
            ));
        }
        let mut seen = HashSet::new();
        for index in cycle {
            if *index >= summary.pool_len {
                failures.push(format!("cycle {number} emitted out-of-pool message {index}"));
            } else if !seen.insert(*index) {
                failures.push(format!("cycle {number} repeated message {index}"));
            }
        }
    }
    failures
}

/// The first message of each new cycle differs from the last one shown.
#[must_use]
pub fn check_boundaries(summary: &SimulationSummary) -> Vec<String> {
    if summary.pool_len < 2 {
        return Vec::new();
    }
    let sequence = summary.rotation_sequence();
    sequence
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1].1 && pair[0].0 == pair[1].0)
        .map(|(position, pair)| {
            format!(
                "message {} repeated across reshuffle at rotation tick {}",
                pair[1].0,
                position + 1
            )
        })
        .collect()
}

/// At most one festive message per (festival, date); with a fresh store,
/// exactly one on each festival date inside the window.
#[must_use]
pub fn check_festivals(
    summary: &SimulationSummary,
    catalog: &MessageCatalog,
    config: &SimulationConfig,
    fresh_store: bool,
) -> Vec<String> {
    let mut failures = Vec::new();
    let mut sent: BTreeMap<(String, String), usize> = BTreeMap::new();
    for record in &summary.records {
        if let MessageSource::Festival { key } = &record.picked.source {
            *sent.entry((key.clone(), record.date.clone())).or_default() += 1;
        }
    }

    for ((key, date), count) in &sent {
        if *count > 1 {
            failures.push(format!("festival `{key}` sent {count} times on {date}"));
        }
        if catalog.festival_on(date) != Some(key.as_str()) {
            failures.push(format!("festival `{key}` fired on unscheduled date {date}"));
        }
    }

    if fresh_store && config.ticks_per_day > 0 {
        for date in config.dates().map(iso_date) {
            if let Some(key) = catalog.festival_on(&date)
                && !sent.contains_key(&(key.to_string(), date.clone()))
            {
                failures.push(format!("festival `{key}` missed on {date}"));
            }
        }
    }

    failures
}
