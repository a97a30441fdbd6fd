use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use puppy_notify::constants::{KEY_INDEX, KEY_ORDER};
use puppy_notify::{
    JsonFileStore, MessageCatalog, NotifierConfig, PersistedStore, RotationEngine, RotationState,
    shuffled_order,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn temp_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "puppy-notify-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

#[test]
fn rotation_state_roundtrips_on_disk() {
    let dir = temp_dir("roundtrip");
    let mut rng = ChaCha20Rng::seed_from_u64(40);
    let state = RotationState {
        order: Some(shuffled_order(40, None, &mut rng)),
        index: 17,
        last_message_index: Some(3),
    };
    let mut store = JsonFileStore::open(&dir, "hourly").unwrap();
    store.put_all(&state.to_entries()).unwrap();

    let reopened = JsonFileStore::open(&dir, "hourly").unwrap();
    assert_eq!(RotationState::load(&reopened).unwrap(), state);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn rotation_resumes_after_restart() {
    let dir = temp_dir("restart");
    let config = NotifierConfig::default();
    let catalog = Arc::new(MessageCatalog::builtin());

    let mut seen = Vec::new();
    for run in 0..4_u64 {
        let store = JsonFileStore::open(&dir, &config.store_namespace).unwrap();
        let engine = RotationEngine::with_seed(Arc::clone(&catalog), store, run);
        for _ in 0..10 {
            seen.push(engine.pick_next(today()).unwrap().rotation_index().unwrap());
        }
    }

    let mut sorted = seen.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 40, "restarts broke the cycle: {seen:?}");
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn shrunken_pool_regenerates_order() {
    let dir = temp_dir("resize");
    let store = JsonFileStore::open(&dir, "hourly").unwrap();
    let big = RotationEngine::with_seed(Arc::new(MessageCatalog::builtin()), store, 1);
    for _ in 0..5 {
        big.pick_next(today()).unwrap();
    }
    drop(big);

    let store = JsonFileStore::open(&dir, "hourly").unwrap();
    let small = RotationEngine::with_seed(
        Arc::new(MessageCatalog::from_pool(["A", "B", "C"])),
        store,
        2,
    );
    let picked = small.pick_next(today()).unwrap();
    assert!(picked.rotation_index().unwrap() < 3);

    let store = small.into_store();
    assert_eq!(store.get_int(KEY_INDEX).unwrap(), Some(1));
    let order = store.get_string(KEY_ORDER).unwrap().unwrap();
    assert_eq!(order.split(',').count(), 3);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn festive_log_survives_restart() {
    let dir = temp_dir("festive");
    let christmas = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
    let catalog = Arc::new(MessageCatalog::builtin());

    let engine = RotationEngine::with_seed(
        Arc::clone(&catalog),
        JsonFileStore::open(&dir, "hourly").unwrap(),
        1,
    );
    assert!(engine.pick_next(christmas).unwrap().is_festive());
    drop(engine);

    let store = JsonFileStore::open(&dir, "hourly").unwrap();
    assert_eq!(
        store.get_string("festive_sent_christmas").unwrap(),
        Some("2026-12-25".to_string())
    );
    let engine = RotationEngine::with_seed(catalog, store, 2);
    assert!(!engine.pick_next(christmas).unwrap().is_festive());
    assert_eq!(
        engine.snapshot().unwrap().festival_log.last_sent("christmas"),
        Some("2026-12-25")
    );
    let _ = std::fs::remove_dir_all(dir);
}
