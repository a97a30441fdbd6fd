use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "puppy-notify-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_festivals_writes_output() {
    let exe = env!("CARGO_BIN_EXE_puppy-notify-tester");
    let output_path = temp_path("festivals");
    let status = Command::new(exe)
        .args(["--list-festivals", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Festivals:"));
    assert!(content.contains("diwali"));
    assert!(content.contains("2026-12-25"));
}

#[test]
fn cli_simulation_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_puppy-notify-tester");
    let output_path = temp_path("json");
    let output = Command::new(exe)
        .args([
            "--start-date",
            "2026-11-01",
            "--days",
            "10",
            "--seeds",
            "1,2",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Find My Puppy Reminder Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let results: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = results.as_array().expect("array");
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result["passed"], true);
        assert_eq!(result["ticks"], 240);
        assert_eq!(result["festive"], 1);
    }
}

#[test]
fn cli_once_persists_state() {
    let exe = env!("CARGO_BIN_EXE_puppy-notify-tester");
    let store_dir = temp_path("once");
    for _ in 0..2 {
        let status = Command::new(exe)
            .arg("--once")
            .arg("--store-dir")
            .arg(&store_dir)
            .status()
            .expect("run cli");
        assert!(status.success());
    }
    let raw = std::fs::read_to_string(store_dir.join("findmypuppy_hourly_notifications.json"))
        .expect("store file");
    let state: serde_json::Value = serde_json::from_str(&raw).expect("store json");
    assert_eq!(state["notif_id"], 1002);
    let _ = std::fs::remove_dir_all(store_dir);
}

#[test]
fn cli_rejects_bad_date() {
    let exe = env!("CARGO_BIN_EXE_puppy-notify-tester");
    let output = Command::new(exe)
        .args(["--start-date", "08/11/2026", "--days", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid date"));
}
