use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::SimulationResult;

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[SimulationResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Rotation Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = total - passed;

    writeln!(out, "Total seeds: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", failed.to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} seed {}", status, result.seed.to_string().bold())?;
        writeln!(
            out,
            "   {} ticks over {} days from {}",
            result.ticks, result.days, result.start_date
        )?;
        writeln!(
            out,
            "   Festive: {}  Cycles: {}  Time: {:?}",
            result.festive, result.cycles, result.duration
        )?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[SimulationResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[SimulationResult]) -> Result<()> {
    writeln!(out, "# Find My Puppy Reminder Simulation\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total seeds**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}\n", total - passed)?;

    writeln!(out, "## Seeds\n")?;
    writeln!(out, "| Seed | Status | Ticks | Festive | Cycles |")?;
    writeln!(out, "|------|--------|-------|---------|--------|")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            result.seed, status, result.ticks, result.festive, result.cycles
        )?;
    }

    for result in results.iter().filter(|r| !r.passed) {
        writeln!(out, "\n### Seed {} failures\n", result.seed)?;
        for failure in &result.failures {
            writeln!(out, "- {failure}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(seed: u64, failures: Vec<String>) -> SimulationResult {
        SimulationResult {
            seed,
            start_date: "2026-11-07".to_string(),
            days: 2,
            ticks: 48,
            festive: 1,
            cycles: 2,
            passed: failures.is_empty(),
            failures,
            duration: Duration::from_millis(3),
        }
    }

    #[test]
    fn markdown_lists_failures_per_seed() {
        let results = vec![
            result(1, Vec::new()),
            result(2, vec!["cycle 0 repeated message 4".to_string()]),
        ];
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &results).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("- **Failed**: 1"));
        assert!(text.contains("| 1 | ✅ | 48 | 1 | 2 |"));
        assert!(text.contains("### Seed 2 failures"));
        assert!(text.contains("- cycle 0 repeated message 4"));
    }

    #[test]
    fn json_and_console_reports_render() {
        let results = vec![result(7, Vec::new())];
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &results).unwrap();
        let parsed: Vec<SimulationResult> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed[0].seed, 7);

        let mut buf = Vec::new();
        generate_console_report(&mut buf, &results, Duration::from_millis(5)).unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("Total seeds: 1"));
        assert!(text.contains("seed"));
    }
}
