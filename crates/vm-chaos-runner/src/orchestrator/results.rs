//! Results writing and summary display

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tracing::info;

use super::{ChaosOutcome, PreparedScripts, RevertStatus};
use crate::config::ChaosSpec;

/// JSON document describing a finished run
pub fn results_json(spec: &ChaosSpec, run_id: &str, outcome: &ChaosOutcome) -> serde_json::Value {
    let targets: Vec<String> = spec.targets.targets.iter().map(ToString::to_string).collect();
    let base = serde_json::json!({
        "run_id": run_id,
        "experiment": spec.experiment_name,
        "fault_type": spec.fault.fault_type,
        "sequence": spec.sequence,
        "targets": targets,
        "duration_seconds": spec.timing.duration.as_secs(),
        "interval_seconds": spec.timing.interval.as_secs(),
    });

    let result = match outcome {
        ChaosOutcome::Completed(summary) => serde_json::json!({
            "outcome": "completed",
            "iterations": summary.iterations,
            "elapsed_seconds": summary.elapsed.as_secs_f64(),
        }),
        ChaosOutcome::Aborted(report) => serde_json::json!({
            "outcome": "aborted",
            "all_reverted": report.all_reverted(),
            "reverts": report.reverts,
        }),
    };

    let mut output = base;
    if let (Some(out), Some(extra)) = (output.as_object_mut(), result.as_object()) {
        out.extend(extra.clone());
    }
    output
}

/// Write the results document to `path`
pub fn write_results(
    path: &str,
    spec: &ChaosSpec,
    run_id: &str,
    outcome: &ChaosOutcome,
) -> Result<()> {
    let output = results_json(spec, run_id, outcome);
    std::fs::write(path, serde_json::to_string_pretty(&output)?)
        .with_context(|| format!("Failed to write results to {path}"))?;
    info!(path = %path, "Results written");
    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.into_iter().map(Cell::new).collect::<Vec<_>>());
    table
}

/// Print a summary table of the run to stdout
pub fn print_results_summary(spec: &ChaosSpec, outcome: &ChaosOutcome) {
    match outcome {
        ChaosOutcome::Completed(summary) => {
            println!("\n=== Chaos Completed ===\n");
            let mut table = new_table(vec!["Fault", "Sequence", "Targets", "Iterations", "Elapsed (s)"]);
            table.add_row(vec![
                Cell::new(spec.fault.fault_type),
                Cell::new(spec.sequence),
                Cell::new(spec.targets.targets.len()),
                Cell::new(summary.iterations),
                Cell::new(format!("{:.1}", summary.elapsed.as_secs_f64())),
            ]);
            println!("{table}");
        }
        ChaosOutcome::Aborted(report) => {
            println!("\n=== Chaos Aborted ===\n");
            if report.reverts.is_empty() {
                println!("Aborted before any fault was injected.");
                return;
            }
            let mut table = new_table(vec!["Target", "Revert", "Detail"]);
            for revert in &report.reverts {
                let (status, detail) = match &revert.status {
                    RevertStatus::Reverted => ("Reverted", ""),
                    RevertStatus::SubmitFailed { message } => ("Submit failed", message.as_str()),
                    RevertStatus::AwaitFailed { message } => ("Await failed", message.as_str()),
                    RevertStatus::ScriptFailed { fragment } => ("Script failed", fragment.as_str()),
                };
                table.add_row(vec![
                    Cell::new(&revert.target),
                    Cell::new(status),
                    Cell::new(detail),
                ]);
            }
            println!("{table}");
        }
    }
}

/// Print what a run would do, without contacting any target
pub fn print_plan(spec: &ChaosSpec, scripts: &PreparedScripts) {
    println!("\n=== Chaos Plan ===\n");

    let mut table = new_table(vec!["Setting", "Value"]);
    let targets: Vec<String> = spec.targets.targets.iter().map(ToString::to_string).collect();
    let rows = [
        ("Experiment", spec.experiment_name.clone()),
        ("Fault", spec.fault.fault_type.to_string()),
        ("Sequence", spec.sequence.to_string()),
        ("Targets", targets.join(", ")),
        ("Operating system", spec.scripts.os.to_string()),
        ("Duration", format!("{}s", spec.timing.duration.as_secs())),
        ("Interval", format!("{}s", spec.timing.interval.as_secs())),
        ("Ramp time", format!("{}s", spec.timing.ramp_time.as_secs())),
        ("Expected iterations", spec.timing.expected_iterations().to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    println!("{table}");

    for script in [&scripts.inject, &scripts.revert] {
        println!(
            "\n{} script ({} lines), parameters:",
            script.phase,
            script.lines.len()
        );
        let mut params = new_table(vec!["Name", "Value"]);
        for p in script.parameters.iter() {
            params.add_row(vec![Cell::new(&p.name), Cell::new(&p.value)]);
        }
        println!("{params}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{AbortReport, RunSummary, TargetRevert};
    use crate::test_support::chaos_spec;
    use std::time::Duration;
    use vm_chaos_common::Target;

    #[test]
    fn completed_results_document() {
        let spec = chaos_spec(&["vm-1", "vm-2"]);
        let outcome = ChaosOutcome::Completed(RunSummary {
            iterations: 2,
            elapsed: Duration::from_secs(10),
        });
        let json = results_json(&spec, "run-1", &outcome);
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["iterations"], 2);
        assert_eq!(json["fault_type"], "http-chaos");
        assert_eq!(json["targets"][1], "vm-2");
        assert_eq!(json["run_id"], "run-1");
    }

    #[test]
    fn aborted_results_document() {
        let spec = chaos_spec(&["vm-1"]);
        let outcome = ChaosOutcome::Aborted(AbortReport {
            reverts: vec![TargetRevert {
                target: Target::Instance("vm-1".into()),
                status: RevertStatus::ScriptFailed {
                    fragment: "error: toxic missing".into(),
                },
            }],
        });
        let json = results_json(&spec, "run-2", &outcome);
        assert_eq!(json["outcome"], "aborted");
        assert_eq!(json["all_reverted"], false);
        assert_eq!(json["reverts"][0]["status"], "script_failed");
    }

    #[test]
    fn writes_results_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let spec = chaos_spec(&["vm-1"]);
        let outcome = ChaosOutcome::Aborted(AbortReport::default());

        write_results(path.to_str().unwrap(), &spec, "run-3", &outcome).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["outcome"], "aborted");
        assert_eq!(written["all_reverted"], true);
    }
}
