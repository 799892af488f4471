use super::open_database;
use crate::cli::{DatabaseArgs, StatusArgs};
use crate::error::Result;
use qcdb::engine::tracker::{StageReport, StageTracker};
use std::fmt::Write;

pub fn run(args: StatusArgs, db: &DatabaseArgs) -> Result<()> {
    let ctx = open_database(db)?;
    let tracker = StageTracker::new(&ctx);

    let reports = if args.stages.is_empty() {
        tracker.inspect_all()
    } else {
        args.stages
            .iter()
            .map(|name| tracker.inspect_named(name))
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    print!("{}", render_reports(&reports, args.list));
    Ok(())
}

/// One line per stage; with `details`, the missing structures follow each line.
pub fn render_reports(reports: &[StageReport], details: bool) -> String {
    let width = reports.iter().map(|r| r.stage.len()).max().unwrap_or(0);
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "{:<width$}  {}", report.stage, report.status);
        if !details {
            continue;
        }
        if !report.missing_shared_files.is_empty() {
            let _ = writeln!(
                out,
                "    missing shared files: {}",
                report.missing_shared_files.join(", ")
            );
        }
        if !report.missing_inputs.is_empty() {
            let _ = writeln!(out, "    missing inputs: {}", report.missing_inputs.join(", "));
        }
        if !report.missing_outputs.is_empty() {
            let _ = writeln!(out, "    missing outputs: {}", report.missing_outputs.join(", "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcdb::core::models::status::StageStatus;

    fn report(stage: &str, status: StageStatus, missing: &[&str]) -> StageReport {
        StageReport {
            stage: stage.to_string(),
            status,
            missing_inputs: missing.iter().map(|s| s.to_string()).collect(),
            missing_outputs: missing.iter().map(|s| s.to_string()).collect(),
            missing_shared_files: vec![],
        }
    }

    #[test]
    fn summary_aligns_stage_names() {
        let reports = vec![
            report("xtb-mod", StageStatus::OutputsComplete, &[]),
            report("DFT-mod-gau-sp", StageStatus::NoDirectory, &["m1-major"]),
        ];

        let text = render_reports(&reports, false);

        assert_eq!(
            text,
            "xtb-mod         3 (outputs complete)\nDFT-mod-gau-sp  0 (no directory)\n"
        );
    }

    #[test]
    fn details_list_missing_structures() {
        let reports = vec![report("xtb-mod", StageStatus::DirectoryExists, &["a", "b"])];

        let text = render_reports(&reports, true);

        assert!(text.contains("    missing inputs: a, b\n"));
        assert!(text.contains("    missing outputs: a, b\n"));
        assert!(!text.contains("shared files"));
    }
}
