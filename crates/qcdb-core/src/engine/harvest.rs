use super::context::PipelineContext;
use super::error::EngineError;
use super::outcome::{HarvestOutcome, TerminationCheck};
use super::tracker::StageTracker;
use crate::core::extract::gaussian::normal_termination;
use crate::core::models::stage::{Execution, Stage};
use crate::core::models::status::StageStatus;
use crate::core::utils::text::read_lines;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const CHECK_SENTINEL: &str = ".gaucheckok";

/// Moves logs and checkpoints out of the numbered job directories the
/// scheduler leaves in a stage directory, then removes those directories.
#[instrument(skip_all, name = "harvest", fields(stage = %stage.name))]
pub fn harvest(ctx: &PipelineContext, stage: &Stage) -> Result<HarvestOutcome, EngineError> {
    if !matches!(stage.execution, Execution::Scheduler { .. }) {
        return Err(EngineError::WrongExecution {
            stage: stage.name.clone(),
            expected: "scheduler",
        });
    }
    let status = StageTracker::new(ctx).status(stage);
    if status != StageStatus::InputsComplete {
        info!(%status, "Nothing to harvest.");
        return Ok(HarvestOutcome::Skipped { status });
    }

    let dir = ctx.stage_dir(stage);
    let destinations: Vec<(&str, PathBuf)> = ["log", "fchk"]
        .into_iter()
        .map(|ext| {
            let target = stage
                .output_with_extension(ext)
                .map_or_else(|| dir.join(ext), |a| a.dir(&dir));
            (ext, target)
        })
        .collect();
    for (_, target) in &destinations {
        fs::create_dir_all(target).map_err(|e| EngineError::io(target, e))?;
    }

    let mut moved = 0;
    let job_dirs = numbered_dirs(&dir)?;
    for job_dir in &job_dirs {
        for file in sorted_files(job_dir)? {
            let Some((_, target)) = destinations
                .iter()
                .find(|(ext, _)| file.extension().is_some_and(|e| e == *ext))
            else {
                continue;
            };
            let Some(name) = file.file_name() else {
                continue;
            };
            let dest = target.join(name);
            fs::rename(&file, &dest).map_err(|e| EngineError::io(&file, e))?;
            moved += 1;
        }
        fs::remove_dir_all(job_dir).map_err(|e| EngineError::io(job_dir, e))?;
    }

    info!(moved, job_dirs = job_dirs.len(), "Harvested scheduler output.");
    Ok(HarvestOutcome::Harvested {
        moved,
        job_dirs: job_dirs.len(),
    })
}

/// Verifies that every Gaussian log of a finished stage terminated normally.
///
/// When all of them did, an empty sentinel file is written next to them.
#[instrument(skip_all, name = "check_terminations", fields(stage = %stage.name))]
pub fn check_terminations(ctx: &PipelineContext, stage: &Stage) -> Result<TerminationCheck, EngineError> {
    let status = StageTracker::new(ctx).status(stage);
    if !status.is_complete() {
        return Ok(TerminationCheck::NotReady { status });
    }

    let log_dir = stage.log_dir(&ctx.stage_dir(stage));
    let logs: Vec<PathBuf> = sorted_files(&log_dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "log" || e == "out"))
        .collect();

    let abnormal: Vec<String> = logs
        .iter()
        .filter(|p| !read_lines(p).is_ok_and(|lines| normal_termination(&lines)))
        .map(|p| p.display().to_string())
        .collect();

    if !abnormal.is_empty() {
        warn!(count = abnormal.len(), "Abnormal terminations found.");
        return Ok(TerminationCheck::Abnormal { files: abnormal });
    }
    let sentinel = log_dir.join(CHECK_SENTINEL);
    fs::write(&sentinel, "").map_err(|e| EngineError::io(&sentinel, e))?;
    info!(checked = logs.len(), "All logs terminated normally.");
    Ok(TerminationCheck::AllNormal {
        checked: logs.len(),
    })
}

fn numbered_dirs(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut dirs: Vec<PathBuf> = entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut files: Vec<PathBuf> = entries(dir)?.into_iter().filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

fn entries(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    fs::read_dir(dir)
        .and_then(|rd| rd.map(|e| e.map(|e| e.path())).collect::<std::io::Result<Vec<_>>>())
        .map_err(|e| EngineError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tracker::tests::{context, touch};
    use tempfile::tempdir;

    const NORMAL_LOG: &str = " SCF Done\n Normal termination of Gaussian 16 at Mon Oct 19.\n";

    fn stage_with_inputs(root: &Path, names: &[&str]) {
        for name in names {
            touch(&root.join(format!("DFT-mod/{}-gau.gjf", name)));
        }
    }

    #[test]
    fn harvest_moves_job_outputs_and_removes_job_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let ctx = context(root, &["m1-major", "m1-minor"]);
        stage_with_inputs(root, &["m1-major", "m1-minor"]);
        touch(&root.join("DFT-mod/1001/m1-major-gau.log"));
        touch(&root.join("DFT-mod/1001/m1-major-gau.fchk"));
        touch(&root.join("DFT-mod/1001/m1-major-gau.chk"));
        touch(&root.join("DFT-mod/1002/m1-minor-gau.log"));
        touch(&root.join("DFT-mod/1002/m1-minor-gau.fchk"));
        touch(&root.join("DFT-mod/notes/keep.log"));
        let stage = ctx.stage("DFT-mod").unwrap();

        let outcome = harvest(&ctx, stage).unwrap();

        assert_eq!(outcome, HarvestOutcome::Harvested { moved: 4, job_dirs: 2 });
        assert!(!root.join("DFT-mod/1001").exists());
        assert!(!root.join("DFT-mod/1002").exists());
        assert!(root.join("DFT-mod/notes/keep.log").exists());
        assert!(root.join("DFT-mod/fchk/m1-minor-gau.fchk").is_file());
        assert_eq!(StageTracker::new(&ctx).status(stage), StageStatus::OutputsComplete);
    }

    #[test]
    fn harvest_outside_status_two_is_skipped() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), &["m1-major"]);
        let outcome = harvest(&ctx, ctx.stage("DFT-mod").unwrap()).unwrap();
        assert_eq!(outcome, HarvestOutcome::Skipped { status: StageStatus::NoDirectory });
    }

    #[test]
    fn harvest_rejects_xtb_stage() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), &["m1-major"]);
        let err = harvest(&ctx, ctx.stage("xtb-mod").unwrap()).unwrap_err();
        assert!(matches!(err, EngineError::WrongExecution { .. }));
    }

    #[test]
    fn check_writes_sentinel_when_all_terminations_are_normal() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let ctx = context(root, &["m1-major"]);
        stage_with_inputs(root, &["m1-major"]);
        touch(&root.join("DFT-mod/fchk/m1-major-gau.fchk"));
        touch(&root.join("DFT-mod/log/m1-major-gau.log"));
        fs::write(root.join("DFT-mod/log/m1-major-gau.log"), NORMAL_LOG).unwrap();

        let check = check_terminations(&ctx, ctx.stage("DFT-mod").unwrap()).unwrap();

        assert_eq!(check, TerminationCheck::AllNormal { checked: 1 });
        let sentinel = root.join("DFT-mod/log").join(CHECK_SENTINEL);
        assert_eq!(fs::read_to_string(sentinel).unwrap(), "");
    }

    #[test]
    fn check_lists_abnormal_logs_without_sentinel() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let ctx = context(root, &["a-major", "b-major"]);
        stage_with_inputs(root, &["a-major", "b-major"]);
        for name in ["a-major", "b-major"] {
            touch(&root.join(format!("DFT-mod/fchk/{}-gau.fchk", name)));
            touch(&root.join(format!("DFT-mod/log/{}-gau.log", name)));
        }
        fs::write(root.join("DFT-mod/log/a-major-gau.log"), NORMAL_LOG).unwrap();
        fs::write(root.join("DFT-mod/log/b-major-gau.log"), " Error termination via Lnk1e\n").unwrap();
        fs::write(root.join("DFT-mod/log/extra.out"), "").unwrap();

        let check = check_terminations(&ctx, ctx.stage("DFT-mod").unwrap()).unwrap();

        let TerminationCheck::Abnormal { files } = check else {
            panic!("expected abnormal terminations");
        };
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b-major-gau.log"));
        assert!(files[1].ends_with("extra.out"));
        assert!(!root.join("DFT-mod/log").join(CHECK_SENTINEL).exists());
    }

    #[test]
    fn check_before_completion_is_not_ready() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let ctx = context(root, &["m1-major"]);
        stage_with_inputs(root, &["m1-major"]);
        let check = check_terminations(&ctx, ctx.stage("DFT-mod").unwrap()).unwrap();
        assert_eq!(check, TerminationCheck::NotReady { status: StageStatus::InputsComplete });
    }
}
