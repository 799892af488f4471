use super::context::PipelineContext;
use super::error::EngineError;
use super::launcher::{Invocation, Launcher};
use super::outcome::{Failure, RunOutcome};
use super::progress::{Progress, ProgressReporter};
use super::tracker::StageTracker;
use crate::core::models::stage::{Execution, Stage, XtbJob};
use crate::core::models::structure::Structure;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Files xtb writes under fixed names, and the artifact tail each becomes.
const XTB_PRODUCTS: [(&str, &str); 3] = [
    ("charges", ".charges"),
    ("wbo", ".wbo"),
    ("xtbopt.xyz", "-out.xyz"),
];

const XTB_SCRATCH: [&str; 4] = ["xtbrestart", "xtbtopo.mol", ".xtboptok", "xtbopt.log"];

const OPT_SENTINEL: &str = ".xtboptok";

/// Runs xtb for every structure of `stage` whose outputs are missing.
///
/// Calls are made one at a time with the stage directory as working
/// directory. A structure whose run fails is recorded and the batch
/// continues.
#[instrument(skip_all, name = "run", fields(stage = %stage.name))]
pub fn run(
    ctx: &PipelineContext,
    stage: &Stage,
    launcher: &dyn Launcher,
    reporter: &ProgressReporter,
) -> Result<RunOutcome, EngineError> {
    let Execution::Xtb { job, control_file } = &stage.execution else {
        return Err(EngineError::WrongExecution {
            stage: stage.name.clone(),
            expected: "xtb",
        });
    };

    let report = StageTracker::new(ctx).inspect(stage);
    if !report.status.inputs_complete() {
        warn!(status = %report.status, "Inputs are not complete; nothing to run.");
        return Ok(RunOutcome::NotReady {
            status: report.status,
        });
    }
    if report.status.is_complete() {
        info!("Outputs already complete.");
        return Ok(RunOutcome::AlreadyDone);
    }

    let dir = ctx.stage_dir(stage);
    reporter.begin(
        format!("Running xtb in {}", stage.name),
        report.missing_outputs.len() as u64,
    );
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for name in &report.missing_outputs {
        let structure = Structure::new(name.as_str());
        let invocation = xtb_invocation(ctx, stage, *job, control_file.as_deref(), &dir, &structure);
        match run_structure(launcher, &invocation, stage, *job, &dir, &structure) {
            Ok(()) => {
                debug!(structure = %structure, "xtb finished.");
                succeeded.push(structure.name().to_string());
            }
            Err(reason) => {
                warn!(structure = %structure, "xtb failed: {}", reason);
                reporter.fail(structure.name(), &reason);
                failed.push(Failure::new(structure.name(), reason));
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.finish();

    info!(
        succeeded = succeeded.len(),
        failed = failed.len(),
        "xtb batch finished."
    );
    Ok(RunOutcome::Ran { succeeded, failed })
}

/// Hands a whole scheduler stage to the queueing system in one call.
#[instrument(skip_all, name = "submit", fields(stage = %stage.name))]
pub fn submit(
    ctx: &PipelineContext,
    stage: &Stage,
    launcher: &dyn Launcher,
) -> Result<RunOutcome, EngineError> {
    let Execution::Scheduler { args } = &stage.execution else {
        return Err(EngineError::WrongExecution {
            stage: stage.name.clone(),
            expected: "scheduler",
        });
    };

    let status = StageTracker::new(ctx).status(stage);
    if !status.inputs_complete() {
        warn!(%status, "Inputs are not complete; nothing to submit.");
        return Ok(RunOutcome::NotReady { status });
    }
    if status.is_complete() {
        info!("Outputs already complete.");
        return Ok(RunOutcome::AlreadyDone);
    }

    let invocation =
        Invocation::new(&ctx.config.scheduler.program, ctx.stage_dir(stage)).args(args.iter().cloned());
    let accepted = launcher.launch(&invocation)?;
    if accepted {
        info!("Submitted: {}", invocation.command_line());
    } else {
        warn!("Scheduler rejected: {}", invocation.command_line());
    }
    Ok(RunOutcome::Submitted { accepted })
}

fn xtb_invocation(
    ctx: &PipelineContext,
    stage: &Stage,
    job: XtbJob,
    control_file: Option<&str>,
    dir: &Path,
    structure: &Structure,
) -> Invocation {
    let xtb = &ctx.config.xtb;
    let mut invocation = Invocation::new(&xtb.program, dir)
        .arg(stage.input.file_name(structure, &stage.suffix))
        .arg(&xtb.method_flag)
        .args(["--chrg".to_string(), xtb.charge.to_string()])
        .args(["--uhf".to_string(), xtb.uhf.to_string()])
        .stdout_to(dir.join(structure.artifact_name(&stage.suffix, ".log")));
    if let Some(control) = control_file {
        invocation = invocation.args(["--input", control]);
    }
    if job == XtbJob::Opt {
        invocation = invocation.arg("--opt");
    }
    invocation
}

fn run_structure(
    launcher: &dyn Launcher,
    invocation: &Invocation,
    stage: &Stage,
    job: XtbJob,
    dir: &Path,
    structure: &Structure,
) -> Result<(), String> {
    remove_if_present(&dir.join(OPT_SENTINEL)).map_err(|e| e.to_string())?;

    let result = launcher
        .launch(invocation)
        .map_err(|e| e.to_string())
        .and_then(|exited_ok| {
            if !exited_ok {
                Err("xtb exited with a non-zero status".to_string())
            } else if job == XtbJob::Opt && !dir.join(OPT_SENTINEL).is_file() {
                Err("optimization did not converge".to_string())
            } else {
                collect_products(stage, dir, structure).map_err(|e| e.to_string())
            }
        });

    for scratch in XTB_SCRATCH {
        if let Err(e) = remove_if_present(&dir.join(scratch)) {
            warn!("Could not remove {}: {}", scratch, e);
        }
    }
    result
}

/// Renames xtb's fixed-name products to structure-qualified artifacts.
fn collect_products(stage: &Stage, dir: &Path, structure: &Structure) -> io::Result<()> {
    for (product, tail) in XTB_PRODUCTS {
        let Some(artifact) = stage.outputs.iter().find(|a| a.tail == tail) else {
            continue;
        };
        let source = dir.join(product);
        if source.is_file() {
            fs::rename(&source, artifact.path(dir, structure, &stage.suffix))?;
        }
    }
    Ok(())
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::status::StageStatus;
    use crate::engine::generator::generate;
    use crate::engine::generator::tests::seed_database;
    use crate::engine::launcher::tests::FakeLauncher;
    use crate::engine::tracker::tests::context;
    use tempfile::tempdir;

    /// Behaves like a converged xtb run.
    fn fake_xtb(inv: &Invocation) -> bool {
        let dir = &inv.working_dir;
        if let Some(log) = &inv.stdout {
            fs::write(log, ":: TOTAL ENERGY  -5.07 Eh ::\n").unwrap();
        }
        fs::write(dir.join("charges"), "-0.1\n0.1\n").unwrap();
        fs::write(dir.join("wbo"), "1 2 0.95\n").unwrap();
        fs::write(dir.join("xtbrestart"), "").unwrap();
        if inv.args.iter().any(|a| a == "--opt") {
            fs::write(dir.join("xtbopt.xyz"), "1\nopt\nO 0 0 0\n").unwrap();
            fs::write(dir.join("xtbopt.log"), "").unwrap();
            fs::write(dir.join(".xtboptok"), "").unwrap();
        }
        true
    }

    #[test]
    fn run_before_inputs_is_not_ready() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), &["m1-major"]);
        let launcher = FakeLauncher::new(fake_xtb);

        let outcome = run(&ctx, ctx.stage("xtb-mod").unwrap(), &launcher, &ProgressReporter::new()).unwrap();

        assert_eq!(outcome, RunOutcome::NotReady { status: StageStatus::NoDirectory });
        assert!(launcher.calls.borrow().is_empty());
    }

    #[test]
    fn run_optimization_completes_stage_and_cleans_scratch() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        seed_database(root, &["m1-major", "m1-minor"]);
        let ctx = context(root, &["m1-major", "m1-minor"]);
        let stage = ctx.stage("xtb-mod").unwrap();
        let reporter = ProgressReporter::new();
        generate(&ctx, stage, false, &reporter).unwrap();
        let launcher = FakeLauncher::new(fake_xtb);

        let outcome = run(&ctx, stage, &launcher, &reporter).unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Ran {
                succeeded: vec!["m1-major".into(), "m1-minor".into()],
                failed: vec![],
            }
        );
        let calls = launcher.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].args,
            vec!["m1-major-xtb.xyz", "--gfn2", "--chrg", "0", "--uhf", "0", "--input", "constrain.inp", "--opt"]
        );
        assert_eq!(calls[0].working_dir, root.join("xtb-mod"));
        assert_eq!(calls[0].stdout, Some(root.join("xtb-mod/m1-major-xtb.log")));

        assert_eq!(StageTracker::new(&ctx).status(stage), StageStatus::OutputsComplete);
        for scratch in XTB_SCRATCH {
            assert!(!root.join("xtb-mod").join(scratch).exists(), "{} left behind", scratch);
        }
        assert!(!root.join("xtb-mod/charges").exists());
        assert_eq!(
            fs::read_to_string(root.join("xtb-mod/m1-minor-xtb-out.xyz")).unwrap(),
            "1\nopt\nO 0 0 0\n"
        );
        assert_eq!(run(&ctx, stage, &launcher, &reporter).unwrap(), RunOutcome::AlreadyDone);
    }

    #[test]
    fn unconverged_optimization_is_a_failure() {
        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["m1-major"]);
        let ctx = context(dir.path(), &["m1-major"]);
        let stage = ctx.stage("xtb-fixmod").unwrap();
        generate(&ctx, stage, false, &ProgressReporter::new()).unwrap();
        let launcher = FakeLauncher::new(|inv: &Invocation| {
            fs::write(inv.working_dir.join("charges"), "0.0\n").unwrap();
            true
        });

        let outcome = run(&ctx, stage, &launcher, &ProgressReporter::new()).unwrap();

        let RunOutcome::Ran { succeeded, failed } = outcome else {
            panic!("expected a run");
        };
        assert!(succeeded.is_empty());
        assert_eq!(failed[0].structure, "m1-major");
        assert_eq!(StageTracker::new(&ctx).status(stage), StageStatus::InputsComplete);
    }

    #[test]
    fn failed_run_emits_a_structure_failure_event() {
        use std::sync::{Arc, Mutex};

        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["m1-major"]);
        let ctx = context(dir.path(), &["m1-major"]);
        let stage = ctx.stage("xtb-fixmod").unwrap();
        generate(&ctx, stage, false, &ProgressReporter::new()).unwrap();
        let launcher = FakeLauncher::new(|_: &Invocation| false);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::StructureFailed { structure, reason } = event {
                sink.lock().unwrap().push((structure, reason));
            }
        }));

        run(&ctx, stage, &launcher, &reporter).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "m1-major");
        assert_eq!(events[0].1, "xtb exited with a non-zero status");
    }

    #[test]
    fn single_point_chain_runs_without_opt_flag() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        seed_database(root, &["m1-major"]);
        let ctx = context(root, &["m1-major"]);
        let reporter = ProgressReporter::new();
        let launcher = FakeLauncher::new(fake_xtb);
        let opt = ctx.stage("xtb-mod").unwrap();
        let sp = ctx.stage("xtb-mod-xtb-sp").unwrap();
        let tracker = StageTracker::new(&ctx);

        let mut last = tracker.status(sp);
        generate(&ctx, opt, false, &reporter).unwrap();
        run(&ctx, opt, &launcher, &reporter).unwrap();
        for step in 0..2 {
            if step == 0 {
                generate(&ctx, sp, false, &reporter).unwrap();
            } else {
                run(&ctx, sp, &launcher, &reporter).unwrap();
            }
            let status = tracker.status(sp);
            assert!(status >= last);
            last = status;
        }

        assert_eq!(last, StageStatus::OutputsComplete);
        let calls = launcher.calls.borrow();
        assert_eq!(
            calls[1].args,
            vec!["m1-major-xtb-sp.xyz", "--gfn2", "--chrg", "0", "--uhf", "0"]
        );
        assert!(root.join("xtb-mod-xtb-sp/m1-major-xtb-sp.wbo").is_file());
        assert!(!root.join("xtb-mod-xtb-sp/m1-major-xtb-sp-out.xyz").exists());
    }

    #[test]
    fn run_rejects_scheduler_stage() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), &["m1-major"]);
        let launcher = FakeLauncher::new(fake_xtb);
        let err = run(&ctx, ctx.stage("DFT-mod").unwrap(), &launcher, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::WrongExecution { expected: "xtb", .. }));
    }

    #[test]
    fn submit_invokes_scheduler_once_in_stage_dir() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        seed_database(root, &["m1-major", "m1-minor"]);
        let ctx = context(root, &["m1-major", "m1-minor"]);
        let stage = ctx.stage("DFT-mod").unwrap();
        let launcher = FakeLauncher::new(|_: &Invocation| true);

        assert_eq!(
            submit(&ctx, stage, &launcher).unwrap(),
            RunOutcome::NotReady { status: StageStatus::NoDirectory }
        );
        generate(&ctx, stage, false, &ProgressReporter::new()).unwrap();
        let outcome = submit(&ctx, stage, &launcher).unwrap();

        assert_eq!(outcome, RunOutcome::Submitted { accepted: true });
        let calls = launcher.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "qg09");
        assert_eq!(calls[0].args, vec!["-p", "8", "-a"]);
        assert_eq!(calls[0].working_dir, root.join("DFT-mod"));
        assert_eq!(calls[0].stdout, None);
    }

    #[test]
    fn submit_rejects_xtb_stage() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), &["m1-major"]);
        let launcher = FakeLauncher::new(|_: &Invocation| true);
        let err = submit(&ctx, ctx.stage("xtb-mod").unwrap(), &launcher).unwrap_err();
        assert!(matches!(err, EngineError::WrongExecution { expected: "scheduler", .. }));
    }
}
