use super::context::PipelineContext;
use super::error::EngineError;
use super::outcome::{Failure, GenerateOutcome};
use super::progress::{Progress, ProgressReporter};
use super::tracker::StageTracker;
use crate::core::io::convert::convert;
use crate::core::io::gjf::GjfTemplate;
use crate::core::models::stage::{InputSource, Stage};
use crate::core::models::structure::Structure;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Creates the input files of `stage` for every structure that lacks them.
///
/// Refuses to act while the prerequisite stage is incomplete, even when
/// `force` is set. Without `force`, existing inputs are left untouched and a
/// stage whose inputs are complete is skipped. A structure whose source file
/// cannot be converted is recorded as failed and the batch moves on.
#[instrument(skip_all, name = "generate", fields(stage = %stage.name, force))]
pub fn generate(
    ctx: &PipelineContext,
    stage: &Stage,
    force: bool,
    reporter: &ProgressReporter,
) -> Result<GenerateOutcome, EngineError> {
    let tracker = StageTracker::new(ctx);
    let report = tracker.inspect(stage);
    if report.status.inputs_complete() && !force {
        info!("Inputs already complete.");
        return Ok(GenerateOutcome::AlreadyDone);
    }

    if let Some(prerequisite) = stage.prerequisite() {
        let status = tracker.status(ctx.stage(prerequisite)?);
        if !status.is_complete() {
            warn!(prerequisite, %status, "Prerequisite stage is not complete.");
            return Ok(GenerateOutcome::PrerequisitePending {
                prerequisite: prerequisite.to_string(),
                status,
            });
        }
    }

    let dir = ctx.stage_dir(stage);
    fs::create_dir_all(&dir).map_err(|e| EngineError::io(&dir, e))?;
    copy_shared_files(ctx, stage, &dir)?;
    let template = load_template(ctx, stage)?;

    let targets: Vec<&Structure> = ctx
        .structures
        .iter()
        .filter(|s| force || !stage.input_path(&dir, s).is_file())
        .collect();

    reporter.begin(format!("Generating {}", stage.name), targets.len() as u64);
    let mut written = Vec::new();
    let mut failed = Vec::new();
    for structure in targets {
        let output = stage.input_path(&dir, structure);
        let result = source_path(ctx, stage, structure).and_then(|source| {
            convert(stage.conversion, &source, &output, template.as_ref())
                .map_err(|e| e.to_string())
        });
        match result {
            Ok(()) => {
                debug!(structure = %structure, "Wrote {}", output.display());
                written.push(structure.name().to_string());
            }
            Err(reason) => {
                warn!(structure = %structure, "Skipping: {}", reason);
                reporter.fail(structure.name(), &reason);
                failed.push(Failure::new(structure.name(), reason));
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.finish();

    info!(
        written = written.len(),
        failed = failed.len(),
        "Generated stage inputs."
    );
    Ok(GenerateOutcome::Generated { written, failed })
}

/// Copies shared control files that the stage directory does not have yet.
fn copy_shared_files(ctx: &PipelineContext, stage: &Stage, dir: &Path) -> Result<(), EngineError> {
    for name in &stage.shared_files {
        let dest = dir.join(name);
        if dest.exists() {
            continue;
        }
        let src = ctx.config.paths.template(name);
        fs::copy(&src, &dest).map_err(|e| EngineError::io(&src, e))?;
        debug!("Copied shared file {}", name);
    }
    Ok(())
}

fn load_template(ctx: &PipelineContext, stage: &Stage) -> Result<Option<GjfTemplate>, EngineError> {
    let Some(name) = &stage.template else {
        return Ok(None);
    };
    let path = ctx.config.paths.template(name);
    GjfTemplate::load(&path)
        .map(Some)
        .map_err(|e| EngineError::Template {
            path: path.display().to_string(),
            source: e,
        })
}

fn source_path(ctx: &PipelineContext, stage: &Stage, structure: &Structure) -> Result<PathBuf, String> {
    match &stage.source {
        InputSource::RawModel => Ok(ctx.config.raw_model_path(structure.name())),
        InputSource::Stage {
            stage: prerequisite,
            artifact,
        } => {
            let prerequisite = ctx.stage(prerequisite).map_err(|e| e.to_string())?;
            Ok(artifact.path(&ctx.stage_dir(prerequisite), structure, &prerequisite.suffix))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::status::StageStatus;
    use crate::engine::tracker::tests::{context, touch};
    use tempfile::tempdir;

    pub(crate) const RAW_GJF: &str = "%chk=raw.chk\n# opt b3lyp/6-31g*\n\nraw title\n\n0 1\nC 0.0 0.0 0.0\nH 0.0 0.0 1.0\n\n";
    pub(crate) const MODEL_GJF: &str = "%mem=8GB\n# sp m062x/gen\n\ntitle\n\n0 1\nX 0 0 0\n\nC H 0\n6-31g*\n****\n\n";

    /// A database root with raw models, templates and control files.
    pub(crate) fn seed_database(root: &Path, names: &[&str]) {
        for name in names {
            let path = root.join("rawmodel").join(format!("{}.gjf", name));
            touch(&path);
            fs::write(path, RAW_GJF).unwrap();
        }
        let utils = root.join("utils");
        fs::create_dir_all(&utils).unwrap();
        for template in ["gaumodel.gjf", "gauxtbmodel.gjf", "gauspmodel.gjf"] {
            fs::write(utils.join(template), MODEL_GJF).unwrap();
        }
        for shared in ["constrain.inp", "fix.inp", "extderi", "genxyz", "xtb.sh"] {
            fs::write(utils.join(shared), "$fix\n").unwrap();
        }
    }

    #[test]
    fn generate_then_status_reports_inputs_complete() {
        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["m1-major", "m1-minor"]);
        let ctx = context(dir.path(), &["m1-major", "m1-minor"]);
        let stage = ctx.stage("DFT-mod").unwrap();

        let outcome = generate(&ctx, stage, false, &ProgressReporter::new()).unwrap();

        assert_eq!(
            outcome,
            GenerateOutcome::Generated {
                written: vec!["m1-major".into(), "m1-minor".into()],
                failed: vec![],
            }
        );
        let report = StageTracker::new(&ctx).inspect(stage);
        assert_eq!(report.status, StageStatus::InputsComplete);
        assert!(report.missing_inputs.is_empty());

        let gjf = fs::read_to_string(dir.path().join("DFT-mod/m1-major-gau.gjf")).unwrap();
        assert!(gjf.contains("%chk=m1-major-gau.chk"));
        assert!(gjf.contains("m1-major-gau\n\n0 1\nC 0.0 0.0 0.0\nH 0.0 0.0 1.0"));
    }

    #[test]
    fn second_generate_is_a_no_op() {
        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["m1-major"]);
        let ctx = context(dir.path(), &["m1-major"]);
        let stage = ctx.stage("xtb-mod").unwrap();
        let reporter = ProgressReporter::new();

        generate(&ctx, stage, false, &reporter).unwrap();
        let outcome = generate(&ctx, stage, false, &reporter).unwrap();

        assert_eq!(outcome, GenerateOutcome::AlreadyDone);
        assert!(dir.path().join("xtb-mod/constrain.inp").is_file());
        let xyz = fs::read_to_string(dir.path().join("xtb-mod/m1-major-xtb.xyz")).unwrap();
        assert!(xyz.starts_with("2\nm1-major\n"));
    }

    #[test]
    fn existing_inputs_are_kept_unless_forced() {
        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["m1-major", "m1-minor"]);
        let ctx = context(dir.path(), &["m1-major", "m1-minor"]);
        let stage = ctx.stage("DFT-mod").unwrap();
        let kept = dir.path().join("DFT-mod/m1-major-gau.gjf");
        touch(&kept);
        fs::write(&kept, "hand edited").unwrap();

        let outcome = generate(&ctx, stage, false, &ProgressReporter::new()).unwrap();
        assert!(matches!(outcome, GenerateOutcome::Generated { ref written, .. } if written == &vec!["m1-minor".to_string()]));
        assert_eq!(fs::read_to_string(&kept).unwrap(), "hand edited");

        generate(&ctx, stage, true, &ProgressReporter::new()).unwrap();
        assert_ne!(fs::read_to_string(&kept).unwrap(), "hand edited");
    }

    #[test]
    fn pending_prerequisite_blocks_even_forced_generation() {
        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["m1-major"]);
        let ctx = context(dir.path(), &["m1-major"]);
        let stage = ctx.stage("xtb-mod-xtb-sp").unwrap();

        let outcome = generate(&ctx, stage, true, &ProgressReporter::new()).unwrap();

        assert_eq!(
            outcome,
            GenerateOutcome::PrerequisitePending {
                prerequisite: "xtb-mod".into(),
                status: StageStatus::NoDirectory,
            }
        );
        assert!(!dir.path().join("xtb-mod-xtb-sp").exists());
    }

    #[test]
    fn dependent_stage_reads_prerequisite_outputs() {
        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["m1-major"]);
        let ctx = context(dir.path(), &["m1-major"]);
        let root = dir.path();
        touch(&root.join("xtb-mod/constrain.inp"));
        touch(&root.join("xtb-mod/m1-major-xtb.xyz"));
        for tail in [".log", ".charges", ".wbo"] {
            touch(&root.join(format!("xtb-mod/m1-major-xtb{}", tail)));
        }
        fs::write(root.join("xtb-mod/m1-major-xtb-out.xyz"), "1\nopt\nO 0 0 0\n").unwrap();

        let sp = generate(&ctx, ctx.stage("xtb-mod-xtb-sp").unwrap(), false, &ProgressReporter::new()).unwrap();
        let gau = generate(&ctx, ctx.stage("xtb-mod-gau-sp").unwrap(), false, &ProgressReporter::new()).unwrap();

        assert!(matches!(sp, GenerateOutcome::Generated { ref failed, .. } if failed.is_empty()));
        assert!(matches!(gau, GenerateOutcome::Generated { ref failed, .. } if failed.is_empty()));
        assert_eq!(
            fs::read_to_string(root.join("xtb-mod-xtb-sp/m1-major-xtb-sp.xyz")).unwrap(),
            "1\nopt\nO 0 0 0\n"
        );
        let gjf = fs::read_to_string(root.join("xtb-mod-gau-sp/m1-major-xtbgausp.gjf")).unwrap();
        assert!(gjf.contains("\nO 0 0 0\n"));
    }

    #[test]
    fn unreadable_source_is_reported_and_batch_continues() {
        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["a-major", "b-major"]);
        fs::write(dir.path().join("rawmodel/a-major.gjf"), "no blank lines here").unwrap();
        let ctx = context(dir.path(), &["a-major", "b-major", "c-major"]);

        let outcome = generate(&ctx, ctx.stage("DFT-mod").unwrap(), false, &ProgressReporter::new()).unwrap();

        let GenerateOutcome::Generated { written, failed } = outcome else {
            panic!("expected generation");
        };
        assert_eq!(written, vec!["b-major"]);
        let names: Vec<&str> = failed.iter().map(|f| f.structure.as_str()).collect();
        assert_eq!(names, vec!["a-major", "c-major"]);
    }

    #[test]
    fn skipped_structures_are_reported_to_progress() {
        use std::sync::{Arc, Mutex};

        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["a-major"]);
        let ctx = context(dir.path(), &["a-major", "c-major"]);
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failures);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::StructureFailed { structure, .. } = event {
                sink.lock().unwrap().push(structure);
            }
        }));

        generate(&ctx, ctx.stage("DFT-mod").unwrap(), false, &reporter).unwrap();

        assert_eq!(*failures.lock().unwrap(), vec!["c-major".to_string()]);
    }

    #[test]
    fn missing_template_aborts_generation() {
        let dir = tempdir().unwrap();
        seed_database(dir.path(), &["m1-major"]);
        fs::remove_file(dir.path().join("utils/gaumodel.gjf")).unwrap();
        let ctx = context(dir.path(), &["m1-major"]);

        let err = generate(&ctx, ctx.stage("DFT-mod").unwrap(), false, &ProgressReporter::new()).unwrap_err();

        assert!(matches!(err, EngineError::Template { .. }));
    }
}
