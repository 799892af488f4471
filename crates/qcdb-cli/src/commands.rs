pub mod collect;
pub mod pipeline;
pub mod stage;
pub mod status;

use crate::cli::DatabaseArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use qcdb::engine::context::PipelineContext;
use tracing::info;

/// Resolves the configuration and enumerates the database's structures.
pub fn open_database(args: &DatabaseArgs) -> Result<PipelineContext> {
    let app = build_config(args)?;
    info!(
        "Opening database at {:?} with {} stages",
        app.pipeline.paths.root,
        app.catalog.len()
    );
    Ok(PipelineContext::new(app.pipeline, app.catalog)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::cli::DatabaseArgs;
    use std::fs;
    use std::path::Path;

    pub const RAW_GJF: &str =
        "%chk=raw.chk\n# opt b3lyp/6-31g*\n\nraw title\n\n0 1\nC 0.0 0.0 0.0\nH 0.0 0.0 1.0\n\n";
    pub const MODEL_GJF: &str =
        "%mem=8GB\n# sp m062x/gen\n\ntitle\n\n0 1\nX 0 0 0\n\nC H 0\n6-31g*\n****\n\n";

    /// Lays out a minimal database: raw models plus every template and
    /// shared file the standard stages read.
    pub fn seed(root: &Path, names: &[&str]) {
        fs::create_dir_all(root.join("rawmodel")).unwrap();
        fs::create_dir_all(root.join("utils")).unwrap();
        for name in names {
            fs::write(root.join("rawmodel").join(format!("{}.gjf", name)), RAW_GJF).unwrap();
        }
        for template in ["gaumodel.gjf", "gauxtbmodel.gjf", "gauspmodel.gjf"] {
            fs::write(root.join("utils").join(template), MODEL_GJF).unwrap();
        }
        for shared in ["constrain.inp", "fix.inp", "extderi", "genxyz", "xtb.sh"] {
            fs::write(root.join("utils").join(shared), "").unwrap();
        }
    }

    pub fn db_args(root: &Path) -> DatabaseArgs {
        DatabaseArgs {
            config: None,
            root: Some(root.to_path_buf()),
            set_values: vec![],
        }
    }
}
