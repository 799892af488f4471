use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Failed to open output capture file '{path}': {source}")]
    Capture {
        path: String,
        source: std::io::Error,
    },
}

/// A single external program call.
///
/// The working directory is part of the invocation; the calling process never
/// changes its own current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// File receiving the program's standard output, if captured.
    pub stdout: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            stdout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs external programs to completion.
pub trait Launcher {
    /// Blocks until the program exits and reports whether it exited successfully.
    fn launch(&self, invocation: &Invocation) -> Result<bool, LaunchError>;
}

/// Launches real processes with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, invocation: &Invocation) -> Result<bool, LaunchError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null());

        if let Some(path) = &invocation.stdout {
            let file = File::create(path).map_err(|e| LaunchError::Capture {
                path: path.display().to_string(),
                source: e,
            })?;
            command.stdout(Stdio::from(file));
        }

        debug!(
            cwd = %invocation.working_dir.display(),
            "Launching {}",
            invocation.command_line()
        );
        let status = command.status().map_err(|e| LaunchError::Spawn {
            program: invocation.program.clone(),
            source: e,
        })?;
        Ok(status.success())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records invocations and simulates the program with a closure.
    pub(crate) struct FakeLauncher<F: Fn(&Invocation) -> bool> {
        pub calls: RefCell<Vec<Invocation>>,
        effect: F,
    }

    impl<F: Fn(&Invocation) -> bool> FakeLauncher<F> {
        pub(crate) fn new(effect: F) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                effect,
            }
        }
    }

    impl<F: Fn(&Invocation) -> bool> Launcher for FakeLauncher<F> {
        fn launch(&self, invocation: &Invocation) -> Result<bool, LaunchError> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok((self.effect)(invocation))
        }
    }

    #[test]
    fn invocation_builder_collects_arguments() {
        let inv = Invocation::new("xtb", "/db/xtb-mod")
            .arg("m1-xtb.xyz")
            .args(["--chrg", "0"])
            .stdout_to("/db/xtb-mod/m1-xtb.log");
        assert_eq!(inv.command_line(), "xtb m1-xtb.xyz --chrg 0");
        assert_eq!(inv.working_dir, PathBuf::from("/db/xtb-mod"));
        assert_eq!(inv.stdout, Some(PathBuf::from("/db/xtb-mod/m1-xtb.log")));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::new("qcdb-no-such-program-xyz", dir.path());
        let err = SystemLauncher.launch(&inv).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn system_launcher_runs_in_working_dir_and_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let inv = Invocation::new("pwd", dir.path()).stdout_to(&out);

        assert!(SystemLauncher.launch(&inv).unwrap());

        let captured = std::fs::read_to_string(&out).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(PathBuf::from(captured.trim()).canonicalize().unwrap(), expected);
    }

    #[test]
    fn fake_launcher_records_calls() {
        let fake = FakeLauncher::new(|_: &Invocation| false);
        let inv = Invocation::new("qg09", "/db/DFT-mod");
        assert!(!fake.launch(&inv).unwrap());
        assert_eq!(fake.calls.borrow().len(), 1);
    }
}
