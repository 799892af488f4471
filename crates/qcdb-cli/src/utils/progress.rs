use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use qcdb::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Bar plus the per-stage bookkeeping shown next to it.
struct StageBar {
    bar: ProgressBar,
    phase: String,
    failed: Vec<String>,
}

impl StageBar {
    fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("✓ {}", self.phase)
        } else {
            format!("✗ {}: {} structure(s) failed", self.phase, self.failed.len())
        }
    }
}

/// Renders generator, runner and collector progress on stderr. Structures
/// that fail are printed above the bar as they happen and tallied per phase.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<StageBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0).with_style(Self::spinner_style());
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(StageBar {
                bar,
                phase: String::new(),
                failed: Vec::new(),
            })),
        }
    }

    /// Structures that failed in the most recent phase.
    pub fn failed_structures(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.failed.clone())
            .unwrap_or_default()
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = Arc::clone(&self.state);

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress state mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    state.bar.reset();
                    state.bar.set_length(0);
                    state.bar.set_style(Self::spinner_style());
                    state.bar.set_prefix(name.clone());
                    state.bar.set_message("");
                    state.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    state.phase = name;
                    state.failed.clear();
                }
                Progress::TaskStart { total_steps } => {
                    state.bar.disable_steady_tick();
                    state.bar.set_length(total_steps);
                    state.bar.set_position(0);
                    state.bar.set_style(Self::bar_style());
                }
                Progress::TaskIncrement => state.bar.inc(1),
                Progress::StructureFailed { structure, reason } => {
                    state.bar.println(format!("  ✗ {}: {}", structure, reason));
                    state.failed.push(structure);
                    let message = format!("{} failed", state.failed.len());
                    state.bar.set_message(message);
                }
                Progress::TaskFinish => {
                    let length = state.bar.length().unwrap_or(0);
                    if state.bar.position() < length {
                        state.bar.set_position(length);
                    }
                    state.bar.finish();
                }
                Progress::PhaseFinish => {
                    state.bar.disable_steady_tick();
                    state.bar.set_style(Self::summary_style());
                    let summary = state.summary();
                    state.bar.finish_with_message(summary);
                }
                Progress::Message(msg) => {
                    if state.bar.is_finished() {
                        state.bar.set_message(msg);
                    } else {
                        state.bar.println(format!("  {}", msg));
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{prefix:<28} [{bar:40.cyan/blue}] {pos}/{len} structures {msg:.red} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            write!(w, "{:.1}s", state.eta().as_secs_f64()).ok();
        })
        .progress_chars("##-")
    }

    fn summary_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
