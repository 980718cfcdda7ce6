//! Progress reporting for record loading and solver iterations.
//!
//! Stages either know their length up front or count open-ended units (input
//! records, solver iterations). The pipeline and the solver only talk to the
//! [`ProgressReporter`] trait; the CLI injects [`IndicatifReporter`].

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BOUNDED_TEMPLATE: &str = "{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}";
const OPEN_TEMPLATE: &str = "{spinner:.green} {prefix}: {human_pos} {msg}";

pub trait ProgressReporter: Send + Sync {
    /// Begin a stage; `total` is `None` for open-ended stages.
    fn start(&self, stage: &str, total: Option<u64>);

    fn advance(&self, amount: u64);

    /// Replace the short status text shown next to the counter.
    fn detail(&self, _text: &str) {}

    fn finish(&self);

    /// Print a line above the bar.
    fn message(&self, msg: &str);
}

/// Reporter for library callers that want no output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _stage: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn finish(&self) {}
    fn message(&self, _msg: &str) {}
}

/// `indicatif` spinner/bar for the CLI.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    position: AtomicU64,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self::drawing_to(ProgressDrawTarget::stderr())
    }

    /// Counts without drawing; used in tests and non-interactive runs.
    pub fn hidden() -> Self {
        Self::drawing_to(ProgressDrawTarget::hidden())
    }

    fn drawing_to(target: ProgressDrawTarget) -> Self {
        Self {
            bar: ProgressBar::with_draw_target(None, target),
            position: AtomicU64::new(0),
        }
    }

    /// Units advanced in the current stage.
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    /// Length of the current stage, `None` when open-ended.
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    fn style(total: Option<u64>) -> ProgressStyle {
        match total {
            Some(_) => ProgressStyle::with_template(BOUNDED_TEMPLATE)
                .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("=> ")),
            None => ProgressStyle::with_template(OPEN_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, stage: &str, total: Option<u64>) {
        self.position.store(0, Ordering::Relaxed);
        self.bar.reset();
        self.bar.set_style(Self::style(total));
        match total {
            Some(len) => self.bar.set_length(len),
            None => self.bar.unset_length(),
        }
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("");
    }

    fn advance(&self, amount: u64) {
        self.position.fetch_add(amount, Ordering::Relaxed);
        self.bar.inc(amount);
    }

    fn detail(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}
