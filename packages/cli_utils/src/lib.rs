#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `urban_index` binary.
//!
//! [`IndicatifProgress`] renders the scoring [`ProgressCallback`] as
//! `indicatif` bars. [`init_logger`] routes `log` output through the same
//! [`MultiProgress`] so log lines print above the bars instead of through
//! them.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use urban_index_scoring::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// A [`ProgressCallback`] drawn as one `indicatif` bar.
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Applied when the length becomes known.
    bar_style: ProgressStyle,
}

impl IndicatifProgress {
    fn spinner(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let bar_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {human_pos}/{human_len} {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Self { bar, bar_style }
    }

    /// Bar for the scoring run. Spins until the pipeline announces its
    /// total, then shows position, percentage and ETA.
    #[must_use]
    pub fn scoring_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        Arc::new(Self::spinner(multi, message))
    }

    /// Bar over a known number of steps, such as the layers of a run.
    #[must_use]
    pub fn steps_bar(
        multi: &MultiProgress,
        message: &str,
        total: u64,
    ) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} {bar:40.green/dim} {pos}/{len} [{elapsed}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_message(message.to_string());

        let bar_style = bar.style();

        Arc::new(Self { bar, bar_style })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.bar_style.clone());
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge` and returns the [`MultiProgress`] every bar of
/// the run must join.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A logger may already be installed (tests, repeated calls).
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    fn hidden() -> MultiProgress {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn spinner_becomes_bar_on_set_total() {
        let progress = IndicatifProgress::spinner(&hidden(), "Scoring");
        assert_eq!(progress.bar.length(), None);

        progress.set_total(12);
        progress.inc(5);
        assert_eq!(progress.bar.length(), Some(12));
        assert_eq!(progress.bar.position(), 5);

        progress.finish("done".to_string());
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn steps_bar_accepts_callbacks() {
        let steps = IndicatifProgress::steps_bar(&hidden(), "Loading layers", 8);
        steps.inc(3);
        steps.set_message("noise".to_string());
        steps.finish("Loaded 8 layers".to_string());
    }
}
