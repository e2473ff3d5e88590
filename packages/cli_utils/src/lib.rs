#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the report CLI.
//!
//! [`init_logger`] installs `pretty_env_logger` behind `indicatif-log-bridge`
//! so log lines are suspended while the stage bar redraws, and
//! [`StageBar`] renders pipeline [`StageProgress`] notifications.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use nypd_shootings_source::progress::StageProgress;

pub use indicatif::MultiProgress;

/// An `indicatif` step bar that implements [`StageProgress`].
pub struct StageBar {
    bar: ProgressBar,
}

impl StageBar {
    /// Adds a stage bar to `multi`. The length is set once the pipeline
    /// announces its stage count.
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Arc<dyn StageProgress> {
        let bar = multi.add(ProgressBar::new(0));
        bar.set_style(
            ProgressStyle::with_template(
                "{prefix:.bold} {wide_bar:.green/dim} {pos}/{len} {msg} [{elapsed_precise}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_prefix("report");
        Arc::new(Self { bar })
    }
}

impl StageProgress for StageBar {
    fn set_stages(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn begin(&self, stage: &str) {
        self.bar.set_message(stage.to_string());
    }

    fn complete(&self, stage: &str, summary: &str) {
        log::info!("{stage}: {summary}");
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge`.
///
/// Stage summaries are logged at `info`, which is the level used unless
/// `RUST_LOG` says otherwise. Returns the [`MultiProgress`] that all
/// progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Already set when called twice, e.g. from tests.
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
