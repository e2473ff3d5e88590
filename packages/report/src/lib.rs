#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end shooting incident report.
//!
//! [`run_report`] takes a loaded raw table through cleaning, descriptive
//! aggregation, spatial binning and the murder classifier, producing a
//! serializable [`Report`]. [`render`] turns it into text tables for the
//! terminal.

pub mod render;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use nypd_shootings_analytics::{
    AnalyticsError, aggregate, aggregate_ordered, date_span, exclude_sentinels, hexbins,
    murder_rate,
};
use nypd_shootings_analytics_models::{
    AggregateBucket, BucketOrder, GroupField, HexBinSummary, Metric, RateBucket,
};
use nypd_shootings_classifier::{
    FitOptions, ModelError, build_features, evaluate, fit, stratified_split,
};
use nypd_shootings_classifier_models::{EvaluationMetrics, SplitSummary};
use nypd_shootings_clean::{CleanError, CleanSummary, clean};
use nypd_shootings_config::{AnalysisConfig, ConfigError, ModelConfig, ReportConfig};
use nypd_shootings_incident_models::{CategoricalField, CategoryDomains, IncidentSet};
use nypd_shootings_source::progress::StageProgress;
use nypd_shootings_source::{RawTable, SourceError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Clean(#[from] CleanError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// An output file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write cleaned CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// First and last occurrence date in the cleaned data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSpan {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// Number of distinct levels of one categorical field after cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSummary {
    pub field: CategoricalField,
    pub levels: usize,
}

/// Incident counts over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalSection {
    pub by_year: Vec<AggregateBucket>,
    pub by_month: Vec<AggregateBucket>,
    pub by_weekday: Vec<AggregateBucket>,
    pub by_hour: Vec<AggregateBucket>,
    pub by_time_of_day: Vec<AggregateBucket>,
}

/// Age group, sex and race breakdown of victims or perpetrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicSection {
    pub age_group: Vec<AggregateBucket>,
    pub sex: Vec<AggregateBucket>,
    pub race: Vec<AggregateBucket>,
}

/// Murder share overall and by group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MurderSection {
    pub share: Vec<AggregateBucket>,
    pub by_borough: Vec<RateBucket>,
    pub by_time_of_day: Vec<RateBucket>,
}

/// Classifier training and held-out evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSection {
    /// Complete feature rows available for modeling.
    pub feature_rows: usize,
    pub train_fraction: f64,
    pub seed: u64,
    pub split: SplitSummary,
    /// Design-matrix columns after treatment coding, as `predictor=level`.
    pub encoded_columns: Vec<String>,
    /// Cleaned levels that no training row carries; such test rows encode
    /// as the reference level.
    pub untrained_levels: Vec<String>,
    pub metrics: EvaluationMetrics,
}

/// The full report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Where the raw data came from.
    pub source: String,
    pub cleaning: CleanSummary,
    /// Category levels inferred during cleaning and shared by every stage.
    pub domains: Vec<DomainSummary>,
    pub date_span: Option<DateSpan>,
    pub temporal: TemporalSection,
    pub boroughs: Vec<AggregateBucket>,
    /// Victim percentages with sentinel categories excluded.
    pub victims: DemographicSection,
    /// Perpetrator counts including sentinel categories.
    pub perpetrators: DemographicSection,
    pub murders: MurderSection,
    pub hexbins: HexBinSummary,
    pub model: ModelSection,
}

const STAGE_COUNT: u64 = 7;

/// Runs every report stage over `table`.
///
/// # Errors
///
/// * [`ReportError::Clean`] if the missing-value policy is invalid
/// * [`ReportError::Analytics`] if the H3 resolution is invalid
/// * [`ReportError::Model`] if the classifier cannot be fitted
pub fn run_report(
    table: &RawTable,
    config: &ReportConfig,
    progress: &dyn StageProgress,
) -> Result<Report, ReportError> {
    progress.set_stages(STAGE_COUNT);

    progress.begin("clean");
    let outcome = clean(table, &config.cleaning)?;
    let incidents = &outcome.incidents;
    let cleaning = outcome.summary();
    let domains = domain_summaries(&outcome.domains);
    progress.complete(
        "clean",
        &format!("{} of {} rows kept", cleaning.kept_rows, cleaning.raw_rows),
    );

    progress.begin("temporal");
    let temporal = temporal_section(incidents);
    let span = date_span(incidents).map(|(first, last)| DateSpan { first, last });
    progress.complete("temporal", &format!("{} years", temporal.by_year.len()));

    progress.begin("boroughs");
    let boroughs = aggregate(incidents, GroupField::Borough, Metric::Percentage);
    progress.complete("boroughs", &format!("{} boroughs", boroughs.len()));

    progress.begin("demographics");
    let victims = victim_section(incidents, &config.analysis);
    let perpetrators = DemographicSection {
        age_group: aggregate(incidents, GroupField::PerpAgeGroup, Metric::Count),
        sex: aggregate(incidents, GroupField::PerpSex, Metric::Count),
        race: aggregate(incidents, GroupField::PerpRace, Metric::Count),
    };
    progress.complete("demographics", "victims and perpetrators");

    progress.begin("murders");
    let murders = MurderSection {
        share: aggregate(incidents, GroupField::MurderFlag, Metric::Percentage),
        by_borough: murder_rate(incidents, GroupField::Borough, BucketOrder::CountDesc),
        by_time_of_day: murder_rate(incidents, GroupField::TimeOfDay, BucketOrder::Natural),
    };
    progress.complete("murders", &format!("{} boroughs", murders.by_borough.len()));

    progress.begin("hexbins");
    let spatial = hexbins(incidents, config.analysis.h3_resolution)?;
    if spatial.skipped > 0 {
        log::warn!(
            "{} incidents without usable coordinates left out of hexbins",
            spatial.skipped
        );
    }
    progress.complete("hexbins", &format!("{} cells", spatial.bins.len()));

    progress.begin("model");
    let model = train_model(incidents, &outcome.domains, &config.model)?;
    progress.complete(
        "model",
        &format!("accuracy {:.3}", model.metrics.accuracy),
    );

    progress.finish();

    Ok(Report {
        source: table.label.clone(),
        cleaning,
        domains,
        date_span: span,
        temporal,
        boroughs,
        victims,
        perpetrators,
        murders,
        hexbins: spatial,
        model,
    })
}

fn domain_summaries(domains: &CategoryDomains) -> Vec<DomainSummary> {
    domains
        .iter()
        .map(|(field, domain)| DomainSummary {
            field,
            levels: domain.len(),
        })
        .collect()
}

fn temporal_section(incidents: &IncidentSet) -> TemporalSection {
    let natural = |field: GroupField| aggregate_ordered(incidents, field, Metric::Count, BucketOrder::Natural);
    TemporalSection {
        by_year: natural(GroupField::Year),
        by_month: natural(GroupField::Month),
        by_weekday: natural(GroupField::Weekday),
        by_hour: natural(GroupField::Hour),
        by_time_of_day: aggregate_ordered(
            incidents,
            GroupField::TimeOfDay,
            Metric::Percentage,
            BucketOrder::Natural,
        ),
    }
}

fn victim_section(incidents: &IncidentSet, analysis: &AnalysisConfig) -> DemographicSection {
    let without_sentinels = |field: GroupField| {
        let kept = exclude_sentinels(incidents, field, &analysis.sentinels_for(field));
        aggregate(kept, field, Metric::Percentage)
    };
    DemographicSection {
        age_group: without_sentinels(GroupField::VictimAgeGroup),
        sex: without_sentinels(GroupField::VictimSex),
        race: without_sentinels(GroupField::VictimRace),
    }
}

/// Builds features against the cleaning `categories`, then splits, fits and
/// evaluates the murder classifier.
///
/// # Errors
///
/// Returns [`ReportError::Model`] if the split or fit fails.
pub fn train_model(
    incidents: &IncidentSet,
    categories: &CategoryDomains,
    config: &ModelConfig,
) -> Result<ModelSection, ReportError> {
    let features = build_features(incidents, categories);
    let split = stratified_split(&features.rows, config.train_fraction, config.seed)?;
    let classifier = fit(&split.train, &FitOptions { alpha: config.alpha })?;
    let metrics = evaluate(&classifier, &split.test)?;

    let untrained_levels = features
        .domains
        .levels_missing_from(classifier.encoder().domains());
    if !untrained_levels.is_empty() {
        log::info!(
            "{} cleaned levels have no training rows: {}",
            untrained_levels.len(),
            untrained_levels.join(", ")
        );
    }

    Ok(ModelSection {
        feature_rows: features.len(),
        train_fraction: config.train_fraction,
        seed: config.seed,
        split: split.summary(),
        encoded_columns: classifier.encoder().column_names(),
        untrained_levels,
        metrics,
    })
}

/// Writes `report` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns [`ReportError::Output`] if the file cannot be created and
/// [`ReportError::Json`] if encoding fails.
pub fn write_json(path: &Path, report: &Report) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|source| ReportError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, report)?;
    log::info!("Wrote JSON report to {}", path.display());
    Ok(())
}

/// Writes cleaned incidents as CSV to `path`. Returns the number of rows.
///
/// # Errors
///
/// Returns [`ReportError::Output`] if the file cannot be created and
/// [`ReportError::Csv`] if a row cannot be written.
pub fn write_cleaned(path: &Path, incidents: &IncidentSet) -> Result<u64, ReportError> {
    let file = File::create(path).map_err(|source| ReportError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = write_cleaned_to(file, incidents)?;
    log::info!("Wrote {rows} cleaned incidents to {}", path.display());
    Ok(rows)
}

/// Writes cleaned incidents as CSV to `writer`, header first.
///
/// # Errors
///
/// Returns [`ReportError::Csv`] if a row cannot be written.
pub fn write_cleaned_to<W: Write>(writer: W, incidents: &IncidentSet) -> Result<u64, ReportError> {
    let mut out = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for record in incidents {
        out.serialize(record)?;
        rows += 1;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(rows)
}
