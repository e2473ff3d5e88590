//! Plain-text rendering of report sections.

use nypd_shootings_analytics_models::{AggregateBucket, HexBinSummary, RateBucket};
use nypd_shootings_classifier_models::EvaluationMetrics;
use nypd_shootings_clean::CleanSummary;

use crate::{DomainSummary, ModelSection, Report};

const KEY_WIDTH: usize = 24;

/// Renders the whole report, listing at most `top_hexbins` cells.
#[must_use]
pub fn render_report(report: &Report, top_hexbins: usize) -> String {
    let mut out = format!("NYPD shooting incidents: {}\n", report.source);
    if let Some(span) = report.date_span {
        out.push_str(&format!("Occurrences from {} to {}\n", span.first, span.last));
    }
    out.push('\n');

    out.push_str(&render_cleaning(&report.cleaning));
    out.push_str(&render_domains(&report.domains));

    let t = &report.temporal;
    out.push_str(&render_buckets("Incidents by year", &t.by_year));
    out.push_str(&render_buckets("Incidents by month", &t.by_month));
    out.push_str(&render_buckets("Incidents by weekday", &t.by_weekday));
    out.push_str(&render_buckets("Incidents by hour", &t.by_hour));
    out.push_str(&render_buckets("Incidents by time of day", &t.by_time_of_day));
    out.push_str(&render_buckets("Incidents by borough", &report.boroughs));

    let v = &report.victims;
    out.push_str(&render_buckets("Victim age group (sentinels excluded)", &v.age_group));
    out.push_str(&render_buckets("Victim sex (sentinels excluded)", &v.sex));
    out.push_str(&render_buckets("Victim race (sentinels excluded)", &v.race));

    let p = &report.perpetrators;
    out.push_str(&render_buckets("Perpetrator age group", &p.age_group));
    out.push_str(&render_buckets("Perpetrator sex", &p.sex));
    out.push_str(&render_buckets("Perpetrator race", &p.race));

    let m = &report.murders;
    out.push_str(&render_buckets("Statistical murder flag", &m.share));
    out.push_str(&render_rates("Murder rate by borough", &m.by_borough));
    out.push_str(&render_rates("Murder rate by time of day", &m.by_time_of_day));

    out.push_str(&render_hexbins(&report.hexbins, top_hexbins));
    out.push_str(&render_model(&report.model));

    out
}

/// Renders the cleaning summary and the policy table it was produced with.
#[must_use]
pub fn render_cleaning(summary: &CleanSummary) -> String {
    let mut out = heading("Cleaning");
    out.push_str(&count_line("raw rows", summary.raw_rows));
    for removal in &summary.removed {
        out.push_str(&count_line(&removal.reason, removal.count));
    }
    out.push_str(&count_line("kept rows", summary.kept_rows));

    let policies: Vec<String> = summary
        .policies
        .iter()
        .map(|p| format!("{}={}", p.column, p.policy))
        .collect();
    out.push_str(&format!("missing-value policy: {}\n\n", policies.join(", ")));
    out
}

/// Renders the number of levels per categorical field.
#[must_use]
pub fn render_domains(domains: &[DomainSummary]) -> String {
    let mut out = heading("Category levels");
    for domain in domains {
        out.push_str(&count_line(domain.field.as_ref(), domain.levels as u64));
    }
    out.push('\n');
    out
}

/// Renders an aggregation table. The percent column appears only when the
/// buckets carry percentages.
#[must_use]
pub fn render_buckets(title: &str, buckets: &[AggregateBucket]) -> String {
    let mut out = heading(title);
    let with_percent = buckets.iter().any(|b| b.percentage.is_some());

    for bucket in buckets {
        out.push_str(&format!("{:<KEY_WIDTH$} {:>8}", bucket.key, bucket.count));
        if with_percent {
            out.push_str(&format!(" {:>7.2}%", bucket.percentage.unwrap_or(0.0)));
        }
        out.push('\n');
    }
    if buckets.is_empty() {
        out.push_str("(no incidents)\n");
    }
    out.push('\n');
    out
}

/// Renders a murder-rate table.
#[must_use]
pub fn render_rates(title: &str, buckets: &[RateBucket]) -> String {
    let mut out = heading(title);
    out.push_str(&format!(
        "{:<KEY_WIDTH$} {:>8} {:>8} {:>8}\n",
        "", "total", "murders", "rate"
    ));
    for bucket in buckets {
        out.push_str(&format!(
            "{:<KEY_WIDTH$} {:>8} {:>8} {:>7.2}%\n",
            bucket.key,
            bucket.total,
            bucket.murders,
            bucket.rate * 100.0
        ));
    }
    out.push('\n');
    out
}

/// Renders the densest `top` hexbins.
#[must_use]
pub fn render_hexbins(summary: &HexBinSummary, top: usize) -> String {
    let mut out = heading(&format!(
        "Densest H3 cells (resolution {}, top {} of {})",
        summary.resolution,
        top.min(summary.bins.len()),
        summary.bins.len()
    ));
    for bin in summary.bins.iter().take(top) {
        out.push_str(&format!(
            "{:<KEY_WIDTH$} {:>8} {:>11.5} {:>11.5}\n",
            bin.cell, bin.count, bin.center_lat, bin.center_lng
        ));
    }
    if summary.skipped > 0 {
        out.push_str(&format!(
            "{} incidents without coordinates\n",
            summary.skipped
        ));
    }
    out.push('\n');
    out
}

/// Renders the classifier section.
#[must_use]
pub fn render_model(model: &ModelSection) -> String {
    let mut out = heading("Murder classifier (borough, precinct, time of day)");
    out.push_str(&format!(
        "feature rows {}, train fraction {}, seed {}\n",
        model.feature_rows, model.train_fraction, model.seed
    ));
    out.push_str(&format!(
        "train {} rows ({} murders), test {} rows ({} murders)\n",
        model.split.train.rows,
        model.split.train.positives,
        model.split.test.rows,
        model.split.test.positives,
    ));
    out.push_str(&format!(
        "{} encoded columns: {}\n",
        model.encoded_columns.len(),
        model.encoded_columns.join(", ")
    ));
    if !model.untrained_levels.is_empty() {
        out.push_str(&format!(
            "levels without training rows: {}\n",
            model.untrained_levels.join(", ")
        ));
    }
    out.push_str(&render_metrics(&model.metrics));
    out
}

/// Renders held-out evaluation metrics.
#[must_use]
pub fn render_metrics(metrics: &EvaluationMetrics) -> String {
    let c = &metrics.confusion;
    let mut out = format!(
        "{:<KEY_WIDTH$} {:>10} {:>10}\n\
         {:<KEY_WIDTH$} {:>10} {:>10}\n\
         {:<KEY_WIDTH$} {:>10} {:>10}\n",
        "",
        "pred. murder",
        "pred. other",
        "actual murder",
        c.true_positive,
        c.false_negative,
        "actual other",
        c.false_positive,
        c.true_negative
    );

    for (name, value) in [
        ("accuracy", metrics.accuracy),
        ("no-information rate", metrics.no_information_rate),
        ("precision", metrics.precision),
        ("recall", metrics.recall),
        ("specificity", metrics.specificity),
        ("F1", metrics.f1),
    ] {
        out.push_str(&format!("{name:<KEY_WIDTH$} {value:>10.4}\n"));
    }
    if metrics.unseen_rows > 0 {
        out.push_str(&format!(
            "{} of {} test rows had levels unseen in training\n",
            metrics.unseen_rows, metrics.test_rows
        ));
    }
    out
}

fn count_line(label: &str, count: u64) -> String {
    format!("{label:<KEY_WIDTH$} {count:>8}\n")
}

fn heading(title: &str) -> String {
    format!("{title}\n{}\n", "-".repeat(title.len()))
}
