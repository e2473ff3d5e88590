#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cleaning of raw shooting incident rows.
//!
//! Each raw row goes through three passes, in input order:
//!
//! 1. deduplication by `INCIDENT_KEY` (first occurrence wins),
//! 2. the per-column missing-value [`PolicyTable`] (drop, keep or fill),
//! 3. typed parsing of dates, times, coordinates and the murder flag.
//!
//! A row that fails any pass is removed and tallied under a
//! [`RemovalReason`]; the run itself never fails on a bad row. Surviving rows
//! keep their input order.

use std::collections::{BTreeMap, BTreeSet};

use nypd_shootings_config::{CleaningConfig, PolicyError, PolicyTable};
use nypd_shootings_incident_models::{
    CategoryDomains, Column, IncidentRecord, IncidentSet, MissingPolicy, RawRecord,
};
use nypd_shootings_source::RawTable;
use nypd_shootings_source::parsing::{
    ParseError, is_missing, parse_coordinate, parse_date, parse_murder_flag, parse_time,
};
use serde::{Deserialize, Serialize};

/// Errors that abort cleaning.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    /// The missing-value policy table is invalid.
    #[error(transparent)]
    InvalidPolicy(#[from] PolicyError),
}

/// Why a raw row was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RemovalReason {
    /// An earlier row had the same incident key.
    DuplicateKey,
    /// The column was missing and its policy is [`MissingPolicy::Drop`].
    Missing(Column),
    /// The column had a value that could not be parsed.
    Unparseable(Column),
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey => write!(f, "duplicate INCIDENT_KEY"),
            Self::Missing(column) => write!(f, "missing {column}"),
            Self::Unparseable(column) => write!(f, "unparseable {column}"),
        }
    }
}

/// Result of cleaning a raw table.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    /// Surviving incidents in input order, keyed by incident key.
    pub incidents: IncidentSet,
    /// Number of removed rows per reason.
    pub removed: BTreeMap<RemovalReason, u64>,
    /// Number of raw rows read.
    pub raw_count: u64,
    /// The validated policy table the rows were cleaned with.
    pub policies: PolicyTable,
    /// Categorical domains observed in the surviving incidents.
    pub domains: CategoryDomains,
}

impl CleanOutcome {
    /// Total number of removed rows.
    #[must_use]
    pub fn removed_total(&self) -> u64 {
        self.removed.values().sum()
    }

    /// Serializable summary for reports.
    #[must_use]
    pub fn summary(&self) -> CleanSummary {
        CleanSummary {
            raw_rows: self.raw_count,
            kept_rows: self.incidents.len() as u64,
            removed: self
                .removed
                .iter()
                .map(|(reason, count)| RemovalCount {
                    reason: reason.to_string(),
                    count: *count,
                })
                .collect(),
            policies: self
                .policies
                .iter()
                .map(|(column, policy)| ColumnPolicy {
                    column: column.to_string(),
                    policy: policy.to_string(),
                })
                .collect(),
        }
    }
}

/// Row counts before and after cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanSummary {
    /// Rows read from the source.
    pub raw_rows: u64,
    /// Rows that survived cleaning.
    pub kept_rows: u64,
    /// Removed rows per reason.
    pub removed: Vec<RemovalCount>,
    /// Missing-value policy per column, in column order.
    pub policies: Vec<ColumnPolicy>,
}

/// The missing-value policy applied to one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPolicy {
    pub column: String,
    /// `drop`, `keep` or `fill(<value>)`.
    pub policy: String,
}

/// Number of rows removed for one reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalCount {
    /// Human-readable reason.
    pub reason: String,
    /// Rows removed.
    pub count: u64,
}

/// Cleans `table` according to `config`.
///
/// # Errors
///
/// Returns [`CleanError::InvalidPolicy`] if the policy table is invalid. No
/// row is processed in that case.
pub fn clean(table: &RawTable, config: &CleaningConfig) -> Result<CleanOutcome, CleanError> {
    let policies = config.policy_table()?;

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut removed: BTreeMap<RemovalReason, u64> = BTreeMap::new();
    let mut records = Vec::with_capacity(table.len());

    for raw in &table.records {
        match clean_row(raw, &policies, config, &mut seen) {
            Ok(record) => records.push(record),
            Err(reason) => *removed.entry(reason).or_insert(0) += 1,
        }
    }

    // Keys are already unique after pass 1.
    let incidents: IncidentSet = records.into_iter().collect();
    let domains = CategoryDomains::from_records(incidents.as_slice());

    let outcome = CleanOutcome {
        incidents,
        removed,
        raw_count: table.len() as u64,
        policies,
        domains,
    };

    log::info!(
        "Cleaned {}: kept {} of {} rows ({} removed)",
        table.label,
        outcome.incidents.len(),
        outcome.raw_count,
        outcome.removed_total()
    );
    for (reason, count) in &outcome.removed {
        log::info!("  {count} row(s) removed: {reason}");
    }

    Ok(outcome)
}

fn clean_row<'a>(
    raw: &'a RawRecord,
    policies: &'a PolicyTable,
    config: &CleaningConfig,
    seen: &mut BTreeSet<&'a str>,
) -> Result<IncidentRecord, RemovalReason> {
    // ── Pass 1: dedup ───────────────────────────────────────────────
    let key = raw.get(Column::IncidentKey);
    if is_missing(key, &config.null_tokens) {
        return Err(RemovalReason::Missing(Column::IncidentKey));
    }
    if !seen.insert(key) {
        log::debug!("Line {}: duplicate incident key {key}", raw.line);
        return Err(RemovalReason::DuplicateKey);
    }

    // ── Pass 2: missing-value policy ────────────────────────────────
    let mut cells: BTreeMap<Column, &'a str> = BTreeMap::new();
    for &column in Column::all() {
        let value = raw.get(column);
        if !is_missing(value, &config.null_tokens) {
            cells.insert(column, value);
            continue;
        }
        match policies.get(column) {
            MissingPolicy::Drop => return Err(RemovalReason::Missing(column)),
            MissingPolicy::Keep => {}
            MissingPolicy::Fill(default) => {
                cells.insert(column, default.as_str());
            }
        }
    }
    let cell = |column: Column| cells.get(&column).copied();
    let text = |column: Column| cell(column).map(str::to_string);

    // ── Pass 3: typed parsing ───────────────────────────────────────
    let unparseable = |e: ParseError| {
        log::debug!("Line {}: {e}", raw.line);
        RemovalReason::Unparseable(e.column)
    };

    let occur_date = cell(Column::OccurDate)
        .map(|v| parse_date(v, &config.date_format))
        .transpose()
        .map_err(unparseable)?;
    let occur_time = cell(Column::OccurTime)
        .map(|v| parse_time(v, &config.time_format))
        .transpose()
        .map_err(unparseable)?;
    let latitude = cell(Column::Latitude)
        .map(|v| parse_coordinate(v, Column::Latitude))
        .transpose()
        .map_err(unparseable)?;
    let longitude = cell(Column::Longitude)
        .map(|v| parse_coordinate(v, Column::Longitude))
        .transpose()
        .map_err(unparseable)?;
    let is_murder = cell(Column::StatisticalMurderFlag)
        .map(parse_murder_flag)
        .transpose()
        .map_err(unparseable)?;

    Ok(IncidentRecord {
        incident_key: key.to_string(),
        occur_date,
        occur_time,
        borough: text(Column::Boro),
        precinct: text(Column::Precinct),
        victim_age_group: text(Column::VicAgeGroup),
        victim_sex: text(Column::VicSex),
        victim_race: text(Column::VicRace),
        perp_age_group: text(Column::PerpAgeGroup),
        perp_sex: text(Column::PerpSex),
        perp_race: text(Column::PerpRace),
        latitude,
        longitude,
        is_murder,
    })
}

#[cfg(test)]
mod tests {
    use nypd_shootings_incident_models::CategoricalField;
    use nypd_shootings_source::read_raw;

    use super::*;

    const HEADER: &str = "INCIDENT_KEY,OCCUR_DATE,OCCUR_TIME,BORO,PRECINCT,\
        STATISTICAL_MURDER_FLAG,PERP_AGE_GROUP,PERP_SEX,PERP_RACE,VIC_AGE_GROUP,VIC_SEX,\
        VIC_RACE,Latitude,Longitude";

    fn row(key: &str, date: &str, boro: &str, lat: &str, lng: &str) -> String {
        format!("{key},{date},14:05:00,{boro},75,false,25-44,M,BLACK,18-24,M,BLACK,{lat},{lng}")
    }

    fn table(rows: &[String]) -> RawTable {
        let csv = format!("{HEADER}\n{}\n", rows.join("\n"));
        read_raw(csv.as_bytes(), "fixture").unwrap()
    }

    fn keys(outcome: &CleanOutcome) -> Vec<&str> {
        outcome
            .incidents
            .iter()
            .map(|r| r.incident_key.as_str())
            .collect()
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let raw = table(&[
            row("1", "01/02/2020", "BRONX", "40.8", "-73.9"),
            row("2", "01/03/2020", "QUEENS", "40.7", "-73.8"),
            row("1", "01/04/2020", "BROOKLYN", "40.6", "-73.9"),
            row("3", "01/05/2020", "MANHATTAN", "40.75", "-73.99"),
            row("4", "01/06/2020", "BRONX", "40.85", "-73.88"),
        ]);
        let outcome = clean(&raw, &CleaningConfig::default()).unwrap();
        assert_eq!(keys(&outcome), ["1", "2", "3", "4"]);
        assert_eq!(
            outcome.incidents.get("1").unwrap().borough.as_deref(),
            Some("BRONX")
        );
        assert_eq!(outcome.removed.get(&RemovalReason::DuplicateKey), Some(&1));
    }

    #[test]
    fn duplicate_then_missing_latitude_leaves_three_rows() {
        let raw = table(&[
            row("1", "01/02/2020", "BRONX", "40.8", "-73.9"),
            row("2", "01/03/2020", "QUEENS", "", "-73.8"),
            row("1", "01/04/2020", "BROOKLYN", "40.6", "-73.9"),
            row("3", "01/05/2020", "MANHATTAN", "40.75", "-73.99"),
            row("4", "01/06/2020", "BRONX", "40.85", "-73.88"),
        ]);
        let outcome = clean(&raw, &CleaningConfig::default()).unwrap();
        assert_eq!(keys(&outcome), ["1", "3", "4"]);
        assert_eq!(outcome.raw_count, 5);
        assert_eq!(outcome.removed_total(), 2);
        assert_eq!(
            outcome
                .removed
                .get(&RemovalReason::Missing(Column::Latitude)),
            Some(&1)
        );
    }

    #[test]
    fn cleaned_records_are_complete_and_unique() {
        let raw = table(&[
            row("1", "01/02/2020", "BRONX", "40.8", "-73.9"),
            row("2", "", "QUEENS", "40.7", "-73.8"),
            row("3", "01/05/2020", "", "40.75", ""),
            row("3", "01/05/2020", "", "40.75", "-73.99"),
            row("4", "01/06/2020", "(null)", "40.85", "-73.88"),
            row("5", "01/07/2020", "BRONX", "NA", "-73.88"),
        ]);
        let outcome = clean(&raw, &CleaningConfig::default()).unwrap();

        let unique: BTreeSet<&str> = keys(&outcome).into_iter().collect();
        assert_eq!(unique.len(), outcome.incidents.len());
        for record in &outcome.incidents {
            assert!(record.occur_date.is_some());
            assert!(record.latitude.is_some());
            assert!(record.longitude.is_some());
        }
        assert_eq!(keys(&outcome), ["1", "4"]);
    }

    #[test]
    fn missing_borough_is_filled() {
        let raw = table(&[row("9", "07/04/2021", "", "40.8", "-73.9")]);
        let outcome = clean(&raw, &CleaningConfig::default()).unwrap();
        assert_eq!(
            outcome.incidents.get("9").unwrap().borough.as_deref(),
            Some("Unknown")
        );
    }

    #[test]
    fn unparseable_values_remove_the_row_only() {
        let raw = table(&[
            row("1", "2020-01-02", "BRONX", "40.8", "-73.9"),
            row("2", "01/03/2020", "QUEENS", "north", "-73.8"),
            row("3", "01/05/2020", "MANHATTAN", "40.75", "-73.99"),
        ]);
        let outcome = clean(&raw, &CleaningConfig::default()).unwrap();
        assert_eq!(keys(&outcome), ["3"]);
        assert_eq!(
            outcome
                .removed
                .get(&RemovalReason::Unparseable(Column::OccurDate)),
            Some(&1)
        );
        assert_eq!(
            outcome
                .removed
                .get(&RemovalReason::Unparseable(Column::Latitude)),
            Some(&1)
        );
    }

    #[test]
    fn unparseable_time_and_murder_flag_remove_the_row() {
        let bad_time = row("1", "01/02/2020", "BRONX", "40.8", "-73.9").replace("14:05:00", "2 pm");
        let bad_flag = row("2", "01/03/2020", "QUEENS", "40.7", "-73.8").replace(",false,", ",maybe,");
        let raw = table(&[
            bad_time,
            bad_flag,
            row("3", "01/05/2020", "MANHATTAN", "40.75", "-73.99"),
        ]);
        let outcome = clean(&raw, &CleaningConfig::default()).unwrap();
        assert_eq!(keys(&outcome), ["3"]);
        assert_eq!(
            outcome
                .removed
                .get(&RemovalReason::Unparseable(Column::OccurTime)),
            Some(&1)
        );
        assert_eq!(
            outcome
                .removed
                .get(&RemovalReason::Unparseable(Column::StatisticalMurderFlag)),
            Some(&1)
        );
    }

    #[test]
    fn summary_lists_applied_policies() {
        let raw = table(&[row("1", "01/02/2020", "BRONX", "40.8", "-73.9")]);
        let summary = clean(&raw, &CleaningConfig::default()).unwrap().summary();
        assert_eq!(summary.policies.len(), Column::all().len());
        let boro = summary
            .policies
            .iter()
            .find(|p| p.column == Column::Boro.to_string())
            .unwrap();
        assert_eq!(boro.policy, "fill(Unknown)");
    }

    #[test]
    fn keep_policy_retains_rows_without_coordinates() {
        let mut config = CleaningConfig::default();
        config
            .missing
            .insert("LATITUDE".to_string(), MissingPolicy::Keep);
        config
            .missing
            .insert("LONGITUDE".to_string(), MissingPolicy::Keep);
        let raw = table(&[
            row("1", "01/02/2020", "BRONX", "", ""),
            row("2", "01/03/2020", "QUEENS", "40.7", "-73.8"),
        ]);
        let outcome = clean(&raw, &config).unwrap();
        assert_eq!(keys(&outcome), ["1", "2"]);
        assert!(outcome.incidents.get("1").unwrap().coordinates().is_none());
    }

    #[test]
    fn invalid_policy_aborts_before_processing() {
        let mut config = CleaningConfig::default();
        config.missing.insert(
            "LATITUDE".to_string(),
            MissingPolicy::Fill("40.7".to_string()),
        );
        let raw = table(&[row("1", "01/02/2020", "BRONX", "40.8", "-73.9")]);
        assert!(matches!(
            clean(&raw, &config),
            Err(CleanError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn parses_typed_fields() {
        let raw = table(&[row("1", "12/31/2019", "BRONX", "40.8", "-73.9")]);
        let outcome = clean(&raw, &CleaningConfig::default()).unwrap();
        let record = outcome.incidents.get("1").unwrap();
        assert_eq!(record.year(), Some(2019));
        assert_eq!(record.hour(), Some(14));
        assert_eq!(record.is_murder, Some(false));
        assert_eq!(record.precinct.as_deref(), Some("75"));
    }

    #[test]
    fn domains_come_from_surviving_rows() {
        let raw = table(&[
            row("1", "01/02/2020", "BRONX", "40.8", "-73.9"),
            row("2", "01/03/2020", "STATEN ISLAND", "", "-73.8"),
            row("3", "01/05/2020", "QUEENS", "40.75", "-73.99"),
        ]);
        let outcome = clean(&raw, &CleaningConfig::default()).unwrap();
        let boroughs = outcome.domains.get(CategoricalField::Borough).unwrap();
        assert_eq!(boroughs.values(), ["BRONX", "QUEENS"]);
    }

    #[test]
    fn cleaning_is_deterministic() {
        let rows = [
            row("1", "01/02/2020", "BRONX", "40.8", "-73.9"),
            row("1", "01/03/2020", "QUEENS", "40.7", "-73.8"),
            row("2", "01/05/2020", "", "40.75", "-73.99"),
        ];
        let a = clean(&table(&rows), &CleaningConfig::default()).unwrap();
        let b = clean(&table(&rows), &CleaningConfig::default()).unwrap();
        assert_eq!(a.incidents, b.incidents);
        assert_eq!(a.removed, b.removed);
        assert_eq!(a.summary(), b.summary());
    }
}
