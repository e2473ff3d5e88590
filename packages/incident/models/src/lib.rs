#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shooting incident record types shared across the report pipeline.
//!
//! Defines the CSV schema ([`Column`]), the raw string rows produced by the
//! loader ([`RawRecord`]), the cleaned [`IncidentRecord`], and the
//! categorical domains that are computed once during cleaning and passed
//! forward to aggregation and modeling.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike as _, NaiveDate, NaiveTime, Timelike as _, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A named column of the shooting-incident CSV.
///
/// Header matching is ASCII case-insensitive, so the public dataset's
/// `Latitude`/`Longitude` headers resolve to [`Column::Latitude`] and
/// [`Column::Longitude`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Column {
    /// Unique incident identifier (deduplication key)
    IncidentKey,
    /// Calendar date of the incident
    OccurDate,
    /// Time of day of the incident
    OccurTime,
    /// Borough name
    Boro,
    /// Precinct code
    Precinct,
    /// Whether the shooting resulted in a murder
    StatisticalMurderFlag,
    /// Perpetrator age group
    PerpAgeGroup,
    /// Perpetrator sex
    PerpSex,
    /// Perpetrator race
    PerpRace,
    /// Victim age group
    VicAgeGroup,
    /// Victim sex
    VicSex,
    /// Victim race
    VicRace,
    /// Latitude (WGS84)
    Latitude,
    /// Longitude (WGS84)
    Longitude,
}

impl Column {
    /// Returns every column the pipeline requires, in CSV order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::IncidentKey,
            Self::OccurDate,
            Self::OccurTime,
            Self::Boro,
            Self::Precinct,
            Self::StatisticalMurderFlag,
            Self::PerpAgeGroup,
            Self::PerpSex,
            Self::PerpRace,
            Self::VicAgeGroup,
            Self::VicSex,
            Self::VicRace,
            Self::Latitude,
            Self::Longitude,
        ]
    }

    /// Whether values of this column are free-form categories (and may
    /// therefore be filled with a default value when missing).
    #[must_use]
    pub const fn is_categorical(self) -> bool {
        matches!(
            self,
            Self::Boro
                | Self::Precinct
                | Self::PerpAgeGroup
                | Self::PerpSex
                | Self::PerpRace
                | Self::VicAgeGroup
                | Self::VicSex
                | Self::VicRace
        )
    }
}

/// What the cleaner does with a row whose value for a column is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Remove the whole row.
    Drop,
    /// Retain the row with no value for the column.
    Keep,
    /// Replace the missing value with the given category.
    Fill(String),
}

impl std::fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drop => write!(f, "drop"),
            Self::Keep => write!(f, "keep"),
            Self::Fill(value) => write!(f, "fill({value})"),
        }
    }
}

/// One untyped row as read from the CSV.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    /// 1-based data line number (the header is line 0).
    pub line: u64,
    /// Trimmed string value per schema column.
    pub values: BTreeMap<Column, String>,
}

impl RawRecord {
    /// Returns the raw value for `column`, or `""` when the row had no cell
    /// for it.
    #[must_use]
    pub fn get(&self, column: Column) -> &str {
        self.values.get(&column).map_or("", String::as_str)
    }
}

/// One cleaned shooting incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Unique incident identifier.
    pub incident_key: String,
    /// Calendar date of the incident.
    pub occur_date: Option<NaiveDate>,
    /// Time of day of the incident.
    pub occur_time: Option<NaiveTime>,
    /// Borough (`"Unknown"` when filled by the default policy).
    pub borough: Option<String>,
    /// Precinct code.
    pub precinct: Option<String>,
    /// Victim age group (may be `"UNKNOWN"`).
    pub victim_age_group: Option<String>,
    /// Victim sex (may be `"U"`).
    pub victim_sex: Option<String>,
    /// Victim race (may be `"UNKNOWN"`).
    pub victim_race: Option<String>,
    /// Perpetrator age group.
    pub perp_age_group: Option<String>,
    /// Perpetrator sex.
    pub perp_sex: Option<String>,
    /// Perpetrator race.
    pub perp_race: Option<String>,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
    /// Whether the incident is flagged as a murder.
    pub is_murder: Option<bool>,
}

impl IncidentRecord {
    /// Creates a record with only the key set.
    #[must_use]
    pub fn new(incident_key: impl Into<String>) -> Self {
        Self {
            incident_key: incident_key.into(),
            occur_date: None,
            occur_time: None,
            borough: None,
            precinct: None,
            victim_age_group: None,
            victim_sex: None,
            victim_race: None,
            perp_age_group: None,
            perp_sex: None,
            perp_race: None,
            latitude: None,
            longitude: None,
            is_murder: None,
        }
    }

    /// Hour of day (0-23) of the incident.
    #[must_use]
    pub fn hour(&self) -> Option<u32> {
        self.occur_time.map(|t| t.hour())
    }

    /// Calendar year of the incident.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.occur_date.map(|d| d.year())
    }

    /// Calendar month (1-12) of the incident.
    #[must_use]
    pub fn month(&self) -> Option<u32> {
        self.occur_date.map(|d| d.month())
    }

    /// Day of week of the incident.
    #[must_use]
    pub fn weekday(&self) -> Option<Weekday> {
        self.occur_date.map(|d| d.weekday())
    }

    /// Returns `(latitude, longitude)` when both are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Returns the value of a categorical field.
    #[must_use]
    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        let value = match field {
            CategoricalField::Borough => &self.borough,
            CategoricalField::Precinct => &self.precinct,
            CategoricalField::VictimAgeGroup => &self.victim_age_group,
            CategoricalField::VictimSex => &self.victim_sex,
            CategoricalField::VictimRace => &self.victim_race,
            CategoricalField::PerpAgeGroup => &self.perp_age_group,
            CategoricalField::PerpSex => &self.perp_sex,
            CategoricalField::PerpRace => &self.perp_race,
        };
        value.as_deref()
    }
}

/// The eight categorical fields of an [`IncidentRecord`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CategoricalField {
    /// Borough
    Borough,
    /// Precinct
    Precinct,
    /// Victim age group
    VictimAgeGroup,
    /// Victim sex
    VictimSex,
    /// Victim race
    VictimRace,
    /// Perpetrator age group
    PerpAgeGroup,
    /// Perpetrator sex
    PerpSex,
    /// Perpetrator race
    PerpRace,
}

impl CategoricalField {
    /// Returns the CSV column this field is read from.
    #[must_use]
    pub const fn column(self) -> Column {
        match self {
            Self::Borough => Column::Boro,
            Self::Precinct => Column::Precinct,
            Self::VictimAgeGroup => Column::VicAgeGroup,
            Self::VictimSex => Column::VicSex,
            Self::VictimRace => Column::VicRace,
            Self::PerpAgeGroup => Column::PerpAgeGroup,
            Self::PerpSex => Column::PerpSex,
            Self::PerpRace => Column::PerpRace,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Borough,
            Self::Precinct,
            Self::VictimAgeGroup,
            Self::VictimSex,
            Self::VictimRace,
            Self::PerpAgeGroup,
            Self::PerpSex,
            Self::PerpRace,
        ]
    }
}

/// Time-of-day bucket derived from the hour of an incident.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TimeOfDay {
    /// Hours `[0, 6)`
    Night,
    /// Hours `[6, 12)`
    Morning,
    /// Hours `[12, 18)`
    Afternoon,
    /// Hours `[18, 24]`
    Evening,
}

impl TimeOfDay {
    /// Buckets an hour of day. Both 0 and 24 are in range; anything above 24
    /// returns `None`.
    #[must_use]
    pub const fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            0..6 => Some(Self::Night),
            6..12 => Some(Self::Morning),
            12..18 => Some(Self::Afternoon),
            18..=24 => Some(Self::Evening),
            _ => None,
        }
    }

    /// Returns all variants in chronological order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Night, Self::Morning, Self::Afternoon, Self::Evening]
    }
}

/// The enumerated set of values observed for one categorical field.
///
/// Values are sorted and unique, so the index of a value is stable for a
/// given set of observations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoricalDomain {
    values: Vec<String>,
}

impl CategoricalDomain {
    /// Builds a domain from observed values.
    #[must_use]
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        Self {
            values: set.into_iter().collect(),
        }
    }

    /// Position of `value` in the domain.
    #[must_use]
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.values
            .binary_search_by(|probe| probe.as_str().cmp(value))
            .ok()
    }

    /// Whether `value` was observed.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.index_of(value).is_some()
    }

    /// Number of distinct values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values were observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The sorted values.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Domains for every [`CategoricalField`], inferred once from cleaned
/// records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryDomains {
    domains: BTreeMap<CategoricalField, CategoricalDomain>,
}

impl CategoryDomains {
    /// Infers every categorical domain from `records`.
    #[must_use]
    pub fn from_records(records: &[IncidentRecord]) -> Self {
        let domains = CategoricalField::all()
            .iter()
            .map(|&field| {
                let domain = CategoricalDomain::from_values(
                    records.iter().filter_map(|r| r.categorical(field)),
                );
                (field, domain)
            })
            .collect();
        Self { domains }
    }

    /// Returns the domain of `field`.
    #[must_use]
    pub fn get(&self, field: CategoricalField) -> Option<&CategoricalDomain> {
        self.domains.get(&field)
    }

    /// Iterates over `(field, domain)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (CategoricalField, &CategoricalDomain)> {
        self.domains.iter().map(|(field, domain)| (*field, domain))
    }
}

/// An ordered sequence of incidents keyed by `incident_key`.
///
/// Order is the input order of the source rows. Lookups and joins go through
/// the key, never through positions in some other sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncidentSet {
    records: Vec<IncidentRecord>,
    index: BTreeMap<String, usize>,
}

impl IncidentSet {
    /// Looks up a record by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&IncidentRecord> {
        self.index.get(key).map(|&pos| &self.records[pos])
    }

    /// Whether a record with `key` exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over records in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, IncidentRecord> {
        self.records.iter()
    }

    /// The records in input order.
    #[must_use]
    pub fn as_slice(&self) -> &[IncidentRecord] {
        &self.records
    }
}

/// Collects records in order. A record whose key is already present is
/// discarded, so the first occurrence of each key wins.
impl FromIterator<IncidentRecord> for IncidentSet {
    fn from_iter<I: IntoIterator<Item = IncidentRecord>>(iter: I) -> Self {
        let mut set = Self::default();
        for record in iter {
            if set.index.contains_key(&record.incident_key) {
                continue;
            }
            set.index
                .insert(record.incident_key.clone(), set.records.len());
            set.records.push(record);
        }
        set
    }
}

impl<'a> IntoIterator for &'a IncidentSet {
    type Item = &'a IncidentRecord;
    type IntoIter = std::slice::Iter<'a, IncidentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn time_of_day_partitions_zero_through_twenty_four() {
        for hour in 0..=24 {
            let buckets: Vec<TimeOfDay> = TimeOfDay::all()
                .iter()
                .copied()
                .filter(|b| TimeOfDay::from_hour(hour) == Some(*b))
                .collect();
            assert_eq!(buckets.len(), 1, "hour {hour} maps to {buckets:?}");
        }
        assert_eq!(TimeOfDay::from_hour(0), Some(TimeOfDay::Night));
        assert_eq!(TimeOfDay::from_hour(5), Some(TimeOfDay::Night));
        assert_eq!(TimeOfDay::from_hour(6), Some(TimeOfDay::Morning));
        assert_eq!(TimeOfDay::from_hour(12), Some(TimeOfDay::Afternoon));
        assert_eq!(TimeOfDay::from_hour(18), Some(TimeOfDay::Evening));
        assert_eq!(TimeOfDay::from_hour(24), Some(TimeOfDay::Evening));
        assert_eq!(TimeOfDay::from_hour(25), None);
    }

    #[test]
    fn column_parses_headers_case_insensitively() {
        assert_eq!(Column::from_str("Latitude").unwrap(), Column::Latitude);
        assert_eq!(Column::from_str("INCIDENT_KEY").unwrap(), Column::IncidentKey);
        assert_eq!(
            Column::from_str("statistical_murder_flag").unwrap(),
            Column::StatisticalMurderFlag
        );
        assert!(Column::from_str("Lon_Lat").is_err());
    }

    #[test]
    fn only_demographic_and_location_columns_are_categorical() {
        let categorical: Vec<Column> = Column::all()
            .iter()
            .copied()
            .filter(|c| c.is_categorical())
            .collect();
        let expected: Vec<Column> = CategoricalField::all()
            .iter()
            .map(|f| f.column())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut sorted = categorical;
        sorted.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn domain_is_sorted_and_unique() {
        let domain = CategoricalDomain::from_values(["QUEENS", "BRONX", "QUEENS", "BROOKLYN"]);
        assert_eq!(domain.values(), ["BRONX", "BROOKLYN", "QUEENS"]);
        assert_eq!(domain.index_of("BROOKLYN"), Some(1));
        assert_eq!(domain.index_of("STATEN ISLAND"), None);
    }

    #[test]
    fn domains_ignore_missing_values() {
        let mut a = IncidentRecord::new("1");
        a.victim_sex = Some("M".to_string());
        let b = IncidentRecord::new("2");
        let domains = CategoryDomains::from_records(&[a, b]);
        assert_eq!(
            domains.get(CategoricalField::VictimSex).unwrap().values(),
            ["M"]
        );
        assert!(domains.get(CategoricalField::PerpRace).unwrap().is_empty());
    }

    #[test]
    fn incident_set_keeps_first_record_per_key() {
        let mut later = IncidentRecord::new("7");
        later.borough = Some("QUEENS".to_string());
        let set: IncidentSet = [IncidentRecord::new("7"), IncidentRecord::new("8"), later]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.get("7").unwrap().borough.is_none());
    }

    #[test]
    fn incident_set_looks_up_by_key_and_keeps_order() {
        let set: IncidentSet = [IncidentRecord::new("b"), IncidentRecord::new("a")]
            .into_iter()
            .collect();
        let keys: Vec<&str> = set.iter().map(|r| r.incident_key.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
        assert!(set.contains("a"));
        assert_eq!(set.get("b").unwrap().incident_key, "b");
        assert!(set.get("c").is_none());
    }
}
