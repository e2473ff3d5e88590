//! Reduction of cleaned incidents to model-ready feature rows.

use nypd_shootings_classifier_models::{FeatureDomains, FeatureRow, FeatureSet};
use nypd_shootings_incident_models::{CategoryDomains, IncidentRecord, TimeOfDay};

/// Builds the feature set of `records` against the category domains inferred
/// during cleaning.
///
/// Rows missing a borough, precinct, time of day or murder flag are dropped.
/// This completeness rule applies only to modeling; aggregations see every
/// cleaned record. Rows whose borough or precinct is outside `categories`
/// are dropped too, so the feature set never carries a level the rest of the
/// report does not know about.
#[must_use]
pub fn build_features<'a, I>(records: I, categories: &CategoryDomains) -> FeatureSet
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    let domains = FeatureDomains::from_categories(categories);
    let mut incomplete: u64 = 0;
    let mut outside: u64 = 0;

    let rows: Vec<FeatureRow> = records
        .into_iter()
        .filter_map(|record| {
            let Some(row) = feature_row(record) else {
                log::debug!("Incident {} incomplete for modeling", record.incident_key);
                incomplete += 1;
                return None;
            };
            if !domains.borough.contains(&row.borough) || !domains.precinct.contains(&row.precinct)
            {
                log::debug!(
                    "Incident {}: borough {:?} or precinct {:?} not in cleaned domains",
                    row.incident_key,
                    row.borough,
                    row.precinct
                );
                outside += 1;
                return None;
            }
            Some(row)
        })
        .collect();

    if outside > 0 {
        log::warn!("{outside} feature rows dropped for levels outside the cleaned domains");
    }
    log::info!(
        "Built {} feature rows ({incomplete} incomplete dropped): {} boroughs, {} precincts",
        rows.len(),
        domains.borough.len(),
        domains.precinct.len()
    );

    FeatureSet { rows, domains }
}

fn feature_row(record: &IncidentRecord) -> Option<FeatureRow> {
    Some(FeatureRow {
        incident_key: record.incident_key.clone(),
        borough: record.borough.clone()?,
        precinct: record.precinct.clone()?,
        time_of_day: record.hour().and_then(TimeOfDay::from_hour)?,
        is_murder: record.is_murder?,
    })
}
