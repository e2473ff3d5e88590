//! Record pre-filters applied before aggregation.

use nypd_shootings_analytics_models::GroupField;
use nypd_shootings_incident_models::IncidentRecord;

use crate::aggregate::group_key;

/// Drops records whose `field` value is one of `sentinels`, compared
/// case-insensitively.
///
/// Records with no value for the field are kept; they still land in the
/// missing bucket of a later aggregation.
#[must_use]
pub fn exclude_sentinels<'a, I>(
    records: I,
    field: GroupField,
    sentinels: &[String],
) -> Vec<&'a IncidentRecord>
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    let kept: Vec<&IncidentRecord> = records
        .into_iter()
        .filter(|record| {
            group_key(record, field)
                .is_none_or(|value| !sentinels.iter().any(|s| s.eq_ignore_ascii_case(&value)))
        })
        .collect();

    log::debug!(
        "Sentinel filter on {field} ({}) kept {} incidents",
        sentinels.join(", "),
        kept.len()
    );

    kept
}

#[cfg(test)]
mod tests {
    use nypd_shootings_analytics_models::Metric;

    use super::*;
    use crate::aggregate;

    fn victim(key: &str, race: Option<&str>) -> IncidentRecord {
        let mut record = IncidentRecord::new(key);
        record.victim_race = race.map(str::to_string);
        record
    }

    fn sample() -> Vec<IncidentRecord> {
        vec![
            victim("1", Some("BLACK")),
            victim("2", Some("UNKNOWN")),
            victim("3", Some("WHITE HISPANIC")),
            victim("4", Some("unknown")),
            victim("5", None),
            victim("6", Some("BLACK")),
        ]
    }

    #[test]
    fn drops_sentinel_values_case_insensitively() {
        let records = sample();
        let kept = exclude_sentinels(
            &records,
            GroupField::VictimRace,
            &["UNKNOWN".to_string()],
        );
        let keys: Vec<&str> = kept.iter().map(|r| r.incident_key.as_str()).collect();
        assert_eq!(keys, ["1", "3", "5", "6"]);
    }

    #[test]
    fn percentages_after_filtering_use_the_filtered_total() {
        let records = sample();
        let kept = exclude_sentinels(
            &records,
            GroupField::VictimRace,
            &["UNKNOWN".to_string()],
        );
        let buckets = aggregate(kept, GroupField::VictimRace, Metric::Percentage);
        let black = buckets.iter().find(|b| b.key == "BLACK").unwrap();
        assert_eq!(black.count, 2);
        assert!((black.percentage.unwrap() - 50.0).abs() < 1e-9);
        assert!(buckets.iter().all(|b| b.key != "UNKNOWN"));
    }

    #[test]
    fn no_sentinels_keeps_everything() {
        let records = sample();
        assert_eq!(
            exclude_sentinels(&records, GroupField::VictimRace, &[]).len(),
            records.len()
        );
    }
}
