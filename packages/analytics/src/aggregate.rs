//! Count and percentage aggregation by direct or derived fields.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use nypd_shootings_analytics_models::{
    AggregateBucket, BucketOrder, GroupField, MISSING_KEY, Metric,
};
use nypd_shootings_incident_models::{IncidentRecord, TimeOfDay};

const MONTHS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Extracts the grouping key of `record` for `field`.
///
/// Derived keys: years as digits, months and weekdays as English names,
/// hours zero-padded (`"07"`), time of day as the bucket name. Returns
/// `None` when the underlying value is missing.
#[must_use]
pub fn group_key(record: &IncidentRecord, field: GroupField) -> Option<String> {
    if let Some(categorical) = field.categorical() {
        return record.categorical(categorical).map(str::to_string);
    }

    match field {
        GroupField::MurderFlag => record.is_murder.map(|m| m.to_string()),
        GroupField::Year => record.year().map(|y| y.to_string()),
        GroupField::Month => record.occur_date.map(|d| d.format("%B").to_string()),
        GroupField::Weekday => record.occur_date.map(|d| d.format("%A").to_string()),
        GroupField::Hour => record.hour().map(|h| format!("{h:02}")),
        GroupField::TimeOfDay => record
            .hour()
            .and_then(TimeOfDay::from_hour)
            .map(|t| t.to_string()),
        _ => None,
    }
}

/// Aggregates `records` by `group_by`, ordered by descending count with ties
/// broken by key.
///
/// Records without a value for the field are counted under
/// [`MISSING_KEY`], so bucket counts always sum to the number of records.
#[must_use]
pub fn aggregate<'a, I>(records: I, group_by: GroupField, metric: Metric) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    aggregate_ordered(records, group_by, metric, BucketOrder::CountDesc)
}

/// Aggregates `records` by `group_by` in the given display order.
#[must_use]
pub fn aggregate_ordered<'a, I>(
    records: I,
    group_by: GroupField,
    metric: Metric,
    order: BucketOrder,
) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut total: u64 = 0;

    for record in records {
        total += 1;
        let key = group_key(record, group_by).unwrap_or_else(|| MISSING_KEY.to_string());
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut buckets: Vec<AggregateBucket> = counts
        .into_iter()
        .map(|(key, count)| AggregateBucket {
            key,
            count,
            percentage: match metric {
                Metric::Count => None,
                Metric::Percentage => Some(percent(count, total)),
            },
        })
        .collect();

    match order {
        BucketOrder::CountDesc => {
            buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        }
        BucketOrder::Natural => buckets.sort_by(|a, b| natural_cmp(group_by, &a.key, &b.key)),
    }

    log::debug!(
        "Aggregated {total} incidents by {group_by} into {} buckets",
        buckets.len()
    );

    buckets
}

/// Earliest and latest occurrence date among `records`.
#[must_use]
pub fn date_span<'a, I>(records: I) -> Option<(NaiveDate, NaiveDate)>
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    records
        .into_iter()
        .filter_map(|r| r.occur_date)
        .fold(None, |span, date| match span {
            None => Some((date, date)),
            Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
        })
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

/// Compares two keys of `field` in the field's natural order. The missing
/// bucket always sorts last.
pub(crate) fn natural_cmp(field: GroupField, a: &str, b: &str) -> Ordering {
    let rank = |key: &str| (key == MISSING_KEY, natural_rank(field, key), key.to_string());
    let (a_missing, a_rank, a_key) = rank(a);
    let (b_missing, b_rank, b_key) = rank(b);
    a_missing
        .cmp(&b_missing)
        .then_with(|| match (a_rank, b_rank) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a_key.cmp(&b_key))
}

fn natural_rank(field: GroupField, key: &str) -> Option<i64> {
    let position = |names: &[&str]| {
        names
            .iter()
            .position(|n| *n == key)
            .and_then(|p| i64::try_from(p).ok())
    };

    match field {
        GroupField::Month => position(MONTHS),
        GroupField::Weekday => position(WEEKDAYS),
        GroupField::TimeOfDay => TimeOfDay::all()
            .iter()
            .position(|t| t.to_string() == key)
            .and_then(|p| i64::try_from(p).ok()),
        GroupField::Year | GroupField::Hour | GroupField::Precinct => key.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn incident(key: &str, date: (i32, u32, u32), hour: u32, boro: &str) -> IncidentRecord {
        let mut record = IncidentRecord::new(key);
        record.occur_date = NaiveDate::from_ymd_opt(date.0, date.1, date.2);
        record.occur_time = NaiveTime::from_hms_opt(hour, 15, 0);
        record.borough = Some(boro.to_string());
        record
    }

    fn sample() -> Vec<IncidentRecord> {
        vec![
            incident("1", (2020, 1, 6), 1, "BROOKLYN"),
            incident("2", (2020, 3, 7), 13, "BRONX"),
            incident("3", (2021, 1, 8), 19, "BROOKLYN"),
            incident("4", (2021, 12, 9), 23, "QUEENS"),
            incident("5", (2022, 7, 10), 8, "BRONX"),
            incident("6", (2022, 7, 11), 20, "BROOKLYN"),
        ]
    }

    #[test]
    fn counts_sum_to_input_size() {
        let records = sample();
        for field in GroupField::all() {
            let buckets = aggregate(&records, *field, Metric::Count);
            let sum: u64 = buckets.iter().map(|b| b.count).sum();
            assert_eq!(sum, records.len() as u64, "{field:?}");
        }
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let records = sample();
        for field in GroupField::all() {
            let buckets = aggregate(&records, *field, Metric::Percentage);
            let sum: f64 = buckets.iter().filter_map(|b| b.percentage).sum();
            assert!((sum - 100.0).abs() < 1e-9, "{field:?}: {sum}");
        }
    }

    #[test]
    fn count_metric_has_no_percentage() {
        let buckets = aggregate(&sample(), GroupField::Borough, Metric::Count);
        assert!(buckets.iter().all(|b| b.percentage.is_none()));
    }

    #[test]
    fn orders_by_count_then_key() {
        let buckets = aggregate(&sample(), GroupField::Borough, Metric::Percentage);
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["BROOKLYN", "BRONX", "QUEENS"]);
        assert_eq!(buckets[0].count, 3);
        assert!((buckets[0].percentage.unwrap() - 50.0).abs() < 1e-9);

        let years = aggregate(&sample(), GroupField::Year, Metric::Count);
        let keys: Vec<&str> = years.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["2020", "2021", "2022"]);
    }

    #[test]
    fn natural_order_is_chronological() {
        let months = aggregate_ordered(
            &sample(),
            GroupField::Month,
            Metric::Count,
            BucketOrder::Natural,
        );
        let keys: Vec<&str> = months.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["January", "March", "July", "December"]);

        let buckets = aggregate_ordered(
            &sample(),
            GroupField::TimeOfDay,
            Metric::Count,
            BucketOrder::Natural,
        );
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["Night", "Morning", "Afternoon", "Evening"]);
    }

    #[test]
    fn derives_keys_from_date_and_time() {
        let record = incident("1", (2021, 12, 9), 7, "QUEENS");
        assert_eq!(group_key(&record, GroupField::Year).unwrap(), "2021");
        assert_eq!(group_key(&record, GroupField::Month).unwrap(), "December");
        assert_eq!(group_key(&record, GroupField::Weekday).unwrap(), "Thursday");
        assert_eq!(group_key(&record, GroupField::Hour).unwrap(), "07");
        assert_eq!(group_key(&record, GroupField::TimeOfDay).unwrap(), "Morning");
        assert!(group_key(&record, GroupField::MurderFlag).is_none());
    }

    #[test]
    fn missing_values_are_bucketed_last_in_natural_order() {
        let mut records = sample();
        records.push(IncidentRecord::new("7"));
        let buckets = aggregate_ordered(
            &records,
            GroupField::Year,
            Metric::Count,
            BucketOrder::Natural,
        );
        assert_eq!(buckets.last().unwrap().key, MISSING_KEY);
        let sum: u64 = buckets.iter().map(|b| b.count).sum();
        assert_eq!(sum, 7);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let a = aggregate(&sample(), GroupField::Weekday, Metric::Percentage);
        let b = aggregate(&sample(), GroupField::Weekday, Metric::Percentage);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        let empty: Vec<IncidentRecord> = Vec::new();
        assert!(aggregate(&empty, GroupField::Borough, Metric::Percentage).is_empty());
        assert!(date_span(&empty).is_none());
    }

    #[test]
    fn computes_date_span() {
        let (lo, hi) = date_span(&sample()).unwrap();
        assert_eq!(lo.to_string(), "2020-01-06");
        assert_eq!(hi.to_string(), "2022-07-11");
    }
}
