//! Murder share per group.

use std::collections::BTreeMap;

use nypd_shootings_analytics_models::{BucketOrder, GroupField, MISSING_KEY, RateBucket};
use nypd_shootings_incident_models::IncidentRecord;

use crate::aggregate::{group_key, natural_cmp};

/// Computes the share of murders within each group of `group_by`.
///
/// Records with an unknown murder flag are not counted.
#[must_use]
pub fn murder_rate<'a, I>(records: I, group_by: GroupField, order: BucketOrder) -> Vec<RateBucket>
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    let mut tallies: BTreeMap<String, (u64, u64)> = BTreeMap::new();

    for record in records {
        let Some(is_murder) = record.is_murder else {
            continue;
        };
        let key = group_key(record, group_by).unwrap_or_else(|| MISSING_KEY.to_string());
        let entry = tallies.entry(key).or_insert((0, 0));
        entry.0 += 1;
        if is_murder {
            entry.1 += 1;
        }
    }

    let mut buckets: Vec<RateBucket> = tallies
        .into_iter()
        .map(|(key, (total, murders))| RateBucket {
            key,
            total,
            murders,
            rate: ratio(murders, total),
        })
        .collect();

    match order {
        BucketOrder::CountDesc => {
            buckets.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
        }
        BucketOrder::Natural => buckets.sort_by(|a, b| natural_cmp(group_by, &a.key, &b.key)),
    }

    buckets
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
