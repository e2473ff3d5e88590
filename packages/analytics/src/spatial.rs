//! H3 hexbin density of located incidents.

use std::collections::BTreeMap;

use h3o::{CellIndex, LatLng, Resolution};
use nypd_shootings_analytics_models::{HexBin, HexBinSummary};
use nypd_shootings_incident_models::IncidentRecord;

use crate::AnalyticsError;

/// Counts incidents per H3 cell at `resolution`.
///
/// Records without coordinates, or whose coordinates h3o rejects, are
/// counted in [`HexBinSummary::skipped`]. Bins are ordered by descending
/// count, ties broken by cell index.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidResolution`] if `resolution` is above 15.
pub fn hexbins<'a, I>(records: I, resolution: u8) -> Result<HexBinSummary, AnalyticsError>
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    let res = Resolution::try_from(resolution)
        .map_err(|_| AnalyticsError::InvalidResolution { resolution })?;

    let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
    let mut located: u64 = 0;
    let mut skipped: u64 = 0;

    for record in records {
        let Some((lat, lng)) = record.coordinates() else {
            skipped += 1;
            continue;
        };
        let Ok(coord) = LatLng::new(lat, lng) else {
            skipped += 1;
            continue;
        };
        *counts.entry(u64::from(coord.to_cell(res))).or_insert(0) += 1;
        located += 1;
    }

    let mut bins: Vec<HexBin> = counts
        .into_iter()
        .filter_map(|(index, count)| {
            let cell = CellIndex::try_from(index).ok()?;
            let center = LatLng::from(cell);
            Some(HexBin {
                cell: cell.to_string(),
                center_lat: center.lat(),
                center_lng: center.lng(),
                count,
            })
        })
        .collect();
    bins.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.cell.cmp(&b.cell)));

    log::debug!(
        "Binned {located} incidents into {} cells at resolution {resolution} ({skipped} skipped)",
        bins.len()
    );

    Ok(HexBinSummary {
        resolution,
        bins,
        located,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located(key: &str, lat: f64, lng: f64) -> IncidentRecord {
        let mut record = IncidentRecord::new(key);
        record.latitude = Some(lat);
        record.longitude = Some(lng);
        record
    }

    #[test]
    fn nearby_incidents_share_a_cell() {
        let records = vec![
            located("1", 40.678_100, -73.944_200),
            located("2", 40.678_110, -73.944_210),
            located("3", 40.850_000, -73.870_000),
            IncidentRecord::new("4"),
        ];
        let summary = hexbins(&records, 8).unwrap();

        assert_eq!(summary.resolution, 8);
        assert_eq!(summary.located, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.bins.len(), 2);
        assert_eq!(summary.bins[0].count, 2);
        assert_eq!(summary.bins[1].count, 1);

        let center = &summary.bins[0];
        assert!((center.center_lat - 40.678).abs() < 0.01);
        assert!((center.center_lng + 73.944).abs() < 0.01);
    }

    #[test]
    fn bin_counts_sum_to_located() {
        let records: Vec<IncidentRecord> = (0..20)
            .map(|i| located(&i.to_string(), 40.6 + f64::from(i) * 0.01, -73.9))
            .collect();
        let summary = hexbins(&records, 9).unwrap();
        let sum: u64 = summary.bins.iter().map(|b| b.count).sum();
        assert_eq!(sum, summary.located);
        assert_eq!(summary.located, 20);
    }

    #[test]
    fn rejects_invalid_resolution() {
        let err = hexbins(&Vec::<IncidentRecord>::new(), 16).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InvalidResolution { resolution: 16 }
        ));
    }
}
