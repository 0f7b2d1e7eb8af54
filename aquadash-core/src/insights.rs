//! Insight aggregation over an observation table.
//!
//! Turns the raw rows of one refresh cycle into the numbers the dashboard
//! shows: safe/unsafe totals, unsafe events grouped by city, the fixed
//! acceptable ranges drawn as chart bands, and how many rows fall outside
//! each band.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AcceptableRange, DataError, Measurement, ObservationTable, QualityLabel};

/// Derived summary of one observation table. Recomputed per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Insights {
    pub safe_count: usize,
    pub unsafe_count: usize,
    /// City → number of Unsafe rows. Cities without unsafe rows are absent.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub unsafe_by_city: BTreeMap<String, usize>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub acceptable_ranges: BTreeMap<Measurement, AcceptableRange>,
    /// Measurement → number of rows outside its acceptable range.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub out_of_range_counts: BTreeMap<Measurement, usize>,
}

impl Insights {
    pub fn total(&self) -> usize {
        self.safe_count + self.unsafe_count
    }

    /// Unsafe share of all rows, 0.0 for an empty table.
    pub fn unsafe_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.unsafe_count as f64 / total as f64
        }
    }
}

/// Static threshold table for every measurement.
pub fn acceptable_ranges() -> BTreeMap<Measurement, AcceptableRange> {
    Measurement::ALL
        .iter()
        .map(|m| (*m, m.acceptable_range()))
        .collect()
}

/// Aggregate a table into [`Insights`].
///
/// Every row is validated first; a single malformed row rejects the whole
/// table so the dashboard never shows partial counts.
pub fn summarize(table: &ObservationTable) -> Result<Insights, DataError> {
    let ranges = acceptable_ranges();
    let mut safe_count = 0usize;
    let mut unsafe_count = 0usize;
    let mut unsafe_by_city: BTreeMap<String, usize> = BTreeMap::new();
    let mut out_of_range_counts: BTreeMap<Measurement, usize> =
        Measurement::ALL.iter().map(|m| (*m, 0)).collect();

    for (index, row) in table.iter().enumerate() {
        row.validate(index)?;

        match row.quality {
            QualityLabel::Safe => safe_count += 1,
            QualityLabel::Unsafe => {
                unsafe_count += 1;
                *unsafe_by_city.entry(row.city.clone()).or_insert(0) += 1;
            }
        }

        for (measurement, range) in &ranges {
            if !range.contains(row.value_of(*measurement)) {
                if let Some(count) = out_of_range_counts.get_mut(measurement) {
                    *count += 1;
                }
            }
        }
    }

    Ok(Insights {
        safe_count,
        unsafe_count,
        unsafe_by_city,
        acceptable_ranges: ranges,
        out_of_range_counts,
    })
}
