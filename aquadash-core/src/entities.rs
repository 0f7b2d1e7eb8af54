//! Core entity structures

use crate::{DataError, Measurement, QualityLabel, Timestamp};
use serde::{Deserialize, Serialize};

/// One timestamped water-quality measurement for a city.
///
/// Field names on the wire match the `water_quality` table columns so a
/// cached snapshot is the same JSON the source rows would produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ObservationRow {
    #[serde(rename = "Date_Time")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub date_time: Timestamp,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "Turbidity")]
    pub turbidity: f64,
    #[serde(rename = "Hardness")]
    pub hardness: f64,
    #[serde(rename = "Quality")]
    pub quality: QualityLabel,
}

impl ObservationRow {
    /// Value of the given measurement on this row.
    pub fn value_of(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Ph => self.ph,
            Measurement::Turbidity => self.turbidity,
            Measurement::Hardness => self.hardness,
        }
    }

    /// Check the invariants the typed fields cannot express on their own.
    ///
    /// `index` is the row position in its table and only feeds the error.
    pub fn validate(&self, index: usize) -> Result<(), DataError> {
        if self.city.trim().is_empty() {
            return Err(DataError::malformed(index, "City", "empty city name"));
        }
        for measurement in Measurement::ALL {
            let value = self.value_of(measurement);
            if !value.is_finite() {
                return Err(DataError::malformed(
                    index,
                    measurement.column(),
                    format!("non-finite value {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// Ordered rows produced by one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationTable {
    rows: Vec<ObservationRow>,
}

impl ObservationTable {
    pub fn new(rows: Vec<ObservationRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ObservationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ObservationRow> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<ObservationRow> {
        self.rows
    }

    /// Distinct city names in first-seen order.
    pub fn cities(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.city.as_str()) {
                seen.push(row.city.as_str());
            }
        }
        seen
    }
}

impl From<Vec<ObservationRow>> for ObservationTable {
    fn from(rows: Vec<ObservationRow>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<ObservationRow> for ObservationTable {
    fn from_iter<I: IntoIterator<Item = ObservationRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for ObservationTable {
    type Item = ObservationRow;
    type IntoIter = std::vec::IntoIter<ObservationRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObservationTable {
    type Item = &'a ObservationRow;
    type IntoIter = std::slice::Iter<'a, ObservationRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Column values as read from the store, before any field is required.
///
/// Store clients fill this in from whatever the driver returns; converting
/// it into an [`ObservationRow`] is where missing fields and unknown labels
/// are rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObservation {
    pub date_time: Option<Timestamp>,
    pub city: Option<String>,
    pub ph: Option<f64>,
    pub turbidity: Option<f64>,
    pub hardness: Option<f64>,
    pub quality: Option<String>,
}

impl RawObservation {
    pub fn into_row(self, index: usize) -> Result<ObservationRow, DataError> {
        let missing = |field: &str| DataError::malformed(index, field, "missing value");

        let quality_raw = self.quality.ok_or_else(|| missing("Quality"))?;
        let quality = QualityLabel::from_db_str(&quality_raw)
            .map_err(|e| DataError::malformed(index, "Quality", e.to_string()))?;

        let row = ObservationRow {
            date_time: self.date_time.ok_or_else(|| missing("Date_Time"))?,
            city: self.city.ok_or_else(|| missing("City"))?,
            ph: self.ph.ok_or_else(|| missing("pH"))?,
            turbidity: self.turbidity.ok_or_else(|| missing("Turbidity"))?,
            hardness: self.hardness.ok_or_else(|| missing("Hardness"))?,
            quality,
        };
        row.validate(index)?;
        Ok(row)
    }
}
