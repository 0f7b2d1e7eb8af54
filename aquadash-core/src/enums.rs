//! Enum types for AQUADASH observations

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// QUALITY LABEL
// ============================================================================

/// Binary classification attached to every observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum QualityLabel {
    Safe,
    Unsafe,
}

impl QualityLabel {
    /// Canonical string stored in the `Quality` column.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            QualityLabel::Safe => "Safe",
            QualityLabel::Unsafe => "Unsafe",
        }
    }

    /// Parse a stored label. Matching ignores case and surrounding whitespace.
    pub fn from_db_str(s: &str) -> Result<Self, QualityLabelParseError> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("safe") {
            Ok(QualityLabel::Safe)
        } else if trimmed.eq_ignore_ascii_case("unsafe") {
            Ok(QualityLabel::Unsafe)
        } else {
            Err(QualityLabelParseError(s.to_string()))
        }
    }

    pub fn is_unsafe(&self) -> bool {
        matches!(self, QualityLabel::Unsafe)
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for QualityLabel {
    type Err = QualityLabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

impl Serialize for QualityLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_db_str())
    }
}

impl<'de> Deserialize<'de> for QualityLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_db_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Error when parsing an unrecognized quality label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityLabelParseError(pub String);

impl fmt::Display for QualityLabelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid quality label: {:?}", self.0)
    }
}

impl std::error::Error for QualityLabelParseError {}

// ============================================================================
// MEASUREMENTS AND ACCEPTABLE RANGES
// ============================================================================

/// Measured quantity on an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Measurement {
    #[serde(rename = "pH")]
    Ph,
    Turbidity,
    Hardness,
}

impl Measurement {
    pub const ALL: [Measurement; 3] =
        [Measurement::Ph, Measurement::Turbidity, Measurement::Hardness];

    /// Column name in the `water_quality` table.
    pub fn column(&self) -> &'static str {
        match self {
            Measurement::Ph => "pH",
            Measurement::Turbidity => "Turbidity",
            Measurement::Hardness => "Hardness",
        }
    }

    /// Fixed acceptable band for this measurement.
    pub fn acceptable_range(&self) -> AcceptableRange {
        match self {
            Measurement::Ph => AcceptableRange::new(6.5, 8.5),
            Measurement::Turbidity => AcceptableRange::new(0.0, 5.0),
            Measurement::Hardness => AcceptableRange::new(50.0, 300.0),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Inclusive numeric band used as a visual reference on charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AcceptableRange {
    pub low: f64,
    pub high: f64,
}

impl AcceptableRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// True when `value` lies within `[low, high]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_label_parse_is_case_insensitive() {
        assert_eq!(QualityLabel::from_db_str("Safe"), Ok(QualityLabel::Safe));
        assert_eq!(QualityLabel::from_db_str("safe"), Ok(QualityLabel::Safe));
        assert_eq!(QualityLabel::from_db_str(" UNSAFE "), Ok(QualityLabel::Unsafe));
        assert!(QualityLabel::from_db_str("unknown").is_err());
        assert!(QualityLabel::from_db_str("").is_err());
    }

    #[test]
    fn test_quality_label_serde_uses_canonical_names() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&QualityLabel::Unsafe)?, "\"Unsafe\"");
        let parsed: QualityLabel = serde_json::from_str("\"safe\"")?;
        assert_eq!(parsed, QualityLabel::Safe);
        assert!(serde_json::from_str::<QualityLabel>("\"Maybe\"").is_err());
        Ok(())
    }

    #[test]
    fn test_acceptable_ranges() {
        let ph = Measurement::Ph.acceptable_range();
        assert_eq!((ph.low, ph.high), (6.5, 8.5));
        assert!(ph.contains(6.5));
        assert!(ph.contains(8.5));
        assert!(!ph.contains(8.51));

        let turbidity = Measurement::Turbidity.acceptable_range();
        assert_eq!((turbidity.low, turbidity.high), (0.0, 5.0));

        let hardness = Measurement::Hardness.acceptable_range();
        assert_eq!((hardness.low, hardness.high), (50.0, 300.0));
        assert!(!hardness.contains(49.9));
    }

    #[test]
    fn test_measurement_serializes_as_column_name() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&Measurement::Ph)?, "\"pH\"");
        assert_eq!(serde_json::to_string(&Measurement::Hardness)?, "\"Hardness\"");
        Ok(())
    }
}
