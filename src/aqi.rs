//! PM2.5 air quality categories
//!
//! Readings are bucketed into the six bands of the Indian AQI scale for
//! PM2.5. Bands have inclusive upper bounds and are checked in ascending
//! order, so a reading lands in the first band whose bound it does not
//! exceed.

use serde::Serialize;

/// Inclusive upper bound of each ranked band, Severe has none
const PM25_BREAKPOINTS: [(f64, AqiCategory); 5] = [
    (30.0, AqiCategory::Good),
    (60.0, AqiCategory::Satisfactory),
    (90.0, AqiCategory::Moderate),
    (120.0, AqiCategory::Poor),
    (250.0, AqiCategory::VeryPoor),
];

/// Air quality category derived from a PM2.5 reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AqiCategory {
    /// No usable reading
    Unknown,
    Good,
    Satisfactory,
    Moderate,
    Poor,
    VeryPoor,
    Severe,
}

impl AqiCategory {
    /// The ranked bands, least to most severe
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Satisfactory,
        AqiCategory::Moderate,
        AqiCategory::Poor,
        AqiCategory::VeryPoor,
        AqiCategory::Severe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Unknown => "Unknown",
            AqiCategory::Good => "Good",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
            AqiCategory::Severe => "Severe",
        }
    }

    /// Position in [`AqiCategory::ALL`], `None` for `Unknown`
    pub fn rank(&self) -> Option<u8> {
        match self {
            AqiCategory::Unknown => None,
            AqiCategory::Good => Some(0),
            AqiCategory::Satisfactory => Some(1),
            AqiCategory::Moderate => Some(2),
            AqiCategory::Poor => Some(3),
            AqiCategory::VeryPoor => Some(4),
            AqiCategory::Severe => Some(5),
        }
    }

    /// Concentration range shown in the legend
    pub fn range_label(&self) -> &'static str {
        match self {
            AqiCategory::Unknown => "--",
            AqiCategory::Good => "0-30",
            AqiCategory::Satisfactory => "31-60",
            AqiCategory::Moderate => "61-90",
            AqiCategory::Poor => "91-120",
            AqiCategory::VeryPoor => "121-250",
            AqiCategory::Severe => "250+",
        }
    }
}

/// Classify a PM2.5 concentration in µg/m³.
///
/// A reading of exactly 30.0 is still `Good`, anything above it up to 60.0
/// is `Satisfactory`. A missing or NaN reading is `Unknown`.
pub fn classify(pm25: Option<f64>) -> AqiCategory {
    let pm25 = match pm25 {
        Some(value) if !value.is_nan() => value,
        _ => return AqiCategory::Unknown,
    };

    PM25_BREAKPOINTS
        .iter()
        .find(|(upper, _)| pm25 <= *upper)
        .map(|(_, category)| *category)
        .unwrap_or(AqiCategory::Severe)
}
