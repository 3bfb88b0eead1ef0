use serde::{Deserialize, Serialize};

/// One listing row as pulled out of the raw CSV, before any typing.
///
/// Every field is the verbatim cell content (empty cells become `None`).
/// The fingerprint concatenates the raw record's cells so exact duplicate
/// rows can be detected later without re-reading the file.
#[derive(Debug, Clone)]
pub struct RawListingRow {
    pub price: Option<String>,
    pub sqft: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub flood_risk: Option<String>,
    pub fire_risk: Option<String>,
    pub wind_risk: Option<String>,
    pub air_risk: Option<String>,
    pub heat_risk: Option<String>,
    pub walk_score: Option<String>,
    pub bike_score: Option<String>,
    pub transit_score: Option<String>,
    /// Verbatim row cells joined with a unit separator.
    pub fingerprint: String,
}

/// A typed listing candidate produced by field normalization.
///
/// Candidates have not been validated yet: price or city may still be
/// missing and numeric values may be out of range. Per-field parse failures
/// degrade to `None` rather than dropping the row.
#[derive(Debug, Clone)]
pub struct ListingCandidate {
    pub price: Option<f64>,
    pub sqft: Option<f64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub flood_risk: Option<i64>,
    pub fire_risk: Option<i64>,
    pub wind_risk: Option<i64>,
    pub air_risk: Option<i64>,
    pub heat_risk: Option<i64>,
    pub walk_score: Option<i64>,
    pub bike_score: Option<i64>,
    pub transit_score: Option<i64>,
    pub fingerprint: String,
}

/// A fully typed, validated listing row. Immutable once created; the set of
/// cleaned listings is the canonical input to aggregation and merging.
///
/// Serialized column names match the cleaned dataset artifact consumed
/// downstream (`propertyType`, `pricePerSqft`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedListing {
    pub price: f64,
    pub sqft: Option<f64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub city: String,
    #[serde(rename = "propertyType")]
    pub property_type: Option<String>,
    pub flood_risk: Option<i64>,
    pub fire_risk: Option<i64>,
    pub wind_risk: Option<i64>,
    pub air_risk: Option<i64>,
    pub heat_risk: Option<i64>,
    pub walk_score: Option<i64>,
    pub bike_score: Option<i64>,
    pub transit_score: Option<i64>,
    #[serde(rename = "pricePerSqft")]
    pub price_per_sqft: Option<f64>,
}

/// A cleaned listing joined with the demographics of its resolved town.
///
/// Rows whose city could not be resolved keep `None` demographic fields;
/// the merge never drops listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedListing {
    pub price: f64,
    pub sqft: Option<f64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub city: String,
    #[serde(rename = "propertyType")]
    pub property_type: Option<String>,
    pub flood_risk: Option<i64>,
    pub fire_risk: Option<i64>,
    pub wind_risk: Option<i64>,
    pub air_risk: Option<i64>,
    pub heat_risk: Option<i64>,
    pub walk_score: Option<i64>,
    pub bike_score: Option<i64>,
    pub transit_score: Option<i64>,
    #[serde(rename = "pricePerSqft")]
    pub price_per_sqft: Option<f64>,
    #[serde(rename = "medianIncome")]
    pub median_income: Option<f64>,
    pub population: Option<i64>,
    #[serde(rename = "priceToIncomeRatio")]
    pub price_to_income_ratio: Option<f64>,
}
