use serde::{Deserialize, Serialize};

/// One town's demographic record as supplied by a demographic provider.
///
/// Column names follow the census dataset artifact (`townName`,
/// `medianIncome`, `population`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TownDemographics {
    #[serde(rename = "townName")]
    pub town_name: String,
    #[serde(rename = "medianIncome")]
    pub median_income: Option<f64>,
    pub population: Option<i64>,
}

/// Per-town statistical rollup of the cleaned listings.
///
/// Means ignore missing values; a field that is missing for every listing
/// in the town stays `None`. `avg_risk` is the mean of the five risk means
/// and `livability` the mean of the three sub-score means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TownAggregate {
    pub city: String,
    pub price: f64,
    pub flood_risk: Option<f64>,
    pub fire_risk: Option<f64>,
    pub wind_risk: Option<f64>,
    pub air_risk: Option<f64>,
    pub heat_risk: Option<f64>,
    pub walk_score: Option<f64>,
    pub bike_score: Option<f64>,
    pub transit_score: Option<f64>,
    pub avg_risk: Option<f64>,
    pub livability: Option<f64>,
}

/// A town aggregate joined with the demographics of its resolved town.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTownAggregate {
    pub city: String,
    pub price: f64,
    pub flood_risk: Option<f64>,
    pub fire_risk: Option<f64>,
    pub wind_risk: Option<f64>,
    pub air_risk: Option<f64>,
    pub heat_risk: Option<f64>,
    pub walk_score: Option<f64>,
    pub bike_score: Option<f64>,
    pub transit_score: Option<f64>,
    pub avg_risk: Option<f64>,
    pub livability: Option<f64>,
    #[serde(rename = "medianIncome")]
    pub median_income: Option<f64>,
    pub population: Option<i64>,
    #[serde(rename = "priceToIncomeRatio")]
    pub price_to_income_ratio: Option<f64>,
}
