use std::collections::HashMap;

use tracing::info;

use crate::domain::{
    CleanedListing, MergedListing, MergedTownAggregate, TownAggregate, TownDemographics,
};

/// Incomes at or below this are treated as absent so the ratio never
/// divides by zero or produces an infinity.
const INCOME_FLOOR: f64 = 1e-9;

/// Match statistics for one merge pass.
#[derive(Debug, Clone, Default)]
pub struct MergeSummary {
    pub total_rows: usize,
    pub matched_rows: usize,
}

impl MergeSummary {
    pub fn match_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            100.0 * self.matched_rows as f64 / self.total_rows as f64
        }
    }
}

/// Left-joins cleaned listings and town aggregates with census demographics
/// through the resolved city-to-town mapping.
pub struct DatasetMerger<'a> {
    towns_by_name: HashMap<&'a str, &'a TownDemographics>,
    mapping: &'a HashMap<String, Option<String>>,
}

impl<'a> DatasetMerger<'a> {
    /// Index the demographic records by town name; on duplicate names the
    /// first occurrence wins.
    pub fn new(
        towns: &'a [TownDemographics],
        mapping: &'a HashMap<String, Option<String>>,
    ) -> Self {
        let mut towns_by_name = HashMap::new();
        for town in towns {
            towns_by_name
                .entry(town.town_name.as_str())
                .or_insert(town);
        }
        Self {
            towns_by_name,
            mapping,
        }
    }

    fn demographics_for(&self, city: &str) -> Option<&TownDemographics> {
        self.mapping
            .get(city)
            .and_then(|resolved| resolved.as_deref())
            .and_then(|town| self.towns_by_name.get(town).copied())
    }

    /// Listing price divided by town median income, guarded against missing
    /// and effectively-zero incomes. Never panics, never yields an infinity.
    pub fn price_to_income_ratio(price: f64, median_income: Option<f64>) -> Option<f64> {
        median_income
            .filter(|income| *income > INCOME_FLOOR)
            .map(|income| price / income)
            .filter(|ratio| ratio.is_finite())
    }

    /// Record-level join. Every cleaned listing appears in the output
    /// exactly once; unresolved cities carry `None` demographic fields.
    pub fn merge_listings(
        &self,
        listings: &[CleanedListing],
    ) -> (Vec<MergedListing>, MergeSummary) {
        let mut summary = MergeSummary {
            total_rows: listings.len(),
            ..MergeSummary::default()
        };

        let merged = listings
            .iter()
            .map(|listing| {
                let town = self.demographics_for(&listing.city);
                if town.is_some() {
                    summary.matched_rows += 1;
                }
                let median_income = town.and_then(|t| t.median_income);
                MergedListing {
                    price: listing.price,
                    sqft: listing.sqft,
                    bedrooms: listing.bedrooms,
                    bathrooms: listing.bathrooms,
                    city: listing.city.clone(),
                    property_type: listing.property_type.clone(),
                    flood_risk: listing.flood_risk,
                    fire_risk: listing.fire_risk,
                    wind_risk: listing.wind_risk,
                    air_risk: listing.air_risk,
                    heat_risk: listing.heat_risk,
                    walk_score: listing.walk_score,
                    bike_score: listing.bike_score,
                    transit_score: listing.transit_score,
                    price_per_sqft: listing.price_per_sqft,
                    median_income,
                    population: town.and_then(|t| t.population),
                    price_to_income_ratio: Self::price_to_income_ratio(
                        listing.price,
                        median_income,
                    ),
                }
            })
            .collect();

        info!(
            total = summary.total_rows,
            matched = summary.matched_rows,
            match_rate = format!("{:.1}%", summary.match_rate()),
            "record-level merge complete"
        );
        (merged, summary)
    }

    /// Town-level join of the aggregates, same resolution and guards.
    pub fn merge_aggregates(
        &self,
        aggregates: &[TownAggregate],
    ) -> (Vec<MergedTownAggregate>, MergeSummary) {
        let mut summary = MergeSummary {
            total_rows: aggregates.len(),
            ..MergeSummary::default()
        };

        let merged = aggregates
            .iter()
            .map(|agg| {
                let town = self.demographics_for(&agg.city);
                if town.is_some() {
                    summary.matched_rows += 1;
                }
                let median_income = town.and_then(|t| t.median_income);
                MergedTownAggregate {
                    city: agg.city.clone(),
                    price: agg.price,
                    flood_risk: agg.flood_risk,
                    fire_risk: agg.fire_risk,
                    wind_risk: agg.wind_risk,
                    air_risk: agg.air_risk,
                    heat_risk: agg.heat_risk,
                    walk_score: agg.walk_score,
                    bike_score: agg.bike_score,
                    transit_score: agg.transit_score,
                    avg_risk: agg.avg_risk,
                    livability: agg.livability,
                    median_income,
                    population: town.and_then(|t| t.population),
                    price_to_income_ratio: Self::price_to_income_ratio(agg.price, median_income),
                }
            })
            .collect();

        info!(
            total = summary.total_rows,
            matched = summary.matched_rows,
            "town-level merge complete"
        );
        (merged, summary)
    }
}
