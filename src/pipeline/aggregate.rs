use std::collections::BTreeMap;

use tracing::info;

use crate::domain::{CleanedListing, TownAggregate};

/// Mean over optional values: missing inputs are skipped, and a field that
/// was missing in every row yields `None` instead of zero. Keeps the five
/// risk levels and three sub-scores behaviorally identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn push_opt(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.push(v);
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TownAccumulator {
    price: MeanAccumulator,
    flood_risk: MeanAccumulator,
    fire_risk: MeanAccumulator,
    wind_risk: MeanAccumulator,
    air_risk: MeanAccumulator,
    heat_risk: MeanAccumulator,
    walk_score: MeanAccumulator,
    bike_score: MeanAccumulator,
    transit_score: MeanAccumulator,
}

/// Rolls cleaned listings up into one aggregate per town.
///
/// Grouping keys on the listing's own city name, independent of census
/// resolution; demographic fields attach later during the merge.
pub struct TownAggregator;

impl TownAggregator {
    /// Aggregate all listings, returning one row per town sorted by name.
    pub fn aggregate(listings: &[CleanedListing]) -> Vec<TownAggregate> {
        let mut groups: BTreeMap<&str, TownAccumulator> = BTreeMap::new();

        for listing in listings {
            let acc = groups.entry(listing.city.as_str()).or_default();
            acc.price.push(listing.price);
            acc.flood_risk.push_opt(listing.flood_risk.map(|v| v as f64));
            acc.fire_risk.push_opt(listing.fire_risk.map(|v| v as f64));
            acc.wind_risk.push_opt(listing.wind_risk.map(|v| v as f64));
            acc.air_risk.push_opt(listing.air_risk.map(|v| v as f64));
            acc.heat_risk.push_opt(listing.heat_risk.map(|v| v as f64));
            acc.walk_score.push_opt(listing.walk_score.map(|v| v as f64));
            acc.bike_score.push_opt(listing.bike_score.map(|v| v as f64));
            acc.transit_score
                .push_opt(listing.transit_score.map(|v| v as f64));
        }

        let aggregates: Vec<TownAggregate> = groups
            .into_iter()
            .map(|(city, acc)| Self::finish(city, acc))
            .collect();

        info!(towns = aggregates.len(), "aggregation complete");
        aggregates
    }

    fn finish(city: &str, acc: TownAccumulator) -> TownAggregate {
        let flood_risk = acc.flood_risk.mean();
        let fire_risk = acc.fire_risk.mean();
        let wind_risk = acc.wind_risk.mean();
        let air_risk = acc.air_risk.mean();
        let heat_risk = acc.heat_risk.mean();
        let walk_score = acc.walk_score.mean();
        let bike_score = acc.bike_score.mean();
        let transit_score = acc.transit_score.mean();

        let mut risk = MeanAccumulator::default();
        for value in [flood_risk, fire_risk, wind_risk, air_risk, heat_risk] {
            risk.push_opt(value);
        }
        let mut livability = MeanAccumulator::default();
        for value in [walk_score, bike_score, transit_score] {
            livability.push_opt(value);
        }

        TownAggregate {
            city: city.to_string(),
            // Groups are never empty, so the price mean always exists.
            price: acc.price.mean().unwrap_or_default(),
            flood_risk,
            fire_risk,
            wind_risk,
            air_risk,
            heat_risk,
            walk_score,
            bike_score,
            transit_score,
            avg_risk: risk.mean(),
            livability: livability.mean(),
        }
    }

    /// The top `n` towns by mean price, strict descending, ties broken by
    /// town name ascending. Used by "top 30 most expensive towns" consumers.
    pub fn top_n_by_price(aggregates: &[TownAggregate], n: usize) -> Vec<TownAggregate> {
        let mut sorted: Vec<TownAggregate> = aggregates.to_vec();
        sorted.sort_by(|a, b| {
            b.price
                .total_cmp(&a.price)
                .then_with(|| a.city.cmp(&b.city))
        });
        sorted.truncate(n);
        sorted
    }
}
