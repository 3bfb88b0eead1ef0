use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::domain::TownDemographics;
use crate::error::Result;

use super::DemographicProvider;

/// Default seed; fixed so repeated runs regenerate the same dataset.
pub const DEFAULT_SEED: u64 = 42;

/// Cities whose populations land in the large-city band.
const MAJOR_CITIES: &[&str] = &["Boston", "Worcester", "Springfield", "Cambridge", "Lowell"];

/// Towns drawn from the high-income band.
const HIGH_INCOME_TOWNS: &[&str] = &[
    "Brookline",
    "Newton",
    "Wellesley",
    "Lexington",
    "Weston",
    "Dover",
    "Sherborn",
    "Carlisle",
    "Lincoln",
];

/// Urban-core cities drawn from the middle income band.
const URBAN_CORE: &[&str] = &["Boston", "Cambridge", "Somerville"];

/// Fallback demographic generator for runs without census API access.
///
/// Produces the same three-column schema as the census provider, with
/// values drawn from realistic Massachusetts ranges. The generator is
/// seeded, so a fixed seed and city list always produce the same records;
/// the values themselves are synthetic and the pipeline-wide determinism
/// guarantee is documented as broken whenever this provider is substituted
/// for the census one.
pub struct SyntheticProvider {
    cities: Vec<String>,
    seed: u64,
}

impl SyntheticProvider {
    /// `cities` is the distinct city list from the cleaned listings, in
    /// stable order; generation order follows it, so the same inputs
    /// reproduce the same draws.
    pub fn new(cities: Vec<String>, seed: u64) -> Self {
        Self { cities, seed }
    }

    fn population_for(city: &str, rng: &mut StdRng) -> i64 {
        if MAJOR_CITIES.contains(&city) {
            rng.gen_range(80_000..150_000)
        } else if city.chars().count() > 10 {
            // Longer names skew toward small rural towns.
            rng.gen_range(500..15_000)
        } else {
            rng.gen_range(5_000..50_000)
        }
    }

    fn income_for(city: &str, rng: &mut StdRng) -> f64 {
        let income: i64 = if HIGH_INCOME_TOWNS.contains(&city) {
            rng.gen_range(120_000..200_000)
        } else if URBAN_CORE.contains(&city) {
            rng.gen_range(80_000..120_000)
        } else {
            rng.gen_range(50_000..95_000)
        };
        income as f64
    }
}

#[async_trait::async_trait]
impl DemographicProvider for SyntheticProvider {
    fn provider_name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch_towns(&self) -> Result<Vec<TownDemographics>> {
        warn!(
            seed = self.seed,
            "generating synthetic demographics; values are not observed data"
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut towns = Vec::with_capacity(self.cities.len());
        for city in &self.cities {
            if city == "Unknown" {
                continue;
            }
            let population = Self::population_for(city, &mut rng);
            let median_income = Self::income_for(city, &mut rng);
            towns.push(TownDemographics {
                town_name: city.clone(),
                median_income: Some(median_income),
                population: Some(population),
            });
        }
        towns.sort_by(|a, b| a.town_name.cmp(&b.town_name));

        info!(towns = towns.len(), "synthetic demographics generated");
        Ok(towns)
    }
}
