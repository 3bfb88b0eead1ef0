use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Config;
use crate::domain::{CleanedListing, MergedListing, MergedTownAggregate, TownDemographics};
use crate::error::Result;
use crate::providers::DemographicProvider;
use crate::storage;

pub mod aggregate;
pub mod merge;
pub mod normalize;
pub mod resolve;
pub mod validate;

pub use aggregate::TownAggregator;
pub use merge::{DatasetMerger, MergeSummary};
pub use normalize::FieldNormalizer;
pub use resolve::{ResolutionSummary, TownNameResolver};
pub use validate::{RangeValidator, ValidationSummary};

/// Counts and timings from a full pipeline run, printed by the CLI.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub raw_rows: usize,
    pub validation: ValidationSummary,
    pub towns: usize,
    pub resolution: ResolutionSummary,
    pub listing_merge: MergeSummary,
    pub aggregate_rows: usize,
}

/// Wires the stages together: each stage fully consumes its input and hands
/// an owned, immutable dataset to the next, so a run is a straight line
/// from raw file to merged artifacts.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Normalize and validate the raw listing file, writing the cleaned
    /// dataset artifact.
    pub fn clean(&self) -> Result<(Vec<CleanedListing>, ValidationSummary)> {
        let raw = storage::read_raw_listings(&self.config.data.raw_listings_path)?;
        let raw_count = raw.len();

        let normalizer = FieldNormalizer::new(self.config.categories.synonyms.clone());
        let candidates = normalizer.normalize_batch(&raw);

        let validator = RangeValidator::new(self.config.validation);
        let (cleaned, summary) = validator.validate(candidates);

        storage::write_records(&self.config.data.cleaned_path, &cleaned)?;
        info!(
            raw = raw_count,
            cleaned = cleaned.len(),
            cities = distinct_cities(&cleaned).len(),
            "cleaning complete"
        );
        Ok((cleaned, summary))
    }

    /// Fetch demographics through the given provider and persist the
    /// census dataset artifact.
    pub async fn fetch_demographics(
        &self,
        provider: &dyn DemographicProvider,
    ) -> Result<Vec<TownDemographics>> {
        info!(provider = provider.provider_name(), "fetching demographics");
        let towns = provider.fetch_towns().await?;
        storage::write_records(&self.config.data.census_path, &towns)?;
        Ok(towns)
    }

    /// Resolve, aggregate, and join. Writes the merged listing dataset and
    /// the town aggregate dataset; returns the merged records and the
    /// per-stage summaries.
    pub fn merge(
        &self,
        cleaned: &[CleanedListing],
        towns: &[TownDemographics],
    ) -> Result<(Vec<MergedListing>, Vec<MergedTownAggregate>, ResolutionSummary, MergeSummary)>
    {
        let cities = distinct_cities(cleaned);
        let town_names: Vec<String> = towns.iter().map(|t| t.town_name.clone()).collect();

        let resolver = TownNameResolver::new(self.config.matching.threshold);
        let (mapping, resolution) = resolver.resolve(&cities, &town_names);

        let aggregates = TownAggregator::aggregate(cleaned);

        let merger = DatasetMerger::new(towns, &mapping);
        let (merged, listing_summary) = merger.merge_listings(cleaned);
        let (merged_aggregates, _) = merger.merge_aggregates(&aggregates);

        storage::write_records(&self.config.data.merged_path, &merged)?;
        storage::write_records(&self.config.data.aggregates_path, &merged_aggregates)?;
        Ok((merged, merged_aggregates, resolution, listing_summary))
    }

    /// Run the full pipeline: clean, fetch demographics, merge.
    pub async fn run(&self, provider: &dyn DemographicProvider) -> Result<RunReport> {
        let started_at = Utc::now();

        let (cleaned, validation) = self.clean()?;
        let raw_rows = validation.input_rows;
        let towns = self.fetch_demographics(provider).await?;
        let (_, merged_aggregates, resolution, listing_merge) =
            self.merge(&cleaned, &towns)?;

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            raw_rows,
            validation,
            towns: towns.len(),
            resolution,
            listing_merge,
            aggregate_rows: merged_aggregates.len(),
        })
    }
}

/// Distinct city names in first-seen order.
pub fn distinct_cities(listings: &[CleanedListing]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cities = Vec::new();
    for listing in listings {
        if seen.insert(listing.city.as_str()) {
            cities.push(listing.city.clone());
        }
    }
    cities
}
