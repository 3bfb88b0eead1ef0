use crate::domain::TownDemographics;
use crate::error::Result;

pub mod census;
pub mod synthetic;

pub use census::CensusAcsProvider;
pub use synthetic::SyntheticProvider;

/// Core trait every town demographic source must implement.
///
/// The pipeline consumes providers only through this interface, so the
/// census API and the synthetic generator are interchangeable. Determinism
/// of the full run is only guaranteed with the census provider; the
/// synthetic provider is reproducible for a fixed seed but produces
/// generated values, not observed ones.
#[async_trait::async_trait]
pub trait DemographicProvider: Send + Sync {
    /// Unique identifier for this provider
    fn provider_name(&self) -> &'static str;

    /// Fetch one demographic record per town, deduplicated by town name.
    async fn fetch_towns(&self) -> Result<Vec<TownDemographics>>;
}
