pub mod listing;
pub mod town;

pub use listing::{CleanedListing, ListingCandidate, MergedListing, RawListingRow};
pub use town::{MergedTownAggregate, TownAggregate, TownDemographics};
