use std::collections::HashSet;

use tracing::info;

use crate::config::ValidationConfig;
use crate::domain::{CleanedListing, ListingCandidate};

/// Counts reported after validation. Dropped rows are corrections, not
/// errors; they surface here and in the logs only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationSummary {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub missing_critical: usize,
    pub out_of_range: usize,
    pub surviving_rows: usize,
}

/// Applies the validation sequence to normalized candidates.
///
/// The step order is fixed: duplicate removal first, then critical-field
/// drops, then range filters, then the derived price-per-sqft. Each step
/// changes the row population the next one sees, so reordering would change
/// the reported counts between runs.
pub struct RangeValidator {
    config: ValidationConfig,
}

impl RangeValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        candidates: Vec<ListingCandidate>,
    ) -> (Vec<CleanedListing>, ValidationSummary) {
        let mut summary = ValidationSummary {
            input_rows: candidates.len(),
            ..ValidationSummary::default()
        };

        // 1. Exact-duplicate removal, first occurrence wins.
        let mut seen = HashSet::new();
        let mut deduped = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if seen.insert(candidate.fingerprint.clone()) {
                deduped.push(candidate);
            } else {
                summary.duplicates_removed += 1;
            }
        }

        // 2. Critical fields: a row without a price or city is unusable.
        let mut with_criticals = Vec::with_capacity(deduped.len());
        for candidate in deduped {
            match (candidate.price, candidate.city.clone()) {
                (Some(price), Some(city)) => with_criticals.push((price, city, candidate)),
                _ => summary.missing_critical += 1,
            }
        }

        // 3. Range filters. Missing bedroom/bathroom counts pass; only
        //    present values outside the range drop the row.
        let mut cleaned = Vec::with_capacity(with_criticals.len());
        for (price, city, candidate) in with_criticals {
            if self.in_range(price, &candidate) {
                cleaned.push(Self::finish(price, city, candidate));
            } else {
                summary.out_of_range += 1;
            }
        }

        // Canonical ordering of the cleaned artifact.
        cleaned.sort_by(|a, b| {
            a.city
                .cmp(&b.city)
                .then_with(|| a.price.total_cmp(&b.price))
        });

        summary.surviving_rows = cleaned.len();
        info!(
            input = summary.input_rows,
            duplicates = summary.duplicates_removed,
            missing_critical = summary.missing_critical,
            out_of_range = summary.out_of_range,
            surviving = summary.surviving_rows,
            "validation complete"
        );
        (cleaned, summary)
    }

    fn in_range(&self, price: f64, candidate: &ListingCandidate) -> bool {
        if price < self.config.min_price || price > self.config.max_price {
            return false;
        }
        if let Some(bedrooms) = candidate.bedrooms {
            if bedrooms < 0 || bedrooms > self.config.max_bedrooms {
                return false;
            }
        }
        if let Some(bathrooms) = candidate.bathrooms {
            if bathrooms < 0 || bathrooms > self.config.max_bathrooms {
                return false;
            }
        }
        true
    }

    /// 4. Final projection with the derived price-per-sqft. Missing or zero
    ///    area yields `None` rather than an infinity.
    fn finish(price: f64, city: String, candidate: ListingCandidate) -> CleanedListing {
        let price_per_sqft = candidate
            .sqft
            .filter(|sqft| *sqft > 0.0)
            .map(|sqft| price / sqft)
            .filter(|value| value.is_finite());

        CleanedListing {
            price,
            sqft: candidate.sqft,
            bedrooms: candidate.bedrooms,
            bathrooms: candidate.bathrooms,
            city,
            property_type: candidate.property_type,
            flood_risk: candidate.flood_risk,
            fire_risk: candidate.fire_risk,
            wind_risk: candidate.wind_risk,
            air_risk: candidate.air_risk,
            heat_risk: candidate.heat_risk,
            walk_score: candidate.walk_score,
            bike_score: candidate.bike_score,
            transit_score: candidate.transit_score,
            price_per_sqft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(price: Option<f64>, city: Option<&str>, fingerprint: &str) -> ListingCandidate {
        ListingCandidate {
            price,
            sqft: None,
            bedrooms: None,
            bathrooms: None,
            city: city.map(|c| c.to_string()),
            property_type: None,
            flood_risk: None,
            fire_risk: None,
            wind_risk: None,
            air_risk: None,
            heat_risk: None,
            walk_score: None,
            bike_score: None,
            transit_score: None,
            fingerprint: fingerprint.to_string(),
        }
    }

    fn validator() -> RangeValidator {
        RangeValidator::new(ValidationConfig::default())
    }

    #[test]
    fn removes_exact_duplicates_keeping_first() {
        let rows = vec![
            candidate(Some(300_000.0), Some("Boston"), "a"),
            candidate(Some(300_000.0), Some("Boston"), "a"),
            candidate(Some(400_000.0), Some("Boston"), "b"),
        ];
        let (cleaned, summary) = validator().validate(rows);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(summary.duplicates_removed, 1);
    }

    #[test]
    fn drops_rows_missing_price_or_city() {
        let rows = vec![
            candidate(None, Some("Boston"), "a"),
            candidate(Some(300_000.0), None, "b"),
            candidate(Some(300_000.0), Some("Boston"), "c"),
        ];
        let (cleaned, summary) = validator().validate(rows);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(summary.missing_critical, 2);
    }

    #[test]
    fn filters_prices_outside_the_plausible_range() {
        let rows = vec![
            candidate(Some(49_999.0), Some("Boston"), "a"),
            candidate(Some(50_000.0), Some("Boston"), "b"),
            candidate(Some(10_000_000.0), Some("Boston"), "c"),
            candidate(Some(10_000_001.0), Some("Boston"), "d"),
        ];
        let (cleaned, summary) = validator().validate(rows);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(summary.out_of_range, 2);
    }

    #[test]
    fn filters_room_counts_but_lets_missing_counts_pass() {
        let mut in_range = candidate(Some(300_000.0), Some("Boston"), "a");
        in_range.bedrooms = Some(3);
        in_range.bathrooms = Some(2);
        let mut too_many = candidate(Some(300_000.0), Some("Boston"), "b");
        too_many.bedrooms = Some(21);
        let missing = candidate(Some(300_000.0), Some("Boston"), "c");

        let (cleaned, summary) = validator().validate(vec![in_range, too_many, missing]);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(summary.out_of_range, 1);
    }

    #[test]
    fn price_per_sqft_is_none_for_missing_or_zero_area() {
        let mut with_area = candidate(Some(300_000.0), Some("Boston"), "a");
        with_area.sqft = Some(1_500.0);
        let mut zero_area = candidate(Some(300_000.0), Some("Boston"), "b");
        zero_area.sqft = Some(0.0);
        let no_area = candidate(Some(300_000.0), Some("Boston"), "c");

        let (cleaned, _) = validator().validate(vec![with_area, zero_area, no_area]);
        let per_sqft: Vec<Option<f64>> =
            cleaned.iter().map(|l| l.price_per_sqft).collect();
        assert!(per_sqft.contains(&Some(200.0)));
        assert_eq!(per_sqft.iter().filter(|v| v.is_none()).count(), 2);
    }

    #[test]
    fn output_is_sorted_by_city_then_price() {
        let rows = vec![
            candidate(Some(500_000.0), Some("Worcester"), "a"),
            candidate(Some(400_000.0), Some("Boston"), "b"),
            candidate(Some(300_000.0), Some("Boston"), "c"),
        ];
        let (cleaned, _) = validator().validate(rows);
        let order: Vec<(String, f64)> =
            cleaned.iter().map(|l| (l.city.clone(), l.price)).collect();
        assert_eq!(
            order,
            vec![
                ("Boston".to_string(), 300_000.0),
                ("Boston".to_string(), 400_000.0),
                ("Worcester".to_string(), 500_000.0),
            ]
        );
    }

    #[test]
    fn duplicate_removal_happens_before_critical_field_drops() {
        // Same fingerprint, no city: counted once as duplicate, once as
        // missing-critical, never double-counted.
        let rows = vec![
            candidate(Some(300_000.0), None, "a"),
            candidate(Some(300_000.0), None, "a"),
        ];
        let (cleaned, summary) = validator().validate(rows);
        assert!(cleaned.is_empty());
        assert_eq!(summary.duplicates_removed, 1);
        assert_eq!(summary.missing_critical, 1);
    }
}
