use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::domain::{ListingCandidate, RawListingRow};

/// Trailing "(<n>/10)" risk encoding, e.g. "Moderate (4/10)".
static RISK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)\s*/\s*10\)\s*$").unwrap());

/// "<n>/100" sub-score encoding, e.g. "72/100", with optional padding.
static SUBSCORE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*/\s*100\s*$").unwrap());

/// Title-cases each whitespace-separated word. Idempotent, so already-clean
/// values pass through unchanged.
pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a currency or area figure, tolerating "$", thousands separators,
/// and trailing unit words ("1,200 sqft"). Anything that still fails to
/// parse becomes `None`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let stripped = raw.replace(['$', ','], "");
    let numeric = match stripped.find(|c: char| c.is_alphabetic()) {
        Some(idx) => &stripped[..idx],
        None => stripped.as_str(),
    };
    numeric.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a whole-number count such as bedrooms. Accepts "3" and "3.0";
/// fractional values are not representable as counts and become `None`.
pub fn parse_count(raw: &str) -> Option<i64> {
    let value = parse_numeric(raw)?;
    if value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Extracts the integer from a trailing "(<n>/10)" risk label.
pub fn parse_risk_level(raw: &str) -> Option<i64> {
    RISK_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Extracts the integer from a "<n>/100" sub-score value.
pub fn parse_subscore(raw: &str) -> Option<i64> {
    SUBSCORE_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Converts raw listing rows into typed candidates.
///
/// Per-field parse failures degrade to `None` and never drop the row; the
/// validator decides which candidates survive.
pub struct FieldNormalizer {
    synonyms: HashMap<String, String>,
}

impl FieldNormalizer {
    pub fn new(synonyms: HashMap<String, String>) -> Self {
        Self { synonyms }
    }

    /// Maps a raw category through the synonym table, then title-cases.
    /// Unmapped categories pass through title-cased unchanged.
    pub fn normalize_category(&self, raw: &str) -> String {
        let key = raw.trim().to_lowercase();
        match self.synonyms.get(&key) {
            Some(canonical) => title_case(canonical),
            None => title_case(&key),
        }
    }

    fn normalize_city(raw: &str) -> Option<String> {
        let city = title_case(raw.trim());
        if city.is_empty() {
            None
        } else {
            Some(city)
        }
    }

    pub fn normalize_row(&self, row: &RawListingRow) -> ListingCandidate {
        ListingCandidate {
            price: row.price.as_deref().and_then(parse_numeric),
            sqft: row.sqft.as_deref().and_then(parse_numeric),
            bedrooms: row.bedrooms.as_deref().and_then(parse_count),
            bathrooms: row.bathrooms.as_deref().and_then(parse_count),
            city: row.city.as_deref().and_then(Self::normalize_city),
            property_type: row
                .property_type
                .as_deref()
                .map(|raw| self.normalize_category(raw))
                .filter(|category| !category.is_empty()),
            flood_risk: row.flood_risk.as_deref().and_then(parse_risk_level),
            fire_risk: row.fire_risk.as_deref().and_then(parse_risk_level),
            wind_risk: row.wind_risk.as_deref().and_then(parse_risk_level),
            air_risk: row.air_risk.as_deref().and_then(parse_risk_level),
            heat_risk: row.heat_risk.as_deref().and_then(parse_risk_level),
            walk_score: row.walk_score.as_deref().and_then(parse_subscore),
            bike_score: row.bike_score.as_deref().and_then(parse_subscore),
            transit_score: row.transit_score.as_deref().and_then(parse_subscore),
            fingerprint: row.fingerprint.clone(),
        }
    }

    /// Normalize a whole batch, preserving input order.
    pub fn normalize_batch(&self, rows: &[RawListingRow]) -> Vec<ListingCandidate> {
        rows.iter().map(|row| self.normalize_row(row)).collect()
    }
}
