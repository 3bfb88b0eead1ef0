use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Pipeline configuration loaded from `config.toml`.
///
/// Every section has defaults so the pipeline runs without a config file;
/// the file only needs to name the values it overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub validation: ValidationConfig,
    pub matching: MatchingConfig,
    pub census: CensusConfig,
    pub categories: CategoryConfig,
}

/// Input and output file locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub raw_listings_path: String,
    pub cleaned_path: String,
    pub census_path: String,
    pub merged_path: String,
    pub aggregates_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_listings_path: "data/raw/ma_housing_raw.csv".to_string(),
            cleaned_path: "data/processed/housing_cleaned.csv".to_string(),
            census_path: "data/processed/census_data.csv".to_string(),
            merged_path: "data/processed/merged_data.csv".to_string(),
            aggregates_path: "data/processed/town_aggregates.csv".to_string(),
        }
    }
}

/// Numeric range filters applied by the validator.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_price: f64,
    pub max_price: f64,
    pub max_bedrooms: i64,
    pub max_bathrooms: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_price: 50_000.0,
            max_price: 10_000_000.0,
            max_bedrooms: 20,
            max_bathrooms: 15,
        }
    }
}

/// Town-name matching settings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum similarity (0-100) for a listing city to match a census town.
    pub threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { threshold: 85.0 }
    }
}

/// Census ACS endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CensusConfig {
    pub base_url: String,
    /// ACS 5-year estimate vintage.
    pub year: String,
    /// State FIPS code; 25 is Massachusetts.
    pub state_fips: String,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.census.gov/data".to_string(),
            year: "2022".to_string(),
            state_fips: "25".to_string(),
        }
    }
}

/// Property category synonym table, extendable from config without touching
/// normalizer code. Keys are compared lower-cased and trimmed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub synonyms: HashMap<String, String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        let synonyms = [
            ("single family", "Single Family"),
            ("singlefamily", "Single Family"),
            ("house", "Single Family"),
            ("condo", "Condo"),
            ("condominium", "Condo"),
            ("townhouse", "Townhouse"),
            ("townhome", "Townhouse"),
            ("multi family", "Multi Family"),
            ("multifamily", "Multi Family"),
            ("multi-family", "Multi Family"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { synonyms }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_sections() {
        let config = Config::default();
        assert_eq!(config.validation.min_price, 50_000.0);
        assert_eq!(config.matching.threshold, 85.0);
        assert_eq!(config.census.state_fips, "25");
        assert_eq!(
            config.categories.synonyms.get("condominium").map(String::as_str),
            Some("Condo")
        );
    }

    #[test]
    fn partial_toml_overrides_only_named_values() {
        let config: Config = toml::from_str(
            r#"
            [matching]
            threshold = 90.0
            "#,
        )
        .unwrap();
        assert_eq!(config.matching.threshold, 90.0);
        assert_eq!(config.validation.max_bedrooms, 20);
    }
}
