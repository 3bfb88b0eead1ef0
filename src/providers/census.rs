use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::CensusConfig;
use crate::domain::TownDemographics;
use crate::error::{PipelineError, Result};

use super::DemographicProvider;

/// ACS variable for median household income.
const INCOME_VARIABLE: &str = "B19013_001E";
/// ACS variable for total population.
const POPULATION_VARIABLE: &str = "B01003_001E";

/// Town-level demographics from the Census ACS 5-year estimates.
///
/// Requires `CENSUS_API_KEY` in the environment (loaded from `.env` at
/// startup). The API answers with an array of arrays: the first row is the
/// header, every other row one county subdivision.
pub struct CensusAcsProvider {
    client: reqwest::Client,
    config: CensusConfig,
    api_key: String,
}

impl CensusAcsProvider {
    pub fn new(config: CensusConfig) -> Result<Self> {
        let api_key = std::env::var("CENSUS_API_KEY")?;
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            api_key,
        })
    }

    /// Strip the state and county qualifiers and the subdivision suffixes
    /// from a raw ACS place name.
    /// "Somerville city, Middlesex County, Massachusetts" -> "Somerville".
    pub fn clean_town_name(raw: &str) -> String {
        let name = raw.replace(", Massachusetts", "");
        let name = name.split(',').next().unwrap_or(&name).to_string();
        let name = name
            .replace(" town", "")
            .replace(" Town", "")
            .replace(" city", "")
            .replace(" City", "")
            .replace(" CDP", "");
        name.trim().to_string()
    }

    fn endpoint(&self) -> String {
        format!("{}/{}/acs/acs5", self.config.base_url, self.config.year)
    }

    /// Convert the raw response table into demographic records. The header
    /// row drives column lookup; a response without the expected variables
    /// is a schema failure, not a degradable one.
    fn parse_response(
        rows: &[Vec<Option<String>>],
        source: &str,
    ) -> Result<Vec<TownDemographics>> {
        let header = rows.first().ok_or_else(|| PipelineError::Provider {
            message: format!("empty response from {}", source),
        })?;

        let index_of = |column: &str| -> Result<usize> {
            header
                .iter()
                .position(|cell| cell.as_deref() == Some(column))
                .ok_or_else(|| PipelineError::MissingColumn {
                    column: column.to_string(),
                    file: source.to_string(),
                })
        };
        let name_idx = index_of("NAME")?;
        let income_idx = index_of(INCOME_VARIABLE)?;
        let population_idx = index_of(POPULATION_VARIABLE)?;

        let mut seen = HashSet::new();
        let mut towns = Vec::new();
        for row in &rows[1..] {
            let raw_name = match row.get(name_idx).and_then(|cell| cell.as_deref()) {
                Some(name) => name,
                None => continue,
            };
            let town_name = Self::clean_town_name(raw_name);
            if town_name.is_empty() {
                continue;
            }
            // Duplicate subdivisions keep their first occurrence.
            if !seen.insert(town_name.clone()) {
                debug!(town = %town_name, "duplicate town skipped");
                continue;
            }

            let median_income = row
                .get(income_idx)
                .and_then(|cell| cell.as_deref())
                .and_then(|value| value.trim().parse::<f64>().ok());
            let population = row
                .get(population_idx)
                .and_then(|cell| cell.as_deref())
                .and_then(|value| value.trim().parse::<f64>().ok())
                .map(|value| value as i64);

            towns.push(TownDemographics {
                town_name,
                median_income,
                population,
            });
        }
        Ok(towns)
    }
}

#[async_trait::async_trait]
impl DemographicProvider for CensusAcsProvider {
    fn provider_name(&self) -> &'static str {
        "census"
    }

    async fn fetch_towns(&self) -> Result<Vec<TownDemographics>> {
        let url = self.endpoint();
        let variables = format!("NAME,{},{}", INCOME_VARIABLE, POPULATION_VARIABLE);
        let state_filter = format!("state:{}", self.config.state_fips);
        let params = [
            ("get", variables.as_str()),
            ("for", "county subdivision:*"),
            ("in", state_filter.as_str()),
            ("key", self.api_key.as_str()),
        ];

        info!(url = %url, "fetching town demographics");
        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Provider {
                message: format!("census API returned {} for {}", status, url),
            });
        }

        let body = response.text().await?;
        let rows: Vec<Vec<Option<String>>> = serde_json::from_str(&body)?;
        let towns = Self::parse_response(&rows, &url)?;
        info!(towns = towns.len(), "town demographics fetched");
        Ok(towns)
    }
}
