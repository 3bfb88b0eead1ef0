use std::fs;

use anyhow::Result;
use tempfile::tempdir;

use mhd_pipeline::config::Config;
use mhd_pipeline::domain::TownDemographics;
use mhd_pipeline::pipeline::Pipeline;
use mhd_pipeline::providers::SyntheticProvider;
use mhd_pipeline::storage;

/// Build a config whose every data path points into the temp dir.
fn test_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    let path = |name: &str| dir.path().join(name).to_str().unwrap().to_string();
    config.data.raw_listings_path = path("raw.csv");
    config.data.cleaned_path = path("cleaned.csv");
    config.data.census_path = path("census.csv");
    config.data.merged_path = path("merged.csv");
    config.data.aggregates_path = path("aggregates.csv");
    config
}

const RAW_HEADER: &str = "price,sqft,bedrooms,bathrooms,city,property_type,flood_risk,fire_risk,wind_risk,air_risk,heat_risk,walk_score,bike_score,transit_score";

fn write_raw(config: &Config, rows: &[&str]) {
    let mut content = String::from(RAW_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&config.data.raw_listings_path, content).unwrap();
}

#[test]
fn cleans_a_labeled_raw_row_into_typed_values() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(&dir);
    write_raw(
        &config,
        &[r#""$350,000","1,200 sqft",3,2,"  Boston ",condominium,Moderate (4/10),Low (1/10),Low (2/10),Moderate (5/10),High (7/10),72/100,55/100,80/100"#],
    );

    let pipeline = Pipeline::new(config.clone());
    let (cleaned, summary) = pipeline.clean()?;

    assert_eq!(summary.surviving_rows, 1);
    let row = &cleaned[0];
    assert_eq!(row.price, 350_000.0);
    assert_eq!(row.city, "Boston");
    assert_eq!(row.sqft, Some(1_200.0));
    assert_eq!(row.bedrooms, Some(3));
    assert_eq!(row.property_type.as_deref(), Some("Condo"));
    assert_eq!(row.flood_risk, Some(4));
    assert_eq!(row.heat_risk, Some(7));
    assert_eq!(row.walk_score, Some(72));
    assert_eq!(row.price_per_sqft, Some(350_000.0 / 1_200.0));

    // The artifact on disk round-trips to the same records.
    let from_disk = storage::read_cleaned_listings(&config.data.cleaned_path)?;
    assert_eq!(from_disk, cleaned);
    Ok(())
}

#[test]
fn merge_joins_through_fuzzy_city_resolution() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(&dir);
    write_raw(
        &config,
        &[
            r#""$350,000",,,,Sommerville,,,,,,,,,"#,
            r#""$500,000",,,,Boston,,,,,,,,,"#,
            r#""$250,000",,,,Utopia Parkway,,,,,,,,,"#,
        ],
    );

    let pipeline = Pipeline::new(config.clone());
    let (cleaned, _) = pipeline.clean()?;

    let towns = vec![
        TownDemographics {
            town_name: "Somerville".to_string(),
            median_income: Some(108_000.0),
            population: Some(81_000),
        },
        TownDemographics {
            town_name: "Boston".to_string(),
            median_income: Some(89_000.0),
            population: Some(650_000),
        },
    ];

    let (merged, _, resolution, summary) = pipeline.merge(&cleaned, &towns)?;

    // Row count is invariant across the join.
    assert_eq!(merged.len(), cleaned.len());
    assert_eq!(resolution.distinct_cities, 3);
    assert_eq!(resolution.matched, 2);
    assert_eq!(summary.matched_rows, 2);

    let somerville = merged.iter().find(|m| m.city == "Sommerville").unwrap();
    assert_eq!(somerville.median_income, Some(108_000.0));
    assert_eq!(
        somerville.price_to_income_ratio,
        Some(350_000.0 / 108_000.0)
    );

    // The unmatched city keeps its row with empty demographics.
    let unmatched = merged.iter().find(|m| m.city == "Utopia Parkway").unwrap();
    assert_eq!(unmatched.median_income, None);
    assert_eq!(unmatched.population, None);
    assert_eq!(unmatched.price_to_income_ratio, None);
    Ok(())
}

#[test]
fn merge_with_no_demographics_keeps_all_rows() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(&dir);
    write_raw(
        &config,
        &[r#""$350,000",,,,Boston,,,,,,,,,"#, r#""$450,000",,,,Boston,,,,,,,,,"#],
    );

    let pipeline = Pipeline::new(config.clone());
    let (cleaned, _) = pipeline.clean()?;
    let (merged, aggregates, resolution, _) = pipeline.merge(&cleaned, &[])?;

    assert_eq!(merged.len(), 2);
    assert_eq!(resolution.matched, 0);
    assert!(merged.iter().all(|m| m.median_income.is_none()));
    assert_eq!(aggregates.len(), 1);
    assert_eq!(aggregates[0].price, 400_000.0);
    assert_eq!(aggregates[0].price_to_income_ratio, None);
    Ok(())
}

#[test]
fn validation_drops_are_reflected_in_the_artifact() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(&dir);
    write_raw(
        &config,
        &[
            r#""$350,000",,,,Boston,,,,,,,,,"#,
            r#""$350,000",,,,Boston,,,,,,,,,"#, // exact duplicate
            r#""$20,000",,,,Boston,,,,,,,,,"#,  // below the price floor
            r#""$400,000",,,,,,,,,,,,,"#,       // missing city
            "not a price,,,,Boston,,,,,,,,,",   // price degrades to null
        ],
    );

    let pipeline = Pipeline::new(config.clone());
    let (cleaned, summary) = pipeline.clean()?;

    assert_eq!(summary.input_rows, 5);
    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.missing_critical, 2);
    assert_eq!(summary.out_of_range, 1);
    assert_eq!(cleaned.len(), 1);
    Ok(())
}

#[tokio::test]
async fn full_run_with_synthetic_provider_produces_all_artifacts() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(&dir);
    write_raw(
        &config,
        &[
            r#""$350,000",,,,Boston,,,,,,,,,"#,
            r#""$550,000",,,,Cambridge,,,,,,,,,"#,
            r#""$425,000",,,,Somerville,,,,,,,,,"#,
        ],
    );

    let pipeline = Pipeline::new(config.clone());
    let (cleaned, _) = pipeline.clean()?;
    let cities = mhd_pipeline::pipeline::distinct_cities(&cleaned);
    let provider = SyntheticProvider::new(cities, 42);

    let report = pipeline.run(&provider).await?;
    assert_eq!(report.raw_rows, 3);
    assert_eq!(report.validation.surviving_rows, 3);
    assert_eq!(report.towns, 3);
    assert_eq!(report.resolution.matched, 3);
    assert_eq!(report.listing_merge.total_rows, 3);

    let census = storage::read_demographics(&config.data.census_path)?;
    assert_eq!(census.len(), 3);
    assert!(fs::metadata(&config.data.merged_path)?.len() > 0);
    assert!(fs::metadata(&config.data.aggregates_path)?.len() > 0);
    Ok(())
}

#[test]
fn missing_raw_file_fails_with_a_descriptive_error() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let pipeline = Pipeline::new(config.clone());
    let err = pipeline.clean().unwrap_err();
    assert!(err.to_string().contains("raw.csv"));
}
