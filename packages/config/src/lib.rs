#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Compile-time dashboard configuration.
//!
//! The dashboard definition lives in `dashboard.toml`, embedded via
//! `include_str!` so the published bundle carries no runtime config file.
//! Alternative definitions can be parsed with [`parse`].

use std::collections::BTreeSet;

use thiserror::Error;
use visit_map_config_models::DashboardConfig;

/// Embedded dashboard definition.
const DASHBOARD_TOML: &str = include_str!("../dashboard.toml");

/// Errors that can occur while loading a dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML deserialization failed.
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but is inconsistent.
    #[error("Config validation error: {message}")]
    Validation {
        /// Description of what went wrong.
        message: String,
    },
}

/// Returns the embedded dashboard configuration.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse or validate. Since it is a
/// compile-time constant, failures indicate a development error and are
/// caught by this crate's tests.
#[must_use]
pub fn dashboard() -> DashboardConfig {
    parse(DASHBOARD_TOML).unwrap_or_else(|e| panic!("Invalid embedded dashboard.toml: {e}"))
}

/// Parses and validates a dashboard configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and
/// [`ConfigError::Validation`] if [`validate`] rejects it.
pub fn parse(toml_str: &str) -> Result<DashboardConfig, ConfigError> {
    let config: DashboardConfig = toml::de::from_str(toml_str)?;
    validate(&config)?;
    log::debug!(
        "Loaded dashboard config: {} datasets, {} overlays, {} reference layers",
        config.datasets.len(),
        config.overlays.len(),
        config.reference_layers.len()
    );
    Ok(config)
}

/// Checks cross-references inside a configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] if ids collide, a dataset names an
/// unknown or empty ramp, the default dataset is missing, or the class
/// count is zero.
pub fn validate(config: &DashboardConfig) -> Result<(), ConfigError> {
    if config.class_count == 0 {
        return invalid("class_count must be at least 1".to_string());
    }

    for (name, colors) in &config.ramps {
        if colors.is_empty() {
            return invalid(format!("Ramp '{name}' has no colors"));
        }
    }

    let mut dataset_ids = BTreeSet::new();
    for dataset in &config.datasets {
        if !dataset_ids.insert(dataset.id.as_str()) {
            return invalid(format!("Duplicate dataset id '{}'", dataset.id));
        }
        if config.ramp(&dataset.ramp).is_none() {
            return invalid(format!(
                "Dataset '{}' references unknown ramp '{}'",
                dataset.id, dataset.ramp
            ));
        }
    }

    if config.dataset(&config.default_dataset).is_none() {
        return invalid(format!(
            "Default dataset '{}' is not defined",
            config.default_dataset
        ));
    }

    let mut layer_ids = BTreeSet::new();
    let fixed = [
        config.primary.fill_layer_id.as_str(),
        config.primary.outline_layer_id.as_str(),
        config.comparison.fill_layer_id.as_str(),
        config.comparison.outline_layer_id.as_str(),
    ];
    let configured = config
        .overlays
        .iter()
        .map(|o| o.id.as_str())
        .chain(config.reference_layers.iter().map(|r| r.id.as_str()));

    for id in fixed.into_iter().chain(configured) {
        if !layer_ids.insert(id) {
            return invalid(format!("Duplicate layer id '{id}'"));
        }
    }

    Ok(())
}

fn invalid(message: String) -> Result<(), ConfigError> {
    Err(ConfigError::Validation { message })
}
