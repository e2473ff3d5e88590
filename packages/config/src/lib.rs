#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report configuration.
//!
//! A [`ReportConfig`] is read from a TOML file (see `report.toml` next to
//! this crate's manifest for the commented defaults). Every key is optional,
//! so a file only needs to list what it overrides.

use std::collections::BTreeMap;
use std::path::Path;

use nypd_shootings_analytics_models::GroupField;
use nypd_shootings_incident_models::{Column, MissingPolicy};
use serde::{Deserialize, Serialize};

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Cannot read config {path}: {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ReportConfig`].
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Path of the config file.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The missing-value policy table is invalid.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// A value is out of range.
    #[error("Invalid config value: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// An entry of the missing-value policy table that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid missing-value policy for '{column}': {reason}")]
pub struct PolicyError {
    /// Column name as written in the config.
    pub column: String,
    /// Why the entry was rejected.
    pub reason: String,
}

/// Top-level report configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Cleaning rules.
    pub cleaning: CleaningConfig,
    /// Aggregation settings.
    pub analysis: AnalysisConfig,
    /// Classifier settings.
    pub model: ModelConfig,
}

impl ReportConfig {
    /// Parses and validates a config from TOML text. `label` names the source
    /// in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is invalid.
    pub fn from_toml_str(toml_str: &str, label: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|source| ConfigError::Parse {
            path: label.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is malformed, or
    /// holds an invalid value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let label = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: label.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&text, &label)?;
        log::info!("Loaded config from {label}");
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// See [`ReportConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cleaning.policy_table()?;
        self.analysis.validate()?;
        self.model.validate()?;
        Ok(())
    }
}

/// Rules the cleaner applies to raw rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// chrono format for `OCCUR_DATE`.
    pub date_format: String,
    /// chrono format for `OCCUR_TIME`.
    pub time_format: String,
    /// Values treated as missing in addition to empty cells.
    pub null_tokens: Vec<String>,
    /// Missing-value policy per column name. Columns not listed use
    /// [`default_policy`].
    pub missing: BTreeMap<String, MissingPolicy>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            date_format: "%m/%d/%Y".to_string(),
            time_format: "%H:%M:%S".to_string(),
            null_tokens: vec!["(null)".to_string(), "NA".to_string(), "NULL".to_string()],
            missing: Column::all()
                .iter()
                .map(|&c| (c.to_string(), default_policy(c)))
                .collect(),
        }
    }
}

impl CleaningConfig {
    /// Resolves the configured policies into a complete table.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if a column name is unknown, a non-categorical
    /// column is filled, or `INCIDENT_KEY` is not dropped.
    pub fn policy_table(&self) -> Result<PolicyTable, PolicyError> {
        let mut policies: BTreeMap<Column, MissingPolicy> = Column::all()
            .iter()
            .map(|&c| (c, default_policy(c)))
            .collect();

        for (name, policy) in &self.missing {
            let column = name.trim().parse::<Column>().map_err(|_| PolicyError {
                column: name.clone(),
                reason: "unknown column".to_string(),
            })?;

            match policy {
                MissingPolicy::Fill(_) if !column.is_categorical() => {
                    return Err(PolicyError {
                        column: name.clone(),
                        reason: "only categorical columns can be filled".to_string(),
                    });
                }
                MissingPolicy::Fill(value) if value.trim().is_empty() => {
                    return Err(PolicyError {
                        column: name.clone(),
                        reason: "fill value is empty".to_string(),
                    });
                }
                MissingPolicy::Keep | MissingPolicy::Fill(_) if column == Column::IncidentKey => {
                    return Err(PolicyError {
                        column: name.clone(),
                        reason: "rows without an incident key are always dropped".to_string(),
                    });
                }
                _ => {}
            }

            policies.insert(column, policy.clone());
        }

        Ok(PolicyTable { policies })
    }
}

/// The default missing-value policy for a column: date and coordinates are
/// required, a missing borough becomes `"Unknown"`, everything else is kept.
#[must_use]
pub fn default_policy(column: Column) -> MissingPolicy {
    match column {
        Column::IncidentKey | Column::OccurDate | Column::Latitude | Column::Longitude => {
            MissingPolicy::Drop
        }
        Column::Boro => MissingPolicy::Fill("Unknown".to_string()),
        _ => MissingPolicy::Keep,
    }
}

/// A validated missing-value policy for every [`Column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    policies: BTreeMap<Column, MissingPolicy>,
}

impl PolicyTable {
    /// The policy for `column`.
    #[must_use]
    pub fn get(&self, column: Column) -> &MissingPolicy {
        // Every column is inserted at construction.
        self.policies.get(&column).unwrap_or(&MissingPolicy::Keep)
    }

    /// Iterates over `(column, policy)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Column, &MissingPolicy)> {
        self.policies.iter().map(|(c, p)| (*c, p))
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            policies: Column::all()
                .iter()
                .map(|&c| (c, default_policy(c)))
                .collect(),
        }
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Sentinel categories per group field, excluded from the
    /// "sentinels excluded" tables.
    pub sentinels: BTreeMap<String, Vec<String>>,
    /// H3 resolution for spatial binning.
    pub h3_resolution: u8,
    /// Number of hexbins listed in the text report.
    pub top_hexbins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let sentinels = [
            (GroupField::VictimAgeGroup, "UNKNOWN"),
            (GroupField::VictimSex, "U"),
            (GroupField::VictimRace, "UNKNOWN"),
            (GroupField::PerpAgeGroup, "UNKNOWN"),
            (GroupField::PerpSex, "U"),
            (GroupField::PerpRace, "UNKNOWN"),
        ]
        .into_iter()
        .map(|(field, value)| (field.to_string(), vec![value.to_string()]))
        .collect();

        Self {
            sentinels,
            h3_resolution: 8,
            top_hexbins: 10,
        }
    }
}

impl AnalysisConfig {
    /// Sentinel categories configured for `field`.
    #[must_use]
    pub fn sentinels_for(&self, field: GroupField) -> Vec<String> {
        self.sentinels
            .iter()
            .filter(|(name, _)| name.parse::<GroupField>().ok() == Some(field))
            .flat_map(|(_, values)| values.iter().cloned())
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self
            .sentinels
            .keys()
            .find(|name| name.parse::<GroupField>().is_err())
        {
            return Err(ConfigError::Invalid {
                message: format!("unknown sentinel field '{name}'"),
            });
        }
        if self.h3_resolution > 15 {
            return Err(ConfigError::Invalid {
                message: format!("h3_resolution {} is not in 0-15", self.h3_resolution),
            });
        }
        Ok(())
    }
}

/// Classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Share of each class drawn into the training split.
    pub train_fraction: f64,
    /// Seed for the split's random draw.
    pub seed: u64,
    /// L2 penalty for the logistic regression.
    pub alpha: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            seed: 2023,
            alpha: 0.0,
        }
    }
}

impl ModelConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ConfigError::Invalid {
                message: format!("train_fraction {} is not in (0, 1)", self.train_fraction),
            });
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ConfigError::Invalid {
                message: format!("alpha {} must be a non-negative number", self.alpha),
            });
        }
        Ok(())
    }
}
