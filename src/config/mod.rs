// TraitScope - GPL-3.0-or-later
// This file is part of TraitScope.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// TraitScope is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// TraitScope is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with TraitScope.  If not, see <https://www.gnu.org/licenses/>.

use crate::analysis::MissingValuePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the attribute list field when none is configured
pub const DEFAULT_ATTRIBUTES_FIELD: &str = "attributes";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Per trait type multipliers for rarity scores (1.0 when unlisted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(HashMap<String, f64>);

impl Weights {
    pub fn weight(&self, trait_type: &str) -> f64 {
        self.0.get(trait_type).copied().unwrap_or(1.0)
    }

    pub fn set(&mut self, trait_type: impl Into<String>, weight: f64) {
        self.0.insert(trait_type.into(), weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for Weights {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How a collection marks a trait type that a token does not have
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingTraitIdentifier {
    /// The `{trait_type, value}` entry is simply left out
    #[default]
    Omitted,
    /// Every trait type uses the same sentinel value (e.g. `"None"`)
    Uniform { value: String },
    /// Sentinels differ per trait type; unlisted types use `fallback`
    PerTraitType {
        values: HashMap<String, String>,
        #[serde(default)]
        fallback: Option<String>,
    },
}

impl MissingValuePolicy for MissingTraitIdentifier {
    fn identifier(&self, trait_type: &str) -> Option<&str> {
        match self {
            Self::Omitted => None,
            Self::Uniform { value } => Some(value.as_str()),
            Self::PerTraitType { values, fallback } => values
                .get(trait_type)
                .or(fallback.as_ref())
                .map(String::as_str),
        }
    }
}

/// Analysis configuration, injected into every pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub weights: Weights,
    pub missing_trait_identifier: MissingTraitIdentifier,
    /// Source field holding the attribute list, if not `attributes`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_field_name: Option<String>,
    /// Trait types dropped from every token before analysis
    pub ignore_traits: Vec<String>,
}

impl AnalysisConfig {
    #[must_use]
    pub fn with_weight(mut self, trait_type: impl Into<String>, weight: f64) -> Self {
        self.weights.set(trait_type, weight);
        self
    }

    #[must_use]
    pub fn with_missing_trait_identifier(mut self, identifier: MissingTraitIdentifier) -> Self {
        self.missing_trait_identifier = identifier;
        self
    }

    #[must_use]
    pub fn with_attributes_field_name(mut self, name: impl Into<String>) -> Self {
        self.attributes_field_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn ignoring(mut self, trait_type: impl Into<String>) -> Self {
        self.ignore_traits.push(trait_type.into());
        self
    }

    pub fn attributes_field_name(&self) -> &str {
        self.attributes_field_name
            .as_deref()
            .unwrap_or(DEFAULT_ATTRIBUTES_FIELD)
    }

    /// Get the path to the user config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("traitscope").join("config.json"))
    }

    /// Load the user config file, returning defaults if there is none
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = Self::config_path().filter(|path| path.exists()) {
            return Self::from_file(&path);
        }
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load and validate a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("Loading config from {path:?}");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        tracing::info!(
            "Loaded {} weights and {} ignored trait types",
            config.weights.iter().count(),
            config.ignore_traits.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (trait_type, weight) in self.weights.iter() {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weight for `{trait_type}` must be a positive number, got {weight}"
                )));
            }
        }
        if self
            .attributes_field_name
            .as_deref()
            .is_some_and(str::is_empty)
        {
            return Err(ConfigError::Invalid(
                "attributes_field_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
