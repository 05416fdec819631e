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

//! Failure kinds of a pipeline run.
//!
//! Every error is fatal to the invocation: the pipeline either returns a
//! complete, consistent collection or one of these.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The input records do not carry a usable trait list
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The analysis config failed validation
    #[error("{0}")]
    InvalidConfig(String),

    /// A trait type ended up without any values to normalize
    #[error("Cannot normalize trait type `{trait_type}`: it has no values")]
    NormalizationInput { trait_type: String },

    /// A token attribute has no counterpart in the normalized trait type table
    #[error("No normalized rarity score for value `{value}` of trait type `{trait_type}`")]
    MissingNormalizedScore { trait_type: String, value: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
