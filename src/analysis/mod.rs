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

//! The rarity scoring pipeline.
//!
//! Stages run strictly one after another; each consumes the complete output
//! of the previous one. Per-token work inside a stage runs on the rayon pool.

pub mod error;
pub mod missing;
pub mod normalize;
pub mod preprocess;
pub mod ranking;
pub mod rarity;
pub mod stats;
pub mod types;

pub use error::{AnalysisError, Result};
pub use missing::{MissingValuePolicy, OmittedTraits};
pub use preprocess::{RawCollection, Record, NULL_VALUE};
pub use types::{
    Attribute, Collection, Meta, RarityToken, Stats, TokenId, TokenMetadata, TraitTypeMeta,
    MISSING, TRAIT_COUNT,
};

use crate::config::AnalysisConfig;
use missing::{add_missing_traits, add_trait_counts, discover_trait_types};
use normalize::{normalize_trait_types, rank_normalized, NormalizedScores};
use rarity::{FrequencyTable, RarityScorer};
use stats::{aggregate_trait_types, collection_stats};

/// Score a collection using the missing trait policy from `config`
pub fn analyse(input: RawCollection, config: &AnalysisConfig) -> Result<Collection> {
    analyse_with_policy(input, config, &config.missing_trait_identifier)
}

/// Score a collection with an explicitly injected missing trait policy
pub fn analyse_with_policy<P>(
    input: RawCollection,
    config: &AnalysisConfig,
    policy: &P,
) -> Result<Collection>
where
    P: MissingValuePolicy + ?Sized,
{
    profiling::scope!("analyse");

    config
        .validate()
        .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;

    let tokens = preprocess::preprocess(input.into_records(), config)?;
    let num_tokens = tokens.len();
    tracing::info!("Analysing {num_tokens} tokens");

    let trait_types = discover_trait_types(&tokens);
    tracing::debug!("Found {} trait types", trait_types.len());

    let tokens = add_missing_traits(tokens, &trait_types, policy);
    let tokens = add_trait_counts(tokens, policy);
    let trait_types = discover_trait_types(&tokens);
    for (trait_type, _) in config.weights.iter() {
        if !trait_types.contains(trait_type) {
            tracing::warn!("Weight configured for unknown trait type `{trait_type}`");
        }
    }

    let counts = FrequencyTable::count(&tokens);
    let tokens = RarityScorer::new(&counts, &config.weights, num_tokens).score_tokens(tokens);
    let tokens = ranking::rank_tokens(tokens);
    tracing::debug!("Ranked {num_tokens} tokens by rarity score");

    let trait_type_meta = aggregate_trait_types(&tokens, &trait_types);
    let stats = collection_stats(&trait_type_meta);
    let trait_type_meta = normalize_trait_types(trait_type_meta, stats.mean)?;

    let scores = NormalizedScores::from_trait_types(&trait_type_meta)?;
    let tokens = rank_normalized(tokens, &scores)?;

    tracing::info!(
        "Analysed {num_tokens} tokens over {} trait types (mean rarity {:.3})",
        trait_type_meta.len(),
        stats.mean
    );

    Ok(Collection {
        tokens,
        num_tokens,
        trait_types: trait_type_meta,
        stats,
    })
}
