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

//! Cardinality normalization of rarity scores.
//!
//! A trait type with more values than average collects higher rarity scores
//! just for having more low-frequency slots: four evenly spread values add 4
//! to every token's total, five add 5. Such trait types get scaled down (and
//! trait types with fewer values scaled up).
//!
//! Part of a trait type's deviation may come from genuinely rarer values
//! though. When a trait type has, say, 30% more values than average but a 40%
//! higher mean rarity, the extra 10% is real rarity. It is set aside while
//! the rest of the score is scaled by the 30%, then added back.

use crate::analysis::error::{AnalysisError, Result};
use crate::analysis::ranking::rank_by;
use crate::analysis::types::{RankedToken, RarityToken, TraitTypeMeta};
use rayon::prelude::*;
use std::collections::HashMap;

/// Per trait type scaling derived from its mean rarity and value count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Relative deviation of the trait type's mean rarity from the collection mean
    pub a: f64,
    /// Relative deviation of the value count from the mean value count
    pub b: f64,
    /// Scale factor: `1 - b` above the mean value count, `1 + b` below
    pub c: f64,
    /// Rarity and value count both deviate upward, or both downward
    pub same_direction: bool,
}

impl Correction {
    pub const fn new(mean: f64, num_values: f64, mean_rarity: f64, mean_value_count: f64) -> Self {
        let a = if mean >= mean_rarity {
            (mean - mean_rarity) / mean
        } else {
            (mean_rarity - mean) / mean_rarity
        };

        let b = if num_values >= mean_value_count {
            (num_values - mean_value_count) / num_values
        } else {
            (mean_value_count - num_values) / mean_value_count
        };

        let c = if num_values >= mean_value_count {
            1.0 - b
        } else {
            1.0 + b
        };

        let same_direction = (mean > mean_rarity && num_values > mean_value_count)
            || (mean < mean_rarity && num_values < mean_value_count);

        Self {
            a,
            b,
            c,
            same_direction,
        }
    }

    pub const fn apply(&self, r: f64) -> f64 {
        let Self { a, b, c, .. } = *self;
        if a >= b && self.same_direction {
            (r - (a - b) * r) * c + (a - b) * r
        } else {
            (r - a * r) * c + a * r
        }
    }
}

/// Fill in `rarity_score_normalized` on every trait type table
pub fn normalize_trait_types(
    trait_types: Vec<TraitTypeMeta>,
    mean_rarity: f64,
) -> Result<Vec<TraitTypeMeta>> {
    profiling::scope!("normalize_trait_types");
    if trait_types.is_empty() {
        return Ok(trait_types);
    }

    let mean_value_count = trait_types.iter().map(|t| t.num_values as f64).sum::<f64>()
        / trait_types.len() as f64;

    trait_types
        .into_iter()
        .map(|mut meta| {
            if meta.num_values == 0 {
                return Err(AnalysisError::NormalizationInput {
                    trait_type: meta.trait_type,
                });
            }
            let correction = Correction::new(
                meta.stats.mean,
                meta.num_values as f64,
                mean_rarity,
                mean_value_count,
            );
            tracing::debug!(
                "Normalizing `{}` with a={:.4} b={:.4} c={:.4}",
                meta.trait_type,
                correction.a,
                correction.b,
                correction.c
            );
            for attribute in &mut meta.attributes {
                attribute.rarity_score_normalized = Some(correction.apply(attribute.rarity_score));
            }
            Ok(meta)
        })
        .collect()
}

/// Normalized score lookup: trait type → value → normalized rarity score
#[derive(Debug, Clone, Default)]
pub struct NormalizedScores {
    scores: HashMap<String, HashMap<String, f64>>,
}

impl NormalizedScores {
    pub fn from_trait_types(trait_types: &[TraitTypeMeta]) -> Result<Self> {
        let mut scores: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for attribute in trait_types.iter().flat_map(|t| &t.attributes) {
            let normalized = attribute.rarity_score_normalized.ok_or_else(|| {
                AnalysisError::MissingNormalizedScore {
                    trait_type: attribute.trait_type.clone(),
                    value: attribute.value.clone(),
                }
            })?;
            scores
                .entry(attribute.trait_type.clone())
                .or_default()
                .insert(attribute.value.clone(), normalized);
        }
        Ok(Self { scores })
    }

    pub fn get(&self, trait_type: &str, value: &str) -> Result<f64> {
        self.scores
            .get(trait_type)
            .and_then(|values| values.get(value))
            .copied()
            .ok_or_else(|| AnalysisError::MissingNormalizedScore {
                trait_type: trait_type.to_string(),
                value: value.to_string(),
            })
    }
}

/// Apply normalized scores to every token, total them and re-rank
///
/// The returned tokens are ordered by normalized rank.
pub fn rank_normalized(
    tokens: Vec<RankedToken>,
    scores: &NormalizedScores,
) -> Result<Vec<RarityToken>> {
    profiling::scope!("rank_normalized");

    let totals: Vec<(RankedToken, f64)> = tokens
        .into_par_iter()
        .map(|mut token| -> Result<(RankedToken, f64)> {
            let mut total = 0.0;
            for attribute in &mut token.attributes {
                let normalized = scores.get(&attribute.trait_type, &attribute.value)?;
                attribute.rarity_score_normalized = Some(normalized);
                total += normalized;
            }
            Ok((token, total))
        })
        .collect::<Result<_>>()?;

    Ok(rank_by(totals, |(_, total)| *total)
        .into_iter()
        .map(|((token, rarity_score_normalized), rank_normalized)| RarityToken {
            id: token.id,
            name: token.name,
            metadata: token.metadata,
            attributes: token.attributes,
            rank: token.rank,
            rarity_score: token.rarity_score,
            rarity_score_normalized,
            rank_normalized,
        })
        .collect())
}
