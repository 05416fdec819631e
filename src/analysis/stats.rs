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

//! Trait type tables and collection statistics.

use crate::analysis::types::{Attribute, RankedToken, Stats, TraitTypeMeta};
use indexmap::{IndexMap, IndexSet};

impl Stats {
    /// Mean, population standard deviation and extremes of `scores`
    ///
    /// An empty slice yields all zeros.
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            std: variance.sqrt(),
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Build one table per trait type with the best attribute per value
///
/// Values normally score the same on every token; if they don't, the
/// highest score wins. Tables are sorted by `count`, ascending.
pub fn aggregate_trait_types(
    tokens: &[RankedToken],
    trait_types: &IndexSet<String>,
) -> Vec<TraitTypeMeta> {
    profiling::scope!("aggregate_trait_types");

    let mut best: IndexMap<&str, IndexMap<&str, &Attribute>> = trait_types
        .iter()
        .map(|t| (t.as_str(), IndexMap::new()))
        .collect();

    for attribute in tokens.iter().flat_map(|t| &t.attributes) {
        let Some(values) = best.get_mut(attribute.trait_type.as_str()) else {
            continue;
        };
        let current = values.entry(attribute.value.as_str()).or_insert(attribute);
        if attribute.rarity_score > current.rarity_score {
            *current = attribute;
        }
    }

    best.into_iter()
        .map(|(trait_type, values)| {
            let mut attributes: Vec<Attribute> = values.into_values().cloned().collect();
            attributes.sort_by_key(|a| a.count);
            let scores: Vec<f64> = attributes.iter().map(|a| a.rarity_score).collect();
            TraitTypeMeta {
                trait_type: trait_type.to_string(),
                stats: Stats::from_scores(&scores),
                num_values: attributes.len(),
                attributes,
            }
        })
        .collect()
}

/// Collection-wide statistics over every per-value score of every trait type
///
/// The mean and standard deviation pool all values, so the denominator is
/// the total number of distinct values rather than the number of trait types.
pub fn collection_stats(trait_types: &[TraitTypeMeta]) -> Stats {
    let populated = || trait_types.iter().filter(|t| t.num_values > 0);
    let total_values: usize = populated().map(|t| t.num_values).sum();
    if total_values == 0 {
        return Stats::default();
    }

    let scores = || populated().flat_map(|t| t.attributes.iter().map(|a| a.rarity_score));
    let mean = scores().sum::<f64>() / total_values as f64;
    let squared_deviation: f64 = scores().map(|r| (r - mean).powi(2)).sum();

    Stats {
        mean,
        std: (squared_deviation / total_values as f64).sqrt(),
        min: populated().map(|t| t.stats.min).fold(f64::INFINITY, f64::min),
        max: populated()
            .map(|t| t.stats.max)
            .fold(f64::NEG_INFINITY, f64::max),
    }
}
