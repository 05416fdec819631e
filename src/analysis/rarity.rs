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

use crate::analysis::types::{Attribute, ScoredToken, Token, Trait};
use crate::config::Weights;
use rayon::prelude::*;
use std::collections::HashMap;

/// How many tokens carry each value, per trait type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, HashMap<String, u32>>,
}

impl FrequencyTable {
    /// Count every attribute of every token
    pub fn count(tokens: &[Token]) -> Self {
        profiling::scope!("FrequencyTable::count");
        tokens
            .par_iter()
            .fold(Self::default, |mut table, token| {
                for attribute in &token.attributes {
                    table.record(&attribute.trait_type, &attribute.value, 1);
                }
                table
            })
            .reduce(Self::default, Self::merge)
    }

    fn record(&mut self, trait_type: &str, value: &str, n: u32) {
        *self
            .counts
            .entry(trait_type.to_string())
            .or_default()
            .entry(value.to_string())
            .or_insert(0) += n;
    }

    fn merge(mut self, other: Self) -> Self {
        for (trait_type, values) in other.counts {
            for (value, n) in values {
                self.record(&trait_type, &value, n);
            }
        }
        self
    }

    pub fn get(&self, trait_type: &str, value: &str) -> Option<u32> {
        self.counts.get(trait_type)?.get(value).copied()
    }
}

/// Scores trait values by inverse frequency, scaled by trait type weight
pub struct RarityScorer<'a> {
    counts: &'a FrequencyTable,
    weights: &'a Weights,
    num_tokens: usize,
}

impl<'a> RarityScorer<'a> {
    pub const fn new(counts: &'a FrequencyTable, weights: &'a Weights, num_tokens: usize) -> Self {
        Self {
            counts,
            weights,
            num_tokens,
        }
    }

    /// `percentile = count / n` and `rarity_score = (1 / percentile) * weight`
    pub fn score(&self, attribute: Trait) -> Attribute {
        let count = self
            .counts
            .get(&attribute.trait_type, &attribute.value)
            .unwrap_or(0);
        // Counts come from the same tokens that are being scored
        debug_assert!(count > 0, "unscored value {attribute:?}");

        let percentile = f64::from(count) / self.num_tokens as f64;
        let rarity_score = (1.0 / percentile) * self.weights.weight(&attribute.trait_type);

        Attribute {
            trait_type: attribute.trait_type,
            value: attribute.value,
            rarity_score,
            rarity_score_normalized: None,
            percentile,
            count,
        }
    }

    /// Score all attributes; each token's attributes end up rarest first
    pub fn score_tokens(&self, tokens: Vec<Token>) -> Vec<ScoredToken> {
        profiling::scope!("RarityScorer::score_tokens");
        tokens
            .into_par_iter()
            .map(|token| {
                let mut attributes: Vec<Attribute> =
                    token.attributes.into_iter().map(|a| self.score(a)).collect();
                attributes.sort_by(|a, b| b.rarity_score.total_cmp(&a.rarity_score));
                ScoredToken {
                    id: token.id,
                    name: token.name,
                    metadata: token.metadata,
                    attributes,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{TokenId, TokenMetadata};

    fn backgrounds(values: &[&str]) -> Vec<Token> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| Token {
                id: TokenId::Number(i as u64),
                name: String::new(),
                metadata: TokenMetadata::default(),
                attributes: vec![Trait::new("Background", *value)],
            })
            .collect()
    }

    #[test]
    fn test_frequency_counts() {
        let tokens = backgrounds(&["Red", "Red", "Blue", "Green"]);
        let counts = FrequencyTable::count(&tokens);

        assert_eq!(counts.get("Background", "Red"), Some(2));
        assert_eq!(counts.get("Background", "Blue"), Some(1));
        assert_eq!(counts.get("Background", "Green"), Some(1));
        assert_eq!(counts.get("Background", "Pink"), None);
    }

    #[test]
    fn test_parallel_count_matches_sequential() {
        let values: Vec<String> = (0..5000).map(|i| format!("v{}", i % 37)).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let tokens = backgrounds(&refs);
        let counts = FrequencyTable::count(&tokens);

        let mut expected = FrequencyTable::default();
        for value in &refs {
            expected.record("Background", value, 1);
        }
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_rarity_scores() {
        let tokens = backgrounds(&["Red", "Red", "Blue", "Green"]);
        let counts = FrequencyTable::count(&tokens);
        let weights = Weights::default();
        let scored = RarityScorer::new(&counts, &weights, tokens.len()).score_tokens(tokens);

        let red = &scored[0].attributes[0];
        assert_eq!(red.count, 2);
        assert_eq!(red.percentile, 0.5);
        assert_eq!(red.rarity_score, 2.0);

        let blue = &scored[2].attributes[0];
        assert_eq!(blue.percentile, 0.25);
        assert_eq!(blue.rarity_score, 4.0);
        assert_eq!(scored[3].attributes[0].rarity_score, 4.0);
    }

    #[test]
    fn test_weight_scales_trait_type() {
        let tokens = backgrounds(&["Red", "Red", "Blue", "Green"]);
        let counts = FrequencyTable::count(&tokens);
        let weights: Weights = [("Background".to_string(), 0.5)].into_iter().collect();
        let scored = RarityScorer::new(&counts, &weights, tokens.len()).score_tokens(tokens);

        assert_eq!(scored[0].attributes[0].rarity_score, 1.0);
        assert_eq!(scored[2].attributes[0].rarity_score, 2.0);
    }

    #[test]
    fn test_attributes_sorted_rarest_first() {
        let tokens: Vec<Token> = (0..4)
            .map(|i| Token {
                id: TokenId::Number(i),
                name: String::new(),
                metadata: TokenMetadata::default(),
                attributes: vec![
                    Trait::new("Body", "Plain"),
                    Trait::new("Hat", if i == 0 { "Crown" } else { "Cap" }),
                ],
            })
            .collect();
        let counts = FrequencyTable::count(&tokens);
        let weights = Weights::default();
        let scored = RarityScorer::new(&counts, &weights, tokens.len()).score_tokens(tokens);

        assert_eq!(scored[0].attributes[0].value, "Crown");
        assert_eq!(scored[0].attributes[1].value, "Plain");
        assert_eq!(scored[1].attributes[0].value, "Cap");
        assert_eq!(scored[1].attributes[1].value, "Plain");
    }
}
