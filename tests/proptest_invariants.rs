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

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Value};
use traitscope::analysis::missing::{add_missing_traits, discover_trait_types};
use traitscope::analysis::preprocess::preprocess;
use traitscope::analysis::{analyse, Collection, RarityToken, RawCollection};
use traitscope::config::{AnalysisConfig, MissingTraitIdentifier};

const MIN_PROPTEST_CASES: u32 = 256;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

/// Rows of tokens; each cell is a value index for one trait type, or absent
fn rows_strategy() -> impl Strategy<Value = Vec<Vec<Option<u8>>>> {
    (1usize..5).prop_flat_map(|num_types| {
        prop::collection::vec(
            prop::collection::vec(prop::option::weighted(0.8, 0u8..4), num_types),
            1..40,
        )
    })
}

fn records(rows: &[Vec<Option<u8>>]) -> Vec<Value> {
    rows.iter()
        .enumerate()
        .map(|(id, row)| {
            let attributes: Vec<Value> = row
                .iter()
                .enumerate()
                .filter_map(|(t, value)| {
                    value.map(|v| json!({ "trait_type": format!("T{t}"), "value": format!("v{v}") }))
                })
                .collect();
            json!({ "id": id, "name": format!("Token {id}"), "attributes": attributes })
        })
        .collect()
}

fn raw(rows: &[Vec<Option<u8>>]) -> RawCollection {
    serde_json::from_value(Value::Array(records(rows)))
        .expect("generated records should always form a valid collection")
}

fn run(rows: &[Vec<Option<u8>>]) -> Collection {
    analyse(raw(rows), &AnalysisConfig::default())
        .expect("generated collections should always analyse")
}

/// Competition rank: one more than the number of strictly higher scores
fn expected_rank<F>(tokens: &[RarityToken], score: F, token: &RarityToken) -> u32
where
    F: Fn(&RarityToken) -> f64,
{
    let higher = tokens.iter().filter(|t| score(*t) > score(token)).count();
    higher as u32 + 1
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        max_shrink_iters: 1024,
        failure_persistence: Some(Box::new(FileFailurePersistence::Direct("proptest-regressions/tests/proptest_invariants.txt"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn percentile_is_count_over_tokens(rows in rows_strategy()) {
        let collection = run(&rows);
        let n = collection.num_tokens as f64;

        for token in &collection.tokens {
            for attribute in &token.attributes {
                let holders = collection
                    .tokens
                    .iter()
                    .filter(|t| t.has_trait(&attribute.trait_type, &attribute.value))
                    .count();
                prop_assert_eq!(attribute.count as usize, holders);
                prop_assert_eq!(attribute.percentile, f64::from(attribute.count) / n);
                prop_assert!(attribute.percentile > 0.0 && attribute.percentile <= 1.0);
            }
        }
    }

    #[test]
    fn totals_are_exact_sums(rows in rows_strategy()) {
        let collection = run(&rows);

        for token in &collection.tokens {
            let raw: f64 = token.attributes.iter().map(|a| a.rarity_score).sum();
            let normalized: f64 = token
                .attributes
                .iter()
                .filter_map(|a| a.rarity_score_normalized)
                .sum();
            prop_assert_eq!(token.rarity_score, raw);
            prop_assert_eq!(token.rarity_score_normalized, normalized);
        }
    }

    #[test]
    fn ranks_follow_competition_ranking(rows in rows_strategy()) {
        let collection = run(&rows);
        let tokens = &collection.tokens;

        for token in tokens {
            prop_assert_eq!(token.rank, expected_rank(tokens, |t| t.rarity_score, token));
            prop_assert_eq!(
                token.rank_normalized,
                expected_rank(tokens, |t| t.rarity_score_normalized, token)
            );
        }
    }

    #[test]
    fn normalization_preserves_order_within_trait_type(rows in rows_strategy()) {
        let collection = run(&rows);

        for table in &collection.trait_types {
            prop_assert_eq!(table.num_values, table.attributes.len());
            for x in &table.attributes {
                for y in &table.attributes {
                    if x.rarity_score > y.rarity_score {
                        prop_assert!(x.rarity_score_normalized > y.rarity_score_normalized);
                    }
                }
            }
        }
    }

    #[test]
    fn missing_trait_synthesis_is_idempotent(rows in rows_strategy(), sentinel in prop::bool::ANY) {
        let config = if sentinel {
            AnalysisConfig::default().with_missing_trait_identifier(MissingTraitIdentifier::Uniform {
                value: "v0".to_string(),
            })
        } else {
            AnalysisConfig::default()
        };
        let tokens = preprocess(raw(&rows).into_records(), &config)
            .expect("generated records should always preprocess");
        let trait_types = discover_trait_types(&tokens);

        let once = add_missing_traits(tokens, &trait_types, &config.missing_trait_identifier);
        let twice = add_missing_traits(once.clone(), &trait_types, &config.missing_trait_identifier);
        prop_assert_eq!(&once, &twice);

        for token in &once {
            prop_assert_eq!(token.attributes.len(), trait_types.len());
        }
    }
}
