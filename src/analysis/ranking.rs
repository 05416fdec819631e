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

use crate::analysis::types::{Attribute, RankedToken, ScoredToken};

/// Sort items by score, descending, and assign competition ranks
///
/// Tied items share the rank of the first item in their run and the next
/// lower score jumps to its 1-based position: `1, 1, 3, 4, 4, 4, 7`.
/// The sort is stable, so ties keep their incoming order.
pub fn rank_by<T, F>(mut items: Vec<T>, score: F) -> Vec<(T, u32)>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));

    let mut current_rank = 0;
    let mut previous = f64::INFINITY;
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let s = score(&item);
            if s < previous {
                current_rank = i as u32 + 1;
            }
            previous = s;
            (item, current_rank)
        })
        .collect()
}

/// Sum of the attribute rarity scores, in attribute order
pub fn total_rarity(attributes: &[Attribute]) -> f64 {
    attributes.iter().map(|a| a.rarity_score).sum()
}

/// Total every token's rarity score and rank the collection by it
pub fn rank_tokens(tokens: Vec<ScoredToken>) -> Vec<RankedToken> {
    profiling::scope!("rank_tokens");
    let totals: Vec<(ScoredToken, f64)> = tokens
        .into_iter()
        .map(|token| {
            let total = total_rarity(&token.attributes);
            (token, total)
        })
        .collect();

    rank_by(totals, |(_, total)| *total)
        .into_iter()
        .map(|((token, rarity_score), rank)| RankedToken {
            id: token.id,
            name: token.name,
            metadata: token.metadata,
            attributes: token.attributes,
            rarity_score,
            rank,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competition_ranking_with_ties() {
        let scores = vec![5.0, 9.0, 9.0, 7.0, 5.0, 5.0, 1.0];
        let ranks: Vec<(f64, u32)> = rank_by(scores, |s| *s);

        assert_eq!(
            ranks,
            vec![
                (9.0, 1),
                (9.0, 1),
                (7.0, 3),
                (5.0, 4),
                (5.0, 4),
                (5.0, 4),
                (1.0, 7),
            ]
        );
    }

    #[test]
    fn test_all_equal_scores_share_first_rank() {
        let ranks = rank_by(vec![3.0; 4], |s| *s);
        assert!(ranks.iter().all(|(_, rank)| *rank == 1));
    }

    #[test]
    fn test_empty_input() {
        let ranks = rank_by(Vec::<f64>::new(), |s| *s);
        assert!(ranks.is_empty());
    }

    #[test]
    fn test_ties_keep_incoming_order() {
        let items = vec![("a", 2.0), ("b", 4.0), ("c", 2.0)];
        let ranked: Vec<(&str, u32)> = rank_by(items, |(_, s)| *s)
            .into_iter()
            .map(|((name, _), rank)| (name, rank))
            .collect();

        assert_eq!(ranked, vec![("b", 1), ("a", 2), ("c", 2)]);
    }
}
