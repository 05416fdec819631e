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

//! Read-only token queries: filter, sort, then page.

use crate::analysis::{RarityToken, TokenId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token field to order query results by
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    RarityScore,
    RarityScoreNormalized,
    Rank,
    RankNormalized,
    Id,
}

impl SortField {
    fn compare(self, a: &RarityToken, b: &RarityToken) -> Ordering {
        match self {
            Self::RarityScore => a.rarity_score.total_cmp(&b.rarity_score),
            Self::RarityScoreNormalized => a
                .rarity_score_normalized
                .total_cmp(&b.rarity_score_normalized),
            Self::Rank => a.rank.cmp(&b.rank),
            Self::RankNormalized => a.rank_normalized.cmp(&b.rank_normalized),
            Self::Id => a.id.cmp(&b.id),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected TYPE=VALUE, got `{0}`")]
pub struct ParseTraitFilterError(String);

/// A `(trait_type, value)` pair a token must hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitFilter {
    pub trait_type: String,
    pub value: String,
}

impl TraitFilter {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

impl FromStr for TraitFilter {
    type Err = ParseTraitFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once('=')
            .filter(|(trait_type, _)| !trait_type.is_empty())
            .map(|(trait_type, value)| Self::new(trait_type, value))
            .ok_or_else(|| ParseTraitFilterError(s.to_string()))
    }
}

impl fmt::Display for TraitFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.trait_type, self.value)
    }
}

/// Token listing request
///
/// A token passes the `traits` filter when it holds any of the listed
/// pairs; an empty list lets every token through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensQuery {
    /// Maximum number of tokens returned, unlimited when `None`
    pub first: Option<usize>,
    pub skip: usize,
    pub order_by: SortField,
    pub order_direction: Direction,
    pub traits: Vec<TraitFilter>,
    pub id: Option<TokenId>,
}

impl TokensQuery {
    pub fn matches(&self, token: &RarityToken) -> bool {
        if self.id.as_ref().is_some_and(|id| !id.matches(&token.id)) {
            return false;
        }
        self.traits.is_empty()
            || self
                .traits
                .iter()
                .any(|filter| token.has_trait(&filter.trait_type, &filter.value))
    }

    /// Filter, sort (stable) and page `tokens`
    pub fn apply<'a, I>(&self, tokens: I) -> Vec<&'a RarityToken>
    where
        I: IntoIterator<Item = &'a RarityToken>,
    {
        profiling::scope!("TokensQuery::apply");
        let mut matching: Vec<&RarityToken> =
            tokens.into_iter().filter(|t| self.matches(t)).collect();

        matching.sort_by(|a, b| match self.order_direction {
            Direction::Asc => self.order_by.compare(a, b),
            Direction::Desc => self.order_by.compare(b, a),
        });

        matching
            .into_iter()
            .skip(self.skip)
            .take(self.first.unwrap_or(usize::MAX))
            .collect()
    }
}
