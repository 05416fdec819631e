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

//! Token and collection types for every pipeline generation.
//!
//! Each stage hands the next one a different token type, so the fields a
//! stage may rely on are fixed at compile time:
//! `Token` → `ScoredToken` → `RankedToken` → `RarityToken`.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Placeholder value for a trait type a token does not carry
pub const MISSING: &str = "none";

/// Synthetic trait type recording how many real traits a token has
pub const TRAIT_COUNT: &str = "Trait Count";

/// Token identifier as found in the input (numeric or textual)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for TokenId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<u64>()
            .map_or_else(|_| Self::Text(s.to_string()), Self::Number))
    }
}

impl TokenId {
    /// Whether both ids print the same, so `7` and `"7"` name one token
    pub fn matches(&self, other: &Self) -> bool {
        self == other || self.to_string() == other.to_string()
    }
}

impl From<u64> for TokenId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

/// A plain trait/value pair, before any rarity data exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub trait_type: String,
    pub value: String,
}

impl Trait {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Optional media and description fields, carried through untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// A token after preprocessing: identity plus plain traits
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    pub metadata: TokenMetadata,
    pub attributes: Vec<Trait>,
}

/// One trait value held by one token, annotated with how rare it is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
    pub rarity_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity_score_normalized: Option<f64>,
    pub percentile: f64,
    pub count: u32,
}

/// A token whose attributes carry count, percentile and rarity score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredToken {
    pub id: TokenId,
    pub name: String,
    pub metadata: TokenMetadata,
    pub attributes: Vec<Attribute>,
}

/// A scored token with its total rarity score and rank
#[derive(Debug, Clone, PartialEq)]
pub struct RankedToken {
    pub id: TokenId,
    pub name: String,
    pub metadata: TokenMetadata,
    pub attributes: Vec<Attribute>,
    pub rarity_score: f64,
    pub rank: u32,
}

/// Final token with raw and normalized rarity, each with its own rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityToken {
    pub id: TokenId,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub metadata: TokenMetadata,
    pub attributes: Vec<Attribute>,
    pub rank: u32,
    pub rarity_score: f64,
    pub rarity_score_normalized: f64,
    pub rank_normalized: u32,
}

impl RarityToken {
    /// Check whether the token holds `value` for `trait_type`
    pub fn has_trait(&self, trait_type: &str, value: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.trait_type == trait_type && a.value == value)
    }
}

/// Summary statistics over a set of rarity scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Per trait type table: the best attribute per distinct value plus statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitTypeMeta {
    pub trait_type: String,
    pub attributes: Vec<Attribute>,
    pub stats: Stats,
    #[serde(rename = "numValues")]
    pub num_values: usize,
}

/// Collection-wide metadata: everything except the tokens themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub num_tokens: usize,
    pub trait_types: Vec<TraitTypeMeta>,
    pub stats: Stats,
}

/// The scored collection produced by [`crate::analysis::analyse`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub tokens: Vec<RarityToken>,
    pub num_tokens: usize,
    pub trait_types: Vec<TraitTypeMeta>,
    pub stats: Stats,
}

impl Collection {
    /// Split into the tokens and the single metadata record
    pub fn into_parts(self) -> (Vec<RarityToken>, Meta) {
        let meta = Meta {
            num_tokens: self.num_tokens,
            trait_types: self.trait_types,
            stats: self.stats,
        };
        (self.tokens, meta)
    }

    /// Rebuild a collection from its stored parts
    pub fn from_parts(tokens: Vec<RarityToken>, meta: Meta) -> Self {
        Self {
            tokens,
            num_tokens: meta.num_tokens,
            trait_types: meta.trait_types,
            stats: meta.stats,
        }
    }

    pub fn trait_type(&self, trait_type: &str) -> Option<&TraitTypeMeta> {
        self.trait_types.iter().find(|t| t.trait_type == trait_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_id_parsing() {
        assert_eq!("42".parse::<TokenId>(), Ok(TokenId::Number(42)));
        assert_eq!(
            "ape-7".parse::<TokenId>(),
            Ok(TokenId::Text("ape-7".to_string()))
        );
        assert_eq!(TokenId::Number(7).to_string(), "7");
    }

    #[test]
    fn test_token_id_matches_across_forms() {
        let parsed: TokenId = "7".parse().unwrap();
        assert!(parsed.matches(&TokenId::Text("7".to_string())));
        assert!(TokenId::Text("7".to_string()).matches(&parsed));
        assert!(!parsed.matches(&TokenId::Text("07".to_string())));
        assert!(!parsed.matches(&TokenId::Number(8)));
    }

    #[test]
    fn test_token_id_json_shape() {
        let numeric: TokenId = serde_json::from_str("12").unwrap();
        let textual: TokenId = serde_json::from_str("\"12a\"").unwrap();
        assert_eq!(numeric, TokenId::Number(12));
        assert_eq!(textual, TokenId::Text("12a".to_string()));
    }

    #[test]
    fn test_rarity_token_flattens_metadata() {
        let token = RarityToken {
            id: TokenId::Number(1),
            name: "One".to_string(),
            metadata: TokenMetadata {
                image: Some("ipfs://one".to_string()),
                ..TokenMetadata::default()
            },
            attributes: Vec::new(),
            rank: 1,
            rarity_score: 2.0,
            rarity_score_normalized: 1.5,
            rank_normalized: 1,
        };

        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["image"], "ipfs://one");
        assert!(json.get("description").is_none());

        let back: RarityToken = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }
}
