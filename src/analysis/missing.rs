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

//! Trait type discovery, missing trait placeholders and the trait count.

use crate::analysis::types::{Token, Trait, MISSING, TRAIT_COUNT};
use indexmap::IndexSet;
use rayon::prelude::*;

/// Decides how a collection marks a trait type that a token does not have
pub trait MissingValuePolicy: Send + Sync {
    /// Value meaning "trait type present but inactive", or `None` when
    /// absence is represented by leaving the entry out
    fn identifier(&self, trait_type: &str) -> Option<&str>;

    /// Value stored in the placeholder attribute for a missing trait type
    fn placeholder(&self, trait_type: &str) -> &str {
        self.identifier(trait_type).unwrap_or(MISSING)
    }
}

/// Policy for collections that never list missing traits
#[derive(Debug, Clone, Copy, Default)]
pub struct OmittedTraits;

impl MissingValuePolicy for OmittedTraits {
    fn identifier(&self, _trait_type: &str) -> Option<&str> {
        None
    }
}

/// Distinct trait types in order of first appearance
pub fn discover_trait_types(tokens: &[Token]) -> IndexSet<String> {
    profiling::scope!("discover_trait_types");
    let mut trait_types = IndexSet::new();
    for attribute in tokens.iter().flat_map(|t| &t.attributes) {
        if !trait_types.contains(attribute.trait_type.as_str()) {
            trait_types.insert(attribute.trait_type.clone());
        }
    }
    trait_types
}

/// A trait type is missing when the token has no entry for it, or the
/// entry holds the policy's identifier
pub fn is_missing<P>(token: &Token, trait_type: &str, policy: &P) -> bool
where
    P: MissingValuePolicy + ?Sized,
{
    token
        .attributes
        .iter()
        .find(|a| a.trait_type == trait_type)
        .is_none_or(|a| Some(a.value.as_str()) == policy.identifier(trait_type))
}

/// Give every token an explicit entry for every known trait type
///
/// Stale entries of missing trait types are dropped before the
/// placeholders are appended, so a token never holds both.
pub fn add_missing_traits<P>(
    tokens: Vec<Token>,
    trait_types: &IndexSet<String>,
    policy: &P,
) -> Vec<Token>
where
    P: MissingValuePolicy + ?Sized,
{
    profiling::scope!("add_missing_traits");
    tokens
        .into_par_iter()
        .map(|token| fill_missing(token, trait_types, policy))
        .collect()
}

fn fill_missing<P>(mut token: Token, trait_types: &IndexSet<String>, policy: &P) -> Token
where
    P: MissingValuePolicy + ?Sized,
{
    let missing: Vec<&str> = trait_types
        .iter()
        .map(String::as_str)
        .filter(|trait_type| is_missing(&token, trait_type, policy))
        .collect();
    if missing.is_empty() {
        return token;
    }

    token
        .attributes
        .retain(|a| !missing.contains(&a.trait_type.as_str()));
    token.attributes.extend(
        missing
            .iter()
            .map(|trait_type| Trait::new(*trait_type, policy.placeholder(trait_type))),
    );
    token
}

/// Append the synthetic "Trait Count" trait: the number of non-missing traits
pub fn add_trait_counts<P>(tokens: Vec<Token>, policy: &P) -> Vec<Token>
where
    P: MissingValuePolicy + ?Sized,
{
    profiling::scope!("add_trait_counts");
    tokens
        .into_par_iter()
        .map(|mut token| {
            let count = token
                .attributes
                .iter()
                .filter(|a| a.value != policy.placeholder(&a.trait_type))
                .count();
            token.attributes.push(Trait::new(TRAIT_COUNT, count.to_string()));
            token
        })
        .collect()
}
