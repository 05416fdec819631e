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

//! Turns raw JSON records into [`Token`]s.
//!
//! This is the only place where input shape is validated. Everything after
//! it treats an inconsistency as a bug rather than bad input.

use crate::analysis::error::{AnalysisError, Result};
use crate::analysis::types::{Token, TokenId, TokenMetadata, Trait};
use crate::config::AnalysisConfig;
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Value recorded for an explicit `null` (or absent) trait value
///
/// Kept apart from the missing-trait placeholder so the two never share a
/// frequency bucket.
pub const NULL_VALUE: &str = "null";

/// A raw input record, as parsed from JSON
pub type Record = Map<String, Value>;

/// Input accepted by the pipeline: a plain record list or `{ "tokens": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCollection {
    Wrapped { tokens: Vec<Record> },
    Records(Vec<Record>),
}

impl RawCollection {
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Wrapped { tokens } | Self::Records(tokens) => tokens,
        }
    }
}

impl From<Vec<Record>> for RawCollection {
    fn from(records: Vec<Record>) -> Self {
        Self::Records(records)
    }
}

/// Normalize raw records into tokens
///
/// The attribute list is taken from the configured field, empty `{}`
/// entries are dropped and ignored trait types are stripped.
pub fn preprocess(records: Vec<Record>, config: &AnalysisConfig) -> Result<Vec<Token>> {
    profiling::scope!("preprocess");

    let field = config.attributes_field_name();
    let ignored: HashSet<&str> = config.ignore_traits.iter().map(String::as_str).collect();

    records
        .into_par_iter()
        .enumerate()
        .map(|(index, record)| clean_record(index, record, field, &ignored))
        .collect()
}

fn clean_record(
    index: usize,
    mut record: Record,
    field: &str,
    ignored: &HashSet<&str>,
) -> Result<Token> {
    let raw = record.remove(field).ok_or_else(|| {
        AnalysisError::MalformedInput(format!("token #{index} has no `{field}` field"))
    })?;
    let Value::Array(entries) = raw else {
        return Err(AnalysisError::MalformedInput(format!(
            "`{field}` of token #{index} is not a list"
        )));
    };

    let is_trait_list = entries
        .first()
        .is_none_or(|first| first.as_object().is_some_and(|o| o.contains_key("trait_type")));
    if !is_trait_list {
        return Err(AnalysisError::MalformedInput(format!(
            "`{field}` of token #{index} does not start with a trait"
        )));
    }

    let mut attributes = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let Value::Object(entry) = entry else {
            return Err(AnalysisError::MalformedInput(format!(
                "attribute #{position} of token #{index} is not an object"
            )));
        };
        if entry.is_empty() {
            continue;
        }
        let attribute = parse_trait(index, position, &entry)?;
        if !ignored.contains(attribute.trait_type.as_str()) {
            attributes.push(attribute);
        }
    }

    Ok(Token {
        id: token_id(index, &record)?,
        name: record.get("name").and_then(scalar_to_string).unwrap_or_default(),
        metadata: metadata(&record),
        attributes,
    })
}

fn parse_trait(index: usize, position: usize, entry: &Record) -> Result<Trait> {
    let trait_type = entry
        .get("trait_type")
        .and_then(scalar_to_string)
        .ok_or_else(|| {
            AnalysisError::MalformedInput(format!(
                "attribute trait type missing in attribute #{position} of token #{index}"
            ))
        })?;

    let value = match entry.get("value") {
        None | Some(Value::Null) => NULL_VALUE.to_string(),
        Some(value) => scalar_to_string(value).ok_or_else(|| {
            AnalysisError::MalformedInput(format!(
                "value of `{trait_type}` in token #{index} is not a scalar"
            ))
        })?,
    };

    Ok(Trait { trait_type, value })
}

/// Falls back to the record position when the record has no id
fn token_id(index: usize, record: &Record) -> Result<TokenId> {
    match record.get("id") {
        None | Some(Value::Null) => Ok(TokenId::Number(index as u64)),
        Some(Value::Number(n)) => Ok(n
            .as_u64()
            .map_or_else(|| TokenId::Text(n.to_string()), TokenId::Number)),
        Some(Value::String(s)) => Ok(TokenId::Text(s.clone())),
        Some(_) => Err(AnalysisError::MalformedInput(format!(
            "id of token #{index} is neither a number nor a string"
        ))),
    }
}

fn metadata(record: &Record) -> TokenMetadata {
    let text = |key: &str| record.get(key).and_then(Value::as_str).map(str::to_string);
    TokenMetadata {
        description: text("description"),
        image: text("image"),
        image_data: text("image_data"),
        external_url: text("external_url"),
        animation_url: text("animation_url"),
        background_color: text("background_color"),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value::<RawCollection>(value)
            .unwrap()
            .into_records()
    }

    #[test]
    fn test_accepts_wrapped_and_plain_lists() {
        let plain = records(json!([{ "id": 1, "attributes": [] }]));
        let wrapped = records(json!({ "tokens": [{ "id": 1, "attributes": [] }] }));
        assert_eq!(plain, wrapped);
    }

    #[test]
    fn test_filters_empty_entries() {
        let input = records(json!([{
            "id": 3,
            "name": "Three",
            "attributes": [{ "trait_type": "Hat", "value": "Cap" }, {}]
        }]));
        let tokens = preprocess(input, &AnalysisConfig::default()).unwrap();

        assert_eq!(tokens[0].id, TokenId::Number(3));
        assert_eq!(tokens[0].name, "Three");
        assert_eq!(tokens[0].attributes, vec![Trait::new("Hat", "Cap")]);
    }

    #[test]
    fn test_renames_custom_attribute_field() {
        let input = records(json!([{
            "id": 1,
            "traits": [{ "trait_type": "Eyes", "value": "Laser" }]
        }]));
        let config = AnalysisConfig::default().with_attributes_field_name("traits");
        let tokens = preprocess(input, &config).unwrap();

        assert_eq!(tokens[0].attributes, vec![Trait::new("Eyes", "Laser")]);
    }

    #[test]
    fn test_rejects_list_without_trait_type() {
        let input = records(json!([{ "id": 1, "attributes": [{ "value": "Red" }] }]));
        let result = preprocess(input, &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::MalformedInput(_))));
    }

    #[test]
    fn test_rejects_list_starting_with_empty_entry() {
        let input = records(json!([{
            "attributes": [{}, { "trait_type": "Fur", "value": "Gold" }]
        }]));
        let result = preprocess(input, &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::MalformedInput(_))));
    }

    #[test]
    fn test_rejects_missing_attribute_field() {
        let input = records(json!([{ "id": 1, "traits": [] }]));
        let result = preprocess(input, &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::MalformedInput(_))));

        let input = records(json!([{ "id": 1, "attributes": "Red" }]));
        let result = preprocess(input, &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::MalformedInput(_))));
    }

    #[test]
    fn test_strips_ignored_trait_types() {
        let input = records(json!([{
            "id": 1,
            "attributes": [
                { "trait_type": "Hat", "value": "Cap" },
                { "trait_type": "Generation", "value": 2 }
            ]
        }]));
        let config = AnalysisConfig::default().ignoring("Generation");
        let tokens = preprocess(input, &config).unwrap();

        assert_eq!(tokens[0].attributes, vec![Trait::new("Hat", "Cap")]);
    }

    #[test]
    fn test_stringifies_scalar_values() {
        let input = records(json!([{
            "attributes": [
                { "trait_type": "Level", "value": 5 },
                { "trait_type": "Shiny", "value": true },
                { "trait_type": "Hat", "value": null }
            ]
        }]));
        let tokens = preprocess(input, &AnalysisConfig::default()).unwrap();

        assert_eq!(tokens[0].id, TokenId::Number(0));
        assert_eq!(
            tokens[0].attributes,
            vec![
                Trait::new("Level", "5"),
                Trait::new("Shiny", "true"),
                Trait::new("Hat", NULL_VALUE),
            ]
        );
    }

    #[test]
    fn test_keeps_media_fields() {
        let input = records(json!([{
            "id": "x1",
            "image": "ipfs://x1",
            "description": "first",
            "attributes": []
        }]));
        let tokens = preprocess(input, &AnalysisConfig::default()).unwrap();

        assert_eq!(tokens[0].id, TokenId::Text("x1".to_string()));
        assert_eq!(tokens[0].metadata.image.as_deref(), Some("ipfs://x1"));
        assert_eq!(tokens[0].metadata.description.as_deref(), Some("first"));
    }
}
