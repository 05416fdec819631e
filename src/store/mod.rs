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

//! On-disk store for an analysed collection.
//!
//! A store is a directory holding `tokens.json` (every scored token) and
//! `meta.json` (the single metadata record). Seeding replaces both files;
//! readers and writers coordinate through an advisory lock on `.lock`.

pub mod query;

pub use query::{Direction, SortField, TokensQuery, TraitFilter};

use crate::analysis::{Collection, Meta, RarityToken, TokenId};
use fs2::FileExt;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const TOKENS_FILE: &str = "tokens.json";
const META_FILE: &str = "meta.json";
const LOCK_FILE: &str = ".lock";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Token id {0} occurs more than once")]
    DuplicateTokenId(TokenId),
}

pub type Result<T> = std::result::Result<T, StoreError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Scored tokens indexed by id, plus the collection metadata
#[derive(Debug, Clone)]
pub struct CollectionStore {
    tokens: IndexMap<TokenId, RarityToken>,
    meta: Meta,
}

impl CollectionStore {
    /// Index a collection in memory, rejecting duplicate token ids
    pub fn from_collection(collection: Collection) -> Result<Self> {
        let (tokens, meta) = collection.into_parts();
        Self::from_parts(tokens, meta)
    }

    fn from_parts(tokens: Vec<RarityToken>, meta: Meta) -> Result<Self> {
        let mut indexed = IndexMap::with_capacity(tokens.len());
        for token in tokens {
            if indexed.contains_key(&token.id) {
                return Err(StoreError::DuplicateTokenId(token.id));
            }
            indexed.insert(token.id.clone(), token);
        }
        Ok(Self {
            tokens: indexed,
            meta,
        })
    }

    /// Replace the contents of the store at `dir` with `collection`
    ///
    /// Nothing on disk is touched if the collection has duplicate ids, and
    /// each file is only swapped in once it has been written in full.
    pub fn seed(dir: &Path, collection: Collection) -> Result<Self> {
        profiling::scope!("CollectionStore::seed");
        let store = Self::from_collection(collection)?;

        fs::create_dir_all(dir).map_err(io_error(dir))?;
        let lock = Self::lock(dir, true)?;

        let tokens: Vec<&RarityToken> = store.tokens.values().collect();
        write_json(&dir.join(TOKENS_FILE), &tokens)?;
        write_json(&dir.join(META_FILE), &store.meta)?;
        drop(lock);

        tracing::info!("Seeded {} tokens into {dir:?}", store.len());
        Ok(store)
    }

    /// Load the store at `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        profiling::scope!("CollectionStore::open");
        let lock = Self::lock(dir, false)?;
        let tokens: Vec<RarityToken> = read_json(&dir.join(TOKENS_FILE))?;
        let meta: Meta = read_json(&dir.join(META_FILE))?;
        drop(lock);

        tracing::debug!("Opened store {dir:?} with {} tokens", tokens.len());
        Self::from_parts(tokens, meta)
    }

    /// Lock `dir/.lock`; the lock is released when the file is dropped
    fn lock(dir: &Path, exclusive: bool) -> Result<File> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(io_error(&path))?;
        if exclusive {
            file.lock_exclusive().map_err(io_error(&path))?;
        } else {
            file.lock_shared().map_err(io_error(&path))?;
        }
        Ok(file)
    }

    pub const fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens matching `query`, sorted and paged as it asks
    pub fn tokens(&self, query: &TokensQuery) -> Vec<&RarityToken> {
        if let Some(id) = &query.id {
            return self
                .get(id)
                .filter(|token| query.matches(token))
                .into_iter()
                .skip(query.skip)
                .take(query.first.unwrap_or(usize::MAX))
                .collect();
        }
        query.apply(self.tokens.values())
    }

    /// First stored token matching every given criterion
    pub fn token(&self, id: Option<&TokenId>, rank: Option<u32>) -> Option<&RarityToken> {
        let has_rank = |token: &&RarityToken| rank.is_none_or(|rank| token.rank == rank);
        id.map_or_else(
            || self.tokens.values().find(has_rank),
            |id| self.get(id).filter(has_rank),
        )
    }

    /// Token stored under `id`, also trying the textual form of a numeric id
    fn get(&self, id: &TokenId) -> Option<&RarityToken> {
        self.tokens.get(id).or_else(|| match id {
            TokenId::Number(n) => self.tokens.get(&TokenId::Text(n.to_string())),
            TokenId::Text(_) => None,
        })
    }

    /// Reassemble the stored collection
    pub fn into_collection(self) -> Collection {
        Collection::from_parts(self.tokens.into_values().collect(), self.meta)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let file = File::create(&tmp).map_err(io_error(&tmp))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| StoreError::Json {
        path: tmp.clone(),
        source,
    })?;
    writer.flush().map_err(io_error(&tmp))?;
    fs::rename(&tmp, path).map_err(io_error(path))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(io_error(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
