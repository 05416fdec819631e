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

//! Rarity scoring for collections of tokens with categorical traits.
//!
//! [`analysis::analyse`] turns raw token records into a scored
//! [`Collection`], [`store::CollectionStore`] persists it and answers
//! read-only queries.

pub mod analysis;
pub mod config;
pub mod store;

pub use analysis::{analyse, analyse_with_policy, AnalysisError, Collection, RawCollection};
pub use config::AnalysisConfig;
pub use store::{CollectionStore, StoreError, TokensQuery};
