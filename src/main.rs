/// `TraitScope` - Trait rarity analyzer for token collections
///
/// Copyright (C) 2025 Daniel Freiermuth
///
/// This program is free software: you can redistribute it and/or modify
/// it under the terms of the GNU General Public License as published by
/// the Free Software Foundation, either version 3 of the License, or
/// (at your option) any later version.
///
/// This program is distributed in the hope that it will be useful,
/// but WITHOUT ANY WARRANTY; without even the implied warranty of
/// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
/// GNU General Public License for more details.
///
/// You should have received a copy of the GNU General Public License
/// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use traitscope::analysis::{self, RawCollection, TokenId};
use traitscope::store::{CollectionStore, Direction, SortField, TokensQuery, TraitFilter};
use traitscope::AnalysisConfig;

#[cfg(feature = "ram-profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

const VERSION: &str = env!("TRAITSCOPE_VERSION");

#[derive(Parser, Debug)]
#[command(name = "traitscope")]
#[command(author = "Daniel Freiermuth")]
#[command(version = VERSION)]
#[command(about = "Score, rank and normalize trait rarity in token collections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Path for the DHAT heap profiling output (only used when built with --features ram-profiling)
    #[cfg(feature = "ram-profiling")]
    #[arg(
        long = "profile-output",
        value_name = "PROFILE_FILE",
        default_value = "dhat-heap.json",
        global = true
    )]
    profile_output: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a token collection and emit the scored collection
    Analyse {
        /// JSON file with a token list or `{ "tokens": [...] }`
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Analysis config (defaults to the user config file)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the scored collection here
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Seed this store directory with the result
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },

    /// List tokens from a store
    Query {
        #[arg(value_name = "STORE")]
        store: PathBuf,

        #[arg(long)]
        id: Option<TokenId>,

        /// Keep tokens holding this trait value (repeatable, any match)
        #[arg(long = "trait", value_name = "TYPE=VALUE")]
        traits: Vec<TraitFilter>,

        #[arg(long, value_enum, default_value_t = SortField::RarityScore)]
        order_by: SortField,

        #[arg(long, value_enum, default_value_t = Direction::Desc)]
        direction: Direction,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long)]
        first: Option<usize>,
    },

    /// Look up a single token by id and/or rank
    Token {
        #[arg(value_name = "STORE")]
        store: PathBuf,

        #[arg(long, required_unless_present = "rank")]
        id: Option<TokenId>,

        #[arg(long)]
        rank: Option<u32>,
    },

    /// Print the collection metadata record of a store
    Meta {
        #[arg(value_name = "STORE")]
        store: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON.
    // Set RUST_LOG to override (e.g. RUST_LOG=traitscope=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("TraitScope {VERSION}");

    #[cfg(feature = "ram-profiling")]
    let _profiler = {
        tracing::info!("RAM profiling enabled, output: {:?}", cli.profile_output);
        dhat::Profiler::builder()
            .file_name(cli.profile_output.clone())
            .build()
    };

    #[cfg(feature = "cpu-profiling")]
    {
        tracing::info!("CPU profiling enabled with Tracy - run Tracy profiler to connect");
    }

    match cli.command {
        Command::Analyse {
            input,
            config,
            output,
            store,
        } => run_analyse(&input, config.as_deref(), output.as_deref(), store.as_deref(), cli.pretty),
        Command::Query {
            store,
            id,
            traits,
            order_by,
            direction,
            skip,
            first,
        } => {
            let store = open_store(&store)?;
            let query = TokensQuery {
                first,
                skip,
                order_by,
                order_direction: direction,
                traits,
                id,
            };
            write_json(&store.tokens(&query), None, cli.pretty)
        }
        Command::Token { store, id, rank } => {
            let store = open_store(&store)?;
            let Some(token) = store.token(id.as_ref(), rank) else {
                bail!("No token matches the given id/rank");
            };
            write_json(token, None, cli.pretty)
        }
        Command::Meta { store } => {
            let store = open_store(&store)?;
            write_json(store.meta(), None, cli.pretty)
        }
    }
}

fn run_analyse(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    store: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => AnalysisConfig::from_file(path),
        None => AnalysisConfig::load(),
    }
    .context("Failed to load analysis config")?;

    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let raw: RawCollection = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a token list", input.display()))?;

    let collection = analysis::analyse(raw, &config).context("Analysis failed")?;

    if output.is_some() || store.is_none() {
        write_json(&collection, output, pretty)?;
    }
    if let Some(dir) = store {
        CollectionStore::seed(dir, collection)
            .with_context(|| format!("Failed to seed store {}", dir.display()))?;
    }
    Ok(())
}

fn open_store(dir: &Path) -> Result<CollectionStore> {
    CollectionStore::open(dir).with_context(|| format!("Failed to open store {}", dir.display()))
}

/// Serialize `value` to `path`, or stdout when no path is given
fn write_json<T: Serialize + ?Sized>(value: &T, path: Option<&Path>, pretty: bool) -> Result<()> {
    let writer: Box<dyn Write> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writeln!(writer)?;
    writer.flush().context("Failed to write output")?;

    if let Some(path) = path {
        tracing::info!("Wrote {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_version_starts_with_package_version() {
        assert!(VERSION.starts_with(env!("CARGO_PKG_VERSION")));
        let rendered = Cli::command().render_version();
        assert!(rendered.contains(VERSION));
    }

    #[test]
    fn test_numeric_id_argument() {
        let cli = Cli::try_parse_from(["traitscope", "token", "store", "--id", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Token {
                id: Some(TokenId::Number(7)),
                rank: None,
                ..
            }
        ));
    }
}
