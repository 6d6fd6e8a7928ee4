use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod commands;

use commands::{
    index::{build_index, lookup, random, search},
    page::{block, extract, render, RenderArgs},
};
use offset_index::{IndexOptions, OffsetIndex};

#[derive(Parser)]
#[command(name = "wikidex")]
#[command(about = "Title index and renderer for multistream Wikipedia dumps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Index listing (`offset:page_id:title` lines, plain or .bz2)
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Multistream .xml.bz2 dump the listing describes
    #[arg(long, global = true)]
    archive: Option<PathBuf>,

    /// Index snapshot path (defaults to `<index>.cache`)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Log index build progress every N listing lines (0 disables)
    #[arg(long, global = true, default_value_t = 1_000_000)]
    progress_every: u64,

    /// Debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the listing and rewrite its snapshot
    BuildIndex,

    /// Show the index entry for a title
    Lookup {
        /// Title, or `id:<page id>`
        title: String,
    },

    /// Case-insensitive substring search over titles
    Search {
        query: String,
        /// Stop after N matches
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print randomly sampled titles
    Random {
        #[arg(long, default_value_t = 25)]
        count: usize,
    },

    /// Print an article's wikitext
    Extract {
        title: String,
        /// Print the whole decompressed block instead of the one page
        #[arg(long, default_value_t = false)]
        raw: bool,
    },

    /// Render an article to HTML
    Render {
        title: String,
        /// Output path (defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Render redirect pages as-is instead of following them
        #[arg(long, default_value_t = false)]
        no_follow: bool,
    },

    /// List every page stored in the same compressed block as a title
    Block { title: String },
}

impl Cli {
    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            snapshot_path: self.cache.clone(),
            progress_every: self.progress_every,
            ..IndexOptions::default()
        }
    }

    fn listing(&self) -> Result<&PathBuf> {
        self.index.as_ref().context("--index <listing> is required")
    }

    fn archive(&self) -> Result<&PathBuf> {
        self.archive
            .as_ref()
            .context("--archive <dump> is required for this command")
    }

    fn load_index(&self) -> Result<OffsetIndex> {
        let listing = self.listing()?;
        OffsetIndex::load_or_build(listing, &self.index_options())
            .with_context(|| format!("load index {}", listing.display()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::BuildIndex => build_index(cli.listing()?, &cli.index_options()),
        Commands::Lookup { title } => lookup(&cli.load_index()?, title),
        Commands::Search { query, limit } => search(&cli.load_index()?, query, *limit),
        Commands::Random { count } => random(&cli.load_index()?, *count),
        Commands::Extract { title, raw } => {
            extract(&cli.load_index()?, cli.archive()?, title, *raw)
        }
        Commands::Render {
            title,
            out,
            no_follow,
        } => render(
            &cli.load_index()?,
            cli.archive()?,
            &RenderArgs {
                title,
                out: out.as_deref(),
                follow_redirects: !no_follow,
            },
        ),
        Commands::Block { title } => block(&cli.load_index()?, cli.archive()?, title),
    }
}
