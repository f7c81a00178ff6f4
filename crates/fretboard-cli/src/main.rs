//! fretboard: chord voicing and inversion catalog generator

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use fretboard_core::{Category, VSystem};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Generate chord voicings, inversions and V-System families
#[derive(Parser)]
#[command(name = "fretboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Template config (default: <config dir>/fretboard/voicings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog JSON file (default: <data dir>/fretboard/catalog.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Print run reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a base voicing and project it onto every sibling range
    Define {
        /// Chord quality, e.g. "Minor 7"
        #[arg(short, long)]
        quality: String,

        /// Root name ("Eb") or pitch class (0-11)
        #[arg(short, long)]
        root: String,

        /// Range the base voicing is defined on, e.g. "e - d"
        #[arg(long)]
        range: String,

        /// Largest instrument to project onto (6, 7 or 8 strings)
        #[arg(long, value_parser = clap::value_parser!(u8).range(6..=8))]
        instrument: Option<u8>,
    },

    /// Generate V1 (close) or V2 (drop-2) voicings on a standard string set
    Vsystem {
        /// v1 or v2
        #[arg(short, long)]
        system: VSystem,

        /// String set, e.g. "b - A"
        #[arg(long)]
        string_set: String,

        /// Single quality (requires --root); omit both for the whole family
        #[arg(short, long, requires = "root")]
        quality: Option<String>,

        #[arg(short, long, requires = "quality")]
        root: Option<String>,
    },

    /// Regenerate every quality at every root on every range
    Regenerate {
        /// Roll back the whole batch on the first failure
        #[arg(long)]
        all_or_nothing: bool,

        /// Largest instrument to cover (6, 7 or 8 strings)
        #[arg(long, value_parser = clap::value_parser!(u8).range(6..=8))]
        instrument: Option<u8>,
    },

    /// Print stored voicings and positions for one chord
    Show {
        #[arg(short, long)]
        quality: String,

        #[arg(short, long)]
        root: String,

        #[arg(long, value_enum, default_value = "standard")]
        category: CategoryArg,
    },

    /// List chord and range templates
    Templates,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Standard,
    V1,
    V2,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Standard => Category::Standard,
            CategoryArg::V1 => Category::V1,
            CategoryArg::V2 => Category::V2,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "fretboard=debug" } else { "fretboard=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = commands::Context::load(cli.config.as_deref(), cli.catalog, cli.json).and_then(|ctx| {
        match cli.command {
            Commands::Define {
                quality,
                root,
                range,
                instrument,
            } => commands::define(&ctx, &quality, &root, &range, instrument),
            Commands::Vsystem {
                system,
                string_set,
                quality,
                root,
            } => commands::vsystem(&ctx, system, &string_set, quality.as_deref().zip(root.as_deref())),
            Commands::Regenerate {
                all_or_nothing,
                instrument,
            } => commands::regenerate(&ctx, all_or_nothing, instrument),
            Commands::Show {
                quality,
                root,
                category,
            } => commands::show(&ctx, &quality, &root, category.into()),
            Commands::Templates => commands::templates(&ctx),
        }
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
