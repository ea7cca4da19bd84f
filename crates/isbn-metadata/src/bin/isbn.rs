//! `isbn` command-line tool
//!
//! Validation, conversion and masking work offline. `meta`, `editions` and
//! `goom` query the configured metadata providers.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use isbn_identifiers::{
    extract_all, extract_from_words, to_ean13, IdentifierCodec, MaskStyle, RangeTable,
};
use isbn_metadata::{ResolveOptions, ResolverConfig};

#[derive(Parser, Debug)]
#[command(name = "isbn", version, about = "Validate, convert, mask and look up ISBNs")]
struct Cli {
    /// Path to configuration file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Alternative RangeMessage.xml for masking and group lookup
    #[arg(long, global = true)]
    ranges: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check an ISBN and print its kind
    Validate { isbn: String },
    /// Convert to ISBN-13
    To13 { isbn: String },
    /// Convert to ISBN-10
    To10 { isbn: String },
    /// 13-digit barcode form (ISBN-10s gain the 978 prefix)
    Ean13 { isbn: String },
    /// Hyphenate using the registration ranges
    Mask {
        isbn: String,
        /// Separate parts with spaces instead of hyphens
        #[arg(long)]
        space: bool,
    },
    /// Registration group (language area or country)
    Info { isbn: String },
    /// ISBN-A DOI
    Doi { isbn: String },
    /// ISBNs spelled out in words ("nine seven eight ..."), read from stdin if omitted
    Words { text: Option<String> },
    /// ISBNs embedded in free text, read from stdin if omitted
    Extract { text: Option<String> },
    /// Bibliographic metadata as JSON
    Meta {
        isbn: String,
        /// Fill missing fields from lower-priority providers
        #[arg(long)]
        merge: bool,
    },
    /// ISBN-13s of the other editions of the same work
    Editions { isbn: String },
    /// Search providers by title, author or keywords
    Goom { query: Vec<String> },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let custom_ranges = match &cli.ranges {
        Some(path) => Some(RangeTable::from_xml(&std::fs::read_to_string(path)?)?),
        None => None,
    };
    let codec = match &custom_ranges {
        Some(table) => IdentifierCodec::new(table),
        None => IdentifierCodec::default(),
    };

    match cli.command {
        Commands::Validate { isbn } => {
            let id = codec.validate(&isbn)?;
            println!("{} {}", id.kind(), id);
        }
        Commands::To13 { isbn } => {
            let id = codec.validate(&isbn)?;
            println!("{}", codec.to_isbn13(&id)?);
        }
        Commands::To10 { isbn } => {
            let id = codec.validate(&isbn)?;
            println!("{}", codec.to_isbn10(&id)?);
        }
        Commands::Ean13 { isbn } => {
            let id = codec.validate(&isbn)?;
            println!("{}", to_ean13(&id));
        }
        Commands::Mask { isbn, space } => {
            let id = codec.validate(&isbn)?;
            let style = if space { MaskStyle::Space } else { MaskStyle::Hyphen };
            println!("{}", codec.mask(&id, style));
        }
        Commands::Info { isbn } => {
            let id = codec.validate(&isbn)?;
            match codec.info(&id) {
                Some(agency) => println!("{}", agency),
                None => return Err(format!("no registration group for {}", id).into()),
            }
        }
        Commands::Doi { isbn } => {
            let id = codec.validate(&isbn)?;
            println!("{}", codec.doi(&id)?);
        }
        Commands::Words { text } => {
            let text = text_or_stdin(text)?;
            for id in extract_from_words(&text) {
                println!("{}", id);
            }
        }
        Commands::Extract { text } => {
            let text = text_or_stdin(text)?;
            for found in extract_all(&text) {
                match found.identifier {
                    Ok(id) => println!("{}", id),
                    Err(e) => tracing::info!(raw = %found.raw, error = %e, "skipping candidate"),
                }
            }
        }
        Commands::Meta { isbn, merge } => {
            let resolver = load_config(cli.config.as_deref())?.build()?;
            let options = ResolveOptions {
                merge_fields: merge,
                ..ResolveOptions::default()
            };
            let record = resolver.resolve_str(&isbn, options).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Editions { isbn } => {
            let resolver = load_config(cli.config.as_deref())?.build()?;
            let id = codec.validate(&isbn)?;
            for edition in resolver.editions(&id).await? {
                println!("{}", edition);
            }
        }
        Commands::Goom { query } => {
            let resolver = load_config(cli.config.as_deref())?.build()?;
            let ids = resolver.query(&query.join(" ")).await;
            if ids.is_empty() {
                return Err("no matches".into());
            }
            for id in ids {
                println!("{}  {}", codec.mask(&id, MaskStyle::Hyphen), id);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<ResolverConfig, isbn_metadata::ConfigError> {
    match path {
        Some(path) => ResolverConfig::load(path),
        None => ResolverConfig::load_standard(),
    }
}

fn text_or_stdin(text: Option<String>) -> std::io::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
