//! taxrec - taxon reconciliation tool

use anyhow::Result;
use clap::Parser;
use taxrec_common::logging::{init_logging, LogConfig, LogLevel};
use taxrec_engine::config::EngineConfig;
use taxrec_engine::gbif::BackboneClient;
use taxrec_engine::models::{TaxonHints, TaxonRef, TaxonSubmission};
use taxrec_engine::reconcile::Reconciler;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "taxrec")]
#[command(author, version, about = "Reconcile taxa against the GBIF backbone")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Reconcile one taxon into the store
    Submit {
        /// GBIF backbone key
        #[arg(long)]
        key: Option<i64>,

        /// Scientific name with authorship
        #[arg(long)]
        scientific_name: Option<String>,

        /// Canonical name without authorship
        #[arg(long)]
        canonical_name: Option<String>,

        /// Rank token (name, code, or marker)
        #[arg(long)]
        rank: Option<String>,

        /// Authorship string
        #[arg(long)]
        authorship: Option<String>,

        /// Provenance marker for manual records
        #[arg(long)]
        source: Option<String>,

        /// Backbone key of the parent taxon
        #[arg(long)]
        parent_key: Option<i64>,

        /// Canonical name of the parent taxon
        #[arg(long)]
        parent_canonical_name: Option<String>,

        /// Scientific name of the parent taxon
        #[arg(long)]
        parent_scientific_name: Option<String>,

        /// Backbone key of the accepted taxon this one is a synonym of
        #[arg(long)]
        synonym_of_key: Option<i64>,

        /// Scientific name of the accepted taxon
        #[arg(long)]
        synonym_of_scientific_name: Option<String>,

        /// Canonical name of the accepted taxon
        #[arg(long)]
        synonym_of_canonical_name: Option<String>,
    },

    /// List backbone synonyms registered for a key
    Synonyms {
        /// GBIF backbone key
        #[arg(long)]
        key: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config =
        LogConfig::from_env().unwrap_or_else(|_| LogConfig::with_level(LogLevel::Info));
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    init_logging(&log_config)?;

    let config = EngineConfig::from_env();
    let backbone = BackboneClient::new(config.gbif)?;

    match cli.command {
        Command::Submit {
            key,
            scientific_name,
            canonical_name,
            rank,
            authorship,
            source,
            parent_key,
            parent_canonical_name,
            parent_scientific_name,
            synonym_of_key,
            synonym_of_scientific_name,
            synonym_of_canonical_name,
        } => {
            let fields = TaxonRef {
                backbone_key: key,
                scientific_name,
                canonical_name,
            };
            let synonym_of = TaxonRef {
                backbone_key: synonym_of_key,
                scientific_name: synonym_of_scientific_name,
                canonical_name: synonym_of_canonical_name,
            };
            let hints = TaxonHints {
                rank,
                authorship,
                source,
                parent: TaxonRef {
                    backbone_key: parent_key,
                    scientific_name: parent_scientific_name,
                    canonical_name: parent_canonical_name,
                },
                synonym_of: (!synonym_of.is_empty()).then_some(synonym_of),
                ..TaxonHints::default()
            };
            let submission = TaxonSubmission::from_fields(fields, hints)?;

            let db = config.database.connect().await?;
            let reconciler = Reconciler::new(db, backbone).await?;
            let id = reconciler.submit(submission).await?;

            info!(id, "Taxon reconciled");
            println!("{id}");
        },
        Command::Synonyms { key } => {
            let synonyms = backbone.synonyms(key).await?;
            info!(key, count = synonyms.len(), "Fetched synonyms");
            for synonym in synonyms {
                println!(
                    "{}\t{}",
                    synonym.key.map(|k| k.to_string()).unwrap_or_default(),
                    synonym.scientific_name.unwrap_or_default()
                );
            }
        },
    }

    Ok(())
}
