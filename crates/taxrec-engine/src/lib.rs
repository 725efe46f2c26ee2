//! Taxrec Engine
//!
//! Reconciles taxonomic name submissions against the GBIF backbone and a
//! local Postgres store, so that every taxon is stored exactly once,
//! synonym links are preserved, and ancestor chains are fully populated
//! before a descendant row exists.
//!
//! The entry point is [`reconcile::Reconciler::submit`]: one submission is
//! one logical, atomic operation. Resolution and matching read outside any
//! transaction; all writes of one submission share a single transaction.
//!
//! Because resolution precedes the transaction, two concurrent submissions
//! for the same absent backbone key can both reach the insert phase; the
//! unique constraint on `backbone_key` decides the race and the loser
//! receives [`error::EngineError::DataIntegrity`], which such callers
//! should treat as "re-run resolution".
//!
//! # Example
//!
//! ```no_run
//! use taxrec_engine::config::EngineConfig;
//! use taxrec_engine::gbif::BackboneClient;
//! use taxrec_engine::models::TaxonSubmission;
//! use taxrec_engine::reconcile::Reconciler;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::from_env();
//!     let db = config.database.connect().await?;
//!     let backbone = BackboneClient::new(config.gbif)?;
//!
//!     let reconciler = Reconciler::new(db, backbone).await?;
//!     let id = reconciler
//!         .submit(TaxonSubmission::by_canonical_name("Panthera leo"))
//!         .await?;
//!     tracing::info!(id, "reconciled");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod error;
pub mod gbif;
pub mod models;
pub mod reconcile;
pub mod store;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use models::{TaxonId, TaxonRecord, TaxonSubmission};
pub use reconcile::Reconciler;
