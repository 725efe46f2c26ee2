// GBIF Backbone Lookup Module
//
// Collaborator wrapper for the GBIF v1 species API:
// - Fetch: full name-usage records by key
// - Match: name matching with confidence-based acceptance
// - Parse: name parsing for rank markers and epithets
// - Walk: root-first ancestor lists
//
// The transport itself is a black box to the rest of the engine; only the
// matcher's acceptance rules carry reconciliation semantics.

pub mod client;
pub mod config;
pub mod matcher;
pub mod models;

// Re-export main types
pub use client::BackboneClient;
pub use config::GbifConfig;
pub use matcher::{BackboneMatcher, MATCH_CONFIDENCE_THRESHOLD};
pub use models::{BackboneUsage, MatchType, NameMatch, ParsedName, TaxonInfo, UsagePage};
