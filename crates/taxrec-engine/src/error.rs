//! Error types for the reconciliation engine
//!
//! Every failure mode a caller needs to distinguish gets its own variant:
//! "supply more information" (`InsufficientInfo`, `AmbiguousMatch`),
//! "store corruption" (`DataIntegrity`), "wrong cross-reference"
//! (`NameMismatch`), and infrastructure failures (`Database`, `Backbone`).
//!
//! A `DataIntegrity` error surfacing from the insert phase can also mean a
//! concurrent submission won the race for the same backbone key; callers
//! should re-run resolution rather than treat it as fatal.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error type for the reconciliation engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Rank token matched no row of the rank reference table
    #[error("Unknown taxonomic rank: '{0}'")]
    UnknownRank(String),

    /// A uniqueness invariant of the store is violated
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// Stored name and supplied name disagree for the same backbone key
    #[error("Name '{supplied}' does not correspond to the stored name '{stored}' for this backbone key")]
    NameMismatch { stored: String, supplied: String },

    /// A canonical-name lookup matched several rows; the caller must
    /// disambiguate with a scientific name or a backbone key
    #[error("Ambiguous match: {0}")]
    AmbiguousMatch(String),

    /// Not enough information to determine rank, names, or parent
    #[error("Insufficient information: {0}")]
    InsufficientInfo(String),

    /// The backbone reports no discoverable ancestor for a non-synonym taxon
    #[error("Parent taxon not found: {0}")]
    ParentNotFound(String),

    /// Engine or client configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backbone service request failed
    #[error("Backbone service error: {0}")]
    Backbone(#[from] reqwest::Error),
}

impl EngineError {
    /// Create a data integrity error
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }

    /// Create an insufficient-information error
    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientInfo(msg.into())
    }

    /// Create an ambiguous-match error
    pub fn ambiguous(msg: impl Into<String>) -> Self {
        Self::AmbiguousMatch(msg.into())
    }
}
