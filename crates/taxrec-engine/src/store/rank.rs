//! Rank reference table and token resolution
//!
//! The `tax_rank` table is static reference data. It is loaded once per
//! engine instance and resolved in memory; a token may be the canonical
//! rank name, the user-facing code, or the backbone marker.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{EngineError, Result};

/// Numeric level of the species rank. Levels increase toward more
/// specific ranks, so `level > RANK_LEVEL_SPECIES` means infraspecific.
pub const RANK_LEVEL_SPECIES: i32 = 70;

/// One row of the rank reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RankInfo {
    /// Canonical rank name (e.g. "SPECIES")
    pub rank_name: String,
    /// Numeric level, unique, increasing toward more specific ranks
    pub rank_level: i32,
    /// Marker the backbone name parser reports (e.g. "subsp.")
    pub backbone_marker: String,
    /// Short code accepted from user input (e.g. "ssp")
    pub user_code: String,
}

impl RankInfo {
    /// Whether this rank sits below species in the hierarchy
    pub fn is_infraspecific(&self) -> bool {
        self.rank_level > RANK_LEVEL_SPECIES
    }
}

/// In-memory view of the rank reference table
#[derive(Debug, Clone)]
pub struct RankTable {
    ranks: Vec<RankInfo>,
}

impl RankTable {
    /// Build from already-loaded rows (used by tests)
    pub fn new(ranks: Vec<RankInfo>) -> Self {
        Self { ranks }
    }

    /// Load the reference table from the store
    pub async fn load(pool: &PgPool) -> Result<Self> {
        let ranks = sqlx::query_as::<_, RankInfo>(
            r#"
            SELECT rank_name, rank_level, backbone_marker, user_code
            FROM tax_rank
            ORDER BY rank_level
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(Self { ranks })
    }

    /// Resolve a free-form rank token to its reference row. Rank names and
    /// user codes match case-insensitively; backbone markers match exactly
    /// (they carry punctuation).
    pub fn resolve(&self, token: &str) -> Result<&RankInfo> {
        let trimmed = token.trim();
        self.ranks
            .iter()
            .find(|r| {
                r.rank_name.eq_ignore_ascii_case(trimmed)
                    || r.user_code.eq_ignore_ascii_case(trimmed)
                    || r.backbone_marker == trimmed
            })
            .ok_or_else(|| EngineError::UnknownRank(token.to_string()))
    }

    /// All known ranks, ordered root-first
    pub fn ranks(&self) -> &[RankInfo] {
        &self.ranks
    }
}
