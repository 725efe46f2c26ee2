//! Identity resolution against the taxon store
//!
//! Determines whether a submitted taxon already exists, using count-based
//! equality lookups. These reads run outside any transaction; the unique
//! constraint on `backbone_key` is the final backstop against the
//! resolve-then-insert race (§ concurrency note in the crate docs).

use sqlx::PgPool;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::{MatchMode, Resolution, TaxonId, TaxonIdentity};

/// Minimum normalized similarity between a stored canonical name and a
/// caller-supplied one accompanying a backbone key (0-1 scale).
pub const NAME_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Resolves taxon identities against the store
pub struct IdentityResolver {
    db: PgPool,
}

impl IdentityResolver {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve one identity. A `canonical_hint` accompanying a key lookup
    /// triggers a fuzzy-similarity check against the stored name, so a
    /// mistyped key paired with a name fails loudly instead of silently
    /// resolving to the wrong taxon.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        identity: &TaxonIdentity,
        canonical_hint: Option<&str>,
    ) -> Result<Resolution> {
        match identity {
            TaxonIdentity::ByKey(key) => {
                let count: i64 =
                    sqlx::query_scalar("SELECT count(*) FROM taxon WHERE backbone_key = $1")
                        .bind(key)
                        .fetch_one(&self.db)
                        .await?;

                match count {
                    0 => Ok(Resolution::Absent(MatchMode::Key)),
                    1 => {
                        let (id, name): (TaxonId, String) =
                            sqlx::query_as("SELECT id, name FROM taxon WHERE backbone_key = $1")
                                .bind(key)
                                .fetch_one(&self.db)
                                .await?;

                        if let Some(hint) = canonical_hint {
                            let similarity = strsim::normalized_levenshtein(&name, hint);
                            if similarity < NAME_SIMILARITY_THRESHOLD {
                                debug!(stored = %name, supplied = %hint, similarity, "Name check failed");
                                return Err(EngineError::NameMismatch {
                                    stored: name,
                                    supplied: hint.to_string(),
                                });
                            }
                        }

                        Ok(Resolution::Present(id))
                    },
                    n => Err(EngineError::integrity(format!(
                        "backbone key {key} appears {n} times in the store; it must be unique"
                    ))),
                }
            },
            TaxonIdentity::ByScientificName(name) => {
                let count: i64 =
                    sqlx::query_scalar("SELECT count(*) FROM taxon WHERE name_auth = $1")
                        .bind(name)
                        .fetch_one(&self.db)
                        .await?;

                match count {
                    0 => Ok(Resolution::Absent(MatchMode::ScientificName)),
                    1 => {
                        let id: TaxonId =
                            sqlx::query_scalar("SELECT id FROM taxon WHERE name_auth = $1")
                                .bind(name)
                                .fetch_one(&self.db)
                                .await?;
                        Ok(Resolution::Present(id))
                    },
                    n => Err(EngineError::integrity(format!(
                        "scientific name '{name}' appears {n} times in the store"
                    ))),
                }
            },
            TaxonIdentity::ByCanonicalName(name) => {
                let count: i64 = sqlx::query_scalar("SELECT count(*) FROM taxon WHERE name = $1")
                    .bind(name)
                    .fetch_one(&self.db)
                    .await?;

                match count {
                    0 => Ok(Resolution::Absent(MatchMode::CanonicalName)),
                    1 => {
                        let id: TaxonId = sqlx::query_scalar("SELECT id FROM taxon WHERE name = $1")
                            .bind(name)
                            .fetch_one(&self.db)
                            .await?;
                        Ok(Resolution::Present(id))
                    },
                    n => Err(EngineError::ambiguous(format!(
                        "canonical name '{name}' matches {n} taxa; supply a scientific name \
                         or a backbone key to identify which one is meant"
                    ))),
                }
            },
        }
    }

    /// Map a taxon id to its accepted id: the synonym target for synonym
    /// rows, the row itself otherwise.
    pub async fn accepted_id(&self, id: TaxonId) -> Result<TaxonId> {
        let accepted: TaxonId =
            sqlx::query_scalar("SELECT COALESCE(synonym_of_id, id) FROM taxon WHERE id = $1")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        Ok(accepted)
    }
}
