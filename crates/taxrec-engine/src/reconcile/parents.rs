//! Ancestor chain discovery
//!
//! Walks a root-first ancestor list and decides which ancestors still need
//! to be created. Finding an ancestor already present resets the pending
//! list: everything at or above it is reachable through the store already,
//! only the more specific ancestors after it still need rows.

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::gbif::BackboneUsage;
use crate::models::{Resolution, TaxonId, TaxonIdentity, TaxonRecord, STATUS_ACCEPTED};
use crate::store::{IdentityResolver, RankTable};

/// Builds the list of missing ancestors for one insertion
pub struct ParentChainBuilder<'a> {
    identity: &'a IdentityResolver,
    ranks: &'a RankTable,
}

impl<'a> ParentChainBuilder<'a> {
    pub fn new(identity: &'a IdentityResolver, ranks: &'a RankTable) -> Self {
        Self { identity, ranks }
    }

    /// Scan a root-first ancestor list (ending with the immediate parent)
    /// and return the deepest already-present ancestor id plus the records
    /// to create below it, still root-first.
    #[tracing::instrument(skip_all, fields(ancestors = ancestors.len()))]
    pub async fn build(
        &self,
        ancestors: &[BackboneUsage],
    ) -> Result<(Option<TaxonId>, Vec<TaxonRecord>)> {
        let mut existing: Option<TaxonId> = None;
        let mut pending: Vec<TaxonRecord> = Vec::new();
        let mut last_level: Option<i32> = None;

        for ancestor in ancestors {
            let key = ancestor.key.ok_or_else(|| {
                EngineError::insufficient("backbone ancestor carries no usage key")
            })?;

            let rank_token = ancestor.rank.as_deref().ok_or_else(|| {
                EngineError::insufficient(format!("backbone ancestor {key} carries no rank"))
            })?;
            let rank = self.ranks.resolve(rank_token)?;

            // The backbone promises a root-first, strictly rank-descending
            // list. Verify rather than insert a cycle-prone chain.
            if last_level.is_some_and(|level| rank.rank_level <= level) {
                return Err(EngineError::integrity(format!(
                    "ancestor list is not root-first at '{}'",
                    ancestor.canonical_name.as_deref().unwrap_or("?")
                )));
            }
            last_level = Some(rank.rank_level);

            match self.identity.resolve(&TaxonIdentity::ByKey(key), None).await? {
                Resolution::Present(id) => {
                    debug!(key, id, "Ancestor already present");
                    existing = Some(id);
                    pending.clear();
                },
                Resolution::Absent(_) => {
                    let name = ancestor.canonical_name.clone().ok_or_else(|| {
                        EngineError::insufficient(format!(
                            "backbone ancestor {key} carries no canonical name"
                        ))
                    })?;
                    let name_auth = ancestor
                        .scientific_name
                        .clone()
                        .unwrap_or_else(|| name.clone());

                    pending.push(TaxonRecord {
                        name,
                        name_auth,
                        auth: ancestor.authorship.clone(),
                        rank: rank.rank_name.clone(),
                        status: ancestor
                            .taxonomic_status
                            .clone()
                            .unwrap_or_else(|| STATUS_ACCEPTED.to_string()),
                        backbone_key: Some(key),
                        source: None,
                    });
                },
            }
        }

        Ok((existing, pending))
    }
}
