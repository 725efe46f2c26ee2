//! Backbone matching with acceptance rules
//!
//! Name matches are only trusted when the backbone classifies them as
//! exact or reports a confidence of at least 90; anything weaker is
//! treated as "not found" and left for the manual-input path.

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::gbif::client::BackboneClient;
use crate::gbif::models::{MatchType, NameMatch, TaxonInfo};
use crate::models::{MatchMode, TaxonRef};

/// Minimum confidence for accepting a non-exact name match
pub const MATCH_CONFIDENCE_THRESHOLD: i32 = 90;

/// Ranks whose plain canonical names omit the rank marker; records at
/// these ranks are re-derived through the backbone name parser.
const MARKED_RANKS: &[&str] = &[
    "SUBSPECIES",
    "VARIETY",
    "FORM",
    "SUBVARIETY",
    "SUPERSPECIES",
    "SUBGENUS",
    "TRIBE",
];

/// Matches submitted taxa against the backbone service
pub struct BackboneMatcher<'a> {
    client: &'a BackboneClient,
}

impl<'a> BackboneMatcher<'a> {
    pub fn new(client: &'a BackboneClient) -> Self {
        Self { client }
    }

    /// Match a taxon the store does not hold. Key-based lookups are always
    /// confirmed; name-based lookups go through the acceptance rule. The
    /// returned info always carries the `found` flag.
    #[tracing::instrument(skip(self, subject))]
    pub async fn match_taxon(&self, mode: MatchMode, subject: &TaxonRef) -> Result<TaxonInfo> {
        let mut info = match mode {
            MatchMode::Key => {
                let key = subject.backbone_key.ok_or_else(|| {
                    EngineError::insufficient("key-based backbone lookup without a key")
                })?;
                let usage = self.client.usage(key).await?;
                TaxonInfo::from_usage(usage, true)
            },
            MatchMode::CanonicalName => {
                let name = subject.canonical_name.as_deref().ok_or_else(|| {
                    EngineError::insufficient("canonical-name lookup without a name")
                })?;
                let matched = self.client.match_name(name).await?;
                self.accept(matched).await?
            },
            MatchMode::ScientificName => {
                let name = subject.scientific_name.as_deref().ok_or_else(|| {
                    EngineError::insufficient("scientific-name lookup without a name")
                })?;
                let matched = self.client.match_scientific_name(name).await?;
                self.accept(matched).await?
            },
        };

        if info.found {
            self.correct_marked_rank(&mut info).await?;
        }

        Ok(info)
    }

    /// Apply the acceptance rule to a name match and, on acceptance, merge
    /// in the full usage record for the matched key.
    async fn accept(&self, matched: NameMatch) -> Result<TaxonInfo> {
        let confident = matched
            .confidence
            .is_some_and(|c| c >= MATCH_CONFIDENCE_THRESHOLD);
        let accepted =
            matched.match_type != MatchType::None
                && (matched.match_type == MatchType::Exact || confident);

        if !accepted {
            debug!(
                match_type = ?matched.match_type,
                confidence = ?matched.confidence,
                "Backbone match rejected"
            );
            return Ok(TaxonInfo::not_found(matched));
        }

        let key = matched.usage_key.ok_or_else(|| {
            EngineError::insufficient("accepted backbone match carries no usage key")
        })?;
        let usage = self.client.usage(key).await?;

        Ok(TaxonInfo::from_match(matched, usage))
    }

    /// Re-derive the canonical/scientific name pair for ranks whose
    /// canonical name needs a marker.
    async fn correct_marked_rank(&self, info: &mut TaxonInfo) -> Result<()> {
        let marked = info
            .rank
            .as_deref()
            .is_some_and(|rank| MARKED_RANKS.contains(&rank));
        if !marked {
            return Ok(());
        }

        let Some(scientific) = info.scientific_name.clone() else {
            return Ok(());
        };

        if let Some(parsed) = self.client.parse_name(&scientific).await? {
            info.apply_parsed(&parsed);
        }

        Ok(())
    }
}
