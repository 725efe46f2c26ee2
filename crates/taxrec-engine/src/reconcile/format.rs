//! Record formatting
//!
//! Produces the canonical `(TaxonRecord, parent reference)` pair from
//! either a confirmed backbone record or manually supplied fields. Manual
//! records the backbone does not know are inherently unverified and are
//! stored as DOUBTFUL unless flagged as synonyms.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::gbif::{BackboneClient, TaxonInfo};
use crate::models::{TaxonRecord, TaxonRef, STATUS_DOUBTFUL, STATUS_SYNONYM};
use crate::store::{RankTable, RANK_LEVEL_SPECIES};

/// Manually supplied fields for a taxon the backbone does not confirm
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualFields {
    pub canonical_name: Option<String>,
    pub scientific_name: Option<String>,
    /// Free-form rank token
    pub rank: Option<String>,
    pub authorship: Option<String>,
    /// Provenance marker stored with the row
    pub source: Option<String>,
    /// Explicit parent reference, when the caller knows it
    pub parent: TaxonRef,
}

/// Formats taxon records from backbone data or manual input
pub struct RecordFormatter<'a> {
    ranks: &'a RankTable,
    backbone: &'a BackboneClient,
}

impl<'a> RecordFormatter<'a> {
    pub fn new(ranks: &'a RankTable, backbone: &'a BackboneClient) -> Self {
        Self { ranks, backbone }
    }

    /// Format a record from a confirmed backbone lookup. Infraspecific
    /// records are re-parsed by key so the stored canonical name carries
    /// its rank marker.
    pub async fn from_backbone(
        &self,
        info: &TaxonInfo,
        as_synonym: bool,
    ) -> Result<(TaxonRecord, TaxonRef)> {
        let rank_token = info
            .rank
            .as_deref()
            .ok_or_else(|| EngineError::insufficient("backbone record carries no rank"))?;
        let rank = self.ranks.resolve(rank_token)?;

        let key = info
            .key
            .ok_or_else(|| EngineError::insufficient("backbone record carries no usage key"))?;

        let (name, name_auth) = if rank.is_infraspecific() {
            let parsed = self.backbone.parsed_name(key).await?;
            let name = parsed
                .canonical_name_with_marker
                .or(parsed.canonical_name_complete)
                .or_else(|| info.canonical_name.clone())
                .ok_or_else(|| {
                    EngineError::insufficient("backbone record carries no canonical name")
                })?;
            let name_auth = parsed
                .scientific_name
                .or_else(|| info.scientific_name.clone())
                .ok_or_else(|| {
                    EngineError::insufficient("backbone record carries no scientific name")
                })?;
            (name, name_auth)
        } else {
            let name = info.canonical_name.clone().ok_or_else(|| {
                EngineError::insufficient("backbone record carries no canonical name")
            })?;
            let name_auth = info.scientific_name.clone().ok_or_else(|| {
                EngineError::insufficient("backbone record carries no scientific name")
            })?;
            (name, name_auth)
        };

        let status = if as_synonym {
            STATUS_SYNONYM.to_string()
        } else {
            info.status
                .clone()
                .unwrap_or_else(|| STATUS_DOUBTFUL.to_string())
        };

        let record = TaxonRecord {
            name,
            name_auth,
            auth: info.authorship.clone(),
            rank: rank.rank_name.clone(),
            status,
            backbone_key: Some(key),
            source: None,
        };

        let parent = TaxonRef {
            backbone_key: info.parent_key,
            scientific_name: None,
            canonical_name: info.parent.clone(),
        };

        Ok((record, parent))
    }

    /// Format a record from manual fields. When rank, both names, and a
    /// parent (or synonym flag) are all supplied the fields are used as
    /// given; otherwise the name is run through the backbone parser to
    /// fill the gaps.
    pub async fn from_manual(
        &self,
        fields: &ManualFields,
        as_synonym: bool,
    ) -> Result<(TaxonRecord, TaxonRef)> {
        let has_parent = !fields.parent.is_empty();
        let mut parent = fields.parent.clone();

        let complete = fields.rank.is_some()
            && fields.canonical_name.is_some()
            && fields.scientific_name.is_some()
            && (has_parent || as_synonym);

        let (name, name_auth, rank) = if complete {
            let rank = self.ranks.resolve(fields.rank.as_deref().unwrap_or_default())?;
            (
                fields.canonical_name.clone().unwrap_or_default(),
                fields.scientific_name.clone().unwrap_or_default(),
                rank,
            )
        } else {
            let raw = fields
                .scientific_name
                .as_deref()
                .or(fields.canonical_name.as_deref())
                .ok_or_else(|| EngineError::insufficient("no name supplied for the taxon"))?;

            let parsed = match self.backbone.parse_name(raw).await? {
                Some(parsed) if parsed.parsed => parsed,
                _ => {
                    return Err(EngineError::insufficient(format!(
                        "'{raw}' was not found in the backbone and could not be parsed; \
                         supply rank, names, and parent explicitly"
                    )))
                },
            };

            let name = parsed
                .canonical_name_with_marker
                .clone()
                .or_else(|| parsed.canonical_name.clone())
                .ok_or_else(|| {
                    EngineError::insufficient(format!("no canonical name derivable from '{raw}'"))
                })?;
            let name_auth = parsed
                .scientific_name
                .clone()
                .unwrap_or_else(|| raw.to_string());

            let rank = match fields.rank.as_deref() {
                Some(token) => self.ranks.resolve(token)?,
                None => {
                    let marker = parsed.rank_marker.as_deref().ok_or_else(|| {
                        EngineError::insufficient("no way to determine the taxon rank")
                    })?;
                    self.ranks.resolve(marker)?
                },
            };

            // Derive the parent from the parsed name when none was given:
            // infraspecies fall under genus + epithet, species under the
            // genus alone. Above species there is no sure derivation.
            if parent.is_empty() {
                if rank.rank_level > RANK_LEVEL_SPECIES {
                    let genus = parsed.genus_or_above.as_deref().ok_or_else(|| {
                        EngineError::insufficient("cannot derive the parent species")
                    })?;
                    let epithet = parsed.specific_epithet.as_deref().ok_or_else(|| {
                        EngineError::insufficient("cannot derive the parent species")
                    })?;
                    parent.canonical_name = Some(format!("{genus} {epithet}"));
                } else if rank.rank_level == RANK_LEVEL_SPECIES {
                    let genus = parsed.genus_or_above.clone().ok_or_else(|| {
                        EngineError::insufficient("cannot derive the parent genus")
                    })?;
                    parent.canonical_name = Some(genus);
                } else if !as_synonym {
                    return Err(EngineError::insufficient(
                        "no sure way to determine the parent taxon; supply it explicitly",
                    ));
                }
            }

            (name, name_auth, rank)
        };

        // Authorship: when not supplied and the canonical name is part of
        // the scientific name, the remainder is the authorship. Literal
        // substring removal, not a pattern.
        let auth = if fields.authorship.is_none() && name_auth.contains(name.as_str()) {
            let remainder = name_auth.replace(name.as_str(), "");
            let trimmed = remainder.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        } else {
            fields.authorship.clone()
        };

        let status = if as_synonym {
            STATUS_SYNONYM.to_string()
        } else {
            STATUS_DOUBTFUL.to_string()
        };

        let record = TaxonRecord {
            name,
            name_auth,
            auth,
            rank: rank.rank_name.clone(),
            status,
            backbone_key: None,
            source: fields.source.clone(),
        };

        Ok((record, parent))
    }
}
