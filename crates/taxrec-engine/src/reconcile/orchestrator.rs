//! The reconciliation workflow
//!
//! One submission runs through: identity resolution (short-circuit if the
//! taxon is already stored), backbone matching, synonymy determination
//! (recursing through resolution and matching for the accepted taxon),
//! record formatting, ancestor-chain discovery, and a single transactional
//! insert. Any error aborts before the first write or rolls the
//! transaction back; no partial chain is ever committed.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::gbif::{BackboneClient, BackboneMatcher, BackboneUsage, TaxonInfo};
use crate::models::{
    MatchMode, Resolution, TaxonId, TaxonIdentity, TaxonRecord, TaxonRef, TaxonSubmission,
};
use crate::reconcile::format::{ManualFields, RecordFormatter};
use crate::reconcile::parents::ParentChainBuilder;
use crate::store::{AcceptedTaxon, IdentityResolver, InsertionEngine, RankTable};

/// How the accepted taxon of a synonym resolved
enum AcceptedState {
    /// Already stored under this id
    Present(TaxonId),
    /// Not stored; the backbone lookup result (confirmed or not) and the
    /// original target fields for the manual fallback
    Absent {
        info: TaxonInfo,
        target: TaxonRef,
    },
}

/// Composes the reconciliation components into the single workflow
/// exposed to callers.
pub struct Reconciler {
    backbone: BackboneClient,
    ranks: RankTable,
    identity: IdentityResolver,
    inserter: InsertionEngine,
}

impl Reconciler {
    /// Create a reconciler, loading the rank reference table from the store
    pub async fn new(db: PgPool, backbone: BackboneClient) -> Result<Self> {
        let ranks = RankTable::load(&db).await?;
        Ok(Self::with_rank_table(db, backbone, ranks))
    }

    /// Create a reconciler with an already-loaded rank table
    pub fn with_rank_table(db: PgPool, backbone: BackboneClient, ranks: RankTable) -> Self {
        Self {
            backbone,
            ranks,
            identity: IdentityResolver::new(db.clone()),
            inserter: InsertionEngine::new(db),
        }
    }

    /// Reconcile one submitted taxon and return the accepted taxon's id.
    ///
    /// When the submission resolves to an existing synonym row, the stored
    /// accepted id is returned, not the synonym row's own id.
    #[tracing::instrument(skip(self, submission))]
    pub async fn submit(&self, submission: TaxonSubmission) -> Result<TaxonId> {
        let resolution = self
            .identity
            .resolve(&submission.identity, submission.canonical_name())
            .await?;

        let mode = match resolution {
            Resolution::Present(id) => {
                debug!(id, "Taxon already stored");
                return self.identity.accepted_id(id).await;
            },
            Resolution::Absent(mode) => mode,
        };

        let matcher = BackboneMatcher::new(&self.backbone);
        let subject = Self::subject_ref(&submission);
        let info = matcher.match_taxon(mode, &subject).await?;

        // The submitted name may have missed a taxon the store already
        // holds under its backbone key.
        if info.found {
            if let Some(key) = info.key {
                if let Resolution::Present(id) = self
                    .identity
                    .resolve(&TaxonIdentity::ByKey(key), None)
                    .await?
                {
                    debug!(key, id, "Matched key already stored");
                    return self.identity.accepted_id(id).await;
                }
            }
        }

        // Synonymy: the backbone's verdict wins; caller-supplied synonym
        // fields only apply when the backbone knows nothing.
        let synonym_target: Option<TaxonRef> = if info.found && info.synonym {
            Some(TaxonRef {
                backbone_key: info.accepted_key,
                scientific_name: info.accepted_name.clone(),
                canonical_name: None,
            })
        } else if !info.found {
            submission
                .hints
                .synonym_of
                .clone()
                .filter(|target| !target.is_empty())
        } else {
            None
        };

        let formatter = RecordFormatter::new(&self.ranks, &self.backbone);

        if let Some(target) = synonym_target {
            let (synonym_record, _) = if info.found {
                formatter.from_backbone(&info, true).await?
            } else {
                formatter
                    .from_manual(&Self::manual_fields(&submission), true)
                    .await?
            };

            match self.resolve_accepted(&matcher, &target).await? {
                AcceptedState::Present(accepted_id) => {
                    // The accepted taxon exists: no chain to build, only
                    // the synonym row goes in.
                    let id = self
                        .inserter
                        .insert_chain(
                            None,
                            &[],
                            AcceptedTaxon::Present(accepted_id),
                            Some(&synonym_record),
                        )
                        .await?;
                    info!(accepted_id = id, "Synonym linked to existing accepted taxon");
                    Ok(id)
                },
                AcceptedState::Absent { info: accepted_info, target } => {
                    let (accepted_record, parent_ref) = if accepted_info.found {
                        formatter.from_backbone(&accepted_info, false).await?
                    } else {
                        formatter
                            .from_manual(&Self::manual_fields_from_ref(&target), false)
                            .await?
                    };

                    self.insert_with_chain(accepted_record, parent_ref, Some(synonym_record))
                        .await
                },
            }
        } else {
            let (accepted_record, parent_ref) = if info.found {
                formatter.from_backbone(&info, false).await?
            } else {
                formatter
                    .from_manual(&Self::manual_fields(&submission), false)
                    .await?
            };

            self.insert_with_chain(accepted_record, parent_ref, None).await
        }
    }

    /// Resolve the accepted taxon of a synonym: store first, backbone
    /// second, with the same recheck-by-key as the main flow.
    async fn resolve_accepted(
        &self,
        matcher: &BackboneMatcher<'_>,
        target: &TaxonRef,
    ) -> Result<AcceptedState> {
        let identity = target.identity().ok_or_else(|| {
            EngineError::insufficient("synonym target carries no identifier")
        })?;

        let mode = match self
            .identity
            .resolve(&identity, target.canonical_name.as_deref())
            .await?
        {
            Resolution::Present(id) => return Ok(AcceptedState::Present(id)),
            Resolution::Absent(mode) => mode,
        };

        let info = matcher.match_taxon(mode, target).await?;

        if info.found {
            if let Some(key) = info.key {
                if let Resolution::Present(id) = self
                    .identity
                    .resolve(&TaxonIdentity::ByKey(key), None)
                    .await?
                {
                    return Ok(AcceptedState::Present(id));
                }
            }
        }

        Ok(AcceptedState::Absent {
            info,
            target: target.clone(),
        })
    }

    /// Discover the ancestor chain for an accepted record and run the
    /// transactional insert.
    async fn insert_with_chain(
        &self,
        accepted: TaxonRecord,
        parent_ref: TaxonRef,
        synonym: Option<TaxonRecord>,
    ) -> Result<TaxonId> {
        let (existing_parent, pending) = self.resolve_parent_chain(&accepted, &parent_ref).await?;

        let id = self
            .inserter
            .insert_chain(
                existing_parent,
                &pending,
                AcceptedTaxon::Pending(accepted),
                synonym.as_ref(),
            )
            .await?;

        info!(accepted_id = id, created_ancestors = pending.len(), "Taxon reconciled");
        Ok(id)
    }

    /// Locate the immediate parent in the store, or work out which
    /// ancestors must be created first.
    async fn resolve_parent_chain(
        &self,
        accepted: &TaxonRecord,
        parent_ref: &TaxonRef,
    ) -> Result<(Option<TaxonId>, Vec<TaxonRecord>)> {
        let resolution = match parent_ref.identity() {
            Some(identity) => {
                self.identity
                    .resolve(&identity, parent_ref.canonical_name.as_deref())
                    .await?
            },
            // A backbone-confirmed taxon needs no explicit parent
            // reference; its chain is discoverable by key.
            None if accepted.backbone_key.is_some() => Resolution::Absent(MatchMode::Key),
            None => {
                return Err(EngineError::ParentNotFound(format!(
                    "no parent information available for '{}'",
                    accepted.name
                )))
            },
        };

        let mode = match resolution {
            Resolution::Present(id) => return Ok((Some(id), Vec::new())),
            Resolution::Absent(mode) => mode,
        };

        let ancestors: Vec<BackboneUsage> = if let Some(key) = accepted.backbone_key {
            self.backbone.parents(key).await?
        } else {
            // Manual record: the parent itself must be locatable in the
            // backbone, and its own ancestors come with it.
            let matcher = BackboneMatcher::new(&self.backbone);
            let parent_info = matcher.match_taxon(mode, parent_ref).await?;
            if !parent_info.found {
                return Err(EngineError::ParentNotFound(format!(
                    "parent of '{}' was not found in the backbone",
                    accepted.name
                )));
            }
            let parent_key = parent_info.key.ok_or_else(|| {
                EngineError::ParentNotFound(format!(
                    "backbone parent of '{}' carries no usage key",
                    accepted.name
                ))
            })?;

            let mut list = self.backbone.parents(parent_key).await?;
            list.push(parent_info.to_usage());
            list
        };

        let builder = ParentChainBuilder::new(&self.identity, &self.ranks);
        builder.build(&ancestors).await
    }

    /// The submission's identifiers as a loose reference for the matcher
    fn subject_ref(submission: &TaxonSubmission) -> TaxonRef {
        TaxonRef {
            backbone_key: submission.backbone_key(),
            scientific_name: submission.scientific_name().map(str::to_string),
            canonical_name: submission.canonical_name().map(str::to_string),
        }
    }

    /// Manual formatting input assembled from a submission
    fn manual_fields(submission: &TaxonSubmission) -> ManualFields {
        ManualFields {
            canonical_name: submission.canonical_name().map(str::to_string),
            scientific_name: submission.scientific_name().map(str::to_string),
            rank: submission.hints.rank.clone(),
            authorship: submission.hints.authorship.clone(),
            source: submission.hints.source.clone(),
            parent: submission.hints.parent.clone(),
        }
    }

    /// Manual formatting input for a synonym target known only by its
    /// identifiers
    fn manual_fields_from_ref(target: &TaxonRef) -> ManualFields {
        ManualFields {
            canonical_name: target.canonical_name.clone(),
            scientific_name: target.scientific_name.clone(),
            ..ManualFields::default()
        }
    }
}
