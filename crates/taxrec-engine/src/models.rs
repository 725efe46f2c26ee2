//! Domain models: stored taxa, pending records, and submissions

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Store-generated surrogate key of a taxon row
pub type TaxonId = i32;

/// External identifier in the backbone service
pub type BackboneKey = i64;

/// Taxonomic status of an accepted name
pub const STATUS_ACCEPTED: &str = "ACCEPTED";
/// Taxonomic status of a synonym row
pub const STATUS_SYNONYM: &str = "SYNONYM";
/// Status assigned to manual records the backbone does not know
pub const STATUS_DOUBTFUL: &str = "DOUBTFUL";

/// A persisted taxon row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Taxon {
    pub id: TaxonId,
    /// Canonical name, no authorship (e.g. "Panthera leo")
    pub name: String,
    /// Full scientific name including authorship
    pub name_auth: String,
    /// Authorship string, when separable from the name
    pub auth: Option<String>,
    /// Canonical rank name from the rank reference table
    pub rank: String,
    pub status: String,
    /// Immediate parent; null for the hierarchy root and for synonyms
    pub parent_id: Option<TaxonId>,
    /// Accepted taxon this row is a synonym of; null for non-synonyms
    pub synonym_of_id: Option<TaxonId>,
    /// Backbone identifier, unique when present
    pub backbone_key: Option<BackboneKey>,
    /// Provenance marker for manually supplied taxa
    pub source: Option<String>,
}

/// A formatted taxon ready for insertion. Parent and synonym links are
/// wired by the insertion engine, not carried here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonRecord {
    pub name: String,
    pub name_auth: String,
    pub auth: Option<String>,
    pub rank: String,
    pub status: String,
    pub backbone_key: Option<BackboneKey>,
    pub source: Option<String>,
}

/// How the backbone should be queried for a taxon the store does not hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    Key,
    ScientificName,
    CanonicalName,
}

/// Outcome of identity resolution against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The taxon exists; carries its store id
    Present(TaxonId),
    /// The taxon is absent; carries the backbone match mode to use next
    Absent(MatchMode),
}

impl Resolution {
    /// Store id when present
    pub fn id(&self) -> Option<TaxonId> {
        match self {
            Resolution::Present(id) => Some(*id),
            Resolution::Absent(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Resolution::Present(_))
    }
}

/// Tagged identity of a submitted taxon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxonIdentity {
    ByKey(BackboneKey),
    ByScientificName(String),
    ByCanonicalName(String),
}

/// Loose reference to a taxon by any combination of identifiers.
/// Used for parent references and synonym targets, where callers may
/// supply several identifiers at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonRef {
    pub backbone_key: Option<BackboneKey>,
    pub scientific_name: Option<String>,
    pub canonical_name: Option<String>,
}

impl TaxonRef {
    pub fn by_key(key: BackboneKey) -> Self {
        Self {
            backbone_key: Some(key),
            ..Self::default()
        }
    }

    pub fn by_scientific_name(name: impl Into<String>) -> Self {
        Self {
            scientific_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_canonical_name(name: impl Into<String>) -> Self {
        Self {
            canonical_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.backbone_key.is_none()
            && self.scientific_name.is_none()
            && self.canonical_name.is_none()
    }

    /// Tagged identity, priority key > scientific name > canonical name
    pub fn identity(&self) -> Option<TaxonIdentity> {
        if let Some(key) = self.backbone_key {
            Some(TaxonIdentity::ByKey(key))
        } else if let Some(ref sci) = self.scientific_name {
            Some(TaxonIdentity::ByScientificName(sci.clone()))
        } else {
            self.canonical_name
                .as_ref()
                .map(|name| TaxonIdentity::ByCanonicalName(name.clone()))
        }
    }
}

/// Optional structured data accompanying a submission: extra names,
/// rank and authorship, provenance, parent reference, synonym target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonHints {
    pub canonical_name: Option<String>,
    pub scientific_name: Option<String>,
    /// Free-form rank token: canonical rank name, user code, or marker
    pub rank: Option<String>,
    pub authorship: Option<String>,
    /// Provenance marker stored with manual records
    pub source: Option<String>,
    /// Explicit parent reference for manual records
    pub parent: TaxonRef,
    /// Accepted taxon this submission is a synonym of, when the caller
    /// knows the synonymy and the backbone may not
    pub synonym_of: Option<TaxonRef>,
}

/// A taxon submitted for reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonSubmission {
    pub identity: TaxonIdentity,
    pub hints: TaxonHints,
}

impl TaxonSubmission {
    /// Build a submission from loose identifier fields, applying the
    /// key > scientific name > canonical name priority. Fails when no
    /// identifier is supplied at all.
    pub fn from_fields(fields: TaxonRef, hints: TaxonHints) -> Result<Self> {
        let identity = fields.identity().ok_or_else(|| {
            EngineError::insufficient(
                "a backbone key, scientific name, or canonical name is required \
                 to identify the taxon",
            )
        })?;

        // Names not chosen as the identity stay available as hints.
        let mut hints = hints;
        if hints.scientific_name.is_none() {
            if let TaxonIdentity::ByKey(_) = identity {
                hints.scientific_name = fields.scientific_name;
            }
        }
        if hints.canonical_name.is_none()
            && !matches!(identity, TaxonIdentity::ByCanonicalName(_))
        {
            hints.canonical_name = fields.canonical_name;
        }

        Ok(Self { identity, hints })
    }

    pub fn by_key(key: BackboneKey) -> Self {
        Self {
            identity: TaxonIdentity::ByKey(key),
            hints: TaxonHints::default(),
        }
    }

    pub fn by_scientific_name(name: impl Into<String>) -> Self {
        Self {
            identity: TaxonIdentity::ByScientificName(name.into()),
            hints: TaxonHints::default(),
        }
    }

    pub fn by_canonical_name(name: impl Into<String>) -> Self {
        Self {
            identity: TaxonIdentity::ByCanonicalName(name.into()),
            hints: TaxonHints::default(),
        }
    }

    pub fn with_hints(mut self, hints: TaxonHints) -> Self {
        self.hints = hints;
        self
    }

    /// Canonical name from the identity or the hints
    pub fn canonical_name(&self) -> Option<&str> {
        match &self.identity {
            TaxonIdentity::ByCanonicalName(name) => Some(name),
            _ => self.hints.canonical_name.as_deref(),
        }
    }

    /// Scientific name from the identity or the hints
    pub fn scientific_name(&self) -> Option<&str> {
        match &self.identity {
            TaxonIdentity::ByScientificName(name) => Some(name),
            _ => self.hints.scientific_name.as_deref(),
        }
    }

    /// Backbone key when the submission is keyed
    pub fn backbone_key(&self) -> Option<BackboneKey> {
        match self.identity {
            TaxonIdentity::ByKey(key) => Some(key),
            _ => None,
        }
    }
}
