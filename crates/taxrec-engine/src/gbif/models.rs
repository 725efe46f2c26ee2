//! Wire models for the GBIF backbone service
//!
//! Field names follow the GBIF v1 API (camelCase); every field is optional
//! because the API omits what it does not know.

use serde::{Deserialize, Serialize};

use crate::models::BackboneKey;

/// Match classification reported by the name-matching endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchType {
    #[serde(rename = "EXACT")]
    Exact,
    #[serde(rename = "FUZZY")]
    Fuzzy,
    #[serde(rename = "HIGHERRANK")]
    HigherRank,
    #[serde(rename = "AGGREGATE")]
    Aggregate,
    #[default]
    #[serde(rename = "NONE", other)]
    None,
}

/// A full name-usage record (`/species/{key}`, elements of
/// `/species/{key}/parents` and `/species/{key}/synonyms`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackboneUsage {
    pub key: Option<BackboneKey>,
    pub nub_key: Option<BackboneKey>,
    pub canonical_name: Option<String>,
    pub scientific_name: Option<String>,
    pub authorship: Option<String>,
    pub rank: Option<String>,
    pub taxonomic_status: Option<String>,
    pub parent_key: Option<BackboneKey>,
    pub parent: Option<String>,
    pub synonym: bool,
    pub accepted_key: Option<BackboneKey>,
    pub accepted: Option<String>,
}

/// Response of the name-matching endpoint (`/species/match`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NameMatch {
    pub match_type: MatchType,
    pub confidence: Option<i32>,
    pub usage_key: Option<BackboneKey>,
    pub accepted_usage_key: Option<BackboneKey>,
    pub canonical_name: Option<String>,
    pub scientific_name: Option<String>,
    pub rank: Option<String>,
    pub status: Option<String>,
    pub synonym: bool,
}

/// Response of the name-parsing endpoints (`/parser/name`,
/// `/species/{key}/name`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedName {
    pub parsed: bool,
    pub scientific_name: Option<String>,
    pub canonical_name: Option<String>,
    pub canonical_name_with_marker: Option<String>,
    pub canonical_name_complete: Option<String>,
    pub rank_marker: Option<String>,
    pub genus_or_above: Option<String>,
    pub specific_epithet: Option<String>,
    pub authorship: Option<String>,
}

/// Paged listing envelope used by `/species/{key}/synonyms`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsagePage {
    pub results: Vec<BackboneUsage>,
    pub end_of_records: bool,
}

/// The merged view of a backbone lookup consumed by the formatter and the
/// orchestrator: name-match fields overlaid with the full usage record,
/// plus the parsed-name correction for infraspecific ranks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonInfo {
    /// Whether the backbone confirmed the taxon
    pub found: bool,
    pub key: Option<BackboneKey>,
    pub canonical_name: Option<String>,
    pub scientific_name: Option<String>,
    pub authorship: Option<String>,
    pub rank: Option<String>,
    pub status: Option<String>,
    pub parent_key: Option<BackboneKey>,
    pub parent: Option<String>,
    pub synonym: bool,
    /// Accepted usage the backbone points to, when this taxon is a synonym
    pub accepted_key: Option<BackboneKey>,
    pub accepted_name: Option<String>,
}

impl TaxonInfo {
    /// Build from a full usage record (key-based lookups)
    pub fn from_usage(usage: BackboneUsage, found: bool) -> Self {
        Self {
            found,
            key: usage.key.or(usage.nub_key),
            canonical_name: usage.canonical_name,
            scientific_name: usage.scientific_name,
            authorship: usage.authorship,
            rank: usage.rank,
            status: usage.taxonomic_status,
            parent_key: usage.parent_key,
            parent: usage.parent,
            synonym: usage.synonym,
            accepted_key: usage.accepted_key,
            accepted_name: usage.accepted,
        }
    }

    /// Build from a name match merged with the usage record fetched for
    /// the matched key. Usage fields win where both are present; the
    /// accepted-usage reference of the match is kept because the usage
    /// record does not repeat it.
    pub fn from_match(name_match: NameMatch, usage: BackboneUsage) -> Self {
        let mut info = Self::from_usage(usage, true);
        info.key = info.key.or(name_match.usage_key);
        info.canonical_name = info.canonical_name.or(name_match.canonical_name);
        info.scientific_name = info.scientific_name.or(name_match.scientific_name);
        info.rank = info.rank.or(name_match.rank);
        info.status = info.status.or(name_match.status);
        info.synonym = info.synonym || name_match.synonym;
        info.accepted_key = name_match
            .accepted_usage_key
            .or(info.accepted_key);
        info
    }

    /// Build a not-found result preserving whatever the match reported
    pub fn not_found(name_match: NameMatch) -> Self {
        Self {
            found: false,
            key: name_match.usage_key,
            canonical_name: name_match.canonical_name,
            scientific_name: name_match.scientific_name,
            authorship: None,
            rank: name_match.rank,
            status: name_match.status,
            parent_key: None,
            parent: None,
            synonym: name_match.synonym,
            accepted_key: name_match.accepted_usage_key,
            accepted_name: None,
        }
    }

    /// Overlay the corrected name pair from a parsed name. Parsing inserts
    /// the rank marker that plain canonical names omit for infraspecific
    /// taxa.
    pub fn apply_parsed(&mut self, parsed: &ParsedName) {
        if let Some(canonical) = parsed
            .canonical_name_with_marker
            .clone()
            .or_else(|| parsed.canonical_name_complete.clone())
        {
            self.canonical_name = Some(canonical);
        }
        if let Some(scientific) = parsed.scientific_name.clone() {
            self.scientific_name = Some(scientific);
        }
    }

    /// View as a usage record, for appending to an ancestor list
    pub fn to_usage(&self) -> BackboneUsage {
        BackboneUsage {
            key: self.key,
            nub_key: None,
            canonical_name: self.canonical_name.clone(),
            scientific_name: self.scientific_name.clone(),
            authorship: self.authorship.clone(),
            rank: self.rank.clone(),
            taxonomic_status: self.status.clone(),
            parent_key: self.parent_key,
            parent: self.parent.clone(),
            synonym: self.synonym,
            accepted_key: self.accepted_key,
            accepted: self.accepted_name.clone(),
        }
    }
}
