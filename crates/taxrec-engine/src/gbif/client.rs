//! HTTP client for the GBIF backbone service
//!
//! One thin method per collaborator operation; no retry or caching here,
//! callers needing resilience wrap invocations themselves.

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::gbif::config::GbifConfig;
use crate::gbif::models::{BackboneUsage, NameMatch, ParsedName, UsagePage};
use crate::models::BackboneKey;

/// Client for the backbone lookup service
#[derive(Debug)]
pub struct BackboneClient {
    client: Client,
    config: GbifConfig,
}

impl BackboneClient {
    /// Create a new client with the given configuration
    pub fn new(config: GbifConfig) -> Result<Self> {
        config
            .validate()
            .map_err(EngineError::Configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(BackboneClient { client, config })
    }

    /// Fetch the full name-usage record for a backbone key
    pub async fn usage(&self, key: BackboneKey) -> Result<BackboneUsage> {
        let url = format!("{}/species/{}", self.config.base_url, key);
        debug!(key, "Fetching backbone usage");

        let usage = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(usage)
    }

    /// Match a canonical name against the backbone
    pub async fn match_name(&self, name: &str) -> Result<NameMatch> {
        let url = format!("{}/species/match", self.config.base_url);
        debug!(name, "Matching canonical name");

        let matched = self
            .client
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(matched)
    }

    /// Match a full scientific name (with authorship) against the backbone
    pub async fn match_scientific_name(&self, name: &str) -> Result<NameMatch> {
        let url = format!("{}/species/match", self.config.base_url);
        debug!(name, "Matching scientific name");

        let matched = self
            .client
            .get(&url)
            .query(&[("name", name), ("strict", "false")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(matched)
    }

    /// Ordered ancestor list for a key, root-first, ending with the
    /// immediate parent
    pub async fn parents(&self, key: BackboneKey) -> Result<Vec<BackboneUsage>> {
        let url = format!("{}/species/{}/parents", self.config.base_url, key);
        debug!(key, "Fetching backbone parents");

        let parents = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parents)
    }

    /// Parsed name components for a known usage key
    pub async fn parsed_name(&self, key: BackboneKey) -> Result<ParsedName> {
        let url = format!("{}/species/{}/name", self.config.base_url, key);
        debug!(key, "Fetching parsed name by key");

        let parsed = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parsed)
    }

    /// Run a free-form name through the backbone name parser.
    /// Returns `None` when the parser produced no result at all.
    pub async fn parse_name(&self, name: &str) -> Result<Option<ParsedName>> {
        let url = format!("{}/parser/name", self.config.base_url);
        debug!(name, "Parsing name");

        let mut results: Vec<ParsedName> = self
            .client
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if results.is_empty() {
            Ok(None)
        } else {
            Ok(Some(results.swap_remove(0)))
        }
    }

    /// Synonym records registered for a key
    pub async fn synonyms(&self, key: BackboneKey) -> Result<Vec<BackboneUsage>> {
        let url = format!("{}/species/{}/synonyms", self.config.base_url, key);
        debug!(key, "Fetching backbone synonyms");

        let page: UsagePage = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(page.results)
    }

    /// Get configuration
    pub fn config(&self) -> &GbifConfig {
        &self.config
    }
}
