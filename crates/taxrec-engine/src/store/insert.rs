//! Transactional insertion of taxon chains
//!
//! All writes of one reconciliation happen here, inside a single
//! transaction: missing ancestors root-first, the accepted taxon, and the
//! synonym row if there is one. Any failure rolls the whole unit back.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::{TaxonId, TaxonRecord};

/// The accepted taxon of an insertion: either a pre-resolved existing row
/// or a record still to be inserted.
#[derive(Debug, Clone)]
pub enum AcceptedTaxon {
    Present(TaxonId),
    Pending(TaxonRecord),
}

/// Performs the ordered, atomic insert of a reconciled taxon
pub struct InsertionEngine {
    db: PgPool,
}

impl InsertionEngine {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert the missing ancestors (root-first), the accepted taxon, and
    /// the synonym row, chaining each generated id into the next insert's
    /// `parent_id`. Returns the accepted taxon's id.
    #[tracing::instrument(skip_all, fields(ancestors = ancestors.len(), has_synonym = synonym.is_some()))]
    pub async fn insert_chain(
        &self,
        existing_parent: Option<TaxonId>,
        ancestors: &[TaxonRecord],
        accepted: AcceptedTaxon,
        synonym: Option<&TaxonRecord>,
    ) -> Result<TaxonId> {
        let mut tx = self.db.begin().await?;

        let mut parent = existing_parent;
        for record in ancestors {
            let id = Self::insert_one(&mut tx, record, parent, None).await?;
            debug!(name = %record.name, id, "Inserted ancestor");
            parent = Some(id);
        }

        let accepted_id = match accepted {
            AcceptedTaxon::Present(id) => id,
            AcceptedTaxon::Pending(record) => {
                let id = Self::insert_one(&mut tx, &record, parent, None).await?;
                debug!(name = %record.name, id, "Inserted accepted taxon");
                id
            },
        };

        if let Some(record) = synonym {
            let id = Self::insert_one(&mut tx, record, None, Some(accepted_id)).await?;
            debug!(name = %record.name, id, accepted_id, "Inserted synonym");
        }

        tx.commit().await?;

        Ok(accepted_id)
    }

    /// Insert a single row and return its generated id. A synonym row
    /// carries no parent; a hierarchy row carries no synonym link.
    async fn insert_one(
        tx: &mut Transaction<'_, Postgres>,
        record: &TaxonRecord,
        parent_id: Option<TaxonId>,
        synonym_of_id: Option<TaxonId>,
    ) -> Result<TaxonId> {
        // Blank authorship is stored as NULL.
        let auth = record
            .auth
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());

        let id = sqlx::query_scalar::<_, TaxonId>(
            r#"
            INSERT INTO taxon
                (name, name_auth, auth, rank, status, backbone_key, source, parent_id, synonym_of_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&record.name)
        .bind(&record.name_auth)
        .bind(auth)
        .bind(&record.rank)
        .bind(&record.status)
        .bind(record.backbone_key)
        .bind(&record.source)
        .bind(parent_id)
        .bind(synonym_of_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match &e {
            // A losing concurrent insert for the same backbone key lands
            // here; callers should re-run resolution.
            sqlx::Error::Database(db) if db.is_unique_violation() => EngineError::integrity(
                format!("duplicate insert for taxon '{}': {db}", record.name),
            ),
            _ => EngineError::from(e),
        })?;

        Ok(id)
    }
}
