pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::scholar::{PublicationRecord, PublicationSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert hit the uniqueness constraint on the publication id.
    #[error("Publication already stored: {0}")]
    Duplicate(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Store connection lock poisoned")]
    Poisoned,
}

/// Column values written by an upsert. `None` means "not provided": an
/// update leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublicationFields {
    pub title: Option<String>,
    pub link: Option<String>,
    pub authors: Option<String>,
    pub publication_date: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
}

impl From<&PublicationRecord> for PublicationFields {
    fn from(record: &PublicationRecord) -> Self {
        Self {
            title: record.title.clone(),
            link: record.link.clone(),
            authors: record.authors.clone(),
            publication_date: record.publication_date.clone(),
            source: record.source.clone(),
            description: record.description.clone(),
        }
    }
}

/// Profile rows carry no description.
impl From<&PublicationSummary> for PublicationFields {
    fn from(summary: &PublicationSummary) -> Self {
        Self {
            title: summary.title.clone(),
            link: summary.link.clone(),
            authors: summary.authors.clone(),
            publication_date: summary.publication_date.clone(),
            source: summary.source.clone(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationRow {
    pub id: i64,
    #[serde(rename = "publication_id")]
    pub canonical_id: String,
    #[serde(flatten)]
    pub fields: PublicationFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Relational store holding one row per publication id.
pub trait PublicationStore: Send + Sync {
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StoreError>;
}

/// A unit of work; dropping it without `commit` rolls back.
pub trait StoreTransaction {
    fn find_by_identifier(&mut self, canonical_id: &str) -> Result<Option<PublicationRow>, StoreError>;
    /// Must report a uniqueness violation as [`StoreError::Duplicate`].
    fn insert(&mut self, canonical_id: &str, fields: &PublicationFields) -> Result<(), StoreError>;
    fn update(
        &mut self,
        canonical_id: &str,
        fields: &PublicationFields,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated(DateTime<Utc>),
    /// Another writer inserted the same id between our lookup and our insert.
    LostRace,
}

/// Insert the publication, or update the existing row with the same id.
pub fn upsert_publication(
    store: &dyn PublicationStore,
    canonical_id: &str,
    fields: &PublicationFields,
) -> Result<UpsertOutcome, StoreError> {
    let mut tx = store.begin()?;
    let outcome = match tx.find_by_identifier(canonical_id)? {
        Some(_) => {
            let now = Utc::now();
            tx.update(canonical_id, fields, now)?;
            UpsertOutcome::Updated(now)
        }
        None => match tx.insert(canonical_id, fields) {
            Ok(()) => UpsertOutcome::Inserted,
            Err(StoreError::Duplicate(_)) => return Ok(UpsertOutcome::LostRace),
            Err(e) => return Err(e),
        },
    };
    tx.commit()?;
    Ok(outcome)
}

/// [`upsert_publication`] for the scrape path: failures are logged, never returned.
pub fn persist(
    store: &dyn PublicationStore,
    canonical_id: &str,
    fields: &PublicationFields,
) -> Option<UpsertOutcome> {
    match upsert_publication(store, canonical_id, fields) {
        Ok(outcome) => {
            match outcome {
                UpsertOutcome::Inserted => tracing::info!("Stored new publication {}", canonical_id),
                UpsertOutcome::Updated(_) => tracing::info!("Updated publication {}", canonical_id),
                UpsertOutcome::LostRace => tracing::warn!(
                    "Publication {} was inserted concurrently; dropping this write",
                    canonical_id
                ),
            }
            Some(outcome)
        }
        Err(e) => {
            tracing::error!("Failed to persist publication {}: {}", canonical_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always misses on lookup, then collides on insert.
    struct RacingStore;

    struct RacingTransaction;

    impl PublicationStore for RacingStore {
        fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StoreError> {
            Ok(Box::new(RacingTransaction))
        }
    }

    impl StoreTransaction for RacingTransaction {
        fn find_by_identifier(&mut self, _: &str) -> Result<Option<PublicationRow>, StoreError> {
            Ok(None)
        }
        fn insert(&mut self, canonical_id: &str, _: &PublicationFields) -> Result<(), StoreError> {
            Err(StoreError::Duplicate(canonical_id.to_string()))
        }
        fn update(&mut self, _: &str, _: &PublicationFields, _: DateTime<Utc>) -> Result<(), StoreError> {
            panic!("update must not run after a lost race");
        }
        fn commit(self: Box<Self>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct BrokenStore;

    impl PublicationStore for BrokenStore {
        fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>, StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[test]
    fn test_lost_race_is_not_an_error() {
        let fields = PublicationFields::default();
        let outcome = upsert_publication(&RacingStore, "123", &fields).unwrap();
        assert_eq!(outcome, UpsertOutcome::LostRace);
        assert_eq!(persist(&RacingStore, "123", &fields), Some(UpsertOutcome::LostRace));
    }

    #[test]
    fn test_persist_swallows_failures() {
        assert!(upsert_publication(&BrokenStore, "123", &PublicationFields::default()).is_err());
        assert_eq!(persist(&BrokenStore, "123", &PublicationFields::default()), None);
    }

    #[test]
    fn test_summary_fields_omit_description() {
        let summary = PublicationSummary {
            canonical_id: Some("1".into()),
            title: Some("T".into()),
            ..Default::default()
        };
        let fields = PublicationFields::from(&summary);
        assert_eq!(fields.title.as_deref(), Some("T"));
        assert_eq!(fields.description, None);
    }
}
