use std::sync::Arc;

use scraper::Html;
use serde::Serialize;
use thiserror::Error;

use crate::scholar::article::extract_article;
use crate::scholar::classify::classify;
use crate::scholar::fetch::{DocumentSource, FetchError};
use crate::scholar::identifier::id_from_citation_view;
use crate::scholar::locale::normalize_locale;
use crate::scholar::profile::extract_profile;
use crate::scholar::{ClassifiedUrl, ProfileRecord, PublicationRecord, UrlKind};
use crate::store::{persist, PublicationFields, PublicationStore, UpsertOutcome};

/// Failures reported back to the caller. The `Display` text is the `error`
/// value of the response envelope.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("URL_REQUIRED")]
    UrlRequired,
    #[error("URL_NOT_SUPPORTED")]
    UrlNotSupported,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("PUBLICATION_ID_NOT_FOUND")]
    PublicationIdNotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetails {
    pub url_requested: String,
    pub url_type: UrlKind,
    #[serde(flatten)]
    pub record: PublicationRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileDetails {
    pub url_requested: String,
    pub url_type: UrlKind,
    #[serde(flatten)]
    pub profile: ProfileRecord,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Details {
    Article(ArticleDetails),
    Profile(ProfileDetails),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl From<&ScrapeError> for ErrorEnvelope {
    fn from(err: &ScrapeError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
        }
    }
}

/// Render a pipeline result the way callers receive it: the record itself on
/// success, `{"success": false, "error": ...}` otherwise.
pub fn to_json(result: &Result<Details, ScrapeError>) -> serde_json::Result<String> {
    match result {
        Ok(details) => serde_json::to_string_pretty(details),
        Err(err) => serde_json::to_string_pretty(&ErrorEnvelope::from(err)),
    }
}

/// Classify → normalize → fetch → extract → persist.
pub struct Scraper {
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn PublicationStore>,
    pub_limit: usize,
}

impl Scraper {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        store: Arc<dyn PublicationStore>,
        pub_limit: usize,
    ) -> Self {
        Self {
            source,
            store,
            pub_limit,
        }
    }

    pub fn classify(&self, url: &str) -> ClassifiedUrl {
        classify(url)
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_details(&self, url: Option<&str>) -> Result<Details, ScrapeError> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ScrapeError::UrlRequired)?;

        let classified = classify(url);
        tracing::debug!("Classified as {:?}", classified.kind);
        match classified.kind {
            UrlKind::Article => {
                let url = normalize_locale(&classified.raw);
                self.fetch_article(&url).await.map(Details::Article)
            }
            UrlKind::Profile => {
                let url = normalize_locale(&classified.raw);
                self.fetch_profile(&url).await.map(Details::Profile)
            }
            UrlKind::Unknown => Err(ScrapeError::UrlNotSupported),
        }
    }

    async fn fetch_article(&self, url: &str) -> Result<ArticleDetails, ScrapeError> {
        let body = self.source.get(url).await?;
        let mut fields = extract_article(&Html::parse_document(&body))?;

        let canonical_id = fields
            .publication_id
            .take()
            .or_else(|| id_from_citation_view(url))
            .ok_or(ScrapeError::PublicationIdNotFound)?;

        let mut record = fields.into_record(canonical_id);
        let outcome = persist(
            self.store.as_ref(),
            &record.canonical_id,
            &PublicationFields::from(&record),
        );
        if let Some(UpsertOutcome::Updated(at)) = outcome {
            record.updated_at = Some(at);
        }

        Ok(ArticleDetails {
            url_requested: url.to_string(),
            url_type: UrlKind::Article,
            record,
        })
    }

    async fn fetch_profile(&self, url: &str) -> Result<ProfileDetails, ScrapeError> {
        let body = self.source.get(url).await?;
        let profile = extract_profile(&Html::parse_document(&body), self.pub_limit)?;

        for summary in &profile.publications {
            match summary.canonical_id.as_deref() {
                Some(id) if !id.is_empty() => {
                    persist(self.store.as_ref(), id, &PublicationFields::from(summary));
                }
                _ => tracing::debug!(
                    "Not storing {:?}: no publication id",
                    summary.title.as_deref().unwrap_or("untitled row")
                ),
            }
        }
        tracing::info!(
            "Profile {:?} with {} publications",
            profile.author.as_deref().unwrap_or("unknown"),
            profile.publications.len()
        );

        Ok(ProfileDetails {
            url_requested: url.to_string(),
            url_type: UrlKind::Profile,
            profile,
        })
    }
}
