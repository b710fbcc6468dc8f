use scraper::Html;

use super::fetch::FetchError;
use super::identifier::id_from_cited_by;
use super::{element_text, non_empty_text, selector, PublicationRecord};

/// Labels of the citation view's detail table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailField {
    Authors,
    PublicationDate,
    Description,
    PublicationId,
    Source,
    Volume,
    Issue,
    Pages,
    Publisher,
    TotalCitations,
    Other(String),
}

impl DetailField {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Authors" => Self::Authors,
            "Publication date" => Self::PublicationDate,
            "Description" => Self::Description,
            "Publication ID" => Self::PublicationId,
            "Source" => Self::Source,
            "Volume" => Self::Volume,
            "Issue" => Self::Issue,
            "Pages" => Self::Pages,
            "Publisher" => Self::Publisher,
            "Total citations" => Self::TotalCitations,
            other => Self::Other(other.to_string()),
        }
    }

    /// Label used when the field is folded into the composite `source`.
    fn source_label(&self) -> Option<&'static str> {
        match self {
            Self::Source => Some("Source"),
            Self::Volume => Some("Volume"),
            Self::Issue => Some("Issue"),
            Self::Pages => Some("Pages"),
            Self::Publisher => Some("Publisher"),
            _ => None,
        }
    }
}

/// Everything read off a citation view page, before an id has been settled on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFields {
    pub title: Option<String>,
    pub link: Option<String>,
    pub authors: Option<String>,
    pub publication_date: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    /// From the "Total citations" link or an explicit "Publication ID" row.
    pub publication_id: Option<String>,
}

impl ArticleFields {
    pub fn into_record(self, canonical_id: String) -> PublicationRecord {
        PublicationRecord {
            canonical_id,
            title: self.title,
            link: self.link,
            authors: self.authors,
            publication_date: self.publication_date,
            source: self.source,
            description: self.description,
            updated_at: None,
        }
    }
}

pub fn extract_article(doc: &Html) -> Result<ArticleFields, FetchError> {
    let title_link_sel = selector(".gsc_oci_title_link")?;
    let title_sel = selector("#gsc_oci_title")?;
    let row_sel = selector(".gs_scl")?;
    let field_sel = selector(".gsc_oci_field")?;
    let value_sel = selector(".gsc_oci_value")?;
    let anchor_sel = selector("a")?;

    let mut fields = ArticleFields::default();

    if let Some(anchor) = doc.select(&title_link_sel).next() {
        fields.title = non_empty_text(anchor);
        fields.link = anchor.value().attr("href").map(str::to_string);
    } else if let Some(heading) = doc.select(&title_sel).next() {
        // Titles without a publisher link are rendered as plain text.
        fields.title = non_empty_text(heading);
    }

    let mut details: Vec<(DetailField, String)> = Vec::new();
    for row in doc.select(&row_sel) {
        let (Some(field), Some(value)) = (
            row.select(&field_sel).next(),
            row.select(&value_sel).next(),
        ) else {
            continue;
        };

        match DetailField::from_label(&element_text(field)) {
            DetailField::TotalCitations => {
                let cited_by = value
                    .select(&anchor_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(id_from_cited_by);
                if let Some(id) = cited_by {
                    record_detail(&mut details, DetailField::PublicationId, id);
                }
            }
            field => {
                record_detail(&mut details, field, element_text(value).trim().to_string());
            }
        }
    }

    apply_details(&mut fields, details);
    Ok(fields)
}

/// A repeated label keeps its first position but takes the latest value.
fn record_detail(details: &mut Vec<(DetailField, String)>, field: DetailField, value: String) {
    match details.iter_mut().find(|(f, _)| *f == field) {
        Some(slot) => slot.1 = value,
        None => details.push((field, value)),
    }
}

fn apply_details(fields: &mut ArticleFields, details: Vec<(DetailField, String)>) {
    let mut source = String::new();
    for (field, value) in details {
        if value.is_empty() {
            continue;
        }
        if let Some(label) = field.source_label() {
            source.push_str(&format!(", {}: {}", label, value));
            continue;
        }
        match field {
            DetailField::Authors => fields.authors = Some(value),
            DetailField::PublicationDate => fields.publication_date = Some(value),
            DetailField::Description => fields.description = Some(value),
            DetailField::PublicationId => fields.publication_id = Some(value),
            _ => {}
        }
    }
    let source = source.strip_prefix(", ").unwrap_or(&source).trim();
    if !source.is_empty() {
        fields.source = Some(source.to_string());
    }
}
