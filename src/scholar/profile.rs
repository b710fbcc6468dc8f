use scraper::{ElementRef, Html, Selector};

use super::fetch::FetchError;
use super::identifier::id_from_cited_by;
use super::{non_empty_text, selector, ProfileRecord, PublicationSummary, SOURCE_HOST};

struct RowSelectors {
    title_cell: Selector,
    anchor: Selector,
    gray: Selector,
    cited_by: Selector,
    year: Selector,
}

/// Read the author header and the first `pub_limit` rows of the publication table.
pub fn extract_profile(doc: &Html, pub_limit: usize) -> Result<ProfileRecord, FetchError> {
    let header_sel = selector("#gsc_prf")?;
    let image_sel = selector("#gsc_prf_pup-img")?;
    let name_sel = selector("#gsc_prf_in")?;
    let row_sel = selector(".gsc_a_tr")?;
    let rows = RowSelectors {
        title_cell: selector(".gsc_a_t")?,
        anchor: selector("a")?,
        gray: selector(".gs_gray")?,
        cited_by: selector(".gsc_a_c")?,
        year: selector(".gsc_a_y")?,
    };

    let mut record = ProfileRecord::default();

    if let Some(header) = doc.select(&header_sel).next() {
        record.profile_image = header
            .select(&image_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);
        record.author = header.select(&name_sel).next().and_then(non_empty_text);
    }

    record.publications = doc
        .select(&row_sel)
        .take(pub_limit)
        .map(|row| summarize_row(row, &rows))
        .collect();

    Ok(record)
}

fn summarize_row(row: ElementRef<'_>, sel: &RowSelectors) -> PublicationSummary {
    let mut summary = PublicationSummary::default();

    if let Some(cell) = row.select(&sel.title_cell).next() {
        if let Some(anchor) = cell.select(&sel.anchor).next() {
            summary.title = non_empty_text(anchor);
            summary.link = anchor.value().attr("href").map(absolute_link);
        }
        let gray: Vec<_> = cell.select(&sel.gray).collect();
        if gray.len() >= 2 {
            summary.authors = non_empty_text(gray[0]);
            summary.source = non_empty_text(gray[1]);
        }
    }

    summary.canonical_id = row
        .select(&sel.cited_by)
        .next()
        .and_then(|cell| cell.select(&sel.anchor).next())
        .and_then(|a| a.value().attr("href"))
        .and_then(id_from_cited_by);

    summary.publication_date = row.select(&sel.year).next().and_then(non_empty_text);

    summary
}

/// Row links are site-relative (`/citations?view_op=view_citation&...`).
fn absolute_link(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("https://{}{}", SOURCE_HOST, href)
    } else {
        format!("https://{}/{}", SOURCE_HOST, href)
    }
}
