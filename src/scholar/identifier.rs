use url::Url;

use super::SOURCE_HOST;

/// First non-blank value of a query parameter.
pub(crate) fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .filter(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
        .next()
}

/// Parse an absolute link, or a relative one against the source host.
fn parse_link(link: &str) -> Option<Url> {
    let link = link.trim();
    match Url::parse(link) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(&format!("https://{}/", SOURCE_HOST)).ok()?;
            base.join(link).ok()
        }
        Err(_) => None,
    }
}

/// Publication id carried by a "cited by" link (`cites=` parameter).
///
/// The same publication is sometimes listed under several ids, one per
/// language edition (`cites=12345,67890`); only the first is canonical.
pub fn id_from_cited_by(link: &str) -> Option<String> {
    let url = parse_link(link)?;
    let cites = query_value(&url, "cites")?;
    let first = cites.split(',').next().unwrap_or_default().trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// Publication id of a citation view page's own URL (`citation_for_view=`).
pub fn id_from_citation_view(link: &str) -> Option<String> {
    let url = parse_link(link)?;
    query_value(&url, "citation_for_view")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cites_first_of_many() {
        let link = "https://scholar.google.com/scholar?oi=bibs&hl=en&cites=12345,67890";
        assert_eq!(id_from_cited_by(link).as_deref(), Some("12345"));
    }

    #[test]
    fn test_cites_is_trimmed() {
        let link = "https://scholar.google.com/scholar?cites=%2012345%20,67890";
        assert_eq!(id_from_cited_by(link).as_deref(), Some("12345"));
    }

    #[test]
    fn test_cites_relative_link() {
        let link = "/scholar?oi=bibs&hl=en&cites=2412871699215781213";
        assert_eq!(id_from_cited_by(link).as_deref(), Some("2412871699215781213"));
    }

    #[test]
    fn test_cites_missing_or_blank() {
        assert_eq!(id_from_cited_by("https://scholar.google.com/scholar?q=x"), None);
        assert_eq!(id_from_cited_by("https://scholar.google.com/scholar?cites="), None);
        assert_eq!(id_from_cited_by("https://scholar.google.com/scholar?cites=,123"), None);
    }

    #[test]
    fn test_citation_for_view() {
        let link = "https://scholar.google.com/citations?view_op=view_citation&hl=en&user=DLBorCEAAAAJ&citation_for_view=DLBorCEAAAAJ:HDshCWvjkbEC";
        assert_eq!(
            id_from_citation_view(link).as_deref(),
            Some("DLBorCEAAAAJ:HDshCWvjkbEC")
        );
        assert_eq!(
            id_from_citation_view("https://scholar.google.com/citations?user=DLBorCEAAAAJ"),
            None
        );
    }
}
