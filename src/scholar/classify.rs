use url::Url;

use super::identifier::query_value;
use super::{ClassifiedUrl, UrlKind, CITATIONS_PATH, SOURCE_HOST};

/// Classify a URL as a single publication page, an author profile, or neither.
///
/// Profile shape is checked first: a profile URL must name a `user` and may only
/// carry `view_op=list_works`. An article URL needs `view_op=view_citation`
/// together with `citation_for_view`.
pub fn classify(raw: &str) -> ClassifiedUrl {
    let raw = raw.trim();
    let kind = match Url::parse(raw) {
        Ok(url) if is_profile_url(&url) => UrlKind::Profile,
        Ok(url) if is_article_url(&url) => UrlKind::Article,
        _ => UrlKind::Unknown,
    };
    ClassifiedUrl {
        raw: raw.to_string(),
        kind,
    }
}

fn on_citations_page(url: &Url) -> bool {
    url.host_str() == Some(SOURCE_HOST) && url.path() == CITATIONS_PATH
}

fn is_profile_url(url: &Url) -> bool {
    if !on_citations_page(url) || query_value(url, "user").is_none() {
        return false;
    }
    match query_value(url, "view_op") {
        Some(op) => op == "list_works",
        None => true,
    }
}

fn is_article_url(url: &Url) -> bool {
    on_citations_page(url)
        && query_value(url, "view_op").as_deref() == Some("view_citation")
        && query_value(url, "citation_for_view").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(url: &str) -> UrlKind {
        classify(url).kind
    }

    #[test]
    fn test_profile_urls() {
        assert_eq!(
            kind("https://scholar.google.com/citations?user=DLBorCEAAAAJ"),
            UrlKind::Profile
        );
        assert_eq!(
            kind("https://scholar.google.com/citations?view_op=list_works&hl=en&hl=en&user=DLBorCEAAAAJ"),
            UrlKind::Profile
        );
    }

    #[test]
    fn test_profile_with_other_view_op_is_unknown() {
        assert_eq!(
            kind("https://scholar.google.com/citations?view_op=search_authors&user=DLBorCEAAAAJ"),
            UrlKind::Unknown
        );
    }

    #[test]
    fn test_article_urls() {
        let url = "https://scholar.google.com/citations?view_op=view_citation&hl=en&user=DLBorCEAAAAJ&citation_for_view=DLBorCEAAAAJ:HDshCWvjkbEC";
        let classified = classify(url);
        assert_eq!(classified.kind, UrlKind::Article);
        assert_eq!(classified.raw, url);
    }

    #[test]
    fn test_article_without_citation_for_view_is_unknown() {
        assert_eq!(
            kind("https://scholar.google.com/citations?view_op=view_citation&hl=en"),
            UrlKind::Unknown
        );
    }

    #[test]
    fn test_foreign_hosts_are_unknown() {
        for url in [
            "https://example.com/citations?user=DLBorCEAAAAJ",
            "https://scholar.google.de/citations?user=DLBorCEAAAAJ",
            "https://scholar.google.com.evil.org/citations?view_op=view_citation&citation_for_view=x:y",
        ] {
            assert_eq!(kind(url), UrlKind::Unknown, "{}", url);
        }
    }

    #[test]
    fn test_missing_query_and_garbage() {
        assert_eq!(kind("https://scholar.google.com/citations"), UrlKind::Unknown);
        assert_eq!(kind("https://scholar.google.com/scholar?q=rust"), UrlKind::Unknown);
        assert_eq!(kind("not a url"), UrlKind::Unknown);
        assert_eq!(kind(""), UrlKind::Unknown);
    }

    #[test]
    fn test_input_is_trimmed() {
        let classified = classify("  https://scholar.google.com/citations?user=abc \n");
        assert_eq!(classified.kind, UrlKind::Profile);
        assert_eq!(classified.raw, "https://scholar.google.com/citations?user=abc");
    }

    #[test]
    fn test_blank_user_is_absent() {
        assert_eq!(kind("https://scholar.google.com/citations?user="), UrlKind::Unknown);
    }
}
