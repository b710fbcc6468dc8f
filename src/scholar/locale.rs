use super::FIXED_LOCALE;

/// Force the `hl` (interface language) parameter to the fixed locale.
///
/// Works on the raw query string so every other parameter keeps its position
/// and its original percent-encoding. URLs without `hl` come back unchanged.
pub fn normalize_locale(url: &str) -> String {
    let (before_fragment, fragment) = match url.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (url, None),
    };
    let Some((base, query)) = before_fragment.split_once('?') else {
        return url.to_string();
    };

    let mut rewritten = false;
    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| {
            let key = pair.split_once('=').map_or(pair, |(k, _)| k);
            if key == "hl" {
                rewritten = true;
                format!("hl={}", FIXED_LOCALE)
            } else {
                pair.to_string()
            }
        })
        .collect();

    if !rewritten {
        return url.to_string();
    }

    let mut out = format!("{}?{}", base, pairs.join("&"));
    if let Some(frag) = fragment {
        out.push('#');
        out.push_str(frag);
    }
    out
}
