use crate::result::BgSizeResult;
use regex_lite::Regex;

// regex-lite has no backreferences, so each quote style gets its own branch.
// Branch order matters: a quoted body wins over the unquoted fallback.
const CSS_URL_PATTERN: &str = r#"url\((?:'(.+?)'|"(.+?)"|`(.+?)`|(.+?))\)"#;

/// Extracts the bare URLs of all `url(...)` occurrences in a CSS value, in order.
///
/// A value without any `url(...)` (e.g. `none` or a gradient) yields an empty list.
pub fn extract_css_urls(css_value: &str) -> BgSizeResult<Vec<String>> {
    let url_regex = Regex::new(CSS_URL_PATTERN)?;
    Ok(url_regex
        .captures_iter(css_value)
        .filter_map(|captures| {
            (1..=4)
                .find_map(|group| captures.get(group))
                .map(|body| body.as_str().to_string())
        })
        .collect())
}
