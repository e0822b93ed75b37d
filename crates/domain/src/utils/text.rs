//! Text normalization for upstream descriptions
//!
//! Upstream APIs return HTML fragments in description fields. Tasks store a
//! plain-text excerpt instead.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::TRUNCATE_SUFFIX;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"<[^>]*>").expect("static tag pattern compiles")
});

/// Remove every `<...>` tag, leaving text content untouched.
///
/// Entities are not decoded and whitespace is not collapsed.
///
/// # Examples
///
/// ```
/// use goldfish_domain::utils::text::strip_html;
///
/// assert_eq!(strip_html("<p>Read <b>ch. 4</b></p>"), "Read ch. 4");
/// assert_eq!(strip_html("no markup"), "no markup");
/// ```
#[must_use]
pub fn strip_html(input: &str) -> String {
    HTML_TAG.replace_all(input, "").into_owned()
}

/// Strip tags, then keep at most `max_chars` characters.
///
/// # Examples
///
/// ```
/// use goldfish_domain::utils::text::excerpt;
///
/// assert_eq!(excerpt("<p>abcdef</p>", 3), "abc");
/// assert_eq!(excerpt("", 10), "");
/// ```
#[must_use]
pub fn excerpt(html: &str, max_chars: usize) -> String {
    strip_html(html).chars().take(max_chars).collect()
}

/// Cut text longer than `max_chars` and append `...`.
///
/// Text at or under the limit is returned unchanged.
///
/// # Examples
///
/// ```
/// use goldfish_domain::utils::text::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("short", 10), "short");
/// assert_eq!(truncate_with_ellipsis("abcdefgh", 4), "abcd...");
/// ```
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}{TRUNCATE_SUFFIX}")
    } else {
        text.to_string()
    }
}
