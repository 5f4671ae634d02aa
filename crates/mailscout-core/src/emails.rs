//! Email-address extraction from raw page content.
//!
//! Extraction is pattern based: anything shaped like `local@domain.tld` is
//! collected, except tokens whose "top-level domain" is a raster-image
//! extension (`logo@2x.png` and friends, which show up in `srcset`
//! attributes). The guard is a heuristic: `report@v2.docx` still passes.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // ASCII word boundaries: an address glued to CJK or accented text
    // still counts as delimited.
    Regex::new(r"(?-u:\b)[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?-u:\b)")
        .expect("email pattern is a valid regex")
});

static EMAIL_EXACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Scans `content` for email addresses.
///
/// Matches are whitespace-stripped but keep their original case; callers
/// must compare them case-insensitively. The result is deduplicated (and
/// ordered, which keeps logs stable).
pub fn extract_emails(content: &str) -> BTreeSet<String> {
    EMAIL_PATTERN
        .find_iter(content)
        .map(|m| m.as_str())
        .filter(|candidate| !ends_with_image_extension(candidate))
        .map(strip_whitespace)
        .collect()
}

/// Returns true if the whole of `address` has the accepted email shape.
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_EXACT.is_match(address) && !ends_with_image_extension(address)
}

/// Storage-boundary normalization: no whitespace anywhere, lower-cased.
pub fn normalize_email(raw: &str) -> String {
    strip_whitespace(raw).to_lowercase()
}

fn ends_with_image_extension(candidate: &str) -> bool {
    candidate
        .rsplit_once('.')
        .is_some_and(|(_, tld)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|ext| tld.eq_ignore_ascii_case(ext))
        })
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
