//! Regex based classifiers for the semi-structured text found on the site.

use std::sync::LazyLock;

use regex::Regex;

/// Sentinel for a value that could not be derived from the page.
pub const UNKNOWN: &str = "Unknown";

// `\d` would also match non-ASCII digits, which the sort cannot order.
static EPISODE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Episode\s+(?P<number>[0-9]+)").expect("episode number regex should be valid")
});

// A `P` suffix or a `-` range is what makes a number look like a resolution;
// bare numbers are handled by the digit-run fallback.
static RESOLUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]+[pP](?:-[0-9]+[pP]?)?|[0-9]+-[0-9]+[pP]?").expect("resolution regex should be valid")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digits regex should be valid"));

// `<anything but a comma>, <H>:<MM>` at the very end of a schedule line.
static BROADCAST_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<time>[^,]+,\s*[0-9]+:[0-9]+)$").expect("broadcast time regex should be valid")
});

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>()]+?\.(?:jpe?g|png|webp|gif)\b"#)
        .expect("image url regex should be valid")
});

/// Extracts the number from an `Episode N` label.
///
/// Returns the digits as written, or [`UNKNOWN`] when the text carries no
/// episode number.
///
/// ```
/// # use anoboy::heuristics::episode_number;
/// assert_eq!("12", episode_number("Boruto Episode 12 Subtitle Indonesia"));
/// assert_eq!("Unknown", episode_number("Special OVA"));
/// ```
#[must_use]
pub fn episode_number(text: &str) -> String {
    EPISODE_NUMBER
        .captures(text)
        .map_or_else(|| UNKNOWN.to_owned(), |captures| captures["number"].to_owned())
}

/// Infers a quality label from the text of an alternate player link.
///
/// 1. A resolution-like token (`1080P`, `360-720`, `240P-480P`) is used verbatim.
/// 2. Otherwise every run of digits is joined with `-` and suffixed with `P`.
/// 3. Otherwise the quality is [`UNKNOWN`].
///
/// ```
/// # use anoboy::heuristics::quality;
/// assert_eq!("360-720P", quality("360-720P Server A"));
/// assert_eq!("1080P", quality("1080 Mirror"));
/// assert_eq!("Unknown", quality("HD Mirror"));
/// ```
#[must_use]
pub fn quality(text: &str) -> String {
    if let Some(resolution) = RESOLUTION.find(text) {
        return resolution.as_str().to_owned();
    }

    let digits: Vec<&str> = DIGITS.find_iter(text).map(|m| m.as_str()).collect();

    if digits.is_empty() {
        UNKNOWN.to_owned()
    } else {
        format!("{}P", digits.join("-"))
    }
}

/// Extracts the trailing `<day>, <H>:<MM>` part of a schedule line.
#[must_use]
pub fn broadcast_time(text: &str) -> Option<String> {
    BROADCAST_TIME
        .captures(text.trim())
        .map(|captures| captures["time"].trim().to_owned())
}

/// Assets that show up on every page but are never a title's artwork.
const NON_CONTENT_IMAGES: &[&str] = &["logo", "chat", "whatsapp", "iklan", "/ads/", "banner"];

/// Uploaded artwork lives under this path on the site.
const CONTENT_MARKER: &str = "/wp-content/uploads/";

/// Every image URL embedded anywhere in raw markup, in document order.
pub(crate) fn image_urls(markup: &str) -> Vec<String> {
    IMAGE_URL
        .find_iter(markup)
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
        .collect()
}

/// Picks the most plausible artwork out of raw markup.
///
/// A URL under the upload path wins; otherwise the first URL that is not a
/// known site asset.
pub(crate) fn content_image(markup: &str) -> Option<String> {
    let candidates = image_urls(markup);

    if let Some(upload) = candidates.iter().find(|url| url.contains(CONTENT_MARKER)) {
        return Some(upload.clone());
    }

    candidates.into_iter().find(|url| {
        let lower = url.to_ascii_lowercase();
        !NON_CONTENT_IMAGES.iter().any(|asset| lower.contains(asset))
    })
}

/// Lower-cases a title and replaces whitespace runs with `-` to form a slug.
pub(crate) fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
