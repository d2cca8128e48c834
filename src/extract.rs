//! Selector resolution and the field readers shared by every page.
//!
//! Where a field can live in more than one place depending on the page
//! template, its locations are written down as an ordered list of [`Strategy`]
//! values and handed to [`resolve`]. New templates are supported by appending
//! to the list.

use std::collections::BTreeMap;

use scraper::{ElementRef, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::stdx::error::{Assume, Assumption, assumption};

/// A rule for locating a field or container within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// Every element matching the selector, in document order.
    Select(&'static str),
    /// The element directly after each `anchor` match, kept only when it
    /// matches `sibling`.
    NextSibling {
        anchor: &'static str,
        sibling: &'static str,
    },
}

impl Strategy {
    fn matches<'a>(&self, root: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, Assumption> {
        match *self {
            Self::Select(css) => Ok(root.select(&selector(css)?).collect()),
            Self::NextSibling { anchor, sibling } => {
                let anchor = selector(anchor)?;
                let sibling = selector(sibling)?;

                let matches = root
                    .select(&anchor)
                    .filter_map(|element| {
                        element.next_siblings().find_map(ElementRef::wrap)
                    })
                    .filter(|next| sibling.matches(next))
                    .collect();

                Ok(matches)
            }
        }
    }
}

/// Returns the match set of the first strategy that finds anything.
///
/// Strategies are tried strictly in order. When every strategy comes up empty
/// the result is empty; this never fails.
pub(crate) fn resolve<'a>(root: ElementRef<'a>, strategies: &[Strategy]) -> Vec<ElementRef<'a>> {
    for (rank, strategy) in strategies.iter().enumerate() {
        match strategy.matches(root) {
            Ok(matches) if !matches.is_empty() => {
                debug!(?strategy, rank, count = matches.len(), "resolved selector strategy");
                return matches;
            }
            Ok(_) => {}
            Err(err) => warn!(?strategy, %err, "skipping unusable selector strategy"),
        }
    }

    Vec::new()
}

pub(crate) fn selector(css: &str) -> Result<Selector, Assumption> {
    Selector::parse(css).assumption(format!("`{css}` should be a valid selector"))
}

/// The first element under `root` matching `css`, if any.
pub(crate) fn first<'a>(root: ElementRef<'a>, css: &str) -> Result<Option<ElementRef<'a>>, Assumption> {
    Ok(root.select(&selector(css)?).next())
}

/// Whether `root` has any descendant matching `css`.
pub(crate) fn has(root: ElementRef<'_>, css: &str) -> Result<bool, Assumption> {
    Ok(first(root, css)?.is_some())
}

/// All text under `element`, trimmed at both ends.
pub(crate) fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// All text under `element` with every whitespace run collapsed to one space.
pub(crate) fn collapsed_text(element: ElementRef<'_>) -> String {
    let mut collapsed = String::new();

    for text in element.text() {
        for word in text.split_whitespace() {
            collapsed.push_str(word);
            collapsed.push(' ');
        }
    }

    collapsed.pop();

    collapsed
}

/// Trimmed text of the first `css` match under `root`, if present and non-empty.
pub(crate) fn text_of(root: ElementRef<'_>, css: &str) -> Result<Option<String>, Assumption> {
    Ok(first(root, css)?.map(text).filter(|text| !text.is_empty()))
}

/// Attribute `attr` of the first `css` match under `root`.
pub(crate) fn attr_of(
    root: ElementRef<'_>,
    css: &str,
    attr: &str,
) -> Result<Option<String>, Assumption> {
    Ok(first(root, css)?
        .and_then(|element| element.value().attr(attr))
        .map(str::to_owned))
}

/// The nearest anchor enclosing `element`, `element` itself included.
pub(crate) fn closest_anchor(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|element| element.value().name() == "a")
}

/// Reads a two column table (`th` → `td`) into a map.
///
/// Rows without both a header and a value cell are skipped; a later row with
/// the same header replaces an earlier one. No rows means an empty map.
pub(crate) fn metadata(root: ElementRef<'_>, rows: &str) -> Result<BTreeMap<String, String>, Assumption> {
    let header = selector("th")?;
    let value = selector("td")?;

    let mut metadata = BTreeMap::new();

    for row in root.select(&selector(rows)?) {
        let (Some(header), Some(value)) = (row.select(&header).next(), row.select(&value).next())
        else {
            continue;
        };

        metadata.insert(text(header), text(value));
    }

    Ok(metadata)
}

/// Makes `href` absolute against `base`.
pub(crate) fn absolute(base: &Url, href: &str) -> Result<String, Assumption> {
    let href = href.trim();

    if href.is_empty() {
        assumption!("an empty url cannot be made absolute");
    }

    let url = base
        .join(href)
        .assumption(format!("`{href}` should be joinable onto `{base}`"))?;

    Ok(url.into())
}
