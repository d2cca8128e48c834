//! The full alphabetical anime list.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    extract::{self, Strategy, selector},
    heuristics::UNKNOWN,
    stdx::error::{Assumption, degrade},
};

/// Label of the single group produced when the page has no letter groups.
pub const FLAT_GROUP: &str = "All";

const GROUPS: &[Strategy] = &[Strategy::Select(
    r#"div[class*="letter-group"], ul.lcp_catlist"#,
)];

/// One title in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Link text.
    pub title: String,
    /// Link target.
    pub url: Option<String>,
}

/// A run of catalog entries under one heading, usually a letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogGroup {
    /// The group heading, `Unknown` when the group has none, or `All` for a
    /// page without groups.
    pub group_label: String,
    /// Entries in document order.
    pub entries: Vec<CatalogEntry>,
}

/// Every catalog group, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// The groups.
    pub groups: Vec<CatalogGroup>,
}

impl Catalog {
    /// The number of entries across every group.
    #[must_use]
    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.entries.len()).sum()
    }
}

#[instrument(name = "parsing anime list", skip_all)]
pub(crate) fn parse(body: &str) -> Catalog {
    let html = Html::parse_document(body);
    let root = html.root_element();

    let groups = outermost(&extract::resolve(root, GROUPS));

    let groups = if groups.is_empty() {
        debug!("no letter groups found, falling back to a flat list");
        vec![CatalogGroup {
            group_label: FLAT_GROUP.to_owned(),
            entries: degrade("flat catalog", flat(root), Vec::new()),
        }]
    } else {
        groups
            .into_iter()
            .map(|group| CatalogGroup {
                group_label: degrade("group label", label(group), UNKNOWN.to_owned()),
                entries: degrade("group entries", links(group), Vec::new()),
            })
            .filter(|group| !group.entries.is_empty())
            .collect()
    };

    Catalog { groups }
}

// A category list nested in a letter group belongs to that group.
fn outermost<'a>(groups: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    groups
        .iter()
        .copied()
        .filter(|group| {
            !group
                .ancestors()
                .any(|ancestor| groups.iter().any(|other| other.id() == ancestor.id()))
        })
        .collect()
}

fn label(group: ElementRef<'_>) -> Result<String, Assumption> {
    Ok(extract::first(group, "h2, h3")?.map_or_else(|| UNKNOWN.to_owned(), extract::text))
}

fn links(group: ElementRef<'_>) -> Result<Vec<CatalogEntry>, Assumption> {
    Ok(group.select(&selector("a")?).map(entry).collect())
}

// Every list item on the page that carries a link.
fn flat(root: ElementRef<'_>) -> Result<Vec<CatalogEntry>, Assumption> {
    let link = selector("a")?;

    let entries = root
        .select(&selector("li")?)
        .filter_map(|item| item.select(&link).next())
        .map(entry)
        .collect();

    Ok(entries)
}

fn entry(link: ElementRef<'_>) -> CatalogEntry {
    CatalogEntry {
        title: extract::text(link),
        url: link.value().attr("href").map(str::to_owned),
    }
}
