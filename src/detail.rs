//! Streaming and download detail of a single episode.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    extract::{self, selector},
    heuristics::{self, UNKNOWN},
    stdx::error::{Assumption, degrade},
};

/// Quality of the main player, which never labels itself.
pub const DEFAULT_QUALITY: &str = "Default";

/// Download target used by the site for links that are not available yet.
const DISABLED_HREF: &str = "none";

/// A playable stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingLink {
    /// Player name.
    pub name: String,
    /// Embed URL.
    pub url: String,
    /// Quality label, `Default` for the main player and best effort otherwise.
    pub quality: String,
}

/// A download mirror for one quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    /// Hosting server name.
    pub server: String,
    /// Quality label as written on the link.
    pub quality: String,
    /// Download URL.
    pub url: String,
}

/// Everything on an episode page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeDetail {
    /// Page heading, or `Unknown`.
    pub title: String,
    /// Synopsis, empty when the page has none.
    pub description: String,
    /// Episode artwork.
    pub image_url: Option<String>,
    /// The main player followed by every alternate player.
    pub streaming_links: Vec<StreamingLink>,
    /// Every visible, enabled download link.
    pub download_links: Vec<DownloadLink>,
    /// Rows of the info table, keyed by header.
    pub metadata: BTreeMap<String, String>,
}

/// Extracts an episode page, or `None` if it has neither a title nor any link.
#[instrument(name = "parsing anime detail", skip_all)]
pub(crate) fn parse(body: &str) -> Option<AnimeDetail> {
    let html = Html::parse_document(body);
    let root = html.root_element();

    let title = degrade("title", title(root), None);

    let mut streaming_links = Vec::new();
    streaming_links.extend(degrade("main player", main_player(root), None));
    streaming_links.extend(degrade("alternate players", alternate_players(root), Vec::new()));

    let download_links = degrade("download links", download_links(root), Vec::new());

    if title.is_none() && streaming_links.is_empty() && download_links.is_empty() {
        return None;
    }

    Some(AnimeDetail {
        title: title.unwrap_or_else(|| UNKNOWN.to_owned()),
        description: degrade("description", description(root), String::new()),
        image_url: degrade("image_url", image(root), None),
        streaming_links,
        download_links,
        metadata: degrade(
            "metadata",
            extract::metadata(root, "div.contenttable tr"),
            BTreeMap::new(),
        ),
    })
}

fn title(root: ElementRef<'_>) -> Result<Option<String>, Assumption> {
    extract::text_of(root, "h1")
}

fn description(root: ElementRef<'_>) -> Result<String, Assumption> {
    Ok(extract::text_of(root, "div.contentdeks")?.unwrap_or_default())
}

fn image(root: ElementRef<'_>) -> Result<Option<String>, Assumption> {
    Ok(extract::attr_of(root, "amp-img.gambar", "src")?.filter(|src| !src.is_empty()))
}

fn main_player(root: ElementRef<'_>) -> Result<Option<StreamingLink>, Assumption> {
    let link = extract::attr_of(root, "iframe#mediaplayer", "src")?
        .filter(|src| !src.is_empty())
        .map(|url| StreamingLink {
            name: "Main Player".to_owned(),
            url,
            quality: DEFAULT_QUALITY.to_owned(),
        });

    Ok(link)
}

fn alternate_players(root: ElementRef<'_>) -> Result<Vec<StreamingLink>, Assumption> {
    let links = root
        .select(&selector("a#allmiror")?)
        .filter_map(|anchor| {
            let url = anchor.value().attr("data-video")?;

            let text = extract::text(anchor);
            let name = if text.is_empty() {
                "Alternative Player".to_owned()
            } else {
                text
            };

            Some(StreamingLink {
                quality: heuristics::quality(&name),
                url: url.to_owned(),
                name,
            })
        })
        .collect();

    Ok(links)
}

// div.download > span.ud (one per server) > span.udj (server name) + a.udl (one per quality)
fn download_links(root: ElementRef<'_>) -> Result<Vec<DownloadLink>, Assumption> {
    let Some(section) = extract::first(root, "div.download")? else {
        return Ok(Vec::new());
    };

    let qualities = selector("a.udl")?;

    let mut links = Vec::new();

    for server in section.select(&selector("span.ud")?) {
        let name = extract::text_of(server, "span.udj")?
            .unwrap_or_else(|| "Unknown Server".to_owned());

        for anchor in server.select(&qualities) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            if href == DISABLED_HREF || is_hidden(anchor) {
                continue;
            }

            links.push(DownloadLink {
                server: name.clone(),
                quality: extract::text(anchor),
                url: href.to_owned(),
            });
        }
    }

    Ok(links)
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let Some(style) = element.value().attr("style") else {
        return false;
    };

    let style = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    style.contains("display:none") || style.contains("visibility:hidden")
}
