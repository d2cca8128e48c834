//! Artwork backfill for day block schedules.
//!
//! Schedule lines carry no artwork, so each entry's own page is fetched and
//! searched for one. A lookup that fails is retried once after
//! [`ClientBuilder::retry_delay`](crate::ClientBuilder::retry_delay), and an
//! entry that still has nothing gets the configured placeholder. Lookups never
//! fail the schedule.

use scraper::{ElementRef, Html};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    client::{Client, Fetch},
    extract::{self, Strategy},
    heuristics,
    schedule::{Schedule, ScheduleDay},
};

// Most specific first; the content column poster is the title's key art.
const ARTWORK: &[Strategy] = &[
    Strategy::Select(r#"div.column-content amp-img[width="151"][height="215"]"#),
    Strategy::Select("div.column-content amp-img"),
    Strategy::Select("amp-img.gambar"),
    Strategy::Select("div.column-content img"),
    Strategy::Select("amp-img"),
    Strategy::Select("img"),
];

/// How schedule entries get their artwork backfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrichment {
    /// Look up only the first `limit` entries of each day, and share every
    /// image found with the entries of that day carrying the exact same title.
    Propagate {
        /// Entries looked up per day.
        limit: usize,
    },
    /// Look up every entry that links to a page.
    Independent,
}

impl Default for Enrichment {
    fn default() -> Self {
        Self::Propagate { limit: 3 }
    }
}

/// Backfills artwork on every day of a day block schedule.
///
/// Other layouts are returned untouched. Once this returns, every entry of a
/// day block schedule has an `image_url`.
#[instrument(skip_all, fields(enrichment = ?client.config.enrichment))]
pub(crate) async fn enrich<F: Fetch>(client: &Client<F>, schedule: Schedule) -> Schedule {
    let (mut schedule_by_day, table) = match schedule {
        Schedule::DayBlocks {
            schedule_by_day,
            table,
        } => (schedule_by_day, table),
        other => return other,
    };

    for day in &mut schedule_by_day {
        enrich_day(client, day).await;
    }

    Schedule::DayBlocks {
        schedule_by_day,
        table,
    }
}

async fn enrich_day<F: Fetch>(client: &Client<F>, day: &mut ScheduleDay) {
    match client.config.enrichment {
        Enrichment::Propagate { limit } => {
            for index in 0..day.anime_list.len().min(limit) {
                let entry = &day.anime_list[index];

                if entry.image_url.is_some() {
                    continue;
                }

                let Some(url) = entry.url.clone() else {
                    continue;
                };

                let Some(image) = artwork(client, &url).await else {
                    continue;
                };

                let title = day.anime_list[index].title.clone();

                for entry in day
                    .anime_list
                    .iter_mut()
                    .filter(|entry| entry.title == title)
                {
                    entry.image_url = Some(image.clone());
                }
            }
        }
        Enrichment::Independent => {
            for entry in &mut day.anime_list {
                if entry.image_url.is_some() {
                    continue;
                }

                if let Some(url) = &entry.url {
                    entry.image_url = artwork(client, url).await;
                }
            }
        }
    }

    for entry in &mut day.anime_list {
        entry
            .image_url
            .get_or_insert_with(|| client.config.default_image.to_string());
    }
}

/// Looks up the artwork on an entry's page, retrying once.
///
/// `href` is resolved against the base URL the way a browser would, so
/// protocol relative and root relative links keep their meaning.
pub(crate) async fn artwork<F: Fetch>(client: &Client<F>, href: &str) -> Option<String> {
    let url = match extract::absolute(&client.config.base, href) {
        Ok(url) => url,
        Err(err) => {
            warn!(href, %err, "entry link cannot be resolved, using placeholder");
            return None;
        }
    };

    if let Some(image) = attempt(client, &url).await {
        return Some(image);
    }

    debug!(%url, delay = ?client.config.retry_delay, "retrying artwork lookup");
    tokio::time::sleep(client.config.retry_delay).await;

    let image = attempt(client, &url).await;

    if image.is_none() {
        warn!(%url, "no artwork found after retry, using placeholder");
    }

    image
}

async fn attempt<F: Fetch>(client: &Client<F>, url: &str) -> Option<String> {
    match client.get_image_page(url).await {
        Ok(body) => artwork_in(&body, &client.config.base),
        Err(err) => {
            debug!(%url, %err, "artwork page could not be fetched");
            None
        }
    }
}

/// Finds the artwork on a title page.
///
/// The image elements are tried first, then the `og:image` meta tag, then any
/// image URL in the raw markup.
pub(crate) fn artwork_in(body: &str, base: &Url) -> Option<String> {
    let html = Html::parse_document(body);
    let root = html.root_element();

    ARTWORK
        .iter()
        .find_map(|strategy| {
            extract::resolve(root, std::slice::from_ref(strategy))
                .into_iter()
                .find_map(|image| source(image, base))
        })
        .or_else(|| open_graph(root, base))
        .or_else(|| heuristics::content_image(body))
}

// Only absolute or root relative sources; anything else is usually a lazy
// loading placeholder.
fn source(image: ElementRef<'_>, base: &Url) -> Option<String> {
    let src = image.value().attr("src")?.trim();

    if src.starts_with("http://") || src.starts_with("https://") {
        Some(src.to_owned())
    } else if src.starts_with('/') {
        extract::absolute(base, src).ok()
    } else {
        None
    }
}

fn open_graph(root: ElementRef<'_>, base: &Url) -> Option<String> {
    let content = extract::attr_of(root, r#"meta[property="og:image"]"#, "content")
        .ok()
        .flatten()?;

    extract::absolute(base, &content).ok()
}
