//! The latest releases on the homepage.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::{
    extract::{self, selector},
    heuristics::UNKNOWN,
    stdx::error::{Assume, Assumption, degrade},
};

/// A release card from the homepage.
///
/// Cards have no identity beyond their position on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeSummary {
    /// Title shown on the card, or `Unknown`.
    pub title: String,
    /// Free text describing when the release went up.
    pub update_time: Option<String>,
    /// Absolute URL of the card artwork.
    pub image_url: Option<String>,
    /// URL of the episode page the card links to.
    pub episode_url: Option<String>,
}

#[instrument(name = "parsing homepage", skip_all)]
pub(crate) fn parse(body: &str, base: &Url) -> Vec<AnimeSummary> {
    let html = Html::parse_document(body);

    let cards = match selector(".amv") {
        Ok(cards) => cards,
        Err(err) => {
            tracing::warn!(%err, "homepage card selector unusable");
            return Vec::new();
        }
    };

    html.select(&cards).map(|card| summary(card, base)).collect()
}

fn summary(card: ElementRef<'_>, base: &Url) -> AnimeSummary {
    AnimeSummary {
        title: degrade("title", title(card), UNKNOWN.to_owned()),
        update_time: degrade("update_time", update_time(card), None),
        image_url: degrade("image_url", image(card, base), None),
        episode_url: episode_url(card),
    }
}

fn title(card: ElementRef<'_>) -> Result<String, Assumption> {
    extract::text_of(card, "h3.ibox1")?.assumption("`h3.ibox1`(title) is missing on homepage card")
}

fn update_time(card: ElementRef<'_>) -> Result<Option<String>, Assumption> {
    extract::text_of(card, "div.jamup")
}

fn image(card: ElementRef<'_>, base: &Url) -> Result<Option<String>, Assumption> {
    let Some(src) = extract::attr_of(card, "amp-img", "src")? else {
        return Ok(None);
    };

    Ok(Some(extract::absolute(base, &src)?))
}

// Cards are wrapped by the link to their episode, not the other way around.
fn episode_url(card: ElementRef<'_>) -> Option<String> {
    extract::closest_anchor(card)
        .and_then(|anchor| anchor.value().attr("href"))
        .map(str::to_owned)
}
