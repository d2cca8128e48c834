//! The episode list of a single title.

use std::{cmp::Ordering, collections::BTreeMap};

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    extract::{self, Strategy, selector},
    heuristics::{self, UNKNOWN},
    stdx::error::{Assumption, degrade},
};

// Each layout the site has used for the episode block, newest first.
const CONTAINERS: &[Strategy] = &[
    Strategy::Select("div.singlelink"),
    Strategy::NextSibling {
        anchor: "div.hq",
        sibling: "div",
    },
    Strategy::Select("ul.lcp_catlist"),
    Strategy::Select("div.episodes"),
];

/// One episode link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeEntry {
    /// Link text.
    pub title: String,
    /// Episode number as digits, or `Unknown`.
    pub number: String,
    /// Link target.
    pub url: Option<String>,
}

/// Everything on a title's episode list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeList {
    /// Page heading, or `Unknown`.
    pub title: String,
    /// Episodes in ascending number order, unnumbered ones last.
    pub episodes: Vec<EpisodeEntry>,
    /// Rows of the info table, keyed by header.
    pub metadata: BTreeMap<String, String>,
    /// Synopsis, empty when the page has none.
    pub description: String,
}

impl EpisodeList {
    /// The number of episodes listed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.episodes.len()
    }
}

#[instrument(name = "parsing episode list", skip_all)]
pub(crate) fn parse(body: &str) -> EpisodeList {
    let html = Html::parse_document(body);
    let root = html.root_element();

    let mut episodes = degrade("episodes", episodes(root), Vec::new());
    sort(&mut episodes);

    EpisodeList {
        title: degrade("title", title(root), UNKNOWN.to_owned()),
        episodes,
        metadata: degrade("metadata", extract::metadata(root, "table tr"), BTreeMap::new()),
        description: degrade("description", description(root), String::new()),
    }
}

fn title(root: ElementRef<'_>) -> Result<String, Assumption> {
    Ok(extract::text_of(root, "h1")?.unwrap_or_else(|| UNKNOWN.to_owned()))
}

fn description(root: ElementRef<'_>) -> Result<String, Assumption> {
    Ok(extract::text_of(root, "div.unduhan")?.unwrap_or_default())
}

fn episodes(root: ElementRef<'_>) -> Result<Vec<EpisodeEntry>, Assumption> {
    let containers = extract::resolve(root, CONTAINERS);

    let item = selector("li")?;
    let link = selector("a")?;

    let items: Vec<ElementRef<'_>> = containers
        .iter()
        .flat_map(|container| container.select(&item))
        .filter_map(|item| item.select(&link).next())
        .collect();

    let links = if items.is_empty() {
        debug!("no linked list items in episode container, scanning links directly");
        containers
            .iter()
            .flat_map(|container| container.select(&link))
            .collect()
    } else {
        items
    };

    Ok(links.into_iter().map(entry).collect())
}

fn entry(link: ElementRef<'_>) -> EpisodeEntry {
    let title = extract::text(link);

    EpisodeEntry {
        number: heuristics::episode_number(&title),
        url: link.value().attr("href").map(str::to_owned),
        title,
    }
}

/// Sorts episodes by ascending number, unnumbered episodes last.
///
/// The sort is stable, so episodes that compare equal keep the order they
/// were extracted in.
pub fn sort(episodes: &mut [EpisodeEntry]) {
    episodes.sort_by(|a, b| compare(&a.number, &b.number));
}

/// How an episode number takes part in ordering.
#[derive(Debug, PartialEq, Eq)]
enum Key<'a> {
    /// Digits, stripped of leading zeros.
    Number(&'a str),
    /// The `Unknown` sentinel, ordered after every number.
    Unknown,
    /// Anything else, ordered after `Unknown`.
    Unparsable,
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(number: &'a str) -> Self {
        if number == UNKNOWN {
            Self::Unknown
        } else if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
            let trimmed = number.trim_start_matches('0');
            Self::Number(if trimmed.is_empty() { "0" } else { trimmed })
        } else {
            Self::Unparsable
        }
    }
}

/// Compares two episode numbers.
///
/// Numbers compare by value, `Unknown` acts as infinity, and anything that is
/// neither sorts after both. Two `Unknown`s, or two unparsable values, are
/// equal.
fn compare(a: &str, b: &str) -> Ordering {
    match (Key::from(a), Key::from(b)) {
        // Digits without leading zeros: longer is larger, same length is lexical.
        (Key::Number(a), Key::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        (Key::Number(_), Key::Unknown | Key::Unparsable) | (Key::Unknown, Key::Unparsable) => {
            Ordering::Less
        }
        (Key::Unknown | Key::Unparsable, Key::Number(_)) | (Key::Unparsable, Key::Unknown) => {
            Ordering::Greater
        }
        (Key::Unknown, Key::Unknown) | (Key::Unparsable, Key::Unparsable) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(episodes: &[EpisodeEntry]) -> Vec<&str> {
        episodes.iter().map(|episode| episode.number.as_str()).collect()
    }

    fn episode(title: &str, number: &str) -> EpisodeEntry {
        EpisodeEntry {
            title: title.to_owned(),
            number: number.to_owned(),
            url: None,
        }
    }

    #[test]
    fn should_sort_numerically_with_unknown_last() {
        let mut episodes = vec![
            episode("OVA", UNKNOWN),
            episode("Episode 10", "10"),
            episode("Special", UNKNOWN),
            episode("Episode 2", "2"),
            episode("Episode 002", "002"),
            episode("Episode 1", "1"),
        ];

        sort(&mut episodes);

        assert_eq!(vec!["1", "2", "002", "10", UNKNOWN, UNKNOWN], numbers(&episodes));
        // Equal keys keep extraction order.
        assert_eq!("Episode 2", episodes[1].title);
        assert_eq!("OVA", episodes[4].title);
        assert_eq!("Special", episodes[5].title);
    }

    #[test]
    fn should_order_unparsable_after_unknown() {
        let mut episodes = vec![
            episode("a", "12.5"),
            episode("b", UNKNOWN),
            episode("c", "3"),
            episode("d", ""),
        ];

        sort(&mut episodes);

        assert_eq!(vec!["3", UNKNOWN, "12.5", ""], numbers(&episodes));
    }

    #[test]
    fn should_compare_numbers_beyond_machine_integers() {
        assert_eq!(
            Ordering::Less,
            compare("99999999999999999999", "100000000000000000000")
        );
        assert_eq!(Ordering::Equal, compare("0", "000"));
    }

    #[test]
    fn should_never_place_number_after_unknown() {
        let mut episodes: Vec<EpisodeEntry> = [UNKNOWN, "5", UNKNOWN, "3", "40", UNKNOWN, "1"]
            .iter()
            .map(|number| episode("x", number))
            .collect();

        sort(&mut episodes);

        let first_unknown = episodes
            .iter()
            .position(|episode| episode.number == UNKNOWN)
            .unwrap();
        assert!(episodes[first_unknown..].iter().all(|episode| episode.number == UNKNOWN));

        let values: Vec<u32> = episodes[..first_unknown]
            .iter()
            .map(|episode| episode.number.parse().unwrap())
            .collect();
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn should_parse_list_items_in_singlelink() {
        let list = parse(
            r#"
            <h1>Boruto: Naruto Next Generations</h1>
            <div class="unduhan">Sinopsis Boruto.</div>
            <table>
                <tr><th>Status</th><td>Completed</td></tr>
                <tr><th>Episode</th><td>293</td></tr>
            </table>
            <div class="singlelink">
                <ul>
                    <li><a href="/boruto-episode-3/">Boruto Episode 3</a></li>
                    <li><a href="/boruto-ova/">Boruto OVA</a></li>
                    <li><a href="/boruto-episode-1/">Boruto Episode 1</a></li>
                    <li>Coming soon</li>
                </ul>
            </div>
            "#,
        );

        assert_eq!("Boruto: Naruto Next Generations", list.title);
        assert_eq!("Sinopsis Boruto.", list.description);
        assert_eq!("Completed", list.metadata["Status"]);
        assert_eq!(
            vec![
                EpisodeEntry {
                    title: "Boruto Episode 1".to_owned(),
                    number: "1".to_owned(),
                    url: Some("/boruto-episode-1/".to_owned()),
                },
                EpisodeEntry {
                    title: "Boruto Episode 3".to_owned(),
                    number: "3".to_owned(),
                    url: Some("/boruto-episode-3/".to_owned()),
                },
                EpisodeEntry {
                    title: "Boruto OVA".to_owned(),
                    number: UNKNOWN.to_owned(),
                    url: Some("/boruto-ova/".to_owned()),
                },
            ],
            list.episodes
        );
    }

    #[test]
    fn should_use_div_after_heading_block() {
        let list = parse(
            r#"
            <div class="hq">Download HQ</div>
            <div>
                <a href="/ep-2/">Episode 2</a>
                <a href="/ep-1/">Episode 1</a>
            </div>
            <div class="episodes"><a href="/wrong/">Episode 99</a></div>
            "#,
        );

        assert_eq!(vec!["1", "2"], numbers(&list.episodes));
        assert_eq!(UNKNOWN, list.title);
        assert!(list.metadata.is_empty());
        assert_eq!("", list.description);
    }

    #[test]
    fn should_fall_through_to_generic_episode_block() {
        let list = parse(r#"<div class="episodes"><a href="/ep-7/">Episode 7</a></div>"#);
        assert_eq!(vec!["7"], numbers(&list.episodes));
    }

    #[test]
    fn should_sort_non_ascii_numbered_episodes_as_unknown() {
        let list = parse(
            r#"<div class="episodes">
                <a href="/ep-12/">Kaiju Episode １２</a>
                <a href="/ep-3/">Kaiju Episode 3</a>
            </div>"#,
        );

        assert_eq!(vec!["3", UNKNOWN], numbers(&list.episodes));
    }

    #[test]
    fn should_be_empty_without_container() {
        let list = parse("<h1>Title</h1><p><a href='/x'>Episode 1</a></p>");
        assert!(list.episodes.is_empty());
        assert_eq!("Title", list.title);
    }
}
