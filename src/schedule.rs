//! The broadcast schedule.
//!
//! The site has published its schedule in more than one layout, and which one
//! a page uses is detected from the markup:
//!
//! - Day blocks: one block per weekday, each with an `h1` and a category list
//!   of `<title>, <day>, <H>:<MM>` lines. A schedule table may accompany it.
//! - Season blocks: a header per season followed by one card per title.
//! - A bare schedule table.
//!
//! Only the day block layout links to title pages, so only it gets artwork
//! backfilled, see [`enrichment`].

pub mod enrichment;

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    extract::{self, Strategy, selector},
    heuristics,
    stdx::error::{Assumption, degrade},
};

const DAY_BLOCKS: &[Strategy] = &[Strategy::Select("div.unduhan")];
const DAY_ENTRIES: &str = "ul.lcp_catlist li";

const SEASON_HEADER: &str = "div.season-header";
const SEASON_TITLE: &str = "h3 a, h4 a";
const SEASON_INFO: &str = "span.info-item";
const SEASON_GENRES: &str = "div.genres a";

/// The page layouts a schedule can be extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSchema {
    /// One block per weekday.
    DayBlocks,
    /// One block per season.
    SeasonBlocks,
    /// Only the schedule table.
    Table,
}

/// How the layout of a schedule page is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaSelection {
    /// Use the first layout whose marker is present, in the order of
    /// [`ScheduleSchema`]'s variants.
    #[default]
    Detect,
    /// Always extract this layout, even if its marker is missing.
    Force(ScheduleSchema),
}

/// A title airing on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Link text.
    pub title: String,
    /// The title's page.
    pub url: Option<String>,
    /// The trailing `<day>, <H>:<MM>` of the schedule line.
    pub broadcast_time: Option<String>,
    /// Artwork, or the configured placeholder once enriched.
    pub image_url: Option<String>,
}

/// Every title airing on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    /// The day heading.
    pub day: String,
    /// Titles in page order.
    pub anime_list: Vec<ScheduleEntry>,
}

/// A row of the schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Title, from the link when the cell has one.
    pub title: String,
    /// The link in the title cell.
    pub url: Option<String>,
    /// Day column.
    pub day: String,
    /// Time column.
    pub time: String,
}

/// A title card in a season block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonEntry {
    /// Title from the card heading.
    pub title: String,
    /// First info item.
    pub broadcast_time: Option<String>,
    /// Second info item.
    pub details: Option<String>,
    /// Genre links.
    pub genres: Vec<String>,
}

/// Every title card under one season header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonGroup {
    /// The header text.
    pub season_name: String,
    /// Cards in page order.
    pub anime_list: Vec<SeasonEntry>,
}

/// A schedule, in the layout it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum Schedule {
    /// Extracted from day blocks.
    DayBlocks {
        /// Titles grouped by day.
        schedule_by_day: Vec<ScheduleDay>,
        /// The accompanying schedule table, if any.
        table: Vec<TableEntry>,
    },
    /// Extracted from season blocks.
    SeasonBlocks {
        /// Titles grouped by season.
        seasons: Vec<SeasonGroup>,
    },
    /// Extracted from the schedule table alone.
    Table {
        /// Table rows.
        table: Vec<TableEntry>,
    },
}

impl Schedule {
    /// The layout this schedule came from.
    #[must_use]
    pub fn schema(&self) -> ScheduleSchema {
        match self {
            Self::DayBlocks { .. } => ScheduleSchema::DayBlocks,
            Self::SeasonBlocks { .. } => ScheduleSchema::SeasonBlocks,
            Self::Table { .. } => ScheduleSchema::Table,
        }
    }

    /// The number of day blocks.
    #[must_use]
    pub fn days_count(&self) -> usize {
        match self {
            Self::DayBlocks {
                schedule_by_day, ..
            } => schedule_by_day.len(),
            Self::SeasonBlocks { .. } | Self::Table { .. } => 0,
        }
    }

    /// The number of titles across every day or season block.
    #[must_use]
    pub fn anime_count(&self) -> usize {
        match self {
            Self::DayBlocks {
                schedule_by_day, ..
            } => schedule_by_day.iter().map(|day| day.anime_list.len()).sum(),
            Self::SeasonBlocks { seasons } => {
                seasons.iter().map(|season| season.anime_list.len()).sum()
            }
            Self::Table { .. } => 0,
        }
    }

    /// The number of schedule table rows.
    #[must_use]
    pub fn table_count(&self) -> usize {
        match self {
            Self::DayBlocks { table, .. } | Self::Table { table } => table.len(),
            Self::SeasonBlocks { .. } => 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.anime_count() == 0 && self.table_count() == 0
    }
}

/// Extracts a schedule, or `None` if the page yields no layout or no records.
#[instrument(name = "parsing schedule", skip_all, fields(?selection))]
pub(crate) fn parse(body: &str, selection: SchemaSelection) -> Option<Schedule> {
    let html = Html::parse_document(body);
    let root = html.root_element();

    let schema = match selection {
        SchemaSelection::Force(schema) => schema,
        SchemaSelection::Detect => detect(root)?,
    };

    debug!(?schema, "extracting schedule");

    let schedule = match schema {
        ScheduleSchema::DayBlocks => Schedule::DayBlocks {
            schedule_by_day: days(root),
            table: degrade("schedule table", table(root), Vec::new()),
        },
        ScheduleSchema::SeasonBlocks => Schedule::SeasonBlocks {
            seasons: degrade("season blocks", seasons(root), Vec::new()),
        },
        ScheduleSchema::Table => Schedule::Table {
            table: degrade("schedule table", table(root), Vec::new()),
        },
    };

    (!schedule.is_empty()).then_some(schedule)
}

/// The first layout whose characteristic marker is on the page.
fn detect(root: ElementRef<'_>) -> Option<ScheduleSchema> {
    let markers = [
        (ScheduleSchema::DayBlocks, "div.unduhan h1"),
        (ScheduleSchema::SeasonBlocks, SEASON_HEADER),
        (ScheduleSchema::Table, "table"),
    ];

    markers
        .into_iter()
        .find(|(_, marker)| degrade("schedule marker", extract::has(root, marker), false))
        .map(|(schema, _)| schema)
}

fn days(root: ElementRef<'_>) -> Vec<ScheduleDay> {
    extract::resolve(root, DAY_BLOCKS)
        .into_iter()
        .filter_map(|block| degrade("day block", day(block), None))
        .collect()
}

fn day(block: ElementRef<'_>) -> Result<Option<ScheduleDay>, Assumption> {
    let Some(heading) = extract::first(block, "h1")? else {
        return Ok(None);
    };

    let link = selector("a")?;

    let anime_list: Vec<ScheduleEntry> = block
        .select(&selector(DAY_ENTRIES)?)
        .filter_map(|item| {
            let anchor = item.select(&link).next()?;

            Some(ScheduleEntry {
                title: extract::text(anchor),
                url: anchor.value().attr("href").map(str::to_owned),
                broadcast_time: heuristics::broadcast_time(&extract::text(item)),
                image_url: None,
            })
        })
        .collect();

    if anime_list.is_empty() {
        return Ok(None);
    }

    Ok(Some(ScheduleDay {
        day: extract::text(heading),
        anime_list,
    }))
}

// The first table on the page, header row skipped.
fn table(root: ElementRef<'_>) -> Result<Vec<TableEntry>, Assumption> {
    let Some(table) = extract::first(root, "table")? else {
        return Ok(Vec::new());
    };

    let cell = selector("td")?;
    let link = selector("a")?;

    let rows = table
        .select(&selector("tr")?)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&cell).collect();

            let [name, day, time, ..] = cells.as_slice() else {
                return None;
            };

            let anchor = name.select(&link).next();

            Some(TableEntry {
                title: extract::text(anchor.unwrap_or(*name)),
                url: anchor
                    .and_then(|anchor| anchor.value().attr("href"))
                    .map(str::to_owned),
                day: extract::text(*day),
                time: extract::text(*time),
            })
        })
        .collect();

    Ok(rows)
}

fn seasons(root: ElementRef<'_>) -> Result<Vec<SeasonGroup>, Assumption> {
    let header = selector(SEASON_HEADER)?;

    let mut seasons = Vec::new();

    for season in root.select(&header) {
        let mut anime_list = Vec::new();

        // Everything up to the next header belongs to this season.
        for sibling in season
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|sibling| !header.matches(sibling))
        {
            if let Some(entry) = degrade("season entry", season_entry(sibling), None) {
                anime_list.push(entry);
            }
        }

        if anime_list.is_empty() {
            continue;
        }

        seasons.push(SeasonGroup {
            season_name: extract::collapsed_text(season),
            anime_list,
        });
    }

    Ok(seasons)
}

fn season_entry(card: ElementRef<'_>) -> Result<Option<SeasonEntry>, Assumption> {
    let Some(title) = extract::first(card, SEASON_TITLE)? else {
        return Ok(None);
    };

    let info_item = selector(SEASON_INFO)?;

    let mut info = card
        .select(&info_item)
        .map(extract::collapsed_text)
        .map(|text| (!text.is_empty()).then_some(text));

    let broadcast_time = info.next().flatten();
    let details = info.next().flatten();

    let genres = card
        .select(&selector(SEASON_GENRES)?)
        .map(extract::text)
        .filter(|genre| !genre.is_empty())
        .collect();

    Ok(Some(SeasonEntry {
        title: extract::text(title),
        broadcast_time,
        details,
        genres,
    }))
}
