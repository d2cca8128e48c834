use std::{collections::HashMap, time::Duration};

use anoboy::{
    Client, ClientBuilder, Enrichment, Fetch, Schedule, ScheduleSchema, SchemaSelection,
    catalog::FLAT_GROUP,
    errors::{FetchError, Page, ScrapeError},
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

/// A scripted answer. `FetchError` is not `Clone`, so errors are rebuilt
/// each time they are served.
#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Timeout,
    Status(u16),
}

impl Reply {
    fn serve(&self) -> Result<String, FetchError> {
        match self {
            Self::Body(body) => Ok(body.clone()),
            Self::Timeout => Err(FetchError::Timeout),
            Self::Status(status) => Err(FetchError::Status(*status)),
        }
    }
}

/// Serves canned bodies by URL and records every request, including the
/// `User-Agent` it carried.
#[derive(Default)]
struct Site {
    pages: Mutex<HashMap<String, Vec<Reply>>>,
    requests: Mutex<Vec<(String, Option<String>, Duration)>>,
}

impl Site {
    fn page(self, url: &str, body: &str) -> Self {
        self.script(url, Reply::Body(body.to_owned()))
    }

    fn failing(self, url: &str, reply: Reply) -> Self {
        self.script(url, reply)
    }

    // Replies for a URL are served in the order they were scripted. The last
    // one keeps being served.
    fn script(self, url: &str, reply: Reply) -> Self {
        self.pages
            .lock()
            .entry(url.to_owned())
            .or_default()
            .push(reply);
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|(url, _, _)| url.clone())
            .collect()
    }
}

impl Fetch for Site {
    async fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        self.requests
            .lock()
            .push((url.to_owned(), headers.get("User-Agent").cloned(), timeout));

        let mut pages = self.pages.lock();

        let Some(replies) = pages.get_mut(url) else {
            return Err(FetchError::Status(404));
        };

        if replies.len() > 1 {
            return replies.remove(0).serve();
        }

        replies
            .first()
            .map_or(Err(FetchError::Status(404)), Reply::serve)
    }
}

fn client(site: Site) -> Client<Site> {
    ClientBuilder::new()
        .retry_delay(Duration::ZERO)
        .build_with(site)
        .unwrap()
}

const SCHEDULE_URL: &str =
    "https://ww1.anoboy.app/2015/05/anime-subtitle-indonesia-ini-adalah-arsip-file-kami/";

const SCHEDULE: &str = r#"
    <div class="unduhan">
        <h1>Sabtu</h1>
        <ul class="lcp_catlist">
            <li><a href="/anime/kaiju-no-8/">Kaiju No. 8</a>, Sabtu, 23:00</li>
            <li><a href="/anime/kaiju-no-8/">Kaiju No. 8</a> (Batch)</li>
            <li><a href="/anime/one-piece/">One Piece</a>, Sabtu, 20:00</li>
        </ul>
    </div>
    <div class="unduhan">
        <h1>Minggu</h1>
        <ul class="lcp_catlist">
            <li><a href="/anime/boruto/">Boruto</a>, Minggu, 17:30</li>
        </ul>
    </div>
"#;

const KAIJU: &str = r#"
    <meta property="og:image" content="https://ww1.anoboy.app/og/kaiju.jpg">
    <div class="column-content">
        <amp-img src="/wp-content/uploads/2024/04/kaiju.jpg" width="151" height="215"></amp-img>
    </div>
"#;

const BORUTO: &str = r#"
    <img src="lazy-placeholder.gif">
    <script>var art = "https://cdn.example.com/wp-content/uploads/boruto.webp";</script>
"#;

#[tokio::test]
async fn home_without_cards_is_not_found() {
    let client = client(Site::default().page("https://ww1.anoboy.app/", "<p>maintenance</p>"));

    let err = client.home().await.unwrap_err();

    assert!(matches!(err, ScrapeError::NotFound(Page::Home)));
}

#[tokio::test]
async fn failed_page_fetch_is_extraction_failure() {
    let client = client(
        Site::default().failing("https://ww1.anoboy.app/anime-list/", Reply::Timeout),
    );

    let err = client.catalog().await.unwrap_err();

    match err {
        ScrapeError::ExtractionFailed { page, url, source } => {
            assert_eq!(Page::Catalog, page);
            assert_eq!("https://ww1.anoboy.app/anime-list/", url);
            assert!(matches!(source, FetchError::Timeout));
        }
        err => panic!("expected an extraction failure, got {err:?}"),
    }
}

#[tokio::test]
async fn server_error_status_is_kept_in_extraction_failure() {
    let client = client(
        Site::default().failing("https://ww1.anoboy.app/one-piece-episode-1105/", Reply::Status(503)),
    );

    let err = client.detail("one-piece-episode-1105/").await.unwrap_err();

    match err {
        ScrapeError::ExtractionFailed { page, source, .. } => {
            assert_eq!(Page::Detail, page);
            assert!(matches!(source, FetchError::Status(503)));
        }
        err => panic!("expected an extraction failure, got {err:?}"),
    }
}

#[tokio::test]
async fn catalog_without_groups_is_one_flat_group() {
    let client = client(Site::default().page(
        "https://ww1.anoboy.app/anime-list/",
        r#"<ul><li><a href="/anime/akira/">Akira</a></li><li><a href="/anime/bleach/">Bleach</a></li></ul>"#,
    ));

    let catalog = client.catalog().await.unwrap();

    assert_eq!(1, catalog.groups.len());
    assert_eq!(FLAT_GROUP, catalog.groups[0].group_label);
    assert_eq!(2, catalog.total());
}

#[tokio::test]
async fn episodes_are_found_by_title_slug() {
    let client = client(Site::default().page(
        "https://ww1.anoboy.app/kaiju-no.-8/",
        r#"
        <h1>Kaiju No. 8</h1>
        <ul class="lcp_catlist">
            <li><a href="/ep-12/">Kaiju No. 8 Episode 12</a></li>
            <li><a href="/ep-2/">Kaiju No. 8 Episode 2</a></li>
            <li><a href="/sp/">Kaiju No. 8 Special</a></li>
        </ul>
        "#,
    ));

    let list = client.episodes_by_title("Kaiju  No. 8/").await.unwrap();

    let numbers: Vec<&str> = list.episodes.iter().map(|ep| ep.number.as_str()).collect();
    assert_eq!(vec!["2", "12", "Unknown"], numbers);
    assert_eq!(3, list.total());
}

#[tokio::test]
async fn episode_list_without_episodes_is_not_found() {
    let client = client(Site::default().page("https://ww1.anoboy.app/anime/x/", "<h1>X</h1>"));

    let err = client.episodes("/anime/x/").await.unwrap_err();

    assert!(matches!(err, ScrapeError::NotFound(Page::Episodes)));
}

#[tokio::test]
async fn detail_of_unrelated_page_is_not_found() {
    let client = client(Site::default().page("https://ww1.anoboy.app/404/", "<p>404</p>"));

    let err = client.detail("404/").await.unwrap_err();

    assert!(matches!(err, ScrapeError::NotFound(Page::Detail)));
}

#[tokio::test]
async fn schedule_artwork_is_shared_by_title() {
    let site = Site::default()
        .page(SCHEDULE_URL, SCHEDULE)
        .page("https://ww1.anoboy.app/anime/kaiju-no-8/", KAIJU)
        .failing("https://ww1.anoboy.app/anime/boruto/", Reply::Timeout)
        .page("https://ww1.anoboy.app/anime/boruto/", BORUTO);

    let client = client(site);

    let schedule = client.schedule().await.unwrap();

    assert_eq!(ScheduleSchema::DayBlocks, schedule.schema());
    assert_eq!(2, schedule.days_count());
    assert_eq!(4, schedule.anime_count());

    let Schedule::DayBlocks {
        schedule_by_day, ..
    } = &schedule
    else {
        panic!("expected a day block schedule");
    };

    let saturday: Vec<(&str, Option<&str>, Option<&str>)> = schedule_by_day[0]
        .anime_list
        .iter()
        .map(|anime| {
            (
                anime.title.as_str(),
                anime.broadcast_time.as_deref(),
                anime.image_url.as_deref(),
            )
        })
        .collect();

    let kaiju = Some("https://ww1.anoboy.app/wp-content/uploads/2024/04/kaiju.jpg");

    assert_eq!(
        vec![
            ("Kaiju No. 8", Some("Sabtu, 23:00"), kaiju),
            ("Kaiju No. 8", None, kaiju),
            ("One Piece", Some("Sabtu, 20:00"), Some(anoboy::client::DEFAULT_IMAGE)),
        ],
        saturday
    );

    // Found on the retry, in the raw markup.
    assert_eq!(
        Some("https://cdn.example.com/wp-content/uploads/boruto.webp"),
        schedule_by_day[1].anime_list[0].image_url.as_deref()
    );

    assert_eq!(
        vec![
            SCHEDULE_URL.to_owned(),
            "https://ww1.anoboy.app/anime/kaiju-no-8/".to_owned(),
            "https://ww1.anoboy.app/anime/one-piece/".to_owned(),
            "https://ww1.anoboy.app/anime/one-piece/".to_owned(),
            "https://ww1.anoboy.app/anime/boruto/".to_owned(),
            "https://ww1.anoboy.app/anime/boruto/".to_owned(),
        ],
        client.fetcher().requested()
    );
}

#[tokio::test]
async fn independent_enrichment_looks_up_every_entry() {
    let site = Site::default()
        .page(SCHEDULE_URL, SCHEDULE)
        .page("https://ww1.anoboy.app/anime/kaiju-no-8/", KAIJU);

    let client = ClientBuilder::new()
        .retry_delay(Duration::ZERO)
        .default_image("https://example.com/missing.png")
        .enrichment(Enrichment::Independent)
        .build_with(site)
        .unwrap();

    let Schedule::DayBlocks {
        schedule_by_day, ..
    } = client.schedule().await.unwrap()
    else {
        panic!("expected a day block schedule");
    };

    let images: Vec<&str> = schedule_by_day
        .iter()
        .flat_map(|day| &day.anime_list)
        .filter_map(|anime| anime.image_url.as_deref())
        .collect();

    assert_eq!(
        vec![
            "https://ww1.anoboy.app/wp-content/uploads/2024/04/kaiju.jpg",
            "https://ww1.anoboy.app/wp-content/uploads/2024/04/kaiju.jpg",
            "https://example.com/missing.png",
            "https://example.com/missing.png",
        ],
        images
    );
}

#[tokio::test]
async fn schedule_without_layout_is_not_found() {
    let client = client(Site::default().page(SCHEDULE_URL, "<p>Jadwal libur</p>"));

    let err = client.schedule().await.unwrap_err();

    assert!(matches!(err, ScrapeError::NotFound(Page::Schedule)));
}

#[tokio::test]
async fn forced_schema_reads_only_table() {
    let site = Site::default().page(
        "https://ww1.anoboy.app/jadwal/",
        r#"
        <div class="unduhan"><h1>Senin</h1><ul class="lcp_catlist"><li><a href="/a/">A</a></li></ul></div>
        <table>
            <tr><th>Judul</th><th>Hari</th><th>Jam</th></tr>
            <tr><td><a href="/a/">A</a></td><td>Senin</td><td>20:00</td></tr>
        </table>
        "#,
    );

    let client = ClientBuilder::new()
        .schedule_schema(SchemaSelection::Force(ScheduleSchema::Table))
        .build_with(site)
        .unwrap();

    let schedule = client.schedule_from("/jadwal/").await.unwrap();

    assert_eq!(ScheduleSchema::Table, schedule.schema());
    assert_eq!(1, schedule.table_count());
    assert_eq!(
        vec!["https://ww1.anoboy.app/jadwal/".to_owned()],
        client.fetcher().requested()
    );
}

#[tokio::test]
async fn requests_carry_agent_and_timeout() {
    let site = Site::default().page("https://ww1.anoboy.app/", "<p>maintenance</p>");

    let client = ClientBuilder::new()
        .user_agent("anoboy-test/1.0")
        .page_timeout(Duration::from_secs(3))
        .build_with(site)
        .unwrap();

    let _err = client.home().await.unwrap_err();

    let requests = client.fetcher().requests.lock().clone();
    assert_eq!(
        vec![(
            "https://ww1.anoboy.app/".to_owned(),
            Some("anoboy-test/1.0".to_owned()),
            Duration::from_secs(3),
        )],
        requests
    );
}
