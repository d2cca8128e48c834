//! Represents a client abstraction for `anoboy`.

mod fetch;

pub use fetch::{Fetch, HttpFetcher};

use crate::{
    catalog::{self, Catalog},
    detail::{self, AnimeDetail},
    episodes::{self, EpisodeList},
    errors::{ClientBuilderError, FetchError, Page, ScrapeError},
    heuristics,
    home::{self, AnimeSummary},
    schedule::{self, Schedule, SchemaSelection, enrichment::Enrichment},
    stdx::http::UserAgent,
};

use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{debug, instrument, warn};
use url::Url;

/// The site the extraction engine targets.
pub const BASE_URL: &str = "https://ww1.anoboy.app";

/// The image used for schedule entries whose artwork could not be found.
pub const DEFAULT_IMAGE: &str = "https://via.placeholder.com/225x318?text=No+Image";

const CATALOG_PATH: &str = "anime-list/";
const SCHEDULE_PATH: &str = "2015/05/anime-subtitle-indonesia-ini-adalah-arsip-file-kami/";

/// Settings shared by every operation of a [`Client`].
///
/// Built once by [`ClientBuilder`] and never changed afterwards.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) base: Url,
    pub(crate) user_agent: UserAgent,
    pub(crate) page_timeout: Duration,
    pub(crate) image_timeout: Duration,
    pub(crate) retry_delay: Duration,
    pub(crate) default_image: Arc<str>,
    pub(crate) enrichment: Enrichment,
    pub(crate) schedule: SchemaSelection,
}

/// A builder for configuring and creating instances of [`Client`] with custom settings.
///
/// # Example
///
/// ```
/// # use anoboy::{ClientBuilder, Enrichment};
/// # use std::time::Duration;
/// let client = ClientBuilder::new()
///     .page_timeout(Duration::from_secs(5))
///     .enrichment(Enrichment::Independent)
///     .build()?;
/// # Ok::<(), anoboy::errors::ClientBuilderError>(())
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    user_agent: UserAgent,
    page_timeout: Duration,
    image_timeout: Duration,
    retry_delay: Duration,
    default_image: String,
    enrichment: Enrichment,
    schedule: SchemaSelection,
}

impl Default for ClientBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    ///
    /// Requests go to [`BASE_URL`] with a rotating browser `User-Agent`, a 10
    /// second page timeout and a 20 second image page timeout.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_owned(),
            user_agent: UserAgent::Rotate,
            page_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(20),
            retry_delay: Duration::from_secs(1),
            default_image: DEFAULT_IMAGE.to_owned(),
            enrichment: Enrichment::default(),
            schedule: SchemaSelection::default(),
        }
    }

    /// Points the client at a different host, such as a mirror of the site.
    #[inline]
    #[must_use]
    pub fn base_url(self, base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            ..self
        }
    }

    /// Sends the same `User-Agent` on every request instead of rotating.
    #[inline]
    #[must_use]
    pub fn user_agent(self, user_agent: &str) -> Self {
        Self {
            user_agent: UserAgent::Fixed(user_agent.into()),
            ..self
        }
    }

    /// Timeout for the primary page of each operation.
    #[inline]
    #[must_use]
    pub fn page_timeout(self, timeout: Duration) -> Self {
        Self {
            page_timeout: timeout,
            ..self
        }
    }

    /// Timeout for each page fetched while looking for schedule artwork.
    #[inline]
    #[must_use]
    pub fn image_timeout(self, timeout: Duration) -> Self {
        Self {
            image_timeout: timeout,
            ..self
        }
    }

    /// How long to wait before the single retry of a failed artwork lookup.
    #[inline]
    #[must_use]
    pub fn retry_delay(self, delay: Duration) -> Self {
        Self {
            retry_delay: delay,
            ..self
        }
    }

    /// The placeholder assigned when no artwork could be found for a schedule entry.
    #[inline]
    #[must_use]
    pub fn default_image(self, url: &str) -> Self {
        Self {
            default_image: url.to_owned(),
            ..self
        }
    }

    /// How schedule entries get their artwork backfilled.
    #[inline]
    #[must_use]
    pub fn enrichment(self, enrichment: Enrichment) -> Self {
        Self { enrichment, ..self }
    }

    /// Which schedule page layout to extract.
    #[inline]
    #[must_use]
    pub fn schedule_schema(self, schedule: SchemaSelection) -> Self {
        Self { schedule, ..self }
    }

    /// Consumes the `ClientBuilder` and returns a [`Client`] backed by [`HttpFetcher`].
    ///
    /// # Errors
    ///
    /// Returns a [`ClientBuilderError`] if the base URL is invalid or the HTTP
    /// client could not be built, such as when TLS initialization fails.
    #[inline]
    pub fn build(self) -> Result<Client, ClientBuilderError> {
        let fetcher = HttpFetcher::new()?;
        self.build_with(fetcher)
    }

    /// Consumes the `ClientBuilder` and returns a [`Client`] that fetches through `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientBuilderError`] if the base URL is invalid.
    pub fn build_with<F: Fetch>(self, fetcher: F) -> Result<Client<F>, ClientBuilderError> {
        let mut base = Url::parse(&self.base_url)?;

        if base.cannot_be_a_base() {
            return Err(ClientBuilderError::CannotBeABase(self.base_url));
        }

        // Relative joins replace the last segment unless the path ends in `/`.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let config = Config {
            base,
            user_agent: self.user_agent,
            page_timeout: self.page_timeout,
            image_timeout: self.image_timeout,
            retry_delay: self.retry_delay,
            default_image: self.default_image.into(),
            enrichment: self.enrichment,
            schedule: self.schedule,
        };

        Ok(Client {
            fetcher,
            config: Arc::new(config),
        })
    }
}

/// A high-level, asynchronous client that extracts structured records from `anoboy`.
///
/// Every operation fetches its page, extracts it, and hands back plain data
/// that can be serialized and cached by the caller. Nothing is kept between
/// calls.
///
/// # Example
///
/// ```no_run
/// # use anoboy::Client;
/// # #[tokio::main]
/// # async fn main() -> Result<(), anoboy::errors::ScrapeError> {
/// let client = Client::new();
///
/// for anime in client.home().await? {
///     println!("{}: {:?}", anime.title, anime.episode_url);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client<F = HttpFetcher> {
    pub(crate) fetcher: F,
    pub(crate) config: Arc<Config>,
}

impl Client {
    /// Instantiates a new [`Client`] with the default settings.
    ///
    /// # Panics
    ///
    /// This function will panic if the TLS backend cannot be initialized. For a
    /// `Result` instead, use [`ClientBuilder`].
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        #[expect(
            clippy::expect_used,
            reason = "it is documented that this can panic and that `ClientBuilder` should be used instead for a `Result`"
        )]
        ClientBuilder::new().build().expect("Client::new()")
    }

    /// Returns a [`ClientBuilder`] for customizing the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fetch> Client<F> {
    /// The transport this client fetches through.
    #[inline]
    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns the latest releases listed on the homepage.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::NotFound`] if the homepage lists nothing,
    /// [`ScrapeError::ExtractionFailed`] if it could not be fetched.
    #[instrument(skip(self))]
    pub async fn home(&self) -> Result<Vec<AnimeSummary>, ScrapeError> {
        let url = self.config.base.to_string();
        let body = self.get_page(Page::Home, url).await?;

        let anime = home::parse(&body, &self.config.base);

        if anime.is_empty() {
            return Err(ScrapeError::NotFound(Page::Home));
        }

        Ok(anime)
    }

    /// Returns the full alphabetical catalog.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::NotFound`] if no group has any entries,
    /// [`ScrapeError::ExtractionFailed`] if the page could not be fetched.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Catalog, ScrapeError> {
        let url = self.url_for(CATALOG_PATH);
        let body = self.get_page(Page::Catalog, url).await?;

        let catalog = catalog::parse(&body);

        if catalog.total() == 0 {
            return Err(ScrapeError::NotFound(Page::Catalog));
        }

        Ok(catalog)
    }

    /// Returns the episode list of a title, given its slug, path or full URL.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::NotFound`] if the page lists no episodes,
    /// [`ScrapeError::ExtractionFailed`] if it could not be fetched.
    #[instrument(skip(self))]
    pub async fn episodes(&self, slug: &str) -> Result<EpisodeList, ScrapeError> {
        let url = self.url_for(slug);
        let body = self.get_page(Page::Episodes, url).await?;

        let list = episodes::parse(&body);

        if list.episodes.is_empty() {
            return Err(ScrapeError::NotFound(Page::Episodes));
        }

        Ok(list)
    }

    /// Returns the episode list of a title, guessing its slug from the title.
    ///
    /// The slug is the title lower-cased with whitespace replaced by `-`.
    ///
    /// # Errors
    ///
    /// Same as [`Client::episodes`].
    pub async fn episodes_by_title(&self, title: &str) -> Result<EpisodeList, ScrapeError> {
        self.episodes(&heuristics::slugify(title)).await
    }

    /// Returns streaming and download detail for one episode, given its slug, path or full URL.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::NotFound`] if the page has no title and no links,
    /// [`ScrapeError::ExtractionFailed`] if it could not be fetched.
    #[instrument(skip(self))]
    pub async fn detail(&self, slug: &str) -> Result<AnimeDetail, ScrapeError> {
        let url = self.url_for(slug);
        let body = self.get_page(Page::Detail, url).await?;

        detail::parse(&body).ok_or(ScrapeError::NotFound(Page::Detail))
    }

    /// Returns the broadcast schedule, with artwork backfilled per the configured [`Enrichment`].
    ///
    /// # Errors
    ///
    /// [`ScrapeError::NotFound`] if the page has no recognizable schedule,
    /// [`ScrapeError::ExtractionFailed`] if it could not be fetched. Failing to
    /// find artwork for an entry is never an error.
    pub async fn schedule(&self) -> Result<Schedule, ScrapeError> {
        self.schedule_from(SCHEDULE_PATH).await
    }

    /// Returns the schedule found on another page, given its path or full URL.
    ///
    /// # Errors
    ///
    /// Same as [`Client::schedule`].
    #[instrument(skip(self))]
    pub async fn schedule_from(&self, path: &str) -> Result<Schedule, ScrapeError> {
        let url = self.url_for(path);
        let body = self.get_page(Page::Schedule, url).await?;

        let schedule = schedule::parse(&body, self.config.schedule)
            .ok_or(ScrapeError::NotFound(Page::Schedule))?;

        Ok(schedule::enrichment::enrich(self, schedule).await)
    }
}

// Fetching
impl<F: Fetch> Client<F> {
    pub(crate) async fn get_page(&self, page: Page, url: String) -> Result<String, ScrapeError> {
        debug!(%url, %page, "fetching page");

        let result = self
            .fetcher
            .fetch(&url, &self.headers(), self.config.page_timeout)
            .await;

        result.map_err(|source| {
            warn!(%url, %page, %source, "failed to fetch page");
            ScrapeError::ExtractionFailed { page, url, source }
        })
    }

    pub(crate) async fn get_image_page(&self, url: &str) -> Result<String, FetchError> {
        self.fetcher
            .fetch(url, &self.headers(), self.config.image_timeout)
            .await
    }

    fn headers(&self) -> HashMap<String, String> {
        HashMap::from([(
            "User-Agent".to_owned(),
            self.config.user_agent.pick().to_owned(),
        )])
    }

    /// Resolves a caller supplied slug, site path or full URL to a full URL.
    ///
    /// Leading `/` are dropped so a slug always lands under the base path.
    /// Links read from pages go through `extract::absolute` instead.
    pub(crate) fn url_for(&self, path: &str) -> String {
        let path = path.trim();

        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }

        let path = path.trim_start_matches('/');

        self.config
            .base
            .join(path)
            .map_or_else(|_err| format!("{}{path}", self.config.base), String::from)
    }
}
