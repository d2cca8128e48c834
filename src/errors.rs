//! Errors that can happen when extracting pages from `anoboy`.

use std::fmt;

use thiserror::Error;

/// The page an operation was extracting when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// The homepage listing.
    Home,
    /// The alphabetical catalog.
    Catalog,
    /// A title's episode list.
    Episodes,
    /// A single episode's streaming and download detail.
    Detail,
    /// The broadcast schedule.
    Schedule,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Home => "homepage",
            Self::Catalog => "anime list",
            Self::Episodes => "episode list",
            Self::Detail => "anime detail",
            Self::Schedule => "schedule",
        };

        f.write_str(name)
    }
}

/// A transport level failure returned by a [`Fetch`](crate::Fetch) implementation.
///
/// Every variant is treated the same way by the extraction engine: the fetch
/// did not produce a body.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or its body could not be read.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    /// The server answered with a non-success status code.
    #[error("server responded with status `{0}`")]
    Status(u16),
    /// The request did not complete within its timeout.
    #[error("request timed out")]
    Timeout,
    /// Any other failure from a custom transport.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// An error returned by the page operations on [`Client`](crate::Client).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The page was fetched and parsed, but yielded no records.
    #[error("no records found on the {0}")]
    NotFound(Page),
    /// The page itself could not be fetched.
    #[error("failed to fetch the {page} at `{url}`: {source}")]
    ExtractionFailed {
        /// The page that was being extracted.
        page: Page,
        /// The URL that was requested.
        url: String,
        /// The transport failure.
        #[source]
        source: FetchError,
    },
}

/// An error that can happen when building a [`Client`](crate::Client).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientBuilderError {
    /// The underlying HTTP client could not be built.
    #[error("failed to build the http client")]
    BuildFailed,
    /// The configured base URL is not a valid absolute URL.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    /// The configured base URL cannot have paths joined onto it.
    #[error("base url `{0}` cannot be used as a base for other urls")]
    CannotBeABase(String),
}
