//! The transport seam: anything that can turn a URL into a body.

use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::errors::{ClientBuilderError, FetchError};

/// Fetches raw page bodies for the extraction engine.
///
/// Implementations own request issuance and timeout enforcement. Any
/// non-success outcome must be reported as a [`FetchError`]; the engine treats
/// all of them the same.
///
/// Fetches are awaited one at a time, in document order, so an
/// implementation never sees concurrent calls from a single operation.
pub trait Fetch: Send + Sync {
    /// Fetches `url`, sending `headers`, giving up after `timeout`.
    fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

impl<T: Fetch> Fetch for Arc<T> {
    fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, FetchError>> + Send {
        T::fetch(self, url, headers, timeout)
    }
}

/// The default [`Fetch`] implementation, backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub(crate) fn new() -> Result<Self, ClientBuilderError> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .brotli(true)
            .build()
            .map_err(|_err| ClientBuilderError::BuildFailed)?;

        Ok(Self { http })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let mut request = self.http.get(url).timeout(timeout);

        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(classify)
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(err)
    }
}
