//! Filter list download.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::ListError;

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ListError>> + Send + 'a>>;

/// Source of filter list text.
pub trait ListFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// Fetches lists over HTTP(S).
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ListError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cf-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ListError::Client)?;
        Ok(Self { client })
    }
}

impl ListFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let fetch_error = |source: reqwest::Error| ListError::Fetch {
                url: url.to_string(),
                source,
            };

            let response = self.client.get(url).send().await.map_err(fetch_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(ListError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let text = response.text().await.map_err(fetch_error)?;
            tracing::debug!(url, bytes = text.len(), "fetched list");
            Ok(text)
        })
    }
}

/// `true` for inputs that should be downloaded rather than read from disk.
pub fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}
