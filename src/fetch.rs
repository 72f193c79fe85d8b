//! Network fetch collaborator for inventory documents.
//!
//! The cache only needs one capability from the transport layer: fetch a
//! URL into memory. [`HttpFetcher`] is the production implementation;
//! [`StaticFetcher`] is an in-memory double for tests.

use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;

use log::debug;

use crate::error::{DocdexError, Result};

/// A collaborator that retrieves the raw bytes of an inventory document.
///
/// Implementations must follow redirects transparently and fail with
/// [`DocdexError::Fetch`] on non-success responses or transport errors.
pub trait Fetch {
    /// Fetch `url` fully into memory.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Overall deadline for one fetch, connection included.
    pub timeout: Duration,

    /// Maximum number of redirects to follow.
    pub max_redirects: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: Duration::from_secs(30),
            max_redirects: 8,
        }
    }
}

/// Blocking HTTP(S) fetcher backed by a `ureq` agent.
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .redirects(config.max_redirects)
            .build();
        HttpFetcher { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        HttpFetcher::new(FetchConfig::default())
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("fetching {url}");
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _response) => {
                DocdexError::fetch_status(code, format!("server returned status {code} for {url}"))
            }
            ureq::Error::Transport(transport) => {
                DocdexError::fetch_transport(format!("transport error for {url}: {transport}"))
            }
        })?;

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| DocdexError::fetch_transport(format!("read error for {url}: {e}")))?;
        Ok(body)
    }
}

/// In-memory fetcher serving a fixed URL-to-bytes map.
///
/// URLs with no registered document fail the way a 404 would, which makes
/// this double usable for both happy-path and fetch-failure tests.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    documents: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        StaticFetcher::default()
    }

    /// Register a document, builder-style.
    pub fn with_document<S: Into<String>, B: Into<Vec<u8>>>(mut self, url: S, body: B) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }
}

impl Fetch for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.documents.get(url).cloned().ok_or_else(|| {
            DocdexError::fetch_status(404, format!("no document registered for {url}"))
        })
    }
}
