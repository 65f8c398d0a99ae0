//! File-based content fetcher
//!
//! Browser automation is an external concern; for local runs the fetcher
//! reads a text file, splits it into line snippets, and keeps the ones
//! mentioning the search term, the same contains-the-term filter the
//! scraping side applies, minus the browser.

use async_trait::async_trait;
use graphmill_core::{ContentFetcher, GraphmillError, Result};

/// [`ContentFetcher`] over local text files.
///
/// The `source` passed to [`ContentFetcher::fetch`] is a file path; each
/// non-blank line becomes a snippet. An empty search term keeps everything.
#[derive(Debug, Default)]
pub struct FileFetcher;

impl FileFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentFetcher for FileFetcher {
    async fn fetch(&self, source: &str, search: &str) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(source)
            .await
            .map_err(|e| GraphmillError::Other(anyhow::anyhow!("failed to read {source}: {e}")))?;

        let search_lower = search.to_lowercase();

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| search.is_empty() || line.to_lowercase().contains(&search_lower))
            .map(str::to_string)
            .collect())
    }
}
