//! # Paginated File Enumerator
//!
//! Pull-based cursor over the remote file listing. Each call to
//! [`FilePager::next_batch`] requests one page, ordered by id so pages never
//! overlap even when files are added while the run is in progress.

use crate::error::Result;
use crate::fetch::RetryingFetch;
use bridge_traits::http::HttpRequest;
use core_auth::AuthSession;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Fields requested for every file record
const FILE_FIELDS: &str = "id,type,filename_download";

/// Metadata of one remote file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileRecord {
    pub id: String,
    /// Declared MIME type
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub filename_download: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileListing {
    #[serde(default)]
    data: Vec<FileRecord>,
}

/// Lazy, finite, non-restartable sequence of file-record batches.
pub struct FilePager {
    session: Arc<AuthSession>,
    fetch: Arc<RetryingFetch>,
    page_size: usize,
    /// `None` once the listing is exhausted
    next_page: Option<u32>,
}

impl FilePager {
    pub fn new(session: Arc<AuthSession>, fetch: Arc<RetryingFetch>, page_size: usize) -> Self {
        Self {
            session,
            fetch,
            page_size: page_size.max(1),
            next_page: Some(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_page.is_none()
    }

    fn page_url(&self, page: u32) -> String {
        format!(
            "{}?fields={}&sort=id&limit={}&page={}",
            self.session.endpoints().files(),
            FILE_FIELDS,
            self.page_size,
            page
        )
    }

    /// Fetch the next batch, or `None` when the listing is exhausted.
    ///
    /// A page shorter than the page size is the last one. An empty page ends
    /// the sequence without being yielded.
    #[instrument(skip(self), fields(page = ?self.next_page, page_size = self.page_size))]
    pub async fn next_batch(&mut self) -> Result<Option<Vec<FileRecord>>> {
        let Some(page) = self.next_page else {
            return Ok(None);
        };

        let request = HttpRequest::get(self.page_url(page)).headers(self.session.headers().await?);
        let listing: FileListing = self.fetch.fetch_json(request).await?;
        let batch = listing.data;

        if batch.is_empty() {
            debug!("Empty page, listing exhausted");
            self.next_page = None;
            return Ok(None);
        }

        self.next_page = if batch.len() >= self.page_size {
            Some(page + 1)
        } else {
            None
        };

        debug!(records = batch.len(), "Fetched file page");
        Ok(Some(batch))
    }
}
