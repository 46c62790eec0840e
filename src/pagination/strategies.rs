//! Cursor paginator implementation
//!
//! Turns a [`RemoteCollection`] into a lazy stream of pages, one remote call
//! in flight at a time.

use super::types::{Exhaustion, Page, PaginationState, RemoteCollection, StorageKey};
use crate::error::{Error, Result};
use futures::stream::{self, Stream, TryStreamExt};
use std::num::NonZeroUsize;
use tracing::{debug, warn};

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-based paginator over a remote ordered key-value collection
///
/// The key of the last entry of each page is passed back as the cursor of the
/// next request. With [`Exhaustion::ProbeKeys`] every page is preceded by a
/// `fetch_keys` probe, and an empty probe ends the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPaginator {
    page_size: NonZeroUsize,
    exhaustion: Exhaustion,
}

impl CursorPaginator {
    /// Create a paginator requesting at most `page_size` entries per fetch
    pub fn new(page_size: usize) -> Result<Self> {
        let page_size = NonZeroUsize::new(page_size).ok_or_else(|| Error::invalid_page_size(0))?;
        Ok(Self {
            page_size,
            exhaustion: Exhaustion::default(),
        })
    }

    /// Create a paginator from a signed page size (CLI and config input)
    pub fn try_from_signed(page_size: i64) -> Result<Self> {
        if page_size < 1 {
            return Err(Error::invalid_page_size(page_size));
        }
        let page_size =
            usize::try_from(page_size).map_err(|_| Error::invalid_page_size(page_size))?;
        Self::new(page_size)
    }

    /// Set the exhaustion detection strategy
    #[must_use]
    pub fn with_exhaustion(mut self, exhaustion: Exhaustion) -> Self {
        self.exhaustion = exhaustion;
        self
    }

    /// Maximum number of entries requested per fetch
    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    /// Exhaustion detection strategy
    pub fn exhaustion(&self) -> Exhaustion {
        self.exhaustion
    }

    /// Start a fresh scan of `collection`
    ///
    /// Nothing is fetched until the stream is polled. The first error from
    /// the collection is yielded as-is and ends the stream; dropping the
    /// stream abandons the scan.
    pub fn paginate<'a, C>(
        &self,
        collection: &'a C,
    ) -> impl Stream<Item = std::result::Result<Page<C::Value>, C::Error>> + Send + 'a
    where
        C: RemoteCollection,
    {
        let limit = self.page_size.get();
        let exhaustion = self.exhaustion;
        stream::try_unfold(PaginationState::new(), move |state| {
            next_page(collection, state, limit, exhaustion)
        })
    }

    /// Scan the whole collection and flatten every page into one list
    pub async fn collect_entries<C>(
        &self,
        collection: &C,
    ) -> std::result::Result<Vec<(StorageKey, C::Value)>, C::Error>
    where
        C: RemoteCollection,
    {
        self.paginate(collection)
            .map_ok(Page::into_entries)
            .try_concat()
            .await
    }

    /// Scan the whole collection and count its entries
    pub async fn count_entries<C>(&self, collection: &C) -> std::result::Result<usize, C::Error>
    where
        C: RemoteCollection,
    {
        self.paginate(collection)
            .try_fold(0usize, |total, page| {
                futures::future::ready(Ok::<_, C::Error>(total + page.len()))
            })
            .await
    }
}

/// Validate `page_size` and start a scan of `collection` with probing enabled
pub fn paginate<C>(
    collection: &C,
    page_size: usize,
) -> Result<impl Stream<Item = std::result::Result<Page<C::Value>, C::Error>> + Send + '_>
where
    C: RemoteCollection,
{
    Ok(CursorPaginator::new(page_size)?.paginate(collection))
}

/// Fetch one page after `state.cursor`; `Ok(None)` ends the scan
async fn next_page<C>(
    collection: &C,
    mut state: PaginationState,
    limit: usize,
    exhaustion: Exhaustion,
) -> std::result::Result<Option<(Page<C::Value>, PaginationState)>, C::Error>
where
    C: RemoteCollection,
{
    if exhaustion == Exhaustion::ProbeKeys {
        let keys = collection.fetch_keys(state.cursor.as_ref(), limit).await?;
        if keys.is_empty() {
            debug!(
                pages = state.pages,
                entries = state.total_fetched,
                "Collection exhausted"
            );
            return Ok(None);
        }
    }

    let entries = collection
        .fetch_entries(state.cursor.as_ref(), limit)
        .await?;

    let Some(page) = Page::new(entries) else {
        if exhaustion == Exhaustion::ProbeKeys {
            warn!(
                cursor = ?state.cursor,
                "Probe reported keys but no entries were returned, ending scan"
            );
        } else {
            debug!(
                pages = state.pages,
                entries = state.total_fetched,
                "Collection exhausted"
            );
        }
        return Ok(None);
    };

    state.advance(&page);

    debug!(
        page = state.pages,
        size = page.len(),
        cursor = %page.last_key(),
        "Fetched page"
    );

    Ok(Some((page, state)))
}
