//! Bulk metadata retrieval for list views.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::Instrument;

use crate::metadata::{self, CampaignMetadata, MetadataSource, MetadataStore};

/// Fetches metadata for many campaigns at once.
///
/// Every entry is dispatched together and awaited to completion; there is no
/// concurrency cap. A large id list therefore opens that many upstream
/// requests at once; bounding this with a semaphore is the obvious hardening
/// if list sizes grow. Entries that fail or have no record are left out of
/// the result and logged. The fetcher keeps no state between calls.
#[derive(Clone)]
pub struct BatchMetadataFetcher {
    store: Arc<dyn MetadataStore>,
}

impl BatchMetadataFetcher {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    pub async fn fetch_many<I>(&self, entries: I) -> HashMap<u64, CampaignMetadata>
    where
        I: IntoIterator<Item = (u64, MetadataSource)>,
    {
        let fetches = entries.into_iter().map(|(id, source)| {
            let store = Arc::clone(&self.store);
            async move {
                let outcome = metadata::lookup(store.as_ref(), id, &source).await;
                (id, outcome)
            }
        });

        let span = tracing::info_span!("fetch_metadata_batch");
        let outcomes = join_all(fetches).instrument(span).await;

        let requested = outcomes.len();
        let mut found = HashMap::with_capacity(requested);
        for (id, outcome) in outcomes {
            match outcome {
                Ok(Some(metadata)) => {
                    found.insert(id, metadata);
                }
                Ok(None) => tracing::debug!(campaign_id = id, "no metadata for campaign"),
                Err(e) => tracing::warn!(campaign_id = id, "metadata fetch failed: {}", e),
            }
        }

        tracing::info!("fetched metadata for {} of {} campaigns", found.len(), requested);
        found
    }

    /// Convenience for the common case of looking every id up by campaign id.
    pub async fn fetch_by_ids(&self, ids: &[u64]) -> HashMap<u64, CampaignMetadata> {
        self.fetch_many(ids.iter().map(|&id| (id, MetadataSource::ById)))
            .await
    }
}
