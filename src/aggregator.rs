//! Merges authoritative ledger records with optional store metadata into the
//! views served to clients.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use utoipa::ToSchema;

use crate::amount::format_units;
use crate::batch::BatchMetadataFetcher;
use crate::error::AppError;
use crate::ledger::{CampaignRecord, LedgerClient};
use crate::metadata::{self, CampaignMetadata, MetadataSource, MetadataStore};
use crate::status::{self, CampaignStatus};

/// Read-time view of a campaign. Rebuilt on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignView {
    pub id: u64,
    pub creator: String,
    pub title: String,
    pub description: String,
    /// Empty when the campaign has no metadata record.
    pub image_url: String,
    /// Empty when the campaign has no metadata record.
    pub video_url: String,
    /// Goal formatted in whole units.
    pub goal: String,
    /// Amount raised formatted in whole units.
    pub raised: String,
    /// Unix timestamp (seconds).
    pub deadline: i64,
    pub donor_count: u64,
    /// Percentage of the goal raised, within 0..=100.
    pub progress: f64,
    pub is_active: bool,
    pub status: CampaignStatus,
}

#[derive(Clone)]
pub struct CampaignAggregator {
    ledger: Arc<dyn LedgerClient>,
    store: Arc<dyn MetadataStore>,
    batch: BatchMetadataFetcher,
    amount_decimals: u32,
}

impl CampaignAggregator {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        store: Arc<dyn MetadataStore>,
        amount_decimals: u32,
    ) -> Self {
        Self {
            batch: BatchMetadataFetcher::new(Arc::clone(&store)),
            ledger,
            store,
            amount_decimals,
        }
    }

    /// Build the view for one campaign as of the current wall-clock time.
    pub async fn aggregate(&self, id: u64, source: MetadataSource) -> Result<CampaignView, AppError> {
        self.aggregate_at(id, source, Utc::now().timestamp()).await
    }

    /// Build the view for one campaign as of `now` (unix seconds).
    ///
    /// Only a failed ledger record read fails the call. Donor count and
    /// metadata problems degrade to zero and ledger-sourced text respectively.
    #[tracing::instrument(skip(self, source), fields(campaign_id = id))]
    pub async fn aggregate_at(
        &self,
        id: u64,
        source: MetadataSource,
        now: i64,
    ) -> Result<CampaignView, AppError> {
        let mut record = self.ledger.get_campaign(id).await.map_err(into_contract_read)?;
        record.id = id;

        let (donor_count, metadata) = futures::join!(
            self.donor_count_or_zero(id),
            metadata::lookup(self.store.as_ref(), id, &source),
        );

        let metadata = match metadata {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("metadata lookup failed, using ledger copy: {}", e);
                None
            }
        };

        Ok(self.build_view(record, donor_count, metadata.as_ref(), now))
    }

    /// Views for every campaign on the ledger, in ascending id order.
    pub async fn list(&self) -> Result<Vec<CampaignView>, AppError> {
        self.list_at(Utc::now().timestamp()).await
    }

    /// Campaigns whose ledger record cannot be read are left out of the list;
    /// a failure to read the campaign count fails the whole call.
    #[tracing::instrument(skip(self))]
    pub async fn list_at(&self, now: i64) -> Result<Vec<CampaignView>, AppError> {
        let count = self.ledger.campaign_count().await.map_err(into_contract_read)?;

        let reads = (0..count).map(|id| async move {
            match self.ledger.get_campaign(id).await {
                Ok(mut record) => {
                    record.id = id;
                    Some((record, self.donor_count_or_zero(id).await))
                }
                Err(e) => {
                    tracing::warn!(campaign_id = id, "skipping campaign, ledger read failed: {}", e);
                    None
                }
            }
        });
        let span = tracing::info_span!("read_ledger_records", count);
        let records: Vec<(CampaignRecord, u64)> =
            join_all(reads).instrument(span).await.into_iter().flatten().collect();

        let ids: Vec<u64> = records.iter().map(|(record, _)| record.id).collect();
        let mut metadata = self.batch.fetch_by_ids(&ids).await;

        let mut views: Vec<CampaignView> = records
            .into_iter()
            .map(|(record, donors)| {
                let found = metadata.remove(&record.id);
                self.build_view(record, donors, found.as_ref(), now)
            })
            .collect();
        views.sort_by_key(|view| view.id);
        Ok(views)
    }

    async fn donor_count_or_zero(&self, id: u64) -> u64 {
        match self.ledger.get_donor_count(id).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(campaign_id = id, "donor count unavailable, reporting 0: {}", e);
                0
            }
        }
    }

    /// Combine a ledger record with its optional metadata. Metadata naming a
    /// different campaign is treated as absent.
    pub fn build_view(
        &self,
        record: CampaignRecord,
        donor_count: u64,
        metadata: Option<&CampaignMetadata>,
        now: i64,
    ) -> CampaignView {
        let resolution = status::resolve(record.goal, record.raised, record.deadline, now);

        let metadata = metadata.filter(|meta| {
            if meta.campaign_id == record.id {
                return true;
            }
            tracing::warn!(
                campaign_id = record.id,
                metadata_campaign_id = meta.campaign_id,
                "ignoring metadata that belongs to another campaign"
            );
            false
        });

        let (title, description, image_url, video_url) = match metadata {
            Some(meta) => (
                non_empty_or(&meta.title, record.title),
                non_empty_or(&meta.description, record.description),
                meta.image_url.clone(),
                meta.video_url.clone(),
            ),
            None => (record.title, record.description, String::new(), String::new()),
        };

        CampaignView {
            id: record.id,
            creator: record.creator,
            title,
            description,
            image_url,
            video_url,
            goal: format_units(record.goal, self.amount_decimals),
            raised: format_units(record.raised, self.amount_decimals),
            deadline: record.deadline,
            donor_count,
            progress: resolution.progress,
            is_active: resolution.is_active,
            status: resolution.status,
        }
    }
}

fn non_empty_or(preferred: &str, fallback: String) -> String {
    if preferred.trim().is_empty() {
        fallback
    } else {
        preferred.to_string()
    }
}

/// Ledger failures reach callers as `ContractRead` whatever the transport said.
fn into_contract_read(err: AppError) -> AppError {
    match err {
        AppError::ContractRead(_) => err,
        other => AppError::ContractRead(other.to_string()),
    }
}
