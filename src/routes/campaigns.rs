use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::aggregator::CampaignView;
use crate::error::AppError;
use crate::metadata::{ContentAddress, MetadataSource};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CampaignQuery {
    /// Optional: content address of the campaign's metadata (`ipfs://<hash>` or bare hash).
    /// When omitted the metadata is looked up by campaign id.
    #[serde(default, rename = "ipfsHash")]
    #[param(required = false)]
    ipfs_hash: Option<String>,
}

/// List every campaign with its merged metadata and derived status
#[utoipa::path(
    get,
    path = "/campaigns",
    responses(
        (status = 200, description = "All campaigns on the ledger", body = Vec<CampaignView>),
        (status = 502, description = "Campaign count could not be read from the ledger")
    )
)]
pub async fn list_campaigns(State(state): State<AppState>) -> Result<Json<Vec<CampaignView>>, AppError> {
    let views = state.aggregator.list().await?;
    Ok(Json(views))
}

/// Get a single campaign view
#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    params(
        ("id" = u64, Path, description = "Campaign id on the ledger"),
        CampaignQuery
    ),
    responses(
        (status = 200, description = "Campaign view", body = CampaignView),
        (status = 400, description = "Malformed content address"),
        (status = 502, description = "Campaign record could not be read from the ledger")
    ),
    description = "Merges the ledger record with its metadata. Missing metadata falls back to the ledger's title and description with empty media links."
)]
#[tracing::instrument(skip(state, query))]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<CampaignQuery>,
) -> Result<Json<CampaignView>, AppError> {
    let source = match query.ipfs_hash.as_deref().filter(|h| !h.trim().is_empty()) {
        Some(raw) => MetadataSource::ByAddress(ContentAddress::parse(raw)?),
        None => MetadataSource::ById,
    };

    let view = state.aggregator.aggregate(id, source).await?;
    Ok(Json(view))
}
