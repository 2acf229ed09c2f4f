use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::metadata::{self, CampaignMetadata, ContentAddress, MetadataUpload, UploadReceipt};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MetadataByIdQuery {
    /// Campaign id the metadata was uploaded for
    #[serde(rename = "campaignId")]
    campaign_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MetadataByAddressQuery {
    /// Content address, either `ipfs://<hash>` or the bare hash
    address: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataLookupResponse {
    success: bool,
    ipfs_hash: String,
    ipfs_uri: String,
    metadata: CampaignMetadata,
}

/// Upload campaign metadata to IPFS
#[utoipa::path(
    post,
    path = "/api/upload-metadata",
    request_body = MetadataUpload,
    responses(
        (status = 200, description = "Metadata pinned", body = UploadReceipt),
        (status = 400, description = "campaignId or title missing; nothing was written"),
        (status = 500, description = "Pinning credential not configured or the upload failed"),
        (status = 504, description = "Pinning service timed out")
    ),
    description = "Stamps createdAt server-side and pins the record. The response carries the content address as both a bare hash and an ipfs:// URI."
)]
pub async fn upload_metadata(
    State(state): State<AppState>,
    Json(upload): Json<MetadataUpload>,
) -> Result<Json<UploadReceipt>, AppError> {
    let receipt = metadata::upload_metadata(state.store.as_ref(), upload, Utc::now()).await?;
    Ok(Json(receipt))
}

/// Look up the metadata uploaded for a campaign id
#[utoipa::path(
    get,
    path = "/api/get-metadata",
    params(MetadataByIdQuery),
    responses(
        (status = 200, description = "Metadata found", body = MetadataLookupResponse),
        (status = 400, description = "campaignId missing"),
        (status = 404, description = "No metadata has been uploaded for this campaign"),
        (status = 500, description = "Query failed or credential not configured")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataByIdQuery>,
) -> Result<Json<MetadataLookupResponse>, AppError> {
    let campaign_id = query
        .campaign_id
        .ok_or_else(|| AppError::Validation("campaignId".to_string()))?;

    match state.store.fetch_by_campaign_id(campaign_id).await? {
        Some(stored) => Ok(Json(MetadataLookupResponse {
            success: true,
            ipfs_uri: stored.address.uri(),
            ipfs_hash: stored.address.hash().to_string(),
            metadata: stored.metadata,
        })),
        None => Err(AppError::NotFound(format!(
            "No metadata found for campaign {}",
            campaign_id
        ))),
    }
}

/// Read metadata directly by content address
#[utoipa::path(
    get,
    path = "/api/fetch-metadata",
    params(MetadataByAddressQuery),
    responses(
        (status = 200, description = "Metadata object", body = CampaignMetadata),
        (status = 400, description = "Malformed content address"),
        (status = 500, description = "Gateway fetch failed")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn fetch_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataByAddressQuery>,
) -> Result<Json<CampaignMetadata>, AppError> {
    let address = ContentAddress::parse(&query.address)?;
    let metadata = state.store.fetch_by_address(&address).await?;
    Ok(Json(metadata))
}
