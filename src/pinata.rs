//! `MetadataStore` backed by the Pinata pinning API and a public IPFS gateway.
//!
//! Reads by address go through the gateway without credentials. Lookup by
//! campaign id and uploads use the pinning API and need `PINATA_JWT`.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::AppError;
use crate::metadata::{CampaignMetadata, ContentAddress, MetadataStore, StoredMetadata};

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[derive(Debug, Deserialize)]
struct PinListResponse {
    #[serde(default)]
    rows: Vec<PinRow>,
}

#[derive(Debug, Deserialize)]
struct PinRow {
    ipfs_pin_hash: String,
    #[serde(default)]
    date_pinned: Option<String>,
}

pub struct PinataStore {
    client: Client,
    api_url: String,
    gateway_url: String,
    config: Config,
}

impl PinataStore {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.pinata_api_url.trim_end_matches('/').to_string(),
            gateway_url: config.ipfs_gateway_url.trim_end_matches('/').to_string(),
            config: config.clone(),
        }
    }
}

/// Map a non-success upstream status into a network error with the body text.
async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    tracing::warn!(%status, "{} failed: {}", what, body);
    Err(AppError::Network(format!("{} returned HTTP status {}", what, status)))
}

#[async_trait::async_trait]
impl MetadataStore for PinataStore {
    #[tracing::instrument(skip(self), fields(hash = %address))]
    async fn fetch_by_address(&self, address: &ContentAddress) -> Result<CampaignMetadata, AppError> {
        let url = format!("{}/{}", self.gateway_url, address.hash());
        let response = self
            .client
            .get(&url)
            .timeout(self.config.read_timeout)
            .send()
            .await?;
        let response = check_status(response, "IPFS gateway fetch").await?;
        Ok(response.json::<CampaignMetadata>().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_by_campaign_id(&self, campaign_id: u64) -> Result<Option<StoredMetadata>, AppError> {
        let jwt = self.config.require_pinata_jwt()?;
        let keyvalues = json!({
            "campaignId": { "value": campaign_id.to_string(), "op": "eq" }
        });

        let response = self
            .client
            .get(format!("{}/data/pinList", self.api_url))
            .bearer_auth(jwt)
            .query(&[
                ("status", "pinned".to_string()),
                ("metadata[keyvalues]", keyvalues.to_string()),
            ])
            .timeout(self.config.read_timeout)
            .send()
            .await?;
        let list: PinListResponse = check_status(response, "pin list query").await?.json().await?;

        // Write-once store: a re-upload is a new pin, so the newest one wins.
        let Some(latest) = list
            .rows
            .into_iter()
            .max_by(|a, b| a.date_pinned.cmp(&b.date_pinned))
        else {
            tracing::debug!("no metadata pinned for campaign");
            return Ok(None);
        };

        let address = ContentAddress::parse(&latest.ipfs_pin_hash)?;
        let metadata = self.fetch_by_address(&address).await?;
        Ok(Some(StoredMetadata { address, metadata }))
    }

    #[tracing::instrument(skip(self, metadata), fields(campaign_id = metadata.campaign_id))]
    async fn pin(&self, metadata: &CampaignMetadata) -> Result<ContentAddress, AppError> {
        let jwt = self.config.require_pinata_jwt()?;
        let body = json!({
            "pinataContent": metadata,
            "pinataMetadata": {
                "name": format!("campaign-{}-metadata", metadata.campaign_id),
                "keyvalues": { "campaignId": metadata.campaign_id.to_string() },
            },
        });

        let response = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_url))
            .bearer_auth(jwt)
            .timeout(self.config.write_timeout)
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::Configuration(
                "PINATA_JWT was rejected by the pinning service".to_string(),
            ));
        }
        let pinned: PinResponse = check_status(response, "pin upload").await?.json().await?;
        ContentAddress::parse(&pinned.ipfs_hash)
    }
}
