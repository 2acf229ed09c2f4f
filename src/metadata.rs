//! Descriptive campaign content kept in the content-addressed store.
//!
//! Records are write-once: uploading again yields a new, unrelated address.
//! A campaign may have no record at all (campaigns created before metadata
//! uploads existed), which lookups report as `Ok(None)`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

pub const IPFS_SCHEME: &str = "ipfs://";

/// Hash-derived identifier of an immutable object in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    /// Accepts either a bare hash or an `ipfs://<hash>` URI.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        let hash = trimmed.strip_prefix(IPFS_SCHEME).unwrap_or(trimmed);
        let hash = hash.trim_end_matches('/');

        if hash.is_empty() {
            return Err(AppError::InvalidInput("content address is empty".to_string()));
        }
        if !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidInput(format!(
                "invalid content address '{}'",
                raw
            )));
        }
        Ok(Self(hash.to_string()))
    }

    pub fn hash(&self) -> &str {
        &self.0
    }

    pub fn uri(&self) -> String {
        format!("{}{}", IPFS_SCHEME, self.0)
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplementary campaign content as stored in the content-addressed store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetadata {
    #[serde(deserialize_with = "deserialize_campaign_id")]
    #[schema(value_type = u64)]
    pub campaign_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub video_url: String,
    /// Informational copy of the goal; the ledger value is authoritative.
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub goal: String,
    /// Informational copy of the deadline.
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub deadline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A metadata record together with the address it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMetadata {
    pub address: ContentAddress,
    pub metadata: CampaignMetadata,
}

/// Where to look for a campaign's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    /// Indexed query keyed on the campaign id (credentialed).
    ById,
    /// Direct read of a known content address (public).
    ByAddress(ContentAddress),
}

/// The content store as seen by the aggregation layer.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Public read of a record by its content address.
    async fn fetch_by_address(&self, address: &ContentAddress) -> Result<CampaignMetadata, AppError>;

    /// Indexed lookup by campaign id. `Ok(None)` means no record was ever
    /// associated with the id; errors are reserved for genuine failures.
    async fn fetch_by_campaign_id(&self, campaign_id: u64) -> Result<Option<StoredMetadata>, AppError>;

    /// Persist a complete record and return its address.
    async fn pin(&self, metadata: &CampaignMetadata) -> Result<ContentAddress, AppError>;
}

/// Resolve metadata through either retrieval strategy.
pub async fn lookup(
    store: &dyn MetadataStore,
    campaign_id: u64,
    source: &MetadataSource,
) -> Result<Option<CampaignMetadata>, AppError> {
    match source {
        MetadataSource::ById => Ok(store
            .fetch_by_campaign_id(campaign_id)
            .await?
            .map(|stored| stored.metadata)),
        MetadataSource::ByAddress(address) => store.fetch_by_address(address).await.map(Some),
    }
}

/// Upload request body. Everything is optional on the wire so that missing
/// fields are reported as a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpload {
    #[serde(default, deserialize_with = "deserialize_optional_campaign_id")]
    #[schema(value_type = Option<u64>)]
    pub campaign_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_loose_string")]
    pub goal: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_loose_string")]
    pub deadline: Option<String>,
}

impl MetadataUpload {
    /// Check required fields and stamp `created_at`.
    pub fn into_metadata(self, created_at: DateTime<Utc>) -> Result<CampaignMetadata, AppError> {
        let mut missing = Vec::new();
        if self.campaign_id.is_none() {
            missing.push("campaignId");
        }
        let title = self.title.filter(|t| !t.trim().is_empty());
        if title.is_none() {
            missing.push("title");
        }

        match (self.campaign_id, title) {
            (Some(campaign_id), Some(title)) => Ok(CampaignMetadata {
                campaign_id,
                title,
                description: self.description.unwrap_or_default(),
                image_url: self.image_url.unwrap_or_default(),
                video_url: self.video_url.unwrap_or_default(),
                goal: self.goal.unwrap_or_default(),
                deadline: self.deadline.unwrap_or_default(),
                created_at: Some(created_at),
            }),
            _ => Err(AppError::Validation(missing.join(", "))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub success: bool,
    pub ipfs_hash: String,
    pub ipfs_uri: String,
}

impl From<ContentAddress> for UploadReceipt {
    fn from(address: ContentAddress) -> Self {
        Self {
            success: true,
            ipfs_uri: address.uri(),
            ipfs_hash: address.0,
        }
    }
}

/// Validate, stamp and persist a new metadata record.
///
/// Validation happens before the store is touched, so a rejected payload
/// never results in a write.
#[tracing::instrument(skip(store, upload), fields(campaign_id = ?upload.campaign_id))]
pub async fn upload_metadata(
    store: &dyn MetadataStore,
    upload: MetadataUpload,
    now: DateTime<Utc>,
) -> Result<UploadReceipt, AppError> {
    let metadata = upload.into_metadata(now)?;
    let address = store.pin(&metadata).await?;
    tracing::info!(hash = %address, "pinned campaign metadata");
    Ok(address.into())
}

fn campaign_id_from_value<E: de::Error>(value: serde_json::Value) -> Result<u64, E> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| E::custom(format!("invalid campaignId {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid campaignId '{}'", s))),
        other => Err(E::custom(format!("invalid campaignId {}", other))),
    }
}

fn deserialize_campaign_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    campaign_id_from_value(serde_json::Value::deserialize(deserializer)?)
}

fn deserialize_optional_campaign_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        other => campaign_id_from_value(other).map(Some),
    }
}

fn loose_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_string(serde_json::Value::deserialize(deserializer)?).unwrap_or_default())
}

fn deserialize_optional_loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_string(serde_json::Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_and_prefixed_addresses() {
        let bare = ContentAddress::parse("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap();
        let prefixed =
            ContentAddress::parse("ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(
            prefixed.uri(),
            "ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"
        );
    }

    #[test]
    fn rejects_empty_and_path_addresses() {
        assert!(ContentAddress::parse("").is_err());
        assert!(ContentAddress::parse("ipfs://").is_err());
        assert!(ContentAddress::parse("ipfs://Qm/../etc").is_err());
    }

    #[test]
    fn metadata_accepts_numeric_and_string_ids() {
        let a: CampaignMetadata =
            serde_json::from_value(json!({ "campaignId": 3, "title": "A", "goal": 1.5 })).unwrap();
        let b: CampaignMetadata =
            serde_json::from_value(json!({ "campaignId": "3", "title": "A" })).unwrap();
        assert_eq!(a.campaign_id, 3);
        assert_eq!(b.campaign_id, 3);
        assert_eq!(a.goal, "1.5");
        assert_eq!(b.image_url, "");
    }

    #[test]
    fn upload_reports_every_missing_field() {
        let err = MetadataUpload::default().into_metadata(Utc::now()).unwrap_err();
        assert_eq!(err, AppError::Validation("campaignId, title".to_string()));

        let blank_title = MetadataUpload {
            campaign_id: Some(1),
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            blank_title.into_metadata(Utc::now()).unwrap_err(),
            AppError::Validation("title".to_string())
        );
    }
}
