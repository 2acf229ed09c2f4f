#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use campaignhub::config::Config;
use campaignhub::error::AppError;
use campaignhub::ledger::{CampaignRecord, LedgerClient};
use campaignhub::metadata::{CampaignMetadata, ContentAddress, MetadataStore, StoredMetadata};
use campaignhub::AppState;

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

pub const ETH: u128 = 1_000_000_000_000_000_000;
pub const NOW: i64 = 1_700_000_000;

pub fn record(id: u64, goal: u128, raised: u128, deadline: i64) -> CampaignRecord {
    CampaignRecord {
        id,
        creator: format!("0x{:040x}", id + 1),
        title: format!("Ledger title {}", id),
        description: format!("Ledger description {}", id),
        goal,
        raised,
        deadline,
    }
}

pub fn metadata(campaign_id: u64) -> CampaignMetadata {
    CampaignMetadata {
        campaign_id,
        title: format!("Rich title {}", campaign_id),
        description: format!("Rich description {}", campaign_id),
        image_url: format!("https://img.example/{}.png", campaign_id),
        video_url: format!("https://video.example/{}", campaign_id),
        goal: "1".to_string(),
        deadline: "2030-01-01".to_string(),
        created_at: None,
    }
}

pub fn address_for(campaign_id: u64) -> ContentAddress {
    ContentAddress::parse(&format!("QmCampaign{}", campaign_id)).unwrap()
}

/// Ledger double with per-id failure switches.
#[derive(Default)]
pub struct InMemoryLedger {
    pub records: Mutex<HashMap<u64, CampaignRecord>>,
    pub donors: Mutex<HashMap<u64, u64>>,
    pub failing_records: Mutex<HashSet<u64>>,
    pub failing_donors: Mutex<HashSet<u64>>,
    pub fail_count: Mutex<bool>,
}

impl InMemoryLedger {
    pub fn with(records: Vec<CampaignRecord>) -> Self {
        let ledger = Self::default();
        for r in records {
            ledger.donors.lock().unwrap().insert(r.id, r.id * 2 + 1);
            ledger.records.lock().unwrap().insert(r.id, r);
        }
        ledger
    }

    pub fn fail_record(&self, id: u64) {
        self.failing_records.lock().unwrap().insert(id);
    }

    pub fn fail_donors(&self, id: u64) {
        self.failing_donors.lock().unwrap().insert(id);
    }
}

#[async_trait::async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_campaign(&self, id: u64) -> Result<CampaignRecord, AppError> {
        if self.failing_records.lock().unwrap().contains(&id) {
            return Err(AppError::Network(format!("ledger unreachable for {}", id)));
        }
        self.records
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::ContractRead(format!("campaign {} does not exist", id)))
    }

    async fn get_donor_count(&self, id: u64) -> Result<u64, AppError> {
        if self.failing_donors.lock().unwrap().contains(&id) {
            return Err(AppError::ContractRead("donor count reverted".to_string()));
        }
        Ok(self.donors.lock().unwrap().get(&id).copied().unwrap_or(0))
    }

    async fn campaign_count(&self) -> Result<u64, AppError> {
        if *self.fail_count.lock().unwrap() {
            return Err(AppError::Timeout("campaignCount".to_string()));
        }
        Ok(self.records.lock().unwrap().len() as u64)
    }
}

/// Store double keyed both by campaign id and by content address.
#[derive(Default)]
pub struct InMemoryStore {
    pub by_address: Mutex<HashMap<ContentAddress, CampaignMetadata>>,
    pub index: Mutex<HashMap<u64, ContentAddress>>,
    pub failing_ids: Mutex<HashSet<u64>>,
    pub failing_addresses: Mutex<HashSet<ContentAddress>>,
    pub pins: Mutex<Vec<CampaignMetadata>>,
    pub pin_calls: AtomicUsize,
    pub lookups: AtomicUsize,
    pub credential: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        *store.credential.lock().unwrap() = true;
        store
    }

    pub fn insert(&self, meta: CampaignMetadata) -> ContentAddress {
        let address = address_for(meta.campaign_id);
        self.index.lock().unwrap().insert(meta.campaign_id, address.clone());
        self.by_address.lock().unwrap().insert(address.clone(), meta);
        address
    }

    pub fn fail_id(&self, id: u64) {
        self.failing_ids.lock().unwrap().insert(id);
    }

    pub fn without_credential(self) -> Self {
        *self.credential.lock().unwrap() = false;
        self
    }

    pub fn pin_calls(&self) -> usize {
        self.pin_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataStore for InMemoryStore {
    async fn fetch_by_address(&self, address: &ContentAddress) -> Result<CampaignMetadata, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing_addresses.lock().unwrap().contains(address) {
            return Err(AppError::Network(format!("gateway error for {}", address)));
        }
        self.by_address
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| AppError::Network(format!("gateway returned 404 for {}", address)))
    }

    async fn fetch_by_campaign_id(&self, campaign_id: u64) -> Result<Option<StoredMetadata>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !*self.credential.lock().unwrap() {
            return Err(AppError::Configuration("PINATA_JWT is not configured".to_string()));
        }
        if self.failing_ids.lock().unwrap().contains(&campaign_id) {
            return Err(AppError::Timeout(format!("pin list query for {}", campaign_id)));
        }
        let address = self.index.lock().unwrap().get(&campaign_id).cloned();
        match address {
            Some(address) => {
                let metadata = self.fetch_by_address(&address).await?;
                Ok(Some(StoredMetadata { address, metadata }))
            }
            None => Ok(None),
        }
    }

    async fn pin(&self, metadata: &CampaignMetadata) -> Result<ContentAddress, AppError> {
        self.pin_calls.fetch_add(1, Ordering::SeqCst);
        if !*self.credential.lock().unwrap() {
            return Err(AppError::Configuration("PINATA_JWT is not configured".to_string()));
        }
        self.pins.lock().unwrap().push(metadata.clone());
        Ok(ContentAddress::parse(&format!("QmPinned{}", self.pin_calls())).unwrap())
    }
}

pub fn state_with(ledger: Arc<InMemoryLedger>, store: Arc<InMemoryStore>) -> AppState {
    AppState::new(Config::default(), ledger, store)
}
