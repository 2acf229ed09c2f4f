//! Campaign lifecycle derivation.
//!
//! Everything here is a pure function of ledger numbers and an explicit `now`
//! (unix seconds). Callers read the clock; this module never does.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Active,
    Ended,
    Successful,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub status: CampaignStatus,
    /// Funding progress in percent, always within `[0, 100]`.
    pub progress: f64,
    pub is_active: bool,
}

/// Derive status and progress for a campaign.
///
/// A reached goal wins over an elapsed deadline; a zero goal never counts as
/// reached and yields zero progress.
pub fn resolve(goal: u128, raised: u128, deadline: i64, now: i64) -> Resolution {
    let status = if goal > 0 && raised >= goal {
        CampaignStatus::Successful
    } else if now >= deadline {
        CampaignStatus::Ended
    } else {
        CampaignStatus::Active
    };

    Resolution {
        status,
        progress: progress(goal, raised),
        is_active: status == CampaignStatus::Active,
    }
}

pub fn progress(goal: u128, raised: u128) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    if raised >= goal {
        return 100.0;
    }
    (raised as f64 / goal as f64 * 100.0).clamp(0.0, 100.0)
}
