use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::space::SpaceId;
use crate::typedid::{TypedId, TypedIdMarker};

pub mod code;
pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type CampaignId = TypedId<RewardCampaign>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RewardCampaign {
    #[serde(rename = "_id")]
    pub id: CampaignId,
    pub space_id: SpaceId,
    pub name: String,
    pub description: String,
    pub campaign_type: String,
    pub reward: Reward,
    /// Rewards left to redeem, `None` when the campaign is unlimited.
    pub remaining: Option<i64>,
    pub terms_conditions: Option<String>,
    pub code: String,
    pub status: CampaignStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub starts_at: DateTime<Utc>,
    #[serde(default, with = "crate::utils::optional_bson_datetime")]
    pub ends_at: Option<DateTime<Utc>>,
    pub counters: Counters,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl TypedIdMarker for RewardCampaign {
    fn tag() -> &'static str {
        "RWC"
    }
}

impl RewardCampaign {
    /// Whether a scan at `now` should resolve to this campaign.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active
            && self.starts_at <= now
            && self.ends_at.map_or(true, |ends_at| now < ends_at)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Reward {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Inactive,
}

/// Denormalized totals over the campaign's engagement events.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Counters {
    pub scan_count: i64,
    pub engagement_count: i64,
    pub redemption_count: i64,
}

impl Counters {
    /// Field-wise maximum of both sets of counters.
    pub fn max(self, other: Counters) -> Counters {
        Counters {
            scan_count: self.scan_count.max(other.scan_count),
            engagement_count: self.engagement_count.max(other.engagement_count),
            redemption_count: self.redemption_count.max(other.redemption_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test::test_campaign;
    use chrono::Duration;

    #[test]
    fn campaign_is_live_inside_window() {
        let now = Utc::now();
        let mut campaign = test_campaign(SpaceId::new());
        campaign.starts_at = now - Duration::days(1);
        campaign.ends_at = Some(now + Duration::days(1));

        assert!(campaign.is_live(now));
    }

    #[test]
    fn campaign_is_not_live_when_inactive_or_outside_window() {
        let now = Utc::now();
        let mut campaign = test_campaign(SpaceId::new());
        campaign.starts_at = now - Duration::days(1);

        campaign.status = CampaignStatus::Inactive;
        assert!(!campaign.is_live(now));

        campaign.status = CampaignStatus::Active;
        campaign.ends_at = Some(now);
        assert!(!campaign.is_live(now));

        campaign.ends_at = None;
        campaign.starts_at = now + Duration::seconds(1);
        assert!(!campaign.is_live(now));
    }
}
