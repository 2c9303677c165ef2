use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::database::{is_duplicate_key, MongoCampaignStore};
use crate::error::Error;
use crate::space::SpaceId;

use super::{CampaignId, CampaignStatus, Counters, RewardCampaign};

/// Amounts to add to a campaign's counters in one atomic update.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterIncrement {
    pub scans: i64,
    pub engagements: i64,
    pub redemptions: i64,
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: &RewardCampaign) -> Result<(), Error>;

    async fn fetch_campaigns_by_space(
        &self,
        space_id: SpaceId,
    ) -> Result<Vec<RewardCampaign>, Error>;

    async fn fetch_campaign_by_id(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<RewardCampaign>, Error>;

    async fn fetch_campaign_by_code(&self, code: &str) -> Result<Option<RewardCampaign>, Error>;

    async fn update_campaign_status(
        &self,
        campaign: RewardCampaign,
        status: CampaignStatus,
    ) -> Result<RewardCampaign, Error>;

    /// Takes one reward off the remaining count, returns false if none were left.
    async fn claim_reward(&self, campaign_id: CampaignId) -> Result<bool, Error>;

    /// Puts back a reward taken by [`CampaignStore::claim_reward`].
    async fn release_reward(&self, campaign_id: CampaignId) -> Result<(), Error>;

    async fn increment_counters(
        &self,
        campaign_id: CampaignId,
        increment: CounterIncrement,
    ) -> Result<(), Error>;

    /// Raises each stored counter to at least the given value. Counters are
    /// never lowered, so increments landing concurrently are kept.
    async fn raise_campaign_counters(
        &self,
        campaign_id: CampaignId,
        counters: Counters,
    ) -> Result<RewardCampaign, Error>;
}

#[async_trait]
impl CampaignStore for MongoCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &RewardCampaign) -> Result<(), Error> {
        match self.insert_one(campaign, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(Error::CampaignCodeAlreadyExists {
                code: campaign.code.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns_by_space(
        &self,
        space_id: SpaceId,
    ) -> Result<Vec<RewardCampaign>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": -1 })
            .build();

        let campaigns: Vec<RewardCampaign> = self
            .find(bson::doc! { "space_id": space_id }, options)
            .await?
            .try_collect()
            .await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<RewardCampaign>, Error> {
        let campaign: Option<RewardCampaign> = self
            .find_one(bson::doc! { "_id": campaign_id }, None)
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_code(&self, code: &str) -> Result<Option<RewardCampaign>, Error> {
        let campaign: Option<RewardCampaign> =
            self.find_one(bson::doc! { "code": code }, None).await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign_status(
        &self,
        mut campaign: RewardCampaign,
        status: CampaignStatus,
    ) -> Result<RewardCampaign, Error> {
        let now = Utc::now();
        let old_modified_at = bson::DateTime::from_chrono(campaign.modified_at);
        let new_modified_at = bson::DateTime::from_chrono(now);
        let new_status = bson::to_bson(&status)?;

        let result = self
            .update_one(
                bson::doc! { "_id": campaign.id, "modified_at": old_modified_at },
                bson::doc! { "$set": { "status": new_status, "modified_at": new_modified_at } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        campaign.modified_at = now;
        campaign.status = status;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn claim_reward(&self, campaign_id: CampaignId) -> Result<bool, Error> {
        let result = self
            .update_one(
                bson::doc! { "_id": campaign_id, "remaining": { "$gt": 0_i64 } },
                bson::doc! { "$inc": { "remaining": -1_i64 } },
                None,
            )
            .await?;

        Ok(result.modified_count == 1)
    }

    #[tracing::instrument(skip(self))]
    async fn release_reward(&self, campaign_id: CampaignId) -> Result<(), Error> {
        let result = self
            .update_one(
                bson::doc! { "_id": campaign_id, "remaining": { "$ne": null } },
                bson::doc! { "$inc": { "remaining": 1_i64 } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::CampaignNotFound { campaign_id });
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn increment_counters(
        &self,
        campaign_id: CampaignId,
        increment: CounterIncrement,
    ) -> Result<(), Error> {
        let result = self
            .update_one(
                bson::doc! { "_id": campaign_id },
                bson::doc! { "$inc": {
                    "counters.scan_count": increment.scans,
                    "counters.engagement_count": increment.engagements,
                    "counters.redemption_count": increment.redemptions
                } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::CampaignNotFound { campaign_id });
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn raise_campaign_counters(
        &self,
        campaign_id: CampaignId,
        counters: Counters,
    ) -> Result<RewardCampaign, Error> {
        let new_modified_at = bson::DateTime::from_chrono(Utc::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let campaign: Option<RewardCampaign> = self
            .find_one_and_update(
                bson::doc! { "_id": campaign_id },
                bson::doc! {
                    "$max": {
                        "counters.scan_count": counters.scan_count,
                        "counters.engagement_count": counters.engagement_count,
                        "counters.redemption_count": counters.redemption_count
                    },
                    "$set": { "modified_at": new_modified_at }
                },
                options,
            )
            .await?;

        campaign.ok_or(Error::CampaignNotFound { campaign_id })
    }
}
