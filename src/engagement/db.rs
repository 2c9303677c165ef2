use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson;
use mongodb::options::FindOptions;

use crate::campaign::{CampaignId, Counters};
use crate::database::MongoEventStore;
use crate::error::Error;

use super::EngagementEvent;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: &EngagementEvent) -> Result<(), Error>;

    async fn fetch_events_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<EngagementEvent>, Error>;

    async fn count_events_by_campaign(&self, campaign_id: CampaignId) -> Result<Counters, Error>;
}

#[async_trait]
impl EventStore for MongoEventStore {
    #[tracing::instrument(skip(self))]
    async fn insert_event(&self, event: &EngagementEvent) -> Result<(), Error> {
        self.insert_one(event, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_events_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<EngagementEvent>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": -1 })
            .build();

        let events: Vec<EngagementEvent> = self
            .find(bson::doc! { "campaign_id": campaign_id }, options)
            .await?
            .try_collect()
            .await?;

        Ok(events)
    }

    #[tracing::instrument(skip(self))]
    async fn count_events_by_campaign(&self, campaign_id: CampaignId) -> Result<Counters, Error> {
        let scan_count = self
            .count_documents(bson::doc! { "campaign_id": campaign_id }, None)
            .await?;
        let engagement_count = self
            .count_documents(
                bson::doc! { "campaign_id": campaign_id, "engaged": true },
                None,
            )
            .await?;
        let redemption_count = self
            .count_documents(
                bson::doc! { "campaign_id": campaign_id, "redeemed": true },
                None,
            )
            .await?;

        Ok(Counters {
            scan_count: scan_count as i64,
            engagement_count: engagement_count as i64,
            redemption_count: redemption_count as i64,
        })
    }
}
