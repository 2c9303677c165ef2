use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson;

use crate::database::MongoSubscriptionStore;
use crate::error::Error;

use super::{Subscription, SubscriptionStatus};

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), Error>;

    async fn fetch_subscription_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Subscription>, Error>;

    async fn activate_subscription(
        &self,
        subscription: Subscription,
        payment_id: String,
    ) -> Result<Subscription, Error>;
}

#[async_trait]
impl SubscriptionStore for MongoSubscriptionStore {
    #[tracing::instrument(skip(self))]
    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), Error> {
        self.insert_one(subscription, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_subscription_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Subscription>, Error> {
        let subscription: Option<Subscription> = self
            .find_one(bson::doc! { "order_id": order_id }, None)
            .await?;

        Ok(subscription)
    }

    #[tracing::instrument(skip(self))]
    async fn activate_subscription(
        &self,
        mut subscription: Subscription,
        payment_id: String,
    ) -> Result<Subscription, Error> {
        let now = Utc::now();
        let pending = bson::to_bson(&SubscriptionStatus::Pending)?;
        let active = bson::to_bson(&SubscriptionStatus::Active)?;
        let new_modified_at = bson::DateTime::from_chrono(now);

        let result = self
            .update_one(
                bson::doc! { "_id": subscription.id, "status": pending },
                bson::doc! { "$set": {
                    "status": active,
                    "payment_id": payment_id.clone(),
                    "modified_at": new_modified_at
                } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::SubscriptionAlreadyActive {
                order_id: subscription.order_id,
            });
        }

        subscription.modified_at = now;
        subscription.status = SubscriptionStatus::Active;
        subscription.payment_id = Some(payment_id);

        Ok(subscription)
    }
}
