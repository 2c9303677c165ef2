use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use crate::database::MongoPasswordResetStore;
use crate::error::Error;

use super::{PasswordReset, PasswordResetId};

#[async_trait]
pub trait PasswordResetStore: Send + Sync {
    async fn insert_reset(&self, reset: &PasswordReset) -> Result<(), Error>;

    async fn fetch_reset_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, Error>;

    /// Marks the reset used if it is still unused and unexpired at `now`.
    async fn consume_reset(
        &self,
        reset_id: PasswordResetId,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, Error>;
}

#[async_trait]
impl PasswordResetStore for MongoPasswordResetStore {
    #[tracing::instrument(skip(self, reset), fields(reset_id = %reset.id))]
    async fn insert_reset(&self, reset: &PasswordReset) -> Result<(), Error> {
        self.insert_one(reset, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token_hash))]
    async fn fetch_reset_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, Error> {
        let reset: Option<PasswordReset> = self
            .find_one(bson::doc! { "token_hash": token_hash }, None)
            .await?;

        Ok(reset)
    }

    #[tracing::instrument(skip(self))]
    async fn consume_reset(
        &self,
        reset_id: PasswordResetId,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, Error> {
        let now = bson::DateTime::from_chrono(now);
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let reset: Option<PasswordReset> = self
            .find_one_and_update(
                bson::doc! { "_id": reset_id, "used_at": null, "expires_at": { "$gt": now } },
                bson::doc! { "$set": { "used_at": now } },
                options,
            )
            .await?;

        Ok(reset)
    }
}
