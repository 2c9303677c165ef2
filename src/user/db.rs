use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson;

use crate::database::{is_duplicate_key, MongoUserStore};
use crate::error::Error;

use super::{User, UserId};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), Error>;

    async fn fetch_user_by_id(&self, user_id: UserId) -> Result<Option<User>, Error>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    async fn update_user_password(&self, user_id: UserId, password_hash: String)
        -> Result<(), Error>;
}

#[async_trait]
impl UserStore for MongoUserStore {
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        match self.insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(Error::EmailAlreadyRegistered {
                email: user.email.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_user_by_id(&self, user_id: UserId) -> Result<Option<User>, Error> {
        let user: Option<User> = self.find_one(bson::doc! { "_id": user_id }, None).await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user: Option<User> = self.find_one(bson::doc! { "email": email }, None).await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, password_hash))]
    async fn update_user_password(
        &self,
        user_id: UserId,
        password_hash: String,
    ) -> Result<(), Error> {
        let new_modified_at = bson::DateTime::from_chrono(Utc::now());

        let result = self
            .update_one(
                bson::doc! { "_id": user_id },
                bson::doc! { "$set": { "password_hash": password_hash, "modified_at": new_modified_at } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::UserNotFound { user_id });
        }

        Ok(())
    }
}
