use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson;
use mongodb::options::FindOptions;

use crate::database::MongoSpaceStore;
use crate::error::Error;

use crate::user::UserId;

use super::{Space, SpaceId};

#[async_trait]
pub trait SpaceStore: Send + Sync {
    async fn insert_space(&self, space: &Space) -> Result<(), Error>;

    async fn fetch_spaces(&self) -> Result<Vec<Space>, Error>;

    async fn fetch_spaces_by_owner(&self, owner_id: UserId) -> Result<Vec<Space>, Error>;

    async fn fetch_space_by_id(&self, space_id: SpaceId) -> Result<Option<Space>, Error>;
}

#[async_trait]
impl SpaceStore for MongoSpaceStore {
    #[tracing::instrument(skip(self))]
    async fn insert_space(&self, space: &Space) -> Result<(), Error> {
        self.insert_one(space, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_spaces(&self) -> Result<Vec<Space>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": -1 })
            .build();

        let spaces: Vec<Space> = self
            .find(bson::doc! {}, options)
            .await?
            .try_collect()
            .await?;

        Ok(spaces)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_spaces_by_owner(&self, owner_id: UserId) -> Result<Vec<Space>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": 1 })
            .build();

        let spaces: Vec<Space> = self
            .find(bson::doc! { "owner_id": owner_id }, options)
            .await?
            .try_collect()
            .await?;

        Ok(spaces)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_space_by_id(&self, space_id: SpaceId) -> Result<Option<Space>, Error> {
        let space: Option<Space> = self.find_one(bson::doc! { "_id": space_id }, None).await?;

        Ok(space)
    }
}
