use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, put};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::engagement::{self, EngagementEventBody};
use crate::error::Error;
use crate::space::{self, SpaceId};

use super::manager::{self, NewCampaign};
use super::{CampaignId, CampaignStatus, Counters, Reward, RewardCampaign};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCampaignBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub campaign_type: String,
    pub reward: Reward,
    #[serde(default)]
    pub terms_conditions: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateCampaignStatusBody {
    pub status: CampaignStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignBody {
    pub id: CampaignId,
    pub space_id: SpaceId,
    pub name: String,
    pub description: String,
    pub campaign_type: String,
    pub reward: Reward,
    pub remaining: Option<i64>,
    pub terms_conditions: Option<String>,
    pub code: String,
    pub status: CampaignStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub counters: Counters,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl CampaignBody {
    pub fn render(campaign: RewardCampaign) -> CampaignBody {
        CampaignBody {
            id: campaign.id,
            space_id: campaign.space_id,
            name: campaign.name,
            description: campaign.description,
            campaign_type: campaign.campaign_type,
            reward: campaign.reward,
            remaining: campaign.remaining,
            terms_conditions: campaign.terms_conditions,
            code: campaign.code,
            status: campaign.status,
            starts_at: campaign.starts_at,
            ends_at: campaign.ends_at,
            counters: campaign.counters,
            created_at: campaign.created_at,
            modified_at: campaign.modified_at,
        }
    }
}

#[post("/spaces/{space_id}/campaigns")]
#[tracing::instrument(skip(db))]
pub async fn create_campaign_in_space(
    db: Data<Box<dyn Database>>,
    params: Path<SpaceId>,
    body: Json<CreateCampaignBody>,
) -> Result<Json<CampaignBody>, Error> {
    let space_id = params.into_inner();
    let space = space::manager::get_space_by_id(&***db, space_id)
        .await?
        .ok_or(Error::SpaceNotFound { space_id })?;
    let body = body.into_inner();

    let campaign = manager::create_campaign(
        &***db,
        &space,
        NewCampaign {
            name: body.name,
            description: body.description,
            campaign_type: body.campaign_type,
            reward: body.reward,
            terms_conditions: body.terms_conditions,
            starts_at: body.starts_at,
            ends_at: body.ends_at,
        },
    )
    .await?;

    Ok(Json(CampaignBody::render(campaign)))
}

#[get("/spaces/{space_id}/campaigns")]
#[tracing::instrument(skip(db))]
pub async fn get_campaigns_in_space(
    db: Data<Box<dyn Database>>,
    params: Path<SpaceId>,
) -> Result<Json<Vec<CampaignBody>>, Error> {
    let space_id = params.into_inner();
    let space = space::manager::get_space_by_id(&***db, space_id)
        .await?
        .ok_or(Error::SpaceNotFound { space_id })?;

    let campaigns = manager::get_campaigns(&***db, &space).await?;

    let body = campaigns.into_iter().map(CampaignBody::render).collect();

    Ok(Json(body))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();
    let campaign = manager::get_campaign_by_id(&***db, campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    Ok(Json(CampaignBody::render(campaign)))
}

#[put("/campaigns/{campaign_id}/status")]
#[tracing::instrument(skip(db))]
pub async fn update_campaign_status(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
    body: Json<UpdateCampaignStatusBody>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();
    let campaign = manager::get_campaign_by_id(&***db, campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;
    let body = body.into_inner();

    let campaign = manager::set_campaign_status(&***db, campaign, body.status).await?;

    Ok(Json(CampaignBody::render(campaign)))
}

#[get("/campaigns/{campaign_id}/events")]
#[tracing::instrument(skip(db))]
pub async fn get_events_for_campaign(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<Json<Vec<EngagementEventBody>>, Error> {
    let campaign_id = params.into_inner();
    let campaign = manager::get_campaign_by_id(&***db, campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    let events = engagement::manager::get_events(&***db, &campaign).await?;

    let body = events
        .into_iter()
        .map(EngagementEventBody::render)
        .collect();

    Ok(Json(body))
}

#[post("/campaigns/{campaign_id}/reconcile")]
#[tracing::instrument(skip(db))]
pub async fn reconcile_campaign_counters(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();
    let campaign = manager::get_campaign_by_id(&***db, campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    let campaign = manager::reconcile_counters(&***db, campaign).await?;

    Ok(Json(CampaignBody::render(campaign)))
}
