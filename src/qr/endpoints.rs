use actix_web::http::header::USER_AGENT;
use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, HttpRequest};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::campaign::{CampaignId, Reward};
use crate::database::Database;
use crate::engagement::ClientInfo;
use crate::error::Error;
use crate::space::PublicSpace;
use crate::utils::MessageBody;

use super::manager::{self, ResolvedCampaign};
use super::QrAction;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingCampaignBody {
    pub id: CampaignId,
    pub name: String,
    pub description: String,
    pub campaign_type: String,
    pub rewards: Reward,
    pub terms_conditions: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandingDataBody {
    pub campaign: LandingCampaignBody,
    pub space: PublicSpace,
}

impl LandingDataBody {
    pub fn render(resolved: ResolvedCampaign) -> LandingDataBody {
        let space = PublicSpace::from(&resolved.space);
        let campaign = resolved.campaign;
        LandingDataBody {
            campaign: LandingCampaignBody {
                id: campaign.id,
                name: campaign.name,
                description: campaign.description,
                campaign_type: campaign.campaign_type,
                rewards: campaign.reward,
                terms_conditions: campaign.terms_conditions,
            },
            space,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LandingBody {
    pub success: bool,
    pub data: LandingDataBody,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QrActionBody {
    pub action: QrAction,
}

fn client_info(req: &HttpRequest) -> ClientInfo {
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok());
    let connection = req.connection_info();

    ClientInfo::new(user_agent, connection.realip_remote_addr())
}

#[get("/qr/{code}")]
#[tracing::instrument(skip(db, req))]
pub async fn get_campaign_for_code(
    db: Data<Box<dyn Database>>,
    params: Path<String>,
    req: HttpRequest,
) -> Result<Json<LandingBody>, Error> {
    let code = params.into_inner();
    let resolved = manager::resolve_code(&***db, &code, Utc::now()).await?;

    manager::record_scan(&***db, &resolved.campaign, client_info(&req)).await;

    Ok(Json(LandingBody {
        success: true,
        data: LandingDataBody::render(resolved),
    }))
}

#[post("/qr/{code}/action")]
#[tracing::instrument(skip(db, req))]
pub async fn take_action_for_code(
    db: Data<Box<dyn Database>>,
    params: Path<String>,
    body: Json<QrActionBody>,
    req: HttpRequest,
) -> Result<Json<MessageBody>, Error> {
    let code = params.into_inner();
    let body = body.into_inner();

    let message =
        manager::perform_action(&***db, &code, body.action, client_info(&req), Utc::now()).await?;

    Ok(Json(MessageBody::new(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test::{test_campaign, test_space, MockDatabase};
    use actix_web::http::StatusCode;
    use actix_web::web::JsonConfig;
    use actix_web::{test, App};
    use serde_json::json;

    #[::core::prelude::v1::test]
    fn landing_body_uses_public_field_names() {
        let space = test_space();
        let mut campaign = test_campaign(space.id);
        campaign.code = "BMS-1700000000-abc123xyz".into();
        campaign.terms_conditions = Some("One per visit".into());
        campaign.reward = Reward {
            kind: "discount".into(),
            value: "10%".into(),
            quantity: None,
        };
        let campaign_id = campaign.id;

        let body = LandingBody {
            success: true,
            data: LandingDataBody::render(ResolvedCampaign { campaign, space }),
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "success": true,
                "data": {
                    "campaign": {
                        "id": campaign_id.to_string(),
                        "name": "Weekend Special",
                        "description": "Scan at the counter for a discount",
                        "campaignType": "discount",
                        "rewards": { "type": "discount", "value": "10%", "quantity": null },
                        "termsConditions": "One per visit"
                    },
                    "space": {
                        "name": "Corner Cafe",
                        "address": "12 MG Road",
                        "city": "Bengaluru"
                    }
                }
            })
        );
    }

    #[::core::prelude::v1::test]
    fn action_body_accepts_engage_and_redeem_only() {
        let engage: QrActionBody = serde_json::from_value(json!({ "action": "engage" })).unwrap();
        let redeem: QrActionBody = serde_json::from_value(json!({ "action": "redeem" })).unwrap();

        assert_eq!(engage.action, QrAction::Engage);
        assert_eq!(redeem.action, QrAction::Redeem);
        assert!(serde_json::from_value::<QrActionBody>(json!({ "action": "scan" })).is_err());
        assert!(serde_json::from_value::<QrActionBody>(json!({})).is_err());
    }

    #[actix_web::test]
    async fn scan_is_not_an_accepted_action() {
        let db: Box<dyn Database> = Box::new(MockDatabase::new());
        let app = test::init_service(
            App::new()
                .app_data(
                    JsonConfig::default()
                        .error_handler(|err, _req| Error::InvalidJson(err).into()),
                )
                .app_data(Data::new(db))
                .service(take_action_for_code),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/qr/BMS-1700000000-abc123xyz/action")
            .set_json(json!({ "action": "scan" }))
            .to_request();
        let response = test::call_service(&app, req).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
