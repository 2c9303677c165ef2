use chrono::{DateTime, Utc};
use tracing::warn;

use crate::campaign::RewardCampaign;
use crate::database::Database;
use crate::engagement::{self, ClientInfo, EngagementAction};
use crate::error::Error;
use crate::space::Space;

use super::QrAction;

#[derive(Clone, Debug)]
pub struct ResolvedCampaign {
    pub campaign: RewardCampaign,
    pub space: Space,
}

/// Finds the live campaign behind `code` along with its space. Read-only.
#[tracing::instrument(skip(db))]
pub async fn resolve_code(
    db: &dyn Database,
    code: &str,
    now: DateTime<Utc>,
) -> Result<ResolvedCampaign, Error> {
    let no_campaign = || Error::NoActiveCampaign {
        code: code.to_string(),
    };

    let campaign = db
        .campaigns()
        .fetch_campaign_by_code(code.trim())
        .await?
        .filter(|campaign| campaign.is_live(now))
        .ok_or_else(no_campaign)?;

    let space = db
        .spaces()
        .fetch_space_by_id(campaign.space_id)
        .await?
        .ok_or_else(|| {
            Error::ExistentialState(format!(
                "campaign {} references missing space {}",
                campaign.id, campaign.space_id
            ))
        })?;

    Ok(ResolvedCampaign { campaign, space })
}

/// Records the implicit scan for a landing page view. Failures are logged and
/// swallowed so the visitor still sees the campaign.
#[tracing::instrument(skip(db))]
pub async fn record_scan(db: &dyn Database, campaign: &RewardCampaign, client: ClientInfo) {
    if let Err(err) =
        engagement::manager::record_engagement(db, campaign, EngagementAction::Scan, client).await
    {
        warn!("failed to record scan for campaign {}: {}", campaign.id, err);
    }
}

#[tracing::instrument(skip(db))]
pub async fn perform_action(
    db: &dyn Database,
    code: &str,
    action: QrAction,
    client: ClientInfo,
    now: DateTime<Utc>,
) -> Result<&'static str, Error> {
    let resolved = resolve_code(db, code, now).await?;

    engagement::manager::record_engagement(db, &resolved.campaign, action.into(), client).await?;

    Ok(action.success_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{CampaignStatus, Counters};
    use crate::database::test::{test_campaign, test_space, MockDatabase};
    use std::sync::{Arc, Mutex};

    const CODE: &str = "BMS-1700000000-abc123xyz";

    fn resolvable_db(campaign: RewardCampaign, space: Space) -> MockDatabase {
        let mut db = MockDatabase::new();
        db.campaigns.on_fetch_campaign_by_code = Box::new(move |code| {
            if code == campaign.code {
                Ok(Some(campaign.clone()))
            } else {
                Ok(None)
            }
        });
        db.spaces.on_fetch_space_by_id = Box::new(move |space_id| {
            assert_eq!(space_id, space.id);
            Ok(Some(space.clone()))
        });
        db
    }

    fn example_campaign(space: &Space) -> RewardCampaign {
        let mut campaign = test_campaign(space.id);
        campaign.code = CODE.to_string();
        campaign
    }

    #[tokio::test]
    async fn resolving_twice_returns_same_campaign_and_space() {
        let space = test_space();
        let campaign = example_campaign(&space);
        let db = resolvable_db(campaign.clone(), space.clone());
        let now = Utc::now();

        let first = resolve_code(&db, CODE, now).await.unwrap();
        let second = resolve_code(&db, CODE, now).await.unwrap();

        assert_eq!(first.campaign.id, campaign.id);
        assert_eq!(second.campaign.id, campaign.id);
        assert_eq!(first.space.id, space.id);
        assert_eq!(second.space.id, space.id);
        assert_eq!(first.campaign.reward.kind, "discount");
        assert_eq!(first.campaign.reward.value, "10%");
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let space = test_space();
        let db = resolvable_db(example_campaign(&space), space);

        let result = resolve_code(&db, "BMS-0-unknown", Utc::now()).await;

        assert_eq!(
            result.unwrap_err(),
            Error::NoActiveCampaign {
                code: "BMS-0-unknown".into()
            }
        );
    }

    #[tokio::test]
    async fn inactive_code_is_not_found() {
        let space = test_space();
        let mut campaign = example_campaign(&space);
        campaign.status = CampaignStatus::Inactive;
        let db = resolvable_db(campaign, space);

        let result = resolve_code(&db, CODE, Utc::now()).await;

        assert_eq!(
            result.unwrap_err(),
            Error::NoActiveCampaign { code: CODE.into() }
        );
    }

    #[tokio::test]
    async fn missing_space_is_an_invalid_state() {
        let space = test_space();
        let campaign = example_campaign(&space);
        let mut db = resolvable_db(campaign, space);
        db.spaces.on_fetch_space_by_id = Box::new(|_| Ok(None));

        let result = resolve_code(&db, CODE, Utc::now()).await;

        assert!(matches!(result, Err(Error::ExistentialState(_))));
    }

    #[tokio::test]
    async fn actions_return_their_messages() {
        let space = test_space();
        let campaign = example_campaign(&space);
        let mut db = resolvable_db(campaign, space);
        let counters = Arc::new(Mutex::new(Counters::default()));
        let counters_clone = Arc::clone(&counters);
        db.events.on_insert_event = Box::new(|_| Ok(()));
        db.campaigns.on_claim_reward = Box::new(|_| Ok(true));
        db.campaigns.on_increment_counters = Box::new(move |_, increment| {
            let mut counters = counters_clone.lock().unwrap();
            counters.scan_count += increment.scans;
            counters.engagement_count += increment.engagements;
            counters.redemption_count += increment.redemptions;
            Ok(())
        });
        let now = Utc::now();

        let engaged = perform_action(&db, CODE, QrAction::Engage, ClientInfo::default(), now)
            .await
            .unwrap();
        let redeemed = perform_action(&db, CODE, QrAction::Redeem, ClientInfo::default(), now)
            .await
            .unwrap();

        assert_eq!(engaged, "Thank you for participating!");
        assert_eq!(redeemed, "Reward redeemed successfully!");
        assert_eq!(
            *counters.lock().unwrap(),
            Counters {
                scan_count: 2,
                engagement_count: 2,
                redemption_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn action_on_inactive_code_writes_nothing() {
        let space = test_space();
        let mut campaign = example_campaign(&space);
        campaign.status = CampaignStatus::Inactive;
        let db = resolvable_db(campaign, space);

        let result = perform_action(&db, CODE, QrAction::Engage, ClientInfo::default(), Utc::now())
            .await;

        assert_eq!(
            result.unwrap_err(),
            Error::NoActiveCampaign { code: CODE.into() }
        );
    }

    #[tokio::test]
    async fn failed_scan_is_swallowed() {
        let space = test_space();
        let campaign = example_campaign(&space);
        let mut db = MockDatabase::new();
        db.events.on_insert_event =
            Box::new(|_| Err(Error::ExistentialState("events unavailable".into())));

        record_scan(&db, &campaign, ClientInfo::default()).await;
    }
}
