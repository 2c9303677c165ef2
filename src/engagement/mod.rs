use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignId;
use crate::typedid::{TypedId, TypedIdMarker};

pub mod db;
pub mod manager;

pub type EventId = TypedId<EngagementEvent>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EngagementEvent {
    #[serde(rename = "_id")]
    pub id: EventId,
    pub campaign_id: CampaignId,
    pub action: EngagementAction,
    pub engaged: bool,
    pub redeemed: bool,
    pub user_agent: Option<String>,
    pub client_id: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl TypedIdMarker for EngagementEvent {
    fn tag() -> &'static str {
        "EVT"
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementAction {
    Scan,
    Engage,
    Redeem,
}

impl EngagementAction {
    pub fn engaged(self) -> bool {
        matches!(self, EngagementAction::Engage | EngagementAction::Redeem)
    }

    pub fn redeemed(self) -> bool {
        matches!(self, EngagementAction::Redeem)
    }
}

/// What is known about the device behind a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub client_id: Option<String>,
}

impl ClientInfo {
    pub fn new(user_agent: Option<&str>, remote_addr: Option<&str>) -> ClientInfo {
        ClientInfo {
            user_agent: user_agent.map(|agent| agent.chars().take(512).collect()),
            client_id: remote_addr.and_then(coarse_client_id),
        }
    }
}

/// Reduces an address to its network (/24 for v4, /48 for v6) so events can
/// be grouped without storing the visitor's full IP.
pub fn coarse_client_id(remote_addr: &str) -> Option<String> {
    let ip = IpAddr::from_str(remote_addr)
        .or_else(|_| SocketAddr::from_str(remote_addr).map(|addr| addr.ip()))
        .ok()?;

    match ip {
        IpAddr::V4(ip) => {
            let [a, b, c, _] = ip.octets();
            Some(format!("{}.{}.{}.0/24", a, b, c))
        }
        IpAddr::V6(ip) => {
            let segments = ip.segments();
            Some(format!(
                "{:x}:{:x}:{:x}::/48",
                segments[0], segments[1], segments[2]
            ))
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngagementEventBody {
    pub id: EventId,
    pub campaign_id: CampaignId,
    pub action: EngagementAction,
    pub engaged: bool,
    pub redeemed: bool,
    pub user_agent: Option<String>,
    pub client_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EngagementEventBody {
    pub fn render(event: EngagementEvent) -> EngagementEventBody {
        EngagementEventBody {
            id: event.id,
            campaign_id: event.campaign_id,
            action: event.action,
            engaged: event.engaged,
            redeemed: event.redeemed,
            user_agent: event.user_agent,
            client_id: event.client_id,
            created_at: event.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_flags() {
        assert!(!EngagementAction::Scan.engaged());
        assert!(!EngagementAction::Scan.redeemed());
        assert!(EngagementAction::Engage.engaged());
        assert!(!EngagementAction::Engage.redeemed());
        assert!(EngagementAction::Redeem.engaged());
        assert!(EngagementAction::Redeem.redeemed());
    }

    #[test]
    fn coarse_client_id_masks_addresses() {
        assert_eq!(
            coarse_client_id("203.0.113.77").as_deref(),
            Some("203.0.113.0/24")
        );
        assert_eq!(
            coarse_client_id("203.0.113.77:51234").as_deref(),
            Some("203.0.113.0/24")
        );
        assert_eq!(
            coarse_client_id("2001:db8:abcd:12::1").as_deref(),
            Some("2001:db8:abcd::/48")
        );
        assert_eq!(coarse_client_id("not an address"), None);
    }
}
