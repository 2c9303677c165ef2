use serde::{Deserialize, Serialize};

use crate::engagement::EngagementAction;

pub mod endpoints;
pub mod manager;
pub use endpoints::*;

/// Actions a visitor can take from the landing page. Scans are recorded
/// implicitly when the page is resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QrAction {
    Engage,
    Redeem,
}

impl QrAction {
    pub fn success_message(self) -> &'static str {
        match self {
            QrAction::Engage => "Thank you for participating!",
            QrAction::Redeem => "Reward redeemed successfully!",
        }
    }
}

impl From<QrAction> for EngagementAction {
    fn from(action: QrAction) -> EngagementAction {
        match action {
            QrAction::Engage => EngagementAction::Engage,
            QrAction::Redeem => EngagementAction::Redeem,
        }
    }
}
