use actix_web::post;
use actix_web::web::{Data, Json};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Error;
use crate::user::UserId;
use crate::utils::MessageBody;

use super::gateway::PaymentGateway;
use super::{manager, SubscriptionId};

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateOrderBody {
    pub user_id: UserId,
    pub plan: String,
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderBody {
    pub subscription_id: SubscriptionId,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyPaymentBody {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

fn configured(gateway: &Option<PaymentGateway>) -> Result<&PaymentGateway, Error> {
    gateway
        .as_ref()
        .ok_or(Error::ServiceNotConfigured { service: "payment" })
}

#[post("/payments/orders")]
#[tracing::instrument(skip(db, gateway))]
pub async fn create_payment_order(
    db: Data<Box<dyn Database>>,
    gateway: Data<Option<PaymentGateway>>,
    body: Json<CreateOrderBody>,
) -> Result<Json<OrderBody>, Error> {
    let gateway = configured(&gateway)?;
    let body = body.into_inner();

    let (subscription, order) = manager::create_order(
        &***db,
        gateway,
        body.user_id,
        body.plan,
        body.amount,
        &body.currency,
    )
    .await?;

    Ok(Json(OrderBody {
        subscription_id: subscription.id,
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        key_id: gateway.key_id().to_string(),
    }))
}

#[post("/payments/verify")]
#[tracing::instrument(skip(db, gateway))]
pub async fn verify_payment(
    db: Data<Box<dyn Database>>,
    gateway: Data<Option<PaymentGateway>>,
    body: Json<VerifyPaymentBody>,
) -> Result<Json<MessageBody>, Error> {
    let gateway = configured(&gateway)?;
    let body = body.into_inner();

    manager::verify_payment(
        &***db,
        gateway,
        &body.order_id,
        &body.payment_id,
        &body.signature,
    )
    .await?;

    Ok(Json(MessageBody::new("Payment verified successfully")))
}
