use chrono::Utc;
use tracing::info;

use crate::database::Database;
use crate::error::Error;
use crate::user::UserId;
use crate::utils::require_text;

use super::gateway::{GatewayOrder, PaymentGateway};
use super::{Subscription, SubscriptionId, SubscriptionStatus};

fn normalize_currency(currency: &str) -> Result<String, Error> {
    let currency = currency.trim().to_uppercase();
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(Error::InvalidField {
            field: "currency",
            reason: "must be a three letter currency code",
        });
    }

    Ok(currency)
}

#[tracing::instrument(skip(db, gateway))]
pub async fn create_order(
    db: &dyn Database,
    gateway: &PaymentGateway,
    user_id: UserId,
    plan: String,
    amount: i64,
    currency: &str,
) -> Result<(Subscription, GatewayOrder), Error> {
    if amount <= 0 {
        return Err(Error::InvalidField {
            field: "amount",
            reason: "must be greater than zero",
        });
    }
    let plan = require_text("plan", plan)?;
    let currency = normalize_currency(currency)?;

    db.users()
        .fetch_user_by_id(user_id)
        .await?
        .ok_or(Error::UserNotFound { user_id })?;

    let subscription_id = SubscriptionId::new();
    let order = gateway
        .create_order(amount, &currency, &subscription_id.to_string())
        .await?;

    let now = Utc::now();
    let subscription = Subscription {
        id: subscription_id,
        user_id,
        plan,
        amount: order.amount,
        currency: order.currency.clone(),
        order_id: order.id.clone(),
        payment_id: None,
        status: SubscriptionStatus::Pending,
        created_at: now,
        modified_at: now,
    };

    db.subscriptions().insert_subscription(&subscription).await?;

    info!(
        "created order {} for subscription {}",
        order.id, subscription.id
    );

    Ok((subscription, order))
}

#[tracing::instrument(skip(db, gateway, signature))]
pub async fn verify_payment(
    db: &dyn Database,
    gateway: &PaymentGateway,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<Subscription, Error> {
    let subscription = db
        .subscriptions()
        .fetch_subscription_by_order_id(order_id)
        .await?
        .ok_or_else(|| Error::SubscriptionNotFound {
            order_id: order_id.to_string(),
        })?;

    if !gateway.verify_signature(order_id, payment_id, signature) {
        return Err(Error::InvalidPaymentSignature {
            order_id: order_id.to_string(),
        });
    }

    if subscription.status == SubscriptionStatus::Active {
        // the client may confirm the same payment more than once
        if subscription.payment_id.as_deref() == Some(payment_id) {
            return Ok(subscription);
        }
        return Err(Error::SubscriptionAlreadyActive {
            order_id: order_id.to_string(),
        });
    }

    let subscription = db
        .subscriptions()
        .activate_subscription(subscription, payment_id.to_string())
        .await?;

    info!("activated subscription {}", subscription.id);

    Ok(subscription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test::MockDatabase;
    use crate::payment::gateway::{sign, test_gateway};

    fn pending_subscription(order_id: &str) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: SubscriptionId::new(),
            user_id: UserId::new(),
            plan: "brand-monthly".into(),
            amount: 99900,
            currency: "INR".into(),
            order_id: order_id.into(),
            payment_id: None,
            status: SubscriptionStatus::Pending,
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn currency_is_normalized() {
        assert_eq!(normalize_currency(" inr ").unwrap(), "INR");
        assert!(normalize_currency("rupees").is_err());
    }

    #[tokio::test]
    async fn create_order_rejects_non_positive_amount() {
        let db = MockDatabase::new();
        let gateway = test_gateway("s3cret");

        let result = create_order(&db, &gateway, UserId::new(), "plan".into(), 0, "INR").await;

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidField {
                field: "amount",
                reason: "must be greater than zero"
            }
        );
    }

    #[tokio::test]
    async fn valid_signature_activates_subscription() {
        let mut db = MockDatabase::new();
        let subscription = pending_subscription("order_123");
        db.subscriptions.on_fetch_subscription_by_order_id =
            Box::new(move |_| Ok(Some(subscription.clone())));
        db.subscriptions.on_activate_subscription = Box::new(|mut subscription, payment_id| {
            subscription.status = SubscriptionStatus::Active;
            subscription.payment_id = Some(payment_id);
            Ok(subscription)
        });
        let gateway = test_gateway("s3cret");
        let signature = sign("s3cret", "order_123", "pay_456");

        let subscription = verify_payment(&db, &gateway, "order_123", "pay_456", &signature)
            .await
            .unwrap();

        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(subscription.payment_id.as_deref(), Some("pay_456"));
    }

    #[tokio::test]
    async fn invalid_signature_leaves_subscription_pending() {
        let mut db = MockDatabase::new();
        let subscription = pending_subscription("order_123");
        db.subscriptions.on_fetch_subscription_by_order_id =
            Box::new(move |_| Ok(Some(subscription.clone())));
        let gateway = test_gateway("s3cret");
        let signature = sign("wrong", "order_123", "pay_456");

        let result = verify_payment(&db, &gateway, "order_123", "pay_456", &signature).await;

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidPaymentSignature {
                order_id: "order_123".into()
            }
        );
    }

    #[tokio::test]
    async fn repeated_confirmation_is_idempotent() {
        let mut db = MockDatabase::new();
        let mut subscription = pending_subscription("order_123");
        subscription.status = SubscriptionStatus::Active;
        subscription.payment_id = Some("pay_456".into());
        db.subscriptions.on_fetch_subscription_by_order_id =
            Box::new(move |_| Ok(Some(subscription.clone())));
        let gateway = test_gateway("s3cret");
        let signature = sign("s3cret", "order_123", "pay_456");

        let subscription = verify_payment(&db, &gateway, "order_123", "pay_456", &signature)
            .await
            .unwrap();

        assert_eq!(subscription.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let mut db = MockDatabase::new();
        db.subscriptions.on_fetch_subscription_by_order_id = Box::new(|_| Ok(None));
        let gateway = test_gateway("s3cret");

        let result = verify_payment(&db, &gateway, "order_404", "pay_456", "00").await;

        assert_eq!(
            result.unwrap_err(),
            Error::SubscriptionNotFound {
                order_id: "order_404".into()
            }
        );
    }
}
