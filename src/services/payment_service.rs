use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        orders::{ActiveModel as OrderActive, Entity as Orders},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    models::{OrderStatus, PaymentStatus},
    state::AppState,
};

const PROVIDER: &str = "Paystack";

/// Apply a gateway-verified payment to an order. Must only be called after
/// the amount and reference were re-verified server-to-server; the caller
/// never forwards a client-claimed success.
///
/// Idempotent under at-least-once delivery: the unique transaction
/// reference is the dedup key, and a repeat call returns the already-paid
/// order id without further effects. Guard failures roll back the whole
/// transaction.
pub async fn confirm_payment(
    state: &AppState,
    order_id: Uuid,
    reference: &str,
    amount: i64,
) -> AppResult<Uuid> {
    let txn = state.orm.begin().await?;

    if let Some(existing) = Payments::find()
        .filter(PaymentCol::TransactionReference.eq(reference))
        .one(&txn)
        .await?
    {
        return Ok(existing.order_id);
    }

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::OrderNotFound),
    };

    // Never resurrect an expired or cancelled order, never double-credit a
    // paid one.
    if order.status != OrderStatus::Pending {
        return Err(AppError::InvalidOrderState(order.status.to_string()));
    }
    if amount != order.total_amount {
        return Err(AppError::AmountMismatch {
            expected: order.total_amount,
            got: amount,
        });
    }

    let user_id = order.user_id;
    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Paid);
    active.payment_status = Set(PaymentStatus::Success);
    active.payment_reference = Set(Some(reference.to_string()));
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    // The cart survived checkout; a successful payment is where it drains.
    if let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(&txn)
        .await?
    {
        CartItems::delete_many()
            .filter(CartItemCol::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
    }

    PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        provider: Set(PROVIDER.to_string()),
        transaction_reference: Set(reference.to_string()),
        amount: Set(amount),
        status: Set(PaymentStatus::Success),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        "payment_confirmed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "reference": reference, "amount": amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(order.id)
}
