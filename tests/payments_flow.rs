mod common;

use chinchin_api::{
    dto::{addresses::CreateAddressRequest, cart::AddToCartRequest, orders::CheckoutRequest},
    entity::Payments,
    error::AppError,
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentStatus},
    routes::admin::UpdateOrderStatusRequest,
    services::{address_service, admin_service, cart_service, order_service, payment_service},
};
use common::{seed_product, stock_of, try_setup_state};
use sea_orm::EntityTrait;

// Payment confirmation: amount and state guards reject without mutating,
// success drains the cart exactly once, and redelivery is idempotent.
#[tokio::test]
async fn payment_confirmation_is_guarded_and_idempotent() -> anyhow::Result<()> {
    let Some(state) = try_setup_state().await? else {
        return Ok(());
    };

    let user = AuthUser {
        user_id: uuid::Uuid::new_v4(),
        role: "user".into(),
    };
    let admin = AuthUser {
        user_id: uuid::Uuid::new_v4(),
        role: "admin".into(),
    };

    let product = seed_product(&state, "Spicy Ginger", 100_000, 5).await?;

    cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product,
            quantity: 2,
        },
    )
    .await?;

    let address = address_service::add_address(
        &state.pool,
        &user,
        CreateAddressRequest {
            label: "Office".into(),
            name: "Chidi N.".into(),
            street: "4 Marina Road".into(),
            city: "Lagos Island".into(),
            state: "Lagos".into(),
            phone: "+2348098765432".into(),
        },
    )
    .await?
    .data
    .expect("address");

    let order = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address_id: address.id,
            delivery_fee: Some(150_000),
        },
    )
    .await?
    .data
    .expect("order")
    .order;
    assert_eq!(order.total_amount, 350_000);
    assert_eq!(stock_of(&state, product).await?, 3);

    // Unknown order id.
    let err = payment_service::confirm_payment(&state, uuid::Uuid::new_v4(), "ref-1", 350_000)
        .await
        .expect_err("unknown order");
    assert!(matches!(err, AppError::OrderNotFound));

    // Amount guard: a mismatched amount rejects with no mutation at all.
    let err = payment_service::confirm_payment(&state, order.id, "ref-1", 100)
        .await
        .expect_err("mismatched amount");
    assert!(matches!(err, AppError::AmountMismatch { .. }));

    let unchanged = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(unchanged.order.status, OrderStatus::Pending);
    assert_eq!(stock_of(&state, product).await?, 3);
    assert_eq!(Payments::find().all(&state.orm).await?.len(), 0);

    // Exact amount finalizes: Paid, reference stored, cart drained, one
    // payment row.
    let confirmed_id =
        payment_service::confirm_payment(&state, order.id, "ref-1", 350_000).await?;
    assert_eq!(confirmed_id, order.id);

    let paid = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(paid.order.status, OrderStatus::Paid);
    assert_eq!(paid.order.payment_status, PaymentStatus::Success);
    assert_eq!(paid.order.payment_reference.as_deref(), Some("ref-1"));
    assert!(paid.order.paid_at.is_some());

    let cart = cart_service::get_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());

    let payments = Payments::find().all(&state.orm).await?;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].transaction_reference, "ref-1");
    assert_eq!(payments[0].amount, 350_000);

    // At-least-once delivery: the same reference short-circuits to the same
    // order id with no second payment row or state change.
    let repeat_id = payment_service::confirm_payment(&state, order.id, "ref-1", 350_000).await?;
    assert_eq!(repeat_id, order.id);
    assert_eq!(Payments::find().all(&state.orm).await?.len(), 1);

    // Even with a garbled amount, a known reference never reapplies.
    let repeat_id = payment_service::confirm_payment(&state, order.id, "ref-1", 999).await?;
    assert_eq!(repeat_id, order.id);

    // State guard: a fresh reference cannot re-confirm a paid order.
    let err = payment_service::confirm_payment(&state, order.id, "ref-2", 350_000)
        .await
        .expect_err("already paid");
    assert!(matches!(err, AppError::InvalidOrderState(_)));

    // The armed expiration timer fires late and must no-op: the order stays
    // paid and the sold stock is not resurrected.
    assert!(!order_service::expire_order(&state, order.id).await?);
    assert_eq!(stock_of(&state, product).await?, 3);
    let still_paid = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(still_paid.order.status, OrderStatus::Paid);

    // Fulfilment advances only along the admin chain.
    let prepared = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Preparing,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(prepared.status, OrderStatus::Preparing);

    let err = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Delivered,
        },
    )
    .await
    .expect_err("skipping out_for_delivery");
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}
