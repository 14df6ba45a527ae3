mod common;

use chinchin_api::{
    dto::{addresses::CreateAddressRequest, cart::AddToCartRequest, orders::CheckoutRequest},
    error::AppError,
    middleware::auth::AuthUser,
    models::OrderStatus,
    routes::admin::UpdateOrderStatusRequest,
    services::{address_service, admin_service, cart_service, order_service, payment_service},
};
use common::{seed_product, stock_of, try_setup_state};

// Integration flow: reservation arithmetic, retried checkout against the
// depleted stock, expiration rollback, and admin cancellation.
#[tokio::test]
async fn checkout_reserves_stock_and_expiration_returns_it() -> anyhow::Result<()> {
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

    // Prices in kobo: ₦1,000 and ₦2,000.
    let product_a = seed_product(&state, "Classic Crunch", 100_000, 5).await?;
    let product_b = seed_product(&state, "Honey Glazed", 200_000, 1).await?;

    cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product_a,
            quantity: 2,
        },
    )
    .await?;
    cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product_b,
            quantity: 1,
        },
    )
    .await?;

    let address = address_service::add_address(
        &state.pool,
        &user,
        CreateAddressRequest {
            label: "Home".into(),
            name: "Ada O.".into(),
            street: "12 Allen Avenue".into(),
            city: "Ikeja".into(),
            state: "Lagos".into(),
            phone: "+2348012345678".into(),
        },
    )
    .await?
    .data
    .expect("address");

    let checkout = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address_id: address.id,
            delivery_fee: Some(150_000),
        },
    )
    .await?
    .data
    .expect("order with items");

    // (2 × 100 000) + (1 × 200 000) + 150 000 delivery
    assert_eq!(checkout.order.total_amount, 650_000);
    assert_eq!(checkout.order.status, OrderStatus::Pending);
    assert_eq!(checkout.items.len(), 2);

    let items_subtotal: i64 = checkout
        .items
        .iter()
        .map(|i| i.product_price * i.quantity as i64)
        .sum();
    assert_eq!(checkout.order.total_amount, items_subtotal + 150_000);

    // Reservation happened at creation, not payment.
    assert_eq!(stock_of(&state, product_a).await?, 3);
    assert_eq!(stock_of(&state, product_b).await?, 0);

    // The cart is preserved until payment succeeds...
    let cart = cart_service::get_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 2);

    // ...so a retried checkout re-validates against the depleted stock.
    let err = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address_id: address.id,
            delivery_fee: Some(150_000),
        },
    )
    .await
    .expect_err("second reservation of the last unit must fail");
    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(stock_of(&state, product_a).await?, 3);
    assert_eq!(stock_of(&state, product_b).await?, 0);

    // Expiration is the compensating transaction for the reservation.
    assert!(order_service::expire_order(&state, checkout.order.id).await?);
    assert_eq!(stock_of(&state, product_a).await?, 5);
    assert_eq!(stock_of(&state, product_b).await?, 1);

    let expired = order_service::get_order(&state, &user, checkout.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(expired.order.status, OrderStatus::Expired);

    // A duplicate firing is a guarded no-op; stock is returned exactly once.
    assert!(!order_service::expire_order(&state, checkout.order.id).await?);
    assert_eq!(stock_of(&state, product_a).await?, 5);
    assert_eq!(stock_of(&state, product_b).await?, 1);

    // The cart survived expiration, so checking out again succeeds now that
    // the reservation came back.
    let second = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address_id: address.id,
            delivery_fee: None,
        },
    )
    .await?
    .data
    .expect("second order");
    assert_eq!(second.order.total_amount, 550_000); // default fee from config
    assert_eq!(stock_of(&state, product_b).await?, 0);

    // Admin cancellation of a pending order releases the reservation too.
    let cancelled = admin_service::update_order_status(
        &state,
        &admin,
        second.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await?
    .data
    .expect("cancelled order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, product_a).await?, 5);
    assert_eq!(stock_of(&state, product_b).await?, 1);

    // And the late expiration timer for it will no-op.
    assert!(!order_service::expire_order(&state, second.order.id).await?);

    // A cancelled order cannot be resurrected by a late gateway callback.
    let err = payment_service::confirm_payment(&state, second.order.id, "ref-late", 550_000)
        .await
        .expect_err("cancelled order");
    assert!(matches!(err, AppError::InvalidOrderState(_)));
    assert_eq!(stock_of(&state, product_a).await?, 5);
    assert_eq!(stock_of(&state, product_b).await?, 1);

    Ok(())
}
