mod common;

use chinchin_api::{
    dto::{addresses::CreateAddressRequest, cart::AddToCartRequest, orders::CheckoutRequest},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    middleware::auth::AuthUser,
    models::OrderStatus,
    services::{address_service, cart_service, order_service},
};
use chrono::{Duration, Utc};
use common::{seed_product, stock_of, try_setup_state};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

// After a restart the in-process timers are gone; re-arming must expire an
// overdue pending order and return its reservation.
#[tokio::test]
async fn rearm_expires_overdue_pending_orders() -> anyhow::Result<()> {
    let Some(state) = try_setup_state().await? else {
        return Ok(());
    };

    let user = AuthUser {
        user_id: uuid::Uuid::new_v4(),
        role: "user".into(),
    };

    let product = seed_product(&state, "Party Mix (1kg)", 600_000, 2).await?;

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
            label: "Home".into(),
            name: "Ngozi E.".into(),
            street: "7 Aba Road".into(),
            city: "Port Harcourt".into(),
            state: "Rivers".into(),
            phone: "+2347011122233".into(),
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
    assert_eq!(stock_of(&state, product).await?, 0);

    // Simulate a restart that happened after the payment window closed.
    let existing = Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .expect("order row");
    let mut active: OrderActive = existing.into();
    active.expires_at = Set((Utc::now() - Duration::minutes(1)).into());
    active.update(&state.orm).await?;

    let rearmed = order_service::rearm_pending_orders(&state).await?;
    assert_eq!(rearmed, 1);

    // The overdue timer fires immediately but asynchronously.
    let mut expired = false;
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let current = Orders::find_by_id(order.id)
            .one(&state.orm)
            .await?
            .expect("order row");
        if current.status == OrderStatus::Expired {
            expired = true;
            break;
        }
    }
    assert!(expired, "overdue order should expire shortly after re-arm");
    assert_eq!(stock_of(&state, product).await?, 2);

    Ok(())
}
