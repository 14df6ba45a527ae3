mod common;

use chinchin_api::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::AppError,
    middleware::auth::AuthUser,
    services::cart_service,
};
use common::{seed_product, try_setup_state};

// Cart semantics: lazy creation, merge-on-duplicate, delete-at-zero. No
// stock checks happen here.
#[tokio::test]
async fn cart_merges_lines_and_deletes_at_zero() -> anyhow::Result<()> {
    let Some(state) = try_setup_state().await? else {
        return Ok(());
    };

    let user = AuthUser {
        user_id: uuid::Uuid::new_v4(),
        role: "user".into(),
    };

    let product = seed_product(&state, "Coconut Chin-Chin", 180_000, 10).await?;

    // Adding is allowed past available stock; only checkout validates it.
    let first = cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product,
            quantity: 8,
        },
    )
    .await?
    .data
    .expect("cart item");
    assert_eq!(first.quantity, 8);

    // A duplicate add merges by incrementing the existing line.
    let merged = cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product,
            quantity: 3,
        },
    )
    .await?
    .data
    .expect("cart item");
    assert_eq!(merged.id, first.id);
    assert_eq!(merged.quantity, 11);

    let cart = cart_service::get_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 11);

    // Setting a positive quantity replaces it.
    let updated = cart_service::update_item(
        &state.pool,
        &user,
        first.id,
        UpdateCartItemRequest { quantity: 2 },
    )
    .await?
    .data
    .expect("cart item");
    assert_eq!(updated.quantity, 2);

    // Zero or less removes the line.
    let removed = cart_service::update_item(
        &state.pool,
        &user,
        first.id,
        UpdateCartItemRequest { quantity: 0 },
    )
    .await?;
    assert!(removed.data.is_none());

    let cart = cart_service::get_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());

    // Bad inputs.
    let err = cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product,
            quantity: 0,
        },
    )
    .await
    .expect_err("zero quantity add");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: uuid::Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await
    .expect_err("unknown product");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = cart_service::remove_item(&state.pool, &user, uuid::Uuid::new_v4())
        .await
        .expect_err("unknown item");
    assert!(matches!(err, AppError::NotFound));

    // An inactive product cannot enter a cart.
    let retired = seed_product(&state, "Retired Flavor", 100_000, 5).await?;
    sqlx::query("UPDATE products SET is_active = FALSE WHERE id = $1")
        .bind(retired)
        .execute(&state.pool)
        .await?;
    let err = cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: retired,
            quantity: 1,
        },
    )
    .await
    .expect_err("inactive product");
    assert!(matches!(err, AppError::ProductUnavailable(_)));

    // Clearing empties whatever is left.
    cart_service::add_item(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product,
            quantity: 2,
        },
    )
    .await?;
    cart_service::clear_cart(&state.pool, &user).await?;
    let cart = cart_service::get_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());

    Ok(())
}
