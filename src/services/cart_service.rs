use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CartLineRow {
    item_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    category: String,
    image_url: Option<String>,
    is_active: bool,
    stock: i32,
    created_at: DateTime<Utc>,
}

/// Fetch the user's cart row, creating it lazily on first use.
async fn get_or_create_cart(pool: &DbPool, user_id: Uuid) -> AppResult<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    // Two near-simultaneous first adds race here; the conflict clause makes
    // both land on the same row.
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO carts (id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn get_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let cart_id = get_or_create_cart(pool, user.user_id).await?;

    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ci.id AS item_id, ci.quantity,
               p.id AS product_id, p.name, p.description, p.price, p.category,
               p.image_url, p.is_active, p.stock, p.created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| CartItemDto {
            id: row.item_id,
            quantity: row.quantity,
            product: Product {
                id: row.product_id,
                name: row.name,
                description: row.description,
                price: row.price,
                category: row.category,
                image_url: row.image_url,
                is_active: row.is_active,
                stock: row.stock,
                created_at: row.created_at,
            },
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CartList { cart_id, items },
        Some(Meta::empty()),
    ))
}

/// Add a product to the cart, merging onto an existing line by incrementing
/// its quantity. Stock is neither checked nor reserved here; that happens
/// only at checkout.
pub async fn add_item(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product: Option<(String, bool)> =
        sqlx::query_as("SELECT name, is_active FROM products WHERE id = $1")
            .bind(payload.product_id)
            .fetch_optional(pool)
            .await?;
    let (name, is_active) = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".to_string())),
    };
    if !is_active {
        return Err(AppError::ProductUnavailable(name));
    }

    let cart_id = get_or_create_cart(pool, user.user_id).await?;

    let cart_item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (cart_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("OK", cart_item, None))
}

/// Set a line's quantity; anything at or below zero deletes the line.
pub async fn update_item(
    pool: &DbPool,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return remove_item(pool, user, item_id).await;
    }

    let updated: Option<CartItem> = sqlx::query_as(
        r#"
        UPDATE cart_items ci
        SET quantity = $3
        FROM carts c
        WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
        RETURNING ci.*
        "#,
    )
    .bind(item_id)
    .bind(user.user_id)
    .bind(payload.quantity)
    .fetch_optional(pool)
    .await?;

    let cart_item = match updated {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_item(
    pool: &DbPool,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartItem>> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items ci
        USING carts c
        WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
        "#,
    )
    .bind(item_id)
    .bind(user.user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse {
        message: "Removed from cart".to_string(),
        data: None,
        meta: Some(Meta::empty()),
    })
}

pub async fn clear_cart(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    sqlx::query(
        r#"
        DELETE FROM cart_items
        USING carts
        WHERE cart_items.cart_id = carts.id AND carts.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .execute(pool)
    .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
