use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::addresses::{AddressList, CreateAddressRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
};

pub async fn list_addresses(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<AddressList>> {
    let items = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

pub async fn add_address(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let address: Address = sqlx::query_as(
        r#"
        INSERT INTO addresses (id, user_id, label, name, street, city, state, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.label)
    .bind(payload.name)
    .bind(payload.street)
    .bind(payload.city)
    .bind(payload.state)
    .bind(payload.phone)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Address saved", address, None))
}

pub async fn remove_address(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "address_remove",
        Some("addresses"),
        Some(serde_json::json!({ "address_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Address removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
