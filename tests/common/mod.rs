#![allow(dead_code)]

use chinchin_api::{
    config::{AppConfig, DEFAULT_ASSISTANT_BASE_URL, DEFAULT_PAYSTACK_BASE_URL},
    db::{create_orm_conn, create_pool, run_migrations},
    entity::products::ActiveModel as ProductActive,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use uuid::Uuid;

/// Returns `None` (and prints a notice) when no database is configured, so
/// integration flows can skip instead of failing.
pub async fn try_setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, payments, orders, cart_items, carts, addresses, audit_logs, products RESTART IDENTITY CASCADE",
    ))
    .await?;

    let pool = create_pool(&database_url).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".to_string(),
        port: 0,
        paystack_secret_key: None,
        paystack_base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(),
        assistant_api_key: None,
        assistant_base_url: DEFAULT_ASSISTANT_BASE_URL.to_string(),
        assistant_model: "test".to_string(),
        delivery_fee: 150_000,
    };

    Ok(Some(AppState::new(config, pool, orm)))
}

pub async fn seed_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some("A snack for testing".to_string())),
        price: Set(price),
        category: Set("classic".to_string()),
        image_url: Set(None),
        is_active: Set(true),
        stock: Set(stock),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = chinchin_api::entity::Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .expect("product exists");
    Ok(product.stock)
}
