use chinchin_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;
    seed_products(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // Prices in kobo.
    let products = vec![
        (
            "Classic Crunch",
            "The original golden-fried chin-chin, lightly sweetened",
            150_000_i64,
            "classic",
            120,
        ),
        (
            "Coconut Chin-Chin",
            "Toasted coconut folded into every crunchy bite",
            180_000,
            "sweet",
            80,
        ),
        (
            "Spicy Ginger",
            "A warm ginger kick behind the crunch",
            180_000,
            "spicy",
            60,
        ),
        (
            "Honey Glazed",
            "Slow-glazed with wildflower honey",
            220_000,
            "sweet",
            45,
        ),
        (
            "Party Mix (1kg)",
            "A family-size bag mixing all four flavors",
            600_000,
            "classic",
            30,
        ),
    ];

    for (name, desc, price, category, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(category)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
