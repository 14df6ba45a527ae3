use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod assistant;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/addresses", addresses::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/assistant", assistant::router())
        .nest("/admin", admin::router())
}
