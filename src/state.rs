use crate::{
    assistant::AssistantClient,
    config::AppConfig,
    db::{DbPool, OrmConn},
    paystack::PaystackClient,
};

/// Shared handles passed to every handler. External clients are injected
/// here rather than read from ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
    pub paystack: PaystackClient,
    pub assistant: AssistantClient,
}

impl AppState {
    pub fn new(config: AppConfig, pool: DbPool, orm: OrmConn) -> Self {
        let paystack = PaystackClient::new(
            config.paystack_base_url.clone(),
            config.paystack_secret_key.clone(),
        );
        let assistant = AssistantClient::new(
            config.assistant_base_url.clone(),
            config.assistant_api_key.clone(),
            config.assistant_model.clone(),
        );
        Self {
            pool,
            orm,
            config,
            paystack,
            assistant,
        }
    }
}
