use std::env;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
pub const DEFAULT_ASSISTANT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default flat delivery fee in kobo (₦1,500).
pub const DEFAULT_DELIVERY_FEE: i64 = 150_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Secret key for server-to-server Paystack verification. Verification
    /// requests fail with a gateway error when unset.
    pub paystack_secret_key: Option<String>,
    pub paystack_base_url: String,
    /// API key for the hosted model behind the shopping assistant. The
    /// assistant degrades to a canned reply when unset.
    pub assistant_api_key: Option<String>,
    pub assistant_base_url: String,
    pub assistant_model: String,
    /// Delivery fee in kobo applied at checkout when the client does not
    /// send one.
    pub delivery_fee: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let paystack_secret_key = env::var("PAYSTACK_SECRET_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let paystack_base_url =
            env::var("PAYSTACK_BASE_URL").unwrap_or_else(|_| DEFAULT_PAYSTACK_BASE_URL.to_string());
        let assistant_api_key = env::var("ASSISTANT_API_KEY").ok().filter(|k| !k.is_empty());
        let assistant_base_url = env::var("ASSISTANT_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_ASSISTANT_BASE_URL.to_string());
        let assistant_model =
            env::var("ASSISTANT_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());
        let delivery_fee = env::var("DELIVERY_FEE_KOBO")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_DELIVERY_FEE);
        Ok(Self {
            database_url,
            host,
            port,
            paystack_secret_key,
            paystack_base_url,
            assistant_api_key,
            assistant_base_url,
            assistant_model,
            delivery_fee,
        })
    }
}
