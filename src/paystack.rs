use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Thin client for Paystack's server-to-server verification endpoint. The
/// client-side payment popup is never trusted; this call is the only source
/// of truth for the paid amount.
#[derive(Clone)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

/// Gateway-verified transaction details, in kobo.
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
struct VerifyEnvelope {
    status: bool,
    message: Option<String>,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    amount: i64,
    reference: String,
    gateway_response: Option<String>,
}

impl PaystackClient {
    pub fn new(base_url: String, secret_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            secret_key,
        }
    }

    pub async fn verify_transaction(&self, reference: &str) -> AppResult<VerifiedTransaction> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| AppError::Gateway("payment gateway is not configured".into()))?;

        let url = format!("{}/transaction/verify/{}", self.base_url, reference);
        let response = self
            .http
            .get(&url)
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        let envelope: VerifyEnvelope = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        if !envelope.status {
            return Err(AppError::Gateway(
                envelope
                    .message
                    .unwrap_or_else(|| "verification rejected".into()),
            ));
        }

        let data = envelope
            .data
            .ok_or_else(|| AppError::Gateway("verification response missing data".into()))?;

        if data.status != "success" {
            let detail = data
                .gateway_response
                .unwrap_or_else(|| data.status.clone());
            return Err(AppError::Gateway(format!("payment not successful: {detail}")));
        }

        Ok(VerifiedTransaction {
            reference: data.reference,
            amount: data.amount,
        })
    }
}
