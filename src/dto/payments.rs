use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    /// Gateway transaction reference generated by the client for this
    /// payment attempt.
    pub reference: String,
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub order_id: Uuid,
    /// Amount the gateway reported, in kobo.
    pub amount_paid: i64,
    pub reference: String,
}
