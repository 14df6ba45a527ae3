use axum::{Json, Router, extract::State, routing::post};

use crate::{
    audit::log_audit,
    dto::payments::{VerifyPaymentRequest, VerifyPaymentResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/verify", post(verify_payment))
}

/// The sole trust boundary between the client-observed payment popup and
/// order finalization: the reference is re-verified server-to-server with
/// the gateway before any state changes.
#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified and order finalized", body = ApiResponse<VerifyPaymentResponse>),
        (status = 409, description = "Verification failed"),
        (status = 502, description = "Gateway unreachable or rejected the check"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<ApiResponse<VerifyPaymentResponse>>> {
    if payload.reference.trim().is_empty() {
        return Err(AppError::BadRequest("No reference supplied".into()));
    }

    let verified = state.paystack.verify_transaction(&payload.reference).await?;

    match payment_service::confirm_payment(
        &state,
        payload.order_id,
        &verified.reference,
        verified.amount,
    )
    .await
    {
        Ok(order_id) => Ok(Json(ApiResponse::success(
            "Payment verified",
            VerifyPaymentResponse {
                success: true,
                order_id,
                amount_paid: verified.amount,
                reference: verified.reference,
            },
            Some(Meta::empty()),
        ))),
        Err(err) if err.is_payment_integrity_failure() => {
            // Possible fraud or a race with expiration; keep the detail
            // server-side and answer with the generic body.
            tracing::warn!(
                order_id = %payload.order_id,
                reference = %verified.reference,
                error = %err,
                "rejected payment confirmation"
            );
            if let Err(audit_err) = log_audit(
                &state.pool,
                Some(user.user_id),
                "payment_rejected",
                Some("orders"),
                Some(serde_json::json!({
                    "order_id": payload.order_id,
                    "reference": verified.reference,
                    "detail": err.to_string(),
                })),
            )
            .await
            {
                tracing::warn!(error = %audit_err, "audit log failed");
            }
            Err(err)
        }
        Err(err) => Err(err),
    }
}
