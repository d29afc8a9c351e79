use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::services::payments::PaymentRequest;
use crate::services::ServiceError;

#[derive(Deserialize)]
pub struct InitializeBody {
    pub user_id: String,
    pub email: String,
    pub amount: i64,
}

pub async fn initialize_topup(
    State(state): State<super::Channels>,
    Json(req): Json<InitializeBody>,
) -> impl IntoResponse {
    let (payment_tx, payment_rx) = oneshot::channel();

    let send_result = state
        .payment_channel
        .send(PaymentRequest::InitializeTopup {
            user_id: req.user_id,
            email: req.email,
            amount: req.amount,
            response: payment_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match payment_rx.await {
        Ok(Ok(checkout)) => (StatusCode::CREATED, Json(json!(checkout))),
        Ok(Err(service_error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Could not initialize payment", "details": service_error.to_string()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

/// Gateway-facing endpoint. The raw body is forwarded untouched so the
/// signature check covers exactly the bytes Paystack signed.
pub async fn webhook(
    State(state): State<super::Channels>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let signature = headers
        .get("x-paystack-signature")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let (payment_tx, payment_rx) = oneshot::channel();

    let send_result = state
        .payment_channel
        .send(PaymentRequest::Webhook {
            signature,
            body,
            response: payment_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match payment_rx.await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({"received": true}))),
        Ok(Err(ServiceError::Rejected(message))) => {
            (StatusCode::UNAUTHORIZED, Json(json!({"error": message})))
        }
        Ok(Err(service_error)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": service_error.to_string()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}
