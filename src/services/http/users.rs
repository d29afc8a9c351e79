use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::profiles::NewProfile;
use crate::services::users::UserRequest;
use crate::services::wallet::WalletRequest;

pub async fn create_user(
    State(state): State<super::Channels>,
    Json(req): Json<NewProfile>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::CreateUser {
            email: req.email,
            referral_code: req.referral_code,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match user_rx.await {
        Ok(Ok(profile)) => (StatusCode::CREATED, Json(json!(profile))),
        Ok(Err(service_error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Could not create user", "details": service_error.to_string()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn get_user(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::GetUser {
            id: user_id,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match user_rx.await {
        Ok(Ok(Some(profile))) => (StatusCode::OK, Json(json!(profile))),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "User not found"})),
        ),
        Ok(Err(service_error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Database error", "details": service_error.to_string()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn get_wallet(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (wallet_tx, wallet_rx) = oneshot::channel();

    let send_result = state
        .wallet_channel
        .send(WalletRequest::GetWallet {
            user_id,
            response: wallet_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match wallet_rx.await {
        Ok(Ok(Some(wallet))) => (StatusCode::OK, Json(json!(wallet))),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Wallet not found"})),
        ),
        Ok(Err(service_error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Database error", "details": service_error.to_string()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn get_transactions(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (wallet_tx, wallet_rx) = oneshot::channel();

    let send_result = state
        .wallet_channel
        .send(WalletRequest::GetTransactions {
            user_id,
            response: wallet_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match wallet_rx.await {
        Ok(Ok(transactions)) => (StatusCode::OK, Json(json!(transactions))),
        Ok(Err(service_error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Database error", "details": service_error.to_string()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}
