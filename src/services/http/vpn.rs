use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::services::vpn::VpnRequest;

pub async fn connect(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    send_request(&state, |response| VpnRequest::Connect { user_id, response }).await
}

pub async fn disconnect(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    send_request(&state, |response| VpnRequest::Disconnect { user_id, response }).await
}

pub async fn get_stats(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    send_request(&state, |response| VpnRequest::GetStats { user_id, response }).await
}

async fn send_request<F>(
    state: &super::Channels,
    make_request: F,
) -> (StatusCode, Json<serde_json::Value>)
where
    F: FnOnce(oneshot::Sender<Result<crate::models::vpn::VpnStats, crate::services::ServiceError>>) -> VpnRequest,
{
    let (vpn_tx, vpn_rx) = oneshot::channel();

    let send_result = state.vpn_channel.send(make_request(vpn_tx)).await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match vpn_rx.await {
        Ok(Ok(stats)) => (
            StatusCode::OK,
            Json(json!({
                "is_connected": stats.is_connected,
                "data_used_mb": stats.data_used_mb,
                "data_saved_mb": stats.data_saved_mb,
                "download_mbps": stats.download_mbps,
                "upload_mbps": stats.upload_mbps,
                "connected_since": stats.connected_since,
                "savings_percentage": stats.savings_percentage(),
            })),
        ),
        Ok(Err(service_error)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": service_error.to_string()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}
