use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::services::bonus::BonusRequest;
use crate::services::plans::PlanRequest;
use crate::services::referrals::ReferralRequest;
use crate::services::ServiceError;

#[derive(Deserialize)]
pub struct SwitchPlanBody {
    pub plan_type: String,
    pub data_mb: Option<i64>,
}

#[derive(Deserialize)]
pub struct PurchaseBody {
    pub data_mb: i64,
    pub cost: i64,
}

/// Domain rejections surface as 400s; everything else is a 500.
fn service_error_response(error: ServiceError) -> (StatusCode, Json<serde_json::Value>) {
    match error {
        ServiceError::Rejected(message) => (StatusCode::BAD_REQUEST, Json(json!({"error": message}))),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": other.to_string()})),
        ),
    }
}

pub async fn get_current_plan(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (plan_tx, plan_rx) = oneshot::channel();

    let send_result = state
        .plan_channel
        .send(PlanRequest::GetCurrentPlan {
            user_id,
            response: plan_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match plan_rx.await {
        Ok(Ok(Some(plan))) => (StatusCode::OK, Json(json!(plan))),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No active plan"})),
        ),
        Ok(Err(service_error)) => service_error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn switch_plan(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
    Json(req): Json<SwitchPlanBody>,
) -> impl IntoResponse {
    let (plan_tx, plan_rx) = oneshot::channel();

    let send_result = state
        .plan_channel
        .send(PlanRequest::SwitchPlan {
            user_id,
            plan_type: req.plan_type,
            data_mb: req.data_mb,
            response: plan_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match plan_rx.await {
        Ok(Ok(plan)) => (StatusCode::OK, Json(json!(plan))),
        Ok(Err(service_error)) => service_error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn purchase_data(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
    Json(req): Json<PurchaseBody>,
) -> impl IntoResponse {
    let (plan_tx, plan_rx) = oneshot::channel();

    let send_result = state
        .plan_channel
        .send(PlanRequest::PurchaseData {
            user_id,
            data_mb: req.data_mb,
            cost: req.cost,
            response: plan_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match plan_rx.await {
        Ok(Ok(plan)) => (StatusCode::CREATED, Json(json!(plan))),
        Ok(Err(service_error)) => service_error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn get_plan_history(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (plan_tx, plan_rx) = oneshot::channel();

    let send_result = state
        .plan_channel
        .send(PlanRequest::GetPlanHistory {
            user_id,
            response: plan_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match plan_rx.await {
        Ok(Ok(history)) => (StatusCode::OK, Json(json!(history))),
        Ok(Err(service_error)) => service_error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn get_bonus_info(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (bonus_tx, bonus_rx) = oneshot::channel();

    let send_result = state
        .bonus_channel
        .send(BonusRequest::GetBonusInfo {
            user_id,
            response: bonus_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match bonus_rx.await {
        Ok(Ok(Some(info))) => (StatusCode::OK, Json(json!(info))),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Bonus claim record not found"})),
        ),
        Ok(Err(service_error)) => service_error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn claim_bonus(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (bonus_tx, bonus_rx) = oneshot::channel();

    let send_result = state
        .bonus_channel
        .send(BonusRequest::Claim {
            user_id,
            response: bonus_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match bonus_rx.await {
        Ok(Ok(summary)) => (StatusCode::OK, Json(json!(summary))),
        Ok(Err(service_error)) => service_error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}

pub async fn get_referral_earnings(
    State(state): State<super::Channels>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (referral_tx, referral_rx) = oneshot::channel();

    let send_result = state
        .referral_channel
        .send(ReferralRequest::GetEarnings {
            referrer_id: user_id,
            response: referral_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error", "details": e.to_string()})),
        );
    }

    match referral_rx.await {
        Ok(Ok(earnings)) => (StatusCode::OK, Json(json!(earnings))),
        Ok(Err(service_error)) => service_error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to receive response", "details": e.to_string()})),
        ),
    }
}
