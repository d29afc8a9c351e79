use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::bonus::BonusRequest;
use super::events::UiEvents;
use super::payments::PaymentRequest;
use super::plans::PlanRequest;
use super::referrals::ReferralRequest;
use super::users::UserRequest;
use super::vpn::VpnRequest;
use super::wallet::WalletRequest;

mod events;
mod payments;
mod plans;
mod users;
mod vpn;

#[derive(Clone)]
pub struct Channels {
    pub user_channel: mpsc::Sender<UserRequest>,
    pub wallet_channel: mpsc::Sender<WalletRequest>,
    pub plan_channel: mpsc::Sender<PlanRequest>,
    pub bonus_channel: mpsc::Sender<BonusRequest>,
    pub referral_channel: mpsc::Sender<ReferralRequest>,
    pub payment_channel: mpsc::Sender<PaymentRequest>,
    pub vpn_channel: mpsc::Sender<VpnRequest>,
    pub events: UiEvents,
}

pub async fn start_http_server(
    bind_addr: &str,
    channels: Channels,
) -> Result<(), anyhow::Error> {
    let app = Router::new()
        .route("/users", post(users::create_user))
        .route("/users/{user_id}", get(users::get_user))
        .route("/users/{user_id}/wallet", get(users::get_wallet))
        .route("/users/{user_id}/transactions", get(users::get_transactions))
        .route("/users/{user_id}/plan", get(plans::get_current_plan))
        .route("/users/{user_id}/plan/switch", post(plans::switch_plan))
        .route("/users/{user_id}/plan/purchase", post(plans::purchase_data))
        .route("/users/{user_id}/plan/history", get(plans::get_plan_history))
        .route("/users/{user_id}/bonus", get(plans::get_bonus_info))
        .route("/users/{user_id}/bonus/claim", post(plans::claim_bonus))
        .route(
            "/users/{user_id}/referrals/earnings",
            get(plans::get_referral_earnings),
        )
        .route("/users/{user_id}/vpn", get(vpn::get_stats))
        .route("/users/{user_id}/vpn/connect", post(vpn::connect))
        .route("/users/{user_id}/vpn/disconnect", post(vpn::disconnect))
        .route("/users/{user_id}/events", get(events::subscribe))
        .route("/payments/initialize", post(payments::initialize_topup))
        .route("/payments/webhook", post(payments::webhook))
        .route("/health", get(|| async { "OK" }))
        .with_state(channels)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    println!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
