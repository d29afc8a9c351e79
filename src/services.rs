use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::settings::Settings;

mod billing;
mod bonus;
mod events;
mod http;
mod payments;
mod plans;
mod referrals;
mod users;
mod vpn;
mod wallet;

#[derive(Debug, thiserror::Error)]
enum ServiceError {
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Repository error: {0} - {1}")]
    Repository(String, String),
    #[error("Rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (user_tx, mut user_rx) = mpsc::channel(512);
    let (wallet_tx, mut wallet_rx) = mpsc::channel(512);
    let (plan_tx, mut plan_rx) = mpsc::channel(512);
    let (bonus_tx, mut bonus_rx) = mpsc::channel(512);
    let (billing_tx, mut billing_rx) = mpsc::channel(512);
    let (referral_tx, mut referral_rx) = mpsc::channel(512);
    let (payment_tx, mut payment_rx) = mpsc::channel(512);
    let (vpn_tx, mut vpn_rx) = mpsc::channel(512);

    let ui_events = events::UiEvents::new(256);

    let mut user_service = users::UserService::new();
    let mut wallet_service = wallet::WalletService::new();
    let mut plan_service = plans::PlanService::new();
    let mut bonus_service = bonus::BonusService::new();
    let mut billing_service = billing::BillingService::new();
    let mut referral_service = referrals::ReferralService::new();
    let mut payment_service = payments::PaymentService::new();
    let mut vpn_service = vpn::VpnService::new();

    println!("[*] Starting user service.");
    let user_pool_clone = pool.clone();
    tokio::spawn(async move {
        user_service
            .run(
                users::UserRequestHandler::new(user_pool_clone),
                &mut user_rx,
            )
            .await;
    });

    println!("[*] Starting wallet service.");
    let wallet_pool_clone = pool.clone();
    tokio::spawn(async move {
        wallet_service
            .run(
                wallet::WalletRequestHandler::new(wallet_pool_clone),
                &mut wallet_rx,
            )
            .await;
    });

    println!("[*] Starting plan service.");
    let plan_pool_clone = pool.clone();
    let plan_referral_tx = referral_tx.clone();
    let plan_events = ui_events.clone();
    tokio::spawn(async move {
        plan_service
            .run(
                plans::PlanRequestHandler::new(plan_pool_clone, plan_referral_tx, plan_events),
                &mut plan_rx,
            )
            .await;
    });

    println!("[*] Starting bonus service.");
    let bonus_pool_clone = pool.clone();
    let bonus_events = ui_events.clone();
    tokio::spawn(async move {
        bonus_service
            .run(
                bonus::BonusRequestHandler::new(bonus_pool_clone, bonus_events),
                &mut bonus_rx,
            )
            .await;
    });

    log::info!("Starting billing dispatcher.");
    let billing_pool_clone = pool.clone();
    let billing_events = ui_events.clone();
    tokio::spawn(async move {
        billing_service
            .run(
                billing::BillingRequestHandler::new(billing_pool_clone, billing_events),
                &mut billing_rx,
            )
            .await;
    });

    println!("[*] Starting referral service.");
    let referral_pool_clone = pool.clone();
    let referral_events = ui_events.clone();
    tokio::spawn(async move {
        referral_service
            .run(
                referrals::ReferralRequestHandler::new(referral_pool_clone, referral_events),
                &mut referral_rx,
            )
            .await;
    });

    println!("[*] Starting payment service.");
    let payment_pool_clone = pool.clone();
    let payment_events = ui_events.clone();
    let paystack_settings = settings.paystack;
    tokio::spawn(async move {
        payment_service
            .run(
                payments::PaymentRequestHandler::new(
                    paystack_settings.secret_key,
                    paystack_settings.url,
                    payment_pool_clone,
                    payment_events,
                ),
                &mut payment_rx,
            )
            .await;
    });

    log::info!("Starting VPN session service.");
    let vpn_billing_tx = billing_tx.clone();
    let vpn_events = ui_events.clone();
    tokio::spawn(async move {
        vpn_service
            .run(
                vpn::VpnRequestHandler::new(vpn_billing_tx, vpn_events),
                &mut vpn_rx,
            )
            .await;
    });

    println!("[*] Starting HTTP server.");
    http::start_http_server(
        &settings.server.bind_addr,
        http::Channels {
            user_channel: user_tx,
            wallet_channel: wallet_tx,
            plan_channel: plan_tx,
            bonus_channel: bonus_tx,
            referral_channel: referral_tx,
            payment_channel: payment_tx,
            vpn_channel: vpn_tx,
            events: ui_events,
        },
    )
    .await?;

    Ok(())
}
