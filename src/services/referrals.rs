use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::events::UiEvents;
use super::{RequestHandler, Service, ServiceError};
use crate::models::events::UiEvent;
use crate::models::referrals::ReferralEarning;
use crate::repositories::referrals::{CommissionOutcome, ReferralRepository};

pub enum ReferralRequest {
    /// Posted after a data purchase commits. No response channel; a failed
    /// commission is logged, never retried.
    PurchaseCommission { buyer_id: String, amount: i64 },
    GetEarnings {
        referrer_id: String,
        response: oneshot::Sender<Result<Vec<ReferralEarning>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ReferralRequestHandler {
    repository: ReferralRepository,
    events: UiEvents,
}

impl ReferralRequestHandler {
    pub fn new(sql_conn: PgPool, events: UiEvents) -> Self {
        let repository = ReferralRepository::new(sql_conn);

        ReferralRequestHandler { repository, events }
    }

    async fn post_purchase_commission(
        &self,
        buyer_id: &str,
        amount: i64,
    ) -> Result<(), ServiceError> {
        let outcome = self
            .repository
            .post_purchase_commission(buyer_id, amount)
            .await
            .map_err(|e| ServiceError::Repository("ReferralService".to_string(), e.to_string()))?;

        if let CommissionOutcome::Posted {
            referrer_id,
            commission,
            referrer_balance,
        } = outcome
        {
            log::info!(
                "Posted {} kobo referral commission to {} for purchase by {}",
                commission,
                referrer_id,
                buyer_id
            );
            self.events.emit(UiEvent::WalletUpdated {
                user_id: referrer_id,
                balance: referrer_balance,
            });
        }

        Ok(())
    }

    async fn get_earnings(
        &self,
        referrer_id: &str,
    ) -> Result<Vec<ReferralEarning>, ServiceError> {
        self.repository
            .list_earnings(referrer_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<ReferralRequest> for ReferralRequestHandler {
    async fn handle_request(&self, request: ReferralRequest) {
        match request {
            ReferralRequest::PurchaseCommission { buyer_id, amount } => {
                if let Err(e) = self.post_purchase_commission(&buyer_id, amount).await {
                    log::error!("Error posting referral commission: {}", e);
                }
            }
            ReferralRequest::GetEarnings {
                referrer_id,
                response,
            } => {
                let earnings = self.get_earnings(&referrer_id).await;
                let _ = response.send(earnings);
            }
        }
    }
}

pub struct ReferralService;

impl ReferralService {
    pub fn new() -> Self {
        ReferralService {}
    }
}

#[async_trait]
impl Service<ReferralRequest, ReferralRequestHandler> for ReferralService {}
