use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::events::UiEvents;
use super::{RequestHandler, Service, ServiceError};
use crate::models::bonus::{BonusInfo, ClaimOutcome};
use crate::models::events::UiEvent;
use crate::repositories::bonus::BonusRepository;

pub enum BonusRequest {
    GetBonusInfo {
        user_id: String,
        response: oneshot::Sender<Result<Option<BonusInfo>, ServiceError>>,
    },
    Claim {
        user_id: String,
        response: oneshot::Sender<Result<ClaimSummary, ServiceError>>,
    },
}

#[derive(Debug, Serialize)]
pub struct ClaimSummary {
    pub days_claimed: i32,
    pub balance: i64,
}

#[derive(Clone)]
pub struct BonusRequestHandler {
    repository: BonusRepository,
    events: UiEvents,
}

impl BonusRequestHandler {
    pub fn new(sql_conn: PgPool, events: UiEvents) -> Self {
        let repository = BonusRepository::new(sql_conn);

        BonusRequestHandler { repository, events }
    }

    async fn get_bonus_info(&self, user_id: &str) -> Result<Option<BonusInfo>, ServiceError> {
        let claim = self
            .repository
            .get_claim(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        Ok(claim.map(|claim| BonusInfo::from_claim(&claim, Utc::now().naive_utc())))
    }

    async fn claim(&self, user_id: &str) -> Result<ClaimSummary, ServiceError> {
        let outcome = self
            .repository
            .claim(user_id)
            .await
            .map_err(|e| ServiceError::Repository("BonusService".to_string(), e.to_string()))?;

        match outcome {
            ClaimOutcome::Claimed {
                days_claimed,
                balance,
            } => {
                self.events.emit(UiEvent::WalletUpdated {
                    user_id: user_id.to_string(),
                    balance,
                });
                self.events.emit(UiEvent::PlanUpdated {
                    user_id: user_id.to_string(),
                });

                Ok(ClaimSummary {
                    days_claimed,
                    balance,
                })
            }
            ClaimOutcome::TooEarly { next_claim_at } => {
                let hours_left = (next_claim_at - Utc::now().naive_utc()).num_hours().max(0) + 1;
                Err(ServiceError::Rejected(format!(
                    "Next bonus available in {}h",
                    hours_left
                )))
            }
            ClaimOutcome::Exhausted => Err(ServiceError::Rejected(
                "All daily bonuses have been claimed".to_string(),
            )),
        }
    }
}

#[async_trait]
impl RequestHandler<BonusRequest> for BonusRequestHandler {
    async fn handle_request(&self, request: BonusRequest) {
        match request {
            BonusRequest::GetBonusInfo { user_id, response } => {
                let info = self.get_bonus_info(&user_id).await;
                let _ = response.send(info);
            }
            BonusRequest::Claim { user_id, response } => {
                let summary = self.claim(&user_id).await;
                let _ = response.send(summary);
            }
        }
    }
}

pub struct BonusService;

impl BonusService {
    pub fn new() -> Self {
        BonusService {}
    }
}

#[async_trait]
impl Service<BonusRequest, BonusRequestHandler> for BonusService {}
