use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::{mpsc, oneshot};

use super::events::UiEvents;
use super::referrals::ReferralRequest;
use super::{RequestHandler, Service, ServiceError};
use crate::models::events::UiEvent;
use crate::models::plans::{PlanHistoryEntry, PlanType, PurchaseOutcome, UserPlan};
use crate::repositories::plans::PlanRepository;

pub enum PlanRequest {
    GetCurrentPlan {
        user_id: String,
        response: oneshot::Sender<Result<Option<UserPlan>, ServiceError>>,
    },
    SwitchPlan {
        user_id: String,
        plan_type: String,
        data_mb: Option<i64>,
        response: oneshot::Sender<Result<UserPlan, ServiceError>>,
    },
    PurchaseData {
        user_id: String,
        data_mb: i64,
        cost: i64,
        response: oneshot::Sender<Result<UserPlan, ServiceError>>,
    },
    GetPlanHistory {
        user_id: String,
        response: oneshot::Sender<Result<Vec<PlanHistoryEntry>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct PlanRequestHandler {
    repository: PlanRepository,
    referral_channel: mpsc::Sender<ReferralRequest>,
    events: UiEvents,
}

impl PlanRequestHandler {
    pub fn new(
        sql_conn: PgPool,
        referral_channel: mpsc::Sender<ReferralRequest>,
        events: UiEvents,
    ) -> Self {
        let repository = PlanRepository::new(sql_conn);

        PlanRequestHandler {
            repository,
            referral_channel,
            events,
        }
    }

    async fn get_current_plan(&self, user_id: &str) -> Result<Option<UserPlan>, ServiceError> {
        self.repository
            .get_active_plan(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn switch_plan(
        &self,
        user_id: &str,
        plan_type: &str,
        data_mb: Option<i64>,
    ) -> Result<UserPlan, ServiceError> {
        let plan_type = PlanType::parse(plan_type)
            .ok_or_else(|| ServiceError::Rejected(format!("Unknown plan type: {}", plan_type)))?;

        let plan = self
            .repository
            .switch_plan(user_id, plan_type, data_mb)
            .await
            .map_err(|e| ServiceError::Repository("PlanService".to_string(), e.to_string()))?;

        self.events.emit(UiEvent::PlanUpdated {
            user_id: user_id.to_string(),
        });

        Ok(plan)
    }

    async fn purchase_data(
        &self,
        user_id: &str,
        data_mb: i64,
        cost: i64,
    ) -> Result<UserPlan, ServiceError> {
        let outcome = self
            .repository
            .purchase_data_plan(user_id, data_mb, cost)
            .await
            .map_err(|e| ServiceError::Repository("PlanService".to_string(), e.to_string()))?;

        let (plan, balance) = match outcome {
            PurchaseOutcome::Purchased { plan, balance } => (plan, balance),
            PurchaseOutcome::Insufficient { balance } => {
                log::warn!(
                    "Purchase rejected for user {}: balance {} below cost {}",
                    user_id,
                    balance,
                    cost
                );
                return Err(ServiceError::Rejected(
                    "Insufficient wallet balance. Please top up your wallet.".to_string(),
                ));
            }
        };

        // Commission posting is fire-and-forget; the purchase has already
        // committed.
        let referral_channel = self.referral_channel.clone();
        let buyer_id = user_id.to_string();
        tokio::spawn(async move {
            let _ = referral_channel
                .send(ReferralRequest::PurchaseCommission {
                    buyer_id,
                    amount: cost,
                })
                .await;
        });

        self.events.emit(UiEvent::PlanUpdated {
            user_id: user_id.to_string(),
        });
        self.events.emit(UiEvent::WalletUpdated {
            user_id: user_id.to_string(),
            balance,
        });

        Ok(plan)
    }

    async fn get_plan_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<PlanHistoryEntry>, ServiceError> {
        self.repository
            .get_plan_history(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<PlanRequest> for PlanRequestHandler {
    async fn handle_request(&self, request: PlanRequest) {
        match request {
            PlanRequest::GetCurrentPlan { user_id, response } => {
                let plan = self.get_current_plan(&user_id).await;
                let _ = response.send(plan);
            }
            PlanRequest::SwitchPlan {
                user_id,
                plan_type,
                data_mb,
                response,
            } => {
                let plan = self.switch_plan(&user_id, &plan_type, data_mb).await;
                let _ = response.send(plan);
            }
            PlanRequest::PurchaseData {
                user_id,
                data_mb,
                cost,
                response,
            } => {
                let plan = self.purchase_data(&user_id, data_mb, cost).await;
                let _ = response.send(plan);
            }
            PlanRequest::GetPlanHistory { user_id, response } => {
                let history = self.get_plan_history(&user_id).await;
                let _ = response.send(history);
            }
        }
    }
}

pub struct PlanService;

impl PlanService {
    pub fn new() -> Self {
        PlanService {}
    }
}

#[async_trait]
impl Service<PlanRequest, PlanRequestHandler> for PlanService {}
