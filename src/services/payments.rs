use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::events::UiEvents;
use super::{RequestHandler, Service, ServiceError};
use crate::models::events::UiEvent;
use crate::models::paystack::{Checkout, WebhookEvent};
use crate::repositories::payments::{verify_signature, PaymentRepository, WebhookOutcome};

pub enum PaymentRequest {
    InitializeTopup {
        user_id: String,
        email: String,
        amount: i64,
        response: oneshot::Sender<Result<Checkout, ServiceError>>,
    },
    Webhook {
        signature: Option<String>,
        body: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
}

#[derive(Clone)]
pub struct PaymentRequestHandler {
    repository: Arc<PaymentRepository>,
    secret_key: String,
    events: UiEvents,
}

impl PaymentRequestHandler {
    pub fn new(secret_key: String, url: String, pool: PgPool, events: UiEvents) -> Self {
        let repository = Arc::new(PaymentRepository::new(secret_key.clone(), url, pool));

        PaymentRequestHandler {
            repository,
            secret_key,
            events,
        }
    }

    async fn initialize_topup(
        &self,
        user_id: &str,
        email: &str,
        amount: i64,
    ) -> Result<Checkout, ServiceError> {
        self.repository
            .initialize_topup(user_id, email, amount)
            .await
            .map_err(|e| ServiceError::Repository("Paystack".to_string(), e.to_string()))
    }

    async fn process_webhook(
        &self,
        signature: Option<&str>,
        body: &str,
    ) -> Result<(), ServiceError> {
        let signature = signature
            .ok_or_else(|| ServiceError::Rejected("Missing webhook signature".to_string()))?;
        if !verify_signature(&self.secret_key, body.as_bytes(), signature) {
            return Err(ServiceError::Rejected(
                "Invalid webhook signature".to_string(),
            ));
        }

        let event: WebhookEvent = serde_json::from_str(body)
            .map_err(|e| ServiceError::Internal(format!("Bad webhook payload: {}", e)))?;

        if event.event != "charge.success" {
            log::info!("Ignoring webhook event {}", event.event);
            return Ok(());
        }

        let outcome = self
            .repository
            .process_charge_success(&event.data)
            .await
            .map_err(|e| ServiceError::Repository("Payments".to_string(), e.to_string()))?;

        match outcome {
            WebhookOutcome::Credited { user_id, balance } => {
                log::info!(
                    "Credited wallet for charge {}, user {}",
                    event.data.reference,
                    user_id
                );
                self.events.emit(UiEvent::WalletUpdated { user_id, balance });
            }
            WebhookOutcome::AlreadyProcessed => {
                log::info!("Charge {} already processed", event.data.reference);
            }
            WebhookOutcome::Skipped => {}
        }

        Ok(())
    }
}

#[async_trait]
impl RequestHandler<PaymentRequest> for PaymentRequestHandler {
    async fn handle_request(&self, request: PaymentRequest) {
        match request {
            PaymentRequest::InitializeTopup {
                user_id,
                email,
                amount,
                response,
            } => {
                let checkout = self.initialize_topup(&user_id, &email, amount).await;
                let _ = response.send(checkout);
            }
            PaymentRequest::Webhook {
                signature,
                body,
                response,
            } => {
                let result = self.process_webhook(signature.as_deref(), &body).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct PaymentService;

impl PaymentService {
    pub fn new() -> Self {
        PaymentService {}
    }
}

#[async_trait]
impl Service<PaymentRequest, PaymentRequestHandler> for PaymentService {}
