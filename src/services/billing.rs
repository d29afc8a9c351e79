use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::PgPool;

use super::events::UiEvents;
use super::{RequestHandler, Service};
use crate::models::events::UiEvent;
use crate::models::plans::PlanType;
use crate::models::transactions;
use crate::models::wallet::DebitOutcome;
use crate::repositories::plans::PlanRepository;
use crate::repositories::transactions::TransactionRepository;
use crate::repositories::wallet::WalletRepository;

pub const PAYG_RATE_KOBO_PER_MB: i64 = 20;
pub const USAGE_DEBOUNCE: Duration = Duration::from_secs(5);

pub enum BillingRequest {
    /// A usage tick from the VPN simulator. Fire-and-forget: consumption
    /// results surface as UI events, not as a reply.
    UsageTick {
        event_id: String,
        user_id: String,
        data_mb: f64,
    },
}

pub fn usage_cost_kobo(data_mb: f64) -> i64 {
    (data_mb * PAYG_RATE_KOBO_PER_MB as f64).round() as i64
}

/// Per-process duplicate-delivery guard: ticks for the same user within the
/// window are dropped.
pub struct UsageDebouncer {
    window: Duration,
    last_seen: DashMap<String, Instant>,
}

impl UsageDebouncer {
    pub fn new(window: Duration) -> Self {
        UsageDebouncer {
            window,
            last_seen: DashMap::new(),
        }
    }

    pub fn should_process(&self, user_id: &str) -> bool {
        let now = Instant::now();

        match self.last_seen.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < self.window {
                    return false;
                }
                entry.insert(now);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }
}

#[derive(Clone)]
pub struct BillingRequestHandler {
    plan_repository: PlanRepository,
    wallet_repository: WalletRepository,
    transaction_repository: TransactionRepository,
    debouncer: Arc<UsageDebouncer>,
    events: UiEvents,
}

impl BillingRequestHandler {
    pub fn new(sql_conn: PgPool, events: UiEvents) -> Self {
        let plan_repository = PlanRepository::new(sql_conn.clone());
        let wallet_repository = WalletRepository::new(sql_conn.clone());
        let transaction_repository = TransactionRepository::new(sql_conn);

        BillingRequestHandler {
            plan_repository,
            wallet_repository,
            transaction_repository,
            debouncer: Arc::new(UsageDebouncer::new(USAGE_DEBOUNCE)),
            events,
        }
    }

    /// Routes a usage tick to whichever balance absorbs it: the wallet for
    /// PAYG, the data allocation otherwise. The only real business rule in the
    /// system lives here.
    async fn handle_usage_tick(
        &self,
        event_id: &str,
        user_id: &str,
        data_mb: f64,
    ) -> Result<(), anyhow::Error> {
        if !self.debouncer.should_process(user_id) {
            log::debug!("Usage tick {} debounced for user {}", event_id, user_id);
            return Ok(());
        }

        // Charges are keyed by event id, so a redelivered tick that survived
        // the debounce window is still charged at most once.
        if self
            .transaction_repository
            .get_by_reference(event_id)
            .await?
            .is_some()
        {
            log::debug!("Usage tick {} already charged, skipping", event_id);
            return Ok(());
        }

        let plan = match self.plan_repository.get_active_plan(user_id).await? {
            Some(plan) => plan,
            None => {
                log::info!("Usage tick for user {} dropped: no active plan", user_id);
                return Ok(());
            }
        };

        match plan.plan_type() {
            Some(PlanType::Payg) => self.charge_wallet(event_id, user_id, data_mb).await,
            Some(plan_type) => {
                self.consume_allocation(user_id, &plan.id, plan_type, data_mb)
                    .await
            }
            None => {
                log::warn!(
                    "Usage tick for user {} dropped: unknown plan type {}",
                    user_id,
                    plan.plan_type
                );
                Ok(())
            }
        }
    }

    async fn charge_wallet(
        &self,
        event_id: &str,
        user_id: &str,
        data_mb: f64,
    ) -> Result<(), anyhow::Error> {
        let cost = usage_cost_kobo(data_mb);
        if cost == 0 {
            return Ok(());
        }

        let outcome = self
            .wallet_repository
            .debit_with_transaction(
                user_id,
                cost,
                transactions::TYPE_USAGE,
                &format!("Data usage: {:.2}MB", data_mb),
                Some(event_id),
            )
            .await?;

        match outcome {
            DebitOutcome::Debited { balance } => {
                log::info!(
                    "Charged {} kobo for {:.2}MB usage, user {}",
                    cost,
                    data_mb,
                    user_id
                );
                self.events.emit(UiEvent::WalletConsumed {
                    user_id: user_id.to_string(),
                    amount: cost,
                    balance,
                });
            }
            DebitOutcome::Insufficient { balance } => {
                log::warn!("Insufficient balance for usage charge, user {}", user_id);
                self.events.emit(UiEvent::LowWalletBalance {
                    user_id: user_id.to_string(),
                    balance,
                });
            }
        }

        Ok(())
    }

    async fn consume_allocation(
        &self,
        user_id: &str,
        plan_id: &str,
        plan_type: PlanType,
        data_mb: f64,
    ) -> Result<(), anyhow::Error> {
        let delta_mb = data_mb.round() as i64;
        if delta_mb <= 0 {
            return Ok(());
        }

        let applied = self.plan_repository.record_usage(plan_id, delta_mb).await?;

        let event = match plan_type {
            PlanType::WelcomeBonus => UiEvent::BonusConsumed {
                user_id: user_id.to_string(),
                consumed_mb: applied.consumed,
                remaining_mb: applied.remaining,
            },
            _ => UiEvent::DataConsumed {
                user_id: user_id.to_string(),
                consumed_mb: applied.consumed,
                remaining_mb: applied.remaining,
            },
        };
        self.events.emit(event);

        if applied.exhausted {
            self.events.emit(UiEvent::PlanExhausted {
                user_id: user_id.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl RequestHandler<BillingRequest> for BillingRequestHandler {
    async fn handle_request(&self, request: BillingRequest) {
        match request {
            BillingRequest::UsageTick {
                event_id,
                user_id,
                data_mb,
            } => {
                if let Err(e) = self.handle_usage_tick(&event_id, &user_id, data_mb).await {
                    log::error!("Error processing usage tick {}: {}", event_id, e);
                }
            }
        }
    }
}

pub struct BillingService;

impl BillingService {
    pub fn new() -> Self {
        BillingService {}
    }
}

#[async_trait]
impl Service<BillingRequest, BillingRequestHandler> for BillingService {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_is_rate_times_megabytes_rounded() {
        assert_eq!(usage_cost_kobo(50.0), 1000);
        assert_eq!(usage_cost_kobo(2.49), 50);
        assert_eq!(usage_cost_kobo(0.0), 0);
    }

    #[test]
    fn payg_tick_debits_the_rounded_cost() {
        let cost = usage_cost_kobo(50.0);
        match crate::models::wallet::apply_debit(10_000, cost) {
            DebitOutcome::Debited { balance } => assert_eq!(balance, 9_000),
            other => panic!("expected a debit, got {:?}", other),
        }
    }

    #[test]
    fn payg_tick_never_overdraws_the_wallet() {
        let cost = usage_cost_kobo(50.0);
        match crate::models::wallet::apply_debit(999, cost) {
            DebitOutcome::Insufficient { balance } => assert_eq!(balance, 999),
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    #[test]
    fn debouncer_admits_first_tick() {
        let debouncer = UsageDebouncer::new(USAGE_DEBOUNCE);
        assert!(debouncer.should_process("user-1"));
    }

    #[test]
    fn debouncer_drops_immediate_duplicate() {
        let debouncer = UsageDebouncer::new(USAGE_DEBOUNCE);
        assert!(debouncer.should_process("user-1"));
        assert!(!debouncer.should_process("user-1"));
    }

    #[test]
    fn debouncer_tracks_users_independently() {
        let debouncer = UsageDebouncer::new(USAGE_DEBOUNCE);
        assert!(debouncer.should_process("user-1"));
        assert!(debouncer.should_process("user-2"));
    }

    #[test]
    fn zero_window_debouncer_admits_everything() {
        let debouncer = UsageDebouncer::new(Duration::from_secs(0));
        assert!(debouncer.should_process("user-1"));
        assert!(debouncer.should_process("user-1"));
    }
}
