use crate::models::paystack::{Checkout, WebhookCharge};
use crate::repositories::wallet::insert_transaction;

use anyhow::bail;
use sqlx::PgPool;

mod paystack;

pub use paystack::verify_signature;

pub struct PaymentRepository {
    paystack_api: paystack::PaystackApi,
    conn: PgPool,
}

/// How a `charge.success` event was handled.
#[derive(Debug)]
pub enum WebhookOutcome {
    Credited { user_id: String, balance: i64 },
    AlreadyProcessed,
    Skipped,
}

impl PaymentRepository {
    pub fn new(secret_key: String, url: String, conn: PgPool) -> Self {
        let paystack_api = paystack::PaystackApi::new(secret_key, url);

        PaymentRepository { paystack_api, conn }
    }

    pub async fn initialize_topup(
        &self,
        user_id: &str,
        email: &str,
        amount: i64,
    ) -> Result<Checkout, anyhow::Error> {
        if amount <= 0 {
            bail!("Top-up amount must be positive")
        }

        self.paystack_api.initialize(email, amount, user_id).await
    }

    /// Credits the wallet for a successful charge. The gateway retries webhook
    /// delivery, so processing is keyed by the charge reference: a reference
    /// that already has a transaction row is acknowledged without a second
    /// credit.
    pub async fn process_charge_success(
        &self,
        charge: &WebhookCharge,
    ) -> Result<WebhookOutcome, anyhow::Error> {
        let user_id = match charge.metadata.as_ref().and_then(|m| m.user_id.clone()) {
            Some(user_id) => user_id,
            None => {
                log::info!(
                    "Webhook charge {} carries no user id, skipping",
                    charge.reference
                );
                return Ok(WebhookOutcome::Skipped);
            }
        };

        log::info!(
            "Processing charge {} ({} kobo, status {:?})",
            charge.reference,
            charge.amount,
            charge.status
        );

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM transactions WHERE reference = $1")
                .bind(&charge.reference)
                .fetch_optional(&self.conn)
                .await?;
        if existing.is_some() {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let mut tx = self.conn.begin().await?;

        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM wallet WHERE user_id = $1 FOR UPDATE")
                .bind(&user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let balance = match balance {
            Some(balance) => balance,
            None => bail!("Wallet not found for user {}", user_id),
        };

        let new_balance = balance + charge.amount;
        sqlx::query(
            "UPDATE wallet SET balance = $1, updated_at = CURRENT_TIMESTAMP WHERE user_id = $2",
        )
        .bind(new_balance)
        .bind(&user_id)
        .execute(&mut *tx)
        .await?;

        insert_transaction(
            &mut tx,
            &user_id,
            charge
                .metadata
                .as_ref()
                .and_then(|m| m.tx_type.as_deref())
                .unwrap_or(crate::models::transactions::TYPE_TOPUP),
            charge.amount,
            &format!("Paystack payment - {}", charge.reference),
            Some(&charge.reference),
        )
        .await?;

        tx.commit().await?;

        Ok(WebhookOutcome::Credited {
            user_id,
            balance: new_balance,
        })
    }
}
