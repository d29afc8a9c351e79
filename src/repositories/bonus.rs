use crate::models::bonus::{ClaimOutcome, DailyBonusClaim, DAILY_BONUS_KOBO, MAX_BONUS_DAYS};
use crate::models::transactions;
use crate::repositories::wallet::insert_transaction;

use anyhow::bail;
use chrono::{Duration, Utc};
use sqlx::PgPool;

#[derive(Clone)]
pub struct BonusRepository {
    conn: PgPool,
}

impl BonusRepository {
    pub fn new(conn: PgPool) -> Self {
        BonusRepository { conn }
    }

    pub async fn get_claim(&self, user_id: &str) -> Result<Option<DailyBonusClaim>, anyhow::Error> {
        let claim = sqlx::query_as::<_, DailyBonusClaim>(
            "SELECT * FROM daily_bonus_claims WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(claim)
    }

    /// Claims the daily bonus. The claim row is locked for the duration of the
    /// transaction, so two devices claiming at once cannot both pass the time
    /// gate.
    pub async fn claim(&self, user_id: &str) -> Result<ClaimOutcome, anyhow::Error> {
        let now = Utc::now().naive_utc();
        let mut tx = self.conn.begin().await?;

        let claim = sqlx::query_as::<_, DailyBonusClaim>(
            "SELECT * FROM daily_bonus_claims WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let claim = match claim {
            Some(claim) => claim,
            None => bail!("Bonus claim record not found for user {}", user_id),
        };

        if !claim.is_eligible || claim.days_claimed >= MAX_BONUS_DAYS {
            return Ok(ClaimOutcome::Exhausted);
        }
        if now < claim.next_claim_at {
            return Ok(ClaimOutcome::TooEarly {
                next_claim_at: claim.next_claim_at,
            });
        }

        let days_claimed = claim.days_claimed + 1;
        let is_eligible = days_claimed < MAX_BONUS_DAYS;
        let next_claim_at = now + Duration::hours(24);

        sqlx::query(
            r#"
            UPDATE daily_bonus_claims
            SET days_claimed = $1, next_claim_at = $2, is_eligible = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $4
            "#,
        )
        .bind(days_claimed)
        .bind(next_claim_at)
        .bind(is_eligible)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM wallet WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let balance = match balance {
            Some(balance) => balance,
            None => bail!("Wallet not found for user {}", user_id),
        };

        let new_balance = balance + DAILY_BONUS_KOBO;
        sqlx::query(
            "UPDATE wallet SET balance = $1, updated_at = CURRENT_TIMESTAMP WHERE user_id = $2",
        )
        .bind(new_balance)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        insert_transaction(
            &mut tx,
            user_id,
            transactions::TYPE_BONUS,
            DAILY_BONUS_KOBO,
            "Daily bonus claimed",
            None,
        )
        .await?;

        tx.commit().await?;

        Ok(ClaimOutcome::Claimed {
            days_claimed,
            balance: new_balance,
        })
    }
}
