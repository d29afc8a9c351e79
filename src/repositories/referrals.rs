use crate::models::referrals::{self, Referral, ReferralEarning};

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReferralRepository {
    conn: PgPool,
}

/// A commission posting, or the reason none was made.
#[derive(Debug)]
pub enum CommissionOutcome {
    Posted {
        referrer_id: String,
        commission: i64,
        referrer_balance: i64,
    },
    NotReferred,
}

impl ReferralRepository {
    pub fn new(conn: PgPool) -> Self {
        ReferralRepository { conn }
    }

    /// Posts the referral commission for a referred user's purchase: 2% of the
    /// amount, 3% once the referrer has fifty completed referrals. The wallet
    /// credit and the earning row are one database transaction.
    pub async fn post_purchase_commission(
        &self,
        buyer_id: &str,
        purchase_amount: i64,
    ) -> Result<CommissionOutcome, anyhow::Error> {
        let referral = sqlx::query_as::<_, Referral>(
            "SELECT * FROM referrals WHERE referred_id = $1 AND status = 'completed'",
        )
        .bind(buyer_id)
        .fetch_optional(&self.conn)
        .await?;
        let referral = match referral {
            Some(referral) => referral,
            None => return Ok(CommissionOutcome::NotReferred),
        };

        let completed: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM referrals WHERE referrer_id = $1 AND status = 'completed'",
        )
        .bind(&referral.referrer_id)
        .fetch_one(&self.conn)
        .await?;

        let commission = referrals::commission_amount(purchase_amount, completed);

        let mut tx = self.conn.begin().await?;

        let referrer_balance: i64 = sqlx::query_scalar(
            r#"
            UPDATE wallet SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $2
            RETURNING balance
            "#,
        )
        .bind(commission)
        .bind(&referral.referrer_id)
        .fetch_one(&mut *tx)
        .await?;

        let earning_id = Uuid::new_v4().hyphenated().to_string();
        sqlx::query(
            r#"
            INSERT INTO referral_earnings
            (id, referrer_id, referred_id, purchase_amount, commission_amount)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(earning_id)
        .bind(&referral.referrer_id)
        .bind(buyer_id)
        .bind(purchase_amount)
        .bind(commission)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CommissionOutcome::Posted {
            referrer_id: referral.referrer_id,
            commission,
            referrer_balance,
        })
    }

    pub async fn list_earnings(
        &self,
        referrer_id: &str,
    ) -> Result<Vec<ReferralEarning>, anyhow::Error> {
        let earnings = sqlx::query_as::<_, ReferralEarning>(
            "SELECT * FROM referral_earnings WHERE referrer_id = $1 ORDER BY created_at DESC",
        )
        .bind(referrer_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(earnings)
    }
}
