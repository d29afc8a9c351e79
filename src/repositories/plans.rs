use crate::models::plans::{
    self, PlanType, PurchaseOutcome, UsageApplied, UserPlan, DATA_PLAN_VALIDITY_DAYS,
};
use crate::models::transactions;
use crate::models::wallet::{apply_debit, DebitOutcome};
use crate::repositories::wallet::insert_transaction;

use anyhow::bail;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PlanRepository {
    conn: PgPool,
}

impl PlanRepository {
    pub fn new(conn: PgPool) -> Self {
        PlanRepository { conn }
    }

    /// Returns the single active plan, most recently updated first. Expiry is
    /// applied opportunistically here: a row past its expires_at is flipped to
    /// 'expired' and treated as absent.
    pub async fn get_active_plan(&self, user_id: &str) -> Result<Option<UserPlan>, anyhow::Error> {
        let plan = sqlx::query_as::<_, UserPlan>(
            r#"
            SELECT * FROM user_plans
            WHERE user_id = $1 AND status = 'active'
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.conn)
        .await?;

        let plan = match plan {
            Some(plan) => plan,
            None => return Ok(None),
        };

        if plan.is_expired_at(Utc::now().naive_utc()) {
            sqlx::query(
                "UPDATE user_plans SET status = 'expired', updated_at = CURRENT_TIMESTAMP WHERE id = $1",
            )
            .bind(&plan.id)
            .execute(&self.conn)
            .await?;

            return Ok(None);
        }

        Ok(Some(plan))
    }

    /// Switches the user to `new_type`. A no-op when the active plan already
    /// has that type. The deactivate, history append, and insert all happen in
    /// one database transaction so a crash cannot leave zero or two active
    /// rows.
    pub async fn switch_plan(
        &self,
        user_id: &str,
        new_type: PlanType,
        data_mb: Option<i64>,
    ) -> Result<UserPlan, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let current = fetch_active_for_update(&mut tx, user_id).await?;
        if let Some(ref current) = current {
            if plans::switch_is_noop(Some(current), new_type) {
                return Ok(current.clone());
            }
        }

        // Switching back to a data plan without an explicit amount restores
        // the unused remainder of the most recent deactivated data plan.
        let data_mb = match (new_type, data_mb) {
            (PlanType::Data, None) => Some(preserved_data_remainder(&mut tx, user_id).await?),
            (_, data_mb) => data_mb,
        };

        let from_plan = current
            .as_ref()
            .map(|p| p.plan_type.clone())
            .unwrap_or_else(|| "none".to_string());

        deactivate_active(&mut tx, user_id).await?;
        insert_history(
            &mut tx,
            user_id,
            &from_plan,
            new_type.as_str(),
            &format!("Switched from {} to {}", from_plan, new_type.as_str()),
        )
        .await?;

        let plan = insert_plan(&mut tx, user_id, new_type, data_mb).await?;

        tx.commit().await?;

        Ok(plan)
    }

    /// Purchases a data bundle from the wallet. All four writes (plan, wallet
    /// debit, transaction log, history) share one database transaction; an
    /// insufficient balance commits nothing.
    pub async fn purchase_data_plan(
        &self,
        user_id: &str,
        data_mb: i64,
        cost: i64,
    ) -> Result<PurchaseOutcome, anyhow::Error> {
        if data_mb <= 0 {
            bail!("Purchase amount must be positive")
        }
        if cost < 0 {
            bail!("Purchase cost must not be negative")
        }

        let mut tx = self.conn.begin().await?;

        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM wallet WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let balance = match balance {
            Some(balance) => balance,
            None => bail!("Wallet not found for user {}", user_id),
        };

        let new_balance = match apply_debit(balance, cost) {
            DebitOutcome::Debited { balance } => balance,
            DebitOutcome::Insufficient { balance } => {
                return Ok(PurchaseOutcome::Insufficient { balance })
            }
        };

        let current = fetch_active_for_update(&mut tx, user_id).await?;
        let expires_at = Utc::now().naive_utc() + Duration::days(DATA_PLAN_VALIDITY_DAYS);

        let (plan, from_plan) = match current {
            // Already on a data plan: top up the allocation in place so the
            // unused balance is preserved.
            Some(plan) if plan.plan_type() == Some(PlanType::Data) => {
                let updated = sqlx::query_as::<_, UserPlan>(
                    r#"
                    UPDATE user_plans
                    SET data_allocated = data_allocated + $1,
                        expires_at = $2,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = $3
                    RETURNING *
                    "#,
                )
                .bind(data_mb)
                .bind(expires_at)
                .bind(&plan.id)
                .fetch_one(&mut *tx)
                .await?;

                (updated, plan.plan_type.clone())
            }
            current => {
                let from_plan = current
                    .as_ref()
                    .map(|p| p.plan_type.clone())
                    .unwrap_or_else(|| "none".to_string());

                deactivate_active(&mut tx, user_id).await?;
                let plan = insert_plan(&mut tx, user_id, PlanType::Data, Some(data_mb)).await?;

                (plan, from_plan)
            }
        };

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
            transactions::TYPE_DATA_PURCHASE,
            -cost,
            &format!("Purchased {}MB data plan", data_mb),
            None,
        )
        .await?;

        insert_history(
            &mut tx,
            user_id,
            &from_plan,
            PlanType::Data.as_str(),
            &format!(
                "Purchased {}MB data plan for {} kobo",
                data_mb, cost
            ),
        )
        .await?;

        tx.commit().await?;

        Ok(PurchaseOutcome::Purchased {
            plan,
            balance: new_balance,
        })
    }

    /// Applies a metered usage amount to an allocation plan, capped at the
    /// allocation.
    pub async fn record_usage(
        &self,
        plan_id: &str,
        delta_mb: i64,
    ) -> Result<UsageApplied, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT data_used, data_allocated FROM user_plans WHERE id = $1 FOR UPDATE",
        )
        .bind(plan_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (used, allocated) = match row {
            Some(row) => row,
            None => bail!("Plan not found: {}", plan_id),
        };

        let (new_used, applied) = plans::apply_usage(used, allocated, delta_mb);

        sqlx::query(
            "UPDATE user_plans SET data_used = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(new_used)
        .bind(plan_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(applied)
    }

    pub async fn get_plan_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<plans::PlanHistoryEntry>, anyhow::Error> {
        let history = sqlx::query_as::<_, plans::PlanHistoryEntry>(
            "SELECT * FROM plan_history WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(history)
    }
}

/// Locked active-plan read for the switch/purchase paths. Expiry is applied
/// here too, so an expired-but-unflipped row never passes for an active plan.
async fn fetch_active_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
) -> Result<Option<UserPlan>, anyhow::Error> {
    let plan = sqlx::query_as::<_, UserPlan>(
        r#"
        SELECT * FROM user_plans
        WHERE user_id = $1 AND status = 'active'
        ORDER BY updated_at DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    let plan = match plan {
        Some(plan) => plan,
        None => return Ok(None),
    };

    if plan.is_expired_at(Utc::now().naive_utc()) {
        sqlx::query(
            "UPDATE user_plans SET status = 'expired', updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(&plan.id)
        .execute(&mut **tx)
        .await?;

        return Ok(None);
    }

    Ok(Some(plan))
}

async fn preserved_data_remainder(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
) -> Result<i64, anyhow::Error> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT data_allocated, data_used FROM user_plans
        WHERE user_id = $1 AND plan_type = 'data' AND status = 'inactive'
        ORDER BY updated_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row
        .map(|(allocated, used)| (allocated - used).max(0))
        .unwrap_or(0))
}

async fn deactivate_active(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        UPDATE user_plans
        SET status = 'inactive', updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $1 AND status = 'active'
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub(crate) async fn insert_plan(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
    plan_type: PlanType,
    data_mb: Option<i64>,
) -> Result<UserPlan, anyhow::Error> {
    let plan_id = Uuid::new_v4().hyphenated().to_string();
    let (allocated, validity_days) = plans::plan_defaults(plan_type, data_mb);
    let expires_at =
        validity_days.map(|days| Utc::now().naive_utc() + Duration::days(days));

    let plan = sqlx::query_as::<_, UserPlan>(
        r#"
        INSERT INTO user_plans (id, user_id, plan_type, status, data_allocated, data_used, expires_at)
        VALUES ($1, $2, $3, 'active', $4, 0, $5)
        RETURNING *
        "#,
    )
    .bind(plan_id)
    .bind(user_id)
    .bind(plan_type.as_str())
    .bind(allocated)
    .bind(expires_at)
    .fetch_one(&mut **tx)
    .await?;

    Ok(plan)
}

async fn insert_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
    from_plan: &str,
    to_plan: &str,
    notes: &str,
) -> Result<(), anyhow::Error> {
    let entry_id = Uuid::new_v4().hyphenated().to_string();

    sqlx::query(
        r#"
        INSERT INTO plan_history (id, user_id, from_plan, to_plan, notes)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(entry_id)
    .bind(user_id)
    .bind(from_plan)
    .bind(to_plan)
    .bind(notes)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
