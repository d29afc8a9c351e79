use crate::models::wallet::{apply_debit, DebitOutcome, Wallet};

use anyhow::bail;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct WalletRepository {
    conn: PgPool,
}

impl WalletRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn get_wallet(&self, user_id: &str) -> Result<Option<Wallet>, anyhow::Error> {
        let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallet WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(wallet)
    }

    /// Credits the wallet and appends the transaction row in one database
    /// transaction. Returns the new balance.
    pub async fn credit_with_transaction(
        &self,
        user_id: &str,
        amount: i64,
        tx_type: &str,
        description: &str,
        reference: Option<&str>,
    ) -> Result<i64, anyhow::Error> {
        if amount < 0 {
            bail!("Credit amount must not be negative")
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

        let new_balance = balance + amount;
        sqlx::query(
            "UPDATE wallet SET balance = $1, updated_at = CURRENT_TIMESTAMP WHERE user_id = $2",
        )
        .bind(new_balance)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        insert_transaction(&mut tx, user_id, tx_type, amount, description, reference).await?;

        tx.commit().await?;

        Ok(new_balance)
    }

    /// Balance-checked debit paired with its transaction row. An insufficient
    /// balance commits nothing and never produces a partial charge.
    pub async fn debit_with_transaction(
        &self,
        user_id: &str,
        amount: i64,
        tx_type: &str,
        description: &str,
        reference: Option<&str>,
    ) -> Result<DebitOutcome, anyhow::Error> {
        if amount < 0 {
            bail!("Debit amount must not be negative")
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

        let new_balance = match apply_debit(balance, amount) {
            DebitOutcome::Debited { balance } => balance,
            insufficient => return Ok(insufficient),
        };
        sqlx::query(
            "UPDATE wallet SET balance = $1, updated_at = CURRENT_TIMESTAMP WHERE user_id = $2",
        )
        .bind(new_balance)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        insert_transaction(&mut tx, user_id, tx_type, -amount, description, reference).await?;

        tx.commit().await?;

        Ok(DebitOutcome::Debited {
            balance: new_balance,
        })
    }
}

pub(crate) async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
    tx_type: &str,
    amount: i64,
    description: &str,
    reference: Option<&str>,
) -> Result<(), anyhow::Error> {
    let transaction_id = Uuid::new_v4().hyphenated().to_string();

    sqlx::query(
        r#"
        INSERT INTO transactions (id, user_id, type, amount, description, reference, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'completed')
        "#,
    )
    .bind(transaction_id)
    .bind(user_id)
    .bind(tx_type)
    .bind(amount)
    .bind(description)
    .bind(reference)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
