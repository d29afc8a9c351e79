use crate::models::transactions::Transaction;

use sqlx::PgPool;

#[derive(Clone)]
pub struct TransactionRepository {
    conn: PgPool,
}

impl TransactionRepository {
    pub fn new(conn: PgPool) -> Self {
        TransactionRepository { conn }
    }

    pub async fn list_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, anyhow::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.conn)
        .await?;

        Ok(transactions)
    }

    /// Idempotency lookup: gateway references and usage event ids land in the
    /// `reference` column.
    pub async fn get_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, anyhow::Error> {
        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE reference = $1")
                .bind(reference)
                .fetch_optional(&self.conn)
                .await?;

        Ok(transaction)
    }
}
