use serde::{Deserialize, Serialize};

pub const TYPE_TOPUP: &str = "topup";
pub const TYPE_BONUS: &str = "bonus";
pub const TYPE_USAGE: &str = "usage";
pub const TYPE_DATA_PURCHASE: &str = "data_purchase";

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: i64,
    pub description: String,
    pub reference: Option<String>,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
}
