use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewProfile {
    pub email: String,
    pub referral_code: Option<String>,
}
