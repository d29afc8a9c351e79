use serde::{Deserialize, Serialize};

/// Hosted checkout session returned by `transaction/initialize`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Checkout {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookCharge,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookCharge {
    pub amount: i64,
    pub reference: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: Option<WebhookMetadata>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookMetadata {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "type", default)]
    pub tx_type: Option<String>,
}
