use serde::Serialize;

/// UI-facing notification events. Purely advisory: best-effort broadcast with
/// no acknowledgment or retry.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum UiEvent {
    PlanUpdated {
        user_id: String,
    },
    WalletUpdated {
        user_id: String,
        balance: i64,
    },
    DataConsumed {
        user_id: String,
        consumed_mb: i64,
        remaining_mb: i64,
    },
    BonusConsumed {
        user_id: String,
        consumed_mb: i64,
        remaining_mb: i64,
    },
    WalletConsumed {
        user_id: String,
        amount: i64,
        balance: i64,
    },
    VpnDataUsage {
        user_id: String,
        data_mb: f64,
    },
    LowWalletBalance {
        user_id: String,
        balance: i64,
    },
    PlanExhausted {
        user_id: String,
    },
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::PlanUpdated { .. } => "plan-updated",
            UiEvent::WalletUpdated { .. } => "wallet-updated",
            UiEvent::DataConsumed { .. } => "data-consumed",
            UiEvent::BonusConsumed { .. } => "bonus-consumed",
            UiEvent::WalletConsumed { .. } => "wallet-consumed",
            UiEvent::VpnDataUsage { .. } => "vpn-data-usage",
            UiEvent::LowWalletBalance { .. } => "low-wallet-balance",
            UiEvent::PlanExhausted { .. } => "plan-exhausted",
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            UiEvent::PlanUpdated { user_id }
            | UiEvent::WalletUpdated { user_id, .. }
            | UiEvent::DataConsumed { user_id, .. }
            | UiEvent::BonusConsumed { user_id, .. }
            | UiEvent::WalletConsumed { user_id, .. }
            | UiEvent::VpnDataUsage { user_id, .. }
            | UiEvent::LowWalletBalance { user_id, .. }
            | UiEvent::PlanExhausted { user_id } => user_id,
        }
    }
}
