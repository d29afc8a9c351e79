use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Wallet {
    pub user_id: String,
    pub balance: i64,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// Result of a balance-checked debit. Billing never drives the balance
/// negative; an insufficient balance leaves the wallet untouched.
#[derive(Debug)]
pub enum DebitOutcome {
    Debited { balance: i64 },
    Insufficient { balance: i64 },
}

/// The debit decision. Callers persist a `Debited` result; `Insufficient`
/// carries the unchanged balance.
pub fn apply_debit(balance: i64, amount: i64) -> DebitOutcome {
    if balance < amount {
        return DebitOutcome::Insufficient { balance };
    }

    DebitOutcome::Debited {
        balance: balance - amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_decreases_balance_by_the_exact_amount() {
        match apply_debit(10_000, 1_000) {
            DebitOutcome::Debited { balance } => assert_eq!(balance, 9_000),
            other => panic!("expected a debit, got {:?}", other),
        }
    }

    #[test]
    fn insufficient_balance_is_left_untouched() {
        match apply_debit(500, 1_000) {
            DebitOutcome::Insufficient { balance } => assert_eq!(balance, 500),
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    #[test]
    fn debiting_the_entire_balance_reaches_zero_not_negative() {
        match apply_debit(1_000, 1_000) {
            DebitOutcome::Debited { balance } => assert_eq!(balance, 0),
            other => panic!("expected a debit, got {:?}", other),
        }
    }
}
