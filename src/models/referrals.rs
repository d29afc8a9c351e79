use serde::{Deserialize, Serialize};

pub const BASE_COMMISSION_BPS: i64 = 200;
pub const TIERED_COMMISSION_BPS: i64 = 300;
pub const TIER_REFERRAL_COUNT: i64 = 50;

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Referral {
    pub id: String,
    pub referrer_id: String,
    pub referred_id: String,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct ReferralEarning {
    pub id: String,
    pub referrer_id: String,
    pub referred_id: String,
    pub purchase_amount: i64,
    pub commission_amount: i64,
    pub created_at: chrono::NaiveDateTime,
}

pub fn commission_rate_bps(completed_referrals: i64) -> i64 {
    if completed_referrals >= TIER_REFERRAL_COUNT {
        TIERED_COMMISSION_BPS
    } else {
        BASE_COMMISSION_BPS
    }
}

/// floor(amount * rate) via integer basis-point arithmetic.
pub fn commission_amount(purchase_amount: i64, completed_referrals: i64) -> i64 {
    (purchase_amount * commission_rate_bps(completed_referrals)) / 10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_commission_is_two_percent() {
        assert_eq!(commission_amount(20_000, 0), 400);
    }

    #[test]
    fn commission_floors_fractional_kobo() {
        assert_eq!(commission_amount(99, 0), 1);
        assert_eq!(commission_amount(49, 0), 0);
    }

    #[test]
    fn tier_upgrades_at_fifty_referrals() {
        assert_eq!(commission_rate_bps(49), BASE_COMMISSION_BPS);
        assert_eq!(commission_rate_bps(50), TIERED_COMMISSION_BPS);
        assert_eq!(commission_amount(20_000, 50), 600);
    }
}
