use serde::{Deserialize, Serialize};

pub const WELCOME_BONUS_MB: i64 = 200;
pub const WELCOME_BONUS_VALIDITY_DAYS: i64 = 7;
pub const DATA_PLAN_VALIDITY_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanType {
    WelcomeBonus,
    Data,
    Payg,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::WelcomeBonus => "welcome_bonus",
            PlanType::Data => "data",
            PlanType::Payg => "payg",
        }
    }

    pub fn parse(s: &str) -> Option<PlanType> {
        match s {
            "welcome_bonus" => Some(PlanType::WelcomeBonus),
            "data" => Some(PlanType::Data),
            "payg" => Some(PlanType::Payg),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct UserPlan {
    pub id: String,
    pub user_id: String,
    pub plan_type: String,
    pub status: String,
    pub data_allocated: i64,
    pub data_used: i64,
    pub expires_at: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl UserPlan {
    pub fn plan_type(&self) -> Option<PlanType> {
        PlanType::parse(&self.plan_type)
    }

    pub fn remaining_mb(&self) -> i64 {
        (self.data_allocated - self.data_used).max(0)
    }

    pub fn is_expired_at(&self, now: chrono::NaiveDateTime) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct PlanHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub from_plan: String,
    pub to_plan: String,
    pub notes: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

/// Allocation defaults for a freshly created plan row: (data_allocated,
/// validity in days). PAYG is unmetered and never expires.
pub fn plan_defaults(plan_type: PlanType, data_mb: Option<i64>) -> (i64, Option<i64>) {
    match plan_type {
        PlanType::WelcomeBonus => (WELCOME_BONUS_MB, Some(WELCOME_BONUS_VALIDITY_DAYS)),
        PlanType::Payg => (0, None),
        PlanType::Data => (data_mb.unwrap_or(0), Some(DATA_PLAN_VALIDITY_DAYS)),
    }
}

/// A switch to the type already active is a no-op: no new row, no history
/// entry.
pub fn switch_is_noop(current: Option<&UserPlan>, new_type: PlanType) -> bool {
    current.map_or(false, |plan| plan.plan_type() == Some(new_type))
}

/// Result of a data bundle purchase.
#[derive(Debug)]
pub enum PurchaseOutcome {
    Purchased { plan: UserPlan, balance: i64 },
    Insufficient { balance: i64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsageApplied {
    pub consumed: i64,
    pub remaining: i64,
    pub exhausted: bool,
}

/// Cap-aware usage accounting for allocation plans. Returns the new
/// `data_used` value and what was actually consumed; usage never exceeds the
/// allocation.
pub fn apply_usage(used: i64, allocated: i64, delta_mb: i64) -> (i64, UsageApplied) {
    let new_used = (used + delta_mb.max(0)).min(allocated);
    let applied = UsageApplied {
        consumed: new_used - used,
        remaining: allocated - new_used,
        exhausted: new_used >= allocated,
    };

    (new_used, applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn active_plan(plan_type: &str) -> UserPlan {
        let now = Utc::now().naive_utc();
        UserPlan {
            id: "plan-1".to_string(),
            user_id: "user-1".to_string(),
            plan_type: plan_type.to_string(),
            status: "active".to_string(),
            data_allocated: 1000,
            data_used: 0,
            expires_at: Some(now + Duration::days(30)),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn switch_to_the_active_type_is_a_noop() {
        let plan = active_plan("data");
        assert!(switch_is_noop(Some(&plan), PlanType::Data));
    }

    #[test]
    fn switch_to_a_different_type_is_not_a_noop() {
        let plan = active_plan("payg");
        assert!(!switch_is_noop(Some(&plan), PlanType::Data));
        assert!(!switch_is_noop(None, PlanType::Data));
    }

    #[test]
    fn plan_past_expiry_reads_as_expired() {
        let now = Utc::now().naive_utc();
        let mut plan = active_plan("welcome_bonus");
        plan.expires_at = Some(now - Duration::hours(1));
        assert!(plan.is_expired_at(now));

        plan.expires_at = None;
        assert!(!plan.is_expired_at(now));
    }

    #[test]
    fn usage_is_capped_at_allocation() {
        let (new_used, applied) = apply_usage(950, 1000, 100);
        assert_eq!(new_used, 1000);
        assert_eq!(applied.consumed, 50);
        assert_eq!(applied.remaining, 0);
        assert!(applied.exhausted);
    }

    #[test]
    fn usage_below_cap_consumes_in_full() {
        let (new_used, applied) = apply_usage(100, 1000, 250);
        assert_eq!(new_used, 350);
        assert_eq!(applied.consumed, 250);
        assert_eq!(applied.remaining, 650);
        assert!(!applied.exhausted);
    }

    #[test]
    fn usage_on_exhausted_plan_consumes_nothing() {
        let (new_used, applied) = apply_usage(1000, 1000, 50);
        assert_eq!(new_used, 1000);
        assert_eq!(applied.consumed, 0);
        assert!(applied.exhausted);
    }

    #[test]
    fn welcome_bonus_defaults() {
        assert_eq!(
            plan_defaults(PlanType::WelcomeBonus, None),
            (WELCOME_BONUS_MB, Some(7))
        );
    }

    #[test]
    fn payg_is_unmetered() {
        assert_eq!(plan_defaults(PlanType::Payg, Some(500)), (0, None));
    }

    #[test]
    fn data_plan_uses_supplied_amount() {
        assert_eq!(plan_defaults(PlanType::Data, Some(1000)), (1000, Some(30)));
    }

    #[test]
    fn plan_type_round_trips() {
        for plan_type in [PlanType::WelcomeBonus, PlanType::Data, PlanType::Payg] {
            assert_eq!(PlanType::parse(plan_type.as_str()), Some(plan_type));
        }
        assert_eq!(PlanType::parse("free"), None);
    }
}
