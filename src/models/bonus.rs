use serde::{Deserialize, Serialize};

pub const MAX_BONUS_DAYS: i32 = 7;
pub const DAILY_BONUS_KOBO: i64 = 5000;

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct DailyBonusClaim {
    pub user_id: String,
    pub days_claimed: i32,
    pub next_claim_at: chrono::NaiveDateTime,
    pub is_eligible: bool,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl DailyBonusClaim {
    /// The eligibility gate: once all seven days are claimed the record is
    /// permanently ineligible, otherwise claims are time-gated to one per 24h.
    pub fn can_claim_at(&self, now: chrono::NaiveDateTime) -> bool {
        self.is_eligible && self.days_claimed < MAX_BONUS_DAYS && now >= self.next_claim_at
    }
}

/// Result of a claim attempt. `TooEarly` and `Exhausted` are rejections, not
/// errors.
#[derive(Debug)]
pub enum ClaimOutcome {
    Claimed {
        days_claimed: i32,
        balance: i64,
    },
    TooEarly {
        next_claim_at: chrono::NaiveDateTime,
    },
    Exhausted,
}

#[derive(Debug, Serialize)]
pub struct BonusInfo {
    pub days_claimed: i32,
    pub days_remaining: i32,
    pub can_claim: bool,
    pub next_claim_at: chrono::NaiveDateTime,
}

impl BonusInfo {
    pub fn from_claim(claim: &DailyBonusClaim, now: chrono::NaiveDateTime) -> Self {
        BonusInfo {
            days_claimed: claim.days_claimed,
            days_remaining: (MAX_BONUS_DAYS - claim.days_claimed).max(0),
            can_claim: claim.can_claim_at(now),
            next_claim_at: claim.next_claim_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn claim(days_claimed: i32, is_eligible: bool, next_in_hours: i64) -> DailyBonusClaim {
        let now = Utc::now().naive_utc();
        DailyBonusClaim {
            user_id: "user".to_string(),
            days_claimed,
            next_claim_at: now + Duration::hours(next_in_hours),
            is_eligible,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fresh_record_is_claimable() {
        let now = Utc::now().naive_utc();
        assert!(claim(0, true, -1).can_claim_at(now));
    }

    #[test]
    fn claim_is_time_gated() {
        let now = Utc::now().naive_utc();
        assert!(!claim(3, true, 12).can_claim_at(now));
    }

    #[test]
    fn seventh_day_exhausts_eligibility_forever() {
        let now = Utc::now().naive_utc();
        let exhausted = claim(MAX_BONUS_DAYS, false, -1);
        assert!(!exhausted.can_claim_at(now));
        // Even a long elapsed time does not revive an exhausted record.
        assert!(!exhausted.can_claim_at(now + Duration::days(365)));
    }

    #[test]
    fn days_claimed_never_reports_negative_remaining() {
        let now = Utc::now().naive_utc();
        let info = BonusInfo::from_claim(&claim(MAX_BONUS_DAYS, false, -1), now);
        assert_eq!(info.days_remaining, 0);
        assert!(!info.can_claim);
    }
}
