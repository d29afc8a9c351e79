use crate::models::plans::PlanType;
use crate::models::profiles::Profile;
use crate::repositories::plans::insert_plan;

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProfileRepository {
    conn: PgPool,
}

impl ProfileRepository {
    pub fn new(conn: PgPool) -> Self {
        ProfileRepository { conn }
    }

    /// Signup. One database transaction seeds everything a new account needs:
    /// the profile (resolving a referral code to the referrer if supplied), a
    /// zero-balance wallet, the welcome-bonus plan, the daily-bonus claim
    /// record, and the referral linkage.
    pub async fn insert_profile(
        &self,
        email: &str,
        referral_code: Option<String>,
    ) -> Result<Profile, anyhow::Error> {
        let user_id = Uuid::new_v4().hyphenated().to_string();
        let own_code = generate_referral_code();

        let referred_by: Option<String> = match referral_code {
            Some(code) => {
                sqlx::query_scalar("SELECT id FROM profiles WHERE referral_code = $1")
                    .bind(code)
                    .fetch_optional(&self.conn)
                    .await?
            }
            None => None,
        };

        let mut tx = self.conn.begin().await?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, email, referral_code, referred_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user_id)
        .bind(email)
        .bind(&own_code)
        .bind(&referred_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO wallet (user_id, balance) VALUES ($1, 0)")
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;

        insert_plan(&mut tx, &user_id, PlanType::WelcomeBonus, None).await?;

        sqlx::query(
            r#"
            INSERT INTO daily_bonus_claims (user_id, days_claimed, next_claim_at, is_eligible)
            VALUES ($1, 0, CURRENT_TIMESTAMP, TRUE)
            "#,
        )
        .bind(&user_id)
        .execute(&mut *tx)
        .await?;

        if let Some(ref referrer_id) = referred_by {
            let referral_id = Uuid::new_v4().hyphenated().to_string();
            sqlx::query(
                r#"
                INSERT INTO referrals (id, referrer_id, referred_id, status)
                VALUES ($1, $2, $3, 'completed')
                "#,
            )
            .bind(referral_id)
            .bind(referrer_id)
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(profile)
    }

    pub async fn get_profile_by_id(
        &self,
        user_id: &str,
    ) -> Result<Option<Profile>, anyhow::Error> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(profile)
    }
}

fn generate_referral_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_codes_are_short_and_distinct() {
        let a = generate_referral_code();
        let b = generate_referral_code();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
