use listen_core::model::{StarRating, Tier, TierProgress};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, stars_from_i64, tier_from_i64};
use crate::repository::{ProgressionRepository, StorageError};

impl SqliteRepository {
    async fn ensure_tier_row(&self, tier: Tier) -> Result<(), StorageError> {
        let initial = TierProgress::initial(tier);
        sqlx::query(
            r"
                INSERT INTO tier_progress (tier, unlocked, best_stars)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(tier) DO NOTHING
            ",
        )
        .bind(tier.index())
        .bind(initial.unlocked)
        .bind(i64::from(initial.best_stars.value()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProgressionRepository for SqliteRepository {
    async fn get_progress(&self, tier: Tier) -> Result<TierProgress, StorageError> {
        let row = sqlx::query("SELECT tier, unlocked, best_stars FROM tier_progress WHERE tier = ?1")
            .bind(tier.index())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(TierProgress::initial(tier));
        };
        Ok(TierProgress {
            tier: tier_from_i64(row.try_get::<i64, _>("tier").map_err(ser)?)?,
            unlocked: row.try_get::<bool, _>("unlocked").map_err(ser)?,
            best_stars: stars_from_i64(row.try_get::<i64, _>("best_stars").map_err(ser)?)?,
        })
    }

    async fn list_progress(&self) -> Result<Vec<TierProgress>, StorageError> {
        let mut out = Vec::with_capacity(Tier::ALL.len());
        for tier in Tier::ALL {
            out.push(self.get_progress(tier).await?);
        }
        Ok(out)
    }

    async fn unlock_tier(&self, tier: Tier) -> Result<(), StorageError> {
        self.ensure_tier_row(tier).await?;
        sqlx::query("UPDATE tier_progress SET unlocked = 1 WHERE tier = ?1")
            .bind(tier.index())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn record_best_stars(
        &self,
        tier: Tier,
        stars: StarRating,
    ) -> Result<bool, StorageError> {
        self.ensure_tier_row(tier).await?;
        let res = sqlx::query(
            r"
                UPDATE tier_progress
                SET best_stars = ?2
                WHERE tier = ?1 AND best_stars < ?2
            ",
        )
        .bind(tier.index())
        .bind(i64::from(stars.value()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_experience(&self, xp: u32) -> Result<u64, StorageError> {
        let total: i64 = sqlx::query_scalar(
            r"
                INSERT INTO learner_profile (id, total_xp)
                VALUES (1, ?1)
                ON CONFLICT(id) DO UPDATE SET total_xp = total_xp + excluded.total_xp
                RETURNING total_xp
            ",
        )
        .bind(i64::from(xp))
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;
        u64::try_from(total).map_err(ser)
    }

    async fn total_experience(&self) -> Result<u64, StorageError> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT total_xp FROM learner_profile WHERE id = 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(conn)?;
        u64::try_from(total.unwrap_or(0)).map_err(ser)
    }
}
