use listen_core::model::{SessionRecord, Tier};

use super::SqliteRepository;
use super::mapping::{conn, map_session_row};
use crate::repository::{SessionResultRepository, StorageError};

#[async_trait::async_trait]
impl SessionResultRepository for SqliteRepository {
    async fn append_record(&self, record: &SessionRecord) -> Result<i64, StorageError> {
        let result = record.result();
        let res = sqlx::query(
            r"
                INSERT INTO session_results (
                    tier, started_at, completed_at, correct_count,
                    total_questions, passed, stars, xp_earned
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(record.tier().index())
        .bind(record.started_at())
        .bind(record.completed_at())
        .bind(i64::from(result.correct_count))
        .bind(i64::from(result.total_questions))
        .bind(result.passed)
        .bind(i64::from(result.stars.value()))
        .bind(i64::from(result.xp_earned))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_records(
        &self,
        tier: Tier,
        limit: u32,
    ) -> Result<Vec<SessionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    tier, started_at, completed_at, correct_count,
                    total_questions, passed, stars, xp_earned
                FROM session_results
                WHERE tier = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(tier.index())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_session_row).collect()
    }
}
