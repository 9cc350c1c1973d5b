use chrono::Utc;
use listen_core::model::{NewQuestion, QuestionRecord, SourceId, Tier, text::content_key};

use super::SqliteRepository;
use super::mapping::{conn, map_question_row, ser, source_id_from_i64};
use crate::repository::{ContentRepository, StorageError};

#[async_trait::async_trait]
impl ContentRepository for SqliteRepository {
    async fn insert_questions(
        &self,
        drafts: &[NewQuestion],
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        for draft in drafts {
            draft.validate().map_err(ser)?;
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let mut ids: Vec<SourceId> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let res = sqlx::query(
                r"
                INSERT INTO questions (display_text, content_key, meaning, kind, tier, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(&draft.display_text)
            .bind(content_key(&draft.display_text))
            .bind(draft.meaning.as_deref())
            .bind(draft.kind.as_str())
            .bind(draft.tier.index())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
            ids.push(source_id_from_i64(res.last_insert_rowid())?);
        }
        tx.commit().await.map_err(conn)?;

        drafts
            .iter()
            .cloned()
            .zip(ids)
            .map(|(draft, id)| draft.assign_id(id).map_err(ser))
            .collect()
    }

    async fn get_questions(&self, tier: Tier) -> Result<Vec<QuestionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, display_text, meaning, kind, tier
                FROM questions
                WHERE tier = ?1
                ORDER BY id ASC
            ",
        )
        .bind(tier.index())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn get_distinct_questions(
        &self,
        tier: Tier,
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT q.id, q.display_text, q.meaning, q.kind, q.tier
                FROM questions q
                JOIN (
                    SELECT MIN(id) AS id
                    FROM questions
                    WHERE tier = ?1
                    GROUP BY content_key
                ) firsts ON firsts.id = q.id
                ORDER BY q.id ASC
            ",
        )
        .bind(tier.index())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        u64::try_from(count).map_err(ser)
    }
}
