use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
        .bind(version)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Applies pending schema versions, each in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: content, progression and history.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    display_text TEXT NOT NULL,
                    content_key TEXT NOT NULL,
                    meaning TEXT,
                    kind TEXT NOT NULL CHECK (kind IN ('LISTENING', 'TRANSLATION', 'ORDERING')),
                    tier INTEGER NOT NULL CHECK (tier BETWEEN 1 AND 3),
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS tier_progress (
                    tier INTEGER PRIMARY KEY CHECK (tier BETWEEN 1 AND 3),
                    unlocked INTEGER NOT NULL CHECK (unlocked IN (0, 1)),
                    best_stars INTEGER NOT NULL CHECK (best_stars BETWEEN 0 AND 3)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS learner_profile (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    total_xp INTEGER NOT NULL CHECK (total_xp >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_results (
                    id INTEGER PRIMARY KEY,
                    tier INTEGER NOT NULL CHECK (tier BETWEEN 1 AND 3),
                    started_at TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    correct_count INTEGER NOT NULL CHECK (correct_count >= 0),
                    total_questions INTEGER NOT NULL CHECK (total_questions >= correct_count),
                    passed INTEGER NOT NULL CHECK (passed IN (0, 1)),
                    stars INTEGER NOT NULL CHECK (stars BETWEEN 0 AND 3),
                    xp_earned INTEGER NOT NULL CHECK (xp_earned >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_questions_tier_content_key
                    ON questions (tier, content_key, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_results_tier_completed
                    ON session_results (tier, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
