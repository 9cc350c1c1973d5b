use listen_core::model::{
    QuestionId, QuestionKind, QuestionRecord, SessionRecord, SessionResult, SourceId, StarRating,
    Tier,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn source_id_from_i64(v: i64) -> Result<SourceId, StorageError> {
    u64::try_from(v)
        .map(SourceId::new)
        .map_err(|_| StorageError::Serialization("question id sign overflow".into()))
}

pub(crate) fn tier_from_i64(v: i64) -> Result<Tier, StorageError> {
    Tier::from_index(v).map_err(ser)
}

pub(crate) fn stars_from_i64(v: i64) -> Result<StarRating, StorageError> {
    u8::try_from(v)
        .ok()
        .filter(|s| *s <= StarRating::MAX.value())
        .map(StarRating::new)
        .ok_or_else(|| StorageError::Serialization(format!("invalid stars: {v}")))
}

pub(crate) fn parse_kind(s: &str) -> Result<QuestionKind, StorageError> {
    QuestionKind::ALL
        .into_iter()
        .find(|k| k.as_str() == s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid kind: {s}")))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuestionRecord, StorageError> {
    let id = source_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let kind_str: String = row.try_get("kind").map_err(ser)?;

    QuestionRecord::from_sentence(
        QuestionId::Source(id),
        row.try_get::<String, _>("display_text").map_err(ser)?,
        row.try_get::<Option<String>, _>("meaning").map_err(ser)?,
        parse_kind(&kind_str)?,
        tier_from_i64(row.try_get::<i64, _>("tier").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<SessionRecord, StorageError> {
    let result = SessionResult {
        correct_count: u32_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        passed: row.try_get::<bool, _>("passed").map_err(ser)?,
        stars: stars_from_i64(row.try_get::<i64, _>("stars").map_err(ser)?)?,
        xp_earned: u32_from_i64("xp_earned", row.try_get::<i64, _>("xp_earned").map_err(ser)?)?,
    };

    SessionRecord::new(
        tier_from_i64(row.try_get::<i64, _>("tier").map_err(ser)?)?,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        result,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_outside_range_are_rejected() {
        assert_eq!(stars_from_i64(3).unwrap(), StarRating::MAX);
        assert!(stars_from_i64(4).is_err());
        assert!(stars_from_i64(-1).is_err());
    }

    #[test]
    fn kind_column_must_be_canonical() {
        assert_eq!(parse_kind("ORDERING").unwrap(), QuestionKind::Ordering);
        assert!(parse_kind("ordering").is_err());
    }
}
