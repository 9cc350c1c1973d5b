//! Content import from the JSON seed format.
//!
//! Each entry carries the native sentence, an optional meaning, a 1-based
//! level and an optional kind:
//!
//! ```json
//! [{ "native": "Maayong buntag", "meaning": "Good morning", "level": 1, "type": "LISTENING" }]
//! ```

use std::collections::HashMap;
use std::path::Path;

use listen_core::model::{NewQuestion, QuestionKind, Tier};
use serde::Deserialize;
use thiserror::Error;

use crate::repository::{Storage, StorageError};

/// Seed bundled with the crate, used when no file is given.
pub const BUILTIN_SEED: &str = include_str!("../seed/questions.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("seed entry {index} is invalid: {source}")]
    Invalid {
        index: usize,
        source: listen_core::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Deserialize)]
struct SeedEntry {
    native: String,
    #[serde(default)]
    meaning: Option<String>,
    #[serde(default)]
    translations: HashMap<String, String>,
    level: u32,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl SeedEntry {
    fn into_draft(self, index: usize) -> Result<NewQuestion, ImportError> {
        let meaning = self
            .meaning
            .or_else(|| self.translations.get("en").cloned());
        let draft = NewQuestion {
            display_text: self.native.trim().to_string(),
            meaning,
            kind: self
                .kind
                .as_deref()
                .map_or(QuestionKind::Listening, QuestionKind::parse_lenient),
            tier: Tier::from_level(self.level),
        };
        draft.validate().map_err(|e| ImportError::Invalid {
            index,
            source: e.into(),
        })?;
        Ok(draft)
    }
}

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: bool,
}

/// Parses seed JSON into question drafts.
///
/// # Errors
///
/// Returns `ImportError::Json` for malformed input and
/// `ImportError::Invalid` for entries that do not make a question.
pub fn parse_seed(json: &str) -> Result<Vec<NewQuestion>, ImportError> {
    let entries: Vec<SeedEntry> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.into_draft(index))
        .collect()
}

/// Writes drafts into storage and makes sure the first tier is open.
///
/// A store that already holds questions is left untouched unless `force`.
///
/// # Errors
///
/// Returns `ImportError::Storage` if any repository call fails.
pub async fn import_questions(
    storage: &Storage,
    drafts: &[NewQuestion],
    force: bool,
) -> Result<ImportReport, ImportError> {
    storage.progression.unlock_tier(Tier::Beginner).await?;

    let existing = storage.content.count_questions().await?;
    if existing > 0 && !force {
        tracing::info!(existing, "content already present, skipping import");
        return Ok(ImportReport {
            inserted: 0,
            skipped: true,
        });
    }

    let inserted = storage.content.insert_questions(drafts).await?;
    tracing::info!(inserted = inserted.len(), "imported questions");
    Ok(ImportReport {
        inserted: inserted.len(),
        skipped: false,
    })
}

/// Reads a seed file (or the bundled seed) and imports it.
///
/// # Errors
///
/// Returns `ImportError` if the file cannot be read or parsed, or storage
/// fails.
pub async fn import_seed(
    storage: &Storage,
    path: Option<&Path>,
    force: bool,
) -> Result<ImportReport, ImportError> {
    let drafts = match path {
        Some(path) => parse_seed(&std::fs::read_to_string(path)?)?,
        None => parse_seed(BUILTIN_SEED)?,
    };
    import_questions(storage, &drafts, force).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_kinds_and_translations() {
        let drafts = parse_seed(
            r#"[
                {"native": "Maayong buntag", "level": 1, "translations": {"en": "Good morning"}},
                {"native": "Asa ka padulong", "level": 12, "type": "translation"},
                {"native": "Bisan unsa", "level": 25, "type": "quiz", "meaning": "Anything"}
            ]"#,
        )
        .unwrap();

        assert_eq!(drafts[0].tier, Tier::Beginner);
        assert_eq!(drafts[0].meaning.as_deref(), Some("Good morning"));
        assert_eq!(drafts[1].tier, Tier::Intermediate);
        assert_eq!(drafts[1].kind, QuestionKind::Translation);
        assert_eq!(drafts[2].tier, Tier::Advanced);
        assert_eq!(drafts[2].kind, QuestionKind::Listening);
    }

    #[test]
    fn blank_sentences_are_reported_by_index() {
        let err = parse_seed(r#"[{"native": "Oo", "level": 1}, {"native": " ", "level": 1}]"#)
            .unwrap_err();
        assert!(matches!(err, ImportError::Invalid { index: 1, .. }));
    }

    #[test]
    fn builtin_seed_covers_every_tier() {
        let drafts = parse_seed(BUILTIN_SEED).unwrap();
        for tier in Tier::ALL {
            assert!(drafts.iter().any(|d| d.tier == tier), "missing {tier}");
        }
    }

    #[tokio::test]
    async fn second_import_is_skipped_unless_forced() {
        let storage = Storage::in_memory();
        let drafts = parse_seed(r#"[{"native": "Salamat", "level": 1}]"#).unwrap();

        let first = import_questions(&storage, &drafts, false).await.unwrap();
        let second = import_questions(&storage, &drafts, false).await.unwrap();
        let forced = import_questions(&storage, &drafts, true).await.unwrap();

        assert_eq!(first.inserted, 1);
        assert!(second.skipped);
        assert_eq!(forced.inserted, 1);
        assert_eq!(storage.content.count_questions().await.unwrap(), 2);
        assert!(
            storage
                .progression
                .get_progress(Tier::Beginner)
                .await
                .unwrap()
                .unlocked
        );
    }
}
