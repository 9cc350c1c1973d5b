use async_trait::async_trait;
use listen_core::model::{
    NewQuestion, QuestionRecord, SessionRecord, SourceId, StarRating, Tier, TierProgress,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Source of drill questions, grouped by tier.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Persist new questions and return them with their assigned ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for invalid drafts, or other
    /// storage errors if the batch cannot be written.
    async fn insert_questions(
        &self,
        drafts: &[NewQuestion],
    ) -> Result<Vec<QuestionRecord>, StorageError>;

    /// All questions for a tier, in id order. May be empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_questions(&self, tier: Tier) -> Result<Vec<QuestionRecord>, StorageError>;

    /// Like `get_questions`, keeping only the lowest id per content key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_distinct_questions(&self, tier: Tier)
    -> Result<Vec<QuestionRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn count_questions(&self) -> Result<u64, StorageError>;
}

/// Unlock state, best stars and accumulated experience.
#[async_trait]
pub trait ProgressionRepository: Send + Sync {
    /// Progress for a tier. Tiers never written report their initial state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_progress(&self, tier: Tier) -> Result<TierProgress, StorageError>;

    /// Progress for every tier, in tier order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_progress(&self) -> Result<Vec<TierProgress>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the unlock cannot be stored.
    async fn unlock_tier(&self, tier: Tier) -> Result<(), StorageError>;

    /// Stores `stars` only if they beat the recorded best. Returns whether
    /// anything changed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update cannot be stored.
    async fn record_best_stars(&self, tier: Tier, stars: StarRating)
    -> Result<bool, StorageError>;

    /// Adds experience and returns the new total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update cannot be stored.
    async fn add_experience(&self, xp: u32) -> Result<u64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn total_experience(&self) -> Result<u64, StorageError>;
}

/// Append-only history of finished sessions.
#[async_trait]
pub trait SessionResultRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_record(&self, record: &SessionRecord) -> Result<i64, StorageError>;

    /// Most recent records first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_records(&self, tier: Tier, limit: u32)
    -> Result<Vec<SessionRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<QuestionRecord>>>,
    progress: Arc<Mutex<HashMap<Tier, TierProgress>>>,
    experience: Arc<Mutex<u64>>,
    records: Arc<Mutex<Vec<SessionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn insert_questions(
        &self,
        drafts: &[NewQuestion],
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let mut next = guard
            .iter()
            .map(|q| q.id().origin().value())
            .max()
            .unwrap_or(0);

        let mut inserted = Vec::with_capacity(drafts.len());
        for draft in drafts {
            next += 1;
            let record = draft
                .clone()
                .assign_id(SourceId::new(next))
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            inserted.push(record);
        }
        guard.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn get_questions(&self, tier: Tier) -> Result<Vec<QuestionRecord>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.iter().filter(|q| q.tier() == tier).cloned().collect())
    }

    async fn get_distinct_questions(
        &self,
        tier: Tier,
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        let all = self.get_questions(tier).await?;
        let mut keys = HashSet::new();
        Ok(all
            .into_iter()
            .filter(|q| keys.insert(q.content_key()))
            .collect())
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.len() as u64)
    }
}

#[async_trait]
impl ProgressionRepository for InMemoryRepository {
    async fn get_progress(&self, tier: Tier) -> Result<TierProgress, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard
            .get(&tier)
            .copied()
            .unwrap_or_else(|| TierProgress::initial(tier)))
    }

    async fn list_progress(&self) -> Result<Vec<TierProgress>, StorageError> {
        let mut out = Vec::with_capacity(Tier::ALL.len());
        for tier in Tier::ALL {
            out.push(self.get_progress(tier).await?);
        }
        Ok(out)
    }

    async fn unlock_tier(&self, tier: Tier) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard
            .entry(tier)
            .or_insert_with(|| TierProgress::initial(tier))
            .unlocked = true;
        Ok(())
    }

    async fn record_best_stars(
        &self,
        tier: Tier,
        stars: StarRating,
    ) -> Result<bool, StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let entry = guard
            .entry(tier)
            .or_insert_with(|| TierProgress::initial(tier));
        if !entry.improves_on(stars) {
            return Ok(false);
        }
        entry.best_stars = stars;
        Ok(true)
    }

    async fn add_experience(&self, xp: u32) -> Result<u64, StorageError> {
        let mut guard = self.experience.lock().map_err(poisoned)?;
        *guard = guard.saturating_add(u64::from(xp));
        Ok(*guard)
    }

    async fn total_experience(&self) -> Result<u64, StorageError> {
        let guard = self.experience.lock().map_err(poisoned)?;
        Ok(*guard)
    }
}

#[async_trait]
impl SessionResultRepository for InMemoryRepository {
    async fn append_record(&self, record: &SessionRecord) -> Result<i64, StorageError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        guard.push(record.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Conflict)
    }

    async fn list_records(
        &self,
        tier: Tier,
        limit: u32,
    ) -> Result<Vec<SessionRecord>, StorageError> {
        let guard = self.records.lock().map_err(poisoned)?;
        let mut out: Vec<SessionRecord> = guard
            .iter()
            .rev()
            .filter(|r| r.tier() == tier)
            .take(limit as usize)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.completed_at().cmp(&a.completed_at()));
        Ok(out)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub content: Arc<dyn ContentRepository>,
    pub progression: Arc<dyn ProgressionRepository>,
    pub session_results: Arc<dyn SessionResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let content: Arc<dyn ContentRepository> = Arc::new(repo.clone());
        let progression: Arc<dyn ProgressionRepository> = Arc::new(repo.clone());
        let session_results: Arc<dyn SessionResultRepository> = Arc::new(repo);
        Self {
            content,
            progression,
            session_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listen_core::model::{QuestionKind, ScoringRules};
    use listen_core::time::fixed_now;

    fn draft(text: &str, tier: Tier) -> NewQuestion {
        NewQuestion {
            display_text: text.into(),
            meaning: None,
            kind: QuestionKind::Listening,
            tier,
        }
    }

    #[tokio::test]
    async fn inserted_questions_get_sequential_ids() {
        let repo = InMemoryRepository::new();
        let saved = repo
            .insert_questions(&[draft("Maayong buntag", Tier::Beginner), draft("Oo", Tier::Beginner)])
            .await
            .unwrap();

        assert_eq!(saved[0].id().origin(), SourceId::new(1));
        assert_eq!(saved[1].id().origin(), SourceId::new(2));
        assert_eq!(repo.count_questions().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn distinct_query_keeps_first_of_each_content_key() {
        let repo = InMemoryRepository::new();
        repo.insert_questions(&[
            draft("Maayong buntag", Tier::Beginner),
            draft("maayong  Buntag", Tier::Beginner),
            draft("Salamat", Tier::Beginner),
            draft("Salamat", Tier::Advanced),
        ])
        .await
        .unwrap();

        let all = repo.get_questions(Tier::Beginner).await.unwrap();
        let distinct = repo.get_distinct_questions(Tier::Beginner).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(distinct.len(), 2);
        assert_eq!(distinct[0].id().origin(), SourceId::new(1));
    }

    #[tokio::test]
    async fn best_stars_only_improve() {
        let repo = InMemoryRepository::new();
        assert!(repo
            .record_best_stars(Tier::Beginner, StarRating::new(2))
            .await
            .unwrap());
        assert!(!repo
            .record_best_stars(Tier::Beginner, StarRating::new(1))
            .await
            .unwrap());
        let progress = repo.get_progress(Tier::Beginner).await.unwrap();
        assert_eq!(progress.best_stars, StarRating::new(2));
    }

    #[tokio::test]
    async fn unlock_and_experience_accumulate() {
        let repo = InMemoryRepository::new();
        assert!(!repo.get_progress(Tier::Intermediate).await.unwrap().unlocked);
        repo.unlock_tier(Tier::Intermediate).await.unwrap();
        assert!(repo.get_progress(Tier::Intermediate).await.unwrap().unlocked);

        repo.add_experience(80).await.unwrap();
        assert_eq!(repo.add_experience(150).await.unwrap(), 230);
        assert_eq!(repo.total_experience().await.unwrap(), 230);
    }

    #[tokio::test]
    async fn records_are_listed_per_tier() {
        let repo = InMemoryRepository::new();
        let result = ScoringRules::default().score(8, 10).unwrap();
        let now = fixed_now();
        let record = SessionRecord::new(Tier::Beginner, now, now, result).unwrap();
        repo.append_record(&record).await.unwrap();

        assert_eq!(repo.list_records(Tier::Beginner, 10).await.unwrap().len(), 1);
        assert!(repo.list_records(Tier::Advanced, 10).await.unwrap().is_empty());
    }
}
