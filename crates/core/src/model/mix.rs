use thiserror::Error;

use crate::model::tier::QuestionKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypeMixError {
    #[error("type mix must request at least one question")]
    Empty,

    #[error("kind {0} listed more than once")]
    DuplicateKind(QuestionKind),
}

/// Desired number of questions per kind for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMix {
    entries: Vec<(QuestionKind, u32)>,
}

impl TypeMix {
    /// # Errors
    ///
    /// Returns `TypeMixError::Empty` when the counts add up to zero and
    /// `TypeMixError::DuplicateKind` when a kind appears twice.
    pub fn new(entries: Vec<(QuestionKind, u32)>) -> Result<Self, TypeMixError> {
        for (i, (kind, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(k, _)| k == kind) {
                return Err(TypeMixError::DuplicateKind(*kind));
            }
        }
        if entries.iter().all(|(_, n)| *n == 0) {
            return Err(TypeMixError::Empty);
        }
        Ok(Self { entries })
    }

    /// Ten questions: four listening, three translation, three ordering.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            entries: vec![
                (QuestionKind::Listening, 4),
                (QuestionKind::Translation, 3),
                (QuestionKind::Ordering, 3),
            ],
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[(QuestionKind, u32)] {
        &self.entries
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| *n as usize).sum()
    }
}

impl Default for TypeMix {
    fn default() -> Self {
        Self::standard()
    }
}
