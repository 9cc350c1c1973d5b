use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, SourceId};
use crate::model::text::{content_key, tokenize};
use crate::model::tier::{QuestionKind, Tier};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("display text cannot be empty")]
    EmptyDisplayText,

    #[error("answer must contain at least one token")]
    EmptyAnswer,

    #[error("answer tokens cannot be blank")]
    BlankToken,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// An unsaved question, as produced by content import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub display_text: String,
    pub meaning: Option<String>,
    pub kind: QuestionKind,
    pub tier: Tier,
}

impl NewQuestion {
    /// Checks the draft and derives its answer tokens from the display text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyDisplayText` for blank text.
    pub fn validate(&self) -> Result<Vec<String>, QuestionError> {
        if self.display_text.trim().is_empty() {
            return Err(QuestionError::EmptyDisplayText);
        }
        Ok(tokenize(&self.display_text))
    }

    /// # Errors
    ///
    /// Same as [`NewQuestion::validate`].
    pub fn assign_id(self, id: SourceId) -> Result<QuestionRecord, QuestionError> {
        QuestionRecord::from_sentence(
            QuestionId::Source(id),
            self.display_text,
            self.meaning,
            self.kind,
            self.tier,
        )
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// One drill item. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    id: QuestionId,
    display_text: String,
    meaning: Option<String>,
    answer_tokens: Vec<String>,
    kind: QuestionKind,
    tier: Tier,
}

impl QuestionRecord {
    /// # Errors
    ///
    /// Returns `QuestionError` when the display text is blank, the answer is
    /// empty, or any answer token is blank.
    pub fn new(
        id: QuestionId,
        display_text: impl Into<String>,
        meaning: Option<String>,
        answer_tokens: Vec<String>,
        kind: QuestionKind,
        tier: Tier,
    ) -> Result<Self, QuestionError> {
        let display_text = display_text.into();
        if display_text.trim().is_empty() {
            return Err(QuestionError::EmptyDisplayText);
        }
        if answer_tokens.is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }
        if answer_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(QuestionError::BlankToken);
        }

        Ok(Self {
            id,
            display_text,
            meaning: meaning.filter(|m| !m.trim().is_empty()),
            answer_tokens,
            kind,
            tier,
        })
    }

    /// Builds a record whose answer is the whitespace-split display text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyDisplayText` for blank sentences.
    pub fn from_sentence(
        id: QuestionId,
        sentence: impl Into<String>,
        meaning: Option<String>,
        kind: QuestionKind,
        tier: Tier,
    ) -> Result<Self, QuestionError> {
        let sentence = sentence.into();
        let tokens = tokenize(&sentence);
        Self::new(id, sentence, meaning, tokens, kind, tier)
    }

    /// Clones this record under a freshly synthesized replica id.
    #[must_use]
    pub fn replicate(&self) -> Self {
        Self {
            id: QuestionId::replica_of(self.id.origin()),
            ..self.clone()
        }
    }

    /// Key used for de-duplication across the engine.
    #[must_use]
    pub fn content_key(&self) -> String {
        content_key(&self.display_text)
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    #[must_use]
    pub fn meaning(&self) -> Option<&str> {
        self.meaning.as_deref()
    }

    #[must_use]
    pub fn answer_tokens(&self) -> &[String] {
        &self.answer_tokens
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub fn is_replica(&self) -> bool {
        self.id.is_replica()
    }
}
