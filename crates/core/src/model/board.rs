use thiserror::Error;

use crate::model::text::fold_token;

/// Upper bound on tokens offered for one question.
pub const MAX_PANEL_COUNT: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BoardError {
    #[error("token `{0}` is not on the board")]
    UnknownToken(String),

    #[error("no token selected at position {0}")]
    NoSelectionAt(usize),

    #[error("answer is already complete")]
    AlreadyComplete,
}

/// Tokens offered for the current question plus the learner's partial answer.
///
/// The board only holds selections; judging them belongs to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBoard {
    options: Vec<String>,
    answer_len: usize,
    selected: Vec<String>,
}

impl TokenBoard {
    /// Number of distractors that fit next to an answer of `answer_len` tokens.
    #[must_use]
    pub fn distractor_slots(answer_len: usize) -> usize {
        MAX_PANEL_COUNT.saturating_sub(answer_len)
    }

    /// Builds the option list from folded answer tokens followed by
    /// distractors that do not collide with them. Duplicates are dropped and
    /// the distractor part is cut to fit the panel; ordering is left to the
    /// caller.
    #[must_use]
    pub fn new<A, D>(answer: &[A], distractors: &[D]) -> Self
    where
        A: AsRef<str>,
        D: AsRef<str>,
    {
        let mut options: Vec<String> = Vec::with_capacity(MAX_PANEL_COUNT);
        for token in answer {
            let folded = fold_token(token.as_ref());
            if !options.contains(&folded) {
                options.push(folded);
            }
        }
        let mut free = Self::distractor_slots(answer.len());
        for token in distractors {
            if free == 0 {
                break;
            }
            let folded = fold_token(token.as_ref());
            if folded.is_empty() || options.contains(&folded) {
                continue;
            }
            options.push(folded);
            free -= 1;
        }

        Self {
            options,
            answer_len: answer.len(),
            selected: Vec::new(),
        }
    }

    /// Reorders the options with the given permutation function.
    pub fn arrange(&mut self, arrange: impl FnOnce(&mut [String])) {
        arrange(&mut self.options);
    }

    /// Appends a token to the partial answer.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::UnknownToken` for tokens not offered and
    /// `BoardError::AlreadyComplete` once enough tokens are chosen.
    pub fn select(&mut self, token: &str) -> Result<(), BoardError> {
        if self.is_complete() {
            return Err(BoardError::AlreadyComplete);
        }
        let folded = fold_token(token);
        if !self.options.contains(&folded) {
            return Err(BoardError::UnknownToken(token.to_string()));
        }
        self.selected.push(folded);
        Ok(())
    }

    /// Removes the most recent selection, if any.
    pub fn remove_last(&mut self) -> Option<String> {
        self.selected.pop()
    }

    /// # Errors
    ///
    /// Returns `BoardError::NoSelectionAt` if `index` is past the selection.
    pub fn remove_at(&mut self, index: usize) -> Result<String, BoardError> {
        if index >= self.selected.len() {
            return Err(BoardError::NoSelectionAt(index));
        }
        Ok(self.selected.remove(index))
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.selected.len() == self.answer_len
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    #[must_use]
    pub fn answer_len(&self) -> usize {
        self.answer_len
    }
}
