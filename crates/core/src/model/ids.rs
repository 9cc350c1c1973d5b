use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a question as stored in the content store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(u64);

impl SourceId {
    /// Creates a new `SourceId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Identifier of a question inside a session.
///
/// Replicas are clones made to pad a session and carry a fresh tag, so two
/// replicas of the same source question never compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionId {
    Source(SourceId),
    Replica { source: SourceId, tag: Uuid },
}

impl QuestionId {
    #[must_use]
    pub fn source(id: u64) -> Self {
        Self::Source(SourceId::new(id))
    }

    /// Synthesizes a new replica id for the given origin.
    #[must_use]
    pub fn replica_of(origin: SourceId) -> Self {
        Self::Replica {
            source: origin,
            tag: Uuid::new_v4(),
        }
    }

    /// The content-store id this question was loaded from.
    #[must_use]
    pub fn origin(&self) -> SourceId {
        match self {
            Self::Source(id) | Self::Replica { source: id, .. } => *id,
        }
    }

    #[must_use]
    pub fn is_replica(&self) -> bool {
        matches!(self, Self::Replica { .. })
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({self})")
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(id) => write!(f, "db_{id}"),
            Self::Replica { source, tag } => write!(f, "db_{source}_dup_{}", tag.simple()),
        }
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an id from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    input: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse question id from `{}`", self.input)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for SourceId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(SourceId::new).map_err(|_| ParseIdError {
            input: s.to_string(),
        })
    }
}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError {
            input: s.to_string(),
        };
        let rest = s.strip_prefix("db_").ok_or_else(err)?;
        match rest.split_once("_dup_") {
            None => rest.parse::<SourceId>().map(Self::Source),
            Some((source, tag)) => {
                let source = source.parse::<SourceId>()?;
                let tag = Uuid::parse_str(tag).map_err(|_| err())?;
                Ok(Self::Replica { source, tag })
            }
        }
        .map_err(|_| err())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_display_uses_db_prefix() {
        assert_eq!(QuestionId::source(42).to_string(), "db_42");
    }

    #[test]
    fn replicas_of_same_origin_are_distinct() {
        let origin = SourceId::new(7);
        let a = QuestionId::replica_of(origin);
        let b = QuestionId::replica_of(origin);

        assert_ne!(a, b);
        assert_eq!(a.origin(), origin);
        assert!(a.is_replica());
        assert!(!QuestionId::source(7).is_replica());
    }

    #[test]
    fn replica_id_parses_back() {
        let id = QuestionId::replica_of(SourceId::new(3));
        let parsed: QuestionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        assert!("42".parse::<QuestionId>().is_err());
        assert!("db_x".parse::<QuestionId>().is_err());
        assert!("db_1_dup_nope".parse::<QuestionId>().is_err());
    }
}
