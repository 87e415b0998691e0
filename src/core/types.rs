//! Domain identifier types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a subject being measured (a player, a node, a user).
///
/// The engine does not own subject identity or lifecycle; it receives subject
/// lists per request and treats the id as an opaque key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a new subject id.
    pub fn new(id: impl Into<String>) -> Self {
        SubjectId(id.into())
    }

    /// Returns the string representation of the subject id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string value.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        SubjectId(id.to_owned())
    }
}

/// Identifier for the party that submitted a request.
///
/// Used as the single-flight key: at most one population computation may be
/// in flight per requester when admission control is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterId(String);

impl RequesterId {
    /// Creates a new requester id.
    pub fn new(id: impl Into<String>) -> Self {
        RequesterId(id.into())
    }

    /// Returns the string representation of the requester id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RequesterId {
    fn from(id: &str) -> Self {
        RequesterId(id.to_owned())
    }
}

/// Unique, case-insensitive name of a metric definition.
///
/// Aliases are lowercased on construction, so lookups and equality are
/// case-insensitive by design.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alias(String);

impl Alias {
    /// Creates a new alias, lowercasing the input.
    pub fn new(alias: impl AsRef<str>) -> Self {
        Alias(alias.as_ref().to_lowercase())
    }

    /// Returns the string representation of the alias.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Alias {
    fn from(alias: &str) -> Self {
        Alias::new(alias)
    }
}

/// Identifier for a raw statistic tracked by the statistic provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatisticId(String);

impl StatisticId {
    /// Creates a new statistic id, lowercasing the input.
    pub fn new(id: impl AsRef<str>) -> Self {
        StatisticId(id.as_ref().to_lowercase())
    }

    /// Returns the string representation of the statistic id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatisticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StatisticId {
    fn from(id: &str) -> Self {
        StatisticId::new(id)
    }
}

/// Key within a keyed statistic's domain (a material, an entity kind, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Discriminator(String);

impl Discriminator {
    /// Creates a new discriminator, lowercasing the input.
    pub fn new(key: impl AsRef<str>) -> Self {
        Discriminator(key.as_ref().to_lowercase())
    }

    /// Returns the string representation of the discriminator.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Discriminator {
    fn from(key: &str) -> Self {
        Discriminator::new(key)
    }
}

/// Intrinsic shape of a statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    /// A single counter per subject.
    Untyped,
    /// A family of counters per subject, keyed by discriminator.
    Keyed,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::Untyped => write!(f, "untyped"),
            StatKind::Keyed => write!(f, "keyed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_is_case_insensitive() {
        assert_eq!(Alias::new("Player_Kills"), Alias::new("player_kills"));
        assert_eq!(Alias::new("DEATHS").as_str(), "deaths");
    }

    #[test]
    fn test_subject_id_preserves_case() {
        let subject = SubjectId::new("Artemis");
        assert_eq!(subject.as_str(), "Artemis");
    }

    #[test]
    fn test_stat_kind_display() {
        assert_eq!(StatKind::Keyed.to_string(), "keyed");
        assert_eq!(StatKind::Untyped.to_string(), "untyped");
    }
}
