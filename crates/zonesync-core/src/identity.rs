//! Record identity
//!
//! Two records denote the same DNS entry when their names match
//! case-insensitively and their types match case-insensitively, ignoring
//! surrounding whitespace. Every identity test in the workspace goes through
//! [`matches`] so that `cname` and `CNAME` can never be told apart in one
//! place and confused in another.

/// Anything that carries a record name and type
pub trait Identified {
    /// Record name as given
    fn name(&self) -> &str;

    /// Record type as given
    fn record_type(&self) -> &str;

    /// Normalized identity key
    fn identity(&self) -> RecordKey {
        RecordKey::new(self.name(), self.record_type())
    }
}

impl Identified for (&str, &str) {
    fn name(&self) -> &str {
        self.0
    }

    fn record_type(&self) -> &str {
        self.1
    }
}

/// Normalize a record name: trimmed, lower-cased
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalize a record type: trimmed, upper-cased
pub fn normalize_type(record_type: &str) -> String {
    record_type.trim().to_uppercase()
}

/// Whether `a` and `b` denote the same DNS entry
pub fn matches<A, B>(a: &A, b: &B) -> bool
where
    A: Identified + ?Sized,
    B: Identified + ?Sized,
{
    a.identity() == b.identity()
}

/// Normalized (name, type) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    name: String,
    record_type: String,
}

impl RecordKey {
    /// Build a key, normalizing both fields
    pub fn new(name: &str, record_type: &str) -> Self {
        Self {
            name: normalize_name(name),
            record_type: normalize_type(record_type),
        }
    }

    /// Normalized name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized type
    pub fn record_type(&self) -> &str {
        &self.record_type
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.record_type)
    }
}
