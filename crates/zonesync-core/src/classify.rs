//! Classification of free-text provider errors
//!
//! The provider reports conflicts and missing records only through message
//! text. This is the one place that reads that text; everything above the
//! client sees typed outcomes instead.

/// Phrases meaning "the record you are looking for is gone"
pub const NOT_FOUND_PHRASES: &[&str] = &[
    "not found",
    "does not exist",
    "record with id",
    "no record found",
    "invalid record id",
    "record id not found",
];

/// Phrases meaning "an equivalent record already exists"
pub const CONFLICT_PHRASES: &[&str] = &[
    "cannot add",
    "invalid record",
    "already exists",
    "duplicate",
];

/// What an error message says about the target record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The record is absent
    NotFound,
    /// An equivalent record already exists
    Conflict,
    /// Anything else
    Other,
}

/// The call whose rejection is being classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Zone listing
    Fetch,
    /// Record creation
    Create,
    /// Record update
    Update,
    /// Record deletion
    Delete,
}

/// Classify a provider error message, case-insensitively
///
/// Not-found phrases win over conflict phrases: "invalid record id" also
/// contains "invalid record".
pub fn classify(message: &str) -> ErrorClass {
    classify_for(Operation::Fetch, message)
}

/// Classify the rejection of `operation`, case-insensitively
///
/// A create addresses no existing record, so conflict phrases win there:
/// "record with identical name" contains "record with id". Every other
/// operation checks not-found phrases first.
pub fn classify_for(operation: Operation, message: &str) -> ErrorClass {
    let lower = message.to_lowercase();
    let not_found = NOT_FOUND_PHRASES.iter().any(|p| lower.contains(p));
    let conflict = CONFLICT_PHRASES.iter().any(|p| lower.contains(p));

    match (operation, not_found, conflict) {
        (Operation::Create, _, true) => ErrorClass::Conflict,
        (_, true, _) => ErrorClass::NotFound,
        (_, false, true) => ErrorClass::Conflict,
        _ => ErrorClass::Other,
    }
}
