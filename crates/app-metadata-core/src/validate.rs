use crate::address::is_valid_address;
use crate::AppMetadata;

/// Reason a record was refused admission. The display strings are the client-facing
/// messages.
#[derive(Debug, Clone, Copy, thiserror::Error, Eq, PartialEq)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid Email Address")]
    InvalidEmail,
}

/// Check a decoded record before it is admitted to a catalog.
///
/// Checks run in order and the first failure wins: top-level completeness, then
/// maintainer completeness, then maintainer email grammar. Emptiness is literal;
/// whitespace-only values count as present.
///
/// # Errors
/// Returns [`ValidationError::MissingFields`] when any field or the maintainer list is
/// empty, and [`ValidationError::InvalidEmail`] when a maintainer email is malformed.
pub fn validate(record: &AppMetadata) -> Result<(), ValidationError> {
    let top_level = [
        &record.title,
        &record.version,
        &record.company,
        &record.website,
        &record.source,
        &record.license,
        &record.description,
    ];
    if top_level.iter().any(|value| value.is_empty()) || record.maintainers.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    if record.maintainers.iter().any(|person| person.name.is_empty() || person.email.is_empty()) {
        return Err(ValidationError::MissingFields);
    }

    if !record.maintainers.iter().all(|person| is_valid_address(&person.email)) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}
