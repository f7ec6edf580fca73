use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::AppMetadata;

#[derive(Debug, Clone, Copy, thiserror::Error, Eq, PartialEq)]
pub enum QueryError {
    #[error("search query is empty")]
    EmptyQuery,
}

/// A recognized search key, or the key as given when it is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryField {
    Title,
    Version,
    Company,
    Website,
    Source,
    License,
    Description,
    Maintainer,
    /// Never matches any record.
    Unrecognized(String),
}

impl QueryField {
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key {
            "title" => Self::Title,
            "version" => Self::Version,
            "company" => Self::Company,
            "website" => Self::Website,
            "source" => Self::Source,
            "license" => Self::License,
            "description" => Self::Description,
            "maintainer" => Self::Maintainer,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::Version => "version",
            Self::Company => "company",
            Self::Website => "website",
            Self::Source => "source",
            Self::License => "license",
            Self::Description => "description",
            Self::Maintainer => "maintainer",
            Self::Unrecognized(key) => key,
        }
    }

    /// Evaluate this field's predicate against one record.
    ///
    /// Scalar fields compare for exact equality, `description` is a substring test,
    /// and `maintainer` holds when any maintainer's name or email contains `value`.
    /// All comparisons are case-sensitive.
    #[must_use]
    pub fn matches(&self, record: &AppMetadata, value: &str) -> bool {
        match self {
            Self::Title => record.title == value,
            Self::Version => record.version == value,
            Self::Company => record.company == value,
            Self::Website => record.website == value,
            Self::Source => record.source == value,
            Self::License => record.license == value,
            Self::Description => record.description.contains(value),
            Self::Maintainer => record
                .maintainers
                .iter()
                .any(|person| person.name.contains(value) || person.email.contains(value)),
            Self::Unrecognized(_) => false,
        }
    }
}

impl Display for QueryField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conjunction of per-field predicates, one value per distinct key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<(QueryField, String)>,
}

impl SearchQuery {
    /// Build a query from raw key/value pairs. When a key repeats, only its first
    /// value is kept.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            if seen.insert(key.to_string()) {
                terms.push((QueryField::parse(key), value.into()));
            }
        }
        Self { terms }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&QueryField, &str)> {
        self.terms.iter().map(|(field, value)| (field, value.as_str()))
    }

    #[must_use]
    pub fn matches(&self, record: &AppMetadata) -> bool {
        self.terms.iter().all(|(field, value)| field.matches(record, value))
    }
}

/// Return every record satisfying all of the query's predicates, in input order.
///
/// # Errors
/// Returns [`QueryError::EmptyQuery`] when the query has no terms.
pub fn search<'a>(
    records: &'a [AppMetadata],
    query: &SearchQuery,
) -> Result<Vec<&'a AppMetadata>, QueryError> {
    if query.is_empty() {
        return Err(QueryError::EmptyQuery);
    }
    Ok(records.iter().filter(|record| query.matches(record)).collect())
}
