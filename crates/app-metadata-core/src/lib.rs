//! In-memory registry of application metadata descriptors.
//!
//! Records pass through [`validate`] before they are admitted to a [`Catalog`];
//! [`search`] evaluates a conjunctive multi-field [`SearchQuery`] over a catalog
//! snapshot and returns matches in insertion order.

mod address;
mod catalog;
mod query;
mod validate;

use serde::{Deserialize, Deserializer, Serialize};

pub use address::is_valid_address;
pub use catalog::Catalog;
pub use query::{search, QueryError, QueryField, SearchQuery};
pub use validate::{validate, ValidationError};

/// One registered application's descriptor.
///
/// Missing or `null` keys, and `null` maintainer entries, deserialize to empty values
/// so that incomplete documents are reported by [`validate`] rather than by the
/// decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_entries_as_default")]
    pub maintainers: Vec<Person>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub license: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// A named contact attached to an [`AppMetadata`] record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

impl Person {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into() }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn null_entries_as_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let entries: Vec<Option<T>> = null_as_default(deserializer)?;
    Ok(entries.into_iter().map(Option::unwrap_or_default).collect())
}
