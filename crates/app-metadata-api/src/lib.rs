use std::sync::Arc;

use serde::Deserialize;

use app_metadata_core::{
    search, validate, AppMetadata, Catalog, QueryError, SearchQuery, ValidationError,
};

/// Every failure an ingest or search call can surface. The display strings are the
/// reasons reported to clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("error parsing request body")]
    Parse(#[source] serde_yaml::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("error encoding response")]
    Serialization(#[source] serde_json::Error),
}

impl ApiError {
    /// `true` for errors caused by the request itself; `false` for server faults.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Serialization(_))
    }
}

/// Ingest and search operations over one shared in-memory catalog.
///
/// Cloning is cheap; clones share the same catalog.
#[derive(Debug, Clone, Default)]
pub struct AppMetadataApi {
    catalog: Arc<Catalog>,
}

impl AppMetadataApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_catalog(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.catalog.len()
    }

    /// Decode, validate and store one YAML metadata document.
    ///
    /// Nothing is stored unless every check passes.
    ///
    /// # Errors
    /// Returns [`ApiError::Parse`] when the document cannot be decoded and
    /// [`ApiError::Validation`] when the decoded record is incomplete or carries a
    /// malformed maintainer email.
    pub fn ingest(&self, raw: &[u8]) -> Result<(), ApiError> {
        let record = decode_document(raw).inspect_err(|err| {
            tracing::warn!(error = ?err, "rejected metadata document");
        })?;
        validate(&record).inspect_err(|err| {
            tracing::warn!(title = %record.title, reason = %err, "rejected metadata record");
        })?;

        tracing::info!(
            title = %record.title,
            version = %record.version,
            "registered application metadata"
        );
        self.catalog.append(record);
        Ok(())
    }

    /// Run a conjunctive search built from raw query pairs; repeated keys keep their
    /// first value.
    ///
    /// # Errors
    /// Returns [`ApiError::Query`] when no pairs are given.
    pub fn search<I, K, V>(&self, pairs: I) -> Result<Vec<AppMetadata>, ApiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let query = SearchQuery::from_pairs(pairs);
        let snapshot = self.catalog.snapshot();
        let found = search(&snapshot, &query)?;

        tracing::info!(
            terms = query.len(),
            matches = found.len(),
            catalog = snapshot.len(),
            "search completed"
        );
        Ok(found.into_iter().cloned().collect())
    }
}

/// Decode a YAML document into a metadata candidate without validating it.
///
/// Only the first document of a multi-document stream is read. An empty or `null`
/// document decodes to an empty record, leaving completeness to the validator.
///
/// # Errors
/// Returns [`ApiError::Parse`] when the input is not a YAML mapping of the expected
/// shape.
pub fn decode_document(raw: &[u8]) -> Result<AppMetadata, ApiError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(AppMetadata::default());
    }
    let Some(document) = serde_yaml::Deserializer::from_slice(raw).next() else {
        return Ok(AppMetadata::default());
    };
    Option::<AppMetadata>::deserialize(document)
        .map(Option::unwrap_or_default)
        .map_err(ApiError::Parse)
}

/// Encode search results as a JSON array of records.
///
/// # Errors
/// Returns [`ApiError::Serialization`] when encoding fails.
pub fn encode_results(results: &[AppMetadata]) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(results).map_err(|err| {
        tracing::error!(error = %err, "failed to encode search results");
        ApiError::Serialization(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_metadata_core::Person;

    const APP_ONE: &str = "\
title: Test App 1
version: 0.0.1
maintainers:
  - name: John Doe
    email: johndoe@example.com
company: Test Company Inc.
website: https://testcompany.com
source: https://github.com/testcompany/testapp
license: MIT
description: This is a test app.
";

    const APP_TWO: &str = "\
title: Test App 2
version: 0.0.2
maintainers:
  - name: Jane Doe
    email: janedoe@example.com
company: Test Company Inc.
website: https://testcompany.com
source: https://github.com/testcompany/testapp
license: MIT
description: |
  This is a second test app.
  It spans two lines.
";

    fn ingest_ok(api: &AppMetadataApi, document: &str) {
        if let Err(err) = api.ingest(document.as_bytes()) {
            panic!("ingest failed: {err}");
        }
    }

    fn search_ok(api: &AppMetadataApi, pairs: &[(&str, &str)]) -> Vec<AppMetadata> {
        match api.search(pairs.iter().copied()) {
            Ok(found) => found,
            Err(err) => panic!("search failed: {err}"),
        }
    }

    fn titles(records: &[AppMetadata]) -> Vec<&str> {
        records.iter().map(|record| record.title.as_str()).collect()
    }

    #[test]
    fn ingested_records_are_searchable_in_insertion_order() {
        let api = AppMetadataApi::new();
        ingest_ok(&api, APP_ONE);
        ingest_ok(&api, APP_TWO);

        assert_eq!(titles(&search_ok(&api, &[("title", "Test App 1")])), vec!["Test App 1"]);
        assert_eq!(
            titles(&search_ok(&api, &[("company", "Test Company Inc.")])),
            vec!["Test App 1", "Test App 2"]
        );
    }

    #[test]
    fn ingested_record_is_returned_unmodified() {
        let api = AppMetadataApi::new();
        ingest_ok(&api, APP_TWO);

        let found = search_ok(&api, &[("maintainer", "Jane")]);
        let expected = AppMetadata {
            title: "Test App 2".to_string(),
            version: "0.0.2".to_string(),
            maintainers: vec![Person::new("Jane Doe", "janedoe@example.com")],
            company: "Test Company Inc.".to_string(),
            website: "https://testcompany.com".to_string(),
            source: "https://github.com/testcompany/testapp".to_string(),
            license: "MIT".to_string(),
            description: "This is a second test app.\nIt spans two lines.\n".to_string(),
        };
        assert_eq!(found, vec![expected]);
    }

    #[test]
    fn missing_version_is_reported_as_missing_fields() {
        let api = AppMetadataApi::new();
        let document = APP_ONE.replace("version: 0.0.1\n", "");
        let result = api.ingest(document.as_bytes());
        assert!(matches!(result, Err(ApiError::Validation(ValidationError::MissingFields))));
        assert_eq!(api.record_count(), 0);
    }

    #[test]
    fn null_values_are_reported_as_missing_fields() {
        let api = AppMetadataApi::new();
        for document in [
            APP_ONE.replace("license: MIT", "license: ~"),
            APP_ONE.replace("email: johndoe@example.com", "email:"),
            APP_ONE.replace(
                "maintainers:\n  - name: John Doe\n    email: johndoe@example.com\n",
                "maintainers:\n",
            ),
        ] {
            let result = api.ingest(document.as_bytes());
            assert!(
                matches!(result, Err(ApiError::Validation(ValidationError::MissingFields))),
                "unexpected result {result:?} for document:\n{document}"
            );
        }
        assert_eq!(api.record_count(), 0);
    }

    #[test]
    fn empty_document_is_reported_as_missing_fields() {
        let api = AppMetadataApi::new();
        let result = api.ingest(b"  \n");
        assert!(matches!(result, Err(ApiError::Validation(ValidationError::MissingFields))));
    }

    #[test]
    fn malformed_email_is_rejected_and_not_stored() {
        let api = AppMetadataApi::new();
        let document = APP_ONE.replace("johndoe@example.com", "apptwohotmail.com");
        let result = api.ingest(document.as_bytes());
        assert!(matches!(result, Err(ApiError::Validation(ValidationError::InvalidEmail))));
        assert_eq!(api.record_count(), 0);
        match result {
            Err(err) => assert_eq!(err.to_string(), "Invalid Email Address"),
            Ok(()) => panic!("expected rejection"),
        }
    }

    #[test]
    fn unparseable_documents_are_parse_errors() {
        let api = AppMetadataApi::new();
        let documents = [
            "title: [unterminated",
            "just a scalar\n",
            "maintainers: John Doe\n",
            "- Test App 1\n- 0.0.1\n",
        ];
        for document in documents {
            let result = api.ingest(document.as_bytes());
            match result {
                Err(err @ ApiError::Parse(_)) => {
                    assert_eq!(err.to_string(), "error parsing request body");
                    assert!(err.is_client_error());
                }
                other => panic!("expected parse error for {document:?}, got {other:?}"),
            }
        }
        assert_eq!(api.record_count(), 0);
    }

    #[test]
    fn only_the_first_yaml_document_is_read() {
        let api = AppMetadataApi::new();
        let document = format!("{APP_ONE}---\ntitle: Test App 2\n");
        ingest_ok(&api, &document);

        let found = search_ok(&api, &[("company", "Test Company Inc.")]);
        assert_eq!(titles(&found), vec!["Test App 1"]);
    }

    #[test]
    fn null_maintainer_entry_is_reported_as_missing_fields() {
        let api = AppMetadataApi::new();
        let document = APP_ONE.replace(
            "maintainers:\n  - name: John Doe\n    email: johndoe@example.com\n",
            "maintainers:\n  - ~\n",
        );
        let result = api.ingest(document.as_bytes());
        assert!(
            matches!(result, Err(ApiError::Validation(ValidationError::MissingFields))),
            "unexpected result {result:?}"
        );
        assert_eq!(api.record_count(), 0);
    }

    #[test]
    fn numeric_scalars_decode_as_text() {
        let api = AppMetadataApi::new();
        let document = APP_ONE.replace("version: 0.0.1", "version: 1");
        ingest_ok(&api, &document);

        let found = search_ok(&api, &[("version", "1")]);
        assert_eq!(titles(&found), vec!["Test App 1"]);
    }

    #[test]
    fn unknown_document_keys_are_ignored() {
        let api = AppMetadataApi::new();
        let document = format!("{APP_ONE}homepage: https://ignored.example.com\n");
        ingest_ok(&api, &document);
        assert_eq!(api.record_count(), 1);
    }

    #[test]
    fn empty_search_is_a_client_error() {
        let api = AppMetadataApi::new();
        ingest_ok(&api, APP_ONE);
        match api.search(Vec::<(String, String)>::new()) {
            Err(err @ ApiError::Query(QueryError::EmptyQuery)) => {
                assert_eq!(err.to_string(), "search query is empty");
                assert!(err.is_client_error());
            }
            other => panic!("expected empty query error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_documents_are_stored_separately() {
        let api = AppMetadataApi::new();
        ingest_ok(&api, APP_ONE);
        ingest_ok(&api, APP_ONE);
        assert_eq!(search_ok(&api, &[("title", "Test App 1")]).len(), 2);
    }

    #[test]
    fn clones_share_one_catalog() {
        let api = AppMetadataApi::new();
        let clone = api.clone();
        ingest_ok(&clone, APP_ONE);
        assert_eq!(api.record_count(), 1);
    }

    #[test]
    fn encoded_results_use_lowercase_keys_in_record_order() {
        let record = match decode_document(APP_ONE.as_bytes()) {
            Ok(record) => record,
            Err(err) => panic!("decode failed: {err}"),
        };
        let bytes = match encode_results(&[record]) {
            Ok(bytes) => bytes,
            Err(err) => panic!("encode failed: {err}"),
        };
        let body = String::from_utf8_lossy(&bytes);
        assert_eq!(
            body,
            concat!(
                r#"[{"title":"Test App 1","version":"0.0.1","#,
                r#""maintainers":[{"name":"John Doe","email":"johndoe@example.com"}],"#,
                r#""company":"Test Company Inc.","website":"https://testcompany.com","#,
                r#""source":"https://github.com/testcompany/testapp","license":"MIT","#,
                r#""description":"This is a test app."}]"#
            )
        );
    }

    #[test]
    fn no_results_encode_as_empty_array() {
        match encode_results(&[]) {
            Ok(bytes) => assert_eq!(bytes, b"[]"),
            Err(err) => panic!("encode failed: {err}"),
        }
    }
}
