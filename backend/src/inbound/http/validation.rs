//! Shared validation helpers for inbound HTTP adapters.

use std::fmt::Display;

use pagination::{PageQuery, PageRequest, PageRequestError};
use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::auth::CredentialsValidationError;

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }
}

/// `invalid_request` with `{field, code}` details.
pub(crate) fn field_error(field: FieldName, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.0,
        "code": code,
    }))
}

/// Domain validation failures without a single field.
pub(crate) fn invalid_payload(err: impl Display) -> Error {
    Error::invalid_request(err.to_string())
}

pub(crate) fn credentials_error(err: &CredentialsValidationError) -> Error {
    field_error(FieldName::new(err.field()), err.code(), err.to_string())
}

/// Build a page request from raw query values.
pub(crate) fn page_request(page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::from_query(PageQuery { page, limit }).map_err(|err| {
        let field = match err {
            PageRequestError::PageOutOfRange => FieldName::new("page"),
            PageRequestError::LimitOutOfRange { .. } => FieldName::new("limit"),
        };
        field_error(field, "out_of_range", err.to_string())
    })
}

/// Parse an optional reference leniently: blank or malformed ids are
/// treated as absent.
pub(crate) fn lenient_uuid(value: Option<&str>) -> Option<Uuid> {
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

/// Parse an optional query filter strictly.
pub(crate) fn optional_uuid(value: Option<&str>, field: FieldName) -> Result<Option<Uuid>, Error> {
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            Uuid::parse_str(raw).map_err(|_| {
                field_error(field, "invalid_uuid", format!("{} must be a valid UUID", field.0))
            })
        })
        .transpose()
}
