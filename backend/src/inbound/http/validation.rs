//! Shared parsing helpers for inbound HTTP adapters.
//!
//! Path and query values arrive as strings so malformed input produces the
//! API's own error envelope (with a machine-readable `code` in `details`)
//! rather than actix's plain-text extractor errors.

use std::str::FromStr;

use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;

/// Machine-readable validation failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    InvalidUuid,
    InvalidEnum,
    InvalidNumber,
    Blank,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidEnum => "invalid_enum",
            Self::InvalidNumber => "invalid_number",
            Self::Blank => "blank",
        }
    }
}

/// Wire name of the offending field, as the client spelled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ValidationCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        field_error(
            field,
            ValidationCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            value,
        )
    })
}

pub(crate) fn parse_optional_uuid(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Uuid>, Error> {
    value.map(|raw| parse_uuid(raw, field)).transpose()
}

/// Parse an enum from its wire spelling; `expected` lists the accepted values
/// for the error message.
pub(crate) fn parse_enum<T: FromStr>(
    value: &str,
    field: FieldName,
    expected: &str,
) -> Result<T, Error> {
    value.parse().map_err(|_| {
        field_error(
            field,
            ValidationCode::InvalidEnum,
            format!("{} must be one of {expected}", field.as_str()),
            value,
        )
    })
}

pub(crate) fn parse_optional_enum<T: FromStr>(
    value: Option<&str>,
    field: FieldName,
    expected: &str,
) -> Result<Option<T>, Error> {
    value.map(|raw| parse_enum(raw, field, expected)).transpose()
}

pub(crate) fn parse_optional_number<T: FromStr>(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<T>, Error> {
    value
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                field_error(
                    field,
                    ValidationCode::InvalidNumber,
                    format!("{} must be a non-negative integer", field.as_str()),
                    raw,
                )
            })
        })
        .transpose()
}

/// Reject missing or whitespace-only text.
pub(crate) fn require_text(value: Option<String>, field: FieldName) -> Result<String, Error> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        other => Err(field_error(
            field,
            ValidationCode::Blank,
            format!("{} must not be blank", field.as_str()),
            other.as_deref().unwrap_or_default(),
        )),
    }
}
