use std::collections::BTreeMap;

use axum::extract::multipart::MultipartError;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde::Serialize;

pub async fn handler404(path: Uri) -> (StatusCode, Json<Error>) {
    (
        StatusCode::NOT_FOUND,
        Json(Error::NotFound {
            message: format!("Invalid path: {}", path),
        }),
    )
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "error")]
pub enum Error {
    NotFound { message: String },
    Validation { errors: BTreeMap<String, Vec<String>> },
    InternalError { kind: &'static str, message: String },
}

impl Error {
    pub fn not_found<S: Into<String>>(msg: S) -> Error {
        Error::NotFound {
            message: msg.into(),
        }
    }

    /// Single-field validation failure, without going through [`Violations`].
    pub fn invalid<S: Into<String>>(field: &str, msg: S) -> Error {
        Error::Validation {
            errors: BTreeMap::from([(field.to_string(), vec![msg.into()])]),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::InternalError {
            kind: "DatabaseError",
            message: err.to_string(),
        }
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        Self::InternalError {
            kind: "UploadError",
            message: err.to_string(),
        }
    }
}

/// Accumulates field-level validation messages so a response can report every
/// failed field at once instead of only the first one.
#[derive(Debug, Default)]
pub struct Violations {
    errors: BTreeMap<String, Vec<String>>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: Into<String>>(&mut self, field: &str, message: S) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Missing or empty required field.
    pub fn require(&mut self, field: &str, value: Option<&str>) {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            _ => self.add(field, format!("The {} field is required", field)),
        }
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, limit: usize) {
        if let Some(v) = value {
            if v.chars().count() > limit {
                self.add(
                    field,
                    format!("The {} field must not exceed {} characters", field, limit),
                );
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Short-circuit with a 422 if anything was recorded.
    pub fn finish(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                errors: self.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_accumulate_per_field() {
        let mut check = Violations::new();
        check.require("name", None);
        check.require("type", Some("   "));
        check.max_len("name", Some("ok"), 255);
        assert!(!check.is_empty());

        match check.finish() {
            Err(Error::Validation { errors }) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors["name"].len(), 1);
                assert_eq!(errors["type"].len(), 1);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn violations_empty_is_ok() {
        let mut check = Violations::new();
        check.require("name", Some("CS101"));
        check.max_len("name", Some("CS101"), 255);
        assert!(check.is_empty());
        assert!(check.finish().is_ok());
    }

    #[test]
    fn max_len_counts_chars() {
        let long = "x".repeat(256);
        let mut check = Violations::new();
        check.max_len("name", Some(&long), 255);
        assert!(check.finish().is_err());
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(Error::not_found("nope").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::invalid("name", "required").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::InternalError {
                kind: "DatabaseError",
                message: "boom".to_string()
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_serializes_with_tag() {
        let json = serde_json::to_value(Error::invalid("name", "required")).unwrap();
        assert_eq!(json["error"], "Validation");
        assert_eq!(json["errors"]["name"][0], "required");
    }
}
