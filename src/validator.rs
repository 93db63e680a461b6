use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use rejuvenators_core::AppError;

/// JSON body extractor that also runs `validator` rules. Malformed bodies
/// are rejected with 400, failed rules with 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

/// The first backquoted token after `marker` in a serde message.
fn quoted_after<'a>(message: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &message[message.find(marker)? + marker.len()..];
    let rest = rest.strip_prefix('`')?;
    rest.split('`').next()
}

fn body_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let message = rejection.body_text();
    if let Some(field) = quoted_after(&message, "missing field ") {
        return AppError::bad_request(anyhow!("{} is required", field));
    }
    if let Some(field) = quoted_after(&message, "unknown field ") {
        return AppError::bad_request(anyhow!("{} cannot be set here", field));
    }
    if let Some(value) = quoted_after(&message, "unknown variant ") {
        // serde lists the accepted values after "expected one of".
        let expected = message
            .split("expected one of ")
            .nth(1)
            .and_then(|s| s.split(" at line").next())
            .unwrap_or("a known value");
        return AppError::bad_request(anyhow!(
            "Invalid value `{}`, expected one of {}",
            value,
            expected
        ));
    }
    if message.contains("invalid type") {
        return AppError::bad_request(anyhow!("Invalid field type in request"));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

/// Joins rule messages, falling back to "<field> is invalid". Sorted so the
/// response does not depend on map order.
fn rule_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(body_error)?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                anyhow!("{}", rule_errors(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use rejuvenators_models::{BulkDeleteDto, StatusChangeDto};

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn extract<T: DeserializeOwned + Validate>(body: &str) -> Result<T, AppError> {
        ValidatedJson::<T>::from_request(json_request(body), &())
            .await
            .map(|ValidatedJson(value)| value)
    }

    #[test]
    fn test_quoted_after() {
        let message = "Failed to deserialize: missing field `status` at line 1 column 2";
        assert_eq!(quoted_after(message, "missing field "), Some("status"));
        assert_eq!(quoted_after(message, "unknown field "), None);
    }

    #[tokio::test]
    async fn test_unknown_status_names_the_allowed_values() {
        let err = extract::<StatusChangeDto>(r#"{"status":"pending"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let message = err.error.to_string();
        assert!(message.contains("`pending`"), "{}", message);
        assert!(message.contains("`confirmed`"), "{}", message);
    }

    #[tokio::test]
    async fn test_missing_field_and_rules() {
        let err = extract::<StatusChangeDto>("{}").await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "status is required");

        let err = extract::<BulkDeleteDto>(r#"{"ids":[]}"#).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error.to_string(), "Select at least one booking");
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{}"))
            .unwrap();
        let err = ValidatedJson::<BulkDeleteDto>::from_request(request, &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
