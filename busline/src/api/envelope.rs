//! The `{ message, data }` response envelope.
//!
//! Every endpoint wraps its payload the same way. Unwrapping happens here so
//! the HTTP client and its tests share one set of rules.

use crate::error::ApiError;
use crate::types::{Page, Pagination, Validate};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Unwrap a response body into its `data` payload
///
/// # Errors
///
/// - 401/403: [`ApiError::Unauthenticated`]
/// - other non-2xx: [`ApiError::Backend`] carrying `data.message`, else the
///   top-level `message`, else the status reason
/// - 2xx with a body that is not an envelope: [`ApiError::Decode`]
pub fn into_data(status: StatusCode, body: &[u8]) -> Result<Value, ApiError> {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(ApiError::Unauthenticated);
    }

    let parsed = serde_json::from_slice::<Envelope>(body);

    if !status.is_success() {
        let envelope = parsed.unwrap_or_default();
        let message = envelope
            .data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or(envelope.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map_or_else(|| format!("Request failed with status {}", status.as_u16()), str::to_string)
            });
        return Err(ApiError::Backend {
            status: status.as_u16(),
            message,
        });
    }

    let envelope = parsed.map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(envelope.data.unwrap_or(Value::Null))
}

/// Decode `data[key]`
///
/// # Errors
///
/// [`ApiError::Decode`] if the key is missing or does not match `T`.
pub fn field<T: DeserializeOwned>(data: &Value, key: &str) -> Result<T, ApiError> {
    let value = data
        .get(key)
        .filter(|value| !value.is_null())
        .ok_or_else(|| ApiError::Decode(format!("missing `data.{key}`")))?;
    T::deserialize(value).map_err(|e| ApiError::Decode(format!("`data.{key}`: {e}")))
}

/// Decode `data[key]` and check its contract
///
/// # Errors
///
/// [`ApiError::Decode`] if decoding or validation fails.
pub fn checked_field<T: DeserializeOwned + Validate>(data: &Value, key: &str) -> Result<T, ApiError> {
    let value: T = field(data, key)?;
    value.validate().map_err(ApiError::Decode)?;
    Ok(value)
}

/// Decode a list page stored under `data[key]` with `data.pagination`
///
/// A missing or null list is an empty page.
///
/// # Errors
///
/// [`ApiError::Decode`] if the list or pagination is malformed.
pub fn page<T: DeserializeOwned>(data: &Value, key: &str) -> Result<Page<T>, ApiError> {
    let items = match data.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => Vec::<T>::deserialize(value)
            .map_err(|e| ApiError::Decode(format!("`data.{key}`: {e}")))?,
    };
    let pagination = match data.get("pagination") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            Pagination::deserialize(value)
                .map_err(|e| ApiError::Decode(format!("`data.pagination`: {e}")))?,
        ),
    };
    Ok(Page { items, pagination })
}

/// [`page`] followed by a contract check of every item
///
/// # Errors
///
/// [`ApiError::Decode`] if decoding or validation fails.
pub fn checked_page<T: DeserializeOwned + Validate>(data: &Value, key: &str) -> Result<Page<T>, ApiError> {
    let page: Page<T> = page(data, key)?;
    page.items.validate().map_err(ApiError::Decode)?;
    Ok(page)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn success_returns_data() {
        let data = into_data(
            StatusCode::OK,
            &body(&json!({ "message": "ok", "data": { "token": "t" } })),
        )
        .unwrap();
        assert_eq!(field::<String>(&data, "token").unwrap(), "t");
    }

    #[test]
    fn error_message_prefers_data_message() {
        let error = into_data(
            StatusCode::BAD_REQUEST,
            &body(&json!({ "message": "outer", "data": { "message": "Seat already taken" } })),
        )
        .unwrap_err();
        assert_eq!(
            error,
            ApiError::Backend {
                status: 400,
                message: "Seat already taken".to_string()
            }
        );
    }

    #[test]
    fn error_message_falls_back_to_top_level_then_reason() {
        let error = into_data(StatusCode::CONFLICT, &body(&json!({ "message": "outer" }))).unwrap_err();
        assert_eq!(error.to_string(), "outer");

        let error = into_data(StatusCode::BAD_GATEWAY, b"<html>").unwrap_err();
        assert_eq!(error.to_string(), "Bad Gateway");
    }

    #[test]
    fn unauthorized_and_forbidden_require_login() {
        assert_eq!(into_data(StatusCode::UNAUTHORIZED, b"{}"), Err(ApiError::Unauthenticated));
        assert_eq!(into_data(StatusCode::FORBIDDEN, b""), Err(ApiError::Unauthenticated));
    }

    #[test]
    fn success_with_garbage_body_is_decode_error() {
        assert!(matches!(
            into_data(StatusCode::OK, b"not json"),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn missing_list_is_empty_page() {
        let page: Page<String> = page(&json!({}), "trips").unwrap();
        assert!(page.items.is_empty());
        assert!(page.pagination.is_none());
    }

    #[test]
    fn missing_field_is_decode_error() {
        assert!(matches!(
            field::<String>(&json!({}), "booking"),
            Err(ApiError::Decode(_))
        ));
    }
}
