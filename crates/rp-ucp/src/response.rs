//! Mapping of HTTP responses onto [`RemoteError`].

use reqwest::StatusCode;
use serde::Deserialize;

use rp_register::RemoteError;

/// The `error` object of an ARM error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

/// Build the error for a non-success response.
///
/// Uses the ARM error body when it parses, else the status reason and the
/// raw body text.
pub fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    let (code, message) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => (error.code, error.message),
        Err(_) => (String::new(), body.trim().to_string()),
    };
    RemoteError::Status {
        status: status.as_u16(),
        code: if code.is_empty() { reason.replace(' ', "") } else { code },
        message: if message.is_empty() { reason.to_string() } else { message },
    }
}

pub fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|err| RemoteError::Decode(err.to_string()))
}
