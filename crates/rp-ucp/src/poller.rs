//! Long-running operation status.
//!
//! An upsert that is accepted asynchronously points at an operation resource
//! through the `Azure-AsyncOperation` or `Location` header. Polling that URL
//! yields `202 Accepted` while the operation runs, and a body with a `status`
//! field once the server reports progress.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, LOCATION};
use serde::Deserialize;

use rp_register::RemoteError;

use crate::response::{ErrorDetail, decode};

pub const ASYNC_OPERATION: HeaderName = HeaderName::from_static("azure-asyncoperation");

/// Where an operation stands after one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    InProgress(String),
    Succeeded,
    Failed { status: String, message: String },
}

#[derive(Debug, Default, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

/// The operation URL announced by an upsert response, if any.
///
/// `Location` only counts for `201`/`202`, since a plain `200` may carry it
/// for unrelated reasons.
pub fn operation_url(status: StatusCode, headers: &HeaderMap, base: &reqwest::Url) -> Option<reqwest::Url> {
    let header = headers.get(ASYNC_OPERATION).or_else(|| {
        matches!(status, StatusCode::CREATED | StatusCode::ACCEPTED)
            .then(|| headers.get(LOCATION))
            .flatten()
    })?;
    base.join(header.to_str().ok()?).ok()
}

/// Classify one successful poll response.
pub fn classify(status: StatusCode, body: &str) -> Result<PollState, RemoteError> {
    if status == StatusCode::ACCEPTED {
        return Ok(PollState::InProgress("Accepted".to_string()));
    }
    if body.trim().is_empty() {
        return Ok(PollState::Succeeded);
    }
    let operation: OperationStatus = decode(body)?;
    let Some(state) = operation.status else {
        return Ok(PollState::Succeeded);
    };
    if state.eq_ignore_ascii_case("Succeeded") {
        Ok(PollState::Succeeded)
    } else if ["Failed", "Canceled", "Cancelled"]
        .iter()
        .any(|terminal| state.eq_ignore_ascii_case(terminal))
    {
        let message = operation
            .error
            .map(|error| error.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "no error details".to_string());
        Ok(PollState::Failed { status: state, message })
    } else {
        Ok(PollState::InProgress(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;

    fn base() -> reqwest::Url {
        reqwest::Url::parse("http://localhost:9000/apis/x?api-version=1").unwrap()
    }

    #[test]
    fn test_async_operation_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(ASYNC_OPERATION, HeaderValue::from_static("http://ops/1"));
        headers.insert(LOCATION, HeaderValue::from_static("http://ops/2"));
        let url = operation_url(StatusCode::OK, &headers, &base()).unwrap();
        assert_eq!(url.as_str(), "http://ops/1");
    }

    #[test]
    fn test_location_needs_accepted_or_created() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/operations/7"));
        assert_eq!(operation_url(StatusCode::OK, &headers, &base()), None);
        let url = operation_url(StatusCode::ACCEPTED, &headers, &base()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/operations/7");
    }

    #[test]
    fn test_classify_states() {
        assert_eq!(
            classify(StatusCode::ACCEPTED, "").unwrap(),
            PollState::InProgress("Accepted".into())
        );
        assert_eq!(classify(StatusCode::OK, "").unwrap(), PollState::Succeeded);
        assert_eq!(
            classify(StatusCode::OK, r#"{"status":"succeeded"}"#).unwrap(),
            PollState::Succeeded
        );
        assert_eq!(
            classify(StatusCode::OK, r#"{"status":"Updating"}"#).unwrap(),
            PollState::InProgress("Updating".into())
        );
        assert_eq!(
            classify(
                StatusCode::OK,
                r#"{"status":"Failed","error":{"code":"Internal","message":"disk full"}}"#
            )
            .unwrap(),
            PollState::Failed {
                status: "Failed".into(),
                message: "disk full".into(),
            }
        );
        assert_eq!(
            classify(StatusCode::OK, r#"{"status":"Canceled"}"#).unwrap(),
            PollState::Failed {
                status: "Canceled".into(),
                message: "no error details".into(),
            }
        );
    }
}
