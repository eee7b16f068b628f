//! The transport seam.
//!
//! The object model only needs "send this request, give me the status and the raw body".
//! [`ReqwestTransport`] does it over HTTP; [`ScriptedTransport`] replays canned responses.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::StatusCode;

use crate::RestError;
use crate::request::RestRequest;

mod http_client;
mod scripted;

pub use self::http_client::ReqwestTransport;
pub use self::scripted::ScriptedTransport;

/// Maximum length of a response body quoted in an error.
const BODY_MAX_LENGTH: usize = 1024;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends requests built by the object model.
///
/// Implementations must not retry and must not time out on their own; whatever the
/// underlying client yields is surfaced unchanged.
pub trait Transport: Debug + Send + Sync + 'static {
    /// Sends `request` and resolves with the raw response.
    ///
    /// Status codes are not interpreted here.
    fn send(&self, request: RestRequest) -> BoxFuture<'_, Result<RawResponse, RestError>>;
}

/// Status and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: StatusCode,
    body: Bytes,
}

impl RawResponse {
    /// Creates a response.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the response, returning its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Whether the body is empty (an acknowledged write).
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Keeps `2xx` responses and `404`s carrying a service error envelope.
    ///
    /// A `404` with an error envelope is a missing resource, mapped later to an object that
    /// does not exist.
    pub(crate) fn check_status(self) -> Result<Self, RestError> {
        if self.status.is_success() || self.is_missing_resource() {
            return Ok(self);
        }

        let text = String::from_utf8_lossy(&self.body);
        let body = if text.len() > BODY_MAX_LENGTH {
            let truncated: String = text.chars().take(BODY_MAX_LENGTH).collect();
            format!("{truncated}... (truncated)")
        } else {
            text.into_owned()
        };
        Err(RestError::UnexpectedStatusCode {
            status_code: self.status.as_u16(),
            body,
        })
    }

    fn is_missing_resource(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
            && serde_json::from_slice::<serde_json::Value>(&self.body)
                .is_ok_and(|value| value.get("error").is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_kept() {
        let response = RawResponse::new(StatusCode::OK, r#"{"d":{}}"#);

        assert!(response.check_status().is_ok());
    }

    #[test]
    fn test_not_found_with_error_envelope_is_kept() {
        let response = RawResponse::new(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":"-2130575322","message":{"value":"List does not exist."}}}"#,
        );

        assert!(response.check_status().is_ok());
    }

    #[test]
    fn test_server_error_is_surfaced() {
        let response = RawResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom");

        let error = response.check_status().expect_err("should fail");

        insta::assert_snapshot!(error, @"Unexpected status code 500: boom");
    }

    #[test]
    fn test_whitespace_body_is_empty() {
        assert!(RawResponse::new(StatusCode::NO_CONTENT, "").is_empty());
        assert!(RawResponse::new(StatusCode::OK, " \r\n").is_empty());
        assert!(!RawResponse::new(StatusCode::OK, "{}").is_empty());
    }
}
