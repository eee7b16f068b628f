use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::{BoxFuture, RawResponse, Transport};
use crate::RestError;
use crate::request::RestRequest;

/// In-memory transport replaying scripted responses in order.
///
/// Every request is recorded and can be inspected afterwards. Sending with no response
/// left fails with [`RestError::TransportFailure`].
///
/// ```rust
/// use std::sync::Arc;
///
/// use serde_json::json;
/// use spom_core::{Client, ScriptedTransport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), spom_core::RestError> {
/// let transport = Arc::new(ScriptedTransport::new());
/// transport.respond_json(&json!({
///     "d": { "__metadata": { "type": "SP.Web" }, "Title": "Dev" }
/// }));
///
/// let client = Client::builder()
///     .with_web_url("https://contoso.example.com/sites/dev")
///     .with_transport(Arc::clone(&transport))
///     .build()?;
/// let web = client.web(None)?.await?;
///
/// assert_eq!(web.property("Title").and_then(|title| title.as_str()), Some("Dev"));
/// assert_eq!(
///     transport.requests()[0].url(),
///     "https://contoso.example.com/sites/dev/_api/web"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<RestRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedTransport {
    /// Creates a transport with no scripted response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn respond(&self, status: StatusCode, body: impl Into<Bytes>) -> &Self {
        lock(&self.responses).push_back(RawResponse::new(status, body));
        self
    }

    /// Queues a `200 OK` JSON response.
    pub fn respond_json(&self, body: &Value) -> &Self {
        self.respond(StatusCode::OK, body.to_string())
    }

    /// Queues a `204 No Content` response.
    pub fn respond_empty(&self) -> &Self {
        self.respond(StatusCode::NO_CONTENT, Bytes::new())
    }

    /// Requests sent so far, in order.
    pub fn requests(&self) -> Vec<RestRequest> {
        lock(&self.requests).clone()
    }

    /// The last request sent.
    pub fn last_request(&self) -> Option<RestRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Number of responses not consumed yet.
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: RestRequest) -> BoxFuture<'_, Result<RawResponse, RestError>> {
        Box::pin(async move {
            debug!(?request, "sending...");
            let url = request.url().to_string();
            lock(&self.requests).push(request);

            let response = lock(&self.responses).pop_front();
            debug!(?response, "...receiving");
            response.ok_or_else(|| RestError::TransportFailure {
                message: format!("no scripted response left for {url}"),
            })
        })
    }
}
