use http::header::{HeaderName, HeaderValue};
use reqwest::{Body, Request};
use tracing::debug;
use url::Url;

use super::{BoxFuture, RawResponse, Transport};
use crate::RestError;
use crate::request::RestRequest;

/// HTTP transport backed by [`reqwest`].
///
/// `DELETE` and `MERGE` requests go over `POST`; the logical verb travels in the
/// `X-HTTP-Method` header set by the object model.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps a configured reqwest client (cookies, authentication, proxies...).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_request(request: &RestRequest) -> Result<Request, RestError> {
        let url = request.url().parse::<Url>()?;
        let mut result = Request::new(request.method(), url);

        let headers = result.headers_mut();
        for (name, value) in request.headers() {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        if let Some(body) = request.body().to_bytes()? {
            *result.body_mut() = Some(Body::from(body));
        }

        Ok(result)
    }

    async fn exchange(&self, request: RestRequest) -> Result<RawResponse, RestError> {
        let request = Self::build_request(&request)?;

        debug!(?request, "sending...");
        let response = self.client.execute(request).await?;
        debug!(?response, "...receiving");

        let status = response.status();
        let body = response.bytes().await?;
        Ok(RawResponse::new(status, body))
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: RestRequest) -> BoxFuture<'_, Result<RawResponse, RestError>> {
        Box::pin(self.exchange(request))
    }
}
