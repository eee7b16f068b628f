use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::RestError;
use crate::context::HostContext;
use crate::envelope::Envelope;
use crate::mapper::{self, uri_endpoint};
use crate::object::SourceRequest;
use crate::request::{Descriptor, ExecutionMode, HttpVerb, RestRequest};
use crate::resource::{Reply, Resource};
use crate::transport::{RawResponse, Transport};

/// State shared by every object derived from one client: the host context and the
/// transport.
#[derive(Debug)]
pub(crate) struct Session {
    context: HostContext,
    transport: Arc<dyn Transport>,
}

impl Session {
    pub(crate) fn new(context: HostContext, transport: Arc<dyn Transport>) -> Self {
        Self { context, transport }
    }

    pub(crate) fn context(&self) -> &HostContext {
        &self.context
    }

    /// A descriptor with a template freshly built for `endpoint`.
    pub(crate) fn descriptor(
        &self,
        base_url: impl Into<String>,
        endpoint: impl Into<String>,
        mode: ExecutionMode,
    ) -> Descriptor {
        Descriptor::new(&self.context, base_url, endpoint, mode)
    }

    /// Sends `request` with the standard headers; only accepted statuses come back.
    pub(crate) async fn send(&self, request: RestRequest) -> Result<RawResponse, RestError> {
        let request = request.with_standard_headers(self.context.request_digest());
        let response = self.transport.send(request).await?;
        response.check_status()
    }

    /// Requests `descriptor` and maps the response onto it.
    pub(crate) async fn fetch(
        self: &Arc<Self>,
        descriptor: Descriptor,
        verb: HttpVerb,
    ) -> Result<Resource, RestError> {
        let source = SourceRequest::new(verb, &descriptor);
        let response = self.send(RestRequest::new(verb, source.url.clone())).await?;
        let envelope = Envelope::parse(response.body())?;

        let object = mapper::map(descriptor, source, &envelope);
        debug!(key = object.key(), exists = object.exists(), "resource mapped");
        Ok(Resource::new(Arc::clone(self), object))
    }

    /// Interprets the response of an executed method issued from `descriptor`.
    ///
    /// An acknowledged write has an empty body. A payload carrying `__metadata.uri` is
    /// anchored there, any other payload on `descriptor`. Bodies that are not envelopes are
    /// handed back as plain JSON.
    pub(crate) fn reply(
        self: &Arc<Self>,
        descriptor: &Descriptor,
        response: &RawResponse,
    ) -> Result<Reply, RestError> {
        if response.is_empty() {
            return Ok(Reply::Empty);
        }

        let value: Value = serde_json::from_slice(response.body())?;
        if value.get("d").is_none() && value.get("error").is_none() {
            return Ok(Reply::Value(value));
        }

        let envelope = Envelope::from_value(value);
        let uri = envelope
            .payload()
            .and_then(|payload| payload.get("__metadata"))
            .and_then(|metadata| metadata.get("uri"))
            .and_then(Value::as_str);
        let anchor = match uri {
            Some(uri) => self.descriptor(
                descriptor.base_url(),
                uri_endpoint(uri, descriptor.endpoint()),
                descriptor.mode(),
            ),
            None => descriptor.clone(),
        };

        let source = SourceRequest::new(HttpVerb::Get, &anchor);
        let object = mapper::map(anchor, source, &envelope);
        debug!(key = object.key(), "reply mapped");
        Ok(Reply::Resolved(Resource::new(Arc::clone(self), object)))
    }
}
