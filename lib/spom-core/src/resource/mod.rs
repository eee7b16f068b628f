//! Resource objects and their generic operations.
//!
//! A [`Resource`] is a mapped response bound to the client it came from. Its operations
//! come from three places:
//!
//! - the registry entries installed for its key, called by name with [`Resource::invoke`]
//!   or, when they only name the next hop, [`Resource::navigate`];
//! - `getById` / `getByTitle` on objects carrying results;
//! - a `get_<Name>` accessor per deferred property.
//!
//! The generic operations ([`execute_get`](Resource::execute_get),
//! [`execute_post`](Resource::execute_post), [`refresh`](Resource::refresh),
//! [`set_property`](Resource::set_property)) are always available.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::debug;

use crate::RestError;
use crate::context::HostContext;
use crate::envelope::Envelope;
use crate::mapper;
use crate::object::{DEFERRED_ACCESSOR_PREFIX, DeferredLink, MappedObject, RESULT_LOOKUPS, loosely_equal};
use crate::registry::quirks;
use crate::request::method::{format_method_name, method_request, navigation_endpoint};
use crate::request::{HttpVerb, RequestBody, RestRequest};
use crate::session::Session;

mod calls;
pub(crate) mod dispatch;
mod pending;


pub use self::calls::{Args, GetCall, PostCall};
pub use self::pending::Pending;

/// Outcome of an operation.
#[derive(Debug, Clone)]
pub enum Reply {
    /// The next hop of a navigation, not requested yet.
    Pending(Pending),
    /// A mapped response.
    Resolved(Resource),
    /// A JSON body that is not a response envelope.
    Value(Value),
    /// Raw bytes of a buffer response.
    Buffer(Bytes),
    /// An acknowledged write (empty body).
    Empty,
    /// A result lookup that matched nothing.
    Absent,
}

impl Reply {
    /// The pending navigation.
    ///
    /// # Errors
    ///
    /// Returns an error for any other kind of reply.
    pub fn into_pending(self) -> Result<Pending, RestError> {
        match self {
            Self::Pending(pending) => Ok(pending),
            _ => Err(RestError::UnexpectedReply { expected: "a pending navigation" }),
        }
    }

    /// The resolved resource.
    ///
    /// # Errors
    ///
    /// Returns an error for any other kind of reply.
    pub fn into_resource(self) -> Result<Resource, RestError> {
        match self {
            Self::Resolved(resource) => Ok(resource),
            _ => Err(RestError::UnexpectedReply { expected: "a resource" }),
        }
    }

    /// Loads a pending navigation, or returns the resolved resource as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply carries no resource.
    pub async fn load(self) -> Result<Resource, RestError> {
        match self {
            Self::Pending(pending) => pending.load().await,
            Self::Resolved(resource) => Ok(resource),
            _ => Err(RestError::UnexpectedReply { expected: "a resource" }),
        }
    }

    /// The plain JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error for any other kind of reply.
    pub fn into_value(self) -> Result<Value, RestError> {
        match self {
            Self::Value(value) => Ok(value),
            _ => Err(RestError::UnexpectedReply { expected: "a value" }),
        }
    }

    /// The raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error for any other kind of reply.
    pub fn into_bytes(self) -> Result<Bytes, RestError> {
        match self {
            Self::Buffer(bytes) => Ok(bytes),
            _ => Err(RestError::UnexpectedReply { expected: "a buffer" }),
        }
    }

    /// Whether the reply is an acknowledged write.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether a lookup matched nothing.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Outcome of [`Resource::set_property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyUpdate {
    /// The server acknowledged the write; the local value was updated.
    Applied,
    /// The property already had this value; nothing was sent.
    Unchanged,
    /// The server answered with a body; the local value was kept.
    Rejected,
}

/// A mapped resource bound to its client.
///
/// Dereferences to the [`MappedObject`] it wraps (properties, metadata, results...).
#[derive(Debug, Clone, derive_more::Deref)]
pub struct Resource {
    session: Arc<Session>,
    #[deref]
    object: MappedObject,
}

impl Resource {
    pub(crate) fn new(session: Arc<Session>, object: MappedObject) -> Self {
        Self { session, object }
    }

    /// The mapped object.
    pub fn object(&self) -> &MappedObject {
        &self.object
    }

    /// Consumes the resource, returning the mapped object.
    pub fn into_object(self) -> MappedObject {
        self.object
    }

    /// The host context of the client this resource comes from.
    pub fn context(&self) -> &HostContext {
        self.session.context()
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The `n`-th result, bound to the same client.
    pub fn result(&self, idx: usize) -> Option<Resource> {
        let object = self.object.results().get(idx).copied()?.clone();
        Some(self.derive(object))
    }

    /// Every result, bound to the same client.
    pub fn result_resources(&self) -> Vec<Resource> {
        self.object
            .results()
            .into_iter()
            .map(|object| self.derive(object.clone()))
            .collect()
    }

    /// First result whose `Id` matches, bound to the same client.
    pub fn find_by_id(&self, id: &Value) -> Option<Resource> {
        self.object
            .get_by_id(id)
            .map(|object| self.derive(object.clone()))
    }

    /// First result whose title matches, bound to the same client.
    pub fn find_by_title(&self, title: &Value) -> Option<Resource> {
        self.object
            .get_by_title(title)
            .map(|object| self.derive(object.clone()))
    }

    fn derive(&self, object: MappedObject) -> Self {
        Self::new(Arc::clone(&self.session), object)
    }

    /// Calls the operation `name`.
    ///
    /// Lookups resolve without a round trip; lazy navigations return
    /// [`Reply::Pending`].
    ///
    /// # Errors
    ///
    /// Returns [`RestError::UnknownOperation`] if nothing named `name` is callable on this
    /// object, or the error of the operation itself.
    pub async fn invoke(&self, name: &str, args: impl Into<Args>) -> Result<Reply, RestError> {
        let args = args.into();

        if self.has_results() && RESULT_LOOKUPS.contains(&name) {
            let value = args.get(0).cloned().unwrap_or_default();
            let found = if name == "getById" {
                self.find_by_id(&value)
            } else {
                self.find_by_title(&value)
            };
            return Ok(found.map_or(Reply::Absent, Reply::Resolved));
        }

        if let Some(spec) = self.object.operation(name) {
            return dispatch::dispatch(self, spec, args).await;
        }

        if let Some(link) = self.deferred_link(name) {
            return Ok(Reply::Pending(self.follow(link)));
        }

        Err(self.unknown(name))
    }

    /// Names the next hop of a lazy operation without requesting it.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::NotNavigable`] for operations that run immediately and
    /// [`RestError::UnknownOperation`] for unknown names.
    pub fn navigate(&self, name: &str, args: impl Into<Args>) -> Result<Pending, RestError> {
        if let Some(spec) = self.object.operation(name) {
            if !spec.is_lazy() {
                return Err(RestError::NotNavigable {
                    name: name.to_string(),
                });
            }
            return match dispatch::prepare(self, spec, args.into())? {
                dispatch::Call::Get(call) => Ok(self.navigation(call)),
                dispatch::Call::Post(_) => Err(RestError::NotNavigable {
                    name: name.to_string(),
                }),
            };
        }

        if let Some(link) = self.deferred_link(name) {
            return Ok(self.follow(link));
        }

        Err(self.unknown(name))
    }

    fn deferred_link(&self, name: &str) -> Option<&DeferredLink> {
        name.strip_prefix(DEFERRED_ACCESSOR_PREFIX)
            .and_then(|property| self.deferred().get(property))
    }

    pub(crate) fn follow(&self, link: &DeferredLink) -> Pending {
        let descriptor = self
            .session
            .descriptor(link.base_url(), link.endpoint(), self.descriptor().mode());
        Pending::new(Arc::clone(&self.session), descriptor)
    }

    /// The target of a deferred property, or `fallback` relative to this object when the
    /// property was not returned.
    pub(crate) fn linked(&self, property: &str, fallback: &str) -> Pending {
        match self.deferred().get(property) {
            Some(link) => self.follow(link),
            None => self.navigation(GetCall::method(fallback)),
        }
    }

    fn unknown(&self, name: &str) -> RestError {
        RestError::UnknownOperation {
            name: name.to_string(),
            key: self.key().to_string(),
        }
    }

    fn alias(&self) -> &'static str {
        quirks::parameter_alias(self.metadata_type())
    }

    /// The next hop of a plain `GET`: `endpoint(.suffix)?(/name)?`.
    pub(crate) fn navigation(&self, call: GetCall) -> Pending {
        let name = call.name.as_deref().map(|name| {
            format_method_name(name, call.arg.as_ref(), call.data.as_ref(), self.alias())
        });
        let endpoint =
            navigation_endpoint(self.descriptor().endpoint(), name.as_deref(), call.suffix.as_deref());
        let descriptor = self.session.descriptor(
            self.descriptor().base_url(),
            endpoint,
            self.descriptor().mode(),
        );
        Pending::new(Arc::clone(&self.session), descriptor)
    }

    /// Issues a `GET`.
    ///
    /// Plain calls resolve lazily to [`Reply::Pending`]. Calls sending their data in the
    /// body run immediately and map the response; buffer calls return
    /// [`Reply::Buffer`].
    ///
    /// # Errors
    ///
    /// Returns an error if an immediate request fails.
    pub async fn execute_get(&self, call: GetCall) -> Result<Reply, RestError> {
        if !call.in_body && !call.buffer {
            return Ok(Reply::Pending(self.navigation(call)));
        }

        let descriptor = self.descriptor().with_suffix(call.suffix.as_deref());
        let body = if call.in_body {
            RequestBody::from_data(call.data)
        } else {
            RequestBody::Empty
        };
        let request = method_request(
            &descriptor,
            HttpVerb::Get,
            call.metadata_type.as_deref(),
            call.name.as_deref(),
            body,
            call.buffer,
        );

        let response = self.session.send(request).await?;
        if call.buffer {
            return Ok(Reply::Buffer(response.into_body()));
        }
        self.session.reply(&descriptor, &response)
    }

    /// Issues a write and maps its response.
    ///
    /// The path argument is always rendered into the method name. Unless sent in the
    /// body, data is rendered there too as a parameter alias. `DELETE` and `MERGE` force-overwrite with `IF-MATCH: *`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn execute_post(&self, call: PostCall) -> Result<Reply, RestError> {
        let descriptor = self.descriptor().with_suffix(call.suffix.as_deref());
        let data_in_body = call.in_body || call.content.is_some();

        let alias_data = if data_in_body || call.arg.is_some() {
            None
        } else {
            call.data.as_ref()
        };
        let name = call.name.as_deref().map(|name| {
            format_method_name(name, call.arg.as_ref(), alias_data, self.alias())
        });

        let body = match (call.content, alias_data.is_some()) {
            (Some(content), _) => RequestBody::Binary(content),
            (None, true) => RequestBody::Empty,
            (None, false) => RequestBody::from_data(call.data),
        };
        let request = method_request(
            &descriptor,
            call.verb,
            call.metadata_type.as_deref(),
            name.as_deref(),
            body,
            false,
        );

        let response = self.session.send(request).await?;
        self.session.reply(&descriptor, &response)
    }

    /// Re-issues the request this object came from and re-maps it in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn refresh(&mut self) -> Result<(), RestError> {
        let source = self.object.source.clone();
        let request = RestRequest::new(source.verb, source.url.clone());
        let response = self.session.send(request).await?;
        let envelope = Envelope::parse(response.body())?;

        self.object = mapper::map(source.descriptor.clone(), source, &envelope);
        debug!(key = self.key(), exists = self.exists(), "resource refreshed");
        Ok(())
    }

    /// Updates a single property with a `MERGE` stamped with the object's type.
    ///
    /// Nothing is sent when the property already holds a loosely equal value. The local
    /// value changes only once the server acknowledged the write with an empty body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn set_property(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<PropertyUpdate, RestError> {
        let value = value.into();
        if self
            .property(name)
            .is_some_and(|current| !current.is_null() && loosely_equal(current, &value))
        {
            return Ok(PropertyUpdate::Unchanged);
        }

        let mut data = Map::new();
        data.insert(name.to_string(), value.clone());
        let request = method_request(
            self.descriptor(),
            HttpVerb::Merge,
            self.metadata_type(),
            None,
            RequestBody::Json(Value::Object(data)),
            false,
        );

        let response = self.session.send(request).await?;
        if !response.is_empty() {
            debug!(property = name, "update rejected");
            return Ok(PropertyUpdate::Rejected);
        }

        self.object.properties.insert(name.to_string(), value);
        Ok(PropertyUpdate::Applied)
    }
}
