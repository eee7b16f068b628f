//! Blocking facade.
//!
//! Mirrors the asynchronous API; each operation runs to completion on the caller's stack
//! using a current-thread runtime owned by the [`Client`]. Build one with
//! [`ClientBuilder::build_blocking`](crate::ClientBuilder::build_blocking).
//!
//! The facade cannot be used from inside an async runtime: building it there fails with
//! [`RestError::UnsupportedEnvironment`], and so does any operation called from one.
//!
//! ```rust,no_run
//! use spom_core::{Client, args};
//!
//! # fn example() -> Result<(), spom_core::RestError> {
//! let client = Client::builder()
//!     .with_web_url("https://contoso.example.com/sites/dev")
//!     .build_blocking()?;
//!
//! let web = client.web(None)?.load()?;
//! let tasks = web.navigate("getListByTitle", args!["Tasks"])?.load()?;
//! println!("{:?}", tasks.property("ItemCount"));
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tokio::runtime::{Builder, Handle, Runtime};

use crate::RestError;
use crate::context::HostContext;
use crate::object::MappedObject;
use crate::request::{Descriptor, HttpVerb};
use crate::resource::{self, Args, GetCall, PostCall, PropertyUpdate};

fn unsupported(message: &str) -> RestError {
    RestError::UnsupportedEnvironment {
        message: message.to_string(),
    }
}

/// The runtime shared by a blocking client and every object derived from it.
#[derive(Debug, Clone)]
struct Driver(Arc<Runtime>);

impl Driver {
    fn new() -> Result<Self, RestError> {
        if Handle::try_current().is_ok() {
            return Err(unsupported(
                "the blocking client cannot be built inside an async runtime",
            ));
        }
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| unsupported(&err.to_string()))?;
        Ok(Self(Arc::new(runtime)))
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output, RestError> {
        if Handle::try_current().is_ok() {
            return Err(unsupported(
                "blocking operations cannot run inside an async runtime",
            ));
        }
        Ok(self.0.block_on(future))
    }
}

/// Blocking counterpart of [`crate::Client`].
#[derive(Debug, Clone)]
pub struct Client {
    inner: crate::Client,
    driver: Driver,
}

impl Client {
    pub(crate) fn new(inner: crate::Client) -> Result<Self, RestError> {
        Ok(Self {
            inner,
            driver: Driver::new()?,
        })
    }

    /// The host context.
    pub fn context(&self) -> &HostContext {
        self.inner.context()
    }

    fn wrap(&self, pending: resource::Pending) -> Pending {
        Pending {
            inner: pending,
            driver: self.driver.clone(),
        }
    }

    /// See [`crate::Client::resource`].
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `url` cannot be resolved.
    pub fn resource(&self, url: &str, endpoint: &str) -> Result<Pending, RestError> {
        self.inner.resource(url, endpoint).map(|pending| self.wrap(pending))
    }

    /// See [`crate::Client::web`].
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn web(&self, host: Option<&str>) -> Result<Pending, RestError> {
        self.inner.web(host).map(|pending| self.wrap(pending))
    }

    /// See [`crate::Client::site`].
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn site(&self, host: Option<&str>) -> Result<Pending, RestError> {
        self.inner.site(host).map(|pending| self.wrap(pending))
    }

    /// See [`crate::Client::list`].
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn list(&self, title: &str, host: Option<&str>) -> Result<Pending, RestError> {
        self.inner.list(title, host).map(|pending| self.wrap(pending))
    }

    /// See [`crate::Client::people_manager`].
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn people_manager(&self, host: Option<&str>) -> Result<Pending, RestError> {
        self.inner.people_manager(host).map(|pending| self.wrap(pending))
    }

    /// See [`crate::Client::profile_loader`].
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn profile_loader(&self, host: Option<&str>) -> Result<Pending, RestError> {
        self.inner.profile_loader(host).map(|pending| self.wrap(pending))
    }

    /// See [`crate::Client::search`].
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn search(&self, host: Option<&str>) -> Result<Pending, RestError> {
        self.inner.search(host).map(|pending| self.wrap(pending))
    }

    /// See [`crate::Client::social_feed`].
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn social_feed(&self, host: Option<&str>) -> Result<Pending, RestError> {
        self.inner.social_feed(host).map(|pending| self.wrap(pending))
    }

    /// See [`crate::Client::current_user_email_addresses`].
    pub fn current_user_email_addresses(&self) -> Pending {
        self.wrap(self.inner.current_user_email_addresses())
    }
}

/// Blocking counterpart of [`crate::Pending`].
#[derive(Debug, Clone)]
#[must_use = "a pending resource does nothing until loaded"]
pub struct Pending {
    inner: resource::Pending,
    driver: Driver,
}

impl Pending {
    /// The descriptor of the resource to load.
    pub fn descriptor(&self) -> &Descriptor {
        self.inner.descriptor()
    }

    /// The verb of the initial request.
    pub fn verb(&self) -> HttpVerb {
        self.inner.verb()
    }

    /// Absolute URL that will be requested.
    pub fn request_url(&self) -> String {
        self.inner.request_url()
    }

    /// Requests and maps the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, or if called inside an async runtime.
    pub fn load(self) -> Result<Resource, RestError> {
        let Self { inner, driver } = self;
        let resource = driver.block_on(inner.load())??;
        Ok(Resource { inner: resource, driver })
    }
}

/// Blocking counterpart of [`crate::Reply`].
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
    fn new(reply: resource::Reply, driver: &Driver) -> Self {
        let driver = driver.clone();
        match reply {
            resource::Reply::Pending(inner) => Self::Pending(Pending { inner, driver }),
            resource::Reply::Resolved(inner) => Self::Resolved(Resource { inner, driver }),
            resource::Reply::Value(value) => Self::Value(value),
            resource::Reply::Buffer(bytes) => Self::Buffer(bytes),
            resource::Reply::Empty => Self::Empty,
            resource::Reply::Absent => Self::Absent,
        }
    }

    /// Loads a pending navigation, or returns the resolved resource as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply carries no resource.
    pub fn load(self) -> Result<Resource, RestError> {
        match self {
            Self::Pending(pending) => pending.load(),
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

/// Blocking counterpart of [`crate::Resource`].
///
/// Dereferences to the [`MappedObject`] it wraps.
#[derive(Debug, Clone)]
pub struct Resource {
    inner: resource::Resource,
    driver: Driver,
}

impl Deref for Resource {
    type Target = MappedObject;

    fn deref(&self) -> &Self::Target {
        self.inner.object()
    }
}

impl Resource {
    /// The asynchronous resource.
    pub fn as_async(&self) -> &resource::Resource {
        &self.inner
    }

    fn derive(&self, inner: resource::Resource) -> Self {
        Self {
            inner,
            driver: self.driver.clone(),
        }
    }

    /// The `n`-th result.
    pub fn result(&self, idx: usize) -> Option<Resource> {
        self.inner.result(idx).map(|inner| self.derive(inner))
    }

    /// First result whose `Id` matches.
    pub fn find_by_id(&self, id: &Value) -> Option<Resource> {
        self.inner.find_by_id(id).map(|inner| self.derive(inner))
    }

    /// First result whose title matches.
    pub fn find_by_title(&self, title: &Value) -> Option<Resource> {
        self.inner.find_by_title(title).map(|inner| self.derive(inner))
    }

    /// See [`crate::Resource::invoke`].
    ///
    /// # Errors
    ///
    /// Returns the error of the operation, or
    /// [`RestError::UnsupportedEnvironment`] inside an async runtime.
    pub fn invoke(&self, name: &str, args: impl Into<Args>) -> Result<Reply, RestError> {
        let reply = self.driver.block_on(self.inner.invoke(name, args))??;
        Ok(Reply::new(reply, &self.driver))
    }

    /// See [`crate::Resource::navigate`].
    ///
    /// # Errors
    ///
    /// Returns [`RestError::NotNavigable`] or [`RestError::UnknownOperation`].
    pub fn navigate(&self, name: &str, args: impl Into<Args>) -> Result<Pending, RestError> {
        let inner = self.inner.navigate(name, args)?;
        Ok(Pending {
            inner,
            driver: self.driver.clone(),
        })
    }

    /// See [`crate::Resource::execute_get`].
    ///
    /// # Errors
    ///
    /// Returns an error if an immediate request fails.
    pub fn execute_get(&self, call: GetCall) -> Result<Reply, RestError> {
        let reply = self.driver.block_on(self.inner.execute_get(call))??;
        Ok(Reply::new(reply, &self.driver))
    }

    /// See [`crate::Resource::execute_post`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn execute_post(&self, call: PostCall) -> Result<Reply, RestError> {
        let reply = self.driver.block_on(self.inner.execute_post(call))??;
        Ok(Reply::new(reply, &self.driver))
    }

    /// See [`crate::Resource::refresh`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn refresh(&mut self) -> Result<(), RestError> {
        self.driver.block_on(self.inner.refresh())?
    }

    /// See [`crate::Resource::set_property`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn set_property(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<PropertyUpdate, RestError> {
        self.driver.block_on(self.inner.set_property(name, value))?
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ScriptedTransport;
    use crate::request::ExecutionMode;

    fn client(transport: &Arc<ScriptedTransport>) -> Client {
        crate::Client::builder()
            .with_web_url("https://contoso.example.com/sites/dev")
            .with_transport(Arc::clone(transport))
            .build_blocking()
            .expect("should build blocking client")
    }

    #[test]
    fn test_blocking_web_and_navigation() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond_json(&json!({
                "d": { "__metadata": { "type": "SP.Web" }, "Title": "Dev" }
            }))
            .respond_json(&json!({
                "d": { "results": [{
                    "__metadata": {
                        "type": "SP.List",
                        "uri": "https://contoso.example.com/sites/dev/_api/Web/Lists(guid'1')"
                    },
                    "Title": "Tasks"
                }] }
            }));
        let client = client(&transport);

        let web = client.web(None).expect("web").load().expect("loaded web");
        let tasks = web
            .navigate("getListByTitle", crate::args!["Tasks"])
            .expect("navigation")
            .load()
            .expect("loaded list");

        assert_eq!(web.property("Title"), Some(&json!("Dev")));
        assert_eq!(web.descriptor().mode(), ExecutionMode::Blocking);
        assert_eq!(tasks.metadata_type(), Some("SP.List"));
        assert_eq!(tasks.descriptor().endpoint(), "Web/Lists(guid'1')");
    }

    #[test]
    fn test_blocking_set_property() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond_json(&json!({
                "d": { "__metadata": { "type": "SP.Web" }, "Title": "Dev" }
            }))
            .respond_empty();
        let client = client(&transport);

        let mut web = client.web(None).expect("web").load().expect("loaded web");
        let update = web.set_property("Title", "Team").expect("update");

        assert_eq!(update, PropertyUpdate::Applied);
        assert_eq!(web.property("Title"), Some(&json!("Team")));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_blocking_client_inside_runtime_is_unsupported() {
        let result = crate::Client::builder()
            .with_web_url("https://contoso.example.com/sites/dev")
            .with_transport(Arc::new(ScriptedTransport::new()))
            .build_blocking();

        assert!(matches!(
            result,
            Err(RestError::UnsupportedEnvironment { .. })
        ));
    }
}
