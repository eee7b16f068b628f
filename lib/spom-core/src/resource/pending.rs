use std::future::IntoFuture;
use std::sync::Arc;

use super::Resource;
use crate::RestError;
use crate::request::{Descriptor, HttpVerb};
use crate::session::Session;
use crate::transport::BoxFuture;

/// An unresolved object: the next hop is known, nothing was requested yet.
///
/// Awaiting it (or calling [`load`](Self::load)) issues the request and maps the response.
///
/// ```rust,no_run
/// # use spom_core::{Client, Resource, RestError, args};
/// # async fn example(client: Client) -> Result<(), RestError> {
/// let web = client.web(None)?.await?;
/// let lists = web.navigate("getListByTitle", args!["Tasks"])?;
/// println!("about to request {}", lists.request_url());
/// let list: Resource = lists.await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
#[must_use = "a pending resource does nothing until awaited"]
pub struct Pending {
    session: Arc<Session>,
    descriptor: Descriptor,
    verb: HttpVerb,
}

impl Pending {
    pub(crate) fn new(session: Arc<Session>, descriptor: Descriptor) -> Self {
        Self {
            session,
            descriptor,
            verb: HttpVerb::Get,
        }
    }

    pub(crate) fn with_verb(mut self, verb: HttpVerb) -> Self {
        self.verb = verb;
        self
    }

    /// The descriptor of the resource to load.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The verb of the initial request.
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// Absolute URL that will be requested.
    pub fn request_url(&self) -> String {
        self.descriptor.request_url()
    }

    /// Requests and maps the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails, the status is not accepted or the body is
    /// not JSON. A missing resource is not an error, see [`MappedObject::exists`](crate::MappedObject::exists).
    pub async fn load(self) -> Result<Resource, RestError> {
        self.session.fetch(self.descriptor, self.verb).await
    }
}

impl IntoFuture for Pending {
    type Output = Result<Resource, RestError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.load())
    }
}
