//! # Spom Core
//!
//! An object model over the `/_api/` REST endpoints of a content-management platform
//! (webs, lists, items, files, users, social feed, search...).
//!
//! Responses are mapped onto objects whose operations are synthesised from the response
//! metadata: the type of a resource selects, in a static registry, the operations it
//! supports. Calling an operation builds the next request (URL, verb, body, headers) and
//! maps its response the same way.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spom_core::{Client, args};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), spom_core::RestError> {
//! let client = Client::builder()
//!     .with_web_url("https://contoso.example.com/sites/dev")
//!     .with_request_digest("0x1234,01 Jan 2025 00:00:00 -0000")
//!     .build()?;
//!
//! // Navigations are lazy: nothing is requested until awaited
//! let web = client.web(None)?.await?;
//! let tasks = web.navigate("getListByTitle", args!["Tasks"])?.await?;
//! if !tasks.exists() {
//!     return Ok(());
//! }
//!
//! // Writes run immediately
//! tasks.invoke("update", args![{ "Description": "Team tasks" }]).await?;
//!
//! let item = tasks.navigate("getItemById", args![5])?.await?;
//! println!("{:?}", item.property("Title"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Results and lookups
//!
//! A collection maps to an object carrying results, each a fully synthesised object.
//! `getById` and `getByTitle` search them without a round trip. A title filter matching
//! exactly one element collapses onto that element, so both views stay available:
//!
//! ```rust,no_run
//! # use spom_core::{Client, args};
//! # async fn example(client: Client) -> Result<(), spom_core::RestError> {
//! let tasks = client.list("Tasks", None)?.await?;
//! let same = tasks.invoke("getByTitle", args!["Tasks"]).await?.into_resource()?;
//! assert_eq!(tasks.key(), same.key());
//! # Ok(())
//! # }
//! ```
//!
//! ## Execution modes
//!
//! [`Client`] operations return futures. [`blocking::Client`] (built with
//! [`ClientBuilder::build_blocking`]) runs every operation to completion on the caller's
//! stack.
//!
//! ## Testing
//!
//! [`ScriptedTransport`] replays canned responses and records the requests it was given,
//! so code built on this crate can be tested without a server.

mod builder;
mod client;
mod context;
mod envelope;
mod error;
mod mapper;
mod object;
mod permissions;
mod request;
mod resource;
mod session;
mod synth;
mod transport;

pub mod blocking;
pub mod registry;

pub use self::builder::ClientBuilder;
pub use self::client::Client;
pub use self::context::{HOST_URL_KEY, HostContext, SecureString, query_string_value};
pub use self::envelope::Envelope;
pub use self::error::RestError;
pub use self::object::{
    DEFERRED_ACCESSOR_PREFIX, DeferredLink, GENERIC_OPERATIONS, MappedObject, Metadata,
    RESULT_LOOKUPS, Results,
};
pub use self::permissions::{BasePermissions, PermissionKind};
pub use self::request::{
    Descriptor, ExecutionMode, HttpVerb, ODATA_VERBOSE, RequestBody, RequestTemplate,
    RestRequest, encode_uri_component,
};
pub use self::resource::{Args, GetCall, Pending, PostCall, PropertyUpdate, Reply, Resource};
pub use self::synth::{FIELD_KEY, LIST_ITEM_KEY, normalize_type_key, registry_key};
pub use self::transport::{BoxFuture, RawResponse, ReqwestTransport, ScriptedTransport, Transport};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}

/// Builds [`Args`] from JSON-like values.
///
/// Each argument is one token tree handed to [`serde_json::json!`]: literals, variables,
/// or braced objects and bracketed arrays. Wrap other expressions in parentheses.
///
/// # Examples
///
/// ```rust
/// use spom_core::args;
///
/// let title = "Tasks";
/// let args = args![title, 5, { "Title": "Done" }, ["a", "b"]];
///
/// assert_eq!(args.text(0), Some("Tasks"));
/// assert_eq!(args.get(1).and_then(|id| id.as_i64()), Some(5));
/// assert_eq!(args.len(), 4);
///
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:tt),* $(,)?) => {
        $crate::Args::from(::std::vec![$($crate::__private::json!($arg)),*])
    };
}
