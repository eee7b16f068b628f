//! Request descriptors and the URL/request builder.
//!
//! A [`Descriptor`] identifies a remote resource (target web, endpoint, request template,
//! execution mode). The builder functions in [`method`] turn a descriptor plus a method
//! name and call arguments into a fully-qualified [`RestRequest`].

use std::fmt;

use bytes::Bytes;
use http::Method;
use indexmap::IndexMap;
use serde_json::Value;

use crate::RestError;
use crate::context::HostContext;

pub(crate) mod method;
pub use self::method::encode_uri_component;

/// Media type used for both `Accept` and `Content-Type` on JSON requests.
pub const ODATA_VERBOSE: &str = "application/json;odata=verbose";

const APP_CONTEXT_SEGMENT: &str = "SP.AppContextSite(@target)/";

/// Whether operations of an object complete asynchronously or block the caller.
///
/// Fixed when the [`Client`](crate::Client) is built and inherited by every object derived
/// from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum ExecutionMode {
    /// Operations return futures.
    #[default]
    #[display("asynchronous")]
    Asynchronous,
    /// Operations run to completion on the caller's stack (see [`crate::blocking`]).
    #[display("blocking")]
    Blocking,
}

impl ExecutionMode {
    /// Returns `true` for [`ExecutionMode::Asynchronous`].
    pub fn is_async(self) -> bool {
        matches!(self, Self::Asynchronous)
    }
}

/// Logical HTTP verb of an operation.
///
/// `DELETE` and `MERGE` travel as `POST` with an `X-HTTP-Method` override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, derive_more::Display)]
pub enum HttpVerb {
    /// Read.
    #[default]
    #[display("GET")]
    Get,
    /// Action or creation.
    #[display("POST")]
    Post,
    /// Deletion.
    #[display("DELETE")]
    Delete,
    /// Partial update.
    #[display("MERGE")]
    Merge,
}

impl HttpVerb {
    /// The method actually put on the wire.
    pub fn wire_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post | Self::Delete | Self::Merge => Method::POST,
        }
    }

    /// Writes that force-overwrite with `IF-MATCH: *`.
    pub fn requires_if_match(self) -> bool {
        matches!(self, Self::Delete | Self::Merge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetSeparator {
    First,
    Subsequent,
}

impl TargetSeparator {
    fn for_endpoint(endpoint: &str) -> Self {
        if endpoint.find('?').is_some_and(|idx| idx > 0) {
            Self::Subsequent
        } else {
            Self::First
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::First => '?',
            Self::Subsequent => '&',
        }
    }
}

/// Template rendering an endpoint into an absolute request URL.
///
/// Displays as `<root>/_api/{{EndPoint}}`, or in app-context mode as
/// `<appWeb>/_api/SP.AppContextSite(@target)/{{EndPoint}}?@target='{{Url}}'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    api_root: String,
    app_context: Option<TargetSeparator>,
}

impl RequestTemplate {
    pub(crate) fn new(context: &HostContext, target_url: &str, endpoint: &str) -> Self {
        if context.is_app_web() {
            Self {
                api_root: format!("{}/_api/", context.web_absolute_url()),
                app_context: Some(TargetSeparator::for_endpoint(endpoint)),
            }
        } else {
            Self {
                api_root: format!("{target_url}/_api/"),
                app_context: None,
            }
        }
    }

    /// Whether requests are proxied through the app web.
    pub fn is_app_context(&self) -> bool {
        self.app_context.is_some()
    }

    /// Substitutes the endpoint and target URL.
    pub fn render(&self, endpoint: &str, target_url: &str) -> String {
        match self.app_context {
            None => format!("{}{endpoint}", self.api_root),
            Some(separator) => format!(
                "{}{APP_CONTEXT_SEGMENT}{endpoint}{}@target='{target_url}'",
                self.api_root,
                separator.as_char()
            ),
        }
    }

    /// Rewrites `&@target` into `?@target` once the endpoint lost its query string.
    pub(crate) fn use_first_target_separator(&mut self) {
        if let Some(separator) = self.app_context.as_mut() {
            *separator = TargetSeparator::First;
        }
    }

    /// Picks the `@target` separator matching the query string of `endpoint`.
    pub(crate) fn align_target_separator(&mut self, endpoint: &str) {
        if let Some(separator) = self.app_context.as_mut() {
            *separator = TargetSeparator::for_endpoint(endpoint);
        }
    }
}

impl fmt::Display for RequestTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("{{EndPoint}}", "{{Url}}"))
    }
}

/// Identifies a remote resource instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub(crate) base_url: String,
    pub(crate) endpoint: String,
    pub(crate) template: RequestTemplate,
    pub(crate) mode: ExecutionMode,
}

impl Descriptor {
    pub(crate) fn new(
        context: &HostContext,
        base_url: impl Into<String>,
        endpoint: impl Into<String>,
        mode: ExecutionMode,
    ) -> Self {
        let base_url = base_url.into();
        let endpoint = endpoint.into();
        let template = RequestTemplate::new(context, &base_url, &endpoint);
        Self {
            base_url,
            endpoint,
            template,
            mode,
        }
    }

    /// Absolute URL of the target web.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Relative API path, possibly with a query fragment.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The request template.
    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// The execution mode inherited by derived objects.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Absolute URL requesting this resource.
    pub fn request_url(&self) -> String {
        self.template.render(&self.endpoint, &self.base_url)
    }

    /// Whether the endpoint is a filter query (`?$filter` after the path).
    pub fn is_filter_query(&self) -> bool {
        self.endpoint
            .find(method::FILTER_MARKER)
            .is_some_and(|idx| idx > 0)
    }

    pub(crate) fn with_suffix(&self, suffix: Option<&str>) -> Self {
        let mut result = self.clone();
        if let Some(suffix) = suffix {
            result.endpoint = format!("{}.{suffix}", result.endpoint);
        }
        result
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON document.
    Json(Value),
    /// Raw bytes, sent as-is (file content).
    Binary(Bytes),
}

impl RequestBody {
    /// Builds a body from an optional call-time data argument.
    pub fn from_data(data: Option<Value>) -> Self {
        match data {
            None | Some(Value::Null) => Self::Empty,
            Some(value) => Self::Json(value),
        }
    }

    /// Returns the JSON document, if any.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Empty | Self::Binary(_) => None,
        }
    }

    /// Serializes the body for the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON document cannot be serialized.
    pub fn to_bytes(&self) -> Result<Option<Bytes>, RestError> {
        let result = match self {
            Self::Empty => None,
            Self::Json(value) => Some(Bytes::from(serde_json::to_vec(value)?)),
            Self::Binary(bytes) => Some(bytes.clone()),
        };
        Ok(result)
    }

    fn stamp_metadata_type(&mut self, metadata_type: &str) {
        if let Self::Json(Value::Object(map)) = self {
            map.insert(
                "__metadata".to_string(),
                serde_json::json!({ "type": metadata_type }),
            );
        }
    }
}

/// A fully-qualified request: verb, absolute URL, body and headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub(crate) verb: HttpVerb,
    pub(crate) url: String,
    pub(crate) body: RequestBody,
    pub(crate) headers: IndexMap<String, String>,
    pub(crate) buffer: bool,
}

impl RestRequest {
    pub(crate) fn get(url: impl Into<String>) -> Self {
        Self::new(HttpVerb::Get, url)
    }

    pub(crate) fn new(verb: HttpVerb, url: impl Into<String>) -> Self {
        Self {
            verb,
            url: url.into(),
            body: RequestBody::Empty,
            headers: IndexMap::new(),
            buffer: false,
        }
    }

    /// The logical verb.
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// The method put on the wire (`GET` or `POST`).
    pub fn method(&self) -> Method {
        self.verb.wire_method()
    }

    /// The absolute URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The body.
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Headers, standard ones first once [applied](Self::with_standard_headers).
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Looks a header up by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether a binary response is requested.
    pub fn is_buffer(&self) -> bool {
        self.buffer
    }

    /// Adds the JSON content headers, the verb override and the request digest.
    ///
    /// Buffer requests only ask for a binary response and keep their headers untouched.
    pub(crate) fn with_standard_headers(mut self, request_digest: Option<&str>) -> Self {
        if self.buffer {
            return self;
        }

        let mut headers = IndexMap::new();
        headers.insert("Accept".to_string(), ODATA_VERBOSE.to_string());
        headers.insert("Content-Type".to_string(), ODATA_VERBOSE.to_string());
        headers.insert("X-HTTP-Method".to_string(), self.verb.to_string());
        if let Some(digest) = request_digest {
            headers.insert("X-RequestDigest".to_string(), digest.to_string());
        }
        headers.extend(self.headers);
        self.headers = headers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(is_app_web: bool) -> HostContext {
        HostContext {
            web_absolute_url: "https://app.example.net/sites/dev/MyApp".to_string(),
            site_absolute_url: "https://contoso.example.com/sites/dev".to_string(),
            is_app_web,
            page_url: None,
            request_digest: None,
        }
    }

    #[test]
    fn test_template_renders_plain_endpoint() {
        let template = RequestTemplate::new(&context(false), "https://contoso.example.com", "web");

        assert_eq!(
            template.render("web/lists", "https://contoso.example.com"),
            "https://contoso.example.com/_api/web/lists"
        );
        assert_eq!(
            template.to_string(),
            "https://contoso.example.com/_api/{{EndPoint}}"
        );
    }

    #[test]
    fn test_template_renders_app_context() {
        let template = RequestTemplate::new(
            &context(true),
            "https://contoso.example.com/sites/dev",
            "web/lists?$filter=Title eq 'Tasks'",
        );

        insta::assert_snapshot!(template, @"https://app.example.net/sites/dev/MyApp/_api/SP.AppContextSite(@target)/{{EndPoint}}&@target='{{Url}}'");
    }

    #[test]
    fn test_template_target_separator_fix_up() {
        let mut template = RequestTemplate::new(
            &context(true),
            "https://contoso.example.com/sites/dev",
            "web/lists?$filter=Title eq 'Tasks'",
        );

        template.use_first_target_separator();

        assert_eq!(
            template.render("web/lists(1)", "https://contoso.example.com/sites/dev"),
            "https://app.example.net/sites/dev/MyApp/_api/SP.AppContextSite(@target)/web/lists(1)?@target='https://contoso.example.com/sites/dev'"
        );
    }

    #[test]
    fn test_descriptor_filter_query_detection() {
        let context = context(false);
        let filtered = Descriptor::new(
            &context,
            "https://contoso.example.com",
            "web/lists?$filter=Title eq 'Tasks'",
            ExecutionMode::Asynchronous,
        );
        let plain = Descriptor::new(
            &context,
            "https://contoso.example.com",
            "web/lists",
            ExecutionMode::Asynchronous,
        );

        assert!(filtered.is_filter_query());
        assert!(!plain.is_filter_query());
    }

    #[test]
    fn test_standard_headers_are_first() {
        let mut request = RestRequest::new(HttpVerb::Merge, "https://contoso.example.com/_api/web");
        request.headers.insert("IF-MATCH".to_string(), "*".to_string());

        let request = request.with_standard_headers(Some("0xDIGEST"));

        let names: Vec<_> = request.headers().keys().map(String::as_str).collect();
        assert_eq!(
            names,
            ["Accept", "Content-Type", "X-HTTP-Method", "X-RequestDigest", "IF-MATCH"]
        );
        assert_eq!(request.header("x-http-method"), Some("MERGE"));
        assert_eq!(request.method(), Method::POST);
    }

    #[test]
    fn test_buffer_request_has_no_json_headers() {
        let mut request = RestRequest::get("https://contoso.example.com/_api/web/file/openBinaryStream");
        request.buffer = true;

        let request = request.with_standard_headers(Some("0xDIGEST"));

        assert!(request.headers().is_empty());
    }
}
