use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use super::{Descriptor, HttpVerb, RequestBody, RestRequest};

/// Method-name prefix marking an absolute endpoint override.
pub(crate) const API_ESCAPE: &str = "_api/";

/// Marker of a filter query inside an endpoint.
pub(crate) const FILTER_MARKER: &str = "?$filter";

/// Characters escaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a value the way URI components are escaped in request paths.
///
/// ```rust
/// use spom_core::encode_uri_component;
///
/// assert_eq!(encode_uri_component("Q&A list"), "Q%26A%20list");
/// assert_eq!(encode_uri_component("it's (new)"), "it's%20(new)");
/// ```
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

fn encode_if(value: &str, encode: bool) -> Cow<'_, str> {
    if encode {
        Cow::Owned(encode_uri_component(value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Adds call syntax to a method name.
///
/// A path argument becomes `name(value)`; otherwise data becomes a parameter alias,
/// `name(@v)?@v=<value>` (`alias` names the parameter, e.g. `item=@v`). `null` counts as
/// absent.
pub(crate) fn format_method_name(
    name: &str,
    path_arg: Option<&Value>,
    data: Option<&Value>,
    alias: &str,
) -> String {
    let encode = name.find(FILTER_MARKER).is_some_and(|idx| idx > 0);

    if let Some(arg) = path_arg.filter(|arg| !arg.is_null()) {
        return format!("{name}({})", render_argument(arg, encode));
    }

    if let Some(data) = data.filter(|data| !data.is_null()) {
        let value = match data {
            Value::String(text) => format!("'{}'", encode_uri_component(text)),
            other => other.to_string(),
        };
        return format!("{name}({alias})?@v={value}");
    }

    name.to_string()
}

fn render_argument(arg: &Value, encode: bool) -> String {
    match arg {
        Value::String(text) => format!("'{}'", encode_if(text, encode)),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| render_pair(key, value, encode))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, value)| render_pair(&idx.to_string(), value, encode))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(_) | Value::Number(_) | Value::Null => arg.to_string(),
    }
}

fn render_pair(key: &str, value: &Value, encode: bool) -> String {
    let value = match value {
        Value::String(text) => format!("'{text}'"),
        other => other.to_string(),
    };
    format!("{key}={}", encode_if(&value, encode))
}

/// Endpoint of a lazy navigation: `endpoint(.suffix)?(/name)?`.
pub(crate) fn navigation_endpoint(endpoint: &str, name: Option<&str>, suffix: Option<&str>) -> String {
    let mut result = endpoint.to_string();
    if let Some(suffix) = suffix {
        result.push('.');
        result.push_str(suffix);
    }
    if let Some(name) = name.filter(|name| !name.is_empty()) {
        result.push('/');
        result.push_str(name);
    }
    result
}

/// Endpoint of an executed method.
///
/// The method is inserted before the query string of `endpoint`. A name starting with
/// `_api/` replaces the endpoint.
pub(crate) fn method_endpoint(endpoint: &str, name: Option<&str>) -> String {
    if let Some(endpoint) = name.and_then(|name| name.strip_prefix(API_ESCAPE)) {
        return endpoint.to_string();
    }

    let (path, query) = match endpoint.find('?') {
        Some(idx) if idx > 0 => endpoint.split_at(idx),
        _ => (endpoint, ""),
    };

    match name.filter(|name| !name.is_empty()) {
        Some(name) => format!("{path}/{name}{query}"),
        None => format!("{path}{query}"),
    }
}

/// Builds the request executing a method on `descriptor`.
///
/// `metadata_type` is stamped into a JSON object body as `__metadata.type`. `DELETE` and
/// `MERGE` always carry `IF-MATCH: *`. Buffer requests are `GET`s without body.
pub(crate) fn method_request(
    descriptor: &Descriptor,
    verb: HttpVerb,
    metadata_type: Option<&str>,
    name: Option<&str>,
    mut body: RequestBody,
    buffer: bool,
) -> RestRequest {
    let endpoint = method_endpoint(&descriptor.endpoint, name);
    let url = descriptor.template.render(&endpoint, &descriptor.base_url);

    if buffer {
        let mut request = RestRequest::get(url);
        request.buffer = true;
        return request;
    }

    if let Some(metadata_type) = metadata_type {
        body.stamp_metadata_type(metadata_type);
    }

    let mut request = RestRequest::new(verb, url);
    request.body = body;
    if verb.requires_if_match() {
        request
            .headers
            .insert("IF-MATCH".to_string(), "*".to_string());
    }
    request
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::HostContext;
    use crate::request::ExecutionMode;

    fn descriptor(endpoint: &str) -> Descriptor {
        let context = HostContext {
            web_absolute_url: "https://contoso.example.com/sites/dev".to_string(),
            site_absolute_url: "https://contoso.example.com/sites/dev".to_string(),
            ..HostContext::default()
        };
        Descriptor::new(
            &context,
            "https://contoso.example.com/sites/dev",
            endpoint,
            ExecutionMode::Asynchronous,
        )
    }

    #[test]
    fn test_format_method_name_with_scalars() {
        assert_eq!(format_method_name("getById", Some(&json!(5)), None, "@v"), "getById(5)");
        assert_eq!(
            format_method_name("getByTitle", Some(&json!("My List")), None, "@v"),
            "getByTitle('My List')"
        );
        assert_eq!(
            format_method_name("setShowInNewForm", Some(&json!(false)), None, "@v"),
            "setShowInNewForm(false)"
        );
    }

    #[test]
    fn test_format_method_name_encodes_filtered_argument() {
        let name = format_method_name("items?$filter=Id", Some(&json!("a b")), None, "@v");

        assert_eq!(name, "items?$filter=Id('a%20b')");
    }

    #[test]
    fn test_format_method_name_with_object_argument() {
        let name = format_method_name(
            "copyTo",
            Some(&json!({ "strNewUrl": "/sites/dev/Docs/b.txt", "bOverWrite": true })),
            None,
            "@v",
        );

        insta::assert_snapshot!(name, @"copyTo(strNewUrl='/sites/dev/Docs/b.txt', bOverWrite=true)");
    }

    #[test]
    fn test_format_method_name_with_parameter_alias() {
        let string = format_method_name(
            "getUserEffectivePermissions",
            None,
            Some(&json!("i:0#.f|membership|jane@contoso.example.com")),
            "@v",
        );
        let object = format_method_name("actor", None, Some(&json!({ "AccountName": "jane" })), "item=@v");

        insta::assert_snapshot!(string, @"getUserEffectivePermissions(@v)?@v='i%3A0%23.f%7Cmembership%7Cjane%40contoso.example.com'");
        insta::assert_snapshot!(object, @r#"actor(item=@v)?@v={"AccountName":"jane"}"#);
    }

    #[test]
    fn test_format_method_name_ignores_null_arguments() {
        let name = format_method_name("getChanges", Some(&Value::Null), Some(&Value::Null), "@v");

        assert_eq!(name, "getChanges");
    }

    #[test]
    fn test_navigation_endpoint() {
        assert_eq!(navigation_endpoint("web", Some("lists"), None), "web/lists");
        assert_eq!(
            navigation_endpoint("sp.userprofiles.peoplemanager", None, Some("isFollowing")),
            "sp.userprofiles.peoplemanager.isFollowing"
        );
        assert_eq!(navigation_endpoint("web", None, None), "web");
    }

    #[test]
    fn test_method_endpoint_keeps_query_string_last() {
        assert_eq!(
            method_endpoint("web/lists?$filter=Title eq 'Tasks'", Some("items")),
            "web/lists/items?$filter=Title eq 'Tasks'"
        );
        assert_eq!(method_endpoint("web", None), "web");
    }

    #[test]
    fn test_method_endpoint_override() {
        assert_eq!(
            method_endpoint("web/lists(1)", Some("_api/SP.Utilities.Utility.SendEmail")),
            "SP.Utilities.Utility.SendEmail"
        );
    }

    #[test]
    fn test_method_request_stamps_metadata_and_if_match() {
        let descriptor = descriptor("web/lists(1)");

        let request = method_request(
            &descriptor,
            HttpVerb::Merge,
            Some("SP.List"),
            None,
            RequestBody::Json(json!({ "Title": "New" })),
            false,
        );

        assert_eq!(request.url(), "https://contoso.example.com/sites/dev/_api/web/lists(1)");
        assert_eq!(request.header("IF-MATCH"), Some("*"));
        assert_eq!(
            request.body().as_json(),
            Some(&json!({ "Title": "New", "__metadata": { "type": "SP.List" } }))
        );
    }

    #[test]
    fn test_method_request_post_has_no_if_match() {
        let descriptor = descriptor("web/lists(1)");

        let request = method_request(
            &descriptor,
            HttpVerb::Post,
            None,
            Some("recycle"),
            RequestBody::Empty,
            false,
        );

        assert_eq!(request.header("IF-MATCH"), None);
        assert_eq!(
            request.url(),
            "https://contoso.example.com/sites/dev/_api/web/lists(1)/recycle"
        );
    }

    #[test]
    fn test_method_request_buffer_drops_body() {
        let descriptor = descriptor("web/getFileByServerRelativeUrl('/sites/dev/Docs/a.txt')");

        let request = method_request(
            &descriptor,
            HttpVerb::Post,
            None,
            Some("openBinaryStream"),
            RequestBody::Json(json!({ "ignored": true })),
            true,
        );

        assert!(request.is_buffer());
        assert_eq!(request.verb(), HttpVerb::Get);
        assert_eq!(request.body(), &RequestBody::Empty);
    }
}
