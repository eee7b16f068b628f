//! Host page context injected into the client.
//!
//! Everything the object model needs to know about the page it runs for (base URLs,
//! app-web indirection, the anti-forgery token) lives in a [`HostContext`] passed to
//! [`ClientBuilder`](crate::ClientBuilder). Nothing is read from ambient state.

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::RestError;

/// Query-string key carrying the host web URL when running inside an app web.
pub const HOST_URL_KEY: &str = "SPHostUrl";

/// Secure wrapper for the request digest that zeroes its memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Creates a new secure string from the provided value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns a reference to the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// The host page state the object model depends on.
///
/// Built by [`ClientBuilder`](crate::ClientBuilder) and shared read-only by every object
/// derived from a client.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    pub(crate) web_absolute_url: String,
    pub(crate) site_absolute_url: String,
    pub(crate) is_app_web: bool,
    pub(crate) page_url: Option<String>,
    pub(crate) request_digest: Option<SecureString>,
}

impl HostContext {
    /// Absolute URL of the current web.
    pub fn web_absolute_url(&self) -> &str {
        &self.web_absolute_url
    }

    /// Absolute URL of the current site collection.
    pub fn site_absolute_url(&self) -> &str {
        &self.site_absolute_url
    }

    /// Whether requests are proxied through the app web (`SP.AppContextSite(@target)`).
    pub fn is_app_web(&self) -> bool {
        self.is_app_web
    }

    /// URL of the page hosting the client, if known.
    pub fn page_url(&self) -> Option<&str> {
        self.page_url.as_deref()
    }

    pub(crate) fn request_digest(&self) -> Option<&str> {
        self.request_digest.as_ref().map(SecureString::as_str)
    }

    /// Returns the `scheme://host[:port]` origin requests are resolved against.
    ///
    /// Inside an app web the origin of the `SPHostUrl` query-string value is used,
    /// otherwise the origin of the page (or of the web URL when no page URL is known).
    ///
    /// # Errors
    ///
    /// Returns an error if the selected URL cannot be parsed.
    pub fn domain_url(&self) -> Result<String, RestError> {
        let page = self.page_url.as_deref().unwrap_or(&self.web_absolute_url);
        let url = if self.is_app_web {
            query_string_value(page, HOST_URL_KEY).unwrap_or_else(|| page.to_string())
        } else {
            page.to_string()
        };

        let url = Url::parse(&url)?;
        Ok(url.origin().ascii_serialization())
    }

    /// Resolves a host URL given to a root constructor.
    ///
    /// Absolute URLs (starting with `http`) are kept, anything else is a server-relative
    /// path appended to the [domain URL](Self::domain_url).
    ///
    /// # Errors
    ///
    /// Returns an error if the domain URL cannot be computed.
    pub fn resolve_host_url(&self, host_url: &str) -> Result<String, RestError> {
        if host_url.starts_with("http") {
            return Ok(host_url.to_string());
        }
        let domain = self.domain_url()?;
        Ok(format!("{domain}{host_url}"))
    }
}

/// Reads a value from the query string of `url`.
///
/// Keys and values are percent-decoded; pairs without `=` are ignored. When `url` has no
/// `?` the whole string is treated as the query string.
///
/// ```rust
/// use spom_core::query_string_value;
///
/// let url = "https://app.example.com/Pages/Default.aspx?SPHostUrl=https%3A%2F%2Fcontoso.example.com&SPLanguage=en-US";
/// assert_eq!(
///     query_string_value(url, "SPHostUrl").as_deref(),
///     Some("https://contoso.example.com")
/// );
/// assert_eq!(query_string_value(url, "Missing"), None);
/// ```
pub fn query_string_value(url: &str, key: &str) -> Option<String> {
    let query = match url.split_once('?') {
        Some((_, query)) => query,
        None => url,
    };

    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        let value = value.split('=').next().unwrap_or_default();
        (percent_decode_str(name).decode_utf8_lossy() == key)
            .then(|| percent_decode_str(value).decode_utf8_lossy().into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(is_app_web: bool, page_url: Option<&str>) -> HostContext {
        HostContext {
            web_absolute_url: "https://contoso.example.com/sites/dev".to_string(),
            site_absolute_url: "https://contoso.example.com/sites/dev".to_string(),
            is_app_web,
            page_url: page_url.map(ToString::to_string),
            request_digest: Some("0xDIGEST".into()),
        }
    }

    #[test]
    fn test_query_string_value_decodes_key_and_value() {
        let url = "https://a.example.com/page.aspx?My%20Key=a%20b&other=1";

        assert_eq!(query_string_value(url, "My Key").as_deref(), Some("a b"));
        assert_eq!(query_string_value(url, "other").as_deref(), Some("1"));
    }

    #[test]
    fn test_query_string_value_skips_pairs_without_value() {
        let url = "https://a.example.com/page.aspx?flag&ID=7";

        assert_eq!(query_string_value(url, "flag"), None);
        assert_eq!(query_string_value(url, "ID").as_deref(), Some("7"));
    }

    #[test]
    fn test_domain_url_uses_page_origin() {
        let context = context(false, Some("https://contoso.example.com/sites/dev/Pages/a.aspx"));

        let domain = context.domain_url().expect("valid domain");

        assert_eq!(domain, "https://contoso.example.com");
    }

    #[test]
    fn test_domain_url_uses_host_url_in_app_web() {
        let context = context(
            true,
            Some("https://app-1234.example.net/sites/dev/App/Pages/Default.aspx?SPHostUrl=https%3A%2F%2Fcontoso.example.com%2Fsites%2Fdev"),
        );

        let domain = context.domain_url().expect("valid domain");

        assert_eq!(domain, "https://contoso.example.com");
    }

    #[test]
    fn test_resolve_host_url() {
        let context = context(false, None);

        assert_eq!(
            context.resolve_host_url("https://other.example.com/web").expect("absolute"),
            "https://other.example.com/web"
        );
        assert_eq!(
            context.resolve_host_url("/sites/hr").expect("relative"),
            "https://contoso.example.com/sites/hr"
        );
    }

    #[test]
    fn test_request_digest_is_redacted() {
        let context = context(false, None);

        let debug = format!("{context:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("0xDIGEST"));
        assert_eq!(context.request_digest(), Some("0xDIGEST"));
    }
}
