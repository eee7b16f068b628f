use std::sync::Arc;

use url::Url;

use crate::RestError;
use crate::blocking;
use crate::client::Client;
use crate::context::{HostContext, SecureString};
use crate::request::ExecutionMode;
use crate::transport::{ReqwestTransport, Transport};

/// Builder for [`Client`] instances.
///
/// `ClientBuilder` collects the host page context the object model runs for (the web
/// and site URLs, whether the page is an app web, the request digest) and the transport
/// used to reach the REST API.
///
/// # Default Configuration
///
/// - **Web URL**: none, it must be provided with [`with_web_url`](Self::with_web_url)
/// - **Site URL**: same as the web URL
/// - **App web**: `false`
/// - **Page URL**: none (the web URL origin is used to resolve server-relative URLs)
/// - **Request digest**: none (no `X-RequestDigest` header)
/// - **Transport**: [`ReqwestTransport`] over a default `reqwest::Client`
///
/// # Example
///
/// ```rust
/// use spom_core::Client;
///
/// # fn example() -> Result<(), spom_core::RestError> {
/// let client = Client::builder()
///     .with_web_url("https://contoso.example.com/sites/dev/")
///     .with_site_url("https://contoso.example.com/sites")
///     .with_request_digest("0x1234,01 Jan 2025 00:00:00 -0000")
///     .build()?;
///
/// assert_eq!(
///     client.context().web_absolute_url(),
///     "https://contoso.example.com/sites/dev"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    web_url: String,
    site_url: Option<String>,
    is_app_web: bool,
    page_url: Option<String>,
    request_digest: Option<SecureString>,
    client: Option<reqwest::Client>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Builds an asynchronous [`Client`].
    ///
    /// Trailing slashes of the web and site URLs are removed.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::UrlError`] if the web URL (or the site URL, when set) is not an
    /// absolute URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use spom_core::Client;
    ///
    /// # fn example() -> Result<(), spom_core::RestError> {
    /// let client = Client::builder()
    ///     .with_web_url("https://contoso.example.com/sites/dev")
    ///     .build()?;
    ///
    /// assert_eq!(
    ///     client.context().site_absolute_url(),
    ///     "https://contoso.example.com/sites/dev"
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Client, RestError> {
        let (context, transport) = self.into_parts()?;
        Ok(Client::new(context, transport, ExecutionMode::Asynchronous))
    }

    /// Builds a [`blocking::Client`] driving every operation on its own runtime.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`build`](Self::build), or
    /// [`RestError::UnsupportedEnvironment`] if called from inside an async runtime or if
    /// the runtime cannot be created.
    pub fn build_blocking(self) -> Result<blocking::Client, RestError> {
        let (context, transport) = self.into_parts()?;
        let client = Client::new(context, transport, ExecutionMode::Blocking);
        blocking::Client::new(client)
    }

    fn into_parts(self) -> Result<(HostContext, Arc<dyn Transport>), RestError> {
        let Self {
            web_url,
            site_url,
            is_app_web,
            page_url,
            request_digest,
            client,
            transport,
        } = self;

        let web_absolute_url = absolute_url(&web_url)?;
        let site_absolute_url = match site_url {
            Some(site_url) => absolute_url(&site_url)?,
            None => web_absolute_url.clone(),
        };

        let context = HostContext {
            web_absolute_url,
            site_absolute_url,
            is_app_web,
            page_url,
            request_digest,
        };
        let transport: Arc<dyn Transport> = match transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(client.unwrap_or_default())),
        };

        Ok((context, transport))
    }

    /// Sets the absolute URL of the current web.
    ///
    /// Web-relative objects (`web`, `list`) are requested below this URL.
    pub fn with_web_url(mut self, web_url: impl Into<String>) -> Self {
        self.web_url = web_url.into();
        self
    }

    /// Sets the absolute URL of the current site collection.
    ///
    /// Defaults to the web URL.
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = Some(site_url.into());
        self
    }

    /// Declares the page as an app web.
    ///
    /// Requests are then proxied through `SP.AppContextSite(@target)` and the host web is
    /// read from the `SPHostUrl` query-string value of the page URL.
    ///
    /// ```rust
    /// use spom_core::Client;
    ///
    /// # fn example() -> Result<(), spom_core::RestError> {
    /// let client = Client::builder()
    ///     .with_web_url("https://app-42.example.net/sites/dev/App")
    ///     .with_page_url("https://app-42.example.net/sites/dev/App/Pages/Default.aspx?SPHostUrl=https%3A%2F%2Fcontoso.example.com%2Fsites%2Fdev")
    ///     .with_app_web(true)
    ///     .build()?;
    ///
    /// assert_eq!(client.context().domain_url()?, "https://contoso.example.com");
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_app_web(mut self, is_app_web: bool) -> Self {
        self.is_app_web = is_app_web;
        self
    }

    /// Sets the URL of the page hosting the client.
    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = Some(page_url.into());
        self
    }

    /// Sets the anti-forgery token sent as `X-RequestDigest`.
    ///
    /// The value is zeroed in memory when the client is dropped and redacted from `Debug`
    /// output.
    pub fn with_request_digest(mut self, request_digest: impl Into<SecureString>) -> Self {
        self.request_digest = Some(request_digest.into());
        self
    }

    /// Uses a configured `reqwest::Client` (cookies, authentication, proxies...) for the
    /// default transport.
    ///
    /// Ignored when a transport is set with [`with_transport`](Self::with_transport).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Uses a custom transport.
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use spom_core::{Client, ScriptedTransport};
    ///
    /// # fn example() -> Result<(), spom_core::RestError> {
    /// let transport = Arc::new(ScriptedTransport::new());
    /// let client = Client::builder()
    ///     .with_web_url("https://contoso.example.com")
    ///     .with_transport(Arc::clone(&transport))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_transport<T: Transport>(mut self, transport: Arc<T>) -> Self {
        self.transport = Some(transport);
        self
    }
}

fn absolute_url(url: &str) -> Result<String, RestError> {
    Url::parse(url)?;
    Ok(url.trim_end_matches('/').to_string())
}
