use std::sync::Arc;

use crate::RestError;
use crate::builder::ClientBuilder;
use crate::context::HostContext;
use crate::request::method::FILTER_MARKER;
use crate::request::{ExecutionMode, HttpVerb, encode_uri_component};
use crate::resource::Pending;
use crate::session::Session;
use crate::transport::Transport;

const WEB_ENDPOINT: &str = "web";
const SITE_ENDPOINT: &str = "site";
const LISTS_ENDPOINT: &str = "web/lists";
const PEOPLE_MANAGER_ENDPOINT: &str = "sp.userprofiles.peoplemanager";
const PROFILE_LOADER_ENDPOINT: &str = "sp.userprofiles.profileloader.getprofileloader";
const SEARCH_ENDPOINT: &str = "search";
const SOCIAL_FEED_ENDPOINT: &str = "social.feed";
const EMAIL_ADDRESSES_ENDPOINT: &str = "sp.utilities.utility.getCurrentUserEmailAddresses";

/// Entry point of the object model.
///
/// A client holds the host context and the transport; every object reached from it
/// shares both. Root constructors only describe the first hop: await the returned
/// [`Pending`] to request it.
///
/// Cloning a client is cheap.
///
/// # Example
///
/// ```rust,no_run
/// use spom_core::{Client, args};
///
/// # async fn example() -> Result<(), spom_core::RestError> {
/// let client = Client::builder()
///     .with_web_url("https://contoso.example.com/sites/dev")
///     .build()?;
///
/// let tasks = client.list("Tasks", None)?.await?;
/// if tasks.exists() {
///     let item = tasks.navigate("getItemById", args![5])?.await?;
///     println!("{:?}", item.property("Title"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    session: Arc<Session>,
    mode: ExecutionMode,
}

impl Client {
    /// Creates a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub(crate) fn new(
        context: HostContext,
        transport: Arc<dyn Transport>,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            session: Arc::new(Session::new(context, transport)),
            mode,
        }
    }

    /// The host context.
    pub fn context(&self) -> &HostContext {
        self.session.context()
    }

    /// The execution mode inherited by every object of this client.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Any resource: `endpoint` below the web at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `url` cannot be resolved.
    pub fn resource(&self, url: &str, endpoint: &str) -> Result<Pending, RestError> {
        let base_url = self.context().resolve_host_url(url)?;
        Ok(self.pending(base_url, endpoint))
    }

    /// The web at `host`, by default the current web.
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn web(&self, host: Option<&str>) -> Result<Pending, RestError> {
        let base_url = self.web_url(host)?;
        Ok(self.pending(base_url, WEB_ENDPOINT))
    }

    /// The site collection at `host`, by default the current site.
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn site(&self, host: Option<&str>) -> Result<Pending, RestError> {
        let base_url = self.site_url(host)?;
        Ok(self.pending(base_url, SITE_ENDPOINT))
    }

    /// The list titled `title` in the web at `host`.
    ///
    /// The list is looked up with a title filter; the single match collapses onto the
    /// list itself, no match yields an object that does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn list(&self, title: &str, host: Option<&str>) -> Result<Pending, RestError> {
        let base_url = self.web_url(host)?;
        let endpoint = format!(
            "{LISTS_ENDPOINT}{FILTER_MARKER}=Title eq '{}'",
            encode_uri_component(title)
        );
        Ok(self.pending(base_url, endpoint))
    }

    /// The people manager of the site at `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn people_manager(&self, host: Option<&str>) -> Result<Pending, RestError> {
        let base_url = self.site_url(host)?;
        Ok(self.pending(base_url, PEOPLE_MANAGER_ENDPOINT))
    }

    /// The profile loader of the site at `host`; requested with a `POST`.
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn profile_loader(&self, host: Option<&str>) -> Result<Pending, RestError> {
        let base_url = self.site_url(host)?;
        Ok(self
            .pending(base_url, PROFILE_LOADER_ENDPOINT)
            .with_verb(HttpVerb::Post))
    }

    /// The search service of the site at `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn search(&self, host: Option<&str>) -> Result<Pending, RestError> {
        let base_url = self.site_url(host)?;
        Ok(self.pending(base_url, SEARCH_ENDPOINT))
    }

    /// The social feed manager of the site at `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if a server-relative `host` cannot be resolved.
    pub fn social_feed(&self, host: Option<&str>) -> Result<Pending, RestError> {
        let base_url = self.site_url(host)?;
        Ok(self.pending(base_url, SOCIAL_FEED_ENDPOINT))
    }

    /// The e-mail addresses of the current user.
    pub fn current_user_email_addresses(&self) -> Pending {
        let base_url = self.context().site_absolute_url().to_string();
        self.pending(base_url, EMAIL_ADDRESSES_ENDPOINT)
    }

    fn web_url(&self, host: Option<&str>) -> Result<String, RestError> {
        match host {
            Some(host) => self.context().resolve_host_url(host),
            None => Ok(self.context().web_absolute_url().to_string()),
        }
    }

    fn site_url(&self, host: Option<&str>) -> Result<String, RestError> {
        match host {
            Some(host) => self.context().resolve_host_url(host),
            None => Ok(self.context().site_absolute_url().to_string()),
        }
    }

    fn pending(&self, base_url: String, endpoint: impl Into<String>) -> Pending {
        let descriptor = self.session.descriptor(base_url, endpoint, self.mode);
        Pending::new(Arc::clone(&self.session), descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;

    fn client() -> Client {
        Client::builder()
            .with_web_url("https://contoso.example.com/sites/dev/team")
            .with_site_url("https://contoso.example.com/sites/dev")
            .with_transport(Arc::new(ScriptedTransport::new()))
            .build()
            .expect("should build client")
    }

    #[test]
    fn test_web_defaults_to_web_url() {
        let pending = client().web(None).expect("web");

        insta::assert_snapshot!(pending.request_url(), @"https://contoso.example.com/sites/dev/team/_api/web");
    }

    #[test]
    fn test_site_defaults_to_site_url() {
        let pending = client().site(None).expect("site");

        insta::assert_snapshot!(pending.request_url(), @"https://contoso.example.com/sites/dev/_api/site");
    }

    #[test]
    fn test_server_relative_host_is_resolved() {
        let pending = client().web(Some("/sites/hr")).expect("web");

        insta::assert_snapshot!(pending.request_url(), @"https://contoso.example.com/sites/hr/_api/web");
    }

    #[test]
    fn test_list_is_a_title_filter() {
        let pending = client().list("Q&A", None).expect("list");

        assert!(pending.descriptor().is_filter_query());
        insta::assert_snapshot!(pending.request_url(), @"https://contoso.example.com/sites/dev/team/_api/web/lists?$filter=Title eq 'Q%26A'");
    }

    #[test]
    fn test_profile_loader_is_a_post() {
        let pending = client().profile_loader(None).expect("profile loader");

        assert_eq!(pending.verb(), HttpVerb::Post);
        insta::assert_snapshot!(pending.request_url(), @"https://contoso.example.com/sites/dev/_api/sp.userprofiles.profileloader.getprofileloader");
    }

    #[test]
    fn test_site_scoped_constructors() {
        let client = client();
        let urls: Vec<_> = [
            client.people_manager(None),
            client.search(None),
            client.social_feed(None),
            Ok(client.current_user_email_addresses()),
        ]
        .into_iter()
        .map(|pending| pending.expect("constructor").request_url())
        .collect();

        assert_eq!(
            urls,
            [
                "https://contoso.example.com/sites/dev/_api/sp.userprofiles.peoplemanager",
                "https://contoso.example.com/sites/dev/_api/search",
                "https://contoso.example.com/sites/dev/_api/social.feed",
                "https://contoso.example.com/sites/dev/_api/sp.utilities.utility.getCurrentUserEmailAddresses",
            ]
        );
    }

    #[test]
    fn test_resource_keeps_absolute_url() {
        let pending = client()
            .resource("https://other.example.com/sites/x", "web/lists")
            .expect("resource");

        assert_eq!(pending.request_url(), "https://other.example.com/sites/x/_api/web/lists");
        assert_eq!(pending.descriptor().mode(), ExecutionMode::Asynchronous);
    }
}
