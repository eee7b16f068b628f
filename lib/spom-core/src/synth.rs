//! Method synthesis: registry key derivation and operation installation.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::object::MappedObject;
use crate::registry::{Registry, quirks};

/// Canonical key of the field family.
pub const FIELD_KEY: &str = "SP.Field";

/// Canonical key of the list item family.
pub const LIST_ITEM_KEY: &str = "SP.ListItem";

static FIELD_FAMILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SP\.Field").expect("valid regex for the field family"));

static LIST_ITEM_FAMILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SP\.Data\..*Item$").expect("valid regex for the list item family")
});

/// Normalizes a metadata type into a registry key.
///
/// Every `SP.Field*` type is a field, every `SP.Data.*Item` type is a list item.
///
/// ```rust
/// use spom_core::normalize_type_key;
///
/// assert_eq!(normalize_type_key("SP.FieldText"), "SP.Field");
/// assert_eq!(normalize_type_key("SP.Data.TasksListItem"), "SP.ListItem");
/// assert_eq!(normalize_type_key("SP.Web"), "SP.Web");
/// ```
pub fn normalize_type_key(metadata_type: &str) -> Cow<'_, str> {
    if FIELD_FAMILY.is_match(metadata_type) {
        Cow::Borrowed(FIELD_KEY)
    } else if LIST_ITEM_FAMILY.is_match(metadata_type) {
        Cow::Borrowed(LIST_ITEM_KEY)
    } else {
        Cow::Borrowed(metadata_type)
    }
}

/// Derives the registry key of an object.
///
/// Without a metadata type the key is the lower-cased last path segment of the endpoint,
/// query string removed.
pub fn registry_key(metadata_type: Option<&str>, endpoint: &str) -> String {
    if let Some(metadata_type) = metadata_type {
        return normalize_type_key(metadata_type).into_owned();
    }

    let path = endpoint.split('?').next().unwrap_or_default();
    path.rsplit('/')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Installs the registry operations of `target` and applies the endpoint quirks.
pub(crate) fn attach(target: &mut MappedObject) {
    let key = registry_key(target.metadata_type(), &target.descriptor.endpoint);

    target.operations = Registry::global()
        .lookup(&key)
        .iter()
        .map(|operation| (operation.name(), operation))
        .collect();

    let rewritten = match quirks::apply_endpoint_quirks(&key, &target.descriptor.endpoint) {
        Cow::Owned(endpoint) => Some(endpoint),
        Cow::Borrowed(_) => None,
    };
    if let Some(endpoint) = rewritten {
        debug!(%key, %endpoint, "endpoint rewritten");
        target.descriptor.endpoint = endpoint;
    }

    debug!(%key, operations = target.operations.len(), "operations installed");
    target.key = key;
}
