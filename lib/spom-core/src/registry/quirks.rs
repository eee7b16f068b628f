//! Named platform special cases.
//!
//! Kept as tables so every quirk is visible, tested and applied in one place.

use std::borrow::Cow;

/// An endpoint path segment that must be renamed for objects of a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointQuirk {
    /// Registry key the quirk applies to.
    pub key: &'static str,
    /// Segment as enumerated by the server.
    pub segment: &'static str,
    /// Segment the object must be addressed through.
    pub replacement: &'static str,
}

/// Fields enumerated through `AvailableFields` are acted upon through `Fields`.
pub const ENDPOINT_QUIRKS: &[EndpointQuirk] = &[EndpointQuirk {
    key: "SP.Field",
    segment: "AvailableFields",
    replacement: "Fields",
}];

/// Rewrites the endpoint of an object of registry key `key`, if a quirk applies.
pub fn apply_endpoint_quirks<'a>(key: &str, endpoint: &'a str) -> Cow<'a, str> {
    let mut result = Cow::Borrowed(endpoint);
    for quirk in ENDPOINT_QUIRKS.iter().filter(|quirk| quirk.key == key) {
        if let Some(rewritten) = rename_segment(&result, quirk.segment, quirk.replacement) {
            result = Cow::Owned(rewritten);
        }
    }
    result
}

fn rename_segment(endpoint: &str, segment: &str, replacement: &str) -> Option<String> {
    let mut renamed = false;
    let parts: Vec<Cow<'_, str>> = endpoint
        .split('/')
        .map(|part| match part.strip_prefix(segment) {
            Some(rest) if rest.is_empty() || rest.starts_with(['(', '?']) => {
                renamed = true;
                Cow::Owned(format!("{replacement}{rest}"))
            }
            _ => Cow::Borrowed(part),
        })
        .collect();
    renamed.then(|| parts.join("/"))
}

/// Metadata-type prefix whose parameter aliases are named `item`.
pub const ITEM_ALIAS_TYPE_PREFIX: &str = "SP.Social.";

/// Parameter alias used when data is passed in the URL (`name(<alias>)?@v=...`).
pub fn parameter_alias(metadata_type: Option<&str>) -> &'static str {
    if metadata_type.is_some_and(|metadata_type| metadata_type.starts_with(ITEM_ALIAS_TYPE_PREFIX)) {
        "item=@v"
    } else {
        "@v"
    }
}
