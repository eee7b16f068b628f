//! The mapped representation of a remote resource.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::registry::OperationSpec;
use crate::request::{Descriptor, HttpVerb};

/// Operations available on every object, independently of its type.
pub const GENERIC_OPERATIONS: [&str; 4] = ["executeGet", "executePost", "refresh", "setProperty"];

/// Lookup operations installed on objects carrying results.
pub const RESULT_LOOKUPS: [&str; 2] = ["getById", "getByTitle"];

/// Prefix of deferred-link accessors (`get_RootFolder`).
pub const DEFERRED_ACCESSOR_PREFIX: &str = "get_";

const TITLE_FIELDS: &[&str] = &["Title", "Name", "InternalName", "StaticName"];
const WEB_PART_DEFINITION: &str = "SP.WebParts.WebPartDefinition";

/// The `__metadata` block of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(rename = "type")]
    pub(crate) metadata_type: Option<String>,
    pub(crate) uri: Option<String>,
    pub(crate) etag: Option<String>,
    pub(crate) id: Option<String>,
}

impl Metadata {
    /// Reads a `__metadata` block; a malformed block reads as empty.
    pub(crate) fn from_value(value: &Value) -> Self {
        Self::deserialize(value).unwrap_or_default()
    }

    /// The server-supplied type discriminator.
    pub fn metadata_type(&self) -> Option<&str> {
        self.metadata_type.as_deref()
    }

    /// The self-referencing URI.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// The entity tag.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// The entity id.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Target of a deferred property, resolved by its `get_<Name>` accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredLink {
    pub(crate) base_url: String,
    pub(crate) endpoint: String,
}

impl DeferredLink {
    /// Absolute URL of the target web.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint of the linked resource.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Collection view of an object.
#[derive(Debug, Clone)]
pub enum Results {
    /// A filter query matched exactly one resource: the object is its own only result.
    Collapsed,
    /// Genuine collection members.
    Members(Vec<MappedObject>),
}

/// The request an object was produced by, replayed by `refresh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceRequest {
    pub(crate) verb: HttpVerb,
    pub(crate) url: String,
    pub(crate) descriptor: Descriptor,
}

impl SourceRequest {
    pub(crate) fn new(verb: HttpVerb, descriptor: &Descriptor) -> Self {
        Self {
            verb,
            url: descriptor.request_url(),
            descriptor: descriptor.clone(),
        }
    }
}

/// A response mapped onto a descriptor, with its synthesized operations.
#[derive(Debug, Clone)]
pub struct MappedObject {
    pub(crate) descriptor: Descriptor,
    pub(crate) exists: bool,
    pub(crate) metadata: Option<Metadata>,
    pub(crate) properties: IndexMap<String, Value>,
    pub(crate) deferred: IndexMap<String, DeferredLink>,
    pub(crate) results: Option<Results>,
    pub(crate) key: String,
    pub(crate) operations: IndexMap<&'static str, &'static OperationSpec>,
    pub(crate) source: SourceRequest,
}

impl MappedObject {
    pub(crate) fn unpopulated(descriptor: Descriptor, source: SourceRequest) -> Self {
        Self {
            descriptor,
            exists: false,
            metadata: None,
            properties: IndexMap::new(),
            deferred: IndexMap::new(),
            results: None,
            key: String::new(),
            operations: IndexMap::new(),
            source,
        }
    }

    /// The descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Whether the resource exists; absence is not an error.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// The `__metadata` block.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// The metadata type.
    pub fn metadata_type(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(Metadata::metadata_type)
    }

    /// Registry key the operations were looked up with.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// A copied property; `Some(Value::Null)` for properties sent as `null`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Copied properties, in response order.
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// Deferred links, by property name.
    pub fn deferred(&self) -> &IndexMap<String, DeferredLink> {
        &self.deferred
    }

    /// Whether the object carries a results view.
    pub fn has_results(&self) -> bool {
        self.results.is_some()
    }

    /// The results view.
    ///
    /// A collapsed filter result yields the object itself as its only member.
    pub fn results(&self) -> Vec<&MappedObject> {
        match &self.results {
            None => Vec::new(),
            Some(Results::Collapsed) => vec![self],
            Some(Results::Members(members)) => members.iter().collect(),
        }
    }

    /// Synthesized operations, registry order.
    pub fn operations(&self) -> impl Iterator<Item = &'static OperationSpec> + '_ {
        self.operations.values().copied()
    }

    pub(crate) fn operation(&self, name: &str) -> Option<&'static OperationSpec> {
        self.operations.get(name).copied()
    }

    /// Names of every callable operation: synthesized ones, result lookups and deferred
    /// accessors. The [generic operations](GENERIC_OPERATIONS) are methods of
    /// [`Resource`](crate::Resource) and not listed.
    pub fn operation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.keys().map(ToString::to_string).collect();
        if self.has_results() {
            names.extend(
                RESULT_LOOKUPS
                    .iter()
                    .filter(|lookup| !self.operations.contains_key(**lookup))
                    .map(ToString::to_string),
            );
        }
        names.extend(
            self.deferred
                .keys()
                .map(|name| format!("{DEFERRED_ACCESSOR_PREFIX}{name}"))
                .filter(|accessor| !self.operations.contains_key(accessor.as_str())),
        );
        names
    }

    /// First result whose `Id` matches.
    pub fn get_by_id(&self, id: &Value) -> Option<&MappedObject> {
        self.find_result(&["Id"], id)
    }

    /// First result whose `Title`, `Name`, `InternalName` or `StaticName` matches, in
    /// that order.
    pub fn get_by_title(&self, title: &Value) -> Option<&MappedObject> {
        self.find_result(TITLE_FIELDS, title)
    }

    fn find_result(&self, fields: &[&str], value: &Value) -> Option<&MappedObject> {
        let results = self.results();
        let first = results.first()?;

        fields
            .iter()
            .filter(|field| first.lookup_value(field).is_some_and(|value| !value.is_null()))
            .find_map(|field| {
                results.iter().copied().find(|result| {
                    result
                        .lookup_value(field)
                        .is_some_and(|candidate| loosely_equal(candidate, value))
                })
            })
    }

    /// Web part definitions expose their display values on the nested `WebPart` object.
    fn lookup_value(&self, field: &str) -> Option<&Value> {
        if self.metadata_type() == Some(WEB_PART_DEFINITION) {
            return self.property("WebPart").and_then(|web_part| web_part.get(field));
        }
        self.property(field)
    }
}

/// Equality across scalar JSON kinds: `5 == "5"`.
pub(crate) fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(number), Value::String(text)) | (Value::String(text), Value::Number(number)) => {
            match (number.as_f64(), text.trim().parse::<f64>()) {
                (Some(number), Ok(parsed)) => (number - parsed).abs() < f64::EPSILON,
                _ => false,
            }
        }
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!(5), json!("5"), true)]
    #[case(json!("5"), json!(5), true)]
    #[case(json!(5), json!(5.0), true)]
    #[case(json!("Tasks"), json!("Tasks"), true)]
    #[case(json!("Tasks"), json!("tasks"), false)]
    #[case(json!(true), json!("true"), false)]
    fn test_loosely_equal(#[case] left: Value, #[case] right: Value, #[case] expected: bool) {
        assert_eq!(loosely_equal(&left, &right), expected);
    }

    #[test]
    fn test_metadata_from_value() {
        let metadata = Metadata::from_value(&json!({
            "id": "Web/Lists(guid'1')",
            "uri": "https://contoso.example.com/_api/Web/Lists(guid'1')",
            "etag": "\"3\"",
            "type": "SP.List"
        }));

        assert_eq!(metadata.metadata_type(), Some("SP.List"));
        assert_eq!(metadata.etag(), Some("\"3\""));
        assert_eq!(metadata.uri(), Some("https://contoso.example.com/_api/Web/Lists(guid'1')"));
    }

    #[test]
    fn test_metadata_ignores_unknown_keys() {
        let metadata = Metadata::from_value(&json!({
            "type": "SP.File",
            "media_src": "https://contoso.example.com/_api/Web/GetFileByServerRelativeUrl('/a.txt')/$value",
            "content_type": "application/octet-stream"
        }));

        assert_eq!(metadata.metadata_type(), Some("SP.File"));
        assert_eq!(metadata.etag(), None);
        assert_eq!(Metadata::from_value(&json!("SP.File")), Metadata::default());
    }
}
