//! The operation registry.
//!
//! A static, immutable table mapping a registry key (a normalized metadata type such as
//! `SP.List`, or a lower-cased endpoint leaf such as `items`) to the operations installed
//! on objects of that key. See [`crate::normalize_type_key`] for key derivation.

use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;

use crate::request::HttpVerb;
use crate::resource::{Args, Reply, Resource};
use crate::transport::BoxFuture;
use crate::RestError;

pub(crate) mod custom;
pub mod quirks;
mod table;

/// Signature of a hand-written operation body.
pub type CustomFn =
    for<'a> fn(&'a Resource, &'static OperationSpec, Args) -> BoxFuture<'a, Result<Reply, RestError>>;

/// A hand-written operation body.
#[derive(Clone, Copy)]
pub struct CustomOperation(pub(crate) CustomFn);

impl fmt::Debug for CustomOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomOperation")
    }
}

/// How call-time arguments are turned into a request.
///
/// Arguments are positional: `a0`, `a1`, `a2` below refer to [`Args`] indices.
#[derive(Debug, Clone, Copy)]
pub enum ArgumentConvention {
    /// No argument: navigates to (or posts on) the target path.
    None,
    /// `target(a0)` with a quoted string, a bare scalar, or `k=v` pairs; `POST` also sends
    /// `a1` as data stamped with type `a2`.
    PathSegmentArg,
    /// `target(a0)` with the raw, unquoted key (`items(5)`).
    KeyArg,
    /// `target(@v)?@v=a0`: the argument travels as a parameter alias.
    ParameterAlias,
    /// `target?$filter=<field> eq '<a0>'` over the listed fields, joined with `or`.
    QueryFilterArg {
        /// Candidate fields, in order.
        fields: &'static [&'static str],
    },
    /// `target(a0)` with `a1` (or the binary content) in the body, typed `a2`.
    BodyArg,
    /// `a0` in the body, typed `a1` unless the entry stamps a type.
    BodyArgNoPathArg,
    /// Binary `GET`, executed eagerly.
    BufferResponse,
    /// Appends `.target` to the current endpoint.
    AppendToPath,
    /// A hand-written body.
    Custom(CustomOperation),
}

/// URL segment an operation acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The operation name.
    Member,
    /// A fixed relative path (may carry a query string).
    Path(&'static str),
    /// The object itself.
    Current,
}

/// Metadata type stamped into a write body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// Caller-supplied, if any.
    None,
    /// A fixed type.
    Fixed(&'static str),
    /// The metadata type of the object the operation runs on.
    OwnType,
}

/// One entry of the registry.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    name: &'static str,
    verb: HttpVerb,
    convention: ArgumentConvention,
    target: Target,
    stamp: Stamp,
}

impl OperationSpec {
    const fn new(name: &'static str, verb: HttpVerb, convention: ArgumentConvention) -> Self {
        Self {
            name,
            verb,
            convention,
            target: Target::Member,
            stamp: Stamp::None,
        }
    }

    /// `GET name(a0)`, lazy.
    pub const fn get(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::PathSegmentArg)
    }

    /// `POST name(a0)` with optional data.
    pub const fn post(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Post, ArgumentConvention::PathSegmentArg)
    }

    /// `GET name(@v)?@v=a0`, lazy.
    pub const fn get_alias(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::ParameterAlias)
    }

    /// `POST name(@v)?@v=a0`.
    pub const fn post_alias(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Post, ArgumentConvention::ParameterAlias)
    }

    /// `GET name(a0)` with a body, eager.
    pub const fn get_body(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::BodyArg)
    }

    /// `POST name(a0)` with a body.
    pub const fn post_body(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Post, ArgumentConvention::BodyArg)
    }

    /// `GET name` with a body, eager.
    pub const fn get_body_no_args(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::BodyArgNoPathArg)
    }

    /// `POST name` with a body.
    pub const fn post_body_no_args(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Post, ArgumentConvention::BodyArgNoPathArg)
    }

    /// Binary `GET name`.
    pub const fn get_buffer(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::BufferResponse)
    }

    /// Lazy `GET endpoint.name`.
    pub const fn get_appended(name: &'static str) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::AppendToPath)
    }

    /// Lazy `GET path`.
    pub const fn navigate(name: &'static str, path: &'static str) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::None).at(path)
    }

    /// Lazy `GET path(a0)` with the raw key.
    pub const fn key(name: &'static str, path: &'static str) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::KeyArg).at(path)
    }

    /// Lazy `GET path?$filter=...` over `fields`.
    pub const fn filter(
        name: &'static str,
        path: &'static str,
        fields: &'static [&'static str],
    ) -> Self {
        Self::new(name, HttpVerb::Get, ArgumentConvention::QueryFilterArg { fields }).at(path)
    }

    /// `MERGE` of the object itself, stamped with `metadata_type`.
    pub const fn update(metadata_type: &'static str) -> Self {
        Self::new("update", HttpVerb::Merge, ArgumentConvention::BodyArgNoPathArg)
            .on_self()
            .stamped(metadata_type)
    }

    /// A hand-written operation.
    pub const fn custom(name: &'static str, body: CustomFn) -> Self {
        Self::new(
            name,
            HttpVerb::Get,
            ArgumentConvention::Custom(CustomOperation(body)),
        )
    }

    /// Acts on `path` instead of the operation name.
    pub const fn at(mut self, path: &'static str) -> Self {
        self.target = Target::Path(path);
        self
    }

    /// Acts on the object itself.
    pub const fn on_self(mut self) -> Self {
        self.target = Target::Current;
        self
    }

    /// Stamps `metadata_type` into the body.
    pub const fn stamped(mut self, metadata_type: &'static str) -> Self {
        self.stamp = Stamp::Fixed(metadata_type);
        self
    }

    /// Stamps the metadata type of the object the operation runs on.
    pub const fn stamped_with_own_type(mut self) -> Self {
        self.stamp = Stamp::OwnType;
        self
    }

    /// The member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The logical verb.
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// The argument convention.
    pub fn convention(&self) -> ArgumentConvention {
        self.convention
    }

    /// The target.
    pub fn target(&self) -> Target {
        self.target
    }

    /// The stamp.
    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    /// Relative path the operation acts on, `None` for the object itself.
    pub fn target_path(&self) -> Option<&'static str> {
        match self.target {
            Target::Member => Some(self.name),
            Target::Path(path) => Some(path),
            Target::Current => None,
        }
    }

    /// Whether the operation only names the next hop (no round trip).
    pub fn is_lazy(&self) -> bool {
        self.verb == HttpVerb::Get
            && matches!(
                self.convention,
                ArgumentConvention::None
                    | ArgumentConvention::PathSegmentArg
                    | ArgumentConvention::KeyArg
                    | ArgumentConvention::ParameterAlias
                    | ArgumentConvention::QueryFilterArg { .. }
                    | ArgumentConvention::AppendToPath
            )
    }

    /// Whether the operation is hand-written.
    pub fn is_custom(&self) -> bool {
        matches!(self.convention, ArgumentConvention::Custom(_))
    }
}

/// The immutable operation table.
#[derive(Debug)]
pub struct Registry {
    entries: IndexMap<&'static str, Arc<[OperationSpec]>>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::build);

impl Registry {
    /// Returns the process-wide registry, built on first use.
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    fn build() -> Self {
        let mut entries = IndexMap::new();
        for (key, operations) in table::ENTRIES {
            entries.insert(*key, Arc::<[OperationSpec]>::from(*operations));
        }
        for (alias, key) in table::ALIASES {
            if let Some(operations) = entries.get(key).cloned() {
                entries.insert(*alias, operations);
            }
        }
        Self { entries }
    }

    /// Operations registered under `key`; empty for unknown keys.
    pub fn lookup(&self, key: &str) -> &[OperationSpec] {
        self.entries
            .get(key)
            .map(|operations| &**operations)
            .unwrap_or_default()
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether two keys share the same operation list (aliases).
    pub fn shares_operations(&self, key: &str, other: &str) -> bool {
        match (self.entries.get(key), self.entries.get(other)) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }

    /// All registered keys, aliases included.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_unknown_key_has_no_operations() {
        assert!(Registry::global().lookup("SP.Unknown").is_empty());
    }

    #[test]
    fn test_siteusers_is_an_alias_of_users() {
        let registry = Registry::global();

        assert!(registry.shares_operations("siteusers", "users"));
        assert!(!registry.shares_operations("users", "sitegroups"));
    }

    #[test]
    fn test_operation_names_are_unique_per_key() {
        let registry = Registry::global();

        for key in registry.keys() {
            let mut names = HashSet::new();
            for operation in registry.lookup(key) {
                assert!(
                    names.insert(operation.name()),
                    "duplicate operation '{}' on '{key}'",
                    operation.name()
                );
            }
        }
    }

    #[test]
    fn test_list_operations() {
        let operations = Registry::global().lookup("SP.List");
        let find = |name: &str| operations.iter().find(|operation| operation.name() == name);

        let get_item_by_id = find("getItemById").expect("getItemById");
        assert!(get_item_by_id.is_lazy());
        assert_eq!(get_item_by_id.target_path(), Some("items"));

        let update = find("update").expect("update");
        assert_eq!(update.verb(), HttpVerb::Merge);
        assert_eq!(update.target(), Target::Current);
        assert_eq!(update.stamp(), Stamp::Fixed("SP.List"));

        let recycle = find("recycle").expect("recycle");
        assert!(!recycle.is_lazy());
    }

    #[test]
    fn test_list_item_update_uses_own_type() {
        let operations = Registry::global().lookup("SP.ListItem");

        let update = operations
            .iter()
            .find(|operation| operation.name() == "update")
            .expect("update");

        assert_eq!(update.stamp(), Stamp::OwnType);
    }
}
