//! Effective permission checks.
//!
//! The server reports effective permissions as two 32-bit masks. A [`PermissionKind`] `n`
//! is bit `n - 1` of the 64-bit mask formed by `High:Low`.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::RestError;
use crate::args;
use crate::resource::{Args, Pending, Resource};
use crate::transport::BoxFuture;

const SITE_TYPE: &str = "SP.Site";
const WEB_TYPE: &str = "SP.Web";
const EFFECTIVE_PERMISSIONS: &str = "GetUserEffectivePermissions";

macro_rules! permission_kinds {
    ($($variant:ident = $value:literal => $name:literal,)*) => {
        /// A permission, numbered as the server numbers them.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum PermissionKind {
            $($variant,)*
        }

        impl PermissionKind {
            /// Every permission kind, in numbering order.
            pub const ALL: &[Self] = &[$(Self::$variant,)*];

            /// The server number of the permission.
            pub fn value(self) -> u8 {
                match self {
                    $(Self::$variant => $value,)*
                }
            }

            /// The camel-case name of the permission (`viewListItems`).
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }
    };
}

permission_kinds! {
    EmptyMask = 0 => "emptyMask",
    ViewListItems = 1 => "viewListItems",
    AddListItems = 2 => "addListItems",
    EditListItems = 3 => "editListItems",
    DeleteListItems = 4 => "deleteListItems",
    ApproveItems = 5 => "approveItems",
    OpenItems = 6 => "openItems",
    ViewVersions = 7 => "viewVersions",
    DeleteVersions = 8 => "deleteVersions",
    CancelCheckout = 9 => "cancelCheckout",
    ManagePersonalViews = 10 => "managePersonalViews",
    ManageLists = 12 => "manageLists",
    ViewFormPages = 13 => "viewFormPages",
    AnonymousSearchAccessList = 14 => "anonymousSearchAccessList",
    Open = 17 => "open",
    ViewPages = 18 => "viewPages",
    AddAndCustomizePages = 19 => "addAndCustomizePages",
    ApplyThemeAndBorder = 20 => "applyThemeAndBorder",
    ApplyStyleSheets = 21 => "applyStyleSheets",
    ViewUsageData = 22 => "viewUsageData",
    CreateSscSite = 23 => "createSSCSite",
    ManageSubwebs = 24 => "manageSubwebs",
    CreateGroups = 25 => "createGroups",
    ManagePermissions = 26 => "managePermissions",
    BrowseDirectories = 27 => "browseDirectories",
    BrowseUserInfo = 28 => "browseUserInfo",
    AddDelPrivateWebParts = 29 => "addDelPrivateWebParts",
    UpdatePersonalWebParts = 30 => "updatePersonalWebParts",
    ManageWeb = 31 => "manageWeb",
    AnonymousSearchAccessWebLists = 32 => "anonymousSearchAccessWebLists",
    UseClientIntegration = 37 => "useClientIntegration",
    UseRemoteApis = 38 => "useRemoteAPIs",
    ManageAlerts = 39 => "manageAlerts",
    CreateAlerts = 40 => "createAlerts",
    EditMyUserInfo = 41 => "editMyUserInfo",
    EnumeratePermissions = 63 => "enumeratePermissions",
    FullMask = 65 => "fullMask",
}

impl PermissionKind {
    /// Finds a permission by number or by camel-case name.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => {
                let number = number.as_u64()?;
                Self::ALL
                    .iter()
                    .copied()
                    .find(|kind| u64::from(kind.value()) == number)
            }
            Value::String(name) => Self::ALL
                .iter()
                .copied()
                .find(|kind| kind.name().eq_ignore_ascii_case(name)),
            _ => None,
        }
    }
}

/// Effective permission masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasePermissions {
    high: u32,
    low: u32,
}

impl BasePermissions {
    /// Creates masks from their raw values.
    pub fn new(high: u32, low: u32) -> Self {
        Self { high, low }
    }

    /// Reads `{High, Low}`, given as numbers or numeric strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        let mask = |name: &str| match value.get(name)? {
            Value::Number(number) => number.as_u64().and_then(|mask| u32::try_from(mask).ok()),
            Value::String(text) => text.parse().ok(),
            _ => None,
        };
        Some(Self::new(mask("High")?, mask("Low")?))
    }

    /// The high mask.
    pub fn high(self) -> u32 {
        self.high
    }

    /// The low mask.
    pub fn low(self) -> u32 {
        self.low
    }

    /// Whether `kind` is granted.
    pub fn has(self, kind: PermissionKind) -> bool {
        match kind {
            PermissionKind::EmptyMask => true,
            PermissionKind::FullMask => (self.high & 0x7FFF) == 0x7FFF && self.low == u32::MAX,
            other => {
                let bit = u32::from(other.value()) - 1;
                if bit < 32 {
                    self.low & (1 << bit) != 0
                } else {
                    self.high & (1 << (bit - 32)) != 0
                }
            }
        }
    }

    /// Whether every kind of `kinds` is granted.
    pub fn has_all(self, kinds: &[PermissionKind]) -> bool {
        kinds.iter().all(|kind| self.has(*kind))
    }
}

/// Parses the permissions argument of `hasAccess`: one kind or an array of kinds.
pub(crate) fn parse_kinds(value: Option<&Value>) -> Option<Vec<PermissionKind>> {
    match value? {
        Value::Array(values) => values.iter().map(PermissionKind::from_value).collect(),
        single => PermissionKind::from_value(single).map(|kind| vec![kind]),
    }
}

/// Checks `kinds` for `user` on `resource`.
///
/// Sites are checked on their root web. Webs default to the current user.
pub(crate) fn has_access<'a>(
    resource: &'a Resource,
    user: Option<String>,
    kinds: Vec<PermissionKind>,
) -> BoxFuture<'a, Result<bool, RestError>> {
    Box::pin(async move {
        if resource.metadata_type() == Some(SITE_TYPE) {
            let root = root_web(resource).await?.load().await?;
            return has_access(&root, None, kinds).await;
        }

        let user = match user {
            Some(user) => Some(user),
            None if resource.metadata_type() == Some(WEB_TYPE) => {
                let current = resource.linked("CurrentUser", "currentuser").load().await?;
                current
                    .property("LoginName")
                    .and_then(Value::as_str)
                    .map(ToString::to_string)
            }
            None => None,
        };

        let args = user.map_or_else(Args::new, |user| args![user]);
        let permissions = resource
            .invoke("getUserEffectivePermissions", args)
            .await?
            .load()
            .await?;
        if !permissions.exists() {
            return Ok(false);
        }

        let masks = permissions
            .property(EFFECTIVE_PERMISSIONS)
            .and_then(BasePermissions::from_json)
            .ok_or_else(|| RestError::MissingProperty {
                name: EFFECTIVE_PERMISSIONS.to_string(),
                endpoint: permissions.descriptor().endpoint().to_string(),
            })?;
        let granted = masks.has_all(&kinds);
        debug!(?kinds, granted, "permissions checked");
        Ok(granted)
    })
}

/// The root web of a site: resolved from its `RootWeb` in an app web, else the site URL.
async fn root_web(site: &Resource) -> Result<Pending, RestError> {
    let context = site.context();
    let url = if context.is_app_web() {
        let root = site.linked("RootWeb", "rootweb").load().await?;
        let relative = root
            .property("ServerRelativeUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| RestError::MissingProperty {
                name: "ServerRelativeUrl".to_string(),
                endpoint: root.descriptor().endpoint().to_string(),
            })?;
        format!("{}{relative}", context.domain_url()?)
    } else {
        context.site_absolute_url().to_string()
    };

    let descriptor = site
        .session()
        .descriptor(url, "web", site.descriptor().mode());
    Ok(Pending::new(Arc::clone(site.session()), descriptor))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json_accepts_strings_and_numbers() {
        let masks = BasePermissions::from_json(&json!({ "High": "432", "Low": 1_011_030_767 }));

        assert_eq!(masks, Some(BasePermissions::new(432, 1_011_030_767)));
    }

    #[rstest]
    #[case(PermissionKind::EmptyMask, true)]
    #[case(PermissionKind::ViewListItems, true)]
    #[case(PermissionKind::EditListItems, true)]
    #[case(PermissionKind::ManageLists, false)]
    #[case(PermissionKind::AnonymousSearchAccessWebLists, false)]
    #[case(PermissionKind::UseClientIntegration, true)]
    #[case(PermissionKind::EnumeratePermissions, false)]
    #[case(PermissionKind::FullMask, false)]
    fn test_has(#[case] kind: PermissionKind, #[case] expected: bool) {
        // low: items 1..=4, high: bit 4 (useClientIntegration)
        let masks = BasePermissions::new(0b1_0000, 0b1111);

        assert_eq!(masks.has(kind), expected);
    }

    #[test]
    fn test_full_mask() {
        let masks = BasePermissions::new(0x7FFF_FFFF, u32::MAX);

        assert!(masks.has(PermissionKind::FullMask));
        assert!(masks.has_all(PermissionKind::ALL));
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(
            parse_kinds(Some(&json!(["viewListItems", 3]))),
            Some(vec![PermissionKind::ViewListItems, PermissionKind::EditListItems])
        );
        assert_eq!(parse_kinds(Some(&json!("manageWeb"))), Some(vec![PermissionKind::ManageWeb]));
        assert_eq!(parse_kinds(Some(&json!(["unknown"]))), None);
        assert_eq!(parse_kinds(None), None);
    }
}
