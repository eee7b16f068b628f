//! Hand-written operation bodies.
//!
//! Each function has the [`CustomFn`](super::CustomFn) signature and is referenced from
//! the operation table. Targets come from the table entry (`Op::custom(..).at(path)`).

use std::sync::Arc;

use serde_json::{Map, Value, json};

use super::OperationSpec;
use crate::RestError;
use crate::permissions::{self, PermissionKind};
use crate::resource::{Args, GetCall, Pending, PostCall, Reply, Resource};
use crate::transport::BoxFuture;

const SEND_EMAIL: &str = "_api/SP.Utilities.Utility.SendEmail";
const SEARCH_QUERY: &str = "query";
const SEARCH_POST_QUERY: &str = "postquery";
const ONE_DRIVE_PAGE: &str = "_layouts/15/onedrive.aspx";
const CLAIMS_LOGIN_PREFIX: &str = "i:0#.f|";
/// `SP.AddFieldOptions.addFieldInternalNameHint`.
const ADD_FIELD_INTERNAL_NAME_HINT: u8 = 8;

type Outcome<'a> = BoxFuture<'a, Result<Reply, RestError>>;

fn target(spec: &'static OperationSpec) -> &'static str {
    spec.target_path().unwrap_or_else(|| spec.name())
}

fn invalid(spec: &OperationSpec, message: &str) -> RestError {
    RestError::InvalidArguments {
        operation: spec.name().to_string(),
        message: message.to_string(),
    }
}

fn missing(resource: &Resource, name: &str) -> RestError {
    RestError::MissingProperty {
        name: name.to_string(),
        endpoint: resource.descriptor().endpoint().to_string(),
    }
}

/// Adds `__metadata.type` to an object argument (an absent argument is an empty object).
fn typed(
    spec: &OperationSpec,
    value: Option<Value>,
    metadata_type: &str,
) -> Result<Value, RestError> {
    let mut object = match value {
        None => Map::new(),
        Some(Value::Object(object)) => object,
        Some(_) => return Err(invalid(spec, "an object is expected")),
    };
    object.insert("__metadata".to_string(), json!({ "type": metadata_type }));
    Ok(Value::Object(object))
}

/// A scalar rendered as it appears in a filter (`Id eq 5`).
fn raw_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

async fn post_in_body(resource: &Resource, name: &str, data: Value) -> Result<Reply, RestError> {
    resource
        .execute_post(PostCall::method(name).with_data(data).in_body())
        .await
}

fn rest_creation_data(
    spec: &OperationSpec,
    id: Option<Value>,
    data: Option<Value>,
) -> Result<Value, RestError> {
    Ok(json!({
        "restCreationData": {
            "__metadata": { "type": "SP.Social.SocialRestPostCreationData" },
            "ID": id.unwrap_or_default(),
            "creationData": typed(spec, data, "SP.Social.SocialPostCreationData")?,
        }
    }))
}

async fn property_of(pending: Pending, name: &str) -> Result<Reply, RestError> {
    let resource = pending.load().await?;
    if !resource.exists() {
        return Ok(Reply::Absent);
    }
    let value = resource
        .property(name)
        .cloned()
        .ok_or_else(|| missing(&resource, name))?;
    Ok(Reply::Value(value))
}

/// `containsUser(user)`: whether the group has a member with the user's `Id`.
pub(crate) fn contains_user<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let user = args.get(0).ok_or_else(|| invalid(spec, "a user is required"))?;
        let id = user.get("Id").unwrap_or(user);
        let filter = format!("{}?$filter=Id eq {}", target(spec), raw_scalar(id));

        let members = resource.navigation(GetCall::method(filter)).load().await?;
        Ok(Reply::Value(Value::Bool(members.exists())))
    })
}

/// `addFieldAsXml(schemaXml)`.
pub(crate) fn add_field_as_xml<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let schema = args.get(0).ok_or_else(|| invalid(spec, "a schema is required"))?;
        let data = json!({
            "parameters": {
                "__metadata": { "type": "SP.XmlSchemaFieldCreationInformation" },
                "Options": ADD_FIELD_INTERNAL_NAME_HINT,
                "SchemaXml": schema,
            }
        });
        post_in_body(resource, target(spec), data).await
    })
}

/// `addSubFolder(name)` on a list: delegated to its root folder.
pub(crate) fn add_sub_folder_to_root_folder<'a>(
    resource: &'a Resource,
    _spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let folder = resource.linked("RootFolder", "rootfolder").load().await?;
        folder.invoke("addSubFolder", args).await
    })
}

/// `getDefault{Display,Edit,New}FormUrl()`: the URL of the matching form.
pub(crate) fn default_form_url<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    _args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let form = resource.navigation(GetCall::method(target(spec)));
        property_of(form, "ServerRelativeUrl").await
    })
}

/// `getDefaultViewUrl()`.
pub(crate) fn default_view_url<'a>(
    resource: &'a Resource,
    _spec: &'static OperationSpec,
    _args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let view = resource.linked("DefaultView", "defaultview");
        property_of(view, "ServerRelativeUrl").await
    })
}

/// `getItemsByFilter(filter)`: the filter is an OData expression, used as-is.
pub(crate) fn items_by_filter<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let filter = args.text(0).ok_or_else(|| invalid(spec, "a filter is required"))?;
        let name = format!("{}?$filter={filter}", target(spec));
        Ok(Reply::Pending(resource.navigation(GetCall::method(name))))
    })
}

fn permission_kinds(
    spec: &OperationSpec,
    value: Option<&Value>,
) -> Result<Vec<PermissionKind>, RestError> {
    permissions::parse_kinds(value).ok_or_else(|| invalid(spec, "unknown permission kind"))
}

/// `hasAccess(userName, permissions)` on a list.
pub(crate) fn has_access_for_user<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let user = args.text(0).map(ToString::to_string);
        let kinds = permission_kinds(spec, args.get(1))?;
        let granted = permissions::has_access(resource, user, kinds).await?;
        Ok(Reply::Value(Value::Bool(granted)))
    })
}

/// `hasAccess(permissions)` on a web (current user) or a site (its root web).
pub(crate) fn has_access<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let kinds = permission_kinds(spec, args.get(0))?;
        let granted = permissions::has_access(resource, None, kinds).await?;
        Ok(Reply::Value(Value::Bool(granted)))
    })
}

/// `query(q)`: a query string is a lazy `GET`, a request object a `POST` of `postquery`.
pub(crate) fn search_query<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        match args.take(0) {
            Some(Value::String(query)) => {
                let name = format!("{SEARCH_QUERY}?{query}");
                Ok(Reply::Pending(resource.navigation(GetCall::method(name))))
            }
            request => {
                let request = typed(spec, request, "Microsoft.Office.Server.Search.REST.SearchRequest")?;
                post_in_body(resource, SEARCH_POST_QUERY, json!({ "request": request })).await
            }
        }
    })
}

/// `querySuggestion(q)`.
pub(crate) fn query_suggestion<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let query = args.text(0).unwrap_or_default();
        let name = format!("{}?{query}", target(spec));
        Ok(Reply::Pending(resource.navigation(GetCall::method(name))))
    })
}

/// `getRootWeb()` on a site: the web at the site's server-relative URL.
pub(crate) fn root_web<'a>(
    resource: &'a Resource,
    _spec: &'static OperationSpec,
    _args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let relative = resource
            .property("ServerRelativeUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| missing(resource, "ServerRelativeUrl"))?;
        let url = resource.context().resolve_host_url(relative)?;

        let descriptor = resource
            .session()
            .descriptor(url, "web", resource.descriptor().mode());
        Ok(Reply::Pending(Pending::new(Arc::clone(resource.session()), descriptor)))
    })
}

/// `sendEmail(properties)`.
pub(crate) fn send_email<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let properties = typed(spec, args.take(0), "SP.Utilities.EmailProperties")?;
        post_in_body(resource, SEND_EMAIL, json!({ "properties": properties })).await
    })
}

/// `createPost(creationData)`.
pub(crate) fn create_post<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let data = rest_creation_data(spec, None, args.take(0))?;
        post_in_body(resource, target(spec), data).await
    })
}

/// `<action>Post(id)`: a post action addressed by id.
pub(crate) fn post_by_id<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let id = args.take(0).ok_or_else(|| invalid(spec, "a post id is required"))?;
        post_in_body(resource, target(spec), json!({ "ID": id })).await
    })
}

/// `getUser(user)`: claims logins travel as a parameter alias, other accounts in the path.
pub(crate) fn social_actor<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let user = args.take(0).ok_or_else(|| invalid(spec, "a user is required"))?;
        let call = GetCall::method(target(spec));
        let call = if user.as_str().is_some_and(|user| user.starts_with(CLAIMS_LOGIN_PREFIX)) {
            call.with_data(user)
        } else {
            call.with_arg(user)
        };
        resource.execute_get(call).await
    })
}

/// `replyToPost(id, creationData)`.
pub(crate) fn reply_to_post<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let id = args.take(0).ok_or_else(|| invalid(spec, "a post id is required"))?;
        let data = rest_creation_data(spec, Some(id), args.take(1))?;
        post_in_body(resource, target(spec), data).await
    })
}

fn thread_id(resource: &Resource, spec: &OperationSpec, id: Option<Value>) -> Result<Value, RestError> {
    id.or_else(|| resource.property("ID").filter(|id| !id.is_null()).cloned())
        .ok_or_else(|| invalid(spec, "a thread id is required"))
}

/// `delete`, `like`, `lock`, `unlike`, `unlock` on a thread, defaulting to its own `ID`.
pub(crate) fn thread_action<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let id = thread_id(resource, spec, args.take(0))?;
        post_in_body(resource, target(spec), json!({ "ID": id })).await
    })
}

/// `reply(creationData, id)` on a thread, defaulting to its own `ID`.
pub(crate) fn thread_reply<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let id = thread_id(resource, spec, args.take(1))?;
        let data = rest_creation_data(spec, Some(id), args.take(0))?;
        post_in_body(resource, target(spec), data).await
    })
}

/// `getOneDriveUrl()` on a user profile.
pub(crate) fn one_drive_url<'a>(
    resource: &'a Resource,
    _spec: &'static OperationSpec,
    _args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let site = resource
            .property("FollowPersonalSiteUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| missing(resource, "FollowPersonalSiteUrl"))?;
        Ok(Reply::Value(Value::String(format!("{site}{ONE_DRIVE_PAGE}"))))
    })
}

/// `addSiteGroup(title)` on a web.
pub(crate) fn add_site_group<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let title = args.take(0).ok_or_else(|| invalid(spec, "a title is required"))?;
        let call = PostCall::method(target(spec))
            .with_data(json!({ "Title": title }))
            .with_metadata_type("SP.Group")
            .in_body();
        resource.execute_post(call).await
    })
}

/// `addWeb(information)`: delegated to the `webs` collection.
pub(crate) fn add_web<'a>(
    resource: &'a Resource,
    _spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let webs = resource.linked("Webs", "webs").load().await?;
        webs.invoke("add", args).await
    })
}

/// `getUserById(id)` on a web.
pub(crate) fn user_by_id<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let id = args.get(0).ok_or_else(|| invalid(spec, "a user id is required"))?;
        let name = format!("{}?$filter=Id eq {}", target(spec), raw_scalar(id));
        Ok(Reply::Pending(resource.navigation(GetCall::method(name))))
    })
}

/// `add(information)` on the `webs` collection.
pub(crate) fn add_web_information<'a>(
    resource: &'a Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Outcome<'a> {
    Box::pin(async move {
        let parameters = typed(spec, args.take(0), "SP.WebCreationInformation")?;
        post_in_body(resource, target(spec), json!({ "parameters": parameters })).await
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_typed_stamps_objects() {
        let spec = OperationSpec::post("sendEmail");

        let properties = json!({ "To": { "results": ["a@contoso.example.com"] } });

        let value = typed(&spec, Some(properties), "SP.Utilities.EmailProperties").expect("an object");

        assert_eq!(
            value,
            json!({
                "To": { "results": ["a@contoso.example.com"] },
                "__metadata": { "type": "SP.Utilities.EmailProperties" }
            })
        );
    }

    #[test]
    fn test_typed_rejects_scalars() {
        let spec = OperationSpec::post("sendEmail");

        let result = typed(&spec, Some(json!("hello")), "SP.Utilities.EmailProperties");

        assert!(matches!(result, Err(RestError::InvalidArguments { .. })));
    }

    #[test]
    fn test_rest_creation_data() {
        let spec = OperationSpec::post("createPost");

        let data = rest_creation_data(&spec, None, Some(json!({ "ContentText": "Hello" })))
            .expect("valid data");

        let pretty = serde_json::to_string_pretty(&data).expect("serializable");
        insta::assert_snapshot!(pretty, @r#"
        {
          "restCreationData": {
            "__metadata": {
              "type": "SP.Social.SocialRestPostCreationData"
            },
            "ID": null,
            "creationData": {
              "ContentText": "Hello",
              "__metadata": {
                "type": "SP.Social.SocialPostCreationData"
              }
            }
          }
        }
        "#);
    }
}
