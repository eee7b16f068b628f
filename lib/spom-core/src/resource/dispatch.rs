//! Argument conventions turned into generic operation calls.

use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use super::{Args, GetCall, PostCall, Reply, Resource};
use crate::RestError;
use crate::registry::{ArgumentConvention, CustomOperation, OperationSpec, Stamp, quirks};
use crate::request::method::{FILTER_MARKER, format_method_name};
use crate::request::{HttpVerb, encode_uri_component};

/// A prepared generic operation call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Get(GetCall),
    Post(PostCall),
}

/// Runs `spec` on `resource`.
pub(crate) async fn dispatch(
    resource: &Resource,
    spec: &'static OperationSpec,
    args: Args,
) -> Result<Reply, RestError> {
    debug!(operation = spec.name(), key = resource.key(), "dispatching");

    if let ArgumentConvention::Custom(CustomOperation(body)) = spec.convention() {
        return body(resource, spec, args).await;
    }

    match prepare(resource, spec, args)? {
        Call::Get(call) => resource.execute_get(call).await,
        Call::Post(call) => resource.execute_post(call).await,
    }
}

/// Builds the generic call of a declarative operation.
pub(crate) fn prepare(
    resource: &Resource,
    spec: &'static OperationSpec,
    mut args: Args,
) -> Result<Call, RestError> {
    let target = spec.target_path();
    let mut recipe = Recipe::default();

    match spec.convention() {
        ArgumentConvention::None => {
            recipe.name = target.map(ToString::to_string);
        }
        ArgumentConvention::PathSegmentArg => {
            recipe.name = target.map(ToString::to_string);
            recipe.arg = args.take(0);
            recipe.data = args.take(1);
            recipe.metadata_type = args.text(2).map(ToString::to_string);
        }
        ArgumentConvention::KeyArg => {
            let key = args.get(0).ok_or_else(|| invalid(spec, "a key is required"))?;
            let key = match key {
                Value::String(key) => key.clone(),
                other => other.to_string(),
            };
            recipe.name = Some(format!("{}({key})", target.unwrap_or_default()));
        }
        ArgumentConvention::ParameterAlias => {
            recipe.name = target.map(ToString::to_string);
            recipe.data = args.take(0);
        }
        ArgumentConvention::QueryFilterArg { fields } => {
            let value = args.get(0).ok_or_else(|| invalid(spec, "a value to match is required"))?;
            let value = match value {
                Value::String(value) => encode_uri_component(value),
                other => other.to_string(),
            };
            let clauses = fields
                .iter()
                .map(|field| format!("{field} eq '{value}'"))
                .collect::<Vec<_>>()
                .join(" or ");
            recipe.name = Some(format!(
                "{}{FILTER_MARKER}={clauses}",
                target.unwrap_or_default()
            ));
        }
        ArgumentConvention::BodyArg => {
            let alias = quirks::parameter_alias(resource.metadata_type());
            recipe.name =
                target.map(|target| format_method_name(target, args.get(0), None, alias));
            recipe.data = args.take(1);
            recipe.content = args.take_content();
            recipe.metadata_type = args.text(2).map(ToString::to_string);
            recipe.in_body = true;
        }
        ArgumentConvention::BodyArgNoPathArg => {
            recipe.name = target.map(ToString::to_string);
            recipe.data = args.take(0);
            recipe.content = args.take_content();
            recipe.metadata_type = args.text(1).map(ToString::to_string);
            recipe.in_body = true;
        }
        ArgumentConvention::BufferResponse => {
            recipe.name = target.map(ToString::to_string);
            recipe.buffer = true;
        }
        ArgumentConvention::AppendToPath => {
            recipe.suffix = target.map(ToString::to_string);
        }
        ArgumentConvention::Custom(_) => {
            return Err(RestError::NotNavigable {
                name: spec.name().to_string(),
            });
        }
    }

    match spec.stamp() {
        Stamp::None => {}
        Stamp::Fixed(metadata_type) => recipe.metadata_type = Some(metadata_type.to_string()),
        Stamp::OwnType => recipe.metadata_type = resource.metadata_type().map(ToString::to_string),
    }

    Ok(recipe.into_call(spec.verb()))
}

fn invalid(spec: &OperationSpec, message: &str) -> RestError {
    RestError::InvalidArguments {
        operation: spec.name().to_string(),
        message: message.to_string(),
    }
}

#[derive(Debug, Default)]
struct Recipe {
    name: Option<String>,
    arg: Option<Value>,
    data: Option<Value>,
    content: Option<Bytes>,
    metadata_type: Option<String>,
    suffix: Option<String>,
    in_body: bool,
    buffer: bool,
}

impl Recipe {
    fn into_call(self, verb: HttpVerb) -> Call {
        if verb == HttpVerb::Get {
            Call::Get(GetCall {
                name: self.name,
                arg: self.arg,
                data: self.data,
                in_body: self.in_body,
                buffer: self.buffer,
                metadata_type: self.metadata_type,
                suffix: self.suffix,
            })
        } else {
            Call::Post(PostCall {
                name: self.name,
                arg: self.arg,
                data: self.data,
                content: self.content,
                in_body: self.in_body,
                metadata_type: self.metadata_type,
                verb,
                suffix: self.suffix,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::context::HostContext;
    use crate::envelope::Envelope;
    use crate::mapper;
    use crate::object::SourceRequest;
    use crate::registry::Registry;
    use crate::request::ExecutionMode;
    use crate::session::Session;
    use crate::transport::ScriptedTransport;

    fn resource(endpoint: &str, metadata_type: &str) -> Resource {
        let context = HostContext {
            web_absolute_url: "https://contoso.example.com/sites/dev".to_string(),
            site_absolute_url: "https://contoso.example.com/sites/dev".to_string(),
            ..HostContext::default()
        };
        let session = Arc::new(Session::new(context, Arc::new(ScriptedTransport::new())));
        let descriptor = session.descriptor(
            "https://contoso.example.com/sites/dev",
            endpoint,
            ExecutionMode::Asynchronous,
        );
        let source = SourceRequest::new(HttpVerb::Get, &descriptor);
        let envelope = Envelope::from_value(json!({ "d": { "__metadata": { "type": metadata_type } } }));
        Resource::new(session, mapper::map(descriptor, source, &envelope))
    }

    fn spec(key: &str, name: &str) -> &'static OperationSpec {
        Registry::global()
            .lookup(key)
            .iter()
            .find(|operation| operation.name() == name)
            .expect("registered operation")
    }

    fn prepared(resource: &Resource, key: &str, name: &str, args: Args) -> Call {
        prepare(resource, spec(key, name), args).expect("valid call")
    }

    #[test]
    fn test_query_filter_recipe() {
        let web = resource("web", "SP.Web");

        let call = prepared(&web, "SP.Web", "getListByTitle", crate::args!["Q&A"]);

        let Call::Get(call) = call else {
            panic!("expected a GET");
        };
        assert_eq!(call.name.as_deref(), Some("lists?$filter=Title eq 'Q%26A'"));
    }

    #[test]
    fn test_query_filter_over_several_fields() {
        let list = resource("web/lists(1)", "SP.List");

        let Call::Get(call) = prepared(&list, "SP.List", "getField", crate::args!["Due"]) else {
            panic!("expected a GET");
        };

        insta::assert_snapshot!(call.name.unwrap_or_default(), @"fields?$filter=Title eq 'Due' or InternalName eq 'Due' or StaticName eq 'Due'");
    }

    #[test]
    fn test_key_recipe_keeps_raw_key() {
        let list = resource("web/lists(1)", "SP.List");

        let Call::Get(call) = prepared(&list, "SP.List", "getItemById", crate::args!["5"]) else {
            panic!("expected a GET");
        };

        assert_eq!(call.name.as_deref(), Some("items(5)"));
    }

    #[test]
    fn test_missing_key_is_invalid() {
        let list = resource("web/lists(1)", "SP.List");

        let result = prepare(&list, spec("SP.List", "getItemById"), Args::new());

        assert!(matches!(result, Err(RestError::InvalidArguments { .. })));
    }

    #[test]
    fn test_update_recipe_merges_self_with_fixed_type() {
        let list = resource("web/lists(1)", "SP.List");

        let call = prepared(&list, "SP.List", "update", crate::args![{ "Title": "New" }]);

        assert_eq!(
            call,
            Call::Post(PostCall {
                name: None,
                arg: None,
                data: Some(json!({ "Title": "New" })),
                content: None,
                in_body: true,
                metadata_type: Some("SP.List".to_string()),
                verb: HttpVerb::Merge,
                suffix: None,
            })
        );
    }

    #[test]
    fn test_list_item_update_uses_own_type() {
        let item = resource("web/lists(1)/items(5)", "SP.Data.TasksListItem");

        let Call::Post(call) = prepared(&item, "SP.ListItem", "update", crate::args![{ "Title": "Done" }]) else {
            panic!("expected a POST");
        };

        assert_eq!(call.metadata_type.as_deref(), Some("SP.Data.TasksListItem"));
    }

    #[test]
    fn test_body_arg_recipe_formats_path_argument() {
        let file = resource("web/getFileByServerRelativeUrl('/a.txt')", "SP.File");
        let args = crate::args![{ "uploadId": 7 }].with_content(Bytes::from_static(b"chunk"));

        let Call::Post(call) = prepared(&file, "SP.File", "startUpload", args) else {
            panic!("expected a POST");
        };

        assert_eq!(call.name.as_deref(), Some("startUpload(uploadId=7)"));
        assert!(call.in_body);
        assert_eq!(call.content.as_deref(), Some(&b"chunk"[..]));
    }

    #[test]
    fn test_append_to_path_recipe() {
        let people = resource("sp.userprofiles.peoplemanager", "SP.UserProfiles.PeopleManager");

        let Call::Get(call) = prepared(&people, "SP.UserProfiles.PeopleManager", "getTrendingTags", Args::new()) else {
            panic!("expected a GET");
        };

        assert_eq!(call.name, None);
        assert_eq!(call.suffix.as_deref(), Some("getTrendingTags"));
    }
}
