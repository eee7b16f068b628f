//! Response mapping: envelope to [`MappedObject`].

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::envelope::Envelope;
use crate::object::{DeferredLink, MappedObject, Metadata, Results, SourceRequest};
use crate::request::{Descriptor, HttpVerb};
use crate::synth;

const APP_CONTEXT_API: &str = "/_api/SP.AppContextSite(@target)/";
const API: &str = "/_api/";

/// Endpoint addressed by an absolute resource `uri`.
///
/// A uri outside the REST API is taken relative to `current_endpoint`.
pub(crate) fn uri_endpoint(uri: &str, current_endpoint: &str) -> String {
    if let Some((_, endpoint)) = uri
        .split_once(APP_CONTEXT_API)
        .or_else(|| uri.split_once(API))
    {
        return endpoint.to_string();
    }

    warn!(uri, "uri outside of the REST API, resolved against the current endpoint");
    let leaf = uri.rsplit('/').next().unwrap_or(uri);
    if current_endpoint.is_empty() {
        leaf.to_string()
    } else {
        format!("{current_endpoint}/{leaf}")
    }
}

/// Maps `envelope` onto `descriptor`.
pub(crate) fn map(descriptor: Descriptor, source: SourceRequest, envelope: &Envelope) -> MappedObject {
    let mut target = MappedObject::unpopulated(descriptor, source);
    populate(&mut target, envelope.payload(), envelope.exists(), None);
    target
}

fn populate(
    target: &mut MappedObject,
    data: Option<&Map<String, Value>>,
    exists: bool,
    parent: Option<&Descriptor>,
) {
    target.exists = exists;
    let Some(mut data) = data else {
        return;
    };

    if let Some(parent) = parent {
        target.descriptor.template = parent.template.clone();
        target.descriptor.base_url.clone_from(&parent.base_url);
        target.descriptor.mode = parent.mode;
        if let Some(uri) = metadata_uri(data) {
            target.descriptor.endpoint = uri_endpoint(uri, &parent.endpoint);
            target
                .descriptor
                .template
                .align_target_separator(&target.descriptor.endpoint);
        } else {
            target.descriptor.endpoint.clone_from(&parent.endpoint);
        }
    }

    let mut collapsed = false;
    if let Some(results) = data.get("results").and_then(Value::as_array)
        && target.descriptor.is_filter_query()
    {
        target.exists = !results.is_empty();
        if let [Value::Object(single)] = results.as_slice() {
            collapsed = true;
            data = single;
            if let Some(uri) = metadata_uri(data) {
                target.descriptor.endpoint = uri_endpoint(uri, &target.descriptor.endpoint);
            }
            target.descriptor.template.use_first_target_separator();
            info!(endpoint = %target.descriptor.endpoint, "filter matched a single resource");
        }
    }

    copy_properties(target, data, collapsed);
    synth::attach(target);
    if parent.is_some() {
        target.source = SourceRequest::new(HttpVerb::Get, &target.descriptor);
    }

    if collapsed {
        target.results = Some(Results::Collapsed);
    } else if let Some(members) = data.get("results").and_then(Value::as_array) {
        let parent = target.descriptor.clone();
        let members = members
            .iter()
            .map(|member| {
                let mut child = MappedObject::unpopulated(parent.clone(), target.source.clone());
                let payload = member.as_object();
                let exists = payload.is_some_and(|payload| !payload.contains_key("error"));
                populate(&mut child, payload, exists, Some(&parent));
                child
            })
            .collect();
        target.results = Some(Results::Members(members));
    }
}

fn copy_properties(target: &mut MappedObject, data: &Map<String, Value>, collapsed: bool) {
    for (name, value) in data {
        match name.as_str() {
            "__metadata" => {
                target.metadata = Some(Metadata::from_value(value));
                continue;
            }
            "results" if !collapsed && value.is_array() => continue,
            _ => {}
        }

        let deferred_uri = value
            .get("__deferred")
            .and_then(|deferred| deferred.get("uri"))
            .and_then(Value::as_str);
        if let Some(uri) = deferred_uri {
            let link = DeferredLink {
                base_url: target.descriptor.base_url.clone(),
                endpoint: uri_endpoint(uri, &target.descriptor.endpoint),
            };
            target.deferred.insert(name.clone(), link);
        } else {
            target.properties.insert(name.clone(), value.clone());
        }
    }
}

fn metadata_uri(data: &Map<String, Value>) -> Option<&str> {
    data.get("__metadata")
        .and_then(|metadata| metadata.get("uri"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::HostContext;
    use crate::request::ExecutionMode;

    const HOST: &str = "https://contoso.example.com/sites/dev";

    fn context(is_app_web: bool) -> HostContext {
        HostContext {
            web_absolute_url: if is_app_web {
                "https://app-1.example.net/sites/dev/App".to_string()
            } else {
                HOST.to_string()
            },
            site_absolute_url: HOST.to_string(),
            is_app_web,
            ..HostContext::default()
        }
    }

    fn map_json(context: &HostContext, endpoint: &str, body: Value) -> MappedObject {
        let descriptor = Descriptor::new(context, HOST, endpoint, ExecutionMode::Asynchronous);
        let source = SourceRequest::new(HttpVerb::Get, &descriptor);
        map(descriptor, source, &Envelope::from_value(body))
    }

    #[test]
    fn test_uri_endpoint() {
        assert_eq!(
            uri_endpoint("https://contoso.example.com/sites/dev/_api/Web/Lists(guid'1')", "web"),
            "Web/Lists(guid'1')"
        );
        assert_eq!(
            uri_endpoint(
                "https://app.example.net/_api/SP.AppContextSite(@target)/web/lists(1)",
                "web"
            ),
            "web/lists(1)"
        );
        assert_eq!(uri_endpoint("https://other.example.com/x/Items", "web/lists(1)"), "web/lists(1)/Items");
    }

    #[test]
    fn test_single_resource_properties_and_deferred_links() {
        let object = map_json(
            &context(false),
            "web",
            json!({ "d": {
                "__metadata": { "type": "SP.Web", "uri": format!("{HOST}/_api/Web") },
                "Title": "Dev",
                "Description": null,
                "Lists": { "__deferred": { "uri": format!("{HOST}/_api/Web/Lists") } }
            }}),
        );

        assert!(object.exists());
        assert_eq!(object.key(), "SP.Web");
        assert_eq!(object.property("Title"), Some(&json!("Dev")));
        assert_eq!(object.property("Description"), Some(&Value::Null));
        assert_eq!(object.property("__metadata"), None);
        let lists = object.deferred().get("Lists").expect("deferred Lists");
        assert_eq!(lists.endpoint(), "Web/Lists");
        assert_eq!(lists.base_url(), HOST);
        assert!(object.operation_names().contains(&"get_Lists".to_string()));
    }

    #[test]
    fn test_collection_members_are_mapped_with_their_own_endpoint() {
        let object = map_json(
            &context(false),
            "web/lists",
            json!({ "d": { "results": [
                { "__metadata": { "type": "SP.List", "uri": format!("{HOST}/_api/Web/Lists(guid'1')") }, "Id": "1", "Title": "Tasks" },
                { "__metadata": { "type": "SP.List", "uri": format!("{HOST}/_api/Web/Lists(guid'2')") }, "Id": "2", "Title": "Documents" }
            ]}}),
        );

        assert!(object.exists());
        assert_eq!(object.key(), "lists");
        let results = object.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].descriptor().endpoint(), "Web/Lists(guid'2')");
        assert_eq!(results[1].key(), "SP.List");
        assert!(object.operation_names().contains(&"getById".to_string()));
        let documents = object.get_by_title(&json!("Documents")).expect("found by title");
        assert_eq!(documents.property("Id"), Some(&json!("2")));
        assert!(object.get_by_id(&json!(1)).is_some());
    }

    #[test]
    fn test_filter_with_single_result_collapses() {
        let object = map_json(
            &context(true),
            "web/lists?$filter=Title eq 'Tasks'",
            json!({ "d": { "results": [
                { "__metadata": { "type": "SP.List", "uri": format!("{HOST}/_api/web/lists(1)") }, "Id": "1", "Title": "Tasks" }
            ]}}),
        );

        assert!(object.exists());
        assert_eq!(object.key(), "SP.List");
        assert_eq!(object.descriptor().endpoint(), "web/lists(1)");
        insta::assert_snapshot!(object.descriptor().request_url(), @"https://app-1.example.net/sites/dev/App/_api/SP.AppContextSite(@target)/web/lists(1)?@target='https://contoso.example.com/sites/dev'");
        let results = object.results();
        assert_eq!(results.len(), 1);
        assert!(std::ptr::eq(results[0], &object));
    }

    #[test]
    fn test_filter_with_no_result_does_not_exist() {
        let object = map_json(
            &context(false),
            "web/lists?$filter=Title eq 'Missing'",
            json!({ "d": { "results": [] } }),
        );

        assert!(!object.exists());
        assert!(object.results().is_empty());
        assert!(object.get_by_id(&json!(1)).is_none());
        assert!(object.get_by_title(&json!("Missing")).is_none());
    }

    #[test]
    fn test_filter_with_many_results_stays_a_collection() {
        let object = map_json(
            &context(false),
            "web/fields?$filter=Group eq 'Custom'",
            json!({ "d": { "results": [
                { "__metadata": { "type": "SP.FieldText" }, "Id": "a", "InternalName": "First" },
                { "__metadata": { "type": "SP.FieldNumber" }, "Id": "b", "InternalName": "Second" }
            ]}}),
        );

        assert!(object.exists());
        assert_eq!(object.results().len(), 2);
        let second = object.get_by_title(&json!("Second")).expect("by internal name");
        assert_eq!(second.key(), "SP.Field");
        assert_eq!(second.descriptor().endpoint(), "web/fields?$filter=Group eq 'Custom'");
    }

    #[test]
    fn test_app_web_members_get_their_own_target_separator() {
        let object = map_json(
            &context(true),
            "web/lists?$filter=Hidden eq false",
            json!({ "d": { "results": [
                { "__metadata": { "type": "SP.List", "uri": "https://app-1.example.net/sites/dev/App/_api/SP.AppContextSite(@target)/web/lists(1)" }, "Id": "1", "Title": "Tasks" },
                { "__metadata": { "type": "SP.List" }, "Id": "2", "Title": "Documents" }
            ]}}),
        );

        let results = object.results();
        insta::assert_snapshot!(results[0].descriptor().request_url(), @"https://app-1.example.net/sites/dev/App/_api/SP.AppContextSite(@target)/web/lists(1)?@target='https://contoso.example.com/sites/dev'");
        insta::assert_snapshot!(results[1].descriptor().request_url(), @"https://app-1.example.net/sites/dev/App/_api/SP.AppContextSite(@target)/web/lists?$filter=Hidden eq false&@target='https://contoso.example.com/sites/dev'");
    }

    #[test]
    fn test_available_fields_are_addressed_through_fields() {
        let collection = map_json(
            &context(false),
            "web/availablefields",
            json!({ "d": { "results": [
                { "__metadata": { "type": "SP.FieldText", "uri": format!("{HOST}/_api/Web/AvailableFields(guid'f1')") }, "InternalName": "Title" }
            ]}}),
        );
        let field = collection.results()[0];
        assert_eq!(field.descriptor().endpoint(), "Web/Fields(guid'f1')");
        assert_eq!(
            field.source.url,
            "https://contoso.example.com/sites/dev/_api/Web/Fields(guid'f1')"
        );
    }

    #[test]
    fn test_web_part_definitions_compare_nested_title() {
        let object = map_json(
            &context(false),
            "web/getFileByServerRelativeUrl('/sites/dev/default.aspx')/getLimitedWebPartManager(1)/WebParts?$expand=WebPart",
            json!({ "d": { "results": [
                { "__metadata": { "type": "SP.WebParts.WebPartDefinition" }, "Id": "w1", "WebPart": { "Title": "News" } },
                { "__metadata": { "type": "SP.WebParts.WebPartDefinition" }, "Id": "w2", "WebPart": { "Title": "Links" } }
            ]}}),
        );

        let links = object.get_by_title(&json!("Links")).expect("web part by title");

        assert_eq!(links.property("Id"), Some(&json!("w2")));
    }
}
