//! Response filter engine
//!
//! Reduces a JSON:API document from the Productive API to the smallest
//! equivalent an LLM needs: denied and empty attributes disappear, rich text
//! becomes plain text, pagination links go away and every top-level resource
//! gains a `webapp_url`. The engine is a pure function of its input and
//! never fails; unexpected shapes pass through pruned.
//!
//! Filtering an already filtered document returns it unchanged.

use serde_json::{Map, Value};

use crate::productive::html::html_to_text;
use crate::productive::rules::{rules_for, ResourceRules};

/// Key of the derived web link on top-level resources
pub const WEBAPP_URL: &str = "webapp_url";

/// Filtering profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Deny-list filtering, relationships and `included` kept
    Full,
    /// Minimal attribute subset, no relationships, no `included`
    Lightweight,
}

/// Filter engine bound to one organization's web app links
#[derive(Debug, Clone)]
pub struct ResponseFilter {
    organization_id: u64,
    webapp_base_url: String,
}

impl ResponseFilter {
    pub fn new(organization_id: u64, webapp_base_url: impl Into<String>) -> Self {
        Self {
            organization_id,
            webapp_base_url: webapp_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Filter a whole document.
    ///
    /// A collection `data` is always kept, possibly as `[]`; a singular
    /// `data` stays an object and is omitted when nothing survives.
    /// A bare resource (an object with `type` and `id` but no `data`) is
    /// filtered as a single top-level resource.
    pub fn filter_document(&self, document: &Value, mode: FilterMode) -> Value {
        let Some(doc) = document.as_object() else {
            return prune(document);
        };

        if !doc.contains_key("data") && doc.contains_key("type") && doc.contains_key("id") {
            return self.filter_resource(document, mode, true, None);
        }

        let included = doc.get("included").and_then(Value::as_array);
        let mut out = Map::new();

        match doc.get("data") {
            Some(Value::Array(items)) => {
                let filtered = items
                    .iter()
                    .map(|item| self.filter_resource(item, mode, true, included))
                    .filter(|item| !is_empty(item))
                    .collect();
                out.insert("data".to_string(), Value::Array(filtered));
            }
            Some(item @ Value::Object(_)) => {
                let filtered = self.filter_resource(item, mode, true, included);
                if !is_empty(&filtered) {
                    out.insert("data".to_string(), filtered);
                }
            }
            _ => {}
        }

        if let Some(meta) = doc.get("meta") {
            let cleaned = clean_meta(meta);
            if !is_empty(&cleaned) {
                out.insert("meta".to_string(), cleaned);
            }
        }

        if mode == FilterMode::Full {
            if let Some(included) = included {
                let filtered: Vec<Value> = included
                    .iter()
                    .map(|item| self.filter_resource(item, mode, false, None))
                    .filter(|item| !is_empty(item))
                    .collect();
                if !filtered.is_empty() {
                    out.insert("included".to_string(), Value::Array(filtered));
                }
            }
        }

        Value::Object(out)
    }

    /// Filter one resource object.
    ///
    /// `included` is the document's side table, used to resolve derived
    /// lightweight attributes such as the activity actor.
    pub fn filter_resource(
        &self,
        resource: &Value,
        mode: FilterMode,
        top_level: bool,
        included: Option<&Vec<Value>>,
    ) -> Value {
        let Some(obj) = resource.as_object() else {
            return prune(resource);
        };

        let resource_type = obj.get("type").and_then(Value::as_str).unwrap_or_default();
        let rules = rules_for(resource_type);
        let mut out = Map::new();

        for (key, value) in obj {
            match key.as_str() {
                "id" | "type" => {
                    let value = prune(value);
                    if !is_empty(&value) {
                        out.insert(key.clone(), value);
                    }
                }
                "attributes" => {
                    let attributes = match mode {
                        FilterMode::Full => full_attributes(value, rules),
                        FilterMode::Lightweight => {
                            lightweight_attributes(value, obj, rules, included)
                        }
                    };
                    if !attributes.is_empty() {
                        out.insert(key.clone(), Value::Object(attributes));
                    }
                }
                "relationships" if mode == FilterMode::Full => {
                    let relationships = filter_relationships(value, rules);
                    if !relationships.is_empty() {
                        out.insert(key.clone(), Value::Object(relationships));
                    }
                }
                "meta" if mode == FilterMode::Full => {
                    let meta = clean_meta(value);
                    if !is_empty(&meta) {
                        out.insert(key.clone(), meta);
                    }
                }
                // Recomputed below
                WEBAPP_URL => {}
                "links" => {}
                _ if mode == FilterMode::Full => {
                    let value = prune(value);
                    if !is_empty(&value) {
                        out.insert(key.clone(), value);
                    }
                }
                _ => {}
            }
        }

        if top_level {
            let url = self
                .resource_url(obj, rules)
                .map(Value::String)
                .or_else(|| obj.get(WEBAPP_URL).filter(|v| v.is_string()).cloned());
            if let Some(url) = url {
                out.insert(WEBAPP_URL.to_string(), url);
            }
        }

        Value::Object(out)
    }

    /// User-facing URL for a resource, or `None` when the type has no link
    /// template or the template's inputs are missing.
    pub fn webapp_url(
        &self,
        resource_type: &str,
        id: &str,
        parent_id: Option<&str>,
    ) -> Option<String> {
        if id.is_empty() {
            return None;
        }
        let template = rules_for(resource_type).link?;
        let path = match (template.nested, parent_id) {
            (Some((_, nested)), Some(parent)) if !parent.is_empty() => {
                nested.replace("{parent}", parent)
            }
            _ => template.path?.to_string(),
        };
        Some(format!(
            "{}/{}{}",
            self.webapp_base_url,
            self.organization_id,
            path.replace("{id}", id)
        ))
    }

    /// A resource whose template needs a parent that cannot be resolved
    /// (e.g. lightweight output being filtered again) yields `None` here so
    /// the caller can keep a previously derived link.
    fn resource_url(&self, obj: &Map<String, Value>, rules: &ResourceRules) -> Option<String> {
        let template = rules.link?;
        let id = id_string(obj.get("id")?)?;
        let parent = template
            .nested
            .and_then(|(relationship, _)| related_id(obj, relationship));

        if template.nested.is_some() && parent.is_none() && obj.contains_key(WEBAPP_URL) {
            return None;
        }

        self.webapp_url(rules.resource_type, &id, parent.as_deref())
    }
}

fn full_attributes(value: &Value, rules: &ResourceRules) -> Map<String, Value> {
    let Some(attributes) = value.as_object() else {
        return Map::new();
    };

    let mut out = Map::new();
    for (name, value) in attributes {
        if rules.denies(name) {
            continue;
        }
        let value = clean_attribute(name, value, rules);
        if !is_empty(&value) {
            out.insert(name.clone(), value);
        }
    }
    out
}

fn lightweight_attributes(
    value: &Value,
    resource: &Map<String, Value>,
    rules: &ResourceRules,
    included: Option<&Vec<Value>>,
) -> Map<String, Value> {
    let mut out = Map::new();
    if let Some(attributes) = value.as_object() {
        for (name, value) in attributes {
            if !rules.keeps_lightweight(name) {
                continue;
            }
            let value = clean_attribute(name, value, rules);
            if !is_empty(&value) {
                out.insert(name.clone(), value);
            }
        }
    }

    if let Some(actor) = rules
        .actor_relationship
        .and_then(|relationship| resolve_actor(resource, relationship, included))
    {
        out.insert("actor".to_string(), Value::String(actor));
    }

    if !rules.summary_attributes.is_empty() {
        let parts: Vec<&str> = rules
            .summary_attributes
            .iter()
            .filter_map(|name| out.get(*name).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .collect();
        if !parts.is_empty() {
            let summary = parts.join(" ");
            out.insert("summary".to_string(), Value::String(summary));
        }
    }

    out
}

fn clean_attribute(name: &str, value: &Value, rules: &ResourceRules) -> Value {
    match value {
        Value::String(text) if rules.is_html(name) => Value::String(html_to_text(text)),
        other => prune(other),
    }
}

fn filter_relationships(value: &Value, rules: &ResourceRules) -> Map<String, Value> {
    let Some(relationships) = value.as_object() else {
        return Map::new();
    };

    let mut out = Map::new();
    for (name, relationship) in relationships {
        if !rules.keeps_relationship(name) {
            continue;
        }
        let Some(relationship) = relationship.as_object() else {
            continue;
        };
        let mut kept = Map::new();
        for (key, value) in relationship {
            let value = match key.as_str() {
                "links" => continue,
                "meta" => clean_meta(value),
                _ => prune(value),
            };
            if !is_empty(&value) {
                kept.insert(key.clone(), value);
            }
        }
        if !kept.is_empty() {
            out.insert(name.clone(), Value::Object(kept));
        }
    }
    out
}

/// Name of the person a relationship points at, looked up in `included`
fn resolve_actor(
    resource: &Map<String, Value>,
    relationship: &str,
    included: Option<&Vec<Value>>,
) -> Option<String> {
    let data = resource
        .get("relationships")?
        .get(relationship)?
        .get("data")?;
    let person_type = data.get("type")?.as_str()?;
    let person_id = id_string(data.get("id")?)?;

    let person = included?.iter().find(|entry| {
        entry.get("type").and_then(Value::as_str) == Some(person_type)
            && entry.get("id").and_then(id_string).as_deref() == Some(person_id.as_str())
    })?;
    let attributes = person.get("attributes")?;

    let name = ["first_name", "last_name"]
        .iter()
        .filter_map(|field| attributes.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        attributes
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|n| !n.is_empty())
    } else {
        Some(name)
    }
}

/// Id of the resource a to-one relationship points at
fn related_id(resource: &Map<String, Value>, relationship: &str) -> Option<String> {
    let data = resource
        .get("relationships")?
        .get(relationship)?
        .get("data")?;
    id_string(data.get("id")?)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Drop `settings` and a false `included` flag, then prune
pub fn clean_meta(meta: &Value) -> Value {
    let Some(obj) = meta.as_object() else {
        return prune(meta);
    };
    let mut cleaned = obj.clone();
    cleaned.remove("settings");
    if cleaned.get("included") == Some(&Value::Bool(false)) {
        cleaned.remove("included");
    }
    prune(&Value::Object(cleaned))
}

/// Recursively remove nulls, empty strings and empty containers
pub fn prune(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), prune(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(prune).filter(|v| !is_empty(v)).collect())
        }
        other => other.clone(),
    }
}

/// Whether a value counts as absent
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> ResponseFilter {
        ResponseFilter::new(1234, "https://app.productive.io/")
    }

    fn assert_no_empty_values(value: &Value) {
        match value {
            Value::Object(obj) => {
                for (key, v) in obj {
                    assert!(!is_empty(v), "empty value under key {}", key);
                    assert_no_empty_values(v);
                }
            }
            Value::Array(items) => items.iter().for_each(assert_no_empty_values),
            _ => {}
        }
    }

    fn task_document() -> Value {
        json!({
            "data": [{
                "id": "1",
                "type": "tasks",
                "attributes": {
                    "title": "Fix bug",
                    "description": "<p>Broken <b>login</b></p>",
                    "email_key": "abc",
                    "placement": 3,
                    "due_date": null,
                    "closed": false,
                    "todo_count": 0,
                    "tag_list": [],
                    "custom_fields": {"a": null}
                },
                "relationships": {
                    "project": {"data": {"type": "projects", "id": "77"}},
                    "assignee": {"data": null},
                    "subscribers": {"meta": {"included": false}},
                    "creator": {
                        "data": {"type": "people", "id": "5"},
                        "links": {"related": "https://api.example/people/5"}
                    }
                },
                "links": {"self": "https://api.example/tasks/1"}
            }],
            "included": [{
                "id": "5",
                "type": "people",
                "attributes": {"first_name": "Ada", "last_name": "Lovelace", "avatar_url": "x"}
            }],
            "meta": {
                "current_page": 1,
                "total_pages": 3,
                "total_count": 61,
                "page_size": 30,
                "max_page_size": 200,
                "settings": {"x": 1}
            },
            "links": {"first": "https://api.example/tasks?page=1", "next": "https://api.example/tasks?page=2"}
        })
    }

    #[test]
    fn test_single_task_example() {
        let input = json!({"data":{"id":"1","type":"tasks","attributes":{"title":"Fix bug","description":"<p>Broken</p>","email_key":"abc","due_date":null}}});
        let output = engine().filter_document(&input, FilterMode::Full);
        assert_eq!(
            output,
            json!({"data":{"id":"1","type":"tasks","attributes":{"title":"Fix bug","description":"Broken"},"webapp_url":"https://app.productive.io/1234/tasks/task/1"}})
        );
    }

    #[test]
    fn test_full_mode_shapes_collection() {
        let output = engine().filter_document(&task_document(), FilterMode::Full);

        assert!(output.get("links").is_none());
        assert_eq!(output["meta"]["total_count"], 61);
        assert!(output["meta"].get("settings").is_none());

        let task = &output["data"][0];
        assert_eq!(task["attributes"]["description"], "Broken login");
        assert_eq!(task["attributes"]["closed"], false);
        assert_eq!(task["attributes"]["todo_count"], 0);
        assert!(task["attributes"].get("email_key").is_none());
        assert!(task["attributes"].get("placement").is_none());
        assert!(task["attributes"].get("tag_list").is_none());
        assert!(task.get("links").is_none());

        let relationships = task["relationships"].as_object().unwrap();
        assert_eq!(
            relationships.keys().collect::<Vec<_>>(),
            vec!["project", "creator"]
        );
        assert!(relationships["creator"].get("links").is_none());

        assert_eq!(
            task["webapp_url"],
            "https://app.productive.io/1234/projects/77/tasks/task/1"
        );

        let person = &output["included"][0];
        assert!(person.get("webapp_url").is_none());
        assert!(person["attributes"].get("avatar_url").is_none());

        assert_no_empty_values(&output);
    }

    #[test]
    fn test_attribute_order_preserved() {
        let input = json!({"data": {"id": "3", "type": "projects", "attributes": {
            "zeta": 1, "name": "Website", "sample_data": true, "alpha": "a"
        }}});
        let output = engine().filter_document(&input, FilterMode::Full);
        let keys: Vec<_> = output["data"]["attributes"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["zeta", "name", "alpha"]);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let filter = engine();
        for mode in [FilterMode::Full, FilterMode::Lightweight] {
            let once = filter.filter_document(&task_document(), mode);
            let twice = filter.filter_document(&once, mode);
            assert_eq!(once, twice, "{:?}", mode);
        }
    }

    #[test]
    fn test_lightweight_mode_drops_descriptions_and_relationships() {
        let output = engine().filter_document(&task_document(), FilterMode::Lightweight);

        assert!(output.get("included").is_none());
        let task = &output["data"][0];
        assert!(task.get("relationships").is_none());
        assert_eq!(
            task["attributes"],
            json!({"title": "Fix bug", "closed": false})
        );
        assert_eq!(
            task["webapp_url"],
            "https://app.productive.io/1234/projects/77/tasks/task/1"
        );
    }

    #[test]
    fn test_lightweight_activity_digest() {
        let input = json!({
            "data": [{
                "id": "900",
                "type": "activities",
                "attributes": {
                    "event": "create",
                    "item_type": "Task",
                    "item_id": 1,
                    "item_name": "Fix bug",
                    "created_at": "2024-05-01T10:00:00Z",
                    "changeset": [{"title": [null, "Fix bug"]}],
                    "body": "<p>long</p>"
                },
                "relationships": {"creator": {"data": {"type": "people", "id": "5"}}}
            }],
            "included": [{"id": "5", "type": "people", "attributes": {"first_name": "Ada", "last_name": "Lovelace"}}]
        });

        let filter = engine();
        let output = filter.filter_document(&input, FilterMode::Lightweight);
        let activity = &output["data"][0];
        assert_eq!(activity["attributes"]["actor"], "Ada Lovelace");
        assert_eq!(activity["attributes"]["summary"], "create Task Fix bug");
        assert!(activity["attributes"].get("changeset").is_none());
        assert!(activity["attributes"].get("body").is_none());
        assert!(activity.get("webapp_url").is_none());

        assert_eq!(filter.filter_document(&output, FilterMode::Lightweight), output);
    }

    #[test]
    fn test_webapp_url_templates() {
        let filter = engine();
        assert_eq!(
            filter.webapp_url("projects", "3", None).unwrap(),
            "https://app.productive.io/1234/projects/3"
        );
        assert_eq!(
            filter.webapp_url("tasks", "1", None).unwrap(),
            "https://app.productive.io/1234/tasks/task/1"
        );
        assert_eq!(
            filter.webapp_url("tasks", "1", Some("77")).unwrap(),
            "https://app.productive.io/1234/projects/77/tasks/task/1"
        );
        assert_eq!(
            filter.webapp_url("comments", "8", Some("1")).unwrap(),
            "https://app.productive.io/1234/tasks/task/1"
        );
        assert_eq!(
            filter.webapp_url("pages", "4", None).unwrap(),
            "https://app.productive.io/1234/docs/doc/4"
        );
        assert!(filter.webapp_url("comments", "8", None).is_none());
        assert!(filter.webapp_url("attachments", "2", None).is_none());
        assert!(filter.webapp_url("tasks", "", None).is_none());
    }

    #[test]
    fn test_bare_resource_is_filtered_as_top_level() {
        let input = json!({"id": 4, "type": "pages", "attributes": {"title": "Docs", "body": ""}});
        let output = engine().filter_document(&input, FilterMode::Full);
        assert_eq!(
            output,
            json!({"id": 4, "type": "pages", "attributes": {"title": "Docs"}, "webapp_url": "https://app.productive.io/1234/docs/doc/4"})
        );
    }

    #[test]
    fn test_irregular_shapes_degrade_gracefully() {
        let filter = engine();
        assert_eq!(
            filter.filter_document(&json!({"data": []}), FilterMode::Full),
            json!({"data": []})
        );
        assert_eq!(
            filter.filter_document(&json!({"meta": {"settings": {}}}), FilterMode::Full),
            json!({})
        );
        assert_eq!(filter.filter_document(&json!("text"), FilterMode::Full), json!("text"));

        let odd = json!({"data": [{"type": "tasks", "attributes": "oops", "relationships": []}, 5]});
        let output = filter.filter_document(&odd, FilterMode::Full);
        assert_eq!(output, json!({"data": [{"type": "tasks"}, 5]}));
    }

    #[test]
    fn test_singular_data_never_becomes_a_collection() {
        let filter = engine();
        let output = filter.filter_document(
            &json!({"data": {"attributes": {"title": null}}, "meta": {"total_count": 1}}),
            FilterMode::Full,
        );
        assert_eq!(output, json!({"meta": {"total_count": 1}}));

        let output = filter.filter_document(&json!({"data": {"id": "1", "type": "tasks"}}), FilterMode::Full);
        assert!(output["data"].is_object());
    }

    #[test]
    fn test_escaped_markup_is_idempotent() {
        let input = json!({"data": {"id": "1", "type": "tasks", "attributes": {
            "title": "Markup",
            "description": "<p>Wrap it in &lt;div&gt; tags, escape as &amp;lt;</p>"
        }}});
        let filter = engine();
        for mode in [FilterMode::Full, FilterMode::Lightweight] {
            let once = filter.filter_document(&input, mode);
            let twice = filter.filter_document(&once, mode);
            assert_eq!(once, twice, "{:?}", mode);
        }

        let once = filter.filter_document(&input, FilterMode::Full);
        assert_eq!(once["data"]["attributes"]["description"], "Wrap it in\ntags, escape as <");
    }

    #[test]
    fn test_empty_html_attribute_removed() {
        let input = json!({"data": {"id": "9", "type": "comments", "attributes": {"body": "<p> </p><br>"}}});
        let output = engine().filter_document(&input, FilterMode::Full);
        assert!(output["data"].get("attributes").is_none());
    }
}
