//! Normalized result cache.
//!
//! Every object that carries both `__typename` and `id` is stored once under
//! its [`EntityKey`]; the places it appeared hold a `{"__ref": "Type:id"}`
//! pointer instead. Root fields are stored per field name and resolved
//! arguments, so `client(id: "1")` and `client(id: "2")` are separate
//! entries and an aliased selection lands on the field it aliases.
//!
//! Merge policies:
//! - entity fields merge: incoming fields overwrite, absent fields are kept
//! - root fields are replaced wholesale by the incoming value

use crate::error::{Result, TrackerError};
use crate::schema::selected_operation;
use async_graphql::parser::parse_query;
use async_graphql::parser::types::{ExecutableDocument, Selection, SelectionSet};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

const TYPENAME_KEY: &str = "__typename";
const REF_KEY: &str = "__ref";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub typename: String,
    pub id: String,
}

impl EntityKey {
    pub fn new(typename: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            id: id.into(),
        }
    }

    /// Identity of a result object, if it has one
    fn of(object: &Map<String, Value>) -> Option<Self> {
        let typename = object.get(TYPENAME_KEY)?.as_str()?;
        let id = match object.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Self::new(typename, id))
    }

    fn parse(reference: &str) -> Option<Self> {
        let (typename, id) = reference.split_once(':')?;
        Some(Self::new(typename, id))
    }

    fn to_ref(&self) -> Value {
        let mut object = Map::new();
        object.insert(REF_KEY.to_string(), Value::String(self.to_string()));
        Value::Object(object)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.typename, self.id)
    }
}

#[derive(Debug, Default, Clone)]
pub struct NormalizedCache {
    entities: HashMap<EntityKey, Map<String, Value>>,
    root: HashMap<String, Value>,
}

impl NormalizedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the entities found in a result without touching root fields.
    ///
    /// Used for mutation payloads.
    pub fn write_result(&mut self, data: &Value) {
        self.normalize(data);
    }

    /// Store a query result: its entities, and each root field under its
    /// field name and arguments, replacing what was there.
    ///
    /// `document` is the query that produced `data`; its selections map
    /// response keys (aliases included) back to field names and arguments.
    pub fn write_query(&mut self, document: &str, data: &Value, variables: &Value) -> Result<()> {
        for field in root_fields(document, variables)? {
            if let Some(value) = data.get(&field.response_key) {
                let normalized = self.normalize(value);
                self.root.insert(field.storage_key, normalized);
            }
        }
        Ok(())
    }

    /// Read a root field back by field name and arguments, following entity
    /// references.
    ///
    /// References to evicted entities are dropped from lists and read as
    /// `null` elsewhere.
    pub fn read_query(&self, field: &str, arguments: &Value) -> Option<Value> {
        let stored = self.root.get(&root_key(field, arguments))?;
        Some(self.denormalize(stored).unwrap_or(Value::Null))
    }

    /// Answer a whole query from the cache, keyed by its response keys.
    /// `None` when any root field has not been stored yet.
    pub fn read_document(&self, document: &str, variables: &Value) -> Result<Option<Value>> {
        let mut data = Map::new();
        for field in root_fields(document, variables)? {
            let Some(stored) = self.root.get(&field.storage_key) else {
                return Ok(None);
            };
            data.insert(
                field.response_key,
                self.denormalize(stored).unwrap_or(Value::Null),
            );
        }
        Ok(Some(Value::Object(data)))
    }

    pub fn read_entity(&self, typename: &str, id: &str) -> Option<Value> {
        let key = EntityKey::new(typename, id);
        self.denormalize(&key.to_ref())
    }

    /// Remove an entity. Returns whether it was present.
    pub fn evict(&mut self, typename: &str, id: &str) -> bool {
        self.entities
            .remove(&EntityKey::new(typename, id))
            .is_some()
    }

    pub fn contains(&self, typename: &str, id: &str) -> bool {
        self.entities.contains_key(&EntityKey::new(typename, id))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.root.clear();
    }

    fn normalize(&mut self, value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().map(|v| self.normalize(v)).collect()),
            Value::Object(object) => {
                let fields: Map<String, Value> = object
                    .iter()
                    .map(|(k, v)| (k.clone(), self.normalize(v)))
                    .collect();

                match EntityKey::of(object) {
                    Some(key) => {
                        let reference = key.to_ref();
                        self.entities.entry(key).or_default().extend(fields);
                        reference
                    },
                    None => Value::Object(fields),
                }
            },
            other => other.clone(),
        }
    }

    /// `None` means the value is a reference to a missing entity
    fn denormalize(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Array(items) => Some(Value::Array(
                items.iter().filter_map(|v| self.denormalize(v)).collect(),
            )),
            Value::Object(object) => {
                if let Some(reference) = object.get(REF_KEY).and_then(Value::as_str) {
                    let key = EntityKey::parse(reference)?;
                    let entity = self.entities.get(&key)?;
                    return Some(self.denormalize_fields(entity));
                }
                Some(self.denormalize_fields(object))
            },
            other => Some(other.clone()),
        }
    }

    fn denormalize_fields(&self, object: &Map<String, Value>) -> Value {
        Value::Object(
            object
                .iter()
                .map(|(k, v)| (k.clone(), self.denormalize(v).unwrap_or(Value::Null)))
                .collect(),
        )
    }
}

struct RootField {
    response_key: String,
    storage_key: String,
}

/// Root selections of the document's single operation, with arguments
/// resolved against `variables` and the declared defaults.
fn root_fields(document: &str, variables: &Value) -> Result<Vec<RootField>> {
    let doc = parse_query(document)
        .map_err(|e| TrackerError::GraphqlError(format!("Invalid document: {}", e)))?;
    let operation = selected_operation(&doc, None).ok_or_else(|| {
        TrackerError::GraphqlError("Document must contain exactly one operation".to_string())
    })?;

    let defaults: Map<String, Value> = operation
        .variable_definitions
        .iter()
        .filter_map(|definition| {
            let default = definition.node.default_value.as_ref()?;
            let value = default.node.clone().into_json().ok()?;
            Some((definition.node.name.node.to_string(), value))
        })
        .collect();

    let mut fields = Vec::new();
    collect_root_fields(
        &doc,
        &operation.selection_set.node,
        &|name: &str| {
            variables
                .get(name)
                .or_else(|| defaults.get(name))
                .cloned()
                .unwrap_or(Value::Null)
        },
        &mut fields,
    );
    Ok(fields)
}

fn collect_root_fields(
    doc: &ExecutableDocument,
    selection_set: &SelectionSet,
    variable: &dyn Fn(&str) -> Value,
    fields: &mut Vec<RootField>,
) {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                let field = &field.node;
                let arguments: Map<String, Value> = field
                    .arguments
                    .iter()
                    .map(|(name, value)| {
                        let resolved = value
                            .node
                            .clone()
                            .into_const_with(|var| {
                                async_graphql::Value::from_json(variable(var.as_str()))
                            })
                            .and_then(|value| value.into_json())
                            .unwrap_or(Value::Null);
                        (name.node.to_string(), resolved)
                    })
                    .collect();

                fields.push(RootField {
                    response_key: field.response_key().node.to_string(),
                    storage_key: root_key(field.name.node.as_str(), &Value::Object(arguments)),
                });
            },
            Selection::InlineFragment(fragment) => {
                collect_root_fields(doc, &fragment.node.selection_set.node, variable, fields);
            },
            Selection::FragmentSpread(spread) => {
                if let Some(fragment) = doc.fragments.get(&spread.node.fragment_name.node) {
                    collect_root_fields(doc, &fragment.node.selection_set.node, variable, fields);
                }
            },
        }
    }
}

/// Root field key: the field name, plus its arguments when there are any.
/// `serde_json` maps are ordered, so equal arguments give equal keys.
fn root_key(field: &str, arguments: &Value) -> String {
    match arguments {
        Value::Null => field.to_string(),
        Value::Object(map) if map.is_empty() => field.to_string(),
        other => format!("{field}({other})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PROJECTS: &str = "{ projects { __typename id name status client { __typename id name } } }";

    fn projects_result() -> Value {
        json!({
            "projects": [
                {
                    "__typename": "Project", "id": "1", "name": "Site", "status": "Not Started",
                    "client": { "__typename": "Client", "id": "7", "name": "Ada" }
                },
                {
                    "__typename": "Project", "id": "2", "name": "App", "status": "Completed",
                    "client": { "__typename": "Client", "id": "7", "name": "Ada" }
                }
            ]
        })
    }

    fn cached_projects() -> NormalizedCache {
        let mut cache = NormalizedCache::new();
        cache
            .write_query(PROJECTS, &projects_result(), &Value::Null)
            .unwrap();
        cache
    }

    #[test]
    fn test_shared_entity_stored_once() {
        let cache = cached_projects();

        assert_eq!(cache.entity_count(), 3);
        assert!(cache.contains("Client", "7"));
    }

    #[test]
    fn test_read_query_round_trips_result() {
        let cache = cached_projects();

        assert_eq!(
            cache.read_query("projects", &Value::Null),
            Some(projects_result()["projects"].clone())
        );
        assert_eq!(cache.read_query("clients", &Value::Null), None);
    }

    #[test]
    fn test_entity_update_visible_through_every_reference() {
        let mut cache = cached_projects();

        cache.write_result(&json!({
            "updateClient": { "__typename": "Client", "id": "7", "name": "Ada Lovelace" }
        }));

        let projects = cache.read_query("projects", &Value::Null).unwrap();
        assert_eq!(projects[0]["client"]["name"], "Ada Lovelace");
        assert_eq!(projects[1]["client"]["name"], "Ada Lovelace");
    }

    #[test]
    fn test_entity_fields_merge() {
        let mut cache = NormalizedCache::new();
        cache.write_result(&json!({
            "project": { "__typename": "Project", "id": "1", "name": "Site", "description": "Long" }
        }));
        cache.write_result(&json!({
            "tasks": [{ "__typename": "Task", "id": "3",
                        "project": { "__typename": "Project", "id": "1", "name": "Site v2" } }]
        }));

        let project = cache.read_entity("Project", "1").unwrap();
        assert_eq!(project["name"], "Site v2");
        assert_eq!(project["description"], "Long");
    }

    #[test]
    fn test_root_field_replaced_not_merged() {
        let mut cache = cached_projects();

        cache
            .write_query(
                "{ projects { __typename id name } }",
                &json!({ "projects": [{ "__typename": "Project", "id": "2", "name": "App" }] }),
                &Value::Null,
            )
            .unwrap();

        let projects = cache.read_query("projects", &Value::Null).unwrap();
        assert_eq!(projects.as_array().unwrap().len(), 1);
        assert_eq!(projects[0]["id"], "2");
    }

    #[test]
    fn test_root_fields_keyed_by_variable_arguments() {
        let mut cache = NormalizedCache::new();
        let doc = "query($id: ID) { project(id: $id) { __typename id name } }";
        cache
            .write_query(
                doc,
                &json!({ "project": { "__typename": "Project", "id": "1", "name": "One" } }),
                &json!({ "id": "1" }),
            )
            .unwrap();
        cache
            .write_query(
                doc,
                &json!({ "project": { "__typename": "Project", "id": "2", "name": "Two" } }),
                &json!({ "id": "2" }),
            )
            .unwrap();

        let one = cache.read_query("project", &json!({ "id": "1" })).unwrap();
        let two = cache.read_query("project", &json!({ "id": "2" })).unwrap();
        assert_eq!(one["name"], "One");
        assert_eq!(two["name"], "Two");
    }

    #[test]
    fn test_inline_arguments_get_separate_entries() {
        let mut cache = NormalizedCache::new();
        cache
            .write_query(
                r#"{ client(id: "1") { __typename id name } }"#,
                &json!({ "client": { "__typename": "Client", "id": "1", "name": "One" } }),
                &Value::Null,
            )
            .unwrap();
        cache
            .write_query(
                r#"{ client(id: "2") { __typename id name } }"#,
                &json!({ "client": { "__typename": "Client", "id": "2", "name": "Two" } }),
                &Value::Null,
            )
            .unwrap();

        assert_eq!(cache.read_query("client", &json!({ "id": "1" })).unwrap()["name"], "One");
        assert_eq!(cache.read_query("client", &json!({ "id": "2" })).unwrap()["name"], "Two");
        assert_eq!(cache.read_query("client", &Value::Null), None);
    }

    #[test]
    fn test_aliases_stored_under_field_name() {
        let mut cache = NormalizedCache::new();
        let doc = r#"{ a: client(id: "1") { __typename id name } b: client(id: "2") { __typename id name } }"#;
        cache
            .write_query(
                doc,
                &json!({
                    "a": { "__typename": "Client", "id": "1", "name": "One" },
                    "b": { "__typename": "Client", "id": "2", "name": "Two" }
                }),
                &Value::Null,
            )
            .unwrap();

        assert_eq!(cache.read_query("a", &Value::Null), None);
        assert_eq!(cache.read_query("client", &json!({ "id": "2" })).unwrap()["name"], "Two");

        let unaliased = r#"{ client(id: "1") { name } }"#;
        let data = cache.read_document(unaliased, &Value::Null).unwrap().unwrap();
        assert_eq!(data["client"]["name"], "One");

        let data = cache.read_document(doc, &Value::Null).unwrap().unwrap();
        assert_eq!(data["a"]["id"], "1");
        assert_eq!(data["b"]["id"], "2");
    }

    #[test]
    fn test_variable_defaults_resolve_arguments() {
        let mut cache = NormalizedCache::new();
        cache
            .write_query(
                r#"query($id: ID = "5") { task(id: $id) { __typename id } }"#,
                &json!({ "task": { "__typename": "Task", "id": "5" } }),
                &Value::Null,
            )
            .unwrap();

        assert!(cache.read_query("task", &json!({ "id": "5" })).is_some());
    }

    #[test]
    fn test_read_document_misses_unstored_fields() {
        let cache = cached_projects();

        assert_eq!(cache.read_document("{ clients { id } }", &Value::Null).unwrap(), None);
        assert!(cache.read_document("not a query", &Value::Null).is_err());
    }

    #[test]
    fn test_evicted_entities_drop_out_of_reads() {
        let mut cache = cached_projects();

        assert!(cache.evict("Project", "1"));
        assert!(!cache.evict("Project", "1"));

        let projects = cache.read_query("projects", &Value::Null).unwrap();
        assert_eq!(projects.as_array().unwrap().len(), 1);

        assert!(cache.evict("Client", "7"));
        let projects = cache.read_query("projects", &Value::Null).unwrap();
        assert_eq!(projects[0]["client"], Value::Null);
    }

    #[test]
    fn test_objects_without_identity_stay_embedded() {
        let mut cache = NormalizedCache::new();
        cache
            .write_query("{ stats { count } }", &json!({ "stats": { "count": 3 } }), &Value::Null)
            .unwrap();

        assert_eq!(cache.entity_count(), 0);
        assert_eq!(
            cache.read_query("stats", &Value::Null),
            Some(json!({ "count": 3 }))
        );
    }

    #[test]
    fn test_null_root_field() {
        let mut cache = NormalizedCache::new();
        cache
            .write_query(
                "query($id: ID) { client(id: $id) { id } }",
                &json!({ "client": null }),
                &json!({ "id": "9" }),
            )
            .unwrap();

        assert_eq!(cache.read_query("client", &json!({ "id": "9" })), Some(Value::Null));
    }
}
