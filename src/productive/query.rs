//! Outbound request construction
//!
//! A [`QuerySpec`] is built per tool call and turned into the path and
//! query string of a single GET request.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::config::productive::MAX_PAGE_SIZE;
use crate::error::ValidationError;

static FILTER_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^filter\[[A-Za-z0-9_.]+\](?:\[[A-Za-z0-9_.]+\])*$").unwrap());

/// Shape of one outbound collection or singular request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    /// Path relative to the API base URL, e.g. `/tasks`
    pub path: String,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    /// Sort key, `-` prefix for descending
    pub sort: Option<String>,
    /// `filter[...]` parameters
    pub filters: BTreeMap<String, String>,
    /// Comma-separated relationships to side-load into `included`
    pub include: Option<String>,
}

impl QuerySpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Request for a single resource by id
    pub fn resource(collection: &str, id: u64) -> Self {
        Self::new(format!("/{}/{}", collection, id))
    }

    /// Set the page number; zero is rejected
    pub fn page(mut self, page_number: Option<u32>) -> Result<Self, ValidationError> {
        if page_number == Some(0) {
            return Err(ValidationError::parameter("page_number", "must be at least 1"));
        }
        self.page_number = page_number;
        Ok(self)
    }

    /// Set the page size, clamped to the upstream maximum; zero is rejected
    pub fn page_size(mut self, page_size: u32) -> Result<Self, ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::parameter("page_size", "must be at least 1"));
        }
        if page_size > MAX_PAGE_SIZE {
            tracing::warn!(
                requested = page_size,
                max = MAX_PAGE_SIZE,
                "page_size exceeds API limit, clamping"
            );
        }
        self.page_size = Some(page_size.min(MAX_PAGE_SIZE));
        Ok(self)
    }

    pub fn sort(mut self, sort: Option<&str>) -> Self {
        self.sort = sort
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn include(mut self, relationships: &str) -> Self {
        self.include = Some(relationships.to_string());
        self
    }

    /// Set a named filter, replacing any pass-through value with the same key
    pub fn filter(mut self, key: &str, value: impl ToString) -> Self {
        self.filters.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a named filter when a value is present
    pub fn filter_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.filter(key, value),
            None => self,
        }
    }

    /// Merge validated pass-through filters. Keys already set by named
    /// filters are left untouched.
    pub fn extra_filters(mut self, extra: ExtraFilters) -> Self {
        for (key, value) in extra.0 {
            self.filters.entry(key).or_insert(value);
        }
        self
    }

    /// Query string pairs in a stable order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(number) = self.page_number {
            pairs.push(("page[number]".to_string(), number.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("page[size]".to_string(), size.to_string()));
        }
        if let Some(ref sort) = self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(ref include) = self.include {
            pairs.push(("include".to_string(), include.clone()));
        }
        pairs
    }

    /// `filter[...]` parameters with the wrapper removed, e.g.
    /// `filter[person_id]` becomes `person_id`
    pub fn applied_filters(&self) -> Map<String, Value> {
        self.filters
            .iter()
            .map(|(key, value)| {
                let name = key
                    .trim_start_matches("filter[")
                    .replace("][", ".")
                    .trim_end_matches(']')
                    .to_string();
                (name, Value::String(value.clone()))
            })
            .collect()
    }
}

/// Caller-supplied `filter[...]` parameters, validated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFilters(BTreeMap<String, String>);

impl ExtraFilters {
    /// Validate a raw JSON object of pass-through filters.
    ///
    /// Keys must look like `filter[name]` (optionally with more `[segment]`s)
    /// and values must be scalars or arrays of scalars; arrays are joined
    /// with commas.
    pub fn parse(raw: Option<&Map<String, Value>>) -> Result<Self, ValidationError> {
        let mut filters = BTreeMap::new();
        let Some(raw) = raw else {
            return Ok(Self(filters));
        };

        for (key, value) in raw {
            if !FILTER_KEY.is_match(key) {
                return Err(ValidationError::parameter(
                    "extra_filters",
                    format!("key '{}' must have the form filter[name]", key),
                ));
            }
            let rendered = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| scalar(key, item))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(","),
                other => scalar(key, other)?,
            };
            filters.insert(key.clone(), rendered);
        }

        Ok(Self(filters))
    }
}

fn scalar(key: &str, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ValidationError::parameter(
            "extra_filters",
            format!("value for '{}' must be a string, number or boolean", key),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extra(value: Value) -> Result<ExtraFilters, ValidationError> {
        ExtraFilters::parse(value.as_object())
    }

    #[test]
    fn test_pairs_order_and_content() {
        let query = QuerySpec::new("/tasks")
            .page(Some(2))
            .unwrap()
            .page_size(25)
            .unwrap()
            .sort(Some("-due_date"))
            .filter("filter[project_id][eq]", 7);

        assert_eq!(
            query.to_pairs(),
            vec![
                ("filter[project_id][eq]".to_string(), "7".to_string()),
                ("page[number]".to_string(), "2".to_string()),
                ("page[size]".to_string(), "25".to_string()),
                ("sort".to_string(), "-due_date".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_size_clamped() {
        let query = QuerySpec::new("/tasks").page_size(1000).unwrap();
        assert_eq!(query.page_size, Some(200));
    }

    #[test]
    fn test_zero_paging_rejected() {
        assert!(QuerySpec::new("/tasks").page(Some(0)).is_err());
        assert!(QuerySpec::new("/tasks").page_size(0).is_err());
    }

    #[test]
    fn test_named_filters_win_over_extra() {
        let extras = extra(json!({
            "filter[project_id][eq]": "999",
            "filter[status][eq]": 1
        }))
        .unwrap();

        let query = QuerySpec::new("/tasks")
            .filter("filter[project_id][eq]", 7)
            .extra_filters(extras);

        assert_eq!(query.filters["filter[project_id][eq]"], "7");
        assert_eq!(query.filters["filter[status][eq]"], "1");
    }

    #[test]
    fn test_extra_filter_keys_validated() {
        assert!(extra(json!({"filter[assignee_id]": 3})).is_ok());
        assert!(extra(json!({"filter[due_date][gt_eq]": "2024-01-01"})).is_ok());
        assert!(extra(json!({"sort": "name"})).is_err());
        assert!(extra(json!({"page[size]": 10})).is_err());
        assert!(extra(json!({"filter[]": 1})).is_err());
        assert!(extra(json!({"filter[a]&x=1": 1})).is_err());
    }

    #[test]
    fn test_extra_filter_values_validated() {
        let parsed = extra(json!({"filter[task_id]": [1, 2, 3]})).unwrap();
        let query = QuerySpec::new("/todos").extra_filters(parsed);
        assert_eq!(query.filters["filter[task_id]"], "1,2,3");

        assert!(extra(json!({"filter[task_id]": {"eq": 1}})).is_err());
        assert!(extra(json!({"filter[task_id]": null})).is_err());
        assert!(extra(json!({"filter[task_id]": [[1]]})).is_err());
    }

    #[test]
    fn test_applied_filters_unwrapped() {
        let query = QuerySpec::new("/activities")
            .filter("filter[person_id]", 5)
            .filter("filter[project_id][eq]", 9);
        let applied = query.applied_filters();
        assert_eq!(applied["person_id"], "5");
        assert_eq!(applied["project_id.eq"], "9");
    }

    #[test]
    fn test_resource_path() {
        assert_eq!(QuerySpec::resource("tasks", 42).path, "/tasks/42");
    }
}
