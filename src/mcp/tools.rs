//! MCP Tool definitions and handlers
//!
//! Defines all available tools and their implementations. Every handler
//! issues at most one upstream request, runs the result through the
//! response filter and renders it in the configured output format.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use validator::Validate;

use crate::config::productive::MAX_PAGE_SIZE;
use crate::config::Config;
use crate::error::{McpError, Result, ValidationError};
use crate::mcp::types::{CallToolResult, Tool};
use crate::output::OutputFormat;
use crate::productive::activity;
use crate::productive::client::ProductiveClient;
use crate::productive::filter::{FilterMode, ResponseFilter};
use crate::productive::query::{ExtraFilters, QuerySpec};

const DEFAULT_LOOKBACK_HOURS: u32 = 24;
const DEFAULT_MAX_ACTIVITIES: u32 = 100;
const SEARCH_LOOKBACK_HOURS: u32 = 90 * 24;
const SEARCH_FIELDS: &[&str] = &["title", "body", "item_name", "person_name", "project_name"];

/// Tool handler
pub struct ToolHandler {
    client: Arc<ProductiveClient>,
    filter: ResponseFilter,
    items_per_page: u32,
    output_format: OutputFormat,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(client: Arc<ProductiveClient>, config: &Config) -> Self {
        Self {
            client,
            filter: ResponseFilter::new(config.organization_id, config.webapp_base_url.clone()),
            items_per_page: config.items_per_page,
            output_format: config.output_format,
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def::<NoArgs>("get_projects", "List projects, most recently active first"),
            tool_def::<TasksArgs>("get_tasks", "List tasks with optional project filter, pagination, sort and pass-through filter[...] parameters"),
            tool_def::<TaskArgs>("get_task", "Get a task by its internal ID, including description and related records"),
            tool_def::<ProjectTasksArgs>("get_project_tasks", "Browse a project's tasks in a compact form, optionally only open or closed ones"),
            tool_def::<ProjectTaskArgs>("get_project_task", "Get a task by its project-scoped task number (the number shown in the web app)"),
            tool_def::<CommentsArgs>("get_comments", "List comments, newest first, optionally for a project or task"),
            tool_def::<CommentArgs>("get_comment", "Get a comment by ID"),
            tool_def::<PagesArgs>("get_pages", "List docs pages, most recently updated first"),
            tool_def::<PageArgs>("get_page", "Get a docs page by ID, including its body"),
            tool_def::<AttachmentsArgs>("get_attachments", "List attachment metadata"),
            tool_def::<AttachmentArgs>("get_attachment", "Get attachment metadata by ID"),
            tool_def::<RecentUpdatesArgs>("get_recent_updates", "Digest of recent activity (who changed what, when), newest first"),
            tool_def::<SearchArgs>("search_recent_entries", "Search the last 90 days of activity for a term in titles, bodies and names"),
            tool_def::<TodosArgs>("get_todos", "List todo checklist items, optionally for one task"),
            tool_def::<TodoArgs>("get_todo", "Get a todo checklist item by ID"),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        let result = match name {
            "get_projects" => self.handle_get_projects(args).await,
            "get_tasks" => self.handle_get_tasks(args).await,
            "get_task" => self.handle_get_task(args).await,
            "get_project_tasks" => self.handle_get_project_tasks(args).await,
            "get_project_task" => self.handle_get_project_task(args).await,
            "get_comments" => self.handle_get_comments(args).await,
            "get_comment" => self.handle_get_comment(args).await,
            "get_pages" => self.handle_get_pages(args).await,
            "get_page" => self.handle_get_page(args).await,
            "get_attachments" => self.handle_get_attachments(args).await,
            "get_attachment" => self.handle_get_attachment(args).await,
            "get_recent_updates" => self.handle_get_recent_updates(args).await,
            "search_recent_entries" => self.handle_search_recent_entries(args).await,
            "get_todos" => self.handle_get_todos(args).await,
            "get_todo" => self.handle_get_todo(args).await,
            _ => {
                tracing::warn!(tool = name, "unknown tool");
                return CallToolResult::error(
                    McpError::UnknownTool {
                        name: name.to_string(),
                    }
                    .to_string(),
                );
            }
        };

        let rendered = result.and_then(|document| {
            tracing::info!(tool = name, items = data_len(&document), "tool call succeeded");
            self.output_format.render(&document)
        });

        match rendered {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                CallToolResult::error(format!("{} failed: {}", name, e))
            }
        }
    }

    // ==================== Tool Handlers ====================

    async fn handle_get_projects(&self, args: Value) -> Result<Value> {
        let _: NoArgs = parse_args(args)?;
        tracing::info!("Fetching projects");

        let query = QuerySpec::new("/projects").sort(Some("-last_activity_at"));
        let document = self.client.get_projects(query).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_tasks(&self, args: Value) -> Result<Value> {
        let args: TasksArgs = parse_args(args)?;
        tracing::info!(project_id = ?args.project_id, "Fetching tasks");

        let query = QuerySpec::new("/tasks")
            .page(args.page_number)?
            .page_size(args.page_size.unwrap_or(self.items_per_page))?
            .sort(Some(args.sort.as_deref().unwrap_or("-last_activity_at")))
            .filter_opt("filter[project_id][eq]", args.project_id)
            .extra_filters(ExtraFilters::parse(args.extra_filters.as_ref())?);

        let document = self.client.get_tasks(query).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_task(&self, args: Value) -> Result<Value> {
        let args: TaskArgs = parse_args(args)?;
        tracing::info!(task_id = %args.task_id, "Fetching task");

        let document = self.client.get_task(args.task_id.get()).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_project_tasks(&self, args: Value) -> Result<Value> {
        let args: ProjectTasksArgs = parse_args(args)?;
        tracing::info!(project_id = %args.project_id, status = ?args.status, "Fetching project tasks");

        let query = QuerySpec::new("/tasks")
            .page_size(self.items_per_page)?
            .sort(Some("-last_activity_at"))
            .filter("filter[project_id][eq]", args.project_id)
            .filter_opt("filter[status][eq]", args.status.map(TaskStatus::code));

        let document = self.client.get_tasks(query).await?;
        let filtered = self.filter.filter_document(&document, FilterMode::Lightweight);

        if data_len(&filtered) == 0 {
            tracing::info!(project_id = %args.project_id, "No tasks found");
            return Ok(json!({
                "data": [],
                "meta": {"message": format!("No tasks found for project {}", args.project_id)}
            }));
        }
        Ok(filtered)
    }

    async fn handle_get_project_task(&self, args: Value) -> Result<Value> {
        let args: ProjectTaskArgs = parse_args(args)?;
        tracing::info!(project_id = %args.project_id, task_number = %args.task_number, "Resolving task by number");

        let document = self
            .client
            .find_project_task(args.project_id.get(), &args.task_number.to_string())
            .await?;
        Ok(self.full(&document))
    }

    async fn handle_get_comments(&self, args: Value) -> Result<Value> {
        let args: CommentsArgs = parse_args(args)?;
        tracing::info!(project_id = ?args.project_id, task_id = ?args.task_id, "Fetching comments");

        let query = QuerySpec::new("/comments")
            .page(args.page_number)?
            .page_size(args.page_size.unwrap_or(self.items_per_page))?
            .sort(Some("-created_at"))
            .filter_opt("filter[project_id][eq]", args.project_id)
            .filter_opt("filter[task_id][eq]", args.task_id)
            .extra_filters(ExtraFilters::parse(args.extra_filters.as_ref())?);

        let document = self.client.get_comments(query).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_comment(&self, args: Value) -> Result<Value> {
        let args: CommentArgs = parse_args(args)?;
        tracing::info!(comment_id = %args.comment_id, "Fetching comment");

        let document = self.client.get_comment(args.comment_id.get()).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_pages(&self, args: Value) -> Result<Value> {
        let args: PagesArgs = parse_args(args)?;
        tracing::info!(project_id = ?args.project_id, creator_id = ?args.creator_id, "Fetching pages");

        let query = QuerySpec::new("/pages")
            .page(args.page_number)?
            .page_size(args.page_size.unwrap_or(self.items_per_page))?
            .sort(Some("-updated_at"))
            .filter_opt("filter[project_id][eq]", args.project_id)
            .filter_opt("filter[creator_id][eq]", args.creator_id);

        let document = self.client.get_pages(query).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_page(&self, args: Value) -> Result<Value> {
        let args: PageArgs = parse_args(args)?;
        tracing::info!(page_id = %args.page_id, "Fetching page");

        let document = self.client.get_page(args.page_id.get()).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_attachments(&self, args: Value) -> Result<Value> {
        let args: AttachmentsArgs = parse_args(args)?;
        tracing::info!("Fetching attachments");

        let query = QuerySpec::new("/attachments")
            .page(args.page_number)?
            .page_size(args.page_size.unwrap_or(self.items_per_page))?
            .extra_filters(ExtraFilters::parse(args.extra_filters.as_ref())?);

        let document = self.client.get_attachments(query).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_attachment(&self, args: Value) -> Result<Value> {
        let args: AttachmentArgs = parse_args(args)?;
        tracing::info!(attachment_id = %args.attachment_id, "Fetching attachment");

        let document = self.client.get_attachment(args.attachment_id.get()).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_todos(&self, args: Value) -> Result<Value> {
        let args: TodosArgs = parse_args(args)?;
        tracing::info!(task_id = ?args.task_id, "Fetching todos");

        let query = QuerySpec::new("/todos")
            .page(args.page_number)?
            .page_size(args.page_size.unwrap_or(self.items_per_page))?
            .filter_opt("filter[task_id]", args.task_id)
            .extra_filters(ExtraFilters::parse(args.extra_filters.as_ref())?);

        let document = self.client.get_todos(query).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_todo(&self, args: Value) -> Result<Value> {
        let args: TodoArgs = parse_args(args)?;
        tracing::info!(todo_id = %args.todo_id, "Fetching todo");

        let document = self.client.get_todo(args.todo_id.get()).await?;
        Ok(self.full(&document))
    }

    async fn handle_get_recent_updates(&self, args: Value) -> Result<Value> {
        let args: RecentUpdatesArgs = parse_args(args)?;
        let hours = args.hours.unwrap_or(DEFAULT_LOOKBACK_HOURS);
        let max_results = args.max_results.unwrap_or(DEFAULT_MAX_ACTIVITIES);
        if max_results > MAX_PAGE_SIZE {
            tracing::warn!(
                requested = max_results,
                max = MAX_PAGE_SIZE,
                "max_results exceeds API limit, clamping"
            );
        }
        let max_results = max_results.min(MAX_PAGE_SIZE);

        let cutoff = activity::cutoff(Utc::now(), hours);
        let cutoff_time = activity::format_timestamp(cutoff);
        tracing::info!(hours, max_results, "Fetching recent activities");

        let query = QuerySpec::new("/activities")
            .page_size(max_results)?
            .sort(Some("-created_at"))
            .include("creator")
            .filter("filter[after]", &cutoff_time)
            .filter_opt("filter[person_id]", args.user_id)
            .filter_opt("filter[project_id]", args.project_id)
            .filter_opt("filter[type]", args.activity_type)
            .filter_opt("filter[item_type]", non_blank(args.item_type.as_deref()))
            .filter_opt("filter[event]", non_blank(args.event_type.as_deref()))
            .filter_opt("filter[task_id]", args.task_id);
        let filters_applied = Value::Object(query.applied_filters());

        let mut document = self.client.get_activities(query).await?;
        let recent = activity::select_recent(take_data(&mut document), cutoff, max_results as usize);
        let activity_summary = activity::summarize(&recent);
        set_data(&mut document, recent);

        let mut filtered = self.filter.filter_document(&document, FilterMode::Lightweight);
        let total = data_len(&filtered);
        if total == 0 {
            tracing::info!(hours, "No recent activities found");
            return Ok(json!({
                "data": [],
                "meta": {
                    "message": format!("No activities found in the last {} hours", hours),
                    "hours": hours,
                    "filters_applied": filters_applied,
                    "cutoff_time": cutoff_time,
                }
            }));
        }

        if let Some(meta) = meta_mut(&mut filtered) {
            meta.insert("activity_summary".to_string(), activity_summary);
            meta.insert("total_activities".to_string(), json!(total));
            meta.insert("filters_applied".to_string(), filters_applied);
            meta.insert("cutoff_time".to_string(), json!(cutoff_time));
        }

        tracing::info!(total, "Retrieved recent activities");
        Ok(filtered)
    }

    async fn handle_search_recent_entries(&self, args: Value) -> Result<Value> {
        let args: SearchArgs = parse_args(args)?;
        let term = args.query.trim().to_string();
        if term.is_empty() {
            return Err(ValidationError::parameter("query", "must not be blank").into());
        }

        let cutoff = activity::cutoff(Utc::now(), SEARCH_LOOKBACK_HOURS);
        let cutoff_time = activity::format_timestamp(cutoff);
        tracing::info!(query = %term, "Searching recent activities");

        let query = QuerySpec::new("/activities")
            .page_size(MAX_PAGE_SIZE)?
            .include("creator")
            .filter("filter[after]", &cutoff_time);

        let mut document = self.client.get_activities(query).await?;
        let searched = take_data(&mut document);
        let total_searched = searched.len();
        let matches: Vec<Value> = searched
            .into_iter()
            .filter(|entry| activity::matches_text(entry, &term, SEARCH_FIELDS))
            .collect();
        let matches = activity::select_recent(matches, cutoff, MAX_PAGE_SIZE as usize);
        let total_matches = matches.len();
        set_data(&mut document, matches);

        let mut filtered = self.filter.filter_document(&document, FilterMode::Lightweight);
        if let Some(meta) = meta_mut(&mut filtered) {
            meta.insert("query".to_string(), json!(term));
            meta.insert("total_matches".to_string(), json!(total_matches));
            meta.insert("total_searched".to_string(), json!(total_searched));
            meta.insert("cutoff_time".to_string(), json!(cutoff_time));
            meta.insert("search_fields".to_string(), json!(SEARCH_FIELDS));
        }

        tracing::info!(total_matches, total_searched, "Search completed");
        Ok(filtered)
    }

    fn full(&self, document: &Value) -> Value {
        self.filter.filter_document(document, FilterMode::Full)
    }
}

// ==================== Arguments ====================

/// Positive integer id, accepted as a JSON number or a digit-only string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericId(u64);

impl NumericId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NumericId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for NumericId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        use serde::de::Error;

        let parsed = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) if !s.trim().is_empty() && s.trim().bytes().all(|b| b.is_ascii_digit()) => {
                s.trim().parse::<u64>().ok()
            }
            other => {
                return Err(D::Error::custom(format!(
                    "expected a numeric id, got {}",
                    other
                )))
            }
        };
        match parsed {
            Some(id) if id > 0 => Ok(NumericId(id)),
            _ => Err(D::Error::custom("expected a positive integer id")),
        }
    }
}

impl JsonSchema for NumericId {
    fn schema_name() -> String {
        "NumericId".to_string()
    }

    fn json_schema(_: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        use schemars::schema::{InstanceType, SchemaObject};

        SchemaObject {
            instance_type: Some(vec![InstanceType::Integer, InstanceType::String].into()),
            ..Default::default()
        }
        .into()
    }

    fn is_referenceable() -> bool {
        false
    }
}

/// Task status accepted by `get_project_tasks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Closed,
}

impl TaskStatus {
    /// Productive's numeric status code
    pub fn code(self) -> u8 {
        match self {
            TaskStatus::Open => 1,
            TaskStatus::Closed => 2,
        }
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
struct NoArgs {}

impl Validate for NoArgs {
    fn validate(&self) -> std::result::Result<(), validator::ValidationErrors> {
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct TasksArgs {
    /// Only tasks of this project
    project_id: Option<NumericId>,
    /// Page number, starting at 1
    #[validate(range(min = 1))]
    page_number: Option<u32>,
    /// Page size (max 200)
    #[validate(range(min = 1))]
    page_size: Option<u32>,
    /// Sort key, prefix with '-' for descending (default: -last_activity_at)
    sort: Option<String>,
    /// Additional filter[...] parameters passed to the API, e.g. {"filter[status][eq]": 1}
    extra_filters: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct TaskArgs {
    /// Internal task ID
    task_id: NumericId,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct ProjectTasksArgs {
    /// Project ID
    project_id: NumericId,
    /// Only open or only closed tasks
    status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct ProjectTaskArgs {
    /// Task number shown in the web app (unique within the project)
    task_number: NumericId,
    /// Project ID
    project_id: NumericId,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct CommentsArgs {
    /// Only comments in this project
    project_id: Option<NumericId>,
    /// Only comments on this task
    task_id: Option<NumericId>,
    /// Page number, starting at 1
    #[validate(range(min = 1))]
    page_number: Option<u32>,
    /// Page size (max 200)
    #[validate(range(min = 1))]
    page_size: Option<u32>,
    /// Additional filter[...] parameters, e.g. {"filter[discussion_id]": 5}
    extra_filters: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct CommentArgs {
    /// Comment ID
    comment_id: NumericId,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct PagesArgs {
    /// Only pages in this project
    project_id: Option<NumericId>,
    /// Only pages created by this person
    creator_id: Option<NumericId>,
    /// Page number, starting at 1
    #[validate(range(min = 1))]
    page_number: Option<u32>,
    /// Page size (max 200)
    #[validate(range(min = 1))]
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct PageArgs {
    /// Docs page ID
    page_id: NumericId,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct AttachmentsArgs {
    /// Page number, starting at 1
    #[validate(range(min = 1))]
    page_number: Option<u32>,
    /// Page size (max 200)
    #[validate(range(min = 1))]
    page_size: Option<u32>,
    /// Additional filter[...] parameters, e.g. {"filter[task_id]": 5}
    extra_filters: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct AttachmentArgs {
    /// Attachment ID
    attachment_id: NumericId,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct TodosArgs {
    /// Only todos of this task
    task_id: Option<NumericId>,
    /// Page number, starting at 1
    #[validate(range(min = 1))]
    page_number: Option<u32>,
    /// Page size (max 200)
    #[validate(range(min = 1))]
    page_size: Option<u32>,
    /// Additional filter[...] parameters, e.g. {"filter[status]": 1}
    extra_filters: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct TodoArgs {
    /// Todo ID
    todo_id: NumericId,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct RecentUpdatesArgs {
    /// Lookback window in hours (default: 24)
    #[validate(range(min = 1))]
    hours: Option<u32>,
    /// Only activity by this person
    user_id: Option<NumericId>,
    /// Only activity in this project
    project_id: Option<NumericId>,
    /// Activity kind: 1 = comment, 2 = changeset, 3 = email
    #[validate(range(min = 1, max = 3))]
    activity_type: Option<u8>,
    /// Item type, e.g. "Task", "Page", "Deal"
    item_type: Option<String>,
    /// Event, e.g. "create", "update", "delete"
    event_type: Option<String>,
    /// Only activity on this task
    task_id: Option<NumericId>,
    /// Maximum number of activities (default: 100, max: 200)
    #[validate(range(min = 1))]
    max_results: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct SearchArgs {
    /// Case-insensitive search term
    #[validate(length(min = 1))]
    query: String,
}

/// Deserialize and validate tool arguments; any failure is invalid input
fn parse_args<T>(args: Value) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let args = if args.is_null() { json!({}) } else { args };
    let parsed: T = serde_json::from_value(args).map_err(|e| ValidationError::InvalidArguments {
        message: e.to_string(),
    })?;
    parsed.validate().map_err(ValidationError::from)?;
    Ok(parsed)
}

fn tool_def<T: JsonSchema>(name: &str, description: &str) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: input_schema::<T>(),
    }
}

/// JSON Schema for a tool's arguments, with subschemas inlined
fn input_schema<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator();
    let schema = generator.into_root_schema_for::<T>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.entry("properties").or_insert_with(|| json!({}));
    }
    value
}

// ==================== Document helpers ====================

fn take_data(document: &mut Value) -> Vec<Value> {
    match document.get_mut("data").map(Value::take) {
        Some(Value::Array(items)) => items,
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

fn set_data(document: &mut Value, items: Vec<Value>) {
    match document.as_object_mut() {
        Some(root) => {
            root.insert("data".to_string(), Value::Array(items));
        }
        None => *document = json!({"data": items}),
    }
}

fn data_len(document: &Value) -> usize {
    match document.get("data") {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(_)) => 1,
        _ => 0,
    }
}

fn meta_mut(document: &mut Value) -> Option<&mut Map<String, Value>> {
    let meta = document
        .as_object_mut()?
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        *meta = Value::Object(Map::new());
    }
    meta.as_object_mut()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_accepts_numbers_and_digit_strings() {
        let args: TaskArgs = parse_args(json!({"task_id": 42})).unwrap();
        assert_eq!(args.task_id.get(), 42);

        let args: TaskArgs = parse_args(json!({"task_id": " 42 "})).unwrap();
        assert_eq!(args.task_id.get(), 42);

        for bad in [json!("abc"), json!("4-2"), json!(0), json!(-1), json!(1.5), json!(null)] {
            let err = parse_args::<TaskArgs>(json!({"task_id": bad})).unwrap_err();
            assert!(err.to_string().starts_with("Invalid input"), "{}", err);
        }
    }

    #[test]
    fn test_missing_required_argument_is_invalid_input() {
        let err = parse_args::<ProjectTaskArgs>(json!({"project_id": 1})).unwrap_err();
        assert!(err.to_string().contains("task_number"));
    }

    #[test]
    fn test_range_validation() {
        assert!(parse_args::<RecentUpdatesArgs>(json!({"hours": 0})).is_err());
        assert!(parse_args::<RecentUpdatesArgs>(json!({"activity_type": 4})).is_err());
        assert!(parse_args::<TasksArgs>(json!({"page_number": 0})).is_err());
        assert!(parse_args::<RecentUpdatesArgs>(json!({"hours": 48, "max_results": 500})).is_ok());
    }

    #[test]
    fn test_status_codes() {
        let args: ProjectTasksArgs =
            parse_args(json!({"project_id": 1, "status": "closed"})).unwrap();
        assert_eq!(args.status.map(TaskStatus::code), Some(2));
        assert!(parse_args::<ProjectTasksArgs>(json!({"project_id": 1, "status": "done"})).is_err());
    }

    #[test]
    fn test_null_arguments_allowed_for_no_arg_tools() {
        assert!(parse_args::<NoArgs>(Value::Null).is_ok());
    }

    #[test]
    fn test_input_schema_shape() {
        let schema = input_schema::<ProjectTasksArgs>();
        assert_eq!(schema["type"], "object");
        assert!(schema.get("$schema").is_none());
        assert!(schema["properties"]["project_id"].is_object());
        assert_eq!(schema["required"], json!(["project_id"]));

        let schema = input_schema::<NoArgs>();
        assert!(schema["properties"].is_object());
    }

    #[test]
    fn test_meta_mut_creates_meta() {
        let mut doc = json!({"data": []});
        meta_mut(&mut doc).unwrap().insert("x".to_string(), json!(1));
        assert_eq!(doc["meta"]["x"], 1);

        let mut doc = json!({"data": [], "meta": "odd"});
        assert!(meta_mut(&mut doc).unwrap().is_empty());
    }
}
