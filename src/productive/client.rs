//! Productive API client
//!
//! Read-only client for the Productive JSON:API. Every public method issues
//! exactly one GET request and maps the HTTP outcome onto [`ApiError`].
//! Nothing is retried here.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::{productive::CONTENT_TYPE as JSON_API, Config};
use crate::error::{ApiError, ConfigError, ProductiveMcpError, Result};
use crate::productive::query::QuerySpec;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const ORGANIZATION_HEADER: &str = "X-Organization-Id";

/// Productive API client
pub struct ProductiveClient {
    /// HTTP client carrying auth headers and timeout
    http_client: reqwest::Client,

    base_url: String,

    timeout_secs: u64,
}

impl ProductiveClient {
    /// Create a new client from the startup configuration
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(&config.api_key).map_err(|_| {
            ConfigError::InvalidValue {
                var: crate::config::env::API_KEY.to_string(),
                message: "contains characters not allowed in an HTTP header".to_string(),
            }
        })?;
        token.set_sensitive(true);
        headers.insert(AUTH_TOKEN_HEADER, token);
        headers.insert(
            ORGANIZATION_HEADER,
            HeaderValue::from(config.organization_id),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("productive-mcp-server/", env!("CARGO_PKG_VERSION"))),
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    // ==================== Transport ====================

    /// Issue one GET for `query` and return the parsed JSON body.
    ///
    /// `resource` names what was requested and only appears in a
    /// [`ApiError::NotFound`].
    pub async fn get(&self, query: &QuerySpec, resource: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, query.path);
        let pairs = query.to_pairs();
        tracing::debug!(path = %query.path, params = ?pairs, "GET");

        let response = self
            .http_client
            .get(&url)
            .query(&pairs)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::OK {
            return response
                .json::<Value>()
                .await
                .map_err(|e| self.transport_error(e).into());
        }

        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        let err = status_error(status, resource, retry_after_secs, &body);
        tracing::warn!(path = %query.path, status = status.as_u16(), kind = err.kind(), "upstream request failed");
        Err(err.into())
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ApiError::from(err)
        }
    }

    // ==================== Resources ====================

    /// List projects
    pub async fn get_projects(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query, "projects").await
    }

    /// List tasks
    pub async fn get_tasks(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query, "tasks").await
    }

    /// Get a task by id
    pub async fn get_task(&self, task_id: u64) -> Result<Value> {
        self.get(&QuerySpec::resource("tasks", task_id), &format!("task {}", task_id))
            .await
    }

    /// Resolve a task by its project-scoped number with a single
    /// collection query.
    ///
    /// Zero matches is [`ApiError::NotFound`]; more than one is
    /// [`ApiError::AmbiguousLookup`]. The returned document holds the match
    /// as its singular `data`, with the query's `included` side table.
    pub async fn find_project_task(&self, project_id: u64, task_number: &str) -> Result<Value> {
        let query = QuerySpec::new("/tasks")
            .filter("filter[project_id][eq]", project_id)
            .filter("filter[task_number][eq]", task_number);
        let document = self.get(&query, "tasks").await?;
        single_match(document, project_id, task_number)
    }

    /// List comments
    pub async fn get_comments(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query, "comments").await
    }

    /// Get a comment by id
    pub async fn get_comment(&self, comment_id: u64) -> Result<Value> {
        self.get(
            &QuerySpec::resource("comments", comment_id),
            &format!("comment {}", comment_id),
        )
        .await
    }

    /// List docs pages
    pub async fn get_pages(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query, "pages").await
    }

    /// Get a docs page by id
    pub async fn get_page(&self, page_id: u64) -> Result<Value> {
        self.get(&QuerySpec::resource("pages", page_id), &format!("page {}", page_id))
            .await
    }

    /// List attachment metadata
    pub async fn get_attachments(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query, "attachments").await
    }

    /// Get attachment metadata by id
    pub async fn get_attachment(&self, attachment_id: u64) -> Result<Value> {
        self.get(
            &QuerySpec::resource("attachments", attachment_id),
            &format!("attachment {}", attachment_id),
        )
        .await
    }

    /// List todos
    pub async fn get_todos(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query, "todos").await
    }

    /// Get a todo by id
    pub async fn get_todo(&self, todo_id: u64) -> Result<Value> {
        self.get(&QuerySpec::resource("todos", todo_id), &format!("todo {}", todo_id))
            .await
    }

    /// List activities
    pub async fn get_activities(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query, "activities").await
    }
}

fn status_error(
    status: StatusCode,
    resource: &str,
    retry_after_secs: Option<u64>,
    body: &str,
) -> ApiError {
    match status.as_u16() {
        401 | 403 => ApiError::AuthorizationFailure {
            status: status.as_u16(),
        },
        404 => ApiError::NotFound {
            resource: resource.to_string(),
        },
        429 => ApiError::RateLimited { retry_after_secs },
        code if status.is_server_error() => ApiError::UpstreamFailure {
            message: format!("Productive API returned HTTP {}", code),
        },
        code => ApiError::UpstreamFailure {
            message: match error_detail(body) {
                Some(detail) => format!("Productive API rejected the request (HTTP {}): {}", code, detail),
                None => format!("Productive API rejected the request (HTTP {})", code),
            },
        },
    }
}

/// First `errors[].detail` (or `title`) of a JSON:API error document
fn error_detail(body: &str) -> Option<String> {
    let document: Value = serde_json::from_str(body).ok()?;
    let error = document.get("errors")?.as_array()?.first()?;
    error
        .get("detail")
        .or_else(|| error.get("title"))
        .and_then(Value::as_str)
        .map(|s| s.chars().take(200).collect())
}

fn single_match(document: Value, project_id: u64, task_number: &str) -> Result<Value> {
    let Value::Object(mut document) = document else {
        return Err(not_found(project_id, task_number));
    };

    let mut matches = match document.remove("data") {
        Some(Value::Array(items)) => items,
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    };
    let total = document
        .get("meta")
        .and_then(|m| m.get("total_count"))
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(0)
        .max(matches.len());

    match (matches.pop(), total) {
        (None, _) => Err(not_found(project_id, task_number)),
        (Some(task), 1) => {
            let mut result = serde_json::Map::new();
            result.insert("data".to_string(), task);
            if let Some(included) = document.remove("included") {
                result.insert("included".to_string(), included);
            }
            Ok(Value::Object(result))
        }
        (Some(_), count) => Err(ApiError::AmbiguousLookup {
            task_number: task_number.to_string(),
            project_id,
            matches: count,
        }
        .into()),
    }
}

fn not_found(project_id: u64, task_number: &str) -> ProductiveMcpError {
    ApiError::NotFound {
        resource: format!("task #{} in project {}", task_number, project_id),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        let kind = |code: u16| {
            status_error(StatusCode::from_u16(code).unwrap(), "task 1", None, "").kind()
        };
        assert_eq!(kind(401), "authorization_failure");
        assert_eq!(kind(403), "authorization_failure");
        assert_eq!(kind(404), "not_found");
        assert_eq!(kind(429), "rate_limited");
        assert_eq!(kind(500), "upstream_failure");
        assert_eq!(kind(503), "upstream_failure");
        assert_eq!(kind(400), "upstream_failure");
    }

    #[test]
    fn test_rejection_carries_api_detail_only() {
        let body = r#"{"errors":[{"status":"400","title":"Bad sort","detail":"sort by 'nope' is not supported"}],"debug":"internal"}"#;
        let err = status_error(StatusCode::BAD_REQUEST, "tasks", None, body);
        let text = err.to_string();
        assert!(text.contains("HTTP 400"));
        assert!(text.contains("sort by 'nope' is not supported"));
        assert!(!text.contains("internal"));

        let err = status_error(StatusCode::BAD_GATEWAY, "tasks", None, "<html>proxy</html>");
        assert!(!err.to_string().contains("proxy"));
    }

    #[test]
    fn test_single_match_outcomes() {
        let none = single_match(json!({"data": [], "meta": {"total_count": 0}}), 7, "12");
        assert!(matches!(
            none,
            Err(ProductiveMcpError::Api(ApiError::NotFound { .. }))
        ));

        let two = single_match(
            json!({"data": [{"id": "1", "type": "tasks"}, {"id": "2", "type": "tasks"}]}),
            7,
            "12",
        );
        assert!(matches!(
            two,
            Err(ProductiveMcpError::Api(ApiError::AmbiguousLookup { matches: 2, .. }))
        ));

        let one = single_match(
            json!({"data": [{"id": "1", "type": "tasks"}], "included": [{"id": "5", "type": "people"}], "meta": {"total_count": 1}}),
            7,
            "12",
        )
        .unwrap();
        assert_eq!(one["data"]["id"], "1");
        assert_eq!(one["included"][0]["id"], "5");
    }

    #[test]
    fn test_single_match_uses_total_count() {
        let paged = single_match(
            json!({"data": [{"id": "1", "type": "tasks"}], "meta": {"total_count": 3}}),
            7,
            "12",
        );
        assert!(matches!(
            paged,
            Err(ProductiveMcpError::Api(ApiError::AmbiguousLookup { matches: 3, .. }))
        ));
    }
}
