//! Activity feed post-processing
//!
//! The `/activities` endpoint is queried with a lower-bound timestamp; the
//! helpers here enforce that window locally, order entries newest first,
//! cap the result count and build the digest counters returned in `meta`.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

/// Lower bound of a lookback window ending at `now`
pub fn cutoff(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    now - Duration::hours(i64::from(hours))
}

/// Timestamp format used for `filter[after]` and `meta.cutoff_time`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn created_at(activity: &Value) -> Option<DateTime<Utc>> {
    let raw = activity.get("attributes")?.get("created_at")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Keep activities inside the window, newest first, at most `max_results`.
///
/// Entries without a parseable `created_at` are kept (the upstream filter
/// already scoped them) and sort after all dated entries.
pub fn select_recent(
    mut activities: Vec<Value>,
    cutoff: DateTime<Utc>,
    max_results: usize,
) -> Vec<Value> {
    activities.retain(|activity| match created_at(activity) {
        Some(at) => at >= cutoff,
        None => true,
    });
    activities.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    activities.truncate(max_results);
    activities
}

/// Counts of activities by type, event and item type
pub fn summarize(activities: &[Value]) -> Value {
    let mut by_type = Map::new();
    let mut by_event = Map::new();
    let mut by_item_type = Map::new();

    for activity in activities {
        let Some(attributes) = activity.get("attributes") else {
            continue;
        };
        count(&mut by_type, attributes.get("type"));
        count(&mut by_event, attributes.get("event"));
        count(&mut by_item_type, attributes.get("item_type"));
    }

    json!({
        "by_type": by_type,
        "by_event": by_event,
        "by_item_type": by_item_type,
        "total": activities.len(),
    })
}

fn count(counter: &mut Map<String, Value>, key: Option<&Value>) {
    let key = match key {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return,
    };
    let current = counter.get(&key).and_then(Value::as_u64).unwrap_or(0);
    counter.insert(key, json!(current + 1));
}

/// Case-insensitive match of `term` against the searchable text fields
pub fn matches_text(activity: &Value, term: &str, fields: &[&str]) -> bool {
    let needle = term.trim().to_lowercase();
    let Some(attributes) = activity.get("attributes") else {
        return false;
    };
    fields.iter().any(|field| {
        attributes
            .get(*field)
            .and_then(Value::as_str)
            .map(|text| text.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}
