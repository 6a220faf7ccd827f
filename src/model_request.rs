//! Builds the message list sent to the language model for a chat turn.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::prompts::HAVI_SYSTEM_PROMPT;
use crate::time_util::{days_since, parse_loose_date, today_in};

pub const FEEDBACK_SUMMARY_MAX_CHARS: usize = 400;
pub const CHILD_CONTEXT_SEPARATOR: &str = " | ";
const ELLIPSIS: char = '…';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequestInput {
    pub user_message: String,
    #[serde(default)]
    pub user_preferences: Option<String>,
    #[serde(default)]
    pub child: Option<ChildProfile>,
    #[serde(default)]
    pub feedback_summary: Option<String>,
}

/// System message first, then the user's message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
}

/// Present when it has any non-whitespace content. The value itself is
/// passed through untouched.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// `"{weeks}w"` from the birth date and `"adjusted {days}d"` from the due
/// date, joined by a space. Dates that fail to parse or lie in the future
/// contribute nothing.
pub fn child_age_annotation(
    child: &ChildProfile,
    today: NaiveDate,
    timezone: Tz,
) -> Option<String> {
    let elapsed = |value: Option<&str>| {
        value
            .and_then(|v| parse_loose_date(v, timezone))
            .map(|date| days_since(date, today))
            .filter(|days| *days >= 0)
    };

    let parts: Vec<String> = [
        elapsed(child.dob.as_deref()).map(|days| format!("{}w", days / 7)),
        elapsed(child.due_date.as_deref())
            .map(|days| format!("adjusted {}d", days)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn child_context_line(
    child: &ChildProfile,
    today: NaiveDate,
    timezone: Tz,
) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(name) = non_empty(child.name.as_deref()) {
        parts.push(format!("Name: {}", name));
    }
    if let Some(dob) = non_empty(child.dob.as_deref()) {
        parts.push(format!("DOB: {}", dob));
    }
    if let Some(due_date) = non_empty(child.due_date.as_deref()) {
        parts.push(format!("Due date: {}", due_date));
    }
    if let Some(age) = child_age_annotation(child, today, timezone) {
        parts.push(format!("Age: {}", age));
    }

    if parts.is_empty() {
        return None;
    }
    Some(format!(
        "Child context: {}",
        parts.join(CHILD_CONTEXT_SEPARATOR)
    ))
}

/// Collapse runs of whitespace, trim, and cap the length at
/// [`FEEDBACK_SUMMARY_MAX_CHARS`] characters including the ellipsis.
pub fn normalize_feedback_summary(summary: &str) -> Option<String> {
    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    if collapsed.chars().count() <= FEEDBACK_SUMMARY_MAX_CHARS {
        return Some(collapsed);
    }
    let mut truncated: String = collapsed
        .chars()
        .take(FEEDBACK_SUMMARY_MAX_CHARS - 1)
        .collect();
    truncated.push(ELLIPSIS);
    Some(truncated)
}

/// Build the request against an explicit `today`, for callers that need
/// deterministic output.
#[instrument(skip(input), fields(has_child = input.child.is_some()))]
pub fn build_havi_model_request_at(
    input: &ModelRequestInput,
    today: NaiveDate,
    timezone: Tz,
) -> ModelRequest {
    let mut system_lines = vec![HAVI_SYSTEM_PROMPT.to_string()];

    if let Some(preferences) = non_empty(input.user_preferences.as_deref()) {
        system_lines.push(format!("User preferences: {}", preferences));
    }
    if let Some(line) = input
        .child
        .as_ref()
        .and_then(|child| child_context_line(child, today, timezone))
    {
        system_lines.push(line);
    }
    if let Some(summary) = input
        .feedback_summary
        .as_deref()
        .and_then(normalize_feedback_summary)
    {
        system_lines.push(format!("Feedback summary: {}", summary));
    }

    debug!("Built system message with {} lines", system_lines.len());

    ModelRequest {
        messages: vec![
            ChatMessage {
                role: Role::System,
                content: system_lines.join("\n"),
            },
            ChatMessage {
                role: Role::User,
                content: input.user_message.clone(),
            },
        ],
    }
}

/// Build the request using the current date in `timezone`.
pub fn build_havi_model_request(
    input: &ModelRequestInput,
    timezone: Tz,
) -> ModelRequest {
    build_havi_model_request_at(input, today_in(timezone), timezone)
}
