use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Manager,
}

impl Role {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            _ => anyhow::bail!("invalid role '{s}': must be owner or manager"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => anyhow::bail!("invalid priority '{s}': must be low, medium, or high"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Self::Low => " ",
            Self::Medium => "-",
            Self::High => "!",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity statuses form a closed set, but transitions are not guarded:
/// any status may be set directly, and "complete" jumps to done from
/// whatever the current status is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Todo,
    InProgress,
    Done,
}

impl ActivityStatus {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => anyhow::bail!("invalid status '{s}': must be todo, in_progress, or done"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Todo => ".",
            Self::InProgress => "*",
            Self::Done => "x",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub tg_id: i64,
    pub tg_tag: String,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

/// An unassigned work item in the manager's pool. `status` is a free-form
/// string (conventionally todo/in_progress/done); only activities carry the
/// validated status enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
}

/// Point-in-time copy of the task an activity was created from. Edits to
/// the pool task (if it still existed) do not propagate here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPull {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub created_at: String,
}

/// Nullable timestamp pair. Field names are capitalized on the wire; that
/// spelling comes from the backend and is load-bearing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeValid {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Valid")]
    pub valid: bool,
}

impl TimeValid {
    pub fn some(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            valid: true,
        }
    }

    pub fn none() -> Self {
        Self {
            time: String::new(),
            valid: false,
        }
    }

    pub fn as_option(&self) -> Option<&str> {
        self.valid.then_some(self.time.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub assign_id: i64,
    pub task_id: i64,
    pub task_pull: TaskPull,
    pub status: ActivityStatus,
    pub start_time: TimeValid,
    pub deadline: TimeValid,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parse_roundtrip() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::parse(p.as_str()).unwrap(), p);
        }
        assert!(Priority::parse("urgent").is_err());
    }

    #[test]
    fn status_parse_roundtrip() {
        for s in [
            ActivityStatus::Todo,
            ActivityStatus::InProgress,
            ActivityStatus::Done,
        ] {
            assert_eq!(ActivityStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(ActivityStatus::parse("paused").is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ActivityStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn time_valid_wire_field_names() {
        let t = TimeValid::some("2025-06-01T09:00:00Z");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["Time"], "2025-06-01T09:00:00Z");
        assert_eq!(json["Valid"], true);
        assert!(TimeValid::none().as_option().is_none());
    }

    #[test]
    fn task_decodes_with_missing_optionals() {
        let task: Task = serde_json::from_str(
            r#"{"id":1,"title":"t","status":"todo","created_at":"2025-06-01T09:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.description.is_none());
        assert!(task.assigned_to.is_none());
    }
}
