//! Blocking REST client mirroring the repository surface. One request per
//! operation, no retry, no pagination, no caching.

use std::time::Duration;

use reqwest::blocking::{multipart, Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{Activity, ActivityStatus, Priority, Role, Task, TimeValid, User};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A decode failure is typed separately from transport and HTTP-status
/// failures so callers can tell a malformed response from a dead server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(StatusCode),

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

// --- wire types ---

#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskResponse {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignActivityRequest {
    pub assign_id: i64,
    pub task_id: i64,
    pub status: ActivityStatus,
    pub start_time: String,
    pub deadline: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateEventRequest {
    pub task_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub assign_id: i64,
    pub start_time: TimeValid,
    pub deadline: TimeValid,
    pub description: String,
    pub status: ActivityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRequest {
    pub tg_id: i64,
    pub tg_tag: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tg_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tg_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportReport {
    pub message: String,
    pub imported: u32,
    pub failed: u32,
    pub total_processed: u32,
    pub errors: Option<Vec<String>>,
}

// --- decoding ---

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// List bodies are lenient: a null body is an empty list, and an object
/// keyed by id decodes positionally as a list. Both shapes occur in the
/// wild and are required compatibility behavior.
fn decode_list<T: DeserializeOwned>(value: Value) -> ApiResult<Vec<T>> {
    let items = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => {
            return Err(ApiError::Decode(format!(
                "expected a list, got: {other}"
            )))
        }
    };
    items.into_iter().map(decode).collect()
}

// --- client ---

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("planner-cli")
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/bot/planner{path}", self.base_url)
    }

    fn checked(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        Ok(response)
    }

    fn get(&self, path: &str) -> ApiResult<Value> {
        let response = Self::checked(self.http.get(self.url(path)).send()?)?;
        Ok(response.json()?)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let response = Self::checked(self.http.post(self.url(path)).json(body).send()?)?;
        Ok(response.json()?)
    }

    fn put<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let response = Self::checked(self.http.put(self.url(path)).json(body).send()?)?;
        Ok(response.json()?)
    }

    fn delete(&self, path: &str) -> ApiResult<()> {
        Self::checked(self.http.delete(self.url(path)).send()?)?;
        Ok(())
    }

    // --- users ---

    pub fn create_user(&self, request: &UserRequest) -> ApiResult<User> {
        decode(self.post("/users", request)?)
    }

    pub fn get_user(&self, id: i64) -> ApiResult<User> {
        decode(self.get(&format!("/users/{id}"))?)
    }

    pub fn list_users(&self) -> ApiResult<Vec<User>> {
        decode_list(self.get("/users")?)
    }

    pub fn update_user(&self, id: i64, request: &UserPatchRequest) -> ApiResult<User> {
        decode(self.put(&format!("/users/{id}"), request)?)
    }

    pub fn delete_user(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/users/{id}"))
    }

    // --- tasks ---

    pub fn create_task(&self, request: &CreateTaskRequest) -> ApiResult<CreateTaskResponse> {
        decode(self.post("/tasks", request)?)
    }

    pub fn get_task(&self, id: i64) -> ApiResult<Task> {
        decode(self.get(&format!("/tasks/{id}"))?)
    }

    pub fn unassigned_tasks(&self) -> ApiResult<Vec<Task>> {
        decode_list(self.get("/tasks/unassigned")?)
    }

    pub fn update_task(&self, id: i64, request: &UpdateTaskRequest) -> ApiResult<Task> {
        decode(self.put(&format!("/tasks/{id}"), request)?)
    }

    pub fn delete_task(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/tasks/{id}"))
    }

    /// Multipart upload of a tasks file; the server answers with per-batch
    /// import counts.
    pub fn import_tasks(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<ImportReport> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let response = Self::checked(
            self.http
                .post(self.url("/tasks/import"))
                .multipart(form)
                .send()?,
        )?;
        decode(response.json()?)
    }

    // --- activities ---

    pub fn assign_activity(&self, request: &AssignActivityRequest) -> ApiResult<()> {
        // The backend answers with no useful body here; only the status
        // matters.
        Self::checked(
            self.http
                .post(self.url("/activities"))
                .json(request)
                .send()?,
        )?;
        Ok(())
    }

    pub fn get_activity(&self, id: i64) -> ApiResult<Activity> {
        decode(self.get(&format!("/activities/{id}"))?)
    }

    pub fn user_activities(&self, user_id: i64) -> ApiResult<Vec<Activity>> {
        decode_list(self.get(&format!("/activities/user/{user_id}"))?)
    }

    pub fn update_activity(&self, id: i64, request: &UpdateEventRequest) -> ApiResult<Activity> {
        decode(self.put(&format!("/activities/{id}"), request)?)
    }

    pub fn delete_activity(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/activities/{id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_list_body_is_empty() {
        let tasks: Vec<Task> = decode_list(Value::Null).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn keyed_object_body_decodes_positionally() {
        let body = json!({
            "0": {"id": 1, "title": "a", "status": "todo", "created_at": "2025-06-01T09:00:00Z"},
            "1": {"id": 2, "title": "b", "status": "todo", "created_at": "2025-06-01T09:00:00Z"},
        });
        let tasks: Vec<Task> = decode_list(body).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, 1);
        assert_eq!(tasks[1].title, "b");
    }

    #[test]
    fn scalar_list_body_is_a_decode_error() {
        let err = decode_list::<Task>(json!(7)).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn malformed_record_is_a_decode_error() {
        let err = decode::<Task>(json!({"id": "not-a-number"})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn import_report_tolerates_null_errors() {
        let report: ImportReport = decode(json!({
            "message": "ok",
            "imported": 3,
            "failed": 1,
            "total_processed": 4,
            "errors": null,
        }))
        .unwrap();
        assert_eq!(report.imported, 3);
        assert!(report.errors.is_none());
    }

    #[test]
    fn update_request_omits_unset_fields() {
        let body = serde_json::to_value(UpdateTaskRequest {
            status: Some("done".to_string()),
            ..UpdateTaskRequest::default()
        })
        .unwrap();
        assert_eq!(body, json!({"status": "done"}));
    }
}
