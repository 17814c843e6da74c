//! Domain repositories over the record store. Every operation reads the
//! full collection, mutates in memory, and writes the full collection back.

use anyhow::{bail, Result};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;

use crate::model::{
    Activity, ActivityStatus, Priority, Role, Task, TaskPull, TimeValid, User,
};
use crate::store::{RecordStore, ACTIVITIES, TASKS, USERS};

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// --- users ---

pub fn list_users(store: &RecordStore) -> Vec<User> {
    store.read_records(USERS)
}

pub fn get_user(store: &RecordStore, id: i64) -> Option<User> {
    list_users(store).into_iter().find(|u| u.id == id)
}

/// First user with the owner role. Activities are always assigned to the
/// owner.
pub fn find_owner(store: &RecordStore) -> Option<User> {
    list_users(store).into_iter().find(|u| u.role == Role::Owner)
}

pub struct NewUser {
    pub tg_id: i64,
    pub tg_tag: String,
    pub username: String,
    pub role: Role,
}

#[derive(Default)]
pub struct UserPatch {
    pub tg_id: Option<i64>,
    pub tg_tag: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
}

pub fn create_user(store: &RecordStore, new: NewUser) -> User {
    let mut users = list_users(store);
    let user = User {
        id: store.next_id(),
        tg_id: new.tg_id,
        tg_tag: new.tg_tag,
        username: new.username,
        role: new.role,
        created_at: now(),
    };
    users.push(user.clone());
    store.write_records(USERS, &users);
    user
}

pub fn update_user(store: &RecordStore, id: i64, patch: UserPatch) -> Option<User> {
    let mut users = list_users(store);
    let user = users.iter_mut().find(|u| u.id == id)?;
    if let Some(tg_id) = patch.tg_id {
        user.tg_id = tg_id;
    }
    if let Some(tg_tag) = patch.tg_tag {
        user.tg_tag = tg_tag;
    }
    if let Some(username) = patch.username {
        user.username = username;
    }
    if let Some(role) = patch.role {
        user.role = role;
    }
    let updated = user.clone();
    store.write_records(USERS, &users);
    Some(updated)
}

pub fn delete_user(store: &RecordStore, id: i64) -> bool {
    let users = list_users(store);
    let filtered: Vec<User> = users.iter().filter(|u| u.id != id).cloned().collect();
    if filtered.len() == users.len() {
        return false;
    }
    store.write_records(USERS, &filtered);
    true
}

// --- tasks ---

pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Priority,
}

#[derive(Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
}

pub fn list_tasks(store: &RecordStore) -> Vec<Task> {
    store.read_records(TASKS)
}

pub fn get_task(store: &RecordStore, id: i64) -> Option<Task> {
    list_tasks(store).into_iter().find(|t| t.id == id)
}

pub fn create_task(store: &RecordStore, new: NewTask) -> Task {
    let mut tasks = list_tasks(store);
    let task = Task {
        id: store.next_id(),
        title: new.title,
        description: new.description,
        status: new.status,
        priority: new.priority,
        start_time: None,
        deadline: None,
        created_at: now(),
        assigned_to: None,
    };
    tasks.push(task.clone());
    store.write_records(TASKS, &tasks);
    task
}

/// Merge a partial update into the task with the given id. Returns None
/// when no task matches; the collection is left untouched in that case.
pub fn update_task(store: &RecordStore, id: i64, patch: TaskPatch) -> Option<Task> {
    let mut tasks = list_tasks(store);
    let task = tasks.iter_mut().find(|t| t.id == id)?;
    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = Some(description);
    }
    if let Some(status) = patch.status {
        task.status = status;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    let updated = task.clone();
    store.write_records(TASKS, &tasks);
    Some(updated)
}

/// Returns whether a task was actually removed.
pub fn delete_task(store: &RecordStore, id: i64) -> bool {
    let tasks = list_tasks(store);
    let filtered: Vec<Task> = tasks.iter().filter(|t| t.id != id).cloned().collect();
    if filtered.len() == tasks.len() {
        return false;
    }
    store.write_records(TASKS, &filtered);
    true
}

// --- activities ---

pub struct NewActivity {
    pub assign_id: i64,
    pub task_id: i64,
    pub task_pull: TaskPull,
    pub status: ActivityStatus,
    pub start_time: TimeValid,
    pub deadline: TimeValid,
}

#[derive(Default)]
pub struct ActivityPatch {
    pub status: Option<ActivityStatus>,
    pub start_time: Option<TimeValid>,
    pub deadline: Option<TimeValid>,
}

pub fn list_activities(store: &RecordStore) -> Vec<Activity> {
    store.read_records(ACTIVITIES)
}

pub fn get_activity(store: &RecordStore, id: i64) -> Option<Activity> {
    list_activities(store).into_iter().find(|a| a.id == id)
}

pub fn create_activity(store: &RecordStore, new: NewActivity) -> Activity {
    let mut activities = list_activities(store);
    let activity = Activity {
        id: store.next_id(),
        assign_id: new.assign_id,
        task_id: new.task_id,
        task_pull: new.task_pull,
        status: new.status,
        start_time: new.start_time,
        deadline: new.deadline,
        created_at: now(),
    };
    activities.push(activity.clone());
    store.write_records(ACTIVITIES, &activities);
    activity
}

pub fn update_activity(store: &RecordStore, id: i64, patch: ActivityPatch) -> Option<Activity> {
    let mut activities = list_activities(store);
    let activity = activities.iter_mut().find(|a| a.id == id)?;
    if let Some(status) = patch.status {
        activity.status = status;
    }
    if let Some(start_time) = patch.start_time {
        activity.start_time = start_time;
    }
    if let Some(deadline) = patch.deadline {
        activity.deadline = deadline;
    }
    let updated = activity.clone();
    store.write_records(ACTIVITIES, &activities);
    Some(updated)
}

pub fn delete_activity(store: &RecordStore, id: i64) -> bool {
    let activities = list_activities(store);
    let filtered: Vec<Activity> = activities.iter().filter(|a| a.id != id).cloned().collect();
    if filtered.len() == activities.len() {
        return false;
    }
    store.write_records(ACTIVITIES, &filtered);
    true
}

/// Shortcut that marks an activity done regardless of its current status.
pub fn complete_activity(store: &RecordStore, id: i64) -> Option<Activity> {
    update_activity(
        store,
        id,
        ActivityPatch {
            status: Some(ActivityStatus::Done),
            ..ActivityPatch::default()
        },
    )
}

/// Convert a pool task into a scheduled activity for the owner.
///
/// The activity carries a task_pull snapshot of the source task; once the
/// activity is written the task is deleted from the pool. The two writes
/// are sequential, not atomic.
pub fn assign_task(
    store: &RecordStore,
    task_id: i64,
    start_time: &str,
    deadline: &str,
) -> Result<Activity> {
    let Some(task) = get_task(store, task_id) else {
        bail!("task {task_id} not found");
    };
    let Some(owner) = find_owner(store) else {
        bail!("no user with the owner role");
    };

    let activity = create_activity(
        store,
        NewActivity {
            assign_id: owner.id,
            task_id: task.id,
            task_pull: TaskPull {
                id: task.id,
                title: task.title.clone(),
                description: task.description.clone().unwrap_or_default(),
                priority: task.priority,
                created_at: task.created_at.clone(),
            },
            status: ActivityStatus::Todo,
            start_time: TimeValid::some(start_time),
            deadline: TimeValid::some(deadline),
        },
    );
    delete_task(store, task.id);
    Ok(activity)
}

// --- bulk import ---

#[derive(Debug, Deserialize)]
struct ImportEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: u32,
    pub failed: u32,
}

impl ImportSummary {
    pub fn total(self) -> u32 {
        self.imported + self.failed
    }
}

/// Import a JSON array of task-shaped entries. An entry with a non-empty
/// title becomes a task; anything else counts as failed. Only a top-level
/// parse failure aborts, and it aborts before any record is created.
pub fn import_tasks(store: &RecordStore, raw: &str) -> Result<ImportSummary> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => bail!("import file is not a JSON array of tasks: {e}"),
    };

    let mut summary = ImportSummary::default();
    for entry in entries {
        match serde_json::from_value::<ImportEntry>(entry) {
            Ok(entry) => match entry.title {
                Some(title) if !title.is_empty() => {
                    create_task(
                        store,
                        NewTask {
                            title,
                            description: Some(entry.description.unwrap_or_default()),
                            status: entry.status.unwrap_or_else(|| "todo".to_string()),
                            priority: entry.priority.unwrap_or_default(),
                        },
                    );
                    summary.imported += 1;
                }
                _ => summary.failed += 1,
            },
            Err(_) => summary.failed += 1,
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn seeded_store() -> RecordStore {
        let store = RecordStore::in_memory();
        seed::initialize(&store);
        store
    }

    #[test]
    fn users_lookup() {
        let store = seeded_store();
        assert_eq!(list_users(&store).len(), 2);
        assert_eq!(get_user(&store, 1).unwrap().username, "executor");
        assert!(get_user(&store, 99).is_none());
        assert_eq!(find_owner(&store).unwrap().role, Role::Owner);
    }

    #[test]
    fn user_crud() {
        let store = seeded_store();
        let user = create_user(
            &store,
            NewUser {
                tg_id: 42,
                tg_tag: "@helper".to_string(),
                username: "helper".to_string(),
                role: Role::Manager,
            },
        );
        assert!(user.id > 10);
        assert_eq!(list_users(&store).len(), 3);

        let updated = update_user(
            &store,
            user.id,
            UserPatch {
                username: Some("renamed".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap();
        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.tg_tag, "@helper");
        assert!(update_user(&store, 9999, UserPatch::default()).is_none());

        assert!(delete_user(&store, user.id));
        assert!(!delete_user(&store, user.id));
        assert_eq!(list_users(&store).len(), 2);
    }

    #[test]
    fn create_task_assigns_fresh_id() {
        let store = RecordStore::in_memory();
        let task = create_task(
            &store,
            NewTask {
                title: "X".to_string(),
                description: None,
                status: "todo".to_string(),
                priority: Priority::High,
            },
        );
        assert!(task.id > 0);

        let tasks = list_tasks(&store);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "X");
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[0], task);
    }

    #[test]
    fn update_task_merges_partial_fields() {
        let store = seeded_store();
        let updated = update_task(
            &store,
            3,
            TaskPatch {
                status: Some("in_progress".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
        assert_eq!(updated.status, "in_progress");
        // Untouched fields survive the merge.
        assert_eq!(updated.title, "Design the landing page");
        assert_eq!(get_task(&store, 3).unwrap(), updated);
    }

    #[test]
    fn update_missing_task_returns_none() {
        let store = seeded_store();
        let before = list_tasks(&store);
        assert!(update_task(&store, 9999, TaskPatch::default()).is_none());
        assert_eq!(list_tasks(&store), before);
    }

    #[test]
    fn delete_task_twice() {
        let store = seeded_store();
        assert!(delete_task(&store, 3));
        assert!(get_task(&store, 3).is_none());
        assert!(!delete_task(&store, 3));
    }

    #[test]
    fn update_missing_activity_leaves_collection_unchanged() {
        let store = seeded_store();
        let before = list_activities(&store);
        assert!(update_activity(&store, 9999, ActivityPatch::default()).is_none());
        assert_eq!(list_activities(&store), before);
    }

    #[test]
    fn complete_sets_done_from_any_status() {
        let store = seeded_store();
        // Seed activity 8 is in_progress, 9 is todo.
        assert_eq!(
            complete_activity(&store, 8).unwrap().status,
            ActivityStatus::Done
        );
        assert_eq!(
            complete_activity(&store, 9).unwrap().status,
            ActivityStatus::Done
        );
    }

    #[test]
    fn delete_activity_twice() {
        let store = seeded_store();
        assert!(delete_activity(&store, 8));
        assert!(!delete_activity(&store, 8));
    }

    #[test]
    fn assign_moves_task_into_activity() {
        let store = seeded_store();
        let task = get_task(&store, 6).unwrap();
        let tasks_before = list_tasks(&store).len();
        let activities_before = list_activities(&store).len();

        let activity =
            assign_task(&store, 6, "2025-06-02T09:00:00Z", "2025-06-02T11:00:00Z").unwrap();

        assert_eq!(list_tasks(&store).len(), tasks_before - 1);
        assert!(get_task(&store, 6).is_none());
        assert_eq!(list_activities(&store).len(), activities_before + 1);

        assert_eq!(activity.assign_id, 1);
        assert_eq!(activity.task_id, 6);
        assert_eq!(activity.status, ActivityStatus::Todo);
        assert_eq!(activity.task_pull.title, task.title);
        assert_eq!(
            activity.task_pull.description,
            task.description.unwrap_or_default()
        );
        assert_eq!(activity.task_pull.priority, task.priority);
        assert_eq!(activity.start_time.as_option(), Some("2025-06-02T09:00:00Z"));
    }

    #[test]
    fn assign_snapshot_does_not_track_later_edits() {
        let store = seeded_store();
        let activity =
            assign_task(&store, 7, "2025-06-02T09:00:00Z", "2025-06-02T10:00:00Z").unwrap();
        let title_at_assignment = activity.task_pull.title.clone();

        // The pool task is gone, so there is nothing left to edit; the
        // snapshot is all that remains of it.
        assert!(get_task(&store, 7).is_none());
        assert_eq!(
            get_activity(&store, activity.id).unwrap().task_pull.title,
            title_at_assignment
        );
    }

    #[test]
    fn assign_missing_task_fails() {
        let store = seeded_store();
        assert!(assign_task(&store, 9999, "a", "b").is_err());
    }

    #[test]
    fn assign_without_owner_fails() {
        let store = RecordStore::in_memory();
        create_task(
            &store,
            NewTask {
                title: "orphan".to_string(),
                description: None,
                status: "todo".to_string(),
                priority: Priority::Low,
            },
        );
        let task_id = list_tasks(&store)[0].id;
        assert!(assign_task(&store, task_id, "a", "b").is_err());
        // The pool must be untouched when no owner exists.
        assert_eq!(list_tasks(&store).len(), 1);
    }

    #[test]
    fn import_counts_titled_and_untitled_entries() {
        let store = RecordStore::in_memory();
        let raw = r#"[
            {"title": "First", "priority": "high"},
            {"title": "", "description": "no title"},
            {"description": "missing title"},
            {"title": "Second", "status": "in_progress"}
        ]"#;
        let summary = import_tasks(&store, raw).unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.total(), 4);

        let tasks = list_tasks(&store);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "First");
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[1].status, "in_progress");
    }

    #[test]
    fn import_bad_entry_shape_counts_failed() {
        let store = RecordStore::in_memory();
        let raw = r#"[{"title": "ok"}, {"title": 42}, {"title": "x", "priority": "urgent"}]"#;
        let summary = import_tasks(&store, raw).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.failed, 2);
    }

    #[test]
    fn import_top_level_parse_error_creates_nothing() {
        let store = RecordStore::in_memory();
        assert!(import_tasks(&store, "{\"not\": \"an array\"}").is_err());
        assert!(import_tasks(&store, "not json at all").is_err());
        assert!(list_tasks(&store).is_empty());
    }

    #[test]
    fn import_defaults_for_omitted_fields() {
        let store = RecordStore::in_memory();
        import_tasks(&store, r#"[{"title": "bare"}]"#).unwrap();
        let task = &list_tasks(&store)[0];
        assert_eq!(task.status, "todo");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.description.as_deref(), Some(""));
    }
}
