//! Demo fixtures and the store lifecycle built on them: first-run seeding
//! behind an idempotent guard, a destructive reset, and a restore back to
//! the fixture state.

use crate::model::{
    Activity, ActivityStatus, Priority, Role, Task, TaskPull, TimeValid, User,
};
use crate::store::{RecordStore, ACTIVITIES, INITIALIZED, TASKS, USERS};

const SEED_STAMP: &str = "2025-06-01T09:00:00Z";

// Fixture ids are fixed; the id counter starts above them.
const SEED_ID_CEILING: i64 = 10;

pub fn seed_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            tg_id: 123_456_789,
            tg_tag: "@executor".to_string(),
            username: "executor".to_string(),
            role: Role::Owner,
            created_at: SEED_STAMP.to_string(),
        },
        User {
            id: 2,
            tg_id: 987_654_321,
            tg_tag: "@dmanager".to_string(),
            username: "manager".to_string(),
            role: Role::Manager,
            created_at: SEED_STAMP.to_string(),
        },
    ]
}

fn seed_task(id: i64, title: &str, description: &str, priority: Priority) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: Some(description.to_string()),
        status: "todo".to_string(),
        priority,
        start_time: None,
        deadline: None,
        created_at: SEED_STAMP.to_string(),
        assigned_to: None,
    }
}

pub fn seed_tasks() -> Vec<Task> {
    vec![
        seed_task(
            3,
            "Design the landing page",
            "Draft a clean, modern layout for the app's main page",
            Priority::High,
        ),
        seed_task(
            4,
            "Set up the CI pipeline",
            "Automated tests and deploys on every push",
            Priority::Medium,
        ),
        seed_task(
            5,
            "Write the API documentation",
            "Document every endpoint and method",
            Priority::Low,
        ),
        seed_task(
            6,
            "Profile page load times",
            "Speed up initial load and interaction latency",
            Priority::High,
        ),
        seed_task(
            7,
            "Add a dark theme",
            "Toggle between light and dark color schemes",
            Priority::Medium,
        ),
    ]
}

fn seed_activity(
    id: i64,
    task: &Task,
    status: ActivityStatus,
    start_time: TimeValid,
    deadline: TimeValid,
) -> Activity {
    Activity {
        id,
        assign_id: 1,
        task_id: task.id,
        task_pull: TaskPull {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            created_at: task.created_at.clone(),
        },
        status,
        start_time,
        deadline,
        created_at: SEED_STAMP.to_string(),
    }
}

pub fn seed_activities() -> Vec<Activity> {
    let tasks = seed_tasks();
    vec![
        seed_activity(
            8,
            &tasks[0],
            ActivityStatus::InProgress,
            TimeValid::some("2025-06-01T07:00:00Z"),
            TimeValid::some("2025-06-01T11:00:00Z"),
        ),
        seed_activity(
            9,
            &tasks[1],
            ActivityStatus::Todo,
            TimeValid::none(),
            TimeValid::none(),
        ),
        seed_activity(
            10,
            &tasks[2],
            ActivityStatus::Done,
            TimeValid::some("2025-05-31T09:00:00Z"),
            TimeValid::some("2025-05-31T13:00:00Z"),
        ),
    ]
}

/// Seed all collections on first run. Returns true if seeding happened,
/// false when the guard flag was already set. Idempotent after the first
/// call.
pub fn initialize(store: &RecordStore) -> bool {
    if store.contains(INITIALIZED) {
        return false;
    }
    store.write_records(USERS, &seed_users());
    store.write_records(TASKS, &seed_tasks());
    store.write_records(ACTIVITIES, &seed_activities());
    store.ensure_next_id(SEED_ID_CEILING + 1);
    store.set_flag(INITIALIZED);
    true
}

/// Clear tasks and activities; users are retained. Confirmation is the
/// caller's problem, not this layer's.
pub fn reset(store: &RecordStore) {
    store.remove(TASKS);
    store.remove(ACTIVITIES);
}

/// Rewrite tasks and activities back to the fixtures unconditionally;
/// restore users only if the users collection is absent.
pub fn restore(store: &RecordStore) {
    if !store.contains(USERS) {
        store.write_records(USERS, &seed_users());
    }
    store.write_records(TASKS, &seed_tasks());
    store.write_records(ACTIVITIES, &seed_activities());
    store.ensure_next_id(SEED_ID_CEILING + 1);
}
