mod api;
mod cli;
mod model;
mod ops;
mod output;
mod seed;
mod store;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::Parser;

use api::{
    ApiClient, AssignActivityRequest, CreateTaskRequest, UpdateEventRequest, UpdateTaskRequest,
    UserPatchRequest, UserRequest,
};
use cli::{Cli, Command};
use model::{Activity, ActivityStatus, Priority, Role, TimeValid};
use ops::{ActivityPatch, NewTask, NewUser, TaskPatch, UserPatch};
use store::RecordStore;

fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".planner").join("planner.db"))
}

fn resolve_db_path(cli_db: Option<String>) -> Result<String> {
    match cli_db {
        Some(p) => Ok(p),
        None => {
            let path = default_db_path()?;
            Ok(path
                .to_str()
                .context("default store path is not valid UTF-8")?
                .to_string())
        }
    }
}

fn ensure_db_dir(db_path: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn parse_time(label: &str, value: &str) -> Result<()> {
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .with_context(|| format!("invalid {label} '{value}': expected RFC 3339"))
}

fn validate_window(start: &str, deadline: &str) -> Result<()> {
    let start_at = DateTime::parse_from_rfc3339(start)
        .with_context(|| format!("invalid start time '{start}': expected RFC 3339"))?;
    let deadline_at = DateTime::parse_from_rfc3339(deadline)
        .with_context(|| format!("invalid deadline '{deadline}': expected RFC 3339"))?;
    if deadline_at <= start_at {
        bail!("deadline must be after the start time");
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.api {
        Some(url) => {
            let client = ApiClient::new(&url)?;
            run_remote(&client, cli.command)
        }
        None => {
            let db_path = resolve_db_path(cli.db)?;
            ensure_db_dir(&db_path)?;
            let store = RecordStore::open(&db_path)?;
            run_local(&store, cli.command)
        }
    }
}

fn run_local(store: &RecordStore, command: Command) -> Result<()> {
    match command {
        Command::Init => {
            if seed::initialize(store) {
                eprintln!("Seeded demo data");
            } else {
                eprintln!("Already initialized");
            }
        }

        Command::Reset { yes } => {
            if !yes {
                bail!("this clears all tasks and activities; pass --yes to confirm");
            }
            seed::reset(store);
            eprintln!("Cleared tasks and activities");
        }

        Command::Restore => {
            seed::restore(store);
            eprintln!("Restored demo data");
        }

        Command::Users { json } => {
            let users = ops::list_users(store);
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                print!("{}", output::format_user_list(&users));
            }
        }

        Command::User { id } => match ops::get_user(store, id) {
            Some(user) => print!("{}", output::format_user_detail(&user)),
            None => bail!("user {id} not found"),
        },

        Command::UserAdd {
            username,
            tg_id,
            tg_tag,
            role,
        } => {
            let role = Role::parse(&role)?;
            let user = ops::create_user(
                store,
                NewUser {
                    tg_id,
                    tg_tag,
                    username,
                    role,
                },
            );
            eprintln!("Added user '{}' (#{})", user.username, user.id);
        }

        Command::UserEdit {
            id,
            username,
            tg_id,
            tg_tag,
            role,
        } => {
            let patch = UserPatch {
                tg_id,
                tg_tag,
                username,
                role: role.as_deref().map(Role::parse).transpose()?,
            };
            match ops::update_user(store, id, patch) {
                Some(_) => eprintln!("Updated user #{id}"),
                None => bail!("user {id} not found"),
            }
        }

        Command::UserRm { id } => {
            if ops::delete_user(store, id) {
                eprintln!("Removed user #{id}");
            } else {
                bail!("user {id} not found");
            }
        }

        Command::Add {
            title,
            desc,
            priority,
            status,
        } => {
            let priority = Priority::parse(&priority)?;
            let task = ops::create_task(
                store,
                NewTask {
                    title,
                    description: desc,
                    status,
                    priority,
                },
            );
            eprintln!("Added task '{}' (#{})", task.title, task.id);
        }

        Command::List {
            status,
            priority,
            json,
        } => {
            let priority = priority.as_deref().map(Priority::parse).transpose()?;
            let mut tasks = ops::list_tasks(store);
            if let Some(status) = status {
                tasks.retain(|t| t.status == status);
            }
            if let Some(priority) = priority {
                tasks.retain(|t| t.priority == priority);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print!("{}", output::format_task_list(&tasks));
            }
        }

        Command::Show { id } => match ops::get_task(store, id) {
            Some(task) => print!("{}", output::format_task_detail(&task)),
            None => bail!("task {id} not found"),
        },

        Command::Edit {
            id,
            title,
            desc,
            priority,
            status,
        } => {
            let patch = TaskPatch {
                title,
                description: desc,
                status,
                priority: priority.as_deref().map(Priority::parse).transpose()?,
            };
            match ops::update_task(store, id, patch) {
                Some(_) => eprintln!("Updated task #{id}"),
                None => bail!("task {id} not found"),
            }
        }

        Command::Rm { id } => {
            if ops::delete_task(store, id) {
                eprintln!("Removed task #{id}");
            } else {
                bail!("task {id} not found");
            }
        }

        Command::Assign {
            id,
            start,
            deadline,
        } => {
            validate_window(&start, &deadline)?;
            let activity = ops::assign_task(store, id, &start, &deadline)?;
            eprintln!(
                "Assigned task #{id} to user #{}; created activity #{}",
                activity.assign_id, activity.id
            );
        }

        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {file}"))?;
            let summary = ops::import_tasks(store, &raw)?;
            print!("{}", output::format_import_summary(summary));
        }

        Command::Activities { status, json } => {
            let status = status.as_deref().map(ActivityStatus::parse).transpose()?;
            let mut activities = ops::list_activities(store);
            if let Some(status) = status {
                activities.retain(|a| a.status == status);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&activities)?);
            } else {
                print!("{}", output::format_activity_list(&activities));
            }
        }

        Command::Activity { id } => match ops::get_activity(store, id) {
            Some(activity) => print!("{}", output::format_activity_detail(&activity)),
            None => bail!("activity {id} not found"),
        },

        Command::ActivityEdit {
            id,
            status,
            start,
            deadline,
        } => {
            if let Some(ref start) = start {
                parse_time("start time", start)?;
            }
            if let Some(ref deadline) = deadline {
                parse_time("deadline", deadline)?;
            }
            let patch = ActivityPatch {
                status: status.as_deref().map(ActivityStatus::parse).transpose()?,
                start_time: start.map(TimeValid::some),
                deadline: deadline.map(TimeValid::some),
            };
            match ops::update_activity(store, id, patch) {
                Some(_) => eprintln!("Updated activity #{id}"),
                None => bail!("activity {id} not found"),
            }
        }

        Command::Done { id } => match ops::complete_activity(store, id) {
            Some(_) => eprintln!("Marked activity #{id} as done"),
            None => bail!("activity {id} not found"),
        },

        Command::ActivityRm { id } => {
            if ops::delete_activity(store, id) {
                eprintln!("Removed activity #{id}");
            } else {
                bail!("activity {id} not found");
            }
        }
    }

    Ok(())
}

fn remote_owner(client: &ApiClient) -> Result<model::User> {
    let users = client.list_users()?;
    users
        .into_iter()
        .find(|u| u.role == Role::Owner)
        .context("no user with the owner role")
}

/// Rebuild the full update body the backend expects from the current
/// activity, with the given fields replaced.
fn event_update(
    activity: &Activity,
    status: ActivityStatus,
    start_time: TimeValid,
    deadline: TimeValid,
) -> UpdateEventRequest {
    UpdateEventRequest {
        task_id: activity.task_id,
        title: Some(activity.task_pull.title.clone()),
        assign_id: activity.assign_id,
        start_time,
        deadline,
        description: activity.task_pull.description.clone(),
        status,
        priority: Some(activity.task_pull.priority),
    }
}

fn run_remote(client: &ApiClient, command: Command) -> Result<()> {
    match command {
        Command::Init | Command::Reset { .. } | Command::Restore => {
            bail!("this command only applies to the local store");
        }

        Command::Users { json } => {
            let users = client.list_users()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                print!("{}", output::format_user_list(&users));
            }
        }

        Command::User { id } => {
            let user = client.get_user(id)?;
            print!("{}", output::format_user_detail(&user));
        }

        Command::UserAdd {
            username,
            tg_id,
            tg_tag,
            role,
        } => {
            let role = Role::parse(&role)?;
            let user = client.create_user(&UserRequest {
                tg_id,
                tg_tag,
                username,
                role,
            })?;
            eprintln!("Added user '{}' (#{})", user.username, user.id);
        }

        Command::UserEdit {
            id,
            username,
            tg_id,
            tg_tag,
            role,
        } => {
            let request = UserPatchRequest {
                tg_id,
                tg_tag,
                username,
                role: role.as_deref().map(Role::parse).transpose()?,
            };
            client.update_user(id, &request)?;
            eprintln!("Updated user #{id}");
        }

        Command::UserRm { id } => {
            client.delete_user(id)?;
            eprintln!("Removed user #{id}");
        }

        Command::Add {
            title,
            desc,
            priority,
            status,
        } => {
            let priority = Priority::parse(&priority)?;
            let created = client.create_task(&CreateTaskRequest {
                title: title.clone(),
                description: desc,
                status,
                priority,
            })?;
            eprintln!("Added task '{}' (#{})", title, created.id);
        }

        Command::List {
            status,
            priority,
            json,
        } => {
            let priority = priority.as_deref().map(Priority::parse).transpose()?;
            let mut tasks = client.unassigned_tasks()?;
            if let Some(status) = status {
                tasks.retain(|t| t.status == status);
            }
            if let Some(priority) = priority {
                tasks.retain(|t| t.priority == priority);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print!("{}", output::format_task_list(&tasks));
            }
        }

        Command::Show { id } => {
            let task = client.get_task(id)?;
            print!("{}", output::format_task_detail(&task));
        }

        Command::Edit {
            id,
            title,
            desc,
            priority,
            status,
        } => {
            let request = UpdateTaskRequest {
                title,
                description: desc,
                status,
                priority: priority.as_deref().map(Priority::parse).transpose()?,
                start_time: None,
                deadline: None,
            };
            client.update_task(id, &request)?;
            eprintln!("Updated task #{id}");
        }

        Command::Rm { id } => {
            client.delete_task(id)?;
            eprintln!("Removed task #{id}");
        }

        Command::Assign {
            id,
            start,
            deadline,
        } => {
            validate_window(&start, &deadline)?;
            let owner = remote_owner(client)?;
            client.assign_activity(&AssignActivityRequest {
                assign_id: owner.id,
                task_id: id,
                status: ActivityStatus::Todo,
                start_time: start,
                deadline,
            })?;
            eprintln!("Assigned task #{id} to user #{}", owner.id);
        }

        Command::Import { file } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("failed to read {file}"))?;
            let file_name = std::path::Path::new(&file)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("tasks.json")
                .to_string();
            let report = client.import_tasks(&file_name, bytes)?;
            println!(
                "{}: imported {}, failed {} ({} processed)",
                report.message, report.imported, report.failed, report.total_processed
            );
            for error in report.errors.unwrap_or_default() {
                eprintln!("  {error}");
            }
        }

        Command::Activities { status, json } => {
            let status = status.as_deref().map(ActivityStatus::parse).transpose()?;
            let owner = remote_owner(client)?;
            let mut activities = client.user_activities(owner.id)?;
            if let Some(status) = status {
                activities.retain(|a| a.status == status);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&activities)?);
            } else {
                print!("{}", output::format_activity_list(&activities));
            }
        }

        Command::Activity { id } => {
            let activity = client.get_activity(id)?;
            print!("{}", output::format_activity_detail(&activity));
        }

        Command::ActivityEdit {
            id,
            status,
            start,
            deadline,
        } => {
            if let Some(ref start) = start {
                parse_time("start time", start)?;
            }
            if let Some(ref deadline) = deadline {
                parse_time("deadline", deadline)?;
            }
            let current = client.get_activity(id)?;
            let status = status
                .as_deref()
                .map(ActivityStatus::parse)
                .transpose()?
                .unwrap_or(current.status);
            let start_time = start
                .map(TimeValid::some)
                .unwrap_or_else(|| current.start_time.clone());
            let deadline = deadline
                .map(TimeValid::some)
                .unwrap_or_else(|| current.deadline.clone());
            client.update_activity(id, &event_update(&current, status, start_time, deadline))?;
            eprintln!("Updated activity #{id}");
        }

        Command::Done { id } => {
            let current = client.get_activity(id)?;
            client.update_activity(
                id,
                &event_update(
                    &current,
                    ActivityStatus::Done,
                    current.start_time.clone(),
                    current.deadline.clone(),
                ),
            )?;
            eprintln!("Marked activity #{id} as done");
        }

        Command::ActivityRm { id } => {
            client.delete_activity(id)?;
            eprintln!("Removed activity #{id}");
        }
    }

    Ok(())
}
