use crate::model::{Activity, Task, User};
use crate::ops::ImportSummary;

pub fn format_task_list(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        let desc = task
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("  {d}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{} #{} [{}] {} ({}){}\n",
            task.priority.marker(),
            task.id,
            task.priority,
            task.title,
            task.status,
            desc
        ));
    }
    out
}

pub fn format_task_detail(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:          {}\n", task.id));
    out.push_str(&format!("Title:       {}\n", task.title));
    out.push_str(&format!("Status:      {}\n", task.status));
    out.push_str(&format!("Priority:    {}\n", task.priority));
    if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("Description: {desc}\n"));
    }
    if let Some(ref start) = task.start_time {
        out.push_str(&format!("Starts:      {start}\n"));
    }
    if let Some(ref deadline) = task.deadline {
        out.push_str(&format!("Deadline:    {deadline}\n"));
    }
    if let Some(assigned_to) = task.assigned_to {
        out.push_str(&format!("Assigned to: {assigned_to}\n"));
    }
    out.push_str(&format!("Created:     {}\n", task.created_at));
    out
}

pub fn format_activity_list(activities: &[Activity]) -> String {
    let mut out = String::new();
    for activity in activities {
        let due = activity
            .deadline
            .as_option()
            .map(|d| format!(" (due {d})"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{} #{} [{}] {}{}\n",
            activity.status.icon(),
            activity.id,
            activity.task_pull.priority,
            activity.task_pull.title,
            due
        ));
    }
    out
}

pub fn format_activity_detail(activity: &Activity) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:          {}\n", activity.id));
    out.push_str(&format!("Title:       {}\n", activity.task_pull.title));
    out.push_str(&format!("Status:      {}\n", activity.status));
    out.push_str(&format!("Priority:    {}\n", activity.task_pull.priority));
    if !activity.task_pull.description.is_empty() {
        out.push_str(&format!("Description: {}\n", activity.task_pull.description));
    }
    if let Some(start) = activity.start_time.as_option() {
        out.push_str(&format!("Starts:      {start}\n"));
    }
    if let Some(deadline) = activity.deadline.as_option() {
        out.push_str(&format!("Deadline:    {deadline}\n"));
    }
    out.push_str(&format!("Assignee:    {}\n", activity.assign_id));
    out.push_str(&format!("From task:   {}\n", activity.task_id));
    out.push_str(&format!("Created:     {}\n", activity.created_at));
    out
}

pub fn format_user_detail(user: &User) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:          {}\n", user.id));
    out.push_str(&format!("Username:    {}\n", user.username));
    out.push_str(&format!("Role:        {}\n", user.role));
    out.push_str(&format!("Telegram:    {} ({})\n", user.tg_tag, user.tg_id));
    out.push_str(&format!("Created:     {}\n", user.created_at));
    out
}

pub fn format_user_list(users: &[User]) -> String {
    let mut out = String::new();
    for user in users {
        out.push_str(&format!(
            "#{} {} ({}) {}\n",
            user.id, user.username, user.role, user.tg_tag
        ));
    }
    out
}

pub fn format_import_summary(summary: ImportSummary) -> String {
    format!(
        "Imported {} task(s), {} failed ({} processed)\n",
        summary.imported,
        summary.failed,
        summary.total()
    )
}
