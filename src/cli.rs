use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "planner", about = "Task and activity tracker")]
pub struct Cli {
    /// Path to the local store [default: ~/.planner/planner.db]
    #[arg(long, env = "PLANNER_DB", global = true)]
    pub db: Option<String>,

    /// Base URL of the REST backend; when set, commands run against it
    /// instead of the local store
    #[arg(long, env = "PLANNER_API", global = true)]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Seed the local store with demo data (idempotent)
    Init,

    /// Clear tasks and activities, keeping users
    Reset {
        /// Confirm clearing tasks and activities
        #[arg(long)]
        yes: bool,
    },

    /// Restore tasks and activities to the demo fixtures
    Restore,

    /// List users
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show user details
    User {
        /// User id
        id: i64,
    },

    /// Add a user
    UserAdd {
        /// Username
        username: String,
        /// Telegram numeric id
        #[arg(long)]
        tg_id: i64,
        /// Telegram tag, e.g. @executor
        #[arg(long)]
        tg_tag: String,
        /// Role (owner, manager)
        #[arg(long, default_value = "manager")]
        role: String,
    },

    /// Edit a user
    UserEdit {
        /// User id
        id: i64,
        /// New username
        #[arg(long)]
        username: Option<String>,
        /// New telegram id
        #[arg(long)]
        tg_id: Option<i64>,
        /// New telegram tag
        #[arg(long)]
        tg_tag: Option<String>,
        /// New role (owner, manager)
        #[arg(long)]
        role: Option<String>,
    },

    /// Remove a user
    UserRm {
        /// User id
        id: i64,
    },

    /// Add a task to the pool
    Add {
        /// Task title
        title: String,
        /// Task description
        #[arg(short, long)]
        desc: Option<String>,
        /// Priority (low, medium, high)
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Status
        #[arg(short, long, default_value = "todo")]
        status: String,
    },

    /// List pool tasks
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Filter by priority (low, medium, high)
        #[arg(long)]
        priority: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show task details
    Show {
        /// Task id
        id: i64,
    },

    /// Edit a task
    Edit {
        /// Task id
        id: i64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        desc: Option<String>,
        /// New priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<String>,
        /// New status
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Remove a task from the pool
    Rm {
        /// Task id
        id: i64,
    },

    /// Assign a task to the owner as a scheduled activity
    Assign {
        /// Task id
        id: i64,
        /// Start time (RFC 3339)
        #[arg(long)]
        start: String,
        /// Deadline (RFC 3339)
        #[arg(long)]
        deadline: String,
    },

    /// Bulk-import tasks from a JSON file
    Import {
        /// Path to a JSON array of tasks
        file: String,
    },

    /// List activities
    Activities {
        /// Filter by status (todo, in_progress, done)
        #[arg(long)]
        status: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show activity details
    Activity {
        /// Activity id
        id: i64,
    },

    /// Edit an activity
    ActivityEdit {
        /// Activity id
        id: i64,
        /// New status (todo, in_progress, done)
        #[arg(short, long)]
        status: Option<String>,
        /// New start time (RFC 3339)
        #[arg(long)]
        start: Option<String>,
        /// New deadline (RFC 3339)
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Mark an activity done regardless of its current status
    Done {
        /// Activity id
        id: i64,
    },

    /// Remove an activity
    ActivityRm {
        /// Activity id
        id: i64,
    },
}
