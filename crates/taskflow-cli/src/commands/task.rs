//! Task management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use taskflow_core::query::{
    describe_deadline, filter_tasks, overdue_tasks, sort_tasks, task_stats, upcoming_tasks,
    TaskFilter, TaskSortKey,
};
use taskflow_core::{Config, NewTask, Task, TaskPatch, TaskPriority, TaskStatus};

use super::{open_engine, print_json, today, CmdResult, ProviderChoice};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks
    List {
        /// Only tasks with this status (todo, in-progress, completed)
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Only tasks with this priority (high, medium, low)
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// Assignee substring
        #[arg(long, default_value = "")]
        assignee: String,
        /// Title or description substring
        #[arg(long, default_value = "")]
        search: String,
        /// Sort key: created, deadline, priority, title, updated
        #[arg(long, default_value = "created")]
        sort: TaskSortKey,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new task
    Add {
        /// Task title
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        assignee: String,
        #[arg(long, default_value = "todo")]
        status: TaskStatus,
        #[arg(long, default_value = "medium")]
        priority: TaskPriority,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// New deadline (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDate>,
        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Set the status of a task
    Status {
        /// Task ID
        id: String,
        /// todo, in-progress or completed
        status: TaskStatus,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Delete every task
    Clear,
    /// Tasks past their deadline
    Overdue,
    /// Tasks due within the next week
    Upcoming,
    /// Task counters
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Patch built from `task update` flags.
pub(crate) struct UpdateFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub deadline: Option<NaiveDate>,
    pub clear_deadline: bool,
}

impl UpdateFields {
    pub(crate) fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            description: self.description,
            assignee: self.assignee,
            status: self.status,
            priority: self.priority,
            deadline: if self.clear_deadline {
                Some(None)
            } else {
                self.deadline.map(Some)
            },
        }
    }
}

pub(crate) fn format_task(task: &Task, today: NaiveDate) -> String {
    let mut line = format!(
        "{}  [{}] {:<6} {}",
        task.id,
        task.status,
        task.priority.as_str(),
        task.title
    );
    if !task.assignee.is_empty() {
        line.push_str(&format!(" @{}", task.assignee));
    }
    if task.deadline.is_some() {
        line.push_str(&format!(" ({})", describe_deadline(task.deadline, today)));
    }
    line
}

fn print_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) {
    let today = today();
    let mut any = false;
    for task in tasks {
        println!("{}", format_task(task, today));
        any = true;
    }
    if !any {
        println!("No tasks found");
    }
}

pub async fn run(action: TaskAction, choice: &ProviderChoice, config: &Config) -> CmdResult {
    let mut engine = open_engine(choice, config).await?;

    match action {
        TaskAction::List {
            status,
            priority,
            assignee,
            search,
            sort,
            json,
        } => {
            let filter = TaskFilter {
                status,
                priority,
                assignee,
                search,
            };
            let tasks = sort_tasks(filter_tasks(engine.tasks(), &filter), sort);
            if json {
                print_json(&tasks)?;
            } else {
                print_tasks(tasks);
            }
        }
        TaskAction::Add {
            title,
            description,
            assignee,
            status,
            priority,
            deadline,
        } => {
            let input = NewTask {
                title,
                description,
                assignee,
                status,
                priority,
                deadline,
                ..Default::default()
            };
            let task = engine.create_task(input).await?;
            println!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::Show { id } => match engine.task(&id) {
            Some(task) => print_json(task)?,
            None => return Err(format!("task not found: {id}").into()),
        },
        TaskAction::Update {
            id,
            title,
            description,
            assignee,
            status,
            priority,
            deadline,
            clear_deadline,
        } => {
            let patch = UpdateFields {
                title,
                description,
                assignee,
                status,
                priority,
                deadline,
                clear_deadline,
            }
            .into_patch();
            let task = engine.update_task(&id, patch).await?;
            println!("Task updated: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::Status { id, status } => {
            let task = engine.set_task_status(&id, status).await?;
            println!("{}", format_task(&task, today()));
        }
        TaskAction::Delete { id } => {
            engine.delete_task(&id).await?;
            println!("Task deleted: {id}");
        }
        TaskAction::Clear => {
            let removed = engine.clear_tasks().await?;
            println!("Deleted {removed} task(s)");
        }
        TaskAction::Overdue => print_tasks(overdue_tasks(engine.tasks(), today())),
        TaskAction::Upcoming => print_tasks(upcoming_tasks(engine.tasks(), today())),
        TaskAction::Stats { json } => {
            let stats = task_stats(engine.tasks(), today());
            if json {
                print_json(&stats)?;
            } else {
                println!("Total:       {}", stats.total);
                println!("To do:       {}", stats.todo);
                println!("In progress: {}", stats.in_progress);
                println!("Completed:   {}", stats.completed);
                println!("High/Medium/Low: {}/{}/{}", stats.high, stats.medium, stats.low);
                println!("Overdue:     {}", stats.overdue);
            }
        }
    }
    Ok(())
}
